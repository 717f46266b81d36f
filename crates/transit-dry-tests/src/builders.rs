// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `NetworkState` and `Alteration` builders for tests.

use serde_json::Value;
use transit_core::{
    Alteration, AlterationId, FeatureId, FeaturePath, FeatureType, GeometryNode, Line, ListMutation,
    ListSide, Mode, NetworkFeature, NetworkFeatureChange, NetworkState, Segment, Service,
    ServiceType, Station, System, Vector2,
};

fn ids(raw: &[&str]) -> Vec<FeatureId> {
    raw.iter().copied().map(FeatureId::from).collect()
}

/// Station named after its id in upper case.
pub fn station(id: &str, x: f64, y: f64) -> NetworkFeature {
    NetworkFeature::Station(Station {
        id: id.into(),
        position: Vector2::new(x, y),
        name: id.to_uppercase(),
    })
}

/// Unlabelled geometry node.
pub fn geometry_node(id: &str, x: f64, y: f64) -> NetworkFeature {
    NetworkFeature::GeometryNode(GeometryNode {
        id: id.into(),
        position: Vector2::new(x, y),
        label: None,
    })
}

/// Metro segment through `nodes`.
pub fn segment(id: &str, nodes: &[&str]) -> NetworkFeature {
    NetworkFeature::Segment(Segment {
        id: id.into(),
        mode: Mode::Metro,
        nodes: ids(nodes),
        label: None,
    })
}

/// Standard service over `segments`.
pub fn service(id: &str, segments: &[&str]) -> NetworkFeature {
    NetworkFeature::Service(Service {
        id: id.into(),
        segments: ids(segments),
        service_type: ServiceType::Standard,
        label: None,
    })
}

/// Line over `services`.
pub fn line(id: &str, name: &str, color: &str, services: &[&str]) -> NetworkFeature {
    NetworkFeature::Line(Line {
        id: id.into(),
        name: name.into(),
        color: color.into(),
        services: ids(services),
    })
}

/// System with `nodes` and `lines`.
pub fn system(id: &str, name: &str, nodes: &[&str], lines: &[&str]) -> NetworkFeature {
    NetworkFeature::System(System {
        id: id.into(),
        name: name.into(),
        nodes: ids(nodes),
        lines: ids(lines),
    })
}

/// Builder for [`NetworkState`] seeds.
///
/// # Example
///
/// ```
/// use transit_dry_tests::{station, segment, NetworkStateBuilder};
///
/// let state = NetworkStateBuilder::new()
///     .with(station("s1", 0.0, 0.0))
///     .with(station("s2", 1.0, 0.0))
///     .with(segment("seg1", &["s1", "s2"]))
///     .build();
/// assert_eq!(state.feature_count(), 3);
/// assert!(state.dangling_references().is_empty());
/// ```
#[derive(Default)]
pub struct NetworkStateBuilder {
    state: NetworkState,
}

impl NetworkStateBuilder {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `feature` in its bucket.
    pub fn with(mut self, feature: NetworkFeature) -> Self {
        self.state.insert(feature);
        self
    }

    /// Push `id` onto the alteration stack without applying anything.
    pub fn applied(mut self, id: &str) -> Self {
        self.state.alteration_stack.push(AlterationId::from(id));
        self
    }

    /// Finish.
    pub fn build(self) -> NetworkState {
        self.state
    }
}

/// Builder for [`Alteration`]s.
pub struct AlterationBuilder {
    alteration: Alteration,
}

impl AlterationBuilder {
    /// Empty alteration `id` dated `date`.
    pub fn new(id: &str, date: &str) -> Self {
        Self {
            alteration: Alteration::new(id, date),
        }
    }

    /// Add a feature.
    pub fn add(mut self, feature: NetworkFeature) -> Self {
        self.alteration.additions.push(feature);
        self
    }

    /// Remove a feature (payload must match what is stored).
    pub fn remove(mut self, feature: NetworkFeature) -> Self {
        self.alteration.removals.push(feature);
        self
    }

    /// Append a raw change.
    pub fn change(mut self, change: NetworkFeatureChange) -> Self {
        self.alteration.changes.push(change);
        self
    }

    /// Replace top-level `field` of a feature, `left` before and `right` after.
    pub fn set_field(
        self,
        feature_type: FeatureType,
        id: &str,
        field: &str,
        left: Option<Value>,
        right: Option<Value>,
    ) -> Self {
        self.change(NetworkFeatureChange::set(
            feature_type,
            id,
            FeaturePath::field(field),
            left,
            right,
        ))
    }

    /// Insert `item` into list `field` right after `anchor`.
    pub fn insert_after(
        self,
        feature_type: FeatureType,
        id: &str,
        field: &str,
        anchor: &str,
        item: &str,
    ) -> Self {
        let mutation = ListMutation::relative(anchor, ListSide::Right);
        self.insert(feature_type, id, field, item, mutation)
    }

    /// Insert `item` into list `field` right before `anchor`.
    pub fn insert_before(
        self,
        feature_type: FeatureType,
        id: &str,
        field: &str,
        anchor: &str,
        item: &str,
    ) -> Self {
        let mutation = ListMutation::relative(anchor, ListSide::Left);
        self.insert(feature_type, id, field, item, mutation)
    }

    /// Append `item` to the tail of list `field`.
    pub fn append(self, feature_type: FeatureType, id: &str, field: &str, item: &str) -> Self {
        self.insert(feature_type, id, field, item, ListMutation::simple(ListSide::Right))
    }

    /// Prepend `item` to the head of list `field`.
    pub fn prepend(self, feature_type: FeatureType, id: &str, field: &str, item: &str) -> Self {
        self.insert(feature_type, id, field, item, ListMutation::simple(ListSide::Left))
    }

    fn insert(
        self,
        feature_type: FeatureType,
        id: &str,
        field: &str,
        item: &str,
        mutation: ListMutation,
    ) -> Self {
        self.change(NetworkFeatureChange::insert_into(
            feature_type,
            id,
            FeaturePath::field(field),
            item,
            mutation,
        ))
    }

    /// Finish.
    pub fn build(self) -> Alteration {
        self.alteration
    }
}
