// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Read-side reconstruction of the nested feature graph.
//!
//! Hydration never writes to the state and never caches. A missing input
//! feature passes through as `None`; a missing nested reference is an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::ident::FeatureId;
use crate::model::{
    BucketKind, HydratedFeature, HydratedLine, HydratedSegment, HydratedService, HydratedSystem,
    Line, NetworkFeature, NetworkNode, Segment, Service, System,
};
use crate::state::NetworkState;

/// A nested reference that does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HydrateError {
    /// `from` references `id`, which is absent from `bucket`.
    #[error("{from} references {bucket} {id}, which does not exist")]
    UnresolvedReference {
        /// Referring feature.
        from: FeatureId,
        /// Bucket searched.
        bucket: BucketKind,
        /// Missing id.
        id: FeatureId,
    },
}

/// Storage record that can be expanded against a state.
pub trait Hydrate {
    /// Record with every reference resolved.
    type Hydrated;

    /// Resolve every reference, recursively.
    fn hydrate(&self, state: &NetworkState) -> Result<Self::Hydrated, HydrateError>;
}

fn resolve_all<T: Hydrate>(
    state: &NetworkState,
    from: &FeatureId,
    bucket: BucketKind,
    records: &BTreeMap<FeatureId, Arc<T>>,
    ids: &[FeatureId],
) -> Result<Vec<T::Hydrated>, HydrateError> {
    ids.iter()
        .map(|id| {
            records
                .get(id)
                .ok_or_else(|| HydrateError::UnresolvedReference {
                    from: from.clone(),
                    bucket,
                    id: id.clone(),
                })
                .and_then(|record| record.hydrate(state))
        })
        .collect()
}

impl Hydrate for NetworkNode {
    type Hydrated = Self;

    fn hydrate(&self, _state: &NetworkState) -> Result<Self, HydrateError> {
        Ok(self.clone())
    }
}

impl Hydrate for Segment {
    type Hydrated = HydratedSegment;

    fn hydrate(&self, state: &NetworkState) -> Result<HydratedSegment, HydrateError> {
        Ok(Segment {
            id: self.id.clone(),
            mode: self.mode,
            nodes: resolve_all(state, &self.id, BucketKind::Node, &state.node, &self.nodes)?,
            label: self.label.clone(),
        })
    }
}

impl Hydrate for Service {
    type Hydrated = HydratedService;

    fn hydrate(&self, state: &NetworkState) -> Result<HydratedService, HydrateError> {
        Ok(Service {
            id: self.id.clone(),
            segments: resolve_all(
                state,
                &self.id,
                BucketKind::Segment,
                &state.segment,
                &self.segments,
            )?,
            service_type: self.service_type,
            label: self.label.clone(),
        })
    }
}

impl Hydrate for Line {
    type Hydrated = HydratedLine;

    fn hydrate(&self, state: &NetworkState) -> Result<HydratedLine, HydrateError> {
        Ok(Line {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
            services: resolve_all(
                state,
                &self.id,
                BucketKind::Service,
                &state.service,
                &self.services,
            )?,
        })
    }
}

impl Hydrate for System {
    type Hydrated = HydratedSystem;

    fn hydrate(&self, state: &NetworkState) -> Result<HydratedSystem, HydrateError> {
        Ok(System {
            id: self.id.clone(),
            name: self.name.clone(),
            nodes: resolve_all(state, &self.id, BucketKind::Node, &state.node, &self.nodes)?,
            lines: resolve_all(state, &self.id, BucketKind::Line, &state.line, &self.lines)?,
        })
    }
}

impl Hydrate for NetworkFeature {
    type Hydrated = HydratedFeature;

    fn hydrate(&self, state: &NetworkState) -> Result<HydratedFeature, HydrateError> {
        Ok(match self {
            Self::Station(s) => HydratedFeature::Station(s.clone()),
            Self::GeometryNode(g) => HydratedFeature::GeometryNode(g.clone()),
            Self::Segment(f) => HydratedFeature::Segment(f.hydrate(state)?),
            Self::Service(f) => HydratedFeature::Service(f.hydrate(state)?),
            Self::Line(f) => HydratedFeature::Line(f.hydrate(state)?),
            Self::System(f) => HydratedFeature::System(f.hydrate(state)?),
        })
    }
}

/// Hydrates `feature`, passing `None` through untouched.
pub fn hydrate_feature(
    state: &NetworkState,
    feature: Option<&NetworkFeature>,
) -> Result<Option<HydratedFeature>, HydrateError> {
    feature.map(|f| f.hydrate(state)).transpose()
}

/// Hydrates a segment.
pub fn hydrate_segment(
    state: &NetworkState,
    segment: &Segment,
) -> Result<HydratedSegment, HydrateError> {
    segment.hydrate(state)
}

/// Hydrates a service and its segments.
pub fn hydrate_service(
    state: &NetworkState,
    service: &Service,
) -> Result<HydratedService, HydrateError> {
    service.hydrate(state)
}

/// Hydrates a line down to its nodes.
pub fn hydrate_line(state: &NetworkState, line: &Line) -> Result<HydratedLine, HydrateError> {
    line.hydrate(state)
}

/// Hydrates a whole system.
pub fn hydrate_system(
    state: &NetworkState,
    system: &System,
) -> Result<HydratedSystem, HydrateError> {
    system.hydrate(state)
}
