// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Network feature records in their dehydrated (id-reference) and hydrated
//! (object-reference) forms.
//!
//! Reference-bearing records are generic over the type of their references.
//! The default parameter is [`FeatureId`], which gives the storage form; the
//! `Hydrated*` aliases substitute the referenced records themselves.
//!
//! Reference hierarchy (leaf first):
//!
//! ```text
//! Station | GeometryNode  <-  Segment  <-  Service  <-  Line  <-  System
//!                  ^------------------------------------------------/
//! ```

use serde::{Deserialize, Serialize};

use crate::ident::FeatureId;

/// Discriminant carried by every feature as its `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureType {
    /// Named stop on the network.
    Station,
    /// Unnamed shaping point for segment geometry.
    GeometryNode,
    /// Physical connection between adjacent nodes.
    Segment,
    /// Service pattern over one or more segments.
    Service,
    /// Named, coloured line composed of services.
    Line,
    /// A whole transit system.
    System,
}

impl FeatureType {
    /// Storage bucket holding features of this type.
    #[must_use]
    pub const fn bucket(self) -> BucketKind {
        match self {
            Self::Station | Self::GeometryNode => BucketKind::Node,
            Self::Segment => BucketKind::Segment,
            Self::Service => BucketKind::Service,
            Self::Line => BucketKind::Line,
            Self::System => BucketKind::System,
        }
    }

    /// Wire tag (`station`, `geometry-node`, ...).
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Station => "station",
            Self::GeometryNode => "geometry-node",
            Self::Segment => "segment",
            Self::Service => "service",
            Self::Line => "line",
            Self::System => "system",
        }
    }

    /// Top-level properties a change is allowed to address.
    ///
    /// `id` and `type` are never listed: they are immutable.
    #[must_use]
    pub const fn mutable_fields(self) -> &'static [&'static str] {
        match self {
            Self::Station => &["position", "name"],
            Self::GeometryNode => &["position", "label"],
            Self::Segment => &["mode", "nodes", "label"],
            Self::Service => &["segments", "serviceType", "label"],
            Self::Line => &["name", "color", "services"],
            Self::System => &["name", "nodes", "lines"],
        }
    }
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Keyed storage buckets of a [`NetworkState`](crate::NetworkState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    /// Stations and geometry nodes.
    Node,
    /// Segments.
    Segment,
    /// Services.
    Service,
    /// Lines.
    Line,
    /// Systems.
    System,
}

impl BucketKind {
    /// Field name of the bucket in the serialized state.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Segment => "segment",
            Self::Service => "service",
            Self::Line => "line",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for BucketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Plain 2D coordinate in network space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vector2 {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Named stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Node-bucket identifier.
    pub id: FeatureId,
    /// Location on the canvas.
    pub position: Vector2,
    /// Display name.
    pub name: String,
}

/// Shaping point that bends segment geometry without being a stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryNode {
    /// Node-bucket identifier.
    pub id: FeatureId,
    /// Location on the canvas.
    pub position: Vector2,
    /// Optional annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Entry of the node bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NetworkNode {
    /// A station.
    Station(Station),
    /// A geometry node.
    GeometryNode(GeometryNode),
}

impl NetworkNode {
    /// Identifier of the node.
    #[must_use]
    pub fn id(&self) -> &FeatureId {
        match self {
            Self::Station(s) => &s.id,
            Self::GeometryNode(g) => &g.id,
        }
    }

    /// Position of the node.
    #[must_use]
    pub fn position(&self) -> Vector2 {
        match self {
            Self::Station(s) => s.position,
            Self::GeometryNode(g) => g.position,
        }
    }

    /// `Station` or `GeometryNode`.
    #[must_use]
    pub const fn feature_type(&self) -> FeatureType {
        match self {
            Self::Station(_) => FeatureType::Station,
            Self::GeometryNode(_) => FeatureType::GeometryNode,
        }
    }
}

/// Transport mode of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Rapid transit.
    #[default]
    Metro,
}

/// Kind of service offered on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    /// Regular all-day service.
    #[default]
    Standard,
    /// Peak-only or otherwise restricted service.
    Limited,
}

/// Connection through an ordered run of nodes. Node order is the path geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment<N = FeatureId> {
    /// Segment-bucket identifier.
    pub id: FeatureId,
    /// Transport mode.
    pub mode: Mode,
    /// Ordered node references.
    pub nodes: Vec<N>,
    /// Optional annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Service pattern composed of ordered segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service<S = FeatureId> {
    /// Service-bucket identifier.
    pub id: FeatureId,
    /// Ordered segment references.
    pub segments: Vec<S>,
    /// Kind of service.
    pub service_type: ServiceType,
    /// Optional annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Line composed of ordered services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line<S = FeatureId> {
    /// Line-bucket identifier.
    pub id: FeatureId,
    /// Display name.
    pub name: String,
    /// Display colour (CSS colour string).
    pub color: String,
    /// Ordered service references.
    pub services: Vec<S>,
}

/// Whole system: its nodes and its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct System<N = FeatureId, L = FeatureId> {
    /// System-bucket identifier.
    pub id: FeatureId,
    /// Display name.
    pub name: String,
    /// Ordered node references.
    pub nodes: Vec<N>,
    /// Ordered line references.
    pub lines: Vec<L>,
}

/// Segment with nodes resolved.
pub type HydratedSegment = Segment<NetworkNode>;
/// Service with segments (and their nodes) resolved.
pub type HydratedService = Service<HydratedSegment>;
/// Line with services resolved.
pub type HydratedLine = Line<HydratedService>;
/// System with nodes and lines resolved.
pub type HydratedSystem = System<NetworkNode, HydratedLine>;

/// Any feature in storage form, tagged by `type`.
///
/// This is the payload of alteration additions and removals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NetworkFeature {
    /// A station.
    Station(Station),
    /// A geometry node.
    GeometryNode(GeometryNode),
    /// A segment.
    Segment(Segment),
    /// A service.
    Service(Service),
    /// A line.
    Line(Line),
    /// A system.
    System(System),
}

impl NetworkFeature {
    /// Identifier of the feature.
    #[must_use]
    pub fn id(&self) -> &FeatureId {
        match self {
            Self::Station(f) => &f.id,
            Self::GeometryNode(f) => &f.id,
            Self::Segment(f) => &f.id,
            Self::Service(f) => &f.id,
            Self::Line(f) => &f.id,
            Self::System(f) => &f.id,
        }
    }

    /// Type tag of the feature.
    #[must_use]
    pub const fn feature_type(&self) -> FeatureType {
        match self {
            Self::Station(_) => FeatureType::Station,
            Self::GeometryNode(_) => FeatureType::GeometryNode,
            Self::Segment(_) => FeatureType::Segment,
            Self::Service(_) => FeatureType::Service,
            Self::Line(_) => FeatureType::Line,
            Self::System(_) => FeatureType::System,
        }
    }
}

impl From<NetworkNode> for NetworkFeature {
    fn from(node: NetworkNode) -> Self {
        match node {
            NetworkNode::Station(s) => Self::Station(s),
            NetworkNode::GeometryNode(g) => Self::GeometryNode(g),
        }
    }
}

/// Any feature with every reference resolved, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HydratedFeature {
    /// A station.
    Station(Station),
    /// A geometry node.
    GeometryNode(GeometryNode),
    /// A segment.
    Segment(HydratedSegment),
    /// A service.
    Service(HydratedService),
    /// A line.
    Line(HydratedLine),
    /// A system.
    System(HydratedSystem),
}

impl HydratedFeature {
    /// Identifier of the feature.
    #[must_use]
    pub fn id(&self) -> &FeatureId {
        match self {
            Self::Station(f) => &f.id,
            Self::GeometryNode(f) => &f.id,
            Self::Segment(f) => &f.id,
            Self::Service(f) => &f.id,
            Self::Line(f) => &f.id,
            Self::System(f) => &f.id,
        }
    }
}

impl From<NetworkNode> for HydratedFeature {
    fn from(node: NetworkNode) -> Self {
        match node {
            NetworkNode::Station(s) => Self::Station(s),
            NetworkNode::GeometryNode(g) => Self::GeometryNode(g),
        }
    }
}

/// Anything that can stand in a reference list: an id, or the record it names.
pub trait Referenced {
    /// Identifier this reference resolves to.
    fn reference_id(&self) -> &FeatureId;
}

impl Referenced for FeatureId {
    fn reference_id(&self) -> &FeatureId {
        self
    }
}

impl Referenced for NetworkNode {
    fn reference_id(&self) -> &FeatureId {
        self.id()
    }
}

impl<N> Referenced for Segment<N> {
    fn reference_id(&self) -> &FeatureId {
        &self.id
    }
}

impl<S> Referenced for Service<S> {
    fn reference_id(&self) -> &FeatureId {
        &self.id
    }
}

impl<S> Referenced for Line<S> {
    fn reference_id(&self) -> &FeatureId {
        &self.id
    }
}

impl<N, L> Referenced for System<N, L> {
    fn reference_id(&self) -> &FeatureId {
        &self.id
    }
}

fn reference_ids<R: Referenced>(refs: &[R]) -> Vec<FeatureId> {
    refs.iter().map(|r| r.reference_id().clone()).collect()
}

/// Projection back to storage form: every nested record becomes its id.
pub trait Dehydrate {
    /// Storage-form record.
    type Dehydrated;

    /// Replace nested records with their ids.
    fn dehydrate(&self) -> Self::Dehydrated;
}

impl Dehydrate for NetworkNode {
    type Dehydrated = Self;

    fn dehydrate(&self) -> Self {
        self.clone()
    }
}

impl<N: Referenced> Dehydrate for Segment<N> {
    type Dehydrated = Segment;

    fn dehydrate(&self) -> Segment {
        Segment {
            id: self.id.clone(),
            mode: self.mode,
            nodes: reference_ids(&self.nodes),
            label: self.label.clone(),
        }
    }
}

impl<S: Referenced> Dehydrate for Service<S> {
    type Dehydrated = Service;

    fn dehydrate(&self) -> Service {
        Service {
            id: self.id.clone(),
            segments: reference_ids(&self.segments),
            service_type: self.service_type,
            label: self.label.clone(),
        }
    }
}

impl<S: Referenced> Dehydrate for Line<S> {
    type Dehydrated = Line;

    fn dehydrate(&self) -> Line {
        Line {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
            services: reference_ids(&self.services),
        }
    }
}

impl<N: Referenced, L: Referenced> Dehydrate for System<N, L> {
    type Dehydrated = System;

    fn dehydrate(&self) -> System {
        System {
            id: self.id.clone(),
            name: self.name.clone(),
            nodes: reference_ids(&self.nodes),
            lines: reference_ids(&self.lines),
        }
    }
}

impl Dehydrate for HydratedFeature {
    type Dehydrated = NetworkFeature;

    fn dehydrate(&self) -> NetworkFeature {
        match self {
            Self::Station(s) => NetworkFeature::Station(s.clone()),
            Self::GeometryNode(g) => NetworkFeature::GeometryNode(g.clone()),
            Self::Segment(f) => NetworkFeature::Segment(f.dehydrate()),
            Self::Service(f) => NetworkFeature::Service(f.dehydrate()),
            Self::Line(f) => NetworkFeature::Line(f.dehydrate()),
            Self::System(f) => NetworkFeature::System(f.dehydrate()),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn feature_tags_match_wire_format() {
        let feature = NetworkFeature::GeometryNode(GeometryNode {
            id: "g1".into(),
            position: Vector2::new(3.0, 2.0),
            label: None,
        });
        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(
            value,
            json!({"type": "geometry-node", "id": "g1", "position": {"x": 3.0, "y": 2.0}})
        );
    }

    #[test]
    fn service_type_field_is_camel_case() {
        let raw = json!({
            "type": "service",
            "id": "svc1",
            "segments": ["seg1"],
            "serviceType": "limited"
        });
        let feature: NetworkFeature = serde_json::from_value(raw).unwrap();
        match feature {
            NetworkFeature::Service(s) => {
                assert_eq!(s.service_type, ServiceType::Limited);
                assert_eq!(s.segments, vec![FeatureId::from("seg1")]);
            }
            other => unreachable!("expected service, got {other:?}"),
        }
    }

    #[test]
    fn station_and_geometry_node_share_node_bucket() {
        assert_eq!(FeatureType::Station.bucket(), BucketKind::Node);
        assert_eq!(FeatureType::GeometryNode.bucket(), BucketKind::Node);
        assert_eq!(FeatureType::System.bucket(), BucketKind::System);
    }
}
