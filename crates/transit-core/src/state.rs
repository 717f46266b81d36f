// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Flat, id-keyed materialization of a network.
//!
//! Every bucket maps an id to a dehydrated record behind an [`Arc`]. Cloning a
//! state is cheap: records are shared, and the reducer swaps in a fresh `Arc`
//! only for the records an alteration touches.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ident::{AlterationId, FeatureId};
use crate::model::{BucketKind, Line, NetworkFeature, NetworkNode, Segment, Service, System};

/// 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Domain separator for [`NetworkState::state_digest`].
const STATE_DIGEST_DOMAIN: &[u8] = b"TRANSIT_STATE_V1\0";

/// The current network: five buckets plus the stack of applied alterations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    /// Applied alteration ids, oldest first. The last entry is the head.
    #[serde(default)]
    pub alteration_stack: Vec<AlterationId>,
    /// Stations and geometry nodes.
    #[serde(default)]
    pub node: BTreeMap<FeatureId, Arc<NetworkNode>>,
    /// Segments.
    #[serde(default)]
    pub segment: BTreeMap<FeatureId, Arc<Segment>>,
    /// Services.
    #[serde(default)]
    pub service: BTreeMap<FeatureId, Arc<Service>>,
    /// Lines.
    #[serde(default)]
    pub line: BTreeMap<FeatureId, Arc<Line>>,
    /// Systems.
    #[serde(default)]
    pub system: BTreeMap<FeatureId, Arc<System>>,
}

/// A reference whose target is missing from its bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DanglingReference {
    /// Bucket of the referring feature.
    pub from_bucket: BucketKind,
    /// Referring feature.
    pub from: FeatureId,
    /// Bucket the reference points into.
    pub bucket: BucketKind,
    /// Missing id.
    pub id: FeatureId,
}

impl NetworkState {
    /// Empty state with nothing applied.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Top of the alteration stack.
    #[must_use]
    pub fn head(&self) -> Option<&AlterationId> {
        self.alteration_stack.last()
    }

    /// `true` if `bucket` holds `id`.
    #[must_use]
    pub fn contains(&self, bucket: BucketKind, id: &FeatureId) -> bool {
        match bucket {
            BucketKind::Node => self.node.contains_key(id),
            BucketKind::Segment => self.segment.contains_key(id),
            BucketKind::Service => self.service.contains_key(id),
            BucketKind::Line => self.line.contains_key(id),
            BucketKind::System => self.system.contains_key(id),
        }
    }

    /// Copy of the record stored under `id` in `bucket`.
    #[must_use]
    pub fn get(&self, bucket: BucketKind, id: &FeatureId) -> Option<NetworkFeature> {
        match bucket {
            BucketKind::Node => self
                .node
                .get(id)
                .map(|n| NetworkFeature::from((**n).clone())),
            BucketKind::Segment => self
                .segment
                .get(id)
                .map(|f| NetworkFeature::Segment((**f).clone())),
            BucketKind::Service => self
                .service
                .get(id)
                .map(|f| NetworkFeature::Service((**f).clone())),
            BucketKind::Line => self
                .line
                .get(id)
                .map(|f| NetworkFeature::Line((**f).clone())),
            BucketKind::System => self
                .system
                .get(id)
                .map(|f| NetworkFeature::System((**f).clone())),
        }
    }

    /// Stores `feature` in the bucket for its type, replacing any record with
    /// the same id.
    pub fn insert(&mut self, feature: NetworkFeature) {
        match feature {
            NetworkFeature::Station(s) => {
                self.node.insert(s.id.clone(), Arc::new(NetworkNode::Station(s)));
            }
            NetworkFeature::GeometryNode(g) => {
                self.node.insert(g.id.clone(), Arc::new(NetworkNode::GeometryNode(g)));
            }
            NetworkFeature::Segment(f) => {
                self.segment.insert(f.id.clone(), Arc::new(f));
            }
            NetworkFeature::Service(f) => {
                self.service.insert(f.id.clone(), Arc::new(f));
            }
            NetworkFeature::Line(f) => {
                self.line.insert(f.id.clone(), Arc::new(f));
            }
            NetworkFeature::System(f) => {
                self.system.insert(f.id.clone(), Arc::new(f));
            }
        }
    }

    /// Removes and returns the record under `id` in `bucket`.
    pub fn remove(&mut self, bucket: BucketKind, id: &FeatureId) -> Option<NetworkFeature> {
        match bucket {
            BucketKind::Node => self
                .node
                .remove(id)
                .map(|n| NetworkFeature::from(Arc::unwrap_or_clone(n))),
            BucketKind::Segment => self
                .segment
                .remove(id)
                .map(|f| NetworkFeature::Segment(Arc::unwrap_or_clone(f))),
            BucketKind::Service => self
                .service
                .remove(id)
                .map(|f| NetworkFeature::Service(Arc::unwrap_or_clone(f))),
            BucketKind::Line => self
                .line
                .remove(id)
                .map(|f| NetworkFeature::Line(Arc::unwrap_or_clone(f))),
            BucketKind::System => self
                .system
                .remove(id)
                .map(|f| NetworkFeature::System(Arc::unwrap_or_clone(f))),
        }
    }

    /// Number of records in `bucket`.
    #[must_use]
    pub fn bucket_len(&self, bucket: BucketKind) -> usize {
        match bucket {
            BucketKind::Node => self.node.len(),
            BucketKind::Segment => self.segment.len(),
            BucketKind::Service => self.service.len(),
            BucketKind::Line => self.line.len(),
            BucketKind::System => self.system.len(),
        }
    }

    /// Total number of records across all buckets.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        [
            BucketKind::Node,
            BucketKind::Segment,
            BucketKind::Service,
            BucketKind::Line,
            BucketKind::System,
        ]
        .into_iter()
        .map(|b| self.bucket_len(b))
        .sum()
    }

    /// Every reference that does not resolve, in bucket then id order.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut out = Vec::new();
        let mut check = |from_bucket, from: &FeatureId, bucket, ids: &[FeatureId]| {
            for id in ids {
                if !self.contains(bucket, id) {
                    out.push(DanglingReference {
                        from_bucket,
                        from: from.clone(),
                        bucket,
                        id: id.clone(),
                    });
                }
            }
        };
        for (id, seg) in &self.segment {
            check(BucketKind::Segment, id, BucketKind::Node, &seg.nodes);
        }
        for (id, svc) in &self.service {
            check(BucketKind::Service, id, BucketKind::Segment, &svc.segments);
        }
        for (id, line) in &self.line {
            check(BucketKind::Line, id, BucketKind::Service, &line.services);
        }
        for (id, sys) in &self.system {
            check(BucketKind::System, id, BucketKind::Node, &sys.nodes);
            check(BucketKind::System, id, BucketKind::Line, &sys.lines);
        }
        out
    }

    /// BLAKE3 digest of the state's JSON encoding.
    ///
    /// Buckets are ordered maps, so equal states always encode to the same
    /// bytes.
    pub fn state_digest(&self) -> Result<Hash, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(STATE_DIGEST_DOMAIN);
        hasher.update(&bytes);
        Ok(hasher.finalize().into())
    }

    /// [`Self::state_digest`] rendered as lowercase hex.
    pub fn state_digest_hex(&self) -> Result<String, serde_json::Error> {
        self.state_digest().map(hex::encode)
    }
}
