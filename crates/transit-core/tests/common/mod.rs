// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

pub use transit_dry_tests::{
    geometry_node, line, reference_ledger, reference_network, reference_state, segment, service,
    station, system, AlterationBuilder, NetworkStateBuilder,
};

use transit_core::{FeatureId, NetworkState};

/// Node ids of segment `id` as plain strings, empty when the segment is absent.
pub fn segment_nodes(state: &NetworkState, id: &str) -> Vec<String> {
    state
        .segment
        .get(id)
        .map(|seg| seg.nodes.iter().map(|n| n.as_str().to_owned()).collect())
        .unwrap_or_default()
}

/// Node ids of system `id`.
pub fn system_nodes(state: &NetworkState, id: &str) -> Vec<String> {
    state
        .system
        .get(id)
        .map(|sys| sys.nodes.iter().map(|n| n.as_str().to_owned()).collect())
        .unwrap_or_default()
}

/// Convenience id constructor.
pub fn fid(raw: &str) -> FeatureId {
    FeatureId::from(raw)
}
