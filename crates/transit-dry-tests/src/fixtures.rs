// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The reference network and a small ledger that grows it.
//!
//! Seed (`reference_state`):
//!
//! ```text
//! s1 (1,1) ── s2 (2,2)          seg1 = [s1, s2]
//! svc1 = [seg1]   L1 = [svc1]   sys1 = { nodes: [s1, s2], lines: [L1] }
//! ```
//!
//! Ledger (`reference_ledger`):
//!
//! * `a1` adds `s3` (4,3) and `g1` (3,2), threads them into `seg1` after `s2`
//!   (giving `[s1, s2, g1, s3]`) and appends `s3` to `sys1.nodes`.
//! * `a2` renames `s1`, adds `s4` and `seg2 = [s3, s4]`, appends `seg2` to
//!   `svc1` and `s4` to `sys1.nodes`.
//! * `a3` adds `svc2 = [seg2]` and line `L2`, appends `L2` to `sys1.lines`
//!   and recolours `L1`.

use serde_json::json;
use transit_core::{Alteration, FeatureType, Ledger, LedgerError, Network, NetworkState, Vector2};

use crate::builders::{
    geometry_node, line, segment, service, station, system, AlterationBuilder, NetworkStateBuilder,
};

/// Seed state: two stations, one segment, service, line and system.
pub fn reference_state() -> NetworkState {
    NetworkStateBuilder::new()
        .with(station("s1", 1.0, 1.0))
        .with(station("s2", 2.0, 2.0))
        .with(segment("seg1", &["s1", "s2"]))
        .with(service("svc1", &["seg1"]))
        .with(line("L1", "Red", "#e00", &["svc1"]))
        .with(system("sys1", "Metro", &["s1", "s2"], &["L1"]))
        .build()
}

/// Three alterations, in chronological order.
pub fn reference_ledger() -> Vec<Alteration> {
    let a1 = AlterationBuilder::new("a1", "2020-01-01T00:00:00Z")
        .add(station("s3", 4.0, 3.0))
        .add(geometry_node("g1", 3.0, 2.0))
        .insert_after(FeatureType::Segment, "seg1", "nodes", "s2", "g1")
        .insert_after(FeatureType::Segment, "seg1", "nodes", "g1", "s3")
        .append(FeatureType::System, "sys1", "nodes", "s3")
        .build();
    let a2 = AlterationBuilder::new("a2", "2020-02-01T00:00:00Z")
        .add(station("s4", 6.0, 3.0))
        .add(segment("seg2", &["s3", "s4"]))
        .set_field(FeatureType::Station, "s1", "name", Some(json!("S1")), Some(json!("Central")))
        .append(FeatureType::Service, "svc1", "segments", "seg2")
        .append(FeatureType::System, "sys1", "nodes", "s4")
        .build();
    let a3 = AlterationBuilder::new("a3", "2020-03-01T00:00:00Z")
        .add(service("svc2", &["seg2"]))
        .add(line("L2", "Blue", "#00e", &["svc2"]))
        .append(FeatureType::System, "sys1", "lines", "L2")
        .set_field(FeatureType::Line, "L1", "color", Some(json!("#e00")), Some(json!("#0a0")))
        .build();
    vec![a1, a2, a3]
}

/// Region network `n1` carrying [`reference_ledger`].
pub fn reference_network() -> Result<Network, LedgerError> {
    Ok(Network {
        id: "n1".into(),
        size: Vector2::new(8.0, 4.0),
        ledger: Ledger::try_from(reference_ledger())?,
    })
}
