// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Property: rolling back an applied alteration restores the exact prior
//! state, for generated multi-change alterations whose list insertions are
//! anchored on each other or address `seg1.nodes` by index.

mod common;

use common::{reference_state, segment_nodes, station, AlterationBuilder};
use proptest::prelude::*;
use serde_json::json;
use transit_core::{
    apply_alteration, roll_back_alteration, Alteration, FeaturePath, FeatureType,
    NetworkFeatureChange, PathKey,
};

#[derive(Debug, Clone)]
enum Op {
    /// Add a station and thread it into `seg1` next to an existing node.
    Thread { anchor: usize, left: bool },
    /// Rename `s1`.
    Rename(String),
    /// Shift `s2` horizontally.
    Nudge(i32),
    /// Add a station and write it into `seg1.nodes` at an index.
    Splice(usize),
    /// Delete the `seg1.nodes` slot at an index.
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), any::<bool>()).prop_map(|(anchor, left)| Op::Thread { anchor, left }),
        "[A-Z][a-z]{1,8}".prop_map(Op::Rename),
        (-50i32..50).prop_map(Op::Nudge),
        any::<usize>().prop_map(Op::Splice),
        any::<usize>().prop_map(Op::Delete),
    ]
}

/// Builds the alteration for `ops` and the `seg1` node order it should produce.
fn build(ops: &[Op]) -> (Alteration, Vec<String>) {
    let mut nodes = vec!["s1".to_owned(), "s2".to_owned()];
    let mut name = "S1".to_owned();
    let mut x = 2.0_f64;
    let mut builder = AlterationBuilder::new("gen", "2022-01-01T00:00:00Z");
    for (i, op) in ops.iter().enumerate() {
        match op {
            Op::Thread { anchor, left } => {
                let id = format!("p{i}");
                let anchor_id = nodes[anchor % nodes.len()].clone();
                let at = nodes.iter().position(|n| *n == anchor_id).unwrap();
                builder = builder.add(station(&id, f64::from(u8::try_from(i).unwrap()), 0.0));
                if *left {
                    builder = builder.insert_before(
                        FeatureType::Segment,
                        "seg1",
                        "nodes",
                        &anchor_id,
                        &id,
                    );
                    nodes.insert(at, id.clone());
                } else {
                    builder = builder.insert_after(
                        FeatureType::Segment,
                        "seg1",
                        "nodes",
                        &anchor_id,
                        &id,
                    );
                    nodes.insert(at + 1, id.clone());
                }
                builder = builder.append(FeatureType::System, "sys1", "nodes", &id);
            }
            Op::Rename(next) => {
                builder = builder.set_field(
                    FeatureType::Station,
                    "s1",
                    "name",
                    Some(json!(name)),
                    Some(json!(next)),
                );
                name.clone_from(next);
            }
            Op::Nudge(dx) => {
                let nx = x + f64::from(*dx);
                builder = builder.change(NetworkFeatureChange::set(
                    FeatureType::Station,
                    "s2",
                    FeaturePath::new(["position", "x"]),
                    Some(json!(x)),
                    Some(json!(nx)),
                ));
                x = nx;
            }
            Op::Splice(at) => {
                let id = format!("p{i}");
                let at = at % (nodes.len() + 1);
                builder = builder.add(station(&id, 0.0, f64::from(u8::try_from(i).unwrap())));
                builder = builder.change(NetworkFeatureChange::set(
                    FeatureType::Segment,
                    "seg1",
                    FeaturePath::new([PathKey::from("nodes"), PathKey::Index(at)]),
                    None,
                    Some(json!(id)),
                ));
                nodes.insert(at, id);
            }
            Op::Delete(at) => {
                if nodes.len() < 2 {
                    continue;
                }
                let at = at % nodes.len();
                let gone = nodes.remove(at);
                builder = builder.change(NetworkFeatureChange::set(
                    FeatureType::Segment,
                    "seg1",
                    FeaturePath::new([PathKey::from("nodes"), PathKey::Index(at)]),
                    Some(json!(gone)),
                    None,
                ));
            }
        }
    }
    (builder.build(), nodes)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn roll_back_inverts_apply(ops in prop::collection::vec(op(), 1..12)) {
        let seed = reference_state();
        let (alteration, expected_nodes) = build(&ops);

        let applied = apply_alteration(&seed, &alteration).unwrap();
        prop_assert_eq!(segment_nodes(&applied, "seg1"), expected_nodes);
        prop_assert!(applied.dangling_references().is_empty());

        let restored = roll_back_alteration(&applied, &alteration).unwrap();
        prop_assert_eq!(
            restored.state_digest().unwrap(),
            seed.state_digest().unwrap()
        );
        prop_assert_eq!(restored, seed);
    }
}
