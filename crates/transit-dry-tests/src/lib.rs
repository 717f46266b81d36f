// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for transit crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`builders`] - `NetworkState` and `Alteration` builders plus feature constructors
//! - [`fixtures`] - The reference network (s1/s2/seg1/svc1/L1/sys1) and a three-entry ledger

pub mod builders;
pub mod config;
pub mod fixtures;

pub use builders::{
    geometry_node, line, segment, service, station, system, AlterationBuilder, NetworkStateBuilder,
};
pub use config::InMemoryConfigStore;
pub use fixtures::{reference_ledger, reference_network, reference_state};
