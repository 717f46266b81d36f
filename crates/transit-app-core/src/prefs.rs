// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted preferences for transit tools (reducer checks, CLI output).

use serde::{Deserialize, Serialize};

/// Config key under which [`CliPrefs`] are stored.
pub const CLI_PREFS_KEY: &str = "transit_cli";

/// Reducer behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ReducerPrefs {
    /// Refuse alterations that leave dangling references.
    pub verify_references: bool,
}

/// Saved preferences for the `transit` command-line tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CliPrefs {
    /// `tracing` filter used when neither `--log` nor `RUST_LOG` is set.
    pub log_filter: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// Reducer switches.
    pub reducer: ReducerPrefs,
}

impl Default for CliPrefs {
    fn default() -> Self {
        Self {
            log_filter: None,
            pretty: true,
            reducer: ReducerPrefs::default(),
        }
    }
}
