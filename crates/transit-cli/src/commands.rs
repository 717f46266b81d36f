// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Subcommand bodies.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};
use transit_app_core::prefs::CliPrefs;
use transit_core::selectors::{get_segment_lines, get_system, segments_of_line};
use transit_core::{
    AlterationId, FeatureId, LedgerCursor, Network, NetworkEvent, NetworkReducer, NetworkState,
    NetworkStore,
};

use crate::Source;

/// How JSON results are written to stdout.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Output {
    pub(crate) pretty: bool,
}

impl Output {
    fn print<T: Serialize>(self, value: &T) -> Result<()> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{text}");
        Ok(())
    }
}

pub(crate) const fn reducer_for(prefs: &CliPrefs) -> NetworkReducer {
    NetworkReducer {
        verify_references: prefs.reducer.verify_references,
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("failed to open {what} {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {what} {}", path.display()))
}

/// Loads the network and seed into a fresh store at the ledger origin.
fn open_cursor(source: &Source, reducer: NetworkReducer) -> Result<LedgerCursor> {
    let network: Network = read_json(&source.network, "network")?;
    let seed = match &source.seed {
        Some(path) => read_json(path, "seed state")?,
        None => NetworkState::default(),
    };
    debug!(network = %network.id, alterations = network.ledger.len(), "loaded network");
    let mut store = NetworkStore::new(reducer);
    store.load_network(network);
    store
        .dispatch(NetworkEvent::Restore(seed))
        .context("failed to restore seed state")?;
    Ok(LedgerCursor::new(store))
}

/// Seeks to `to`, or to the frontier when no target is given.
fn replay_to(cursor: &mut LedgerCursor, to: Option<&str>) -> Result<()> {
    match to {
        Some(id) => {
            let target = AlterationId::from(id);
            cursor
                .seek_to(Some(&target))
                .with_context(|| format!("failed to replay to {target}"))?;
        }
        None => {
            cursor.fast_forward().context("failed to replay ledger")?;
        }
    }
    info!(position = cursor.position()?, "replayed");
    Ok(())
}

pub(crate) fn inspect(path: &Path) -> Result<()> {
    let network: Network = read_json(path, "network")?;
    println!(
        "network {} ({} x {}), {} alterations",
        network.id,
        network.size.x,
        network.size.y,
        network.ledger.len()
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["#", "id", "date", "additions", "removals", "changes"]);
    for (index, alteration) in network.ledger.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index),
            Cell::new(&alteration.id),
            Cell::new(&alteration.date),
            Cell::new(alteration.additions.len()),
            Cell::new(alteration.removals.len()),
            Cell::new(alteration.changes.len()),
        ]);
    }
    println!("{table}");

    for alteration in network.ledger.iter().filter(|a| a.is_empty()) {
        println!("warning: alteration {} carries no edits", alteration.id);
    }
    if let Err(err) = network.ledger.check_chronology() {
        println!("warning: {err}");
    }
    Ok(())
}

pub(crate) fn replay(
    source: &Source,
    reducer: NetworkReducer,
    to: Option<&str>,
    system: Option<&str>,
    out: Output,
) -> Result<()> {
    let mut cursor = open_cursor(source, reducer)?;
    replay_to(&mut cursor, to)?;
    let state = cursor.store().state();
    match system {
        Some(id) => {
            let Some(hydrated) = get_system(&state, &FeatureId::from(id))? else {
                bail!("system {id} does not exist at this point in the ledger");
            };
            out.print(&hydrated)
        }
        None => out.print(&*state),
    }
}

pub(crate) fn lines(
    source: &Source,
    reducer: NetworkReducer,
    to: Option<&str>,
    system: &str,
    segment: &str,
) -> Result<()> {
    let mut cursor = open_cursor(source, reducer)?;
    replay_to(&mut cursor, to)?;
    let state = cursor.store().state();
    let lines = get_segment_lines(&state, &FeatureId::from(system), &FeatureId::from(segment))?;
    if lines.is_empty() {
        println!("no line of {system} runs over {segment}");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["id", "name", "color", "services", "segments"]);
    for line in &lines {
        table.add_row(vec![
            Cell::new(&line.id),
            Cell::new(&line.name),
            Cell::new(&line.color),
            Cell::new(line.services.len()),
            Cell::new(segments_of_line(line).count()),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub(crate) fn verify(source: &Source, reducer: NetworkReducer) -> Result<()> {
    let mut cursor = open_cursor(source, reducer)?;
    let seed = cursor.store().state().state_digest_hex()?;

    cursor.fast_forward().context("ledger does not apply cleanly")?;
    let applied = cursor.position()?;
    let frontier = cursor.store().state().state_digest_hex()?;

    cursor.rewind().context("ledger does not roll back cleanly")?;
    let restored = cursor.store().state().state_digest_hex()?;
    if restored != seed {
        bail!("rolling back the ledger left {restored}, expected seed {seed}");
    }

    println!("ok: {applied} alterations applied and rolled back");
    println!("seed     {seed}");
    println!("frontier {frontier}");
    Ok(())
}
