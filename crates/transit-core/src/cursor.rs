// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stepwise navigation of a network's ledger.
//!
//! The cursor position is the number of ledger entries applied: `0` is the
//! origin (nothing from the ledger applied), `ledger.len()` is the frontier.
//! Moving forward applies the next entry; moving back rolls back the head.
//! Seeking is a series of single steps, so every intermediate state passes
//! through the reducer's checks.

use thiserror::Error;
use tracing::debug;

use crate::alteration::LedgerError;
use crate::ident::AlterationId;
use crate::reducer::{NetworkEvent, ReducerError};
use crate::store::NetworkStore;

/// What a cursor operation did.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepResult {
    /// Already at the requested position.
    NoOp,
    /// One or more entries applied.
    Advanced,
    /// One or more entries rolled back.
    RolledBack,
    /// No entry left to apply.
    ReachedFrontier,
    /// Nothing left to roll back.
    ReachedOrigin,
}

/// Errors raised while moving a cursor.
#[derive(Debug, Error)]
pub enum CursorError {
    /// The store has no network loaded.
    #[error("no network loaded")]
    NoNetwork,
    /// The applied stack does not line up with the ledger.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The reducer refused a step.
    #[error(transparent)]
    Reducer(#[from] ReducerError),
    /// Seek target is not in the ledger.
    #[error("alteration {0} is not in the ledger")]
    UnknownTarget(AlterationId),
}

/// Cursor over the ledger of the store's loaded network.
#[derive(Debug)]
pub struct LedgerCursor {
    store: NetworkStore,
}

impl LedgerCursor {
    /// Wraps `store`; it must have a network loaded before the cursor moves.
    #[must_use]
    pub const fn new(store: NetworkStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &NetworkStore {
        &self.store
    }

    /// Mutable access to the underlying store.
    pub fn store_mut(&mut self) -> &mut NetworkStore {
        &mut self.store
    }

    /// Releases the store.
    #[must_use]
    pub fn into_store(self) -> NetworkStore {
        self.store
    }

    /// Number of ledger entries currently applied.
    pub fn position(&self) -> Result<usize, CursorError> {
        let network = self.store.network().ok_or(CursorError::NoNetwork)?;
        let state = self.store.state();
        match state.head() {
            None => Ok(0),
            Some(head) => network
                .ledger
                .position(head)
                .map(|index| index + 1)
                .ok_or_else(|| LedgerError::HeadNotFound(head.clone()).into()),
        }
    }

    /// Applies the next ledger entry.
    pub fn step_forward(&mut self) -> Result<StepResult, CursorError> {
        if self.store.network().is_none() {
            return Err(CursorError::NoNetwork);
        }
        let Some(next) = self.store.next_alteration()?.cloned() else {
            return Ok(StepResult::ReachedFrontier);
        };
        self.store.dispatch(NetworkEvent::ApplyAlteration(next))?;
        Ok(StepResult::Advanced)
    }

    /// Rolls back the head entry.
    pub fn step_back(&mut self) -> Result<StepResult, CursorError> {
        let network = self.store.network().ok_or(CursorError::NoNetwork)?;
        let state = self.store.state();
        let Some(head) = state.head() else {
            return Ok(StepResult::ReachedOrigin);
        };
        let alteration = network
            .ledger
            .get(head)
            .cloned()
            .ok_or_else(|| LedgerError::HeadNotFound(head.clone()))?;
        self.store.dispatch(NetworkEvent::RollBackAlteration(alteration))?;
        Ok(StepResult::RolledBack)
    }

    /// Moves until `target` is the head; `None` targets the origin.
    pub fn seek_to(&mut self, target: Option<&AlterationId>) -> Result<StepResult, CursorError> {
        let network = self.store.network().ok_or(CursorError::NoNetwork)?;
        let desired = match target {
            None => 0,
            Some(id) => network
                .ledger
                .position(id)
                .map(|index| index + 1)
                .ok_or_else(|| CursorError::UnknownTarget(id.clone()))?,
        };
        let mut current = self.position()?;
        if current == desired {
            return Ok(StepResult::NoOp);
        }
        let result = if current < desired {
            StepResult::Advanced
        } else {
            StepResult::RolledBack
        };
        while current < desired {
            self.step_forward()?;
            current += 1;
        }
        while current > desired {
            self.step_back()?;
            current -= 1;
        }
        debug!(position = current, ?target, "cursor seek complete");
        Ok(result)
    }

    /// Applies every remaining entry.
    pub fn fast_forward(&mut self) -> Result<StepResult, CursorError> {
        let mut moved = false;
        while self.step_forward()? == StepResult::Advanced {
            moved = true;
        }
        Ok(if moved { StepResult::Advanced } else { StepResult::ReachedFrontier })
    }

    /// Rolls back every applied ledger entry.
    pub fn rewind(&mut self) -> Result<StepResult, CursorError> {
        match self.seek_to(None)? {
            StepResult::NoOp => Ok(StepResult::ReachedOrigin),
            other => Ok(other),
        }
    }
}
