// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single state container: owns the current [`NetworkState`], the loaded
//! region [`Network`], and the listeners that re-derive views on change.
//!
//! Events are processed one at a time in dispatch order. A refused event
//! leaves the state untouched and notifies nobody.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::alteration::{Alteration, LedgerError, Network};
use crate::reducer::{NetworkEvent, NetworkReducer, ReducerError};
use crate::selectors::{get_head_alteration, get_next_alteration};
use crate::state::NetworkState;

/// Handle returned by [`NetworkStore::subscribe`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&NetworkState)>;

/// Owner of the network state for one session.
pub struct NetworkStore {
    state: Arc<NetworkState>,
    network: Option<Network>,
    reducer: NetworkReducer,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for NetworkStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkStore")
            .field("state", &self.state)
            .field("network", &self.network.as_ref().map(|n| &n.id))
            .field("reducer", &self.reducer)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for NetworkStore {
    fn default() -> Self {
        Self::new(NetworkReducer::default())
    }
}

impl NetworkStore {
    /// Empty store using `reducer`.
    #[must_use]
    pub fn new(reducer: NetworkReducer) -> Self {
        Self {
            state: Arc::new(NetworkState::default()),
            network: None,
            reducer,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current state snapshot. Later dispatches never modify it.
    #[must_use]
    pub fn state(&self) -> Arc<NetworkState> {
        Arc::clone(&self.state)
    }

    /// Loaded region network, if any.
    #[must_use]
    pub fn network(&self) -> Option<&Network> {
        self.network.as_ref()
    }

    /// Reducer configuration in use.
    #[must_use]
    pub const fn reducer(&self) -> NetworkReducer {
        self.reducer
    }

    /// Replaces the region network and returns the previous one.
    pub fn load_network(&mut self, network: Network) -> Option<Network> {
        debug!(network = %network.id, alterations = network.ledger.len(), "loaded network");
        self.network.replace(network)
    }

    /// Runs `event` through the reducer and publishes the new state.
    pub fn dispatch(&mut self, event: NetworkEvent) -> Result<(), ReducerError> {
        let next = match self.reducer.reduce(&self.state, &event) {
            Ok(next) => next,
            Err(err) => {
                warn!(%err, "network event refused");
                return Err(err);
            }
        };
        self.state = Arc::new(next);
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
        Ok(())
    }

    /// Registers `listener`; it runs after every state replacement, after the
    /// listeners registered before it.
    pub fn subscribe(&mut self, listener: impl FnMut(&NetworkState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Evaluates a pure query against the current state.
    pub fn select<T>(&self, query: impl FnOnce(&NetworkState) -> T) -> T {
        query(&self.state)
    }

    /// Ledger record of the applied head.
    #[must_use]
    pub fn head_alteration(&self) -> Option<&Alteration> {
        get_head_alteration(self.network.as_ref(), &self.state)
    }

    /// Next ledger entry to apply.
    pub fn next_alteration(&self) -> Result<Option<&Alteration>, LedgerError> {
        get_next_alteration(self.network.as_ref(), &self.state)
    }
}
