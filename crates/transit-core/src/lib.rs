// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! transit-core: alteration ledger and network-state reducer for transit maps.
//!
//! A network is stored as a flat, id-keyed [`NetworkState`] plus an ordered
//! [`Ledger`] of reversible [`Alteration`]s. The [`reducer`] applies or rolls
//! back one alteration at a time, [`hydrate`] rebuilds the nested feature graph
//! on read, and [`LedgerCursor`] walks the ledger stepwise.
#![forbid(unsafe_code)]

mod alteration;
mod cursor;
/// Read-side reconstruction of nested features.
pub mod hydrate;
mod ident;
mod list_mutation;
mod model;
mod path;
/// Apply and rollback of alterations.
pub mod reducer;
/// Pure read queries.
pub mod selectors;
mod state;
mod store;

/// Alterations, ledger, and region network.
pub use alteration::{Alteration, Direction, Ledger, LedgerError, Network, NetworkFeatureChange};
/// Stepwise ledger navigation.
pub use cursor::{CursorError, LedgerCursor, StepResult};
pub use hydrate::{
    hydrate_feature, hydrate_line, hydrate_segment, hydrate_service, hydrate_system, Hydrate,
    HydrateError,
};
/// Identifier newtypes.
pub use ident::{AlterationId, FeatureId};
/// Relative list mutation.
pub use list_mutation::{mutate_list, ListMutation, ListMutationError, ListSide};
/// Feature records.
pub use model::{
    BucketKind, Dehydrate, FeatureType, GeometryNode, HydratedFeature, HydratedLine,
    HydratedSegment, HydratedService, HydratedSystem, Line, Mode, NetworkFeature, NetworkNode,
    Referenced, Segment, Service, ServiceType, Station, System, Vector2,
};
/// Property paths into feature JSON.
pub use path::{get_at, insert_at, remove_at, set_at, FeaturePath, PathError, PathKey};
pub use reducer::{
    apply_alteration, reduce, roll_back_alteration, NetworkEvent, NetworkReducer, ReducerError,
};
/// Flat state.
pub use state::{DanglingReference, Hash, NetworkState};
/// State container.
pub use store::{NetworkStore, SubscriptionId};
