// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Diff-apply engine: applies one alteration to a [`NetworkState`] or rolls
//! it back.
//!
//! Every operation is all-or-nothing. The input state is borrowed and never
//! modified; on success a new state is returned, on failure nothing changes.
//!
//! Apply runs three phases against a working copy:
//!
//! 1. removals leave their buckets,
//! 2. additions enter their buckets,
//! 3. changes run in order, writing each change's `right` value,
//!
//! and then pushes the alteration id. Rollback is the exact mirror: changes in
//! reverse order writing `left`, additions removed, removals restored, id
//! popped.

use serde::Deserialize as _;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::alteration::{Alteration, Direction, NetworkFeatureChange};
use crate::ident::{AlterationId, FeatureId};
use crate::list_mutation::{mutate_list, ListMutationError};
use crate::model::{BucketKind, FeatureType, NetworkFeature};
use crate::path::{get_at, insert_at, remove_at, set_at, PathError};
use crate::state::{DanglingReference, NetworkState};

/// Events accepted by the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    /// Replace the state wholesale, bypassing the ledger.
    Restore(NetworkState),
    /// Apply an alteration on top of the current state.
    ApplyAlteration(Alteration),
    /// Undo the alteration at the top of the stack.
    RollBackAlteration(Alteration),
}

/// Reasons an event is refused.
#[derive(Debug, Error)]
pub enum ReducerError {
    /// The alteration is not at the top of the stack.
    #[error(
        "cannot roll back {requested}: stack top is {}",
        .top.as_ref().map_or("empty", AlterationId::as_str)
    )]
    InvalidRollback {
        /// Alteration the caller asked to undo.
        requested: AlterationId,
        /// Actual stack top.
        top: Option<AlterationId>,
    },
    /// A removal names a feature that is not stored.
    #[error("alteration {alteration} removes {bucket} {id}, which does not exist")]
    MissingFeature {
        /// Alteration being replayed.
        alteration: AlterationId,
        /// Bucket searched.
        bucket: BucketKind,
        /// Missing id.
        id: FeatureId,
    },
    /// A change targets a feature that is not stored.
    #[error("change targets {bucket} {id}, which does not exist")]
    UnresolvedFeature {
        /// Bucket searched.
        bucket: BucketKind,
        /// Missing id.
        id: FeatureId,
    },
    /// The stored feature has a different type than the change claims.
    #[error("change expects {id} to be a {expected}, found a {found}")]
    FeatureTypeMismatch {
        /// Target feature.
        id: FeatureId,
        /// Type named by the change.
        expected: FeatureType,
        /// Type actually stored.
        found: FeatureType,
    },
    /// A change with an empty path.
    #[error("change on {id} has an empty path")]
    EmptyPath {
        /// Target feature.
        id: FeatureId,
    },
    /// A change addresses `id` or `type`.
    #[error("field `{field}` of {id} is immutable")]
    ImmutableField {
        /// Target feature.
        id: FeatureId,
        /// Addressed field.
        field: String,
    },
    /// A change addresses a property the feature type does not have.
    #[error("{feature_type} {id} has no field `{field}`")]
    UnknownField {
        /// Target feature.
        id: FeatureId,
        /// Its type.
        feature_type: FeatureType,
        /// Addressed field.
        field: String,
    },
    /// The path could not be read or written.
    #[error("path `{path}` on {id}")]
    Path {
        /// Target feature.
        id: FeatureId,
        /// Rendered path.
        path: String,
        /// Underlying failure.
        #[source]
        source: PathError,
    },
    /// A list-mutation change found no list of ids at its path.
    #[error("path `{path}` on {id} is not a reference list")]
    NotAList {
        /// Target feature.
        id: FeatureId,
        /// Rendered path.
        path: String,
    },
    /// The list mutation could not be positioned.
    #[error("list mutation at `{path}` on {id}")]
    ListMutation {
        /// Target feature.
        id: FeatureId,
        /// Rendered path.
        path: String,
        /// Underlying failure.
        #[source]
        source: ListMutationError,
    },
    /// The edited feature no longer has a valid shape.
    #[error("change leaves {id} malformed")]
    InvalidChange {
        /// Target feature.
        id: FeatureId,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// The result would contain references to missing features.
    #[error("alteration {alteration} leaves {} dangling reference(s)", .dangling.len())]
    DanglingReferences {
        /// Alteration being replayed.
        alteration: AlterationId,
        /// Every unresolved reference.
        dangling: Vec<DanglingReference>,
    },
}

/// Reducer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkReducer {
    /// Refuse any apply or rollback whose result has dangling references.
    pub verify_references: bool,
}

impl NetworkReducer {
    /// Reducer without reference verification.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            verify_references: false,
        }
    }

    /// Reducer that rejects results with dangling references.
    #[must_use]
    pub const fn verifying() -> Self {
        Self {
            verify_references: true,
        }
    }

    /// Handles one event.
    pub fn reduce(
        &self,
        state: &NetworkState,
        event: &NetworkEvent,
    ) -> Result<NetworkState, ReducerError> {
        match event {
            NetworkEvent::Restore(next) => Ok(next.clone()),
            NetworkEvent::ApplyAlteration(alteration) => self.apply(state, alteration),
            NetworkEvent::RollBackAlteration(alteration) => self.roll_back(state, alteration),
        }
    }

    /// Applies `alteration` on top of `state`.
    pub fn apply(
        &self,
        state: &NetworkState,
        alteration: &Alteration,
    ) -> Result<NetworkState, ReducerError> {
        let mut next = state.clone();
        remove_features(&mut next, &alteration.id, &alteration.removals)?;
        add_features(&mut next, &alteration.additions);
        for change in &alteration.changes {
            apply_change(&mut next, change, Direction::Forward)?;
        }
        next.alteration_stack.push(alteration.id.clone());
        self.verify(&next, &alteration.id)?;
        debug!(
            alteration = %alteration.id,
            additions = alteration.additions.len(),
            removals = alteration.removals.len(),
            changes = alteration.changes.len(),
            "applied alteration"
        );
        Ok(next)
    }

    /// Undoes `alteration`, which must be the top of the stack.
    pub fn roll_back(
        &self,
        state: &NetworkState,
        alteration: &Alteration,
    ) -> Result<NetworkState, ReducerError> {
        if state.head() != Some(&alteration.id) {
            return Err(ReducerError::InvalidRollback {
                requested: alteration.id.clone(),
                top: state.head().cloned(),
            });
        }
        let mut next = state.clone();
        for change in alteration.changes.iter().rev() {
            apply_change(&mut next, change, Direction::Backward)?;
        }
        remove_features(&mut next, &alteration.id, &alteration.additions)?;
        add_features(&mut next, &alteration.removals);
        next.alteration_stack.pop();
        self.verify(&next, &alteration.id)?;
        debug!(
            alteration = %alteration.id,
            depth = next.alteration_stack.len(),
            "rolled back alteration"
        );
        Ok(next)
    }

    fn verify(&self, state: &NetworkState, alteration: &AlterationId) -> Result<(), ReducerError> {
        if !self.verify_references {
            return Ok(());
        }
        let dangling = state.dangling_references();
        if dangling.is_empty() {
            Ok(())
        } else {
            Err(ReducerError::DanglingReferences {
                alteration: alteration.clone(),
                dangling,
            })
        }
    }
}

/// Applies `alteration` with the default reducer.
pub fn apply_alteration(
    state: &NetworkState,
    alteration: &Alteration,
) -> Result<NetworkState, ReducerError> {
    NetworkReducer::new().apply(state, alteration)
}

/// Rolls back `alteration` with the default reducer.
pub fn roll_back_alteration(
    state: &NetworkState,
    alteration: &Alteration,
) -> Result<NetworkState, ReducerError> {
    NetworkReducer::new().roll_back(state, alteration)
}

/// Handles `event` with the default reducer.
pub fn reduce(state: &NetworkState, event: &NetworkEvent) -> Result<NetworkState, ReducerError> {
    NetworkReducer::new().reduce(state, event)
}

fn remove_features(
    state: &mut NetworkState,
    alteration: &AlterationId,
    features: &[NetworkFeature],
) -> Result<(), ReducerError> {
    for feature in features {
        let bucket = feature.feature_type().bucket();
        let stored = state
            .remove(bucket, feature.id())
            .ok_or_else(|| ReducerError::MissingFeature {
                alteration: alteration.clone(),
                bucket,
                id: feature.id().clone(),
            })?;
        if &stored != feature {
            warn!(
                alteration = %alteration,
                feature = %feature.id(),
                %bucket,
                "removed feature differs from the recorded payload"
            );
        }
    }
    Ok(())
}

fn add_features(state: &mut NetworkState, features: &[NetworkFeature]) {
    for feature in features {
        let bucket = feature.feature_type().bucket();
        if state.contains(bucket, feature.id()) {
            debug!(feature = %feature.id(), %bucket, "addition replaces an existing feature");
        }
        state.insert(feature.clone());
    }
}

fn apply_change(
    state: &mut NetworkState,
    change: &NetworkFeatureChange,
    direction: Direction,
) -> Result<(), ReducerError> {
    let id = &change.feature_id;
    let bucket = change.feature_type.bucket();
    let feature = state
        .get(bucket, id)
        .ok_or_else(|| ReducerError::UnresolvedFeature {
            bucket,
            id: id.clone(),
        })?;
    if feature.feature_type() != change.feature_type {
        return Err(ReducerError::FeatureTypeMismatch {
            id: id.clone(),
            expected: change.feature_type,
            found: feature.feature_type(),
        });
    }
    let field = change
        .path
        .root_field()
        .ok_or_else(|| ReducerError::EmptyPath { id: id.clone() })?;
    if field == "id" || field == "type" {
        return Err(ReducerError::ImmutableField {
            id: id.clone(),
            field,
        });
    }
    if !change.feature_type.mutable_fields().contains(&field.as_str()) {
        return Err(ReducerError::UnknownField {
            id: id.clone(),
            feature_type: change.feature_type,
            field,
        });
    }

    let invalid = |source: serde_json::Error| ReducerError::InvalidChange {
        id: id.clone(),
        source,
    };
    let path_error = |source: PathError| ReducerError::Path {
        id: id.clone(),
        path: change.path.to_string(),
        source,
    };
    let mut doc = serde_json::to_value(&feature).map_err(invalid)?;

    match (&change.mutate_list, change.value(direction)) {
        (Some(mutation), value) => {
            let list: Vec<FeatureId> = get_at(&doc, &change.path)
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .ok_or_else(|| ReducerError::NotAList {
                    id: id.clone(),
                    path: change.path.to_string(),
                })?;
            let value = value.map(reference).transpose().map_err(invalid)?;
            let companion = change
                .companion(direction)
                .map(reference)
                .transpose()
                .map_err(invalid)?;
            let next = mutate_list(&list, mutation, value, companion.as_ref()).map_err(|source| {
                ReducerError::ListMutation {
                    id: id.clone(),
                    path: change.path.to_string(),
                    source,
                }
            })?;
            let next = serde_json::to_value(next).map_err(invalid)?;
            set_at(&mut doc, &change.path, next).map_err(path_error)?;
        }
        // No prior value: an array index names a new slot and the write splices.
        (None, Some(value)) if change.companion(direction).is_none() => {
            insert_at(&mut doc, &change.path, value.clone()).map_err(path_error)?;
        }
        (None, Some(value)) => {
            set_at(&mut doc, &change.path, value.clone()).map_err(path_error)?;
        }
        (None, None) => {
            remove_at(&mut doc, &change.path).map_err(path_error)?;
        }
    }

    let updated: NetworkFeature = serde_json::from_value(doc).map_err(invalid)?;
    state.insert(updated);
    Ok(())
}

fn reference(value: &Value) -> Result<FeatureId, serde_json::Error> {
    FeatureId::deserialize(value)
}
