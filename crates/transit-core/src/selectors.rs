// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pure read queries over a [`NetworkState`] and its [`Network`] ledger.

use crate::alteration::{Alteration, LedgerError, Network};
use crate::hydrate::{hydrate_feature, Hydrate, HydrateError};
use crate::ident::{AlterationId, FeatureId};
use crate::model::{FeatureType, HydratedFeature, HydratedLine, HydratedSegment, HydratedSystem};
use crate::state::NetworkState;

/// The flat state itself.
#[must_use]
pub const fn get_network(state: &NetworkState) -> &NetworkState {
    state
}

/// Hydrated system `id`, or `None` if it is not stored.
pub fn get_system(
    state: &NetworkState,
    id: &FeatureId,
) -> Result<Option<HydratedSystem>, HydrateError> {
    state.system.get(id).map(|s| s.hydrate(state)).transpose()
}

/// Hydrated feature `id` of type `feature_type`.
///
/// `None` when the bucket has no such id, or holds it under the other node type.
pub fn get_feature(
    state: &NetworkState,
    id: &FeatureId,
    feature_type: FeatureType,
) -> Result<Option<HydratedFeature>, HydrateError> {
    let stored = state
        .get(feature_type.bucket(), id)
        .filter(|f| f.feature_type() == feature_type);
    hydrate_feature(state, stored.as_ref())
}

/// Every segment of `line`, flattened across its services in order.
pub fn segments_of_line(line: &HydratedLine) -> impl Iterator<Item = &HydratedSegment> {
    line.services.iter().flat_map(|service| service.segments.iter())
}

/// Lines of system `system_id` that run over segment `segment_id`.
///
/// Empty when the system is not stored.
pub fn get_segment_lines(
    state: &NetworkState,
    system_id: &FeatureId,
    segment_id: &FeatureId,
) -> Result<Vec<HydratedLine>, HydrateError> {
    let Some(system) = get_system(state, system_id)? else {
        return Ok(Vec::new());
    };
    Ok(system
        .lines
        .into_iter()
        .filter(|line| segments_of_line(line).any(|segment| &segment.id == segment_id))
        .collect())
}

/// Id of the most recently applied alteration.
#[must_use]
pub fn peek_alteration_stack(state: &NetworkState) -> Option<&AlterationId> {
    state.head()
}

/// Ledger record of the applied head.
#[must_use]
pub fn get_head_alteration<'a>(
    network: Option<&'a Network>,
    state: &NetworkState,
) -> Option<&'a Alteration> {
    let head = peek_alteration_stack(state)?;
    network?.ledger.get(head)
}

/// Alteration to apply next.
///
/// With nothing applied this is the first ledger entry. Otherwise it is the
/// entry after the head: `Ok(None)` once the head is the last entry, and
/// [`LedgerError::HeadNotFound`] when the head is not in the ledger.
pub fn get_next_alteration<'a>(
    network: Option<&'a Network>,
    state: &NetworkState,
) -> Result<Option<&'a Alteration>, LedgerError> {
    let Some(network) = network else {
        return Ok(None);
    };
    match peek_alteration_stack(state) {
        None => Ok(network.ledger.first()),
        Some(head) => network.ledger.after(head),
    }
}
