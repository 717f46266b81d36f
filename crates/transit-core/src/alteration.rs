// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Alterations and the append-only ledger that orders them.
//!
//! An [`Alteration`] is a self-contained, reversible diff: whole features added
//! or removed, plus field-level [`NetworkFeatureChange`]s carrying both the
//! before (`left`) and after (`right`) value. A [`Network`] owns the ledger of
//! one region.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::ident::{AlterationId, FeatureId};
use crate::list_mutation::ListMutation;
use crate::model::{FeatureType, NetworkFeature, Vector2};
use crate::path::FeaturePath;

/// Which way an alteration is being replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Applying: changes write their `right` value.
    Forward,
    /// Rolling back: changes write their `left` value.
    Backward,
}

impl Direction {
    /// The opposite direction.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

// Present-but-null must stay distinct from absent.
fn present<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(de).map(Some)
}

/// Field-level edit of one feature.
///
/// An absent `left`/`right` means "no value": writing it removes the property
/// (or, with `mutate_list`, removes a list element).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFeatureChange {
    /// Target feature.
    pub feature_id: FeatureId,
    /// Target feature's type; selects the bucket.
    pub feature_type: FeatureType,
    /// Property addressed on the target.
    pub path: FeaturePath,
    /// Value before the change.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub left: Option<Value>,
    /// Value after the change.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub right: Option<Value>,
    /// Relative positioning when the path holds a reference list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutate_list: Option<ListMutation>,
}

impl NetworkFeatureChange {
    /// Whole-value replacement of `path`.
    pub fn set(
        feature_type: FeatureType,
        feature_id: impl Into<FeatureId>,
        path: FeaturePath,
        left: Option<Value>,
        right: Option<Value>,
    ) -> Self {
        Self {
            feature_id: feature_id.into(),
            feature_type,
            path,
            left,
            right,
            mutate_list: None,
        }
    }

    /// Insertion of `item` into the reference list at `path`.
    pub fn insert_into(
        feature_type: FeatureType,
        feature_id: impl Into<FeatureId>,
        path: FeaturePath,
        item: impl Into<FeatureId>,
        mutation: ListMutation,
    ) -> Self {
        Self {
            feature_id: feature_id.into(),
            feature_type,
            path,
            left: None,
            right: Some(Value::String(item.into().into_inner())),
            mutate_list: Some(mutation),
        }
    }

    /// Value written when replaying in `direction`.
    #[must_use]
    pub fn value(&self, direction: Direction) -> Option<&Value> {
        match direction {
            Direction::Forward => self.right.as_ref(),
            Direction::Backward => self.left.as_ref(),
        }
    }

    /// Value on the other side; names the element a list removal deletes.
    #[must_use]
    pub fn companion(&self, direction: Direction) -> Option<&Value> {
        self.value(direction.reverse())
    }
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alteration {
    /// Stable identity within the ledger.
    pub id: AlterationId,
    /// ISO-8601 timestamp; establishes chronological order.
    pub date: String,
    /// Features created by this alteration.
    #[serde(default)]
    pub additions: Vec<NetworkFeature>,
    /// Features deleted by this alteration, as they were before deletion.
    #[serde(default)]
    pub removals: Vec<NetworkFeature>,
    /// Field-level edits, in application order.
    #[serde(default)]
    pub changes: Vec<NetworkFeatureChange>,
}

impl Alteration {
    /// Empty alteration.
    pub fn new(id: impl Into<AlterationId>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            additions: Vec::new(),
            removals: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// `true` when the alteration carries no edits at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty() && self.changes.is_empty()
    }
}

/// Ledger lookups and edits that can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// An alteration with this id is already recorded.
    #[error("alteration {0} is already in the ledger")]
    DuplicateId(AlterationId),
    /// The applied head is not an entry of this ledger.
    #[error("head alteration {0} is not in the ledger")]
    HeadNotFound(AlterationId),
    /// Entry `index` is dated before its predecessor.
    #[error("alteration {id} at index {index} is dated {date}, before {previous}")]
    OutOfOrder {
        /// Ledger position of the offending entry.
        index: usize,
        /// Offending entry.
        id: AlterationId,
        /// Its date.
        date: String,
        /// Date of the entry before it.
        previous: String,
    },
}

/// Ordered, append-only list of alterations.
///
/// Deserializing goes through [`Ledger::append`], so a document that repeats
/// an alteration id is rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Alteration>", into = "Vec<Alteration>")]
pub struct Ledger(Vec<Alteration>);

impl Ledger {
    /// Empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends `alteration` unless its id is already present.
    pub fn append(&mut self, alteration: Alteration) -> Result<(), LedgerError> {
        if self.position(&alteration.id).is_some() {
            return Err(LedgerError::DuplicateId(alteration.id));
        }
        self.0.push(alteration);
        Ok(())
    }

    /// Ledger index of `id`.
    #[must_use]
    pub fn position(&self, id: &AlterationId) -> Option<usize> {
        self.0.iter().position(|a| &a.id == id)
    }

    /// Entry with this id.
    #[must_use]
    pub fn get(&self, id: &AlterationId) -> Option<&Alteration> {
        self.0.iter().find(|a| &a.id == id)
    }

    /// Entry at `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Alteration> {
        self.0.get(index)
    }

    /// First entry.
    #[must_use]
    pub fn first(&self) -> Option<&Alteration> {
        self.0.first()
    }

    /// Entry directly after `id`.
    ///
    /// `Ok(None)` when `id` is the last entry; `HeadNotFound` when it is not
    /// in the ledger at all.
    pub fn after(&self, id: &AlterationId) -> Result<Option<&Alteration>, LedgerError> {
        let index = self
            .position(id)
            .ok_or_else(|| LedgerError::HeadNotFound(id.clone()))?;
        Ok(self.0.get(index + 1))
    }

    /// Entries in ledger order.
    pub fn iter(&self) -> std::slice::Iter<'_, Alteration> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Verifies dates never decrease along the ledger.
    ///
    /// Dates are compared as ISO-8601 strings. The first regression is
    /// logged and returned.
    pub fn check_chronology(&self) -> Result<(), LedgerError> {
        for (index, pair) in self.0.windows(2).enumerate() {
            if let [prev, next] = pair {
                if next.date < prev.date {
                    warn!(
                        alteration = %next.id,
                        date = %next.date,
                        previous = %prev.date,
                        "ledger dates are not monotonic"
                    );
                    return Err(LedgerError::OutOfOrder {
                        index: index + 1,
                        id: next.id.clone(),
                        date: next.date.clone(),
                        previous: prev.date.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<Alteration>> for Ledger {
    type Error = LedgerError;

    fn try_from(entries: Vec<Alteration>) -> Result<Self, Self::Error> {
        let mut ledger = Self(Vec::with_capacity(entries.len()));
        for alteration in entries {
            ledger.append(alteration)?;
        }
        Ok(ledger)
    }
}

impl From<Ledger> for Vec<Alteration> {
    fn from(ledger: Ledger) -> Self {
        ledger.0
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Alteration;
    type IntoIter = std::slice::Iter<'a, Alteration>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Region network: canvas size plus the full history of alterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// Network identifier.
    pub id: String,
    /// Canvas extent.
    pub size: Vector2,
    /// Ordered history.
    #[serde(default)]
    pub ledger: Ledger,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_absent_sides_differ() {
        let raw = json!({
            "featureId": "s1",
            "featureType": "station",
            "path": ["name"],
            "left": null
        });
        let change: Result<NetworkFeatureChange, _> = serde_json::from_value(raw);
        let change = change.ok();
        assert_eq!(
            change.as_ref().and_then(|c| c.left.clone()),
            Some(Value::Null)
        );
        assert_eq!(change.and_then(|c| c.right), None);
    }

    #[test]
    fn companion_is_the_opposite_side() {
        let change = NetworkFeatureChange::set(
            FeatureType::Station,
            "s1",
            FeaturePath::field("name"),
            Some(json!("Old")),
            Some(json!("New")),
        );
        assert_eq!(change.value(Direction::Forward), Some(&json!("New")));
        assert_eq!(change.companion(Direction::Forward), Some(&json!("Old")));
        assert_eq!(change.value(Direction::Backward), Some(&json!("Old")));
    }

    #[test]
    fn append_rejects_duplicates_and_after_distinguishes_end_from_unknown() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.append(Alteration::new("a1", "2020-01-01")), Ok(()));
        assert_eq!(ledger.append(Alteration::new("a2", "2020-02-01")), Ok(()));
        assert_eq!(
            ledger.append(Alteration::new("a1", "2020-03-01")),
            Err(LedgerError::DuplicateId("a1".into()))
        );
        let next = ledger.after(&"a1".into()).ok().flatten();
        assert_eq!(next.map(|a| a.id.as_str()), Some("a2"));
        assert_eq!(ledger.after(&"a2".into()), Ok(None));
        assert_eq!(
            ledger.after(&"zz".into()),
            Err(LedgerError::HeadNotFound("zz".into()))
        );
    }

    #[test]
    fn chronology_flags_first_regression() {
        let ledger = Ledger::try_from(vec![
            Alteration::new("a1", "2020-01-01"),
            Alteration::new("a2", "2019-12-31"),
            Alteration::new("a3", "2018-01-01"),
        ]);
        assert!(matches!(
            ledger.map(|l| l.check_chronology()),
            Ok(Err(LedgerError::OutOfOrder { index: 1, .. }))
        ));
    }

    #[test]
    fn loading_a_ledger_rejects_repeated_ids() {
        let entries = vec![
            Alteration::new("a1", "2020-01-01"),
            Alteration::new("a2", "2020-02-01"),
            Alteration::new("a1", "2020-03-01"),
        ];
        assert_eq!(
            Ledger::try_from(entries),
            Err(LedgerError::DuplicateId("a1".into()))
        );

        let raw = json!({
            "id": "north",
            "size": {"x": 100.0, "y": 100.0},
            "ledger": [
                {"id": "a1", "date": "2020-01-01"},
                {"id": "a1", "date": "2020-02-01"}
            ]
        });
        let err = serde_json::from_value::<Network>(raw)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("alteration a1 is already in the ledger"));

        let raw = json!([{"id": "a1", "date": "2020-01-01"}, {"id": "a2", "date": "2020-02-01"}]);
        let ledger = serde_json::from_value::<Ledger>(raw.clone());
        assert_eq!(ledger.as_ref().map(Ledger::len).ok(), Some(2));
        assert_eq!(
            ledger.ok().and_then(|l| serde_json::to_value(l).ok()),
            Some(raw)
        );
    }
}
