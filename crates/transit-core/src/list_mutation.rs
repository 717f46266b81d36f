// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Relative list mutation: insert or remove one element of an ordered
//! reference list positioned by a neighbouring element instead of an index.
//!
//! Two modes exist and they never fall back to each other:
//!
//! * **relative** (`relative_to` set): the edit point is next to the first
//!   occurrence of the anchor. Inserting on the left puts the item directly
//!   before the anchor; on the right, directly after it. Removing deletes the
//!   single slot directly before (left) or after (right) the anchor.
//! * **simple** (`relative_to` absent): inserting goes to the head (left) or
//!   tail (right). Removing deletes the first (left) or last (right)
//!   occurrence of the companion value.
//!
//! Under both modes, a removal on one side undoes an insertion on the same
//! side against the same anchor.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ident::FeatureId;

/// Which neighbour of the anchor (or which end of the list) an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ListSide {
    /// Before the anchor, or the head of the list.
    #[serde(rename = "left-of-item")]
    Left,
    /// After the anchor, or the tail of the list.
    #[default]
    #[serde(rename = "right-of-item")]
    Right,
}

impl fmt::Display for ListSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left-of-item",
            Self::Right => "right-of-item",
        })
    }
}

/// Positioning descriptor attached to a list-valued change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMutation<T = FeatureId> {
    /// Anchor element; `None` selects simple mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_to: Option<T>,
    /// Side of the anchor (or end of the list).
    #[serde(default)]
    pub side: ListSide,
}

impl<T> ListMutation<T> {
    /// Relative-mode descriptor.
    pub fn relative(anchor: impl Into<T>, side: ListSide) -> Self {
        Self {
            relative_to: Some(anchor.into()),
            side,
        }
    }

    /// Simple-mode descriptor.
    pub const fn simple(side: ListSide) -> Self {
        Self {
            relative_to: None,
            side,
        }
    }
}

/// Reasons a list mutation cannot be positioned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListMutationError {
    /// The anchor is not in the list.
    #[error("anchor `{anchor}` not found in list")]
    AnchorNotFound {
        /// Missing anchor.
        anchor: String,
    },
    /// Removal requested on a side of the anchor that has no element.
    #[error("no element {side} `{anchor}`")]
    OutOfRange {
        /// Anchor element.
        anchor: String,
        /// Requested side.
        side: ListSide,
    },
    /// The slot next to the anchor holds something other than the expected item.
    #[error("expected `{expected}` at index {index}, found `{found}`")]
    UnexpectedItem {
        /// Value the removal was meant to delete.
        expected: String,
        /// Value actually found.
        found: String,
        /// Slot index.
        index: usize,
    },
    /// Simple-mode removal of a value the list does not contain.
    #[error("`{item}` not found in list")]
    ItemNotFound {
        /// Value to remove.
        item: String,
    },
    /// Simple-mode removal without a value to look for.
    #[error("simple-mode removal requires a companion value")]
    MissingCompanion,
}

/// Returns a copy of `list` with one element inserted or removed.
///
/// `value` is the item to insert; `None` requests a removal. `companion` is
/// the value on the other side of the change: for removals it names the item
/// being deleted. Relative removals check it when present; simple removals
/// require it. `list` is never modified.
pub fn mutate_list<T>(
    list: &[T],
    mutation: &ListMutation<T>,
    value: Option<T>,
    companion: Option<&T>,
) -> Result<Vec<T>, ListMutationError>
where
    T: Clone + PartialEq + fmt::Display,
{
    let mut out = list.to_vec();
    match (&mutation.relative_to, value) {
        (Some(anchor), Some(item)) => {
            let at = anchor_index(list, anchor)?;
            let at = match mutation.side {
                ListSide::Left => at,
                ListSide::Right => at + 1,
            };
            out.insert(at, item);
        }
        (Some(anchor), None) => {
            let at = anchor_index(list, anchor)?;
            let slot = match mutation.side {
                ListSide::Left => at.checked_sub(1),
                ListSide::Right => Some(at + 1).filter(|&i| i < list.len()),
            }
            .ok_or_else(|| ListMutationError::OutOfRange {
                anchor: anchor.to_string(),
                side: mutation.side,
            })?;
            if let (Some(expected), Some(found)) = (companion, list.get(slot)) {
                if expected != found {
                    return Err(ListMutationError::UnexpectedItem {
                        expected: expected.to_string(),
                        found: found.to_string(),
                        index: slot,
                    });
                }
            }
            out.remove(slot);
        }
        (None, Some(item)) => match mutation.side {
            ListSide::Left => out.insert(0, item),
            ListSide::Right => out.push(item),
        },
        (None, None) => {
            let item = companion.ok_or(ListMutationError::MissingCompanion)?;
            let found = match mutation.side {
                ListSide::Left => list.iter().position(|x| x == item),
                ListSide::Right => list.iter().rposition(|x| x == item),
            };
            let slot = found.ok_or_else(|| ListMutationError::ItemNotFound {
                item: item.to_string(),
            })?;
            out.remove(slot);
        }
    }
    Ok(out)
}

fn anchor_index<T: PartialEq + fmt::Display>(
    list: &[T],
    anchor: &T,
) -> Result<usize, ListMutationError> {
    list.iter()
        .position(|x| x == anchor)
        .ok_or_else(|| ListMutationError::AnchorNotFound {
            anchor: anchor.to_string(),
        })
}
