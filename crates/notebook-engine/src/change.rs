use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One contiguous edit within a transaction: the old-document range
/// `[old_from, old_to)` was replaced by the new-document range
/// `[new_from, new_to)`. A pure insertion has `old_from == old_to`; a pure
/// deletion has `new_from == new_to`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedRange {
    pub old_from: usize,
    pub old_to: usize,
    pub new_from: usize,
    pub new_to: usize,
}

impl ChangedRange {
    #[must_use]
    pub const fn new(old_from: usize, old_to: usize, new_from: usize, new_to: usize) -> Self {
        Self {
            old_from,
            old_to,
            new_from,
            new_to,
        }
    }

    /// Net length change introduced by this range.
    #[must_use]
    pub fn len_delta(self) -> isize {
        (self.new_to - self.new_from) as isize - (self.old_to - self.old_from) as isize
    }
}

/// Result of mapping an old-document offset through a transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MappedPos {
    /// The offset lies outside every replaced region and maps here.
    Mapped(usize),
    /// The offset fell strictly inside a replaced region; it has no
    /// counterpart in the new document.
    Replaced,
}

/// Position mapping for one edit/transaction, valid for offsets not inside a
/// replaced region.
///
/// [`ChangeSummary`] provides the canonical implementation derived from its
/// range list; hosts with a richer diff representation can supply their own.
pub trait PositionMapper {
    fn map_pos(&self, offset: usize) -> MappedPos;
}

/// Changed ranges received out of order or overlapping.
///
/// All classification logic downstream assumes sorted, disjoint input, so an
/// inconsistent range list fails fast at construction instead of producing an
/// undefined classification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("changed range {index} is malformed (end precedes start)")]
    MalformedRange { index: usize },
    #[error("changed ranges out of order or overlapping at index {index}")]
    UnsortedRanges { index: usize },
}

/// The validated, ascending, non-overlapping changed-range list for one
/// document transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChangeSummary {
    ranges: Vec<ChangedRange>,
}

impl ChangeSummary {
    /// Validate and take ownership of a transaction's changed ranges.
    pub fn new(ranges: Vec<ChangedRange>) -> Result<Self, InvariantViolation> {
        for (i, range) in ranges.iter().enumerate() {
            if range.old_to < range.old_from || range.new_to < range.new_from {
                return Err(InvariantViolation::MalformedRange { index: i });
            }
            if i > 0 {
                let prev = &ranges[i - 1];
                if range.old_from < prev.old_to || range.new_from < prev.new_to {
                    return Err(InvariantViolation::UnsortedRanges { index: i });
                }
            }
        }
        Ok(Self { ranges })
    }

    /// The empty summary: a transaction that changed no text (or the initial
    /// pass over a fresh document).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ranges(&self) -> &[ChangedRange] {
        &self.ranges
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl PositionMapper for ChangeSummary {
    /// Carries an old-document offset forward by the accumulated length delta
    /// of every range entirely before it.
    ///
    /// Boundary conventions: an offset at the end of a deleted region maps to
    /// the replacement's end; an offset at an insertion point stays before
    /// the inserted text.
    fn map_pos(&self, offset: usize) -> MappedPos {
        let mut delta = 0isize;
        for range in &self.ranges {
            if range.old_from >= offset {
                break;
            }
            if range.old_to > offset {
                return MappedPos::Replaced;
            }
            delta += range.len_delta();
        }
        // `delta` can only reach a negative total by deleting text that lies
        // entirely before `offset`, so the sum stays non-negative.
        MappedPos::Mapped((offset as isize + delta) as usize)
    }
}
