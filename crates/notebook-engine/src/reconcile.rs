use std::collections::HashMap;

use notebook_model::{Cell, CellIdAllocator, CellStatus, Generation, GenerationError, Span};
use thiserror::Error;

use crate::change::{ChangeSummary, InvariantViolation, MappedPos, PositionMapper};
use crate::extract::SourceSpan;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// How a previous-generation cell relates to the edited document.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellFate {
    /// No changed range touches the cell; identity, content, and evaluation
    /// state survive, only the span moves.
    Retained { new_from: usize },
    /// A changed range starts inside the cell (end boundary included).
    /// Identity survives but content must be re-derived from the new
    /// document.
    Modified { new_from: usize },
    /// A changed range overlaps the cell's start boundary; the framing
    /// syntax may no longer be intact, so identity does not survive.
    Deleted,
}

/// Classify one previous-generation span against a transaction's changed
/// ranges.
///
/// Ranges are scanned in ascending order:
/// - entirely before or after the span: no effect;
/// - starting strictly before `span.from` and extending to or past it:
///   the cell is deleted;
/// - starting within `[span.from, span.to]` (an edit exactly touching the
///   trailing delimiter counts): the cell is modified in place.
#[must_use]
pub fn classify(span: Span, changes: &ChangeSummary) -> CellFate {
    for range in changes.ranges() {
        if range.old_to < span.from {
            continue;
        }
        if range.old_from > span.to {
            break;
        }
        if range.old_from < span.from {
            return CellFate::Deleted;
        }
        return match changes.map_pos(span.from) {
            MappedPos::Mapped(new_from) => CellFate::Modified { new_from },
            MappedPos::Replaced => CellFate::Deleted,
        };
    }
    match changes.map_pos(span.from) {
        MappedPos::Mapped(new_from) => CellFate::Retained { new_from },
        MappedPos::Replaced => CellFate::Deleted,
    }
}

/// Produce the next generation from the previous one, the transaction's
/// changed ranges, and the freshly extracted cell spans.
///
/// Previous cells are classified by [`classify`], then matched to the new
/// spans by mapped start offset. A match carries the cell's identity and
/// evaluation history forward; an unmatched span allocates a new identity;
/// an unmatched or deleted previous cell has no successor. If two previous
/// cells map to the same start offset (defended against, though disjoint
/// spans should make it impossible) the earliest-appearing one wins and the
/// later one is dropped.
pub fn reconcile(
    prev: &Generation,
    changes: &ChangeSummary,
    spans: Vec<SourceSpan>,
    ids: &mut CellIdAllocator,
) -> Result<Generation, ReconcileError> {
    // Mapped new-start offset -> index of the surviving previous cell.
    let mut survivors: HashMap<usize, usize> = HashMap::with_capacity(prev.len());
    for (i, cell) in prev.cells().iter().enumerate() {
        let new_from = match classify(cell.span, changes) {
            CellFate::Retained { new_from } | CellFate::Modified { new_from } => new_from,
            CellFate::Deleted => continue,
        };
        // Earliest previous cell wins a contested offset.
        survivors.entry(new_from).or_insert(i);
    }

    let mut cells = Vec::with_capacity(spans.len());
    for span in spans {
        let cell = match survivors.remove(&span.from) {
            Some(i) => carry_forward(&prev.cells()[i], span),
            None => Cell::new(ids.allocate(), Span::new(span.from, span.to), span.text),
        };
        cells.push(cell);
    }

    Ok(Generation::new(cells)?)
}

/// Carry a previous cell into the next generation at its new span.
///
/// Status follows the source text, not the classification: if the re-derived
/// text is unchanged the status is untouched; if it changed but happens to
/// match the last-evaluated source (an undo back to evaluated text) the cell
/// is clean; otherwise it is dirty. A cell that leaves `Evaluating` here
/// orphans its outstanding submission, whose completion will be discarded by
/// token mismatch.
fn carry_forward(prev: &Cell, span: SourceSpan) -> Cell {
    let status = if span.text == prev.source {
        prev.status.clone()
    } else if prev.last_evaluated_source.as_deref() == Some(span.text.as_str()) {
        CellStatus::Clean
    } else {
        CellStatus::Dirty
    };

    Cell {
        id: prev.id,
        span: Span::new(span.from, span.to),
        source: span.text,
        status,
        last_evaluated_source: prev.last_evaluated_source.clone(),
        evaluation_payload: prev.evaluation_payload.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangedRange;
    use pretty_assertions::assert_eq;

    fn summary(ranges: &[(usize, usize, usize, usize)]) -> ChangeSummary {
        ChangeSummary::new(
            ranges
                .iter()
                .map(|&(a, b, c, d)| ChangedRange::new(a, b, c, d))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn change_entirely_before_retains_and_shifts() {
        // Insert 2 characters at offset 0; cell at [4,7).
        let fate = classify(Span::new(4, 7), &summary(&[(0, 0, 0, 2)]));
        assert_eq!(fate, CellFate::Retained { new_from: 6 });
    }

    #[test]
    fn change_entirely_after_retains_in_place() {
        let fate = classify(Span::new(0, 3), &summary(&[(8, 9, 8, 12)]));
        assert_eq!(fate, CellFate::Retained { new_from: 0 });
    }

    #[test]
    fn change_overlapping_start_deletes() {
        // Replace [2,5) where the cell starts at 4.
        let fate = classify(Span::new(4, 7), &summary(&[(2, 5, 2, 5)]));
        assert_eq!(fate, CellFate::Deleted);
    }

    #[test]
    fn change_ending_exactly_at_start_deletes() {
        // The edit extends *to* the cell's start boundary.
        let fate = classify(Span::new(4, 7), &summary(&[(2, 4, 2, 10)]));
        assert_eq!(fate, CellFate::Deleted);
    }

    #[test]
    fn change_starting_inside_modifies() {
        let fate = classify(Span::new(4, 7), &summary(&[(5, 6, 5, 8)]));
        assert_eq!(fate, CellFate::Modified { new_from: 4 });
    }

    #[test]
    fn insertion_at_start_modifies_rather_than_deletes() {
        let fate = classify(Span::new(4, 7), &summary(&[(4, 4, 4, 6)]));
        assert_eq!(fate, CellFate::Modified { new_from: 4 });
    }

    #[test]
    fn edit_touching_trailing_delimiter_modifies() {
        // `old_from` equals `span.to`.
        let fate = classify(Span::new(4, 7), &summary(&[(7, 8, 7, 8)]));
        assert_eq!(fate, CellFate::Modified { new_from: 4 });
    }

    #[test]
    fn no_changes_is_a_pure_remap() {
        let fate = classify(Span::new(4, 7), &ChangeSummary::none());
        assert_eq!(fate, CellFate::Retained { new_from: 4 });
    }

    #[test]
    fn contested_start_offset_keeps_the_earliest_cell() {
        // Two previous cells mapping to the same new start cannot arise from
        // disjoint non-empty spans, but the merge defends against it anyway.
        // An empty span at the same start offset slips past the overlap
        // check and produces the collision.
        let mut ids = CellIdAllocator::new();
        let a = Cell::new(ids.allocate(), Span::new(0, 0), "");
        let b = Cell::new(ids.allocate(), Span::new(0, 3), "a=1");
        let prev = Generation::new(vec![a.clone(), b]).unwrap();

        let spans = vec![SourceSpan {
            from: 0,
            to: 3,
            text: "a=1".to_string(),
        }];
        let next = reconcile(&prev, &ChangeSummary::none(), spans, &mut ids).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next.cells()[0].id, a.id);
    }

    #[test]
    fn unmatched_previous_cells_are_dropped() {
        let mut ids = CellIdAllocator::new();
        let a = Cell::new(ids.allocate(), Span::new(0, 3), "a=1");
        let prev = Generation::new(vec![a]).unwrap();

        // The extractor found nothing (cell syntax was broken).
        let next = reconcile(&prev, &ChangeSummary::none(), Vec::new(), &mut ids).unwrap();
        assert!(next.is_empty());
    }

    #[test]
    fn retained_cell_with_identical_text_keeps_status() {
        let mut ids = CellIdAllocator::new();
        let mut a = Cell::new(ids.allocate(), Span::new(0, 3), "a=1");
        a.status = CellStatus::Clean;
        a.last_evaluated_source = Some("a=1".to_string());
        a.evaluation_payload = Some("1".to_string());
        let prev = Generation::new(vec![a.clone()]).unwrap();

        let spans = vec![SourceSpan {
            from: 0,
            to: 3,
            text: "a=1".to_string(),
        }];
        let next = reconcile(&prev, &ChangeSummary::none(), spans, &mut ids).unwrap();
        assert_eq!(next.cells()[0].status, CellStatus::Clean);
        assert_eq!(next.cells()[0].evaluation_payload.as_deref(), Some("1"));
    }

    #[test]
    fn modified_cell_with_changed_text_goes_dirty() {
        let mut ids = CellIdAllocator::new();
        let mut a = Cell::new(ids.allocate(), Span::new(0, 3), "a=1");
        a.status = CellStatus::Clean;
        a.last_evaluated_source = Some("a=1".to_string());
        a.evaluation_payload = Some("1".to_string());
        let prev = Generation::new(vec![a.clone()]).unwrap();

        // Insert "0" at offset 2: "a=1" -> "a=10".
        let changes = summary(&[(2, 2, 2, 3)]);
        let spans = vec![SourceSpan {
            from: 0,
            to: 4,
            text: "a=10".to_string(),
        }];
        let next = reconcile(&prev, &changes, spans, &mut ids).unwrap();
        let cell = &next.cells()[0];
        assert_eq!(cell.id, a.id);
        assert_eq!(cell.status, CellStatus::Dirty);
        assert_eq!(cell.source, "a=10");
        // Evaluation history is carried, not cleared.
        assert_eq!(cell.last_evaluated_source.as_deref(), Some("a=1"));
        assert_eq!(cell.evaluation_payload.as_deref(), Some("1"));
    }

    #[test]
    fn undo_back_to_evaluated_text_is_clean_not_dirty() {
        let mut ids = CellIdAllocator::new();
        let mut a = Cell::new(ids.allocate(), Span::new(0, 4), "a=10");
        a.status = CellStatus::Dirty;
        a.last_evaluated_source = Some("a=1".to_string());
        a.evaluation_payload = Some("1".to_string());
        let prev = Generation::new(vec![a.clone()]).unwrap();

        // Delete the "0" again.
        let changes = summary(&[(2, 3, 2, 2)]);
        let spans = vec![SourceSpan {
            from: 0,
            to: 3,
            text: "a=1".to_string(),
        }];
        let next = reconcile(&prev, &changes, spans, &mut ids).unwrap();
        assert_eq!(next.cells()[0].status, CellStatus::Clean);
    }

    #[test]
    fn new_span_allocates_a_new_dirty_identity() {
        let mut ids = CellIdAllocator::new();
        let prev = Generation::empty();
        let spans = vec![SourceSpan {
            from: 0,
            to: 3,
            text: "a=1".to_string(),
        }];
        let next = reconcile(&prev, &ChangeSummary::none(), spans, &mut ids).unwrap();
        let cell = &next.cells()[0];
        assert_eq!(cell.status, CellStatus::Dirty);
        assert_eq!(cell.last_evaluated_source, None);
        assert_eq!(cell.evaluation_payload, None);
    }
}
