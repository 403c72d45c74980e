use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::{Cell, CellId, Span, StatusTag};

/// Structural-invariant violations detected when assembling a generation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("cell spans out of order at index {index}")]
    OutOfOrder { index: usize },
    #[error("overlapping cell spans at index {index}")]
    OverlappingSpans { index: usize },
    #[error("duplicate cell id {id} at index {index}")]
    DuplicateId { id: CellId, index: usize },
}

/// Rendering payload for one cell, anchored at the cell's end offset.
///
/// The host renders these as block widgets placed after the cell, so `at` is
/// `span.to`. The sequence is replace-on-every-generation; no incremental
/// diff is exposed to the rendering layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellDecoration {
    pub cell_id: CellId,
    /// Anchor offset for the widget (the cell's end).
    pub at: usize,
    pub span: Span,
    pub status: StatusTag,
    /// Text to display: the last evaluation result when one exists,
    /// otherwise the cell's raw source.
    pub text: String,
}

/// Immutable snapshot of the cell list after one document transaction.
///
/// A generation owns its cells; the only cross-generation reference is the
/// [`CellId`]. Sessions share generations behind `Arc` and produce a fresh
/// one per transaction (copy-on-reconcile), so concurrent readers never
/// observe a half-updated cell list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    cells: Vec<Cell>,
    #[serde(skip)]
    index: HashMap<CellId, usize>,
    decorations: Vec<CellDecoration>,
}

impl Default for Generation {
    fn default() -> Self {
        Self::empty()
    }
}

impl Generation {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            cells: Vec::new(),
            index: HashMap::new(),
            decorations: Vec::new(),
        }
    }

    /// Assemble a generation from an ordered cell list.
    ///
    /// Validates the per-generation invariants (ascending, non-overlapping
    /// spans; unique ids) and precomputes the id index and the rendering
    /// payload.
    pub fn new(cells: Vec<Cell>) -> Result<Self, GenerationError> {
        let mut index = HashMap::with_capacity(cells.len());
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                let prev = &cells[i - 1];
                if cell.span.from < prev.span.from {
                    return Err(GenerationError::OutOfOrder { index: i });
                }
                if cell.span.from < prev.span.to {
                    return Err(GenerationError::OverlappingSpans { index: i });
                }
            }
            if index.insert(cell.id, i).is_some() {
                return Err(GenerationError::DuplicateId {
                    id: cell.id,
                    index: i,
                });
            }
        }

        let decorations = cells
            .iter()
            .map(|cell| CellDecoration {
                cell_id: cell.id,
                at: cell.span.to,
                span: cell.span,
                status: cell.status.tag(),
                text: cell.display_text().to_string(),
            })
            .collect();

        Ok(Self {
            cells,
            index,
            decorations,
        })
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.index.get(&id).map(|&i| &self.cells[i])
    }

    #[must_use]
    pub fn index_of(&self, id: CellId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    #[must_use]
    pub fn decorations(&self) -> &[CellDecoration] {
        &self.decorations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
