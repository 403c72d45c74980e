#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! Incremental cell-reconciliation engine for documents that embed executable
//! code cells inside prose.
//!
//! Given the host's parse tree for the current document and a description of
//! each edit, the engine re-derives the set of cells, keeps each cell's
//! identity stable across edits, classifies every previous cell as retained /
//! modified / deleted, and tracks a per-cell dirty state so that only cells
//! whose source actually changed are re-submitted for evaluation.
//!
//! The engine never parses or executes cell code itself. Parsing, the edit
//! position map, the cursor position, and the evaluation backend are all
//! host-provided (see [`syntax`], [`change::PositionMapper`], and
//! [`schedule::EvaluationBackend`]); the engine decides *when* a cell must be
//! re-submitted, never *how* its result is computed.
//!
//! The typical embedding drives a [`DocumentSession`]:
//! one [`DocumentSession::apply_edit`] per document transaction, a
//! [`DocumentSession::apply_selection`] pass on cursor-only transactions, and
//! [`DocumentSession::apply_completion`] whenever the backend finishes a
//! submission. Each pass produces a fresh immutable
//! [`Generation`](notebook_model::Generation) for the rendering layer.

pub mod change;
pub mod extract;
pub mod reconcile;
pub mod schedule;
pub mod session;
pub mod syntax;

pub use change::{ChangeSummary, ChangedRange, InvariantViolation, MappedPos, PositionMapper};
pub use extract::{extract_cells, SourceSpan, CELL_NODE_KIND, ERROR_NODE_KIND};
pub use reconcile::{classify, reconcile, CellFate, ReconcileError};
pub use schedule::{
    plan_submissions, EvaluationBackend, EvaluationCompletion, EvaluationRequest,
    NullEvaluationBackend, SubmissionPlan,
};
pub use session::DocumentSession;
pub use syntax::{ParsedDocument, SyntaxNode};
