#![forbid(unsafe_code)]

//! `notebook-model` defines the core in-memory data structures for notebook
//! code cells.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the reconciliation engine (cell identity, dirty tracking, scheduling)
//! - editor-host and IPC boundaries via `serde` (JSON-safe schema)
//!
//! The central types are [`Cell`] (one tracked code block, with a stable
//! [`CellId`] and a [`CellStatus`] evaluation state) and [`Generation`] (the
//! immutable snapshot of all cells after one document transaction).

mod cell;
mod eval_settings;
mod generation;

pub use cell::{
    Cell, CellId, CellIdAllocator, CellStatus, Span, StatusTag, SubmissionToken, TokenAllocator,
};
pub use eval_settings::{EvalMode, EvalSettings};
pub use generation::{CellDecoration, Generation, GenerationError};
