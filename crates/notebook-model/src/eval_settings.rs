use serde::{Deserialize, Serialize};

/// Session-wide evaluation scheduling settings.
///
/// These settings control *when* dirty cells are submitted to the evaluation
/// backend, never *how* a result is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalSettings {
    /// Evaluation mode (automatic vs manual).
    pub mode: EvalMode,
    /// When `true`, a dirty cell whose span contains the current selection is
    /// not submitted; evaluation waits until the cursor leaves the cell. This
    /// avoids submitting on every keystroke while the user types inside a
    /// cell.
    pub defer_in_cell_edits: bool,
    /// Optional cap on the number of cells submitted in one reconciliation
    /// pass. `None` submits every eligible cell.
    pub max_submissions_per_pass: Option<usize>,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            mode: EvalMode::Automatic,
            defer_in_cell_edits: true,
            max_submissions_per_pass: None,
        }
    }
}

impl EvalSettings {
    #[must_use]
    pub fn is_manual(&self) -> bool {
        self.mode == EvalMode::Manual
    }

    #[must_use]
    pub fn is_automatic(&self) -> bool {
        !self.is_manual()
    }
}

/// Evaluation scheduling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalMode {
    /// Dirty cells are submitted on every reconciliation pass (subject to the
    /// selection gate).
    Automatic,
    /// Dirty cells accumulate until an explicit evaluate-all request (e.g.
    /// triggered by a save).
    Manual,
}

impl Default for EvalMode {
    fn default() -> Self {
        Self::Automatic
    }
}
