use notebook_model::{CellId, CellStatus, EvalSettings, Generation, SubmissionToken};
use serde::{Deserialize, Serialize};

/// One evaluation submission handed to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub cell_id: CellId,
    pub token: SubmissionToken,
    /// The cell's source at submission time.
    pub source: String,
}

/// A backend's answer to one submission, delivered back to the session by
/// the embedder as an independent event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationCompletion {
    pub cell_id: CellId,
    pub token: SubmissionToken,
    /// `Ok` carries the display payload, `Err` a failure message.
    pub result: Result<String, String>,
}

/// The host's evaluation backend.
///
/// `submit` must not block: the reconciliation pass completes with the cell
/// marked `Evaluating`, and the result arrives later via
/// [`crate::DocumentSession::apply_completion`]. The backend must not
/// re-enter the session from inside `submit`.
pub trait EvaluationBackend {
    fn submit(&mut self, request: EvaluationRequest);
}

/// Backend that drops every submission, for hosts that wire completion
/// delivery elsewhere or have no evaluator yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvaluationBackend;

impl EvaluationBackend for NullEvaluationBackend {
    fn submit(&mut self, _request: EvaluationRequest) {}
}

/// The ordered set of cells one pass decided to submit.
pub type SubmissionPlan = Vec<CellId>;

/// Decide which cells to submit for evaluation on this pass.
///
/// `selection` is the current cursor offset for a regular pass, or `None`
/// for a forced evaluate-all request. A regular pass submits `Dirty` cells
/// in ascending span order, skipping any cell whose span contains the
/// selection (the user is typing inside it) and submitting nothing in manual
/// mode. A forced pass ignores the gate and the mode and also retries
/// `Error` cells. Cells already `Evaluating` are never submitted again.
#[must_use]
pub fn plan_submissions(
    generation: &Generation,
    selection: Option<usize>,
    settings: &EvalSettings,
) -> SubmissionPlan {
    let forced = selection.is_none();
    if !forced && settings.is_manual() {
        return Vec::new();
    }

    let mut plan = Vec::new();
    for cell in generation.cells() {
        let eligible = match cell.status {
            CellStatus::Dirty => true,
            CellStatus::Error { .. } => forced,
            CellStatus::Evaluating { .. } | CellStatus::Clean => false,
        };
        if !eligible {
            continue;
        }
        if let Some(offset) = selection {
            if settings.defer_in_cell_edits && cell.span.touches(offset) {
                continue;
            }
        }
        plan.push(cell.id);
        if let Some(cap) = settings.max_submissions_per_pass {
            if plan.len() == cap {
                break;
            }
        }
    }
    plan
}
