use std::collections::HashSet;
use std::sync::Arc;

use notebook_model::{
    CellId, CellIdAllocator, CellStatus, EvalSettings, Generation, TokenAllocator,
};

use crate::change::ChangeSummary;
use crate::extract::extract_cells;
use crate::reconcile::{reconcile, ReconcileError};
use crate::schedule::{
    plan_submissions, EvaluationBackend, EvaluationCompletion, EvaluationRequest,
};
use crate::syntax::ParsedDocument;

/// Per-document reconciliation session.
///
/// Owns the current [`Generation`], the cell-id and submission-token
/// allocators, and the evaluation backend. All passes run synchronously on
/// the thread that owns document state; the only asynchronous boundary is
/// the backend, whose completions are fed back through
/// [`DocumentSession::apply_completion`].
///
/// Every pass replaces the current generation wholesale (generations are
/// immutable and shared behind `Arc`), so the rendering layer and any
/// in-flight completion handling never observe a half-updated cell list.
pub struct DocumentSession {
    generation: Arc<Generation>,
    ids: CellIdAllocator,
    tokens: TokenAllocator,
    settings: EvalSettings,
    backend: Box<dyn EvaluationBackend>,
}

impl DocumentSession {
    #[must_use]
    pub fn new(backend: Box<dyn EvaluationBackend>, settings: EvalSettings) -> Self {
        Self {
            generation: Arc::new(Generation::empty()),
            ids: CellIdAllocator::new(),
            tokens: TokenAllocator::new(),
            settings,
            backend,
        }
    }

    /// The latest generation; the rendering layer treats its decoration list
    /// as replace-on-every-generation.
    #[must_use]
    pub fn generation(&self) -> Arc<Generation> {
        Arc::clone(&self.generation)
    }

    #[must_use]
    pub fn settings(&self) -> &EvalSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EvalSettings) {
        self.settings = settings;
    }

    /// Process one document transaction: reconcile the previous generation
    /// against the edit, then run a scheduling pass at the new selection.
    ///
    /// The initial pass over a fresh document is an edit with
    /// [`ChangeSummary::none`]. Returns the generation produced by the pass.
    pub fn apply_edit(
        &mut self,
        doc: &ParsedDocument,
        changes: &ChangeSummary,
        selection: usize,
    ) -> Result<Arc<Generation>, ReconcileError> {
        let spans = extract_cells(doc);
        let next = reconcile(&self.generation, changes, spans, &mut self.ids)?;
        log::debug!(
            "reconciled {} -> {} cells across {} changed ranges",
            self.generation.len(),
            next.len(),
            changes.ranges().len()
        );
        self.generation = Arc::new(next);
        self.schedule(Some(selection))?;
        Ok(self.generation())
    }

    /// Process a selection-only transaction (no text change).
    ///
    /// No re-extraction or reconciliation happens; the pass only gives
    /// deferred dirty cells a chance to submit now that the cursor moved.
    pub fn apply_selection(&mut self, selection: usize) -> Result<Arc<Generation>, ReconcileError> {
        self.schedule(Some(selection))?;
        Ok(self.generation())
    }

    /// Submit every dirty cell regardless of selection or evaluation mode,
    /// retrying errored cells too. This is the manual-mode "evaluate on
    /// save" entry point.
    pub fn evaluate_all(&mut self) -> Result<Arc<Generation>, ReconcileError> {
        self.schedule(None)?;
        Ok(self.generation())
    }

    /// Apply one completion event from the backend.
    ///
    /// Runs a small pass updating only the one cell; extraction and
    /// reconciliation do not re-run. A completion whose cell no longer
    /// exists, or whose token is not the cell's current outstanding
    /// submission, is stale: it is discarded without touching the cell
    /// (returning `false`) so stale output never overwrites newer state.
    pub fn apply_completion(
        &mut self,
        completion: EvaluationCompletion,
    ) -> Result<bool, ReconcileError> {
        let Some(index) = self.generation.index_of(completion.cell_id) else {
            log::warn!(
                "discarding completion for deleted {} (token {})",
                completion.cell_id,
                completion.token.as_u64()
            );
            return Ok(false);
        };

        let cell = &self.generation.cells()[index];
        let current = match cell.status {
            CellStatus::Evaluating { token } => token,
            _ => {
                log::warn!(
                    "discarding completion for {}: no outstanding submission",
                    completion.cell_id
                );
                return Ok(false);
            }
        };
        if current != completion.token {
            log::warn!(
                "discarding stale completion for {} (token {}, outstanding {})",
                completion.cell_id,
                completion.token.as_u64(),
                current.as_u64()
            );
            return Ok(false);
        }

        let mut cells = self.generation.cells().to_vec();
        let cell = &mut cells[index];
        match completion.result {
            Ok(payload) => {
                cell.last_evaluated_source = Some(cell.source.clone());
                cell.evaluation_payload = Some(payload);
                cell.status = CellStatus::Clean;
            }
            Err(message) => {
                cell.status = CellStatus::Error { message };
            }
        }
        self.generation = Arc::new(Generation::new(cells)?);
        Ok(true)
    }

    /// Run the scheduler over the current generation and submit the planned
    /// cells. `selection` is `None` for a forced evaluate-all pass.
    fn schedule(&mut self, selection: Option<usize>) -> Result<(), ReconcileError> {
        let plan = plan_submissions(&self.generation, selection, &self.settings);
        if plan.is_empty() {
            return Ok(());
        }

        // The plan holds ids from the generation we are copying, in the
        // cells' own ascending order, so a membership walk over the copy
        // visits exactly the planned cells.
        let planned: HashSet<CellId> = plan.iter().copied().collect();
        let mut cells = self.generation.cells().to_vec();
        for cell in cells.iter_mut().filter(|cell| planned.contains(&cell.id)) {
            let token = self.tokens.allocate();
            cell.status = CellStatus::Evaluating { token };
            self.backend.submit(EvaluationRequest {
                cell_id: cell.id,
                token,
                source: cell.source.clone(),
            });
        }
        log::debug!("submitted {} cells for evaluation", plan.len());
        self.generation = Arc::new(Generation::new(cells)?);
        Ok(())
    }
}
