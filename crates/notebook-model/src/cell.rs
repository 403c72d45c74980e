use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a cell across document edits.
///
/// Ids are process-unique, monotonically assigned by a [`CellIdAllocator`],
/// and immutable for the cell's lifetime. Identity is the only thing that
/// makes "the same cell" meaningful across generations: spans move, source
/// text changes, but the id persists until the cell is deleted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(u64);

impl CellId {
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// Allocator for [`CellId`]s, owned by the document session.
///
/// Ids are never drawn from ambient global state; the session constructs one
/// allocator and passes it to the reconciler explicitly.
#[derive(Debug, Default, Clone)]
pub struct CellIdAllocator {
    next: u64,
}

impl CellIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> CellId {
        let id = CellId(self.next);
        self.next += 1;
        id
    }
}

/// Token identifying one evaluation submission.
///
/// A completion event is applied only when its token matches the cell's
/// current outstanding submission; anything else is stale and discarded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionToken(u64);

impl SubmissionToken {
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Allocator for [`SubmissionToken`]s, owned by the document session.
#[derive(Debug, Default, Clone)]
pub struct TokenAllocator {
    next: u64,
}

impl TokenAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> SubmissionToken {
        let token = SubmissionToken(self.next);
        self.next += 1;
        token
    }
}

/// Half-open `[from, to)` character-offset range in the current document
/// version.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub from: usize,
    pub to: usize,
}

impl Span {
    #[must_use]
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.to - self.from
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.from == self.to
    }

    /// Whether `offset` sits on or inside the span, end boundary included.
    ///
    /// This is the selection-gating test: a cell is considered "under the
    /// cursor" when `from <= offset <= to`, so typing right at either
    /// delimiter still defers evaluation.
    #[must_use]
    pub const fn touches(self, offset: usize) -> bool {
        self.from <= offset && offset <= self.to
    }

    #[must_use]
    pub const fn overlaps(self, other: Span) -> bool {
        self.from < other.to && other.from < self.to
    }
}

/// Per-cell evaluation-freshness state.
///
/// The state machine is `Dirty -> Evaluating -> Clean`, with edits moving a
/// cell back to `Dirty` from any state, and a failed evaluation surfacing as
/// `Error` until the next qualifying edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    /// Source changed since last evaluated, or never evaluated.
    Dirty,
    /// Submitted, awaiting the completion carrying this token.
    Evaluating { token: SubmissionToken },
    /// Last-evaluated output matches the current source.
    Clean,
    /// The evaluation backend failed; not retried until the cell's source
    /// changes again.
    Error { message: String },
}

impl CellStatus {
    #[must_use]
    pub fn tag(&self) -> StatusTag {
        match self {
            Self::Dirty => StatusTag::Dirty,
            Self::Evaluating { .. } => StatusTag::Evaluating,
            Self::Clean => StatusTag::Clean,
            Self::Error { .. } => StatusTag::Error,
        }
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::Dirty)
    }

    #[must_use]
    pub fn is_evaluating(&self) -> bool {
        matches!(self, Self::Evaluating { .. })
    }
}

/// Payload-free discriminant of [`CellStatus`], used in rendering payloads.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusTag {
    Dirty,
    Evaluating,
    Clean,
    Error,
}

impl StatusTag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dirty => "dirty",
            Self::Evaluating => "evaluating",
            Self::Clean => "clean",
            Self::Error => "error",
        }
    }
}

/// One tracked code cell, the unit of reconciliation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    /// Span in the current document version; updated every generation.
    pub span: Span,
    /// Verbatim text of the span in the current generation.
    pub source: String,
    pub status: CellStatus,
    /// The `source` value at the time evaluation last completed, or `None`
    /// if never evaluated. Written only by evaluation completion.
    pub last_evaluated_source: Option<String>,
    /// Last-known result to display; `None` until first evaluation completes.
    /// Survives `Clean -> Dirty` transitions so a stale-but-useful result
    /// stays on screen while the replacement is pending.
    pub evaluation_payload: Option<String>,
}

impl Cell {
    /// A freshly created cell: never evaluated, so `Dirty` with no history.
    #[must_use]
    pub fn new(id: CellId, span: Span, source: impl Into<String>) -> Self {
        Self {
            id,
            span,
            source: source.into(),
            status: CellStatus::Dirty,
            last_evaluated_source: None,
            evaluation_payload: None,
        }
    }

    /// Text the rendering layer should display for this cell: the last
    /// evaluation result when one exists, otherwise the raw source.
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.evaluation_payload.as_deref().unwrap_or(&self.source)
    }
}
