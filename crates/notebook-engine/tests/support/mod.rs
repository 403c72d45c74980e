#![allow(dead_code)]

//! Shared helpers for the engine's integration tests: a tiny line-based
//! fixture grammar (assignment lines are cells, `#` lines are prose, `!!`
//! lines are parse errors), an edit applier that produces the matching
//! [`ChangeSummary`], and an evaluation backend that records submissions.

use std::cell::RefCell;
use std::rc::Rc;

use notebook_engine::{
    ChangeSummary, ChangedRange, EvaluationBackend, EvaluationRequest, ParsedDocument, SyntaxNode,
    CELL_NODE_KIND, ERROR_NODE_KIND,
};

/// Parse a fixture document: one node per non-empty line. Lines starting
/// with `#` are prose, lines starting with `!!` are error regions, anything
/// else containing `=` is a code cell. Line spans exclude the trailing
/// newline, matching the host grammar the engine is written against.
pub fn parse(text: &str) -> ParsedDocument {
    let mut children = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let body = line.strip_suffix('\n').unwrap_or(line);
        let from = offset;
        let to = offset + body.len();
        if !body.is_empty() {
            let kind = if body.starts_with('#') {
                "Prose"
            } else if body.starts_with("!!") {
                ERROR_NODE_KIND
            } else if body.contains('=') {
                CELL_NODE_KIND
            } else {
                "Prose"
            };
            children.push(SyntaxNode::new(kind, from, to));
        }
        offset += line.len();
    }
    let root = SyntaxNode::new("Document", 0, text.len()).with_children(children);
    ParsedDocument::new(text, root)
}

/// Apply `(from, to, insert)` edits (old coordinates, ascending, disjoint)
/// and return the new text plus the transaction's change summary.
pub fn apply_edits(text: &str, edits: &[(usize, usize, &str)]) -> (String, ChangeSummary) {
    let mut out = String::new();
    let mut ranges = Vec::new();
    let mut last = 0;
    let mut delta = 0isize;
    for &(from, to, insert) in edits {
        assert!(last <= from && from <= to && to <= text.len(), "bad edit");
        out.push_str(&text[last..from]);
        let new_from = (from as isize + delta) as usize;
        out.push_str(insert);
        let new_to = new_from + insert.len();
        ranges.push(ChangedRange::new(from, to, new_from, new_to));
        delta += insert.len() as isize - (to - from) as isize;
        last = to;
    }
    out.push_str(&text[last..]);
    (out, ChangeSummary::new(ranges).expect("edits are sorted and disjoint"))
}

/// Backend that records every submission for later inspection.
#[derive(Default)]
pub struct RecordingBackend {
    requests: Rc<RefCell<Vec<EvaluationRequest>>>,
}

impl RecordingBackend {
    /// Returns the boxed backend plus a shared handle to its request log.
    pub fn new() -> (Box<dyn EvaluationBackend>, Rc<RefCell<Vec<EvaluationRequest>>>) {
        let requests = Rc::new(RefCell::new(Vec::new()));
        let backend = Self {
            requests: Rc::clone(&requests),
        };
        (Box::new(backend), requests)
    }
}

impl EvaluationBackend for RecordingBackend {
    fn submit(&mut self, request: EvaluationRequest) {
        self.requests.borrow_mut().push(request);
    }
}
