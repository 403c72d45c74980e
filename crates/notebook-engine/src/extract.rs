use serde::Serialize;

use crate::syntax::{ParsedDocument, SyntaxNode};

/// Node kind the host grammar uses for an embedded code cell.
pub const CELL_NODE_KIND: &str = "CodeBlock";

/// Node kind for an unparseable region. Cells inside one are omitted from
/// the span list (a malformed region is not a fatal condition, it simply
/// yields no cell).
pub const ERROR_NODE_KIND: &str = "Error";

/// One extracted cell span: the half-open `[from, to)` range and the verbatim
/// source text of the cell, delimiters included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceSpan {
    pub from: usize,
    pub to: usize,
    pub text: String,
}

/// Walk the parsed document and yield the ordered list of cell spans.
///
/// A pure, deterministic function of the document content and grammar:
/// identical input document yields an identical list, same order, every run.
/// Single O(nodes) pre-order walk; no extra passes per cell. Node ranges that
/// run past the end of the document (a parser recovering at EOF) are clamped
/// rather than rejected; a range that splits a multi-byte character yields
/// no cell.
#[must_use]
pub fn extract_cells(doc: &ParsedDocument) -> Vec<SourceSpan> {
    let mut spans = Vec::new();
    collect(doc, doc.root(), &mut spans);
    spans
}

fn collect(doc: &ParsedDocument, node: &SyntaxNode, spans: &mut Vec<SourceSpan>) {
    if node.kind == ERROR_NODE_KIND {
        return;
    }
    if node.kind == CELL_NODE_KIND {
        // A boundary inside a multi-byte character means the node range is
        // malformed; such a node yields no cell, like an error region.
        if let Some(text) = doc.slice(node.from, node.to) {
            spans.push(SourceSpan {
                from: node.from,
                to: node.from + text.len(),
                text: text.to_string(),
            });
        }
        // Cells are carved from disjoint constructs; a cell never nests
        // inside another cell.
        return;
    }
    for child in &node.children {
        collect(doc, child, spans);
    }
}
