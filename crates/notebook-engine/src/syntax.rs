use serde::{Deserialize, Serialize};

/// One node of the host parser's tree: a kind tag plus a half-open
/// `[from, to)` offset range and child nodes.
///
/// The engine never parses text into this shape; the host's parser produces
/// it per document version. Only nodes carrying the cell kind (and error
/// nodes, which are skipped) are meaningful to the engine; everything else
/// is walked through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: String,
    pub from: usize,
    pub to: usize,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    #[must_use]
    pub fn new(kind: impl Into<String>, from: usize, to: usize) -> Self {
        Self {
            kind: kind.into(),
            from,
            to,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }
}

/// A document version paired with its parse tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedDocument {
    text: String,
    root: SyntaxNode,
}

impl ParsedDocument {
    #[must_use]
    pub fn new(text: impl Into<String>, root: SyntaxNode) -> Self {
        Self {
            text: text.into(),
            root,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Slice of the document text, clamped to the document length. Returns
    /// `None` when a boundary lands inside a multi-byte character, so a
    /// malformed node range degrades to "no slice" instead of panicking.
    #[must_use]
    pub fn slice(&self, from: usize, to: usize) -> Option<&str> {
        let to = to.min(self.text.len());
        let from = from.min(to);
        self.text.get(from..to)
    }
}
