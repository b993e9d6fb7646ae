//! Narrow adapter over the tree-sitter parser.
//!
//! The rest of the crate never touches grammar internals directly; it sees
//! typed, positioned nodes through [`ParseSession`] and the id table in
//! [`index`].

use tree_sitter::{Node, Parser, Tree};

use crate::error::{Result, WeaveError};
use crate::lang::Language;

pub mod index;

/// Parses one source file for a fixed language.
pub struct SourceParser {
    language: Language,
}

impl SourceParser {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Parses the (pre-cleaned) source text into a session.
    ///
    /// A tree containing error or missing nodes is still returned; the
    /// caller decides between strict abort and best-effort processing.
    pub fn parse(&self, source: &str) -> Result<ParseSession> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language.grammar())
            .map_err(|e| WeaveError::Parse(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| WeaveError::Parse(format!("{} parser produced no tree", self.language)))?;

        Ok(ParseSession {
            language: self.language,
            source: source.to_string(),
            tree,
        })
    }
}

/// One parsed file: the tree plus the bytes it spans.
pub struct ParseSession {
    pub language: Language,
    source: String,
    tree: Tree,
}

impl ParseSession {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The verbatim text of a node's span.
    pub fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Zero-based source line of the node's start.
    pub fn line(&self, node: Node<'_>) -> usize {
        node.start_position().row
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// Ordered named children of a node.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Collapses internal whitespace runs so multi-line spans label cleanly.
pub fn condense_ws(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_ws = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_ws && !out.is_empty() {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(ch);
            in_ws = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}
