//! Stable integer identities for named parse-tree nodes.
//!
//! Ids are drawn from a per-run counter keyed by `(start, end, kind)`, so
//! the same syntactic span obtains the same id in every view. Synthetic
//! nodes (function entry/exit, call stubs) are minted from the same counter
//! and therefore share the namespace.

use std::collections::HashMap;

use serde::Serialize;
use tree_sitter::{Node, Point};

use crate::parser::ParseSession;

/// Identity of one graph node, shared across all views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

type SpanKey = (Point, Point, &'static str);

/// The per-run identity table.
pub struct NodeTable {
    ids: HashMap<SpanKey, NodeId>,
    /// Ids of synthetic nodes, with the kind they were minted for.
    synthetics: Vec<(NodeId, &'static str)>,
    next: u32,
}

const FIRST_ID: u32 = 1;

impl NodeTable {
    /// Assigns an id to every named node, in pre-order.
    ///
    /// Idempotent per tree: a second traversal of the same tree reproduces
    /// the same mapping because the key space and visit order are fixed.
    pub fn build(session: &ParseSession) -> Self {
        let mut table = Self {
            ids: HashMap::new(),
            synthetics: Vec::new(),
            next: FIRST_ID,
        };
        table.assign(session.root());
        table
    }

    fn assign(&mut self, node: Node<'_>) {
        if node.is_named() {
            let key = Self::key(node);
            if !self.ids.contains_key(&key) {
                let id = NodeId(self.next);
                self.next += 1;
                self.ids.insert(key, id);
            }
        }
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.assign(child);
            }
        }
    }

    fn key(node: Node<'_>) -> SpanKey {
        (node.start_position(), node.end_position(), node.kind())
    }

    /// The id of a named node; `None` for anonymous tokens.
    pub fn id_of(&self, node: Node<'_>) -> Option<NodeId> {
        self.ids.get(&Self::key(node)).copied()
    }

    /// Mints a fresh id for a node that has no syntactic span.
    pub fn synthetic(&mut self, kind: &'static str) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        self.synthetics.push((id, kind));
        id
    }

    pub fn named_count(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Language;
    use crate::parser::SourceParser;

    fn session(source: &str) -> ParseSession {
        SourceParser::new(Language::C).parse(source).unwrap()
    }

    #[test]
    fn named_nodes_get_ids_anonymous_do_not() {
        let s = session("int x = 1;");
        let table = NodeTable::build(&s);
        let root = s.root();
        assert!(table.id_of(root).is_some());

        // The `;` token is anonymous and receives no id.
        let decl = root.named_child(0).unwrap();
        let semi = decl.child(decl.child_count() - 1).unwrap();
        assert!(!semi.is_named());
        assert!(table.id_of(semi).is_none());
    }

    #[test]
    fn rebuild_is_idempotent() {
        let s = session("int f(int a) { return a + 1; }");
        let first = NodeTable::build(&s);
        let second = NodeTable::build(&s);
        assert_eq!(first.named_count(), second.named_count());

        fn walk(node: Node<'_>, a: &NodeTable, b: &NodeTable) {
            if node.is_named() {
                assert_eq!(a.id_of(node), b.id_of(node));
            }
            for i in 0..node.child_count() {
                walk(node.child(i).unwrap(), a, b);
            }
        }
        walk(s.root(), &first, &second);
    }

    #[test]
    fn synthetic_ids_extend_the_namespace() {
        let s = session("int x;");
        let mut table = NodeTable::build(&s);
        let named = table.named_count() as u32;
        let entry = table.synthetic("entry");
        let exit = table.synthetic("exit");
        assert_eq!(entry.as_u32(), FIRST_ID + named);
        assert_eq!(exit.as_u32(), FIRST_ID + named + 1);
    }
}
