//! The labeled directed multigraph shared by every view.
//!
//! Backed by a petgraph topology with a `NodeId` side map, mirroring how a
//! code graph keeps symbol identity separate from graph indices. Parallel
//! edges are permitted and distinguished by `(view, kind)`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::parser::index::NodeId;

/// One family of nodes and edges over the common id namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum View {
    Ast,
    Cfg,
    Dfg,
}

impl View {
    pub fn tag(&self) -> &'static str {
        match self {
            View::Ast => "AST",
            View::Cfg => "CFG",
            View::Dfg => "DFG",
        }
    }

    /// Prefix for view-specific node attributes in a composed graph.
    pub fn attr_prefix(&self) -> &'static str {
        match self {
            View::Ast => "ast",
            View::Cfg => "cfg",
            View::Dfg => "dfg",
        }
    }
}

/// Typed edge classification across all views.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// AST containment (parent to named child).
    Child,
    /// Straight-line succession.
    Seq,
    /// Branches of a conditional.
    True,
    False,
    /// Switch dispatch, labeled with the case value text.
    Case(String),
    DefaultCase,
    /// Into a loop header from its body's end.
    LoopBack,
    /// Out of a loop header when the condition fails.
    LoopExit,
    /// Call site to callee entry.
    Call,
    /// Return statement to the function's synthetic exit.
    Return,
    /// Structured exception flow.
    Throw,
    Catch,
    /// Jump resolved by label match.
    Goto,
    /// A definition reaching a using statement.
    Reaches,
}

impl EdgeKind {
    pub fn label(&self) -> String {
        match self {
            EdgeKind::Child => "child".to_string(),
            EdgeKind::Seq => "seq".to_string(),
            EdgeKind::True => "true".to_string(),
            EdgeKind::False => "false".to_string(),
            EdgeKind::Case(value) => format!("case({value})"),
            EdgeKind::DefaultCase => "default".to_string(),
            EdgeKind::LoopBack => "loop_back".to_string(),
            EdgeKind::LoopExit => "loop_exit".to_string(),
            EdgeKind::Call => "call".to_string(),
            EdgeKind::Return => "return".to_string(),
            EdgeKind::Throw => "throw".to_string(),
            EdgeKind::Catch => "catch".to_string(),
            EdgeKind::Goto => "goto".to_string(),
            EdgeKind::Reaches => "reaches".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: String,
    pub label: String,
    pub line: Option<usize>,
    pub views: BTreeSet<View>,
    pub extra: BTreeMap<String, String>,
}

impl GraphNode {
    pub fn new(id: NodeId, kind: impl Into<String>, label: impl Into<String>, view: View) -> Self {
        Self {
            id,
            kind: kind.into(),
            label: label.into(),
            line: None,
            views: BTreeSet::from([view]),
            extra: BTreeMap::new(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    pub view: View,
    pub kind: EdgeKind,
    pub extra: BTreeMap<String, String>,
}

impl GraphEdge {
    pub fn new(view: View, kind: EdgeKind) -> Self {
        Self {
            view,
            kind,
            extra: BTreeMap::new(),
        }
    }
}

/// Append-only multigraph; node and edge iteration follow insertion order,
/// which the builders keep deterministic.
#[derive(Debug, Default)]
pub struct ViewGraph {
    topology: DiGraph<GraphNode, GraphEdge>,
    by_id: HashMap<NodeId, NodeIndex>,
}

impl ViewGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the node, or merges views/line/extra into an existing one.
    /// The first non-empty label wins; callers that need a different
    /// priority (the composer) merge explicitly.
    pub fn ensure_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.by_id.get(&node.id) {
            let existing = &mut self.topology[idx];
            existing.views.extend(node.views.iter().copied());
            if existing.line.is_none() {
                existing.line = node.line;
            }
            if existing.label.is_empty() {
                existing.label = node.label;
            }
            for (k, v) in node.extra {
                existing.extra.entry(k).or_insert(v);
            }
            idx
        } else {
            let id = node.id;
            let idx = self.topology.add_node(node);
            self.by_id.insert(id, idx);
            idx
        }
    }

    /// Adds an edge between two already-present nodes.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, edge: GraphEdge) {
        let (Some(&s), Some(&t)) = (self.by_id.get(&source), self.by_id.get(&target)) else {
            debug_assert!(false, "edge endpoints must be inserted before edges");
            return;
        };
        self.topology.add_edge(s, t, edge);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.by_id.get(&id).map(|&idx| &self.topology[idx])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.by_id.get(&id).map(|&idx| &mut self.topology[idx])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.topology.node_indices().map(|idx| &self.topology[idx])
    }

    /// Edges in insertion order, as `(source id, target id, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &GraphEdge)> {
        self.topology.edge_references().map(|e| {
            (
                self.topology[e.source()].id,
                self.topology[e.target()].id,
                e.weight(),
            )
        })
    }

    /// Outgoing edges of one node, in insertion order.
    pub fn edges_from(&self, id: NodeId) -> Vec<(NodeId, &GraphEdge)> {
        let Some(&idx) = self.by_id.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<_> = self
            .topology
            .edges(idx)
            .map(|e| (e.id(), self.topology[e.target()].id, e.weight()))
            .collect();
        out.sort_by_key(|(eid, _, _)| *eid);
        out.into_iter().map(|(_, t, w)| (t, w)).collect()
    }

    pub fn node_count(&self) -> usize {
        self.topology.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.topology.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> NodeId {
        // Mint ids through a throwaway table so tests share the namespace
        // rules with production code.
        use crate::lang::Language;
        use crate::parser::index::NodeTable;
        use crate::parser::SourceParser;
        let session = SourceParser::new(Language::C).parse("int x;").unwrap();
        let mut table = NodeTable::build(&session);
        let mut last = table.synthetic("test");
        while last.as_u32() < n {
            last = table.synthetic("test");
        }
        last
    }

    #[test]
    fn parallel_edges_are_kept() {
        let mut g = ViewGraph::new();
        let a = id(10);
        let b = id(11);
        g.ensure_node(GraphNode::new(a, "stmt", "a", View::Cfg));
        g.ensure_node(GraphNode::new(b, "stmt", "b", View::Cfg));
        g.add_edge(a, b, GraphEdge::new(View::Cfg, EdgeKind::Seq));
        g.add_edge(a, b, GraphEdge::new(View::Dfg, EdgeKind::Reaches));
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn ensure_node_merges_views() {
        let mut g = ViewGraph::new();
        let a = id(10);
        g.ensure_node(GraphNode::new(a, "stmt", "a", View::Cfg));
        g.ensure_node(GraphNode::new(a, "stmt", "a", View::Dfg));
        assert_eq!(g.node_count(), 1);
        let node = g.node(a).unwrap();
        assert!(node.views.contains(&View::Cfg) && node.views.contains(&View::Dfg));
    }
}
