//! AST view: the named-node projection of the parse tree, with two
//! optional transforms: blacklist pruning (reconnect around removed
//! nodes) and same-name identifier collapsing.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;
use tree_sitter::Node;

use crate::config::AstOptions;
use crate::lang::NodeCatalog;
use crate::model::graph::{EdgeKind, GraphEdge, GraphNode, View, ViewGraph};
use crate::parser::index::{NodeId, NodeTable};
use crate::parser::{condense_ws, named_children, ParseSession};

pub fn build(
    session: &ParseSession,
    table: &NodeTable,
    options: &AstOptions,
) -> ViewGraph {
    let catalog = session.language.catalog();
    let mut graph = ViewGraph::new();
    project(session, table, session.root(), None, &mut graph);

    if !options.blacklist.is_empty() {
        graph = blacklist_minimize(&graph, options);
    }
    if options.collapse {
        graph = collapse_names(&graph, catalog);
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "ast view built"
    );
    graph
}

/// Pre-order projection: one node per named ParseNode, one `child` edge per
/// named parent/child pair.
fn project(
    session: &ParseSession,
    table: &NodeTable,
    node: Node<'_>,
    parent: Option<NodeId>,
    graph: &mut ViewGraph,
) {
    let Some(id) = table.id_of(node) else {
        return;
    };
    graph.ensure_node(
        GraphNode::new(
            id,
            node.kind(),
            condense_ws(session.text(node)),
            View::Ast,
        )
        .at_line(node.start_position().row),
    );
    if let Some(parent_id) = parent {
        graph.add_edge(parent_id, id, GraphEdge::new(View::Ast, EdgeKind::Child));
    }
    for child in named_children(node) {
        project(session, table, child, Some(id), graph);
    }
}

/// Removes blacklisted kinds, replacing each `p -> r` / `r -> c` pair with
/// `p -> c`, so every surviving node keeps its path to the root.
fn blacklist_minimize(graph: &ViewGraph, options: &AstOptions) -> ViewGraph {
    let removed: HashSet<NodeId> = graph
        .nodes()
        .filter(|n| options.blacklist.contains(&n.kind))
        .map(|n| n.id)
        .collect();

    let mut pruned = ViewGraph::new();
    for node in graph.nodes() {
        if !removed.contains(&node.id) {
            pruned.ensure_node(node.clone());
        }
    }

    // Walk edges from each surviving node, sliding over removed targets.
    for node in graph.nodes() {
        if removed.contains(&node.id) {
            continue;
        }
        let mut stack: Vec<NodeId> = graph
            .edges_from(node.id)
            .into_iter()
            .rev()
            .map(|(t, _)| t)
            .collect();
        while let Some(target) = stack.pop() {
            if removed.contains(&target) {
                for (t, _) in graph.edges_from(target).into_iter().rev() {
                    stack.push(t);
                }
            } else {
                pruned.add_edge(node.id, target, GraphEdge::new(View::Ast, EdgeKind::Child));
            }
        }
    }
    pruned
}

/// Collapses all identifier leaves with equal text onto the minimum id
/// among them, rerouting edges and dropping the duplicates. Idempotent.
fn collapse_names(graph: &ViewGraph, catalog: &'static NodeCatalog) -> ViewGraph {
    // Leaves only: a node without outgoing child edges.
    let mut representative: BTreeMap<String, NodeId> = BTreeMap::new();
    let mut rewrite: BTreeMap<NodeId, NodeId> = BTreeMap::new();

    for node in graph.nodes() {
        if !catalog.is_identifier(&node.kind) || !graph.edges_from(node.id).is_empty() {
            continue;
        }
        let rep = *representative
            .entry(node.label.clone())
            .or_insert(node.id);
        let rep = rep.min(node.id);
        representative.insert(node.label.clone(), rep);
    }
    // Second pass so that a later, smaller id elected above rewrites
    // every member of its group.
    for node in graph.nodes() {
        if !catalog.is_identifier(&node.kind) || !graph.edges_from(node.id).is_empty() {
            continue;
        }
        if let Some(&rep) = representative.get(&node.label) {
            if rep != node.id {
                rewrite.insert(node.id, rep);
            }
        }
    }

    let mut collapsed = ViewGraph::new();
    for node in graph.nodes() {
        if !rewrite.contains_key(&node.id) {
            collapsed.ensure_node(node.clone());
        }
    }

    // Edge multiplicity survives by kind: identical rerouted edges merge,
    // distinct kinds never do.
    let mut seen: HashSet<(NodeId, NodeId, String)> = HashSet::new();
    for (source, target, edge) in graph.edges() {
        let source = rewrite.get(&source).copied().unwrap_or(source);
        let target = rewrite.get(&target).copied().unwrap_or(target);
        if seen.insert((source, target, edge.kind.label())) {
            collapsed.add_edge(source, target, edge.clone());
        }
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Language;
    use crate::parser::SourceParser;
    use std::collections::BTreeSet;

    fn ast_graph(source: &str, options: &AstOptions) -> ViewGraph {
        let session = SourceParser::new(Language::C).parse(source).unwrap();
        let table = NodeTable::build(&session);
        build(&session, &table, options)
    }

    #[test]
    fn projects_named_nodes_with_child_edges() {
        let g = ast_graph("int x = 1;", &AstOptions::default());
        // translation_unit -> declaration -> {primitive_type, init_declarator -> {identifier, number_literal}}
        assert_eq!(g.node_count(), 6);
        assert_eq!(g.edge_count(), 5);
        assert!(g.nodes().all(|n| n.views.contains(&View::Ast)));
    }

    #[test]
    fn blacklist_reconnects_around_removed_nodes() {
        let options = AstOptions {
            blacklist: BTreeSet::from(["init_declarator".to_string()]),
            collapse: false,
        };
        let g = ast_graph("int x = 1;", &options);
        assert!(g.nodes().all(|n| n.kind != "init_declarator"));

        // The declaration now owns the identifier and literal directly.
        let decl = g.nodes().find(|n| n.kind == "declaration").unwrap().id;
        let targets: Vec<String> = g
            .edges_from(decl)
            .into_iter()
            .map(|(t, _)| g.node(t).unwrap().kind.clone())
            .collect();
        assert!(targets.contains(&"identifier".to_string()));
        assert!(targets.contains(&"number_literal".to_string()));
    }

    #[test]
    fn collapse_merges_same_name_leaves_onto_minimum_id() {
        let options = AstOptions {
            blacklist: BTreeSet::new(),
            collapse: true,
        };
        let g = ast_graph("int x = 1; int y = x + x;", &options);
        let xs: Vec<_> = g.nodes().filter(|n| n.label == "x").collect();
        assert_eq!(xs.len(), 1, "all x leaves collapse to one node");
    }

    #[test]
    fn collapse_is_idempotent() {
        let options = AstOptions {
            blacklist: BTreeSet::new(),
            collapse: true,
        };
        let session = SourceParser::new(Language::C)
            .parse("int x = 1; int y = x + x;")
            .unwrap();
        let table = NodeTable::build(&session);
        let once = build(&session, &table, &options);
        let catalog = Language::C.catalog();
        let twice = collapse_names(&once, catalog);
        assert_eq!(once.node_count(), twice.node_count());
        assert_eq!(once.edge_count(), twice.edge_count());
    }
}
