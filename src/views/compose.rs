//! View composition: node union by id, edge concatenation with view tags
//! intact. The composer never bridges views; no edge is invented or
//! dropped.

use std::collections::HashMap;

use tracing::debug;

use crate::model::graph::{View, ViewGraph};
use crate::parser::index::NodeId;

/// Label priority when the same node appears in several views: the most
/// informative (synthesized) label wins.
fn label_rank(view: View) -> u8 {
    match view {
        View::Cfg => 3,
        View::Dfg => 2,
        View::Ast => 1,
    }
}

pub fn compose(views: &[(View, &ViewGraph)]) -> ViewGraph {
    let mut composed = ViewGraph::new();
    let mut label_from: HashMap<NodeId, u8> = HashMap::new();

    for (view, graph) in views {
        for node in graph.nodes() {
            let mut incoming = node.clone();
            // View-specific attributes get the view prefix so merged bags
            // cannot collide.
            incoming.extra = node
                .extra
                .iter()
                .map(|(k, v)| (format!("{}.{}", view.attr_prefix(), k), v.clone()))
                .collect();

            let rank = label_rank(*view);
            match composed.node_mut(node.id) {
                Some(existing) => {
                    existing.views.extend(incoming.views.iter().copied());
                    if existing.line.is_none() {
                        existing.line = incoming.line;
                    }
                    for (k, v) in incoming.extra {
                        existing.extra.entry(k).or_insert(v);
                    }
                    if label_from.get(&node.id).copied().unwrap_or(0) < rank {
                        existing.label = incoming.label;
                        existing.kind = incoming.kind;
                        label_from.insert(node.id, rank);
                    }
                }
                None => {
                    composed.ensure_node(incoming);
                    label_from.insert(node.id, rank);
                }
            }
        }
    }

    for (_, graph) in views {
        for (source, target, edge) in graph.edges() {
            composed.add_edge(source, target, edge.clone());
        }
    }

    debug!(
        views = views.len(),
        nodes = composed.node_count(),
        edges = composed.edge_count(),
        "views composed"
    );
    composed
}
