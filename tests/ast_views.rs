//! AST projection, blacklist pruning and identifier collapsing.

mod common;

use std::collections::BTreeSet;

use codeweave::{AstOptions, Language, View, ViewConfig};
use common::*;

fn ast_config(blacklist: &[&str], collapse: bool) -> ViewConfig {
    let mut config = ViewConfig::with_views([View::Ast]);
    config.ast = AstOptions {
        blacklist: blacklist.iter().map(|s| s.to_string()).collect(),
        collapse,
    };
    config
}

const SOURCE: &str = "\
#include <stdio.h>
int f(int x) {
    int y = x + x;
    return y;
}
";

#[test]
fn plain_projection_keeps_every_named_node() {
    let g = run(SOURCE, Language::C, &ast_config(&[], false));
    assert!(g.nodes.iter().any(|n| n.kind == "translation_unit"));
    assert!(g.nodes.iter().any(|n| n.kind == "preproc_include"));
    assert!(g.edges.iter().all(|e| e.kind == "child" && e.view == "AST"));

    // Three x leaves before any collapsing.
    let xs = g
        .nodes
        .iter()
        .filter(|n| n.kind == "identifier" && n.label == "x")
        .count();
    assert_eq!(xs, 3);
}

#[test]
fn blacklist_removes_kinds_and_preserves_paths_to_root() {
    let g = run(
        SOURCE,
        Language::C,
        &ast_config(&["preproc_include", "init_declarator"], false),
    );
    assert!(g.nodes.iter().all(|n| n.kind != "preproc_include"));
    assert!(g.nodes.iter().all(|n| n.kind != "init_declarator"));

    // Every surviving node is reachable from the root.
    let root = g
        .nodes
        .iter()
        .find(|n| n.kind == "translation_unit")
        .unwrap()
        .id;
    let mut reachable = BTreeSet::from([root]);
    let mut frontier = vec![root];
    while let Some(id) = frontier.pop() {
        for e in g.edges.iter().filter(|e| e.source == id) {
            if reachable.insert(e.target) {
                frontier.push(e.target);
            }
        }
    }
    // The include's children reconnected to the root when it was removed.
    for node in &g.nodes {
        assert!(
            reachable.contains(&node.id),
            "node {:?} ({}) detached from root",
            node.label,
            node.kind
        );
    }
}

#[test]
fn collapse_unifies_same_name_identifiers() {
    let g = run(SOURCE, Language::C, &ast_config(&[], true));
    let xs: Vec<_> = g
        .nodes
        .iter()
        .filter(|n| n.kind == "identifier" && n.label == "x")
        .collect();
    assert_eq!(xs.len(), 1);

    // The survivor keeps an edge per distinct parent: the parameter
    // declaration, and one merged edge from `x + x` (same source, same
    // kind).
    let x = xs[0];
    let incoming = g.edges.iter().filter(|e| e.target == x.id).count();
    assert_eq!(incoming, 2);
}

#[test]
fn blacklist_then_collapse_composes() {
    let combined = run(
        SOURCE,
        Language::C,
        &ast_config(&["preproc_include"], true),
    );
    assert!(combined.nodes.iter().all(|n| n.kind != "preproc_include"));
    let xs = combined
        .nodes
        .iter()
        .filter(|n| n.kind == "identifier" && n.label == "x")
        .count();
    assert_eq!(xs, 1);

    // Identical inputs and options replay byte-for-byte.
    let again = run(
        SOURCE,
        Language::C,
        &ast_config(&["preproc_include"], true),
    );
    assert_eq!(
        combined.to_canonical_json().unwrap(),
        again.to_canonical_json().unwrap()
    );
}
