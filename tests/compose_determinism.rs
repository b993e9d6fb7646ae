//! Cross-view identity, composition arithmetic, determinism, and the
//! strict/soft parse boundary.

mod common;

use codeweave::{generate, DfgOptions, DiagnosticKind, Language, View, ViewConfig, WeaveError};
use common::*;

const SOURCE: &str = "\
int f(int x) {
    int a = 1;
    if (x > 0) { a = 2; } else { a = 3; }
    return a;
}
";

#[test]
fn node_identity_is_stable_across_views() {
    let ast = run(SOURCE, Language::C, &ViewConfig::with_views([View::Ast]));
    let cfg = run(SOURCE, Language::C, &ViewConfig::with_views([View::Cfg]));

    let ast_if = ast
        .nodes
        .iter()
        .find(|n| n.kind == "if_statement")
        .expect("if in ast");
    let cfg_if = cfg
        .nodes
        .iter()
        .find(|n| n.kind == "if_statement")
        .expect("if in cfg");
    assert_eq!(ast_if.id, cfg_if.id);
}

#[test]
fn composed_nodes_merge_views_and_prefer_cfg_labels() {
    let g = run(SOURCE, Language::C, &ViewConfig::all());
    let if_node = g
        .nodes
        .iter()
        .find(|n| n.kind == "if_statement")
        .expect("if node");
    assert_eq!(if_node.views, ["AST", "CFG", "DFG"]);
    assert_eq!(if_node.label, "if(x > 0)");
}

#[test]
fn composition_preserves_the_edge_union() {
    let ast = run(SOURCE, Language::C, &ViewConfig::with_views([View::Ast]));
    let cfg = run(SOURCE, Language::C, &ViewConfig::with_views([View::Cfg]));
    let dfg = run(SOURCE, Language::C, &ViewConfig::with_views([View::Dfg]));
    let all = run(SOURCE, Language::C, &ViewConfig::all());

    assert_eq!(
        all.edges.len(),
        ast.edges.len() + cfg.edges.len() + dfg.edges.len()
    );
    for (view, part) in [("AST", &ast), ("CFG", &cfg), ("DFG", &dfg)] {
        let in_all = all.edges.iter().filter(|e| e.view == view).count();
        assert_eq!(in_all, part.edges.len(), "{view} edges survive composition");
    }
}

#[test]
fn identical_runs_serialize_byte_identically() {
    let mut config = ViewConfig::all();
    config.dfg = DfgOptions {
        last_def: true,
        last_use: true,
        undef_defs: true,
    };

    let first = run(SOURCE, Language::C, &config)
        .to_canonical_json()
        .unwrap();
    let second = run(SOURCE, Language::C, &config)
        .to_canonical_json()
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_view_selection_yields_an_empty_stream() {
    let g = run(SOURCE, Language::C, &ViewConfig::default());
    assert!(g.nodes.is_empty());
    assert!(g.edges.is_empty());
    assert!(g.trailer.diagnostics.is_empty());
}

#[test]
fn strict_parse_aborts_on_syntax_errors() {
    let mut config = ViewConfig::with_views([View::Ast]);
    config.strict_parse = true;
    let err = generate("int main( {", Language::C, &config).unwrap_err();
    assert!(matches!(err, WeaveError::Parse(_)));
}

#[test]
fn lenient_parse_emits_a_partial_graph_with_a_diagnostic() {
    let config = ViewConfig::with_views([View::Ast]);
    let g = run("int x = 1; int main( {", Language::C, &config);
    assert!(!g.nodes.is_empty());
    assert_eq!(g.trailer.diagnostics.len(), 1);
    assert_eq!(g.trailer.diagnostics[0].kind, DiagnosticKind::Parse);
}

#[test]
fn java_and_c_share_the_record_schema() {
    let c = run("int f() { return 1; }", Language::C, &ViewConfig::all());
    let java = run(
        "class A { int f() { return 1; } }",
        Language::Java,
        &ViewConfig::all(),
    );
    for stream in [&c, &java] {
        assert!(stream.nodes.iter().any(|n| n.label.starts_with("entry(")));
        assert!(stream
            .edges
            .iter()
            .any(|e| e.view == "CFG" && e.kind == "return"));
    }
}
