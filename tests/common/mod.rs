use codeweave::{generate, Language, RecordStream, View, ViewConfig};

#[allow(dead_code)]
pub fn run(source: &str, language: Language, config: &ViewConfig) -> RecordStream {
    generate(source, language, config).expect("pipeline should succeed")
}

#[allow(dead_code)]
pub fn cfg_of(source: &str, language: Language) -> RecordStream {
    run(source, language, &ViewConfig::with_views([View::Cfg]))
}

#[allow(dead_code)]
pub fn dfg_of(source: &str, language: Language) -> RecordStream {
    run(source, language, &ViewConfig::with_views([View::Dfg]))
}

/// The id of the unique node with this label.
#[allow(dead_code)]
pub fn node_id(stream: &RecordStream, label: &str) -> u32 {
    let matches: Vec<u32> = stream
        .nodes
        .iter()
        .filter(|n| n.label == label)
        .map(|n| n.id)
        .collect();
    match matches.as_slice() {
        [id] => *id,
        [] => {
            dump_nodes(stream);
            panic!("no node labeled {label:?}");
        }
        _ => panic!("label {label:?} is ambiguous: {matches:?}"),
    }
}

#[allow(dead_code)]
pub fn edge_exists(stream: &RecordStream, from: &str, kind: &str, to: &str) -> bool {
    stream.edges.iter().any(|e| {
        e.kind == kind
            && label_of(stream, e.source) == from
            && label_of(stream, e.target) == to
    })
}

#[allow(dead_code)]
pub fn assert_edge(stream: &RecordStream, from: &str, kind: &str, to: &str) {
    if !edge_exists(stream, from, kind, to) {
        dump_edges(stream);
        panic!("missing edge {from:?} -{kind}-> {to:?}");
    }
}

#[allow(dead_code)]
pub fn assert_no_edge(stream: &RecordStream, from: &str, kind: &str, to: &str) {
    if edge_exists(stream, from, kind, to) {
        dump_edges(stream);
        panic!("unexpected edge {from:?} -{kind}-> {to:?}");
    }
}

/// Source labels of all `kind` edges arriving at the node labeled `to`,
/// sorted for stable comparisons.
#[allow(dead_code)]
pub fn sources_into(stream: &RecordStream, to: &str, kind: &str) -> Vec<String> {
    let mut sources: Vec<String> = stream
        .edges
        .iter()
        .filter(|e| e.kind == kind && label_of(stream, e.target) == to)
        .map(|e| label_of(stream, e.source).to_string())
        .collect();
    sources.sort();
    sources
}

#[allow(dead_code)]
pub fn label_of(stream: &RecordStream, id: u32) -> &str {
    stream
        .nodes
        .iter()
        .find(|n| n.id == id)
        .map(|n| n.label.as_str())
        .unwrap_or("<missing>")
}

#[allow(dead_code)]
pub fn dump_nodes(stream: &RecordStream) {
    println!("nodes:");
    for n in &stream.nodes {
        println!("  {} [{}] {:?} views={:?}", n.id, n.kind, n.label, n.views);
    }
}

#[allow(dead_code)]
pub fn dump_edges(stream: &RecordStream) {
    dump_nodes(stream);
    println!("edges:");
    for e in &stream.edges {
        println!(
            "  {:?} -{}-> {:?} ({})",
            label_of(stream, e.source),
            e.kind,
            label_of(stream, e.target),
            e.view
        );
    }
}
