//! The abstract record stream handed to downstream serializers.
//!
//! The stream is the entirety of the core's outbound contract: no files are
//! written here. Collections are BTree-ordered so two runs over identical
//! input serialize byte-identically.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::model::graph::{View, ViewGraph};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    pub id: u32,
    pub views: Vec<&'static str>,
    pub kind: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeRecord {
    pub source: u32,
    pub target: u32,
    pub view: &'static str,
    pub kind: String,
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Parse,
    Cfg,
}

/// A soft failure: data in the trailer, not an error on the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            col: None,
        }
    }

    pub fn at(mut self, line: usize, col: usize) -> Self {
        self.line = Some(line);
        self.col = Some(col);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trailer {
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordStream {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub trailer: Trailer,
}

impl RecordStream {
    /// Flattens a composed graph: nodes ordered by id, edges in the
    /// composer's emission order.
    pub fn from_graph(graph: &ViewGraph, diagnostics: Vec<Diagnostic>) -> Self {
        let mut nodes: Vec<NodeRecord> = graph
            .nodes()
            .map(|n| NodeRecord {
                id: n.id.as_u32(),
                views: n.views.iter().map(View::tag).collect(),
                kind: n.kind.clone(),
                label: n.label.clone(),
                line: n.line,
                extra: n.extra.clone(),
            })
            .collect();
        nodes.sort_by_key(|n| n.id);

        let edges = graph
            .edges()
            .map(|(source, target, e)| EdgeRecord {
                source: source.as_u32(),
                target: target.as_u32(),
                view: e.view.tag(),
                kind: e.kind.label(),
                extra: e.extra.clone(),
            })
            .collect();

        Self {
            nodes,
            edges,
            trailer: Trailer { diagnostics },
        }
    }

    /// Canonical JSON form, used by determinism checks and embedders that
    /// want one blob rather than a record iterator.
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
