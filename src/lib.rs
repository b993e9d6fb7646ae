//! codeweave: multi-view code-graph generation.
//!
//! Given one pre-cleaned source file, codeweave builds an AST, a typed CFG
//! and a reaching-definitions DFG over a shared node-id namespace, composes
//! the requested views into one labeled multigraph, and emits it as an
//! abstract record stream for downstream serializers.
//!
//! ```no_run
//! use codeweave::{generate, Language, View, ViewConfig};
//!
//! let config = ViewConfig::with_views([View::Cfg, View::Dfg]);
//! let stream = generate("int f(int x) { return x; }", Language::C, &config)?;
//! for edge in &stream.edges {
//!     println!("{} -{}-> {}", edge.source, edge.kind, edge.target);
//! }
//! # Ok::<(), codeweave::WeaveError>(())
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod lang;
pub mod logging;
pub mod model;
pub mod parser;
pub mod views;

use tracing::info;

pub use config::{AstOptions, DfgOptions, ViewConfig};
pub use error::{Result, WeaveError};
pub use lang::Language;
pub use model::graph::{EdgeKind, View, ViewGraph};
pub use model::records::{Diagnostic, DiagnosticKind, EdgeRecord, NodeRecord, RecordStream};

use extract::SymbolExtractor;
use model::records::Trailer;
use parser::index::NodeTable;
use parser::SourceParser;

/// Runs the full pipeline for one source file.
///
/// Soft failures (parse trouble without `strict_parse`, unresolvable
/// jumps) surface as diagnostics in the stream trailer; only invariant
/// violations come back as errors.
pub fn generate(source: &str, language: Language, config: &ViewConfig) -> Result<RecordStream> {
    let session = SourceParser::new(language).parse(source)?;

    let mut diagnostics = Vec::new();
    if session.has_syntax_errors() {
        if config.strict_parse {
            return Err(WeaveError::Parse(format!(
                "{language} source contains syntax errors"
            )));
        }
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::Parse,
            format!("{language} source contains syntax errors; emitting a partial graph"),
        ));
    }

    let mut table = NodeTable::build(&session);
    let symbols = SymbolExtractor::extract(&session, &table)?;

    let want = |v: View| config.views.contains(&v);
    if config.views.is_empty() {
        return Ok(RecordStream {
            nodes: Vec::new(),
            edges: Vec::new(),
            trailer: Trailer { diagnostics },
        });
    }

    let ast_graph = want(View::Ast).then(|| views::ast::build(&session, &table, &config.ast));

    // The DFG runs on the CFG substrate even when CFG output is not
    // requested.
    let cfg_view = if want(View::Cfg) || want(View::Dfg) {
        let view = views::cfg::build(&session, &mut table)?;
        diagnostics.extend(view.diagnostics.iter().cloned());
        Some(view)
    } else {
        None
    };

    let dfg_graph = match (&cfg_view, want(View::Dfg)) {
        (Some(cfg), true) => Some(views::dfg::build(
            &session,
            &table,
            &symbols,
            cfg,
            &config.dfg,
        )?),
        _ => None,
    };

    let mut parts: Vec<(View, &ViewGraph)> = Vec::new();
    if let Some(ast) = &ast_graph {
        parts.push((View::Ast, ast));
    }
    if want(View::Cfg) {
        if let Some(cfg) = &cfg_view {
            parts.push((View::Cfg, &cfg.graph));
        }
    }
    if let Some(dfg) = &dfg_graph {
        parts.push((View::Dfg, dfg));
    }

    let composed = views::compose::compose(&parts);
    info!(
        language = %language,
        nodes = composed.node_count(),
        edges = composed.edge_count(),
        diagnostics = diagnostics.len(),
        "record stream ready"
    );
    Ok(RecordStream::from_graph(&composed, diagnostics))
}
