use serde::Deserialize;
use std::collections::BTreeSet;

use crate::model::graph::View;

/// Which views to build and how, for one `generate` invocation.
///
/// The recognized options are exactly the fields below; there is no
/// environment, CLI or on-disk configuration surface in the core.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// The views to emit. DFG builds its CFG substrate internally, so
    /// requesting DFG alone is valid.
    pub views: BTreeSet<View>,
    pub ast: AstOptions,
    pub dfg: DfgOptions,
    /// Abort on any parser error instead of emitting a best-effort
    /// partial graph with a diagnostic in the trailer.
    pub strict_parse: bool,
}

impl ViewConfig {
    pub fn with_views<I: IntoIterator<Item = View>>(views: I) -> Self {
        Self {
            views: views.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self::with_views([View::Ast, View::Cfg, View::Dfg])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AstOptions {
    /// Node kinds removed from the AST view; edges are reconnected around
    /// removed nodes so every surviving node keeps a path to the root.
    pub blacklist: BTreeSet<String>,
    /// Collapse all identifier leaves with the same text into one node.
    pub collapse: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DfgOptions {
    /// Annotate `reaches` edges with the defining statement's line.
    pub last_def: bool,
    /// Annotate `reaches` edges with the line of the most recent prior use.
    pub last_use: bool,
    /// Whether a declarator without initializer produces a definition
    /// (an `undef` value that still kills earlier definitions).
    pub undef_defs: bool,
}

impl Default for DfgOptions {
    fn default() -> Self {
        Self {
            last_def: false,
            last_use: false,
            undef_defs: true,
        }
    }
}
