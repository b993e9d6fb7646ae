use serde::{Deserialize, Serialize};
use tree_sitter::Language as Grammar;

pub mod c;
pub mod java;

/// A supported source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Java,
}

impl Language {
    pub fn name(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Java => "java",
        }
    }

    pub fn grammar(&self) -> Grammar {
        match self {
            Language::C => tree_sitter_c::LANGUAGE.into(),
            Language::Java => tree_sitter_java::LANGUAGE.into(),
        }
    }

    pub fn catalog(&self) -> &'static NodeCatalog {
        match self {
            Language::C => &c::CATALOG,
            Language::Java => &java::CATALOG,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Static classification of a language's tree node kinds.
///
/// Adding a language is a matter of supplying this table plus a control-flow
/// dialect; the view builders dispatch on kind strings through these sets,
/// never on grammar-specific node types.
pub struct NodeCatalog {
    /// Every kind that counts as a statement (CFG node boundaries, DFG
    /// statement granularity).
    pub statement_kinds: &'static [&'static str],
    /// Plain assignments, declarations, expression statements.
    pub non_control_stmt: &'static [&'static str],
    /// Branches, loops, jumps, returns, exception and locking constructs.
    pub control_stmt: &'static [&'static str],
    pub loop_stmt: &'static [&'static str],
    pub jump_stmt: &'static [&'static str],
    /// Kinds whose named children form a statement block.
    pub block_holders: &'static [&'static str],
    /// Method/function/class/constructor/field declarations.
    pub definition_kinds: &'static [&'static str],
    /// Kinds that open a new lexical scope.
    pub scope_introducing_kinds: &'static [&'static str],
    /// Parent kinds under which a leaf identifier introduces a binding.
    pub declarator_parents: &'static [&'static str],
    /// Kinds that carry a declared type on a declaring construct.
    pub type_kinds: &'static [&'static str],
    /// Parent kinds marking an identifier as a method/function name.
    pub method_parents: &'static [&'static str],
    /// The argument-list kind that distinguishes a call site from a
    /// declaration among `method_parents`.
    pub argument_list_kind: &'static str,
    /// Identifier-leaf kinds (collapse candidates in the AST view).
    pub identifier_kinds: &'static [&'static str],
    /// Leaf-like kinds tokenized as a unit even though they have children.
    pub atomic_leaf_kinds: &'static [&'static str],
    pub comment_kinds: &'static [&'static str],
    /// Function/method definition kinds (CFG roots).
    pub function_kinds: &'static [&'static str],
}

impl NodeCatalog {
    pub fn is_statement(&self, kind: &str) -> bool {
        self.statement_kinds.contains(&kind)
    }

    pub fn is_non_control(&self, kind: &str) -> bool {
        self.non_control_stmt.contains(&kind)
    }

    pub fn is_control(&self, kind: &str) -> bool {
        self.control_stmt.contains(&kind)
    }

    pub fn is_loop(&self, kind: &str) -> bool {
        self.loop_stmt.contains(&kind)
    }

    pub fn is_jump(&self, kind: &str) -> bool {
        self.jump_stmt.contains(&kind)
    }

    pub fn is_block_holder(&self, kind: &str) -> bool {
        self.block_holders.contains(&kind)
    }

    pub fn is_definition(&self, kind: &str) -> bool {
        self.definition_kinds.contains(&kind)
    }

    pub fn introduces_scope(&self, kind: &str) -> bool {
        self.scope_introducing_kinds.contains(&kind)
    }

    pub fn is_declarator_parent(&self, kind: &str) -> bool {
        self.declarator_parents.contains(&kind)
    }

    pub fn is_type(&self, kind: &str) -> bool {
        self.type_kinds.contains(&kind)
    }

    pub fn is_method_parent(&self, kind: &str) -> bool {
        self.method_parents.contains(&kind)
    }

    pub fn is_identifier(&self, kind: &str) -> bool {
        self.identifier_kinds.contains(&kind)
    }

    pub fn is_atomic_leaf(&self, kind: &str) -> bool {
        self.atomic_leaf_kinds.contains(&kind)
    }

    pub fn is_comment(&self, kind: &str) -> bool {
        self.comment_kinds.contains(&kind)
    }

    pub fn is_function(&self, kind: &str) -> bool {
        self.function_kinds.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_statements_are_statements() {
        for lang in [Language::C, Language::Java] {
            let catalog = lang.catalog();
            for kind in catalog.control_stmt {
                assert!(
                    catalog.is_statement(kind),
                    "{lang}: control kind {kind} missing from statement_kinds"
                );
            }
            for kind in catalog.non_control_stmt {
                assert!(catalog.is_statement(kind));
            }
        }
    }

    #[test]
    fn loops_and_jumps_are_control() {
        for lang in [Language::C, Language::Java] {
            let catalog = lang.catalog();
            for kind in catalog.loop_stmt {
                assert!(catalog.is_control(kind));
            }
            for kind in catalog.jump_stmt {
                assert!(catalog.is_control(kind));
            }
        }
    }

    #[test]
    fn block_holders_introduce_scopes() {
        for lang in [Language::C, Language::Java] {
            let catalog = lang.catalog();
            for kind in catalog.block_holders {
                if *kind == "translation_unit" || *kind == "program" || *kind == "else_clause" {
                    continue;
                }
                assert!(
                    catalog.introduces_scope(kind) || catalog.is_statement(kind),
                    "{lang}: {kind} neither scopes nor is a statement"
                );
            }
        }
    }
}
