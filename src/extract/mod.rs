//! Symbol extraction: one pre-order walk that tokenizes leaves, tracks
//! lexical scopes, detects declarations and links every identifier use to
//! its binding declaration.

use std::collections::HashMap;

use tracing::{debug, trace};
use tree_sitter::Node;

use crate::error::{Result, WeaveError};
use crate::lang::{Language, NodeCatalog};
use crate::model::symbols::SymbolTable;
use crate::parser::index::{NodeId, NodeTable};
use crate::parser::{condense_ws, named_children, ParseSession};

pub struct SymbolExtractor<'s> {
    session: &'s ParseSession,
    table: &'s NodeTable,
    catalog: &'static NodeCatalog,
    symbols: SymbolTable,
    scope_stack: Vec<u32>,
    scope_counter: u32,
    typedefs: HashMap<String, String>,
}

impl<'s> SymbolExtractor<'s> {
    pub fn extract(session: &'s ParseSession, table: &'s NodeTable) -> Result<SymbolTable> {
        let mut extractor = Self {
            session,
            table,
            catalog: session.language.catalog(),
            symbols: SymbolTable::default(),
            scope_stack: Vec::new(),
            scope_counter: 0,
            typedefs: HashMap::new(),
        };

        if session.language == Language::C {
            extractor.collect_typedefs(session.root());
        }

        extractor.visit(session.root())?;
        if !extractor.scope_stack.is_empty() {
            return Err(WeaveError::Scope(format!(
                "{} scopes left open after walk",
                extractor.scope_stack.len()
            )));
        }

        debug!(
            tokens = extractor.symbols.tokens.len(),
            declarations = extractor.symbols.declaration.len(),
            resolved_uses = extractor.symbols.declaration_map.len(),
            "symbol extraction finished"
        );
        Ok(extractor.symbols)
    }

    fn visit(&mut self, node: Node<'s>) -> Result<()> {
        let scoped = self.catalog.introduces_scope(node.kind());
        if scoped {
            self.scope_counter += 1;
            self.scope_stack.push(self.scope_counter);
        }

        let leafish = (node.named_child_count() == 0 || self.catalog.is_atomic_leaf(node.kind()))
            && !self.catalog.is_comment(node.kind());

        if leafish {
            self.process_leaf(node);
        } else {
            for child in named_children(node) {
                self.visit(child)?;
            }
        }

        if scoped {
            self.scope_stack
                .pop()
                .ok_or_else(|| WeaveError::Scope("pop on empty scope stack".to_string()))?;
        }
        Ok(())
    }

    fn process_leaf(&mut self, node: Node<'s>) {
        let Some(id) = self.table.id_of(node) else {
            return;
        };
        let text = self.session.text(node).to_string();

        self.symbols.label.insert(id, text.clone());
        self.symbols.start_line.insert(id, self.session.line(node));
        self.symbols.tokens.push(id);
        self.symbols.scope_map.insert(id, self.scope_stack.clone());

        let Some(parent) = node.parent() else {
            return;
        };

        self.identify_method(node, parent, id);

        if parent.kind() == "field_expression" {
            self.label_field_chain(node, parent, id);
        }

        if self.is_declaration(node, parent) {
            self.symbols.declaration.insert(id, text);
            if let Some(ty) = self.declared_type(node) {
                self.symbols.data_type.insert(id, ty);
            }
        } else if node.kind() == "identifier" {
            self.resolve_use(id, &text);
        }
    }

    /// Records method/function identifiers; an adjacent argument list marks
    /// a call site.
    fn identify_method(&mut self, node: Node<'s>, parent: Node<'s>, id: NodeId) {
        if !self.catalog.is_method_parent(parent.kind()) {
            return;
        }
        let name_field = match parent.kind() {
            "function_declarator" => "declarator",
            "call_expression" => "function",
            _ => "name",
        };
        if parent.child_by_field_name(name_field) != Some(node) {
            return;
        }
        self.symbols.methods.insert(id);
        if let Some(sibling) = node.next_named_sibling() {
            if sibling.kind() == self.catalog.argument_list_kind {
                self.symbols.calls.insert(id);
            }
        }
    }

    /// A field identifier in an access chain (`p.x`, `q->next->val`) is
    /// labeled with the whole chain; a chain in call position is a method.
    fn label_field_chain(&mut self, node: Node<'s>, parent: Node<'s>, id: NodeId) {
        if parent.child_by_field_name("field") != Some(node) {
            return;
        }
        let mut outer = parent;
        while let Some(p) = outer.parent() {
            if p.kind() == "field_expression" {
                outer = p;
            } else {
                break;
            }
        }
        self.symbols
            .label
            .insert(id, condense_ws(self.session.text(outer)));

        if let Some(call) = outer.parent() {
            if call.kind() == "call_expression"
                && call.child_by_field_name("function") == Some(outer)
            {
                self.symbols.methods.insert(id);
                self.symbols.calls.insert(id);
            }
        }
    }

    fn is_declaration(&self, node: Node<'s>, parent: Node<'s>) -> bool {
        if node.kind() != "identifier" || !self.catalog.is_declarator_parent(parent.kind()) {
            return false;
        }
        match self.session.language {
            Language::C => self.is_c_declaration(node, parent),
            Language::Java => self.is_java_declaration(node, parent),
        }
    }

    fn is_c_declaration(&self, node: Node<'s>, parent: Node<'s>) -> bool {
        match parent.kind() {
            "init_declarator" | "pointer_declarator" | "array_declarator"
            | "function_declarator" => parent.child_by_field_name("declarator") == Some(node),
            "parameter_declaration" => true,
            // `int x;` puts the identifier directly under the declaration;
            // require a preceding type or qualifier so `x;` stays a use.
            "declaration" => node
                .prev_named_sibling()
                .map(|prev| {
                    self.catalog.is_type(prev.kind())
                        || prev.kind() == "storage_class_specifier"
                        || prev.kind() == "type_qualifier"
                })
                .unwrap_or(false),
            _ => false,
        }
    }

    fn is_java_declaration(&self, node: Node<'s>, parent: Node<'s>) -> bool {
        match parent.kind() {
            "variable_declarator"
            | "formal_parameter"
            | "catch_formal_parameter"
            | "resource"
            | "enhanced_for_statement" => parent.child_by_field_name("name") == Some(node),
            _ => false,
        }
    }

    fn declared_type(&self, node: Node<'s>) -> Option<String> {
        match self.session.language {
            Language::C => self.c_declared_type(node),
            Language::Java => self.java_declared_type(node),
        }
    }

    /// Walks declarators upward collecting pointer/array depth, then reads
    /// the type specifier off the declaration and expands typedefs.
    fn c_declared_type(&self, node: Node<'s>) -> Option<String> {
        let mut stars = 0usize;
        let mut is_array = false;
        let mut current = node.parent();

        while let Some(n) = current {
            match n.kind() {
                "pointer_declarator" => {
                    for i in 0..n.child_count() {
                        if n.child(i).map(|c| c.kind()) == Some("*") {
                            stars += 1;
                        }
                    }
                }
                "array_declarator" => is_array = true,
                "declaration" | "parameter_declaration" => {
                    let base = named_children(n)
                        .into_iter()
                        .find(|c| self.catalog.is_type(c.kind()))
                        .map(|c| condense_ws(self.session.text(c)))?;
                    let mut ty = self.expand_typedef(base);
                    if stars > 0 {
                        ty.push_str(&"*".repeat(stars));
                    } else if is_array {
                        ty.push('*');
                    }
                    return Some(ty);
                }
                _ => {}
            }
            current = n.parent();
        }
        None
    }

    fn java_declared_type(&self, node: Node<'s>) -> Option<String> {
        let parent = node.parent()?;
        let holder = match parent.kind() {
            "variable_declarator" => parent.parent()?,
            _ => parent,
        };
        if let Some(ty) = holder.child_by_field_name("type") {
            return Some(condense_ws(self.session.text(ty)));
        }
        named_children(holder)
            .into_iter()
            .find(|c| c.kind() == "catch_type")
            .map(|c| condense_ws(self.session.text(c)))
    }

    /// Longest-scope-prefix resolution; ties go to the greatest id (the
    /// declaration introduced latest in source order). Unresolved uses are
    /// left out: they may name library symbols.
    fn resolve_use(&mut self, id: NodeId, name: &str) {
        let Some(current) = self.symbols.scope_map.get(&id) else {
            return;
        };
        let mut best: Option<(NodeId, usize)> = None;
        for (&decl_id, decl_name) in &self.symbols.declaration {
            if decl_name != name {
                continue;
            }
            let Some(decl_scope) = self.symbols.scope_map.get(&decl_id) else {
                continue;
            };
            if !current.starts_with(decl_scope) {
                continue;
            }
            let depth = decl_scope.len();
            best = match best {
                None => Some((decl_id, depth)),
                Some((prev_id, prev_depth)) => {
                    if depth > prev_depth || (depth == prev_depth && decl_id > prev_id) {
                        Some((decl_id, depth))
                    } else {
                        Some((prev_id, prev_depth))
                    }
                }
            };
        }
        if let Some((decl, _)) = best {
            trace!(use_id = %id, decl_id = %decl, name, "resolved use");
            self.symbols.declaration_map.insert(id, decl);
        }
    }

    /// Pre-pass over `type_definition` nodes building the alias map used
    /// when recording declared types.
    fn collect_typedefs(&mut self, node: Node<'s>) {
        if node.kind() == "type_definition" {
            self.record_typedef(node);
        }
        for child in named_children(node) {
            self.collect_typedefs(child);
        }
    }

    fn record_typedef(&mut self, node: Node<'s>) {
        let children = named_children(node);
        let base = children
            .iter()
            .find(|c| self.catalog.is_type(c.kind()))
            .map(|c| condense_ws(self.session.text(*c)));
        let Some(base) = base else {
            return;
        };

        for child in &children {
            match child.kind() {
                "type_identifier" if condense_ws(self.session.text(*child)) != base => {
                    let name = self.session.text(*child).to_string();
                    self.typedefs.insert(name, base.clone());
                    return;
                }
                "pointer_declarator" => {
                    let mut stars = 0usize;
                    for i in 0..child.child_count() {
                        if child.child(i).map(|c| c.kind()) == Some("*") {
                            stars += 1;
                        }
                    }
                    if let Some(inner) = find_type_name(*child) {
                        let name = self.session.text(inner).to_string();
                        self.typedefs
                            .insert(name, format!("{base}{}", "*".repeat(stars)));
                    }
                    return;
                }
                _ => {}
            }
        }
    }

    fn expand_typedef(&self, ty: String) -> String {
        let mut current = ty;
        for _ in 0..8 {
            let base = current.trim_end_matches('*');
            let stars = current.len() - base.len();
            match self.typedefs.get(base) {
                Some(actual) => {
                    current = format!("{actual}{}", "*".repeat(stars));
                }
                None => break,
            }
        }
        current
    }
}

fn find_type_name(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() == "type_identifier" || node.kind() == "identifier" {
        return Some(node);
    }
    for child in named_children(node) {
        if let Some(found) = find_type_name(child) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SourceParser;

    fn tables(language: Language, source: &str) -> (ParseSession, NodeTable) {
        let session = SourceParser::new(language).parse(source).unwrap();
        let table = NodeTable::build(&session);
        (session, table)
    }

    fn decl_name_of_use(symbols: &SymbolTable, use_id: NodeId) -> Option<&str> {
        symbols
            .declaration_map
            .get(&use_id)
            .and_then(|d| symbols.declaration.get(d))
            .map(String::as_str)
    }

    #[test]
    fn tokens_follow_source_order() {
        let (session, table) = tables(Language::C, "int a = b + c;\nint d;");
        let symbols = SymbolExtractor::extract(&session, &table).unwrap();
        let labels: Vec<_> = symbols
            .tokens
            .iter()
            .map(|id| symbols.label[id].as_str())
            .collect();
        assert_eq!(labels, ["int", "a", "b", "c", "int", "d"]);

        let lines: Vec<_> = symbols
            .tokens
            .iter()
            .map(|id| symbols.start_line[id])
            .collect();
        assert_eq!(lines, [0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn declarations_and_uses_resolve() {
        let source = "int f(int a) { int b = a; return b; }";
        let (session, table) = tables(Language::C, source);
        let symbols = SymbolExtractor::extract(&session, &table).unwrap();

        let decl_names: Vec<_> = symbols.declaration.values().cloned().collect();
        assert!(decl_names.contains(&"a".to_string()));
        assert!(decl_names.contains(&"b".to_string()));

        // Both the `a` in the initializer and the `b` in the return resolve.
        let resolved: Vec<_> = symbols
            .declaration_map
            .keys()
            .map(|id| symbols.label[id].as_str())
            .collect();
        assert!(resolved.contains(&"a"));
        assert!(resolved.contains(&"b"));
    }

    #[test]
    fn shadowing_picks_the_innermost_declaration() {
        let source = "void f() { int x = 1; { int x = 2; int y = x; } int z = x; }";
        let (session, table) = tables(Language::C, source);
        let symbols = SymbolExtractor::extract(&session, &table).unwrap();

        let mut x_decls: Vec<NodeId> = symbols
            .declaration
            .iter()
            .filter(|(_, name)| name.as_str() == "x")
            .map(|(id, _)| *id)
            .collect();
        x_decls.sort();
        assert_eq!(x_decls.len(), 2);
        let (outer_x, inner_x) = (x_decls[0], x_decls[1]);

        let uses: Vec<(NodeId, NodeId)> = symbols
            .declaration_map
            .iter()
            .filter(|(use_id, _)| symbols.label[use_id] == "x")
            .map(|(u, d)| (*u, *d))
            .collect();
        assert_eq!(uses.len(), 2);
        // First x use sits in the inner block, second after it.
        assert_eq!(uses[0].1, inner_x);
        assert_eq!(uses[1].1, outer_x);

        // Scope nesting invariant: the decl's scope chain prefixes the use's.
        for (use_id, decl_id) in uses {
            assert!(symbols.scope_map[&use_id].starts_with(&symbols.scope_map[&decl_id]));
        }
    }

    #[test]
    fn records_pointer_and_typedef_types() {
        let source = "typedef unsigned int uint; void f() { uint n = 0; char *s; }";
        let (session, table) = tables(Language::C, source);
        let symbols = SymbolExtractor::extract(&session, &table).unwrap();

        let type_of = |name: &str| {
            symbols
                .declaration
                .iter()
                .find(|(_, n)| n.as_str() == name)
                .and_then(|(id, _)| symbols.data_type.get(id))
                .cloned()
        };
        assert_eq!(type_of("n").as_deref(), Some("unsigned int"));
        assert_eq!(type_of("s").as_deref(), Some("char*"));
    }

    #[test]
    fn calls_are_a_subset_of_methods() {
        let source = "int add(int a, int b) { return a + b; } int main() { return add(1, 2); }";
        let (session, table) = tables(Language::C, source);
        let symbols = SymbolExtractor::extract(&session, &table).unwrap();

        assert!(symbols.calls.is_subset(&symbols.methods));
        let call_labels: Vec<_> = symbols
            .calls
            .iter()
            .map(|id| symbols.label[id].as_str())
            .collect();
        assert_eq!(call_labels, ["add"]);
        // Declarations of `add` and `main` are methods but not calls.
        assert_eq!(symbols.methods.len(), 3);
    }

    #[test]
    fn java_catch_parameter_declares_and_types() {
        let source = r#"
            class A {
                void f() {
                    try { g(); } catch (RuntimeException e) { h(e); }
                }
            }
        "#;
        let (session, table) = tables(Language::Java, source);
        let symbols = SymbolExtractor::extract(&session, &table).unwrap();

        let e_decl = symbols
            .declaration
            .iter()
            .find(|(_, n)| n.as_str() == "e")
            .map(|(id, _)| *id)
            .expect("catch parameter declared");
        assert_eq!(symbols.data_type[&e_decl], "RuntimeException");

        let e_use = symbols
            .declaration_map
            .iter()
            .find(|(u, _)| symbols.label[u] == "e")
            .map(|(_, d)| *d);
        assert_eq!(e_use, Some(e_decl));
    }

    #[test]
    fn unresolved_library_use_is_omitted() {
        let source = "void f() { printf__(stdout_handle); }";
        let (session, table) = tables(Language::C, source);
        let symbols = SymbolExtractor::extract(&session, &table).unwrap();
        let unresolved = symbols
            .tokens
            .iter()
            .find(|id| symbols.label[id] == "stdout_handle")
            .unwrap();
        assert!(decl_name_of_use(&symbols, *unresolved).is_none());
    }
}
