//! C front-end for the CFG builder: switch/case dispatch, goto/label
//! resolution and function-pointer call tracking.

use std::collections::{BTreeMap, BTreeSet};

use tree_sitter::Node;

use crate::error::Result;
use crate::model::graph::EdgeKind;
use crate::parser::{named_children, ParseSession};

use super::{Flow, FlowDialect, ForParts, FunctionBuilder, SwitchArm};

pub(crate) struct CDialect;

impl FlowDialect for CDialect {
    fn functions<'t>(&self, session: &'t ParseSession) -> Vec<Node<'t>> {
        let mut out = Vec::new();
        collect_functions(session.root(), &mut out);
        out
    }

    fn function_name(&self, session: &ParseSession, func: Node<'_>) -> String {
        func.child_by_field_name("declarator")
            .and_then(find_declared_identifier)
            .map(|n| session.text(n).to_string())
            .unwrap_or_else(|| "<anonymous>".to_string())
    }

    fn function_body<'t>(&self, func: Node<'t>) -> Option<Node<'t>> {
        func.child_by_field_name("body")
    }

    fn parameter_names<'t>(&self, _session: &'t ParseSession, func: Node<'t>) -> Vec<Node<'t>> {
        let Some(declarator) = func.child_by_field_name("declarator") else {
            return Vec::new();
        };
        let Some(function_declarator) = find_function_declarator(declarator) else {
            return Vec::new();
        };
        let Some(params) = function_declarator.child_by_field_name("parameters") else {
            return Vec::new();
        };
        named_children(params)
            .into_iter()
            .filter(|p| p.kind() == "parameter_declaration")
            .filter_map(|p| p.child_by_field_name("declarator"))
            .filter_map(find_declared_identifier)
            .collect()
    }

    fn else_body<'t>(&self, if_node: Node<'t>) -> Option<Node<'t>> {
        // The grammar wraps the alternative in an else_clause.
        let clause = if_node.child_by_field_name("alternative")?;
        named_children(clause).into_iter().next()
    }

    fn for_parts<'t>(&self, node: Node<'t>) -> ForParts<'t> {
        let mut cursor = node.walk();
        let init = node
            .children_by_field_name("initializer", &mut cursor)
            .collect();
        let mut cursor = node.walk();
        let update = node.children_by_field_name("update", &mut cursor).collect();
        ForParts {
            init,
            condition: node.child_by_field_name("condition"),
            update,
            body: node.child_by_field_name("body"),
        }
    }

    fn handle<'t>(
        &self,
        b: &mut FunctionBuilder<'_, '_, 't>,
        node: Node<'t>,
    ) -> Result<Option<Flow>> {
        match node.kind() {
            "switch_statement" => {
                let cond = node
                    .child_by_field_name("condition")
                    .map(|c| b.text(c))
                    .unwrap_or_default();
                let arms = switch_arms(b, node);
                b.switch_stmt(node, &cond, arms).map(Some)
            }
            "goto_statement" => {
                let label_text = b.text(node);
                let id = b.cfg_node(node, label_text);
                let label = node
                    .child_by_field_name("label")
                    .map(|l| b.ctx.session.text(l).to_string())
                    .unwrap_or_default();
                b.defer_goto(id, label, node.start_position().row);
                Ok(Some(Flow {
                    entries: vec![id],
                    dangling: Vec::new(),
                }))
            }
            _ => Ok(None),
        }
    }

    fn call_kinds(&self) -> &'static [&'static str] {
        &["call_expression"]
    }

    fn callee_name(&self, session: &ParseSession, call: Node<'_>) -> Option<String> {
        let function = call.child_by_field_name("function")?;
        if function.kind() == "identifier" {
            Some(session.text(function).to_string())
        } else {
            None
        }
    }

    /// `fp = &f` / `fp = f` make later `fp(...)` calls resolve to `f`.
    fn callee_aliases(
        &self,
        session: &ParseSession,
        function_names: &BTreeSet<String>,
    ) -> BTreeMap<String, String> {
        let mut aliases = BTreeMap::new();
        collect_aliases(session.root(), session, function_names, &mut aliases);
        aliases
    }
}

fn collect_functions<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.kind() == "function_definition" {
        out.push(node);
        return;
    }
    for child in named_children(node) {
        collect_functions(child, out);
    }
}

fn find_function_declarator(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() == "function_declarator" {
        return Some(node);
    }
    for child in named_children(node) {
        if let Some(found) = find_function_declarator(child) {
            return Some(found);
        }
    }
    None
}

/// The identifier inside an arbitrarily nested declarator chain
/// (`*fn(void)`, `(*arr)[10]`, plain names).
fn find_declared_identifier(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() == "identifier" {
        return Some(node);
    }
    for child in named_children(node) {
        if let Some(found) = find_declared_identifier(child) {
            return Some(found);
        }
    }
    None
}

fn switch_arms<'t>(b: &FunctionBuilder<'_, '_, 't>, node: Node<'t>) -> Vec<SwitchArm<'t>> {
    let Some(body) = node.child_by_field_name("body") else {
        return Vec::new();
    };
    named_children(body)
        .into_iter()
        .filter(|c| c.kind() == "case_statement")
        .map(|case| {
            let value = case.child_by_field_name("value");
            let kind = match value {
                Some(v) => EdgeKind::Case(b.text(v)),
                None => EdgeKind::DefaultCase,
            };
            let stmts = named_children(case)
                .into_iter()
                .filter(|c| Some(*c) != value && !b.ctx.catalog.is_comment(c.kind()))
                .collect();
            SwitchArm {
                kinds: vec![kind],
                stmts,
            }
        })
        .collect()
}

fn collect_aliases(
    node: Node<'_>,
    session: &ParseSession,
    function_names: &BTreeSet<String>,
    aliases: &mut BTreeMap<String, String>,
) {
    match node.kind() {
        "assignment_expression" => {
            if let (Some(left), Some(right)) = (
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ) {
                if left.kind() == "identifier" {
                    if let Some(target) = alias_target(right, session, function_names) {
                        aliases.insert(session.text(left).to_string(), target);
                    }
                }
            }
        }
        "init_declarator" => {
            if let (Some(declarator), Some(value)) = (
                node.child_by_field_name("declarator"),
                node.child_by_field_name("value"),
            ) {
                if let Some(name) = find_declared_identifier(declarator) {
                    if let Some(target) = alias_target(value, session, function_names) {
                        aliases.insert(session.text(name).to_string(), target);
                    }
                }
            }
        }
        _ => {}
    }
    for child in named_children(node) {
        collect_aliases(child, session, function_names, aliases);
    }
}

fn alias_target(
    node: Node<'_>,
    session: &ParseSession,
    function_names: &BTreeSet<String>,
) -> Option<String> {
    match node.kind() {
        // &f
        "pointer_expression" => {
            let argument = node.child_by_field_name("argument")?;
            (argument.kind() == "identifier").then(|| session.text(argument).to_string())
        }
        // fp = f, only when f is a known function
        "identifier" => {
            let name = session.text(node);
            function_names.contains(name).then(|| name.to_string())
        }
        _ => None,
    }
}
