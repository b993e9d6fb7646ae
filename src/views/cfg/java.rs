//! Java front-end for the CFG builder: exception flow, labeled jumps,
//! enhanced for, switch groups and synchronized blocks.

use std::collections::{BTreeMap, BTreeSet};

use tree_sitter::Node;

use crate::error::Result;
use crate::model::graph::EdgeKind;
use crate::parser::{named_children, ParseSession};

use super::{Dangling, FinallyFrame, Flow, FlowDialect, ForParts, FunctionBuilder, SwitchArm};

pub(crate) struct JavaDialect;

impl FlowDialect for JavaDialect {
    fn functions<'t>(&self, session: &'t ParseSession) -> Vec<Node<'t>> {
        let mut out = Vec::new();
        collect_methods(session.root(), session, &mut out);
        out
    }

    fn function_name(&self, session: &ParseSession, func: Node<'_>) -> String {
        func.child_by_field_name("name")
            .map(|n| session.text(n).to_string())
            .unwrap_or_else(|| "<anonymous>".to_string())
    }

    fn function_body<'t>(&self, func: Node<'t>) -> Option<Node<'t>> {
        func.child_by_field_name("body")
    }

    fn parameter_names<'t>(&self, _session: &'t ParseSession, func: Node<'t>) -> Vec<Node<'t>> {
        let Some(params) = func.child_by_field_name("parameters") else {
            return Vec::new();
        };
        named_children(params)
            .into_iter()
            .filter_map(|p| match p.kind() {
                "formal_parameter" => p.child_by_field_name("name"),
                "spread_parameter" => named_children(p)
                    .into_iter()
                    .find(|c| c.kind() == "variable_declarator")
                    .and_then(|d| d.child_by_field_name("name")),
                _ => None,
            })
            .collect()
    }

    fn else_body<'t>(&self, if_node: Node<'t>) -> Option<Node<'t>> {
        if_node.child_by_field_name("alternative")
    }

    fn for_parts<'t>(&self, node: Node<'t>) -> ForParts<'t> {
        let mut cursor = node.walk();
        let init = node.children_by_field_name("init", &mut cursor).collect();
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
            "switch_expression" => {
                let cond = node
                    .child_by_field_name("condition")
                    .map(|c| b.text(c))
                    .unwrap_or_default();
                let arms = switch_arms(b, node);
                b.switch_stmt(node, &cond, arms).map(Some)
            }
            "enhanced_for_statement" => enhanced_for(b, node).map(Some),
            "try_statement" | "try_with_resources_statement" => try_stmt(b, node).map(Some),
            "throw_statement" => Ok(Some(throw_stmt(b, node))),
            "synchronized_statement" => synchronized_stmt(b, node).map(Some),
            _ => Ok(None),
        }
    }

    fn call_kinds(&self) -> &'static [&'static str] {
        &["method_invocation", "object_creation_expression"]
    }

    fn callee_name(&self, session: &ParseSession, call: Node<'_>) -> Option<String> {
        match call.kind() {
            "method_invocation" => call
                .child_by_field_name("name")
                .map(|n| session.text(n).to_string()),
            "object_creation_expression" => call
                .child_by_field_name("type")
                .map(|t| session.text(t).to_string()),
            _ => None,
        }
    }

    fn callee_aliases(
        &self,
        _session: &ParseSession,
        _function_names: &BTreeSet<String>,
    ) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

fn collect_methods<'t>(node: Node<'t>, session: &'t ParseSession, out: &mut Vec<Node<'t>>) {
    if session.language.catalog().is_function(node.kind()) {
        out.push(node);
        // Local classes inside method bodies are rare; their methods would
        // be nested definitions and are collected too.
    }
    for child in named_children(node) {
        collect_methods(child, session, out);
    }
}

/// `for (Type x : xs)`: the statement itself is the loop header binding
/// the element variable.
fn enhanced_for<'t>(b: &mut FunctionBuilder<'_, '_, 't>, node: Node<'t>) -> Result<Flow> {
    let ty = node
        .child_by_field_name("type")
        .map(|n| b.text(n))
        .unwrap_or_default();
    let name = node
        .child_by_field_name("name")
        .map(|n| b.text(n))
        .unwrap_or_default();
    let value = node
        .child_by_field_name("value")
        .map(|n| b.text(n))
        .unwrap_or_default();
    let head = b.cfg_node(node, format!("for({ty} {name} : {value})"));

    b.push_loop(head);
    let body_flow = match node.child_by_field_name("body") {
        Some(body) => b.process_branch(body)?,
        None => Flow::default(),
    };
    let breaks = b.pop_breaks();

    if body_flow.entries.is_empty() {
        b.emit(head, head, EdgeKind::True);
    } else {
        for &e in &body_flow.entries {
            b.emit(head, e, EdgeKind::True);
        }
        b.glue(&body_flow.dangling, &[head], EdgeKind::LoopBack);
    }

    let mut dangling = vec![Dangling {
        node: head,
        kind: super::PendingKind::LoopExit,
    }];
    dangling.extend(breaks);
    Ok(Flow {
        entries: vec![head],
        dangling,
    })
}

fn throw_stmt<'t>(b: &mut FunctionBuilder<'_, '_, 't>, node: Node<'t>) -> Flow {
    let label = b.text(node);
    let id = b.cfg_node(node, label);

    let heads = b.catch_stack.last().cloned().unwrap_or_default();
    if heads.is_empty() {
        let exit = b.exit;
        b.emit(id, exit, EdgeKind::Throw);
    } else {
        for head in heads {
            b.emit(id, head, EdgeKind::Throw);
        }
    }
    Flow {
        entries: vec![id],
        dangling: Vec::new(),
    }
}

/// Try/catch/finally. Throw sites inside the body edge to every catch head;
/// the finally block sits on every path out of the construct, and returns
/// routed through it carry `return` onward to the exit.
fn try_stmt<'t>(b: &mut FunctionBuilder<'_, '_, 't>, node: Node<'t>) -> Result<Flow> {
    let kids = named_children(node);
    let catches: Vec<Node<'t>> = kids
        .iter()
        .copied()
        .filter(|c| c.kind() == "catch_clause")
        .collect();
    let finally = kids.iter().copied().find(|c| c.kind() == "finally_clause");

    // Resource bindings execute ahead of the body, in order.
    let mut resource_ids = Vec::new();
    if let Some(resources) = node.child_by_field_name("resources") {
        for r in named_children(resources) {
            if r.kind() == "resource" {
                let label = b.text(r);
                resource_ids.push(b.cfg_node(r, label));
            }
        }
    }
    for pair in resource_ids.windows(2) {
        b.emit(pair[0], pair[1], EdgeKind::Seq);
    }

    // The finally body is built first so that returns inside the try know
    // where to route.
    let finally_flow = match finally.and_then(find_block) {
        Some(block) => {
            let flow = b.process_branch(block)?;
            if !flow.entries.is_empty() {
                b.finally_stack.push(FinallyFrame {
                    entries: flow.entries.clone(),
                    routed_return: false,
                });
            }
            flow
        }
        None => Flow::default(),
    };
    let finally_armed = !finally_flow.entries.is_empty();

    let mut catch_heads = Vec::new();
    for c in &catches {
        let param = named_children(*c)
            .into_iter()
            .find(|k| k.kind() == "catch_formal_parameter")
            .map(|p| b.text(p))
            .unwrap_or_default();
        catch_heads.push(b.cfg_node(*c, format!("catch({param})")));
    }

    b.catch_stack.push(catch_heads.clone());
    let body_flow = match node.child_by_field_name("body") {
        Some(body) => b.process_branch(body)?,
        None => Flow::default(),
    };
    b.catch_stack.pop();

    if let Some(&last_resource) = resource_ids.last() {
        b.glue(
            &[Dangling::seq(last_resource)],
            &body_flow.entries,
            EdgeKind::Seq,
        );
    }
    let mut leaving_from_resources = Vec::new();
    if body_flow.entries.is_empty() {
        if let Some(&last_resource) = resource_ids.last() {
            leaving_from_resources.push(Dangling::seq(last_resource));
        }
    }

    // Catch bodies run after their head; an empty handler dangles the head.
    let mut leaving = body_flow.dangling.clone();
    leaving.extend(leaving_from_resources);
    for (head, c) in catch_heads.iter().zip(&catches) {
        let handler_flow = match c.child_by_field_name("body") {
            Some(body) => b.process_branch(body)?,
            None => Flow::default(),
        };
        if handler_flow.entries.is_empty() {
            leaving.push(Dangling::seq(*head));
        } else {
            for &e in &handler_flow.entries {
                b.emit(*head, e, EdgeKind::Catch);
            }
            leaving.extend(handler_flow.dangling);
        }
    }

    let entries = if let Some(&first) = resource_ids.first() {
        vec![first]
    } else {
        body_flow.entries
    };

    if finally_armed {
        let frame = b.finally_stack.pop();
        b.glue(&leaving, &finally_flow.entries, EdgeKind::Seq);
        if let Some(frame) = frame {
            if frame.routed_return {
                let exit = b.exit;
                for d in &finally_flow.dangling {
                    b.emit(d.node, exit, EdgeKind::Return);
                }
            }
        }
        Ok(Flow {
            entries,
            dangling: finally_flow.dangling,
        })
    } else {
        Ok(Flow {
            entries,
            dangling: leaving,
        })
    }
}

fn synchronized_stmt<'t>(b: &mut FunctionBuilder<'_, '_, 't>, node: Node<'t>) -> Result<Flow> {
    let monitor = named_children(node)
        .into_iter()
        .find(|c| c.kind() == "parenthesized_expression")
        .map(|c| b.text(c))
        .unwrap_or_default();
    let head = b.cfg_node(node, super::head_label("synchronized", &monitor));

    let body_flow = match node.child_by_field_name("body") {
        Some(body) => b.process_branch(body)?,
        None => Flow::default(),
    };
    if body_flow.entries.is_empty() {
        return Ok(Flow {
            entries: vec![head],
            dangling: vec![Dangling::seq(head)],
        });
    }
    for &e in &body_flow.entries {
        b.emit(head, e, EdgeKind::Seq);
    }
    Ok(Flow {
        entries: vec![head],
        dangling: body_flow.dangling,
    })
}

fn find_block(node: Node<'_>) -> Option<Node<'_>> {
    named_children(node).into_iter().find(|c| c.kind() == "block")
}

/// Arms of a `switch` over statement groups; arrow rules get one arm per
/// rule with the rule body as its statements.
fn switch_arms<'t>(b: &FunctionBuilder<'_, '_, 't>, node: Node<'t>) -> Vec<SwitchArm<'t>> {
    let Some(body) = node.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut arms = Vec::new();
    for child in named_children(body) {
        if !matches!(child.kind(), "switch_block_statement_group" | "switch_rule") {
            continue;
        }
        let mut kinds = Vec::new();
        let mut stmts = Vec::new();
        for k in named_children(child) {
            if k.kind() == "switch_label" {
                kinds.push(label_kind(b, k));
            } else if !b.ctx.catalog.is_comment(k.kind()) {
                stmts.push(k);
            }
        }
        arms.push(SwitchArm { kinds, stmts });
    }
    arms
}

fn label_kind<'t>(b: &FunctionBuilder<'_, '_, 't>, label: Node<'t>) -> EdgeKind {
    match named_children(label).first() {
        Some(value) => EdgeKind::Case(b.text(*value)),
        None => EdgeKind::DefaultCase,
    }
}
