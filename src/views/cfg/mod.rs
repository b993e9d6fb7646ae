//! Control-flow view construction.
//!
//! A per-function recursion translates structured statements into typed
//! edges. Each processed statement or block yields a `Flow`: the node ids
//! where incoming edges attach (entries) and the predecessors the *next*
//! statement must be glued to (dangling). Jumps move themselves out of the
//! dangling set and into the frame (loop/switch) or map (label) that will
//! resolve them.
//!
//! Language specifics (field layouts, switch shapes, goto vs. exceptions)
//! live behind the [`FlowDialect`] seam; everything else is shared.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};
use tree_sitter::Node;

use crate::error::Result;
use crate::lang::{Language, NodeCatalog};
use crate::model::graph::{EdgeKind, GraphEdge, GraphNode, View, ViewGraph};
use crate::model::records::{Diagnostic, DiagnosticKind};
use crate::parser::index::{NodeId, NodeTable};
use crate::parser::{condense_ws, named_children, ParseSession};

pub mod c;
pub mod java;

/// The built control-flow view plus everything the data-flow pass needs.
pub struct CfgView<'t> {
    pub graph: ViewGraph,
    pub functions: Vec<FunctionCfg>,
    /// Every statement-level CFG node with its syntax, in creation order.
    pub statements: Vec<(NodeId, Node<'t>)>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One function's control-flow skeleton.
pub struct FunctionCfg {
    pub name: String,
    pub entry: NodeId,
    pub exit: NodeId,
    /// Parameter bindings: (name, declaring identifier id).
    pub params: Vec<(String, NodeId)>,
    /// All CFG node ids belonging to this function, entry/exit included.
    pub nodes: Vec<NodeId>,
}

pub fn build<'t>(session: &'t ParseSession, table: &mut NodeTable) -> Result<CfgView<'t>> {
    match session.language {
        Language::C => build_with(&c::CDialect, session, table),
        Language::Java => build_with(&java::JavaDialect, session, table),
    }
}

fn build_with<'t>(
    dialect: &dyn FlowDialect,
    session: &'t ParseSession,
    table: &mut NodeTable,
) -> Result<CfgView<'t>> {
    let mut ctx = FlowContext {
        session,
        table,
        catalog: session.language.catalog(),
        graph: ViewGraph::new(),
        statements: Vec::new(),
        diagnostics: Vec::new(),
    };

    let roots = dialect.functions(session);
    let mut functions = Vec::new();
    for root in roots {
        if let Some(function) = build_function(dialect, &mut ctx, root)? {
            functions.push(function);
        }
    }
    add_call_edges(dialect, &mut ctx, &functions);

    debug!(
        functions = functions.len(),
        nodes = ctx.graph.node_count(),
        edges = ctx.graph.edge_count(),
        "control-flow view built"
    );
    Ok(CfgView {
        graph: ctx.graph,
        functions,
        statements: ctx.statements,
        diagnostics: ctx.diagnostics,
    })
}

/// Shared mutable state for one CFG build.
pub(crate) struct FlowContext<'c, 't> {
    pub session: &'t ParseSession,
    pub table: &'c mut NodeTable,
    pub catalog: &'static NodeCatalog,
    pub graph: ViewGraph,
    pub statements: Vec<(NodeId, Node<'t>)>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Where incoming edges attach and which predecessors still dangle.
#[derive(Debug, Clone, Default)]
pub(crate) struct Flow {
    pub entries: Vec<NodeId>,
    pub dangling: Vec<Dangling>,
}

impl Flow {
    fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.dangling.is_empty()
    }
}

/// A predecessor awaiting its successor, with the edge kind it will carry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Dangling {
    pub node: NodeId,
    pub kind: PendingKind,
}

impl Dangling {
    pub fn seq(node: NodeId) -> Self {
        Self {
            node,
            kind: PendingKind::Seq,
        }
    }
}

/// Pending edge kinds: `Seq` adopts the glue default (plain `seq`, or
/// `loop_back` when a loop closes over it); explicit branch kinds survive
/// gluing unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingKind {
    Seq,
    True,
    False,
    LoopExit,
}

impl PendingKind {
    fn resolve(self, default: &EdgeKind) -> EdgeKind {
        match self {
            PendingKind::Seq => default.clone(),
            PendingKind::True => EdgeKind::True,
            PendingKind::False => EdgeKind::False,
            PendingKind::LoopExit => EdgeKind::LoopExit,
        }
    }
}

/// Enclosing construct that `break`/`continue` resolve against.
pub(crate) enum Frame {
    Loop {
        label: Option<String>,
        continue_to: NodeId,
        breaks: Vec<Dangling>,
    },
    Switch {
        label: Option<String>,
        breaks: Vec<Dangling>,
    },
}

impl Frame {
    fn label(&self) -> Option<&str> {
        match self {
            Frame::Loop { label, .. } | Frame::Switch { label, .. } => label.as_deref(),
        }
    }

    fn breaks_mut(&mut self) -> &mut Vec<Dangling> {
        match self {
            Frame::Loop { breaks, .. } | Frame::Switch { breaks, .. } => breaks,
        }
    }
}

/// A `finally` block every exit path of the current `try` must traverse.
pub(crate) struct FinallyFrame {
    pub entries: Vec<NodeId>,
    pub routed_return: bool,
}

/// One switch case: its dispatch edge kinds and the statements it holds.
pub(crate) struct SwitchArm<'t> {
    pub kinds: Vec<EdgeKind>,
    pub stmts: Vec<Node<'t>>,
}

/// `for` clause layout, normalized across grammars.
#[derive(Default)]
pub(crate) struct ForParts<'t> {
    pub init: Vec<Node<'t>>,
    pub condition: Option<Node<'t>>,
    pub update: Vec<Node<'t>>,
    pub body: Option<Node<'t>>,
}

/// Language front-end for the CFG builder.
pub(crate) trait FlowDialect {
    /// Function/method definitions in source order.
    fn functions<'t>(&self, session: &'t ParseSession) -> Vec<Node<'t>>;
    fn function_name(&self, session: &ParseSession, func: Node<'_>) -> String;
    fn function_body<'t>(&self, func: Node<'t>) -> Option<Node<'t>>;
    /// Parameter name identifiers, in declaration order.
    fn parameter_names<'t>(&self, session: &'t ParseSession, func: Node<'t>) -> Vec<Node<'t>>;
    /// The else branch with any grammar wrapper removed.
    fn else_body<'t>(&self, if_node: Node<'t>) -> Option<Node<'t>>;
    fn for_parts<'t>(&self, node: Node<'t>) -> ForParts<'t>;
    /// Statements the common recursion does not know; `None` falls through
    /// to the shared handlers.
    fn handle<'t>(
        &self,
        b: &mut FunctionBuilder<'_, '_, 't>,
        node: Node<'t>,
    ) -> Result<Option<Flow>>;
    fn call_kinds(&self) -> &'static [&'static str];
    fn callee_name(&self, session: &ParseSession, call: Node<'_>) -> Option<String>;
    /// Name aliases for call resolution (C function pointers).
    fn callee_aliases(
        &self,
        session: &ParseSession,
        function_names: &BTreeSet<String>,
    ) -> BTreeMap<String, String>;
}

fn build_function<'t>(
    dialect: &dyn FlowDialect,
    ctx: &mut FlowContext<'_, 't>,
    func: Node<'t>,
) -> Result<Option<FunctionCfg>> {
    let Some(body) = dialect.function_body(func) else {
        return Ok(None);
    };
    let name = dialect.function_name(ctx.session, func);
    trace!(function = %name, "building function cfg");

    let entry = ctx.table.synthetic("entry");
    ctx.graph.ensure_node(
        GraphNode::new(entry, "entry", format!("entry({name})"), View::Cfg)
            .at_line(func.start_position().row),
    );
    let exit = ctx.table.synthetic("exit");
    ctx.graph.ensure_node(
        GraphNode::new(exit, "exit", format!("exit({name})"), View::Cfg)
            .at_line(func.end_position().row),
    );

    let mut builder = FunctionBuilder {
        ctx: &mut *ctx,
        dialect,
        entry,
        exit,
        nodes: vec![entry, exit],
        frames: Vec::new(),
        labels: Vec::new(),
        pending_gotos: Vec::new(),
        catch_stack: Vec::new(),
        finally_stack: Vec::new(),
        pending_label: None,
    };

    let stmts = builder.block_statements(body);
    let flow = builder.process_block(&stmts)?;
    if flow.entries.is_empty() {
        builder.emit(entry, exit, EdgeKind::Seq);
    } else {
        builder.glue(&[Dangling::seq(entry)], &flow.entries, EdgeKind::Seq);
        let dangling = flow.dangling;
        builder.glue(&dangling, &[exit], EdgeKind::Seq);
    }

    let gotos = std::mem::take(&mut builder.pending_gotos);
    for (goto_id, label, line) in gotos {
        match builder.label_target(&label) {
            Some(target) => builder.emit(goto_id, target, EdgeKind::Goto),
            None => builder.soft_error(
                format!("goto to undeclared label `{label}` in `{name}`"),
                line,
            ),
        }
    }

    let nodes = builder.nodes;
    let params = dialect
        .parameter_names(ctx.session, func)
        .into_iter()
        .filter_map(|p| {
            ctx.table
                .id_of(p)
                .map(|id| (ctx.session.text(p).to_string(), id))
        })
        .collect();

    Ok(Some(FunctionCfg {
        name,
        entry,
        exit,
        params,
        nodes,
    }))
}

/// Post-pass: `call` edges from call-site statements to in-file function
/// entries, or to one stub node per unresolved callee name.
fn add_call_edges(
    dialect: &dyn FlowDialect,
    ctx: &mut FlowContext<'_, '_>,
    functions: &[FunctionCfg],
) {
    let mut by_name: BTreeMap<String, NodeId> = BTreeMap::new();
    for f in functions {
        by_name.entry(f.name.clone()).or_insert(f.entry);
    }
    let names: BTreeSet<String> = by_name.keys().cloned().collect();
    let aliases = dialect.callee_aliases(ctx.session, &names);

    let mut stubs: BTreeMap<String, NodeId> = BTreeMap::new();
    let statements = ctx.statements.clone();
    for (site, node) in statements {
        for call in calls_in(node, ctx.catalog, dialect.call_kinds()) {
            let Some(name) = dialect.callee_name(ctx.session, call) else {
                continue;
            };
            let resolved = aliases.get(&name).cloned().unwrap_or(name);
            let target = match by_name.get(&resolved) {
                Some(&entry) => entry,
                None => *stubs.entry(resolved.clone()).or_insert_with(|| {
                    let stub = ctx.table.synthetic("call_stub");
                    ctx.graph
                        .ensure_node(GraphNode::new(stub, "call_stub", resolved.clone(), View::Cfg));
                    stub
                }),
            };
            ctx.graph
                .add_edge(site, target, GraphEdge::new(View::Cfg, EdgeKind::Call));
        }
    }
}

/// Call expressions belonging to this statement node: the scan stops at
/// nested statements, which own their calls.
fn calls_in<'t>(
    root: Node<'t>,
    catalog: &'static NodeCatalog,
    call_kinds: &'static [&'static str],
) -> Vec<Node<'t>> {
    fn rec<'t>(
        node: Node<'t>,
        root: Node<'t>,
        catalog: &'static NodeCatalog,
        call_kinds: &'static [&'static str],
        out: &mut Vec<Node<'t>>,
    ) {
        if node != root && catalog.is_statement(node.kind()) {
            return;
        }
        if call_kinds.contains(&node.kind()) {
            out.push(node);
        }
        for child in named_children(node) {
            rec(child, root, catalog, call_kinds, out);
        }
    }
    let mut out = Vec::new();
    rec(root, root, catalog, call_kinds, &mut out);
    out
}

pub(crate) struct FunctionBuilder<'b, 'c, 't> {
    pub ctx: &'b mut FlowContext<'c, 't>,
    dialect: &'b dyn FlowDialect,
    pub entry: NodeId,
    pub exit: NodeId,
    pub nodes: Vec<NodeId>,
    frames: Vec<Frame>,
    labels: Vec<(String, NodeId)>,
    pending_gotos: Vec<(NodeId, String, usize)>,
    pub catch_stack: Vec<Vec<NodeId>>,
    pub finally_stack: Vec<FinallyFrame>,
    pending_label: Option<String>,
}

impl<'b, 'c, 't> FunctionBuilder<'b, 'c, 't> {
    /// Materializes a statement-level CFG node.
    pub(crate) fn cfg_node(&mut self, node: Node<'t>, label: String) -> NodeId {
        let id = match self.ctx.table.id_of(node) {
            Some(id) => id,
            // Anonymous construct in statement position; give it an id so
            // the flow stays connected.
            None => self.ctx.table.synthetic("stmt"),
        };
        if !self.ctx.graph.contains(id) {
            self.ctx.graph.ensure_node(
                GraphNode::new(id, node.kind(), label, View::Cfg)
                    .at_line(node.start_position().row),
            );
            self.ctx.statements.push((id, node));
            self.nodes.push(id);
        }
        id
    }

    pub(crate) fn synthetic_node(
        &mut self,
        kind: &'static str,
        label: String,
        line: usize,
    ) -> NodeId {
        let id = self.ctx.table.synthetic(kind);
        self.ctx
            .graph
            .ensure_node(GraphNode::new(id, kind, label, View::Cfg).at_line(line));
        self.nodes.push(id);
        id
    }

    pub(crate) fn emit(&mut self, source: NodeId, target: NodeId, kind: EdgeKind) {
        self.ctx
            .graph
            .add_edge(source, target, GraphEdge::new(View::Cfg, kind));
    }

    pub(crate) fn glue(&mut self, dangling: &[Dangling], entries: &[NodeId], default: EdgeKind) {
        for d in dangling {
            for &e in entries {
                self.emit(d.node, e, d.kind.resolve(&default));
            }
        }
    }

    /// Records a per-function soft failure on the entry node and in the
    /// diagnostics trailer; the offending edge is simply omitted.
    pub(crate) fn soft_error(&mut self, message: String, line: usize) {
        self.ctx
            .diagnostics
            .push(Diagnostic::new(DiagnosticKind::Cfg, message.clone()).at(line, 0));
        if let Some(entry) = self.ctx.graph.node_mut(self.entry) {
            let slot = entry.extra.entry("diagnostics".to_string()).or_default();
            if !slot.is_empty() {
                slot.push_str("; ");
            }
            slot.push_str(&message);
        }
    }

    pub(crate) fn text(&self, node: Node<'t>) -> String {
        condense_ws(self.ctx.session.text(node))
    }

    fn label_target(&self, name: &str) -> Option<NodeId> {
        self.labels
            .iter()
            .find(|(l, _)| l == name)
            .map(|(_, id)| *id)
    }

    fn take_label(&mut self) -> Option<String> {
        self.pending_label.take()
    }

    /// The statements a node contributes: its filtered children for block
    /// holders, itself otherwise.
    pub(crate) fn block_statements(&self, node: Node<'t>) -> Vec<Node<'t>> {
        if self.ctx.catalog.is_block_holder(node.kind()) {
            named_children(node)
                .into_iter()
                .filter(|c| !self.ctx.catalog.is_comment(c.kind()))
                .collect()
        } else {
            vec![node]
        }
    }

    pub(crate) fn process_branch(&mut self, node: Node<'t>) -> Result<Flow> {
        let stmts = self.block_statements(node);
        self.process_block(&stmts)
    }

    /// Concatenation is gluing: prior dangling to next entries via `seq`.
    pub(crate) fn process_block(&mut self, stmts: &[Node<'t>]) -> Result<Flow> {
        let mut flow = Flow::default();
        let mut current: Vec<Dangling> = Vec::new();
        for stmt in stmts {
            let sf = self.process_statement(*stmt)?;
            if sf.is_empty() {
                continue;
            }
            if sf.entries.is_empty() {
                // No entry of its own (an empty construct that still
                // dangles); prior flow continues alongside it.
                current.extend(sf.dangling);
                continue;
            }
            self.glue(&current, &sf.entries, EdgeKind::Seq);
            if flow.entries.is_empty() {
                flow.entries = sf.entries;
            }
            current = sf.dangling;
        }
        flow.dangling = current;
        Ok(flow)
    }

    pub(crate) fn process_statement(&mut self, node: Node<'t>) -> Result<Flow> {
        let dialect = self.dialect;
        if let Some(flow) = dialect.handle(self, node)? {
            return Ok(flow);
        }

        let kind = node.kind();
        if self.ctx.catalog.is_non_control(kind) {
            return Ok(self.plain(node));
        }
        match kind {
            "labeled_statement" => self.labeled_stmt(node),
            "if_statement" => self.if_stmt(node),
            "while_statement" => self.while_stmt(node),
            "do_statement" => self.do_stmt(node),
            "for_statement" => self.for_stmt(node),
            "break_statement" => Ok(self.break_stmt(node)),
            "continue_statement" => Ok(self.continue_stmt(node)),
            "return_statement" => Ok(self.return_stmt(node)),
            // Nested definitions grow their own CFG; a bare block is a
            // pass-through.
            _ if self.ctx.catalog.is_function(kind) => Ok(Flow::default()),
            _ if self.ctx.catalog.is_block_holder(kind) => self.process_branch(node),
            _ if self.ctx.catalog.is_statement(kind) => Ok(self.plain(node)),
            // Unrecognized kinds are opaque non-statement content.
            _ => Ok(Flow::default()),
        }
    }

    fn plain(&mut self, node: Node<'t>) -> Flow {
        let label = self.text(node);
        let id = self.cfg_node(node, label);
        Flow {
            entries: vec![id],
            dangling: vec![Dangling::seq(id)],
        }
    }

    fn if_stmt(&mut self, node: Node<'t>) -> Result<Flow> {
        let cond = node
            .child_by_field_name("condition")
            .map(|c| self.text(c))
            .unwrap_or_default();
        let head = self.cfg_node(node, head_label("if", &cond));

        let mut dangling = Vec::new();
        match node.child_by_field_name("consequence") {
            Some(consequence) => {
                let then_flow = self.process_branch(consequence)?;
                if then_flow.entries.is_empty() {
                    dangling.push(Dangling {
                        node: head,
                        kind: PendingKind::True,
                    });
                } else {
                    for &e in &then_flow.entries {
                        self.emit(head, e, EdgeKind::True);
                    }
                    dangling.extend(then_flow.dangling);
                }
            }
            None => dangling.push(Dangling {
                node: head,
                kind: PendingKind::True,
            }),
        }

        match self.dialect.else_body(node) {
            Some(alternative) => {
                let else_flow = self.process_branch(alternative)?;
                if else_flow.entries.is_empty() {
                    dangling.push(Dangling {
                        node: head,
                        kind: PendingKind::False,
                    });
                } else {
                    for &e in &else_flow.entries {
                        self.emit(head, e, EdgeKind::False);
                    }
                    dangling.extend(else_flow.dangling);
                }
            }
            None => dangling.push(Dangling {
                node: head,
                kind: PendingKind::False,
            }),
        }

        Ok(Flow {
            entries: vec![head],
            dangling,
        })
    }

    fn while_stmt(&mut self, node: Node<'t>) -> Result<Flow> {
        let cond = node
            .child_by_field_name("condition")
            .map(|c| self.text(c))
            .unwrap_or_default();
        let head = self.cfg_node(node, head_label("while", &cond));
        self.push_loop(head);
        let body_flow = match node.child_by_field_name("body") {
            Some(body) => self.process_branch(body)?,
            None => Flow::default(),
        };
        let breaks = self.pop_breaks();

        if body_flow.entries.is_empty() {
            self.emit(head, head, EdgeKind::True);
        } else {
            for &e in &body_flow.entries {
                self.emit(head, e, EdgeKind::True);
            }
            self.glue(&body_flow.dangling, &[head], EdgeKind::LoopBack);
        }

        let mut dangling = vec![Dangling {
            node: head,
            kind: PendingKind::LoopExit,
        }];
        dangling.extend(breaks);
        Ok(Flow {
            entries: vec![head],
            dangling,
        })
    }

    fn do_stmt(&mut self, node: Node<'t>) -> Result<Flow> {
        let cond_node = node.child_by_field_name("condition");
        let cond_id = match cond_node {
            Some(c) => {
                let label = head_label("while", &self.text(c));
                self.cfg_node(c, label)
            }
            None => self.synthetic_node(
                "loop_header",
                "while(true)".to_string(),
                node.start_position().row,
            ),
        };

        self.push_loop(cond_id);
        let body_flow = match node.child_by_field_name("body") {
            Some(body) => self.process_branch(body)?,
            None => Flow::default(),
        };
        let breaks = self.pop_breaks();

        let entries = if body_flow.entries.is_empty() {
            vec![cond_id]
        } else {
            body_flow.entries.clone()
        };
        self.glue(&body_flow.dangling, &[cond_id], EdgeKind::Seq);
        // The body runs unconditionally first; a true condition loops back.
        for &e in &entries {
            if e != cond_id {
                self.emit(cond_id, e, EdgeKind::LoopBack);
            }
        }

        let mut dangling = vec![Dangling {
            node: cond_id,
            kind: PendingKind::LoopExit,
        }];
        dangling.extend(breaks);
        Ok(Flow { entries, dangling })
    }

    fn for_stmt(&mut self, node: Node<'t>) -> Result<Flow> {
        let parts = self.dialect.for_parts(node);

        let init_text = parts
            .init
            .iter()
            .map(|n| self.text(*n))
            .collect::<Vec<_>>()
            .join(", ");
        let cond_text = parts.condition.map(|c| self.text(c)).unwrap_or_default();
        let update_text = parts
            .update
            .iter()
            .map(|n| self.text(*n))
            .collect::<Vec<_>>()
            .join(", ");
        let header_label = format!(
            "for({};{};{})",
            init_text.trim_end_matches(';'),
            cond_text,
            update_text
        );

        // Init clauses are plain statements chained ahead of the header.
        let mut init_ids = Vec::new();
        for n in &parts.init {
            let label = self.text(*n);
            init_ids.push(self.cfg_node(*n, label));
        }
        for pair in init_ids.windows(2) {
            self.emit(pair[0], pair[1], EdgeKind::Seq);
        }

        let header = match parts.condition {
            Some(c) => self.cfg_node(c, header_label),
            None => self.synthetic_node("loop_header", header_label, node.start_position().row),
        };
        if let Some(&last_init) = init_ids.last() {
            self.emit(last_init, header, EdgeKind::Seq);
        }

        let mut update_ids = Vec::new();
        for n in &parts.update {
            let label = self.text(*n);
            update_ids.push(self.cfg_node(*n, label));
        }
        for pair in update_ids.windows(2) {
            self.emit(pair[0], pair[1], EdgeKind::Seq);
        }

        let continue_to = update_ids.first().copied().unwrap_or(header);
        self.push_loop(continue_to);
        let body_flow = match parts.body {
            Some(body) => self.process_branch(body)?,
            None => Flow::default(),
        };
        let breaks = self.pop_breaks();

        match (body_flow.entries.is_empty(), update_ids.first()) {
            (false, Some(&first_update)) => {
                for &e in &body_flow.entries {
                    self.emit(header, e, EdgeKind::True);
                }
                self.glue(&body_flow.dangling, &[first_update], EdgeKind::Seq);
                if let Some(&last_update) = update_ids.last() {
                    self.emit(last_update, header, EdgeKind::LoopBack);
                }
            }
            (false, None) => {
                for &e in &body_flow.entries {
                    self.emit(header, e, EdgeKind::True);
                }
                self.glue(&body_flow.dangling, &[header], EdgeKind::LoopBack);
            }
            (true, Some(&first_update)) => {
                self.emit(header, first_update, EdgeKind::True);
                if let Some(&last_update) = update_ids.last() {
                    self.emit(last_update, header, EdgeKind::LoopBack);
                }
            }
            (true, None) => {
                self.emit(header, header, EdgeKind::True);
            }
        }

        let entries = init_ids.first().copied().unwrap_or(header);
        let mut dangling = vec![Dangling {
            node: header,
            kind: PendingKind::LoopExit,
        }];
        dangling.extend(breaks);
        Ok(Flow {
            entries: vec![entries],
            dangling,
        })
    }

    fn labeled_stmt(&mut self, node: Node<'t>) -> Result<Flow> {
        let kids = named_children(node);
        let Some(label_node) = kids.first() else {
            return Ok(self.plain(node));
        };
        let label = self.ctx.session.text(*label_node).to_string();
        let id = self.cfg_node(node, format!("{label}:"));
        self.labels.push((label.clone(), id));

        let Some(inner) = kids.get(1) else {
            return Ok(Flow {
                entries: vec![id],
                dangling: vec![Dangling::seq(id)],
            });
        };

        self.pending_label = Some(label);
        let inner_flow = self.process_statement(*inner)?;
        self.pending_label = None;

        if inner_flow.is_empty() {
            return Ok(Flow {
                entries: vec![id],
                dangling: vec![Dangling::seq(id)],
            });
        }
        self.glue(&[Dangling::seq(id)], &inner_flow.entries, EdgeKind::Seq);
        Ok(Flow {
            entries: vec![id],
            dangling: inner_flow.dangling,
        })
    }

    fn break_stmt(&mut self, node: Node<'t>) -> Flow {
        let label = self.text(node);
        let id = self.cfg_node(node, label);
        let target_label = jump_label(self.ctx.session, node);

        let frame = self.frames.iter().rposition(|f| match &target_label {
            Some(l) => f.label() == Some(l.as_str()),
            None => true,
        });
        match frame {
            Some(i) => self.frames[i].breaks_mut().push(Dangling::seq(id)),
            None => self.soft_error(
                "break outside of any enclosing loop or switch".to_string(),
                node.start_position().row,
            ),
        }
        Flow {
            entries: vec![id],
            dangling: Vec::new(),
        }
    }

    fn continue_stmt(&mut self, node: Node<'t>) -> Flow {
        let label = self.text(node);
        let id = self.cfg_node(node, label);
        let target_label = jump_label(self.ctx.session, node);

        let target = self
            .frames
            .iter()
            .rev()
            .find_map(|f| match f {
                Frame::Loop {
                    label, continue_to, ..
                } => match &target_label {
                    Some(l) => (label.as_deref() == Some(l.as_str())).then_some(*continue_to),
                    None => Some(*continue_to),
                },
                Frame::Switch { .. } => None,
            });
        match target {
            Some(t) => self.emit(id, t, EdgeKind::Seq),
            None => self.soft_error(
                "continue outside of any enclosing loop".to_string(),
                node.start_position().row,
            ),
        }
        Flow {
            entries: vec![id],
            dangling: Vec::new(),
        }
    }

    pub(crate) fn return_stmt(&mut self, node: Node<'t>) -> Flow {
        let label = self.text(node);
        let id = self.cfg_node(node, label);

        // A pending finally intercepts the return; the finally block's
        // dangling set carries the return on to the exit.
        if let Some(frame) = self.finally_stack.last_mut() {
            frame.routed_return = true;
            let entries = frame.entries.clone();
            for e in entries {
                self.emit(id, e, EdgeKind::Seq);
            }
        } else {
            self.emit(id, self.exit, EdgeKind::Return);
        }
        Flow {
            entries: vec![id],
            dangling: Vec::new(),
        }
    }

    /// Dispatch plus explicit fall-through: a case whose dangling set is
    /// non-empty at its end flows into the following case with `seq`.
    pub(crate) fn switch_stmt(
        &mut self,
        node: Node<'t>,
        cond_text: &str,
        arms: Vec<SwitchArm<'t>>,
    ) -> Result<Flow> {
        let head = self.cfg_node(node, head_label("switch", cond_text));
        let label = self.take_label();
        self.frames.push(Frame::Switch {
            label,
            breaks: Vec::new(),
        });

        let has_default = arms
            .iter()
            .any(|a| a.kinds.contains(&EdgeKind::DefaultCase));
        let mut pending_kinds: Vec<EdgeKind> = Vec::new();
        let mut fall_through: Vec<Dangling> = Vec::new();
        let mut had_empty_tail = false;

        for arm in arms {
            pending_kinds.extend(arm.kinds);
            let flow = self.process_block(&arm.stmts)?;
            if flow.entries.is_empty() {
                // Label without statements falls through to the next case.
                had_empty_tail = true;
                continue;
            }
            had_empty_tail = false;
            for kind in pending_kinds.drain(..) {
                for &e in &flow.entries {
                    self.emit(head, e, kind.clone());
                }
            }
            self.glue(&fall_through, &flow.entries, EdgeKind::Seq);
            fall_through = flow.dangling;
        }

        let breaks = self.pop_breaks();
        // The trailing case's fall-through behaves like a break.
        let mut dangling = fall_through;
        dangling.extend(breaks);
        if !has_default || had_empty_tail {
            dangling.push(Dangling::seq(head));
        }
        Ok(Flow {
            entries: vec![head],
            dangling,
        })
    }

    /// Opens a loop frame; the pending statement label (if any) names it.
    pub(crate) fn push_loop(&mut self, continue_to: NodeId) {
        let label = self.take_label();
        self.frames.push(Frame::Loop {
            label,
            continue_to,
            breaks: Vec::new(),
        });
    }

    /// Closes the innermost frame, yielding the breaks it absorbed.
    pub(crate) fn pop_breaks(&mut self) -> Vec<Dangling> {
        match self.frames.pop() {
            Some(Frame::Loop { breaks, .. }) | Some(Frame::Switch { breaks, .. }) => breaks,
            None => Vec::new(),
        }
    }

    /// Registers a goto for resolution once every label of the function is
    /// known.
    pub(crate) fn defer_goto(&mut self, id: NodeId, label: String, line: usize) {
        self.pending_gotos.push((id, label, line));
    }
}

/// `if` + `(x > 0)` renders as `if(x > 0)` whether or not the grammar keeps
/// the parentheses in the condition span.
pub(crate) fn head_label(keyword: &str, cond: &str) -> String {
    if cond.starts_with('(') {
        format!("{keyword}{cond}")
    } else {
        format!("{keyword}({cond})")
    }
}

/// The label operand of a `break`/`continue`, when the language has one.
fn jump_label(session: &ParseSession, node: Node<'_>) -> Option<String> {
    named_children(node)
        .into_iter()
        .find(|c| c.kind() == "identifier" || c.kind() == "statement_identifier")
        .map(|c| session.text(c).to_string())
}
