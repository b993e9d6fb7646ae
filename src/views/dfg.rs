//! Reaching-definitions analysis and the statement-level data-flow view.
//!
//! Definitions are keyed by the *resolved binding* of the assigned
//! variable, so shadowed names never leak across scopes: the scope walk
//! already decided which declaration each occurrence means. IN/OUT sets are
//! bitsets over the function's definition universe and converge by a
//! monotone worklist.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use fixedbitset::FixedBitSet;
use tracing::{debug, trace};
use tree_sitter::Node;

use crate::config::DfgOptions;
use crate::error::{Result, WeaveError};
use crate::lang::NodeCatalog;
use crate::model::graph::{EdgeKind, GraphEdge, GraphNode, View, ViewGraph};
use crate::model::symbols::SymbolTable;
use crate::parser::index::{NodeId, NodeTable};
use crate::parser::{named_children, ParseSession};
use crate::views::cfg::{CfgView, FunctionCfg};

/// One definition site: `binding` is the declaration the defined variable
/// resolves to, `site` the CFG node performing the definition.
#[derive(Debug, Clone)]
struct Def {
    binding: NodeId,
    name: String,
    site: NodeId,
    undef: bool,
}

/// One use occurrence at statement granularity.
#[derive(Debug, Clone)]
struct UseOcc {
    binding: NodeId,
    site: NodeId,
    line: usize,
}

pub fn build(
    session: &ParseSession,
    table: &NodeTable,
    symbols: &SymbolTable,
    cfg: &CfgView<'_>,
    opts: &DfgOptions,
) -> Result<ViewGraph> {
    let mut graph = ViewGraph::new();
    let syntax: HashMap<NodeId, Node<'_>> = cfg.statements.iter().cloned().collect();

    for function in &cfg.functions {
        analyze_function(session, table, symbols, cfg, function, &syntax, opts, &mut graph)?;
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "data-flow view built"
    );
    Ok(graph)
}

#[allow(clippy::too_many_arguments)]
fn analyze_function(
    session: &ParseSession,
    table: &NodeTable,
    symbols: &SymbolTable,
    cfg: &CfgView<'_>,
    function: &FunctionCfg,
    syntax: &HashMap<NodeId, Node<'_>>,
    opts: &DfgOptions,
    graph: &mut ViewGraph,
) -> Result<()> {
    let catalog = session.language.catalog();
    let position: HashMap<NodeId, usize> = function
        .nodes
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();
    let count = function.nodes.len();

    // Every CFG node of the function appears in the DFG view too.
    for &id in &function.nodes {
        if let Some(cfg_node) = cfg.graph.node(id) {
            let mut node = GraphNode::new(id, cfg_node.kind.clone(), cfg_node.label.clone(), View::Dfg);
            node.line = cfg_node.line;
            graph.ensure_node(node);
        }
    }

    // Intra-function successors; call edges do not carry data flow here.
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut succs: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (source, target, edge) in cfg.graph.edges() {
        if edge.kind == EdgeKind::Call {
            continue;
        }
        let (Some(&s), Some(&t)) = (position.get(&source), position.get(&target)) else {
            continue;
        };
        succs[s].push(t);
        preds[t].push(s);
    }

    // Definition and use universes.
    let mut defs: Vec<Def> = Vec::new();
    let mut def_index: BTreeMap<(NodeId, NodeId), usize> = BTreeMap::new();
    let mut uses: Vec<UseOcc> = Vec::new();
    let mut gen_defs: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut node_uses: Vec<Vec<usize>> = vec![Vec::new(); count];

    // Parameters are definitions seeded at the entry node.
    let entry_pos = position[&function.entry];
    for (name, leaf) in &function.params {
        let idx = defs.len();
        defs.push(Def {
            binding: *leaf,
            name: name.clone(),
            site: function.entry,
            undef: false,
        });
        def_index.insert((function.entry, *leaf), idx);
        gen_defs[entry_pos].push(idx);
    }

    for (pos, &id) in function.nodes.iter().enumerate() {
        let Some(&node) = syntax.get(&id) else {
            continue;
        };
        let occurrences = statement_identifiers(node, catalog);
        for leaf in occurrences {
            let Some(leaf_id) = table.id_of(leaf) else {
                continue;
            };
            let Some(binding) = symbols.binding_of(leaf_id) else {
                continue;
            };
            // Call names are control, not data.
            if symbols.calls.contains(&leaf_id) {
                continue;
            }
            let name = symbols
                .label
                .get(&binding)
                .cloned()
                .unwrap_or_else(|| session.text(leaf).to_string());
            let line = leaf.start_position().row;

            let role = classify_occurrence(leaf, symbols, leaf_id);
            if matches!(role, Role::Def { .. } | Role::DefAndUse) {
                let undef = matches!(role, Role::Def { undef: true });
                if !undef || opts.undef_defs {
                    let key = (id, binding);
                    if !def_index.contains_key(&key) {
                        let idx = defs.len();
                        defs.push(Def {
                            binding,
                            name: name.clone(),
                            site: id,
                            undef,
                        });
                        def_index.insert(key, idx);
                        gen_defs[pos].push(idx);
                    }
                }
            }
            if matches!(role, Role::Use | Role::DefAndUse) {
                let idx = uses.len();
                uses.push(UseOcc {
                    binding,
                    site: id,
                    line,
                });
                node_uses[pos].push(idx);
            }
        }
    }

    trace!(
        function = %function.name,
        defs = defs.len(),
        uses = uses.len(),
        "running reaching definitions"
    );

    let reaching = fixed_point(
        &function.nodes,
        &preds,
        &succs,
        &gen_defs,
        |own, universe| kill_mask_defs(&defs, own, universe),
        defs.len(),
        &function.name,
    )?;

    // Reaching uses, only when the annotation asks for it.
    let reaching_uses = if opts.last_use {
        Some(fixed_point(
            &function.nodes,
            &preds,
            &succs,
            &node_uses,
            |own, universe| kill_mask_uses(&uses, own, universe),
            uses.len(),
            &function.name,
        )?)
    } else {
        None
    };

    // Materialize `reaches` edges, deterministically ordered.
    let mut edges: BTreeSet<(NodeId, NodeId, String, usize)> = BTreeSet::new();
    for (pos, &id) in function.nodes.iter().enumerate() {
        for &use_idx in &node_uses[pos] {
            let occ = &uses[use_idx];
            for def_idx in reaching[pos].ones() {
                let def = &defs[def_idx];
                if def.binding == occ.binding {
                    edges.insert((def.site, id, def.name.clone(), def_idx));
                }
            }
        }
    }

    for (source, target, name, def_idx) in edges {
        let def = &defs[def_idx];

        let mut edge = GraphEdge::new(View::Dfg, EdgeKind::Reaches);
        edge.extra.insert("var".to_string(), name.clone());
        if def.undef {
            edge.extra.insert("undef".to_string(), "true".to_string());
        }
        if opts.last_def {
            if let Some(line) = cfg.graph.node(def.site).and_then(|n| n.line) {
                edge.extra.insert("last_def".to_string(), line.to_string());
            }
        }
        if let Some(ru) = &reaching_uses {
            let target_pos = position.get(&target).copied().unwrap_or(0);
            let last_use = ru[target_pos]
                .ones()
                .filter(|&i| uses[i].binding == def.binding && uses[i].site != target)
                .map(|i| uses[i].line)
                .max();
            if let Some(line) = last_use {
                edge.extra.insert("last_use".to_string(), line.to_string());
            }
        }

        graph.add_edge(source, target, edge);
    }
    Ok(())
}

/// Worklist fixed point for a forward may-analysis over one function.
///
/// `kill` receives the node's own GEN items and yields the mask of
/// universe items the node kills. Termination is monotone growth over a
/// finite universe; the pop bound only guards against an implementation
/// bug breaking monotonicity.
fn fixed_point(
    nodes: &[NodeId],
    preds: &[Vec<usize>],
    succs: &[Vec<usize>],
    gens: &[Vec<usize>],
    kill: impl Fn(&[usize], usize) -> FixedBitSet,
    universe: usize,
    function: &str,
) -> Result<Vec<FixedBitSet>> {
    let count = nodes.len();
    let mut inputs: Vec<FixedBitSet> = vec![FixedBitSet::with_capacity(universe); count];
    let mut outputs: Vec<FixedBitSet> = vec![FixedBitSet::with_capacity(universe); count];

    let mut worklist: VecDeque<usize> = (0..count).collect();
    let mut queued = FixedBitSet::with_capacity(count);
    queued.insert_range(..);

    let max_pops = (count + 1) * (universe + 2) * 4 + 64;
    let mut pops = 0usize;

    while let Some(pos) = worklist.pop_front() {
        queued.set(pos, false);
        pops += 1;
        if pops > max_pops {
            return Err(WeaveError::Rda(format!(
                "fixed point failed to converge in `{function}`"
            )));
        }

        let mut incoming = FixedBitSet::with_capacity(universe);
        for &p in &preds[pos] {
            incoming.union_with(&outputs[p]);
        }

        let mut out = incoming.clone();
        let killed = kill(&gens[pos], universe);
        out.difference_with(&killed);
        for &g in &gens[pos] {
            out.insert(g);
        }

        inputs[pos] = incoming;
        if out != outputs[pos] {
            outputs[pos] = out;
            for &s in &succs[pos] {
                if !queued.contains(s) {
                    queued.insert(s);
                    worklist.push_back(s);
                }
            }
        }
    }
    Ok(inputs)
}

/// KILL for definitions: every definition of a binding the node redefines.
fn kill_mask_defs(defs: &[Def], own: &[usize], universe: usize) -> FixedBitSet {
    let mut mask = FixedBitSet::with_capacity(universe);
    for &g in own {
        let binding = defs[g].binding;
        for (i, d) in defs.iter().enumerate() {
            if d.binding == binding {
                mask.insert(i);
            }
        }
    }
    mask
}

/// KILL for reaching uses: older uses of a variable used here.
fn kill_mask_uses(uses: &[UseOcc], own: &[usize], universe: usize) -> FixedBitSet {
    let mut mask = FixedBitSet::with_capacity(universe);
    for &g in own {
        let binding = uses[g].binding;
        for (i, u) in uses.iter().enumerate() {
            if u.binding == binding {
                mask.insert(i);
            }
        }
    }
    mask
}

enum Role {
    Def { undef: bool },
    DefAndUse,
    Use,
}

/// What one identifier occurrence does at its statement.
fn classify_occurrence(leaf: Node<'_>, symbols: &SymbolTable, leaf_id: NodeId) -> Role {
    if symbols.is_declaration(leaf_id) {
        return Role::Def {
            undef: !declaration_has_initializer(leaf),
        };
    }

    // Climb out of l-value wrappers toward a possible assignment.
    let mut cur = leaf;
    while let Some(parent) = cur.parent() {
        let in_base_position = match parent.kind() {
            "parenthesized_expression" => true,
            "pointer_expression" | "subscript_expression" | "field_expression" => {
                parent.child_by_field_name("argument") == Some(cur)
            }
            "field_access" => parent.child_by_field_name("object") == Some(cur),
            "array_access" => parent.child_by_field_name("array") == Some(cur),
            _ => break,
        };
        if !in_base_position {
            break;
        }
        cur = parent;
    }

    if let Some(parent) = cur.parent() {
        match parent.kind() {
            "assignment_expression" => {
                if parent.child_by_field_name("left") == Some(cur) {
                    let compound = parent
                        .child_by_field_name("operator")
                        .map(|op| op.kind() != "=")
                        .unwrap_or(false);
                    return if compound { Role::DefAndUse } else { Role::Def { undef: false } };
                }
            }
            "update_expression" => return Role::DefAndUse,
            _ => {}
        }
    }
    Role::Use
}

/// Whether a declared identifier gets a value at its declaration site.
fn declaration_has_initializer(leaf: Node<'_>) -> bool {
    let mut cur = leaf;
    while let Some(parent) = cur.parent() {
        match parent.kind() {
            "init_declarator" | "variable_declarator" => {
                return parent.child_by_field_name("value").is_some();
            }
            "pointer_declarator" | "array_declarator" => {
                cur = parent;
                continue;
            }
            // Bound by the construct itself rather than an initializer.
            "parameter_declaration"
            | "formal_parameter"
            | "spread_parameter"
            | "catch_formal_parameter"
            | "enhanced_for_statement"
            | "resource" => return true,
            _ => return false,
        }
    }
    false
}

/// Identifier leaves belonging to this statement node; nested statements
/// own their occurrences.
fn statement_identifiers<'t>(root: Node<'t>, catalog: &'static NodeCatalog) -> Vec<Node<'t>> {
    fn rec<'t>(
        node: Node<'t>,
        root: Node<'t>,
        catalog: &'static NodeCatalog,
        out: &mut Vec<Node<'t>>,
    ) {
        if node != root && catalog.is_statement(node.kind()) {
            return;
        }
        if node.kind() == "identifier" {
            out.push(node);
        }
        for child in named_children(node) {
            rec(child, root, catalog, out);
        }
    }
    let mut out = Vec::new();
    rec(root, root, catalog, &mut out);
    out
}

