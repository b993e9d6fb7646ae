//! Symbol tables produced by the extractor walk.
//!
//! All maps are keyed by [`NodeId`]; every view builder reads them without
//! mutation. BTree collections keep iteration deterministic.

use std::collections::{BTreeMap, BTreeSet};

use crate::parser::index::NodeId;

#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    /// Leaf ids in source order.
    pub tokens: Vec<NodeId>,
    /// Node id to its text (identifiers, literals).
    pub label: BTreeMap<NodeId, String>,
    /// Node id to zero-based source line.
    pub start_line: BTreeMap<NodeId, usize>,
    /// Identifiers naming a method or function, declarations and calls.
    pub methods: BTreeSet<NodeId>,
    /// The subset of `methods` occurring at a call site.
    pub calls: BTreeSet<NodeId>,
    /// Identifier nodes that introduce a binding, with the declared name.
    pub declaration: BTreeMap<NodeId, String>,
    /// Use site to its resolved declaration.
    pub declaration_map: BTreeMap<NodeId, NodeId>,
    /// The stack of active scope ids at the node, outermost first.
    pub scope_map: BTreeMap<NodeId, Vec<u32>>,
    /// Declared type string, when syntactically available.
    pub data_type: BTreeMap<NodeId, String>,
}

impl SymbolTable {
    /// The declaration an identifier occurrence binds to: itself if it is
    /// a declaration, its resolved declaration if it is a use.
    pub fn binding_of(&self, id: NodeId) -> Option<NodeId> {
        if self.declaration.contains_key(&id) {
            Some(id)
        } else {
            self.declaration_map.get(&id).copied()
        }
    }

    pub fn is_declaration(&self, id: NodeId) -> bool {
        self.declaration.contains_key(&id)
    }
}
