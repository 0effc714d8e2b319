//! The requirements graph. Nodes provide and require implicit keys;
//! edges express "to satisfy this node, these nodes' requirements must
//! be satisfied too". Nodes are appended in source order and edges are
//! ordered within their parent, which fixes tie-breaking in cycles and
//! diagnostic order.

mod build;
mod error;
mod propagate;

pub use build::build_graph;
pub use error::GraphErrorKind;
pub use propagate::{propagate, report_unresolved, Resolution};

use crate::diagnostics::DiagnosticSite;
use crate::implicit_key::ImplicitKey;
use crate::namespace::SymbolNamespace;
use crate::signature::CallableSignature;
use crate::source_files::Source;
use indexmap::IndexMap;
use slotmap::{new_key_type, SlotMap};
use std::collections::BTreeSet;
use std::collections::HashMap;

new_key_type! {
    pub struct NodeRef;
}

#[derive(Clone, Debug)]
pub struct Node {
    pub site: DiagnosticSite,
    pub provides: BTreeSet<ImplicitKey>,
    pub requires: BTreeSet<ImplicitKey>,
    /// Outgoing edges in insertion order.
    pub edges: Vec<NodeRef>,
    /// Seeded from a dependency interface rather than this module.
    pub is_external: bool,
}

/// A scope-taking symbol that surfaces in the module interface, paired
/// with the graph node its requirements resolve at.
#[derive(Clone, Debug)]
pub struct InterfaceNode {
    pub signature: CallableSignature,
    pub syntax: Source,
    pub node: NodeRef,
}

#[derive(Clone, Debug)]
pub struct NamedWrapper {
    pub name: String,
    pub closure_param_count: usize,
    pub node: NodeRef,
    pub syntax: Source,
}

#[derive(Clone, Debug)]
pub struct BagNode {
    pub node: NodeRef,
    pub syntax: Source,
}

#[derive(Debug, Default)]
pub struct RequirementsGraph {
    pub nodes: SlotMap<NodeRef, Node>,
    pub entry_points: Vec<NodeRef>,
    pub bags: Vec<BagNode>,
    pub public_interface: Vec<InterfaceNode>,
    pub testable_interface: Vec<InterfaceNode>,
    /// Every scope-taking function node, any visibility.
    pub implicit_functions: Vec<NodeRef>,
    pub named_wrappers: Vec<NamedWrapper>,
    /// Call references waiting for definition edges.
    pub(crate) symbol_refs: Vec<SymbolRef>,
    pub(crate) definitions: HashMap<CallableSignature, Vec<NodeRef>>,
    pub(crate) initializers: IndexMap<SymbolNamespace, Vec<NodeRef>>,
    pub(crate) stored_implicits: IndexMap<SymbolNamespace, Vec<NodeRef>>,
    pub(crate) stored_bags: IndexMap<SymbolNamespace, BagNode>,
    pub(crate) stored_bag_usage: Vec<(SymbolNamespace, Vec<NodeRef>)>,
}

#[derive(Clone, Debug)]
pub(crate) struct SymbolRef {
    pub from: NodeRef,
    pub signature: CallableSignature,
    pub syntax: Source,
}

impl RequirementsGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, site: impl Into<DiagnosticSite>) -> NodeRef {
        self.nodes.insert(Node {
            site: site.into(),
            provides: BTreeSet::new(),
            requires: BTreeSet::new(),
            edges: Vec::new(),
            is_external: false,
        })
    }

    pub fn add_edge(&mut self, from: NodeRef, to: NodeRef) {
        self.nodes[from].edges.push(to);
    }

    pub fn node(&self, node: NodeRef) -> &Node {
        &self.nodes[node]
    }

    pub fn node_mut(&mut self, node: NodeRef) -> &mut Node {
        &mut self.nodes[node]
    }

    /// All fixpoint roots, in a stable order.
    pub fn roots(&self) -> Vec<NodeRef> {
        let mut roots = Vec::new();
        roots.extend(&self.entry_points);
        roots.extend(self.bags.iter().map(|bag| bag.node));
        roots.extend(self.named_wrappers.iter().map(|wrapper| wrapper.node));
        roots.extend(self.public_interface.iter().map(|entry| entry.node));
        roots.extend(self.testable_interface.iter().map(|entry| entry.node));
        roots.extend(&self.implicit_functions);
        roots
    }
}
