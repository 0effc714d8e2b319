use super::error::GraphErrorKind;
use super::{BagNode, InterfaceNode, NamedWrapper, NodeRef, RequirementsGraph, SymbolRef};
use crate::diagnostics::Diagnostics;
use crate::implicit_key::ImplicitKey;
use crate::namespace::SymbolNamespace;
use crate::sema::{
    ImplicitMode, SemaCodeItem, SemaExtension, SemaFile, SemaFunction, SemaMember, SemaTypeDecl,
    TopLevel,
};
use crate::signature::CallableKind;
use crate::source_files::Source;
use crate::symbol_index::{SymbolIndex, SymbolOrigin};
use std::collections::HashSet;

pub fn build_graph(
    files: &[SemaFile<Source>],
    index: &SymbolIndex,
    diagnostics: &Diagnostics,
) -> RequirementsGraph {
    let mut builder = GraphBuilder {
        graph: RequirementsGraph::new(),
        diagnostics,
    };

    builder.seed_external_symbols(index);

    for file in files {
        builder.walk_file(file);
    }

    builder.finalize_stored_members();
    builder.resolve_symbol_refs();
    builder.graph
}

struct GraphBuilder<'a> {
    graph: RequirementsGraph,
    diagnostics: &'a Diagnostics<'a>,
}

#[derive(Clone, Debug)]
enum ScopeState {
    None,
    Inherited,
    Local(LocalScope),
}

#[derive(Clone, Debug)]
struct LocalScope {
    declared_at: Source,
    ended_at: Option<Source>,
}

#[derive(Clone, Debug)]
struct BlockState {
    parent: Option<NodeRef>,
    scope: ScopeState,
    /// Namespace whose stored bag member functions here may seed scopes
    /// from; `None` outside member functions.
    allows_stored_bag: Option<SymbolNamespace>,
}

impl ScopeState {
    /// What an inner lexical block sees: a local scope is only writable
    /// in the block that declared it.
    fn inherited_view(&self) -> ScopeState {
        match self {
            ScopeState::None => ScopeState::None,
            ScopeState::Inherited | ScopeState::Local(_) => ScopeState::Inherited,
        }
    }
}

impl<'a> GraphBuilder<'a> {
    fn seed_external_symbols(&mut self, index: &SymbolIndex) {
        for entry in index.entries() {
            let SymbolOrigin::External {
                location,
                requirements: Some(requirements),
            } = &entry.origin
            else {
                continue;
            };

            let node = self.graph.add_node(location.clone());
            self.graph.node_mut(node).is_external = true;
            self.graph.node_mut(node).requires = requirements.clone();

            self.graph
                .definitions
                .entry(entry.signature.clone())
                .or_default()
                .push(node);
        }
    }

    fn walk_file(&mut self, file: &SemaFile<Source>) {
        for top_level in &file.top_level {
            match top_level {
                TopLevel::Function(function) => self.walk_function(function),
                TopLevel::Type(type_decl) => self.walk_type(type_decl),
                TopLevel::Extension(extension) => self.walk_extension(extension),
                TopLevel::Keys(_) => {}
            }
        }
    }

    fn walk_type(&mut self, type_decl: &SemaTypeDecl<Source>) {
        self.walk_members(&type_decl.members, &type_decl.namespace);
    }

    fn walk_extension(&mut self, extension: &SemaExtension<Source>) {
        if let Some(namespace) = &extension.namespace {
            self.walk_members(&extension.members, namespace);
        }
    }

    fn walk_members(&mut self, members: &[SemaMember<Source>], namespace: &SymbolNamespace) {
        for member in members {
            match member {
                SemaMember::Type(inner) => self.walk_type(inner),
                SemaMember::Function(function) => self.walk_function(function),
                SemaMember::Implicit { key, syntax } => {
                    let node = self.graph.add_node(*syntax);
                    self.graph.node_mut(node).requires.insert(key.clone());
                    self.graph
                        .stored_implicits
                        .entry(namespace.clone())
                        .or_default()
                        .push(node);
                }
                SemaMember::Bag { syntax } => {
                    let node = self.graph.add_node(*syntax);
                    self.graph
                        .stored_bags
                        .entry(namespace.clone())
                        .or_insert(BagNode {
                            node,
                            syntax: *syntax,
                        });
                }
                SemaMember::Field { initializer, .. } => {
                    let mut state = BlockState {
                        parent: None,
                        scope: ScopeState::None,
                        allows_stored_bag: None,
                    };
                    let mut bag_refs = Vec::new();
                    self.walk_items(initializer, &mut state, &mut bag_refs);
                    self.finish_block(&state);
                    self.reject_bag_refs(&bag_refs);
                }
            }
        }
    }

    fn walk_function(&mut self, function: &SemaFunction<Source>) {
        let namespace = function.signature.namespace.clone();

        let allows_stored_bag = (!namespace.is_root()).then(|| namespace.clone());

        let mut state = if function.is_scope_taking {
            let node = self.graph.add_node(function.syntax);

            self.graph
                .definitions
                .entry(function.signature.clone())
                .or_default()
                .push(node);
            self.graph.implicit_functions.push(node);

            if matches!(function.signature.kind, CallableKind::Initializer { .. }) {
                self.graph
                    .initializers
                    .entry(namespace.clone())
                    .or_default()
                    .push(node);
            }

            let interface_node = InterfaceNode {
                signature: function.signature.clone(),
                syntax: function.syntax,
                node,
            };

            if function.visibility.is_exported() {
                self.graph.public_interface.push(interface_node);
            } else if function.visibility.is_testable() {
                self.graph.testable_interface.push(interface_node);
            }

            BlockState {
                parent: Some(node),
                scope: ScopeState::Inherited,
                allows_stored_bag,
            }
        } else {
            BlockState {
                parent: None,
                scope: ScopeState::None,
                allows_stored_bag,
            }
        };

        let mut bag_refs = Vec::new();
        self.walk_items(&function.body, &mut state, &mut bag_refs);
        self.finish_block(&state);

        if bag_refs.is_empty() {
            return;
        }

        match &state.allows_stored_bag {
            Some(namespace) => self
                .graph
                .stored_bag_usage
                .push((namespace.clone(), bag_refs)),
            None => self.reject_bag_refs(&bag_refs),
        }
    }

    fn reject_bag_refs(&mut self, bag_refs: &[NodeRef]) {
        for reference in bag_refs {
            let site = self.graph.node(*reference).site.clone();
            self.diagnostics
                .error(site, GraphErrorKind::NoBagAvailable);
        }
    }

    fn walk_items(
        &mut self,
        items: &[SemaCodeItem<Source>],
        state: &mut BlockState,
        bag_refs: &mut Vec<NodeRef>,
    ) {
        for item in items {
            match item {
                SemaCodeItem::Type(type_decl) => self.walk_type(type_decl),
                SemaCodeItem::Function(function) => self.walk_function(function),
                SemaCodeItem::Defer { body, .. } => {
                    for deferred in body {
                        if let SemaCodeItem::ScopeEnd { syntax } = deferred {
                            self.apply_scope_end(state, *syntax);
                        }
                    }
                }
                SemaCodeItem::ScopeEnd { syntax } => {
                    self.diagnostics
                        .error(*syntax, GraphErrorKind::EndOutsideDefer);
                }
                SemaCodeItem::Closure { bag, body, syntax } => {
                    self.walk_closure(*bag, body, *syntax, state, bag_refs);
                }
                SemaCodeItem::InnerScope { body, .. }
                | SemaCodeItem::UnresolvedIfConfig { body, .. } => {
                    let mut inner = BlockState {
                        parent: state.parent,
                        scope: state.scope.inherited_view(),
                        allows_stored_bag: state.allows_stored_bag.clone(),
                    };
                    self.walk_items(body, &mut inner, bag_refs);
                    self.finish_block(&inner);
                }
                SemaCodeItem::Call { signature, syntax } => {
                    let node = self.graph.add_node(*syntax);
                    self.extend_chain(state, node);
                    self.graph.symbol_refs.push(SymbolRef {
                        from: node,
                        signature: signature.clone(),
                        syntax: *syntax,
                    });
                }
                SemaCodeItem::ScopeBegin {
                    nested,
                    with_bag,
                    syntax,
                } => {
                    self.begin_scope(state, bag_refs, *nested, *with_bag, *syntax);
                }
                SemaCodeItem::WithScope {
                    nested,
                    with_bag,
                    body,
                    syntax,
                } => {
                    let node =
                        self.begin_with_scope(state, bag_refs, *nested, *with_bag, *syntax);

                    let mut inner = BlockState {
                        parent: Some(node),
                        scope: ScopeState::Local(LocalScope {
                            declared_at: *syntax,
                            // Ends itself when the trailing closure
                            // returns.
                            ended_at: Some(*syntax),
                        }),
                        allows_stored_bag: state.allows_stored_bag.clone(),
                    };
                    self.walk_items(body, &mut inner, bag_refs);
                    self.finish_block(&inner);
                }
                SemaCodeItem::WithNamedImplicits {
                    wrapper_name,
                    closure_param_count,
                    body,
                    syntax,
                } => {
                    let node = self.graph.add_node(*syntax);

                    if let Some(parent) = state.parent {
                        self.graph.add_edge(parent, node);
                    }

                    self.graph.named_wrappers.push(NamedWrapper {
                        name: wrapper_name.clone(),
                        closure_param_count: *closure_param_count,
                        node,
                        syntax: *syntax,
                    });

                    let mut inner = BlockState {
                        parent: Some(node),
                        scope: ScopeState::Inherited,
                        allows_stored_bag: state.allows_stored_bag.clone(),
                    };
                    self.walk_items(body, &mut inner, bag_refs);
                    self.finish_block(&inner);
                }
                SemaCodeItem::ImplicitMap { from, to, syntax } => {
                    if !matches!(state.scope, ScopeState::Local(_)) {
                        self.diagnostics
                            .error(*syntax, GraphErrorKind::WriteWithoutLocalScope);
                    }

                    let node = self.graph.add_node(*syntax);
                    self.graph.node_mut(node).requires.insert(from.clone());
                    self.graph.node_mut(node).provides.insert(to.clone());
                    self.extend_chain(state, node);
                }
                SemaCodeItem::Implicit { mode, key, syntax } => {
                    self.walk_implicit(*mode, key, *syntax, state);
                }
            }
        }
    }

    fn walk_implicit(
        &mut self,
        mode: ImplicitMode,
        key: &ImplicitKey,
        syntax: Source,
        state: &mut BlockState,
    ) {
        match mode {
            ImplicitMode::Get => {
                if matches!(state.scope, ScopeState::None) {
                    self.diagnostics
                        .error(syntax, GraphErrorKind::ReadWithoutScope);
                }

                let node = self.graph.add_node(syntax);
                self.graph.node_mut(node).requires.insert(key.clone());
                self.extend_chain(state, node);
            }
            ImplicitMode::Set => {
                if !matches!(state.scope, ScopeState::Local(_)) {
                    self.diagnostics
                        .error(syntax, GraphErrorKind::WriteWithoutLocalScope);
                }

                let node = self.graph.add_node(syntax);
                self.graph.node_mut(node).provides.insert(key.clone());
                self.extend_chain(state, node);
            }
        }
    }

    fn extend_chain(&mut self, state: &mut BlockState, node: NodeRef) {
        if let Some(parent) = state.parent {
            self.graph.add_edge(parent, node);
        }
        state.parent = Some(node);
    }

    /// Shared scope-begin handling; returns the begin node.
    fn begin_scope(
        &mut self,
        state: &mut BlockState,
        bag_refs: &mut Vec<NodeRef>,
        nested: bool,
        with_bag: bool,
        syntax: Source,
    ) -> NodeRef {
        let node = self.graph.add_node(syntax);

        self.transition_scope(state, nested, syntax);

        match (nested, with_bag) {
            (false, false) => self.graph.entry_points.push(node),
            (true, false) => {
                if let Some(parent) = state.parent {
                    self.graph.add_edge(parent, node);
                }
            }
            (false, true) => bag_refs.push(node),
            (true, true) => {
                self.diagnostics
                    .error(syntax, GraphErrorKind::NestedScopeWithBag);
            }
        }

        state.parent = Some(node);
        node
    }

    /// `withScope` follows the same edge policy but keeps the outer
    /// chain and scope state untouched; its scope lives only in the
    /// trailing closure.
    fn begin_with_scope(
        &mut self,
        state: &mut BlockState,
        bag_refs: &mut Vec<NodeRef>,
        nested: bool,
        with_bag: bool,
        syntax: Source,
    ) -> NodeRef {
        let node = self.graph.add_node(syntax);

        // Transition runs on a throwaway view so the diagnostics about
        // overriding and forbidden nesting still fire.
        let mut probe = BlockState {
            parent: state.parent,
            scope: state.scope.inherited_view(),
            allows_stored_bag: state.allows_stored_bag.clone(),
        };
        self.transition_scope(&mut probe, nested, syntax);

        match (nested, with_bag) {
            (false, false) => self.graph.entry_points.push(node),
            (true, false) => {
                if let Some(parent) = state.parent {
                    self.graph.add_edge(parent, node);
                }
            }
            (false, true) => bag_refs.push(node),
            (true, true) => {
                self.diagnostics
                    .error(syntax, GraphErrorKind::NestedScopeWithBag);
            }
        }

        node
    }

    fn transition_scope(&mut self, state: &mut BlockState, nested: bool, at: Source) {
        match &state.scope {
            ScopeState::None => {
                if nested {
                    self.diagnostics
                        .error(at, GraphErrorKind::NestingScopeForbidden);
                }
            }
            ScopeState::Inherited => {
                if !nested {
                    self.diagnostics
                        .warning(at, GraphErrorKind::ImplicitlyOverridingScope);
                }
            }
            ScopeState::Local(previous) => {
                self.diagnostics
                    .error(at, GraphErrorKind::MultipleLocalScopes);
                self.diagnostics
                    .note(previous.declared_at, GraphErrorKind::FirstScopeHere);
            }
        }

        state.scope = ScopeState::Local(LocalScope {
            declared_at: at,
            ended_at: None,
        });
    }

    fn apply_scope_end(&mut self, state: &mut BlockState, at: Source) {
        match &mut state.scope {
            ScopeState::None => {
                self.diagnostics
                    .error(at, GraphErrorKind::EndWithoutLocalScope);
            }
            ScopeState::Inherited => {
                self.diagnostics
                    .error(at, GraphErrorKind::EndInheritedScope);
            }
            ScopeState::Local(local) => match local.ended_at {
                Some(first) => {
                    self.diagnostics
                        .error(at, GraphErrorKind::ScopeEndedTwice);
                    self.diagnostics.note(first, GraphErrorKind::FirstEndHere);
                }
                None => local.ended_at = Some(at),
            },
        }
    }

    fn finish_block(&mut self, state: &BlockState) {
        if let ScopeState::Local(local) = &state.scope {
            if local.ended_at.is_none() {
                self.diagnostics
                    .error(local.declared_at, GraphErrorKind::MissingScopeEnd);
            }
        }
    }

    fn walk_closure(
        &mut self,
        bag: Option<Source>,
        body: &[SemaCodeItem<Source>],
        syntax: Source,
        state: &mut BlockState,
        bag_refs: &mut Vec<NodeRef>,
    ) {
        let closure_node = self.graph.add_node(syntax);
        self.extend_chain(state, closure_node);

        match bag {
            Some(bag_syntax) => {
                let bag_node = self.graph.add_node(bag_syntax);
                self.graph.add_edge(closure_node, bag_node);
                self.graph.bags.push(BagNode {
                    node: bag_node,
                    syntax: bag_syntax,
                });

                let mut inner = BlockState {
                    parent: Some(bag_node),
                    scope: ScopeState::None,
                    allows_stored_bag: None,
                };
                let mut inner_refs = Vec::new();
                self.walk_items(body, &mut inner, &mut inner_refs);
                self.finish_block(&inner);

                if inner_refs.is_empty() {
                    self.diagnostics
                        .error(bag_syntax, GraphErrorKind::UnusedBag);
                }

                for reference in inner_refs {
                    self.graph.add_edge(bag_node, reference);
                }
            }
            None => {
                let mut inner = BlockState {
                    parent: None,
                    scope: ScopeState::None,
                    allows_stored_bag: None,
                };
                // Bag usages bubble until some enclosing closure or
                // member function can supply one.
                self.walk_items(body, &mut inner, bag_refs);
                self.finish_block(&inner);
            }
        }
    }

    /// Chains stored implicits per namespace, puts the stored bag ahead
    /// of them, wires scope-taking initializers to the head, and matches
    /// stored-bag usage records.
    fn finalize_stored_members(&mut self) {
        let namespaces: Vec<SymbolNamespace> =
            self.graph.stored_implicits.keys().cloned().collect();

        for namespace in namespaces {
            let chain = self.graph.stored_implicits[&namespace].clone();

            for window in chain.windows(2) {
                self.graph.add_edge(window[0], window[1]);
            }

            let mut head = chain[0];

            let stored_bag = self.graph.stored_bags.get(&namespace).map(|bag| bag.node);
            if let Some(bag_node) = stored_bag {
                self.graph.add_edge(bag_node, head);
                head = bag_node;
            }

            let initializers = self
                .graph
                .initializers
                .get(&namespace)
                .cloned()
                .unwrap_or_default();

            if initializers.is_empty() {
                let site = self.graph.node(chain[0]).site.clone();
                self.diagnostics.error(
                    site,
                    GraphErrorKind::TypeNeedsScopeTakingInit {
                        namespace: namespace.clone(),
                    },
                );
            }

            for initializer in initializers {
                self.graph.add_edge(initializer, head);
            }
        }

        let usages = std::mem::take(&mut self.graph.stored_bag_usage);
        let mut used: HashSet<SymbolNamespace> = HashSet::new();

        for (namespace, references) in usages {
            let stored_bag = self.graph.stored_bags.get(&namespace).map(|bag| bag.node);
            match stored_bag {
                Some(bag_node) => {
                    for reference in references {
                        self.graph.add_edge(bag_node, reference);
                    }
                    used.insert(namespace);
                }
                None => {
                    for reference in references {
                        let site = self.graph.node(reference).site.clone();
                        self.diagnostics.error(
                            site,
                            GraphErrorKind::MissingStoredBag {
                                namespace: namespace.clone(),
                            },
                        );
                    }
                }
            }
        }

        for (namespace, bag) in self.graph.stored_bags.clone() {
            if !used.contains(&namespace) {
                self.diagnostics
                    .error(bag.syntax, GraphErrorKind::UnusedStoredBag);
            }
        }
    }

    fn resolve_symbol_refs(&mut self) {
        let references = std::mem::take(&mut self.graph.symbol_refs);

        for reference in references {
            let definitions = self
                .graph
                .definitions
                .get(&reference.signature)
                .cloned()
                .unwrap_or_default();

            match definitions.as_slice() {
                [] => {
                    self.diagnostics.error(
                        reference.syntax,
                        GraphErrorKind::UnresolvedSymbol {
                            name: reference.signature.kind.basename().to_string(),
                        },
                    );
                }
                [definition] => self.graph.add_edge(reference.from, *definition),
                definitions => {
                    self.diagnostics.error(
                        reference.syntax,
                        GraphErrorKind::AmbiguousUse {
                            name: reference.signature.kind.basename().to_string(),
                        },
                    );

                    for definition in definitions {
                        let site = self.graph.node(*definition).site.clone();
                        self.diagnostics.note(
                            site,
                            GraphErrorKind::FoundCandidate {
                                signature: reference.signature.clone(),
                            },
                        );
                    }
                }
            }
        }
    }
}
