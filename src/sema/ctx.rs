use crate::diagnostics::Diagnostics;
use crate::namespace::SymbolNamespace;
use crate::signature::ResolvedType;
use crate::symbol_index::SymbolIndex;
use std::collections::HashMap;

/// Everything the sema builder threads through a function body: the
/// diagnostics sink, the scouted symbol index, and the lexical state of
/// visible locals.
pub struct SemaContext<'a> {
    pub diagnostics: &'a Diagnostics<'a>,
    pub index: &'a SymbolIndex,
    pub enable_exporting: bool,
    /// Namespace `self` resolves against, when inside a type.
    pub self_namespace: Option<SymbolNamespace>,
    frames: Vec<HashMap<String, LocalVariable>>,
}

#[derive(Clone, Debug, Default)]
pub struct LocalVariable {
    pub is_scope: bool,
    /// Declared or inferred type; cached once per variable.
    pub resolved: Option<ResolvedType>,
}

impl<'a> SemaContext<'a> {
    pub fn new(
        diagnostics: &'a Diagnostics<'a>,
        index: &'a SymbolIndex,
        enable_exporting: bool,
    ) -> Self {
        Self {
            diagnostics,
            index,
            enable_exporting,
            self_namespace: None,
            frames: Vec::new(),
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn declare(&mut self, name: impl Into<String>, variable: LocalVariable) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), variable);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&LocalVariable> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
    }

    /// Is there a visible `scope` binding that actually is an
    /// `ImplicitScope`?
    pub fn scope_is_visible(&self) -> bool {
        self.lookup("scope")
            .map(|variable| variable.is_scope)
            .unwrap_or(false)
    }
}
