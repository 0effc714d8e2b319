mod scout;

pub use scout::{scout_file, signature_of_function};

use crate::implicit_key::ImplicitKey;
use crate::interface::ImplicitModuleInterface;
use crate::namespace::SymbolNamespace;
use crate::signature::{CallableKind, CallableSignature, SignatureParameter};
use crate::source_files::{Source, SourceLocation};
use crate::visibility::Visibility;
use indexmap::IndexMap;
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
pub enum SymbolOrigin {
    Local(Source),
    /// Came in through a dependency's module interface, together with
    /// its pre-computed requirement set (when scope-taking).
    External {
        location: SourceLocation,
        requirements: Option<BTreeSet<ImplicitKey>>,
    },
}

#[derive(Clone, Debug)]
pub struct SymbolEntry {
    pub signature: CallableSignature,
    pub visibility: Visibility,
    pub origin: SymbolOrigin,
}

/// A note scouting left behind when it could not fully record a type's
/// callables; attached to later lookup failures in that namespace.
#[derive(Clone, Debug)]
pub struct FailedNote {
    pub message: String,
    pub source: Source,
}

#[derive(Debug, Default)]
pub struct SymbolIndex {
    by_namespace: IndexMap<SymbolNamespace, Vec<SymbolEntry>>,
    failed_notes: IndexMap<SymbolNamespace, Vec<FailedNote>>,
}

#[derive(Debug)]
pub enum Lookup<'a> {
    NotFound,
    Unique(&'a SymbolEntry),
    Ambiguous(Vec<&'a SymbolEntry>),
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: SymbolEntry) {
        self.by_namespace
            .entry(entry.signature.namespace.clone())
            .or_default()
            .push(entry);
    }

    pub fn add_failed_note(&mut self, namespace: SymbolNamespace, note: FailedNote) {
        self.failed_notes.entry(namespace).or_default().push(note);
    }

    pub fn failed_notes(&self, namespace: &SymbolNamespace) -> &[FailedNote] {
        self.failed_notes
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Seeds the index with every symbol a dependency interface exports.
    pub fn add_interface(&mut self, interface: &ImplicitModuleInterface) {
        for symbol in &interface.symbols {
            self.add(SymbolEntry {
                signature: symbol.info.signature.clone(),
                visibility: Visibility::Public,
                origin: SymbolOrigin::External {
                    location: symbol.info.syntax.clone(),
                    requirements: symbol.requirements.clone(),
                },
            });
        }

        for symbol in &interface.testable_symbols {
            self.add(SymbolEntry {
                signature: symbol.info.signature.clone(),
                visibility: Visibility::Package,
                origin: SymbolOrigin::External {
                    location: symbol.info.syntax.clone(),
                    requirements: symbol.requirements.clone(),
                },
            });
        }
    }

    pub fn find_initializer(
        &self,
        namespace: &SymbolNamespace,
        labels: &[Option<&str>],
    ) -> Lookup<'_> {
        self.find(namespace, labels, |kind| {
            matches!(kind, CallableKind::Initializer { .. })
        })
    }

    pub fn find_member(
        &self,
        namespace: &SymbolNamespace,
        name: &str,
        labels: &[Option<&str>],
    ) -> Lookup<'_> {
        self.find(namespace, labels, |kind| match kind {
            CallableKind::MemberFunction { name: found } => found == name,
            CallableKind::CallAsFunction => name == "callAsFunction",
            _ => false,
        })
    }

    pub fn find_static_or_free(
        &self,
        namespace: &SymbolNamespace,
        name: &str,
        labels: &[Option<&str>],
    ) -> Lookup<'_> {
        self.find(namespace, labels, |kind| match kind {
            CallableKind::StaticFunction { name: found } => found == name,
            _ => false,
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.by_namespace.values().flatten()
    }

    fn find(
        &self,
        namespace: &SymbolNamespace,
        labels: &[Option<&str>],
        matches_kind: impl Fn(&CallableKind) -> bool,
    ) -> Lookup<'_> {
        let candidates: Vec<&SymbolEntry> = self
            .by_namespace
            .get(namespace)
            .into_iter()
            .flatten()
            .filter(|entry| {
                matches_kind(&entry.signature.kind)
                    && labels_match(&entry.signature.parameters, labels)
            })
            .collect();

        match candidates.len() {
            0 => Lookup::NotFound,
            1 => Lookup::Unique(candidates[0]),
            _ => Lookup::Ambiguous(candidates),
        }
    }
}

/// Arity-exact, label-exact matching. `_` parameters only accept
/// unlabeled arguments; defaulted parameters still count toward arity.
fn labels_match(parameters: &[SignatureParameter], labels: &[Option<&str>]) -> bool {
    parameters.len() == labels.len()
        && parameters.iter().zip(labels).all(|(parameter, label)| {
            if parameter.is_unlabeled() {
                label.is_none()
            } else {
                *label == Some(parameter.label.as_str())
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: CallableKind, labels: &[&str]) -> SymbolEntry {
        SymbolEntry {
            signature: CallableSignature {
                kind,
                parameters: labels
                    .iter()
                    .map(|label| SignatureParameter::new(*label, "Int", false))
                    .collect(),
                namespace: SymbolNamespace::single("Client"),
                return_type: None,
                file: "client.swift".into(),
            },
            visibility: Visibility::Internal,
            origin: SymbolOrigin::Local(Source::internal()),
        }
    }

    fn member(name: &str, labels: &[&str]) -> SymbolEntry {
        entry(CallableKind::MemberFunction { name: name.into() }, labels)
    }

    #[test]
    fn label_matching_is_exact() {
        let mut index = SymbolIndex::new();
        index.add(member("fetch", &["url", "_"]));

        let namespace = SymbolNamespace::single("Client");

        assert!(matches!(
            index.find_member(&namespace, "fetch", &[Some("url"), None]),
            Lookup::Unique(_)
        ));
        assert!(matches!(
            index.find_member(&namespace, "fetch", &[Some("url"), Some("x")]),
            Lookup::NotFound
        ));
        assert!(matches!(
            index.find_member(&namespace, "fetch", &[Some("url")]),
            Lookup::NotFound
        ));
    }

    #[test]
    fn defaults_do_not_relax_arity() {
        let mut index = SymbolIndex::new();
        let mut with_default = member("fetch", &["url", "retries"]);
        with_default.signature.parameters[1].has_default = true;
        index.add(with_default);

        assert!(matches!(
            index.find_member(&SymbolNamespace::single("Client"), "fetch", &[Some("url")]),
            Lookup::NotFound
        ));
    }

    #[test]
    fn duplicate_signatures_are_ambiguous() {
        let mut index = SymbolIndex::new();
        index.add(member("fetch", &["url"]));
        index.add(member("fetch", &["url"]));

        match index.find_member(&SymbolNamespace::single("Client"), "fetch", &[Some("url")]) {
            Lookup::Ambiguous(candidates) => assert_eq!(candidates.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn initializers_are_found_by_namespace() {
        let mut index = SymbolIndex::new();
        index.add(entry(CallableKind::Initializer { optional: false }, &["_"]));

        assert!(matches!(
            index.find_initializer(&SymbolNamespace::single("Client"), &[None]),
            Lookup::Unique(_)
        ));
    }
}
