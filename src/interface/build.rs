use super::{DefinedKey, ImplicitModuleInterface, InterfaceSymbol};
use crate::graph::{RequirementsGraph, Resolution};
use crate::implicit_key::ImplicitKey;
use crate::sema::ImplicitKeyDecl;
use crate::signature::{CallableSignature, SymbolInfo};
use crate::source_files::{Source, SourceFiles, SourceLocation};
use crate::symbol_index::{SymbolIndex, SymbolOrigin};
use crate::visibility::Visibility;
use std::collections::{BTreeSet, HashMap};

/// Assembles the interface after graph resolution: every local callable
/// in the right visibility band, with requirement sets attached to the
/// scope-taking ones.
pub fn build_interface(
    module: impl Into<String>,
    index: &SymbolIndex,
    graph: &RequirementsGraph,
    resolution: &Resolution,
    key_decls: &[ImplicitKeyDecl<Source>],
    reexported_modules: Vec<String>,
    source_files: &SourceFiles,
) -> ImplicitModuleInterface {
    let mut requirements_by_signature: HashMap<&CallableSignature, BTreeSet<ImplicitKey>> =
        HashMap::new();

    for entry in graph
        .public_interface
        .iter()
        .chain(&graph.testable_interface)
    {
        requirements_by_signature.insert(&entry.signature, resolution.of(entry.node));
    }

    let mut symbols = Vec::new();
    let mut testable_symbols = Vec::new();

    for entry in index.entries() {
        let SymbolOrigin::Local(source) = entry.origin else {
            continue;
        };

        let bucket = if entry.visibility.is_exported() {
            &mut symbols
        } else if entry.visibility.is_testable() {
            &mut testable_symbols
        } else {
            continue;
        };

        bucket.push(InterfaceSymbol {
            requirements: requirements_by_signature
                .get(&entry.signature)
                .cloned(),
            info: SymbolInfo::new(entry.signature.clone(), source)
                .map_syntax(|source| SourceLocation::from_source(source, source_files)),
        });
    }

    let defined_keypath_keys = key_decls
        .iter()
        .filter(|decl| {
            decl.visibility.more_or_equal_visible(Visibility::Package)
        })
        .map(|decl| DefinedKey {
            name: decl.name.clone(),
            ty: decl.ty.clone(),
        })
        .collect();

    ImplicitModuleInterface {
        module: module.into(),
        symbols,
        testable_symbols,
        defined_keypath_keys,
        reexported_modules,
    }
}
