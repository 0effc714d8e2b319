//! One module analysis, end to end: host trees in, diagnostics plus
//! module interface plus support file out.

use crate::build_syntax::build_syntax_tree;
use crate::conditional::Configuration;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::graph::{build_graph, propagate, report_unresolved};
use crate::host::HostFile;
use crate::interface::{build_interface, ImplicitModuleInterface};
use crate::lang;
use crate::sema::{build_sema_file, ImplicitKeyDecl, SemaContext, SemaFile, TopLevel};
use crate::source_files::{Source, SourceFiles};
use crate::support_file::{
    build_support_file, CollectedImport, SupportFile, SupportFileOptions,
};
use crate::symbol_index::{scout_file, SymbolIndex};
use crate::syntax_tree::{Item, SyntaxTree};
use crate::visibility::Visibility;
use indexmap::IndexMap;

#[derive(Debug)]
pub struct ModuleAnalysis {
    pub diagnostics: Vec<Diagnostic>,
    pub interface: ImplicitModuleInterface,
    pub support_file: SupportFile,
}

pub struct AnalyzeOptions {
    pub enable_exporting: bool,
    pub support_file: SupportFileOptions,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            enable_exporting: true,
            support_file: SupportFileOptions::default(),
        }
    }
}

pub fn analyze_module(
    module: &str,
    host_files: Vec<HostFile>,
    source_files: &SourceFiles,
    dependencies: &[ImplicitModuleInterface],
    configuration: &Configuration,
    options: &AnalyzeOptions,
) -> ModuleAnalysis {
    let diagnostics = Diagnostics::new(source_files);

    let trees: Vec<SyntaxTree<Source>> = host_files
        .into_iter()
        .map(|file| build_syntax_tree(file, configuration))
        .collect();

    let mut index = SymbolIndex::new();

    for dependency in dependencies {
        index.add_interface(dependency);
    }

    for tree in &trees {
        scout_file(tree, source_files, &mut index);
    }

    let sema_files: Vec<SemaFile<Source>> = {
        let mut ctx = SemaContext::new(&diagnostics, &index, options.enable_exporting);
        trees
            .iter()
            .map(|tree| build_sema_file(tree, &mut ctx))
            .collect()
    };

    let key_decls: Vec<ImplicitKeyDecl<Source>> = sema_files
        .iter()
        .flat_map(|file| &file.top_level)
        .filter_map(|top_level| match top_level {
            TopLevel::Keys(keys) => Some(keys.keys.clone()),
            _ => None,
        })
        .flatten()
        .collect();

    // Key-path keys resolvable in this module: its own plus every
    // dependency's. A key missing here at synthesis time is a bug.
    let mut keys_index: IndexMap<String, String> = IndexMap::new();
    for dependency in dependencies {
        for key in &dependency.defined_keypath_keys {
            keys_index.insert(key.name.clone(), key.ty.clone());
        }
    }
    for decl in &key_decls {
        keys_index.insert(decl.name.clone(), decl.ty.clone());
    }

    let (imports, reexported_modules) = collect_imports(&trees);

    let graph = build_graph(&sema_files, &index, &diagnostics);
    let resolution = propagate(&graph);
    report_unresolved(&graph, &resolution, &diagnostics);

    let interface = build_interface(
        module,
        &index,
        &graph,
        &resolution,
        &key_decls,
        reexported_modules,
        source_files,
    );

    let support_file = build_support_file(
        &graph,
        &resolution,
        &key_decls,
        &keys_index,
        &imports,
        &options.support_file,
        &diagnostics,
    );

    ModuleAnalysis {
        diagnostics: diagnostics.to_vec(),
        interface,
        support_file,
    }
}

fn collect_imports(trees: &[SyntaxTree<Source>]) -> (Vec<CollectedImport>, Vec<String>) {
    let mut by_module: IndexMap<String, Visibility> = IndexMap::new();
    let mut reexported: Vec<String> = Vec::new();

    fn walk(items: &[Item<Source>], by_module: &mut IndexMap<String, Visibility>, reexported: &mut Vec<String>) {
        for item in items {
            match item {
                Item::Import(import) => {
                    let module = import.module.join(".");

                    let visibility = by_module
                        .entry(module.clone())
                        .or_insert(import.visibility);
                    if import.visibility.more_or_equal_visible(*visibility) {
                        *visibility = import.visibility;
                    }

                    let exported = import
                        .attributes
                        .iter()
                        .any(|attribute| attribute.name == lang::EXPORTED_ATTRIBUTE);
                    if exported && !reexported.contains(&module) {
                        reexported.push(module);
                    }
                }
                Item::IfConfig(if_config) => {
                    for clause in &if_config.clauses {
                        walk(&clause.body, by_module, reexported);
                    }
                }
                _ => {}
            }
        }
    }

    for tree in trees {
        walk(&tree.items, &mut by_module, &mut reexported);
    }

    let imports = by_module
        .into_iter()
        .map(|(module, visibility)| CollectedImport { module, visibility })
        .collect();

    (imports, reexported)
}
