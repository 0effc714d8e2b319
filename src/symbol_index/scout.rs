//! The scouting pre-pass. Before any body is analyzed, every callable in
//! the module is forward-declared so call sites anywhere in the module
//! can resolve regardless of declaration order.

use super::{FailedNote, SymbolEntry, SymbolIndex, SymbolOrigin};
use crate::namespace::SymbolNamespace;
use crate::signature::{CallableKind, CallableSignature, SignatureParameter};
use crate::source_files::{Source, SourceFiles};
use crate::syntax_tree::{
    Affiliation, Decl, Extension, FunctionDecl, FunctionName, Item, MemberItem, SyntaxTree,
    TypeExprKind,
};
use crate::type_renderer;

pub fn scout_file(tree: &SyntaxTree<Source>, source_files: &SourceFiles, index: &mut SymbolIndex) {
    scout_items(&tree.items, &SymbolNamespace::root(), false, source_files, index);
}

fn scout_items(
    items: &[Item<Source>],
    namespace: &SymbolNamespace,
    in_type: bool,
    source_files: &SourceFiles,
    index: &mut SymbolIndex,
) {
    for item in items {
        match item {
            Item::Declaration(decl) => scout_decl(decl, namespace, in_type, source_files, index),
            Item::Extension(extension) => scout_extension(extension, source_files, index),
            Item::IfConfig(if_config) => {
                for clause in &if_config.clauses {
                    scout_items(&clause.body, namespace, in_type, source_files, index);
                }
            }
            Item::Import(_) => {}
        }
    }
}

fn scout_members(
    members: &[MemberItem<Source>],
    namespace: &SymbolNamespace,
    source_files: &SourceFiles,
    index: &mut SymbolIndex,
) {
    for member in members {
        match member {
            MemberItem::Declaration(decl) => scout_decl(decl, namespace, true, source_files, index),
            MemberItem::IfConfig(if_config) => {
                for clause in &if_config.clauses {
                    scout_members(&clause.body, namespace, source_files, index);
                }
            }
        }
    }
}

fn scout_decl(
    decl: &Decl<Source>,
    namespace: &SymbolNamespace,
    in_type: bool,
    source_files: &SourceFiles,
    index: &mut SymbolIndex,
) {
    match decl {
        Decl::Function(function) => {
            let signature = signature_of_function(
                function,
                namespace,
                in_type,
                source_files.filename(function.syntax.key),
            );

            for parameter in &function.parameters {
                if matches!(parameter.ty.kind, TypeExprKind::Missing) {
                    index.add_failed_note(
                        namespace.clone(),
                        FailedNote {
                            message: format!(
                                "Parameter type of '{}' could not be parsed",
                                function.name.basename()
                            ),
                            source: parameter.syntax,
                        },
                    );
                }
            }

            index.add(SymbolEntry {
                signature,
                visibility: function.visibility,
                origin: SymbolOrigin::Local(function.syntax),
            });
        }
        Decl::Type(type_decl) => {
            scout_members(
                &type_decl.members,
                &namespace.child(type_decl.name.clone()),
                source_files,
                index,
            );
        }
        Decl::MemberBlock(decls) => {
            for decl in decls {
                scout_decl(decl, namespace, in_type, source_files, index);
            }
        }
        // Protocol requirements are never statically dispatchable and
        // stored properties are not callables.
        Decl::Protocol(_) | Decl::Variable(_) => {}
    }
}

fn scout_extension(
    extension: &Extension<Source>,
    source_files: &SourceFiles,
    index: &mut SymbolIndex,
) {
    let namespace = type_renderer::member_namespace(&extension.extended_type);

    if namespace.is_root() {
        // Extensions of non-nominal types have nothing addressable.
        return;
    }

    scout_members(&extension.members, &namespace, source_files, index);
}

/// The one place signatures are built from declarations; scouting and
/// sema must agree byte-for-byte or index lookups miss.
pub fn signature_of_function(
    function: &FunctionDecl<Source>,
    namespace: &SymbolNamespace,
    in_type: bool,
    filename: &str,
) -> CallableSignature {
    let kind = match &function.name {
        FunctionName::Initializer { optional } => CallableKind::Initializer {
            optional: *optional,
        },
        FunctionName::Named(name) => {
            if in_type
                && name == "callAsFunction"
                && function.affiliation == Affiliation::Instance
            {
                CallableKind::CallAsFunction
            } else if !in_type || function.affiliation != Affiliation::Instance {
                CallableKind::StaticFunction { name: name.clone() }
            } else {
                CallableKind::MemberFunction { name: name.clone() }
            }
        }
    };

    CallableSignature {
        kind,
        parameters: function
            .parameters
            .iter()
            .map(|parameter| SignatureParameter {
                label: parameter.first_name.clone(),
                ty: type_renderer::canonical(&parameter.ty),
                has_default: parameter.has_default,
            })
            .collect(),
        namespace: namespace.clone(),
        return_type: function
            .return_type
            .as_ref()
            .map(type_renderer::resolve),
        file: filename.to_string(),
    }
}
