//! Support-file synthesis: the generated adapters that let ordinary
//! code call scope-taking functions without holding a scope, the
//! key-tag declarations backing key-path keys, and closure wrappers for
//! the named-implicits pattern. The output is a syntax-tree fragment;
//! rendering to source happens at the boundary.

mod render;

use crate::graph::{RequirementsGraph, Resolution};
use crate::diagnostics::Diagnostics;
use crate::implicit_key::{ImplicitKey, ImplicitKeyKind};
use crate::lang;
use crate::namespace::SymbolNamespace;
use crate::sema::ImplicitKeyDecl;
use crate::signature::{CallableKind, CallableSignature};
use crate::source_files::Source;
use crate::syntax_tree::*;
use crate::visibility::Visibility;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fmt::Display;

#[derive(Clone, Debug, Default)]
pub struct SupportFileOptions {
    /// Gate the emitted imports behind `#if !IMPLICITS_LEGACY` for
    /// build setups that provide them another way.
    pub legacy_imports: bool,
}

/// An import observed somewhere in the module, deduplicated to the
/// maximum access level seen for that module name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectedImport {
    pub module: String,
    pub visibility: Visibility,
}

#[derive(Debug)]
pub struct SupportFile {
    pub items: Vec<Item<Source>>,
}

impl SupportFile {
    pub fn render(&self) -> String {
        render::render_items(&self.items)
    }
}

#[derive(Clone, Debug)]
enum SupportErrorKind {
    UnknownKeyPathKey { name: String },
}

impl Display for SupportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupportErrorKind::UnknownKeyPathKey { name } => write!(
                f,
                "[BUG IN IMPLICITS] No type is known for implicit key '{}'",
                name
            ),
        }
    }
}

pub fn build_support_file(
    graph: &RequirementsGraph,
    resolution: &Resolution,
    key_decls: &[ImplicitKeyDecl<Source>],
    keys_index: &IndexMap<String, String>,
    imports: &[CollectedImport],
    options: &SupportFileOptions,
    diagnostics: &Diagnostics,
) -> SupportFile {
    let mut items = Vec::new();

    emit_imports(imports, options, &mut items);
    emit_key_tags(key_decls, &mut items);
    emit_adapters(graph, resolution, keys_index, diagnostics, &mut items);
    emit_named_wrappers(graph, &mut items);

    SupportFile { items }
}

fn internal() -> Source {
    Source::internal()
}

fn emit_imports(
    imports: &[CollectedImport],
    options: &SupportFileOptions,
    items: &mut Vec<Item<Source>>,
) {
    let import_items: Vec<Item<Source>> = imports
        .iter()
        .map(|import| {
            Item::Import(Import {
                attributes: Vec::new(),
                visibility: import.visibility,
                module: vec![import.module.clone()],
                syntax: internal(),
            })
        })
        .collect();

    if import_items.is_empty() {
        return;
    }

    if options.legacy_imports {
        items.push(Item::IfConfig(IfConfig {
            clauses: vec![IfConfigClause {
                condition: Some(
                    ConditionExprKind::Not(Box::new(
                        ConditionExprKind::Identifier("IMPLICITS_LEGACY".into()).at(internal()),
                    ))
                    .at(internal()),
                ),
                resolution: None,
                body: import_items,
            }],
            syntax: internal(),
        }));
    } else {
        items.extend(import_items);
    }
}

fn emit_key_tags(key_decls: &[ImplicitKeyDecl<Source>], items: &mut Vec<Item<Source>>) {
    if key_decls.is_empty() {
        return;
    }

    let mut members = Vec::new();

    for decl in key_decls {
        let tag_name = key_tag_name(&decl.name);

        members.push(MemberItem::Declaration(Decl::Type(TypeDecl {
            kind: TypeDeclKind::Enum,
            attributes: Vec::new(),
            visibility: decl.visibility,
            is_final: false,
            name: tag_name.clone(),
            members: Vec::new(),
            syntax: internal(),
        })));

        let mut attributes = Vec::new();
        if decl.visibility.more_or_equal_visible(Visibility::Public) {
            attributes.push(Attribute::plain("inlinable", internal()));
        }

        members.push(MemberItem::Declaration(Decl::Variable(VariableDecl {
            attributes,
            visibility: decl.visibility,
            affiliation: Affiliation::Instance,
            specifier: BindingSpecifier::Var,
            bindings: vec![Binding {
                pattern: PatternKind::Identifier(decl.name.clone()).at(internal()),
                ty: Some(
                    TypeExprKind::Generic {
                        base: "ImplicitKeyPath".into(),
                        arguments: vec![
                            TypeExprKind::Identifier(tag_name).at(internal()),
                            TypeExprKind::Identifier(decl.ty.clone()).at(internal()),
                        ],
                    }
                    .at(internal()),
                ),
                initializer: None,
                accessors: Some(AccessorBlock {
                    items: vec![CodeBlockItem::Expression(
                        call_expr(reference("ImplicitKeyPath"), Vec::new(), None),
                    )],
                }),
                syntax: internal(),
            }],
            syntax: internal(),
        })));
    }

    items.push(Item::Extension(Extension {
        attributes: Vec::new(),
        visibility: Visibility::Default,
        extended_type: TypeExprKind::Identifier(lang::KEYS_NAMESPACE.into()).at(internal()),
        members,
        syntax: internal(),
    }));
}

fn key_tag_name(key_name: &str) -> String {
    let mut chars = key_name.chars();
    let capitalised = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    format!("_{}Tag", capitalised)
}

/// `lowerCamelCase` of a rendered type with non-alphanumerics removed:
/// `Bool` → `bool`, `[Int]` → `int`, `Foo.Bar` → `fooBar`.
fn parameter_name_for_type(type_name: &str) -> String {
    let cleaned: String = type_name
        .chars()
        .filter(|character| character.is_alphanumeric())
        .collect();

    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::from("value"),
    }
}

struct InjectedParameter {
    name: String,
    ty: String,
    key: ImplicitKey,
}

fn injected_parameters(
    requirements: &BTreeSet<ImplicitKey>,
    keys_index: &IndexMap<String, String>,
    site: Source,
    diagnostics: &Diagnostics,
) -> Vec<InjectedParameter> {
    let mut injected = Vec::new();

    for key in requirements {
        match key.kind {
            ImplicitKeyKind::Type => injected.push(InjectedParameter {
                name: parameter_name_for_type(&key.name),
                ty: key.name.clone(),
                key: key.clone(),
            }),
            ImplicitKeyKind::KeyPath => match keys_index.get(&key.name) {
                Some(ty) => injected.push(InjectedParameter {
                    name: key.name.clone(),
                    ty: ty.clone(),
                    key: key.clone(),
                }),
                None => {
                    // The module-level keys index is seeded from every
                    // dependency; a miss here is our own bug.
                    diagnostics.error(
                        site,
                        SupportErrorKind::UnknownKeyPathKey {
                            name: key.name.clone(),
                        },
                    );
                }
            },
        }
    }

    injected.sort_by(|a, b| a.name.cmp(&b.name));
    injected
}

fn emit_adapters(
    graph: &RequirementsGraph,
    resolution: &Resolution,
    keys_index: &IndexMap<String, String>,
    diagnostics: &Diagnostics,
    items: &mut Vec<Item<Source>>,
) {
    let mut by_namespace: IndexMap<SymbolNamespace, Vec<Decl<Source>>> = IndexMap::new();

    for entry in &graph.public_interface {
        let requirements = resolution.of(entry.node);
        let injected =
            injected_parameters(&requirements, keys_index, entry.syntax, diagnostics);

        let adapter = build_adapter(&entry.signature, &injected);
        by_namespace
            .entry(entry.signature.namespace.clone())
            .or_default()
            .push(Decl::Function(adapter));
    }

    for (namespace, adapters) in by_namespace {
        if namespace.is_root() {
            items.extend(adapters.into_iter().map(Item::Declaration));
        } else {
            items.push(Item::Extension(Extension {
                attributes: Vec::new(),
                visibility: Visibility::Default,
                extended_type: namespace_type(&namespace),
                members: adapters
                    .into_iter()
                    .map(MemberItem::Declaration)
                    .collect(),
                syntax: internal(),
            }));
        }
    }
}

fn namespace_type(namespace: &SymbolNamespace) -> TypeExpr<Source> {
    let mut segments = namespace.segments().iter();
    let first = segments.next().expect("non-root namespace");

    let mut ty = TypeExprKind::Identifier(first.clone()).at(internal());

    for segment in segments {
        ty = TypeExprKind::Member {
            base: Box::new(ty),
            name: segment.clone(),
            arguments: Vec::new(),
        }
        .at(internal());
    }

    ty
}

fn build_adapter(
    signature: &CallableSignature,
    injected: &[InjectedParameter],
) -> FunctionDecl<Source> {
    let mut parameters = Vec::new();
    let mut forwarded_arguments = Vec::new();
    let mut unnamed = 0usize;

    for parameter in &signature.parameters {
        if parameter.ty == lang::SCOPE_TYPE {
            continue;
        }

        let (first_name, second_name, value_name) = if parameter.is_unlabeled() {
            let inner = format!("a{}", unnamed);
            unnamed += 1;
            ("_".to_string(), Some(inner.clone()), inner)
        } else {
            (parameter.label.clone(), None, parameter.label.clone())
        };

        forwarded_arguments.push(CallArgument {
            label: (!parameter.is_unlabeled()).then(|| parameter.label.clone()),
            value: reference(&value_name),
        });

        parameters.push(FunctionParameter {
            first_name,
            second_name,
            ty: TypeExprKind::Identifier(parameter.ty.clone()).at(internal()),
            has_default: parameter.has_default,
            syntax: internal(),
        });
    }

    for parameter in injected {
        parameters.push(FunctionParameter {
            first_name: parameter.name.clone(),
            second_name: None,
            ty: autoclosure_type(&parameter.ty),
            has_default: false,
            syntax: internal(),
        });
    }

    let mut body = vec![scope_begin_item(None), scope_end_defer_item()];

    for parameter in injected {
        body.push(implicit_local_item(parameter));
    }

    forwarded_arguments.push(CallArgument {
        label: None,
        value: reference(lang::SCOPE_VARIABLE),
    });

    let callee = match &signature.kind {
        CallableKind::Initializer { .. } => ExprKind::MemberAccess {
            base: Some(Box::new(reference("self"))),
            name: "init".into(),
        }
        .at(internal()),
        other => reference(other.basename()),
    };

    body.push(CodeBlockItem::Expression(call_expr(
        callee,
        forwarded_arguments,
        None,
    )));

    let return_type = signature
        .return_type
        .as_ref()
        .and_then(|failable| failable.success())
        .map(|resolved| {
            TypeExprKind::Identifier(resolved.description.clone()).at(internal())
        });

    FunctionDecl {
        attributes: Vec::new(),
        visibility: Visibility::Public,
        affiliation: match signature.kind {
            CallableKind::StaticFunction { .. } if !signature.namespace.is_root() => {
                Affiliation::Static
            }
            _ => Affiliation::Instance,
        },
        is_final: false,
        is_override: false,
        is_open: false,
        name: match &signature.kind {
            CallableKind::Initializer { optional } => FunctionName::Initializer {
                optional: *optional,
            },
            other => FunctionName::Named(other.basename().to_string()),
        },
        generic_parameters: Vec::new(),
        parameters,
        return_type,
        body: Some(body),
        syntax: internal(),
    }
}

fn emit_named_wrappers(graph: &RequirementsGraph, items: &mut Vec<Item<Source>>) {
    // One wrapper per distinct name; several uses share it. The bag
    // captures the caller's whole frame, so the wrapper body does not
    // depend on the resolved requirement set.
    let mut wrappers: IndexMap<String, usize> = IndexMap::new();

    for wrapper in &graph.named_wrappers {
        let count = wrappers.entry(wrapper.name.clone()).or_insert(0);
        *count = (*count).max(wrapper.closure_param_count);
    }

    for (name, parameter_count) in wrappers {
        items.push(Item::Declaration(Decl::Function(build_named_wrapper(
            &name,
            parameter_count,
        ))));
    }
}

fn build_named_wrapper(name: &str, parameter_count: usize) -> FunctionDecl<Source> {
    let type_names: Vec<String> = (0..parameter_count).map(|i| format!("A{}", i)).collect();
    let value_names: Vec<String> = (0..parameter_count).map(|i| format!("a{}", i)).collect();

    let mut generic_parameters = type_names.clone();
    generic_parameters.push("R".into());

    let mut closure_parameter_types: Vec<TypeExpr<Source>> = type_names
        .iter()
        .map(|name| TypeExprKind::Identifier(name.clone()).at(internal()))
        .collect();
    closure_parameter_types
        .push(TypeExprKind::Identifier(lang::SCOPE_TYPE.into()).at(internal()));

    let body_parameter_type = TypeExprKind::Attributed {
        attributes: vec![Attribute::plain("escaping", internal())],
        base: Box::new(
            TypeExprKind::Function(FunctionType {
                parameters: closure_parameter_types,
                effects: TypeEffects::default(),
                result: Box::new(TypeExprKind::Identifier("R".into()).at(internal())),
            })
            .at(internal()),
        ),
    }
    .at(internal());

    let return_type = TypeExprKind::Function(FunctionType {
        parameters: type_names
            .iter()
            .map(|name| TypeExprKind::Identifier(name.clone()).at(internal()))
            .collect(),
        effects: TypeEffects::default(),
        result: Box::new(TypeExprKind::Identifier("R".into()).at(internal())),
    })
    .at(internal());

    // let implicits = scope.implicits()
    let capture_bag = CodeBlockItem::Declaration(Decl::Variable(VariableDecl {
        attributes: Vec::new(),
        visibility: Visibility::Default,
        affiliation: Affiliation::Instance,
        specifier: BindingSpecifier::Let,
        bindings: vec![Binding {
            pattern: PatternKind::Identifier(lang::BAG_VARIABLE.into()).at(internal()),
            ty: None,
            initializer: Some(call_expr(
                ExprKind::MemberAccess {
                    base: Some(Box::new(reference(lang::SCOPE_VARIABLE))),
                    name: lang::BAG_VARIABLE.into(),
                }
                .at(internal()),
                Vec::new(),
                None,
            )),
            accessors: None,
            syntax: internal(),
        }],
        syntax: internal(),
    }));

    let mut closure_body = vec![
        scope_begin_item(Some(lang::BAG_VARIABLE)),
        scope_end_defer_item(),
    ];

    let mut forwarded: Vec<CallArgument<Source>> = value_names
        .iter()
        .map(|name| CallArgument {
            label: None,
            value: reference(name),
        })
        .collect();
    forwarded.push(CallArgument {
        label: None,
        value: reference(lang::SCOPE_VARIABLE),
    });

    closure_body.push(CodeBlockItem::Expression(call_expr(
        reference("body"),
        forwarded,
        None,
    )));

    let returned_closure = ExprKind::Closure(Closure {
        captures: vec![ClosureCapture {
            name: lang::BAG_VARIABLE.into(),
            syntax: internal(),
        }],
        parameters: value_names,
        body: closure_body,
        syntax: internal(),
    })
    .at(internal());

    FunctionDecl {
        attributes: Vec::new(),
        visibility: Visibility::Public,
        affiliation: Affiliation::Instance,
        is_final: false,
        is_override: false,
        is_open: false,
        name: FunctionName::Named(format!(
            "{}{}{}",
            lang::NAMED_WRAPPER_PREFIX,
            name,
            lang::NAMED_WRAPPER_SUFFIX
        )),
        generic_parameters,
        parameters: vec![
            FunctionParameter {
                first_name: "_".into(),
                second_name: Some(lang::SCOPE_VARIABLE.into()),
                ty: TypeExprKind::Identifier(lang::SCOPE_TYPE.into()).at(internal()),
                has_default: false,
                syntax: internal(),
            },
            FunctionParameter {
                first_name: "_".into(),
                second_name: Some("body".into()),
                ty: body_parameter_type,
                has_default: false,
                syntax: internal(),
            },
        ],
        return_type: Some(return_type),
        body: Some(vec![
            capture_bag,
            CodeBlockItem::Expression(returned_closure),
        ]),
        syntax: internal(),
    }
}

fn autoclosure_type(result: &str) -> TypeExpr<Source> {
    TypeExprKind::Attributed {
        attributes: vec![Attribute::plain("autoclosure", internal())],
        base: Box::new(
            TypeExprKind::Function(FunctionType {
                parameters: Vec::new(),
                effects: TypeEffects::default(),
                result: Box::new(TypeExprKind::Identifier(result.into()).at(internal())),
            })
            .at(internal()),
        ),
    }
    .at(internal())
}

/// `let scope = ImplicitScope()` or `let scope = ImplicitScope(with: bag)`.
fn scope_begin_item(bag: Option<&str>) -> CodeBlockItem<Source> {
    let arguments = bag
        .map(|bag| {
            vec![CallArgument {
                label: Some("with".into()),
                value: reference(bag),
            }]
        })
        .unwrap_or_default();

    CodeBlockItem::Declaration(Decl::Variable(VariableDecl {
        attributes: Vec::new(),
        visibility: Visibility::Default,
        affiliation: Affiliation::Instance,
        specifier: BindingSpecifier::Let,
        bindings: vec![Binding {
            pattern: PatternKind::Identifier(lang::SCOPE_VARIABLE.into()).at(internal()),
            ty: None,
            initializer: Some(call_expr(reference(lang::SCOPE_TYPE), arguments, None)),
            accessors: None,
            syntax: internal(),
        }],
        syntax: internal(),
    }))
}

/// `defer { scope.end() }`
fn scope_end_defer_item() -> CodeBlockItem<Source> {
    CodeBlockItem::Statement(
        StmtKind::Defer(vec![CodeBlockItem::Expression(call_expr(
            ExprKind::MemberAccess {
                base: Some(Box::new(reference(lang::SCOPE_VARIABLE))),
                name: "end".into(),
            }
            .at(internal()),
            Vec::new(),
            None,
        ))])
        .at(internal()),
    )
}

/// `@Implicit(…) var name: T = name()`
fn implicit_local_item(parameter: &InjectedParameter) -> CodeBlockItem<Source> {
    let argument = match parameter.key.kind {
        ImplicitKeyKind::KeyPath => Some(AttributeArgument {
            label: None,
            value: ExprKind::KeyPath {
                components: vec![parameter.key.name.clone()],
            }
            .at(internal()),
        }),
        ImplicitKeyKind::Type => None,
    };

    CodeBlockItem::Declaration(Decl::Variable(VariableDecl {
        attributes: vec![Attribute {
            name: lang::IMPLICIT_ATTRIBUTE.into(),
            argument,
            syntax: internal(),
        }],
        visibility: Visibility::Default,
        affiliation: Affiliation::Instance,
        specifier: BindingSpecifier::Var,
        bindings: vec![Binding {
            pattern: PatternKind::Identifier(parameter.name.clone()).at(internal()),
            ty: Some(TypeExprKind::Identifier(parameter.ty.clone()).at(internal())),
            initializer: Some(call_expr(reference(&parameter.name), Vec::new(), None)),
            accessors: None,
            syntax: internal(),
        }],
        syntax: internal(),
    }))
}

fn reference(name: &str) -> Expr<Source> {
    ExprKind::DeclRef {
        name: name.to_string(),
        arg_labels: None,
    }
    .at(internal())
}

fn call_expr(
    callee: Expr<Source>,
    arguments: Vec<CallArgument<Source>>,
    trailing_closure: Option<Closure<Source>>,
) -> Expr<Source> {
    ExprKind::FunctionCall(FunctionCall {
        callee: Box::new(callee),
        arguments,
        trailing_closure,
    })
    .at(internal())
}
