//! Walks a host file into the language-agnostic syntax tree, consulting
//! the conditional-compilation configuration so inactive `#if` branches
//! never reach analysis.

use crate::conditional::{filter_clauses, Configuration};
use crate::host::*;
use crate::source_files::Source;
use crate::syntax_tree::*;
use crate::visibility::Visibility;

pub fn build_syntax_tree(file: HostFile, config: &Configuration) -> SyntaxTree<Source> {
    SyntaxTree::new(build_items(file.items, config))
}

fn build_items(items: Vec<HostItem>, config: &Configuration) -> Vec<Item<Source>> {
    let mut built = Vec::new();

    for item in items {
        match item {
            HostItem::Import(import) => built.push(Item::Import(build_import(import, config))),
            HostItem::Extension(extension) => {
                built.push(Item::Extension(build_extension(extension, config)))
            }
            HostItem::IfConfig(if_config) => {
                let lowered = build_if_config(if_config, config, &build_items);
                match lowered {
                    Lowered::Spliced(items) => built.extend(items),
                    Lowered::Kept(if_config) => built.push(Item::IfConfig(if_config)),
                }
            }
            other => {
                if let Some(decl) = build_decl(other, config) {
                    built.push(Item::Declaration(decl));
                }
            }
        }
    }

    built
}

enum Lowered<S, Body> {
    /// The chain fully resolved; the active body replaces it in place.
    Spliced(Vec<Body>),
    Kept(IfConfig<S, Body>),
}

fn build_if_config<HostBody, Body>(
    if_config: HostIfConfig<HostBody>,
    config: &Configuration,
    build_body: &impl Fn(Vec<HostBody>, &Configuration) -> Vec<Body>,
) -> Lowered<Source, Body> {
    let clauses = if_config
        .clauses
        .into_iter()
        .map(|clause| IfConfigClause {
            condition: clause.condition.map(build_condition),
            resolution: None,
            body: build_body(clause.body, config),
        })
        .collect();

    let mut retained = filter_clauses(clauses, config);

    match retained.len() {
        0 => Lowered::Spliced(Vec::new()),
        1 if retained[0].resolution == Some(true) => {
            Lowered::Spliced(retained.pop().unwrap().body)
        }
        _ => Lowered::Kept(IfConfig {
            clauses: retained,
            syntax: if_config.source,
        }),
    }
}

fn build_condition(condition: HostConditionExpr) -> ConditionExpr<Source> {
    let source = condition.source();

    match condition {
        HostConditionExpr::Boolean(value, _) => ConditionExprKind::Boolean(value),
        HostConditionExpr::Identifier(name, _) => ConditionExprKind::Identifier(name),
        HostConditionExpr::Call {
            name, arguments, ..
        } => ConditionExprKind::Call {
            name,
            arguments: arguments.into_iter().map(build_condition).collect(),
        },
        HostConditionExpr::Not(inner, _) => {
            ConditionExprKind::Not(Box::new(build_condition(*inner)))
        }
        HostConditionExpr::And(left, right, _) => ConditionExprKind::And(
            Box::new(build_condition(*left)),
            Box::new(build_condition(*right)),
        ),
        HostConditionExpr::Or(left, right, _) => ConditionExprKind::Or(
            Box::new(build_condition(*left)),
            Box::new(build_condition(*right)),
        ),
        HostConditionExpr::Parenthesized(inner, _) => {
            ConditionExprKind::Parenthesized(Box::new(build_condition(*inner)))
        }
        HostConditionExpr::Unsupported(_) => ConditionExprKind::Unsupported,
    }
    .at(source)
}

fn build_import(import: HostImport, config: &Configuration) -> Import<Source> {
    let interpreted = interpret_modifiers(&import.modifiers);

    Import {
        attributes: import
            .attributes
            .into_iter()
            .map(|attribute| build_attribute(attribute, config))
            .collect(),
        visibility: interpreted.visibility,
        module: import.module,
        syntax: import.source,
    }
}

fn build_extension(extension: HostExtensionDecl, config: &Configuration) -> Extension<Source> {
    let interpreted = interpret_modifiers(&extension.modifiers);

    Extension {
        attributes: extension
            .attributes
            .into_iter()
            .map(|attribute| build_attribute(attribute, config))
            .collect(),
        visibility: interpreted.visibility,
        extended_type: build_type(extension.extended_type, config),
        members: build_member_items(extension.members, config),
        syntax: extension.source,
    }
}

fn build_member_items(items: Vec<HostItem>, config: &Configuration) -> Vec<MemberItem<Source>> {
    let mut built = Vec::new();

    for item in items {
        match item {
            HostItem::IfConfig(if_config) => {
                match build_if_config(if_config, config, &build_member_items) {
                    Lowered::Spliced(members) => built.extend(members),
                    Lowered::Kept(if_config) => built.push(MemberItem::IfConfig(if_config)),
                }
            }
            other => {
                if let Some(decl) = build_decl(other, config) {
                    built.push(MemberItem::Declaration(decl));
                }
            }
        }
    }

    built
}

fn build_decl(item: HostItem, config: &Configuration) -> Option<Decl<Source>> {
    Some(match item {
        HostItem::Type(decl) => Decl::Type(build_type_decl(decl, config)),
        HostItem::Protocol(decl) => Decl::Protocol(build_protocol_decl(decl, config)),
        HostItem::Function(decl) => Decl::Function(build_func_decl(decl, config)),
        HostItem::Variable(decl) => Decl::Variable(build_var_decl(decl, config)),
        // Imports and extensions are only meaningful at the top level.
        HostItem::Import(_) | HostItem::Extension(_) | HostItem::IfConfig(_) => return None,
    })
}

struct InterpretedModifiers {
    visibility: Visibility,
    affiliation: Affiliation,
    is_final: bool,
    is_override: bool,
}

fn interpret_modifiers(modifiers: &[HostModifier]) -> InterpretedModifiers {
    let mut interpreted = InterpretedModifiers {
        visibility: Visibility::Default,
        affiliation: Affiliation::Instance,
        is_final: false,
        is_override: false,
    };

    for modifier in modifiers {
        if let Some(visibility) = Visibility::parse(&modifier.keyword) {
            interpreted.visibility = visibility;
            continue;
        }

        match modifier.keyword.as_str() {
            "static" => interpreted.affiliation = Affiliation::Static,
            "class" => interpreted.affiliation = Affiliation::Class,
            "final" => interpreted.is_final = true,
            "override" => interpreted.is_override = true,
            _ => {}
        }
    }

    interpreted
}

fn build_type_decl(decl: HostTypeDecl, config: &Configuration) -> TypeDecl<Source> {
    let interpreted = interpret_modifiers(&decl.modifiers);

    TypeDecl {
        kind: match decl.keyword {
            HostTypeDeclKeyword::Struct => TypeDeclKind::Struct,
            HostTypeDeclKeyword::Class => TypeDeclKind::Class,
            HostTypeDeclKeyword::Enum => TypeDeclKind::Enum,
            HostTypeDeclKeyword::Actor => TypeDeclKind::Actor,
        },
        attributes: decl
            .attributes
            .into_iter()
            .map(|attribute| build_attribute(attribute, config))
            .collect(),
        visibility: interpreted.visibility,
        is_final: interpreted.is_final,
        name: decl.name,
        members: build_member_items(decl.members, config),
        syntax: decl.source,
    }
}

fn build_protocol_decl(decl: HostProtocolDecl, config: &Configuration) -> ProtocolDecl<Source> {
    let interpreted = interpret_modifiers(&decl.modifiers);

    ProtocolDecl {
        attributes: decl
            .attributes
            .into_iter()
            .map(|attribute| build_attribute(attribute, config))
            .collect(),
        visibility: interpreted.visibility,
        name: decl.name,
        members: decl
            .members
            .into_iter()
            .filter_map(|member| build_decl(member, config))
            .collect(),
        syntax: decl.source,
    }
}

fn build_func_decl(decl: HostFuncDecl, config: &Configuration) -> FunctionDecl<Source> {
    let interpreted = interpret_modifiers(&decl.modifiers);

    FunctionDecl {
        attributes: decl
            .attributes
            .into_iter()
            .map(|attribute| build_attribute(attribute, config))
            .collect(),
        is_open: interpreted.visibility == Visibility::Open,
        visibility: interpreted.visibility,
        affiliation: interpreted.affiliation,
        is_final: interpreted.is_final,
        is_override: interpreted.is_override,
        name: match decl.name {
            HostFuncName::Initializer { optional } => FunctionName::Initializer { optional },
            HostFuncName::Named(name) => FunctionName::Named(name),
        },
        generic_parameters: decl.generic_parameters,
        parameters: decl
            .parameters
            .into_iter()
            .map(|parameter| FunctionParameter {
                first_name: parameter.first_name,
                second_name: parameter.second_name,
                ty: build_type(parameter.ty, config),
                has_default: parameter.has_default,
                syntax: parameter.source,
            })
            .collect(),
        return_type: decl.return_type.map(|ty| build_type(ty, config)),
        body: decl.body.map(|body| build_code_items(body, config)),
        syntax: decl.source,
    }
}

fn build_var_decl(decl: HostVarDecl, config: &Configuration) -> VariableDecl<Source> {
    let interpreted = interpret_modifiers(&decl.modifiers);

    VariableDecl {
        attributes: decl
            .attributes
            .into_iter()
            .map(|attribute| build_attribute(attribute, config))
            .collect(),
        visibility: interpreted.visibility,
        affiliation: interpreted.affiliation,
        specifier: match decl.specifier {
            HostBindingSpecifier::Let => BindingSpecifier::Let,
            HostBindingSpecifier::Var => BindingSpecifier::Var,
        },
        bindings: decl
            .bindings
            .into_iter()
            .map(|binding| Binding {
                pattern: build_pattern(binding.pattern),
                ty: binding.ty.map(|ty| build_type(ty, config)),
                initializer: binding.initializer.map(|expr| build_expr(expr, config)),
                accessors: binding.accessors.map(|items| AccessorBlock {
                    items: build_code_items(items, config),
                }),
                syntax: binding.source,
            })
            .collect(),
        syntax: decl.source,
    }
}

fn build_pattern(pattern: HostPattern) -> Pattern<Source> {
    match pattern {
        HostPattern::Wildcard(source) => PatternKind::Wildcard.at(source),
        HostPattern::Identifier(name, source) => PatternKind::Identifier(name).at(source),
        HostPattern::Tuple(elements, source) => {
            PatternKind::Tuple(elements.into_iter().map(build_pattern).collect()).at(source)
        }
        HostPattern::Unsupported(source) => PatternKind::Unsupported.at(source),
    }
}

fn build_code_items(items: Vec<HostCodeItem>, config: &Configuration) -> Vec<CodeBlockItem<Source>> {
    let mut built = Vec::new();

    for item in items {
        match item {
            HostCodeItem::Declaration(decl) => {
                if let Some(decl) = build_decl(*decl, config) {
                    built.push(CodeBlockItem::Declaration(decl));
                }
            }
            HostCodeItem::Statement(stmt) => build_stmt(stmt, config, &mut built),
            HostCodeItem::Expression(expr) => {
                built.push(CodeBlockItem::Expression(build_expr(expr, config)));
            }
        }
    }

    built
}

fn build_stmt(stmt: HostStmt, config: &Configuration, into: &mut Vec<CodeBlockItem<Source>>) {
    match stmt {
        HostStmt::Defer { body, source } => {
            into.push(CodeBlockItem::Statement(
                StmtKind::Defer(build_code_items(body, config)).at(source),
            ));
        }
        HostStmt::Do {
            body,
            catches,
            source,
        } => {
            into.push(CodeBlockItem::Statement(
                StmtKind::Do {
                    body: build_code_items(body, config),
                    catches: catches
                        .into_iter()
                        .map(|catch| build_code_items(catch, config))
                        .collect(),
                }
                .at(source),
            ));
        }
        HostStmt::Return { value, .. } => {
            if let Some(value) = value {
                into.push(CodeBlockItem::Expression(build_expr(value, config)));
            }
        }
        HostStmt::If { branches, source } => {
            // Each branch is its own inner block so writability rules
            // see through it correctly.
            for branch in branches {
                into.push(CodeBlockItem::Statement(
                    StmtKind::Other(build_code_items(branch, config)).at(source),
                ));
            }
        }
        HostStmt::Guard { body, source } => {
            into.push(CodeBlockItem::Statement(
                StmtKind::Other(build_code_items(body, config)).at(source),
            ));
        }
        HostStmt::IfConfig(if_config) => {
            let source = if_config.source;
            match build_if_config(if_config, config, &build_code_items) {
                Lowered::Spliced(items) => into.extend(items),
                Lowered::Kept(kept) => {
                    into.push(CodeBlockItem::Statement(StmtKind::IfConfig(kept).at(source)));
                }
            }
        }
        HostStmt::Other { nested, source } => {
            into.push(CodeBlockItem::Statement(
                StmtKind::Other(build_code_items(nested, config)).at(source),
            ));
        }
    }
}

fn build_expr(expr: HostExpr, config: &Configuration) -> Expr<Source> {
    let source = expr.source();

    match expr {
        HostExpr::Call(call) => ExprKind::FunctionCall(FunctionCall {
            callee: Box::new(build_expr(*call.callee, config)),
            arguments: call
                .arguments
                .into_iter()
                .map(|argument| CallArgument {
                    label: argument.label,
                    value: build_expr(argument.value, config),
                })
                .collect(),
            trailing_closure: call
                .trailing_closure
                .map(|closure| build_closure(*closure, config)),
        }),
        HostExpr::Closure(closure) => ExprKind::Closure(build_closure(closure, config)),
        HostExpr::Member { base, name, .. } => ExprKind::MemberAccess {
            base: base.map(|base| Box::new(build_expr(*base, config))),
            name,
        },
        HostExpr::Ref {
            name, arg_labels, ..
        } => ExprKind::DeclRef { name, arg_labels },
        HostExpr::KeyPath { components, .. } => ExprKind::KeyPath { components },
        HostExpr::Macro { name, .. } => ExprKind::MacroExpansion { name },
        HostExpr::Try(inner, _) => ExprKind::Try(Box::new(build_expr(*inner, config))),
        HostExpr::Await(inner, _) => ExprKind::Await(Box::new(build_expr(*inner, config))),
        HostExpr::Other { nested, .. } => ExprKind::Other(
            nested
                .into_iter()
                .map(|inner| CodeBlockItem::Expression(build_expr(inner, config)))
                .collect(),
        ),
    }
    .at(source)
}

fn build_closure(closure: HostClosure, config: &Configuration) -> Closure<Source> {
    Closure {
        captures: closure
            .captures
            .into_iter()
            .map(|capture| ClosureCapture {
                name: capture.name,
                syntax: capture.source,
            })
            .collect(),
        parameters: closure.parameters,
        body: build_code_items(closure.body, config),
        syntax: closure.source,
    }
}

fn build_attribute(attribute: HostAttribute, config: &Configuration) -> Attribute<Source> {
    Attribute {
        name: attribute.name,
        argument: attribute.argument.map(|argument| AttributeArgument {
            label: argument.label,
            value: build_expr(argument.value, config),
        }),
        syntax: attribute.source,
    }
}

fn build_type(ty: HostType, config: &Configuration) -> TypeExpr<Source> {
    let source = ty.source();

    match ty {
        HostType::Simple {
            name,
            generic_arguments,
            ..
        } => {
            if generic_arguments.is_empty() {
                TypeExprKind::Identifier(name)
            } else {
                TypeExprKind::Generic {
                    base: name,
                    arguments: generic_arguments
                        .into_iter()
                        .map(|ty| build_type(ty, config))
                        .collect(),
                }
            }
        }
        HostType::Member {
            base,
            name,
            generic_arguments,
            ..
        } => TypeExprKind::Member {
            base: Box::new(build_type(*base, config)),
            name,
            arguments: generic_arguments
                .into_iter()
                .map(|ty| build_type(ty, config))
                .collect(),
        },
        HostType::Optional(inner, _) => TypeExprKind::Optional(Box::new(build_type(*inner, config))),
        HostType::ImplicitlyUnwrappedOptional(inner, _) => {
            TypeExprKind::UnwrappedOptional(Box::new(build_type(*inner, config)))
        }
        HostType::Tuple(elements, _) => {
            TypeExprKind::Tuple(elements.into_iter().map(|ty| build_type(ty, config)).collect())
        }
        HostType::Array(element, _) => TypeExprKind::Array(Box::new(build_type(*element, config))),
        HostType::Dictionary { key, value, .. } => TypeExprKind::Dictionary {
            key: Box::new(build_type(*key, config)),
            value: Box::new(build_type(*value, config)),
        },
        HostType::Function {
            parameters,
            is_async,
            throws,
            result,
            ..
        } => TypeExprKind::Function(FunctionType {
            parameters: parameters.into_iter().map(|ty| build_type(ty, config)).collect(),
            effects: TypeEffects {
                is_async,
                throws: throws.map(|clause| ThrowsClause {
                    kind: if clause.rethrows {
                        ThrowsKind::Rethrows
                    } else {
                        ThrowsKind::Throws
                    },
                    ty: clause.ty.map(|ty| Box::new(build_type(*ty, config))),
                }),
            },
            result: Box::new(build_type(*result, config)),
        }),
        HostType::Metatype {
            base, is_protocol, ..
        } => TypeExprKind::Metatype {
            base: Box::new(build_type(*base, config)),
            is_protocol,
        },
        HostType::Attributed {
            attributes, base, ..
        } => TypeExprKind::Attributed {
            attributes: attributes
                .into_iter()
                .map(|attribute| build_attribute(attribute, config))
                .collect(),
            base: Box::new(build_type(*base, config)),
        },
        HostType::ClassRestriction(_) => TypeExprKind::ClassRestriction,
        HostType::Composition(parts, _) => {
            TypeExprKind::Composition(parts.into_iter().map(|ty| build_type(ty, config)).collect())
        }
        HostType::SomeOrAny { keyword, base, .. } => TypeExprKind::SomeOrAny {
            keyword: if keyword == "some" {
                SomeOrAnyKeyword::Some
            } else {
                SomeOrAnyKeyword::Any
            },
            base: Box::new(build_type(*base, config)),
        },
        HostType::Suppressed(inner, _) => TypeExprKind::Suppressed(Box::new(build_type(*inner, config))),
        HostType::PackElement(inner, _) => TypeExprKind::PackElement(Box::new(build_type(*inner, config))),
        HostType::PackExpansion(inner, _) => {
            TypeExprKind::PackExpansion(Box::new(build_type(*inner, config)))
        }
        HostType::Unknown(_) => TypeExprKind::Missing,
    }
    .at(source)
}
