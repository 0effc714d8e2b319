//! Helpers for building host trees by hand. Verbose but precise — each
//! scenario knows exactly which construct sits on which line.

#![allow(dead_code)]

use implicits::analyze::ModuleAnalysis;
use implicits::diagnostics::Severity;
use implicits::host::*;
use implicits::line_column::Location;
use implicits::source_files::{Source, SourceFileKey, SourceFiles};
use std::collections::BTreeSet;

pub fn add_file(files: &SourceFiles, name: &str, line_count: usize) -> SourceFileKey {
    let content = (1..=line_count)
        .map(|line| format!("// line {}", line))
        .collect::<Vec<_>>()
        .join("\n");

    files.add(name.into(), content)
}

pub fn at(key: SourceFileKey, line: usize) -> Source {
    Source::new(key, Location::new(line, 1))
}

pub fn simple_type(name: &str, source: Source) -> HostType {
    HostType::simple(name, source)
}

pub fn array_type(element: &str, source: Source) -> HostType {
    HostType::Array(Box::new(HostType::simple(element, source)), source)
}

pub fn scope_param(source: Source) -> HostParameter {
    HostParameter {
        first_name: "_".into(),
        second_name: Some("scope".into()),
        ty: HostType::simple("ImplicitScope", source),
        has_default: false,
        source,
    }
}

pub fn param(label: &str, ty: &str, source: Source) -> HostParameter {
    HostParameter::new(label, HostType::simple(ty, source), source)
}

pub fn func(name: &str, parameters: Vec<HostParameter>, body: Vec<HostCodeItem>, source: Source) -> HostItem {
    func_with_modifiers(name, Vec::new(), parameters, body, source)
}

pub fn public_func(
    name: &str,
    parameters: Vec<HostParameter>,
    body: Vec<HostCodeItem>,
    source: Source,
) -> HostItem {
    func_with_modifiers(
        name,
        vec![HostModifier::new("public", source)],
        parameters,
        body,
        source,
    )
}

pub fn func_with_modifiers(
    name: &str,
    modifiers: Vec<HostModifier>,
    parameters: Vec<HostParameter>,
    body: Vec<HostCodeItem>,
    source: Source,
) -> HostItem {
    HostItem::Function(HostFuncDecl {
        attributes: Vec::new(),
        modifiers,
        name: HostFuncName::Named(name.into()),
        generic_parameters: Vec::new(),
        parameters,
        return_type: None,
        body: Some(body),
        source,
    })
}

/// `let scope = ImplicitScope()`
pub fn let_scope(source: Source) -> HostCodeItem {
    let_scope_binding(source, Vec::new())
}

/// `let scope = ImplicitScope(with: implicits)`
pub fn let_scope_with_bag(source: Source) -> HostCodeItem {
    let_scope_binding(
        source,
        vec![HostCallArgument {
            label: Some("with".into()),
            value: HostExpr::reference("implicits", source),
        }],
    )
}

fn let_scope_binding(source: Source, arguments: Vec<HostCallArgument>) -> HostCodeItem {
    HostCodeItem::Declaration(Box::new(HostItem::Variable(HostVarDecl {
        attributes: Vec::new(),
        modifiers: Vec::new(),
        specifier: HostBindingSpecifier::Let,
        bindings: vec![HostBinding {
            pattern: HostPattern::Identifier("scope".into(), source),
            ty: None,
            initializer: Some(HostExpr::Call(HostCall {
                callee: Box::new(HostExpr::reference("ImplicitScope", source)),
                arguments,
                trailing_closure: None,
                source,
            })),
            accessors: None,
            source,
        }],
        source,
    })))
}

/// `defer { scope.end() }`
pub fn defer_end(source: Source) -> HostCodeItem {
    HostCodeItem::Statement(HostStmt::Defer {
        body: vec![scope_end(source)],
        source,
    })
}

/// Bare `scope.end()`
pub fn scope_end(source: Source) -> HostCodeItem {
    HostCodeItem::Expression(HostExpr::Call(HostCall {
        callee: Box::new(HostExpr::member(
            HostExpr::reference("scope", source),
            "end",
            source,
        )),
        arguments: Vec::new(),
        trailing_closure: None,
        source,
    }))
}

/// `@Implicit() var <name>: <ty>` — a read.
pub fn implicit_get(name: Option<&str>, ty: &str, source: Source) -> HostCodeItem {
    implicit_binding(name, Some(simple_type(ty, source)), None, None, source)
}

/// `@Implicit var <name>: <ty> = <literal>` — a write.
pub fn implicit_set(name: Option<&str>, ty: &str, source: Source) -> HostCodeItem {
    implicit_binding(
        name,
        Some(simple_type(ty, source)),
        Some(literal(source)),
        None,
        source,
    )
}

/// `@Implicit(\.<key>) var <name>: <ty>` — a keyed read.
pub fn implicit_get_keyed(name: &str, key: &str, ty: HostType, source: Source) -> HostCodeItem {
    implicit_binding(
        Some(name),
        Some(ty),
        None,
        Some(HostExpr::KeyPath {
            components: vec![key.into()],
            source,
        }),
        source,
    )
}

pub fn implicit_binding(
    name: Option<&str>,
    ty: Option<HostType>,
    initializer: Option<HostExpr>,
    marker_argument: Option<HostExpr>,
    source: Source,
) -> HostCodeItem {
    let attribute = match marker_argument {
        Some(argument) => HostAttribute::with_argument("Implicit", argument, source),
        None => HostAttribute::plain("Implicit", source),
    };

    HostCodeItem::Declaration(Box::new(HostItem::Variable(HostVarDecl {
        attributes: vec![attribute],
        modifiers: Vec::new(),
        specifier: HostBindingSpecifier::Var,
        bindings: vec![HostBinding {
            pattern: match name {
                Some(name) => HostPattern::Identifier(name.into(), source),
                None => HostPattern::Wildcard(source),
            },
            ty,
            initializer,
            accessors: None,
            source,
        }],
        source,
    })))
}

/// An opaque literal expression.
pub fn literal(source: Source) -> HostExpr {
    HostExpr::Other {
        nested: Vec::new(),
        source,
    }
}

/// `<name>(scope)`
pub fn call_passing_scope(name: &str, source: Source) -> HostCodeItem {
    HostCodeItem::Expression(HostExpr::Call(HostCall {
        callee: Box::new(HostExpr::reference(name, source)),
        arguments: vec![HostCallArgument {
            label: None,
            value: HostExpr::reference("scope", source),
        }],
        trailing_closure: None,
        source,
    }))
}

pub fn if_branch(branches: Vec<Vec<HostCodeItem>>, source: Source) -> HostCodeItem {
    HostCodeItem::Statement(HostStmt::If { branches, source })
}

pub fn if_config_stmt(
    clauses: Vec<(Option<HostConditionExpr>, Vec<HostCodeItem>)>,
    source: Source,
) -> HostCodeItem {
    HostCodeItem::Statement(HostStmt::IfConfig(HostIfConfig {
        clauses: clauses
            .into_iter()
            .map(|(condition, body)| HostIfConfigClause { condition, body })
            .collect(),
        source,
    }))
}

pub fn cond_ident(name: &str, source: Source) -> HostConditionExpr {
    HostConditionExpr::Identifier(name.into(), source)
}

/// `extension ImplicitsKeys { public var <name>: <ty> { … } }`
pub fn keys_extension(name: &str, ty: HostType, source: Source) -> HostItem {
    HostItem::Extension(HostExtensionDecl {
        attributes: Vec::new(),
        modifiers: Vec::new(),
        extended_type: HostType::simple("ImplicitsKeys", source),
        members: vec![HostItem::Variable(HostVarDecl {
            attributes: Vec::new(),
            modifiers: vec![HostModifier::new("public", source)],
            specifier: HostBindingSpecifier::Var,
            bindings: vec![HostBinding {
                pattern: HostPattern::Identifier(name.into(), source),
                ty: Some(ty),
                initializer: None,
                accessors: Some(Vec::new()),
                source,
            }],
            source,
        })],
        source,
    })
}

pub type DiagnosticTriple = (Severity, usize, String);

pub fn diagnostic_set(analysis: &ModuleAnalysis) -> BTreeSet<DiagnosticTriple> {
    analysis
        .diagnostics
        .iter()
        .map(|diagnostic| {
            (
                diagnostic.severity,
                diagnostic
                    .location
                    .as_ref()
                    .map(|location| location.line)
                    .unwrap_or(0),
                diagnostic.message.clone(),
            )
        })
        .collect()
}

pub fn expect_diagnostics(analysis: &ModuleAnalysis, expected: &[(Severity, usize, &str)]) {
    let actual = diagnostic_set(analysis);
    let expected: BTreeSet<DiagnosticTriple> = expected
        .iter()
        .map(|(severity, line, message)| (*severity, *line, message.to_string()))
        .collect();

    assert_eq!(
        actual, expected,
        "diagnostics mismatch\nactual: {:#?}\nexpected: {:#?}",
        actual, expected
    );
}
