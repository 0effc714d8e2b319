use super::ctx::{LocalVariable, SemaContext};
use super::error::SemaErrorKind;
use super::infer::{base_namespace, infer_expr_type};
use super::*;
use crate::implicit_key::ImplicitKey;
use crate::lang;
use crate::namespace::SymbolNamespace;
use crate::signature::ResolvedType;
use crate::source_files::Source;
use crate::symbol_index::{signature_of_function, Lookup, SymbolOrigin};
use crate::syntax_tree::{
    Binding, BindingSpecifier, Closure, CodeBlockItem, Decl, Expr, ExprKind, Extension,
    FunctionCall, FunctionDecl, Item, MemberItem, ProtocolDecl, Stmt, StmtKind, SyntaxTree,
    TypeDecl, TypeDeclKind, VariableDecl,
};
use crate::type_renderer;
use crate::visibility::Visibility;

pub fn build_sema_file(tree: &SyntaxTree<Source>, ctx: &mut SemaContext) -> SemaFile<Source> {
    let mut top_level = Vec::new();
    build_top_items(&tree.items, ctx, &mut top_level);
    SemaFile { top_level }
}

fn build_top_items(
    items: &[Item<Source>],
    ctx: &mut SemaContext,
    out: &mut Vec<TopLevel<Source>>,
) {
    for item in items {
        match item {
            Item::Import(_) => {}
            Item::Declaration(decl) => build_top_decl(decl, ctx, out),
            Item::Extension(extension) => build_extension(extension, ctx, out),
            Item::IfConfig(if_config) => {
                // Declarations in undecided branches still get analyzed;
                // their bodies stand on their own.
                for clause in &if_config.clauses {
                    build_top_items(&clause.body, ctx, out);
                }
            }
        }
    }
}

fn build_top_decl(decl: &Decl<Source>, ctx: &mut SemaContext, out: &mut Vec<TopLevel<Source>>) {
    match decl {
        Decl::Function(function) => {
            if let Some(function) =
                build_function(function, &SymbolNamespace::root(), None, ctx)
            {
                out.push(TopLevel::Function(function));
            }
        }
        Decl::Type(type_decl) => {
            out.push(TopLevel::Type(build_type_decl(
                type_decl,
                &SymbolNamespace::root(),
                ctx,
            )));
        }
        Decl::Protocol(protocol) => check_protocol(protocol, ctx),
        Decl::MemberBlock(decls) => {
            for decl in decls {
                build_top_decl(decl, ctx, out);
            }
        }
        // Top-level globals carry no implicit semantics of their own.
        Decl::Variable(_) => {}
    }
}

struct EnclosingType {
    kind: TypeDeclKind,
    is_final: bool,
}

fn build_type_decl(
    decl: &TypeDecl<Source>,
    parent: &SymbolNamespace,
    ctx: &mut SemaContext,
) -> SemaTypeDecl<Source> {
    let namespace = parent.child(decl.name.clone());
    let enclosing = EnclosingType {
        kind: decl.kind,
        is_final: decl.is_final,
    };

    let previous_self = ctx.self_namespace.replace(namespace.clone());
    let members = build_members(&decl.members, &namespace, Some(&enclosing), ctx);
    ctx.self_namespace = previous_self;

    SemaTypeDecl {
        kind: decl.kind,
        namespace: namespace.clone(),
        name: decl.name.clone(),
        is_final: decl.is_final,
        members,
        syntax: decl.syntax,
    }
}

fn build_members(
    members: &[MemberItem<Source>],
    namespace: &SymbolNamespace,
    enclosing: Option<&EnclosingType>,
    ctx: &mut SemaContext,
) -> Vec<SemaMember<Source>> {
    let mut built = Vec::new();

    for member in members {
        match member {
            MemberItem::Declaration(decl) => {
                build_member_decl(decl, namespace, enclosing, ctx, &mut built)
            }
            MemberItem::IfConfig(if_config) => {
                for clause in &if_config.clauses {
                    built.extend(build_members(&clause.body, namespace, enclosing, ctx));
                }
            }
        }
    }

    built
}

fn build_member_decl(
    decl: &Decl<Source>,
    namespace: &SymbolNamespace,
    enclosing: Option<&EnclosingType>,
    ctx: &mut SemaContext,
    out: &mut Vec<SemaMember<Source>>,
) {
    match decl {
        Decl::Function(function) => {
            if let Some(function) = build_function(function, namespace, enclosing, ctx) {
                out.push(SemaMember::Function(function));
            }
        }
        Decl::Type(type_decl) => {
            out.push(SemaMember::Type(build_type_decl(type_decl, namespace, ctx)));
        }
        Decl::Variable(variable) => build_member_variable(variable, ctx, out),
        Decl::MemberBlock(decls) => {
            for decl in decls {
                build_member_decl(decl, namespace, enclosing, ctx, out);
            }
        }
        Decl::Protocol(protocol) => check_protocol(protocol, ctx),
    }
}

fn build_member_variable(
    decl: &VariableDecl<Source>,
    ctx: &mut SemaContext,
    out: &mut Vec<SemaMember<Source>>,
) {
    let is_implicit = check_implicit_marker(decl, ctx);

    for binding in &decl.bindings {
        if is_implicit {
            // Members are in an extension when there is no enclosing
            // type; extensions of complex types were rejected earlier.
            if binding.initializer.is_some() {
                ctx.diagnostics
                    .error(binding.syntax, SemaErrorKind::StoredImplicitInitializer);
            }

            if let Some(key) = implicit_key_from_binding(decl, binding, ctx, false) {
                out.push(SemaMember::Implicit {
                    key,
                    syntax: binding.syntax,
                });
            }
            continue;
        }

        if binding.accessors.is_some() {
            // Computed properties carry no stored state to track.
            continue;
        }

        if decl.specifier == BindingSpecifier::Let
            && binding.pattern.identifier() == Some(lang::BAG_VARIABLE)
        {
            out.push(SemaMember::Bag {
                syntax: binding.syntax,
            });
            continue;
        }

        if let Some(initializer) = &binding.initializer {
            ctx.push_frame();
            let mut items = Vec::new();
            lower_expr(initializer, ctx, false, &mut items);
            ctx.pop_frame();

            if !items.is_empty() {
                out.push(SemaMember::Field {
                    initializer: items,
                    syntax: binding.syntax,
                });
            }
        }
    }
}


fn check_protocol(protocol: &ProtocolDecl<Source>, ctx: &SemaContext) {
    for member in &protocol.members {
        if let Decl::Function(function) = member {
            let has_scope_parameter = function
                .parameters
                .iter()
                .any(|parameter| parameter.ty.plain_identifier() == Some(lang::SCOPE_TYPE));

            if has_scope_parameter {
                ctx.diagnostics
                    .error(function.syntax, SemaErrorKind::ProtocolScopeRequirement);
            }
        }
    }
}

fn build_extension(
    extension: &Extension<Source>,
    ctx: &mut SemaContext,
    out: &mut Vec<TopLevel<Source>>,
) {
    let namespace = type_renderer::member_namespace(&extension.extended_type);

    if namespace.segments().len() == 1 && namespace.segments()[0] == lang::KEYS_NAMESPACE {
        out.push(TopLevel::Keys(build_keys_decl(extension, ctx)));
        return;
    }

    let namespace = (!namespace.is_root()).then_some(namespace);

    if namespace.is_none() {
        reject_implicit_members(&extension.members, ctx);
    }

    let members = match &namespace {
        Some(namespace) => {
            let previous_self = ctx.self_namespace.replace(namespace.clone());
            let members = build_members(&extension.members, namespace, None, ctx);
            ctx.self_namespace = previous_self;
            members
        }
        None => Vec::new(),
    };

    out.push(TopLevel::Extension(SemaExtension {
        namespace,
        members,
        syntax: extension.syntax,
    }));
}

fn reject_implicit_members(members: &[MemberItem<Source>], ctx: &SemaContext) {
    for member in members {
        match member {
            MemberItem::Declaration(Decl::Variable(variable)) => {
                let marked = variable
                    .attributes
                    .first()
                    .is_some_and(|attribute| attribute.name == lang::IMPLICIT_ATTRIBUTE);
                if marked {
                    ctx.diagnostics
                        .error(variable.syntax, SemaErrorKind::ImplicitInComplexExtension);
                }
            }
            MemberItem::IfConfig(if_config) => {
                for clause in &if_config.clauses {
                    reject_implicit_members(&clause.body, ctx);
                }
            }
            _ => {}
        }
    }
}

fn build_keys_decl(extension: &Extension<Source>, ctx: &SemaContext) -> SemaKeysDecl<Source> {
    let mut keys = Vec::new();

    for member in &extension.members {
        let MemberItem::Declaration(Decl::Variable(variable)) = member else {
            continue;
        };

        for binding in &variable.bindings {
            let Some(name) = binding.pattern.identifier() else {
                continue;
            };
            let Some(ty) = &binding.ty else {
                ctx.diagnostics.error(
                    binding.syntax,
                    SemaErrorKind::UnableToInferType {
                        name: name.to_string(),
                    },
                );
                continue;
            };

            let visibility = if variable.visibility == Visibility::Default {
                extension.visibility
            } else {
                variable.visibility
            };

            keys.push(ImplicitKeyDecl {
                name: name.to_string(),
                ty: type_renderer::canonical(ty),
                visibility,
                syntax: binding.syntax,
            });
        }
    }

    SemaKeysDecl {
        keys,
        syntax: extension.syntax,
    }
}

fn build_function(
    function: &FunctionDecl<Source>,
    namespace: &SymbolNamespace,
    enclosing: Option<&EnclosingType>,
    ctx: &mut SemaContext,
) -> Option<SemaFunction<Source>> {
    let scope_parameters: Vec<_> = function
        .parameters
        .iter()
        .filter(|parameter| parameter.ty.plain_identifier() == Some(lang::SCOPE_TYPE))
        .collect();

    for excess in scope_parameters.iter().skip(1) {
        ctx.diagnostics
            .error(excess.syntax, SemaErrorKind::MultipleScopeParameters);
    }

    let scope_parameter = scope_parameters.first().copied();

    let is_scope_taking = scope_parameter
        .is_some_and(|parameter| parameter.first_name == "_");

    if let Some(parameter) = scope_parameter {
        if let Some(second) = &parameter.second_name {
            if second != "_" && second != lang::SCOPE_VARIABLE {
                ctx.diagnostics
                    .error(parameter.syntax, SemaErrorKind::ScopeParameterName);
            }
        }
    }

    if is_scope_taking {
        check_static_dispatch(function, enclosing, ctx);

        let has_spi = function
            .attributes
            .iter()
            .any(|attribute| attribute.name == lang::SPI_ATTRIBUTE);

        if ctx.enable_exporting
            && function.visibility.more_or_equal_visible(Visibility::Public)
            && !has_spi
        {
            ctx.diagnostics
                .error(function.syntax, SemaErrorKind::PublicWithoutSpi);
        }
    }

    let filename = ctx
        .diagnostics
        .source_files()
        .filename(function.syntax.key)
        .to_string();

    let signature = signature_of_function(function, namespace, enclosing.is_some(), &filename);

    let body = function.body.as_ref()?;

    ctx.push_frame();

    for parameter in &function.parameters {
        let visible_name = parameter
            .second_name
            .clone()
            .or_else(|| (parameter.first_name != "_").then(|| parameter.first_name.clone()));

        if let Some(name) = visible_name {
            if name == "_" {
                continue;
            }

            let is_scope = parameter.ty.plain_identifier() == Some(lang::SCOPE_TYPE);

            ctx.declare(
                name,
                LocalVariable {
                    is_scope,
                    resolved: type_renderer::resolve(&parameter.ty).success().cloned(),
                },
            );
        }
    }

    let body = lower_items(body, ctx, false);
    ctx.pop_frame();

    Some(SemaFunction {
        signature,
        visibility: function.visibility,
        is_scope_taking,
        body,
        syntax: function.syntax,
    })
}

fn check_static_dispatch(
    function: &FunctionDecl<Source>,
    enclosing: Option<&EnclosingType>,
    ctx: &SemaContext,
) {
    if function.is_open {
        ctx.diagnostics
            .error(function.syntax, SemaErrorKind::OpenScopeFunction);
    }

    if function.is_override {
        ctx.diagnostics
            .error(function.syntax, SemaErrorKind::OverrideScopeFunction);
    }

    if function.affiliation.is_class() {
        ctx.diagnostics
            .error(function.syntax, SemaErrorKind::ClassScopeFunction);
    }

    if let Some(enclosing) = enclosing {
        if enclosing.kind == TypeDeclKind::Class
            && !enclosing.is_final
            && !function.is_final
            && function.affiliation.is_instance()
        {
            ctx.diagnostics
                .error(function.syntax, SemaErrorKind::NonFinalScopeFunction);
        }
    }
}

/// True when the declaration's outermost attribute is `@Implicit`;
/// markers anywhere else are diagnosed.
fn check_implicit_marker(decl: &VariableDecl<Source>, ctx: &SemaContext) -> bool {
    for (position, attribute) in decl.attributes.iter().enumerate() {
        if position > 0 && attribute.name == lang::IMPLICIT_ATTRIBUTE {
            ctx.diagnostics
                .error(attribute.syntax, SemaErrorKind::ImplicitMustBeOutermost);
        }
    }

    decl.attributes
        .first()
        .is_some_and(|attribute| attribute.name == lang::IMPLICIT_ATTRIBUTE)
}

/// Key inference for one `@Implicit` binding: marker argument, declared
/// type, then (for locals) the initializer's inferred type.
fn implicit_key_from_binding(
    decl: &VariableDecl<Source>,
    binding: &Binding<Source>,
    ctx: &SemaContext,
    allow_initializer_inference: bool,
) -> Option<ImplicitKey> {
    // The marker is the declaration's first attribute by construction.
    let marker_argument = decl
        .attributes
        .first()
        .and_then(|attribute| attribute.argument.as_ref());

    if let Some(argument) = marker_argument {
        if argument.label.is_some() {
            ctx.diagnostics
                .error(binding.syntax, SemaErrorKind::ImplicitKeyArgumentLabeled);
            return None;
        }

        let value = argument.value.unwrap_effects();

        if let ExprKind::KeyPath { components } = &value.kind {
            return Some(ImplicitKey::key_path(components.join(".")));
        }

        if let Some(base) = value.metatype_base() {
            if let Some(name) = type_expr_name(base) {
                return Some(ImplicitKey::of_type(name));
            }
        }

        ctx.diagnostics
            .error(value.syntax, SemaErrorKind::UnableToInferKey);
        return None;
    }

    if let Some(ty) = &binding.ty {
        return Some(ImplicitKey::of_type(type_renderer::canonical(ty)));
    }

    if allow_initializer_inference {
        if let Some(initializer) = &binding.initializer {
            if let Some(resolved) = infer_expr_type(initializer, ctx) {
                return Some(ImplicitKey::of_type(resolved.description));
            }

            ctx.diagnostics.error(
                binding.syntax,
                SemaErrorKind::UnableToInferType {
                    name: binding
                        .pattern
                        .identifier()
                        .unwrap_or("_")
                        .to_string(),
                },
            );
            return None;
        }
    }

    ctx.diagnostics
        .error(binding.syntax, SemaErrorKind::UnableToInferKey);
    None
}

/// The spelled name of `T` in `T.self`, following member chains.
fn type_expr_name(expr: &Expr<Source>) -> Option<String> {
    match &expr.kind {
        ExprKind::DeclRef { name, .. } => Some(name.clone()),
        ExprKind::MemberAccess {
            base: Some(base),
            name,
        } => Some(format!("{}.{}", type_expr_name(base)?, name)),
        _ => None,
    }
}

fn lower_items(
    items: &[CodeBlockItem<Source>],
    ctx: &mut SemaContext,
    in_unresolved: bool,
) -> Vec<SemaCodeItem<Source>> {
    let mut out = Vec::new();

    for item in items {
        match item {
            CodeBlockItem::Declaration(decl) => {
                lower_local_decl(decl, ctx, in_unresolved, &mut out)
            }
            CodeBlockItem::Statement(stmt) => lower_stmt(stmt, ctx, in_unresolved, &mut out),
            CodeBlockItem::Expression(expr) => lower_expr(expr, ctx, in_unresolved, &mut out),
        }
    }

    out
}

fn lower_local_decl(
    decl: &Decl<Source>,
    ctx: &mut SemaContext,
    in_unresolved: bool,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    match decl {
        Decl::Variable(variable) => lower_local_variable(variable, ctx, in_unresolved, out),
        Decl::Function(function) => {
            let has_scope_parameter = function
                .parameters
                .iter()
                .any(|parameter| parameter.ty.plain_identifier() == Some(lang::SCOPE_TYPE));

            if has_scope_parameter {
                ctx.diagnostics
                    .error(function.syntax, SemaErrorKind::NestedFunctionScopeParameter);
                return;
            }

            if let Some(function) = build_function(function, &SymbolNamespace::root(), None, ctx)
            {
                out.push(SemaCodeItem::Function(function));
            }
        }
        Decl::Type(type_decl) => {
            out.push(SemaCodeItem::Type(build_type_decl(
                type_decl,
                &SymbolNamespace::root(),
                ctx,
            )));
        }
        Decl::MemberBlock(decls) => {
            for decl in decls {
                lower_local_decl(decl, ctx, in_unresolved, out);
            }
        }
        Decl::Protocol(protocol) => check_protocol(protocol, ctx),
    }
}

fn lower_local_variable(
    decl: &VariableDecl<Source>,
    ctx: &mut SemaContext,
    in_unresolved: bool,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    let is_implicit = check_implicit_marker(decl, ctx);

    for binding in &decl.bindings {
        if is_implicit {
            lower_implicit_binding(decl, binding, ctx, in_unresolved, out);
            continue;
        }

        if let Some(begin) = scope_begin_form(binding, ctx) {
            lower_scope_binding(decl, binding, begin, ctx, in_unresolved, out);
            continue;
        }

        lower_plain_binding(binding, ctx, in_unresolved, out);
    }
}

struct ScopeBeginForm {
    nested: bool,
    with_bag: bool,
}

/// Recognizes `ImplicitScope(…)` and `scope.nested()` initializers.
fn scope_begin_form(binding: &Binding<Source>, ctx: &SemaContext) -> Option<ScopeBeginForm> {
    let initializer = binding.initializer.as_ref()?.unwrap_effects();

    let ExprKind::FunctionCall(call) = &initializer.kind else {
        return None;
    };

    let callee = call.callee.unwrap_effects();

    match &callee.kind {
        ExprKind::DeclRef { name, .. } if name == lang::SCOPE_TYPE => {
            let mut with_bag = false;

            for argument in &call.arguments {
                let correct_label = argument.label.as_deref() == Some("with");
                let correct_name = argument
                    .value
                    .unwrap_effects()
                    .declared_name()
                    == Some(lang::BAG_VARIABLE);

                if correct_label && correct_name {
                    with_bag = true;
                } else {
                    ctx.diagnostics
                        .error(argument.value.syntax, SemaErrorKind::InvalidBagVariableName);
                    with_bag = true;
                }
            }

            Some(ScopeBeginForm {
                nested: false,
                with_bag,
            })
        }
        ExprKind::MemberAccess {
            base: Some(base),
            name,
        } if name == "nested"
            && base.unwrap_effects().declared_name() == Some(lang::SCOPE_VARIABLE)
            && ctx.scope_is_visible() =>
        {
            Some(ScopeBeginForm {
                nested: true,
                with_bag: false,
            })
        }
        _ => None,
    }
}

fn lower_scope_binding(
    decl: &VariableDecl<Source>,
    binding: &Binding<Source>,
    begin: ScopeBeginForm,
    ctx: &mut SemaContext,
    in_unresolved: bool,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    if decl.specifier == BindingSpecifier::Var {
        ctx.diagnostics
            .error(decl.syntax, SemaErrorKind::ScopeMustBeLet);
    }

    if let Some(ty) = &binding.ty {
        if ty.plain_identifier() == Some(lang::SCOPE_TYPE) {
            ctx.diagnostics
                .error(ty.syntax, SemaErrorKind::RedundantScopeAnnotation);
        }
    }

    if in_unresolved {
        ctx.diagnostics
            .error(binding.syntax, SemaErrorKind::UnresolvedBranchScope);
    }

    if let Some(name) = binding.pattern.identifier() {
        ctx.declare(
            name.to_string(),
            LocalVariable {
                is_scope: true,
                resolved: Some(ResolvedType::plain(lang::SCOPE_TYPE)),
            },
        );
    }

    out.push(SemaCodeItem::ScopeBegin {
        nested: begin.nested,
        with_bag: begin.with_bag,
        syntax: binding.syntax,
    });
}

fn lower_implicit_binding(
    decl: &VariableDecl<Source>,
    binding: &Binding<Source>,
    ctx: &mut SemaContext,
    in_unresolved: bool,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    // Initializer side effects run before the implicit is saved.
    if let Some(initializer) = &binding.initializer {
        lower_expr(initializer, ctx, in_unresolved, out);
    }

    let mode = if binding.initializer.is_some() {
        ImplicitMode::Set
    } else {
        ImplicitMode::Get
    };

    if mode.is_set() && binding.pattern.is_wildcard() {
        ctx.diagnostics
            .warning(binding.syntax, SemaErrorKind::AnonymousImplicitNotSaved);
        return;
    }

    if mode.is_set() && in_unresolved {
        ctx.diagnostics
            .error(binding.syntax, SemaErrorKind::UnresolvedBranchMutation);
    }

    let Some(key) = implicit_key_from_binding(decl, binding, ctx, true) else {
        return;
    };

    if let Some(name) = binding.pattern.identifier() {
        let resolved = binding
            .ty
            .as_ref()
            .and_then(|ty| type_renderer::resolve(ty).success().cloned())
            .or_else(|| Some(ResolvedType::plain(key.name.clone())));

        ctx.declare(
            name.to_string(),
            LocalVariable {
                is_scope: false,
                resolved,
            },
        );
    }

    out.push(SemaCodeItem::Implicit {
        mode,
        key,
        syntax: binding.syntax,
    });
}

fn lower_plain_binding(
    binding: &Binding<Source>,
    ctx: &mut SemaContext,
    in_unresolved: bool,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    if let Some(initializer) = &binding.initializer {
        lower_expr(initializer, ctx, in_unresolved, out);
    }

    let Some(name) = binding.pattern.identifier() else {
        return;
    };

    let mut resolved = binding
        .ty
        .as_ref()
        .and_then(|ty| type_renderer::resolve(ty).success().cloned());

    if resolved.is_none() {
        if let Some(initializer) = &binding.initializer {
            // `let x = x` shadows; the outer binding's type carries over
            // when the new one is unannotated.
            let shadows_self = initializer.unwrap_effects().declared_name() == Some(name);

            resolved = if shadows_self {
                ctx.lookup(name).and_then(|outer| outer.resolved.clone())
            } else {
                infer_expr_type(initializer, ctx)
            };
        }
    }

    ctx.declare(
        name.to_string(),
        LocalVariable {
            is_scope: false,
            resolved,
        },
    );
}

fn lower_stmt(
    stmt: &Stmt<Source>,
    ctx: &mut SemaContext,
    in_unresolved: bool,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    match &stmt.kind {
        StmtKind::Defer(body) => lower_defer(body, stmt.syntax, ctx, out),
        StmtKind::Do { body, catches } => {
            out.push(inner_scope(body, stmt.syntax, ctx, in_unresolved));
            for catch in catches {
                out.push(inner_scope(catch, stmt.syntax, ctx, in_unresolved));
            }
        }
        StmtKind::IfConfig(if_config) => {
            for clause in &if_config.clauses {
                if clause.resolution == Some(true) {
                    out.extend(lower_items(&clause.body, ctx, in_unresolved));
                } else {
                    ctx.push_frame();
                    let body = lower_items(&clause.body, ctx, true);
                    ctx.pop_frame();

                    out.push(SemaCodeItem::UnresolvedIfConfig {
                        condition: clause
                            .condition
                            .as_ref()
                            .map(|condition| condition.description()),
                        body,
                        syntax: if_config.syntax,
                    });
                }
            }
        }
        StmtKind::Other(items) => out.push(inner_scope(items, stmt.syntax, ctx, in_unresolved)),
    }
}

fn inner_scope(
    items: &[CodeBlockItem<Source>],
    syntax: Source,
    ctx: &mut SemaContext,
    in_unresolved: bool,
) -> SemaCodeItem<Source> {
    ctx.push_frame();
    let body = lower_items(items, ctx, in_unresolved);
    ctx.pop_frame();

    SemaCodeItem::InnerScope { body, syntax }
}

fn lower_expr(
    expr: &Expr<Source>,
    ctx: &mut SemaContext,
    in_unresolved: bool,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    let expr = expr.unwrap_effects();

    match &expr.kind {
        ExprKind::FunctionCall(call) => lower_call(call, expr.syntax, ctx, in_unresolved, out),
        ExprKind::Closure(closure) => {
            out.push(lower_closure(closure, ctx, in_unresolved));
        }
        ExprKind::Other(items) => {
            for item in items {
                if let CodeBlockItem::Expression(inner) = item {
                    lower_expr(inner, ctx, in_unresolved, out);
                }
            }
        }
        ExprKind::MemberAccess { base: Some(base), .. } => {
            lower_expr(base, ctx, in_unresolved, out);
        }
        _ => {}
    }
}

fn lower_closure(
    closure: &Closure<Source>,
    ctx: &mut SemaContext,
    in_unresolved: bool,
) -> SemaCodeItem<Source> {
    let bag = closure
        .captures
        .iter()
        .find(|capture| capture.name == lang::BAG_VARIABLE)
        .map(|capture| capture.syntax);

    ctx.push_frame();

    for parameter in &closure.parameters {
        if parameter != "_" {
            ctx.declare(parameter.clone(), LocalVariable::default());
        }
    }

    // The surrounding scope does not reach into an escaping closure.
    let body = lower_items(&closure.body, ctx, in_unresolved);
    ctx.pop_frame();

    SemaCodeItem::Closure {
        bag,
        body,
        syntax: closure.syntax,
    }
}

fn lower_call(
    call: &FunctionCall<Source>,
    syntax: Source,
    ctx: &mut SemaContext,
    in_unresolved: bool,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    let callee = call.callee.unwrap_effects();

    // `ImplicitScope()` outside a `let` binding.
    if callee.declared_name() == Some(lang::SCOPE_TYPE) {
        ctx.diagnostics
            .error(syntax, SemaErrorKind::ScopeMustBeBound);
        return;
    }

    // `scope.end()`
    if let ExprKind::MemberAccess {
        base: Some(base),
        name,
    } = &callee.kind
    {
        if name == "end"
            && base.unwrap_effects().declared_name() == Some(lang::SCOPE_VARIABLE)
            && ctx.scope_is_visible()
        {
            if in_unresolved {
                ctx.diagnostics
                    .error(syntax, SemaErrorKind::UnresolvedBranchMutation);
            }
            out.push(SemaCodeItem::ScopeEnd { syntax });
            return;
        }

        if name == "nested"
            && base.unwrap_effects().declared_name() == Some(lang::SCOPE_VARIABLE)
        {
            // `scope.nested()` only means something bound to a `let`.
            ctx.diagnostics
                .error(syntax, SemaErrorKind::ScopeMustBeBound);
            return;
        }
    }

    // `Implicit.map(_:_:)`
    if let ExprKind::MemberAccess {
        base: Some(base),
        name,
    } = &callee.kind
    {
        if name == lang::IMPLICIT_MAP_MEMBER
            && base.unwrap_effects().declared_name() == Some(lang::IMPLICIT_MAP_BASE)
        {
            lower_implicit_map(call, syntax, ctx, in_unresolved, out);
            return;
        }
    }

    // `withScope { scope in … }` and `with<Name>Implicits { … scope in … }`
    if let Some(name) = callee.declared_name() {
        if let Some(closure) = &call.trailing_closure {
            if name == lang::WITH_SCOPE
                && closure.parameters.len() == 1
                && closure.parameters[0] == lang::SCOPE_VARIABLE
            {
                lower_with_scope(call, closure, syntax, ctx, in_unresolved, out);
                return;
            }

            if let Some(middle) = lang::named_wrapper_middle(name) {
                if closure.parameters.last().map(String::as_str) == Some(lang::SCOPE_VARIABLE) {
                    lower_with_named_implicits(middle, closure, syntax, ctx, in_unresolved, out);
                    return;
                }
            }
        }
    }

    // Arguments first: nested closures and calls evaluate before the
    // outer call happens.
    for argument in &call.arguments {
        if argument.value.unwrap_effects().declared_name() == Some(lang::SCOPE_VARIABLE) {
            continue;
        }
        lower_expr(&argument.value, ctx, in_unresolved, out);
    }

    if let Some(closure) = &call.trailing_closure {
        out.push(lower_closure(closure, ctx, in_unresolved));
    }

    let passes_scope = ctx.scope_is_visible()
        && call.arguments.iter().any(|argument| {
            argument.value.unwrap_effects().declared_name() == Some(lang::SCOPE_VARIABLE)
        });

    if !passes_scope {
        lower_expr(callee, ctx, in_unresolved, out);
        return;
    }

    if in_unresolved {
        ctx.diagnostics
            .error(syntax, SemaErrorKind::UnresolvedBranchMutation);
    }

    if let Some(signature) = resolve_scope_call(call, syntax, ctx) {
        out.push(SemaCodeItem::Call { signature, syntax });
    }
}

fn lower_with_scope(
    call: &FunctionCall<Source>,
    closure: &Closure<Source>,
    syntax: Source,
    ctx: &mut SemaContext,
    in_unresolved: bool,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    let nested = call
        .arguments
        .iter()
        .any(|argument| argument.label.as_deref() == Some("nesting"));

    let mut with_bag = false;
    for argument in &call.arguments {
        if argument.label.as_deref() == Some("with") {
            if argument.value.unwrap_effects().declared_name() == Some(lang::BAG_VARIABLE) {
                with_bag = true;
            } else {
                ctx.diagnostics
                    .error(argument.value.syntax, SemaErrorKind::InvalidBagVariableName);
                with_bag = true;
            }
        }
    }

    if in_unresolved {
        ctx.diagnostics
            .error(syntax, SemaErrorKind::UnresolvedBranchScope);
    }

    ctx.push_frame();
    ctx.declare(
        lang::SCOPE_VARIABLE,
        LocalVariable {
            is_scope: true,
            resolved: Some(ResolvedType::plain(lang::SCOPE_TYPE)),
        },
    );
    let body = lower_items(&closure.body, ctx, in_unresolved);
    ctx.pop_frame();

    out.push(SemaCodeItem::WithScope {
        nested,
        with_bag,
        body,
        syntax,
    });
}

fn lower_with_named_implicits(
    middle: &str,
    closure: &Closure<Source>,
    syntax: Source,
    ctx: &mut SemaContext,
    in_unresolved: bool,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    if in_unresolved {
        ctx.diagnostics
            .error(syntax, SemaErrorKind::UnresolvedBranchMutation);
    }

    ctx.push_frame();

    for parameter in &closure.parameters {
        if parameter == lang::SCOPE_VARIABLE {
            ctx.declare(
                lang::SCOPE_VARIABLE,
                LocalVariable {
                    is_scope: true,
                    resolved: Some(ResolvedType::plain(lang::SCOPE_TYPE)),
                },
            );
        } else if parameter != "_" {
            ctx.declare(parameter.clone(), LocalVariable::default());
        }
    }

    let body = lower_items(&closure.body, ctx, in_unresolved);
    ctx.pop_frame();

    out.push(SemaCodeItem::WithNamedImplicits {
        wrapper_name: middle.to_string(),
        closure_param_count: closure.parameters.len().saturating_sub(1),
        body,
        syntax,
    });
}

fn lower_implicit_map(
    call: &FunctionCall<Source>,
    syntax: Source,
    ctx: &SemaContext,
    in_unresolved: bool,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    if in_unresolved {
        ctx.diagnostics
            .error(syntax, SemaErrorKind::UnresolvedBranchMutation);
    }

    if call.arguments.len() != 2 {
        ctx.diagnostics
            .error(syntax, SemaErrorKind::ImplicitMapArgumentCount);
        return;
    }

    let mut keys = Vec::new();

    for argument in &call.arguments {
        if argument.label.is_some() {
            ctx.diagnostics
                .error(argument.value.syntax, SemaErrorKind::ImplicitMapArgumentForm);
            return;
        }

        let value = argument.value.unwrap_effects();

        match &value.kind {
            ExprKind::KeyPath { components } => {
                if components.len() != 1 {
                    ctx.diagnostics
                        .error(value.syntax, SemaErrorKind::ImplicitMapKeyPathComponents);
                    return;
                }
                keys.push(ImplicitKey::key_path(components[0].clone()));
            }
            _ => {
                if let Some(base) = value.metatype_base() {
                    if let Some(name) = type_expr_name(base) {
                        keys.push(ImplicitKey::of_type(name));
                        continue;
                    }
                }

                ctx.diagnostics
                    .error(value.syntax, SemaErrorKind::ImplicitMapArgumentForm);
                return;
            }
        }
    }

    let to = keys.pop().unwrap();
    let from = keys.pop().unwrap();

    out.push(SemaCodeItem::ImplicitMap { from, to, syntax });
}

fn resolve_scope_call(
    call: &FunctionCall<Source>,
    syntax: Source,
    ctx: &SemaContext,
) -> Option<crate::signature::CallableSignature> {
    let labels = call.argument_labels();
    let callee = call.callee.unwrap_effects();

    let (lookup, display_name, searched_namespace) = match &callee.kind {
        ExprKind::DeclRef { name, .. } => {
            if name.chars().next().is_some_and(char::is_uppercase) {
                let namespace = SymbolNamespace::single(name.clone());
                (
                    ctx.index.find_initializer(&namespace, &labels),
                    name.clone(),
                    namespace,
                )
            } else {
                let mut lookup = Lookup::NotFound;
                let mut namespace = SymbolNamespace::root();

                if let Some(self_namespace) = &ctx.self_namespace {
                    lookup = ctx.index.find_member(self_namespace, name, &labels);
                    if matches!(lookup, Lookup::NotFound) {
                        lookup = ctx.index.find_static_or_free(self_namespace, name, &labels);
                    }
                    namespace = self_namespace.clone();
                }

                if matches!(lookup, Lookup::NotFound) {
                    namespace = SymbolNamespace::root();
                    lookup = ctx.index.find_static_or_free(&namespace, name, &labels);
                }

                (lookup, name.clone(), namespace)
            }
        }
        ExprKind::MemberAccess {
            base: Some(base),
            name,
        } => {
            let Some(namespace) = base_namespace(base, ctx) else {
                ctx.diagnostics.error(
                    syntax,
                    SemaErrorKind::UnresolvedSymbol { name: name.clone() },
                );
                return None;
            };

            let mut lookup = ctx.index.find_member(&namespace, name, &labels);
            if matches!(lookup, Lookup::NotFound) {
                lookup = ctx.index.find_static_or_free(&namespace, name, &labels);
            }

            (lookup, name.clone(), namespace)
        }
        _ => {
            ctx.diagnostics.error(
                syntax,
                SemaErrorKind::UnresolvedSymbol {
                    name: "<expression>".to_string(),
                },
            );
            return None;
        }
    };

    match lookup {
        Lookup::Unique(entry) => Some(entry.signature.clone()),
        Lookup::NotFound => {
            ctx.diagnostics.error(
                syntax,
                SemaErrorKind::UnresolvedSymbol { name: display_name },
            );

            for note in ctx.index.failed_notes(&searched_namespace) {
                ctx.diagnostics.note(note.source, &note.message);
            }

            None
        }
        Lookup::Ambiguous(candidates) => {
            ctx.diagnostics.error(
                syntax,
                SemaErrorKind::AmbiguousUse { name: display_name },
            );

            for candidate in candidates {
                let kind = SemaErrorKind::FoundCandidate {
                    signature: candidate.signature.clone(),
                };
                match &candidate.origin {
                    SymbolOrigin::Local(source) => ctx.diagnostics.note(*source, kind),
                    SymbolOrigin::External { location, .. } => {
                        ctx.diagnostics.note(location, kind)
                    }
                }
            }

            None
        }
    }
}

fn lower_defer(
    body: &[CodeBlockItem<Source>],
    syntax: Source,
    ctx: &mut SemaContext,
    out: &mut Vec<SemaCodeItem<Source>>,
) {
    let mut items = Vec::new();

    for item in body {
        if let CodeBlockItem::Expression(expr) = item {
            let expr = expr.unwrap_effects();

            if let ExprKind::FunctionCall(call) = &expr.kind {
                let callee = call.callee.unwrap_effects();

                if let ExprKind::MemberAccess {
                    base: Some(base),
                    name,
                } = &callee.kind
                {
                    if name == "end"
                        && base.unwrap_effects().declared_name() == Some(lang::SCOPE_VARIABLE)
                    {
                        items.push(SemaCodeItem::ScopeEnd { syntax: expr.syntax });
                        continue;
                    }
                }
            }
        }

        check_defer_item(item, false, ctx);
    }

    out.push(SemaCodeItem::Defer {
        body: items,
        syntax,
    });
}

/// The only implicit-affecting statement a `defer` may contain is a
/// top-level `scope.end()`; everything else is hunted down recursively.
fn check_defer_item(item: &CodeBlockItem<Source>, nested: bool, ctx: &SemaContext) {
    match item {
        CodeBlockItem::Declaration(Decl::Variable(variable)) => {
            let marked = variable
                .attributes
                .first()
                .is_some_and(|attribute| attribute.name == lang::IMPLICIT_ATTRIBUTE);

            if marked {
                ctx.diagnostics
                    .error(variable.syntax, SemaErrorKind::DeferOnlyScopeEnd);
            }

            for binding in &variable.bindings {
                if let Some(initializer) = &binding.initializer {
                    check_defer_expr(initializer, true, ctx);
                }
            }
        }
        CodeBlockItem::Declaration(_) => {}
        CodeBlockItem::Statement(stmt) => match &stmt.kind {
            StmtKind::Defer(body) | StmtKind::Other(body) => {
                for item in body {
                    check_defer_item(item, true, ctx);
                }
            }
            StmtKind::Do { body, catches } => {
                for item in body.iter().chain(catches.iter().flatten()) {
                    check_defer_item(item, true, ctx);
                }
            }
            StmtKind::IfConfig(if_config) => {
                for clause in &if_config.clauses {
                    for item in &clause.body {
                        check_defer_item(item, true, ctx);
                    }
                }
            }
        },
        CodeBlockItem::Expression(expr) => check_defer_expr(expr, nested, ctx),
    }
}

fn check_defer_expr(expr: &Expr<Source>, nested: bool, ctx: &SemaContext) {
    let expr = expr.unwrap_effects();

    match &expr.kind {
        ExprKind::FunctionCall(call) => {
            let callee = call.callee.unwrap_effects();

            if let ExprKind::MemberAccess {
                base: Some(base),
                name,
            } = &callee.kind
            {
                if name == "end"
                    && base.unwrap_effects().declared_name() == Some(lang::SCOPE_VARIABLE)
                {
                    if nested {
                        ctx.diagnostics
                            .error(expr.syntax, SemaErrorKind::DeferScopeEndTopLevel);
                    }
                    return;
                }

                if name == "nested"
                    && base.unwrap_effects().declared_name() == Some(lang::SCOPE_VARIABLE)
                {
                    ctx.diagnostics
                        .error(expr.syntax, SemaErrorKind::DeferOnlyScopeEnd);
                    return;
                }
            }

            if callee.declared_name() == Some(lang::SCOPE_TYPE)
                || callee.declared_name() == Some(lang::WITH_SCOPE)
                || callee
                    .declared_name()
                    .is_some_and(|name| lang::named_wrapper_middle(name).is_some())
            {
                ctx.diagnostics
                    .error(expr.syntax, SemaErrorKind::DeferOnlyScopeEnd);
                return;
            }

            if let ExprKind::MemberAccess {
                base: Some(base),
                name,
            } = &callee.kind
            {
                if name == lang::IMPLICIT_MAP_MEMBER
                    && base.unwrap_effects().declared_name() == Some(lang::IMPLICIT_MAP_BASE)
                {
                    ctx.diagnostics
                        .error(expr.syntax, SemaErrorKind::DeferOnlyScopeEnd);
                    return;
                }
            }

            let passes_scope = call.arguments.iter().any(|argument| {
                argument.value.unwrap_effects().declared_name() == Some(lang::SCOPE_VARIABLE)
            });

            if passes_scope {
                ctx.diagnostics
                    .error(expr.syntax, SemaErrorKind::DeferOnlyScopeEnd);
                return;
            }

            for argument in &call.arguments {
                check_defer_expr(&argument.value, true, ctx);
            }

            if let Some(closure) = &call.trailing_closure {
                for item in &closure.body {
                    check_defer_item(item, true, ctx);
                }
            }
        }
        ExprKind::Closure(closure) => {
            for item in &closure.body {
                check_defer_item(item, true, ctx);
            }
        }
        ExprKind::Other(items) => {
            for item in items {
                check_defer_item(item, true, ctx);
            }
        }
        _ => {}
    }
}
