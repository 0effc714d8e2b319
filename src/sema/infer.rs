//! The slice of type inference binding-level analysis needs: enough to
//! name the type of `let x = …` so implicit keys and member calls on
//! locals resolve. Anything beyond this subset fails soft and the caller
//! decides whether that is worth a diagnostic.

use super::ctx::SemaContext;
use crate::namespace::SymbolNamespace;
use crate::signature::{CallableSignature, ResolvedType};
use crate::source_files::Source;
use crate::symbol_index::Lookup;
use crate::syntax_tree::{Expr, ExprKind, FunctionCall};

pub fn infer_expr_type(expr: &Expr<Source>, ctx: &SemaContext) -> Option<ResolvedType> {
    let expr = expr.unwrap_effects();

    match &expr.kind {
        ExprKind::DeclRef { name, .. } => ctx.lookup(name)?.resolved.clone(),
        ExprKind::FunctionCall(call) => infer_call_type(call, ctx),
        ExprKind::MemberAccess { .. } => None,
        _ => None,
    }
}

fn infer_call_type(call: &FunctionCall<Source>, ctx: &SemaContext) -> Option<ResolvedType> {
    let labels = call.argument_labels();
    let callee = call.callee.unwrap_effects();

    match &callee.kind {
        ExprKind::DeclRef { name, .. } => {
            if starts_uppercase(name) {
                // `Foo(...)` constructs a Foo unless something else with
                // that spelling matches.
                let namespace = SymbolNamespace::single(name.clone());
                if !matches!(
                    ctx.index.find_initializer(&namespace, &labels),
                    Lookup::NotFound
                ) {
                    return Some(ResolvedType {
                        namespace,
                        description: name.clone(),
                        strict_description: name.clone(),
                    });
                }
            }

            let lookup = ctx
                .index
                .find_static_or_free(&SymbolNamespace::root(), name, &labels);
            return_type_of(lookup)
        }
        ExprKind::MemberAccess { base, name } => {
            let namespace = base.as_deref().and_then(|base| base_namespace(base, ctx))?;

            if let Some(resolved) =
                return_type_of(ctx.index.find_member(&namespace, name, &labels))
            {
                return Some(resolved);
            }

            return_type_of(ctx.index.find_static_or_free(&namespace, name, &labels))
        }
        _ => None,
    }
}

/// The namespace member calls on `base` resolve against: `self`, a
/// visible local of known type, or a type spelled directly.
pub fn base_namespace(base: &Expr<Source>, ctx: &SemaContext) -> Option<SymbolNamespace> {
    let base = base.unwrap_effects();

    match &base.kind {
        ExprKind::DeclRef { name, .. } if name == "self" => ctx.self_namespace.clone(),
        ExprKind::DeclRef { name, .. } => {
            if let Some(local) = ctx.lookup(name) {
                return local.resolved.as_ref().map(|resolved| resolved.namespace.clone());
            }

            starts_uppercase(name).then(|| SymbolNamespace::single(name.clone()))
        }
        ExprKind::MemberAccess {
            base: Some(inner),
            name,
        } => {
            let outer = base_namespace(inner, ctx)?;
            starts_uppercase(name).then(|| outer.child(name.clone()))
        }
        _ => None,
    }
}

// The first-found match drives inference; ambiguity only matters to
// consumers that must pick a unique definition.
fn return_type_of(lookup: Lookup) -> Option<ResolvedType> {
    match lookup {
        Lookup::Unique(entry) => return_type(&entry.signature),
        Lookup::Ambiguous(candidates) => candidates
            .first()
            .and_then(|entry| return_type(&entry.signature)),
        Lookup::NotFound => None,
    }
}

fn return_type(signature: &CallableSignature) -> Option<ResolvedType> {
    signature.return_type.as_ref()?.success().cloned()
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
