use crate::namespace::SymbolNamespace;
use crate::serialize::Failable;
use crate::signature::ResolvedType;
use crate::syntax_tree::{SomeOrAnyKeyword, ThrowsKind, TypeExpr, TypeExprKind};
use itertools::Itertools;

/// User-facing spelling with sugar preserved: `[Int]`, `Int?`,
/// `(A, B) async -> C`. Implicit type keys are named with this form.
pub fn canonical<S>(ty: &TypeExpr<S>) -> String {
    match &ty.kind {
        TypeExprKind::Identifier(name) => name.clone(),
        TypeExprKind::Generic { base, arguments } => format!(
            "{}<{}>",
            base,
            arguments.iter().map(canonical).join(", ")
        ),
        TypeExprKind::Optional(inner) => format!("{}?", canonical(inner)),
        TypeExprKind::UnwrappedOptional(inner) => format!("{}!", canonical(inner)),
        TypeExprKind::Tuple(elements) => {
            format!("({})", elements.iter().map(canonical).join(", "))
        }
        TypeExprKind::Member {
            base,
            name,
            arguments,
        } => {
            if arguments.is_empty() {
                format!("{}.{}", canonical(base), name)
            } else {
                format!(
                    "{}.{}<{}>",
                    canonical(base),
                    name,
                    arguments.iter().map(canonical).join(", ")
                )
            }
        }
        TypeExprKind::Array(element) => format!("[{}]", canonical(element)),
        TypeExprKind::Dictionary { key, value } => {
            format!("[{}: {}]", canonical(key), canonical(value))
        }
        TypeExprKind::Attributed { base, .. } => canonical(base),
        TypeExprKind::ClassRestriction => "AnyObject".to_string(),
        TypeExprKind::Composition(parts) => parts.iter().map(canonical).join(" & "),
        TypeExprKind::Function(function) => {
            let mut effects = String::new();
            if function.effects.is_async {
                effects.push_str(" async");
            }
            if let Some(throws) = &function.effects.throws {
                match throws.kind {
                    ThrowsKind::Throws => effects.push_str(" throws"),
                    ThrowsKind::Rethrows => effects.push_str(" rethrows"),
                }
                if let Some(ty) = &throws.ty {
                    effects.push_str(&format!("({})", canonical(ty)));
                }
            }
            format!(
                "({}){} -> {}",
                function.parameters.iter().map(canonical).join(", "),
                effects,
                canonical(&function.result)
            )
        }
        TypeExprKind::Metatype { base, is_protocol } => format!(
            "{}.{}",
            canonical(base),
            if *is_protocol { "Protocol" } else { "Type" }
        ),
        TypeExprKind::NamedOpaqueReturn(inner) => canonical(inner),
        TypeExprKind::PackElement(inner) => format!("each {}", canonical(inner)),
        TypeExprKind::PackExpansion(inner) => format!("repeat {}", canonical(inner)),
        TypeExprKind::SomeOrAny { keyword, base } => format!(
            "{} {}",
            match keyword {
                SomeOrAnyKeyword::Some => "some",
                SomeOrAnyKeyword::Any => "any",
            },
            canonical(base)
        ),
        TypeExprKind::Suppressed(inner) => format!("~{}", canonical(inner)),
        TypeExprKind::Missing => "<missing>".to_string(),
    }
}

/// Desugared spelling: `Array<Int>`, `Optional<Int>`. Total: subtrees
/// that cannot be rendered faithfully yield a placeholder and a message
/// in `problems` instead of aborting the render.
pub struct StrictRendering {
    pub text: String,
    pub problems: Vec<String>,
}

pub fn strict<S>(ty: &TypeExpr<S>) -> StrictRendering {
    let mut problems = Vec::new();
    let text = strict_inner(ty, &mut problems);
    StrictRendering { text, problems }
}

fn strict_inner<S>(ty: &TypeExpr<S>, problems: &mut Vec<String>) -> String {
    match &ty.kind {
        TypeExprKind::Identifier(name) => name.clone(),
        TypeExprKind::Generic { base, arguments } => format!(
            "{}<{}>",
            base,
            arguments
                .iter()
                .map(|argument| strict_inner(argument, problems))
                .join(", ")
        ),
        TypeExprKind::Optional(inner) | TypeExprKind::UnwrappedOptional(inner) => {
            format!("Optional<{}>", strict_inner(inner, problems))
        }
        TypeExprKind::Tuple(elements) => format!(
            "({})",
            elements
                .iter()
                .map(|element| strict_inner(element, problems))
                .join(", ")
        ),
        TypeExprKind::Member {
            base,
            name,
            arguments,
        } => {
            if arguments.is_empty() {
                format!("{}.{}", strict_inner(base, problems), name)
            } else {
                format!(
                    "{}.{}<{}>",
                    strict_inner(base, problems),
                    name,
                    arguments
                        .iter()
                        .map(|argument| strict_inner(argument, problems))
                        .join(", ")
                )
            }
        }
        TypeExprKind::Array(element) => format!("Array<{}>", strict_inner(element, problems)),
        TypeExprKind::Dictionary { key, value } => format!(
            "Dictionary<{}, {}>",
            strict_inner(key, problems),
            strict_inner(value, problems)
        ),
        TypeExprKind::Attributed { attributes, base } => {
            let rendered = attributes
                .iter()
                .map(|attribute| format!("@{}", attribute.name))
                .join(" ");
            format!("{} {}", rendered, strict_inner(base, problems))
        }
        TypeExprKind::ClassRestriction => "AnyObject".to_string(),
        TypeExprKind::Composition(parts) => parts
            .iter()
            .map(|part| strict_inner(part, problems))
            .join(" & "),
        TypeExprKind::Function(function) => {
            let mut effects = String::new();
            if function.effects.is_async {
                effects.push_str(" async");
            }
            if let Some(throws) = &function.effects.throws {
                match throws.kind {
                    ThrowsKind::Throws => effects.push_str(" throws"),
                    ThrowsKind::Rethrows => effects.push_str(" rethrows"),
                }
                if let Some(ty) = &throws.ty {
                    effects.push_str(&format!("({})", strict_inner(ty, problems)));
                }
            }
            format!(
                "({}){} -> {}",
                function
                    .parameters
                    .iter()
                    .map(|parameter| strict_inner(parameter, problems))
                    .join(", "),
                effects,
                strict_inner(&function.result, problems)
            )
        }
        TypeExprKind::Metatype { base, is_protocol } => format!(
            "{}.{}",
            strict_inner(base, problems),
            if *is_protocol { "Protocol" } else { "Type" }
        ),
        TypeExprKind::NamedOpaqueReturn(inner) => strict_inner(inner, problems),
        TypeExprKind::PackElement(inner) => format!("each {}", strict_inner(inner, problems)),
        TypeExprKind::PackExpansion(inner) => format!("repeat {}", strict_inner(inner, problems)),
        TypeExprKind::SomeOrAny { keyword, base } => format!(
            "{} {}",
            match keyword {
                SomeOrAnyKeyword::Some => "some",
                SomeOrAnyKeyword::Any => "any",
            },
            strict_inner(base, problems)
        ),
        TypeExprKind::Suppressed(inner) => format!("~{}", strict_inner(inner, problems)),
        TypeExprKind::Missing => {
            problems.push("Unable to render missing type".to_string());
            "<missing>".to_string()
        }
    }
}

/// Namespace for member lookup on a value of this type; root when the
/// type has no nominal path to look members up under.
pub fn member_namespace<S>(ty: &TypeExpr<S>) -> SymbolNamespace {
    fn collect<S>(ty: &TypeExpr<S>, segments: &mut Vec<String>) -> bool {
        match &ty.kind {
            TypeExprKind::Identifier(name) => {
                segments.push(name.clone());
                true
            }
            TypeExprKind::Generic { base, .. } => {
                segments.push(base.clone());
                true
            }
            TypeExprKind::Member { base, name, .. } => {
                if !collect(base, segments) {
                    return false;
                }
                segments.push(name.clone());
                true
            }
            TypeExprKind::Attributed { base, .. }
            | TypeExprKind::NamedOpaqueReturn(base)
            | TypeExprKind::SomeOrAny { base, .. } => collect(base, segments),
            _ => false,
        }
    }

    let mut segments = Vec::new();
    if collect(ty, &mut segments) {
        SymbolNamespace::new(segments)
    } else {
        SymbolNamespace::root()
    }
}

pub fn resolve<S>(ty: &TypeExpr<S>) -> Failable<ResolvedType> {
    let rendering = strict(ty);

    if !rendering.problems.is_empty() {
        return Failable::Failure(rendering.problems);
    }

    Failable::Success(ResolvedType {
        namespace: member_namespace(ty),
        description: canonical(ty),
        strict_description: rendering.text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax_tree::{FunctionType, TypeEffects};

    fn ty(kind: TypeExprKind<()>) -> TypeExpr<()> {
        kind.at(())
    }

    fn ident(name: &str) -> TypeExpr<()> {
        ty(TypeExprKind::Identifier(name.into()))
    }

    #[test]
    fn sugar_is_preserved_canonically_and_desugared_strictly() {
        let array = ty(TypeExprKind::Array(Box::new(ident("Int"))));
        assert_eq!(canonical(&array), "[Int]");
        assert_eq!(strict(&array).text, "Array<Int>");

        let optional = ty(TypeExprKind::Optional(Box::new(ident("UInt8"))));
        assert_eq!(canonical(&optional), "UInt8?");
        assert_eq!(strict(&optional).text, "Optional<UInt8>");

        let dictionary = ty(TypeExprKind::Dictionary {
            key: Box::new(ident("String")),
            value: Box::new(array.clone()),
        });
        assert_eq!(canonical(&dictionary), "[String: [Int]]");
        assert_eq!(strict(&dictionary).text, "Dictionary<String, Array<Int>>");
    }

    #[test]
    fn function_types_render_their_effects() {
        let function = ty(TypeExprKind::Function(FunctionType {
            parameters: vec![ident("A"), ident("B")],
            effects: TypeEffects {
                is_async: true,
                throws: None,
            },
            result: Box::new(ident("C")),
        }));

        assert_eq!(canonical(&function), "(A, B) async -> C");
    }

    #[test]
    fn missing_types_render_totally_with_a_problem() {
        let missing = ty(TypeExprKind::Missing);
        let rendering = strict(&missing);

        assert_eq!(rendering.text, "<missing>");
        assert_eq!(rendering.problems.len(), 1);
        assert!(matches!(resolve(&missing), Failable::Failure(_)));
    }

    #[test]
    fn member_namespaces_follow_the_nominal_path() {
        let member = ty(TypeExprKind::Member {
            base: Box::new(ident("Foo")),
            name: "Bar".into(),
            arguments: Vec::new(),
        });

        assert_eq!(
            member_namespace(&member),
            SymbolNamespace::new(vec!["Foo".into(), "Bar".into()])
        );
        assert_eq!(member_namespace(&ty(TypeExprKind::Missing)), SymbolNamespace::root());
    }
}
