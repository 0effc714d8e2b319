mod attribute;
mod condition;
mod decl;
mod expr;
mod pattern;
mod stmt;
mod ty;

pub use attribute::{Attribute, AttributeArgument};
pub use condition::{ConditionExpr, ConditionExprKind};
pub use decl::*;
pub use expr::*;
pub use pattern::{Pattern, PatternKind};
pub use stmt::*;
pub use ty::*;

/// One source file after lowering from the host tree, generic over the
/// syntax handle attached to every node. `S` is a
/// [`crate::source_files::Source`] during analysis; `map_syntax` relabels
/// all handles at once when a tree leaves its module.
#[derive(Clone, Debug)]
pub struct SyntaxTree<S> {
    pub items: Vec<Item<S>>,
}

impl<S> SyntaxTree<S> {
    pub fn new(items: Vec<Item<S>>) -> Self {
        Self { items }
    }

    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> SyntaxTree<T> {
        SyntaxTree {
            items: self.items.into_iter().map(|item| item.map_syntax(f)).collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Item<S> {
    Import(Import<S>),
    Declaration(Decl<S>),
    Extension(Extension<S>),
    IfConfig(IfConfig<S, Item<S>>),
}

impl<S> Item<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> Item<T> {
        match self {
            Item::Import(import) => Item::Import(import.map_syntax(f)),
            Item::Declaration(decl) => Item::Declaration(decl.map_syntax(f)),
            Item::Extension(extension) => Item::Extension(extension.map_syntax(f)),
            Item::IfConfig(if_config) => Item::IfConfig(if_config.map_syntax(f, &Item::map_syntax)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Import<S> {
    pub attributes: Vec<Attribute<S>>,
    pub visibility: crate::visibility::Visibility,
    /// Dotted module path, outer first.
    pub module: Vec<String>,
    pub syntax: S,
}

impl<S> Import<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> Import<T> {
        Import {
            attributes: self
                .attributes
                .into_iter()
                .map(|attribute| attribute.map_syntax(f))
                .collect(),
            visibility: self.visibility,
            module: self.module,
            syntax: f(self.syntax),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Extension<S> {
    pub attributes: Vec<Attribute<S>>,
    pub visibility: crate::visibility::Visibility,
    pub extended_type: TypeExpr<S>,
    pub members: Vec<MemberItem<S>>,
    pub syntax: S,
}

impl<S> Extension<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> Extension<T> {
        Extension {
            attributes: self
                .attributes
                .into_iter()
                .map(|attribute| attribute.map_syntax(f))
                .collect(),
            visibility: self.visibility,
            extended_type: self.extended_type.map_syntax(f),
            members: self
                .members
                .into_iter()
                .map(|member| member.map_syntax(f))
                .collect(),
            syntax: f(self.syntax),
        }
    }
}

/// Member position inside a type or extension body.
#[derive(Clone, Debug)]
pub enum MemberItem<S> {
    Declaration(Decl<S>),
    IfConfig(IfConfig<S, MemberItem<S>>),
}

impl<S> MemberItem<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> MemberItem<T> {
        match self {
            MemberItem::Declaration(decl) => MemberItem::Declaration(decl.map_syntax(f)),
            MemberItem::IfConfig(if_config) => {
                MemberItem::IfConfig(if_config.map_syntax(f, &MemberItem::map_syntax))
            }
        }
    }
}

/// An `#if` chain after conditional-compilation filtering. Clauses that
/// evaluated to false are gone; a clause that evaluated true carries
/// `resolution: Some(true)` and its body is live; clauses whose condition
/// could not be decided keep `resolution: None` and flow to sema as
/// unresolved blocks.
#[derive(Clone, Debug)]
pub struct IfConfig<S, Body> {
    pub clauses: Vec<IfConfigClause<S, Body>>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub struct IfConfigClause<S, Body> {
    /// `None` for a bare `#else`.
    pub condition: Option<ConditionExpr<S>>,
    pub resolution: Option<bool>,
    pub body: Vec<Body>,
}

impl<S, Body> IfConfig<S, Body> {
    pub fn map_syntax<T, NewBody, F: Fn(S) -> T>(
        self,
        f: &F,
        map_body: &impl Fn(Body, &F) -> NewBody,
    ) -> IfConfig<T, NewBody> {
        IfConfig {
            clauses: self
                .clauses
                .into_iter()
                .map(|clause| IfConfigClause {
                    condition: clause.condition.map(|condition| condition.map_syntax(f)),
                    resolution: clause.resolution,
                    body: clause
                        .body
                        .into_iter()
                        .map(|body| map_body(body, f))
                        .collect(),
                })
                .collect(),
            syntax: f(self.syntax),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_syntax_relabels_every_handle() {
        let tree: SyntaxTree<u32> = SyntaxTree::new(vec![Item::Declaration(Decl::Variable(
            VariableDecl {
                attributes: vec![Attribute::plain("Implicit", 1)],
                visibility: Default::default(),
                affiliation: Default::default(),
                specifier: BindingSpecifier::Var,
                bindings: vec![Binding {
                    pattern: PatternKind::Identifier("v".into()).at(2),
                    ty: Some(TypeExprKind::Identifier("UInt8".into()).at(3)),
                    initializer: None,
                    accessors: None,
                    syntax: 4,
                }],
                syntax: 5,
            },
        ))]);

        let mapped = tree.map_syntax(&|handle: u32| handle * 10);

        let Item::Declaration(Decl::Variable(variable)) = &mapped.items[0] else {
            panic!("shape changed under map_syntax");
        };

        assert_eq!(variable.syntax, 50);
        assert_eq!(variable.attributes[0].syntax, 10);
        assert_eq!(variable.bindings[0].syntax, 40);
        assert_eq!(variable.bindings[0].pattern.syntax, 20);
        assert_eq!(variable.bindings[0].ty.as_ref().unwrap().syntax, 30);
    }
}
