use super::Attribute;

#[derive(Clone, Debug)]
pub struct TypeExpr<S> {
    pub kind: TypeExprKind<S>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub enum TypeExprKind<S> {
    Identifier(String),
    Generic {
        base: String,
        arguments: Vec<TypeExpr<S>>,
    },
    Optional(Box<TypeExpr<S>>),
    UnwrappedOptional(Box<TypeExpr<S>>),
    Tuple(Vec<TypeExpr<S>>),
    Member {
        base: Box<TypeExpr<S>>,
        name: String,
        arguments: Vec<TypeExpr<S>>,
    },
    Array(Box<TypeExpr<S>>),
    Dictionary {
        key: Box<TypeExpr<S>>,
        value: Box<TypeExpr<S>>,
    },
    Attributed {
        attributes: Vec<Attribute<S>>,
        base: Box<TypeExpr<S>>,
    },
    ClassRestriction,
    Composition(Vec<TypeExpr<S>>),
    Function(FunctionType<S>),
    Metatype {
        base: Box<TypeExpr<S>>,
        is_protocol: bool,
    },
    NamedOpaqueReturn(Box<TypeExpr<S>>),
    PackElement(Box<TypeExpr<S>>),
    PackExpansion(Box<TypeExpr<S>>),
    SomeOrAny {
        keyword: SomeOrAnyKeyword,
        base: Box<TypeExpr<S>>,
    },
    Suppressed(Box<TypeExpr<S>>),
    Missing,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SomeOrAnyKeyword {
    Some,
    Any,
}

#[derive(Clone, Debug)]
pub struct FunctionType<S> {
    pub parameters: Vec<TypeExpr<S>>,
    pub effects: TypeEffects<S>,
    pub result: Box<TypeExpr<S>>,
}

#[derive(Clone, Debug)]
pub struct TypeEffects<S> {
    pub is_async: bool,
    pub throws: Option<ThrowsClause<S>>,
}

impl<S> Default for TypeEffects<S> {
    fn default() -> Self {
        Self {
            is_async: false,
            throws: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ThrowsClause<S> {
    pub kind: ThrowsKind,
    pub ty: Option<Box<TypeExpr<S>>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ThrowsKind {
    Throws,
    Rethrows,
}

impl<S> TypeExprKind<S> {
    pub fn at(self, syntax: S) -> TypeExpr<S> {
        TypeExpr { kind: self, syntax }
    }
}

impl<S> TypeExpr<S> {
    /// The plain identifier this type is spelled as, if it is one.
    pub fn plain_identifier(&self) -> Option<&str> {
        match &self.kind {
            TypeExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> TypeExpr<T> {
        let map_all = |types: Vec<TypeExpr<S>>, f: &F| -> Vec<TypeExpr<T>> {
            types.into_iter().map(|ty| ty.map_syntax(f)).collect()
        };

        TypeExpr {
            kind: match self.kind {
                TypeExprKind::Identifier(name) => TypeExprKind::Identifier(name),
                TypeExprKind::Generic { base, arguments } => TypeExprKind::Generic {
                    base,
                    arguments: map_all(arguments, f),
                },
                TypeExprKind::Optional(inner) => {
                    TypeExprKind::Optional(Box::new(inner.map_syntax(f)))
                }
                TypeExprKind::UnwrappedOptional(inner) => {
                    TypeExprKind::UnwrappedOptional(Box::new(inner.map_syntax(f)))
                }
                TypeExprKind::Tuple(elements) => TypeExprKind::Tuple(map_all(elements, f)),
                TypeExprKind::Member {
                    base,
                    name,
                    arguments,
                } => TypeExprKind::Member {
                    base: Box::new(base.map_syntax(f)),
                    name,
                    arguments: map_all(arguments, f),
                },
                TypeExprKind::Array(element) => {
                    TypeExprKind::Array(Box::new(element.map_syntax(f)))
                }
                TypeExprKind::Dictionary { key, value } => TypeExprKind::Dictionary {
                    key: Box::new(key.map_syntax(f)),
                    value: Box::new(value.map_syntax(f)),
                },
                TypeExprKind::Attributed { attributes, base } => TypeExprKind::Attributed {
                    attributes: attributes
                        .into_iter()
                        .map(|attribute| attribute.map_syntax(f))
                        .collect(),
                    base: Box::new(base.map_syntax(f)),
                },
                TypeExprKind::ClassRestriction => TypeExprKind::ClassRestriction,
                TypeExprKind::Composition(parts) => TypeExprKind::Composition(map_all(parts, f)),
                TypeExprKind::Function(function) => TypeExprKind::Function(FunctionType {
                    parameters: map_all(function.parameters, f),
                    effects: TypeEffects {
                        is_async: function.effects.is_async,
                        throws: function.effects.throws.map(|throws| ThrowsClause {
                            kind: throws.kind,
                            ty: throws.ty.map(|ty| Box::new(ty.map_syntax(f))),
                        }),
                    },
                    result: Box::new(function.result.map_syntax(f)),
                }),
                TypeExprKind::Metatype { base, is_protocol } => TypeExprKind::Metatype {
                    base: Box::new(base.map_syntax(f)),
                    is_protocol,
                },
                TypeExprKind::NamedOpaqueReturn(inner) => {
                    TypeExprKind::NamedOpaqueReturn(Box::new(inner.map_syntax(f)))
                }
                TypeExprKind::PackElement(inner) => {
                    TypeExprKind::PackElement(Box::new(inner.map_syntax(f)))
                }
                TypeExprKind::PackExpansion(inner) => {
                    TypeExprKind::PackExpansion(Box::new(inner.map_syntax(f)))
                }
                TypeExprKind::SomeOrAny { keyword, base } => TypeExprKind::SomeOrAny {
                    keyword,
                    base: Box::new(base.map_syntax(f)),
                },
                TypeExprKind::Suppressed(inner) => {
                    TypeExprKind::Suppressed(Box::new(inner.map_syntax(f)))
                }
                TypeExprKind::Missing => TypeExprKind::Missing,
            },
            syntax: f(self.syntax),
        }
    }
}
