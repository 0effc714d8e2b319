use super::{Attribute, CodeBlockItem, Expr, MemberItem, Pattern, TypeExpr};
use crate::visibility::Visibility;
use derive_more::IsVariant;

#[derive(Clone, Debug)]
pub enum Decl<S> {
    Type(TypeDecl<S>),
    Protocol(ProtocolDecl<S>),
    Function(FunctionDecl<S>),
    Variable(VariableDecl<S>),
    /// A bare grouping of declarations with no surface syntax of its
    /// own, kept so filtering can splice declaration lists in place.
    MemberBlock(Vec<Decl<S>>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, IsVariant)]
pub enum TypeDeclKind {
    Struct,
    Class,
    Enum,
    Actor,
}

#[derive(Clone, Debug)]
pub struct TypeDecl<S> {
    pub kind: TypeDeclKind,
    pub attributes: Vec<Attribute<S>>,
    pub visibility: Visibility,
    pub is_final: bool,
    pub name: String,
    pub members: Vec<MemberItem<S>>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub struct ProtocolDecl<S> {
    pub attributes: Vec<Attribute<S>>,
    pub visibility: Visibility,
    pub name: String,
    pub members: Vec<Decl<S>>,
    pub syntax: S,
}

/// Whether a member belongs to instances, the type, or (for classes)
/// the dynamic type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, IsVariant)]
pub enum Affiliation {
    #[default]
    Instance,
    Static,
    Class,
}

#[derive(Clone, Debug)]
pub enum FunctionName {
    Initializer { optional: bool },
    Named(String),
}

impl FunctionName {
    pub fn basename(&self) -> &str {
        match self {
            FunctionName::Initializer { .. } => "init",
            FunctionName::Named(name) => name,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FunctionDecl<S> {
    pub attributes: Vec<Attribute<S>>,
    pub visibility: Visibility,
    pub affiliation: Affiliation,
    pub is_final: bool,
    pub is_override: bool,
    pub is_open: bool,
    pub name: FunctionName,
    pub generic_parameters: Vec<String>,
    pub parameters: Vec<FunctionParameter<S>>,
    pub return_type: Option<TypeExpr<S>>,
    /// `None` for protocol requirements and external declarations.
    pub body: Option<Vec<CodeBlockItem<S>>>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub struct FunctionParameter<S> {
    /// Outer argument label; `_` when callers pass the argument bare.
    pub first_name: String,
    /// Inner parameter name when it differs from the label.
    pub second_name: Option<String>,
    pub ty: TypeExpr<S>,
    pub has_default: bool,
    pub syntax: S,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, IsVariant)]
pub enum BindingSpecifier {
    Let,
    Var,
}

#[derive(Clone, Debug)]
pub struct VariableDecl<S> {
    pub attributes: Vec<Attribute<S>>,
    pub visibility: Visibility,
    pub affiliation: Affiliation,
    pub specifier: BindingSpecifier,
    pub bindings: Vec<Binding<S>>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub struct Binding<S> {
    pub pattern: Pattern<S>,
    pub ty: Option<TypeExpr<S>>,
    pub initializer: Option<Expr<S>>,
    pub accessors: Option<AccessorBlock<S>>,
    pub syntax: S,
}

/// A getter body; setters and observers are opaque to the analyzer.
#[derive(Clone, Debug)]
pub struct AccessorBlock<S> {
    pub items: Vec<CodeBlockItem<S>>,
}

impl<S> Decl<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> Decl<T> {
        match self {
            Decl::Type(decl) => Decl::Type(decl.map_syntax(f)),
            Decl::Protocol(decl) => Decl::Protocol(decl.map_syntax(f)),
            Decl::Function(decl) => Decl::Function(decl.map_syntax(f)),
            Decl::Variable(decl) => Decl::Variable(decl.map_syntax(f)),
            Decl::MemberBlock(decls) => Decl::MemberBlock(
                decls.into_iter().map(|decl| decl.map_syntax(f)).collect(),
            ),
        }
    }
}

fn map_attributes<S, T, F: Fn(S) -> T>(attributes: Vec<Attribute<S>>, f: &F) -> Vec<Attribute<T>> {
    attributes
        .into_iter()
        .map(|attribute| attribute.map_syntax(f))
        .collect()
}

impl<S> TypeDecl<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> TypeDecl<T> {
        TypeDecl {
            kind: self.kind,
            attributes: map_attributes(self.attributes, f),
            visibility: self.visibility,
            is_final: self.is_final,
            name: self.name,
            members: self
                .members
                .into_iter()
                .map(|member| member.map_syntax(f))
                .collect(),
            syntax: f(self.syntax),
        }
    }
}

impl<S> ProtocolDecl<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> ProtocolDecl<T> {
        ProtocolDecl {
            attributes: map_attributes(self.attributes, f),
            visibility: self.visibility,
            name: self.name,
            members: self
                .members
                .into_iter()
                .map(|member| member.map_syntax(f))
                .collect(),
            syntax: f(self.syntax),
        }
    }
}

impl<S> FunctionDecl<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> FunctionDecl<T> {
        FunctionDecl {
            attributes: map_attributes(self.attributes, f),
            visibility: self.visibility,
            affiliation: self.affiliation,
            is_final: self.is_final,
            is_override: self.is_override,
            is_open: self.is_open,
            name: self.name,
            generic_parameters: self.generic_parameters,
            parameters: self
                .parameters
                .into_iter()
                .map(|parameter| FunctionParameter {
                    first_name: parameter.first_name,
                    second_name: parameter.second_name,
                    ty: parameter.ty.map_syntax(f),
                    has_default: parameter.has_default,
                    syntax: f(parameter.syntax),
                })
                .collect(),
            return_type: self.return_type.map(|ty| ty.map_syntax(f)),
            body: self.body.map(|body| {
                body.into_iter().map(|item| item.map_syntax(f)).collect()
            }),
            syntax: f(self.syntax),
        }
    }
}

impl<S> VariableDecl<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> VariableDecl<T> {
        VariableDecl {
            attributes: map_attributes(self.attributes, f),
            visibility: self.visibility,
            affiliation: self.affiliation,
            specifier: self.specifier,
            bindings: self
                .bindings
                .into_iter()
                .map(|binding| Binding {
                    pattern: binding.pattern.map_syntax(f),
                    ty: binding.ty.map(|ty| ty.map_syntax(f)),
                    initializer: binding.initializer.map(|expr| expr.map_syntax(f)),
                    accessors: binding.accessors.map(|accessors| AccessorBlock {
                        items: accessors
                            .items
                            .into_iter()
                            .map(|item| item.map_syntax(f))
                            .collect(),
                    }),
                    syntax: f(binding.syntax),
                })
                .collect(),
            syntax: f(self.syntax),
        }
    }
}
