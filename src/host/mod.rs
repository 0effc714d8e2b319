//! The host-language syntax tree the analyzer consumes. The actual
//! parser lives outside the core; this module is the shape it hands
//! over. Every node carries the [`Source`] it was parsed at.

use crate::source_files::Source;

#[derive(Clone, Debug)]
pub struct HostFile {
    pub items: Vec<HostItem>,
}

#[derive(Clone, Debug)]
pub enum HostItem {
    Import(HostImport),
    Type(HostTypeDecl),
    Protocol(HostProtocolDecl),
    Function(HostFuncDecl),
    Variable(HostVarDecl),
    Extension(HostExtensionDecl),
    IfConfig(HostIfConfig<HostItem>),
}

#[derive(Clone, Debug)]
pub struct HostImport {
    pub attributes: Vec<HostAttribute>,
    pub modifiers: Vec<HostModifier>,
    pub module: Vec<String>,
    pub source: Source,
}

/// Raw declaration modifier as written (`public`, `static`, `final`,
/// `override`, `open`, `class`, …). Interpreting these is the syntax
/// builder's job.
#[derive(Clone, Debug)]
pub struct HostModifier {
    pub keyword: String,
    pub source: Source,
}

impl HostModifier {
    pub fn new(keyword: impl Into<String>, source: Source) -> Self {
        Self {
            keyword: keyword.into(),
            source,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HostAttribute {
    pub name: String,
    pub argument: Option<HostAttributeArgument>,
    pub source: Source,
}

#[derive(Clone, Debug)]
pub struct HostAttributeArgument {
    pub label: Option<String>,
    pub value: HostExpr,
}

impl HostAttribute {
    pub fn plain(name: impl Into<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            argument: None,
            source,
        }
    }

    pub fn with_argument(name: impl Into<String>, value: HostExpr, source: Source) -> Self {
        Self {
            name: name.into(),
            argument: Some(HostAttributeArgument { label: None, value }),
            source,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HostTypeDeclKeyword {
    Struct,
    Class,
    Enum,
    Actor,
}

#[derive(Clone, Debug)]
pub struct HostTypeDecl {
    pub keyword: HostTypeDeclKeyword,
    pub attributes: Vec<HostAttribute>,
    pub modifiers: Vec<HostModifier>,
    pub name: String,
    pub members: Vec<HostItem>,
    pub source: Source,
}

#[derive(Clone, Debug)]
pub struct HostProtocolDecl {
    pub attributes: Vec<HostAttribute>,
    pub modifiers: Vec<HostModifier>,
    pub name: String,
    pub members: Vec<HostItem>,
    pub source: Source,
}

#[derive(Clone, Debug)]
pub struct HostExtensionDecl {
    pub attributes: Vec<HostAttribute>,
    pub modifiers: Vec<HostModifier>,
    pub extended_type: HostType,
    pub members: Vec<HostItem>,
    pub source: Source,
}

#[derive(Clone, Debug)]
pub struct HostFuncDecl {
    pub attributes: Vec<HostAttribute>,
    pub modifiers: Vec<HostModifier>,
    /// `init` declarations use [`HostFuncName::Initializer`].
    pub name: HostFuncName,
    pub generic_parameters: Vec<String>,
    pub parameters: Vec<HostParameter>,
    pub return_type: Option<HostType>,
    pub body: Option<Vec<HostCodeItem>>,
    pub source: Source,
}

#[derive(Clone, Debug)]
pub enum HostFuncName {
    Initializer { optional: bool },
    Named(String),
}

#[derive(Clone, Debug)]
pub struct HostParameter {
    pub first_name: String,
    pub second_name: Option<String>,
    pub ty: HostType,
    pub has_default: bool,
    pub source: Source,
}

impl HostParameter {
    pub fn new(first_name: impl Into<String>, ty: HostType, source: Source) -> Self {
        Self {
            first_name: first_name.into(),
            second_name: None,
            ty,
            has_default: false,
            source,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HostBindingSpecifier {
    Let,
    Var,
}

#[derive(Clone, Debug)]
pub struct HostVarDecl {
    pub attributes: Vec<HostAttribute>,
    pub modifiers: Vec<HostModifier>,
    pub specifier: HostBindingSpecifier,
    pub bindings: Vec<HostBinding>,
    pub source: Source,
}

#[derive(Clone, Debug)]
pub struct HostBinding {
    pub pattern: HostPattern,
    pub ty: Option<HostType>,
    pub initializer: Option<HostExpr>,
    pub accessors: Option<Vec<HostCodeItem>>,
    pub source: Source,
}

#[derive(Clone, Debug)]
pub enum HostPattern {
    Wildcard(Source),
    Identifier(String, Source),
    Tuple(Vec<HostPattern>, Source),
    Unsupported(Source),
}

#[derive(Clone, Debug)]
pub struct HostIfConfig<Body> {
    pub clauses: Vec<HostIfConfigClause<Body>>,
    pub source: Source,
}

#[derive(Clone, Debug)]
pub struct HostIfConfigClause<Body> {
    /// `None` for `#else`.
    pub condition: Option<HostConditionExpr>,
    pub body: Vec<Body>,
}

#[derive(Clone, Debug)]
pub enum HostConditionExpr {
    Boolean(bool, Source),
    Identifier(String, Source),
    Call {
        name: String,
        arguments: Vec<HostConditionExpr>,
        source: Source,
    },
    Not(Box<HostConditionExpr>, Source),
    And(Box<HostConditionExpr>, Box<HostConditionExpr>, Source),
    Or(Box<HostConditionExpr>, Box<HostConditionExpr>, Source),
    Parenthesized(Box<HostConditionExpr>, Source),
    Unsupported(Source),
}

impl HostConditionExpr {
    pub fn source(&self) -> Source {
        match self {
            HostConditionExpr::Boolean(_, source)
            | HostConditionExpr::Identifier(_, source)
            | HostConditionExpr::Call { source, .. }
            | HostConditionExpr::Not(_, source)
            | HostConditionExpr::And(_, _, source)
            | HostConditionExpr::Or(_, _, source)
            | HostConditionExpr::Parenthesized(_, source)
            | HostConditionExpr::Unsupported(source) => *source,
        }
    }
}

#[derive(Clone, Debug)]
pub enum HostCodeItem {
    Declaration(Box<HostItem>),
    Statement(HostStmt),
    Expression(HostExpr),
}

#[derive(Clone, Debug)]
pub enum HostStmt {
    Defer {
        body: Vec<HostCodeItem>,
        source: Source,
    },
    Do {
        body: Vec<HostCodeItem>,
        catches: Vec<Vec<HostCodeItem>>,
        source: Source,
    },
    Return {
        value: Option<HostExpr>,
        source: Source,
    },
    If {
        /// Condition expressions are opaque; only the branch bodies are
        /// walked.
        branches: Vec<Vec<HostCodeItem>>,
        source: Source,
    },
    Guard {
        body: Vec<HostCodeItem>,
        source: Source,
    },
    IfConfig(HostIfConfig<HostCodeItem>),
    Other {
        nested: Vec<HostCodeItem>,
        source: Source,
    },
}

#[derive(Clone, Debug)]
pub enum HostExpr {
    Call(HostCall),
    Closure(HostClosure),
    Member {
        base: Option<Box<HostExpr>>,
        name: String,
        source: Source,
    },
    Ref {
        name: String,
        arg_labels: Option<Vec<String>>,
        source: Source,
    },
    KeyPath {
        components: Vec<String>,
        source: Source,
    },
    Macro {
        name: String,
        source: Source,
    },
    Try(Box<HostExpr>, Source),
    Await(Box<HostExpr>, Source),
    /// Literals, operators, and anything else the analyzer only walks
    /// through for nested closures.
    Other {
        nested: Vec<HostExpr>,
        source: Source,
    },
}

#[derive(Clone, Debug)]
pub struct HostCall {
    pub callee: Box<HostExpr>,
    pub arguments: Vec<HostCallArgument>,
    pub trailing_closure: Option<Box<HostClosure>>,
    pub source: Source,
}

#[derive(Clone, Debug)]
pub struct HostCallArgument {
    pub label: Option<String>,
    pub value: HostExpr,
}

#[derive(Clone, Debug)]
pub struct HostClosure {
    pub captures: Vec<HostClosureCapture>,
    pub parameters: Vec<String>,
    pub body: Vec<HostCodeItem>,
    pub source: Source,
}

#[derive(Clone, Debug)]
pub struct HostClosureCapture {
    pub name: String,
    pub source: Source,
}

impl HostExpr {
    pub fn source(&self) -> Source {
        match self {
            HostExpr::Call(call) => call.source,
            HostExpr::Closure(closure) => closure.source,
            HostExpr::Member { source, .. }
            | HostExpr::Ref { source, .. }
            | HostExpr::KeyPath { source, .. }
            | HostExpr::Macro { source, .. }
            | HostExpr::Try(_, source)
            | HostExpr::Await(_, source)
            | HostExpr::Other { source, .. } => *source,
        }
    }

    pub fn reference(name: impl Into<String>, source: Source) -> Self {
        HostExpr::Ref {
            name: name.into(),
            arg_labels: None,
            source,
        }
    }

    pub fn member(base: HostExpr, name: impl Into<String>, source: Source) -> Self {
        HostExpr::Member {
            base: Some(Box::new(base)),
            name: name.into(),
            source,
        }
    }
}

#[derive(Clone, Debug)]
pub enum HostType {
    Simple {
        name: String,
        generic_arguments: Vec<HostType>,
        source: Source,
    },
    Member {
        base: Box<HostType>,
        name: String,
        generic_arguments: Vec<HostType>,
        source: Source,
    },
    Optional(Box<HostType>, Source),
    ImplicitlyUnwrappedOptional(Box<HostType>, Source),
    Tuple(Vec<HostType>, Source),
    Array(Box<HostType>, Source),
    Dictionary {
        key: Box<HostType>,
        value: Box<HostType>,
        source: Source,
    },
    Function {
        parameters: Vec<HostType>,
        is_async: bool,
        throws: Option<HostThrowsClause>,
        result: Box<HostType>,
        source: Source,
    },
    Metatype {
        base: Box<HostType>,
        is_protocol: bool,
        source: Source,
    },
    Attributed {
        attributes: Vec<HostAttribute>,
        base: Box<HostType>,
        source: Source,
    },
    ClassRestriction(Source),
    Composition(Vec<HostType>, Source),
    SomeOrAny {
        keyword: String,
        base: Box<HostType>,
        source: Source,
    },
    Suppressed(Box<HostType>, Source),
    PackElement(Box<HostType>, Source),
    PackExpansion(Box<HostType>, Source),
    Unknown(Source),
}

impl HostType {
    pub fn simple(name: impl Into<String>, source: Source) -> Self {
        HostType::Simple {
            name: name.into(),
            generic_arguments: Vec::new(),
            source,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            HostType::Simple { source, .. }
            | HostType::Member { source, .. }
            | HostType::Optional(_, source)
            | HostType::ImplicitlyUnwrappedOptional(_, source)
            | HostType::Tuple(_, source)
            | HostType::Array(_, source)
            | HostType::Dictionary { source, .. }
            | HostType::Function { source, .. }
            | HostType::Metatype { source, .. }
            | HostType::Attributed { source, .. }
            | HostType::ClassRestriction(source)
            | HostType::Composition(_, source)
            | HostType::SomeOrAny { source, .. }
            | HostType::Suppressed(_, source)
            | HostType::PackElement(_, source)
            | HostType::PackExpansion(_, source)
            | HostType::Unknown(source) => *source,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HostThrowsClause {
    pub rethrows: bool,
    pub ty: Option<Box<HostType>>,
}
