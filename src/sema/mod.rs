//! The minimal semantic tree the requirements graph is built from. Only
//! implicit-relevant constructs survive lowering; everything else in a
//! function body collapses into inner blocks or disappears.

mod build;
mod ctx;
mod error;
mod infer;

pub use build::build_sema_file;
pub use ctx::SemaContext;
pub use error::SemaErrorKind;

use crate::implicit_key::ImplicitKey;
use crate::namespace::SymbolNamespace;
use crate::signature::CallableSignature;
use crate::syntax_tree::TypeDeclKind;
use crate::visibility::Visibility;
use derive_more::IsVariant;

#[derive(Clone, Debug)]
pub struct SemaFile<S> {
    pub top_level: Vec<TopLevel<S>>,
}

#[derive(Clone, Debug)]
pub enum TopLevel<S> {
    Type(SemaTypeDecl<S>),
    Extension(SemaExtension<S>),
    Function(SemaFunction<S>),
    Keys(SemaKeysDecl<S>),
}

#[derive(Clone, Debug)]
pub struct SemaTypeDecl<S> {
    pub kind: TypeDeclKind,
    pub namespace: SymbolNamespace,
    pub name: String,
    pub is_final: bool,
    pub members: Vec<SemaMember<S>>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub struct SemaExtension<S> {
    /// `None` when the extended type has no nominal path.
    pub namespace: Option<SymbolNamespace>,
    pub members: Vec<SemaMember<S>>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub enum SemaMember<S> {
    Type(SemaTypeDecl<S>),
    Function(SemaFunction<S>),
    /// A stored `@Implicit` property; always read-mode.
    Implicit { key: ImplicitKey, syntax: S },
    /// A stored implicits bag.
    Bag { syntax: S },
    /// A plain stored property whose initializer is walked at
    /// initialization time.
    Field {
        initializer: Vec<SemaCodeItem<S>>,
        syntax: S,
    },
}

#[derive(Clone, Debug)]
pub struct SemaFunction<S> {
    pub signature: CallableSignature,
    pub visibility: Visibility,
    pub is_scope_taking: bool,
    pub body: Vec<SemaCodeItem<S>>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub struct SemaKeysDecl<S> {
    pub keys: Vec<ImplicitKeyDecl<S>>,
    pub syntax: S,
}

/// One key-path key from an `ImplicitsKeys` extension.
#[derive(Clone, Debug)]
pub struct ImplicitKeyDecl<S> {
    pub name: String,
    pub ty: String,
    pub visibility: Visibility,
    pub syntax: S,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, IsVariant)]
pub enum ImplicitMode {
    Get,
    Set,
}

#[derive(Clone, Debug)]
pub enum SemaCodeItem<S> {
    Type(SemaTypeDecl<S>),
    /// A nested function without a scope parameter, analyzed on its own.
    Function(SemaFunction<S>),
    Defer {
        body: Vec<SemaCodeItem<S>>,
        syntax: S,
    },
    Closure {
        /// Set when the closure's capture list grabs the implicits bag;
        /// the handle points at the capture entry.
        bag: Option<S>,
        body: Vec<SemaCodeItem<S>>,
        syntax: S,
    },
    /// A lexical sub-block (do, if branch, guard body); a local scope
    /// outside it is only inherited inside.
    InnerScope {
        body: Vec<SemaCodeItem<S>>,
        syntax: S,
    },
    Call {
        signature: CallableSignature,
        syntax: S,
    },
    ScopeBegin {
        nested: bool,
        with_bag: bool,
        syntax: S,
    },
    ScopeEnd {
        syntax: S,
    },
    WithScope {
        nested: bool,
        with_bag: bool,
        body: Vec<SemaCodeItem<S>>,
        syntax: S,
    },
    WithNamedImplicits {
        wrapper_name: String,
        closure_param_count: usize,
        body: Vec<SemaCodeItem<S>>,
        syntax: S,
    },
    ImplicitMap {
        from: ImplicitKey,
        to: ImplicitKey,
        syntax: S,
    },
    Implicit {
        mode: ImplicitMode,
        key: ImplicitKey,
        syntax: S,
    },
    UnresolvedIfConfig {
        condition: Option<String>,
        body: Vec<SemaCodeItem<S>>,
        syntax: S,
    },
}
