use super::CodeBlockItem;

#[derive(Clone, Debug)]
pub struct Expr<S> {
    pub kind: ExprKind<S>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub enum ExprKind<S> {
    FunctionCall(FunctionCall<S>),
    Closure(Closure<S>),
    MacroExpansion {
        name: String,
    },
    DeclRef {
        name: String,
        /// Present for compound references like `fetch(url:)`.
        arg_labels: Option<Vec<String>>,
    },
    MemberAccess {
        /// `None` for leading-dot member syntax.
        base: Option<Box<Expr<S>>>,
        name: String,
    },
    KeyPath {
        components: Vec<String>,
    },
    Try(Box<Expr<S>>),
    Await(Box<Expr<S>>),
    /// Anything the analyzer does not interpret; nested blocks inside
    /// (closures in subexpressions, for example) still get walked.
    Other(Vec<CodeBlockItem<S>>),
}

#[derive(Clone, Debug)]
pub struct FunctionCall<S> {
    pub callee: Box<Expr<S>>,
    pub arguments: Vec<CallArgument<S>>,
    pub trailing_closure: Option<Closure<S>>,
}

#[derive(Clone, Debug)]
pub struct CallArgument<S> {
    pub label: Option<String>,
    pub value: Expr<S>,
}

#[derive(Clone, Debug)]
pub struct Closure<S> {
    pub captures: Vec<ClosureCapture<S>>,
    pub parameters: Vec<String>,
    pub body: Vec<CodeBlockItem<S>>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub struct ClosureCapture<S> {
    pub name: String,
    pub syntax: S,
}

impl<S> ExprKind<S> {
    pub fn at(self, syntax: S) -> Expr<S> {
        Expr { kind: self, syntax }
    }
}

impl<S> Expr<S> {
    /// Strips `try`/`await` layers, which never matter for resolution.
    pub fn unwrap_effects(&self) -> &Expr<S> {
        match &self.kind {
            ExprKind::Try(inner) | ExprKind::Await(inner) => inner.unwrap_effects(),
            _ => self,
        }
    }

    pub fn declared_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::DeclRef { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Matches `T.self` and returns `T`'s spelling.
    pub fn metatype_base(&self) -> Option<&Expr<S>> {
        match &self.kind {
            ExprKind::MemberAccess { base: Some(base), name } if name == "self" => Some(base),
            _ => None,
        }
    }

    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> Expr<T> {
        Expr {
            kind: match self.kind {
                ExprKind::FunctionCall(call) => ExprKind::FunctionCall(call.map_syntax(f)),
                ExprKind::Closure(closure) => ExprKind::Closure(closure.map_syntax(f)),
                ExprKind::MacroExpansion { name } => ExprKind::MacroExpansion { name },
                ExprKind::DeclRef { name, arg_labels } => ExprKind::DeclRef { name, arg_labels },
                ExprKind::MemberAccess { base, name } => ExprKind::MemberAccess {
                    base: base.map(|base| Box::new(base.map_syntax(f))),
                    name,
                },
                ExprKind::KeyPath { components } => ExprKind::KeyPath { components },
                ExprKind::Try(inner) => ExprKind::Try(Box::new(inner.map_syntax(f))),
                ExprKind::Await(inner) => ExprKind::Await(Box::new(inner.map_syntax(f))),
                ExprKind::Other(items) => ExprKind::Other(
                    items.into_iter().map(|item| item.map_syntax(f)).collect(),
                ),
            },
            syntax: f(self.syntax),
        }
    }
}

impl<S> FunctionCall<S> {
    /// Outer labels in argument order; `None` per unlabeled argument.
    pub fn argument_labels(&self) -> Vec<Option<&str>> {
        self.arguments
            .iter()
            .map(|argument| argument.label.as_deref())
            .collect()
    }

    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> FunctionCall<T> {
        FunctionCall {
            callee: Box::new(self.callee.map_syntax(f)),
            arguments: self
                .arguments
                .into_iter()
                .map(|argument| CallArgument {
                    label: argument.label,
                    value: argument.value.map_syntax(f),
                })
                .collect(),
            trailing_closure: self.trailing_closure.map(|closure| closure.map_syntax(f)),
        }
    }
}

impl<S> Closure<S> {
    pub fn captures_bag(&self, bag_name: &str) -> bool {
        self.captures.iter().any(|capture| capture.name == bag_name)
    }

    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> Closure<T> {
        Closure {
            captures: self
                .captures
                .into_iter()
                .map(|capture| ClosureCapture {
                    name: capture.name,
                    syntax: f(capture.syntax),
                })
                .collect(),
            parameters: self.parameters,
            body: self
                .body
                .into_iter()
                .map(|item| item.map_syntax(f))
                .collect(),
            syntax: f(self.syntax),
        }
    }
}
