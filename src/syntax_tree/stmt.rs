use super::{Decl, Expr, IfConfig};

#[derive(Clone, Debug)]
pub enum CodeBlockItem<S> {
    Declaration(Decl<S>),
    Statement(Stmt<S>),
    Expression(Expr<S>),
}

impl<S> CodeBlockItem<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> CodeBlockItem<T> {
        match self {
            CodeBlockItem::Declaration(decl) => CodeBlockItem::Declaration(decl.map_syntax(f)),
            CodeBlockItem::Statement(stmt) => CodeBlockItem::Statement(stmt.map_syntax(f)),
            CodeBlockItem::Expression(expr) => CodeBlockItem::Expression(expr.map_syntax(f)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Stmt<S> {
    pub kind: StmtKind<S>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub enum StmtKind<S> {
    Defer(Vec<CodeBlockItem<S>>),
    Do {
        body: Vec<CodeBlockItem<S>>,
        catches: Vec<Vec<CodeBlockItem<S>>>,
    },
    IfConfig(IfConfig<S, CodeBlockItem<S>>),
    /// Control flow the analyzer sees through but does not model;
    /// carries every nested block's items in source order.
    Other(Vec<CodeBlockItem<S>>),
}

impl<S> StmtKind<S> {
    pub fn at(self, syntax: S) -> Stmt<S> {
        Stmt { kind: self, syntax }
    }
}

impl<S> Stmt<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> Stmt<T> {
        let map_items = |items: Vec<CodeBlockItem<S>>, f: &F| -> Vec<CodeBlockItem<T>> {
            items.into_iter().map(|item| item.map_syntax(f)).collect()
        };

        Stmt {
            kind: match self.kind {
                StmtKind::Defer(body) => StmtKind::Defer(map_items(body, f)),
                StmtKind::Do { body, catches } => StmtKind::Do {
                    body: map_items(body, f),
                    catches: catches
                        .into_iter()
                        .map(|catch| map_items(catch, f))
                        .collect(),
                },
                StmtKind::IfConfig(if_config) => {
                    StmtKind::IfConfig(if_config.map_syntax(f, &CodeBlockItem::map_syntax))
                }
                StmtKind::Other(items) => StmtKind::Other(map_items(items, f)),
            },
            syntax: f(self.syntax),
        }
    }
}
