/// Boolean expression of an `#if` clause condition.
#[derive(Clone, Debug)]
pub struct ConditionExpr<S> {
    pub kind: ConditionExprKind<S>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub enum ConditionExprKind<S> {
    Boolean(bool),
    Identifier(String),
    /// Platform-style condition such as `os(iOS)`; never decidable here.
    Call {
        name: String,
        arguments: Vec<ConditionExpr<S>>,
    },
    Not(Box<ConditionExpr<S>>),
    And(Box<ConditionExpr<S>>, Box<ConditionExpr<S>>),
    Or(Box<ConditionExpr<S>>, Box<ConditionExpr<S>>),
    Parenthesized(Box<ConditionExpr<S>>),
    Unsupported,
}

impl<S> ConditionExprKind<S> {
    pub fn at(self, syntax: S) -> ConditionExpr<S> {
        ConditionExpr { kind: self, syntax }
    }
}

impl<S> ConditionExpr<S> {
    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> ConditionExpr<T> {
        ConditionExpr {
            kind: match self.kind {
                ConditionExprKind::Boolean(value) => ConditionExprKind::Boolean(value),
                ConditionExprKind::Identifier(name) => ConditionExprKind::Identifier(name),
                ConditionExprKind::Call { name, arguments } => ConditionExprKind::Call {
                    name,
                    arguments: arguments
                        .into_iter()
                        .map(|argument| argument.map_syntax(f))
                        .collect(),
                },
                ConditionExprKind::Not(inner) => {
                    ConditionExprKind::Not(Box::new(inner.map_syntax(f)))
                }
                ConditionExprKind::And(left, right) => ConditionExprKind::And(
                    Box::new(left.map_syntax(f)),
                    Box::new(right.map_syntax(f)),
                ),
                ConditionExprKind::Or(left, right) => ConditionExprKind::Or(
                    Box::new(left.map_syntax(f)),
                    Box::new(right.map_syntax(f)),
                ),
                ConditionExprKind::Parenthesized(inner) => {
                    ConditionExprKind::Parenthesized(Box::new(inner.map_syntax(f)))
                }
                ConditionExprKind::Unsupported => ConditionExprKind::Unsupported,
            },
            syntax: f(self.syntax),
        }
    }

    /// Rendering used when an unresolved condition is mentioned in
    /// diagnostics or kept in generated source.
    pub fn description(&self) -> String {
        match &self.kind {
            ConditionExprKind::Boolean(value) => value.to_string(),
            ConditionExprKind::Identifier(name) => name.clone(),
            ConditionExprKind::Call { name, arguments } => {
                let arguments = arguments
                    .iter()
                    .map(ConditionExpr::description)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}({})", name, arguments)
            }
            ConditionExprKind::Not(inner) => format!("!{}", inner.description()),
            ConditionExprKind::And(left, right) => {
                format!("{} && {}", left.description(), right.description())
            }
            ConditionExprKind::Or(left, right) => {
                format!("{} || {}", left.description(), right.description())
            }
            ConditionExprKind::Parenthesized(inner) => format!("({})", inner.description()),
            ConditionExprKind::Unsupported => "<unsupported>".to_string(),
        }
    }
}
