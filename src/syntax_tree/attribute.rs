use super::Expr;

#[derive(Clone, Debug)]
pub struct Attribute<S> {
    /// Name without the `@`, e.g. `Implicit` or `_spi`.
    pub name: String,
    pub argument: Option<AttributeArgument<S>>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub struct AttributeArgument<S> {
    pub label: Option<String>,
    pub value: Expr<S>,
}

impl<S> Attribute<S> {
    pub fn plain(name: impl Into<String>, syntax: S) -> Self {
        Self {
            name: name.into(),
            argument: None,
            syntax,
        }
    }

    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> Attribute<T> {
        Attribute {
            name: self.name,
            argument: self.argument.map(|argument| AttributeArgument {
                label: argument.label,
                value: argument.value.map_syntax(f),
            }),
            syntax: f(self.syntax),
        }
    }
}
