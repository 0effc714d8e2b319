#[derive(Clone, Debug)]
pub struct Pattern<S> {
    pub kind: PatternKind<S>,
    pub syntax: S,
}

#[derive(Clone, Debug)]
pub enum PatternKind<S> {
    Wildcard,
    Identifier(String),
    Tuple(Vec<Pattern<S>>),
    Unsupported,
}

impl<S> PatternKind<S> {
    pub fn at(self, syntax: S) -> Pattern<S> {
        Pattern { kind: self, syntax }
    }
}

impl<S> Pattern<S> {
    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            PatternKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, PatternKind::Wildcard)
    }

    pub fn map_syntax<T, F: Fn(S) -> T>(self, f: &F) -> Pattern<T> {
        Pattern {
            kind: match self.kind {
                PatternKind::Wildcard => PatternKind::Wildcard,
                PatternKind::Identifier(name) => PatternKind::Identifier(name),
                PatternKind::Tuple(elements) => PatternKind::Tuple(
                    elements
                        .into_iter()
                        .map(|element| element.map_syntax(f))
                        .collect(),
                ),
                PatternKind::Unsupported => PatternKind::Unsupported,
            },
            syntax: f(self.syntax),
        }
    }
}
