use crate::syntax_tree::{ConditionExpr, ConditionExprKind, IfConfigClause};
use std::collections::{HashMap, HashSet};

/// Conditional-compilation configuration. `Enabled` answers every
/// identifier (absent means false); `Strict` only answers identifiers it
/// was given, leaving the rest undecided.
#[derive(Clone, Debug)]
pub enum Configuration {
    Enabled(HashSet<String>),
    Strict(HashMap<String, bool>),
}

impl Configuration {
    pub fn enabled<I: IntoIterator<Item = impl Into<String>>>(flags: I) -> Self {
        Self::Enabled(flags.into_iter().map(Into::into).collect())
    }

    pub fn strict<I: IntoIterator<Item = (impl Into<String>, bool)>>(flags: I) -> Self {
        Self::Strict(
            flags
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    fn lookup(&self, identifier: &str) -> Option<bool> {
        match self {
            Configuration::Enabled(set) => Some(set.contains(identifier)),
            Configuration::Strict(map) => map.get(identifier).copied(),
        }
    }
}

/// Three-valued evaluation: `None` means the condition cannot be decided
/// under this configuration.
pub fn evaluate<S>(expr: &ConditionExpr<S>, config: &Configuration) -> Option<bool> {
    match &expr.kind {
        ConditionExprKind::Boolean(value) => Some(*value),
        ConditionExprKind::Identifier(name) => config.lookup(name),
        ConditionExprKind::Call { .. } => None,
        ConditionExprKind::Not(inner) => evaluate(inner, config).map(|value| !value),
        ConditionExprKind::And(left, right) => {
            match (evaluate(left, config), evaluate(right, config)) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            }
        }
        ConditionExprKind::Or(left, right) => {
            match (evaluate(left, config), evaluate(right, config)) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            }
        }
        ConditionExprKind::Parenthesized(inner) => evaluate(inner, config),
        ConditionExprKind::Unsupported => None,
    }
}

/// Filters an `#if`/`#elseif`/`#else` chain: clauses evaluating false are
/// dropped, the first true clause ends the chain, undecided clauses stay
/// and are later treated as unresolved blocks. A bare `#else` counts as
/// true.
pub fn filter_clauses<S, Body>(
    clauses: Vec<IfConfigClause<S, Body>>,
    config: &Configuration,
) -> Vec<IfConfigClause<S, Body>> {
    let mut retained = Vec::new();

    for mut clause in clauses {
        let resolution = match &clause.condition {
            None => Some(true),
            Some(condition) => evaluate(condition, config),
        };

        match resolution {
            Some(false) => continue,
            Some(true) => {
                clause.resolution = Some(true);
                retained.push(clause);
                break;
            }
            None => {
                clause.resolution = None;
                retained.push(clause);
            }
        }
    }

    retained
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(kind: ConditionExprKind<()>) -> ConditionExpr<()> {
        kind.at(())
    }

    fn ident(name: &str) -> ConditionExpr<()> {
        cond(ConditionExprKind::Identifier(name.into()))
    }

    fn not(inner: ConditionExpr<()>) -> ConditionExpr<()> {
        cond(ConditionExprKind::Not(Box::new(inner)))
    }

    fn and(left: ConditionExpr<()>, right: ConditionExpr<()>) -> ConditionExpr<()> {
        cond(ConditionExprKind::And(Box::new(left), Box::new(right)))
    }

    fn or(left: ConditionExpr<()>, right: ConditionExpr<()>) -> ConditionExpr<()> {
        cond(ConditionExprKind::Or(Box::new(left), Box::new(right)))
    }

    fn call(name: &str, arguments: Vec<ConditionExpr<()>>) -> ConditionExpr<()> {
        cond(ConditionExprKind::Call {
            name: name.into(),
            arguments,
        })
    }

    fn abc() -> Configuration {
        Configuration::enabled(["A", "B", "C"])
    }

    #[test]
    fn enabled_configuration_truth_table() {
        let config = abc();

        assert_eq!(evaluate(&ident("A"), &config), Some(true));
        assert_eq!(evaluate(&ident("D"), &config), Some(false));
        assert_eq!(evaluate(&and(ident("A"), ident("B")), &config), Some(true));
        assert_eq!(evaluate(&and(ident("A"), ident("D")), &config), Some(false));
        assert_eq!(
            evaluate(&and(ident("A"), call("D", vec![ident("1")])), &config),
            None
        );
        assert_eq!(evaluate(&not(ident("A")), &config), Some(false));
        assert_eq!(evaluate(&not(ident("D")), &config), Some(true));
        assert_eq!(
            evaluate(
                &and(
                    cond(ConditionExprKind::Parenthesized(Box::new(or(
                        ident("A"),
                        ident("B")
                    )))),
                    ident("D")
                ),
                &config
            ),
            Some(false)
        );
        // `A || B && D` parses as `A || (B && D)`.
        assert_eq!(
            evaluate(&or(ident("A"), and(ident("B"), ident("D"))), &config),
            Some(true)
        );
        assert_eq!(evaluate(&cond(ConditionExprKind::Unsupported), &config), None);
        assert_eq!(evaluate(&call("A", vec![ident("x")]), &config), None);
    }

    #[test]
    fn strict_configuration_leaves_unknowns_undecided() {
        let config = Configuration::strict([("A", true), ("B", false)]);

        assert_eq!(evaluate(&ident("A"), &config), Some(true));
        assert_eq!(evaluate(&ident("B"), &config), Some(false));
        assert_eq!(evaluate(&ident("C"), &config), None);
        // Short circuits still decide around unknowns.
        assert_eq!(evaluate(&and(ident("C"), ident("B")), &config), Some(false));
        assert_eq!(evaluate(&or(ident("C"), ident("A")), &config), Some(true));
        assert_eq!(evaluate(&and(ident("C"), ident("A")), &config), None);
    }

    fn clause(
        condition: Option<ConditionExpr<()>>,
        body: Vec<&'static str>,
    ) -> IfConfigClause<(), &'static str> {
        IfConfigClause {
            condition,
            resolution: None,
            body,
        }
    }

    #[test]
    fn filtering_keeps_through_first_true_clause() {
        let clauses = vec![
            clause(Some(ident("D")), vec!["dropped"]),
            clause(Some(call("os", vec![ident("iOS")])), vec!["unknown"]),
            clause(Some(ident("A")), vec!["active"]),
            clause(None, vec!["discarded else"]),
        ];

        let retained = filter_clauses(clauses, &abc());

        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].resolution, None);
        assert_eq!(retained[0].body, vec!["unknown"]);
        assert_eq!(retained[1].resolution, Some(true));
        assert_eq!(retained[1].body, vec!["active"]);
    }

    #[test]
    fn filtering_keeps_all_unknown_clauses() {
        let clauses = vec![
            clause(Some(call("os", vec![ident("iOS")])), vec!["first"]),
            clause(Some(call("os", vec![ident("macOS")])), vec!["second"]),
        ];

        let retained = filter_clauses(clauses, &abc());

        assert_eq!(retained.len(), 2);
        assert!(retained.iter().all(|clause| clause.resolution.is_none()));
    }

    #[test]
    fn else_clause_is_true_when_reached() {
        let clauses = vec![
            clause(Some(ident("D")), vec!["dropped"]),
            clause(None, vec!["else body"]),
        ];

        let retained = filter_clauses(clauses, &abc());

        assert_eq!(retained.len(), 1);
        assert_eq!(retained[0].resolution, Some(true));
        assert_eq!(retained[0].body, vec!["else body"]);
    }
}
