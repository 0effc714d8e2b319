use super::error::GraphErrorKind;
use super::{NodeRef, RequirementsGraph};
use crate::diagnostics::Diagnostics;
use crate::implicit_key::ImplicitKey;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Fixed-point requirement sets per node, memoised over one propagation
/// run. Propagating the same graph again yields identical sets.
#[derive(Debug, Default)]
pub struct Resolution {
    requirements: HashMap<NodeRef, BTreeSet<ImplicitKey>>,
}

impl Resolution {
    pub fn of(&self, node: NodeRef) -> BTreeSet<ImplicitKey> {
        self.requirements.get(&node).cloned().unwrap_or_default()
    }
}

pub fn propagate(graph: &RequirementsGraph) -> Resolution {
    let mut memo = HashMap::new();
    let mut in_progress = HashSet::new();

    for root in graph.roots() {
        compute(graph, root, &mut memo, &mut in_progress);
    }

    Resolution { requirements: memo }
}

/// `R(n) = ((⋃ R(successors)) ∪ requires(n)) \ provides(n)`. On cycle
/// re-entry the recursive frame contributes nothing; everything in the
/// cycle is already accumulating in the ancestor frame.
fn compute(
    graph: &RequirementsGraph,
    node: NodeRef,
    memo: &mut HashMap<NodeRef, BTreeSet<ImplicitKey>>,
    in_progress: &mut HashSet<NodeRef>,
) -> BTreeSet<ImplicitKey> {
    if let Some(known) = memo.get(&node) {
        return known.clone();
    }

    if !in_progress.insert(node) {
        return BTreeSet::new();
    }

    let payload = graph.node(node);
    let mut requirements = BTreeSet::new();

    for successor in &payload.edges {
        requirements.extend(compute(graph, *successor, memo, in_progress));
    }

    requirements.extend(payload.requires.iter().cloned());

    for provided in &payload.provides {
        requirements.remove(provided);
    }

    in_progress.remove(&node);
    memo.insert(node, requirements.clone());
    requirements
}

/// Requirements still open at an entry point have nowhere left to come
/// from; they aggregate into one diagnostic at the entry node.
pub fn report_unresolved(
    graph: &RequirementsGraph,
    resolution: &Resolution,
    diagnostics: &Diagnostics,
) {
    for entry in &graph.entry_points {
        let unresolved = resolution.of(*entry);

        if unresolved.is_empty() {
            continue;
        }

        let site = graph.node(*entry).site.clone();
        diagnostics.error(
            site,
            GraphErrorKind::UnresolvedRequirements {
                keys: unresolved.into_iter().collect(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_files::Source;

    fn key(name: &str) -> ImplicitKey {
        ImplicitKey::of_type(name)
    }

    fn keys(names: &[&str]) -> BTreeSet<ImplicitKey> {
        names.iter().map(|name| key(name)).collect()
    }

    #[test]
    fn provides_mask_downstream_requires() {
        let mut graph = RequirementsGraph::new();

        let begin = graph.add_node(Source::internal());
        let set = graph.add_node(Source::internal());
        let get = graph.add_node(Source::internal());

        graph.node_mut(set).provides.insert(key("UInt8"));
        graph.node_mut(get).requires.insert(key("UInt8"));
        graph.node_mut(get).requires.insert(key("UInt16"));

        graph.add_edge(begin, set);
        graph.add_edge(set, get);
        graph.entry_points.push(begin);

        let resolution = propagate(&graph);

        assert_eq!(resolution.of(get), keys(&["UInt16", "UInt8"]));
        assert_eq!(resolution.of(set), keys(&["UInt16"]));
        assert_eq!(resolution.of(begin), keys(&["UInt16"]));
    }

    #[test]
    fn own_requires_survive_own_provides_only_when_distinct() {
        let mut graph = RequirementsGraph::new();

        // A remap node requires `from` and provides `to`.
        let map = graph.add_node(Source::internal());
        let get = graph.add_node(Source::internal());

        graph.node_mut(map).requires.insert(key("From"));
        graph.node_mut(map).provides.insert(key("To"));
        graph.node_mut(get).requires.insert(key("To"));

        graph.add_edge(map, get);
        graph.entry_points.push(map);

        let resolution = propagate(&graph);
        assert_eq!(resolution.of(map), keys(&["From"]));
    }

    #[test]
    fn cycles_contribute_each_node_once() {
        let mut graph = RequirementsGraph::new();

        let a = graph.add_node(Source::internal());
        let b = graph.add_node(Source::internal());
        let c = graph.add_node(Source::internal());

        graph.node_mut(a).requires.insert(key("A"));
        graph.node_mut(b).requires.insert(key("B"));
        graph.node_mut(c).requires.insert(key("C"));
        graph.node_mut(c).provides.insert(key("B"));

        // a → b → c → a
        graph.add_edge(a, b);
        graph.add_edge(b, c);
        graph.add_edge(c, a);
        graph.entry_points.push(a);

        let resolution = propagate(&graph);

        // `c` provides B below itself, but `b`'s own requirement is
        // accumulated above `c`, so B stays visible at the entry.
        assert_eq!(resolution.of(a), keys(&["A", "B", "C"]));
    }

    #[test]
    fn propagation_is_idempotent() {
        let mut graph = RequirementsGraph::new();

        let a = graph.add_node(Source::internal());
        let b = graph.add_node(Source::internal());

        graph.node_mut(a).provides.insert(key("X"));
        graph.node_mut(b).requires.insert(key("X"));
        graph.node_mut(b).requires.insert(key("Y"));

        graph.add_edge(a, b);
        graph.add_edge(b, a);
        graph.entry_points.push(a);
        graph.entry_points.push(b);

        let first = propagate(&graph);
        let second = propagate(&graph);

        for node in [a, b] {
            assert_eq!(first.of(node), second.of(node));
        }
    }
}
