//! Feature composition graph.
//!
//! Nodes are scored feature ids, edges point from a parent to each child it
//! composes. Child references that name no scored feature are kept as
//! dangling references instead of edges. The graph is built once, after
//! every unit has been extracted, and is read-only afterwards.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::AuditError;
use crate::extract::FeatureFact;

/// A parent-to-child composition edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    /// Both ends belong to the same cycle
    pub cyclic: bool,
}

/// A child reference naming a feature outside the corpus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DanglingReference {
    pub from: String,
    pub to: String,
}

/// Per-node structural metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetrics {
    pub fan_out: usize,
    pub fan_in: usize,
    /// Distinct features reachable from this one, excluding itself
    pub subtree_size: usize,
    /// `fan_out + subtree_size`
    pub coupling: usize,
    pub in_cycle: bool,
}

/// Serializable view of the graph for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    pub nodes: BTreeMap<String, NodeMetrics>,
    pub edges: Vec<GraphEdge>,
    pub cycles: Vec<Vec<String>>,
    pub dangling: Vec<DanglingReference>,
    pub median_coupling: f64,
}

#[derive(Debug, Clone)]
pub struct CompositionGraph {
    graph: DiGraph<String, ()>,
    index: BTreeMap<String, NodeIndex>,
    edges: Vec<GraphEdge>,
    dangling: Vec<DanglingReference>,
    cycles: Vec<Vec<String>>,
    metrics: BTreeMap<String, NodeMetrics>,
}

impl CompositionGraph {
    /// Build the graph from every scored fact.
    ///
    /// Fails with an invariant error if two facts share an id.
    pub fn build(facts: &[FeatureFact]) -> Result<Self, AuditError> {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut index: BTreeMap<String, NodeIndex> = BTreeMap::new();

        for fact in facts {
            if index.contains_key(&fact.id) {
                return Err(AuditError::invariant(format!(
                    "duplicate feature id in composition graph: {}",
                    fact.id
                )));
            }
            let node = graph.add_node(fact.id.clone());
            index.insert(fact.id.clone(), node);
        }

        let mut dangling = Vec::new();
        for fact in facts {
            let from = index[&fact.id];
            let children: BTreeSet<&String> = fact.child_features.iter().collect();
            for child in children {
                match index.get(child) {
                    Some(&to) => {
                        graph.add_edge(from, to, ());
                    }
                    None => dangling.push(DanglingReference {
                        from: fact.id.clone(),
                        to: child.clone(),
                    }),
                }
            }
        }
        dangling.sort();

        // Component id per node; only components that form a cycle get one.
        let mut component: BTreeMap<NodeIndex, usize> = BTreeMap::new();
        let mut cycles = Vec::new();
        for scc in tarjan_scc(&graph) {
            let is_cycle = scc.len() > 1
                || scc
                    .first()
                    .map(|&n| graph.contains_edge(n, n))
                    .unwrap_or(false);
            if !is_cycle {
                continue;
            }
            let id = cycles.len();
            let mut members: Vec<String> = scc
                .iter()
                .map(|&n| {
                    component.insert(n, id);
                    graph[n].clone()
                })
                .collect();
            members.sort();
            cycles.push(members);
        }
        cycles.sort();

        let mut edges: Vec<GraphEdge> = graph
            .edge_indices()
            .filter_map(|e| graph.edge_endpoints(e))
            .map(|(a, b)| GraphEdge {
                from: graph[a].clone(),
                to: graph[b].clone(),
                cyclic: matches!(
                    (component.get(&a), component.get(&b)),
                    (Some(x), Some(y)) if x == y
                ),
            })
            .collect();
        edges.sort();

        let metrics = index
            .iter()
            .map(|(id, &node)| {
                let fan_out = graph.neighbors_directed(node, Direction::Outgoing).count();
                let fan_in = graph.neighbors_directed(node, Direction::Incoming).count();
                let subtree_size = reachable_from(&graph, node);
                let metrics = NodeMetrics {
                    fan_out,
                    fan_in,
                    subtree_size,
                    coupling: fan_out + subtree_size,
                    in_cycle: component.contains_key(&node),
                };
                (id.clone(), metrics)
            })
            .collect();

        Ok(Self {
            graph,
            index,
            edges,
            dangling,
            cycles,
            metrics,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn metrics(&self, id: &str) -> Option<&NodeMetrics> {
        self.metrics.get(id)
    }

    /// Coupling complexity of `id`, 0 for unknown ids.
    pub fn coupling(&self, id: &str) -> usize {
        self.metrics.get(id).map(|m| m.coupling).unwrap_or(0)
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn cyclic_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(|e| e.cyclic)
    }

    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    pub fn dangling(&self) -> &[DanglingReference] {
        &self.dangling
    }

    /// Median coupling over all nodes (0 for an empty graph).
    pub fn median_coupling(&self) -> f64 {
        let mut values: Vec<usize> = self.metrics.values().map(|m| m.coupling).collect();
        values.sort_unstable();
        median(&values)
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            nodes: self.metrics.clone(),
            edges: self.edges.clone(),
            cycles: self.cycles.clone(),
            dangling: self.dangling.clone(),
            median_coupling: self.median_coupling(),
        }
    }
}

fn reachable_from(graph: &DiGraph<String, ()>, start: NodeIndex) -> usize {
    let mut dfs = Dfs::new(graph, start);
    let mut visited = 0;
    while let Some(node) = dfs.next(graph) {
        if node != start {
            visited += 1;
        }
    }
    visited
}

/// Median of sorted values; mean of the two middle values for even counts.
fn median(sorted: &[usize]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2] as f64,
        n => (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(id: &str, children: &[&str]) -> FeatureFact {
        FeatureFact {
            id: id.to_string(),
            path: format!("{}.swift", id),
            state_properties: Vec::new(),
            actions: Vec::new(),
            closure_effects: Vec::new(),
            dependencies: Vec::new(),
            child_features: children.iter().map(|c| c.to_string()).collect(),
            duplicate_handlers: 0,
            vague_methods: Vec::new(),
        }
    }

    #[test]
    fn test_tree_metrics() {
        let facts = vec![
            fact("App", &["Home", "Settings"]),
            fact("Home", &["Row"]),
            fact("Row", &[]),
            fact("Settings", &[]),
        ];
        let graph = CompositionGraph::build(&facts).unwrap();
        assert_eq!(graph.node_count(), 4);

        let app = graph.metrics("App").unwrap();
        assert_eq!(app.fan_out, 2);
        assert_eq!(app.fan_in, 0);
        assert_eq!(app.subtree_size, 3);
        assert_eq!(app.coupling, 5);

        let row = graph.metrics("Row").unwrap();
        assert_eq!(row.fan_in, 1);
        assert_eq!(row.coupling, 0);

        assert!(graph.cycles().is_empty());
        assert!(graph.cyclic_edges().next().is_none());
        // couplings: App 5, Home 2, Row 0, Settings 0
        assert_eq!(graph.median_coupling(), 1.0);
    }

    #[test]
    fn test_two_node_cycle() {
        let facts = vec![fact("A", &["B"]), fact("B", &["A"])];
        let graph = CompositionGraph::build(&facts).unwrap();
        assert_eq!(graph.cycles(), &[vec!["A".to_string(), "B".to_string()]]);
        assert!(graph.metrics("A").unwrap().in_cycle);
        assert!(graph.metrics("B").unwrap().in_cycle);
        assert_eq!(graph.metrics("A").unwrap().subtree_size, 1);
        assert_eq!(graph.cyclic_edges().count(), 2);
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let facts = vec![fact("Nested", &["Nested"]), fact("Leaf", &[])];
        let graph = CompositionGraph::build(&facts).unwrap();
        assert_eq!(graph.cycles(), &[vec!["Nested".to_string()]]);
        let nested = graph.metrics("Nested").unwrap();
        assert!(nested.in_cycle);
        assert_eq!(nested.subtree_size, 0);
        assert!(!graph.metrics("Leaf").unwrap().in_cycle);
    }

    #[test]
    fn test_edge_into_cycle_is_not_cyclic() {
        let facts = vec![fact("Root", &["A"]), fact("A", &["B"]), fact("B", &["A"])];
        let graph = CompositionGraph::build(&facts).unwrap();
        let root_edge = graph.edges().iter().find(|e| e.from == "Root").unwrap();
        assert!(!root_edge.cyclic);
        assert!(!graph.metrics("Root").unwrap().in_cycle);
        assert_eq!(graph.metrics("Root").unwrap().subtree_size, 2);
    }

    #[test]
    fn test_dangling_references() {
        let facts = vec![fact("App", &["Home", "Missing"]), fact("Home", &[])];
        let graph = CompositionGraph::build(&facts).unwrap();
        assert_eq!(
            graph.dangling(),
            &[DanglingReference {
                from: "App".to_string(),
                to: "Missing".to_string()
            }]
        );
        assert_eq!(graph.metrics("App").unwrap().fan_out, 1);
    }

    #[test]
    fn test_duplicate_id_is_an_invariant_violation() {
        let facts = vec![fact("A", &[]), fact("A", &[])];
        let err = CompositionGraph::build(&facts).unwrap_err();
        assert!(matches!(err, AuditError::InternalInvariant(_)));
    }

    #[test]
    fn test_empty_graph() {
        let graph = CompositionGraph::build(&[]).unwrap();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.median_coupling(), 0.0);
        assert!(graph.summary().nodes.is_empty());
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[3]), 3.0);
        assert_eq!(median(&[1, 4]), 2.5);
        assert_eq!(median(&[0, 1, 9]), 1.0);
    }
}
