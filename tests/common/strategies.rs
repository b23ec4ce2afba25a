use proptest::prelude::*;
use proptest::strategy::Just;
use workflow_escalation::{Role, WorkflowNode};

/// Realistic dependency shapes
#[derive(Debug, Clone)]
pub enum WorkflowPattern {
    Linear(usize),                // Linear chain of N nodes
    Diamond,                      // 0 -> 1,2 -> 3
    FanOut(usize),                // 0 -> N
    FanIn(usize),                 // N -> 1
    Complex(usize, Vec<(usize, usize)>), // node count, forward edges
}

pub fn node_id(index: usize) -> String {
    format!("node_{index}")
}

pub fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Employee),
        Just(Role::DirectSupervisor),
        Just(Role::StoreVp),
        Just(Role::GeneralManager),
    ]
}

/// Random forward-only edge set over `2..=max_nodes` nodes; always acyclic
pub fn forward_edges_strategy(max_nodes: usize) -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2usize..=max_nodes).prop_flat_map(|count| {
        let edge = (0..count, 0..count)
            .prop_filter("No self-loops", |(a, b)| a != b)
            .prop_map(|(a, b)| if a < b { (a, b) } else { (b, a) });
        (Just(count), prop::collection::vec(edge, 0..count * 2))
    })
}

pub fn workflow_pattern_strategy() -> impl Strategy<Value = WorkflowPattern> {
    prop_oneof![
        (2usize..=10).prop_map(WorkflowPattern::Linear),
        Just(WorkflowPattern::Diamond),
        (2usize..=8).prop_map(WorkflowPattern::FanOut),
        (2usize..=8).prop_map(WorkflowPattern::FanIn),
        forward_edges_strategy(12).prop_map(|(n, edges)| WorkflowPattern::Complex(n, edges)),
    ]
}

impl WorkflowPattern {
    pub fn node_count(&self) -> usize {
        match self {
            WorkflowPattern::Linear(n) => *n,
            WorkflowPattern::Diamond => 4,
            WorkflowPattern::FanOut(n) | WorkflowPattern::FanIn(n) => n + 1,
            WorkflowPattern::Complex(n, _) => *n,
        }
    }

    /// Edges as `(from, to)`: `to` depends on `from`
    pub fn edges(&self) -> Vec<(usize, usize)> {
        match self {
            WorkflowPattern::Linear(n) => (0..(*n - 1)).map(|i| (i, i + 1)).collect(),
            WorkflowPattern::Diamond => vec![(0, 1), (0, 2), (1, 3), (2, 3)],
            WorkflowPattern::FanOut(n) => (1..=*n).map(|i| (0, i)).collect(),
            WorkflowPattern::FanIn(n) => (0..*n).map(|i| (i, *n)).collect(),
            WorkflowPattern::Complex(_, edges) => edges.clone(),
        }
    }

    pub fn nodes(&self) -> Vec<WorkflowNode> {
        let edges = self.edges();
        (0..self.node_count())
            .map(|i| {
                let deps: Vec<String> = edges
                    .iter()
                    .filter(|(_, to)| *to == i)
                    .map(|(from, _)| node_id(*from))
                    .collect();
                WorkflowNode::new(node_id(i), format!("Step {i}"), Role::Employee)
                    .with_time_limit(10 + i as u32)
                    .depends_on(deps)
            })
            .collect()
    }

    /// Whether `to` is reachable from `from` along dependency edges
    pub fn reachable(&self, from: usize, to: usize) -> bool {
        let edges = self.edges();
        let mut seen = vec![false; self.node_count()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if std::mem::replace(&mut seen[current], true) {
                continue;
            }
            stack.extend(edges.iter().filter(|(a, _)| *a == current).map(|(_, b)| *b));
        }
        false
    }
}
