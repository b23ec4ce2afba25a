//! # Dependency Graph Validator
//!
//! Guards the invariant that the `depends_on` edges of a template form a DAG.
//!
//! ## Overview
//!
//! Nodes are indexed once, then walked with an iterative depth-first traversal using
//! three-colour marking (unvisited, in progress, done). Running time is O(N + E) and the
//! traversal never recurses, so deep templates cannot overflow the stack.
//!
//! Edges point from a node to each node it depends on. A reported cycle follows that
//! direction: `["a", "b", "a"]` means `a` depends on `b` and `b` depends on `a`.
//!
//! Interactive edits use [`would_create_cycle`] or [`check_edge`] before touching the
//! graph, so an edge is never added and then rolled back.

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::models::WorkflowNode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Dependency cycle detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Unknown node '{node_id}' referenced by '{referenced_by}'")]
    UnknownNode {
        node_id: String,
        referenced_by: String,
    },

    #[error("Duplicate node id '{0}'")]
    DuplicateNode(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Node set indexed by position, with dependency edges resolved to indices
struct IndexedGraph<'a> {
    ids: Vec<&'a str>,
    index: HashMap<&'a str, usize>,
    deps: Vec<Vec<usize>>,
}

impl<'a> IndexedGraph<'a> {
    /// Strict indexing rejects duplicate ids and dangling edges
    fn strict(nodes: &'a [WorkflowNode]) -> GraphResult<Self> {
        let index = Self::index_ids(nodes, true)?;
        let mut deps = Vec::with_capacity(nodes.len());
        for node in nodes {
            let mut resolved = Vec::with_capacity(node.depends_on.len());
            for dep in &node.depends_on {
                match index.get(dep.as_str()) {
                    Some(&i) => resolved.push(i),
                    None => {
                        return Err(GraphError::UnknownNode {
                            node_id: dep.clone(),
                            referenced_by: node.id.clone(),
                        })
                    }
                }
            }
            deps.push(resolved);
        }
        Ok(Self {
            ids: nodes.iter().map(|n| n.id.as_str()).collect(),
            index,
            deps,
        })
    }

    /// Lenient indexing keeps the first node for a duplicate id and drops dangling edges
    fn lenient(nodes: &'a [WorkflowNode]) -> Self {
        let index = Self::index_ids(nodes, false).unwrap_or_default();
        let deps = nodes
            .iter()
            .map(|node| {
                node.depends_on
                    .iter()
                    .filter_map(|dep| index.get(dep.as_str()).copied())
                    .collect()
            })
            .collect();
        Self {
            ids: nodes.iter().map(|n| n.id.as_str()).collect(),
            index,
            deps,
        }
    }

    fn index_ids(nodes: &'a [WorkflowNode], strict: bool) -> GraphResult<HashMap<&'a str, usize>> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.contains_key(node.id.as_str()) {
                if strict {
                    return Err(GraphError::DuplicateNode(node.id.clone()));
                }
                continue;
            }
            index.insert(node.id.as_str(), i);
        }
        Ok(index)
    }

    fn path_ids(&self, path: &[usize]) -> Vec<String> {
        path.iter().map(|&i| self.ids[i].to_string()).collect()
    }

    /// Full traversal. Returns the post-order (dependencies before dependents) or the
    /// first cycle found, as indices.
    fn traverse(&self) -> Result<Vec<usize>, Vec<usize>> {
        let mut marks = vec![Mark::Unvisited; self.ids.len()];
        let mut order = Vec::with_capacity(self.ids.len());

        for root in 0..self.ids.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::InProgress;
            // (node, position of the next dependency to visit)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                if let Some(&dep) = self.deps[node].get(frame.1) {
                    frame.1 += 1;
                    match marks[dep] {
                        Mark::Unvisited => {
                            marks[dep] = Mark::InProgress;
                            stack.push((dep, 0));
                        }
                        Mark::InProgress => {
                            let start = stack.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                            let mut cycle: Vec<usize> =
                                stack[start..].iter().map(|&(n, _)| n).collect();
                            cycle.push(dep);
                            return Err(cycle);
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    order.push(node);
                    stack.pop();
                }
            }
        }

        Ok(order)
    }

    /// Dependency path from `from` to `to`, if one exists
    fn path_between(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        let mut parent: Vec<Option<usize>> = vec![None; self.ids.len()];
        let mut visited = vec![false; self.ids.len()];
        let mut stack = vec![from];
        visited[from] = true;

        while let Some(node) = stack.pop() {
            if node == to {
                let mut path = vec![to];
                let mut cursor = to;
                while let Some(p) = parent[cursor] {
                    path.push(p);
                    cursor = p;
                }
                path.reverse();
                return Some(path);
            }
            for &dep in &self.deps[node] {
                if !visited[dep] {
                    visited[dep] = true;
                    parent[dep] = Some(node);
                    stack.push(dep);
                }
            }
        }
        None
    }
}

/// Validate that `nodes` form a DAG with no dangling or duplicate ids
pub fn validate_graph(nodes: &[WorkflowNode]) -> GraphResult<()> {
    let graph = IndexedGraph::strict(nodes)?;
    match graph.traverse() {
        Ok(_) => {
            debug!(node_count = nodes.len(), "Dependency graph validated");
            Ok(())
        }
        Err(cycle) => Err(GraphError::Cycle {
            path: graph.path_ids(&cycle),
        }),
    }
}

/// Order node ids so every node comes after all of its dependencies
pub fn topological_order(nodes: &[WorkflowNode]) -> GraphResult<Vec<String>> {
    let graph = IndexedGraph::strict(nodes)?;
    graph
        .traverse()
        .map(|order| graph.path_ids(&order))
        .map_err(|cycle| GraphError::Cycle {
            path: graph.path_ids(&cycle),
        })
}

/// Would making `target` depend on `source` close a cycle?
///
/// Costs one traversal from `source` and never mutates `nodes`. Unknown endpoints
/// cannot close a cycle and yield `false`; use [`check_edge`] to surface them.
pub fn would_create_cycle(nodes: &[WorkflowNode], source: &str, target: &str) -> bool {
    if source == target {
        return true;
    }
    let graph = IndexedGraph::lenient(nodes);
    match (graph.index.get(source), graph.index.get(target)) {
        (Some(&s), Some(&t)) => graph.path_between(s, t).is_some(),
        _ => false,
    }
}

/// Check a proposed edge (`target` depends on `source`) before it is applied
pub fn check_edge(nodes: &[WorkflowNode], source: &str, target: &str) -> GraphResult<()> {
    let graph = IndexedGraph::lenient(nodes);
    let s = *graph
        .index
        .get(source)
        .ok_or_else(|| GraphError::UnknownNode {
            node_id: source.to_string(),
            referenced_by: target.to_string(),
        })?;
    let t = *graph
        .index
        .get(target)
        .ok_or_else(|| GraphError::UnknownNode {
            node_id: target.to_string(),
            referenced_by: source.to_string(),
        })?;

    if s == t {
        return Err(GraphError::Cycle {
            path: vec![target.to_string(), target.to_string()],
        });
    }

    if let Some(existing) = graph.path_between(s, t) {
        let mut cycle = Vec::with_capacity(existing.len() + 1);
        cycle.push(t);
        cycle.extend(existing);
        return Err(GraphError::Cycle {
            path: graph.path_ids(&cycle),
        });
    }
    Ok(())
}
