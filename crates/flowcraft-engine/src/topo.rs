//! Topological ordering over workflow graphs
//!
//! Dependencies-first depth-first traversal: every node is emitted
//! after all sources of its incoming edges. Nodes are considered in
//! input order, which makes roots (no incoming edges) come first and
//! covers disconnected subgraphs; a fully-cyclic graph is entered at
//! the first node and rejected there. A node reached while already on
//! the traversal stack signals a circular dependency, which fails the
//! whole run.

use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::types::{GraphEdge, GraphNode};

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Compute a topological order over `nodes`, returned as indices into
/// the input slice. `edges` are dependency edges: target depends on
/// source.
pub fn topological_order(nodes: &[GraphNode], edges: &[GraphEdge]) -> Result<Vec<usize>> {
    let index_of: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    // Dependencies (incoming edge sources) per node index. Edges that
    // reference unknown nodes are ignored rather than failing the run.
    let mut deps: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for edge in edges {
        if let (Some(&src), Some(&dst)) = (
            index_of.get(edge.source.as_str()),
            index_of.get(edge.target.as_str()),
        ) {
            deps[dst].push(src);
        }
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());

    // Roots come first because nodes are considered in input order and
    // a root has no dependencies to recurse into.
    for start in 0..nodes.len() {
        visit(start, nodes, &deps, &mut marks, &mut order)?;
    }

    Ok(order)
}

fn visit(
    index: usize,
    nodes: &[GraphNode],
    deps: &[Vec<usize>],
    marks: &mut [Mark],
    order: &mut Vec<usize>,
) -> Result<()> {
    match marks[index] {
        Mark::Done => return Ok(()),
        Mark::InProgress => {
            return Err(EngineError::CircularDependency(nodes[index].id.clone()));
        }
        Mark::Unvisited => {}
    }

    marks[index] = Mark::InProgress;
    for &dep in &deps[index] {
        visit(dep, nodes, deps, marks, order)?;
    }
    marks[index] = Mark::Done;
    order.push(index);
    Ok(())
}
