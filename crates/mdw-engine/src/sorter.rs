//! Stable topological sorting.
//!
//! Implements a repeated-pass scheme: each round walks the pending nodes
//! in registration order and emits every node whose predecessors have all
//! been emitted. A node emitted early in a round can unblock a node later
//! in the same round. A round that emits nothing while nodes remain means
//! the leftover subgraph contains a cycle or an unsatisfiable constraint.
//!
//! The repeated pass is chosen over textbook Kahn or DFS variants because
//! it breaks ties by registration order without extra bookkeeping: among
//! nodes that become ready together, the one registered first is emitted
//! first. The cost is bounded by one pass per emitted node, which is fine
//! for the expected stack sizes (tens to low hundreds).

use crate::error::{OrderingError, OrderingResult};
use crate::registry::MiddlewareStack;
use crate::resolver::ResolvedGraph;

/// Computes the emission order as registration indices.
pub(crate) fn sort(stack: &MiddlewareStack, graph: &ResolvedGraph) -> OrderingResult<Vec<usize>> {
    let total = stack.len();
    let mut pending: Vec<usize> = (0..total).collect();
    let mut emitted = Vec::with_capacity(total);
    let mut placed = vec![false; total];

    while !pending.is_empty() {
        let before = emitted.len();

        pending.retain(|&node| {
            let ready = graph.predecessors[node].iter().all(|&p| placed[p]);
            if ready {
                placed[node] = true;
                emitted.push(node);
            }
            !ready
        });

        if emitted.len() == before {
            let remaining = pending
                .iter()
                .map(|&node| stack.declarations()[node].name().to_string())
                .collect();
            return Err(OrderingError::unresolvable_order(remaining));
        }
    }

    Ok(emitted)
}
