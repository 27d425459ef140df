//! Constraint resolution.
//!
//! Turns each declaration's local positioning hints into predecessor sets
//! keyed by registration index. Requirements are checked here, before any
//! ordering work: a missing `requires` target is fatal, while a missing
//! hint target is dropped (or, in strict mode, reported).

use std::collections::HashSet;

use crate::error::{OrderingError, OrderingResult};
use crate::registry::MiddlewareStack;

/// Adjacency information derived from the hints of every declaration.
///
/// Lives only for the duration of a single sort. Keyed by registration
/// index so the sorter's inner loop never touches names.
#[derive(Debug)]
pub(crate) struct ResolvedGraph {
    /// For each node, the nodes that must precede it.
    pub(crate) predecessors: Vec<HashSet<usize>>,
}

impl ResolvedGraph {
    fn with_capacity(nodes: usize) -> Self {
        Self {
            predecessors: vec![HashSet::new(); nodes],
        }
    }

    /// Records that `from` must precede `to`. Duplicate edges collapse.
    fn add_edge(&mut self, from: usize, to: usize) {
        self.predecessors[to].insert(from);
    }
}

/// Computes the resolved graph for the current stack contents.
///
/// `requires` contributes presence checks only, never edges: an optional
/// ordering hint is a different statement than an existence precondition,
/// and a middleware that needs both must state both.
pub(crate) fn resolve(stack: &MiddlewareStack) -> OrderingResult<ResolvedGraph> {
    for declaration in stack.iter() {
        let missing: Vec<String> = declaration
            .requires()
            .iter()
            .filter(|name| !stack.contains(name))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(OrderingError::missing_requirement(
                declaration.name(),
                missing,
            ));
        }
    }

    if stack.is_strict() {
        for declaration in stack.iter() {
            let unknown: Vec<String> = declaration
                .insert_before()
                .iter()
                .chain(declaration.insert_after())
                .filter(|name| !stack.contains(name))
                .cloned()
                .collect();

            if !unknown.is_empty() {
                return Err(OrderingError::unknown_hint_target(
                    declaration.name(),
                    unknown,
                ));
            }
        }
    }

    let mut graph = ResolvedGraph::with_capacity(stack.len());

    for (node, declaration) in stack.iter().enumerate() {
        for target in declaration.insert_after() {
            if let Some(other) = stack.position(target) {
                graph.add_edge(other, node);
            }
        }
        for target in declaration.insert_before() {
            if let Some(other) = stack.position(target) {
                graph.add_edge(node, other);
            }
        }
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::MiddlewareDeclaration;

    fn stack_of(declarations: Vec<MiddlewareDeclaration>) -> MiddlewareStack {
        let mut stack = MiddlewareStack::new();
        for declaration in declarations {
            stack.register(declaration).unwrap();
        }
        stack
    }

    #[test]
    fn test_insert_after_creates_predecessor_edge() {
        let stack = stack_of(vec![
            MiddlewareDeclaration::new("cookie"),
            MiddlewareDeclaration::new("flash").after(["cookie"]),
        ]);

        let graph = resolve(&stack).unwrap();
        assert!(graph.predecessors[1].contains(&0));
        assert!(graph.predecessors[0].is_empty());
    }

    #[test]
    fn test_insert_before_creates_predecessor_edge_on_target() {
        let stack = stack_of(vec![
            MiddlewareDeclaration::new("router"),
            MiddlewareDeclaration::new("auth").before(["router"]),
        ]);

        let graph = resolve(&stack).unwrap();
        assert!(graph.predecessors[0].contains(&1));
        assert!(graph.predecessors[1].is_empty());
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        // Both sides state the same constraint; only one edge results.
        let stack = stack_of(vec![
            MiddlewareDeclaration::new("cookie").before(["flash"]),
            MiddlewareDeclaration::new("flash").after(["cookie"]),
        ]);

        let graph = resolve(&stack).unwrap();
        assert_eq!(graph.predecessors[1].len(), 1);
        assert!(graph.predecessors[0].is_empty());
    }

    #[test]
    fn test_unknown_hint_target_is_dropped() {
        let stack = stack_of(vec![
            MiddlewareDeclaration::new("solo").after(["ghost"]).before(["phantom"])
        ]);

        let graph = resolve(&stack).unwrap();
        assert!(graph.predecessors[0].is_empty());
    }

    #[test]
    fn test_unknown_hint_target_errors_in_strict_mode() {
        let mut stack = MiddlewareStack::strict();
        stack
            .register(MiddlewareDeclaration::new("solo").after(["ghost"]))
            .unwrap();

        let err = resolve(&stack).unwrap_err();
        assert_eq!(
            err,
            OrderingError::UnknownHintTarget {
                declarer: "solo".to_string(),
                unknown: vec!["ghost".to_string()],
            }
        );
    }

    #[test]
    fn test_missing_requirement_is_fatal() {
        let stack = stack_of(vec![
            MiddlewareDeclaration::new("flash").require(["cookie"]),
            MiddlewareDeclaration::new("session"),
        ]);

        let err = resolve(&stack).unwrap_err();
        assert_eq!(
            err,
            OrderingError::MissingRequirement {
                declarer: "flash".to_string(),
                missing: vec!["cookie".to_string()],
            }
        );
    }

    #[test]
    fn test_missing_requirement_reports_all_missing_names() {
        let stack = stack_of(vec![
            MiddlewareDeclaration::new("auth").require(["cookie", "session", "flash"]),
            MiddlewareDeclaration::new("session"),
        ]);

        let err = resolve(&stack).unwrap_err();
        assert_eq!(
            err,
            OrderingError::MissingRequirement {
                declarer: "auth".to_string(),
                missing: vec!["cookie".to_string(), "flash".to_string()],
            }
        );
    }

    #[test]
    fn test_requires_contributes_no_edges() {
        let stack = stack_of(vec![
            MiddlewareDeclaration::new("cookie"),
            MiddlewareDeclaration::new("flash").require(["cookie"]),
        ]);

        let graph = resolve(&stack).unwrap();
        assert!(graph.predecessors[0].is_empty());
        assert!(graph.predecessors[1].is_empty());
    }

    #[test]
    fn test_self_hint_creates_self_edge() {
        let stack = stack_of(vec![MiddlewareDeclaration::new("ouroboros").after(["ouroboros"])]);

        let graph = resolve(&stack).unwrap();
        assert!(graph.predecessors[0].contains(&0));
    }
}
