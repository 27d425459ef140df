//! # mdw-engine
//!
//! Constraint-driven middleware ordering for the Bhojpur middleware
//! manager.
//!
//! Middlewares are declared with a unique name, soft positioning hints
//! (`insert_before`, `insert_after`) and hard presence requirements
//! (`requires`). The engine computes a deterministic execution order that
//! satisfies every constraint, or reports a structured error when none
//! exists.
//!
//! ## Components
//!
//! | Component | Responsibility |
//! |-----------|----------------|
//! | [`MiddlewareStack`] | Accumulates declarations, guarantees name uniqueness, preserves registration order |
//! | Resolver (internal) | Turns hints into predecessor sets; validates `requires` |
//! | Sorter (internal) | Stable topological sort, ties broken by registration order |
//! | [`CompiledChain`] | Runs the sorted handlers around a terminal handler |
//!
//! ## Ordering rules
//!
//! - `a.insert_after(["b"])` places `a` after `b`; `a.insert_before(["b"])`
//!   places `a` before `b`. Hints whose target is not registered are
//!   ignored (strict mode turns them into errors).
//! - `requires` asserts presence only. It never implies an order; a
//!   middleware that needs both must state both.
//! - Middlewares with no path between them keep registration order.
//! - Sorting is pure and synchronous: no I/O, no logging, no state kept
//!   between calls.
//!
//! ## Example
//!
//! ```
//! use mdw_engine::{MiddlewareDeclaration, MiddlewareStack};
//!
//! # fn main() -> mdw_engine::OrderingResult<()> {
//! let mut stack = MiddlewareStack::new();
//! stack.register(MiddlewareDeclaration::new("cookie"))?;
//! stack.register(MiddlewareDeclaration::new("flash").after(["cookie"]))?;
//! stack.register(MiddlewareDeclaration::new("auth").after(["flash"]))?;
//!
//! let order: Vec<_> = stack.sort()?.iter().map(|d| d.name().to_string()).collect();
//! assert_eq!(order, ["cookie", "flash", "auth"]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod declaration;
pub mod error;
pub mod middleware;
pub mod registry;

mod resolver;
mod sorter;

pub use chain::CompiledChain;
pub use declaration::MiddlewareDeclaration;
pub use error::{OrderingError, OrderingResult};
pub use middleware::{BoxFuture, BoxedMiddleware, FnMiddleware, Middleware, Next, Request, Response};
pub use registry::MiddlewareStack;
