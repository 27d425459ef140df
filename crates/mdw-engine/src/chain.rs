//! Compiling a sorted stack into an executable chain.
//!
//! Ordering and execution are separate concerns: the stack computes an
//! order, and a [`CompiledChain`] runs the ordered handlers around a
//! terminal handler. Declarations registered without a handler payload
//! (typical for manifest-loaded stacks that only need validation) are
//! skipped at compile time.
//!
//! # Example
//!
//! ```
//! use mdw_engine::{
//!     BoxFuture, Middleware, MiddlewareDeclaration, MiddlewareStack, Next, Request, Response,
//! };
//!
//! struct Noop;
//!
//! impl Middleware for Noop {
//!     fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
//!         Box::pin(async move { next.run(request).await })
//!     }
//! }
//!
//! # fn main() -> mdw_engine::OrderingResult<()> {
//! let mut stack = MiddlewareStack::new();
//! stack.register(MiddlewareDeclaration::new("noop").handler(Noop))?;
//!
//! let chain = stack.compile()?;
//! assert_eq!(chain.stage_names(), ["noop"]);
//! # Ok(())
//! # }
//! ```

use crate::error::OrderingResult;
use crate::middleware::{BoxFuture, BoxedMiddleware, Next, Request, Response};
use crate::registry::MiddlewareStack;

/// A snapshot of the sorted, executable middlewares of a stack.
///
/// Compiled once, run many times. The chain does not observe later changes
/// to the stack it was compiled from; recompile after registering.
pub struct CompiledChain {
    /// Sorted (name, handler) pairs.
    stages: Vec<(String, BoxedMiddleware)>,
}

impl MiddlewareStack {
    /// Sorts the stack and captures the handlers in execution order.
    ///
    /// # Errors
    ///
    /// Fails with the same errors as [`sort`](Self::sort); a stack that
    /// cannot be ordered cannot be compiled.
    pub fn compile(&self) -> OrderingResult<CompiledChain> {
        let stages = self
            .sort()?
            .into_iter()
            .filter_map(|declaration| {
                let handler = declaration.handler_ref().cloned()?;
                Some((declaration.name().to_string(), handler))
            })
            .collect();

        Ok(CompiledChain { stages })
    }
}

impl CompiledChain {
    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Returns the number of executable stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs the request through every stage, then the terminal handler.
    ///
    /// The chain is wrapped back to front so the first sorted middleware
    /// sees the request first and the response last.
    pub async fn process<H>(&self, request: Request, handler: H) -> Response
    where
        H: FnOnce(Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let mut next = Next::handler(handler);
        for (_, middleware) in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next.run(request).await
    }
}

impl std::fmt::Debug for CompiledChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledChain")
            .field("stages", &self.stage_names())
            .finish()
    }
}
