//! The middleware execution contract.
//!
//! This module defines the [`Middleware`] trait that handler payloads
//! implement, and the [`Next`] callback used to walk a compiled chain. The
//! ordering components never call into this trait; they carry boxed
//! middlewares as opaque data and only the [compiled chain](crate::chain)
//! invokes them.
//!
//! # Example
//!
//! ```
//! use mdw_engine::{BoxFuture, Middleware, Next, Request, Response};
//!
//! struct PassThrough;
//!
//! impl Middleware for PassThrough {
//!     fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
//!         Box::pin(async move { next.run(request).await })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;

/// A boxed future that returns a value of type `T`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The HTTP request type flowing through a compiled chain.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type flowing through a compiled chain.
pub type Response = http::Response<Full<Bytes>>;

/// The execution contract of a middleware handler.
///
/// A middleware receives the incoming request and a [`Next`] callback. It
/// must call `next.run()` exactly once to continue down the chain, or
/// return its own response to short-circuit.
///
/// The middleware's name and positioning constraints live on its
/// [`MiddlewareDeclaration`](crate::MiddlewareDeclaration), not here: the
/// ordering engine treats implementations of this trait as carried data.
pub trait Middleware: Send + Sync + 'static {
    /// Processes the request, forwarding to `next` to continue the chain.
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response>;
}

/// A reference-counted, type-erased middleware handler.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Callback that invokes the rest of a compiled chain.
///
/// Passed to each middleware; consuming `run` ensures it can be called at
/// most once. A middleware that never calls `run` short-circuits the chain.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More middleware to process.
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain: invoke the terminal handler.
    Handler(Box<dyn FnOnce(Request) -> BoxFuture<'static, Response> + Send + 'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given middleware.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub(crate) fn handler<F>(f: F) -> Self
    where
        F: FnOnce(Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next middleware or the terminal handler.
    pub async fn run(self, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(request, *next).await,
            NextInner::Handler(handler) => handler(request).await,
        }
    }
}

/// A middleware built from a plain function.
///
/// Useful for small middlewares that do not carry state of their own.
///
/// # Example
///
/// ```
/// use mdw_engine::{BoxFuture, FnMiddleware, Next, Request, Response};
///
/// fn passthrough<'a>(request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
///     Box::pin(async move { next.run(request).await })
/// }
///
/// let middleware = FnMiddleware::new(passthrough);
/// ```
pub struct FnMiddleware<F> {
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Response> + Send + Sync + 'static,
{
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        (self.func)(request, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};

    struct HeaderTagging {
        value: &'static str,
    }

    impl Middleware for HeaderTagging {
        fn process<'a>(&'a self, mut request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                request
                    .headers_mut()
                    .append("x-visited", self.value.parse().unwrap());
                next.run(request).await
            })
        }
    }

    fn ok_response(body: &'static str) -> Response {
        HttpResponse::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from(body)))
            .unwrap()
    }

    fn empty_request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_next_handler() {
        let next = Next::handler(|_req| Box::pin(async { ok_response("OK") }));
        let response = next.run(empty_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_chain_runs_in_order() {
        let first = HeaderTagging { value: "first" };
        let second = HeaderTagging { value: "second" };

        let handler = Next::handler(|req: Request| {
            let visited: Vec<_> = req
                .headers()
                .get_all("x-visited")
                .iter()
                .map(|v| v.to_str().unwrap().to_string())
                .collect();
            Box::pin(async move {
                assert_eq!(visited, vec!["first", "second"]);
                ok_response("OK")
            })
        });

        let next = Next::new(&first, Next::new(&second, handler));
        let response = next.run(empty_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler() {
        struct Reject;

        impl Middleware for Reject {
            fn process<'a>(&'a self, _request: Request, _next: Next<'a>) -> BoxFuture<'a, Response> {
                Box::pin(async {
                    HttpResponse::builder()
                        .status(StatusCode::FORBIDDEN)
                        .body(Full::new(Bytes::new()))
                        .unwrap()
                })
            }
        }

        let reject = Reject;
        let handler = Next::handler(|_req| {
            Box::pin(async {
                panic!("handler must not run");
            })
        });

        let next = Next::new(&reject, handler);
        let response = next.run(empty_request()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    fn tag_upstream<'a>(request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        Box::pin(async move { next.run(request).await })
    }

    #[tokio::test]
    async fn test_fn_middleware() {
        let middleware = FnMiddleware::new(tag_upstream);
        let handler = Next::handler(|_req| Box::pin(async { ok_response("done") }));

        let next = Next::new(&middleware, handler);
        let response = next.run(empty_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
