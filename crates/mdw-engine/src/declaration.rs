//! Middleware declarations.
//!
//! A [`MiddlewareDeclaration`] is the input entity of the ordering engine:
//! a unique name, optional positioning hints, optional hard requirements,
//! and an opaque handler payload. The engine reads the name and the
//! constraint lists; the handler is carried through untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::middleware::{BoxedMiddleware, Middleware};

/// A named middleware with positioning metadata.
///
/// Positioning hints (`insert_before`, `insert_after`) are soft: a hint
/// whose target is not registered is ignored. Requirements (`requires`)
/// are hard: sorting fails if a required name is absent. The two are
/// deliberately orthogonal: `requires` implies no ordering, and hints
/// imply no presence.
///
/// # Example
///
/// ```
/// use mdw_engine::MiddlewareDeclaration;
///
/// let flash = MiddlewareDeclaration::new("flash")
///     .after(["cookie"])
///     .require(["cookie"]);
///
/// assert_eq!(flash.name(), "flash");
/// assert_eq!(flash.insert_after(), ["cookie"]);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct MiddlewareDeclaration {
    /// Unique name of this middleware within a stack.
    name: String,

    /// Names this middleware must precede.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    insert_before: Vec<String>,

    /// Names this middleware must follow.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    insert_after: Vec<String>,

    /// Names that must be registered for this middleware to sort.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    requires: Vec<String>,

    /// Opaque handler payload. Never inspected by the ordering engine.
    #[serde(skip)]
    handler: Option<BoxedMiddleware>,
}

impl MiddlewareDeclaration {
    /// Creates a declaration with the given name and no constraints.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            insert_before: Vec::new(),
            insert_after: Vec::new(),
            requires: Vec::new(),
            handler: None,
        }
    }

    /// Adds names this middleware must precede.
    #[must_use]
    pub fn before<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_before.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds names this middleware must follow.
    #[must_use]
    pub fn after<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_after.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds names that must be present in the stack.
    #[must_use]
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(names.into_iter().map(Into::into));
        self
    }

    /// Attaches the handler payload.
    #[must_use]
    pub fn handler<M: Middleware>(mut self, handler: M) -> Self {
        self.handler = Some(std::sync::Arc::new(handler));
        self
    }

    /// Attaches an already-boxed handler payload.
    #[must_use]
    pub fn boxed_handler(mut self, handler: BoxedMiddleware) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Returns the middleware name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the names this middleware must precede.
    #[must_use]
    pub fn insert_before(&self) -> &[String] {
        &self.insert_before
    }

    /// Returns the names this middleware must follow.
    #[must_use]
    pub fn insert_after(&self) -> &[String] {
        &self.insert_after
    }

    /// Returns the names this middleware requires to be present.
    #[must_use]
    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    /// Returns the handler payload, if one is attached.
    #[must_use]
    pub fn handler_ref(&self) -> Option<&BoxedMiddleware> {
        self.handler.as_ref()
    }

    /// Returns `true` if a handler payload is attached.
    ///
    /// Declarations loaded from a manifest have no handler; they exist so
    /// an order can be computed and validated ahead of deployment.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

impl fmt::Debug for MiddlewareDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareDeclaration")
            .field("name", &self.name)
            .field("insert_before", &self.insert_before)
            .field("insert_after", &self.insert_after)
            .field("requires", &self.requires)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}
