//! Request middleware
//!
//! Middleware runs before the dispatcher and may answer a request itself.
//! An empty chain lets every request straight through.

pub mod auth;

pub use auth::{AccessGate, BasicAuth, BasicCredentials, REALM};

use crate::{Request, Response};

/// Middleware trait - inspect a request before it is dispatched
pub trait Middleware: Send + Sync {
    /// Return a response to short-circuit the request, or `None` to pass it on
    fn before(&self, req: &Request) -> Option<Response>;
}

/// Middleware chain
#[derive(Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    /// Number of installed middlewares
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Run middlewares in order, return early response if any
    pub fn run_before(&self, req: &Request) -> Option<Response> {
        self.middlewares.iter().find_map(|m| m.before(req))
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.middlewares.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RequestBuilder, StatusCode};

    struct Deny;

    impl Middleware for Deny {
        fn before(&self, _req: &Request) -> Option<Response> {
            Some(Response::new(StatusCode::UNAUTHORIZED))
        }
    }

    #[test]
    fn test_empty_chain_passes() {
        let chain = MiddlewareChain::new();
        assert!(chain.is_empty());
        assert!(chain.run_before(&RequestBuilder::new("GET", "/").build()).is_none());
    }

    #[test]
    fn test_chain_short_circuits() {
        let mut chain = MiddlewareChain::new();
        chain.add(Deny);
        assert_eq!(chain.len(), 1);

        let res = chain.run_before(&RequestBuilder::new("GET", "/").build()).unwrap();
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    }
}
