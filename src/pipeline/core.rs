//! Pipeline core module - the request/response plumbing the filter sits in.
//!
//! Everything here is deliberately host-agnostic: the surrounding HTTP server
//! decodes the wire request into a [`HandlerRequest`], the pipeline produces a
//! [`HandlerResponse`], and the transport writes it out. The only contract a
//! downstream application has to satisfy is the single-method [`Handler`]
//! trait.

use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::debug;

use crate::middleware::Middleware;

/// Maximum inline headers before heap allocation.
/// Most requests carry ≤16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the request path.
///
/// Header names use `Arc<str>` instead of `String` because names repeat
/// heavily across requests (Origin, Content-Type, ...) and `Arc::clone()` is
/// an O(1) atomic increment. Values remain `String` as they are per-request
/// data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// An HTTP request as seen by the filter pipeline.
///
/// Carries only what middleware and downstream handlers need: the method,
/// the path (for diagnostics), the headers, and an optional JSON body.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// HTTP method (GET, POST, OPTIONS, ...)
    pub method: Method,
    /// Request path, used for logging only
    pub path: String,
    /// HTTP headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
}

impl HandlerRequest {
    /// Create a request with no body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderVec) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            body: None,
        }
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response flowing back through the pipeline.
///
/// Headers can be mutated freely until the transport flushes the response;
/// middleware `after` hooks rely on that window to decorate the result.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 204, 404, ...)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body as JSON; `Value::Null` means an empty body
    pub body: Value,
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body.
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a `content-type` header preset.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get a header by name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header. Replacement is case-insensitive on the name.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// The downstream handler abstraction.
///
/// Anything that turns a request into a response can terminate a pipeline:
/// an application router, a stub in tests, or a plain closure via the blanket
/// impl below.
pub trait Handler: Send + Sync {
    /// Produce a response for the request.
    fn handle(&self, req: &HandlerRequest) -> HandlerResponse;
}

impl<F> Handler for F
where
    F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync,
{
    fn handle(&self, req: &HandlerRequest) -> HandlerResponse {
        self(req)
    }
}

/// An ordered middleware stack wrapped around a downstream handler.
///
/// `FilterChain` implements [`Handler`] itself, so a filtered pipeline
/// composes transparently wherever a plain handler is expected - including
/// inside another chain.
///
/// Dispatch order:
///
/// 1. Every middleware's `before` runs, in registration order. The first one
///    to return a response wins; later `before` hooks still run but cannot
///    override it.
/// 2. If no middleware answered early, the downstream handler runs.
/// 3. Every middleware's `after` runs, in registration order, with the
///    response and the measured downstream latency (zero for early
///    responses).
pub struct FilterChain {
    middlewares: Vec<Arc<dyn Middleware>>,
    downstream: Arc<dyn Handler>,
}

impl FilterChain {
    /// Create a chain around a downstream handler with no middleware yet.
    #[must_use]
    pub fn new(downstream: Arc<dyn Handler>) -> Self {
        Self {
            middlewares: Vec::new(),
            downstream,
        }
    }

    /// Append a middleware to the chain. Middleware runs in the order added.
    #[must_use]
    pub fn with(mut self, mw: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(mw);
        self
    }

    /// Run the request through the middleware stack and the downstream
    /// handler.
    pub fn dispatch(&self, req: &HandlerRequest) -> HandlerResponse {
        let mut early: Option<HandlerResponse> = None;
        for (idx, mw) in self.middlewares.iter().enumerate() {
            if early.is_none() {
                early = mw.before(req);
                if early.is_some() {
                    debug!(
                        middleware_idx = idx,
                        method = %req.method,
                        path = %req.path,
                        "middleware returned early response"
                    );
                }
            } else {
                mw.before(req);
            }
        }

        let (mut res, latency) = match early {
            Some(res) => (res, Duration::from_millis(0)),
            None => {
                let start = Instant::now();
                let res = self.downstream.handle(req);
                (res, start.elapsed())
            }
        };

        for mw in &self.middlewares {
            mw.after(req, &mut res, latency);
        }

        res
    }
}

impl Handler for FilterChain {
    fn handle(&self, req: &HandlerRequest) -> HandlerResponse {
        self.dispatch(req)
    }
}
