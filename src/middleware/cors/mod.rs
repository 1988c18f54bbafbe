//! CORS (Cross-Origin Resource Sharing) request filter.
//!
//! The filter sits in front of an arbitrary downstream handler and decides,
//! per request, between three terminal outcomes:
//!
//! - **Reject**: no `Origin` header, or the origin is not allowed. The
//!   request is forwarded downstream unchanged and the response carries no
//!   CORS headers. This is deliberately a permissive pass-through, not a 403:
//!   from the filter's point of view the request is simply not a CORS
//!   request, and the application may still want to serve it.
//! - **Preflight-Terminal**: allowed origin and method `OPTIONS`. The filter
//!   answers 204 with the full preflight header set; downstream is never
//!   invoked.
//! - **Pass-Decorate**: allowed origin, any other method. Downstream runs
//!   first, then the filter adds the CORS headers to whatever it produced.
//!
//! `Access-Control-Allow-Origin` always reflects the literal request Origin,
//! never the `*` wildcard value. Reflection is required once credentials are
//! in play and is harmless otherwise.

mod config;
mod error;
mod matcher;

pub use config::CorsConfig;
pub use error::CorsConfigError;
pub use matcher::{OriginMatcher, OriginRule};

use std::sync::Arc;
use std::time::Duration;

use http::Method;
use serde_json::Value;
use tracing::debug;

use crate::middleware::Middleware;
use crate::pipeline::{FilterChain, Handler, HandlerRequest, HandlerResponse, HeaderVec};

use config::{merge_unique, DEFAULT_ALLOW_HEADERS, DEFAULT_EXPOSE_HEADERS};

/// The CORS filter.
///
/// Immutable after construction and safe for concurrent invocation by many
/// simultaneous requests: all per-request state is local to the call, and the
/// shared configuration is read-only. The header values that do not depend on
/// the request are joined once at construction, so the request path only
/// clones prebuilt strings.
///
/// # Construction
///
/// ```
/// use corsgate::{CorsConfig, CorsFilter};
///
/// let config = CorsConfig {
///     allow_origins: vec!["https://*.example.com".to_string()],
///     ..CorsConfig::default()
/// };
/// let filter = CorsFilter::new(config, "api-cors").unwrap();
/// assert_eq!(filter.name(), "api-cors");
/// ```
///
/// Construction is the only fallible operation: a pattern that fails to
/// compile yields a [`CorsConfigError`] and no filter. Nothing on the
/// per-request path can error.
#[derive(Debug)]
pub struct CorsFilter {
    /// Opaque instance label, used only for diagnostics
    name: String,
    matcher: OriginMatcher,
    allow_credentials: bool,
    /// Merged allow-header set (defaults ∪ configured)
    allow_headers: Vec<String>,
    /// Merged expose-header set (defaults ∪ configured)
    expose_headers: Vec<String>,
    // Prejoined header values for the request path.
    methods_value: String,
    allow_headers_value: String,
    expose_headers_value: String,
    credentials_value: String,
    max_age_value: String,
}

impl CorsFilter {
    /// Build a filter from its configuration.
    ///
    /// `name` is an opaque identifier carried into log events; it never
    /// affects behavior. Compiles the allow-origin patterns and captures the
    /// merged header sets.
    ///
    /// # Errors
    ///
    /// Returns [`CorsConfigError`] when any allow-origin pattern fails to
    /// compile. The failure is atomic; no filter is created.
    pub fn new(config: CorsConfig, name: impl Into<String>) -> Result<Self, CorsConfigError> {
        let name = name.into();
        let matcher = OriginMatcher::compile(&config.allow_origins)?;

        let allow_headers = merge_unique(DEFAULT_ALLOW_HEADERS, &config.allow_headers);
        let expose_headers = merge_unique(DEFAULT_EXPOSE_HEADERS, &config.expose_headers);

        debug!(
            filter = %name,
            patterns = config.allow_origins.len(),
            allow_headers = allow_headers.len(),
            expose_headers = expose_headers.len(),
            "compiled CORS filter"
        );

        Ok(Self {
            name,
            matcher,
            allow_credentials: config.allow_credentials,
            methods_value: config.allow_methods.join(", "),
            allow_headers_value: allow_headers.join(", "),
            expose_headers_value: expose_headers.join(", "),
            credentials_value: config.allow_credentials.to_string(),
            max_age_value: config.max_age.to_string(),
            allow_headers,
            expose_headers,
        })
    }

    /// The diagnostics label this filter was created with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The merged allow-header set (defaults unioned with configuration).
    #[must_use]
    pub fn allow_headers(&self) -> &[String] {
        &self.allow_headers
    }

    /// The merged expose-header set (defaults unioned with configuration).
    #[must_use]
    pub fn expose_headers(&self) -> &[String] {
        &self.expose_headers
    }

    /// The compiled origin matcher.
    #[must_use]
    pub fn matcher(&self) -> &OriginMatcher {
        &self.matcher
    }

    /// Whether this filter reports credentials as allowed.
    #[must_use]
    pub fn allow_credentials(&self) -> bool {
        self.allow_credentials
    }

    /// Wrap a downstream handler, yielding a pipeline that is itself a
    /// [`Handler`] and so composes wherever a plain handler is expected.
    #[must_use]
    pub fn wrap(self, downstream: Arc<dyn Handler>) -> FilterChain {
        FilterChain::new(downstream).with(Arc::new(self))
    }

    /// Extract the request Origin if present and allowed.
    ///
    /// An absent or empty Origin and a disallowed origin land in the same
    /// place: `None`, the Reject branch.
    fn allowed_origin<'r>(&self, req: &'r HandlerRequest) -> Option<&'r str> {
        let origin = req.get_header("origin").filter(|o| !o.is_empty())?;
        if self.matcher.matches(origin) {
            Some(origin)
        } else {
            None
        }
    }

    /// Set the headers common to preflight and decorated responses: the
    /// reflected origin, the credentials flag, and the allow-header set.
    fn inject_origin(&self, res: &mut HandlerResponse, origin: &str) {
        res.set_header("Access-Control-Allow-Origin", origin.to_string());
        res.set_header(
            "Access-Control-Allow-Credentials",
            self.credentials_value.clone(),
        );
        res.set_header(
            "Access-Control-Allow-Headers",
            self.allow_headers_value.clone(),
        );
    }
}

impl Middleware for CorsFilter {
    /// Short-circuit allowed preflight requests.
    ///
    /// Returns the terminal 204 response for an allowed `OPTIONS` request;
    /// every other request - including rejects - proceeds downstream.
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        let origin = self.allowed_origin(req)?;
        if req.method != Method::OPTIONS {
            return None;
        }

        let mut res = HandlerResponse::new(204, HeaderVec::new(), Value::Null);
        self.inject_origin(&mut res, origin);
        res.set_header("Access-Control-Allow-Methods", self.methods_value.clone());
        res.set_header("Access-Control-Max-Age", self.max_age_value.clone());

        debug!(
            filter = %self.name,
            origin = %origin,
            path = %req.path,
            "preflight short-circuit"
        );
        Some(res)
    }

    /// Decorate responses for allowed non-preflight requests.
    ///
    /// Runs after downstream execution and before the response is flushed to
    /// the transport, so downstream's own status, body, and headers survive.
    /// Reject-path responses are left untouched.
    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        // An allowed OPTIONS already carries its full preflight header set
        // from before(); a rejected OPTIONS gets no decoration either way.
        if req.method == Method::OPTIONS {
            return;
        }
        let Some(origin) = self.allowed_origin(req) else {
            debug!(filter = %self.name, path = %req.path, "no allowed origin, passing through");
            return;
        };

        self.inject_origin(res, origin);
        res.set_header(
            "Access-Control-Expose-Headers",
            self.expose_headers_value.clone(),
        );
    }
}
