//! # corsgate
//!
//! **corsgate** is a pass-through CORS (Cross-Origin Resource Sharing) filter
//! for HTTP request pipelines. It wraps an arbitrary downstream handler,
//! decides per request whether the calling origin is permitted, and injects
//! the appropriate `Access-Control-*` response headers - short-circuiting
//! preflight `OPTIONS` exchanges entirely.
//!
//! It is not a server, a router, or a proxy: the surrounding pipeline owns
//! the transport, and corsgate composes wherever a plain request handler is
//! expected.
//!
//! ## Architecture
//!
//! Two components, composed linearly in the request path:
//!
//! - **[`OriginMatcher`]** - compiles the configured allow-patterns (exact
//!   origins, `https://*.example.com` wildcard patterns, or the absolute
//!   `*`) once at startup into anchored match rules, then answers "is this
//!   origin allowed?" per request. Pure and stateless after construction.
//! - **[`CorsFilter`]** - holds the matcher plus the static header
//!   configuration and implements the per-request decision logic as a
//!   [`Middleware`]: reject pass-through, preflight short-circuit, or
//!   post-downstream decoration.
//!
//! ### Request flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Chain as FilterChain
//!     participant Cors as CorsFilter
//!     participant App as Downstream Handler
//!
//!     Client->>Chain: request
//!     Chain->>Cors: before(req)
//!     alt Origin absent or disallowed
//!         Cors-->>Chain: None (Reject)
//!         Chain->>App: handle(req)
//!         App-->>Client: response, untouched
//!     else Allowed + OPTIONS
//!         Cors-->>Chain: 204 preflight (terminal)
//!         Chain-->>Client: preflight headers, empty body
//!     else Allowed + other method
//!         Cors-->>Chain: None
//!         Chain->>App: handle(req)
//!         Chain->>Cors: after(req, res)
//!         Cors-->>Chain: res + CORS headers
//!         Chain-->>Client: decorated response
//!     end
//! ```
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//!
//! use corsgate::{CorsConfig, CorsFilter, HandlerRequest, HandlerResponse, HeaderVec};
//! use http::Method;
//! use serde_json::json;
//!
//! let config = CorsConfig {
//!     allow_origins: vec!["https://app.example.com".to_string()],
//!     ..CorsConfig::default()
//! };
//! let filter = CorsFilter::new(config, "api-cors").unwrap();
//!
//! // Any Fn(&HandlerRequest) -> HandlerResponse is a downstream handler.
//! let chain = filter.wrap(Arc::new(|_req: &HandlerRequest| {
//!     HandlerResponse::json(200, json!({ "ok": true }))
//! }));
//!
//! let mut headers = HeaderVec::new();
//! headers.push((Arc::from("Origin"), "https://app.example.com".to_string()));
//! let res = chain.dispatch(&HandlerRequest::new(Method::GET, "/widgets", headers));
//!
//! assert_eq!(res.status, 200);
//! assert_eq!(
//!     res.get_header("Access-Control-Allow-Origin"),
//!     Some("https://app.example.com"),
//! );
//! ```
//!
//! ## Behavior notes
//!
//! - A request without an `Origin` header, or with one the matcher rejects,
//!   is forwarded downstream unchanged - a same-origin-equivalent request,
//!   not an error. No CORS headers are added and no 403 is produced.
//! - `Access-Control-Allow-Origin` always reflects the literal request
//!   Origin, never the `*` wildcard value, which keeps the filter compatible
//!   with credentials mode.
//! - The configured allow/expose header lists are unioned with fixed default
//!   sets at construction; the union is case-insensitive and idempotent.
//! - Construction fails loudly ([`CorsConfigError`]) on a malformed origin
//!   pattern. Nothing on the per-request path can error.
//!
//! The filter is immutable after construction and safe to share across
//! threads; it holds no per-request state, performs no blocking, and owns no
//! timeout or cancellation logic.

pub mod middleware;
pub mod pipeline;

pub use middleware::{CorsConfig, CorsConfigError, CorsFilter, Middleware, OriginMatcher, OriginRule};
pub use pipeline::{FilterChain, Handler, HandlerRequest, HandlerResponse, HeaderVec};
