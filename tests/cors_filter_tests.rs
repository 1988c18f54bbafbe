use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use corsgate::{
    CorsConfig, CorsConfigError, CorsFilter, FilterChain, Handler, HandlerRequest,
    HandlerResponse, HeaderVec,
};
use http::Method;
use serde_json::{json, Value};

use tracing_util::TestTracing;

/// Downstream stub that counts invocations and stamps its own header, so
/// tests can verify both the short-circuit and the decoration ordering.
struct CountingHandler {
    calls: AtomicUsize,
}

impl CountingHandler {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Handler for CountingHandler {
    fn handle(&self, _req: &HandlerRequest) -> HandlerResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut res = HandlerResponse::json(200, json!({ "ok": true }));
        res.set_header("X-Downstream", "present".to_string());
        res
    }
}

fn request(method: Method, origin: Option<&str>) -> HandlerRequest {
    let mut headers = HeaderVec::new();
    if let Some(origin) = origin {
        headers.push((Arc::from("Origin"), origin.to_string()));
    }
    HandlerRequest::new(method, "/widgets", headers)
}

fn filter_for(origins: &[&str]) -> CorsFilter {
    let config = CorsConfig {
        allow_origins: origins.iter().map(|o| o.to_string()).collect(),
        ..CorsConfig::default()
    };
    CorsFilter::new(config, "test-cors").unwrap()
}

fn chain_for(origins: &[&str]) -> (FilterChain, Arc<CountingHandler>) {
    let downstream = CountingHandler::new();
    let chain = filter_for(origins).wrap(downstream.clone());
    (chain, downstream)
}

fn cors_header_names() -> [&'static str; 6] {
    [
        "Access-Control-Allow-Origin",
        "Access-Control-Allow-Credentials",
        "Access-Control-Allow-Headers",
        "Access-Control-Allow-Methods",
        "Access-Control-Expose-Headers",
        "Access-Control-Max-Age",
    ]
}

#[test]
fn wildcard_config_reflects_every_origin() {
    let _tracing = TestTracing::init();
    // Default config allows "*"
    let (chain, _) = chain_for(&["*"]);

    for origin in [
        "https://example.com",
        "http://localhost:3000",
        "https://deeply.nested.sub.domain.example.org:8443",
    ] {
        let res = chain.dispatch(&request(Method::GET, Some(origin)));
        assert_eq!(res.status, 200);
        assert_eq!(res.get_header("Access-Control-Allow-Origin"), Some(origin));
    }
}

#[test]
fn missing_origin_passes_through_untouched() {
    let _tracing = TestTracing::init();
    let (chain, downstream) = chain_for(&["*"]);

    let res = chain.dispatch(&request(Method::GET, None));

    assert_eq!(downstream.calls(), 1);
    assert_eq!(res.status, 200);
    assert_eq!(res.get_header("X-Downstream"), Some("present"));
    for name in cors_header_names() {
        assert_eq!(res.get_header(name), None, "unexpected header {name}");
    }
}

#[test]
fn disallowed_origin_passes_through_untouched() {
    let _tracing = TestTracing::init();
    let (chain, downstream) = chain_for(&["https://example.com"]);

    let res = chain.dispatch(&request(Method::GET, Some("https://evil.com")));

    // The request is still served - as a non-CORS request - with no
    // decoration and no rejection status.
    assert_eq!(downstream.calls(), 1);
    assert_eq!(res.status, 200);
    assert_eq!(res.get_header("X-Downstream"), Some("present"));
    for name in cors_header_names() {
        assert_eq!(res.get_header(name), None, "unexpected header {name}");
    }
}

#[test]
fn disallowed_origin_preflight_reaches_downstream() {
    let _tracing = TestTracing::init();
    let (chain, downstream) = chain_for(&["https://example.com"]);

    let res = chain.dispatch(&request(Method::OPTIONS, Some("https://evil.com")));

    assert_eq!(downstream.calls(), 1);
    assert_eq!(res.status, 200);
    assert_eq!(res.get_header("Access-Control-Allow-Origin"), None);
}

#[test]
fn exact_origin_preflight_returns_204() {
    let _tracing = TestTracing::init();
    let (chain, downstream) = chain_for(&["https://example.com"]);

    let res = chain.dispatch(&request(Method::OPTIONS, Some("https://example.com")));

    assert_eq!(downstream.calls(), 0, "preflight must not reach downstream");
    assert_eq!(res.status, 204);
    assert_eq!(res.body, Value::Null, "preflight body must be empty");
    assert_eq!(
        res.get_header("Access-Control-Allow-Origin"),
        Some("https://example.com"),
    );
}

#[test]
fn preflight_carries_the_full_header_set() {
    let _tracing = TestTracing::init();
    let config = CorsConfig {
        allow_origins: vec!["https://example.com".to_string()],
        allow_credentials: true,
        ..CorsConfig::default()
    };
    let filter = CorsFilter::new(config, "test-cors").unwrap();
    let chain = filter.wrap(CountingHandler::new());

    let res = chain.dispatch(&request(Method::OPTIONS, Some("https://example.com")));

    assert_eq!(res.status, 204);
    assert_eq!(
        res.get_header("Access-Control-Allow-Origin"),
        Some("https://example.com"),
    );
    assert_eq!(res.get_header("Access-Control-Allow-Credentials"), Some("true"));
    assert_eq!(
        res.get_header("Access-Control-Allow-Methods"),
        Some("OPTIONS, GET, POST, PUT, DELETE"),
    );
    assert_eq!(res.get_header("Access-Control-Max-Age"), Some("86400"));

    let allow_headers = res.get_header("Access-Control-Allow-Headers").unwrap();
    for name in [
        "Content-Type",
        "Content-Length",
        "Accept-Encoding",
        "Authorization",
        "Accept",
        "Origin",
        "Referer",
        "Cache-Control",
    ] {
        assert!(allow_headers.contains(name), "missing {name} in {allow_headers}");
    }
    // Expose-Headers belongs to decorated real responses, not preflights.
    assert_eq!(res.get_header("Access-Control-Expose-Headers"), None);
}

#[test]
fn wildcard_segment_matches_subdomains_only() {
    let _tracing = TestTracing::init();
    let (chain, downstream) = chain_for(&["https://*.example.com"]);

    for origin in ["https://a.example.com", "https://sub.a.example.com"] {
        let res = chain.dispatch(&request(Method::GET, Some(origin)));
        assert_eq!(res.get_header("Access-Control-Allow-Origin"), Some(origin));
    }

    // The apex origin has no subdomain dot to satisfy the literal structure.
    let calls_before = downstream.calls();
    let res = chain.dispatch(&request(Method::GET, Some("https://example.com")));
    assert_eq!(res.get_header("Access-Control-Allow-Origin"), None);
    assert_eq!(downstream.calls(), calls_before + 1);
}

#[test]
fn decoration_preserves_downstream_output() {
    let _tracing = TestTracing::init();
    let (chain, downstream) = chain_for(&["https://example.com"]);

    let res = chain.dispatch(&request(Method::GET, Some("https://example.com")));

    assert_eq!(downstream.calls(), 1);
    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!({ "ok": true }));
    // Downstream's own header writes survive the decoration.
    assert_eq!(res.get_header("X-Downstream"), Some("present"));
    assert_eq!(res.get_header("content-type"), Some("application/json"));

    assert_eq!(
        res.get_header("Access-Control-Allow-Origin"),
        Some("https://example.com"),
    );
    assert_eq!(res.get_header("Access-Control-Allow-Credentials"), Some("false"));
    assert_eq!(
        res.get_header("Access-Control-Expose-Headers"),
        Some("Content-Type, Content-Length"),
    );
    assert!(res
        .get_header("Access-Control-Allow-Headers")
        .unwrap()
        .contains("Authorization"));
    // Real responses carry no preflight-only headers.
    assert_eq!(res.get_header("Access-Control-Allow-Methods"), None);
    assert_eq!(res.get_header("Access-Control-Max-Age"), None);
}

#[test]
fn max_age_round_trips_as_decimal_string() {
    let _tracing = TestTracing::init();
    let config = CorsConfig {
        allow_origins: vec!["https://example.com".to_string()],
        max_age: 3600,
        ..CorsConfig::default()
    };
    let chain = CorsFilter::new(config, "test-cors")
        .unwrap()
        .wrap(CountingHandler::new());

    let res = chain.dispatch(&request(Method::OPTIONS, Some("https://example.com")));
    assert_eq!(res.get_header("Access-Control-Max-Age"), Some("3600"));
}

#[test]
fn header_union_is_idempotent() {
    let custom = vec!["X-Custom".to_string(), "authorization".to_string()];

    let build = |extra: Vec<String>| {
        let config = CorsConfig {
            allow_headers: extra,
            ..CorsConfig::default()
        };
        CorsFilter::new(config, "test-cors").unwrap()
    };

    let once = build(custom.clone());
    let twice = build(custom.iter().cloned().chain(custom.iter().cloned()).collect());

    assert_eq!(once.allow_headers(), twice.allow_headers());
    assert_eq!(
        once.allow_headers()
            .iter()
            .filter(|h| h.eq_ignore_ascii_case("authorization"))
            .count(),
        1
    );
    assert!(once.allow_headers().contains(&"X-Custom".to_string()));
}

#[test]
fn empty_allow_origins_rejects_everything() {
    let _tracing = TestTracing::init();
    let (chain, downstream) = chain_for(&[]);

    let res = chain.dispatch(&request(Method::GET, Some("https://example.com")));

    assert_eq!(downstream.calls(), 1);
    assert_eq!(res.get_header("Access-Control-Allow-Origin"), None);
}

#[test]
fn invalid_pattern_fails_construction() {
    let config = CorsConfig {
        allow_origins: vec!["https://exa mple.com".to_string()],
        ..CorsConfig::default()
    };
    let err = CorsFilter::new(config, "test-cors").unwrap_err();
    assert_eq!(
        err,
        CorsConfigError::InvalidOriginPattern {
            pattern: "https://exa mple.com".to_string()
        }
    );
    assert!(err.to_string().contains("https://exa mple.com"));

    let config = CorsConfig {
        allow_origins: vec![String::new()],
        ..CorsConfig::default()
    };
    assert_eq!(
        CorsFilter::new(config, "test-cors").unwrap_err(),
        CorsConfigError::EmptyOriginPattern,
    );
}

#[test]
fn credentials_flag_is_reflected_verbatim() {
    let _tracing = TestTracing::init();
    let config = CorsConfig {
        allow_origins: vec!["https://example.com".to_string()],
        allow_credentials: true,
        ..CorsConfig::default()
    };
    let chain = CorsFilter::new(config, "test-cors")
        .unwrap()
        .wrap(CountingHandler::new());

    let res = chain.dispatch(&request(Method::GET, Some("https://example.com")));
    assert_eq!(res.get_header("Access-Control-Allow-Credentials"), Some("true"));
    // Reflected origin, never the wildcard value, even with credentials on.
    assert_eq!(
        res.get_header("Access-Control-Allow-Origin"),
        Some("https://example.com"),
    );
}

#[test]
fn chain_composes_as_a_plain_handler() {
    let _tracing = TestTracing::init();
    let (chain, _) = chain_for(&["https://example.com"]);

    // A filtered pipeline is itself a Handler.
    let handler: Arc<dyn Handler> = Arc::new(chain);
    let res = handler.handle(&request(Method::GET, Some("https://example.com")));
    assert_eq!(
        res.get_header("Access-Control-Allow-Origin"),
        Some("https://example.com"),
    );
}
