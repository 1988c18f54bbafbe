use serde::Deserialize;

/// Allow-header names every filter merges into its configured set.
///
/// These are process-wide constants; each filter instance captures its own
/// merged copy at construction, so filters with different configs never
/// interfere.
pub(crate) const DEFAULT_ALLOW_HEADERS: &[&str] = &[
    "Content-Type",
    "Content-Length",
    "Accept-Encoding",
    "Authorization",
    "Accept",
    "Origin",
    "Referer",
    "Cache-Control",
];

/// Expose-header names every filter merges into its configured set.
pub(crate) const DEFAULT_EXPOSE_HEADERS: &[&str] = &["Content-Type", "Content-Length"];

/// CORS filter configuration.
///
/// Deserializes from whatever JSON/YAML surface the host pipeline uses, with
/// camelCase field names (`allowCredentials`, `allowOrigins`, ...). Every
/// field is optional; the defaults are the permissive development
/// configuration: all origins, common methods, a one-day preflight cache.
///
/// ```
/// use corsgate::CorsConfig;
///
/// let config: CorsConfig = serde_json::from_str(
///     r#"{ "allowOrigins": ["https://*.example.com"], "maxAge": 3600 }"#,
/// ).unwrap();
/// assert_eq!(config.max_age, 3600);
/// assert!(!config.allow_credentials);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorsConfig {
    /// Value reported in `Access-Control-Allow-Credentials`
    pub allow_credentials: bool,
    /// Ordered allow-origin patterns: exact origins, wildcard patterns, or
    /// the literal `*`
    pub allow_origins: Vec<String>,
    /// Method tokens reported in `Access-Control-Allow-Methods`
    pub allow_methods: Vec<String>,
    /// Extra allow-header names, unioned with [`DEFAULT_ALLOW_HEADERS`]
    pub allow_headers: Vec<String>,
    /// Extra expose-header names, unioned with [`DEFAULT_EXPOSE_HEADERS`]
    pub expose_headers: Vec<String>,
    /// Preflight cache duration in seconds (`Access-Control-Max-Age`)
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_credentials: false,
            allow_origins: vec!["*".to_string()],
            allow_methods: vec![
                "OPTIONS".to_string(),
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
            ],
            allow_headers: vec![],
            expose_headers: vec![],
            max_age: 86400,
        }
    }
}

/// Union of default and user-supplied header names.
///
/// Header names are case-insensitive, so deduplication is too; the first
/// spelling encountered wins. Order is defaults first, then user entries,
/// which keeps the operation idempotent: merging the same list twice yields
/// the same set as merging it once.
pub(crate) fn merge_unique(defaults: &[&str], extra: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(defaults.len() + extra.len());
    for name in defaults
        .iter()
        .map(|d| (*d).to_string())
        .chain(extra.iter().cloned())
    {
        if !merged.iter().any(|seen| seen.eq_ignore_ascii_case(&name)) {
            merged.push(name);
        }
    }
    merged
}
