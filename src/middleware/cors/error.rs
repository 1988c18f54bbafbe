use std::fmt;

/// CORS configuration error.
///
/// Returned by [`CorsFilter::new`](super::CorsFilter::new) and
/// [`OriginMatcher::compile`](super::OriginMatcher::compile) when an
/// allow-origin pattern cannot be compiled. Construction is the only fallible
/// operation in the filter; a malformed configuration is a fatal startup
/// error, never a per-request condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsConfigError {
    /// An allow-origin pattern was the empty string.
    EmptyOriginPattern,
    /// An allow-origin pattern contained bytes outside the origin character
    /// set (whitespace or control characters).
    InvalidOriginPattern {
        /// The offending pattern, verbatim from the configuration
        pattern: String,
    },
}

impl fmt::Display for CorsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsConfigError::EmptyOriginPattern => {
                write!(
                    f,
                    "CORS configuration error: empty origin pattern. \
                    Expected an exact origin (https://example.com), a wildcard \
                    pattern (https://*.example.com), or the literal '*'."
                )
            }
            CorsConfigError::InvalidOriginPattern { pattern } => {
                write!(
                    f,
                    "CORS configuration error: invalid origin pattern '{}'. \
                    Origin patterns must not contain whitespace or control characters.",
                    pattern
                )
            }
        }
    }
}

impl std::error::Error for CorsConfigError {}
