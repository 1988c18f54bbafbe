//! Origin matching engine.
//!
//! Allow-patterns are compiled once at filter construction into an ordered
//! rule set; per-request evaluation is a linear scan with first-match-wins
//! semantics. Patterns are anchored: the whole origin string must match, not
//! a substring. A literal dot only matches a literal dot, and `*` matches any
//! run of characters, including the empty run.

use super::CorsConfigError;

/// A single compiled allow-pattern.
///
/// Patterns without a `*` compile to `Exact` and are matched by plain string
/// equality. Patterns with embedded `*` segments compile to `Glob` and are
/// matched by the anchored wildcard scan in [`glob_match`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginRule {
    /// Exact origin string (`https://example.com`)
    Exact(String),
    /// Pattern with embedded `*` segments (`https://*.example.com`)
    Glob(String),
}

impl OriginRule {
    /// Compile one allow-pattern.
    ///
    /// The pattern character set is closed: origins never contain whitespace
    /// or control bytes, so a pattern carrying them is a configuration
    /// mistake and is rejected rather than silently accepted.
    fn compile(pattern: &str) -> Result<Self, CorsConfigError> {
        if pattern.is_empty() {
            return Err(CorsConfigError::EmptyOriginPattern);
        }
        if pattern
            .bytes()
            .any(|b| b.is_ascii_whitespace() || b.is_ascii_control())
        {
            return Err(CorsConfigError::InvalidOriginPattern {
                pattern: pattern.to_string(),
            });
        }
        if pattern.contains('*') {
            Ok(OriginRule::Glob(pattern.to_string()))
        } else {
            Ok(OriginRule::Exact(pattern.to_string()))
        }
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            OriginRule::Exact(exact) => exact == origin,
            OriginRule::Glob(pattern) => glob_match(pattern, origin),
        }
    }
}

/// The compiled allow-origin set. Immutable after construction and cheap to
/// evaluate per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginMatcher {
    /// The literal `*` pattern was configured: every origin matches and no
    /// other pattern is compiled. Wildcard-all wins by documented precedence.
    AllowAll,
    /// Ordered rule set, evaluated with short-circuit OR semantics. An empty
    /// set matches nothing.
    Rules(Vec<OriginRule>),
}

impl OriginMatcher {
    /// Compile an ordered sequence of allow-patterns.
    ///
    /// Compilation is atomic: if any pattern is rejected the whole call fails
    /// and no partial matcher is returned.
    pub fn compile(patterns: &[String]) -> Result<Self, CorsConfigError> {
        if patterns.iter().any(|p| p == "*") {
            return Ok(OriginMatcher::AllowAll);
        }
        let rules = patterns
            .iter()
            .map(|p| OriginRule::compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OriginMatcher::Rules(rules))
    }

    /// Check an origin against the rule set. Pure; no side effects.
    #[must_use]
    pub fn matches(&self, origin: &str) -> bool {
        match self {
            OriginMatcher::AllowAll => true,
            OriginMatcher::Rules(rules) => rules.iter().any(|rule| rule.matches(origin)),
        }
    }
}

/// Anchored wildcard match over bytes.
///
/// Iterative two-pointer scan with single-star backtracking: on mismatch,
/// the most recent `*` absorbs one more input byte and the scan resumes.
/// Runs in O(pattern × input) worst case, linear for typical single-star
/// origin patterns.
fn glob_match(pattern: &str, input: &str) -> bool {
    let p = pattern.as_bytes();
    let s = input.as_bytes();
    let mut pi = 0usize;
    let mut si = 0usize;
    // (pattern index of the star, input index its run currently ends at)
    let mut star: Option<(usize, usize)> = None;

    while si < s.len() {
        if pi < p.len() && p[pi] == b'*' {
            star = Some((pi, si));
            pi += 1;
        } else if pi < p.len() && p[pi] == s[si] {
            pi += 1;
            si += 1;
        } else if let Some((star_pi, star_si)) = star {
            pi = star_pi + 1;
            si = star_si + 1;
            star = Some((star_pi, star_si + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == b'*' {
        pi += 1;
    }
    pi == p.len()
}
