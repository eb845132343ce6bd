//! Path matching logic.
//!
//! # Responsibilities
//! - Match exact literal paths
//! - Match literal path prefixes and capture the remainder
//! - Recognize host-prefixed proxy paths (`/{host}/{path...}`)
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching
//! - Matchers capture borrowed slices of the path, never allocate

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns the captured parameter when the path matches.
    fn capture<'p>(&self, path: &'p str) -> Option<&'p str>;
}

/// Matches one literal path. Captures nothing.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    path: String,
}

impl ExactMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactMatcher {
    fn capture<'p>(&self, path: &'p str) -> Option<&'p str> {
        (path == self.path).then_some("")
    }
}

/// Matches a literal prefix and captures what follows it.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn capture<'p>(&self, path: &'p str) -> Option<&'p str> {
        path.strip_prefix(self.prefix.as_str())
    }
}

/// Matches paths whose first segment looks like a hostname (has a `.` or a port).
///
/// Captures `host/rest...` without the leading slash.
#[derive(Debug, Clone, Default)]
pub struct HostSegmentMatcher;

impl Matcher for HostSegmentMatcher {
    fn capture<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path.strip_prefix('/')?;
        let host = rest.split('/').next().unwrap_or_default();
        let looks_like_host = !host.is_empty()
            && (host.contains('.') || host.contains(':'))
            && !host.starts_with('.');
        looks_like_host.then_some(rest)
    }
}
