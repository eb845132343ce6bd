//! Route table lookup.
//!
//! # Responsibilities
//! - Store the ordered route table
//! - Look up the route kind for a request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan; the table is small and order is the priority
//! - Literal `/kv/...` routes precede the host-prefixed proxy fallback

use crate::routing::matcher::{ExactMatcher, HostSegmentMatcher, Matcher, PathPrefixMatcher};

/// What a matched path is handled as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Info,
    Health,
    Chapter,
    Populate,
    KvStatus,
    KvRaw,
    Proxy,
    HostProxy,
}

impl RouteKind {
    /// Stable label for logs and metrics.
    pub fn name(self) -> &'static str {
        match self {
            RouteKind::Info => "info",
            RouteKind::Health => "health",
            RouteKind::Chapter => "kv_chapter",
            RouteKind::Populate => "kv_populate",
            RouteKind::KvStatus => "kv_status",
            RouteKind::KvRaw => "kv_raw",
            RouteKind::Proxy => "proxy",
            RouteKind::HostProxy => "host_proxy",
        }
    }
}

/// Route patterns advertised on 404.
pub const KNOWN_ROUTES: &[&str] = &[
    "/kv/chapter/{number}",
    "/kv/populate",
    "/kv/status",
    "/kv/raw/{key}",
    "/proxy/{url}",
    "/{allowedHost}/{path}",
    "/health",
];

#[derive(Debug)]
struct Route {
    kind: RouteKind,
    matcher: Box<dyn Matcher>,
}

/// A successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'p> {
    pub kind: RouteKind,
    /// Path remainder captured by the matcher (id, key, encoded URL, host/path).
    pub param: &'p str,
}

/// Ordered path → route kind bindings. First match wins.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Append a binding; it is consulted after every earlier one.
    pub fn with(mut self, kind: RouteKind, matcher: impl Matcher + 'static) -> Self {
        self.routes.push(Route {
            kind,
            matcher: Box::new(matcher),
        });
        self
    }

    /// The gateway's route table.
    pub fn standard() -> Self {
        Self::new()
            .with(RouteKind::Info, ExactMatcher::new("/"))
            .with(RouteKind::Health, ExactMatcher::new("/health"))
            .with(RouteKind::Chapter, PathPrefixMatcher::new("/kv/chapter/"))
            .with(RouteKind::Populate, ExactMatcher::new("/kv/populate"))
            .with(RouteKind::KvStatus, ExactMatcher::new("/kv/status"))
            .with(RouteKind::KvRaw, PathPrefixMatcher::new("/kv/raw/"))
            .with(RouteKind::Proxy, PathPrefixMatcher::new("/proxy/"))
            .with(RouteKind::HostProxy, HostSegmentMatcher)
    }

    /// Find the first route matching `path`.
    pub fn match_path<'p>(&self, path: &'p str) -> Option<RouteMatch<'p>> {
        self.routes.iter().find_map(|route| {
            route.matcher.capture(path).map(|param| RouteMatch {
                kind: route.kind,
                param,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}
