//! Upstream host allowlist.

use std::collections::HashSet;

/// The fixed set of hosts the gateway may forward to.
#[derive(Debug, Clone)]
pub struct HostAllowlist {
    normalized: HashSet<String>,
    listed: Vec<String>,
}

impl HostAllowlist {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let listed: Vec<String> = hosts.into_iter().map(Into::into).collect();
        let normalized = listed.iter().map(|h| h.trim().to_ascii_lowercase()).collect();
        Self { normalized, listed }
    }

    /// Hostnames compare case-insensitively. Empty input is never allowed.
    pub fn is_allowed(&self, host: &str) -> bool {
        !host.is_empty() && self.normalized.contains(&host.to_ascii_lowercase())
    }

    /// Hosts as configured, for error bodies and the info route.
    pub fn hosts(&self) -> &[String] {
        &self.listed
    }
}
