//! CORS policy resolution.
//!
//! # Responsibilities
//! - Decide the `Access-Control-Allow-Origin` value per request
//! - Emit the fixed method/header allowances
//! - Add `Access-Control-Max-Age` on preflight
//!
//! # Design Decisions
//! - Pure header computation, no I/O
//! - Listed origins are echoed back exactly; everything else gets `*`
//! - Credentials are always disabled, so `*` is never a credentialed grant

use axum::http::{header, HeaderMap, HeaderValue};
use url::Url;

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

#[derive(Debug, Clone)]
struct AllowedOrigin {
    raw: String,
    host: String,
}

impl AllowedOrigin {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim().trim_end_matches('/').to_string();
        let host = Url::parse(&raw)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .unwrap_or_else(|| raw.to_ascii_lowercase());
        Self { raw, host }
    }

    /// Exact origin, or the request host is this host or one of its subdomains.
    fn matches(&self, origin: &str, origin_host: Option<&str>) -> bool {
        if origin.eq_ignore_ascii_case(&self.raw) {
            return true;
        }
        match origin_host {
            Some(host) => {
                host == self.host
                    || host
                        .strip_suffix(self.host.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
            None => false,
        }
    }
}

/// Resolved CORS configuration.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_any: bool,
    allowed: Vec<AllowedOrigin>,
    max_age_secs: u64,
}

impl CorsPolicy {
    pub fn new(allowed_origins: &[String], max_age_secs: u64) -> Self {
        let allow_any = allowed_origins.iter().any(|o| o.trim() == "*");
        let allowed = allowed_origins
            .iter()
            .filter(|o| o.trim() != "*")
            .map(|o| AllowedOrigin::parse(o))
            .collect();
        Self {
            allow_any,
            allowed,
            max_age_secs,
        }
    }

    /// The `Access-Control-Allow-Origin` value for a request origin.
    ///
    /// Returns `None` when the wildcard applies.
    fn echoed_origin<'a>(&self, origin: Option<&'a str>) -> Option<&'a str> {
        let origin = origin.filter(|o| !o.is_empty() && *o != "null")?;
        if self.allow_any {
            return None;
        }
        let origin_host = Url::parse(origin)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase));
        self.allowed
            .iter()
            .any(|allowed| allowed.matches(origin, origin_host.as_deref()))
            .then_some(origin)
    }

    /// Compute the CORS headers for a response.
    pub fn resolve(&self, origin: Option<&str>, preflight: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let echoed = self
            .echoed_origin(origin)
            .and_then(|o| HeaderValue::from_str(o).ok());
        match echoed {
            Some(value) => {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                headers.insert(header::VARY, HeaderValue::from_static("Origin"));
            }
            None => {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            }
        }

        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("false"),
        );

        if preflight {
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(self.max_age_secs));
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_origin(headers: &HeaderMap) -> &str {
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[test]
    fn test_wildcard_policy() {
        let policy = CorsPolicy::new(&["*".to_string()], 86_400);
        let headers = policy.resolve(Some("https://app.example"), false);
        assert_eq!(allow_origin(&headers), "*");
        assert!(headers.get(header::ACCESS_CONTROL_MAX_AGE).is_none());
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOWED_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOWED_HEADERS);
    }

    #[test]
    fn test_origin_resolution() {
        let policy = CorsPolicy::new(
            &["https://quran.example".to_string(), "pages.dev".to_string()],
            600,
        );

        // exact
        let h = policy.resolve(Some("https://quran.example"), false);
        assert_eq!(allow_origin(&h), "https://quran.example");
        assert_eq!(h[header::VARY], "Origin");

        // subdomain suffix
        let h = policy.resolve(Some("https://preview.pages.dev"), false);
        assert_eq!(allow_origin(&h), "https://preview.pages.dev");

        // look-alike host is not a suffix match
        let h = policy.resolve(Some("https://evilpages.dev"), false);
        assert_eq!(allow_origin(&h), "*");

        // unlisted
        let h = policy.resolve(Some("https://other.example"), false);
        assert_eq!(allow_origin(&h), "*");
        assert!(h.get(header::VARY).is_none());

        // file:// pages send "null", direct calls send nothing
        assert_eq!(allow_origin(&policy.resolve(Some("null"), false)), "*");
        assert_eq!(allow_origin(&policy.resolve(None, false)), "*");
    }

    #[test]
    fn test_preflight_max_age() {
        let policy = CorsPolicy::new(&["*".to_string()], 600);
        let headers = policy.resolve(None, true);
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "600");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "false");
    }
}
