//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a deadline
//! - Cancel the in-flight call cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other upstream errors
//! - Single attempt: a timed-out call is reported, never retried

use std::future::Future;
use std::time::Duration;

use tokio::time;

use crate::error::{GatewayError, GatewayResult};

/// Run `call` with a deadline, mapping expiry to `UpstreamTimeout`.
pub async fn with_deadline<F, T>(url: &str, deadline: Duration, call: F) -> GatewayResult<T>
where
    F: Future<Output = GatewayResult<T>>,
{
    match time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(url = %url, deadline = ?deadline, "Upstream deadline exceeded");
            Err(GatewayError::UpstreamTimeout {
                url: url.to_string(),
                after: deadline,
            })
        }
    }
}
