//! Shared transport session for one run.
//!
//! One pooled HTTP client is built per run and cloned into every
//! collector; clones share the same connection pool, so no unit of work
//! can tear the session down underneath its siblings. The pool is dropped
//! when the orchestrating caller drops the last clone, after all units
//! have finished.

use std::time::Duration;

use crate::error::CollectError;

const USER_AGENT_VALUE: &str = concat!("gander/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout. Transport-level only; the batch itself carries no
/// deadline.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Build the shared session for a run.
pub fn build_session() -> Result<reqwest::Client, CollectError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT_VALUE)
        .build()
        .map_err(|e| CollectError::startup(format!("failed to build HTTP session: {}", e)))
}
