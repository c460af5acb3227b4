//! Shared HTTP plumbing for the provider collectors: bearer-token GETs
//! with status mapping and `nextLink` pagination.

use gander_core::{CollectError, CredentialRecord, Provider};
use tracing::{debug, warn};

/// Pull the bearer token for a unit of work, or fail that unit with an
/// authorization error (a routing miss surfaces here, not earlier).
pub(crate) fn bearer_token<'a>(
    record: Option<&'a CredentialRecord>,
    provider: Provider,
    operation: &str,
) -> Result<&'a str, CollectError> {
    record
        .filter(|r| r.has_token())
        .and_then(|r| r.access_token.as_deref())
        .ok_or_else(|| {
            CollectError::authorization(
                provider,
                operation,
                "no credential for this audience; authenticate first",
            )
        })
}

/// Fetch one JSON page.
pub(crate) async fn get_json(
    session: &reqwest::Client,
    url: &str,
    token: &str,
    provider: Provider,
    operation: &str,
) -> Result<serde_json::Value, CollectError> {
    debug!(provider = %provider, operation, url, "GET");
    let response = session
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| {
            CollectError::provider_operation(provider, operation, None, format!("request failed: {e}"))
        })?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(CollectError::authorization(
            provider,
            operation,
            format!("provider rejected credential (status {}): {}", status.as_u16(), body),
        ));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CollectError::provider_operation(
            provider,
            operation,
            Some(status.as_u16()),
            body,
        ));
    }

    response.json().await.map_err(|e| {
        CollectError::provider_operation(provider, operation, None, format!("invalid JSON body: {e}"))
    })
}

/// Fetch every page of a collection endpoint, following
/// `@odata.nextLink` (Graph, MDE) or `nextLink` (ARM). Returns the
/// concatenated `value` items; a response without a `value` array is kept
/// whole as a single item.
pub(crate) async fn get_all_pages(
    session: &reqwest::Client,
    url: &str,
    token: &str,
    provider: Provider,
    operation: &str,
) -> Result<Vec<serde_json::Value>, CollectError> {
    let mut items = Vec::new();
    let mut next = Some(url.to_string());
    let mut pages = 0usize;

    while let Some(url) = next.take() {
        let page = get_json(session, &url, token, provider, operation).await?;
        pages += 1;

        match page.get("value").and_then(|v| v.as_array()) {
            Some(value) => items.extend(value.iter().cloned()),
            None => items.push(page.clone()),
        }

        next = page
            .get("@odata.nextLink")
            .or_else(|| page.get("nextLink"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        if next.as_deref() == Some(url.as_str()) {
            warn!(provider = %provider, operation, "nextLink loops back to the same page; stopping");
            next = None;
        }
    }

    debug!(provider = %provider, operation, pages, items = items.len(), "fetched all pages");
    Ok(items)
}
