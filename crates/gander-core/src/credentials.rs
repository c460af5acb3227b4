//! Credential store loading and audience-based routing.
//!
//! The auth file is produced by a separate authentication step. It holds
//! two flat mappings keyed by audience URL: `mfa` (delegated, user/MFA
//! flow) and `app_auth` (application, service flow). This module routes
//! those records to the named slots the collectors consume, by matching
//! well-known audience-host substrings against the stored keys.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CollectError;

/// Commercial and government-cloud hostnames of the identity-graph API.
/// Both resolve to the same logical audience.
pub const GRAPH_AUDIENCES: [&str; 2] = ["graph.microsoft.com", "graph.microsoft.us"];

/// Management-plane API audience host.
pub const MANAGEMENT_AUDIENCE: &str = "management.azure.com";

/// Endpoint-security API audience host.
pub const SECURITY_CENTER_AUDIENCE: &str = "api.securitycenter.microsoft.com";

/// Seconds of remaining validity below which a token is flagged as
/// expiring.
const EXPIRY_SKEW_SECS: i64 = 300;

/// Opaque bearer-token material for one (audience, flow-kind) pair.
///
/// The engine passes records through unmodified; unknown fields are
/// preserved in `extra` so a collector sees exactly what the auth step
/// wrote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix-seconds expiry, stored as a string by the auth step.
    #[serde(default)]
    pub expires_on: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CredentialRecord {
    /// Whether the record carries usable bearer material.
    pub fn has_token(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Validity check for a delegated record: parse `expires_on` and warn
    /// when the token is expired or inside the skew window. The record is
    /// returned unchanged either way — an expired token surfaces later as
    /// that unit of work's authorization failure.
    pub fn check_expiry(&self, audience: &str) -> bool {
        let Some(raw) = self.expires_on.as_deref() else {
            debug!(audience, "credential has no expires_on field");
            return true;
        };
        let Ok(expires_on) = raw.parse::<i64>() else {
            warn!(audience, expires_on = raw, "unparseable expires_on on credential");
            return true;
        };
        let remaining = expires_on - Utc::now().timestamp();
        if remaining <= 0 {
            warn!(audience, "credential is expired; re-run authentication");
            false
        } else if remaining <= EXPIRY_SKEW_SECS {
            warn!(audience, remaining_secs = remaining, "credential expires soon");
            true
        } else {
            true
        }
    }
}

/// The flat credential store as written by the auth step: one mapping per
/// flow-kind, each keyed by full audience URL. An audience may appear in
/// zero, one, or both mappings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialStore {
    #[serde(default)]
    pub mfa: BTreeMap<String, CredentialRecord>,
    #[serde(default)]
    pub app_auth: BTreeMap<String, CredentialRecord>,
}

impl CredentialStore {
    /// Load the store from the auth file. A missing or unreadable file is
    /// a fatal startup failure: nothing launches without credentials.
    pub fn load(path: &Path) -> Result<Self, CollectError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CollectError::startup(format!(
                "auth file {} missing or unreadable ({}); authenticate first",
                path.display(),
                e
            ))
        })?;
        let store: CredentialStore = serde_json::from_str(&raw).map_err(|e| {
            CollectError::startup(format!("auth file {} is not valid JSON: {}", path.display(), e))
        })?;
        info!(
            path = %path.display(),
            delegated = store.mfa.len(),
            application = store.app_auth.len(),
            "loaded credential store"
        );
        Ok(store)
    }
}

/// Credentials resolved to the named slots the providers consume. A
/// `None` slot is not an error at routing time; it surfaces as an
/// authorization failure if a unit of work actually needs it.
#[derive(Debug, Clone, Default)]
pub struct RoutedCredentials {
    pub graph_delegated: Option<CredentialRecord>,
    pub graph_application: Option<CredentialRecord>,
    pub management_application: Option<CredentialRecord>,
    pub security_center_application: Option<CredentialRecord>,
}

/// Partitions a [`CredentialStore`] into per-audience records by matching
/// audience-host substrings against the stored keys.
pub struct CredentialRouter;

impl CredentialRouter {
    /// Resolve all slots. Keys are scanned in sorted order and the first
    /// match wins; every further key matching the same audience is logged
    /// as an ambiguity warning.
    pub fn route(store: &CredentialStore) -> RoutedCredentials {
        RoutedCredentials {
            graph_delegated: Self::find(&store.mfa, "delegated", &GRAPH_AUDIENCES),
            graph_application: Self::find(&store.app_auth, "application", &GRAPH_AUDIENCES),
            management_application: Self::find(
                &store.app_auth,
                "application",
                &[MANAGEMENT_AUDIENCE],
            ),
            security_center_application: Self::find(
                &store.app_auth,
                "application",
                &[SECURITY_CENTER_AUDIENCE],
            ),
        }
    }

    fn find(
        records: &BTreeMap<String, CredentialRecord>,
        flow: &str,
        hosts: &[&str],
    ) -> Option<CredentialRecord> {
        let mut selected: Option<(&String, &CredentialRecord)> = None;
        for (key, record) in records {
            if !hosts.iter().any(|h| key.contains(h)) {
                continue;
            }
            match selected {
                None => selected = Some((key, record)),
                Some((first, _)) => warn!(
                    flow,
                    audience = hosts[0],
                    selected = %first,
                    ignored = %key,
                    "multiple credentials match audience; keeping first in sorted order"
                ),
            }
        }
        match selected {
            Some((key, record)) => {
                debug!(flow, key = %key, "routed credential");
                Some(record.clone())
            }
            None => {
                debug!(flow, audience = hosts[0], "no credential matches audience");
                None
            }
        }
    }
}
