//! Entra ID (Azure AD) directory collector, backed by the identity-graph
//! API.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gander_core::{Collector, CollectError, CredentialRecord, Provider};

use crate::http::{bearer_token, get_all_pages};
use crate::persist::write_items;

/// Every operation this collector can run.
pub const CATALOG: &[&str] = &[
    "users",
    "groups",
    "applications",
    "service_principals",
    "devices",
    "directory_roles",
    "organization",
    "risky_users",
    "risk_detections",
];

const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com";

pub struct AzureAdCollector {
    session: reqwest::Client,
    delegated: Option<CredentialRecord>,
    application: Option<CredentialRecord>,
    output_dir: PathBuf,
    base_url: String,
}

impl AzureAdCollector {
    pub fn new(
        session: reqwest::Client,
        delegated: Option<CredentialRecord>,
        application: Option<CredentialRecord>,
        output_dir: &Path,
    ) -> Self {
        Self {
            session,
            delegated,
            application,
            output_dir: output_dir.to_path_buf(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the collector at a different graph host (government cloud,
    /// test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Identity-protection endpoints require the application credential;
    /// everything else prefers delegated and falls back to application.
    fn credential_for(&self, operation: &str) -> Option<&CredentialRecord> {
        match operation {
            "risky_users" | "risk_detections" => self.application.as_ref(),
            _ => self.delegated.as_ref().or(self.application.as_ref()),
        }
    }

    fn endpoint(&self, operation: &str) -> Option<String> {
        let path = match operation {
            "users" => "/v1.0/users",
            "groups" => "/v1.0/groups",
            "applications" => "/v1.0/applications",
            "service_principals" => "/v1.0/servicePrincipals",
            "devices" => "/v1.0/devices",
            "directory_roles" => "/v1.0/directoryRoles",
            "organization" => "/v1.0/organization",
            "risky_users" => "/v1.0/identityProtection/riskyUsers",
            "risk_detections" => "/v1.0/identityProtection/riskDetections",
            _ => return None,
        };
        Some(format!("{}{}", self.base_url, path))
    }
}

#[async_trait]
impl Collector for AzureAdCollector {
    fn provider(&self) -> Provider {
        Provider::AzureAd
    }

    fn catalog(&self) -> Vec<&'static str> {
        CATALOG.to_vec()
    }

    async fn run(&self, operation: &str) -> Result<(), CollectError> {
        let url = self.endpoint(operation).ok_or_else(|| {
            CollectError::provider_operation(
                self.provider(),
                operation,
                None,
                "operation not in catalog",
            )
        })?;
        let token = bearer_token(self.credential_for(operation), self.provider(), operation)?;
        let items = get_all_pages(&self.session, &url, token, self.provider(), operation).await?;
        write_items(&self.output_dir, self.provider(), operation, &items)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn delegated(token: &str) -> Option<CredentialRecord> {
        Some(CredentialRecord {
            access_token: Some(token.into()),
            ..Default::default()
        })
    }

    #[test]
    fn catalog_and_endpoints_agree() {
        let dir = tempfile::tempdir().unwrap();
        let collector =
            AzureAdCollector::new(reqwest::Client::new(), delegated("t"), None, dir.path());
        for op in CATALOG {
            assert!(collector.supports(op));
            assert!(collector.endpoint(op).is_some(), "no endpoint for {op}");
        }
        assert!(collector.endpoint("not_an_operation").is_none());
    }

    #[tokio::test]
    async fn users_operation_collects_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"id": "u1"}, {"id": "u2"}],
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let collector =
            AzureAdCollector::new(reqwest::Client::new(), delegated("t"), None, dir.path())
                .with_base_url(server.uri());
        collector.run("users").await.unwrap();

        let written =
            std::fs::read_to_string(dir.path().join("azuread").join("users.json")).unwrap();
        assert_eq!(written.lines().count(), 2);
    }

    #[tokio::test]
    async fn missing_credential_fails_only_with_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let collector = AzureAdCollector::new(reqwest::Client::new(), None, None, dir.path());
        let err = collector.run("users").await.unwrap_err();
        assert!(matches!(err, CollectError::Authorization { .. }));
        // Nothing was written for the failed unit.
        assert!(!dir.path().join("azuread").join("users.json").exists());
    }
}
