//! M365 collaboration-suite collector (Exchange Online surface of the
//! identity-graph API plus the audit-log endpoints).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gander_core::{Collector, CollectError, CredentialRecord, Provider};

use crate::http::{bearer_token, get_all_pages};
use crate::persist::write_items;

pub const CATALOG: &[&str] = &[
    "exo_groups",
    "exo_mailboxes",
    "exo_inbox_rules",
    "ual",
    "signins",
];

const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com";

pub struct M365Collector {
    session: reqwest::Client,
    delegated: Option<CredentialRecord>,
    application: Option<CredentialRecord>,
    output_dir: PathBuf,
    base_url: String,
}

impl M365Collector {
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

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Inbox rules only exist on the delegated (signed-in user) surface;
    /// audit endpoints want the application credential.
    fn credential_for(&self, operation: &str) -> Option<&CredentialRecord> {
        match operation {
            "exo_inbox_rules" => self.delegated.as_ref(),
            "ual" | "signins" => self.application.as_ref().or(self.delegated.as_ref()),
            _ => self.delegated.as_ref().or(self.application.as_ref()),
        }
    }

    fn endpoint(&self, operation: &str) -> Option<String> {
        let path = match operation {
            "exo_groups" => "/v1.0/groups?$filter=groupTypes/any(c:c+eq+'Unified')",
            "exo_mailboxes" => "/v1.0/users?$select=id,userPrincipalName,mail",
            "exo_inbox_rules" => "/v1.0/me/mailFolders/inbox/messageRules",
            "ual" => "/v1.0/auditLogs/directoryAudits",
            "signins" => "/v1.0/auditLogs/signIns",
            _ => return None,
        };
        Some(format!("{}{}", self.base_url, path))
    }
}

#[async_trait]
impl Collector for M365Collector {
    fn provider(&self) -> Provider {
        Provider::M365
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

    fn record(token: &str) -> Option<CredentialRecord> {
        Some(CredentialRecord {
            access_token: Some(token.into()),
            ..Default::default()
        })
    }

    #[test]
    fn catalog_and_endpoints_agree() {
        let dir = tempfile::tempdir().unwrap();
        let collector = M365Collector::new(reqwest::Client::new(), record("t"), None, dir.path());
        for op in CATALOG {
            assert!(collector.endpoint(op).is_some(), "no endpoint for {op}");
        }
    }

    #[test]
    fn inbox_rules_require_the_delegated_credential() {
        let dir = tempfile::tempdir().unwrap();
        let app_only = M365Collector::new(reqwest::Client::new(), None, record("app"), dir.path());
        assert!(app_only.credential_for("exo_inbox_rules").is_none());
        assert!(app_only.credential_for("exo_groups").is_some());
    }

    #[tokio::test]
    async fn ual_operation_collects_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/auditLogs/directoryAudits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"id": "audit1"}],
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let collector = M365Collector::new(reqwest::Client::new(), None, record("t"), dir.path())
            .with_base_url(server.uri());
        collector.run("ual").await.unwrap();
        assert!(dir.path().join("m365").join("ual.json").exists());
    }
}
