//! Defender for Endpoint collector, backed by the endpoint-security API.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gander_core::{Collector, CollectError, CredentialRecord, Provider};

use crate::http::{bearer_token, get_all_pages};
use crate::persist::write_items;

pub const CATALOG: &[&str] = &[
    "alerts",
    "machines",
    "investigations",
    "indicators",
    "library_files",
];

const DEFAULT_BASE_URL: &str = "https://api.securitycenter.microsoft.com";

pub struct MdeCollector {
    session: reqwest::Client,
    application: Option<CredentialRecord>,
    output_dir: PathBuf,
    base_url: String,
}

impl MdeCollector {
    pub fn new(
        session: reqwest::Client,
        application: Option<CredentialRecord>,
        output_dir: &Path,
    ) -> Self {
        Self {
            session,
            application,
            output_dir: output_dir.to_path_buf(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, operation: &str) -> Option<String> {
        let path = match operation {
            "alerts" => "/api/alerts",
            "machines" => "/api/machines",
            "investigations" => "/api/investigations",
            "indicators" => "/api/indicators",
            "library_files" => "/api/libraryfiles",
            _ => return None,
        };
        Some(format!("{}{}", self.base_url, path))
    }
}

#[async_trait]
impl Collector for MdeCollector {
    fn provider(&self) -> Provider {
        Provider::Mde
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
        let token = bearer_token(self.application.as_ref(), self.provider(), operation)?;
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
        let collector = MdeCollector::new(reqwest::Client::new(), record("t"), dir.path());
        for op in CATALOG {
            assert!(collector.endpoint(op).is_some(), "no endpoint for {op}");
        }
    }

    #[tokio::test]
    async fn alerts_operation_collects_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/alerts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"id": "alert-1"}],
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let collector = MdeCollector::new(reqwest::Client::new(), record("t"), dir.path())
            .with_base_url(server.uri());
        collector.run("alerts").await.unwrap();
        assert!(dir.path().join("mde").join("alerts.json").exists());
    }
}
