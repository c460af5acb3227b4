//! Azure management-plane collector. Operations enumerate the reachable
//! subscriptions first, then pull the per-subscription resource listing.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gander_core::{Collector, CollectError, CredentialRecord, Provider};
use tracing::warn;

use crate::http::{bearer_token, get_all_pages};
use crate::persist::write_items;

pub const CATALOG: &[&str] = &[
    "activity_log",
    "all_resources",
    "storage_accounts",
    "vm_configs",
    "security_center",
];

const DEFAULT_BASE_URL: &str = "https://management.azure.com";

const SUBSCRIPTIONS_API_VERSION: &str = "2020-01-01";

pub struct AzureCollector {
    session: reqwest::Client,
    application: Option<CredentialRecord>,
    output_dir: PathBuf,
    base_url: String,
}

impl AzureCollector {
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

    /// Path template under one subscription for each operation.
    fn subscription_path(operation: &str) -> Option<(&'static str, &'static str)> {
        // (path suffix, api-version)
        match operation {
            "activity_log" => Some((
                "/providers/Microsoft.Insights/eventtypes/management/values",
                "2015-04-01",
            )),
            "all_resources" => Some(("/resources", "2021-04-01")),
            "storage_accounts" => Some((
                "/providers/Microsoft.Storage/storageAccounts",
                "2021-09-01",
            )),
            "vm_configs" => Some((
                "/providers/Microsoft.Compute/virtualMachines",
                "2022-03-01",
            )),
            "security_center" => Some(("/providers/Microsoft.Security/alerts", "2021-01-01")),
            _ => None,
        }
    }

    async fn subscription_ids(
        &self,
        token: &str,
        operation: &str,
    ) -> Result<Vec<String>, CollectError> {
        let url = format!(
            "{}/subscriptions?api-version={}",
            self.base_url, SUBSCRIPTIONS_API_VERSION
        );
        let subs =
            get_all_pages(&self.session, &url, token, self.provider(), operation).await?;
        Ok(subs
            .iter()
            .filter_map(|s| s.get("subscriptionId").and_then(|v| v.as_str()))
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl Collector for AzureCollector {
    fn provider(&self) -> Provider {
        Provider::Azure
    }

    fn catalog(&self) -> Vec<&'static str> {
        CATALOG.to_vec()
    }

    async fn run(&self, operation: &str) -> Result<(), CollectError> {
        let (path, api_version) = Self::subscription_path(operation).ok_or_else(|| {
            CollectError::provider_operation(
                self.provider(),
                operation,
                None,
                "operation not in catalog",
            )
        })?;
        let token = bearer_token(self.application.as_ref(), self.provider(), operation)?;

        let subscriptions = self.subscription_ids(token, operation).await?;
        if subscriptions.is_empty() {
            warn!(operation, "no subscriptions visible to the management credential");
        }

        let mut items = Vec::new();
        for subscription in &subscriptions {
            let url = format!(
                "{}/subscriptions/{}{}?api-version={}",
                self.base_url, subscription, path, api_version
            );
            items.extend(
                get_all_pages(&self.session, &url, token, self.provider(), operation).await?,
            );
        }
        write_items(&self.output_dir, self.provider(), operation, &items)?;
        Ok(())
    }
}
