//! Failure of one unit of work must not prevent its siblings from
//! completing: with N enabled operations and one induced failure, the
//! other N-1 output artifacts are present regardless.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use gander_core::{
    Collector, CollectError, EnablementMatrix, OperationMatrixBuilder, Orchestrator,
    OverrideFlags, Provider,
};

/// Writes one marker file per operation, failing on a chosen operation
/// after the sibling-visible side effects of the others have happened.
struct MarkerCollector {
    provider: Provider,
    dir: PathBuf,
    fail_on: Option<String>,
}

#[async_trait]
impl Collector for MarkerCollector {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn catalog(&self) -> Vec<&'static str> {
        vec!["users", "groups", "devices", "alerts"]
    }

    async fn run(&self, operation: &str) -> Result<(), CollectError> {
        if self.fail_on.as_deref() == Some(operation) {
            return Err(CollectError::provider_operation(
                self.provider,
                operation,
                Some(500),
                "induced failure",
            ));
        }
        tokio::task::yield_now().await;
        std::fs::write(
            self.dir.join(format!("{}-{}.json", self.provider, operation)),
            b"{}\n",
        )?;
        Ok(())
    }
}

fn matrix(raw: &str) -> EnablementMatrix {
    let mut catalogs = BTreeMap::new();
    catalogs.insert(Provider::AzureAd, vec!["users", "groups", "devices"]);
    catalogs.insert(Provider::Mde, vec!["alerts"]);
    OperationMatrixBuilder::new(catalogs).build(raw, OverrideFlags::default())
}

#[tokio::test]
async fn siblings_complete_and_persist_despite_one_failure() {
    let dir = tempfile::tempdir().unwrap();
    let collectors: Vec<Arc<dyn Collector>> = vec![
        Arc::new(MarkerCollector {
            provider: Provider::AzureAd,
            dir: dir.path().to_path_buf(),
            fail_on: Some("groups".to_string()),
        }),
        Arc::new(MarkerCollector {
            provider: Provider::Mde,
            dir: dir.path().to_path_buf(),
            fail_on: None,
        }),
    ];
    let matrix = matrix(
        "azuread:\n  users: \"true\"\n  groups: \"true\"\n  devices: \"true\"\nmde:\n  alerts: \"true\"\n",
    );

    let err = Orchestrator::new(4)
        .run(&collectors, &matrix)
        .await
        .expect_err("the induced failure must surface to the caller");
    assert!(matches!(err, CollectError::ProviderOperation { .. }));

    // The three non-failing units persisted their artifacts.
    assert!(dir.path().join("azuread-users.json").exists());
    assert!(dir.path().join("azuread-devices.json").exists());
    assert!(dir.path().join("mde-alerts.json").exists());
    assert!(!dir.path().join("azuread-groups.json").exists());
}

#[tokio::test]
async fn cross_provider_failure_does_not_leak_into_other_providers() {
    let dir = tempfile::tempdir().unwrap();
    let collectors: Vec<Arc<dyn Collector>> = vec![
        Arc::new(MarkerCollector {
            provider: Provider::AzureAd,
            dir: dir.path().to_path_buf(),
            fail_on: Some("users".to_string()),
        }),
        Arc::new(MarkerCollector {
            provider: Provider::Mde,
            dir: dir.path().to_path_buf(),
            fail_on: None,
        }),
    ];
    let matrix = matrix("azuread:\n  users: \"true\"\nmde:\n  alerts: \"true\"\n");

    assert!(Orchestrator::new(1).run(&collectors, &matrix).await.is_err());
    assert!(dir.path().join("mde-alerts.json").exists());
}
