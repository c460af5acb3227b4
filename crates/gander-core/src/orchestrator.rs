//! Concurrent execution of the plan under a shared session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::collector::Collector;
use crate::error::CollectError;
use crate::matrix::EnablementMatrix;
use crate::plan::{ExecutionPlan, PlanEntry};

/// Default concurrency ceiling for a run.
pub const DEFAULT_PARALLEL: usize = 8;

/// Aggregate outcome of one run. Timing is reported whether or not units
/// failed; which operations failed is discoverable from the logs and the
/// collected output, not solely from the return value.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub launched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Drives (matrix, collectors) to completion.
///
/// Every enabled operation is turned into one unit of work and launched
/// into a [`JoinSet`] gated by a semaphore; the gate bounds how many units
/// are in flight at once but every unit eventually runs. A failing unit
/// never cancels its siblings — the whole batch is awaited, all failures
/// are logged, and the first failure in completion order is the one
/// returned.
pub struct Orchestrator {
    parallel: usize,
}

impl Orchestrator {
    pub fn new(parallel: usize) -> Self {
        Self {
            parallel: parallel.max(1),
        }
    }

    /// Run every enabled operation to completion and report timing.
    pub async fn run(
        &self,
        collectors: &[Arc<dyn Collector>],
        matrix: &EnablementMatrix,
    ) -> Result<RunReport, CollectError> {
        let started = Instant::now();

        let refs: Vec<&dyn Collector> = collectors.iter().map(|c| c.as_ref()).collect();
        let plan = ExecutionPlan::assemble(matrix, &refs);
        info!(
            units = plan.len(),
            parallel = self.parallel,
            "assembled execution plan"
        );

        let sem = Arc::new(Semaphore::new(self.parallel));
        let mut join_set: JoinSet<(PlanEntry, Result<(), CollectError>)> = JoinSet::new();

        for entry in plan.entries() {
            let collector = collectors
                .iter()
                .find(|c| c.provider() == entry.provider)
                .cloned();
            let Some(collector) = collector else {
                // Plan assembly only draws from the collectors' own
                // providers, so every entry has an owner.
                continue;
            };
            let permit = sem.clone().acquire_owned().await.map_err(|e| {
                CollectError::startup(format!("concurrency gate closed unexpectedly: {}", e))
            })?;
            let entry = entry.clone();
            join_set.spawn(async move {
                let _permit = permit;
                let result = collector.run(&entry.operation).await;
                (entry, result)
            });
        }

        let launched = join_set.len();
        let mut failures: Vec<CollectError> = Vec::new();
        let mut succeeded = 0usize;

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((entry, Ok(()))) => {
                    info!(provider = %entry.provider, operation = %entry.operation, "operation complete");
                    succeeded += 1;
                }
                Ok((entry, Err(e))) => {
                    error!(provider = %entry.provider, operation = %entry.operation, error = %e, "operation failed");
                    failures.push(e);
                }
                Err(e) => {
                    error!(error = %e, "unit of work panicked or was aborted");
                    failures.push(CollectError::Startup {
                        message: format!("unit of work join error: {}", e),
                    });
                }
            }
        }

        let elapsed = started.elapsed();
        info!(
            launched,
            succeeded,
            failed = failures.len(),
            elapsed_secs = format!("{:.2}", elapsed.as_secs_f64()),
            "run finished"
        );

        let report = RunReport {
            launched,
            succeeded,
            failed: failures.len(),
            elapsed,
        };
        if let Some(first) = failures.into_iter().next() {
            return Err(first);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::collector::{NullCollector, Provider};
    use crate::matrix::{OperationMatrixBuilder, OverrideFlags};

    struct CountingCollector {
        provider: Provider,
        runs: Arc<AtomicUsize>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl Collector for CountingCollector {
        fn provider(&self) -> Provider {
            self.provider
        }

        fn catalog(&self) -> Vec<&'static str> {
            vec!["users", "groups", "devices"]
        }

        async fn run(&self, operation: &str) -> Result<(), CollectError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.fail_on == Some(operation) {
                return Err(CollectError::provider_operation(
                    self.provider,
                    operation,
                    Some(500),
                    "induced failure",
                ));
            }
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn matrix_for(raw: &str) -> EnablementMatrix {
        let mut catalogs = BTreeMap::new();
        catalogs.insert(Provider::AzureAd, vec!["users", "groups", "devices"]);
        OperationMatrixBuilder::new(catalogs).build(raw, OverrideFlags::default())
    }

    #[tokio::test]
    async fn runs_every_enabled_operation() {
        let runs = Arc::new(AtomicUsize::new(0));
        let collectors: Vec<Arc<dyn Collector>> = vec![Arc::new(CountingCollector {
            provider: Provider::AzureAd,
            runs: runs.clone(),
            fail_on: None,
        })];
        let matrix = matrix_for("azuread:\n  users: \"true\"\n  groups: \"true\"\n");

        let report = Orchestrator::new(2)
            .run(&collectors, &matrix)
            .await
            .unwrap();
        assert_eq!(report.launched, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn one_failure_does_not_cancel_siblings() {
        let runs = Arc::new(AtomicUsize::new(0));
        let collectors: Vec<Arc<dyn Collector>> = vec![Arc::new(CountingCollector {
            provider: Provider::AzureAd,
            runs: runs.clone(),
            fail_on: Some("groups"),
        })];
        let matrix =
            matrix_for("azuread:\n  users: \"true\"\n  groups: \"true\"\n  devices: \"true\"\n");

        let err = Orchestrator::new(3)
            .run(&collectors, &matrix)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::ProviderOperation { .. }));
        // The two non-failing siblings still ran to completion.
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn parallel_floor_is_one() {
        let collectors: Vec<Arc<dyn Collector>> =
            vec![Arc::new(NullCollector::new(Provider::AzureAd))];
        let matrix = matrix_for("azuread:\n  users: \"true\"\n");
        let report = Orchestrator::new(0).run(&collectors, &matrix).await.unwrap();
        assert_eq!(report.launched, 1);
    }

    #[tokio::test]
    async fn empty_matrix_still_reports_timing() {
        let collectors: Vec<Arc<dyn Collector>> =
            vec![Arc::new(NullCollector::new(Provider::Azure))];
        let matrix = matrix_for("");
        let report = Orchestrator::new(4).run(&collectors, &matrix).await.unwrap();
        assert_eq!(report.launched, 0);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn dry_run_launches_one_noop_unit_per_enabled_operation() {
        let collectors: Vec<Arc<dyn Collector>> = Provider::ALL
            .iter()
            .map(|p| Arc::new(NullCollector::new(*p)) as Arc<dyn Collector>)
            .collect();
        let mut catalogs = BTreeMap::new();
        for p in Provider::ALL {
            catalogs.insert(p, vec!["one", "two"]);
        }
        let raw = "azure:\n  one: \"true\"\nm365:\n  one: \"true\"\nazuread:\n  one: \"true\"\n  two: \"true\"\nmde:\n  two: \"true\"\n";
        let matrix = OperationMatrixBuilder::new(catalogs).build(raw, OverrideFlags::default());

        let report = Orchestrator::new(8).run(&collectors, &matrix).await.unwrap();
        assert_eq!(report.launched, 5);
        assert_eq!(report.succeeded, 5);
    }
}
