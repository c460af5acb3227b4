//! Execution-plan assembly: one entry per enabled (provider, operation).

use crate::collector::{Collector, Provider};
use crate::matrix::EnablementMatrix;

/// One schedulable unit: a provider and an operation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub provider: Provider,
    pub operation: String,
}

/// Ephemeral list of units to run, built fresh on every invocation and
/// never persisted. Iteration order is deterministic (fixed provider
/// order, operations in sorted order) purely for auditability — units do
/// not depend on ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    entries: Vec<PlanEntry>,
}

impl ExecutionPlan {
    /// Assemble the plan from the matrix and the collectors' providers.
    /// Only providers with a non-empty enabled-set contribute entries.
    pub fn assemble(matrix: &EnablementMatrix, collectors: &[&dyn Collector]) -> ExecutionPlan {
        let mut entries = Vec::with_capacity(matrix.len());
        for collector in collectors {
            let provider = collector.provider();
            for operation in matrix.enabled_for(provider) {
                entries.push(PlanEntry {
                    provider,
                    operation: operation.clone(),
                });
            }
        }
        ExecutionPlan { entries }
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, provider: Provider, operation: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.provider == provider && e.operation == operation)
    }
}
