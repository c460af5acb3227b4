//! Orchestration engine for selective, concurrent telemetry collection.
//!
//! The engine takes three inputs and drives a run to completion:
//!
//! - an [`EnablementMatrix`](matrix::EnablementMatrix) built from a config
//!   file plus per-provider "enable all" override flags,
//! - a [`RoutedCredentials`](credentials::RoutedCredentials) set resolved
//!   from a flat auth store by audience substring,
//! - one [`Collector`](collector::Collector) per provider (or the shared
//!   [`NullCollector`](collector::NullCollector) in dry-run).
//!
//! The [`Orchestrator`](orchestrator::Orchestrator) assembles one unit of
//! work per enabled operation and runs the whole batch concurrently over a
//! single shared transport session. Provider-specific request/response and
//! persistence logic lives outside this crate, behind the `Collector`
//! capability.

pub mod collector;
pub mod credentials;
pub mod error;
pub mod matrix;
pub mod orchestrator;
pub mod plan;
pub mod session;

pub use collector::{Collector, NullCollector, Provider};
pub use credentials::{CredentialRecord, CredentialRouter, CredentialStore, RoutedCredentials};
pub use error::CollectError;
pub use matrix::{EnablementMatrix, OperationMatrixBuilder, OverrideFlags};
pub use orchestrator::{Orchestrator, RunReport};
pub use plan::{ExecutionPlan, PlanEntry};
pub use session::build_session;
