//! The provider capability: a static operation catalog plus one awaitable
//! unit of work per operation name.

use async_trait::async_trait;

use crate::error::CollectError;

/// One external platform whose data the orchestrator collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Provider {
    Azure,
    M365,
    AzureAd,
    Mde,
}

impl Provider {
    /// All providers, in the fixed order used for plan assembly and
    /// config section lookup.
    pub const ALL: [Provider; 4] = [
        Provider::Azure,
        Provider::M365,
        Provider::AzureAd,
        Provider::Mde,
    ];

    /// Section name in the config file; doubles as the per-provider
    /// output directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Azure => "azure",
            Provider::M365 => "m365",
            Provider::AzureAd => "azuread",
            Provider::Mde => "mde",
        }
    }

    pub fn from_section(name: &str) -> Option<Provider> {
        match name {
            "azure" => Some(Provider::Azure),
            "m365" => Some(Provider::M365),
            "azuread" => Some(Provider::AzureAd),
            "mde" => Some(Provider::Mde),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability implemented by each concrete provider (and by
/// [`NullCollector`] in dry-run).
///
/// A collector is constructed once per run and holds whatever it needs to
/// execute operations: the shared transport session, its resolved
/// credential record(s), and its output location. Operations are
/// independent of one another — no unit of work may depend on a sibling's
/// completion or output, which is what makes unbounded interleaving safe.
#[async_trait]
pub trait Collector: Send + Sync {
    /// The provider this collector executes operations for.
    fn provider(&self) -> Provider;

    /// Static declaration of every operation name this collector can run.
    fn catalog(&self) -> Vec<&'static str>;

    /// Whether `operation` is part of this collector's catalog.
    fn supports(&self, operation: &str) -> bool {
        self.catalog().contains(&operation)
    }

    /// Execute one operation to completion. The unit of work owns all
    /// provider-specific request, pagination, and persistence logic; it
    /// must suspend at network I/O rather than block the thread.
    async fn run(&self, operation: &str) -> Result<(), CollectError>;
}

/// Null implementation of [`Collector`] substituted for every provider in
/// dry-run mode.
///
/// It answers every operation name and its unit of work returns
/// immediately, touching neither the network nor the filesystem. The
/// substitution is total: in dry-run no real collector is constructed at
/// all, so construction-time side effects (directory creation) cannot
/// occur either.
#[derive(Debug, Clone, Copy)]
pub struct NullCollector {
    provider: Provider,
}

impl NullCollector {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Collector for NullCollector {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn catalog(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn supports(&self, _operation: &str) -> bool {
        true
    }

    async fn run(&self, operation: &str) -> Result<(), CollectError> {
        tracing::debug!(provider = %self.provider, operation, "dry-run: skipping");
        Ok(())
    }
}
