//! Error taxonomy for a collection run.

use crate::collector::Provider;

/// Errors surfaced by the orchestration engine and its collectors.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Malformed or unreadable configuration section. Non-fatal: the
    /// offending section is skipped and yields an empty enabled-set.
    #[error("config error in section '{section}': {message}")]
    Config { section: String, message: String },

    /// A unit of work had no usable credential, or the credential was
    /// rejected by the provider. Isolated to that unit of work.
    #[error("authorization failure for {provider}/{operation}: {message}")]
    Authorization {
        provider: Provider,
        operation: String,
        message: String,
    },

    /// Any other failure inside a single unit of work (network, decode,
    /// provider-side error). Isolated to that unit of work.
    #[error("{}/{} failed{}: {}", .provider, .operation, .status.map(|s| format!(" (status {s})")).unwrap_or_default(), .message)]
    ProviderOperation {
        provider: Provider,
        operation: String,
        status: Option<u16>,
        message: String,
    },

    /// Missing or unreadable startup input (auth file). Aborts the run
    /// before any unit of work launches.
    #[error("startup failure: {message}")]
    Startup { message: String },

    /// Filesystem failure while persisting collected output.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollectError {
    pub fn startup(message: impl Into<String>) -> Self {
        Self::Startup {
            message: message.into(),
        }
    }

    pub fn authorization(
        provider: Provider,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Authorization {
            provider,
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn provider_operation(
        provider: Provider,
        operation: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::ProviderOperation {
            provider,
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }
}
