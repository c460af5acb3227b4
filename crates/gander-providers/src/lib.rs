//! Concrete provider collectors.
//!
//! Each provider module owns a static operation catalog, its audience
//! base URL, and a [`Collector`](gander_core::Collector) impl whose units
//! of work perform authenticated paged GETs and persist each result set
//! under `<output>/<provider>/<operation>.json`. The orchestration engine
//! sees none of this — only the catalog and one awaitable unit of work
//! per enabled operation.

pub mod azure;
pub mod azuread;
mod http;
pub mod m365;
pub mod mde;
mod persist;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use gander_core::{Collector, NullCollector, Provider, RoutedCredentials};

pub use azure::AzureCollector;
pub use azuread::AzureAdCollector;
pub use m365::M365Collector;
pub use mde::MdeCollector;

/// Static catalogs for every provider, keyed the way the matrix builder
/// expects them. Override flags expand against these.
pub fn catalogs() -> BTreeMap<Provider, Vec<&'static str>> {
    BTreeMap::from([
        (Provider::Azure, azure::CATALOG.to_vec()),
        (Provider::AzureAd, azuread::CATALOG.to_vec()),
        (Provider::M365, m365::CATALOG.to_vec()),
        (Provider::Mde, mde::CATALOG.to_vec()),
    ])
}

/// Construct the four real collectors around one shared session.
pub fn real_collectors(
    session: &reqwest::Client,
    credentials: &RoutedCredentials,
    output_dir: &Path,
) -> Vec<Arc<dyn Collector>> {
    vec![
        Arc::new(AzureCollector::new(
            session.clone(),
            credentials.management_application.clone(),
            output_dir,
        )),
        Arc::new(M365Collector::new(
            session.clone(),
            credentials.graph_delegated.clone(),
            credentials.graph_application.clone(),
            output_dir,
        )),
        Arc::new(AzureAdCollector::new(
            session.clone(),
            credentials.graph_delegated.clone(),
            credentials.graph_application.clone(),
            output_dir,
        )),
        Arc::new(MdeCollector::new(
            session.clone(),
            credentials.security_center_application.clone(),
            output_dir,
        )),
    ]
}

/// Dry-run substitution: one null collector per provider, none of the
/// real ones constructed at all.
pub fn null_collectors() -> Vec<Arc<dyn Collector>> {
    Provider::ALL
        .iter()
        .map(|p| Arc::new(NullCollector::new(*p)) as Arc<dyn Collector>)
        .collect()
}
