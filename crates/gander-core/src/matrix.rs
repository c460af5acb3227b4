//! Enablement-matrix construction from config sections and override flags.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{debug, warn};

use crate::collector::Provider;
use crate::error::CollectError;

/// Resolved set of enabled operations, per provider, for one invocation.
///
/// Only `true` entries from the config survive the build; there is no
/// explicit-false state. An absent provider simply has an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnablementMatrix {
    enabled: BTreeMap<Provider, BTreeSet<String>>,
}

impl EnablementMatrix {
    pub fn enabled_for(&self, provider: Provider) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.enabled.get(&provider).unwrap_or(&EMPTY)
    }

    pub fn is_enabled(&self, provider: Provider, operation: &str) -> bool {
        self.enabled_for(provider).contains(operation)
    }

    /// Total number of enabled operations across all providers.
    pub fn len(&self) -> usize {
        self.enabled.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-provider "enable everything" override flags. A set flag replaces
/// that provider's configured set with its entire operation catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideFlags {
    pub azure: bool,
    pub azuread: bool,
    pub m365: bool,
    pub mde: bool,
}

impl OverrideFlags {
    fn is_set(&self, provider: Provider) -> bool {
        match provider {
            Provider::Azure => self.azure,
            Provider::AzureAd => self.azuread,
            Provider::M365 => self.m365,
            Provider::Mde => self.mde,
        }
    }
}

/// Merges the file-based config with the override flags into the final
/// [`EnablementMatrix`]. The provider catalogs are passed in by value so
/// the builder holds no global state and concurrent runs cannot
/// interfere.
pub struct OperationMatrixBuilder {
    catalogs: BTreeMap<Provider, Vec<&'static str>>,
}

impl OperationMatrixBuilder {
    pub fn new(catalogs: BTreeMap<Provider, Vec<&'static str>>) -> Self {
        Self { catalogs }
    }

    /// Parse the config file and apply the overrides. An unreadable file
    /// behaves like an empty one: every section warns and yields an empty
    /// enabled-set, the run itself proceeds.
    pub fn build_from_file(&self, path: &Path, overrides: OverrideFlags) -> EnablementMatrix {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file unreadable; no operations enabled from config");
                String::new()
            }
        };
        self.build(&raw, overrides)
    }

    /// Build the matrix from raw YAML config text.
    ///
    /// Each recognized top-level section is a flat mapping of
    /// operation-name to a string boolean; a value is truthy when it
    /// equals `"true"` case-insensitively. Malformed sections are logged
    /// and skipped. Unrecognized sections and non-string values are
    /// ignored.
    pub fn build(&self, raw_config: &str, overrides: OverrideFlags) -> EnablementMatrix {
        let doc: serde_yaml::Value = match serde_yaml::from_str(raw_config) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "config is not valid YAML; no operations enabled from config");
                serde_yaml::Value::Null
            }
        };

        let mut enabled = BTreeMap::new();
        for provider in Provider::ALL {
            let ops = if overrides.is_set(provider) {
                let catalog: BTreeSet<String> = self
                    .catalogs
                    .get(&provider)
                    .into_iter()
                    .flatten()
                    .map(|op| (*op).to_string())
                    .collect();
                debug!(provider = %provider, count = catalog.len(), "override flag set; enabling full catalog");
                catalog
            } else {
                match section_enabled_set(&doc, provider) {
                    Ok(ops) => ops,
                    Err(e) => {
                        // Config errors are non-fatal per-section: log and
                        // continue with nothing enabled for this provider.
                        warn!(error = %e, "skipping config section");
                        BTreeSet::new()
                    }
                }
            };
            if !ops.is_empty() {
                enabled.insert(provider, ops);
            }
        }
        EnablementMatrix { enabled }
    }
}

/// Extract the truthy operation names of one provider's config section.
/// An absent section is an empty set; a section of the wrong shape is a
/// per-section config error.
fn section_enabled_set(
    doc: &serde_yaml::Value,
    provider: Provider,
) -> Result<BTreeSet<String>, CollectError> {
    let Some(section) = doc.get(provider.as_str()) else {
        return Ok(BTreeSet::new());
    };
    let Some(mapping) = section.as_mapping() else {
        return Err(CollectError::Config {
            section: provider.as_str().to_string(),
            message: "section is not a mapping of operation names to string booleans".to_string(),
        });
    };

    let mut ops = BTreeSet::new();
    for (key, value) in mapping {
        let Some(name) = key.as_str() else {
            warn!(section = provider.as_str(), "non-string operation name in config; skipping entry");
            continue;
        };
        if truthy(value) {
            ops.insert(name.to_string());
        }
    }
    Ok(ops)
}

/// The config stores string-typed booleans; only `"true"` (any case)
/// enables an operation. A bare YAML boolean `true` is tolerated too.
fn truthy(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::String(s) => s.eq_ignore_ascii_case("true"),
        serde_yaml::Value::Bool(b) => *b,
        _ => false,
    }
}
