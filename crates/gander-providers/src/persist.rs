//! Output persistence: each operation writes to its own destination,
//! keyed by provider and operation name, so concurrent units never touch
//! the same file.

use std::io::Write;
use std::path::{Path, PathBuf};

use gander_core::{CollectError, Provider};
use tracing::info;

/// Write the collected items for one operation as JSON lines to
/// `<output>/<provider>/<operation>.json`, creating the provider
/// directory if needed.
pub(crate) fn write_items(
    output_dir: &Path,
    provider: Provider,
    operation: &str,
    items: &[serde_json::Value],
) -> Result<PathBuf, CollectError> {
    let dir = output_dir.join(provider.as_str());
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{operation}.json"));

    let mut file = std::fs::File::create(&path)?;
    for item in items {
        serde_json::to_writer(&mut file, item)
            .map_err(|e| CollectError::Io(std::io::Error::other(e)))?;
        file.write_all(b"\n")?;
    }
    file.flush()?;

    info!(provider = %provider, operation, items = items.len(), path = %path.display(), "wrote output");
    Ok(path)
}
