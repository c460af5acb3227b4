//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use gander_core::OverrideFlags;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gander",
    version,
    about = "Selective, concurrent collection of Azure / Entra ID / M365 / MDE telemetry"
)]
pub struct Args {
    /// File to read credentials from, as written by the authentication step
    #[arg(short, long, default_value = ".ugt_auth")]
    pub authfile: PathBuf,

    /// Path to the collection config file
    #[arg(short, long, default_value = ".conf.yaml")]
    pub config: PathBuf,

    /// Output directory for collected data
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Output directory for rendered reports
    #[arg(long, default_value = "reports")]
    pub reports_dir: PathBuf,

    /// Debug output
    #[arg(long)]
    pub debug: bool,

    /// Dry run (no API calls, no files written)
    #[arg(long)]
    pub dry_run: bool,

    /// Enable every Azure operation, ignoring the config section
    #[arg(long)]
    pub azure: bool,

    /// Enable every Entra ID operation, ignoring the config section
    #[arg(long)]
    pub ad: bool,

    /// Enable every M365 operation, ignoring the config section
    #[arg(long)]
    pub m365: bool,

    /// Enable every MDE operation, ignoring the config section
    #[arg(long)]
    pub mde: bool,

    /// Maximum number of operations in flight at once
    #[arg(long, default_value_t = gander_core::orchestrator::DEFAULT_PARALLEL)]
    pub parallel: usize,
}

impl Args {
    pub fn overrides(&self) -> OverrideFlags {
        OverrideFlags {
            azure: self.azure,
            azuread: self.ad,
            m365: self.m365,
            mde: self.mde,
        }
    }
}
