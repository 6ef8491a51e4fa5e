//! QC Tool Wrappers
//!
//! Thin wrappers around pre-installed bioinformatics tools used in a genomics
//! processing pipeline. Every wrapper validates its inputs, runs one external
//! tool, scrapes the tool's text report into a typed metrics document and
//! bundles the results into a gzipped tarball.
//!
//! This library provides shared functionality for:
//! - Running tools and checking their exit status
//! - Per-tool report parsing into `qc_metrics.json`
//! - Tarball manifests and bundling
//! - The five wrappers: bedtools hist/mean, cutadapt, multiqc, samtools stats

pub mod archive;
pub mod bedtools;
pub mod cutadapt;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod multiqc;
pub mod runner;
pub mod samtools;
pub mod validate;

pub use error::{Result, WrapperError};
pub use extract::{QcMetrics, QcMetricsDocument, ToolKind};
pub use runner::{CommandRunner, SystemRunner};

use serde::Serialize;
use std::path::{Path, PathBuf};

pub const QC_METRICS_FILE: &str = "qc_metrics.json";

/// Name and version of the wrapped tool
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Files written by one wrapper run
#[derive(Debug, Clone)]
pub struct WrapperOutcome {
    pub tool_version: String,
    pub outputs: Vec<PathBuf>,
    pub qc_metrics: PathBuf,
    pub manifest: PathBuf,
    pub tarball: PathBuf,
}

/// Basename of `path` as a string
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Logging for the binaries; `RUST_LOG` overrides the default `info` level
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
