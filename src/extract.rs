//! Metrics extraction dispatch
//!
//! Each wrapped tool has its own parsing strategy, selected by [`ToolKind`],
//! and its own typed metrics record. The record is wrapped in a
//! [`QcMetricsDocument`] and written as `qc_metrics.json`.

use crate::bedtools::{self, CoverageHistogramMetrics, MeanCoverageMetrics};
use crate::cutadapt::{self, CutadaptMetrics};
use crate::error::{Result, WrapperError};
use crate::multiqc::{self, MultiQcMetrics};
use crate::samtools::{self, SamtoolsStatsMetrics};
use crate::{ToolInfo, QC_METRICS_FILE};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    SamtoolsStats,
    BedtoolsHist,
    BedtoolsMean,
    Cutadapt,
    MultiQc,
}

impl ToolKind {
    /// Default executable name, also used to find the version line
    pub fn program(&self) -> &'static str {
        match self {
            ToolKind::SamtoolsStats => "samtools",
            ToolKind::BedtoolsHist | ToolKind::BedtoolsMean => "bedtools",
            ToolKind::Cutadapt => "cutadapt",
            ToolKind::MultiQc => "multiqc",
        }
    }

    /// Value of `tool.name` in `qc_metrics.json`
    pub fn display_name(&self) -> &'static str {
        match self {
            ToolKind::SamtoolsStats => "Samtools:stats",
            ToolKind::BedtoolsHist => "Bedtools:coverage-hist",
            ToolKind::BedtoolsMean => "Bedtools:coverage-mean",
            ToolKind::Cutadapt => "Cutadapt",
            ToolKind::MultiQc => "MultiQC",
        }
    }

    pub fn env_override(&self) -> String {
        format!("QC_WRAP_{}_BIN", self.program().to_uppercase())
    }

    /// Executable to run, a non-empty `QC_WRAP_<TOOL>_BIN` taking precedence
    pub fn executable(&self) -> String {
        std::env::var(self.env_override())
            .ok()
            .filter(|program| !program.is_empty())
            .unwrap_or_else(|| self.program().to_string())
    }

    fn description(&self) -> Option<&'static str> {
        match self {
            ToolKind::MultiQc => Some(multiqc::DESCRIPTION),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QcMetrics {
    SamtoolsStats(SamtoolsStatsMetrics),
    BedtoolsHist(CoverageHistogramMetrics),
    BedtoolsMean(MeanCoverageMetrics),
    Cutadapt(CutadaptMetrics),
    MultiQc(MultiQcMetrics),
}

#[derive(Debug, Clone, Serialize)]
pub struct QcMetricsDocument {
    pub tool: ToolInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    pub metrics: QcMetrics,
}

/// Run the parsing strategy for `kind` over a tool report
pub fn extract_metrics(kind: ToolKind, text: &str, source: &Path) -> Result<QcMetrics> {
    let metrics = match kind {
        ToolKind::SamtoolsStats => QcMetrics::SamtoolsStats(samtools::parse_stats(text, source)?),
        ToolKind::BedtoolsHist => QcMetrics::BedtoolsHist(bedtools::parse_histogram(text, source)?),
        ToolKind::BedtoolsMean => QcMetrics::BedtoolsMean(bedtools::parse_mean(text, source)?),
        ToolKind::Cutadapt => QcMetrics::Cutadapt(cutadapt::parse_report(text, source)?),
        ToolKind::MultiQc => QcMetrics::MultiQc(multiqc::parse_general_stats(text, source)?),
    };
    Ok(metrics)
}

/// Parse `tool_output` and write `<out_dir>/qc_metrics.json`
pub fn write_qc_metrics(
    kind: ToolKind,
    tool_output: &Path,
    version: &str,
    out_dir: &Path,
) -> Result<PathBuf> {
    // MultiQC only writes general stats when a module reported samples
    let text = if kind == ToolKind::MultiQc && !tool_output.exists() {
        String::new()
    } else {
        std::fs::read_to_string(tool_output).map_err(|e| WrapperError::io(tool_output, e))?
    };

    let document = QcMetricsDocument {
        tool: ToolInfo {
            name: kind.display_name().to_string(),
            version: version.to_string(),
        },
        description: kind.description(),
        metrics: extract_metrics(kind, &text, tool_output)?,
    };

    let path = out_dir.join(QC_METRICS_FILE);
    let json = serde_json::to_string_pretty(&document)?;
    std::fs::write(&path, json).map_err(|e| WrapperError::io(&path, e))?;

    info!("QC metrics written to {}", path.display());
    Ok(path)
}
