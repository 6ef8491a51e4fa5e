//! MultiQC wrapper
//!
//! MultiQC aggregates reports from other tools into one HTML report plus a
//! `multiqc_data` directory. Everything it writes to the output directory is
//! bundled into `multiqc.tgz`.

use crate::archive::{self, TarManifest, MANIFEST_FILE};
use crate::error::{Result, WrapperError};
use crate::extract::{self, ToolKind};
use crate::runner::{self, CommandRunner, ToolCommand};
use crate::validate;
use crate::{file_name, WrapperOutcome, QC_METRICS_FILE};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DESCRIPTION: &str = "A single report contains aggregated results from bioinformatics analyses across many samples reported by MultiQC.";
pub const TARBALL: &str = "multiqc.tgz";

/// General statistics table, relative to the output directory, without the
/// extension that `-k` decides
pub const GENERAL_STATS_STEM: &str = "multiqc_data/multiqc_general_stats";

/// File extension MultiQC uses for a `-k` data format; an empty format is
/// MultiQC's own default (tsv)
pub fn data_extension(data_format: &str) -> &str {
    match data_format {
        "" | "tsv" => "txt",
        "yaml" | "yml" => "yaml",
        other => other,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MultiQcMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<u64>,
}

/// Count the samples in the general statistics table
///
/// The table is a keyed object for `.json` and `.yaml`, a header plus one row
/// per sample otherwise. Empty text means MultiQC wrote no table.
pub fn parse_general_stats(text: &str, source: &Path) -> Result<MultiQcMetrics> {
    if text.trim().is_empty() {
        return Ok(MultiQcMetrics::default());
    }

    let sample_count = match source.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let table: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;
            table.len() as u64
        }
        Some("yaml") | Some("yml") => {
            let table: serde_yaml::Mapping = serde_yaml::from_str(text)?;
            table.len() as u64
        }
        _ => {
            let rows = text.lines().filter(|line| !line.trim().is_empty());
            rows.skip(1).count() as u64
        }
    };

    Ok(MultiQcMetrics {
        sample_count: Some(sample_count),
    })
}

/// One MultiQC run over explicit input files
#[derive(Debug, Clone)]
pub struct MultiQcRequest {
    pub input_files: Vec<PathBuf>,
    pub output_dir: PathBuf,
    /// Value for `-k`; empty leaves MultiQC's default
    pub data_format: String,
    pub extra_options: String,
}

impl MultiQcRequest {
    pub fn new(input_files: Vec<PathBuf>, output_dir: PathBuf) -> Self {
        Self {
            input_files,
            output_dir,
            data_format: "json".to_string(),
            extra_options: String::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_files.is_empty() {
            return Err(WrapperError::MissingArgument("input file"));
        }
        for path in &self.input_files {
            validate::require_file("seq file", path)?;
        }
        validate::require_dir(&self.output_dir)
    }

    pub fn tarball(&self) -> PathBuf {
        self.output_dir.join(TARBALL)
    }

    /// Where MultiQC writes its general statistics for this data format
    pub fn general_stats(&self) -> PathBuf {
        self.output_dir.join(format!(
            "{}.{}",
            GENERAL_STATS_STEM,
            data_extension(&self.data_format)
        ))
    }

    pub fn command(&self, program: &str) -> Result<ToolCommand> {
        let mut command = ToolCommand::new(program)
            .arg("-f")
            .arg("-o")
            .path_arg(&self.output_dir);

        if !self.data_format.is_empty() {
            command = command.arg("-k").arg(&self.data_format);
        }

        let mut command = command.extra_options(&self.extra_options)?;
        for path in &self.input_files {
            command = command.path_arg(path);
        }
        Ok(command)
    }

    /// Entries MultiQC left in the output directory, sorted, without the
    /// files this wrapper writes itself
    pub fn report_entries(&self) -> Result<Vec<PathBuf>> {
        let own = [QC_METRICS_FILE, MANIFEST_FILE, TARBALL];
        let entries =
            std::fs::read_dir(&self.output_dir).map_err(|e| WrapperError::io(&self.output_dir, e))?;

        let mut report = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| WrapperError::io(&self.output_dir, e))?.path();
            if !own.contains(&file_name(&path).as_str()) {
                report.push(path);
            }
        }
        report.sort();
        Ok(report)
    }

    pub fn run(&self, runner: &dyn CommandRunner) -> Result<WrapperOutcome> {
        self.validate()?;

        let kind = ToolKind::MultiQc;
        let program = kind.executable();
        let version = runner::tool_version(runner, &program, kind.program())?;
        info!("Running MultiQC {} over {} input file(s)", version, self.input_files.len());

        let output = runner::run_checked(runner, &self.command(&program)?)?;
        if !output.stderr.is_empty() {
            log::debug!("multiqc: {}", output.stderr);
        }

        let report = self.report_entries()?;
        let general_stats = self.general_stats();
        let qc_metrics = extract::write_qc_metrics(kind, &general_stats, &version, &self.output_dir)?;

        let manifest = TarManifest::new()
            .file("qc_metrics", &qc_metrics)
            .files("multiqc_report", &report);
        let manifest = archive::write_manifest(&self.output_dir, &manifest)?;

        let mut files = vec![manifest.clone(), qc_metrics.clone()];
        files.extend(report.iter().cloned());
        let tarball = archive::bundle(&self.tarball(), &files)?;

        Ok(WrapperOutcome {
            tool_version: version,
            outputs: report,
            qc_metrics,
            manifest,
            tarball,
        })
    }
}
