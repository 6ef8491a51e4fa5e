//! `bedtools coverage` wrappers (`-hist` and `-mean`)
//!
//! Both modes compute coverage of the intervals in `-a` (reference genome or
//! interval file) by the features in `-b` (input data) and keep the tool's
//! TSV output as the artifact.

use crate::archive::{self, TarManifest};
use crate::error::{Result, WrapperError};
use crate::extract::{self, ToolKind};
use crate::metrics::{self, LabeledValue};
use crate::runner::{self, CommandRunner, ToolCommand};
use crate::validate;
use crate::{file_name, WrapperOutcome};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Input data formats bedtools coverage accepts for `-b`
pub const INPUT_EXTENSIONS: &[&str] = &[".bed", ".bam", ".gff"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageMode {
    Hist,
    Mean,
}

impl CoverageMode {
    pub fn kind(&self) -> ToolKind {
        match self {
            CoverageMode::Hist => ToolKind::BedtoolsHist,
            CoverageMode::Mean => ToolKind::BedtoolsMean,
        }
    }

    fn flag(&self) -> &'static str {
        match self {
            CoverageMode::Hist => "-hist",
            CoverageMode::Mean => "-mean",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            CoverageMode::Hist => "coverage_hist",
            CoverageMode::Mean => "coverage_mean",
        }
    }

    /// What the `-a` file is called in messages
    fn reference_label(&self) -> &'static str {
        match self {
            CoverageMode::Hist => "genome file",
            CoverageMode::Mean => "interval file",
        }
    }
}

/// Genome-wide depth histogram from the `all` lines of `-hist` output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageHistogramMetrics {
    /// `{"<depth>": fraction of bases}` in report order
    pub coverage_histogram: Vec<LabeledValue>,
    pub total_length: u64,
    pub mean_depth: f64,
    pub fraction_covered: f64,
}

/// Per-interval mean depth from `-mean` output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanCoverageMetrics {
    /// `{"chrom:start-end": mean depth}` in report order
    pub mean_coverage: Vec<LabeledValue>,
    pub interval_count: usize,
    pub total_interval_length: u64,
    pub overall_mean_coverage: Option<f64>,
}

fn column<T: std::str::FromStr>(metric: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| WrapperError::InvalidValue {
        metric: metric.to_string(),
        value: raw.to_string(),
    })
}

/// Parse `bedtools coverage -hist` output
///
/// Only the summary lines (`all  depth  bases  length  fraction`) are used;
/// the per-feature histogram lines are skipped.
pub fn parse_histogram(text: &str, source: &Path) -> Result<CoverageHistogramMetrics> {
    let mut coverage_histogram = Vec::new();
    let mut total_length = 0;
    let mut mean_depth = 0.0;
    let mut uncovered = 0.0;

    for line in text.lines() {
        let cols: Vec<&str> = line.trim_end().split('\t').collect();
        if cols.len() != 5 || cols[0] != "all" {
            continue;
        }

        let depth: u64 = column("depth", cols[1])?;
        let _bases: u64 = column("bases_at_depth", cols[2])?;
        total_length = column("total_length", cols[3])?;
        let fraction: f64 = column("fraction", cols[4])?;

        if depth == 0 {
            uncovered = fraction;
        }
        mean_depth += depth as f64 * fraction;
        coverage_histogram.push(LabeledValue::new(depth.to_string(), fraction));
    }

    if coverage_histogram.is_empty() {
        return Err(WrapperError::MissingMetric {
            metric: "coverage_histogram",
            source_file: source.to_path_buf(),
        });
    }

    Ok(CoverageHistogramMetrics {
        coverage_histogram,
        total_length,
        mean_depth: metrics::round_to(mean_depth, 4),
        fraction_covered: metrics::round_to(1.0 - uncovered, 4),
    })
}

/// Parse `bedtools coverage -mean` output
///
/// Columns 1-3 are the interval, the last column is its mean depth.
pub fn parse_mean(text: &str, source: &Path) -> Result<MeanCoverageMetrics> {
    let mut mean_coverage = Vec::new();
    let mut total_interval_length = 0u64;
    let mut weighted_sum = 0.0;

    for line in text.lines() {
        if line.trim().is_empty() || line.starts_with('#') || line.starts_with("track") {
            continue;
        }
        let cols: Vec<&str> = line.trim_end().split('\t').collect();
        if cols.len() < 4 {
            return Err(WrapperError::InvalidValue {
                metric: "mean_coverage".to_string(),
                value: line.to_string(),
            });
        }

        let start: u64 = column("start", cols[1])?;
        let end: u64 = column("end", cols[2])?;
        let mean: f64 = column("mean_coverage", cols[cols.len() - 1])?;
        let length = end.saturating_sub(start);

        total_interval_length += length;
        weighted_sum += mean * length as f64;
        mean_coverage.push(LabeledValue::new(
            format!("{}:{}-{}", cols[0], start, end),
            mean,
        ));
    }

    if mean_coverage.is_empty() {
        return Err(WrapperError::MissingMetric {
            metric: "mean_coverage",
            source_file: source.to_path_buf(),
        });
    }

    let overall_mean_coverage = metrics::undefined_as_none(
        metrics::ratio(
            "overall_mean_coverage",
            weighted_sum,
            "total_interval_length",
            total_interval_length as f64,
        )
        .map(|mean| metrics::round_to(mean, 4)),
    )?;

    Ok(MeanCoverageMetrics {
        interval_count: mean_coverage.len(),
        mean_coverage,
        total_interval_length,
        overall_mean_coverage,
    })
}

/// One `bedtools coverage` run
#[derive(Debug, Clone)]
pub struct CoverageRequest {
    pub mode: CoverageMode,
    pub input_data: PathBuf,
    /// `-a` file: reference genome (hist) or interval file (mean)
    pub reference: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub extra_options: String,
}

impl CoverageRequest {
    pub fn new(mode: CoverageMode, input_data: PathBuf, reference: Option<PathBuf>) -> Self {
        Self {
            mode,
            input_data,
            reference,
            output_dir: PathBuf::from("."),
            extra_options: String::new(),
        }
    }

    pub fn validate(&self) -> Result<&Path> {
        let reference = validate::require_present(self.mode.reference_label(), self.reference.as_ref())?;
        validate::require_file("input file", &self.input_data)?;
        validate::require_file(self.mode.reference_label(), reference)?;
        validate::require_dir(&self.output_dir)?;
        validate::require_extension(&self.input_data, INPUT_EXTENSIONS)?;
        Ok(reference.as_path())
    }

    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join(format!(
            "{}.{}.tsv",
            file_name(&self.input_data),
            self.mode.suffix()
        ))
    }

    pub fn tarball(&self) -> PathBuf {
        self.output_dir.join(format!(
            "{}.{}.tgz",
            file_name(&self.input_data),
            self.mode.suffix()
        ))
    }

    pub fn command(&self, program: &str, reference: &Path) -> Result<ToolCommand> {
        ToolCommand::new(program)
            .arg("coverage")
            .arg("-a")
            .path_arg(reference)
            .arg("-b")
            .path_arg(&self.input_data)
            .arg(self.mode.flag())
            .extra_options(&self.extra_options)
            .map(|cmd| cmd.stdout_to(self.output_file()))
    }

    pub fn run(&self, runner: &dyn CommandRunner) -> Result<WrapperOutcome> {
        let reference = self.validate()?;

        let kind = self.mode.kind();
        let program = kind.executable();
        let version = runner::tool_version(runner, &program, kind.program())?;
        info!("Running bedtools {} coverage {}", version, self.mode.flag());

        runner::run_checked(runner, &self.command(&program, reference)?)?;

        let output_file = self.output_file();
        let qc_metrics = extract::write_qc_metrics(kind, &output_file, &version, &self.output_dir)?;

        let manifest = TarManifest::new()
            .file("qc_metrics", &qc_metrics)
            .file(self.mode.suffix(), &output_file);
        let manifest = archive::write_manifest(&self.output_dir, &manifest)?;

        let tarball = archive::bundle(
            &self.tarball(),
            &[manifest.clone(), qc_metrics.clone(), output_file.clone()],
        )?;

        Ok(WrapperOutcome {
            tool_version: version,
            outputs: vec![output_file],
            qc_metrics,
            manifest,
            tarball,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::archive_members;
    use crate::runner::testing::{Scripted, ScriptedRunner};
    use tempfile::tempdir;

    const HIST: &str = "chr1\t0\t100\t0\t20\t100\t0.2000000
chr1\t0\t100\t1\t50\t100\t0.5000000
chr1\t0\t100\t2\t30\t100\t0.3000000
all\t0\t20\t100\t0.2000000
all\t1\t50\t100\t0.5000000
all\t2\t30\t100\t0.3000000
";

    const MEAN: &str = "chr1\t0\t100\t2.5000000
chr1\t100\t400\t0.5000000
chr2\t10\t110\tgeneA\t0\t+\t4.0000000
";

    #[test]
    fn test_parse_histogram_uses_summary_lines() {
        let metrics = parse_histogram(HIST, Path::new("x.tsv")).unwrap();

        assert_eq!(metrics.coverage_histogram.len(), 3);
        assert_eq!(metrics.coverage_histogram[1], LabeledValue::new("1", 0.5));
        assert_eq!(metrics.total_length, 100);
        assert_eq!(metrics.mean_depth, 1.1);
        assert_eq!(metrics.fraction_covered, 0.8);

        let value = serde_json::to_value(&metrics).unwrap();
        assert_eq!(value["coverage_histogram"][0], serde_json::json!({"0": 0.2}));
    }

    #[test]
    fn test_parse_histogram_without_summary_fails() {
        let err = parse_histogram("chr1\t0\t100\t0\t20\t100\t0.2\n", Path::new("x.tsv")).unwrap_err();
        assert!(matches!(err, WrapperError::MissingMetric { metric: "coverage_histogram", .. }));
    }

    #[test]
    fn test_parse_mean() {
        let metrics = parse_mean(MEAN, Path::new("x.tsv")).unwrap();

        assert_eq!(metrics.interval_count, 3);
        assert_eq!(metrics.total_interval_length, 500);
        assert_eq!(metrics.mean_coverage[2], LabeledValue::new("chr2:10-110", 4.0));
        // (2.5 * 100 + 0.5 * 300 + 4.0 * 100) / 500
        assert_eq!(metrics.overall_mean_coverage, Some(1.6));
    }

    #[test]
    fn test_parse_mean_zero_length_is_undefined() {
        let metrics = parse_mean("chr1\t5\t5\t0.0\n", Path::new("x.tsv")).unwrap();
        assert_eq!(metrics.overall_mean_coverage, None);
    }

    #[test]
    fn test_parse_mean_rejects_bad_rows() {
        assert!(parse_mean("chr1\t0\n", Path::new("x.tsv")).is_err());
        assert!(parse_mean("chr1\t0\t10\tNaNx\n", Path::new("x.tsv")).is_err());
        assert!(matches!(
            parse_mean("", Path::new("x.tsv")),
            Err(WrapperError::MissingMetric { .. })
        ));
    }

    fn setup(dir: &Path, input_name: &str) -> CoverageRequest {
        let input = dir.join(input_name);
        let genome = dir.join("hg38.bed");
        std::fs::write(&input, "chr1\t10\t20\n").unwrap();
        std::fs::write(&genome, "chr1\t0\t100\n").unwrap();

        let mut request = CoverageRequest::new(CoverageMode::Hist, input, Some(genome));
        request.output_dir = dir.to_path_buf();
        request
    }

    fn bedtools(output: &'static str) -> ScriptedRunner {
        ScriptedRunner::new(move |cmd| {
            if cmd.args == ["--version"] {
                Scripted::ok("bedtools v2.30.0")
            } else {
                Scripted::ok(output)
            }
        })
    }

    #[test]
    fn test_invalid_extension_runs_nothing() {
        let dir = tempdir().unwrap();
        let request = setup(dir.path(), "sample.txt");
        let runner = bedtools(HIST);

        let err = request.run(&runner).unwrap_err();
        assert!(matches!(err, WrapperError::InvalidExtension { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_missing_genome_file() {
        let dir = tempdir().unwrap();
        let mut request = setup(dir.path(), "sample.bed");
        request.reference = None;

        let err = request.run(&bedtools(HIST)).unwrap_err();
        assert_eq!(err.to_string(), "genome file is needed!");
    }

    #[test]
    fn test_hist_run() {
        let dir = tempdir().unwrap();
        let request = setup(dir.path(), "sample.bed");
        let runner = bedtools(HIST);

        let outcome = request.run(&runner).unwrap();
        assert_eq!(outcome.tool_version, "2.30.0");

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].args[0], "coverage");
        assert_eq!(calls[1].args.last().map(String::as_str), Some("-hist"));

        assert_eq!(outcome.tarball, dir.path().join("sample.bed.coverage_hist.tgz"));
        assert_eq!(
            archive_members(&outcome.tarball),
            vec!["tar_content.json", "qc_metrics.json", "sample.bed.coverage_hist.tsv"]
        );

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&outcome.manifest).unwrap()).unwrap();
        assert_eq!(manifest["coverage_hist"], "sample.bed.coverage_hist.tsv");
    }

    #[test]
    fn test_mean_run_with_extra_options() {
        let dir = tempdir().unwrap();
        let mut request = setup(dir.path(), "sample.bam");
        request.mode = CoverageMode::Mean;
        request.extra_options = "-sorted -split".to_string();

        let runner = bedtools(MEAN);
        let outcome = request.run(&runner).unwrap();

        let calls = runner.calls();
        assert_eq!(calls[1].args[5..], ["-mean", "-sorted", "-split"]);

        let metrics: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&outcome.qc_metrics).unwrap()).unwrap();
        assert_eq!(metrics["tool"]["name"], "Bedtools:coverage-mean");
        assert_eq!(metrics["metrics"]["interval_count"], 3);
    }

    #[test]
    fn test_tool_failure_leaves_no_metrics_or_tarball() {
        let dir = tempdir().unwrap();
        let request = setup(dir.path(), "sample.bed");
        let runner = ScriptedRunner::new(|cmd| {
            if cmd.args == ["--version"] {
                Scripted::ok("bedtools v2.30.0")
            } else {
                Scripted::fail(1, "Error: Unable to open file")
            }
        });

        assert!(request.run(&runner).is_err());
        assert!(!dir.path().join("qc_metrics.json").exists());
        assert!(!request.tarball().exists());
    }
}
