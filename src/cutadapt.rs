//! Paired-end `cutadapt` wrapper
//!
//! The trimming report cutadapt prints on stdout is kept as the log file and
//! scraped with one regex per summary line.

use crate::archive::{self, TarManifest};
use crate::error::{Result, WrapperError};
use crate::extract::{self, ToolKind};
use crate::metrics;
use crate::runner::{self, CommandRunner, ToolCommand};
use crate::validate;
use crate::{file_name, WrapperOutcome};
use log::info;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_ADAPTER_R1: &str = "AGATCGGAAGAGCACACGTCTGAACTCCAGTCAC";
pub const DEFAULT_ADAPTER_R2: &str = "AGATCGGAAGAGCGTCGTGTAGGGAAAGAGTGT";

/// Summary lines of the paired-end report, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportLine {
    PairsProcessed,
    Read1WithAdapter,
    Read2WithAdapter,
    PairsTooShort,
    PairsWritten,
    BasepairsProcessed,
    QualityTrimmed,
    BasepairsWritten,
}

const REPORT_LINES: [ReportLine; 8] = [
    ReportLine::PairsProcessed,
    ReportLine::Read1WithAdapter,
    ReportLine::Read2WithAdapter,
    ReportLine::PairsTooShort,
    ReportLine::PairsWritten,
    ReportLine::BasepairsProcessed,
    ReportLine::QualityTrimmed,
    ReportLine::BasepairsWritten,
];

impl ReportLine {
    fn metric(&self) -> &'static str {
        match self {
            ReportLine::PairsProcessed => "total_read_pairs_processed",
            ReportLine::Read1WithAdapter => "read1_with_adapter",
            ReportLine::Read2WithAdapter => "read2_with_adapter",
            ReportLine::PairsTooShort => "pairs_too_short",
            ReportLine::PairsWritten => "pairs_written",
            ReportLine::BasepairsProcessed => "total_basepairs_processed",
            ReportLine::QualityTrimmed => "quality_trimmed_bp",
            ReportLine::BasepairsWritten => "total_written_bp",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            ReportLine::PairsProcessed => r"(?m)^Total read pairs processed:\s+([\d,]+)",
            ReportLine::Read1WithAdapter => r"(?m)^\s*Read 1 with adapter:\s+([\d,]+) \(([\d.]+)%\)",
            ReportLine::Read2WithAdapter => r"(?m)^\s*Read 2 with adapter:\s+([\d,]+) \(([\d.]+)%\)",
            ReportLine::PairsTooShort => r"(?m)^Pairs that were too short:\s+([\d,]+) \(([\d.]+)%\)",
            ReportLine::PairsWritten => r"(?m)^Pairs written \(passing filters\):\s+([\d,]+) \(([\d.]+)%\)",
            ReportLine::BasepairsProcessed => r"(?m)^Total basepairs processed:\s+([\d,]+) bp",
            ReportLine::QualityTrimmed => r"(?m)^Quality-trimmed:\s+([\d,]+) bp \(([\d.]+)%\)",
            ReportLine::BasepairsWritten => r"(?m)^Total written \(filtered\):\s+([\d,]+) bp \(([\d.]+)%\)",
        }
    }

    fn regex(&self) -> &'static Regex {
        static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
        let compiled = COMPILED.get_or_init(|| {
            REPORT_LINES
                .iter()
                .map(|line| Regex::new(line.pattern()).expect("cutadapt report pattern"))
                .collect()
        });
        &compiled[*self as usize]
    }
}

/// A count with the percentage cutadapt printed next to it
#[derive(Debug, Clone, Copy, PartialEq)]
struct Captured {
    count: u64,
    percent: Option<f64>,
}

fn capture(text: &str, line: ReportLine) -> Result<Option<Captured>> {
    let Some(caps) = line.regex().captures(text) else {
        return Ok(None);
    };

    let count = metrics::parse_count(line.metric(), &caps[1])?;
    let percent = match caps.get(2) {
        Some(m) => Some(m.as_str().parse::<f64>().map_err(|_| WrapperError::InvalidValue {
            metric: format!("{}_percent", line.metric()),
            value: m.as_str().to_string(),
        })?),
        None => None,
    };

    Ok(Some(Captured { count, percent }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutadaptMetrics {
    pub total_read_pairs_processed: u64,
    pub read1_with_adapter: u64,
    pub read1_with_adapter_percent: f64,
    pub read2_with_adapter: u64,
    pub read2_with_adapter_percent: f64,
    pub pairs_too_short: u64,
    pub pairs_too_short_percent: f64,
    pub pairs_written: u64,
    pub pairs_written_percent: f64,
    pub total_basepairs_processed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_trimmed_bp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_trimmed_percent: Option<f64>,
    pub total_written_bp: u64,
    pub total_written_percent: f64,
}

/// Parse the paired-end summary of a cutadapt report
pub fn parse_report(text: &str, source: &Path) -> Result<CutadaptMetrics> {
    let required = |line: ReportLine| -> Result<Captured> {
        capture(text, line)?.ok_or_else(|| WrapperError::MissingMetric {
            metric: line.metric(),
            source_file: source.to_path_buf(),
        })
    };
    let percent = |captured: Captured| captured.percent.unwrap_or_default();

    let processed = required(ReportLine::PairsProcessed)?;
    let read1 = required(ReportLine::Read1WithAdapter)?;
    let read2 = required(ReportLine::Read2WithAdapter)?;
    let too_short = required(ReportLine::PairsTooShort)?;
    let written = required(ReportLine::PairsWritten)?;
    let bp_processed = required(ReportLine::BasepairsProcessed)?;
    let quality_trimmed = capture(text, ReportLine::QualityTrimmed)?;
    let bp_written = required(ReportLine::BasepairsWritten)?;

    Ok(CutadaptMetrics {
        total_read_pairs_processed: processed.count,
        read1_with_adapter: read1.count,
        read1_with_adapter_percent: percent(read1),
        read2_with_adapter: read2.count,
        read2_with_adapter_percent: percent(read2),
        pairs_too_short: too_short.count,
        pairs_too_short_percent: percent(too_short),
        pairs_written: written.count,
        pairs_written_percent: percent(written),
        total_basepairs_processed: bp_processed.count,
        quality_trimmed_bp: quality_trimmed.map(|q| q.count),
        quality_trimmed_percent: quality_trimmed.and_then(|q| q.percent),
        total_written_bp: bp_written.count,
        total_written_percent: percent(bp_written),
    })
}

/// Log file name; a read group id is sanitised and suffixed with a short
/// hash so distinct ids never collide after sanitising
pub fn log_file_name(read_group: Option<&str>) -> String {
    match read_group {
        None => "cutadapt.log".to_string(),
        Some(rg) => {
            let safe: String = rg
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                        c
                    } else {
                        '_'
                    }
                })
                .collect();
            let digest = hex::encode(Sha256::digest(rg.as_bytes()));
            format!("{}.{}.cutadapt.log", safe, &digest[..8])
        }
    }
}

/// One paired-end cutadapt run
#[derive(Debug, Clone)]
pub struct CutadaptRequest {
    pub input_r1: PathBuf,
    pub input_r2: PathBuf,
    pub output_dir: PathBuf,
    pub adapter_r1: String,
    pub adapter_r2: String,
    pub minimum_length: u32,
    /// One cutoff (3' end) or two comma-separated cutoffs (5',3')
    pub quality_cutoff: String,
    pub read_group: Option<String>,
    pub extra_options: String,
}

impl CutadaptRequest {
    pub fn new(input_r1: PathBuf, input_r2: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_r1,
            input_r2,
            output_dir,
            adapter_r1: DEFAULT_ADAPTER_R1.to_string(),
            adapter_r2: DEFAULT_ADAPTER_R2.to_string(),
            minimum_length: 1,
            quality_cutoff: "0".to_string(),
            read_group: None,
            extra_options: String::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate::require_file("input file", &self.input_r1)?;
        validate::require_file("input file", &self.input_r2)?;
        validate::require_dir(&self.output_dir)
    }

    pub fn log_file(&self) -> PathBuf {
        self.output_dir
            .join(log_file_name(self.read_group.as_deref()))
    }

    /// Trimmed read 1 and read 2 outputs
    pub fn trimmed_outputs(&self) -> (PathBuf, PathBuf) {
        let log_name = log_file_name(self.read_group.as_deref());
        let prefix = log_name.trim_end_matches(".log");
        (
            self.output_dir.join(format!("{}.R1.trimmed.fastq.gz", prefix)),
            self.output_dir.join(format!("{}.R2.trimmed.fastq.gz", prefix)),
        )
    }

    pub fn tarball(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.tgz", file_name(&self.log_file())))
    }

    pub fn command(&self, program: &str) -> Result<ToolCommand> {
        let (trimmed_r1, trimmed_r2) = self.trimmed_outputs();
        ToolCommand::new(program)
            .arg("-q")
            .arg(&self.quality_cutoff)
            .arg("-m")
            .arg(self.minimum_length.to_string())
            .arg("-a")
            .arg(&self.adapter_r1)
            .arg("-A")
            .arg(&self.adapter_r2)
            .arg("-o")
            .path_arg(&trimmed_r1)
            .arg("-p")
            .path_arg(&trimmed_r2)
            .extra_options(&self.extra_options)
            .map(|cmd| {
                cmd.path_arg(&self.input_r1)
                    .path_arg(&self.input_r2)
                    .stdout_to(self.log_file())
            })
    }

    pub fn run(&self, runner: &dyn CommandRunner) -> Result<WrapperOutcome> {
        self.validate()?;

        let kind = ToolKind::Cutadapt;
        let program = kind.executable();
        let version = runner::tool_version(runner, &program, kind.program())?;
        info!(
            "Running cutadapt {} on {} and {}",
            version,
            self.input_r1.display(),
            self.input_r2.display()
        );

        runner::run_checked(runner, &self.command(&program)?)?;

        let log_file = self.log_file();
        let qc_metrics = extract::write_qc_metrics(kind, &log_file, &version, &self.output_dir)?;

        let manifest = TarManifest::new()
            .file("qc_metrics", &qc_metrics)
            .file("cutadapt_log", &log_file);
        let manifest = archive::write_manifest(&self.output_dir, &manifest)?;

        let tarball = archive::bundle(
            &self.tarball(),
            &[manifest.clone(), qc_metrics.clone(), log_file.clone()],
        )?;

        let (trimmed_r1, trimmed_r2) = self.trimmed_outputs();
        Ok(WrapperOutcome {
            tool_version: version,
            outputs: vec![log_file, trimmed_r1, trimmed_r2],
            qc_metrics,
            manifest,
            tarball,
        })
    }
}
