//! `samtools stats` wrapper
//!
//! Runs `samtools stats` split by read group, keeps the aggregate report as
//! `<aligned>.bamstat` and reduces its SN (summary number) lines to a fixed
//! set of named metrics plus a few derived ratios.

use crate::archive::{self, TarManifest};
use crate::error::{Result, WrapperError};
use crate::extract::{self, ToolKind};
use crate::metrics::{self, MetricValue};
use crate::runner::{self, CommandRunner, ToolCommand};
use crate::validate;
use crate::{file_name, WrapperOutcome};
use log::info;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::{Path, PathBuf};

/// Summary number fields kept from `samtools stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SnField {
    TotalReads,
    FilteredReads,
    FirstFragments,
    LastFragments,
    MappedReads,
    ReadsMappedAndPaired,
    ReadsUnmapped,
    PairedReads,
    ProperlyPairedReads,
    PercentageOfProperlyPairedReads,
    ReadsDuplicated,
    ReadsMq0,
    ReadsQcFailed,
    NonPrimaryAlignments,
    SupplementaryAlignments,
    TotalBases,
    TotalFirstFragmentBases,
    TotalLastFragmentBases,
    PairsOnDifferentChromosomes,
    MappedBases,
    MappedBasesCigar,
    BasesTrimmed,
    DuplicatedBases,
    MismatchBases,
    ErrorRate,
    AverageLength,
    AverageInsertSize,
    InsertSizeStandardDeviation,
    InwardOrientedPairs,
    OutwardOrientedPairs,
    PairsWithOtherOrientation,
}

/// SN label (colon removed) to field
const SN_LABELS: &[(&str, SnField)] = &[
    ("raw total sequences", SnField::TotalReads),
    ("filtered sequences", SnField::FilteredReads),
    ("1st fragments", SnField::FirstFragments),
    ("last fragments", SnField::LastFragments),
    ("reads mapped", SnField::MappedReads),
    ("reads mapped and paired", SnField::ReadsMappedAndPaired),
    ("reads unmapped", SnField::ReadsUnmapped),
    ("reads paired", SnField::PairedReads),
    ("reads properly paired", SnField::ProperlyPairedReads),
    ("percentage of properly paired reads", SnField::PercentageOfProperlyPairedReads),
    ("percentage of properly paired reads (%)", SnField::PercentageOfProperlyPairedReads),
    ("reads duplicated", SnField::ReadsDuplicated),
    ("reads MQ0", SnField::ReadsMq0),
    ("reads QC failed", SnField::ReadsQcFailed),
    ("non-primary alignments", SnField::NonPrimaryAlignments),
    ("supplementary alignments", SnField::SupplementaryAlignments),
    ("total length", SnField::TotalBases),
    ("total first fragment length", SnField::TotalFirstFragmentBases),
    ("total last fragment length", SnField::TotalLastFragmentBases),
    ("pairs on different chromosomes", SnField::PairsOnDifferentChromosomes),
    ("bases mapped", SnField::MappedBases),
    ("bases mapped (cigar)", SnField::MappedBasesCigar),
    ("bases trimmed", SnField::BasesTrimmed),
    ("bases duplicated", SnField::DuplicatedBases),
    ("mismatches", SnField::MismatchBases),
    ("error rate", SnField::ErrorRate),
    ("average length", SnField::AverageLength),
    ("insert size average", SnField::AverageInsertSize),
    ("insert size standard deviation", SnField::InsertSizeStandardDeviation),
    ("inward oriented pairs", SnField::InwardOrientedPairs),
    ("outward oriented pairs", SnField::OutwardOrientedPairs),
    ("pairs with other orientation", SnField::PairsWithOtherOrientation),
];

impl SnField {
    pub fn from_label(label: &str) -> Option<Self> {
        SN_LABELS
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, field)| *field)
    }

    /// Key used in `qc_metrics.json`
    pub fn key(&self) -> &'static str {
        match self {
            SnField::TotalReads => "total_reads",
            SnField::FilteredReads => "filtered_reads",
            SnField::FirstFragments => "1st_fragments",
            SnField::LastFragments => "last_fragments",
            SnField::MappedReads => "mapped_reads",
            SnField::ReadsMappedAndPaired => "reads_mapped_and_paired",
            SnField::ReadsUnmapped => "reads_unmapped",
            SnField::PairedReads => "paired_reads",
            SnField::ProperlyPairedReads => "properly_paired_reads",
            SnField::PercentageOfProperlyPairedReads => "percentage_of_properly_paired_reads",
            SnField::ReadsDuplicated => "reads_duplicated",
            SnField::ReadsMq0 => "reads_MQ0",
            SnField::ReadsQcFailed => "reads_QC_failed",
            SnField::NonPrimaryAlignments => "non-primary_alignments",
            SnField::SupplementaryAlignments => "supplementary_alignments",
            SnField::TotalBases => "total_bases",
            SnField::TotalFirstFragmentBases => "total_first_fragment_bases",
            SnField::TotalLastFragmentBases => "total_last_fragment_bases",
            SnField::PairsOnDifferentChromosomes => "pairs_on_different_chromosomes",
            SnField::MappedBases => "mapped_bases",
            SnField::MappedBasesCigar => "mapped_bases_cigar",
            SnField::BasesTrimmed => "bases_trimmed",
            SnField::DuplicatedBases => "duplicated_bases",
            SnField::MismatchBases => "mismatch_bases",
            SnField::ErrorRate => "error_rate",
            SnField::AverageLength => "average_length",
            SnField::AverageInsertSize => "average_insert_size",
            SnField::InsertSizeStandardDeviation => "insert_size_standard_deviation",
            SnField::InwardOrientedPairs => "inward_oriented_pairs",
            SnField::OutwardOrientedPairs => "outward_oriented_pairs",
            SnField::PairsWithOtherOrientation => "pairs_with_other_orientation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamtoolsStatsMetrics {
    /// Recognised SN fields in report order
    pub summary: Vec<(SnField, MetricValue)>,
    pub total_reads_passed_filter: i64,
    pub percentage_of_non_primary_alignments: Option<f64>,
    pub percentage_of_mapped_reads: Option<f64>,
    pub percentage_of_pairs_on_different_chromosomes: Option<f64>,
}

impl SamtoolsStatsMetrics {
    pub fn get(&self, field: SnField) -> Option<MetricValue> {
        self.summary
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| *value)
    }
}

impl Serialize for SamtoolsStatsMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.summary.len() + 4))?;
        for (field, value) in &self.summary {
            map.serialize_entry(field.key(), value)?;
        }
        map.serialize_entry("total_reads_passed_filter", &self.total_reads_passed_filter)?;
        map.serialize_entry(
            "percentage_of_non-primary_alignments",
            &self.percentage_of_non_primary_alignments,
        )?;
        map.serialize_entry("percentage_of_mapped_reads", &self.percentage_of_mapped_reads)?;
        map.serialize_entry(
            "percentage_of_pairs_on_different_chromosomes",
            &self.percentage_of_pairs_on_different_chromosomes,
        )?;
        map.end()
    }
}

/// Parse `samtools stats` text output
pub fn parse_stats(text: &str, source: &Path) -> Result<SamtoolsStatsMetrics> {
    let mut summary: Vec<(SnField, MetricValue)> = Vec::new();

    for line in text.lines() {
        if !line.starts_with("SN\t") {
            continue;
        }
        let cleaned = line.replace(':', "");
        let cols: Vec<&str> = cleaned.trim().split('\t').collect();
        if cols.len() < 3 {
            continue;
        }
        if let Some(field) = SnField::from_label(cols[1]) {
            let value = metrics::parse_numeric(field.key(), cols[2])?;
            // a repeated label keeps its first position, last value wins
            match summary.iter_mut().find(|(f, _)| *f == field) {
                Some(entry) => entry.1 = value,
                None => summary.push((field, value)),
            }
        }
    }

    let require = |field: SnField| -> Result<MetricValue> {
        summary
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| *value)
            .ok_or_else(|| WrapperError::MissingMetric {
                metric: field.key(),
                source_file: source.to_path_buf(),
            })
    };
    let require_count = |field: SnField| -> Result<i64> {
        let value = require(field)?;
        value.as_i64().ok_or_else(|| WrapperError::InvalidValue {
            metric: field.key().to_string(),
            value: value.as_f64().to_string(),
        })
    };

    let total_reads_passed_filter =
        require_count(SnField::TotalReads)? - require_count(SnField::FilteredReads)?;

    let total = require(SnField::TotalReads)?.as_f64();
    let mapped = require(SnField::MappedReads)?.as_f64();
    let non_primary = require(SnField::NonPrimaryAlignments)?.as_f64();
    let paired = require(SnField::PairedReads)?.as_f64();
    let other_chrom = require(SnField::PairsOnDifferentChromosomes)?.as_f64();

    let percentage_of_non_primary_alignments = metrics::undefined_as_none(metrics::percentage(
        "percentage_of_non-primary_alignments",
        non_primary,
        "mapped_reads",
        mapped,
    ))?;
    let percentage_of_mapped_reads = metrics::undefined_as_none(metrics::percentage(
        "percentage_of_mapped_reads",
        mapped,
        "total_reads",
        total,
    ))?;
    let percentage_of_pairs_on_different_chromosomes =
        metrics::undefined_as_none(metrics::percentage(
            "percentage_of_pairs_on_different_chromosomes",
            other_chrom,
            "paired_reads",
            paired / 2.0,
        ))?;

    Ok(SamtoolsStatsMetrics {
        summary,
        total_reads_passed_filter,
        percentage_of_non_primary_alignments,
        percentage_of_mapped_reads,
        percentage_of_pairs_on_different_chromosomes,
    })
}

/// Alignment formats `samtools stats` reads
const ALIGNMENT_EXTENSIONS: &[&str] = &[".bam", ".sam", ".cram"];

/// One `samtools stats` run
#[derive(Debug, Clone)]
pub struct SamtoolsStatsRequest {
    pub aligned_seq: PathBuf,
    pub reference: PathBuf,
    pub threads: usize,
    pub output_dir: PathBuf,
    pub extra_options: String,
}

impl SamtoolsStatsRequest {
    pub fn new(aligned_seq: PathBuf, reference: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            aligned_seq,
            reference,
            threads: num_cpus::get(),
            output_dir,
            extra_options: String::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate::require_file("aligned seq file", &self.aligned_seq)?;
        validate::require_file("reference file", &self.reference)?;
        validate::require_dir(&self.output_dir)
    }

    fn basename(&self) -> String {
        file_name(&self.aligned_seq)
    }

    pub fn agg_bamstat(&self) -> PathBuf {
        self.output_dir.join(format!("{}.bamstat", self.basename()))
    }

    pub fn tarball(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.samtools_stats.qc.tgz", self.basename()))
    }

    pub fn command(&self, program: &str) -> Result<ToolCommand> {
        let split_prefix = self.output_dir.join(self.basename());
        ToolCommand::new(program)
            .arg("stats")
            .arg("--reference")
            .path_arg(&self.reference)
            .arg("-@")
            .arg(self.threads.to_string())
            .arg("-r")
            .path_arg(&self.reference)
            .args(["--split", "RG", "-P"])
            .path_arg(&split_prefix)
            .extra_options(&self.extra_options)
            .map(|cmd| cmd.path_arg(&self.aligned_seq).stdout_to(self.agg_bamstat()))
    }

    /// Per read-group reports written next to the aggregate, sorted by name
    pub fn lane_bamstats(&self) -> Result<Vec<PathBuf>> {
        let prefix = format!("{}_", self.basename());
        let entries =
            std::fs::read_dir(&self.output_dir).map_err(|e| WrapperError::io(&self.output_dir, e))?;

        let mut lanes = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| WrapperError::io(&self.output_dir, e))?.path();
            let name = file_name(&path);
            let Some(stem) = name.strip_suffix(".bamstat") else {
                continue;
            };
            // `<other>.bam.bamstat` is the aggregate of another input, not a lane
            let aggregate = ALIGNMENT_EXTENSIONS.iter().any(|ext| stem.ends_with(ext));
            if path.is_file() && stem.starts_with(&prefix) && !aggregate {
                lanes.push(path);
            }
        }
        lanes.sort();
        Ok(lanes)
    }

    pub fn run(&self, runner: &dyn CommandRunner) -> Result<WrapperOutcome> {
        self.validate()?;

        let kind = ToolKind::SamtoolsStats;
        let program = kind.executable();
        let version = runner::tool_version(runner, &program, kind.program())?;
        info!("Running samtools {} stats on {}", version, self.aligned_seq.display());

        runner::run_checked(runner, &self.command(&program)?)?;

        let agg_bamstat = self.agg_bamstat();
        let qc_metrics = extract::write_qc_metrics(kind, &agg_bamstat, &version, &self.output_dir)?;
        let lane_bamstats = self.lane_bamstats()?;

        let manifest = TarManifest::new()
            .file("qc_metrics", &qc_metrics)
            .file("agg_bamstat", &agg_bamstat)
            .files("lane_bamstat", &lane_bamstats);
        let manifest = archive::write_manifest(&self.output_dir, &manifest)?;

        let mut files = vec![manifest.clone(), qc_metrics.clone(), agg_bamstat.clone()];
        files.extend(lane_bamstats.iter().cloned());
        let tarball = archive::bundle(&self.tarball(), &files)?;

        let mut outputs = vec![agg_bamstat];
        outputs.extend(lane_bamstats);

        Ok(WrapperOutcome {
            tool_version: version,
            outputs,
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

    const STATS: &str = "# This file was produced by samtools stats (1.17+htslib-1.17)
CHK\t8a5b7e9d\t3e2c1f0a\t7d6c5b4a
SN\traw total sequences:\t100\t# excluding supplementary and secondary reads
SN\tfiltered sequences:\t10
SN\t1st fragments:\t50
SN\tlast fragments:\t50
SN\treads mapped:\t80
SN\treads mapped and paired:\t76\t# paired-end technology bit set + both mates mapped
SN\treads unmapped:\t20
SN\treads properly paired:\t70\t# proper-pair bit set
SN\treads paired:\t100\t# paired-end technology bit set
SN\treads duplicated:\t3\t# PCR or optical duplicate bit set
SN\treads MQ0:\t1\t# mapped and MQ=0
SN\treads QC failed:\t0
SN\tnon-primary alignments:\t4
SN\tsupplementary alignments:\t2
SN\ttotal length:\t15100\t# ignores clipping
SN\tbases mapped:\t12080\t# ignores clipping
SN\tbases mapped (cigar):\t11990\t# more accurate
SN\tbases duplicated:\t453
SN\tmismatches:\t120\t# from NM fields
SN\terror rate:\t1.000834e-02\t# mismatches / bases mapped (cigar)
SN\taverage length:\t151
SN\taverage quality:\t35.2
SN\tinsert size average:\t312.4
SN\tinsert size standard deviation:\t48.7
SN\tinward oriented pairs:\t36
SN\tpairs on different chromosomes:\t5
SN\tpercentage of properly paired reads (%):\t70.0
RL\t151\t100
";

    #[test]
    fn test_parse_stats_fields_and_typing() {
        let metrics = parse_stats(STATS, Path::new("s.bam.bamstat")).unwrap();

        assert_eq!(metrics.get(SnField::TotalReads), Some(MetricValue::Int(100)));
        assert_eq!(metrics.get(SnField::MappedBasesCigar), Some(MetricValue::Int(11990)));
        assert_eq!(metrics.get(SnField::ErrorRate), Some(MetricValue::Float(1.000834e-02)));
        assert_eq!(metrics.get(SnField::AverageLength), Some(MetricValue::Int(151)));
        assert_eq!(metrics.get(SnField::AverageInsertSize), Some(MetricValue::Float(312.4)));
        assert_eq!(
            metrics.get(SnField::PercentageOfProperlyPairedReads),
            Some(MetricValue::Float(70.0))
        );
        // "average quality" is not in the table, "bases trimmed" is absent
        assert_eq!(metrics.summary.len(), 26);
        assert_eq!(metrics.get(SnField::BasesTrimmed), None);
    }

    #[test]
    fn test_derived_metrics() {
        let metrics = parse_stats(STATS, Path::new("s.bam.bamstat")).unwrap();
        assert_eq!(metrics.total_reads_passed_filter, 90);
        assert_eq!(metrics.percentage_of_mapped_reads, Some(80.0));
        assert_eq!(metrics.percentage_of_non_primary_alignments, Some(5.0));
        assert_eq!(metrics.percentage_of_pairs_on_different_chromosomes, Some(10.0));
    }

    #[test]
    fn test_serialized_keys_are_exact() {
        let metrics = parse_stats(STATS, Path::new("s.bam.bamstat")).unwrap();
        let value = serde_json::to_value(&metrics).unwrap();
        let object = value.as_object().unwrap();

        let mut expected: Vec<&str> = metrics.summary.iter().map(|(f, _)| f.key()).collect();
        expected.extend([
            "total_reads_passed_filter",
            "percentage_of_non-primary_alignments",
            "percentage_of_mapped_reads",
            "percentage_of_pairs_on_different_chromosomes",
        ]);
        assert_eq!(object.len(), expected.len());
        for key in expected {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(value["error_rate"], serde_json::json!(0.01000834));
        assert_eq!(value["1st_fragments"], 50);
        assert!(!object.contains_key("average_quality"));
    }

    #[test]
    fn test_no_mapped_reads_is_undefined_not_wrong() {
        let text = "SN\traw total sequences:\t0\nSN\tfiltered sequences:\t0\n\
                    SN\treads mapped:\t0\nSN\treads paired:\t0\n\
                    SN\tnon-primary alignments:\t0\nSN\tpairs on different chromosomes:\t0\n";
        let metrics = parse_stats(text, Path::new("empty.bamstat")).unwrap();

        assert_eq!(metrics.total_reads_passed_filter, 0);
        assert_eq!(metrics.percentage_of_non_primary_alignments, None);
        assert_eq!(metrics.percentage_of_mapped_reads, None);
        assert_eq!(metrics.percentage_of_pairs_on_different_chromosomes, None);

        let value = serde_json::to_value(&metrics).unwrap();
        assert!(value["percentage_of_mapped_reads"].is_null());
    }

    #[test]
    fn test_summary_keeps_report_order() {
        let text = "SN\treads mapped:\t80\nSN\traw total sequences:\t100\n\
                    SN\tfiltered sequences:\t10\nSN\treads paired:\t100\n\
                    SN\tnon-primary alignments:\t4\nSN\tpairs on different chromosomes:\t5\n\
                    SN\treads mapped:\t82\n";
        let metrics = parse_stats(text, Path::new("s.bam.bamstat")).unwrap();

        let keys: Vec<&str> = metrics.summary.iter().map(|(f, _)| f.key()).collect();
        assert_eq!(
            keys,
            [
                "mapped_reads",
                "total_reads",
                "filtered_reads",
                "paired_reads",
                "non-primary_alignments",
                "pairs_on_different_chromosomes",
            ]
        );
        assert_eq!(metrics.get(SnField::MappedReads), Some(MetricValue::Int(82)));

        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.find("\"mapped_reads\"").unwrap() < json.find("\"total_reads\"").unwrap());
        assert!(json.find("\"pairs_on_different_chromosomes\"").unwrap() < json.find("\"total_reads_passed_filter\"").unwrap());
    }

    #[test]
    fn test_missing_total_reads_fails_loudly() {
        let err = parse_stats("SN\tfiltered sequences:\t0\n", Path::new("x.bamstat")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected metric 'total_reads' was not found in x.bamstat"
        );
    }

    fn request(dir: &Path) -> SamtoolsStatsRequest {
        let aligned = dir.join("sample.bam");
        let reference = dir.join("ref.fa");
        std::fs::write(&aligned, b"BAM").unwrap();
        std::fs::write(&reference, b">chr1\nACGT\n").unwrap();

        let out = dir.join("out");
        std::fs::create_dir(&out).unwrap();

        let mut request = SamtoolsStatsRequest::new(aligned, reference, out);
        request.threads = 2;
        request
    }

    #[test]
    fn test_command_line() {
        let dir = tempdir().unwrap();
        let request = request(dir.path());
        let command = request.command("samtools").unwrap();

        let out = dir.path().join("out");
        let expected: Vec<String> = vec![
            "stats".to_string(),
            "--reference".to_string(),
            dir.path().join("ref.fa").to_string_lossy().into_owned(),
            "-@".to_string(),
            "2".to_string(),
            "-r".to_string(),
            dir.path().join("ref.fa").to_string_lossy().into_owned(),
            "--split".to_string(),
            "RG".to_string(),
            "-P".to_string(),
            out.join("sample.bam").to_string_lossy().into_owned(),
            dir.path().join("sample.bam").to_string_lossy().into_owned(),
        ];
        assert_eq!(command.args, expected);
        assert_eq!(command.stdout_path, Some(out.join("sample.bam.bamstat")));
    }

    #[test]
    fn test_run_bundles_aggregate_and_lanes() {
        let dir = tempdir().unwrap();
        let request = request(dir.path());
        let out = request.output_dir.clone();

        let lane_out = out.clone();
        let runner = ScriptedRunner::new(move |cmd| {
            if cmd.args == ["--version"] {
                return Scripted::ok("samtools 1.17\nUsing htslib 1.17");
            }
            for rg in ["rg2", "rg1"] {
                std::fs::write(lane_out.join(format!("sample.bam_{rg}.bamstat")), STATS).unwrap();
            }
            Scripted::ok(STATS)
        });

        let outcome = request.run(&runner).unwrap();
        assert_eq!(outcome.tool_version, "1.17");
        assert_eq!(outcome.tarball, out.join("sample.bam.samtools_stats.qc.tgz"));

        assert_eq!(
            archive_members(&outcome.tarball),
            vec![
                "tar_content.json",
                "qc_metrics.json",
                "sample.bam.bamstat",
                "sample.bam_rg1.bamstat",
                "sample.bam_rg2.bamstat",
            ]
        );

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&outcome.manifest).unwrap()).unwrap();
        assert_eq!(manifest["agg_bamstat"], "sample.bam.bamstat");
        assert_eq!(
            manifest["lane_bamstat"],
            serde_json::json!(["sample.bam_rg1.bamstat", "sample.bam_rg2.bamstat"])
        );
    }

    #[test]
    fn test_lane_bamstats_skip_other_aggregates() {
        let dir = tempdir().unwrap();
        let request = request(dir.path());
        let out = request.output_dir.clone();
        for name in [
            "sample.bam.bamstat",
            "sample.bam_rg1.bamstat",
            "sample.bam_x.bam.bamstat",
            "sample.bam_y.cram.bamstat",
            "sample.bam_rg1.txt",
            "other.bam_rg1.bamstat",
        ] {
            std::fs::write(out.join(name), "").unwrap();
        }

        assert_eq!(request.lane_bamstats().unwrap(), vec![out.join("sample.bam_rg1.bamstat")]);
    }

    #[test]
    fn test_tool_failure_leaves_no_metrics_or_tarball() {
        let dir = tempdir().unwrap();
        let request = request(dir.path());

        let runner = ScriptedRunner::new(|cmd| {
            if cmd.args == ["--version"] {
                Scripted::ok("samtools 1.17")
            } else {
                Scripted::fail(1, "[bam_stats] failed to open file")
            }
        });

        let err = request.run(&runner).unwrap_err();
        assert!(matches!(err, WrapperError::ToolFailed { .. }));
        assert!(!request.output_dir.join("qc_metrics.json").exists());
        assert!(!request.tarball().exists());
    }

    #[test]
    fn test_missing_reference_runs_nothing() {
        let dir = tempdir().unwrap();
        let mut request = request(dir.path());
        request.reference = dir.path().join("absent.fa");

        let runner = ScriptedRunner::new(|_| Scripted::ok("samtools 1.17"));
        assert!(matches!(
            request.run(&runner),
            Err(WrapperError::MissingInput { label: "reference file", .. })
        ));
        assert!(runner.calls().is_empty());
    }
}
