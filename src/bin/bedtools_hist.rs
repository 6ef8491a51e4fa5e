//! bedtools coverage -hist wrapper
//!
//! Depth histogram of a reference genome BED covered by an input BED/BAM/GFF,
//! reduced to `qc_metrics.json` and bundled as `<input>.coverage_hist.tgz`

use anyhow::{Context, Result};
use clap::{value_parser, Arg, Command};
use qc_tool_wrappers::bedtools::{CoverageMode, CoverageRequest};
use qc_tool_wrappers::SystemRunner;
use std::path::PathBuf;

fn main() -> Result<()> {
    qc_tool_wrappers::init_logging();

    let matches = Command::new("qc-wrap-bedtools-hist")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tool: bedtools coverage with the hist option")
        .arg(
            Arg::new("input_data")
                .short('d')
                .long("input-data")
                .value_name("FILE")
                .help("Input file (.bam, .bed, .gff)")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("ref_genome")
                .short('r')
                .long("ref-genome")
                .value_name("BED")
                .help("Path to reference genome bed file (i.e. hg38.bed)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-directory")
                .value_name("DIR")
                .help("Output directory")
                .value_parser(value_parser!(PathBuf))
                .default_value("."),
        )
        .arg(
            Arg::new("extra_options")
                .short('x')
                .long("extra-options")
                .value_name("OPTIONS")
                .help("Any extra parameters to pass to bedtools coverage")
                .allow_hyphen_values(true)
                .default_value(""),
        )
        .get_matches();

    let input_data = matches
        .get_one::<PathBuf>("input_data")
        .cloned()
        .context("--input-data is required")?;
    let reference = matches.get_one::<PathBuf>("ref_genome").cloned();

    let mut request = CoverageRequest::new(CoverageMode::Hist, input_data, reference);
    if let Some(dir) = matches.get_one::<PathBuf>("output_dir") {
        request.output_dir = dir.clone();
    }
    if let Some(extra) = matches.get_one::<String>("extra_options") {
        request.extra_options = extra.clone();
    }

    let outcome = request
        .run(&SystemRunner)
        .context("bedtools coverage -hist failed")?;

    println!("✅ bedtools {} coverage histogram complete", outcome.tool_version);
    println!("📊 Metrics: {}", outcome.qc_metrics.display());
    println!("💾 Tarball: {}", outcome.tarball.display());

    Ok(())
}
