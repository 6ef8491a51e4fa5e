//! samtools stats wrapper
//!
//! Collects alignment statistics per read group and in aggregate, reduces the
//! aggregate SN lines to `qc_metrics.json` and bundles all `.bamstat` files

use anyhow::{Context, Result};
use clap::{value_parser, Arg, Command};
use qc_tool_wrappers::samtools::SamtoolsStatsRequest;
use qc_tool_wrappers::SystemRunner;
use std::path::PathBuf;

fn main() -> Result<()> {
    qc_tool_wrappers::init_logging();

    let matches = Command::new("qc-wrap-samtools-stats")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tool: samtools-stats")
        .arg(
            Arg::new("aligned_seq")
                .short('s')
                .long("aligned_seq")
                .value_name("BAM")
                .help("Input aligned seq")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("reference")
                .short('r')
                .long("reference")
                .value_name("FASTA")
                .help("Reference genome")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("N")
                .help("Number of threads (default: number of CPUs)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
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
                .help("Any extra parameters to pass to samtools stats")
                .allow_hyphen_values(true)
                .default_value(""),
        )
        .get_matches();

    let aligned_seq = matches
        .get_one::<PathBuf>("aligned_seq")
        .cloned()
        .context("--aligned_seq is required")?;
    let reference = matches
        .get_one::<PathBuf>("reference")
        .cloned()
        .context("--reference is required")?;
    let output_dir = matches
        .get_one::<PathBuf>("output_dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    let mut request = SamtoolsStatsRequest::new(aligned_seq, reference, output_dir);
    if let Some(threads) = matches.get_one::<usize>("threads") {
        request.threads = *threads;
    }
    if let Some(extra) = matches.get_one::<String>("extra_options") {
        request.extra_options = extra.clone();
    }

    let outcome = request.run(&SystemRunner).context("samtools stats failed")?;

    println!("✅ samtools {} stats complete", outcome.tool_version);
    println!("📚 Stats files: {}", outcome.outputs.len());
    println!("📊 Metrics: {}", outcome.qc_metrics.display());
    println!("💾 Tarball: {}", outcome.tarball.display());

    Ok(())
}
