//! Paired-end cutadapt wrapper
//!
//! Trims adapters from a read pair, keeps cutadapt's report as the log file
//! and bundles the log with its metrics as `<log>.tgz`

use anyhow::{Context, Result};
use clap::{value_parser, Arg, Command};
use qc_tool_wrappers::cutadapt::{CutadaptRequest, DEFAULT_ADAPTER_R1, DEFAULT_ADAPTER_R2};
use qc_tool_wrappers::SystemRunner;
use std::path::PathBuf;

fn main() -> Result<()> {
    qc_tool_wrappers::init_logging();

    let matches = Command::new("qc-wrap-cutadapt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tool: cutadapt")
        .arg(
            Arg::new("input_r1")
                .short('1')
                .long("input-R1")
                .value_name("FASTQ")
                .help("Input file read 1")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("input_r2")
                .short('2')
                .long("input-R2")
                .value_name("FASTQ")
                .help("Input file read 2")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Output directory")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("adapter_r1")
                .short('a')
                .long("read1-adapter")
                .value_name("SEQUENCE")
                .help("Adapter ligated to the 3' end of the first read. Append '$' to anchor it to the end of the read")
                .default_value(DEFAULT_ADAPTER_R1),
        )
        .arg(
            Arg::new("adapter_r2")
                .short('A')
                .long("read2-adapter")
                .value_name("SEQUENCE")
                .help("3' adapter to be removed from the second read in a pair")
                .default_value(DEFAULT_ADAPTER_R2),
        )
        .arg(
            Arg::new("min_length")
                .short('m')
                .long("minimum-length")
                .value_name("LEN")
                .help("Discard reads shorter than LEN")
                .value_parser(value_parser!(u32))
                .default_value("1"),
        )
        .arg(
            Arg::new("quality_cutoff")
                .short('q')
                .long("quality-cutoff")
                .value_name("[5'CUTOFF,]3'CUTOFF")
                .help("Trim low-quality bases from the 3' end, or from both ends when two comma-separated cutoffs are given")
                .default_value("0"),
        )
        .arg(
            Arg::new("read_group")
                .short('r')
                .long("read-group")
                .value_name("ID")
                .help("Read group id used to name the log file"),
        )
        .arg(
            Arg::new("extra_options")
                .short('x')
                .long("extra-options")
                .value_name("OPTIONS")
                .help("Any extra parameters to pass to cutadapt")
                .allow_hyphen_values(true)
                .default_value(""),
        )
        .get_matches();

    let input_r1 = matches
        .get_one::<PathBuf>("input_r1")
        .cloned()
        .context("--input-R1 is required")?;
    let input_r2 = matches
        .get_one::<PathBuf>("input_r2")
        .cloned()
        .context("--input-R2 is required")?;
    let output_dir = matches
        .get_one::<PathBuf>("output_dir")
        .cloned()
        .context("--output-dir is required")?;

    let mut request = CutadaptRequest::new(input_r1, input_r2, output_dir);
    if let Some(adapter) = matches.get_one::<String>("adapter_r1") {
        request.adapter_r1 = adapter.clone();
    }
    if let Some(adapter) = matches.get_one::<String>("adapter_r2") {
        request.adapter_r2 = adapter.clone();
    }
    if let Some(min_length) = matches.get_one::<u32>("min_length") {
        request.minimum_length = *min_length;
    }
    if let Some(cutoff) = matches.get_one::<String>("quality_cutoff") {
        request.quality_cutoff = cutoff.clone();
    }
    request.read_group = matches.get_one::<String>("read_group").cloned();
    if let Some(extra) = matches.get_one::<String>("extra_options") {
        request.extra_options = extra.clone();
    }

    let outcome = request.run(&SystemRunner).context("cutadapt failed")?;

    println!("✅ cutadapt {} trimming complete", outcome.tool_version);
    for output in &outcome.outputs {
        println!("🧬 Output: {}", output.display());
    }
    println!("📊 Metrics: {}", outcome.qc_metrics.display());
    println!("💾 Tarball: {}", outcome.tarball.display());

    Ok(())
}
