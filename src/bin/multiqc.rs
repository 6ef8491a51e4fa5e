//! MultiQC wrapper
//!
//! Aggregates the given reports with MultiQC and bundles everything written
//! to the output directory as `multiqc.tgz`

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use qc_tool_wrappers::multiqc::MultiQcRequest;
use qc_tool_wrappers::SystemRunner;
use std::path::PathBuf;

fn main() -> Result<()> {
    qc_tool_wrappers::init_logging();

    let matches = Command::new("qc-wrap-multiqc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tool: multiqc")
        .arg(
            Arg::new("input_file")
                .short('i')
                .long("input-file")
                .value_name("FILE")
                .help("Input file(s) for MultiQC to aggregate")
                .value_parser(value_parser!(PathBuf))
                .num_args(1..)
                .action(ArgAction::Append)
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
            Arg::new("data_format")
                .short('k')
                .long("data-format")
                .value_name("FORMAT")
                .help("Output data format (tsv, json or yaml)")
                .default_value("json"),
        )
        .arg(
            Arg::new("extra_options")
                .short('x')
                .long("extra-options")
                .value_name("OPTIONS")
                .help("Any extra parameters to pass to multiqc")
                .allow_hyphen_values(true)
                .default_value(""),
        )
        .get_matches();

    let input_files: Vec<PathBuf> = matches
        .get_many::<PathBuf>("input_file")
        .map(|files| files.cloned().collect())
        .unwrap_or_default();
    let output_dir = matches
        .get_one::<PathBuf>("output_dir")
        .cloned()
        .context("--output-dir is required")?;

    let mut request = MultiQcRequest::new(input_files, output_dir);
    if let Some(format) = matches.get_one::<String>("data_format") {
        request.data_format = format.clone();
    }
    if let Some(extra) = matches.get_one::<String>("extra_options") {
        request.extra_options = extra.clone();
    }

    let outcome = request.run(&SystemRunner).context("multiqc failed")?;

    println!("✅ MultiQC {} report complete", outcome.tool_version);
    println!("📈 Report entries: {}", outcome.outputs.len());
    println!("📊 Metrics: {}", outcome.qc_metrics.display());
    println!("💾 Tarball: {}", outcome.tarball.display());

    Ok(())
}
