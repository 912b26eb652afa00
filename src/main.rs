extern crate hers;

use anyhow::bail;
use clap::Parser;
use hers::{run_projects, EngineConfig, ProjectFlags};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct HersArgs {
    #[arg(required = true, help = "Paths to rating documents in .json format")]
    input_files: Vec<PathBuf>,
    #[arg(
        long,
        short,
        help = "Directory to write each document's calculated intermediaries to"
    )]
    output_dir: Option<PathBuf>,
    #[arg(
        long,
        short,
        help = "Relative difference from a declared index at which verification fails [default: 0.005]"
    )]
    tolerance: Option<f64>,
    #[arg(
        long,
        default_value_t = false,
        help = "Skip checking calculated indices against the declared indices"
    )]
    no_verify: bool,
    #[arg(long, short, default_value_t = false, help = "Log every calculated quantity")]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = HersArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = EngineConfig::default();
    if let Some(tolerance) = args.tolerance {
        config.index_tolerance = tolerance;
    }

    let flags = if args.no_verify {
        ProjectFlags::empty()
    } else {
        ProjectFlags::VERIFY_INDICES
    };

    if let Some(output_dir) = &args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let results = run_projects(
        &args.input_files,
        args.output_dir.as_deref(),
        &config,
        &flags,
    );

    let mut failures = 0;
    for (input_file, result) in &results {
        match result {
            Ok(results) => println!(
                "{}: {} HERS Index {:.2}, CO2 Index {:.2}",
                input_file.display(),
                results.project_name,
                results.hers_index,
                results.co2_index
            ),
            Err(_) => failures += 1,
        }
    }
    info!("{} of {} projects passed", results.len() - failures, results.len());

    if failures > 0 {
        bail!("{failures} of {} projects failed", results.len());
    }

    Ok(())
}
