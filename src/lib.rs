mod compare_floats;
pub mod core;
pub mod errors;
pub mod input;
pub mod output;

#[macro_use]
extern crate is_close;

pub use crate::core::index_engine::{EngineConfig, IndexEngine, Quantity};
pub use crate::errors::{HersError, IndexMismatchError};
use crate::input::ingest_for_processing;
use crate::output::{FileOutput, Output, SinkOutput};
use bitflags::bitflags;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ProjectFlags: u32 {
        const VERIFY_HERS_INDEX = 0b1;
        const VERIFY_CARBON_INDEX = 0b10;
        const VERIFY_INDICES = Self::VERIFY_HERS_INDEX.bits() | Self::VERIFY_CARBON_INDEX.bits();
    }
}

pub const INTERMEDIARIES_LOCATION_KEY: &str = "intermediaries";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CalculationResults {
    pub project_name: String,
    pub software_name: String,
    pub hers_index: f64,
    pub co2_index: f64,
    pub intermediaries: IndexMap<Quantity, f64>,
}

/// Load one rating document, calculate its indices and write the intermediaries to the output.
///
/// Intermediaries are written before verification so a failing project still leaves its
/// calculated quantities behind for inspection.
#[instrument(skip_all)]
pub fn run_project(
    input: impl Read,
    output: impl Output,
    config: &EngineConfig,
    flags: &ProjectFlags,
) -> Result<CalculationResults, HersError> {
    let record = ingest_for_processing(input)?;
    let engine = IndexEngine::with_config(record, *config);

    let intermediaries = engine.intermediaries()?;
    let results = CalculationResults {
        project_name: engine.record().project_name.clone(),
        software_name: engine.record().software_name.clone(),
        hers_index: intermediaries[&Quantity::HersIndex],
        co2_index: intermediaries[&Quantity::Co2Index],
        intermediaries,
    };

    if !output.is_noop() {
        write_intermediaries(&output, &results)?;
    }

    if flags.contains(ProjectFlags::VERIFY_HERS_INDEX) {
        engine.verify_hers_index()?;
    }
    if flags.contains(ProjectFlags::VERIFY_CARBON_INDEX) {
        engine.verify_carbon_index()?;
    }

    info!(
        project = %results.project_name,
        hers_index = results.hers_index,
        co2_index = results.co2_index,
        "calculated indices"
    );

    Ok(results)
}

fn write_intermediaries(
    output: &impl Output,
    results: &CalculationResults,
) -> Result<(), HersError> {
    let mut writer = output.writer_for_location_key(INTERMEDIARIES_LOCATION_KEY)?;
    serde_json::to_writer_pretty(&mut writer, results).map_err(anyhow::Error::from)?;
    writer.flush().map_err(anyhow::Error::from)?;
    Ok(())
}

/// Run several rating documents in parallel, one engine per document.
///
/// When an output directory is given, each document's intermediaries are written there under
/// the document's file stem.
pub fn run_projects(
    input_paths: &[PathBuf],
    output_directory: Option<&Path>,
    config: &EngineConfig,
    flags: &ProjectFlags,
) -> Vec<(PathBuf, Result<CalculationResults, HersError>)> {
    input_paths
        .par_iter()
        .map(|input_path| {
            let result = run_project_file(input_path, output_directory, config, flags);
            if let Err(ref e) = result {
                error!("{}: {e}", input_path.display());
            }
            (input_path.clone(), result)
        })
        .collect()
}

fn run_project_file(
    input_path: &Path,
    output_directory: Option<&Path>,
    config: &EngineConfig,
    flags: &ProjectFlags,
) -> Result<CalculationResults, HersError> {
    let input = BufReader::new(File::open(input_path).map_err(anyhow::Error::from)?);

    match output_directory {
        Some(directory) => {
            let file_stem = input_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "project".to_string());
            let output = FileOutput::new(directory.to_path_buf(), file_stem);
            run_project(input, &output, config, flags)
        }
        None => run_project(input, SinkOutput, config, flags),
    }
}
