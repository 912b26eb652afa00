use crate::core::end_use::{HomeType, SystemEndUse};
use crate::core::fuel::{fuel_coefficients, FuelCoefficients};
use crate::errors::{checked_div, HersError};
use crate::input::{HomeOutput, SimulationRecord};
use serde::Serialize;

/// The terms normalising one rated home system against its paired reference home system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SystemNormalization {
    /// rated home system energy consumption
    pub ec_x: f64,
    pub eec_x: f64,
    pub eec_r: f64,
    pub coefficients: (f64, f64),
    /// normalised energy consumption
    pub nec_x: f64,
    /// reference home system load
    pub reul: f64,
    /// reference home system energy consumption
    pub ec_r: f64,
    /// normalised modified end use load
    pub nmeul: f64,
}

/// nEC_x = EC_x * (a * EEC_x - b) * (EEC_r / EEC_x)
pub fn normalized_energy_consumption(
    ec_x: f64,
    eec_x: f64,
    eec_r: f64,
    coefficients: FuelCoefficients,
) -> Result<f64, HersError> {
    let FuelCoefficients { a, b } = coefficients;
    let efficiency_ratio = checked_div(eec_r, eec_x, "nEC_x", || {
        format!("rated home equipment efficiency coefficient is zero (EEC_r = {eec_r})")
    })?;

    Ok(ec_x * (a * eec_x - b) * efficiency_ratio)
}

/// nMEUL = REUL * nEC_x / EC_r
pub fn normalized_modified_load(reul: f64, nec_x: f64, ec_r: f64) -> Result<f64, HersError> {
    checked_div(reul * nec_x, ec_r, "nMEUL", || {
        format!("reference home system consumes no energy (REUL = {reul})")
    })
}

/// Normalise a single system of a rated home (`rated_home` or `iad_rated_home`) against the
/// system at the same position in its paired reference home.
pub fn normalize_system(
    record: &SimulationRecord,
    home_type: HomeType,
    end_use: SystemEndUse,
    system_index: usize,
) -> Result<SystemNormalization, HersError> {
    let reference_home_type =
        home_type
            .paired_reference_home()
            .ok_or(HersError::InvalidHomeType {
                home_type,
                operation: "normalized modified load",
            })?;

    let rated_system = record
        .home_output(home_type)
        .systems(end_use)
        .get(system_index)
        .ok_or_else(|| missing_system(home_type, end_use, system_index))?;
    let reference_system = record
        .home_output(reference_home_type)
        .systems(end_use)
        .get(system_index)
        .ok_or_else(|| missing_system(reference_home_type, end_use, system_index))?;

    let coefficients = fuel_coefficients(end_use, rated_system.primary_fuel_type)?;
    let ec_x = rated_system.annual_energy_consumption();
    let eec_x = rated_system.equipment_efficiency_coefficient;
    let eec_r = reference_system.equipment_efficiency_coefficient;
    let nec_x = normalized_energy_consumption(ec_x, eec_x, eec_r, coefficients).map_err(
        |error| with_system_context(error, home_type, end_use, system_index),
    )?;

    let reul = reference_system.annual_load();
    let ec_r = reference_system.annual_energy_consumption();
    let nmeul = normalized_modified_load(reul, nec_x, ec_r)
        .map_err(|error| with_system_context(error, reference_home_type, end_use, system_index))?;

    Ok(SystemNormalization {
        ec_x,
        eec_x,
        eec_r,
        coefficients: (coefficients.a, coefficients.b),
        nec_x,
        reul,
        ec_r,
        nmeul,
    })
}

/// nMEUL summed across all systems of an end use.
pub fn end_use_normalized_modified_load(
    record: &SimulationRecord,
    home_type: HomeType,
    end_use: SystemEndUse,
) -> Result<f64, HersError> {
    (0..record.home_output(home_type).systems(end_use).len())
        .map(|system_index| {
            normalize_system(record, home_type, end_use, system_index).map(|system| system.nmeul)
        })
        .sum()
}

/// REUL summed across all systems of an end use in a reference home.
pub fn reference_home_end_use_load(home: &HomeOutput, end_use: SystemEndUse) -> f64 {
    home.systems(end_use)
        .iter()
        .map(|system| system.annual_load())
        .sum()
}

fn missing_system(home_type: HomeType, end_use: SystemEndUse, system_index: usize) -> HersError {
    HersError::ill_formed(format!(
        "{home_type} has no {end_use} system at index {system_index}"
    ))
}

fn with_system_context(
    error: HersError,
    home_type: HomeType,
    end_use: SystemEndUse,
    system_index: usize,
) -> HersError {
    match error {
        HersError::DivisionByZero { quantity, context } => HersError::DivisionByZero {
            quantity,
            context: format!("{home_type} {end_use} system {system_index}: {context}"),
        },
        error => error,
    }
}
