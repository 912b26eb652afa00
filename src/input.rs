use crate::core::end_use::{HomeType, OtherEndUse, SystemEndUse};
use crate::core::fuel::FuelType;
use crate::errors::HersError;
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::io::{BufReader, Read};
use strum::IntoEnumIterator;

pub fn ingest_for_processing(json: impl Read) -> Result<SimulationRecord, HersError> {
    SimulationRecord::from_json(json)
}

/// The HERS diagnostic output document for one rated project.
#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
pub struct SimulationRecord {
    pub project_name: String,
    pub software_name: String,
    #[validate(exclusive_minimum = 0.)]
    pub conditioned_floor_area: f64,
    pub number_of_bedrooms: u32,
    #[validate(minimum = 1)]
    pub number_of_stories: u32,
    #[validate]
    pub rated_home_output: HomeOutput,
    #[validate]
    pub hers_reference_home_output: HomeOutput,
    #[validate]
    pub co2_reference_home_output: HomeOutput,
    #[validate]
    pub iad_rated_home_output: HomeOutput,
    #[validate]
    pub iad_hers_reference_home_output: HomeOutput,
    /// lb/kWh, hourly
    #[validate(min_items = 8760)]
    #[validate(max_items = 8760)]
    pub electricity_co2_emissions_factors: Vec<f64>,
    /// kWh, hourly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(min_items = 8760)]
    #[validate(max_items = 8760)]
    pub on_site_power_production: Option<Vec<f64>>,
    /// kWh, hourly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(min_items = 8760)]
    #[validate(max_items = 8760)]
    pub battery_storage: Option<Vec<f64>>,
    pub hers_index: f64,
    pub carbon_index: f64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
pub struct HomeOutput {
    #[validate]
    pub space_heating_system_output: Vec<SystemOutput>,
    #[validate]
    pub space_cooling_system_output: Vec<SystemOutput>,
    #[validate]
    pub water_heating_system_output: Vec<SystemOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate]
    pub lighting_and_appliance_energy: Option<Vec<EnergyUse>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate]
    pub ventilation_energy: Option<Vec<EnergyUse>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate]
    pub dehumidification_energy: Option<Vec<EnergyUse>>,
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
pub struct SystemOutput {
    pub primary_fuel_type: FuelType,
    pub equipment_efficiency_coefficient: f64,
    /// kBtu, hourly
    #[validate(min_items = 8760)]
    #[validate(max_items = 8760)]
    pub load: Vec<f64>,
    #[validate]
    pub energy_use: Vec<EnergyUse>,
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
pub struct EnergyUse {
    pub fuel_type: FuelType,
    /// kBtu, hourly
    #[validate(min_items = 8760)]
    #[validate(max_items = 8760)]
    pub energy: Vec<f64>,
}

impl SimulationRecord {
    pub fn from_json(json: impl Read) -> Result<Self, HersError> {
        let reader = BufReader::new(json);

        let record: SimulationRecord =
            serde_json::from_reader(reader).map_err(anyhow::Error::from)?;
        record.validate_record()?;

        Ok(record)
    }

    /// Check hourly array lengths and building characteristics, and that every rated home
    /// declares as many systems per end use as the reference home it is paired with.
    pub fn validate_record(&self) -> Result<(), HersError> {
        self.validate()
            .map_err(|errors| HersError::ill_formed(errors.to_string()))?;

        for (home_type, end_use) in iproduct!(
            [HomeType::RatedHome, HomeType::IadRatedHome],
            SystemEndUse::iter()
        ) {
            let Some(reference_home_type) = home_type.paired_reference_home() else {
                continue;
            };
            let rated_count = self.home_output(home_type).systems(end_use).len();
            let reference_count = self.home_output(reference_home_type).systems(end_use).len();
            if rated_count != reference_count {
                return Err(HersError::ill_formed(format!(
                    "{home_type} declares {rated_count} {end_use} system(s) but {reference_home_type} declares {reference_count}"
                )));
            }
        }

        Ok(())
    }

    pub fn home_output(&self, home_type: HomeType) -> &HomeOutput {
        match home_type {
            HomeType::RatedHome => &self.rated_home_output,
            HomeType::HersReferenceHome => &self.hers_reference_home_output,
            HomeType::Co2ReferenceHome => &self.co2_reference_home_output,
            HomeType::IadRatedHome => &self.iad_rated_home_output,
            HomeType::IadHersReferenceHome => &self.iad_hers_reference_home_output,
        }
    }
}

impl HomeOutput {
    pub fn systems(&self, end_use: SystemEndUse) -> &[SystemOutput] {
        match end_use {
            SystemEndUse::SpaceHeating => &self.space_heating_system_output,
            SystemEndUse::SpaceCooling => &self.space_cooling_system_output,
            SystemEndUse::WaterHeating => &self.water_heating_system_output,
        }
    }

    /// Energy reported for an other end use; empty when the home reports none.
    pub fn other_energy(&self, end_use: OtherEndUse) -> &[EnergyUse] {
        let energy = match end_use {
            OtherEndUse::LightingAndAppliance => &self.lighting_and_appliance_energy,
            OtherEndUse::Ventilation => &self.ventilation_energy,
            OtherEndUse::Dehumidification => &self.dehumidification_energy,
        };
        energy.as_deref().unwrap_or_default()
    }

    /// Every energy use block in the home, system end uses first.
    pub fn all_energy_uses(&self) -> impl Iterator<Item = &EnergyUse> {
        SystemEndUse::iter()
            .flat_map(|end_use| self.systems(end_use))
            .flat_map(|system| system.energy_use.iter())
            .chain(OtherEndUse::iter().flat_map(|end_use| self.other_energy(end_use)))
    }
}

impl EnergyUse {
    pub fn annual_energy(&self) -> f64 {
        self.energy.iter().sum()
    }
}

impl SystemOutput {
    /// Total energy consumed by the system across all of its fuels (EC).
    pub fn annual_energy_consumption(&self) -> f64 {
        self.energy_use.iter().map(EnergyUse::annual_energy).sum()
    }

    /// Total load served by the system across the year (REUL for a reference home system).
    pub fn annual_load(&self) -> f64 {
        self.load.iter().sum()
    }
}
