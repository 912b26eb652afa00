use crate::compare_floats::relative_difference;
use crate::core::emissions::{
    electricity_emissions, fuel_emissions, hourly_electricity_use, on_site_adjustment_emissions,
};
use crate::core::end_use::{EndUse, HomeType, OtherEndUse, SystemEndUse};
use crate::core::energy_use::{annual_hourly_total, purchased_energy_fraction, total_energy_use};
use crate::core::fuel::FuelType;
use crate::core::index_adjustment::{
    conditioned_floor_area_factor, iad_energy_rating_index, iad_savings,
    number_of_bedrooms_factor, number_of_stories_factor, rated_home_factor,
};
use crate::core::normalized_load::{
    end_use_normalized_modified_load, normalize_system, reference_home_end_use_load,
    SystemNormalization,
};
use crate::errors::{checked_div, HersError, IndexMismatchError};
use crate::input::{EnergyUse, SimulationRecord};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter};
use tracing::{debug, info, instrument, warn};

pub const INDEX_TOLERANCE: f64 = 0.005;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Relative difference between a calculated and a declared index at which verification fails.
    pub index_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_tolerance: INDEX_TOLERANCE,
        }
    }
}

/// HERS Index = PEfrac * (TnML / (TRL * IAF_RH)) * 100
pub fn energy_rating_index(
    pe_frac: f64,
    tnml: f64,
    trl: f64,
    iaf_rh: f64,
) -> Result<f64, HersError> {
    Ok(pe_frac
        * checked_div(tnml, trl * iaf_rh, "HERS Index", || {
            format!("TRL = {trl}, IAF_RH = {iaf_rh}")
        })?
        * 100.)
}

/// CO2 Index = ACO2 / (ARCO2 * IAF_RH) * 100
pub fn carbon_index(aco2: f64, arco2: f64, iaf_rh: f64) -> Result<f64, HersError> {
    Ok(checked_div(aco2, arco2 * iaf_rh, "CO2 Index", || {
        format!("ARCO2 = {arco2}, IAF_RH = {iaf_rh}")
    })? * 100.)
}

/// Every scalar the engine calculates and memoises, in reporting order.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    EnumCountMacro,
    EnumIter,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Quantity {
    HersIndex,
    Co2Index,
    IafRh,
    Aco2,
    Arco2,
    PeFrac,
    Tnml,
    Trl,
    Teu,
    Opp,
    Bsl,
    IadSave,
    IafCfa,
    IafNbr,
    IafNs,
    TnmlIad,
    TrlIad,
    NmeulHeat,
    NmeulCool,
    NmeulHw,
    EcLa,
    EcVent,
    EcDh,
    NmeulHeatIad,
    NmeulCoolIad,
    NmeulHwIad,
    EcLaIad,
    EcVentIad,
    EcDhIad,
    ReulHeat,
    ReulCool,
    ReulHw,
    RecLa,
    RecVent,
    RecDh,
    ReulHeatIad,
    ReulCoolIad,
    ReulHwIad,
    RecLaIad,
    RecVentIad,
    RecDhIad,
}

impl Quantity {
    /// The quantity holding the normalised load of a system end use in a rated home, or the
    /// raw load of a system end use in a reference home.
    fn system_end_use(home_type: HomeType, end_use: SystemEndUse) -> Option<Quantity> {
        use Quantity::*;
        use SystemEndUse::*;

        Some(match (home_type, end_use) {
            (HomeType::RatedHome, SpaceHeating) => NmeulHeat,
            (HomeType::RatedHome, SpaceCooling) => NmeulCool,
            (HomeType::RatedHome, WaterHeating) => NmeulHw,
            (HomeType::IadRatedHome, SpaceHeating) => NmeulHeatIad,
            (HomeType::IadRatedHome, SpaceCooling) => NmeulCoolIad,
            (HomeType::IadRatedHome, WaterHeating) => NmeulHwIad,
            (HomeType::HersReferenceHome, SpaceHeating) => ReulHeat,
            (HomeType::HersReferenceHome, SpaceCooling) => ReulCool,
            (HomeType::HersReferenceHome, WaterHeating) => ReulHw,
            (HomeType::IadHersReferenceHome, SpaceHeating) => ReulHeatIad,
            (HomeType::IadHersReferenceHome, SpaceCooling) => ReulCoolIad,
            (HomeType::IadHersReferenceHome, WaterHeating) => ReulHwIad,
            (HomeType::Co2ReferenceHome, _) => return None,
        })
    }

    /// The quantity holding the energy of an other end use in a rated or HERS reference home.
    fn other_end_use(home_type: HomeType, end_use: OtherEndUse) -> Option<Quantity> {
        use OtherEndUse::*;
        use Quantity::*;

        Some(match (home_type, end_use) {
            (HomeType::RatedHome, LightingAndAppliance) => EcLa,
            (HomeType::RatedHome, Ventilation) => EcVent,
            (HomeType::RatedHome, Dehumidification) => EcDh,
            (HomeType::IadRatedHome, LightingAndAppliance) => EcLaIad,
            (HomeType::IadRatedHome, Ventilation) => EcVentIad,
            (HomeType::IadRatedHome, Dehumidification) => EcDhIad,
            (HomeType::HersReferenceHome, LightingAndAppliance) => RecLa,
            (HomeType::HersReferenceHome, Ventilation) => RecVent,
            (HomeType::HersReferenceHome, Dehumidification) => RecDh,
            (HomeType::IadHersReferenceHome, LightingAndAppliance) => RecLaIad,
            (HomeType::IadHersReferenceHome, Ventilation) => RecVentIad,
            (HomeType::IadHersReferenceHome, Dehumidification) => RecDhIad,
            (HomeType::Co2ReferenceHome, _) => return None,
        })
    }
}

/// Calculates the HERS Index and CO2 Index of one rated project.
///
/// Quantities are calculated on first request and memoised for the lifetime of the engine; the
/// record is owned and never modified, so a cached value never goes stale.
#[derive(Debug)]
pub struct IndexEngine {
    record: SimulationRecord,
    config: EngineConfig,
    quantities: [OnceCell<f64>; Quantity::COUNT],
    annual_energy_cache: RefCell<HashMap<(HomeType, EndUse, FuelType), f64>>,
}

impl IndexEngine {
    pub fn new(record: SimulationRecord) -> Self {
        Self::with_config(record, EngineConfig::default())
    }

    pub fn with_config(record: SimulationRecord, config: EngineConfig) -> Self {
        Self {
            record,
            config,
            quantities: std::array::from_fn(|_| OnceCell::new()),
            annual_energy_cache: Default::default(),
        }
    }

    pub fn record(&self) -> &SimulationRecord {
        &self.record
    }

    /// The value of a quantity, calculating and memoising it on first request.
    pub fn value(&self, quantity: Quantity) -> Result<f64, HersError> {
        let cell = &self.quantities[quantity as usize];
        if let Some(value) = cell.get() {
            return Ok(*value);
        }

        let value = self.calculate(quantity)?;
        debug!(%quantity, value, "calculated");

        Ok(*cell.get_or_init(|| value))
    }

    fn calculate(&self, quantity: Quantity) -> Result<f64, HersError> {
        use OtherEndUse::*;
        use SystemEndUse::*;

        let record = &self.record;
        match quantity {
            Quantity::HersIndex => energy_rating_index(
                self.value(Quantity::PeFrac)?,
                self.value(Quantity::Tnml)?,
                self.value(Quantity::Trl)?,
                self.value(Quantity::IafRh)?,
            ),
            Quantity::Co2Index => carbon_index(
                self.value(Quantity::Aco2)?,
                self.value(Quantity::Arco2)?,
                self.value(Quantity::IafRh)?,
            ),
            Quantity::IafRh => Ok(rated_home_factor(
                self.value(Quantity::IafCfa)?,
                self.value(Quantity::IafNbr)?,
                self.value(Quantity::IafNs)?,
            )),
            Quantity::Aco2 => self.annual_co2_emissions(HomeType::RatedHome),
            Quantity::Arco2 => self.annual_co2_emissions(HomeType::Co2ReferenceHome),
            Quantity::PeFrac => purchased_energy_fraction(
                self.value(Quantity::Teu)?,
                self.value(Quantity::Opp)?,
                self.value(Quantity::Bsl)?,
            ),
            Quantity::Tnml => self.total_normalized_modified_load(HomeType::RatedHome),
            Quantity::Trl => self.total_reference_home_load(HomeType::HersReferenceHome),
            Quantity::Teu => Ok(total_energy_use(&record.rated_home_output)),
            Quantity::Opp => Ok(annual_hourly_total(
                record.on_site_power_production.as_deref(),
            )),
            Quantity::Bsl => Ok(annual_hourly_total(record.battery_storage.as_deref())),
            Quantity::IadSave => Ok(iad_savings(self.eri_iad()?)),
            Quantity::IafCfa => conditioned_floor_area_factor(
                record.conditioned_floor_area,
                self.value(Quantity::IadSave)?,
            ),
            Quantity::IafNbr => Ok(number_of_bedrooms_factor(
                record.number_of_bedrooms,
                self.value(Quantity::IadSave)?,
            )),
            Quantity::IafNs => {
                number_of_stories_factor(record.number_of_stories, self.value(Quantity::IadSave)?)
            }
            Quantity::TnmlIad => self.total_normalized_modified_load(HomeType::IadRatedHome),
            Quantity::TrlIad => self.total_reference_home_load(HomeType::IadHersReferenceHome),
            Quantity::NmeulHeat => self.normalized_end_use_load(HomeType::RatedHome, SpaceHeating),
            Quantity::NmeulCool => self.normalized_end_use_load(HomeType::RatedHome, SpaceCooling),
            Quantity::NmeulHw => self.normalized_end_use_load(HomeType::RatedHome, WaterHeating),
            Quantity::EcLa => {
                Ok(self.annual_end_use_energy(HomeType::RatedHome, LightingAndAppliance))
            }
            Quantity::EcVent => Ok(self.annual_end_use_energy(HomeType::RatedHome, Ventilation)),
            Quantity::EcDh => Ok(self.annual_end_use_energy(HomeType::RatedHome, Dehumidification)),
            Quantity::NmeulHeatIad => {
                self.normalized_end_use_load(HomeType::IadRatedHome, SpaceHeating)
            }
            Quantity::NmeulCoolIad => {
                self.normalized_end_use_load(HomeType::IadRatedHome, SpaceCooling)
            }
            Quantity::NmeulHwIad => {
                self.normalized_end_use_load(HomeType::IadRatedHome, WaterHeating)
            }
            Quantity::EcLaIad => {
                Ok(self.annual_end_use_energy(HomeType::IadRatedHome, LightingAndAppliance))
            }
            Quantity::EcVentIad => {
                Ok(self.annual_end_use_energy(HomeType::IadRatedHome, Ventilation))
            }
            Quantity::EcDhIad => {
                Ok(self.annual_end_use_energy(HomeType::IadRatedHome, Dehumidification))
            }
            Quantity::ReulHeat => {
                Ok(self.reference_end_use_load(HomeType::HersReferenceHome, SpaceHeating))
            }
            Quantity::ReulCool => {
                Ok(self.reference_end_use_load(HomeType::HersReferenceHome, SpaceCooling))
            }
            Quantity::ReulHw => {
                Ok(self.reference_end_use_load(HomeType::HersReferenceHome, WaterHeating))
            }
            Quantity::RecLa => {
                Ok(self.annual_end_use_energy(HomeType::HersReferenceHome, LightingAndAppliance))
            }
            Quantity::RecVent => {
                Ok(self.annual_end_use_energy(HomeType::HersReferenceHome, Ventilation))
            }
            Quantity::RecDh => {
                Ok(self.annual_end_use_energy(HomeType::HersReferenceHome, Dehumidification))
            }
            Quantity::ReulHeatIad => {
                Ok(self.reference_end_use_load(HomeType::IadHersReferenceHome, SpaceHeating))
            }
            Quantity::ReulCoolIad => {
                Ok(self.reference_end_use_load(HomeType::IadHersReferenceHome, SpaceCooling))
            }
            Quantity::ReulHwIad => {
                Ok(self.reference_end_use_load(HomeType::IadHersReferenceHome, WaterHeating))
            }
            Quantity::RecLaIad => {
                Ok(self.annual_end_use_energy(HomeType::IadHersReferenceHome, LightingAndAppliance))
            }
            Quantity::RecVentIad => {
                Ok(self.annual_end_use_energy(HomeType::IadHersReferenceHome, Ventilation))
            }
            Quantity::RecDhIad => {
                Ok(self.annual_end_use_energy(HomeType::IadHersReferenceHome, Dehumidification))
            }
        }
    }

    pub fn hers_index(&self) -> Result<f64, HersError> {
        self.value(Quantity::HersIndex)
    }

    pub fn co2_index(&self) -> Result<f64, HersError> {
        self.value(Quantity::Co2Index)
    }

    pub fn iaf_rh(&self) -> Result<f64, HersError> {
        self.value(Quantity::IafRh)
    }

    pub fn pe_frac(&self) -> Result<f64, HersError> {
        self.value(Quantity::PeFrac)
    }

    /// The Energy Rating Index of the IAD rated home, as a fraction rather than a percentage.
    pub fn eri_iad(&self) -> Result<f64, HersError> {
        iad_energy_rating_index(
            self.value(Quantity::TnmlIad)?,
            self.value(Quantity::TrlIad)?,
        )
    }

    /// The normalisation terms of one rated home system.
    pub fn system_normalization(
        &self,
        home_type: HomeType,
        end_use: SystemEndUse,
        system_index: usize,
    ) -> Result<SystemNormalization, HersError> {
        normalize_system(&self.record, home_type, end_use, system_index)
    }

    fn normalized_end_use_load(
        &self,
        home_type: HomeType,
        end_use: SystemEndUse,
    ) -> Result<f64, HersError> {
        end_use_normalized_modified_load(&self.record, home_type, end_use)
    }

    fn reference_end_use_load(&self, home_type: HomeType, end_use: SystemEndUse) -> f64 {
        reference_home_end_use_load(self.record.home_output(home_type), end_use)
    }

    /// TnML = nMEUL_HEAT + nMEUL_COOL + nMEUL_HW + EC_LA + EC_VENT + EC_DH
    pub fn total_normalized_modified_load(&self, home_type: HomeType) -> Result<f64, HersError> {
        if home_type.paired_reference_home().is_none() {
            return Err(HersError::InvalidHomeType {
                home_type,
                operation: "total normalized modified load",
            });
        }
        self.end_use_totals(home_type)
    }

    /// TRL = REUL_HEAT + REUL_COOL + REUL_HW + REC_LA + REC_VENT + REC_DH
    pub fn total_reference_home_load(&self, home_type: HomeType) -> Result<f64, HersError> {
        if !matches!(
            home_type,
            HomeType::HersReferenceHome | HomeType::IadHersReferenceHome
        ) {
            return Err(HersError::InvalidHomeType {
                home_type,
                operation: "total reference home load",
            });
        }
        self.end_use_totals(home_type)
    }

    fn end_use_totals(&self, home_type: HomeType) -> Result<f64, HersError> {
        SystemEndUse::iter()
            .filter_map(|end_use| Quantity::system_end_use(home_type, end_use))
            .chain(
                OtherEndUse::iter()
                    .filter_map(|end_use| Quantity::other_end_use(home_type, end_use)),
            )
            .map(|quantity| self.value(quantity))
            .sum()
    }

    /// Annual energy of one fuel for an end use of a home, in kBtu.
    pub fn annual_energy(&self, home_type: HomeType, end_use: EndUse, fuel_type: FuelType) -> f64 {
        let key = (home_type, end_use, fuel_type);
        if let Some(energy) = self.annual_energy_cache.borrow().get(&key) {
            return *energy;
        }

        let home = self.record.home_output(home_type);
        let matching_fuel = |energy_use: &&EnergyUse| energy_use.fuel_type == fuel_type;
        let energy = match end_use {
            EndUse::System(end_use) => home
                .systems(end_use)
                .iter()
                .flat_map(|system| system.energy_use.iter())
                .filter(matching_fuel)
                .map(|energy_use| energy_use.annual_energy())
                .sum(),
            EndUse::Other(end_use) => home
                .other_energy(end_use)
                .iter()
                .filter(matching_fuel)
                .map(|energy_use| energy_use.annual_energy())
                .sum(),
        };

        self.annual_energy_cache.borrow_mut().insert(key, energy);
        energy
    }

    /// Annual energy of an end use across every fuel, in kBtu.
    pub fn annual_end_use_energy(&self, home_type: HomeType, end_use: impl Into<EndUse>) -> f64 {
        let end_use = end_use.into();
        FuelType::iter()
            .map(|fuel_type| self.annual_energy(home_type, end_use, fuel_type))
            .sum()
    }

    /// Annual energy of a fuel across every end use, in kBtu.
    pub fn annual_fuel_type_energy(&self, home_type: HomeType, fuel_type: FuelType) -> f64 {
        EndUse::all()
            .map(|end_use| self.annual_energy(home_type, end_use, fuel_type))
            .sum()
    }

    /// Hourly electricity use of a home, in kBtu.
    pub fn hourly_electricity_use(&self, home_type: HomeType) -> Vec<f64> {
        hourly_electricity_use(self.record.home_output(home_type))
    }

    /// Annual CO2e emissions of a rated or CO2 reference home, in lb.
    pub fn annual_co2_emissions(&self, home_type: HomeType) -> Result<f64, HersError> {
        if !HomeType::CO2_HOME_TYPES.contains(&home_type) {
            return Err(HersError::InvalidHomeType {
                home_type,
                operation: "annual CO2 emissions",
            });
        }

        let emission_factors = &self.record.electricity_co2_emissions_factors;
        let mut emissions =
            electricity_emissions(&self.hourly_electricity_use(home_type), emission_factors);
        emissions += FuelType::iter()
            .filter(|fuel_type| *fuel_type != FuelType::Electricity)
            .map(|fuel_type| {
                fuel_emissions(fuel_type, self.annual_fuel_type_energy(home_type, fuel_type))
            })
            .sum::<f64>();
        if home_type == HomeType::RatedHome {
            emissions += on_site_adjustment_emissions(
                self.record.on_site_power_production.as_deref(),
                self.record.battery_storage.as_deref(),
                emission_factors,
            );
        }

        Ok(emissions)
    }

    /// Compare a calculated index with the one declared in the input, failing when they differ
    /// by the configured tolerance or more.
    pub fn check_index_mismatch(
        &self,
        index_name: &'static str,
        calculated_index: f64,
        declared_index: f64,
    ) -> Result<(), IndexMismatchError> {
        let difference_ratio = relative_difference(calculated_index, declared_index);
        if difference_ratio.is_nan() || difference_ratio >= self.config.index_tolerance {
            let error = IndexMismatchError {
                project_name: self.record.project_name.clone(),
                index_name,
                calculated_index,
                declared_index,
                difference_ratio,
            };
            warn!("{error}");
            return Err(error);
        }

        info!("{} {index_name} within tolerance.", self.record.project_name);
        Ok(())
    }

    #[instrument(skip(self), fields(project = %self.record.project_name))]
    pub fn verify_hers_index(&self) -> Result<(), HersError> {
        Ok(self.check_index_mismatch("HERS Index", self.hers_index()?, self.record.hers_index)?)
    }

    #[instrument(skip(self), fields(project = %self.record.project_name))]
    pub fn verify_carbon_index(&self) -> Result<(), HersError> {
        Ok(self.check_index_mismatch("CO2 Index", self.co2_index()?, self.record.carbon_index)?)
    }

    pub fn verify(&self) -> Result<(), HersError> {
        self.verify_hers_index()?;
        self.verify_carbon_index()
    }

    /// Every quantity the engine calculates, keyed by name in reporting order.
    pub fn intermediaries(&self) -> Result<IndexMap<Quantity, f64>, HersError> {
        Quantity::iter()
            .map(|quantity| self.value(quantity).map(|value| (quantity, value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::{kbtu_to_kwh, kwh_to_mbtu, per_kwh_to_per_kbtu};
    use crate::tests::fixtures::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const NMEUL_HEAT: f64 = 1804.88;
    const NMEUL_COOL: f64 = 5713.5;
    const NMEUL_HW: f64 = 1200. * 1207.36 / 2500.;
    const TNML: f64 = NMEUL_HEAT + NMEUL_COOL + NMEUL_HW + 3000. + 200.;
    const TRL: f64 = 800. + 1500. + 1200. + 3500. + 250.;

    #[fixture]
    fn engine(record: SimulationRecord) -> IndexEngine {
        IndexEngine::new(record)
    }

    fn aco2() -> f64 {
        4700. * per_kwh_to_per_kbtu(1.) + 2000. * 0.1473
    }

    fn arco2() -> f64 {
        5250. * per_kwh_to_per_kbtu(1.) + 2500. * 0.1473
    }

    #[rstest]
    fn should_calculate_energy_rating_index() {
        assert_relative_eq!(
            energy_rating_index(0.95, 4000., 5000., 1.).unwrap(),
            76.,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_calculate_carbon_index() {
        assert_eq!(carbon_index(5000., 10000., 1.).unwrap(), 50.);
    }

    #[rstest]
    fn should_error_on_zero_reference_values() {
        assert!(energy_rating_index(1., 4000., 0., 1.).is_err());
        assert_eq!(
            carbon_index(5000., 0., 1.).unwrap_err().to_string(),
            "Division by zero while calculating CO2 Index (ARCO2 = 0, IAF_RH = 1)"
        );
    }

    #[rstest]
    fn should_calculate_normalized_end_use_loads(engine: IndexEngine) {
        assert_relative_eq!(
            engine.value(Quantity::NmeulHeat).unwrap(),
            NMEUL_HEAT,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            engine.value(Quantity::NmeulCool).unwrap(),
            NMEUL_COOL,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            engine.value(Quantity::NmeulHw).unwrap(),
            NMEUL_HW,
            max_relative = 1e-12
        );
        assert_eq!(engine.value(Quantity::EcDh).unwrap(), 0.);
    }

    #[rstest]
    fn should_calculate_total_loads(engine: IndexEngine) {
        assert_relative_eq!(
            engine.value(Quantity::Tnml).unwrap(),
            TNML,
            max_relative = 1e-12
        );
        assert_eq!(engine.value(Quantity::Trl).unwrap(), TRL);
    }

    #[rstest]
    #[case(HomeType::HersReferenceHome)]
    #[case(HomeType::Co2ReferenceHome)]
    #[case(HomeType::IadHersReferenceHome)]
    fn should_reject_non_rated_home_for_total_normalized_modified_load(
        engine: IndexEngine,
        #[case] home_type: HomeType,
    ) {
        assert!(matches!(
            engine.total_normalized_modified_load(home_type),
            Err(HersError::InvalidHomeType { .. })
        ));
    }

    #[rstest]
    #[case(HomeType::RatedHome)]
    #[case(HomeType::Co2ReferenceHome)]
    #[case(HomeType::IadRatedHome)]
    fn should_reject_non_reference_home_for_total_reference_home_load(
        engine: IndexEngine,
        #[case] home_type: HomeType,
    ) {
        let error = engine.total_reference_home_load(home_type).unwrap_err();

        assert_eq!(
            error.to_string(),
            format!("'{home_type}' is not a valid home type for total reference home load.")
        );
    }

    #[rstest]
    fn should_calculate_hers_index(engine: IndexEngine) {
        assert_relative_eq!(
            engine.value(Quantity::Teu).unwrap(),
            kwh_to_mbtu(kbtu_to_kwh(1000. + 500. + 800. + 3000. + 200.)),
            max_relative = 1e-12
        );
        assert_eq!(engine.value(Quantity::Opp).unwrap(), 0.);
        assert_eq!(engine.value(Quantity::Bsl).unwrap(), 0.);
        assert_eq!(engine.pe_frac().unwrap(), 1.);
        assert_eq!(engine.iaf_rh().unwrap(), 1.);
        assert_relative_eq!(
            engine.hers_index().unwrap(),
            TNML / TRL * 100.,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_calculate_co2_index(engine: IndexEngine) {
        assert_relative_eq!(
            engine.value(Quantity::Aco2).unwrap(),
            aco2(),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            engine.value(Quantity::Arco2).unwrap(),
            arco2(),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            engine.co2_index().unwrap(),
            aco2() / arco2() * 100.,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_derive_iad_savings_from_iad_homes(engine: IndexEngine) {
        // the IAD homes repeat the rated and reference homes
        assert_relative_eq!(engine.eri_iad().unwrap(), TNML / TRL, max_relative = 1e-12);
        assert_relative_eq!(
            engine.value(Quantity::IadSave).unwrap(),
            1. - TNML / TRL,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_apply_index_adjustment_factor(mut record: SimulationRecord) {
        record.conditioned_floor_area = 1200.;
        record.number_of_bedrooms = 4;
        record.number_of_stories = 1;
        let engine = IndexEngine::new(record);
        let iad_save = 1. - TNML / TRL;

        let iaf_rh = 2f64.powf(0.304 * iad_save)
            * (1. + 0.069 * iad_save)
            * 2f64.powf(0.12 * iad_save);

        assert_relative_eq!(engine.iaf_rh().unwrap(), iaf_rh, max_relative = 1e-12);
        assert_relative_eq!(
            engine.hers_index().unwrap(),
            TNML / (TRL * iaf_rh) * 100.,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            engine.co2_index().unwrap(),
            aco2() / (arco2() * iaf_rh) * 100.,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_offset_on_site_production_and_battery_storage(mut record: SimulationRecord) {
        record.on_site_power_production = Some(hourly(1000.));
        record.battery_storage = Some(hourly(50.));
        let engine = IndexEngine::new(record);
        let teu = engine.value(Quantity::Teu).unwrap();

        assert_relative_eq!(engine.value(Quantity::Opp).unwrap(), kwh_to_mbtu(1000.));
        assert_relative_eq!(engine.value(Quantity::Bsl).unwrap(), kwh_to_mbtu(50.));
        assert_relative_eq!(
            engine.pe_frac().unwrap(),
            (teu - kwh_to_mbtu(1000.) + kwh_to_mbtu(50.)) / teu,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            engine.value(Quantity::Aco2).unwrap(),
            aco2() - 950.,
            max_relative = 1e-12
        );
        // production belongs to the rated home only
        assert_relative_eq!(
            engine.value(Quantity::Arco2).unwrap(),
            arco2(),
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_leave_rated_home_electricity_unaffected_without_optional_series(engine: IndexEngine) {
        assert!(engine.record().on_site_power_production.is_none());
        assert!(engine.record().battery_storage.is_none());

        let hourly = engine.hourly_electricity_use(HomeType::RatedHome);

        assert_eq!(hourly[0], 4700.);
        assert_eq!(hourly.iter().sum::<f64>(), 4700.);
        assert_relative_eq!(
            engine.annual_co2_emissions(HomeType::RatedHome).unwrap(),
            aco2(),
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_reject_hers_reference_home_for_co2_emissions(engine: IndexEngine) {
        assert!(engine
            .annual_co2_emissions(HomeType::HersReferenceHome)
            .is_err());
    }

    #[rstest]
    fn should_cache_annual_energy_by_home_end_use_and_fuel(engine: IndexEngine) {
        let water_heating = EndUse::System(SystemEndUse::WaterHeating);

        assert_eq!(
            engine.annual_energy(HomeType::RatedHome, water_heating, FuelType::NaturalGas),
            2000.
        );
        assert_eq!(
            engine.annual_energy(HomeType::RatedHome, water_heating, FuelType::Electricity),
            0.
        );
        assert_eq!(engine.annual_energy_cache.borrow().len(), 2);
        assert_eq!(
            engine.annual_fuel_type_energy(HomeType::RatedHome, FuelType::Electricity),
            4700.
        );
        let reference_home = HomeType::HersReferenceHome;
        assert_eq!(
            engine.annual_end_use_energy(reference_home, OtherEndUse::Ventilation),
            250.
        );
    }

    #[rstest]
    fn should_return_identical_values_on_repeated_requests(record: SimulationRecord) {
        let engine = IndexEngine::new(record.clone());

        let first = engine.hers_index().unwrap();
        let second = engine.hers_index().unwrap();
        let fresh = IndexEngine::new(record).hers_index().unwrap();

        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(first.to_bits(), fresh.to_bits());
    }

    #[rstest]
    fn should_memoise_quantities_on_first_request(engine: IndexEngine) {
        let is_cached = |quantity: Quantity| engine.quantities[quantity as usize].get().is_some();
        assert!(!is_cached(Quantity::Tnml));

        engine.hers_index().unwrap();

        assert!(is_cached(Quantity::Tnml));
        assert!(!is_cached(Quantity::Co2Index));
    }

    #[rstest]
    #[case(100., 100.49)]
    #[case(100., 99.51)]
    #[case(60., 60.)]
    fn should_pass_within_tolerance(
        engine: IndexEngine,
        #[case] declared: f64,
        #[case] calculated: f64,
    ) {
        assert!(engine
            .check_index_mismatch("HERS Index", calculated, declared)
            .is_ok());
    }

    #[rstest]
    #[case(100., 100.5)]
    #[case(100., 99.5)]
    #[case(100., 120.)]
    #[case(0., 1.)]
    fn should_fail_at_or_beyond_tolerance(
        engine: IndexEngine,
        #[case] declared: f64,
        #[case] calculated: f64,
    ) {
        let error = engine
            .check_index_mismatch("CO2 Index", calculated, declared)
            .unwrap_err();

        assert_eq!(error.project_name, "base");
        assert_eq!(error.index_name, "CO2 Index");
        assert_eq!(error.calculated_index, calculated);
        assert_eq!(error.declared_index, declared);
    }

    #[rstest]
    fn should_use_configured_tolerance(record: SimulationRecord) {
        let engine = IndexEngine::with_config(record, EngineConfig { index_tolerance: 0.01 });

        assert!(engine.check_index_mismatch("HERS Index", 100.9, 100.).is_ok());
        assert!(engine.check_index_mismatch("HERS Index", 101., 100.).is_err());
    }

    #[rstest]
    fn should_read_config_with_default_tolerance() {
        let config: EngineConfig = serde_json::from_str(r#"{"index_tolerance": 0.01}"#).unwrap();
        assert_eq!(config.index_tolerance, 0.01);

        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.index_tolerance, INDEX_TOLERANCE);

        assert!(serde_json::from_str::<EngineConfig>(r#"{"tolerance": 0.01}"#).is_err());
    }

    #[rstest]
    fn should_expose_system_normalization_terms(engine: IndexEngine) {
        let system = engine
            .system_normalization(HomeType::RatedHome, SystemEndUse::SpaceHeating, 0)
            .unwrap();

        assert_eq!(system.coefficients, (2.2561, 0.));
        assert_relative_eq!(system.nmeul, NMEUL_HEAT, max_relative = 1e-12);

        let json = serde_json::to_value(system).unwrap();
        assert_eq!(json["ec_x"], 1000.);
        assert_eq!(json["reul"], 800.);
        assert_eq!(json["coefficients"], serde_json::json!([2.2561, 0.]));
    }

    #[rstest]
    fn should_fail_verification_against_placeholder_indices(engine: IndexEngine) {
        assert!(matches!(
            engine.verify(),
            Err(HersError::IndexMismatch(IndexMismatchError {
                index_name: "HERS Index",
                ..
            }))
        ));
    }

    #[rstest]
    fn should_verify_own_indices_fed_back_as_declared(mut record: SimulationRecord) {
        let calculated = IndexEngine::new(record.clone());
        record.hers_index = calculated.hers_index().unwrap();
        record.carbon_index = calculated.co2_index().unwrap();

        let engine = IndexEngine::new(record);

        assert!(engine.verify().is_ok());
    }

    #[rstest]
    fn should_report_failing_carbon_index_after_passing_hers_index(mut record: SimulationRecord) {
        record.hers_index = IndexEngine::new(record.clone()).hers_index().unwrap();
        record.carbon_index = 1.;

        let error = IndexEngine::new(record).verify().unwrap_err();

        assert!(error.to_string().contains("base CO2 Index outside tolerance."));
    }

    #[rstest]
    fn should_list_intermediaries_in_reporting_order(engine: IndexEngine) {
        let intermediaries = engine.intermediaries().unwrap();

        assert_eq!(intermediaries.len(), Quantity::COUNT);
        assert_eq!(intermediaries.get_index(0).unwrap().0, &Quantity::HersIndex);
        assert_eq!(intermediaries[&Quantity::Trl], TRL);
        let json = serde_json::to_value(&intermediaries).unwrap();
        assert_eq!(json["rec_dh_iad"], 0.);
        assert_eq!(json["co2_index"], intermediaries[&Quantity::Co2Index]);
    }

    #[rstest]
    fn should_error_on_fossil_fuel_space_cooling(mut record: SimulationRecord) {
        record.rated_home_output.space_cooling_system_output[0].primary_fuel_type =
            FuelType::NaturalGas;

        assert!(matches!(
            IndexEngine::new(record).hers_index(),
            Err(HersError::MissingFuelCoefficients { .. })
        ));
    }

    #[rstest]
    fn should_count_dehumidification_when_reported(mut record: SimulationRecord) {
        record.rated_home_output.dehumidification_energy =
            Some(vec![energy_use(FuelType::Electricity, 120.)]);
        record.hers_reference_home_output.dehumidification_energy =
            Some(vec![energy_use(FuelType::Electricity, 80.)]);
        let engine = IndexEngine::new(record);

        assert_eq!(engine.value(Quantity::EcDh).unwrap(), 120.);
        assert_relative_eq!(
            engine.value(Quantity::Tnml).unwrap(),
            TNML + 120.,
            max_relative = 1e-12
        );
        assert_eq!(engine.value(Quantity::Trl).unwrap(), TRL + 80.);
    }
}
