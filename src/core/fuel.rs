use crate::core::end_use::SystemEndUse;
use crate::core::units::per_mbtu_to_per_kbtu;
use crate::errors::HersError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum_macros::{Display, EnumIter};

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Electricity,
    Biomass,
    NaturalGas,
    #[serde(rename = "FUEL_OIL_2")]
    #[strum(to_string = "FUEL_OIL_2")]
    FuelOil2,
    LiquidPetroleumGas,
}

/// The grouping fuel types are looked up under in the fuel coefficient table.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelCategory {
    Electricity,
    FossilFuel,
    Biomass,
}

impl FuelType {
    pub const FOSSIL_FUELS: [FuelType; 3] = [
        FuelType::NaturalGas,
        FuelType::FuelOil2,
        FuelType::LiquidPetroleumGas,
    ];

    pub fn is_fossil_fuel(&self) -> bool {
        Self::FOSSIL_FUELS.contains(self)
    }

    pub fn category(&self) -> FuelCategory {
        match self {
            FuelType::Electricity => FuelCategory::Electricity,
            FuelType::Biomass => FuelCategory::Biomass,
            FuelType::NaturalGas | FuelType::FuelOil2 | FuelType::LiquidPetroleumGas => {
                FuelCategory::FossilFuel
            }
        }
    }

    /// Factor applied to annual energy of this fuel when totalling rated home energy use.
    pub fn energy_use_conversion(&self) -> f64 {
        if self.is_fossil_fuel() {
            0.4
        } else {
            1.0
        }
    }
}

/// Coefficients 'a' and 'b' of the normalised energy consumption equation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FuelCoefficients {
    pub a: f64,
    pub b: f64,
}

/// Table 4.1.1(1) of ANSI/RESNET/ICC Standard 301 for space heating, space cooling and
/// water heating.
pub static FUEL_COEFFICIENTS: LazyLock<IndexMap<(SystemEndUse, FuelCategory), FuelCoefficients>> =
    LazyLock::new(|| {
        IndexMap::from([
            (
                (SystemEndUse::SpaceHeating, FuelCategory::Electricity),
                FuelCoefficients { a: 2.2561, b: 0. },
            ),
            (
                (SystemEndUse::SpaceHeating, FuelCategory::FossilFuel),
                FuelCoefficients { a: 1.0943, b: 0.403 },
            ),
            (
                (SystemEndUse::SpaceHeating, FuelCategory::Biomass),
                FuelCoefficients { a: 0.885, b: 0.4047 },
            ),
            (
                (SystemEndUse::SpaceCooling, FuelCategory::Electricity),
                FuelCoefficients { a: 3.809, b: 0. },
            ),
            (
                (SystemEndUse::WaterHeating, FuelCategory::Electricity),
                FuelCoefficients { a: 0.92, b: 0. },
            ),
            (
                (SystemEndUse::WaterHeating, FuelCategory::FossilFuel),
                FuelCoefficients { a: 1.1877, b: 1.013 },
            ),
        ])
    });

/// Fossil fuel CO2e emission factors in lb/kBtu.
// biomass has no published factor yet so contributes no emissions
pub static FOSSIL_FUEL_EMISSION_FACTORS: LazyLock<IndexMap<FuelType, f64>> =
    LazyLock::new(|| {
        IndexMap::from([
            (FuelType::NaturalGas, per_mbtu_to_per_kbtu(147.3)),
            (FuelType::FuelOil2, per_mbtu_to_per_kbtu(195.9)),
            (FuelType::LiquidPetroleumGas, per_mbtu_to_per_kbtu(177.8)),
        ])
    });

pub fn fuel_coefficients(
    end_use: SystemEndUse,
    fuel_type: FuelType,
) -> Result<FuelCoefficients, HersError> {
    let fuel_category = fuel_type.category();
    FUEL_COEFFICIENTS
        .get(&(end_use, fuel_category))
        .copied()
        .ok_or(HersError::MissingFuelCoefficients {
            end_use,
            fuel_category,
        })
}

/// Emission factor in lb/kBtu for a non-electric fuel; zero where none is published.
pub fn fuel_emission_factor(fuel_type: FuelType) -> f64 {
    FOSSIL_FUEL_EMISSION_FACTORS
        .get(&fuel_type)
        .copied()
        .unwrap_or(0.)
}
