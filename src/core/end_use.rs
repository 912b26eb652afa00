use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter};

/// The home configurations simulated for a rating.
#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HomeType {
    RatedHome,
    HersReferenceHome,
    Co2ReferenceHome,
    IadRatedHome,
    IadHersReferenceHome,
}

impl HomeType {
    /// The reference home a rated home is normalised against, or None when this home is
    /// not a rated home.
    pub fn paired_reference_home(&self) -> Option<HomeType> {
        match self {
            HomeType::RatedHome => Some(HomeType::HersReferenceHome),
            HomeType::IadRatedHome => Some(HomeType::IadHersReferenceHome),
            _ => None,
        }
    }

    /// Home types whose emissions are counted for the CO2 index.
    pub const CO2_HOME_TYPES: [HomeType; 2] = [HomeType::RatedHome, HomeType::Co2ReferenceHome];
}

/// End uses served by discrete equipment carrying a load and an efficiency coefficient.
#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SystemEndUse {
    SpaceHeating,
    SpaceCooling,
    WaterHeating,
}

/// End uses reported only as energy, with no load or equipment behind them.
#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OtherEndUse {
    LightingAndAppliance,
    Ventilation,
    Dehumidification,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EndUse {
    System(SystemEndUse),
    Other(OtherEndUse),
}

impl fmt::Display for EndUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndUse::System(end_use) => write!(f, "{end_use}"),
            EndUse::Other(end_use) => write!(f, "{end_use}"),
        }
    }
}

impl EndUse {
    pub fn all() -> impl Iterator<Item = EndUse> {
        use strum::IntoEnumIterator;

        SystemEndUse::iter()
            .map(EndUse::System)
            .chain(OtherEndUse::iter().map(EndUse::Other))
    }
}

impl From<SystemEndUse> for EndUse {
    fn from(value: SystemEndUse) -> Self {
        EndUse::System(value)
    }
}

impl From<OtherEndUse> for EndUse {
    fn from(value: OtherEndUse) -> Self {
        EndUse::Other(value)
    }
}
