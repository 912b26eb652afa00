use crate::core::units::{kbtu_to_kwh, kwh_to_mbtu};
use crate::errors::{checked_div, HersError};
use crate::input::{EnergyUse, HomeOutput};

/// Energy of one fuel use block, weighted by its fuel's conversion factor, in kWh.
fn weighted_energy_use(energy_use: &EnergyUse) -> f64 {
    let conversion = energy_use.fuel_type.energy_use_conversion();
    kbtu_to_kwh(energy_use.annual_energy() * conversion)
}

/// Total energy use (TEU) of a home across every system and other end use, in MBtu.
pub fn total_energy_use(home: &HomeOutput) -> f64 {
    kwh_to_mbtu(home.all_energy_uses().map(weighted_energy_use).sum())
}

/// Annual total of an optional hourly kWh series, in MBtu; zero when the series is absent.
pub fn annual_hourly_total(hourly_kwh: Option<&[f64]>) -> f64 {
    kwh_to_mbtu(hourly_kwh.map_or(0., |values| values.iter().sum()))
}

/// PEfrac = (TEU - OPP + BSL) / TEU
pub fn purchased_energy_fraction(teu: f64, opp: f64, bsl: f64) -> Result<f64, HersError> {
    checked_div(teu - opp + bsl, teu, "PEfrac", || {
        "rated home total energy use is zero".into()
    })
}
