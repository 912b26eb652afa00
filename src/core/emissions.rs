use crate::core::fuel::{fuel_emission_factor, FuelType};
use crate::core::units::{per_kwh_to_per_kbtu, HOURS_PER_YEAR};
use crate::input::HomeOutput;

/// Hourly electricity use of a home in kBtu, summed element-wise over every electric fuel use
/// block of every system and other end use.
pub fn hourly_electricity_use(home: &HomeOutput) -> Vec<f64> {
    let mut hourly = vec![0.; HOURS_PER_YEAR];
    for energy_use in home
        .all_energy_uses()
        .filter(|energy_use| energy_use.fuel_type == FuelType::Electricity)
    {
        for (total, energy) in hourly.iter_mut().zip(&energy_use.energy) {
            *total += energy;
        }
    }
    hourly
}

/// Emissions in lb of hourly electricity in kBtu against hourly factors in lb/kWh.
pub fn electricity_emissions(hourly_kbtu: &[f64], emission_factors_lb_per_kwh: &[f64]) -> f64 {
    hourly_kbtu
        .iter()
        .zip(emission_factors_lb_per_kwh)
        .map(|(energy, factor)| energy * per_kwh_to_per_kbtu(*factor))
        .sum()
}

/// Emissions in lb of hourly grid exchanges in kWh against hourly factors in lb/kWh.
pub fn grid_exchange_emissions(hourly_kwh: &[f64], emission_factors_lb_per_kwh: &[f64]) -> f64 {
    hourly_kwh
        .iter()
        .zip(emission_factors_lb_per_kwh)
        .map(|(energy, factor)| energy * factor)
        .sum()
}

/// Emissions in lb of annual non-electric fuel use in kBtu.
pub fn fuel_emissions(fuel_type: FuelType, annual_kbtu: f64) -> f64 {
    annual_kbtu * fuel_emission_factor(fuel_type)
}

/// On-site generation offsets grid electricity and battery storage adds to it.
pub fn on_site_adjustment_emissions(
    on_site_power_production: Option<&[f64]>,
    battery_storage: Option<&[f64]>,
    emission_factors_lb_per_kwh: &[f64],
) -> f64 {
    let production = on_site_power_production.map_or(0., |production| {
        grid_exchange_emissions(production, emission_factors_lb_per_kwh)
    });
    let storage = battery_storage.map_or(0., |storage| {
        grid_exchange_emissions(storage, emission_factors_lb_per_kwh)
    });

    storage - production
}
