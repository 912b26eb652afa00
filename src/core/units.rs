//! Conversions between the energy and emission-rate units the rating documents are written in.
//!
//! Energy arrays in the input are in kBtu, on-site production and battery storage in kWh,
//! electricity emission factors in lb/kWh and published fossil fuel factors in lb/MBtu.

/// International Table British thermal unit, in joules.
pub const JOULES_PER_BTU: f64 = 1_055.055_852_62;
pub const JOULES_PER_KILOWATT_HOUR: f64 = 3_600_000.;
pub const BTU_PER_KBTU: f64 = 1_000.;
pub const BTU_PER_MBTU: f64 = 1_000_000.;

pub const HOURS_PER_YEAR: usize = 8_760;

pub fn kbtu_to_kwh(energy_kbtu: f64) -> f64 {
    energy_kbtu * BTU_PER_KBTU * JOULES_PER_BTU / JOULES_PER_KILOWATT_HOUR
}

pub fn kwh_to_kbtu(energy_kwh: f64) -> f64 {
    energy_kwh * JOULES_PER_KILOWATT_HOUR / JOULES_PER_BTU / BTU_PER_KBTU
}

pub fn kwh_to_mbtu(energy_kwh: f64) -> f64 {
    energy_kwh * JOULES_PER_KILOWATT_HOUR / JOULES_PER_BTU / BTU_PER_MBTU
}

/// lb/MBtu to lb/kBtu
pub fn per_mbtu_to_per_kbtu(rate: f64) -> f64 {
    rate * BTU_PER_KBTU / BTU_PER_MBTU
}

/// lb/kWh to lb/kBtu
pub fn per_kwh_to_per_kbtu(rate: f64) -> f64 {
    rate / kwh_to_kbtu(1.)
}
