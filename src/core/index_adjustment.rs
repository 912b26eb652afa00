//! Index adjustment factors normalising the rating across homes of different size and shape,
//! derived from the Index Adjustment Design (IAD) variant of the rated home.

use crate::errors::{checked_div, HersError};

/// ERI_IAD = TnML_IAD / TRL_IAD, as a fraction
pub fn iad_energy_rating_index(tnml_iad: f64, trl_iad: f64) -> Result<f64, HersError> {
    checked_div(tnml_iad, trl_iad, "ERI_IAD", || {
        "IAD reference home total load is zero".into()
    })
}

/// IAD_SAVE = (100 - ERI_IAD * 100) / 100
pub fn iad_savings(eri_iad: f64) -> f64 {
    (100. - eri_iad * 100.) / 100.
}

/// IAF_CFA = (2400 / CFA) ^ (0.304 * IAD_SAVE)
pub fn conditioned_floor_area_factor(
    conditioned_floor_area: f64,
    iad_save: f64,
) -> Result<f64, HersError> {
    let ratio = checked_div(2400., conditioned_floor_area, "IAF_CFA", || {
        "conditioned floor area is zero".into()
    })?;
    Ok(ratio.powf(0.304 * iad_save))
}

/// IAF_Nbr = 1 + (0.069 * IAD_SAVE * (NBr - 3))
pub fn number_of_bedrooms_factor(number_of_bedrooms: u32, iad_save: f64) -> f64 {
    1. + (0.069 * iad_save * (number_of_bedrooms as f64 - 3.))
}

/// IAF_NS = (2 / NS) ^ (0.12 * IAD_SAVE)
pub fn number_of_stories_factor(number_of_stories: u32, iad_save: f64) -> Result<f64, HersError> {
    let ratio = checked_div(2., number_of_stories as f64, "IAF_NS", || {
        "number of stories is zero".into()
    })?;
    Ok(ratio.powf(0.12 * iad_save))
}

/// IAF_RH = IAF_CFA * IAF_Nbr * IAF_NS
pub fn rated_home_factor(iaf_cfa: f64, iaf_nbr: f64, iaf_ns: f64) -> f64 {
    iaf_cfa * iaf_nbr * iaf_ns
}
