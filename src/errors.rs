use crate::core::end_use::{HomeType, SystemEndUse};
use crate::core::fuel::FuelCategory;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HersError {
    #[error("Request was considered invalid due to error: {0}")]
    InvalidRequest(#[from] anyhow::Error),
    #[error("'{home_type}' is not a valid home type for {operation}.")]
    InvalidHomeType {
        home_type: HomeType,
        operation: &'static str,
    },
    #[error("{0}")]
    IndexMismatch(#[from] IndexMismatchError),
    #[error("Input was ill-formed: {0}")]
    IllFormedInput(String),
    #[error("Division by zero while calculating {quantity} ({context})")]
    DivisionByZero {
        quantity: &'static str,
        context: String,
    },
    #[error("No fuel coefficients are defined for {end_use} systems using {fuel_category}")]
    MissingFuelCoefficients {
        end_use: SystemEndUse,
        fuel_category: FuelCategory,
    },
}

/// A calculated index deviating from the index declared in the input beyond the tolerance.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("\n{project_name} {index_name} outside tolerance.\nCalculated Index: {calculated_index:.2}\nOutput Index: {declared_index:.2}\nPercent Difference: {:.2}%", .difference_ratio * 100.)]
pub struct IndexMismatchError {
    pub project_name: String,
    pub index_name: &'static str,
    pub calculated_index: f64,
    pub declared_index: f64,
    pub difference_ratio: f64,
}

impl HersError {
    pub(crate) fn ill_formed(message: impl Into<String>) -> Self {
        Self::IllFormedInput(message.into())
    }
}

/// Divide, turning a zero denominator into a [`HersError::DivisionByZero`].
pub(crate) fn checked_div(
    numerator: f64,
    denominator: f64,
    quantity: &'static str,
    context: impl FnOnce() -> String,
) -> Result<f64, HersError> {
    if denominator == 0. {
        return Err(HersError::DivisionByZero {
            quantity,
            context: context(),
        });
    }
    Ok(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_divide_when_denominator_non_zero() {
        assert_eq!(checked_div(3., 2., "x", String::new).unwrap(), 1.5);
    }

    #[rstest]
    fn should_error_when_denominator_zero() {
        let result = checked_div(3., 0., "nEC_x", || "space_heating system 0".into());
        assert!(matches!(
            result,
            Err(HersError::DivisionByZero {
                quantity: "nEC_x",
                ..
            })
        ));
    }

    #[rstest]
    fn should_render_index_mismatch_with_percent_difference() {
        let error = IndexMismatchError {
            project_name: "base".into(),
            index_name: "HERS Index",
            calculated_index: 60.5,
            declared_index: 60.,
            difference_ratio: 0.5 / 60.,
        };
        assert_eq!(
            error.to_string(),
            "\nbase HERS Index outside tolerance.\nCalculated Index: 60.50\nOutput Index: 60.00\nPercent Difference: 0.83%"
        );
    }
}
