/// |calculated - expected| / expected, treating values that are already close as identical.
///
/// An expected value of zero gives an infinite ratio unless the calculated value is also zero.
pub fn relative_difference(calculated: f64, expected: f64) -> f64 {
    if is_close!(calculated, expected) {
        return 0.;
    }
    (calculated - expected).abs() / expected.abs()
}
