//! Rounding and change-from-reference arithmetic.

/// Round half away from zero to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// `round((current - reference) / reference * 100, precision)`, or `None`
/// when the reference is zero or either side is missing.
pub fn percent_change(current: Option<f64>, reference: Option<f64>, precision: u32) -> Option<f64> {
    let current = current?;
    let reference = reference?;
    if reference == 0.0 {
        return None;
    }
    let change = (current - reference) / reference * 100.0;
    change.is_finite().then(|| round_to(change, precision))
}

/// Absolute change from a reference value.
pub fn change(current: Option<f64>, reference: Option<f64>) -> Option<f64> {
    Some(current? - reference?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to(1.005_000_1, 2), 1.01);
        assert_eq!(round_to(-2.345, 1), -2.3);
        assert_eq!(round_to(12.5, 0), 13.0);
    }

    #[test]
    fn percent_change_of_zero_reference_is_undefined() {
        assert_eq!(percent_change(Some(5.0), Some(0.0), 2), None);
        assert_eq!(percent_change(None, Some(1.0), 2), None);
    }

    #[test]
    fn percent_change_rounds() {
        assert_eq!(percent_change(Some(20.0), Some(30.0), 2), Some(-33.33));
        assert_eq!(percent_change(Some(45.0), Some(30.0), 2), Some(50.0));
    }
}
