/// Rounds `value` half away from zero to `places` decimal places.
///
/// Values too large to scale have no fractional digits left and come back unchanged.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

pub fn is_positive_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}
