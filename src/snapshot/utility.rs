/// Rounds to two decimals. Non-finite input becomes 0.0 so it can never
/// reach a dataset file.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}
