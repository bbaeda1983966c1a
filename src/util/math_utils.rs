/**
Rounds `value` to `decimals` places, half away from zero.

## Arguments
- `value`: The value to round.
- `decimals`: Number of decimal places to keep.

## Returns
The rounded value. Non-finite input is returned unchanged.
 */
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
