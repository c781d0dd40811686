use shared::domain::SizeUnit;

pub const MIN_SCAN_SIZE: f64 = 0.2;
pub const MAX_SCAN_SIZE: f64 = 4.0;
pub const DEFAULT_SCAN_SIZE: f64 = 1.0;
const MILLIMETER_SCALE: f64 = 1e-3;

/// Size handed to the engine for a slider value. In v2 mode the slider is
/// read as millimeters; otherwise (including an unknown mode) as meters.
pub fn effective_size(raw: f64, v2_mode: Option<bool>) -> f64 {
    match SizeUnit::from_v2_mode(v2_mode) {
        SizeUnit::Millimeters => raw * MILLIMETER_SCALE,
        SizeUnit::Meters => raw,
    }
}

/// Truncates to one decimal place so slider jitter does not churn the label.
pub fn display_value(raw: f64) -> f64 {
    (raw * 10.0).floor() / 10.0
}

pub fn clamp_slider(raw: f64) -> f64 {
    if !raw.is_finite() {
        return DEFAULT_SCAN_SIZE;
    }
    raw.clamp(MIN_SCAN_SIZE, MAX_SCAN_SIZE)
}

pub fn format_size(display: f64, v2_mode: Option<bool>) -> String {
    format!("{display:.1}{}", SizeUnit::from_v2_mode(v2_mode).suffix())
}

#[cfg(test)]
#[path = "tests/units_tests.rs"]
mod tests;
