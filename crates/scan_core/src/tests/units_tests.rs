use super::*;

const EPSILON: f64 = 1e-12;

fn slider_samples() -> impl Iterator<Item = f64> {
    (0..=380u32).map(|step| MIN_SCAN_SIZE + f64::from(step) * 0.01)
}

#[test]
fn v2_mode_scales_to_millimeters() {
    for raw in slider_samples() {
        assert!((effective_size(raw, Some(true)) - raw * 1e-3).abs() < EPSILON);
    }
}

#[test]
fn meters_and_unknown_mode_pass_through() {
    for raw in slider_samples() {
        assert_eq!(effective_size(raw, Some(false)), raw);
        assert_eq!(effective_size(raw, None), raw);
    }
}

#[test]
fn display_value_truncates_instead_of_rounding() {
    assert_eq!(display_value(1.27), 1.2);
    assert_eq!(display_value(1.25), 1.2);
    assert_eq!(display_value(2.5), 2.5);
    assert_eq!(display_value(3.99), 3.9);
}

#[test]
fn display_value_matches_floor_formula() {
    for raw in slider_samples() {
        assert_eq!(display_value(raw), (raw * 10.0).floor() / 10.0);
    }
}

#[test]
fn slider_input_is_clamped_into_range() {
    assert_eq!(clamp_slider(0.05), MIN_SCAN_SIZE);
    assert_eq!(clamp_slider(9.0), MAX_SCAN_SIZE);
    assert_eq!(clamp_slider(1.7), 1.7);
    assert_eq!(clamp_slider(f64::NAN), DEFAULT_SCAN_SIZE);
}

#[test]
fn labels_carry_the_unit_suffix() {
    assert_eq!(format_size(2.5, Some(true)), "2.5mm");
    assert_eq!(format_size(2.5, Some(false)), "2.5m");
    assert_eq!(format_size(1.0, None), "1.0m");
}
