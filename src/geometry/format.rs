//! Human-readable lengths and areas, and fixed-precision numbers

use crate::model::MeasurementUnit;

/// Fixed-point formatting with `decimals` digits after the point
///
/// Negative zero prints as positive zero and non-finite values print as zero,
/// so every exported number matches `-?\d+\.\d{decimals}`.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let s = format!("{:.*}", decimals, value);
    if s.starts_with('-') && s[1..].chars().all(|c| c == '0' || c == '.') {
        s[1..].to_string()
    } else {
        s
    }
}

/// Length for display, e.g. `12' 6"` or `3.81 m`
pub fn format_length(inches: f64, unit: MeasurementUnit) -> String {
    match unit {
        MeasurementUnit::Metric => {
            let cm = inches * 2.54;
            if cm >= 100.0 {
                format!("{:.2} m", cm / 100.0)
            } else {
                format!("{:.1} cm", cm)
            }
        }
        MeasurementUnit::Imperial => {
            let (feet, rem) = split_feet_inches(inches);
            if feet == 0 {
                format!("{}\"", rem)
            } else if rem == 0 {
                format!("{}'", feet)
            } else {
                format!("{}' {}\"", feet, rem)
            }
        }
    }
}

/// Drafting dimension text, e.g. `12'-6"`
pub fn format_feet_inches(inches: f64) -> String {
    let (feet, rem) = split_feet_inches(inches);
    format!("{}'-{}\"", feet, rem)
}

/// Area for display, e.g. `144 sq ft`
pub fn format_area(sq_ft: f64, unit: MeasurementUnit) -> String {
    match unit {
        MeasurementUnit::Metric => format!("{:.1} m\u{00B2}", sq_ft * 0.0929),
        MeasurementUnit::Imperial => format!("{:.0} sq ft", sq_ft),
    }
}

fn split_feet_inches(inches: f64) -> (i64, i64) {
    let total = inches.abs().round() as i64;
    (total / 12, total % 12)
}
