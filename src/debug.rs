use crate::aggregate::WorstViolations;
use pretty_dtoa::{dtoa, FmtFloatConfig};

const FLOAT_CONFIG: FmtFloatConfig = FmtFloatConfig::default()
    .add_point_zero(false)
    .max_significant_digits(9);

pub fn format_f64(f: f64) -> String {
    dtoa(f, FLOAT_CONFIG)
}

pub fn format_f64_vec(v: &[f64]) -> String {
    let a: Vec<String> = v.iter().map(|f| dtoa(*f, FLOAT_CONFIG)).collect();
    format!("[{}]", a.join(", "))
}

/// One line per category: value, monitored branch, outaged device,
/// contingency and interval.
pub fn format_worst(worst: &WorstViolations) -> String {
    let lines: Vec<String> = worst
        .iter()
        .map(|(cat, v)| match v {
            Some(v) => format!(
                "{}: {} (branch {}, device {}, ctg {}, t {})",
                cat,
                format_f64(v.value),
                v.branch,
                v.device,
                v.contingency,
                v.interval
            ),
            None => format!("{}: none", cat),
        })
        .collect();
    lines.join("\n")
}
