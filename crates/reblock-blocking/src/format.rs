//! Compact "value(error)" formatting of estimates

use reblock_core::EstimateFormatter;

/// Formats `mean ± error` as `mean(error)` with two significant digits of error
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyFormatter;

impl PrettyFormatter {
    pub fn new() -> Self {
        Self
    }
}

/// Format an estimate, e.g. `(1.034234, 0.00453)` becomes `1.0342(45)`
pub fn pretty_fmt_err(mean: f64, error: f64) -> String {
    if !mean.is_finite() || !error.is_finite() || error <= 0.0 {
        return format!("{mean}");
    }

    let mut decimals = 1 - error.log10().floor() as i32;
    let mut digits = (error * 10f64.powi(decimals)).round();
    if digits >= 100.0 {
        decimals -= 1;
        digits = (error * 10f64.powi(decimals)).round();
    }

    if decimals > 0 {
        format!("{:.*}({})", decimals as usize, mean, digits as i64)
    } else {
        let scale = 10f64.powi(-decimals);
        let mean = (mean / scale).round() * scale;
        format!("{:.0}({:.0})", mean, digits * scale)
    }
}

impl EstimateFormatter for PrettyFormatter {
    fn format_estimate(&self, mean: f64, standard_error: f64) -> String {
        pretty_fmt_err(mean, standard_error)
    }
}
