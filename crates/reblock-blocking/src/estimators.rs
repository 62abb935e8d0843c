//! Estimators derived from a blocking reduction

use reblock_core::{
    BlockStats, ColumnReblock, Error, Estimate, EstimateTable, EstimatorSuite, Observable,
    ReblockTable, Reduction, Result,
};

/// Standard QMC estimators: projected energy, summary and inefficiency
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEstimators;

impl StandardEstimators {
    pub fn new() -> Self {
        Self
    }
}

/// Ratio `a / b` of two block means with covariance-corrected error
///
/// `covariance` is the covariance of the block values and `block_count`
/// the number of blocks at this level.
pub fn ratio(a: &BlockStats, b: &BlockStats, covariance: f64, block_count: usize) -> BlockStats {
    let n = block_count as f64;
    let mean = a.mean / b.mean;
    let relative_var = (a.standard_error / a.mean).powi(2) + (b.standard_error / b.mean).powi(2)
        - 2.0 * covariance / (n * a.mean * b.mean);
    let standard_error = mean.abs() * relative_var.max(0.0).sqrt();
    BlockStats {
        mean,
        standard_error,
        standard_error_error: standard_error / (2.0 * (n - 1.0)).sqrt(),
    }
}

impl EstimatorSuite for StandardEstimators {
    fn projected_energy(
        &self,
        reduction: &Reduction,
        numerator: Observable,
        denominator: Observable,
    ) -> Result<ColumnReblock> {
        let table = &reduction.table;
        let missing = |obs: Observable| {
            Error::InvalidInput(format!("reblock table has no '{}' column", obs.label()))
        };
        let num = table.column(numerator).ok_or_else(|| missing(numerator))?;
        let den = table.column(denominator).ok_or_else(|| missing(denominator))?;

        let mut levels = Vec::with_capacity(table.num_levels());
        for (level, (a, b)) in num.levels.iter().zip(&den.levels).enumerate() {
            let covariance = reduction
                .covariance
                .get(level, numerator, denominator)
                .ok_or_else(|| {
                    Error::Computation(format!(
                        "no covariance between '{}' and '{}' at level {level}",
                        numerator.label(),
                        denominator.label()
                    ))
                })?;
            let block_count = table.block_counts.get(level).copied().ok_or_else(|| {
                Error::Computation(format!(
                    "reblock table has no block count for level {level}"
                ))
            })?;
            levels.push(ratio(a, b, covariance, block_count));
        }

        let optimal_level = match (num.optimal_level, den.optimal_level) {
            (Some(n), Some(d)) => Some(n.max(d)),
            _ => None,
        };

        Ok(ColumnReblock {
            levels,
            optimal_level,
        })
    }

    fn summarize(
        &self,
        table: &ReblockTable,
        observables: &[Observable],
    ) -> (EstimateTable, Vec<Observable>) {
        let mut accepted = EstimateTable::new();
        let mut rejected = Vec::new();
        for &observable in observables {
            match table.column(observable).and_then(ColumnReblock::optimal) {
                Some((level, stats)) => {
                    accepted.push(Estimate::from_stats(observable, stats, Some(level)))
                }
                None => rejected.push(observable),
            }
        }
        (accepted, rejected)
    }

    fn inefficiency(
        &self,
        accepted: &EstimateTable,
        tau: f64,
        iteration_span: f64,
    ) -> Option<Estimate> {
        let shift = accepted.get(Observable::Shift)?;
        if !(iteration_span > 0.0 && tau > 0.0) {
            return None;
        }
        let scale = (iteration_span * tau).sqrt();
        let standard_error = shift.standard_error_error * scale;
        Some(Estimate {
            observable: Observable::Inefficiency,
            mean: shift.standard_error * scale,
            standard_error,
            standard_error_error: standard_error * shift.fractional_error(),
            block_level: shift.block_level,
            display: None,
        })
    }
}
