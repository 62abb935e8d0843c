//! Blocking analysis of one calculation over a chosen window
//!
//! The orchestrator decides which rows and columns go through the
//! correlated-error reduction and turns the reduction into summary
//! estimates. The reduction, estimators and formatting are collaborators.

use reblock_blocking::{BlockingReducer, PrettyFormatter, StandardEstimators};
use reblock_core::{
    CalculationRecord, CovarianceTable, Diagnostics, Error, EstimateFormatter, EstimateTable,
    EstimatorSuite, Metadata, Observable, ReblockTable, Reducer, Result, TimeSeries, Warning,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Row predicate overriding the iteration cutoff
pub type RowSelector = dyn Fn(&TimeSeries) -> Vec<bool> + Send + Sync;

/// Rows entering the analysis
#[derive(Clone, Copy)]
pub enum Window<'a> {
    /// Rows with an iteration number strictly greater than the cutoff
    After(i64),
    /// Rows for which the selector returns true
    Select(&'a RowSelector),
}

impl std::fmt::Debug for Window<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Window::After(start) => f.debug_tuple("After").field(start).finish(),
            Window::Select(_) => f.write_str("Select(..)"),
        }
    }
}

impl Window<'_> {
    fn mask(&self, series: &TimeSeries) -> Vec<bool> {
        match self {
            Window::After(start) => series.iterations().iter().map(|&it| it > *start).collect(),
            Window::Select(selector) => selector(series),
        }
    }
}

/// Options for one blocking analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockingOptions {
    /// Also reblock the total walker population
    pub extract_psips: bool,
    /// Append the inefficiency to the accepted estimates
    pub calc_inefficiency: bool,
}

/// Everything produced by one blocking analysis
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub metadata: Metadata,
    /// Full input trajectory, shared with the caller
    pub series: Arc<TimeSeries>,
    /// Number of rows that went through the reduction
    pub sample_count: usize,
    /// Reduction of every blocked column plus the projected energy estimators
    pub reblock: ReblockTable,
    pub covariance: CovarianceTable,
    /// Estimates at the optimal blocking level, with display strings
    pub accepted: EstimateTable,
    /// Columns with no reliable blocking level
    pub rejected: Vec<Observable>,
    pub diagnostics: Diagnostics,
}

impl AnalysisResult {
    /// Whether every tracked column got a reliable estimate
    pub fn is_fully_resolved(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Runs the reduction and estimator collaborators over a selected window
#[derive(Debug, Clone, Default)]
pub struct ReblockOrchestrator<R = BlockingReducer, E = StandardEstimators, F = PrettyFormatter> {
    reducer: R,
    estimators: E,
    formatter: F,
}

impl ReblockOrchestrator {
    /// Orchestrator using the standard blocking collaborators
    pub fn standard() -> Self {
        Self::default()
    }
}

impl<R, E, F> ReblockOrchestrator<R, E, F>
where
    R: Reducer,
    E: EstimatorSuite,
    F: EstimateFormatter,
{
    pub fn new(reducer: R, estimators: E, formatter: F) -> Self {
        Self {
            reducer,
            estimators,
            formatter,
        }
    }

    pub fn reducer(&self) -> &R {
        &self.reducer
    }

    /// Blocking analysis of `record` over `window`
    pub fn analyse(
        &self,
        record: &CalculationRecord,
        window: Window<'_>,
        options: BlockingOptions,
    ) -> Result<AnalysisResult> {
        let series = &record.series;
        let run = record.label();
        let mut diagnostics = Diagnostics::new();

        let mask = window.mask(series);
        let selected = series.select(&mask)?;
        if selected.is_empty() {
            return Err(Error::InsufficientData {
                expected: 1,
                actual: 0,
            });
        }

        let reweighted = series.has_column(Observable::WeightedReferencePopulation);
        let mut to_block = Vec::with_capacity(6);
        if options.extract_psips {
            to_block.push(Observable::TotalPopulation);
        }
        to_block.extend([
            Observable::ProjectedNumerator,
            Observable::ReferencePopulation,
            Observable::Shift,
        ]);
        if reweighted {
            to_block.extend([
                Observable::WeightedProjectedNumerator,
                Observable::WeightedReferencePopulation,
            ]);
        }

        if let Some(shift) = constant_shift_at_cutoff(series, &selected, &mask) {
            diagnostics.warn(Warning::CutoffBeforeShiftVariation {
                run: run.clone(),
                shift,
            });
        }

        let columns = to_block
            .iter()
            .map(|&obs| selected.require(obs, &run).map(|values| (obs, values)))
            .collect::<Result<Vec<_>>>()?;
        let reduction = self.reducer.reduce(&columns)?;

        let mut reblock = reduction.table.clone();
        let energy = self.estimators.projected_energy(
            &reduction,
            Observable::ProjectedNumerator,
            Observable::ReferencePopulation,
        )?;
        reblock.insert(Observable::ProjectedEnergy, energy);
        to_block.push(Observable::ProjectedEnergy);

        if reweighted {
            let weighted = self.estimators.projected_energy(
                &reduction,
                Observable::WeightedProjectedNumerator,
                Observable::WeightedReferencePopulation,
            )?;
            reblock.insert(Observable::WeightedProjectedEnergy, weighted);
            to_block.push(Observable::WeightedProjectedEnergy);
        }

        let (mut accepted, rejected) = self.estimators.summarize(&reblock, &to_block);

        if options.calc_inefficiency {
            let its = selected.iterations();
            let span = match (its.first(), its.last()) {
                (Some(first), Some(last)) => (last - first) as f64,
                _ => 0.0,
            };
            if let Some(estimate) =
                self.estimators
                    .inefficiency(&accepted, record.metadata.qmc.tau, span)
            {
                accepted.push(estimate);
            }
        }

        for estimate in accepted.rows_mut() {
            estimate.display = Some(
                self.formatter
                    .format_estimate(estimate.mean, estimate.standard_error),
            );
        }

        tracing::debug!(
            run = %run,
            window = ?window,
            samples = reduction.sample_count,
            accepted = accepted.len(),
            rejected = rejected.len(),
            "reblocked calculation"
        );

        Ok(AnalysisResult {
            metadata: record.metadata.clone(),
            series: Arc::clone(series),
            sample_count: reduction.sample_count,
            reblock,
            covariance: reduction.covariance,
            accepted,
            rejected,
            diagnostics,
        })
    }
}

/// Shift value if the window opens on the constant-shift phase
///
/// True when the first two selected rows share the shift value of the last
/// row left out of the window.
fn constant_shift_at_cutoff(series: &TimeSeries, selected: &TimeSeries, mask: &[bool]) -> Option<f64> {
    let shift = selected.shift();
    let (first, second) = (*shift.first()?, *shift.get(1)?);
    let last_excluded = series
        .shift()
        .iter()
        .zip(mask)
        .filter_map(|(&s, &keep)| (!keep).then_some(s))
        .last()?;
    (first == second && second == last_excluded).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reblock_core::CalcType;

    fn ramp(n: i64) -> CalculationRecord {
        let its: Vec<i64> = (1..=n).collect();
        let shift: Vec<f64> = its.iter().map(|&i| if i <= 10 { 0.0 } else { (i % 7) as f64 }).collect();
        let reference: Vec<f64> = its.iter().map(|&i| 10.0 + (i % 5) as f64).collect();
        let numerator: Vec<f64> = its.iter().map(|&i| -5.0 - (i % 3) as f64).collect();
        let series = TimeSeries::new(its, shift, reference, numerator).unwrap();
        CalculationRecord::new(Metadata::new(CalcType::Fciqmc).with_uuid("ramp"), series)
    }

    #[test]
    fn test_empty_window_is_error() {
        let record = ramp(50);
        let err = ReblockOrchestrator::standard()
            .analyse(&record, Window::After(50), BlockingOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientData { actual: 0, .. }));
    }

    #[test]
    fn test_constant_shift_detection() {
        let record = ramp(50);
        let before = Window::After(5);
        let mask = before.mask(&record.series);
        let selected = record.series.select(&mask).unwrap();
        assert_eq!(constant_shift_at_cutoff(&record.series, &selected, &mask), Some(0.0));

        let after = Window::After(20);
        let mask = after.mask(&record.series);
        let selected = record.series.select(&mask).unwrap();
        assert_eq!(constant_shift_at_cutoff(&record.series, &selected, &mask), None);

        // Nothing excluded, nothing to compare against
        let all = Window::After(0);
        let mask = all.mask(&record.series);
        let selected = record.series.select(&mask).unwrap();
        assert_eq!(constant_shift_at_cutoff(&record.series, &selected, &mask), None);
    }

    #[test]
    fn test_missing_psips_column() {
        let record = ramp(50);
        let options = BlockingOptions {
            extract_psips: true,
            ..Default::default()
        };
        let err = ReblockOrchestrator::standard()
            .analyse(&record, Window::After(0), options)
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
    }

    #[test]
    fn test_projected_energy_is_tracked() {
        let record = ramp(512);
        let result = ReblockOrchestrator::standard()
            .analyse(&record, Window::After(20), BlockingOptions::default())
            .unwrap();
        assert_eq!(result.sample_count, 492);
        assert!(result.reblock.column(Observable::ProjectedEnergy).is_some());
        assert!(result.reblock.column(Observable::WeightedProjectedEnergy).is_none());
        assert_eq!(result.accepted.len() + result.rejected.len(), 4);
        assert!(Arc::ptr_eq(&result.series, &record.series));
        for estimate in result.accepted.rows() {
            assert!(estimate.display.is_some());
        }
    }
}
