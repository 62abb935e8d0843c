//! Collaborator traits
//!
//! The analysis layers decide *when* and *on what* to run the blocking
//! transform; these traits are the seams to the code that does the
//! transform, derives estimators, formats them, and reads input.
//! `reblock-blocking` ships the standard implementations.

use crate::error::Result;
use crate::series::{CalculationRecord, TimeSeries};
use crate::tables::{ColumnReblock, Estimate, EstimateTable, ReblockTable, Reduction};
use crate::types::{Observable, QmcParameters};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Correlated-error ("blocking") reduction
pub trait Reducer: Send + Sync {
    /// Reblock the given equal-length columns
    fn reduce(&self, columns: &[(Observable, &[f64])]) -> Result<Reduction>;

    /// Optimal blocking level covering all `observables`, if every one has one
    fn optimal_block(&self, table: &ReblockTable, observables: &[Observable]) -> Option<usize>;
}

/// Estimators derived from a reduction
pub trait EstimatorSuite: Send + Sync {
    /// Ratio estimator `numerator / denominator` at every blocking level
    fn projected_energy(
        &self,
        reduction: &Reduction,
        numerator: Observable,
        denominator: Observable,
    ) -> Result<ColumnReblock>;

    /// Split columns into accepted estimates and columns with no reliable
    /// blocking level
    fn summarize(
        &self,
        table: &ReblockTable,
        observables: &[Observable],
    ) -> (EstimateTable, Vec<Observable>);

    /// Inefficiency of the calculation, if it can be computed
    fn inefficiency(
        &self,
        accepted: &EstimateTable,
        tau: f64,
        iteration_span: f64,
    ) -> Option<Estimate>;
}

/// Display formatting of a (mean, standard error) pair
pub trait EstimateFormatter: Send + Sync {
    fn format_estimate(&self, mean: f64, standard_error: f64) -> String;
}

/// Population-control reweighting options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReweightOptions {
    /// Number of past report loops entering each weight; 0 disables
    pub history: usize,
    /// Reference shift keeping the weights bounded
    pub mean_shift: f64,
    /// Use the linearised (arithmetic) weight factor
    pub arith_mean: bool,
}

impl Default for ReweightOptions {
    fn default() -> Self {
        Self {
            history: 0,
            mean_shift: 0.0,
            arith_mean: false,
        }
    }
}

impl ReweightOptions {
    pub fn is_enabled(&self) -> bool {
        self.history > 0
    }
}

/// Population-control bias reweighting
pub trait Reweighter: Send + Sync {
    /// Return a copy of `series` with an [`Observable::Weight`] column
    fn reweight(
        &self,
        series: &TimeSeries,
        qmc: &QmcParameters,
        options: &ReweightOptions,
    ) -> Result<TimeSeries>;
}

/// Reads calculations from files
pub trait Extractor {
    fn extract(&self, paths: &[PathBuf]) -> Result<Vec<CalculationRecord>>;
}

impl<T: Reducer + ?Sized> Reducer for &T {
    fn reduce(&self, columns: &[(Observable, &[f64])]) -> Result<Reduction> {
        (**self).reduce(columns)
    }

    fn optimal_block(&self, table: &ReblockTable, observables: &[Observable]) -> Option<usize> {
        (**self).optimal_block(table, observables)
    }
}

impl<T: EstimatorSuite + ?Sized> EstimatorSuite for &T {
    fn projected_energy(
        &self,
        reduction: &Reduction,
        numerator: Observable,
        denominator: Observable,
    ) -> Result<ColumnReblock> {
        (**self).projected_energy(reduction, numerator, denominator)
    }

    fn summarize(
        &self,
        table: &ReblockTable,
        observables: &[Observable],
    ) -> (EstimateTable, Vec<Observable>) {
        (**self).summarize(table, observables)
    }

    fn inefficiency(
        &self,
        accepted: &EstimateTable,
        tau: f64,
        iteration_span: f64,
    ) -> Option<Estimate> {
        (**self).inefficiency(accepted, tau, iteration_span)
    }
}

impl<T: EstimateFormatter + ?Sized> EstimateFormatter for &T {
    fn format_estimate(&self, mean: f64, standard_error: f64) -> String {
        (**self).format_estimate(mean, standard_error)
    }
}
