//! Reblocking tables, covariance tables and summary estimates

use crate::types::Observable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Statistics of one column at one blocking level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockStats {
    pub mean: f64,
    pub standard_error: f64,
    pub standard_error_error: f64,
}

/// Statistics of one column across all blocking levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnReblock {
    /// Level `k` averages blocks of `2^k` consecutive samples
    pub levels: Vec<BlockStats>,
    /// Smallest level at which the error estimate has plateaued
    pub optimal_level: Option<usize>,
}

impl ColumnReblock {
    pub fn optimal(&self) -> Option<(usize, &BlockStats)> {
        let level = self.optimal_level?;
        self.levels.get(level).map(|stats| (level, stats))
    }
}

/// Result of the blocking transform for every reduced column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReblockTable {
    /// Number of blocks at each level
    pub block_counts: Vec<usize>,
    columns: BTreeMap<Observable, ColumnReblock>,
}

impl ReblockTable {
    pub fn new(block_counts: Vec<usize>) -> Self {
        Self {
            block_counts,
            columns: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, observable: Observable, column: ColumnReblock) {
        self.columns.insert(observable, column);
    }

    pub fn column(&self, observable: Observable) -> Option<&ColumnReblock> {
        self.columns.get(&observable)
    }

    pub fn observables(&self) -> impl Iterator<Item = Observable> + '_ {
        self.columns.keys().copied()
    }

    pub fn num_levels(&self) -> usize {
        self.block_counts.len()
    }
}

/// Covariance of block means between columns at one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceMatrix {
    observables: Vec<Observable>,
    values: Vec<f64>,
}

impl CovarianceMatrix {
    /// `values` is row-major, `observables.len()` squared entries
    pub fn new(observables: Vec<Observable>, values: Vec<f64>) -> Option<Self> {
        (values.len() == observables.len() * observables.len()).then_some(Self {
            observables,
            values,
        })
    }

    pub fn get(&self, a: Observable, b: Observable) -> Option<f64> {
        let n = self.observables.len();
        let i = self.observables.iter().position(|&o| o == a)?;
        let j = self.observables.iter().position(|&o| o == b)?;
        self.values.get(i * n + j).copied()
    }
}

/// Covariance matrices for every blocking level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CovarianceTable {
    pub levels: Vec<CovarianceMatrix>,
}

impl CovarianceTable {
    pub fn get(&self, level: usize, a: Observable, b: Observable) -> Option<f64> {
        self.levels.get(level)?.get(a, b)
    }
}

/// Output of the correlated-error reduction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reduction {
    /// Number of samples entering the reduction
    pub sample_count: usize,
    pub table: ReblockTable,
    pub covariance: CovarianceTable,
}

/// One summarized estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub observable: Observable,
    pub mean: f64,
    pub standard_error: f64,
    pub standard_error_error: f64,
    /// Blocking level the estimate was taken from
    pub block_level: Option<usize>,
    /// Display string such as `-1.0342(45)`
    pub display: Option<String>,
}

impl Estimate {
    pub fn from_stats(observable: Observable, stats: &BlockStats, block_level: Option<usize>) -> Self {
        Self {
            observable,
            mean: stats.mean,
            standard_error: stats.standard_error,
            standard_error_error: stats.standard_error_error,
            block_level,
            display: None,
        }
    }

    /// Standard error of the standard error relative to the standard error
    pub fn fractional_error(&self) -> f64 {
        self.standard_error_error / self.standard_error
    }
}

/// Accepted estimates, one row per column, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimateTable {
    rows: Vec<Estimate>,
}

impl EstimateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, estimate: Estimate) {
        self.rows.push(estimate);
    }

    pub fn get(&self, observable: Observable) -> Option<&Estimate> {
        self.rows.iter().find(|row| row.observable == observable)
    }

    pub fn rows(&self) -> &[Estimate] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Estimate> {
        self.rows.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<Estimate> for EstimateTable {
    fn from_iter<I: IntoIterator<Item = Estimate>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
