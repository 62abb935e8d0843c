//! Per-iteration QMC time series and calculation records

use crate::error::{Error, Result};
use crate::types::{Metadata, Observable};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Columns every zero-temperature QMC series carries
pub const REQUIRED_COLUMNS: [Observable; 3] = [
    Observable::Shift,
    Observable::ReferencePopulation,
    Observable::ProjectedNumerator,
];

/// Ordered rows of one calculation, one row per reported iteration
///
/// Iteration numbers are strictly increasing and act as the join key when
/// restarted segments are stitched together.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    iterations: Vec<i64>,
    columns: BTreeMap<Observable, Vec<f64>>,
}

impl TimeSeries {
    /// Create a series from the three required columns
    pub fn new(
        iterations: Vec<i64>,
        shift: Vec<f64>,
        reference: Vec<f64>,
        numerator: Vec<f64>,
    ) -> Result<Self> {
        Self::from_columns(
            iterations,
            [
                (Observable::Shift, shift),
                (Observable::ReferencePopulation, reference),
                (Observable::ProjectedNumerator, numerator),
            ],
        )
    }

    /// Create a series from arbitrary named columns
    pub fn from_columns<I>(iterations: Vec<i64>, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Observable, Vec<f64>)>,
    {
        if let Some(pos) = iterations.windows(2).position(|w| w[1] <= w[0]) {
            return Err(Error::InvalidInput(format!(
                "iteration numbers must be strictly increasing: {} follows {} at row {}",
                iterations[pos + 1],
                iterations[pos],
                pos + 1
            )));
        }

        let mut map = BTreeMap::new();
        for (observable, values) in columns {
            if values.len() != iterations.len() {
                return Err(Error::size_mismatch(
                    iterations.len(),
                    values.len(),
                    observable.label(),
                ));
            }
            map.insert(observable, values);
        }

        for required in REQUIRED_COLUMNS {
            if !map.contains_key(&required) {
                return Err(Error::MissingColumn {
                    run: "time series".to_string(),
                    column: required.label().to_string(),
                });
            }
        }

        Ok(Self {
            iterations,
            columns: map,
        })
    }

    /// Add or replace a column, returning the extended series
    pub fn with_column(mut self, observable: Observable, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.len() {
            return Err(Error::size_mismatch(self.len(), values.len(), observable.label()));
        }
        self.columns.insert(observable, values);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn iterations(&self) -> &[i64] {
        &self.iterations
    }

    pub fn first_iteration(&self) -> Option<i64> {
        self.iterations.first().copied()
    }

    pub fn last_iteration(&self) -> Option<i64> {
        self.iterations.last().copied()
    }

    /// Iteration increment between the last two rows
    pub fn iteration_step(&self) -> Option<i64> {
        match self.iterations.as_slice() {
            [.., a, b] => Some(b - a),
            _ => None,
        }
    }

    pub fn column(&self, observable: Observable) -> Option<&[f64]> {
        self.columns.get(&observable).map(Vec::as_slice)
    }

    /// Column lookup that reports which run lacks it
    pub fn require(&self, observable: Observable, run: &str) -> Result<&[f64]> {
        self.column(observable).ok_or_else(|| Error::MissingColumn {
            run: run.to_string(),
            column: observable.label().to_string(),
        })
    }

    pub fn has_column(&self, observable: Observable) -> bool {
        self.columns.contains_key(&observable)
    }

    pub fn observables(&self) -> impl Iterator<Item = Observable> + '_ {
        self.columns.keys().copied()
    }

    pub fn shift(&self) -> &[f64] {
        self.column(Observable::Shift).unwrap_or(&[])
    }

    /// New series holding only the rows where `mask` is true
    pub fn select(&self, mask: &[bool]) -> Result<TimeSeries> {
        if mask.len() != self.len() {
            return Err(Error::size_mismatch(self.len(), mask.len(), "row mask"));
        }
        let pick_i64 = |values: &[i64]| {
            values
                .iter()
                .zip(mask)
                .filter_map(|(&v, &keep)| keep.then_some(v))
                .collect::<Vec<_>>()
        };
        let pick_f64 = |values: &[f64]| {
            values
                .iter()
                .zip(mask)
                .filter_map(|(&v, &keep)| keep.then_some(v))
                .collect::<Vec<_>>()
        };

        Ok(TimeSeries {
            iterations: pick_i64(&self.iterations),
            columns: self
                .columns
                .iter()
                .map(|(&obs, values)| (obs, pick_f64(values)))
                .collect(),
        })
    }

    /// Concatenate segments in order and resolve duplicate iterations
    ///
    /// Only columns present in every segment survive. Rows sharing an
    /// iteration number keep the value from the later segment.
    pub fn stitch(segments: &[&TimeSeries]) -> Result<TimeSeries> {
        let (first, rest) = segments
            .split_first()
            .ok_or_else(|| Error::empty_input("stitching"))?;

        let shared: Vec<Observable> = first
            .observables()
            .filter(|obs| rest.iter().all(|segment| segment.has_column(*obs)))
            .collect();

        let mut iterations = Vec::new();
        let mut columns: BTreeMap<Observable, Vec<f64>> =
            shared.iter().map(|&obs| (obs, Vec::new())).collect();
        for segment in segments {
            iterations.extend_from_slice(&segment.iterations);
            for (obs, values) in columns.iter_mut() {
                values.extend_from_slice(segment.column(*obs).unwrap_or(&[]));
            }
        }

        let mut last_row: HashMap<i64, usize> = HashMap::with_capacity(iterations.len());
        for (row, &iteration) in iterations.iter().enumerate() {
            last_row.insert(iteration, row);
        }
        let mut keep: Vec<usize> = (0..iterations.len())
            .filter(|row| last_row.get(&iterations[*row]) == Some(row))
            .collect();

        if keep.windows(2).any(|w| iterations[w[1]] <= iterations[w[0]]) {
            tracing::debug!("stitched segments overlap out of order; sorting by iteration");
            keep.sort_by_key(|&row| iterations[row]);
        }

        Ok(TimeSeries {
            iterations: keep.iter().map(|&row| iterations[row]).collect(),
            columns: columns
                .into_iter()
                .map(|(obs, values)| (obs, keep.iter().map(|&row| values[row]).collect()))
                .collect(),
        })
    }
}

/// One calculation: its metadata and its trajectory
///
/// The trajectory is shared, never mutated; stages that transform it build
/// a new series.
#[derive(Debug, Clone)]
pub struct CalculationRecord {
    pub metadata: Metadata,
    pub series: Arc<TimeSeries>,
}

impl CalculationRecord {
    pub fn new(metadata: Metadata, series: TimeSeries) -> Self {
        Self {
            metadata,
            series: Arc::new(series),
        }
    }

    pub fn label(&self) -> String {
        self.metadata.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(iterations: &[i64], offset: f64) -> TimeSeries {
        let values: Vec<f64> = iterations.iter().map(|&i| i as f64 + offset).collect();
        TimeSeries::new(iterations.to_vec(), values.clone(), values.clone(), values).unwrap()
    }

    #[test]
    fn test_rejects_non_increasing_iterations() {
        let err = TimeSeries::new(vec![1, 2, 2], vec![0.0; 3], vec![0.0; 3], vec![0.0; 3]);
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let err = TimeSeries::new(vec![1, 2, 3], vec![0.0; 2], vec![0.0; 3], vec![0.0; 3]);
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_missing_required_column() {
        let err = TimeSeries::from_columns(vec![1, 2], [(Observable::Shift, vec![0.0, 0.0])]);
        assert!(matches!(err, Err(Error::MissingColumn { .. })));
    }

    #[test]
    fn test_select_builds_new_series() {
        let s = series(&[10, 20, 30, 40], 0.0);
        let picked = s.select(&[false, true, false, true]).unwrap();
        assert_eq!(picked.iterations(), &[20, 40]);
        assert_eq!(picked.shift(), &[20.0, 40.0]);
        assert_eq!(s.len(), 4);
        assert!(s.select(&[true]).is_err());
    }

    #[test]
    fn test_iteration_step() {
        assert_eq!(series(&[10, 20, 35], 0.0).iteration_step(), Some(15));
        assert_eq!(series(&[10], 0.0).iteration_step(), None);
    }

    #[test]
    fn test_stitch_keeps_later_duplicates() {
        let a = series(&[1, 2, 3, 4], 0.0);
        let b = series(&[4, 5, 6], 100.0);
        let stitched = TimeSeries::stitch(&[&a, &b]).unwrap();
        assert_eq!(stitched.iterations(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(stitched.shift()[3], 104.0);
    }

    #[test]
    fn test_stitch_drops_columns_missing_from_a_segment() {
        let a = series(&[1, 2], 0.0)
            .with_column(Observable::TotalPopulation, vec![1.0, 2.0])
            .unwrap();
        let b = series(&[3, 4], 0.0);
        let stitched = TimeSeries::stitch(&[&a, &b]).unwrap();
        assert!(!stitched.has_column(Observable::TotalPopulation));
        assert!(stitched.has_column(Observable::Shift));
    }

    #[test]
    fn test_stitch_empty_is_error() {
        assert!(TimeSeries::stitch(&[]).is_err());
    }
}
