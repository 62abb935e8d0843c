//! Flyvbjerg-Petersen blocking transform
//!
//! Each level halves the data by averaging neighbouring pairs (a trailing
//! odd sample is dropped). The standard error of correlated data grows with
//! the level until blocks are longer than the autocorrelation time, where it
//! plateaus. The optimal level follows Wolff/Lee: the smallest `B = 2^k` with
//! `B^3 > 2 N (se_k / se_0)^4`.

use reblock_core::{
    BlockStats, ColumnReblock, CovarianceMatrix, CovarianceTable, Error, Observable,
    ReblockTable, Reducer, Reduction, Result,
};
use statrs::statistics::Statistics;

/// Standard blocking reduction
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingReducer;

impl BlockingReducer {
    pub fn new() -> Self {
        Self
    }
}

/// Average neighbouring pairs, dropping a trailing odd sample
pub fn coarsen(data: &[f64]) -> Vec<f64> {
    data.chunks_exact(2).map(|pair| 0.5 * (pair[0] + pair[1])).collect()
}

/// Mean and errors of one set of block averages
pub fn block_stats(blocks: &[f64]) -> BlockStats {
    let n = blocks.len() as f64;
    let mean = blocks.mean();
    let standard_error = (blocks.variance() / n).sqrt();
    BlockStats {
        mean,
        standard_error,
        standard_error_error: standard_error / (2.0 * (n - 1.0)).sqrt(),
    }
}

/// Smallest level satisfying the Wolff/Lee plateau criterion
pub fn find_optimal_level(sample_count: usize, levels: &[BlockStats]) -> Option<usize> {
    let se0 = levels.first()?.standard_error;
    levels.iter().enumerate().find_map(|(level, stats)| {
        let block_cubed = 2f64.powi(3 * level as i32);
        let ratio = stats.standard_error / se0;
        (block_cubed > 2.0 * sample_count as f64 * ratio.powi(4)).then_some(level)
    })
}

impl Reducer for BlockingReducer {
    fn reduce(&self, columns: &[(Observable, &[f64])]) -> Result<Reduction> {
        let sample_count = columns.first().map_or(0, |(_, values)| values.len());
        for (observable, values) in columns {
            if values.len() != sample_count {
                return Err(Error::size_mismatch(
                    sample_count,
                    values.len(),
                    observable.label(),
                ));
            }
        }

        let observables: Vec<Observable> = columns.iter().map(|(obs, _)| *obs).collect();
        let mut blocks: Vec<Vec<f64>> = columns.iter().map(|(_, values)| values.to_vec()).collect();
        let mut levels: Vec<Vec<BlockStats>> = vec![Vec::new(); columns.len()];
        let mut block_counts = Vec::new();
        let mut covariance = CovarianceTable::default();

        while blocks.first().is_some_and(|b| b.len() >= 2) {
            block_counts.push(blocks[0].len());

            let stats: Vec<BlockStats> = blocks.iter().map(|b| block_stats(b)).collect();
            let ncols = blocks.len();
            let mut values = Vec::with_capacity(ncols * ncols);
            for i in 0..ncols {
                for j in 0..ncols {
                    values.push(blocks[i].iter().covariance(blocks[j].iter()));
                }
            }
            let matrix = CovarianceMatrix::new(observables.clone(), values)
                .ok_or_else(|| Error::Computation("malformed covariance matrix".to_string()))?;
            covariance.levels.push(matrix);

            for (column_levels, s) in levels.iter_mut().zip(stats) {
                column_levels.push(s);
            }
            blocks = blocks.iter().map(|b| coarsen(b)).collect();
        }

        let mut table = ReblockTable::new(block_counts);
        for (observable, column_levels) in observables.iter().zip(levels) {
            let optimal_level = find_optimal_level(sample_count, &column_levels);
            table.insert(
                *observable,
                ColumnReblock {
                    levels: column_levels,
                    optimal_level,
                },
            );
        }

        tracing::trace!(
            sample_count,
            levels = table.num_levels(),
            "reblocked {} columns",
            observables.len()
        );

        Ok(Reduction {
            sample_count,
            table,
            covariance,
        })
    }

    fn optimal_block(&self, table: &ReblockTable, observables: &[Observable]) -> Option<usize> {
        observables.iter().try_fold(0usize, |best, obs| {
            let level = table.column(*obs)?.optimal_level?;
            Some(best.max(level))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_coarsen_drops_trailing_sample() {
        assert_eq!(coarsen(&[1.0, 3.0, 5.0, 7.0, 9.0]), vec![2.0, 6.0]);
        assert!(coarsen(&[1.0]).is_empty());
    }

    #[test]
    fn test_level_zero_matches_plain_statistics() {
        let data: Vec<f64> = (0..16).map(|i| (i as f64).sin()).collect();
        let reduction = BlockingReducer
            .reduce(&[(Observable::Shift, data.as_slice())])
            .unwrap();
        assert_eq!(reduction.sample_count, 16);
        assert_eq!(reduction.table.block_counts, vec![16, 8, 4, 2]);

        let column = reduction.table.column(Observable::Shift).unwrap();
        let mean = data.iter().sum::<f64>() / 16.0;
        let var = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 15.0;
        assert_relative_eq!(column.levels[0].mean, mean, epsilon = 1e-12);
        assert_relative_eq!(column.levels[0].standard_error, (var / 16.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(
            column.levels[0].standard_error_error,
            column.levels[0].standard_error / 30f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_covariance_diagonal_is_variance() {
        let a: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let b: Vec<f64> = a.iter().map(|x| 2.0 * x).collect();
        let reduction = BlockingReducer
            .reduce(&[
                (Observable::ProjectedNumerator, a.as_slice()),
                (Observable::ReferencePopulation, b.as_slice()),
            ])
            .unwrap();
        let var_a = reduction
            .covariance
            .get(0, Observable::ProjectedNumerator, Observable::ProjectedNumerator)
            .unwrap();
        let cov_ab = reduction
            .covariance
            .get(0, Observable::ProjectedNumerator, Observable::ReferencePopulation)
            .unwrap();
        assert_relative_eq!(var_a, 6.0, epsilon = 1e-12);
        assert_relative_eq!(cov_ab, 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_covariance_of_coarsened_blocks() {
        let a: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let c: Vec<f64> = a.iter().map(|x| -x).collect();
        let reduction = BlockingReducer
            .reduce(&[
                (Observable::Shift, a.as_slice()),
                (Observable::ReferencePopulation, c.as_slice()),
            ])
            .unwrap();
        // level 1 blocks are 0.5, 2.5, 4.5, 6.5
        let cov = reduction
            .covariance
            .get(1, Observable::Shift, Observable::ReferencePopulation)
            .unwrap();
        assert_relative_eq!(cov, -20.0 / 3.0, epsilon = 1e-12);
        let symmetric = reduction
            .covariance
            .get(1, Observable::ReferencePopulation, Observable::Shift)
            .unwrap();
        assert_relative_eq!(symmetric, cov, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_column_has_no_optimal_level() {
        let data = vec![1.5; 64];
        let reduction = BlockingReducer
            .reduce(&[(Observable::Shift, data.as_slice())])
            .unwrap();
        assert_eq!(reduction.table.column(Observable::Shift).unwrap().optimal_level, None);
        assert_eq!(BlockingReducer.optimal_block(&reduction.table, &[Observable::Shift]), None);
    }

    #[test]
    fn test_too_short_input_has_no_levels() {
        let data = [1.0];
        let reduction = BlockingReducer
            .reduce(&[(Observable::Shift, data.as_slice())])
            .unwrap();
        assert_eq!(reduction.table.num_levels(), 0);
        let column = reduction.table.column(Observable::Shift).unwrap();
        assert!(column.levels.is_empty());
        assert_eq!(column.optimal_level, None);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 2.0];
        let err = BlockingReducer.reduce(&[
            (Observable::Shift, a.as_slice()),
            (Observable::ReferencePopulation, b.as_slice()),
        ]);
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_optimal_level_criterion() {
        let flat = |se: f64| BlockStats {
            mean: 0.0,
            standard_error: se,
            standard_error_error: 0.0,
        };
        // 2^(3k) > 2 * 1000 * 1 first holds at k = 4 (4096)
        let levels = vec![flat(1.0); 6];
        assert_eq!(find_optimal_level(1000, &levels), Some(4));

        // A growing error pushes the plateau later
        let levels: Vec<BlockStats> = (0..12).map(|k| flat(1.0 + k as f64)).collect();
        assert_eq!(find_optimal_level(1000, &levels), Some(8));
        assert_eq!(find_optimal_level(1000, &[]), None);
    }
}
