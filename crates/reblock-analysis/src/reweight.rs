//! Weighted estimator columns for population-control bias correction

use reblock_core::{CalculationRecord, Observable, Result, ReweightOptions, Reweighter};

/// Add the weighted numerator and reference population columns to a record
///
/// With `options.history == 0` the record is returned unchanged. Otherwise the
/// reweighting collaborator supplies the weight column and the projected
/// energy accumulators are multiplied by it. The input series is never
/// modified; the returned record owns a new one.
pub fn apply_reweighting<W: Reweighter + ?Sized>(
    record: CalculationRecord,
    options: &ReweightOptions,
    reweighter: &W,
) -> Result<CalculationRecord> {
    if !options.is_enabled() {
        return Ok(record);
    }

    let run = record.label();
    let weighted = reweighter.reweight(&record.series, &record.metadata.qmc, options)?;
    let weights = weighted.require(Observable::Weight, &run)?;

    let numerator = scale(weighted.require(Observable::ProjectedNumerator, &run)?, weights);
    let reference = scale(weighted.require(Observable::ReferencePopulation, &run)?, weights);

    tracing::debug!(run = %run, history = options.history, "added reweighted columns");
    let series = weighted
        .with_column(Observable::WeightedProjectedNumerator, numerator)?
        .with_column(Observable::WeightedReferencePopulation, reference)?;

    Ok(CalculationRecord::new(record.metadata, series))
}

fn scale(values: &[f64], weights: &[f64]) -> Vec<f64> {
    values.iter().zip(weights).map(|(v, w)| v * w).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reblock_blocking::PopulationReweighter;
    use reblock_core::{CalcType, Metadata, QmcParameters, TimeSeries};
    use std::sync::Arc;

    fn record() -> CalculationRecord {
        let series = TimeSeries::new(
            vec![1, 2, 3, 4],
            vec![0.0, 0.5, -0.5, 0.2],
            vec![2.0, 2.0, 2.0, 2.0],
            vec![-1.0, -1.0, -1.0, -1.0],
        )
        .unwrap();
        let md = Metadata::new(CalcType::Fciqmc).with_qmc(QmcParameters { tau: 0.1, ncycles: 1 });
        CalculationRecord::new(md, series)
    }

    #[test]
    fn test_disabled_returns_same_series() {
        let original = record();
        let out = apply_reweighting(original.clone(), &ReweightOptions::default(), &PopulationReweighter)
            .unwrap();
        assert!(Arc::ptr_eq(&original.series, &out.series));
    }

    #[test]
    fn test_weighted_columns_are_products() {
        let original = record();
        let options = ReweightOptions {
            history: 2,
            ..Default::default()
        };
        let out = apply_reweighting(original.clone(), &options, &PopulationReweighter).unwrap();

        let w = out.series.column(Observable::Weight).unwrap();
        let wn = out.series.column(Observable::WeightedProjectedNumerator).unwrap();
        let wr = out.series.column(Observable::WeightedReferencePopulation).unwrap();
        for i in 0..4 {
            approx::assert_relative_eq!(wn[i], -w[i]);
            approx::assert_relative_eq!(wr[i], 2.0 * w[i]);
        }
        assert!(!original.series.has_column(Observable::Weight));
    }
}
