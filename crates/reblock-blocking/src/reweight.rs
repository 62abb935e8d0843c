//! Population-control bias reweighting (Umrigar et al., J. Chem. Phys. 99, 2865 (1993))
//!
//! Each report loop `i` gets the weight `W_i = prod_{j=max(0,i-h)}^{i-1} f_j`
//! over the previous `h` loops, with `f_j = exp(-tau * ncycles * (S_j - S_ref))`
//! or, for the arithmetic variant, the linearised `1 - tau * ncycles * (S_j - S_ref)`.

use reblock_core::{Error, Observable, QmcParameters, Result, ReweightOptions, Reweighter, TimeSeries};

/// Standard population-control reweighting on the shift column
#[derive(Debug, Clone, Copy, Default)]
pub struct PopulationReweighter;

impl PopulationReweighter {
    pub fn new() -> Self {
        Self
    }
}

/// Weights for every row of `shift`
pub fn population_weights(
    shift: &[f64],
    qmc: &QmcParameters,
    options: &ReweightOptions,
) -> Vec<f64> {
    let dt = qmc.tau * qmc.ncycles as f64;
    let factors: Vec<f64> = shift
        .iter()
        .map(|s| {
            let x = dt * (s - options.mean_shift);
            if options.arith_mean {
                1.0 - x
            } else {
                (-x).exp()
            }
        })
        .collect();

    (0..factors.len())
        .map(|i| {
            let start = i.saturating_sub(options.history);
            factors[start..i].iter().product()
        })
        .collect()
}

impl Reweighter for PopulationReweighter {
    fn reweight(
        &self,
        series: &TimeSeries,
        qmc: &QmcParameters,
        options: &ReweightOptions,
    ) -> Result<TimeSeries> {
        if !(qmc.tau > 0.0) || qmc.ncycles == 0 {
            return Err(Error::InvalidInput(format!(
                "reweighting needs a positive time step and cycle count, got tau = {}, ncycles = {}",
                qmc.tau, qmc.ncycles
            )));
        }
        let weights = population_weights(series.shift(), qmc, options);
        series.clone().with_column(Observable::Weight, weights)
    }
}
