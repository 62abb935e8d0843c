//! Starting-iteration search over candidate cutoffs
//!
//! Candidate cutoffs are spaced evenly from the first iteration at which the
//! shift varies to the end of the series. Each candidate is reblocked and
//! scored by the weighted fractional error of the tracked columns:
//!
//! ```text
//! (standard error of the standard error / standard error) / sqrt(rows remaining)
//! ```
//!
//! The sweep accepts the best candidate once it lies early enough among the
//! candidates evaluated, then discards a margin of whole autocorrelation
//! blocks beyond it.

use crate::params::{SearchParameters, Validated};
use crate::sweep::{FractionalErrors, SweepState, SweepTracker, TRACKED};
use crate::visualization::{NullSearchVisualizer, SearchVisualizer};
use reblock_analysis::{BlockingOptions, ReblockOrchestrator, Window};
use reblock_blocking::{BlockingReducer, PrettyFormatter, StandardEstimators};
use reblock_core::{
    CalculationRecord, Diagnostics, Error, EstimateFormatter, EstimatorSuite, Reducer, Result,
    Warning,
};
use serde::{Deserialize, Serialize};

/// Outcome of a successful search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingIteration {
    /// Iteration after which data should be reblocked
    pub iteration: i64,
    /// Cutoff of the accepted candidate, before the safety margin
    pub minimum_iteration: i64,
    /// Global index of the accepted candidate
    pub candidate: usize,
    /// Optimal block exponent of the tracked columns at the accepted candidate
    pub block_exponent: usize,
    pub candidates_evaluated: usize,
    pub warnings: Diagnostics,
}

/// Geometry of the candidate grid for one trajectory
#[derive(Debug, Clone, Copy)]
struct Grid {
    /// Row at which the shift first differs from its initial value
    variation_row: usize,
    variation_iteration: i64,
    last_row: usize,
    last_iteration: i64,
    /// Iterations between candidates
    step: i64,
    /// Rows between candidates
    row_step: usize,
}

impl Grid {
    fn cutoff(&self, candidate: usize) -> i64 {
        self.variation_iteration + candidate as i64 * self.step
    }

    fn remaining_rows(&self, candidate: usize) -> usize {
        (self.last_row + 1)
            .saturating_sub(self.variation_row)
            .saturating_sub(candidate * self.row_step)
    }
}

#[derive(Debug, Clone, Copy)]
struct Scored {
    candidate: usize,
    errors: Option<FractionalErrors>,
    block_exponent: Option<usize>,
}

/// Automatic choice of the equilibrated window of a calculation
#[derive(Debug, Clone)]
pub struct BlockWindowSearch<
    R = BlockingReducer,
    E = StandardEstimators,
    F = PrettyFormatter,
    V = NullSearchVisualizer,
> {
    orchestrator: ReblockOrchestrator<R, E, F>,
    parameters: SearchParameters,
    visualizer: V,
}

impl BlockWindowSearch {
    /// Search with the standard blocking collaborators and no visualization
    pub fn new(parameters: SearchParameters) -> Self {
        Self {
            orchestrator: ReblockOrchestrator::standard(),
            parameters,
            visualizer: NullSearchVisualizer,
        }
    }
}

impl<R, E, F, V> BlockWindowSearch<R, E, F, V>
where
    R: Reducer,
    E: EstimatorSuite,
    F: EstimateFormatter,
    V: SearchVisualizer,
{
    pub fn with_orchestrator(
        orchestrator: ReblockOrchestrator<R, E, F>,
        parameters: SearchParameters,
        visualizer: V,
    ) -> Self {
        Self {
            orchestrator,
            parameters,
            visualizer,
        }
    }

    /// Replace the visualizer
    pub fn with_visualizer<V2: SearchVisualizer>(self, visualizer: V2) -> BlockWindowSearch<R, E, F, V2> {
        BlockWindowSearch {
            orchestrator: self.orchestrator,
            parameters: self.parameters,
            visualizer,
        }
    }

    pub fn parameters(&self) -> &SearchParameters {
        &self.parameters
    }

    pub fn orchestrator(&self) -> &ReblockOrchestrator<R, E, F> {
        &self.orchestrator
    }

    /// Find the iteration from which `record` can be reblocked
    pub fn find_starting_iteration(&self, record: &CalculationRecord) -> Result<StartingIteration> {
        self.find_starting_iteration_with(record, &mut Diagnostics::new())
    }

    /// As [`find_starting_iteration`](Self::find_starting_iteration), also
    /// appending warnings to `warnings`
    ///
    /// Warnings raised before a failure stay in `warnings`.
    pub fn find_starting_iteration_with(
        &self,
        record: &CalculationRecord,
        warnings: &mut Diagnostics,
    ) -> Result<StartingIteration> {
        let params = self.parameters.checked()?;
        let run = record.label();
        let series = &record.series;
        let mut raised = Diagnostics::new();

        let shift = series.shift();
        let variation_row = shift
            .first()
            .and_then(|&initial| shift.iter().position(|&s| s != initial))
            .ok_or_else(|| Error::EquilibrationSignal { run: run.clone() })?;

        let its = series.iterations();
        let last_row = its.len() - 1;
        let rows = its.len() - variation_row;
        if rows < params.frac_screen_interval {
            let warning = Warning::InsufficientResolution {
                run: run.clone(),
                rows,
                frac_screen_interval: params.frac_screen_interval,
            };
            raised.warn(warning.clone());
            warnings.push(warning);
        }

        let grid = Grid {
            variation_row,
            variation_iteration: its[variation_row],
            last_row,
            last_iteration: its[last_row],
            step: (its[last_row] - its[variation_row]) / params.frac_screen_interval as i64,
            row_step: (last_row - variation_row) / params.frac_screen_interval,
        };
        tracing::debug!(
            run = %run,
            variation_iteration = grid.variation_iteration,
            step = grid.step,
            row_step = grid.row_step,
            "searching for starting iteration"
        );

        let mut tracker =
            SweepTracker::new(params.rounds(), params.number_of_reblockings, params.pos_min_frac);
        while let SweepState::Sweeping { .. } = tracker.state() {
            for scored in self.evaluate_round(record, &grid, tracker.round_candidates())? {
                if let Err(err) =
                    self.visualizer
                        .record_candidate(scored.candidate, grid.cutoff(scored.candidate), scored.errors.as_ref())
                {
                    tracing::warn!("search visualizer failed: {err}");
                }
                tracker.observe(scored.candidate, scored.errors, scored.block_exponent);
            }
            tracker.finish_round();
        }

        let best = match (tracker.state(), tracker.best()) {
            (SweepState::Accepted { .. }, Some(best)) => *best,
            _ => {
                return Err(Error::ConvergenceSearch {
                    run,
                    evaluated: tracker.evaluated(),
                })
            }
        };
        let block_exponent = best.block_exponent.ok_or_else(|| {
            Error::Computation(format!(
                "no optimal block length for accepted candidate {} of {run}",
                best.candidate
            ))
        })?;

        let outcome = self.apply_margin(&run, record, &grid, &params, best.candidate, block_exponent)?;
        let outcome = StartingIteration {
            candidates_evaluated: tracker.evaluated(),
            warnings: raised,
            ..outcome
        };

        tracing::info!(
            run = %run,
            starting_iteration = outcome.iteration,
            minimum_iteration = outcome.minimum_iteration,
            candidate = outcome.candidate,
            block_exponent,
            "found starting iteration"
        );

        if self.visualizer.is_enabled() {
            if let Err(err) = self.visualizer.record_outcome(series, &outcome) {
                tracing::warn!("search visualizer failed: {err}");
            }
        }

        Ok(outcome)
    }

    /// Discard whole autocorrelation blocks beyond the accepted candidate
    fn apply_margin(
        &self,
        run: &str,
        record: &CalculationRecord,
        grid: &Grid,
        params: &Validated,
        candidate: usize,
        block_exponent: usize,
    ) -> Result<StartingIteration> {
        let its = record.series.iterations();
        let offset = candidate as i64 * grid.step;
        let discard = 1usize
            .checked_shl(block_exponent as u32)
            .unwrap_or(usize::MAX)
            .saturating_mul(params.reblocks_to_cut_off);
        let margin_row = grid.variation_row.saturating_add(discard);

        let iteration = match its.get(margin_row) {
            Some(&it) => it + offset,
            None => {
                let spacing = record.series.iteration_step().unwrap_or(1);
                return Err(Error::OverCut {
                    run: run.to_string(),
                    starting_iteration: grid
                        .variation_iteration
                        .saturating_add((discard as i64).saturating_mul(spacing))
                        .saturating_add(offset),
                    last_iteration: grid.last_iteration,
                    reblocks_to_cut_off: params.reblocks_to_cut_off,
                });
            }
        };
        if grid.last_iteration <= iteration {
            return Err(Error::OverCut {
                run: run.to_string(),
                starting_iteration: iteration,
                last_iteration: grid.last_iteration,
                reblocks_to_cut_off: params.reblocks_to_cut_off,
            });
        }

        Ok(StartingIteration {
            iteration,
            minimum_iteration: grid.variation_iteration + offset,
            candidate,
            block_exponent,
            candidates_evaluated: 0,
            warnings: Diagnostics::new(),
        })
    }

    /// Score the candidates of one round, in candidate order
    fn evaluate_round(
        &self,
        record: &CalculationRecord,
        grid: &Grid,
        candidates: std::ops::Range<usize>,
    ) -> Result<Vec<Scored>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            candidates
                .into_par_iter()
                .map(|candidate| self.evaluate(record, grid, candidate))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            candidates
                .map(|candidate| self.evaluate(record, grid, candidate))
                .collect()
        }
    }

    fn evaluate(&self, record: &CalculationRecord, grid: &Grid, candidate: usize) -> Result<Scored> {
        let cutoff = grid.cutoff(candidate);
        let options = BlockingOptions {
            extract_psips: true,
            calc_inefficiency: false,
        };
        let disqualified = Scored {
            candidate,
            errors: None,
            block_exponent: None,
        };

        let result = match self.orchestrator.analyse(record, Window::After(cutoff), options) {
            Ok(result) => result,
            Err(Error::InsufficientData { .. }) => {
                tracing::debug!(candidate, cutoff, "no rows after candidate cutoff");
                return Ok(disqualified);
            }
            Err(err) => return Err(err),
        };
        if !result.rejected.is_empty() {
            tracing::debug!(candidate, cutoff, rejected = ?result.rejected, "candidate disqualified");
            return Ok(disqualified);
        }

        let remaining = (grid.remaining_rows(candidate) as f64).sqrt();
        let mut errors = [f64::INFINITY; 4];
        for (slot, observable) in errors.iter_mut().zip(TRACKED) {
            if let Some(estimate) = result.accepted.get(observable) {
                *slot = estimate.fractional_error() / remaining;
            }
        }
        let block_exponent = self.orchestrator.reducer().optimal_block(&result.reblock, &TRACKED);
        tracing::trace!(candidate, cutoff, ?errors, ?block_exponent, "scored candidate");

        Ok(Scored {
            candidate,
            errors: Some(errors),
            block_exponent,
        })
    }
}

/// Search `record` with the standard collaborators
pub fn find_starting_iteration(
    record: &CalculationRecord,
    parameters: &SearchParameters,
) -> Result<StartingIteration> {
    BlockWindowSearch::new(*parameters).find_starting_iteration(record)
}
