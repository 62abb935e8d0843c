//! Candidate comparison and the round-based sweep state machine
//!
//! The sweep evaluates candidate cutoffs in rounds. After every round the
//! best candidate seen so far is accepted if it lies early enough among the
//! candidates evaluated; otherwise another round starts, until the candidates
//! run out.

use reblock_core::Observable;
use std::ops::Range;

/// Columns whose weighted fractional errors are compared
pub const TRACKED: [Observable; 4] = [
    Observable::Shift,
    Observable::ReferencePopulation,
    Observable::ProjectedNumerator,
    Observable::TotalPopulation,
];

/// Weighted fractional error of each [`TRACKED`] column, in that order
pub type FractionalErrors = [f64; 4];

/// Whether `candidate` is at least as good as `best` in any one column
///
/// Only one coordinate has to improve; the other three may regress. This is
/// the inherited update rule, not a Pareto comparison.
pub fn any_coordinate_improves(candidate: &FractionalErrors, best: &FractionalErrors) -> bool {
    candidate.iter().zip(best).any(|(c, b)| c <= b)
}

/// Where the sweep stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    /// Evaluating the candidates of this round
    Sweeping { round: usize },
    /// The best candidate passed the acceptance test
    Accepted { candidate: usize },
    /// Every round ran without acceptance
    Exhausted,
}

/// Best candidate seen so far
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestCandidate {
    pub candidate: usize,
    pub errors: FractionalErrors,
    pub block_exponent: Option<usize>,
}

/// Tracks the running minimum and drives [`SweepState`] transitions
#[derive(Debug, Clone)]
pub struct SweepTracker {
    rounds: usize,
    per_round: usize,
    pos_min_frac: f64,
    best: Option<BestCandidate>,
    /// Running minimum; starts at +inf so a candidate with no finite error
    /// never becomes best
    best_errors: FractionalErrors,
    evaluated: usize,
    state: SweepState,
}

impl SweepTracker {
    pub fn new(rounds: usize, per_round: usize, pos_min_frac: f64) -> Self {
        let state = if rounds == 0 || per_round == 0 {
            SweepState::Exhausted
        } else {
            SweepState::Sweeping { round: 0 }
        };
        Self {
            rounds,
            per_round,
            pos_min_frac,
            best: None,
            best_errors: [f64::INFINITY; 4],
            evaluated: 0,
            state,
        }
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    pub fn best(&self) -> Option<&BestCandidate> {
        self.best.as_ref()
    }

    /// Number of candidates observed so far
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    /// Global candidate indices of the current round, empty once finished
    pub fn round_candidates(&self) -> Range<usize> {
        match self.state {
            SweepState::Sweeping { round } => round * self.per_round..(round + 1) * self.per_round,
            _ => 0..0,
        }
    }

    /// Record one candidate; `None` marks it disqualified
    ///
    /// Disqualified candidates are counted but never compared. Returns whether
    /// the candidate became the new best.
    pub fn observe(
        &mut self,
        candidate: usize,
        errors: Option<FractionalErrors>,
        block_exponent: Option<usize>,
    ) -> bool {
        self.evaluated += 1;
        let Some(errors) = errors else {
            return false;
        };
        let improves = any_coordinate_improves(&errors, &self.best_errors);
        if improves {
            self.best_errors = errors;
            self.best = Some(BestCandidate {
                candidate,
                errors,
                block_exponent,
            });
        }
        improves
    }

    /// Apply the acceptance test at the end of the current round
    pub fn finish_round(&mut self) -> SweepState {
        let SweepState::Sweeping { round } = self.state else {
            return self.state;
        };
        let last = (round + 1) * self.per_round - 1;
        let threshold = (self.pos_min_frac * last as f64).floor() as usize;

        self.state = match self.best {
            Some(best) if best.candidate < threshold => SweepState::Accepted {
                candidate: best.candidate,
            },
            _ if round + 1 < self.rounds => SweepState::Sweeping { round: round + 1 },
            _ => SweepState::Exhausted,
        };
        tracing::debug!(
            round,
            threshold,
            best = ?self.best.map(|b| b.candidate),
            state = ?self.state,
            "finished sweep round"
        );
        self.state
    }
}
