//! Non-fatal warnings raised during analysis
//!
//! Warnings are logged through `tracing` and also kept as data so callers
//! and tests can inspect them without capturing process output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A condition worth reporting that does not stop the analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    /// Fewer rows after equilibration start than screening intervals
    InsufficientResolution {
        run: String,
        rows: usize,
        frac_screen_interval: usize,
    },
    /// The blocked window begins while the shift is still constant
    CutoffBeforeShiftVariation { run: String, shift: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InsufficientResolution {
                run,
                rows,
                frac_screen_interval,
            } => write!(
                f,
                "{run} contains {rows} rows after the shift starts to vary, less than \
                 frac_screen_interval = {frac_screen_interval}; continuing with less than one \
                 row per screening interval"
            ),
            Warning::CutoffBeforeShiftVariation { run, shift } => write!(
                f,
                "blocking analysis of {run} starts before the shift begins to vary \
                 (shift constant at {shift})"
            ),
        }
    }
}

/// Ordered list of warnings collected during one analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it to the log
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Record a warning without logging it again
    pub fn push(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn contains(&self, predicate: impl Fn(&Warning) -> bool) -> bool {
        self.warnings.iter().any(predicate)
    }
}
