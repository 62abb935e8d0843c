//! Visualization interface for the starting-iteration search
//!
//! The search reports each evaluated candidate and the final outcome to a
//! [`SearchVisualizer`]. Rendering is diagnostic only: a visualizer error is
//! logged and never changes the returned starting iteration.

use crate::search::StartingIteration;
use crate::sweep::FractionalErrors;
use reblock_core::{Result, TimeSeries};
use std::sync::Mutex;

/// Receives search progress for plotting or inspection
pub trait SearchVisualizer: Send + Sync {
    /// Record one candidate cutoff; `errors` is `None` for disqualified candidates
    fn record_candidate(
        &self,
        candidate: usize,
        cutoff: i64,
        errors: Option<&FractionalErrors>,
    ) -> Result<()>;

    /// Record the accepted outcome against the analysed trajectory
    fn record_outcome(&self, series: &TimeSeries, outcome: &StartingIteration) -> Result<()>;

    /// Check if this visualizer actually produces output
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Visualizer that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSearchVisualizer;

impl SearchVisualizer for NullSearchVisualizer {
    #[inline(always)]
    fn record_candidate(&self, _: usize, _: i64, _: Option<&FractionalErrors>) -> Result<()> {
        Ok(())
    }

    #[inline(always)]
    fn record_outcome(&self, _: &TimeSeries, _: &StartingIteration) -> Result<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// One candidate as seen by a visualizer
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTrace {
    pub candidate: usize,
    pub cutoff: i64,
    pub errors: Option<FractionalErrors>,
}

/// Keeps everything it is shown, for tests and notebooks
#[derive(Debug, Default)]
pub struct RecordingSearchVisualizer {
    candidates: Mutex<Vec<CandidateTrace>>,
    outcome: Mutex<Option<(i64, i64)>>,
}

impl RecordingSearchVisualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidates in the order they were reported
    pub fn candidates(&self) -> Vec<CandidateTrace> {
        self.candidates
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// `(minimum_iteration, iteration)` of the recorded outcome
    pub fn outcome(&self) -> Option<(i64, i64)> {
        self.outcome.lock().ok().and_then(|guard| *guard)
    }
}

impl SearchVisualizer for RecordingSearchVisualizer {
    fn record_candidate(
        &self,
        candidate: usize,
        cutoff: i64,
        errors: Option<&FractionalErrors>,
    ) -> Result<()> {
        if let Ok(mut guard) = self.candidates.lock() {
            guard.push(CandidateTrace {
                candidate,
                cutoff,
                errors: errors.copied(),
            });
        }
        Ok(())
    }

    fn record_outcome(&self, _: &TimeSeries, outcome: &StartingIteration) -> Result<()> {
        if let Ok(mut guard) = self.outcome.lock() {
            *guard = Some((outcome.minimum_iteration, outcome.iteration));
        }
        Ok(())
    }
}

impl<V: SearchVisualizer + ?Sized> SearchVisualizer for &V {
    fn record_candidate(
        &self,
        candidate: usize,
        cutoff: i64,
        errors: Option<&FractionalErrors>,
    ) -> Result<()> {
        (**self).record_candidate(candidate, cutoff, errors)
    }

    fn record_outcome(&self, series: &TimeSeries, outcome: &StartingIteration) -> Result<()> {
        (**self).record_outcome(series, outcome)
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

#[cfg(feature = "plotting")]
pub use svg::SvgSearchVisualizer;

#[cfg(feature = "plotting")]
mod svg {
    use super::*;
    use plotters::prelude::*;
    use reblock_core::Error;
    use std::path::PathBuf;

    fn render_error(err: impl std::fmt::Display) -> Error {
        Error::Computation(format!("failed to render shift trace: {err}"))
    }

    /// Draws the shift trace with the minimum and the final starting iteration
    #[derive(Debug, Clone)]
    pub struct SvgSearchVisualizer {
        path: PathBuf,
        size: (u32, u32),
    }

    impl SvgSearchVisualizer {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                size: (1200, 700),
            }
        }

        pub fn with_size(mut self, width: u32, height: u32) -> Self {
            self.size = (width, height);
            self
        }
    }

    impl SearchVisualizer for SvgSearchVisualizer {
        fn record_candidate(&self, _: usize, _: i64, _: Option<&FractionalErrors>) -> Result<()> {
            Ok(())
        }

        fn record_outcome(&self, series: &TimeSeries, outcome: &StartingIteration) -> Result<()> {
            let its = series.iterations();
            let shift = series.shift();
            let (Some(&x_min), Some(&x_max)) = (its.first(), its.last()) else {
                return Ok(());
            };
            let (y_min, y_max) = shift
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));
            let pad = ((y_max - y_min) * 0.05).max(1e-6);
            let (y_lo, y_hi) = (y_min - pad, y_max + pad);

            let root = SVGBackend::new(&self.path, self.size).into_drawing_area();
            root.fill(&WHITE).map_err(render_error)?;
            let mut chart = ChartBuilder::on(&root)
                .caption("Shift and starting iteration", ("sans-serif", 22))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(x_min as f64..x_max as f64, y_lo..y_hi)
                .map_err(render_error)?;

            chart
                .configure_mesh()
                .x_desc("iterations")
                .y_desc("Shift")
                .draw()
                .map_err(render_error)?;

            chart
                .draw_series(LineSeries::new(
                    its.iter().zip(shift).map(|(&i, &s)| (i as f64, s)),
                    &BLUE,
                ))
                .map_err(render_error)?
                .label("shift")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

            for (iteration, color, label) in [
                (outcome.minimum_iteration, RED, "accepted candidate"),
                (outcome.iteration, GREEN, "starting iteration"),
            ] {
                let x = iteration as f64;
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(x, y_lo), (x, y_hi)],
                        color.stroke_width(2),
                    )))
                    .map_err(render_error)?
                    .label(label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_error)?;

            root.present().map_err(render_error)?;
            tracing::debug!(path = %self.path.display(), "rendered shift trace");
            Ok(())
        }
    }
}
