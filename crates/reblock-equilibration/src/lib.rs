//! # Equilibration detection for QMC time series
//!
//! Finds the iteration after which a calculation's statistics can be
//! trusted, by sweeping candidate cutoffs and reblocking each one.
//!
//! ## Features
//!
//! - **Validated parameters**: [`SearchParameters`] with a fluent builder
//! - **Sweep state machine**: [`SweepTracker`] with the
//!   [`any_coordinate_improves`] update rule
//! - **Search**: [`BlockWindowSearch`] returning a [`StartingIteration`]
//! - **Visualization**: [`SearchVisualizer`] hooks, with an SVG renderer
//!   behind the `plotting` feature
//! - **Parallel rounds**: candidates of a round are reblocked concurrently
//!   with the `parallel` feature; acceptance still sees them in order
//!
//! ```rust
//! use reblock_equilibration::SearchParameters;
//!
//! let params = SearchParameters::builder()
//!     .frac_screen_interval(100)
//!     .number_of_reblockings(10)
//!     .build()
//!     .unwrap();
//! assert_eq!(params.pos_min_frac, 0.8);
//! assert!(SearchParameters::builder().pos_min_frac(2.0).build().is_err());
//! ```

pub mod params;
pub mod search;
pub mod sweep;
pub mod visualization;

pub use params::{SearchParameters, SearchParametersBuilder};
pub use search::{find_starting_iteration, BlockWindowSearch, StartingIteration};
pub use sweep::{
    any_coordinate_improves, BestCandidate, FractionalErrors, SweepState, SweepTracker, TRACKED,
};
pub use visualization::{
    CandidateTrace, NullSearchVisualizer, RecordingSearchVisualizer, SearchVisualizer,
};

#[cfg(feature = "plotting")]
pub use visualization::SvgSearchVisualizer;
