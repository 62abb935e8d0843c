//! # Standard blocking collaborators
//!
//! Reference implementations of the `reblock-core` collaborator traits:
//!
//! - [`BlockingReducer`]: Flyvbjerg-Petersen blocking with Wolff/Lee optimal
//!   block selection and per-level covariance
//! - [`StandardEstimators`]: projected energy ratio estimator, summaries of
//!   optimal-block estimates, inefficiency
//! - [`PrettyFormatter`]: `mean(error)` display strings
//! - [`PopulationReweighter`]: population-control bias weights
//!
//! ```rust
//! use reblock_blocking::BlockingReducer;
//! use reblock_core::{Observable, Reducer};
//!
//! let data: Vec<f64> = (0..1024).map(|i| ((i * 7919) % 101) as f64).collect();
//! let reduction = BlockingReducer.reduce(&[(Observable::Shift, data.as_slice())]).unwrap();
//! assert_eq!(reduction.table.block_counts[0], 1024);
//! ```

pub mod estimators;
pub mod format;
pub mod reblock;
pub mod reweight;

pub use estimators::{ratio, StandardEstimators};
pub use format::{pretty_fmt_err, PrettyFormatter};
pub use reblock::{block_stats, coarsen, find_optimal_level, BlockingReducer};
pub use reweight::{population_weights, PopulationReweighter};
