//! # Calculation analysis pipeline
//!
//! The stages between extracted calculations and summary estimates:
//!
//! - [`select_calculations`] / [`zero_temperature`]: keep supported calculation types
//! - [`apply_reweighting`]: add population-control weighted columns
//! - [`stitch_runs`]: merge restarted segments into one record per run chain
//! - [`ReblockOrchestrator`]: blocking analysis over a window of one record
//!
//! ```rust
//! use reblock_analysis::{BlockingOptions, ReblockOrchestrator, Window};
//! use reblock_core::{CalcType, CalculationRecord, Metadata, Observable, TimeSeries};
//!
//! let its: Vec<i64> = (1..=256).collect();
//! let shift: Vec<f64> = its.iter().map(|&i| -0.1 + 0.01 * ((i * 37) % 11) as f64).collect();
//! let n0: Vec<f64> = its.iter().map(|&i| 100.0 + ((i * 13) % 7) as f64).collect();
//! let num: Vec<f64> = n0.iter().map(|n| -0.5 * n).collect();
//! let record = CalculationRecord::new(
//!     Metadata::new(CalcType::Ccmc),
//!     TimeSeries::new(its, shift, n0, num).unwrap(),
//! );
//!
//! let result = ReblockOrchestrator::standard()
//!     .analyse(&record, Window::After(0), BlockingOptions::default())
//!     .unwrap();
//! assert!(result.reblock.column(Observable::ProjectedEnergy).is_some());
//! ```

pub mod orchestrator;
pub mod reweight;
pub mod selector;
pub mod stitch;

pub use orchestrator::{AnalysisResult, BlockingOptions, ReblockOrchestrator, RowSelector, Window};
pub use reweight::apply_reweighting;
pub use selector::{select_calculations, zero_temperature};
pub use stitch::{choose_strategy, stitch_runs, StitchStrategy};
