//! # qmc-reblock
//!
//! Automated reblocking analysis of FCIQMC and CCMC time series.
//!
//! Long QMC calculations start with a transient that has to be discarded
//! before error bars mean anything, and are often split over several
//! restarted runs. This crate stitches restarted runs back together, finds
//! the iteration at which the shift has equilibrated, and reblocks the data
//! from there into summary estimates.
//!
//! The workspace is split into:
//!
//! - [`reblock_core`]: data model, errors, diagnostics and collaborator traits
//! - [`reblock_blocking`]: the standard blocking reduction and estimators
//! - [`reblock_analysis`]: selection, stitching, reweighting and the orchestrator
//! - [`reblock_equilibration`]: the starting-iteration search
//!
//! This crate adds the [`AnalysisDriver`] running the whole pipeline and a
//! [`TabularExtractor`] for CSV output with JSON metadata.
//!
//! # Example
//!
//! ```rust,no_run
//! use qmc_reblock::{std_analysis, AnalysisOptions};
//! use std::path::PathBuf;
//!
//! let report = std_analysis(&[PathBuf::from("calc.csv")], AnalysisOptions::default())?;
//! for result in report.into_results()? {
//!     for estimate in result.accepted.rows() {
//!         println!("{}: {}", estimate.observable, estimate.display.as_deref().unwrap_or("-"));
//!     }
//! }
//! # Ok::<(), qmc_reblock::Error>(())
//! ```

pub mod driver;
pub mod extract;

pub use driver::{std_analysis, AnalysisDriver, AnalysisOptions, ChainAnalysis, DriverReport};
pub use extract::TabularExtractor;

pub use reblock_analysis::{
    apply_reweighting, select_calculations, stitch_runs, zero_temperature, AnalysisResult,
    BlockingOptions, ReblockOrchestrator, RowSelector, StitchStrategy, Window,
};
pub use reblock_blocking::{BlockingReducer, PopulationReweighter, PrettyFormatter, StandardEstimators};
pub use reblock_core::{
    CalcType, CalculationRecord, Diagnostics, Error, Estimate, EstimateTable, Metadata,
    Observable, QmcParameters, Result, ReweightOptions, TimeSeries, Warning,
};
pub use reblock_equilibration::{
    find_starting_iteration, BlockWindowSearch, SearchParameters, StartingIteration,
};

// Member crates, for everything not re-exported above
pub use reblock_analysis;
pub use reblock_blocking;
pub use reblock_core;
pub use reblock_equilibration;
