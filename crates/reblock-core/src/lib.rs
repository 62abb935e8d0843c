//! Core types and traits for QMC reblocking analysis
//!
//! This crate provides the shared vocabulary of the reblock workspace:
//!
//! - **Data model**: [`Metadata`], [`TimeSeries`] and [`CalculationRecord`]
//!   describing one FCIQMC/CCMC calculation and its per-iteration output
//! - **Reduction tables**: [`ReblockTable`], [`CovarianceTable`] and
//!   [`EstimateTable`] produced by the blocking transform and its summaries
//! - **Collaborator traits**: [`Reducer`], [`EstimatorSuite`],
//!   [`EstimateFormatter`], [`Reweighter`] and [`Extractor`]
//! - **Errors and diagnostics**: one [`Error`] enum for every crate and a
//!   [`Diagnostics`] list of non-fatal warnings
//!
//! # Example
//!
//! ```rust
//! use reblock_core::{CalcType, CalculationRecord, Metadata, TimeSeries};
//!
//! let series = TimeSeries::new(
//!     vec![10, 20, 30],
//!     vec![0.0, -0.1, -0.12],
//!     vec![10.0, 10.5, 10.2],
//!     vec![-5.0, -5.1, -5.2],
//! )
//! .unwrap();
//! let record = CalculationRecord::new(Metadata::new(CalcType::Fciqmc), series);
//! assert_eq!(record.series.len(), 3);
//! ```

pub mod diagnostics;
pub mod error;
pub mod series;
pub mod tables;
pub mod traits;
pub mod types;

// Re-export core types
pub use diagnostics::{Diagnostics, Warning};
pub use error::{Error, Result};
pub use series::{CalculationRecord, TimeSeries, REQUIRED_COLUMNS};
pub use tables::{
    BlockStats, ColumnReblock, CovarianceMatrix, CovarianceTable, Estimate, EstimateTable,
    ReblockTable, Reduction,
};
pub use traits::{
    EstimateFormatter, EstimatorSuite, Extractor, Reducer, ReweightOptions, Reweighter,
};
pub use types::{
    Annotations, CalcType, Metadata, Observable, QmcParameters, RestartInfo,
    SUPPORTED_CALC_TYPES,
};
