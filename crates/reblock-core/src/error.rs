//! Error types for QMC reblocking analysis
//!
//! Provides a unified error type for all reblock crates.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for reblocking and equilibration analysis
#[derive(Error, Debug)]
pub enum Error {
    /// A tunable is out of range; raised before any reblocking work begins
    #[error("Invalid configuration: {parameter} = {value} ({reason})")]
    Configuration {
        parameter: &'static str,
        value: String,
        reason: &'static str,
    },

    /// No calculations survived extraction and selection
    #[error("No data found in {sources}")]
    DataAbsence { sources: String },

    /// The shift never left its initial value
    #[error("Shift has not started to vary in dataset {run}")]
    EquilibrationSignal { run: String },

    /// The sweep ran out of candidates without meeting the acceptance test
    #[error(
        "Failed to find starting iteration for {run} after {evaluated} reblocking attempts; \
         the calculation might not be converged"
    )]
    ConvergenceSearch { run: String, evaluated: usize },

    /// The margin-adjusted starting iteration leaves no data to analyse
    #[error(
        "Too much cut off for {run}: starting iteration {starting_iteration} is not before the \
         last iteration {last_iteration}; data is not converged or use a smaller \
         number_of_reblocks_to_cut_off (currently {reblocks_to_cut_off})"
    )]
    OverCut {
        run: String,
        starting_iteration: i64,
        last_iteration: i64,
        reblocks_to_cut_off: usize,
    },

    /// A column required by the analysis is not present in the trajectory
    #[error("Missing column '{column}' in {run}")]
    MissingColumn { run: String, column: String },

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Tabulated input could not be read
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Failure of one run chain inside a multi-chain analysis
    #[error("Run chain {index} ({run}) failed: {source}")]
    Chain {
        index: usize,
        run: String,
        #[source]
        source: Box<Error>,
    },

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create a configuration error for a named parameter
    pub fn configuration(
        parameter: &'static str,
        value: impl std::fmt::Display,
        reason: &'static str,
    ) -> Self {
        Self::Configuration {
            parameter,
            value: value.to_string(),
            reason,
        }
    }

    /// Create an error for empty input
    pub fn empty_input(_operation: &str) -> Self {
        Self::InsufficientData {
            expected: 1,
            actual: 0,
        }
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create a data absence error naming every requested source
    pub fn data_absence<S: AsRef<str>>(sources: &[S]) -> Self {
        let sources = sources
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        Self::DataAbsence { sources }
    }

    /// Whether this error is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::configuration("frac_screen_interval", 0, "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: frac_screen_interval = 0 (must be greater than zero)"
        );

        let err = Error::EquilibrationSignal { run: "run-a".to_string() };
        assert_eq!(err.to_string(), "Shift has not started to vary in dataset run-a");

        let err = Error::InsufficientData { expected: 10, actual: 5 };
        assert_eq!(err.to_string(), "Insufficient data: expected at least 10 samples, got 5");

        let err = Error::MissingColumn {
            run: "run-a".to_string(),
            column: "# H psips".to_string(),
        };
        assert_eq!(err.to_string(), "Missing column '# H psips' in run-a");
    }

    #[test]
    fn test_error_carries_context() {
        let err = Error::OverCut {
            run: "calc.out".to_string(),
            starting_iteration: 20_000,
            last_iteration: 19_990,
            reblocks_to_cut_off: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("calc.out"));
        assert!(msg.contains("20000"));
        assert!(msg.contains("19990"));
        assert!(msg.contains("currently 3"));

        let err = Error::ConvergenceSearch { run: "calc.out".to_string(), evaluated: 300 };
        assert!(err.to_string().contains("300 reblocking attempts"));
    }

    #[test]
    fn test_data_absence_names_sources() {
        let err = Error::data_absence(&["a.out", "b.out"]);
        assert_eq!(err.to_string(), "No data found in a.out b.out");

        let none: [&str; 0] = [];
        let err = Error::data_absence(&none);
        assert!(matches!(err, Error::DataAbsence { ref sources } if sources.is_empty()));
    }

    #[test]
    fn test_chain_wraps_source() {
        use std::error::Error as _;

        let inner = Error::EquilibrationSignal { run: "B".to_string() };
        let err = Error::Chain {
            index: 1,
            run: "B".to_string(),
            source: Box::new(inner),
        };
        assert!(err.to_string().starts_with("Run chain 1 (B) failed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_helper_functions() {
        let err = Error::empty_input("reblocking");
        match err {
            Error::InsufficientData { expected, actual } => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 0);
            }
            _ => panic!("Wrong error type"),
        }

        let err = Error::size_mismatch(100, 50, "row mask");
        assert_eq!(
            err.to_string(),
            "Invalid input: Size mismatch in row mask: expected 100, got 50"
        );
        assert!(!err.is_configuration());
        assert!(Error::configuration("pos_min_frac", 2.0, "out of range").is_configuration());
    }

    #[test]
    fn test_error_from_io_error() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => assert!(err.to_string().contains("file not found")),
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_error_from_anyhow() {
        let err: Error = anyhow::anyhow!("custom error message").into();
        assert!(matches!(err, Error::Other(_)));
        assert!(err.to_string().contains("custom error message"));
    }
}
