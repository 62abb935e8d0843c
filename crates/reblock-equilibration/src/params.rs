//! Search parameters and their validation

use reblock_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Smallest accepted `pos_min_frac` (exclusive)
pub const MIN_POS_MIN_FRAC: f64 = 0.00001;

/// Tunables of the starting-iteration search
///
/// Counts are signed so that out-of-range values read from configuration
/// reach [`SearchParameters::validate`] rather than failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParameters {
    /// Number of equal-width candidate cutoffs between the start of shift
    /// variation and the end of the series
    pub frac_screen_interval: i64,

    /// Candidates evaluated per sweep round
    pub number_of_reblockings: i64,

    /// Extra margin, in autocorrelation blocks, discarded beyond the minimum
    pub number_of_reblocks_to_cut_off: i64,

    /// The minimum is accepted once it lies within this leading fraction of
    /// the candidates evaluated so far
    pub pos_min_frac: f64,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            frac_screen_interval: 300,
            number_of_reblockings: 30,
            number_of_reblocks_to_cut_off: 1,
            pos_min_frac: 0.8,
        }
    }
}

/// Parameters after validation, in the types the sweep works with
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Validated {
    pub frac_screen_interval: usize,
    pub number_of_reblockings: usize,
    pub reblocks_to_cut_off: usize,
    pub pos_min_frac: f64,
}

impl Validated {
    /// Number of complete sweep rounds available
    pub fn rounds(&self) -> usize {
        self.frac_screen_interval / self.number_of_reblockings
    }
}

impl SearchParameters {
    pub fn builder() -> SearchParametersBuilder {
        SearchParametersBuilder::new()
    }

    /// Check every parameter against its allowed range
    pub fn validate(&self) -> Result<()> {
        self.checked().map(|_| ())
    }

    pub(crate) fn checked(&self) -> Result<Validated> {
        if self.frac_screen_interval <= 0 {
            return Err(Error::configuration(
                "frac_screen_interval",
                self.frac_screen_interval,
                "must be greater than zero",
            ));
        }
        if self.number_of_reblocks_to_cut_off < 0 {
            return Err(Error::configuration(
                "number_of_reblocks_to_cut_off",
                self.number_of_reblocks_to_cut_off,
                "must not be negative",
            ));
        }
        if !(self.pos_min_frac > MIN_POS_MIN_FRAC && self.pos_min_frac <= 1.0) {
            return Err(Error::configuration(
                "pos_min_frac",
                self.pos_min_frac,
                "must lie in (0.00001, 1]",
            ));
        }
        if self.number_of_reblockings <= 0 {
            return Err(Error::configuration(
                "number_of_reblockings",
                self.number_of_reblockings,
                "must be greater than zero",
            ));
        }
        if self.number_of_reblockings > self.frac_screen_interval {
            return Err(Error::configuration(
                "number_of_reblockings",
                self.number_of_reblockings,
                "must not exceed frac_screen_interval",
            ));
        }

        Ok(Validated {
            frac_screen_interval: self.frac_screen_interval as usize,
            number_of_reblockings: self.number_of_reblockings as usize,
            reblocks_to_cut_off: self.number_of_reblocks_to_cut_off as usize,
            pos_min_frac: self.pos_min_frac,
        })
    }
}

/// Fluent construction of validated [`SearchParameters`]
#[derive(Debug, Clone, Default)]
pub struct SearchParametersBuilder {
    params: SearchParameters,
}

impl SearchParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frac_screen_interval(mut self, value: i64) -> Self {
        self.params.frac_screen_interval = value;
        self
    }

    pub fn number_of_reblockings(mut self, value: i64) -> Self {
        self.params.number_of_reblockings = value;
        self
    }

    pub fn number_of_reblocks_to_cut_off(mut self, value: i64) -> Self {
        self.params.number_of_reblocks_to_cut_off = value;
        self
    }

    pub fn pos_min_frac(mut self, value: f64) -> Self {
        self.params.pos_min_frac = value;
        self
    }

    /// Validate and return the parameters
    pub fn build(self) -> Result<SearchParameters> {
        self.params.validate()?;
        Ok(self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameter_of(err: Error) -> &'static str {
        match err {
            Error::Configuration { parameter, .. } => parameter,
            other => panic!("expected a configuration error, got {other}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let checked = SearchParameters::default().checked().unwrap();
        assert_eq!(checked.rounds(), 10);
        assert_eq!(checked.reblocks_to_cut_off, 1);
    }

    #[test]
    fn test_each_violation_names_its_parameter() {
        let cases = [
            (SearchParameters::builder().frac_screen_interval(0), "frac_screen_interval"),
            (SearchParameters::builder().number_of_reblockings(0), "number_of_reblockings"),
            (SearchParameters::builder().number_of_reblockings(301), "number_of_reblockings"),
            (
                SearchParameters::builder().number_of_reblocks_to_cut_off(-1),
                "number_of_reblocks_to_cut_off",
            ),
            (SearchParameters::builder().pos_min_frac(0.00001), "pos_min_frac"),
            (SearchParameters::builder().pos_min_frac(1.5), "pos_min_frac"),
            (SearchParameters::builder().pos_min_frac(f64::NAN), "pos_min_frac"),
        ];
        for (builder, expected) in cases {
            assert_eq!(parameter_of(builder.build().unwrap_err()), expected);
        }
    }

    #[test]
    fn test_boundary_values_are_accepted() {
        let params = SearchParameters::builder()
            .frac_screen_interval(7)
            .number_of_reblockings(7)
            .number_of_reblocks_to_cut_off(0)
            .pos_min_frac(1.0)
            .build()
            .unwrap();
        assert_eq!(params.checked().unwrap().rounds(), 1);
    }

    #[test]
    fn test_partial_configuration_uses_defaults() {
        let params: SearchParameters =
            serde_json::from_str(r#"{"frac_screen_interval": 100, "pos_min_frac": 0.5}"#).unwrap();
        assert_eq!(params.number_of_reblockings, 30);
        assert_eq!(params.number_of_reblocks_to_cut_off, 1);
        params.validate().unwrap();
    }
}
