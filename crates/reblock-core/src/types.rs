//! Calculation metadata and column naming

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Calculation family of a QMC run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CalcType {
    /// Full configuration interaction QMC
    Fciqmc,
    /// Coupled cluster Monte Carlo
    Ccmc,
    /// FCIQMC with the simple (dense) algorithm
    SimpleFciqmc,
    /// Any other calculation type found in the output
    Other(String),
}

/// Calculation types whose output follows the zero-temperature schema
pub const SUPPORTED_CALC_TYPES: [CalcType; 3] =
    [CalcType::Fciqmc, CalcType::Ccmc, CalcType::SimpleFciqmc];

impl CalcType {
    /// Label used in calculation output
    pub fn label(&self) -> &str {
        match self {
            CalcType::Fciqmc => "FCIQMC",
            CalcType::Ccmc => "CCMC",
            CalcType::SimpleFciqmc => "Simple FCIQMC",
            CalcType::Other(label) => label,
        }
    }
}

impl From<String> for CalcType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "FCIQMC" => CalcType::Fciqmc,
            "CCMC" => CalcType::Ccmc,
            "Simple FCIQMC" => CalcType::SimpleFciqmc,
            _ => CalcType::Other(label),
        }
    }
}

impl From<&str> for CalcType {
    fn from(label: &str) -> Self {
        CalcType::from(label.to_string())
    }
}

impl From<CalcType> for String {
    fn from(calc_type: CalcType) -> Self {
        calc_type.label().to_string()
    }
}

impl fmt::Display for CalcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Restart linkage of a run segment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestartInfo {
    /// Identifier of the run this segment was restarted from
    #[serde(default)]
    pub uuid_restart: Option<String>,
}

impl RestartInfo {
    /// Predecessor identifier, treating an empty string as absent
    pub fn predecessor(&self) -> Option<&str> {
        self.uuid_restart.as_deref().filter(|uuid| !uuid.is_empty())
    }
}

/// Simulation parameters needed by the analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QmcParameters {
    /// Imaginary time step
    pub tau: f64,
    /// Monte Carlo cycles per report loop
    pub ncycles: usize,
}

impl Default for QmcParameters {
    fn default() -> Self {
        Self {
            tau: 0.01,
            ncycles: 10,
        }
    }
}

/// Values recorded about a run by the analysis itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    /// Iteration after which data were reblocked
    #[serde(default)]
    pub reblock_start: Option<i64>,
}

/// Metadata describing one calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub calc_type: CalcType,
    /// Run identifier
    #[serde(default, rename = "UUID")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub restart: RestartInfo,
    #[serde(default)]
    pub qmc: QmcParameters,
    /// File the calculation was read from
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl Metadata {
    pub fn new(calc_type: CalcType) -> Self {
        Self {
            calc_type,
            uuid: None,
            restart: RestartInfo::default(),
            qmc: QmcParameters::default(),
            source: None,
            annotations: Annotations::default(),
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_restart(mut self, uuid_restart: impl Into<String>) -> Self {
        self.restart.uuid_restart = Some(uuid_restart.into());
        self
    }

    pub fn with_qmc(mut self, qmc: QmcParameters) -> Self {
        self.qmc = qmc;
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Copy of this metadata with the chosen reblocking start recorded
    pub fn with_reblock_start(&self, start: i64) -> Self {
        let mut extended = self.clone();
        extended.annotations.reblock_start = Some(start);
        extended
    }

    /// Run identifier, treating an empty string as absent
    pub fn run_id(&self) -> Option<&str> {
        self.uuid.as_deref().filter(|uuid| !uuid.is_empty())
    }

    /// Human-readable label used in errors and logs
    pub fn label(&self) -> String {
        match (self.run_id(), &self.source) {
            (Some(uuid), Some(source)) => format!("{} [{}]", source.display(), uuid),
            (Some(uuid), None) => uuid.to_string(),
            (None, Some(source)) => source.display().to_string(),
            (None, None) => format!("unnamed {} calculation", self.calc_type),
        }
    }
}

/// Named columns of a QMC time series and of derived estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Observable {
    #[serde(rename = "Shift")]
    Shift,
    /// Population on the reference determinant
    #[serde(rename = "N_0")]
    ReferencePopulation,
    /// Numerator of the projected energy estimator
    #[serde(rename = "\\sum H_0j N_j")]
    ProjectedNumerator,
    /// Total Hamiltonian walker population
    #[serde(rename = "# H psips")]
    TotalPopulation,
    #[serde(rename = "Weight")]
    Weight,
    #[serde(rename = "W * \\sum H_0j N_j")]
    WeightedProjectedNumerator,
    #[serde(rename = "W * N_0")]
    WeightedReferencePopulation,
    #[serde(rename = "Proj. Energy")]
    ProjectedEnergy,
    #[serde(rename = "Weighted Proj. E.")]
    WeightedProjectedEnergy,
    #[serde(rename = "Inefficiency")]
    Inefficiency,
}

impl Observable {
    /// Columns read from calculation output
    pub const RAW: [Observable; 4] = [
        Observable::Shift,
        Observable::ReferencePopulation,
        Observable::ProjectedNumerator,
        Observable::TotalPopulation,
    ];

    /// Column label used in output tables
    pub fn label(self) -> &'static str {
        match self {
            Observable::Shift => "Shift",
            Observable::ReferencePopulation => "N_0",
            Observable::ProjectedNumerator => "\\sum H_0j N_j",
            Observable::TotalPopulation => "# H psips",
            Observable::Weight => "Weight",
            Observable::WeightedProjectedNumerator => "W * \\sum H_0j N_j",
            Observable::WeightedReferencePopulation => "W * N_0",
            Observable::ProjectedEnergy => "Proj. Energy",
            Observable::WeightedProjectedEnergy => "Weighted Proj. E.",
            Observable::Inefficiency => "Inefficiency",
        }
    }

    /// Look up an observable from its column label
    pub fn from_label(label: &str) -> Option<Self> {
        [
            Observable::Shift,
            Observable::ReferencePopulation,
            Observable::ProjectedNumerator,
            Observable::TotalPopulation,
            Observable::Weight,
            Observable::WeightedProjectedNumerator,
            Observable::WeightedReferencePopulation,
            Observable::ProjectedEnergy,
            Observable::WeightedProjectedEnergy,
            Observable::Inefficiency,
        ]
        .into_iter()
        .find(|obs| obs.label() == label.trim())
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_type_labels_round_trip() {
        for calc_type in SUPPORTED_CALC_TYPES {
            assert_eq!(CalcType::from(calc_type.label()), calc_type);
        }
        assert_eq!(CalcType::from("DMQMC"), CalcType::Other("DMQMC".to_string()));
    }

    #[test]
    fn test_empty_identifiers_are_absent() {
        let md = Metadata::new(CalcType::Ccmc).with_uuid("").with_restart("");
        assert_eq!(md.run_id(), None);
        assert_eq!(md.restart.predecessor(), None);
        assert_eq!(md.label(), "unnamed CCMC calculation");
    }

    #[test]
    fn test_reblock_start_copies_on_extend() {
        let md = Metadata::new(CalcType::Fciqmc).with_uuid("abc");
        let extended = md.with_reblock_start(1200);
        assert_eq!(md.annotations.reblock_start, None);
        assert_eq!(extended.annotations.reblock_start, Some(1200));
        assert_eq!(extended.uuid, md.uuid);
    }

    #[test]
    fn test_metadata_deserializes_with_missing_keys() {
        let md: Metadata = serde_json::from_str(
            r#"{"calc_type": "FCIQMC", "UUID": "r1", "qmc": {"tau": 0.05, "ncycles": 20}}"#,
        )
        .unwrap();
        assert_eq!(md.calc_type, CalcType::Fciqmc);
        assert_eq!(md.run_id(), Some("r1"));
        assert_eq!(md.restart.predecessor(), None);
        assert_eq!(md.qmc.ncycles, 20);
    }

    #[test]
    fn test_observable_labels() {
        assert_eq!(Observable::ProjectedNumerator.label(), "\\sum H_0j N_j");
        assert_eq!(Observable::from_label("# H psips"), Some(Observable::TotalPopulation));
        assert_eq!(Observable::from_label(" N_0 "), Some(Observable::ReferencePopulation));
        assert_eq!(Observable::from_label("iterations"), None);
    }
}
