//! End-to-end analysis of a set of calculation outputs
//!
//! extract → select zero-temperature calculations → reweight → stitch
//! restarts → per run chain: find the starting iteration unless one was
//! given, then reblock from it.

use crate::extract::TabularExtractor;
use reblock_analysis::{
    apply_reweighting, stitch_runs, zero_temperature, AnalysisResult, BlockingOptions,
    ReblockOrchestrator, RowSelector, Window,
};
use reblock_blocking::{BlockingReducer, PopulationReweighter, PrettyFormatter, StandardEstimators};
use reblock_core::{
    CalculationRecord, Diagnostics, Error, EstimateFormatter, EstimatorSuite, Extractor, Reducer,
    Result, ReweightOptions, Reweighter,
};
use reblock_equilibration::{BlockWindowSearch, NullSearchVisualizer, SearchParameters};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Call-time options of a driver run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Reblock from this iteration instead of searching for one
    pub start: Option<i64>,
    pub blocking: BlockingOptions,
    pub reweight: ReweightOptions,
    pub search: SearchParameters,
}

/// Analysis of one run chain
#[derive(Debug)]
pub struct ChainAnalysis {
    /// Position of the chain in stitching order
    pub index: usize,
    pub label: String,
    pub outcome: Result<AnalysisResult>,
    /// Warnings raised for this chain, kept when the analysis fails
    pub diagnostics: Diagnostics,
}

/// Per-chain outcomes of a driver run, in chain order
#[derive(Debug, Default)]
pub struct DriverReport {
    chains: Vec<ChainAnalysis>,
}

impl DriverReport {
    pub fn chains(&self) -> &[ChainAnalysis] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Successful analyses, in chain order
    pub fn successes(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.chains.iter().filter_map(|c| c.outcome.as_ref().ok())
    }

    /// Failed chains with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&ChainAnalysis, &Error)> {
        self.chains
            .iter()
            .filter_map(|c| c.outcome.as_ref().err().map(|err| (c, err)))
    }

    /// All results, or the first failure wrapped with its chain
    pub fn into_results(self) -> Result<Vec<AnalysisResult>> {
        self.chains
            .into_iter()
            .map(|chain| {
                chain.outcome.map_err(|source| Error::Chain {
                    index: chain.index,
                    run: chain.label,
                    source: Box::new(source),
                })
            })
            .collect()
    }
}

/// Runs the full analysis pipeline
pub struct AnalysisDriver<
    X = TabularExtractor,
    R = BlockingReducer,
    E = StandardEstimators,
    F = PrettyFormatter,
    W = PopulationReweighter,
> {
    extractor: X,
    search: BlockWindowSearch<R, E, F, NullSearchVisualizer>,
    reweighter: W,
    options: AnalysisOptions,
    selector: Option<Box<RowSelector>>,
}

impl AnalysisDriver {
    /// Driver with the tabular extractor and standard collaborators
    pub fn new(options: AnalysisOptions) -> Self {
        Self::with_collaborators(
            TabularExtractor,
            ReblockOrchestrator::standard(),
            PopulationReweighter,
            options,
        )
    }
}

impl<X, R, E, F, W> AnalysisDriver<X, R, E, F, W>
where
    X: Extractor + Sync,
    R: Reducer,
    E: EstimatorSuite,
    F: EstimateFormatter,
    W: Reweighter,
{
    pub fn with_collaborators(
        extractor: X,
        orchestrator: ReblockOrchestrator<R, E, F>,
        reweighter: W,
        options: AnalysisOptions,
    ) -> Self {
        Self {
            extractor,
            search: BlockWindowSearch::with_orchestrator(
                orchestrator,
                options.search,
                NullSearchVisualizer,
            ),
            reweighter,
            options,
            selector: None,
        }
    }

    /// Choose rows with `selector` instead of a starting iteration
    pub fn with_selector(
        mut self,
        selector: impl Fn(&reblock_core::TimeSeries) -> Vec<bool> + Send + Sync + 'static,
    ) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Extract `paths` and analyse every run chain found in them
    pub fn std_analysis(&self, paths: &[PathBuf]) -> Result<DriverReport> {
        let records = self.extractor.extract(paths)?;
        let sources: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        self.analyse_records(records, &sources)
    }

    /// Analyse already extracted calculations
    ///
    /// `sources` names the inputs in the error raised when no supported
    /// calculation is found.
    pub fn analyse_records<S: AsRef<str>>(
        &self,
        records: Vec<CalculationRecord>,
        sources: &[S],
    ) -> Result<DriverReport> {
        let selected = zero_temperature(records);
        if selected.is_empty() {
            return Err(Error::data_absence(sources));
        }

        let reweighted = selected
            .into_iter()
            .map(|record| apply_reweighting(record, &self.options.reweight, &self.reweighter))
            .collect::<Result<Vec<_>>>()?;
        let chains = stitch_runs(reweighted, sources)?;
        tracing::debug!(chains = chains.len(), "analysing run chains");

        Ok(DriverReport {
            chains: self.analyse_chains(chains),
        })
    }

    fn analyse_chains(&self, chains: Vec<CalculationRecord>) -> Vec<ChainAnalysis> {
        let analyse = |(index, record): (usize, CalculationRecord)| {
            let mut diagnostics = Diagnostics::new();
            let outcome = self.analyse_chain(&record, &mut diagnostics);
            if let Err(err) = &outcome {
                tracing::warn!(index, run = %record.label(), "run chain failed: {err}");
            }
            ChainAnalysis {
                index,
                label: record.label(),
                outcome,
                diagnostics,
            }
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            chains.into_par_iter().enumerate().map(analyse).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            chains.into_iter().enumerate().map(analyse).collect()
        }
    }

    /// Starting iteration, reblock start annotation, then blocking analysis
    ///
    /// Every warning raised along the way is appended to `diagnostics`; a
    /// successful result carries the same warnings.
    fn analyse_chain(
        &self,
        record: &CalculationRecord,
        diagnostics: &mut Diagnostics,
    ) -> Result<AnalysisResult> {
        let orchestrator = self.search.orchestrator();
        let (window, start) = match (&self.selector, self.options.start) {
            (Some(selector), _) => (Window::Select(selector.as_ref()), None),
            (None, Some(start)) => (Window::After(start), Some(start)),
            (None, None) => {
                let found = self.search.find_starting_iteration_with(record, diagnostics)?;
                (Window::After(found.iteration), Some(found.iteration))
            }
        };

        let annotated = match start {
            Some(start) => CalculationRecord {
                metadata: record.metadata.with_reblock_start(start),
                series: Arc::clone(&record.series),
            },
            None => record.clone(),
        };
        let mut result = orchestrator.analyse(&annotated, window, self.options.blocking)?;
        for warning in result.diagnostics.warnings() {
            diagnostics.push(warning.clone());
        }
        result.diagnostics = diagnostics.clone();
        Ok(result)
    }
}

/// Analyse `paths` with the tabular extractor and standard collaborators
pub fn std_analysis(paths: &[PathBuf], options: AnalysisOptions) -> Result<DriverReport> {
    AnalysisDriver::new(options).std_analysis(paths)
}
