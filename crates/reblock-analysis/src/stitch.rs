//! Stitching restarted calculations into continuous run chains
//!
//! Two strategies are available:
//!
//! - **Identifier chains**: when every record carries a run identifier and at
//!   least one names the run it was restarted from, chains are followed
//!   backwards from their most recent segment.
//! - **Positional**: otherwise records are assumed to be in acquisition order
//!   and a record continues the previous one when the calculation type and the
//!   iteration stepping line up.
//!
//! Either way, concatenated segments are deduplicated on the iteration number,
//! keeping the row from the later segment.

use reblock_core::{CalculationRecord, Error, Metadata, Result, TimeSeries};
use std::sync::Arc;

/// How records were grouped into chains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchStrategy {
    Identifier,
    Positional,
}

/// Segments forming one logical run, oldest first
#[derive(Debug, Clone)]
struct Chain {
    metadata: Metadata,
    segments: Vec<Arc<TimeSeries>>,
}

/// Pick the strategy the available identifiers support
pub fn choose_strategy(records: &[CalculationRecord]) -> StitchStrategy {
    let all_identified = records.iter().all(|r| r.metadata.run_id().is_some());
    let any_restarted = records
        .iter()
        .any(|r| r.metadata.restart.predecessor().is_some());
    if all_identified && any_restarted {
        StitchStrategy::Identifier
    } else {
        StitchStrategy::Positional
    }
}

/// Merge restarted segments into one record per run chain
///
/// `sources` names the inputs for the error raised when `records` is empty.
pub fn stitch_runs<S: AsRef<str>>(
    records: Vec<CalculationRecord>,
    sources: &[S],
) -> Result<Vec<CalculationRecord>> {
    if records.is_empty() {
        return Err(Error::data_absence(sources));
    }

    let strategy = choose_strategy(&records);
    let chains = match strategy {
        StitchStrategy::Identifier => chain_by_identifier(records),
        StitchStrategy::Positional => chain_by_position(records),
    };
    tracing::debug!(?strategy, chains = chains.len(), "grouped calculations into run chains");

    chains
        .into_iter()
        .map(|chain| {
            let segments: Vec<&TimeSeries> = chain.segments.iter().map(Arc::as_ref).collect();
            let series = TimeSeries::stitch(&segments)?;
            Ok(CalculationRecord::new(chain.metadata, series))
        })
        .collect()
}

fn chain_by_identifier(records: Vec<CalculationRecord>) -> Vec<Chain> {
    let mut remaining = records;
    let mut chains = Vec::new();

    while !remaining.is_empty() {
        // Most recent segment: nobody was restarted from it.
        let terminal = remaining
            .iter()
            .position(|candidate| {
                let id = candidate.metadata.run_id();
                !remaining
                    .iter()
                    .any(|other| other.metadata.restart.predecessor() == id)
            })
            .unwrap_or_else(|| {
                tracing::debug!("restart identifiers form a cycle; taking the last record");
                remaining.len() - 1
            });

        let newest = remaining.remove(terminal);
        let metadata = newest.metadata.clone();
        let mut segments = vec![newest];
        while let Some(predecessor) = segments
            .last()
            .and_then(|s| s.metadata.restart.predecessor())
            .map(str::to_owned)
        {
            match remaining
                .iter()
                .position(|r| r.metadata.run_id() == Some(predecessor.as_str()))
            {
                Some(index) => segments.push(remaining.remove(index)),
                None => break,
            }
        }

        segments.reverse();
        chains.push(Chain {
            metadata,
            segments: segments.into_iter().map(|s| s.series).collect(),
        });
    }

    chains
}

fn continues(previous: &CalculationRecord, next: &CalculationRecord) -> bool {
    if previous.metadata.calc_type != next.metadata.calc_type {
        return false;
    }
    match (
        previous.series.iteration_step(),
        previous.series.last_iteration(),
        next.series.first_iteration(),
        next.series.iteration_step(),
    ) {
        (Some(step), Some(last), Some(first), Some(own_step)) => {
            first == last + step && own_step == step
        }
        _ => false,
    }
}

fn chain_by_position(records: Vec<CalculationRecord>) -> Vec<Chain> {
    let mut chains: Vec<Chain> = Vec::new();
    let mut previous: Option<CalculationRecord> = None;

    for record in records {
        match (&previous, chains.last_mut()) {
            (Some(prev), Some(chain)) if continues(prev, &record) => {
                chain.segments.push(Arc::clone(&record.series));
            }
            _ => chains.push(Chain {
                metadata: record.metadata.clone(),
                segments: vec![Arc::clone(&record.series)],
            }),
        }
        previous = Some(record);
    }

    chains
}

#[cfg(test)]
mod tests {
    use super::*;
    use reblock_core::CalcType;

    fn segment(calc_type: CalcType, iterations: std::ops::Range<i64>, step: i64) -> CalculationRecord {
        let its: Vec<i64> = iterations.step_by(step as usize).collect();
        let values: Vec<f64> = its.iter().map(|&i| i as f64).collect();
        let series = TimeSeries::new(its, values.clone(), values.clone(), values).unwrap();
        CalculationRecord::new(Metadata::new(calc_type), series)
    }

    #[test]
    fn test_strategy_choice() {
        let a = segment(CalcType::Ccmc, 0..10, 1);
        let b = segment(CalcType::Ccmc, 10..20, 1);
        assert_eq!(choose_strategy(&[a.clone(), b.clone()]), StitchStrategy::Positional);

        let mut a_id = a.clone();
        a_id.metadata = a_id.metadata.with_uuid("A");
        let mut b_id = b.clone();
        b_id.metadata = b_id.metadata.with_uuid("B");
        assert_eq!(choose_strategy(&[a_id.clone(), b_id.clone()]), StitchStrategy::Positional);

        b_id.metadata = b_id.metadata.with_restart("A");
        assert_eq!(choose_strategy(&[a_id.clone(), b_id.clone()]), StitchStrategy::Identifier);

        // One unidentified record disables identifier chaining
        assert_eq!(choose_strategy(&[a, b_id]), StitchStrategy::Positional);
    }

    #[test]
    fn test_positional_merges_contiguous_segments() {
        let records = vec![
            segment(CalcType::Fciqmc, 10..110, 10),
            segment(CalcType::Fciqmc, 110..210, 10),
        ];
        let stitched = stitch_runs(records, &["calc.out"]).unwrap();
        assert_eq!(stitched.len(), 1);
        assert_eq!(stitched[0].series.len(), 20);
    }

    #[test]
    fn test_positional_breaks_on_gap_type_or_step() {
        let gap = vec![
            segment(CalcType::Fciqmc, 10..110, 10),
            segment(CalcType::Fciqmc, 120..220, 10),
        ];
        assert_eq!(stitch_runs(gap, &["x"]).unwrap().len(), 2);

        let other_type = vec![
            segment(CalcType::Fciqmc, 10..110, 10),
            segment(CalcType::Ccmc, 110..210, 10),
        ];
        assert_eq!(stitch_runs(other_type, &["x"]).unwrap().len(), 2);

        let other_step = vec![
            segment(CalcType::Fciqmc, 10..110, 10),
            segment(CalcType::Fciqmc, 110..210, 5),
        ];
        assert_eq!(stitch_runs(other_step, &["x"]).unwrap().len(), 2);
    }

    #[test]
    fn test_single_row_segment_starts_new_chain() {
        let records = vec![
            segment(CalcType::Fciqmc, 10..20, 10),
            segment(CalcType::Fciqmc, 20..30, 10),
        ];
        assert_eq!(stitch_runs(records, &["x"]).unwrap().len(), 2);
    }

    #[test]
    fn test_identifier_chain_metadata_is_newest_segment() {
        let mut a = segment(CalcType::Ccmc, 1..51, 1);
        a.metadata = a.metadata.with_uuid("A");
        let mut b = segment(CalcType::Ccmc, 51..101, 1);
        b.metadata = b.metadata.with_uuid("B").with_restart("A");
        let mut c = segment(CalcType::Ccmc, 101..151, 1);
        c.metadata = c.metadata.with_uuid("C").with_restart("B");

        // Out of order on input
        let stitched = stitch_runs(vec![b, c, a], &["x"]).unwrap();
        assert_eq!(stitched.len(), 1);
        assert_eq!(stitched[0].metadata.run_id(), Some("C"));
        let expected: Vec<i64> = (1..151).collect();
        assert_eq!(stitched[0].series.iterations(), expected.as_slice());
    }

    #[test]
    fn test_identifier_cycle_terminates() {
        let mut a = segment(CalcType::Ccmc, 1..11, 1);
        a.metadata = a.metadata.with_uuid("A").with_restart("B");
        let mut b = segment(CalcType::Ccmc, 11..21, 1);
        b.metadata = b.metadata.with_uuid("B").with_restart("A");
        let stitched = stitch_runs(vec![a, b], &["x"]).unwrap();
        assert_eq!(stitched.len(), 1);
        assert_eq!(stitched[0].series.len(), 20);
    }

    #[test]
    fn test_empty_input_names_sources() {
        let err = stitch_runs(Vec::new(), &["a.out", "b.out"]).unwrap_err();
        assert_eq!(err.to_string(), "No data found in a.out b.out");
    }
}
