#![cfg(feature = "plotting")]
//! SVG rendering of the shift trace

use reblock_core::{CalcType, CalculationRecord, Diagnostics, Metadata, Observable, TimeSeries};
use reblock_equilibration::{SearchVisualizer, StartingIteration, SvgSearchVisualizer};

#[test]
fn renders_shift_trace_with_markers() {
    let n = 400i64;
    let series = TimeSeries::new(
        (1..=n).collect(),
        (0..n).map(|i| if i < 100 { 0.0 } else { -0.1 + 0.01 * (i as f64).sin() }).collect(),
        vec![10.0; n as usize],
        vec![-1.0; n as usize],
    )
    .unwrap()
    .with_column(Observable::TotalPopulation, vec![100.0; n as usize])
    .unwrap();
    let record = CalculationRecord::new(Metadata::new(CalcType::Fciqmc), series);
    let outcome = StartingIteration {
        iteration: 180,
        minimum_iteration: 150,
        candidate: 2,
        block_exponent: 4,
        candidates_evaluated: 10,
        warnings: Diagnostics::new(),
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shift.svg");
    SvgSearchVisualizer::new(&path)
        .record_outcome(&record.series, &outcome)
        .unwrap();

    let svg = std::fs::read_to_string(&path).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("starting iteration"));
    assert!(svg.contains("accepted candidate"));
}
