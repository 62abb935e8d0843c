//! Selection of calculations by type

use reblock_core::{CalcType, CalculationRecord, SUPPORTED_CALC_TYPES};

/// Keep the records whose calculation type is in `accepted`, in order
///
/// An empty result is not an error here; callers that need data check.
pub fn select_calculations(
    records: Vec<CalculationRecord>,
    accepted: &[CalcType],
) -> Vec<CalculationRecord> {
    records
        .into_iter()
        .filter(|record| accepted.contains(&record.metadata.calc_type))
        .collect()
}

/// Keep the zero-temperature QMC calculations (FCIQMC, CCMC, Simple FCIQMC)
pub fn zero_temperature(records: Vec<CalculationRecord>) -> Vec<CalculationRecord> {
    select_calculations(records, &SUPPORTED_CALC_TYPES)
}
