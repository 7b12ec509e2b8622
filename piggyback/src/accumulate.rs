//! Per-row accumulation of typed values into column statistics.
//!
//! Called synchronously for every row the armed root operator yields; accumulation
//! completes before the next row is requested. Besides updating the per-column
//! statistics, each call fills the row's slot values: the textual form of every column
//! value, used by [`crate::pairwise`] to build co-occurrence keys. Null and unsupported
//! values contribute an empty slot.

use anyhow::ensure;
use datafusion_common::ScalarValue;
use smallvec::SmallVec;

use crate::error::PiggybackResult;
use crate::stat::{ColumnStatistic, ScalarKey};

/// Reusable per-row buffer of slot values, one per output column.
pub type SlotBuffer = SmallVec<[String; 8]>;

/// Fold one produced row into the column statistics and fill `slots` with the row's
/// textual slot values. The row must match the armed output arity.
pub fn accumulate(
    row: &[ScalarValue],
    stats: &mut [ColumnStatistic],
    slots: &mut SlotBuffer,
) -> PiggybackResult<()> {
    ensure!(
        row.len() == stats.len(),
        "row arity {} does not match armed output arity {}",
        row.len(),
        stats.len()
    );

    slots.clear();
    for (value, stat) in row.iter().zip(stats.iter_mut()) {
        slots.push(observe(value, stat)?);
    }
    Ok(())
}

fn observe(value: &ScalarValue, stat: &mut ColumnStatistic) -> PiggybackResult<String> {
    if value.is_null() {
        return Ok(String::new());
    }

    match value {
        ScalarValue::Int8(Some(v)) => observe_integer(*v as i64, stat),
        ScalarValue::Int16(Some(v)) => observe_integer(*v as i64, stat),
        ScalarValue::Int32(Some(v)) => observe_integer(*v as i64, stat),
        ScalarValue::Int64(Some(v)) => observe_integer(*v, stat),
        // Decimals only contribute a slot value, truncated to the integer part.
        ScalarValue::Decimal128(Some(v), _, scale) => Ok(decimal_slot_value(*v, *scale)),
        ScalarValue::Utf8(Some(text)) | ScalarValue::LargeUtf8(Some(text)) => {
            observe_text(text, stat)
        }
        _ => Ok(String::new()),
    }
}

fn observe_integer(value: i64, stat: &mut ColumnStatistic) -> PiggybackResult<String> {
    stat.set_is_numeric(true);

    // Strict comparisons only: a value equal to the stored extreme never replaces it.
    if !stat.min_is_final() {
        let is_new_min = match stored_i64(stat.min_value()) {
            Some(current) => value < current,
            None => true,
        };
        if is_new_min {
            stat.set_min(ScalarValue::Int64(Some(value)))?;
        }
    }
    if !stat.max_is_final() {
        let is_new_max = match stored_i64(stat.max_value()) {
            Some(current) => value > current,
            None => true,
        };
        if is_new_max {
            stat.set_max(ScalarValue::Int64(Some(value)))?;
        }
    }
    if !stat.distinct_count_is_final() {
        stat.observe_distinct(ScalarKey::Integer(value));
    }

    Ok(value.to_string())
}

fn observe_text(text: &str, stat: &mut ColumnStatistic) -> PiggybackResult<String> {
    stat.set_is_numeric(false);
    if !stat.distinct_count_is_final() {
        stat.observe_distinct(ScalarKey::Text(text.to_string()));
    }
    Ok(text.to_string())
}

fn stored_i64(value: Option<&ScalarValue>) -> Option<i64> {
    match value {
        Some(ScalarValue::Int64(Some(v))) => Some(*v),
        _ => None,
    }
}

fn decimal_slot_value(raw: i128, scale: i8) -> String {
    let truncated = if scale > 0 {
        raw / 10i128.pow(scale as u32)
    } else {
        raw.saturating_mul(10i128.pow(scale.unsigned_abs() as u32))
    };
    truncated.to_string()
}
