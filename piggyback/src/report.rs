//! Textual summary emitted when execution ends.

use std::io::{BufWriter, Write};

use log::debug;

use crate::error::PiggybackResult;
use crate::stat::ColumnStatistic;

/// Write one line per output column with its observed distinct count. Columns whose count
/// was pinned by an equality predicate carry a note instead of a number.
pub fn write_distinct_counts<W: Write>(
    stats: &[ColumnStatistic],
    out: &mut W,
) -> PiggybackResult<()> {
    for (position, stat) in stats.iter().enumerate() {
        match stat.distinct_count() {
            Some(count) => writeln!(
                out,
                "column {} ({}) has {} distinct values.",
                stat.name(),
                position,
                count
            )?,
            None => writeln!(
                out,
                "column {} ({}) distinct count short-circuited by equality predicate.",
                stat.name(),
                position
            )?,
        }
    }
    Ok(())
}

pub fn report_to_string(stats: &[ColumnStatistic]) -> PiggybackResult<String> {
    let mut buf = BufWriter::new(Vec::new());
    write_distinct_counts(stats, &mut buf)?;
    let bytes = buf.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

/// Fuller per-column summary on the diagnostic log.
pub fn log_summary(stats: &[ColumnStatistic], rows_seen: u64) {
    debug!("statistics collected over {} rows", rows_seen);
    for (position, stat) in stats.iter().enumerate() {
        debug!(
            "column {} ({}) declared {} numeric {} min {:?} max {:?} most frequent {:?}",
            stat.name(),
            position,
            stat.declared_type().as_ref(),
            stat.is_numeric(),
            stat.min_value(),
            stat.max_value(),
            stat.most_frequent_value(),
        );
    }
}
