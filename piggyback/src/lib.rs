//! ## Background
//!
//! Maintaining table and result statistics normally requires dedicated scans, which compete
//! with regular query processing for I/O and cache. Piggyback collection takes the opposite
//! approach: the executor is producing result rows anyway, so the collector observes each row
//! as it flows through the root operator and derives statistics as a side effect, at the cost
//! of some per-row CPU work and no extra I/O.
//!
//! Per output column the collector maintains numeric min/max bounds and a distinct-value set.
//! For every unordered pair of output columns it additionally maintains a set of combined
//! value keys; the cardinalities of those sets feed downstream functional-dependency
//! discovery, which is not part of this crate.
//!
//! A second trick avoids work entirely: when a scan carries an equality filter such as
//! `qty = 3`, every surviving row has the same value in that column, so its statistics are
//! known exactly before the first row is produced. Such columns are pinned up front and
//! skipped during accumulation.
//!
//! ## Design
//!
//! * [`stat`] Statistic records: per-column and per-column-pair.
//! * [`shortcircuit`] Equality-predicate recognition and statistic pinning.
//! * [`accumulate`] Per-row accumulation of typed values into column statistics.
//! * [`pairwise`] Pairwise co-occurrence keys over a row's slot values.
//! * [`context`] Collector lifecycle and the entry points called by the host engine.
//! * [`report`] Textual summary emitted at the end of execution.
//!
//! The host engine drives the collector through four call sites on
//! [`context::StatisticsContext`]: `arm` once the result-producing root operator is known,
//! `on_scan_initialized` for every scan-type operator during plan initialization,
//! `on_row_produced` for every row the root operator yields, and `finalize` at plan teardown.

#[macro_use]
extern crate lazy_static;

pub mod accumulate;
pub mod context;
pub mod error;
pub mod pairwise;
pub mod report;
pub mod shortcircuit;
pub mod stat;

#[cfg(test)]
mod test_utils;
