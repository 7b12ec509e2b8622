//! Collector lifecycle and the entry points called by the host engine.
//!
//! One [`StatisticsContext`] exists per query execution and exclusively owns all statistic
//! storage. The host drives it through four call sites:
//!
//! 1. [`StatisticsContext::on_scan_initialized`] once per scan-type operator during plan
//!    initialization. Plans initialize leaf to root, so scans report their qualifiers
//!    before the root is known; recognized equality pins are buffered until arm time.
//! 2. [`StatisticsContext::arm`] once the result-producing root operator is identified,
//!    before any rows flow. Allocates the statistic arrays and applies buffered pins.
//! 3. [`StatisticsContext::on_row_produced`] once per row yielded by the armed root
//!    operator. Runs accumulation and pair building synchronously; the call completes
//!    before the next row is requested.
//! 4. [`StatisticsContext::finalize`] at plan teardown. Emits the report. Safe to call
//!    from abort paths and idempotent: repeated calls are no-ops.
//!
//! The collector is single-threaded and holds no locks; its state is scoped to exactly
//! one query execution. Statistic storage is released when the context is dropped, so
//! partially collected state never outlives an aborted execution.

use std::io::{self, Write};

use anyhow::bail;
use arrow_schema::{DataType, Schema};
use datafusion_common::ScalarValue;
use datafusion_expr::Expr;
use log::debug;

use crate::accumulate::{accumulate, SlotBuffer};
use crate::error::PiggybackResult;
use crate::pairwise::{build_pairs, pair_count, pair_index};
use crate::report::{log_summary, write_distinct_counts};
use crate::shortcircuit::{apply_pin, recognize_equality, EqualityPin};
use crate::stat::{
    ColumnDescriptor, ColumnStatistic, OperatorId, PairStatistic, TableId, TypeTag,
};

/// Collection policies, fixed for the lifetime of one context.
#[derive(Clone, Debug)]
pub struct CollectorConfig {
    /// Insert an unambiguous separator between the two halves of a pair key. Disabling
    /// restores legacy undelimited keys, which alias value pairs such as ("1","23") and
    /// ("12","3").
    pub delimit_pair_keys: bool,
    /// Reset accumulated statistics when the root operator is rescanned from the start.
    /// Continuing across a rescan double-counts distinct values.
    pub reset_on_rescan: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            delimit_pair_keys: true,
            reset_on_rescan: true,
        }
    }
}

/// Shape of one output column of the query result, supplied by the host at arm time in
/// the same order as the values of every produced row.
#[derive(Clone, Debug)]
pub struct OutputColumn {
    pub name: String,
    /// Provenance, when the column is read directly from a table. Computed columns have
    /// none and can never be pinned by a scan predicate.
    pub descriptor: Option<ColumnDescriptor>,
    pub data_type: DataType,
}

impl OutputColumn {
    pub fn new(
        name: impl Into<String>,
        descriptor: Option<ColumnDescriptor>,
        data_type: DataType,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor,
            data_type,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Lifecycle {
    Uninitialized,
    Armed,
    Finalized,
}

/// Owner of all statistics collected during one query execution.
pub struct StatisticsContext {
    config: CollectorConfig,
    lifecycle: Lifecycle,
    root: Option<OperatorId>,
    columns: Vec<ColumnStatistic>,
    pairs: Vec<PairStatistic>,
    slots: SlotBuffer,
    /// Pins recognized before the statistic array existed.
    pending_pins: Vec<EqualityPin>,
    scanned_tables: Vec<TableId>,
    rows_seen: u64,
}

impl Default for StatisticsContext {
    fn default() -> Self {
        Self::new(CollectorConfig::default())
    }
}

impl StatisticsContext {
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::Uninitialized,
            root: None,
            columns: vec![],
            pairs: vec![],
            slots: SlotBuffer::new(),
            pending_pins: vec![],
            scanned_tables: vec![],
            rows_seen: 0,
        }
    }

    /// Fix the result-producing root operator and the shape of its output rows.
    /// Allocates one [`ColumnStatistic`] per output column and one [`PairStatistic`] per
    /// unordered column pair, then applies any buffered equality pins.
    pub fn arm(
        &mut self,
        root: OperatorId,
        output: Vec<OutputColumn>,
    ) -> PiggybackResult<()> {
        match self.lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Armed => bail!("collector is already armed for operator {:?}", self.root),
            Lifecycle::Finalized => bail!("collector is already finalized"),
        }

        self.columns = output
            .into_iter()
            .map(|column| {
                let declared_type = TypeTag::of(&column.data_type);
                ColumnStatistic::new(column.name, column.descriptor, declared_type)
            })
            .collect();
        self.pairs = vec![PairStatistic::default(); pair_count(self.columns.len())];
        self.root = Some(root);
        self.lifecycle = Lifecycle::Armed;

        for pin in std::mem::take(&mut self.pending_pins) {
            self.pin_or_notice(&pin);
        }
        Ok(())
    }

    /// Inspect a scan-type operator's residual qualifier during plan initialization.
    /// Unrecognized predicate shapes are ignored; a recognized equality on a column that
    /// is not part of the result set only produces a diagnostic notice.
    pub fn on_scan_initialized(
        &mut self,
        table: TableId,
        table_schema: &Schema,
        residual: Option<&Expr>,
    ) {
        if self.lifecycle == Lifecycle::Finalized {
            return;
        }
        if !self.scanned_tables.contains(&table) {
            self.scanned_tables.push(table);
        }

        let pin = match residual.and_then(|qual| recognize_equality(table, table_schema, qual)) {
            Some(pin) => pin,
            None => return,
        };

        if self.lifecycle == Lifecycle::Armed {
            self.pin_or_notice(&pin);
        } else {
            self.pending_pins.push(pin);
        }
    }

    /// Fold one row produced by the armed root operator into the statistics.
    pub fn on_row_produced(&mut self, row: &[ScalarValue]) -> PiggybackResult<()> {
        match self.lifecycle {
            Lifecycle::Armed => {}
            Lifecycle::Uninitialized => bail!("row produced before the collector was armed"),
            Lifecycle::Finalized => bail!("row produced after the collector was finalized"),
        }

        accumulate(row, &mut self.columns, &mut self.slots)?;
        build_pairs(&self.slots, &mut self.pairs, self.config.delimit_pair_keys);
        self.rows_seen += 1;
        Ok(())
    }

    /// The root operator restarted row production from the beginning, typically because
    /// a parameter changed. Under the reset policy all observed state is discarded so
    /// distinct counts stay exact; pinned statistics are kept, since the predicate that
    /// pinned them still holds.
    pub fn on_root_rescanned(&mut self) {
        if self.lifecycle != Lifecycle::Armed || !self.config.reset_on_rescan {
            return;
        }
        for stat in &mut self.columns {
            stat.reset_observed();
        }
        for pair in &mut self.pairs {
            pair.clear();
        }
        self.rows_seen = 0;
    }

    /// Emit the report to the given writer and seal the context. Later calls are no-ops,
    /// which makes this safe to invoke again from error and abort paths.
    pub fn finalize_into<W: Write>(&mut self, out: &mut W) -> PiggybackResult<()> {
        match self.lifecycle {
            Lifecycle::Finalized => return Ok(()),
            Lifecycle::Uninitialized => {
                self.lifecycle = Lifecycle::Finalized;
                return Ok(());
            }
            Lifecycle::Armed => {}
        }

        write_distinct_counts(&self.columns, out)?;
        log_summary(&self.columns, self.rows_seen);
        self.lifecycle = Lifecycle::Finalized;
        Ok(())
    }

    /// [`Self::finalize_into`] writing to the standard diagnostic stream.
    pub fn finalize(&mut self) -> PiggybackResult<()> {
        self.finalize_into(&mut io::stderr())
    }

    pub fn is_armed(&self) -> bool {
        self.lifecycle == Lifecycle::Armed
    }

    pub fn is_finalized(&self) -> bool {
        self.lifecycle == Lifecycle::Finalized
    }

    pub fn root(&self) -> Option<OperatorId> {
        self.root
    }

    pub fn output_arity(&self) -> usize {
        self.columns.len()
    }

    pub fn rows_seen(&self) -> u64 {
        self.rows_seen
    }

    pub fn scanned_tables(&self) -> &[TableId] {
        &self.scanned_tables
    }

    pub fn column_statistics(&self) -> &[ColumnStatistic] {
        &self.columns
    }

    pub fn pair_statistics(&self) -> &[PairStatistic] {
        &self.pairs
    }

    /// Co-occurrence set of the column pair (from, to), from < to < arity.
    pub fn pair_between(&self, from: usize, to: usize) -> Option<&PairStatistic> {
        if from < to && to < self.columns.len() {
            self.pairs.get(pair_index(from, to, self.columns.len()))
        } else {
            None
        }
    }

    fn pin_or_notice(&mut self, pin: &EqualityPin) {
        if !apply_pin(&mut self.columns, pin) {
            // A missed optimization, not an error: the filtered column is simply not
            // part of the result set.
            debug!(
                "equality filter on column {} has no matching result column",
                pin.descriptor
            );
        }
    }
}
