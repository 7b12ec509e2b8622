//! Statistic records maintained during execution.
//!
//! [`ColumnStatistic`] holds per-column state: min/max bounds, the distinct-value set, and a
//! set of finality flags. A final field is known exactly from a predicate rather than
//! estimated from observed rows, and is immutable from then on. [`PairStatistic`] holds the
//! combined-key set for one unordered pair of output columns.

use std::collections::HashSet;

use anyhow::ensure;
use datafusion_common::ScalarValue;
use derive_more::Display;
use enum_as_inner::EnumAsInner;
use enumset::{EnumSet, EnumSetType};
use strum_macros::AsRefStr;

use crate::error::PiggybackResult;

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Display)]
pub struct TableId(pub u32);

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Display)]
pub struct ColumnId(pub u32);

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Display)]
pub struct OperatorId(pub u32);

/// Provenance of an output column: the table it was read from and the 0-based column
/// ordinal within that table. Immutable once created.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Display)]
#[display(fmt = "{}.{}", table, column)]
pub struct ColumnDescriptor {
    pub table: TableId,
    pub column: ColumnId,
}

impl ColumnDescriptor {
    pub fn new(table: TableId, column: ColumnId) -> Self {
        Self { table, column }
    }
}

/// Coarse classification of a column's declared type, fixed at arm time.
#[derive(Copy, Clone, Debug, Eq, PartialEq, AsRefStr)]
pub enum TypeTag {
    Numeric,
    Text,
    Other,
}

impl TypeTag {
    pub fn of(data_type: &arrow_schema::DataType) -> Self {
        use arrow_schema::DataType;
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => TypeTag::Numeric,
            DataType::Utf8 | DataType::LargeUtf8 => TypeTag::Text,
            _ => TypeTag::Other,
        }
    }
}

/// Fields of a [`ColumnStatistic`] that can become final. The flags are only ever set
/// together, by the equality short-circuit path; accumulation never sets them.
#[derive(EnumSetType, Debug)]
pub enum FinalStat {
    Min,
    Max,
    MostFrequent,
    DistinctCount,
}

/// A value used purely for set membership. Numeric and text values encode differently, so
/// the integer 3 and the text "3" are distinct keys.
#[derive(Clone, Debug, Hash, Eq, PartialEq, EnumAsInner)]
pub enum ScalarKey {
    Integer(i64),
    Text(String),
}

/// Statistics of one output column.
///
/// Created when the collector is armed, mutated once per produced row while not final, and
/// read-only after execution ends. Min/max replacement hands ownership of the new scalar to
/// the statistic; the previous value drops on assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnStatistic {
    name: String,
    descriptor: Option<ColumnDescriptor>,
    declared_type: TypeTag,
    is_numeric: bool,
    min_value: Option<ScalarValue>,
    max_value: Option<ScalarValue>,
    most_frequent_value: Option<ScalarValue>,
    final_fields: EnumSet<FinalStat>,
    /// Present only while the distinct count is not final.
    distinct_values: Option<HashSet<ScalarKey>>,
}

impl ColumnStatistic {
    pub fn new(
        name: String,
        descriptor: Option<ColumnDescriptor>,
        declared_type: TypeTag,
    ) -> Self {
        Self {
            name,
            descriptor,
            declared_type,
            is_numeric: false,
            min_value: None,
            max_value: None,
            most_frequent_value: None,
            final_fields: EnumSet::empty(),
            distinct_values: Some(HashSet::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> Option<ColumnDescriptor> {
        self.descriptor
    }

    pub fn declared_type(&self) -> TypeTag {
        self.declared_type
    }

    pub fn is_numeric(&self) -> bool {
        self.is_numeric
    }

    pub fn min_value(&self) -> Option<&ScalarValue> {
        self.min_value.as_ref()
    }

    pub fn max_value(&self) -> Option<&ScalarValue> {
        self.max_value.as_ref()
    }

    pub fn most_frequent_value(&self) -> Option<&ScalarValue> {
        self.most_frequent_value.as_ref()
    }

    pub fn min_is_final(&self) -> bool {
        self.final_fields.contains(FinalStat::Min)
    }

    pub fn max_is_final(&self) -> bool {
        self.final_fields.contains(FinalStat::Max)
    }

    pub fn most_frequent_is_final(&self) -> bool {
        self.final_fields.contains(FinalStat::MostFrequent)
    }

    pub fn distinct_count_is_final(&self) -> bool {
        self.final_fields.contains(FinalStat::DistinctCount)
    }

    /// Cardinality of the observed distinct-value set, or `None` once the count is final.
    pub fn distinct_count(&self) -> Option<usize> {
        self.distinct_values.as_ref().map(HashSet::len)
    }

    pub fn distinct_values(&self) -> Option<&HashSet<ScalarKey>> {
        self.distinct_values.as_ref()
    }

    /// Replace the minimum. Refuses the write when the minimum is final.
    pub fn set_min(&mut self, value: ScalarValue) -> PiggybackResult<()> {
        ensure!(
            !self.min_is_final(),
            "min of column {} is final and must not be overwritten",
            self.name
        );
        self.min_value = Some(value);
        Ok(())
    }

    /// Replace the maximum. Refuses the write when the maximum is final.
    pub fn set_max(&mut self, value: ScalarValue) -> PiggybackResult<()> {
        ensure!(
            !self.max_is_final(),
            "max of column {} is final and must not be overwritten",
            self.name
        );
        self.max_value = Some(value);
        Ok(())
    }

    pub(crate) fn set_is_numeric(&mut self, is_numeric: bool) {
        self.is_numeric = is_numeric;
    }

    pub(crate) fn observe_distinct(&mut self, key: ScalarKey) {
        if let Some(values) = self.distinct_values.as_mut() {
            values.insert(key);
        }
    }

    /// Pin every statistic of this column to a single exact value and mark all fields
    /// final. The distinct-value set is dropped since the count is now known.
    pub(crate) fn pin_exact(&mut self, value: ScalarValue) {
        self.min_value = Some(value.clone());
        self.max_value = Some(value.clone());
        self.most_frequent_value = Some(value);
        self.is_numeric = true;
        self.final_fields = EnumSet::all();
        self.distinct_values = None;
    }

    /// Clear everything accumulated from observed rows. Final fields survive.
    pub(crate) fn reset_observed(&mut self) {
        if !self.min_is_final() {
            self.min_value = None;
        }
        if !self.max_is_final() {
            self.max_value = None;
        }
        if !self.most_frequent_is_final() {
            self.most_frequent_value = None;
        }
        if !self.distinct_count_is_final() {
            if let Some(values) = self.distinct_values.as_mut() {
                values.clear();
            }
        }
        if self.final_fields.is_empty() {
            self.is_numeric = false;
        }
    }
}

/// Co-occurrence statistics of one unordered pair of output columns.
///
/// Grows monotonically during execution; read-only afterwards. The combined keys are
/// consumed by downstream functional-dependency analysis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PairStatistic {
    distinct_values: HashSet<String>,
}

impl PairStatistic {
    pub fn distinct_count(&self) -> usize {
        self.distinct_values.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.distinct_values.contains(key)
    }

    pub fn distinct_values(&self) -> &HashSet<String> {
        &self.distinct_values
    }

    pub(crate) fn insert(&mut self, key: String) {
        self.distinct_values.insert(key);
    }

    pub(crate) fn clear(&mut self) {
        self.distinct_values.clear();
    }
}
