//! Equality-predicate recognition over scan qualifiers.
//!
//! At plan-initialization time every scan-type operator hands its residual qualifier to
//! [`recognize_equality`]. Only one shape is recognized: a lone top-level equality
//! comparison between a column reference and a literal. Such a filter pins the column to a
//! single value, so its statistics are known exactly before any row is produced and the
//! column can skip accumulation entirely. Every other predicate shape (conjunctions,
//! ranges, column-to-column comparisons) is ignored and no statistic is modified.

use std::collections::HashSet;

use arrow_schema::{DataType, Schema};
use datafusion_common::ScalarValue;
use datafusion_expr::{BinaryExpr, Expr, Operator};

use crate::stat::{ColumnDescriptor, ColumnId, ColumnStatistic, TableId};

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    /// Literal types covered by the recognized equality comparisons. Equality between
    /// other types (booleans, dates, ...) is left alone.
    static ref EQUALITY_LITERAL_TYPES: HashSet<DataType> = {
        let mut types = HashSet::new();
        types.insert(DataType::Int8);
        types.insert(DataType::Int16);
        types.insert(DataType::Int32);
        types.insert(DataType::Int64);
        types.insert(DataType::Float32);
        types.insert(DataType::Float64);
        types.insert(DataType::Utf8);
        types.insert(DataType::LargeUtf8);
        types
    };
}

/// A column pinned to a single exact value by an equality filter.
#[derive(Clone, Debug, PartialEq)]
pub struct EqualityPin {
    pub descriptor: ColumnDescriptor,
    /// The pinned value, already normalized by [`normalize_literal`].
    pub value: ScalarValue,
}

/// Inspect a scan's residual qualifier and extract an [`EqualityPin`] if it has the
/// recognized shape. The column reference is resolved against the scanned table's schema;
/// a reference to an unknown column yields `None`.
pub fn recognize_equality(
    table: TableId,
    table_schema: &Schema,
    qual: &Expr,
) -> Option<EqualityPin> {
    let (column, literal) = match qual {
        Expr::BinaryExpr(BinaryExpr {
            left,
            op: Operator::Eq,
            right,
        }) => match (left.as_ref(), right.as_ref()) {
            (Expr::Column(column), Expr::Literal(literal)) => (column, literal),
            (Expr::Literal(literal), Expr::Column(column)) => (column, literal),
            _ => return None,
        },
        _ => return None,
    };

    if literal.is_null() || !EQUALITY_LITERAL_TYPES.contains(&literal.get_datatype()) {
        return None;
    }

    let ordinal = table_schema
        .fields()
        .iter()
        .position(|field| field.name() == &column.name)?;

    Some(EqualityPin {
        descriptor: ColumnDescriptor::new(table, ColumnId(ordinal as u32)),
        value: normalize_literal(literal),
    })
}

/// Apply a pin to the statistics array. Returns `false` when no output column carries the
/// pinned descriptor, i.e. the filtered column is not part of the result set. A column
/// whose fields are already final is left untouched.
pub fn apply_pin(stats: &mut [ColumnStatistic], pin: &EqualityPin) -> bool {
    let position = stats
        .iter()
        .position(|stat| stat.descriptor() == Some(pin.descriptor));

    match position {
        Some(position) => {
            if !stats[position].distinct_count_is_final() {
                stats[position].pin_exact(pin.value.clone());
            }
            true
        }
        None => false,
    }
}

/// Numeric literals are stored in a single 64-bit integer representation regardless of
/// their original width; floats truncate. Text literals keep their native form.
fn normalize_literal(literal: &ScalarValue) -> ScalarValue {
    match literal {
        ScalarValue::Int8(Some(v)) => ScalarValue::Int64(Some(*v as i64)),
        ScalarValue::Int16(Some(v)) => ScalarValue::Int64(Some(*v as i64)),
        ScalarValue::Int32(Some(v)) => ScalarValue::Int64(Some(*v as i64)),
        ScalarValue::Float32(Some(v)) => ScalarValue::Int64(Some(*v as i64)),
        ScalarValue::Float64(Some(v)) => ScalarValue::Int64(Some(*v as i64)),
        other => other.clone(),
    }
}
