use arrow_schema::Schema;
use datafusion_common::ScalarValue;

use crate::context::OutputColumn;
use crate::stat::{ColumnDescriptor, ColumnId, ColumnStatistic, TableId, TypeTag};

pub const ORDERS_TABLE: TableId = TableId(1);

const ORDERS_SCHEMA_JSON: &str = r#"{
    "fields": [
        {
            "name": "id",
            "nullable": false,
            "data_type": "Int32",
            "dict_id": 0,
            "dict_is_ordered": false,
            "metadata": {}
        },
        {
            "name": "customer",
            "nullable": false,
            "data_type": "Utf8",
            "dict_id": 0,
            "dict_is_ordered": false,
            "metadata": {}
        },
        {
            "name": "quantity",
            "nullable": false,
            "data_type": "Int32",
            "dict_id": 0,
            "dict_is_ordered": false,
            "metadata": {}
        }
    ],
    "metadata": {}
}"#;

pub fn schema_from_json(json: &str) -> Schema {
    serde_json::from_str(json).unwrap()
}

pub fn orders_schema() -> Schema {
    schema_from_json(ORDERS_SCHEMA_JSON)
}

/// Output shape of `select id, customer, quantity from orders`.
pub fn orders_output() -> Vec<OutputColumn> {
    orders_schema()
        .fields()
        .iter()
        .enumerate()
        .map(|(ordinal, field)| {
            OutputColumn::new(
                field.name().clone(),
                Some(ColumnDescriptor::new(ORDERS_TABLE, ColumnId(ordinal as u32))),
                field.data_type().clone(),
            )
        })
        .collect()
}

pub fn numeric_stats(names: &[&str]) -> Vec<ColumnStatistic> {
    names
        .iter()
        .enumerate()
        .map(|(ordinal, name)| {
            ColumnStatistic::new(
                name.to_string(),
                Some(ColumnDescriptor::new(ORDERS_TABLE, ColumnId(ordinal as u32))),
                TypeTag::Numeric,
            )
        })
        .collect()
}

pub fn int32_row(values: &[Option<i32>]) -> Vec<ScalarValue> {
    values.iter().map(|v| ScalarValue::Int32(*v)).collect()
}
