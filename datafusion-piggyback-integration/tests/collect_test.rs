use std::sync::Arc;

use arrow::array::{Int32Array, StringArray};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, Schema};
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use datafusion_common::ScalarValue;
use maplit::hashmap;

use datafusion_piggyback_integration::driver::run_collected;
use datafusion_piggyback_integration::registry::TableRegistry;
use piggyback::context::CollectorConfig;

fn orders_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("customer", DataType::Utf8, false),
        Field::new("quantity", DataType::Int32, false),
    ]))
}

fn orders_batch(schema: &Arc<Schema>) -> RecordBatch {
    RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int32Array::from(vec![1, 2, 3, 4])),
            Arc::new(StringArray::from(vec!["alice", "bob", "alice", "carol"])),
            Arc::new(Int32Array::from(vec![10, 10, 20, 10])),
        ],
    )
    .unwrap()
}

fn orders_session(schema: &Arc<Schema>) -> SessionContext {
    let ctx = SessionContext::new();
    let table = MemTable::try_new(schema.clone(), vec![vec![orders_batch(schema)]]).unwrap();
    ctx.register_table("orders", Arc::new(table)).unwrap();
    ctx
}

fn orders_registry(schema: &Arc<Schema>) -> TableRegistry {
    TableRegistry::with_tables(hashmap! {
        "orders".to_string() => schema.clone(),
    })
}

#[tokio::test]
async fn test_collect_over_full_scan() {
    let schema = orders_schema();
    let ctx = orders_session(&schema);
    let registry = orders_registry(&schema);

    let df = ctx
        .sql("select id, customer, quantity from orders")
        .await
        .unwrap();
    let (collector, report) = run_collected(df, &registry, CollectorConfig::default())
        .await
        .unwrap();

    let stats = collector.column_statistics();
    assert_eq!(Some(&ScalarValue::Int64(Some(1))), stats[0].min_value());
    assert_eq!(Some(&ScalarValue::Int64(Some(4))), stats[0].max_value());
    assert_eq!(Some(4), stats[0].distinct_count());
    assert_eq!(Some(3), stats[1].distinct_count());
    assert!(!stats[1].is_numeric());
    assert_eq!(Some(&ScalarValue::Int64(Some(10))), stats[2].min_value());
    assert_eq!(Some(&ScalarValue::Int64(Some(20))), stats[2].max_value());
    assert_eq!(Some(2), stats[2].distinct_count());
    assert_eq!(4, collector.rows_seen());

    // Every id is unique, so each row contributes a fresh (id, quantity) key.
    let id_quantity = collector.pair_between(0, 2).unwrap();
    assert_eq!(4, id_quantity.distinct_count());
    assert!(id_quantity.contains("1\u{1f}10"));

    assert!(report.contains("column id (0) has 4 distinct values."));
    assert!(report.contains("column customer (1) has 3 distinct values."));
    assert!(report.contains("column quantity (2) has 2 distinct values."));
}

#[tokio::test]
async fn test_equality_filter_short_circuits_column() {
    let schema = orders_schema();
    let ctx = orders_session(&schema);
    let registry = orders_registry(&schema);

    let df = ctx
        .sql("select id, quantity from orders where quantity = 10")
        .await
        .unwrap();
    let (collector, report) = run_collected(df, &registry, CollectorConfig::default())
        .await
        .unwrap();

    let stats = collector.column_statistics();
    assert!(stats[1].min_is_final());
    assert!(stats[1].max_is_final());
    assert!(stats[1].distinct_count_is_final());
    assert_eq!(Some(&ScalarValue::Int64(Some(10))), stats[1].min_value());
    assert_eq!(Some(&ScalarValue::Int64(Some(10))), stats[1].max_value());
    assert_eq!(None, stats[1].distinct_count());

    // The id column is still observed: ids 1, 2 and 4 carry quantity 10.
    assert_eq!(Some(3), stats[0].distinct_count());
    assert_eq!(3, collector.rows_seen());

    assert!(report.contains(
        "column quantity (1) distinct count short-circuited by equality predicate."
    ));
    assert!(report.contains("column id (0) has 3 distinct values."));
}

#[tokio::test]
async fn test_range_filter_is_not_short_circuited() {
    let schema = orders_schema();
    let ctx = orders_session(&schema);
    let registry = orders_registry(&schema);

    let df = ctx
        .sql("select id, quantity from orders where quantity < 20")
        .await
        .unwrap();
    let (collector, _) = run_collected(df, &registry, CollectorConfig::default())
        .await
        .unwrap();

    let stats = collector.column_statistics();
    assert!(!stats[1].min_is_final());
    assert_eq!(Some(1), stats[1].distinct_count());
    assert_eq!(3, collector.rows_seen());
}

#[tokio::test]
async fn test_computed_column_has_no_provenance() {
    let schema = orders_schema();
    let ctx = orders_session(&schema);
    let registry = orders_registry(&schema);

    let df = ctx
        .sql("select id, quantity + 1 as bumped from orders where quantity = 10")
        .await
        .unwrap();
    let (collector, _) = run_collected(df, &registry, CollectorConfig::default())
        .await
        .unwrap();

    let stats = collector.column_statistics();
    // The pin targets the base column, which is not part of the result set; the computed
    // column keeps accumulating normally.
    assert_eq!(None, stats[1].descriptor());
    assert!(!stats[1].min_is_final());
    assert_eq!(Some(&ScalarValue::Int64(Some(11))), stats[1].min_value());
    assert_eq!(Some(1), stats[1].distinct_count());
}
