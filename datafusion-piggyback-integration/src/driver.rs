//! Drives the collector alongside execution of a DataFusion dataframe.

use std::io::BufWriter;

use anyhow::Context;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::dataframe::DataFrame;
use datafusion_common::{DFSchema, ScalarValue};
use datafusion_expr::logical_plan::LogicalPlan;
use futures::StreamExt;
use log::debug;

use piggyback::context::{CollectorConfig, OutputColumn, StatisticsContext};
use piggyback::error::{DFResult, PiggybackResult};
use piggyback::stat::OperatorId;

use crate::registry::TableRegistry;

/// Mirror plan initialization over a logical plan: visit scans leaf-first, feeding their
/// qualifiers to the predicate hook, then arm the collector with the plan root's output
/// shape.
pub fn arm_from_plan(
    collector: &mut StatisticsContext,
    registry: &TableRegistry,
    plan: &LogicalPlan,
) -> PiggybackResult<()> {
    visit_scans(collector, registry, plan);

    let output = output_columns(registry, plan.schema());
    debug!("arming collector over {} output columns", output.len());
    collector.arm(OperatorId(0), output)
}

fn visit_scans(
    collector: &mut StatisticsContext,
    registry: &TableRegistry,
    plan: &LogicalPlan,
) {
    for input in plan.inputs() {
        visit_scans(collector, registry, input);
    }

    match plan {
        LogicalPlan::TableScan(scan) => {
            if let Some((table_id, schema)) = registry.lookup(scan.table_name.table()) {
                // A lone pushed-down conjunct is the scan's residual qualifier; anything
                // more complex is not a shape the collector recognizes.
                let residual = match scan.filters.as_slice() {
                    [qual] => Some(qual),
                    _ => None,
                };
                collector.on_scan_initialized(table_id, schema, residual);
            }
        }
        // Before filter pushdown runs, a scan's qualifier sits in a filter node directly
        // above it.
        LogicalPlan::Filter(filter) => {
            if let LogicalPlan::TableScan(scan) = filter.input.as_ref() {
                if let Some((table_id, schema)) = registry.lookup(scan.table_name.table())
                {
                    collector.on_scan_initialized(table_id, schema, Some(&filter.predicate));
                }
            }
        }
        _ => {}
    }
}

fn output_columns(registry: &TableRegistry, schema: &DFSchema) -> Vec<OutputColumn> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let descriptor = field
                .qualifier()
                .and_then(|qualifier| registry.column_descriptor(qualifier.table(), field.name()));
            OutputColumn::new(field.name().clone(), descriptor, field.data_type().clone())
        })
        .collect()
}

/// Feed every row of the batches into the collector's row hook.
pub fn collect_batches(
    collector: &mut StatisticsContext,
    batches: &[RecordBatch],
) -> PiggybackResult<()> {
    for batch in batches {
        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .map(|array| ScalarValue::try_from_array(array, row))
                .collect::<DFResult<Vec<ScalarValue>>>()?;
            collector.on_row_produced(&values)?;
        }
    }
    Ok(())
}

/// Execute a dataframe's query with collection enabled: arm from its logical plan, stream
/// the produced rows through the collector, and finalize. Returns the sealed collector
/// and the report text.
pub async fn run_collected(
    df: DataFrame,
    registry: &TableRegistry,
    config: CollectorConfig,
) -> PiggybackResult<(StatisticsContext, String)> {
    let mut collector = StatisticsContext::new(config);
    arm_from_plan(&mut collector, registry, df.logical_plan())?;

    let mut stream = df
        .execute_stream()
        .await
        .context("failed to start the result stream")?;
    while let Some(batch) = stream.next().await {
        let batch = batch?;
        collect_batches(&mut collector, std::slice::from_ref(&batch))?;
    }

    let mut buf = BufWriter::new(Vec::new());
    collector.finalize_into(&mut buf)?;
    let report = String::from_utf8(buf.into_inner()?)?;
    Ok((collector, report))
}
