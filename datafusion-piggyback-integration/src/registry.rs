//! Host-side mapping from table names to stable numeric ids and schemas.

use std::collections::HashMap;
use std::sync::Arc;

use arrow_schema::Schema;
use piggyback::stat::{ColumnDescriptor, ColumnId, TableId};

/// Assigns each registered table a stable [`TableId`] and remembers its schema, so column
/// references can be resolved to the collector's provenance descriptors.
#[derive(Default)]
pub struct TableRegistry {
    tables: HashMap<String, (TableId, Arc<Schema>)>,
    next_id: u32,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every table of the map, assigning ids in name order so they are stable
    /// across runs.
    pub fn with_tables(tables: HashMap<String, Arc<Schema>>) -> Self {
        let mut registry = Self::new();
        let mut tables: Vec<(String, Arc<Schema>)> = tables.into_iter().collect();
        tables.sort_by(|left, right| left.0.cmp(&right.0));
        for (name, schema) in tables {
            registry.register(name, schema);
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, schema: Arc<Schema>) -> TableId {
        let id = TableId(self.next_id);
        self.next_id += 1;
        self.tables.insert(name.into(), (id, schema));
        id
    }

    pub fn lookup(&self, name: &str) -> Option<(TableId, &Arc<Schema>)> {
        self.tables.get(name).map(|(id, schema)| (*id, schema))
    }

    /// Resolve a (table, column) name pair to a provenance descriptor. The column id is
    /// the 0-based ordinal within the table's schema.
    pub fn column_descriptor(&self, table: &str, column: &str) -> Option<ColumnDescriptor> {
        let (table_id, schema) = self.lookup(table)?;
        let ordinal = schema
            .fields()
            .iter()
            .position(|field| field.name() == column)?;
        Some(ColumnDescriptor::new(table_id, ColumnId(ordinal as u32)))
    }
}
