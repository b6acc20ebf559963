//! In-memory warehouse for tests.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{ErrorDetail, RowInsertError, TableRef, Warehouse};
use crate::error::{WarehouseError, WarehouseResult};

#[derive(Default)]
pub struct MemoryWarehouse {
    datasets: HashSet<(String, String)>,
    tables: HashSet<TableRef>,
    /// Tables whose inserts report an error for the given row index.
    rejects: HashMap<TableRef, u64>,
    /// Tables whose insert calls fail at the transport level.
    broken: HashSet<TableRef>,
    inserts: Mutex<Vec<(TableRef, Vec<Value>)>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: &TableRef) -> Self {
        self.datasets.insert((table.project.clone(), table.dataset.clone()));
        self.tables.insert(table.clone());
        self
    }

    pub fn with_dataset(mut self, project: &str, dataset: &str) -> Self {
        self.datasets.insert((project.to_string(), dataset.to_string()));
        self
    }

    pub fn rejecting_row(mut self, table: &TableRef, index: u64) -> Self {
        self.rejects.insert(table.clone(), index);
        self
    }

    pub fn failing_inserts(mut self, table: &TableRef) -> Self {
        self.broken.insert(table.clone());
        self
    }

    /// Every insert call made, in order.
    pub fn inserts(&self) -> Vec<(TableRef, Vec<Value>)> {
        self.inserts.lock().unwrap().clone()
    }

    pub fn rows_in(&self, table: &TableRef) -> Vec<Value> {
        self.inserts()
            .into_iter()
            .filter(|(t, _)| t == table)
            .flat_map(|(_, rows)| rows)
            .collect()
    }
}

impl Warehouse for MemoryWarehouse {
    async fn dataset_exists(&self, project: &str, dataset: &str) -> WarehouseResult<bool> {
        Ok(self.datasets.contains(&(project.to_string(), dataset.to_string())))
    }

    async fn table_exists(&self, table: &TableRef) -> WarehouseResult<bool> {
        Ok(self.tables.contains(table))
    }

    async fn insert_rows(&self, table: &TableRef, rows: &[Value]) -> WarehouseResult<Vec<RowInsertError>> {
        if self.broken.contains(table) {
            return Err(WarehouseError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        self.inserts.lock().unwrap().push((table.clone(), rows.to_vec()));

        Ok(match self.rejects.get(table) {
            Some(&index) => vec![RowInsertError {
                index,
                errors: vec![ErrorDetail {
                    reason: Some("invalid".to_string()),
                    location: Some("event_data".to_string()),
                    message: Some("no such field: event_data.bogus".to_string()),
                    ..ErrorDetail::default()
                }],
            }],
            None => Vec::new(),
        })
    }
}
