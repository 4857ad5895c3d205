//! Row-level change notifications and the incremental cache that consumes
//! them.
//!
//! Writers publish one [`RowChange`] per inserted, updated or deleted row.
//! Consumers keep a [`RowCache`] keyed by row id and apply each change in
//! place instead of re-reading the whole table.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const TABLE_PROPERTIES: &str = "properties";
pub const TABLE_SPONSORS: &str = "sponsors";

/// Tables clients may subscribe to.
pub const SUBSCRIBABLE_TABLES: &[&str] = &[TABLE_PROPERTIES, TABLE_SPONSORS];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
    pub table: String,
    pub op: ChangeOp,
    pub id: DbId,
    /// Full row after the change; `null` for deletes.
    #[serde(default)]
    pub row: serde_json::Value,
}

impl RowChange {
    pub fn upsert<T: Serialize>(table: &str, op: ChangeOp, id: DbId, row: &T) -> Self {
        Self {
            table: table.to_string(),
            op,
            id,
            row: serde_json::to_value(row).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn delete(table: &str, id: DbId) -> Self {
        Self {
            table: table.to_string(),
            op: ChangeOp::Delete,
            id,
            row: serde_json::Value::Null,
        }
    }
}

pub fn validate_channel(table: &str) -> Result<(), CoreError> {
    if SUBSCRIBABLE_TABLES.contains(&table) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown channel '{table}'. Must be one of: {}",
            SUBSCRIBABLE_TABLES.join(", ")
        )))
    }
}

/// In-memory copy of one table, kept current by applying [`RowChange`]s.
#[derive(Debug, Clone)]
pub struct RowCache<T> {
    table: String,
    rows: BTreeMap<DbId, T>,
}

impl<T: DeserializeOwned + Clone> RowCache<T> {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            rows: BTreeMap::new(),
        }
    }

    /// Replace the whole cache (initial load).
    pub fn replace_all(&mut self, rows: impl IntoIterator<Item = (DbId, T)>) {
        self.rows = rows.into_iter().collect();
    }

    /// Apply a single change. Changes for other tables are ignored and
    /// reported as `Ok(false)`.
    pub fn apply(&mut self, change: &RowChange) -> Result<bool, CoreError> {
        if change.table != self.table {
            return Ok(false);
        }
        match change.op {
            ChangeOp::Delete => {
                self.rows.remove(&change.id);
            }
            ChangeOp::Insert | ChangeOp::Update => {
                let row: T = serde_json::from_value(change.row.clone()).map_err(|e| {
                    CoreError::Internal(format!(
                        "Malformed {} change for id {}: {e}",
                        self.table, change.id
                    ))
                })?;
                self.rows.insert(change.id, row);
            }
        }
        Ok(true)
    }

    pub fn get(&self, id: DbId) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows matching `keep`, in id order.
    pub fn filtered(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|r| keep(r)).cloned().collect()
    }
}
