//! In-memory table registry.
//!
//! The registry owns every [`TableRecord`] and drives the table lifecycle:
//! - `create_table` - validate, register as CREATING, activate after a delay
//! - `delete_table` - mark DELETING, remove after a delay
//! - `describe_table` - snapshot of one record
//! - `list_tables` / `list_tables_page` - sorted table names
//!
//! Mutations for one name are serialized through the `DashMap` entry API, so
//! of any number of concurrent creates for a name exactly one wins.

mod record;
mod validate;

pub use record::{LOCAL_ACCOUNT_ID, TableRecord};
pub use validate::{validate_definition, validate_name};

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::types::{ListTablesOutput, TableDefinition, TableStatus};

/// Maximum `Limit` accepted by `ListTables`.
pub const LIST_TABLES_MAX_LIMIT: i64 = 100;

/// Lifecycle timing and identity of a registry.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Time a table spends in CREATING before it becomes ACTIVE.
    pub create_table_delay: Duration,
    /// Time a table spends in DELETING before it is removed.
    pub delete_table_delay: Duration,
    /// Region used in table ARNs.
    pub region: String,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            create_table_delay: Duration::ZERO,
            delete_table_delay: Duration::ZERO,
            region: crate::config::DEFAULT_REGION.to_string(),
        }
    }
}

/// Delayed state change for one table incarnation.
#[derive(Debug, Clone, Copy)]
enum Transition {
    Activate,
    Remove,
}

impl Transition {
    fn apply(self, tables: &DashMap<String, TableRecord>, name: &str, table_id: Uuid) {
        match self {
            Transition::Activate => {
                if let Some(mut record) = tables.get_mut(name)
                    && record.table_id == table_id
                    && record.status == TableStatus::Creating
                {
                    record.status = TableStatus::Active;
                    debug!(table = name, "Table is now ACTIVE");
                }
            }
            Transition::Remove => {
                let removed = tables.remove_if(name, |_, record| {
                    record.table_id == table_id && record.status == TableStatus::Deleting
                });
                if removed.is_some() {
                    debug!(table = name, "Table removed");
                }
            }
        }
    }
}

/// In-memory store of table definitions and their lifecycle state.
#[derive(Debug)]
pub struct TableRegistry {
    tables: Arc<DashMap<String, TableRecord>>,
    options: RegistryOptions,
    timers: TaskTracker,
    cancel: CancellationToken,
}

impl TableRegistry {
    pub fn new(options: RegistryOptions) -> Self {
        Self {
            tables: Arc::new(DashMap::new()),
            options,
            timers: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn region(&self) -> &str {
        &self.options.region
    }

    /// All table names in lexicographic order. Never fails.
    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// One page of `ListTables`.
    ///
    /// Returns names strictly after `exclusive_start`, at most `limit` of
    /// them (default and maximum 100). `last_evaluated_table_name` is set
    /// when more names remain.
    pub fn list_tables_page(
        &self,
        exclusive_start: Option<&str>,
        limit: Option<i64>,
    ) -> Result<ListTablesOutput> {
        let limit = limit.unwrap_or(LIST_TABLES_MAX_LIMIT);
        if !(1..=LIST_TABLES_MAX_LIMIT).contains(&limit) {
            return Err(Error::Validation(format!(
                "1 validation error detected: Value '{}' at 'limit' failed to satisfy \
                 constraint: Member must have value between 1 and {}",
                limit, LIST_TABLES_MAX_LIMIT
            )));
        }
        if let Some(start) = exclusive_start {
            validate_name("exclusiveStartTableName", start)?;
        }

        let remaining: Vec<String> = self
            .list_tables()
            .into_iter()
            .filter(|name| exclusive_start.is_none_or(|start| name.as_str() > start))
            .collect();

        // `limit` is within 1..=100 here.
        let limit = limit as usize;
        let has_more = remaining.len() > limit;
        let table_names: Vec<String> = remaining.into_iter().take(limit).collect();
        let last_evaluated_table_name = if has_more {
            table_names.last().cloned()
        } else {
            None
        };

        Ok(ListTablesOutput {
            table_names,
            last_evaluated_table_name,
        })
    }

    /// Register a new table in CREATING state.
    ///
    /// The returned snapshot always reports CREATING; the record itself turns
    /// ACTIVE after `create_table_delay` (immediately when the delay is zero).
    pub fn create_table(&self, definition: TableDefinition) -> Result<TableRecord> {
        validate_definition(&definition)?;

        let record = match self.tables.entry(definition.table_name.clone()) {
            Entry::Occupied(existing) => {
                return Err(Error::AlreadyExists(existing.key().clone()));
            }
            Entry::Vacant(slot) => {
                let record = TableRecord::new(definition);
                slot.insert(record.clone());
                record
            }
        };

        info!(table = %record.name, table_id = %record.table_id, "Creating table");
        self.schedule(
            Transition::Activate,
            self.options.create_table_delay,
            &record.name,
            record.table_id,
        );
        Ok(record)
    }

    /// Mark a table DELETING and schedule its removal.
    pub fn delete_table(&self, name: &str) -> Result<TableRecord> {
        let record = match self.tables.get_mut(name) {
            Some(mut record) if record.status != TableStatus::Deleting => {
                record.status = TableStatus::Deleting;
                record.clone()
            }
            _ => return Err(Error::NotFound(name.to_string())),
        };

        info!(table = %record.name, table_id = %record.table_id, "Deleting table");
        self.schedule(
            Transition::Remove,
            self.options.delete_table_delay,
            &record.name,
            record.table_id,
        );
        Ok(record)
    }

    pub fn describe_table(&self, name: &str) -> Result<TableRecord> {
        self.tables
            .get(name)
            .map(|record| record.value().clone())
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Cancel pending lifecycle timers and wait for their tasks to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.timers.close();
        self.timers.wait().await;
        debug!("Registry timers stopped");
    }

    fn schedule(&self, transition: Transition, delay: Duration, name: &str, table_id: Uuid) {
        if delay.is_zero() {
            transition.apply(&self.tables, name, table_id);
            return;
        }

        let tables = Arc::clone(&self.tables);
        let cancel = self.cancel.clone();
        let name = name.to_string();
        self.timers.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(table = %name, ?transition, "Lifecycle timer cancelled");
                }
                _ = tokio::time::sleep(delay) => transition.apply(&tables, &name, table_id),
            }
        });
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new(RegistryOptions::default())
    }
}
