//! Reconciliation engine.
//!
//! One pass compares the declared tables with what the registry holds and
//! creates the missing ones. The pass is additive-only: tables that are no
//! longer declared are reported as `extra` and left alone.
//!
//! Creations run concurrently, bounded by a semaphore, and every outcome is
//! collected before the pass returns. A failed table never aborts the pass.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::admin::TableAdmin;
use crate::config::{DEFAULT_MAX_CONCURRENCY, DEFAULT_SETTLE_MS};
use crate::differ::diff;
use crate::errors::{Error, Result};
use crate::source::{Declarations, RejectedTable};
use crate::types::{TableDefinition, TableStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOptions {
    /// Pause between the last creation and the final listing.
    pub settle_delay: Duration,
    /// Creations in flight at once. Zero is treated as one.
    pub max_concurrency: usize,
    /// Upper bound for a single creation.
    pub create_timeout: Option<Duration>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_MS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            create_timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFailure {
    pub table_name: String,
    pub error: String,
}

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub declared: Vec<String>,
    pub current: Vec<String>,
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    pub created: Vec<String>,
    /// Missing at listing time but created by someone else first.
    pub skipped: Vec<String>,
    pub failed: Vec<TableFailure>,
    /// Reported created but absent from the final listing.
    pub unverified: Vec<String>,
    pub final_tables: Vec<String>,
}

impl ReconcileReport {
    /// Every declared table is present in the final listing.
    pub fn is_converged(&self) -> bool {
        self.declared
            .iter()
            .all(|name| self.final_tables.contains(name))
    }
}

enum Outcome {
    Created,
    Skipped,
    Failed(String),
}

pub struct Reconciler {
    admin: Arc<dyn TableAdmin>,
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(admin: Arc<dyn TableAdmin>, options: ReconcileOptions) -> Self {
        Self { admin, options }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Run one pass.
    ///
    /// Only a failure to list the registry is returned as an error; per-table
    /// problems end up in the report.
    pub async fn reconcile(&self, declared: &[TableDefinition]) -> Result<ReconcileReport> {
        self.run(declared, &[]).await
    }

    /// Run one pass over loaded declarations. Tables the source could not
    /// decode count as declared and are reported as failed.
    pub async fn reconcile_declarations(
        &self,
        declarations: &Declarations,
    ) -> Result<ReconcileReport> {
        self.run(&declarations.tables, &declarations.rejected).await
    }

    async fn run(
        &self,
        declared: &[TableDefinition],
        rejected: &[RejectedTable],
    ) -> Result<ReconcileReport> {
        let declared_names: Vec<String> = declared
            .iter()
            .map(|t| t.table_name.clone())
            .chain(rejected.iter().map(|r| r.table_name.clone()))
            .collect();
        info!(tables = ?declared_names, "tables in config");

        let current = self.admin.list_tables().await?;
        info!(tables = ?current, "current tables");

        let table_diff = diff(declared, &current);
        let missing = table_diff.missing_names();
        info!(tables = ?missing, "missing tables");

        let mut report = ReconcileReport {
            declared: declared_names,
            current,
            missing,
            extra: table_diff.extra,
            ..ReconcileReport::default()
        };

        for entry in rejected {
            warn!(table = %entry.table_name, error = %entry.error, "invalid table declaration");
            report.failed.push(TableFailure {
                table_name: entry.table_name.clone(),
                error: entry.error.clone(),
            });
        }

        let outcomes = self.create_all(table_diff.missing).await;
        for (name, outcome) in outcomes {
            match outcome {
                Outcome::Created => report.created.push(name),
                Outcome::Skipped => {
                    debug!(table = %name, "table created concurrently, skipping");
                    report.skipped.push(name);
                }
                Outcome::Failed(error) => {
                    warn!(table = %name, error = %error, "failed to create table");
                    report.failed.push(TableFailure {
                        table_name: name,
                        error,
                    });
                }
            }
        }

        if !self.options.settle_delay.is_zero() {
            tokio::time::sleep(self.options.settle_delay).await;
        }

        let final_tables = self.admin.list_tables().await?;
        info!(tables = ?final_tables, "final tables");

        report.unverified = report
            .created
            .iter()
            .filter(|name| !final_tables.contains(name))
            .cloned()
            .collect();
        if !report.unverified.is_empty() {
            warn!(tables = ?report.unverified, "created tables missing from final listing");
        }
        report.final_tables = final_tables;

        Ok(report)
    }

    /// Create every table, returning outcomes in the order given.
    async fn create_all(&self, tables: Vec<TableDefinition>) -> Vec<(String, Outcome)> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut join_set = JoinSet::new();
        let mut outcomes: Vec<(String, Option<Outcome>)> = Vec::with_capacity(tables.len());

        for (index, definition) in tables.into_iter().enumerate() {
            outcomes.push((definition.table_name.clone(), None));

            let admin = Arc::clone(&self.admin);
            let semaphore = Arc::clone(&semaphore);
            let create_timeout = self.options.create_timeout;
            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, Outcome::Failed("creation cancelled".to_string()));
                };
                let result = create_one(admin.as_ref(), &definition, create_timeout).await;
                (index, classify(result))
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index].1 = Some(outcome),
                Err(err) => warn!(error = %err, "table creation task failed"),
            }
        }

        outcomes
            .into_iter()
            .map(|(name, outcome)| {
                let outcome = outcome
                    .unwrap_or_else(|| Outcome::Failed("creation did not complete".to_string()));
                (name, outcome)
            })
            .collect()
    }
}

async fn create_one(
    admin: &dyn TableAdmin,
    definition: &TableDefinition,
    create_timeout: Option<Duration>,
) -> Result<TableStatus> {
    match create_timeout {
        None => admin.create_table(definition).await,
        Some(after) => tokio::time::timeout(after, admin.create_table(definition))
            .await
            .map_err(|_| Error::Timeout {
                table_name: definition.table_name.clone(),
                after,
            })?,
    }
}

fn classify(result: Result<TableStatus>) -> Outcome {
    match result {
        Ok(_) => Outcome::Created,
        Err(Error::AlreadyExists(_)) => Outcome::Skipped,
        Err(e) => Outcome::Failed(e.to_string()),
    }
}
