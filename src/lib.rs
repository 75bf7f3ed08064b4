//! # dynox-local
//!
//! A local DynamoDB table registry that keeps a set of declared tables in
//! place.
//!
//! The registry is served over the DynamoDB JSON protocol, so the stock AWS
//! SDK can manage tables against it. Declared tables come from a serverless
//! service template; a reconcile pass creates the ones that are missing and
//! never deletes anything. `watch` repeats the pass whenever the template
//! changes.
//!
//! ## Modules
//!
//! - `registry` - in-memory table records and their lifecycle
//! - `server` - DynamoDB JSON 1.0 front end
//! - `reconcile` / `differ` - the create-missing-tables pass
//! - `watch` - change-driven reconcile loop
//! - `source` - declared-table sources (service template, static list)
//! - `admin` / `table_operations` / `client` - table administration seam and
//!   its AWS SDK implementation

pub mod admin;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod differ;
pub mod errors;
pub mod reconcile;
pub mod registry;
pub mod server;
pub mod source;
pub mod table_operations;
pub mod types;
pub mod watch;

pub use admin::{SdkTableAdmin, TableAdmin};
pub use config::Config;
pub use errors::{Error, Result};
pub use reconcile::{ReconcileOptions, ReconcileReport, Reconciler};
pub use registry::{RegistryOptions, TableRegistry};
pub use server::RegistryServer;
pub use source::{Declarations, RejectedTable, StaticTables, TableSource, TemplateFile};
pub use types::{TableDefinition, TableStatus};
pub use watch::{FilePoller, WatchLoop, WatchState};
