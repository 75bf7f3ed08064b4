//! Declared-table sources.
//!
//! A source provides, on demand, the list of tables that should exist. The
//! main implementation reads a serverless service template rendered as JSON
//! and picks every `AWS::DynamoDB::Table` resource, in template order.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::PluginSettings;
use crate::errors::{Error, Result};
use crate::types::TableDefinition;

/// CloudFormation resource type of a DynamoDB table.
pub const TABLE_RESOURCE_TYPE: &str = "AWS::DynamoDB::Table";

/// A declared table whose definition could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedTable {
    /// `TableName` when present, otherwise the resource's logical id.
    pub table_name: String,
    pub error: String,
}

/// Result of loading a source: usable definitions in declared order, plus
/// the tables that were declared but malformed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    pub tables: Vec<TableDefinition>,
    pub rejected: Vec<RejectedTable>,
}

impl Declarations {
    /// Names of every declared table, rejected ones last.
    pub fn names(&self) -> Vec<String> {
        self.tables
            .iter()
            .map(|t| t.table_name.clone())
            .chain(self.rejected.iter().map(|r| r.table_name.clone()))
            .collect()
    }
}

impl From<Vec<TableDefinition>> for Declarations {
    fn from(tables: Vec<TableDefinition>) -> Self {
        Self {
            tables,
            rejected: Vec::new(),
        }
    }
}

#[async_trait]
pub trait TableSource: Send + Sync {
    /// Load the current declarations.
    ///
    /// Fails only when the source as a whole cannot be read; a malformed
    /// table ends up in [`Declarations::rejected`].
    async fn load(&self) -> Result<Declarations>;

    /// Short label for logs.
    fn label(&self) -> String;
}

// ========== SERVICE TEMPLATE ==========

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceTemplate {
    #[serde(default)]
    resources: Option<TemplateResources>,
    #[serde(default)]
    custom: Option<CustomSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TemplateResources {
    #[serde(rename = "Resources", default)]
    resources: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CustomSection {
    #[serde(default)]
    dynalite: Option<PluginSettings>,
}

impl ServiceTemplate {
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("invalid template: {}", e))
    }

    /// `Properties` of every table resource, in template order.
    ///
    /// Each resource is decoded on its own, so one malformed table does not
    /// hide the others.
    pub fn table_definitions(&self) -> Declarations {
        let mut declarations = Declarations::default();
        let Some(resources) = self.resources.as_ref() else {
            return declarations;
        };

        for (logical_id, resource) in &resources.resources {
            if resource.get("Type").and_then(Value::as_str) != Some(TABLE_RESOURCE_TYPE) {
                continue;
            }
            match decode_table(resource) {
                Ok(definition) => declarations.tables.push(definition),
                Err(error) => {
                    let table_name = resource
                        .pointer("/Properties/TableName")
                        .and_then(Value::as_str)
                        .unwrap_or(logical_id)
                        .to_string();
                    warn!(resource = %logical_id, error = %error, "malformed table resource");
                    declarations.rejected.push(RejectedTable {
                        table_name,
                        error: format!("resource {}: {}", logical_id, error),
                    });
                }
            }
        }
        declarations
    }

    pub fn plugin_settings(&self) -> PluginSettings {
        self.custom
            .as_ref()
            .and_then(|c| c.dynalite.clone())
            .unwrap_or_default()
    }
}

fn decode_table(resource: &Value) -> std::result::Result<TableDefinition, String> {
    let properties = resource
        .get("Properties")
        .cloned()
        .ok_or_else(|| "no Properties".to_string())?;
    serde_json::from_value(properties).map_err(|e| e.to_string())
}

// ========== FILE SOURCE ==========

/// Template file on disk, re-read on every `load`.
#[derive(Debug, Clone)]
pub struct TemplateFile {
    path: PathBuf,
}

impl TemplateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<ServiceTemplate> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.unreadable(e.to_string()))?;
        ServiceTemplate::parse(&text).map_err(|e| self.unreadable(e))
    }

    fn unreadable(&self, message: String) -> Error {
        Error::SourceUnreadable {
            path: self.path.display().to_string(),
            message,
        }
    }
}

#[async_trait]
impl TableSource for TemplateFile {
    async fn load(&self) -> Result<Declarations> {
        Ok(self.read().await?.table_definitions())
    }

    fn label(&self) -> String {
        self.path.display().to_string()
    }
}

// ========== STATIC SOURCE ==========

/// Fixed table list.
#[derive(Debug, Clone, Default)]
pub struct StaticTables(pub Vec<TableDefinition>);

#[async_trait]
impl TableSource for StaticTables {
    async fn load(&self) -> Result<Declarations> {
        Ok(self.0.clone().into())
    }

    fn label(&self) -> String {
        "static".to_string()
    }
}
