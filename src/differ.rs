//! Declared vs. registered table comparison.

use std::collections::HashSet;

use crate::types::TableDefinition;

/// Result of comparing declared tables with registered names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDiff {
    /// Declared but not registered, in declared order.
    pub missing: Vec<TableDefinition>,
    /// Registered but not declared, in registry order. Never acted on.
    pub extra: Vec<String>,
}

impl TableDiff {
    pub fn missing_names(&self) -> Vec<String> {
        self.missing.iter().map(|t| t.table_name.clone()).collect()
    }
}

/// Compute which declared tables are missing and which registered tables are
/// not declared.
///
/// A name declared more than once is reported once, using its first
/// definition.
pub fn diff(declared: &[TableDefinition], current: &[String]) -> TableDiff {
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let declared_set: HashSet<&str> = declared.iter().map(|t| t.table_name.as_str()).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let missing = declared
        .iter()
        .filter(|t| !current_set.contains(t.table_name.as_str()))
        .filter(|t| seen.insert(t.table_name.as_str()))
        .cloned()
        .collect();

    let extra = current
        .iter()
        .filter(|name| !declared_set.contains(name.as_str()))
        .cloned()
        .collect();

    TableDiff { missing, extra }
}
