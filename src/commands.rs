//! `start` and `watch` commands.
//!
//! Both bring up the registry server and reconcile the declared tables
//! through the AWS SDK against it. `watch` also keeps a watch loop running
//! on the declaration source.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::info;

use crate::admin::SdkTableAdmin;
use crate::client::{build_client, ping};
use crate::config::Config;
use crate::errors::Result;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::registry::TableRegistry;
use crate::server::RegistryServer;
use crate::source::TableSource;
use crate::watch::{ChangeSource, WatchLoop};

/// Everything a running command owns.
pub struct Session {
    server: RegistryServer,
    reconciler: Arc<Reconciler>,
    watch: Option<WatchLoop>,
    initial_report: ReconcileReport,
}

impl Session {
    pub fn endpoint_url(&self) -> String {
        self.server.endpoint_url()
    }

    pub fn registry(&self) -> &Arc<TableRegistry> {
        self.server.registry()
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    pub fn watch_loop(&self) -> Option<&WatchLoop> {
        self.watch.as_ref()
    }

    /// Report of the pass run at startup.
    pub fn initial_report(&self) -> &ReconcileReport {
        &self.initial_report
    }

    /// Stop the watch loop (if any), then the server.
    pub async fn shutdown(mut self) {
        if let Some(mut watch) = self.watch.take() {
            watch.stop().await;
        }
        self.server.shutdown().await;
    }
}

/// Bind the registry, then create every declared table that is missing.
///
/// Nothing is reconciled when the registry cannot be bound. A source that
/// cannot be read is fatal here.
pub async fn start(config: &Config, source: Arc<dyn TableSource>) -> Result<Session> {
    let registry = Arc::new(TableRegistry::new(config.registry_options()));
    let server = RegistryServer::start(&config.host, config.port, registry).await?;

    match initial_pass(config, &server, source.as_ref()).await {
        Ok((reconciler, initial_report)) => Ok(Session {
            server,
            reconciler,
            watch: None,
            initial_report,
        }),
        Err(e) => {
            server.shutdown().await;
            Err(e)
        }
    }
}

/// Like [`start`], then keep watching `changes` for declaration updates.
pub async fn watch<S: ChangeSource>(
    config: &Config,
    source: Arc<dyn TableSource>,
    changes: S,
) -> Result<Session> {
    let mut session = start(config, Arc::clone(&source)).await?;

    let mut watch_loop = WatchLoop::new(Arc::clone(&session.reconciler), source);
    watch_loop.start(changes);
    session.watch = Some(watch_loop);
    Ok(session)
}

async fn initial_pass(
    config: &Config,
    server: &RegistryServer,
    source: &dyn TableSource,
) -> Result<(Arc<Reconciler>, ReconcileReport)> {
    let endpoint_url = server.endpoint_url();
    let client = build_client(&endpoint_url, Some(&config.region)).await;
    ping(&client, &endpoint_url).await?;

    let reconciler = Arc::new(Reconciler::new(
        Arc::new(SdkTableAdmin::new(client)),
        config.reconcile_options(),
    ));

    let declarations = source.load().await?;
    info!(
        source = %source.label(),
        tables = declarations.tables.len(),
        rejected = declarations.rejected.len(),
        "loaded declarations"
    );
    let report = reconciler.reconcile_declarations(&declarations).await?;
    Ok((reconciler, report))
}

/// Human-readable summary of a pass.
pub fn format_report(report: &ReconcileReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Tables in config: {}", list(&report.declared));
    let _ = writeln!(out, "Current tables:   {}", list(&report.current));
    let _ = writeln!(out, "Missing tables:   {}", list(&report.missing));
    let _ = writeln!(out, "Created:          {}", list(&report.created));
    if !report.skipped.is_empty() {
        let _ = writeln!(out, "Already present:  {}", list(&report.skipped));
    }
    for failure in &report.failed {
        let _ = writeln!(out, "Failed:           {} ({})", failure.table_name, failure.error);
    }
    if !report.extra.is_empty() {
        let _ = writeln!(out, "Not declared:     {}", list(&report.extra));
    }
    let _ = write!(out, "Final tables:     {}", list(&report.final_tables));
    out
}

fn list(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::TableFailure;

    #[test]
    fn test_format_report() {
        let report = ReconcileReport {
            declared: vec!["Users".into(), "Broken".into()],
            missing: vec!["Users".into(), "Broken".into()],
            created: vec!["Users".into()],
            failed: vec![TableFailure {
                table_name: "Broken".into(),
                error: "bad key".into(),
            }],
            final_tables: vec!["Users".into()],
            ..ReconcileReport::default()
        };

        let text = format_report(&report);
        assert!(text.contains("Tables in config: Users, Broken"));
        assert!(text.contains("Current tables:   -"));
        assert!(text.contains("Failed:           Broken (bad key)"));
        assert!(text.ends_with("Final tables:     Users"));
        assert!(!text.contains("Not declared"));
    }
}
