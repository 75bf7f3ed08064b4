//! `start` / `watch` end to end, with a template file on disk.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dynox_local::commands;
use dynox_local::config::{Config, Overrides, PluginSettings};
use dynox_local::watch::FilePoller;
use dynox_local::{Error, RegistryServer, TableRegistry, TableSource, TemplateFile};
use serde_json::{Value, json};

fn table(name: &str) -> Value {
    json!({
        "Type": "AWS::DynamoDB::Table",
        "Properties": {
            "TableName": name,
            "AttributeDefinitions": [{"AttributeName": "id", "AttributeType": "S"}],
            "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}],
            "BillingMode": "PAY_PER_REQUEST"
        }
    })
}

fn write_template(path: &Path, tables: &[&str]) {
    let resources: serde_json::Map<String, Value> = tables
        .iter()
        .map(|name| (format!("{name}Table"), table(name)))
        .collect();
    let template = json!({
        "service": "orders-api",
        "resources": {"Resources": resources}
    });
    std::fs::write(path, template.to_string()).unwrap();
}

fn config(path: &Path) -> Config {
    let overrides = Overrides {
        port: Some(0),
        poll_interval_ms: Some(20),
        ..Overrides::default()
    };
    Config::resolve(path.to_path_buf(), &overrides, &PluginSettings::default())
}

#[tokio::test]
async fn test_start_creates_declared_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("serverless.json");
    write_template(&path, &["Users", "Orders"]);

    let source: Arc<dyn TableSource> = Arc::new(TemplateFile::new(&path));
    let session = commands::start(&config(&path), source).await.unwrap();

    let report = session.initial_report();
    assert_eq!(report.created, vec!["Users", "Orders"]);
    assert_eq!(report.final_tables, vec!["Orders", "Users"]);
    assert!(report.is_converged());
    assert_eq!(session.registry().list_tables(), vec!["Orders", "Users"]);

    session.shutdown().await;
}

#[tokio::test]
async fn test_start_fails_when_port_is_taken() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("serverless.json");
    write_template(&path, &["Users"]);

    let occupied = RegistryServer::start("127.0.0.1", 0, Arc::new(TableRegistry::default()))
        .await
        .unwrap();
    let mut config = config(&path);
    config.port = occupied.local_addr().port();

    let source: Arc<dyn TableSource> = Arc::new(TemplateFile::new(&path));
    let err = commands::start(&config, source).await.err().unwrap();
    assert!(matches!(err, Error::RegistryUnavailable { .. }));

    // The other registry was never reconciled against.
    assert!(occupied.registry().list_tables().is_empty());
    occupied.shutdown().await;
}

#[tokio::test]
async fn test_start_fails_on_unreadable_template() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("serverless.json");
    std::fs::write(&path, "{ not json").unwrap();

    let source: Arc<dyn TableSource> = Arc::new(TemplateFile::new(&path));
    let err = commands::start(&config(&path), source).await.err().unwrap();
    assert!(matches!(err, Error::SourceUnreadable { .. }));
}

#[tokio::test]
async fn test_malformed_table_does_not_block_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("serverless.json");
    let mut broken = table("B");
    broken["Properties"]["ProvisionedThroughput"] =
        json!({"ReadCapacityUnits": "5", "WriteCapacityUnits": 5});
    let template = json!({
        "service": "orders-api",
        "resources": {"Resources": {
            "ATable": table("A"),
            "BTable": broken,
            "CTable": table("C")
        }}
    });
    std::fs::write(&path, template.to_string()).unwrap();

    let source: Arc<dyn TableSource> = Arc::new(TemplateFile::new(&path));
    let session = commands::start(&config(&path), source).await.unwrap();

    let report = session.initial_report();
    assert_eq!(report.created, vec!["A", "C"]);
    let failed: Vec<&str> = report.failed.iter().map(|f| f.table_name.as_str()).collect();
    assert_eq!(failed, vec!["B"]);
    assert!(report.failed[0].error.contains("BTable"));
    assert!(!report.is_converged());
    assert_eq!(session.registry().list_tables(), vec!["A", "C"]);

    session.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_picks_up_new_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("serverless.json");
    write_template(&path, &["Users"]);
    let config = config(&path);

    let source: Arc<dyn TableSource> = Arc::new(TemplateFile::new(&path));
    let poller = FilePoller::new(&path, config.poll_interval);
    let session = commands::watch(&config, source, poller).await.unwrap();
    let registry = Arc::clone(session.registry());
    assert_eq!(registry.list_tables(), vec!["Users"]);

    // Let the poller take its first observation.
    tokio::time::sleep(Duration::from_millis(100)).await;
    write_template(&path, &["Users", "Accounts"]);

    let converged = tokio::time::timeout(Duration::from_secs(5), async {
        while registry.list_tables() != vec!["Accounts", "Users"] {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(converged.is_ok(), "tables: {:?}", registry.list_tables());

    // Removing a declaration never deletes the table.
    write_template(&path, &["Accounts"]);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(registry.list_tables(), vec!["Accounts", "Users"]);

    session.shutdown().await;
}
