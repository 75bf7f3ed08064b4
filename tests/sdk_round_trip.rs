//! The stock AWS SDK against a live registry server.

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, TableStatus,
};
use dynox_local::client::{build_client, ping};
use dynox_local::registry::RegistryOptions;
use dynox_local::table_operations;
use dynox_local::{Error, RegistryServer, TableDefinition, TableRegistry};

async fn server(options: RegistryOptions) -> RegistryServer {
    RegistryServer::start("127.0.0.1", 0, Arc::new(TableRegistry::new(options)))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_sdk_create_list_describe_delete() {
    let server = server(RegistryOptions::default()).await;
    let client = build_client(&server.endpoint_url(), Some("localhost")).await;
    ping(&client, &server.endpoint_url()).await.unwrap();

    let created = client
        .create_table()
        .table_name("Users")
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("id")
                .attribute_type(ScalarAttributeType::S)
                .build()
                .unwrap(),
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("id")
                .key_type(KeyType::Hash)
                .build()
                .unwrap(),
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .unwrap();
    let description = created.table_description().unwrap();
    assert_eq!(description.table_name(), Some("Users"));
    assert_eq!(description.table_status(), Some(&TableStatus::Creating));

    let listed = client.list_tables().send().await.unwrap();
    assert_eq!(listed.table_names(), &["Users".to_string()]);

    let described = client
        .describe_table()
        .table_name("Users")
        .send()
        .await
        .unwrap();
    let table = described.table().unwrap();
    assert_eq!(table.table_status(), Some(&TableStatus::Active));
    assert!(table.table_arn().unwrap().ends_with(":table/Users"));

    client
        .delete_table()
        .table_name("Users")
        .send()
        .await
        .unwrap();
    let listed = client.list_tables().send().await.unwrap();
    assert!(listed.table_names().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_table_operations_map_service_errors() {
    let server = server(RegistryOptions::default()).await;
    let client = build_client(&server.endpoint_url(), None).await;
    let users = TableDefinition::with_hash_key("Users", "id");

    table_operations::create_table(&client, &users).await.unwrap();
    let err = table_operations::create_table(&client, &users)
        .await
        .unwrap_err();
    assert_eq!(err, Error::AlreadyExists("Users".to_string()));

    assert!(table_operations::table_exists(&client, "Users").await.unwrap());
    assert!(!table_operations::table_exists(&client, "Orders").await.unwrap());

    let err = table_operations::describe_table_status(&client, "Orders")
        .await
        .unwrap_err();
    assert_eq!(err, Error::NotFound("Orders".to_string()));

    server.shutdown().await;
}

#[tokio::test]
async fn test_list_follows_pagination() {
    let server = server(RegistryOptions::default()).await;
    for i in 0..105 {
        server
            .registry()
            .create_table(TableDefinition::with_hash_key(format!("Table{i:03}"), "id"))
            .unwrap();
    }
    let client = build_client(&server.endpoint_url(), None).await;

    let first_page = client.list_tables().send().await.unwrap();
    assert_eq!(first_page.table_names().len(), 100);
    assert_eq!(first_page.last_evaluated_table_name(), Some("Table099"));

    let names = table_operations::list_table_names(&client).await.unwrap();
    assert_eq!(names.len(), 105);
    assert_eq!(names.last().map(String::as_str), Some("Table104"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_wait_for_table_active() {
    let server = server(RegistryOptions {
        create_table_delay: Duration::from_millis(100),
        ..RegistryOptions::default()
    })
    .await;
    let client = build_client(&server.endpoint_url(), None).await;

    let status = table_operations::create_table(
        &client,
        &TableDefinition::with_hash_key("Users", "id"),
    )
    .await
    .unwrap();
    assert_eq!(status, dynox_local::TableStatus::Creating);

    table_operations::wait_for_table_active(&client, "Users", Duration::from_secs(5))
        .await
        .unwrap();

    server.shutdown().await;
}

#[tokio::test]
async fn test_ping_unreachable_endpoint() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = build_client(&endpoint, None).await;
    let err = ping(&client, &endpoint).await.unwrap_err();
    assert!(matches!(err, Error::RegistryUnavailable { .. }));
}
