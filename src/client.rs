//! DynamoDB client for the local registry.
//!
//! The reconciler talks to the registry through the regular AWS SDK, so
//! anything that works here also works for application code pointed at the
//! same endpoint.

use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::{Credentials, Region};
use tracing::debug;

use crate::errors::{Error, Result};

/// Credentials sent to the local endpoint. It never checks them, but the SDK
/// refuses to sign requests without some.
const LOCAL_ACCESS_KEY: &str = "local";
const LOCAL_SECRET_KEY: &str = "local";
const CREDENTIALS_PROVIDER_NAME: &str = "dynox-local";

/// Build an SDK client pointed at `endpoint_url`.
///
/// Uses fixed credentials and `region`, falling back to "localhost". The
/// region is never looked up from instance metadata.
pub async fn build_client(endpoint_url: &str, region: Option<&str>) -> Client {
    let region_provider =
        RegionProviderChain::first_try(region.map(|r| Region::new(r.to_string())))
            .or_else(crate::config::DEFAULT_REGION);

    let credentials = Credentials::new(
        LOCAL_ACCESS_KEY,
        LOCAL_SECRET_KEY,
        None,
        None,
        CREDENTIALS_PROVIDER_NAME,
    );

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .credentials_provider(credentials)
        .load()
        .await;

    let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config)
        .endpoint_url(endpoint_url)
        .build();

    debug!(endpoint = endpoint_url, "built DynamoDB client");
    Client::from_conf(dynamo_config)
}

/// Check that the endpoint answers a simple ListTables call.
pub async fn ping(client: &Client, endpoint_url: &str) -> Result<()> {
    client
        .list_tables()
        .limit(1)
        .send()
        .await
        .map(|_| ())
        .map_err(|e| Error::RegistryUnavailable {
            addr: endpoint_url.to_string(),
            message: format!("Failed to connect to DynamoDB: {}", e),
        })
}
