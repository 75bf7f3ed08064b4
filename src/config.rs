//! Runtime configuration.
//!
//! Settings are resolved once at startup. Priority for every field:
//! 1. Command-line flag (or its `DYNOX_*` environment variable, see `cli`)
//! 2. `custom.dynalite` block of the service template
//! 3. Built-in default

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::reconcile::ReconcileOptions;
use crate::registry::RegistryOptions;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4567;
pub const DEFAULT_REGION: &str = "localhost";
pub const DEFAULT_TEMPLATE_PATH: &str = "serverless.json";
pub const DEFAULT_SETTLE_MS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
/// Poll intervals below this are raised to it.
pub const MIN_POLL_INTERVAL_MS: u64 = 1;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// `custom.dynalite` block of a service template.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    #[serde(default)]
    pub start: StartSettings,
    #[serde(default)]
    pub watch: WatchSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub region: Option<String>,
    pub create_table_ms: Option<u64>,
    pub delete_table_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSettings {
    /// Poll interval in milliseconds.
    pub interval: Option<u64>,
}

/// Values given explicitly on the command line or through the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub region: Option<String>,
    pub create_table_ms: Option<u64>,
    pub delete_table_ms: Option<u64>,
    pub settle_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub max_concurrency: Option<usize>,
    pub create_timeout_ms: Option<u64>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub region: String,
    pub template_path: PathBuf,
    pub create_table_delay: Duration,
    pub delete_table_delay: Duration,
    pub settle_delay: Duration,
    pub poll_interval: Duration,
    pub max_concurrency: usize,
    pub create_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(
            PathBuf::from(DEFAULT_TEMPLATE_PATH),
            &Overrides::default(),
            &PluginSettings::default(),
        )
    }
}

impl Config {
    pub fn resolve(
        template_path: PathBuf,
        overrides: &Overrides,
        settings: &PluginSettings,
    ) -> Self {
        let start = &settings.start;
        let ms = Duration::from_millis;

        Self {
            host: overrides
                .host
                .clone()
                .or_else(|| start.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(start.port).unwrap_or(DEFAULT_PORT),
            region: overrides
                .region
                .clone()
                .or_else(|| start.region.clone())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            template_path,
            create_table_delay: ms(overrides
                .create_table_ms
                .or(start.create_table_ms)
                .unwrap_or(0)),
            delete_table_delay: ms(overrides
                .delete_table_ms
                .or(start.delete_table_ms)
                .unwrap_or(0)),
            settle_delay: ms(overrides.settle_ms.unwrap_or(DEFAULT_SETTLE_MS)),
            poll_interval: ms(overrides
                .poll_interval_ms
                .or(settings.watch.interval)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
                .max(MIN_POLL_INTERVAL_MS)),
            max_concurrency: overrides
                .max_concurrency
                .unwrap_or(DEFAULT_MAX_CONCURRENCY)
                .max(1),
            create_timeout: overrides.create_timeout_ms.map(ms),
        }
    }

    /// Address clients should use to reach the registry.
    ///
    /// Wildcard bind addresses are not connectable, so they map to loopback.
    pub fn endpoint_url(&self, port: u16) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" | "[::]" => "localhost",
            other => other,
        };
        format!("http://{}:{}", host, port)
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            create_table_delay: self.create_table_delay,
            delete_table_delay: self.delete_table_delay,
            region: self.region.clone(),
        }
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            settle_delay: self.settle_delay,
            max_concurrency: self.max_concurrency,
            create_timeout: self.create_timeout,
        }
    }
}
