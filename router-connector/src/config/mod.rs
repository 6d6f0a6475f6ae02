use ahash::{HashSet, HashSetExt};
use anyhow::{ensure, Context};
use config::{File, FileFormat, Source};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};

use crate::config::connector::ConnectorConfig;
use crate::config::listener::ListenerConfig;
use crate::config::reconnect::ReconnectConfig;
use crate::REFERENCE;

pub mod connector;
pub mod duration;
pub mod listener;
pub mod reconnect;
pub mod role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_id")]
    pub id: String,
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub connector: Vec<ConnectorConfig>,
    #[serde(default)]
    pub listener: Vec<ListenerConfig>,
}

impl RouterConfig {
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.reconnect.settings()?;
        let mut names = HashSet::with_capacity(self.connector.len());
        for connector in &self.connector {
            ensure!(!connector.name.is_empty(), "connector name must not be empty");
            ensure!(names.insert(connector.name.as_str()), "duplicate connector name {}", connector.name);
            connector.endpoint().with_context(|| format!("connector {}", connector.name))?;
        }
        for listener in &self.listener {
            listener.failover_list().with_context(|| format!("listener {}", listener.authority()))?;
        }
        Ok(())
    }
}

fn default_id() -> String {
    "router".to_string()
}

/// Layers user sources over the embedded reference config.
#[derive(Debug)]
pub struct RouterConfigBuilder {
    builder: config::ConfigBuilder<DefaultState>,
}

impl Default for RouterConfigBuilder {
    fn default() -> Self {
        let builder = config::Config::builder().add_source(File::from_str(REFERENCE, FileFormat::Toml));
        Self { builder }
    }
}

impl RouterConfigBuilder {
    pub fn add_source<T>(self, source: T) -> Self where T: Source + Send + Sync + 'static {
        Self { builder: self.builder.add_source(source) }
    }

    pub fn add_toml(self, toml: &str) -> Self {
        self.add_source(File::from_str(toml, FileFormat::Toml))
    }

    pub fn build(self) -> anyhow::Result<RouterConfig> {
        let router_config = self.builder.build()?.try_deserialize::<RouterConfig>()?;
        router_config.validate()?;
        Ok(router_config)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::role::Role;
    use crate::config::RouterConfig;

    #[test]
    fn test_reference_defaults() {
        let config = RouterConfig::builder().build().unwrap();
        assert_eq!(config.id, "router");
        assert!(config.connector.is_empty());
        let settings = config.reconnect.settings().unwrap();
        assert_eq!(settings.connect_timeout, Duration::from_secs(5));
        assert_eq!(settings.initial_backoff, Duration::from_millis(200));
        assert_eq!(settings.max_backoff, Duration::from_secs(2));
    }

    #[test]
    fn test_connectors_and_listeners() {
        let config = RouterConfig::builder()
            .add_toml(r#"
                id = "QDR.A"

                [reconnect.max-backoff]
                seconds = 1

                [[connector]]
                name = "connectorToB"
                host = "localhost"
                port = 25000
                role = "inter-router"

                [[listener]]
                port = 25001
                failover-urls = "amqp://third-host:5671, amqp://localhost:25002"
            "#)
            .build()
            .unwrap();
        assert_eq!(config.id, "QDR.A");
        assert_eq!(config.reconnect.settings().unwrap().max_backoff, Duration::from_secs(1));
        assert_eq!(config.connector.len(), 1);
        let connector = &config.connector[0];
        assert_eq!(connector.role, Role::InterRouter);
        assert_eq!(connector.endpoint().unwrap().to_string(), "amqp://localhost:25000");
        assert_eq!(config.listener[0].role, Role::Normal);
        assert_eq!(config.listener[0].failover_list().unwrap().len(), 2);
    }

    #[test]
    fn test_reject_invalid() {
        let duplicate = RouterConfig::builder()
            .add_toml(r#"
                [[connector]]
                name = "a"
                host = "localhost"
                [[connector]]
                name = "a"
                host = "other"
            "#)
            .build();
        assert!(duplicate.is_err());

        let zero_backoff = RouterConfig::builder()
            .add_toml("[reconnect.initial-backoff]\nmilliseconds = 0")
            .build();
        assert!(zero_backoff.is_err());

        let bad_urls = RouterConfig::builder()
            .add_toml("[[listener]]\nport = 1\nfailover-urls = \"nonsense\"")
            .build();
        assert!(bad_urls.is_err());
    }
}
