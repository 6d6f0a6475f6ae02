use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::config::role::Role;
use crate::connector::Connector;
use crate::connector::state::ConnectorState;

/// Point in time view of one connector as management tooling sees it.
/// `failoverUrls` is left out entirely when no list is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSnapshot {
    pub name: String,
    pub role: Role,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover_urls: Option<String>,
    pub state: ConnectorState,
    pub attempt_count: u64,
}

impl ConnectorSnapshot {
    pub fn capture(connector: &Connector) -> Self {
        let status = connector.status();
        let failover_urls = status.failover_list.render();
        let primary = connector.primary();
        Self {
            name: connector.name().to_string(),
            role: connector.role(),
            host: primary.host().to_string(),
            port: primary.port(),
            failover_urls,
            state: status.state,
            attempt_count: status.attempt_count,
        }
    }
}

/// Answers connector queries against a shared set of connectors. Each read
/// clones the latest published status, so queries never hold up a reconnect
/// loop.
#[derive(Debug, Clone, Default)]
pub struct SnapshotPublisher {
    connectors: Arc<DashMap<String, Connector>>,
}

impl SnapshotPublisher {
    pub fn new(connectors: Arc<DashMap<String, Connector>>) -> Self {
        Self { connectors }
    }

    /// All connectors, ordered by name.
    pub fn query(&self) -> Vec<ConnectorSnapshot> {
        let mut snapshots = self.connectors
            .iter()
            .map(|e| ConnectorSnapshot::capture(e.value()))
            .collect::<Vec<_>>();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn query_one(&self, name: &str) -> Option<ConnectorSnapshot> {
        self.connectors.get(name).map(|e| ConnectorSnapshot::capture(e.value()))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.query())
    }
}
