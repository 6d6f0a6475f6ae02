use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::connector::ConnectorConfig;
use crate::config::reconnect::ReconnectSettings;
use crate::config::RouterConfig;
use crate::connector::Connector;
use crate::error::ConnectorError;
use crate::snapshot::{ConnectorSnapshot, SnapshotPublisher};
use crate::transport::tcp::{TcpListenerHandle, TcpTransport};
use crate::transport::Transport;

/// The set of connectors (and listeners) owned by one router process. Each
/// connector runs independently, the router only aggregates them.
#[derive(Debug)]
pub struct Router {
    id: String,
    transport: Arc<dyn Transport>,
    settings: ReconnectSettings,
    connectors: Arc<DashMap<String, Connector>>,
    listeners: Mutex<Vec<TcpListenerHandle>>,
}

impl Router {
    pub fn new(id: impl Into<String>, transport: Arc<dyn Transport>, settings: ReconnectSettings) -> Self {
        Self {
            id: id.into(),
            transport,
            settings,
            connectors: Arc::new(DashMap::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Binds every configured listener and starts every configured connector
    /// over the tcp transport. If any of them fails, whatever was already
    /// running is shut down before the error is returned.
    pub async fn start(config: &RouterConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let transport = Arc::new(TcpTransport::new(config.id.clone()));
        let router = Self::new(config.id.clone(), transport, config.reconnect.settings()?);
        if let Err(error) = router.open(config).await {
            warn!("router {} failed to start: {:#}", router.id, error);
            router.shutdown().await;
            return Err(error);
        }
        info!("router {} started with {} connector(s)", router.id, config.connector.len());
        Ok(router)
    }

    async fn open(&self, config: &RouterConfig) -> anyhow::Result<()> {
        for listener in &config.listener {
            let handle = TcpListenerHandle::bind(config.id.clone(), listener).await?;
            self.listeners.lock().push(handle);
        }
        for connector in &config.connector {
            self.add_connector(connector)?;
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creates the connector and starts its reconnect loop.
    pub fn add_connector(&self, config: &ConnectorConfig) -> anyhow::Result<Connector> {
        let connector = Connector::from_config(config)?;
        match self.connectors.entry(config.name.clone()) {
            Entry::Occupied(_) => {
                return Err(ConnectorError::DuplicateName(config.name.clone()).into());
            }
            Entry::Vacant(entry) => {
                entry.insert(connector.clone());
            }
        }
        if let Err(error) = connector.start(self.transport.clone(), self.settings.clone()) {
            self.connectors.remove(&config.name);
            return Err(error.into());
        }
        Ok(connector)
    }

    /// Shuts the named connector down and forgets it.
    pub async fn remove_connector(&self, name: &str) -> Option<Connector> {
        let (_, connector) = self.connectors.remove(name)?;
        connector.shutdown().await;
        Some(connector)
    }

    pub fn connector(&self, name: &str) -> Option<Connector> {
        self.connectors.get(name).map(|e| e.value().clone())
    }

    pub fn publisher(&self) -> SnapshotPublisher {
        SnapshotPublisher::new(self.connectors.clone())
    }

    pub fn query(&self) -> Vec<ConnectorSnapshot> {
        self.publisher().query()
    }

    pub fn listener_addrs(&self) -> Vec<std::net::SocketAddr> {
        self.listeners.lock().iter().map(|l| l.local_addr()).collect()
    }

    /// Container ids connected to any of this router's listeners.
    pub fn inbound_peers(&self) -> Vec<String> {
        self.listeners.lock().iter().flat_map(|l| l.connected_peers()).collect()
    }

    /// Closes every connector, then every listener. Failover lists are kept.
    pub async fn shutdown(&self) {
        let connectors = self.connectors.iter().map(|e| e.value().clone()).collect::<Vec<_>>();
        join_all(connectors.iter().map(|c| c.shutdown())).await;
        let listeners = std::mem::take(&mut *self.listeners.lock());
        join_all(listeners.into_iter().map(|l| l.stop())).await;
        info!("router {} shutdown", self.id);
    }
}
