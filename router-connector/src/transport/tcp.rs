use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::listener::ListenerConfig;
use crate::endpoint::Endpoint;
use crate::error::ConnectError;
use crate::properties::HandshakeProperties;
use crate::transport::{CloseReason, Connection, Established, Transport};
use crate::transport::codec::{Open, OpenCodec};

/// Client side of the reference transport: opens a tcp stream, sends an open
/// frame and waits for the peer's.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    container_id: String,
}

impl TcpTransport {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self { container_id: container_id.into() }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Established, ConnectError> {
        let io_error = |source| ConnectError::Io { endpoint: endpoint.clone(), source };
        let handshake_error = |reason: String| ConnectError::Handshake { endpoint: endpoint.clone(), reason };
        let stream = TcpStream::connect(endpoint.authority()).await.map_err(io_error)?;
        stream.set_nodelay(true).map_err(io_error)?;
        let mut framed = Framed::new(stream, OpenCodec::default());
        framed.send(Open::new(self.container_id.clone(), HandshakeProperties::new()))
            .await
            .map_err(|e| handshake_error(e.to_string()))?;
        match framed.next().await {
            Some(Ok(open)) => {
                debug!("{} received open from {} at {}", self.container_id, open.container_id, endpoint);
                let connection = TcpConnection {
                    peer: endpoint.clone(),
                    container_id: open.container_id,
                    framed,
                };
                Ok(Established { properties: open.properties, connection: Box::new(connection) })
            }
            Some(Err(error)) => Err(handshake_error(error.to_string())),
            None => Err(handshake_error("connection closed before open".to_string())),
        }
    }
}

#[derive(Debug)]
pub struct TcpConnection {
    peer: Endpoint,
    container_id: String,
    framed: Framed<TcpStream, OpenCodec>,
}

impl TcpConnection {
    pub fn remote_container_id(&self) -> &str {
        &self.container_id
    }
}

#[async_trait]
impl Connection for TcpConnection {
    fn peer(&self) -> &Endpoint {
        &self.peer
    }

    async fn closed(&mut self) -> CloseReason {
        loop {
            match self.framed.next().await {
                Some(Ok(open)) => {
                    warn!("ignore unexpected open frame from {} on established connection", open.container_id);
                }
                Some(Err(error)) => {
                    return CloseReason::Error(error.to_string());
                }
                None => {
                    return CloseReason::PeerClosed;
                }
            }
        }
    }
}

/// Server side of the reference transport. Every accepted connection is
/// answered with an open frame carrying the listener's advertised properties
/// and held until the peer leaves or the listener is stopped.
#[derive(Debug)]
pub struct TcpListenerHandle {
    local_addr: SocketAddr,
    peers: Arc<DashMap<SocketAddr, String>>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TcpListenerHandle {
    pub async fn bind(container_id: impl Into<String>, config: &ListenerConfig) -> anyhow::Result<Self> {
        let container_id = container_id.into();
        let properties = HandshakeProperties::advertising(&config.failover_list()?);
        let listener = TcpListener::bind(config.authority())
            .await
            .with_context(|| format!("bind listener {}", config.authority()))?;
        let local_addr = listener.local_addr()?;
        info!("{} listening on {} as {}", container_id, local_addr, config.role);
        let peers = Arc::new(DashMap::new());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Self::accept_loop(
            listener,
            container_id,
            properties,
            peers.clone(),
            cancel.clone(),
        ));
        Ok(Self { local_addr, peers, cancel, handle })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Container ids of the peers currently connected to this listener.
    pub fn connected_peers(&self) -> Vec<String> {
        self.peers.iter().map(|e| e.value().clone()).collect()
    }

    /// Stops accepting and drops every connection accepted so far.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Err(error) = (&mut self.handle).await {
            warn!("listener {} task error {:?}", self.local_addr, error);
        }
        info!("listener {} stopped", self.local_addr);
    }

    async fn accept_loop(
        listener: TcpListener,
        container_id: String,
        properties: HandshakeProperties,
        peers: Arc<DashMap<SocketAddr, String>>,
        cancel: CancellationToken,
    ) {
        let mut connections = Vec::new();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr)) => {
                            let fut = Self::serve_inbound(
                                stream,
                                peer_addr,
                                Open::new(container_id.clone(), properties.clone()),
                                peers.clone(),
                                cancel.child_token(),
                            );
                            connections.push(tokio::spawn(fut));
                        }
                        Err(error) => {
                            warn!("{} accept connection error {:?}", container_id, error);
                        }
                    }
                }
            }
            connections.retain(|c: &JoinHandle<()>| !c.is_finished());
        }
        for connection in connections {
            let _ = connection.await;
        }
    }

    async fn serve_inbound(
        stream: TcpStream,
        peer_addr: SocketAddr,
        open: Open,
        peers: Arc<DashMap<SocketAddr, String>>,
        cancel: CancellationToken,
    ) {
        let mut framed = Framed::new(stream, OpenCodec::default());
        let remote = tokio::select! {
            _ = cancel.cancelled() => return,
            frame = framed.next() => frame,
        };
        let remote = match remote {
            Some(Ok(remote)) => remote,
            Some(Err(error)) => {
                warn!("{} handshake error {:?}", peer_addr, error);
                return;
            }
            None => return,
        };
        if let Err(error) = framed.send(open).await {
            warn!("{} send open error {:?}", peer_addr, error);
            return;
        }
        info!("{} connected from {}", remote.container_id, peer_addr);
        peers.insert(peer_addr, remote.container_id.clone());
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                frame = framed.next() => {
                    match frame {
                        Some(Ok(_)) => {}
                        Some(Err(error)) => {
                            debug!("{} read error {:?}", peer_addr, error);
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
        peers.remove(&peer_addr);
        info!("{} disconnected from {}", remote.container_id, peer_addr);
    }
}

impl Drop for TcpListenerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::listener::ListenerConfig;
    use crate::config::role::Role;
    use crate::endpoint::{AMQP_PORT, Endpoint};
    use crate::error::ConnectError;
    use crate::properties::decode_failover_list;
    use crate::transport::{CloseReason, Transport};
    use crate::transport::tcp::{TcpListenerHandle, TcpTransport};

    fn local(port: u16) -> Endpoint {
        Endpoint::new("127.0.0.1", port).unwrap()
    }

    #[tokio::test]
    async fn test_handshake_carries_failover_list() -> anyhow::Result<()> {
        let config = ListenerConfig::new(0, Role::InterRouter)
            .with_failover_urls("amqp://third-host:5671, amqp://localhost:25000");
        let listener = TcpListenerHandle::bind("QDR.B", &config).await?;
        let transport = TcpTransport::new("QDR.A");
        let established = transport.connect(&local(listener.local_addr().port())).await?;
        let list = decode_failover_list(&established.properties, AMQP_PORT);
        assert_eq!(list.render().as_deref(), Some("amqp://third-host:5671, amqp://localhost:25000"));
        let mut connection = established.connection;
        assert_eq!(connection.peer(), &local(listener.local_addr().port()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(listener.connected_peers(), vec!["QDR.A".to_string()]);

        listener.stop().await;
        let reason = tokio::time::timeout(Duration::from_secs(5), connection.closed()).await?;
        assert!(matches!(reason, CloseReason::PeerClosed | CloseReason::Error(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_connect_refused() -> anyhow::Result<()> {
        let listener = TcpListenerHandle::bind("QDR.B", &ListenerConfig::new(0, Role::Normal)).await?;
        let port = listener.local_addr().port();
        listener.stop().await;
        let result = TcpTransport::new("QDR.A").connect(&local(port)).await;
        assert!(matches!(result, Err(ConnectError::Io { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_listener_stops_accepting() -> anyhow::Result<()> {
        let config = ListenerConfig::new(0, Role::InterRouter).with_failover_urls("amqp://localhost:25000");
        let listener = TcpListenerHandle::bind("QDR.B", &config).await?;
        let endpoint = local(listener.local_addr().port());
        drop(listener);
        let transport = TcpTransport::new("QDR.A");
        let mut refused = false;
        for _ in 0..50 {
            if let Err(ConnectError::Io { .. }) = transport.connect(&endpoint).await {
                refused = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(refused);
        Ok(())
    }
}
