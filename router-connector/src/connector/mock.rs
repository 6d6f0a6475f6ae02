use std::time::Duration;

use ahash::HashMap;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::endpoint::{Endpoint, FailoverList};
use crate::error::ConnectError;
use crate::properties::HandshakeProperties;
use crate::transport::{CloseReason, Connection, Established, Transport};

#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    Refuse,
    Hang,
    Accept(HandshakeProperties),
}

impl Behavior {
    pub(crate) fn advertising(list: &[Endpoint]) -> Self {
        Behavior::Accept(HandshakeProperties::advertising(&FailoverList::new(list.to_vec())))
    }
}

/// In-memory transport whose answer per endpoint can be changed while a
/// connector is running. Unknown endpoints refuse.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    behaviors: Mutex<HashMap<Endpoint, Behavior>>,
    attempts: Mutex<Vec<Endpoint>>,
    links: Mutex<CancellationToken>,
}

impl ScriptedTransport {
    pub(crate) fn set(&self, endpoint: &Endpoint, behavior: Behavior) {
        self.behaviors.lock().insert(endpoint.clone(), behavior);
    }

    pub(crate) fn attempts(&self) -> Vec<Endpoint> {
        self.attempts.lock().clone()
    }

    /// Drops every connection handed out so far.
    pub(crate) fn drop_connections(&self) {
        let old = std::mem::take(&mut *self.links.lock());
        old.cancel();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Established, ConnectError> {
        self.attempts.lock().push(endpoint.clone());
        let behavior = self.behaviors.lock().get(endpoint).cloned().unwrap_or(Behavior::Refuse);
        match behavior {
            Behavior::Refuse => Err(ConnectError::Io {
                endpoint: endpoint.clone(),
                source: std::io::ErrorKind::ConnectionRefused.into(),
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ConnectError::Handshake { endpoint: endpoint.clone(), reason: "hang".to_string() })
            }
            Behavior::Accept(properties) => {
                let connection = ScriptedConnection {
                    peer: endpoint.clone(),
                    link: self.links.lock().child_token(),
                };
                Ok(Established { properties, connection: Box::new(connection) })
            }
        }
    }
}

#[derive(Debug)]
struct ScriptedConnection {
    peer: Endpoint,
    link: CancellationToken,
}

#[async_trait]
impl Connection for ScriptedConnection {
    fn peer(&self) -> &Endpoint {
        &self.peer
    }

    async fn closed(&mut self) -> CloseReason {
        self.link.cancelled().await;
        CloseReason::PeerClosed
    }
}
