use std::fmt::{Debug, Display, Formatter};

use async_trait::async_trait;

use crate::endpoint::{AMQP_PORT, Endpoint};
use crate::error::ConnectError;
use crate::properties::HandshakeProperties;

pub mod codec;
pub mod tcp;

/// The connect primitive a connector drives. Implementations establish the
/// connection and complete the handshake, handing back the peer's properties.
/// Timeouts are applied by the caller.
#[async_trait]
pub trait Transport: Debug + Send + Sync + 'static {
    /// Port assumed for advertised failover entries that do not carry one.
    fn default_port(&self) -> u16 {
        AMQP_PORT
    }

    async fn connect(&self, endpoint: &Endpoint) -> Result<Established, ConnectError>;
}

/// An established connection whose handshake has completed.
#[derive(Debug)]
pub struct Established {
    pub properties: HandshakeProperties,
    pub connection: Box<dyn Connection>,
}

/// Live connection handle. Dropping it closes the connection.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    fn peer(&self) -> &Endpoint;

    /// Resolves once the connection is lost.
    async fn closed(&mut self) -> CloseReason;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    PeerClosed,
    Error(String),
}

impl Display for CloseReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::PeerClosed => f.write_str("closed by peer"),
            CloseReason::Error(error) => write!(f, "error: {}", error),
        }
    }
}
