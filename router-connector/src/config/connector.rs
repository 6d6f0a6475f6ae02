use serde::{Deserialize, Serialize};

use crate::config::role::Role;
use crate::endpoint::{AMQP_PORT, DEFAULT_SCHEME, Endpoint};
use crate::error::EndpointError;

/// One `[[connector]]` table: an outbound connection this router keeps alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

impl ConnectorConfig {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16, role: Role) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            role,
            scheme: default_scheme(),
        }
    }

    pub fn endpoint(&self) -> Result<Endpoint, EndpointError> {
        Endpoint::with_scheme(self.scheme.clone(), self.host.clone(), self.port)
    }
}

fn default_port() -> u16 {
    AMQP_PORT
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}
