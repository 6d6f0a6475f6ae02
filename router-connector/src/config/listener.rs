use serde::{Deserialize, Serialize};

use crate::config::role::Role;
use crate::endpoint::FailoverList;
use crate::error::EndpointError;
use crate::properties::parse_failover_urls;

/// One `[[listener]]` table. `failover-urls` is what this router advertises
/// to peers that connect to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "failover-urls", default, skip_serializing_if = "Option::is_none")]
    pub failover_urls: Option<String>,
}

impl ListenerConfig {
    pub fn new(port: u16, role: Role) -> Self {
        Self {
            host: default_host(),
            port,
            role,
            failover_urls: None,
        }
    }

    pub fn with_failover_urls(mut self, urls: impl Into<String>) -> Self {
        self.failover_urls = Some(urls.into());
        self
    }

    pub fn failover_list(&self) -> Result<FailoverList, EndpointError> {
        match &self.failover_urls {
            None => Ok(FailoverList::empty()),
            Some(urls) => parse_failover_urls(urls),
        }
    }

    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
