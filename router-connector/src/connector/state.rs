use std::fmt::{Display, Formatter};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::endpoint::{Endpoint, FailoverList};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectorState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    RetryWait,
    Closed,
}

impl ConnectorState {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectorState::Disconnected => "DISCONNECTED",
            ConnectorState::Connecting => "CONNECTING",
            ConnectorState::Connected => "CONNECTED",
            ConnectorState::RetryWait => "RETRY_WAIT",
            ConnectorState::Closed => "CLOSED",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectorState::Closed)
    }
}

impl Display for ConnectorState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What the reconnect loop last published. `endpoint` is the endpoint being
/// dialled while connecting, or the connected one. `failover_list` is the
/// registry content at the time of publishing, so one read sees a state and
/// the list that goes with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorStatus {
    pub state: ConnectorState,
    pub attempt_count: u64,
    pub endpoint: Option<Endpoint>,
    pub failover_list: Arc<FailoverList>,
}
