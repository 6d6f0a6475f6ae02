use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::reconnect::ReconnectSettings;
use crate::connector::backoff::Backoff;
use crate::connector::state::{ConnectorState, ConnectorStatus};
use crate::endpoint::Endpoint;
use crate::error::ConnectError;
use crate::properties::decode_failover_list;
use crate::registry::FailoverRegistry;
use crate::transport::{Established, Transport};

/// The reconnect loop of one connector. It owns the cursor into the candidate
/// list and, while it runs, is the only writer of the connector's status and
/// registry.
pub(crate) struct ReconnectScheduler {
    name: String,
    registry: Arc<FailoverRegistry>,
    transport: Arc<dyn Transport>,
    settings: ReconnectSettings,
    status: Arc<watch::Sender<ConnectorStatus>>,
    cancel: CancellationToken,
    cursor: usize,
    attempt_count: u64,
    backoff: Backoff,
}

enum Outcome {
    Lost,
    Failed,
    Shutdown,
}

impl ReconnectScheduler {
    pub(crate) fn new(
        name: String,
        registry: Arc<FailoverRegistry>,
        transport: Arc<dyn Transport>,
        settings: ReconnectSettings,
        status: Arc<watch::Sender<ConnectorStatus>>,
        cancel: CancellationToken,
    ) -> Self {
        let backoff = Backoff::new(&settings);
        Self {
            name,
            registry,
            transport,
            settings,
            status,
            cancel,
            cursor: 0,
            attempt_count: 0,
            backoff,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!("{} reconnect loop started", self.name);
        loop {
            let candidates = self.registry.next_candidates();
            let endpoint = candidates[self.cursor % candidates.len()].clone();
            let outcome = self.attempt(endpoint).await;
            if matches!(outcome, Outcome::Shutdown) {
                break;
            }
            let len = self.registry.next_candidates().len();
            self.cursor = match outcome {
                Outcome::Lost => 1 % len,
                _ => (self.cursor + 1) % len,
            };
            let delay = self.backoff.delay(self.attempt_count);
            self.transition(ConnectorState::RetryWait, None);
            debug!("{} retry in {:?}", self.name, delay);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        self.transition(ConnectorState::Closed, None);
        info!("{} closed", self.name);
    }

    async fn attempt(&mut self, endpoint: Endpoint) -> Outcome {
        self.transition(ConnectorState::Connecting, Some(endpoint.clone()));
        let timeout = self.settings.connect_timeout;
        let connect = tokio::time::timeout(timeout, self.transport.connect(&endpoint));
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Outcome::Shutdown,
            result = connect => result,
        };
        let result = result.unwrap_or_else(|_| Err(ConnectError::Timeout { endpoint: endpoint.clone(), timeout }));
        match result {
            Ok(established) => {
                let Established { properties, mut connection } = established;
                let list = decode_failover_list(&properties, self.transport.default_port());
                drop(properties);
                info!("{} connected to {}, failover list [{}]", self.name, endpoint, list.render().unwrap_or_default());
                self.registry.update(list);
                self.cursor = 0;
                self.attempt_count = 0;
                self.transition(ConnectorState::Connected, Some(endpoint.clone()));
                let reason = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Outcome::Shutdown,
                    reason = connection.closed() => reason,
                };
                warn!("{} lost connection to {}: {}", self.name, endpoint, reason);
                Outcome::Lost
            }
            Err(error) => {
                self.attempt_count += 1;
                warn!("{} connect attempt {} failed: {}", self.name, self.attempt_count, error);
                Outcome::Failed
            }
        }
    }

    fn transition(&self, state: ConnectorState, endpoint: Option<Endpoint>) {
        let attempt_count = self.attempt_count;
        let failover_list = self.registry.snapshot();
        self.status.send_modify(|status| {
            debug!("{} {} -> {}", self.name, status.state, state);
            status.state = state;
            status.attempt_count = attempt_count;
            status.endpoint = endpoint;
            status.failover_list = failover_list;
        });
    }
}
