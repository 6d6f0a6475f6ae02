use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::connector::ConnectorConfig;
use crate::config::reconnect::ReconnectSettings;
use crate::config::role::Role;
use crate::connector::scheduler::ReconnectScheduler;
use crate::connector::state::{ConnectorState, ConnectorStatus};
use crate::endpoint::{Endpoint, FailoverList};
use crate::error::{ConnectorError, EndpointError};
use crate::registry::FailoverRegistry;
use crate::transport::Transport;

mod backoff;
mod scheduler;
pub mod state;

#[cfg(test)]
pub(crate) mod mock;

/// A configured outbound connection target together with its reconnect loop.
/// Cloning is cheap, clones share the same connector.
#[derive(Clone)]
pub struct Connector {
    inner: Arc<ConnectorInner>,
}

pub struct ConnectorInner {
    name: String,
    role: Role,
    registry: Arc<FailoverRegistry>,
    status: Arc<watch::Sender<ConnectorStatus>>,
    cancel: CancellationToken,
    task: Mutex<Task>,
}

enum Task {
    Idle,
    Running(JoinHandle<()>),
    Closed,
}

impl Debug for Connector {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("primary", self.registry.primary())
            .field("status", &*self.status.borrow())
            .finish()
    }
}

impl Deref for Connector {
    type Target = Arc<ConnectorInner>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Connector {
    pub fn new(name: impl Into<String>, role: Role, primary: Endpoint) -> Self {
        let (status, _) = watch::channel(ConnectorStatus::default());
        let inner = ConnectorInner {
            name: name.into(),
            role,
            registry: Arc::new(FailoverRegistry::new(primary)),
            status: Arc::new(status),
            cancel: CancellationToken::new(),
            task: Mutex::new(Task::Idle),
        };
        Self { inner: inner.into() }
    }

    pub fn from_config(config: &ConnectorConfig) -> Result<Self, EndpointError> {
        Ok(Self::new(config.name.clone(), config.role, config.endpoint()?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn primary(&self) -> &Endpoint {
        self.registry.primary()
    }

    pub fn registry(&self) -> &FailoverRegistry {
        &self.registry
    }

    pub fn failover_list(&self) -> Arc<FailoverList> {
        self.registry.snapshot()
    }

    pub fn status(&self) -> ConnectorStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> ConnectorState {
        self.status.borrow().state
    }

    /// Receiver that observes every status the reconnect loop publishes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectorStatus> {
        self.status.subscribe()
    }

    /// Spawns the reconnect loop. At most one loop ever runs per connector, a
    /// second start or a start after shutdown is refused, and so are settings
    /// that fail validation.
    pub fn start(&self, transport: Arc<dyn Transport>, settings: ReconnectSettings) -> Result<(), ConnectorError> {
        let mut task = self.task.lock();
        match &*task {
            Task::Idle => {
                settings.validate().map_err(|error| ConnectorError::InvalidSettings {
                    name: self.name.clone(),
                    reason: error.to_string(),
                })?;
                let scheduler = ReconnectScheduler::new(
                    self.name.clone(),
                    self.registry.clone(),
                    transport,
                    settings,
                    self.status.clone(),
                    self.cancel.clone(),
                );
                *task = Task::Running(tokio::spawn(scheduler.run()));
                info!("{} started, primary endpoint {}", self.name, self.primary());
                Ok(())
            }
            Task::Running(_) => {
                debug!("ignore start of {} because it is already running", self.name);
                Err(ConnectorError::AlreadyStarted(self.name.clone()))
            }
            Task::Closed => Err(ConnectorError::Closed(self.name.clone())),
        }
    }

    /// Cancels whatever the loop is doing (connecting, waiting to retry or
    /// holding a live connection) and waits for it to reach `CLOSED`, also when
    /// another caller got there first. The failover list is left untouched.
    pub async fn shutdown(&self) {
        let task = std::mem::replace(&mut *self.task.lock(), Task::Closed);
        self.cancel.cancel();
        match task {
            Task::Running(handle) => {
                if let Err(error) = handle.await {
                    warn!("{} reconnect loop error {:?}", self.name, error);
                    self.status.send_modify(|status| status.state = ConnectorState::Closed);
                }
            }
            Task::Idle => {
                self.status.send_modify(|status| status.state = ConnectorState::Closed);
                info!("{} closed", self.name);
            }
            Task::Closed => {
                let mut status = self.subscribe();
                let _ = status.wait_for(|status| status.state.is_closed()).await;
            }
        }
    }
}
