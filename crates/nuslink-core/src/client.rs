//! Client facade
//!
//! [`NusClient`] is the only thing the presentation layer holds. It reads session
//! snapshots from a watch channel and forwards control operations to the session task.
//! Operation failures land in the snapshot's error slot; the only error an operation
//! returns is [`ClientError::SessionClosed`], when the task is no longer running.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::adapter::AdapterBinding;
use crate::config::SessionConfig;
use crate::device::DiscoveredDevice;
use crate::permission::{ImplicitPermission, PermissionGate};
use crate::session::{ClientSnapshot, Command, SessionTask};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    #[error("Session task is not running")]
    SessionClosed,
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

// ----------------------------------------------------------------------------
// Client Builder
// ----------------------------------------------------------------------------

/// Wires a binding, a permission gate and configuration into a running session
pub struct NusClientBuilder {
    binding: Arc<dyn AdapterBinding>,
    permissions: Arc<dyn PermissionGate>,
    config: SessionConfig,
}

impl NusClientBuilder {
    pub fn new(binding: Arc<dyn AdapterBinding>) -> Self {
        Self {
            binding,
            permissions: Arc::new(ImplicitPermission),
            config: SessionConfig::default(),
        }
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionGate>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Create the client and its task without starting it
    pub fn build(self) -> (NusClient, SessionTask) {
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(ClientSnapshot::default());
        let task = SessionTask::new(
            self.binding,
            self.permissions.clone(),
            self.config,
            command_rx,
            snapshot_tx,
        );
        let client = NusClient {
            commands: command_tx,
            snapshots: snapshot_rx,
            permissions: self.permissions,
        };
        (client, task)
    }

    /// Spawn the session task on the current tokio runtime
    pub fn spawn(self) -> (NusClient, JoinHandle<()>) {
        let (client, task) = self.build();
        let handle = tokio::spawn(task.run());
        (client, handle)
    }
}

// ----------------------------------------------------------------------------
// Client
// ----------------------------------------------------------------------------

/// Handle to a running session
#[derive(Clone)]
pub struct NusClient {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<ClientSnapshot>,
    permissions: Arc<dyn PermissionGate>,
}

impl NusClient {
    pub fn builder(binding: Arc<dyn AdapterBinding>) -> NusClientBuilder {
        NusClientBuilder::new(binding)
    }

    /// The most recently published snapshot
    pub fn snapshot(&self) -> ClientSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified after every state change
    pub fn subscribe(&self) -> watch::Receiver<ClientSnapshot> {
        self.snapshots.clone()
    }

    /// Re-read the adapter power state; true when it is enabled
    pub async fn check_availability(&self) -> ClientResult<bool> {
        self.request(Command::CheckAvailability).await
    }

    pub async fn enable_bluetooth(&self) -> ClientResult<()> {
        self.request(Command::EnableBluetooth).await
    }

    pub async fn start_scan(&self) -> ClientResult<()> {
        self.request(Command::StartScan).await
    }

    pub async fn stop_scan(&self) -> ClientResult<()> {
        self.request(Command::StopScan).await
    }

    pub async fn connect(&self, device: DiscoveredDevice) -> ClientResult<()> {
        self.request(|reply| Command::Connect(device, reply)).await
    }

    pub async fn disconnect(&self) -> ClientResult<()> {
        self.request(Command::Disconnect).await
    }

    pub async fn send_data(&self, text: impl Into<String>) -> ClientResult<()> {
        let text = text.into();
        self.request(|reply| Command::SendData(text, reply)).await
    }

    pub async fn clear_error(&self) -> ClientResult<()> {
        self.request(Command::ClearError).await
    }

    /// Point the user at system settings after a permission denial
    pub fn open_settings(&self) {
        self.permissions.open_settings();
    }

    /// Stop scanning, disconnect and end the session task
    pub async fn shutdown(&self) -> ClientResult<()> {
        self.request(Command::Shutdown).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> ClientResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = command(reply_tx);
        if self.commands.send(command).await.is_err() {
            debug!("Session task gone, dropping command");
            return Err(ClientError::SessionClosed);
        }
        reply_rx.await.map_err(|_| ClientError::SessionClosed)
    }
}
