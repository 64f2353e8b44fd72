//! Session task
//!
//! One task owns the session state together with every resource attached to it: the
//! scan subscription and its expiry timer, the link handle, and the link's
//! subscriptions. Commands from the facade and events from the binding are handled in
//! a single loop, one at a time, so no two transitions ever interleave.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep, timeout, Sleep};
use tracing::{debug, error, info, warn};

use crate::adapter::{AdapterBinding, LinkHandle, ScanFilter, Subscription};
use crate::codec::NusCodec;
use crate::config::SessionConfig;
use crate::device::{
    AdapterPowerState, Advertisement, ConnectionState, DiscoveredDevice, RadioState,
};
use crate::error::{BindingError, ErrorKind, SessionError};
use crate::permission::PermissionGate;
use crate::protocol::{
    has_uart_service, NUS_RX_CHARACTERISTIC_UUID, NUS_SERVICE_UUID, NUS_TX_CHARACTERISTIC_UUID,
};

use super::reducer::{reduce, Action};
use super::state::{ClientSnapshot, SessionState};

/// Upper bound on a power-state read
const POWER_STATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shown when the platform cannot power the radio on for us
pub const MANUAL_ENABLE_HINT: &str = "Enable Bluetooth manually in Settings";

// ----------------------------------------------------------------------------
// Commands
// ----------------------------------------------------------------------------

/// Control operations sent from the facade. Each carries its completion channel.
#[derive(Debug)]
pub enum Command {
    CheckAvailability(oneshot::Sender<bool>),
    EnableBluetooth(oneshot::Sender<()>),
    StartScan(oneshot::Sender<()>),
    StopScan(oneshot::Sender<()>),
    Connect(DiscoveredDevice, oneshot::Sender<()>),
    Disconnect(oneshot::Sender<()>),
    SendData(String, oneshot::Sender<()>),
    ClearError(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::CheckAvailability(_) => "check_availability",
            Command::EnableBluetooth(_) => "enable_bluetooth",
            Command::StartScan(_) => "start_scan",
            Command::StopScan(_) => "stop_scan",
            Command::Connect(..) => "connect",
            Command::Disconnect(_) => "disconnect",
            Command::SendData(..) => "send_data",
            Command::ClearError(_) => "clear_error",
            Command::Shutdown(_) => "shutdown",
        }
    }
}

// ----------------------------------------------------------------------------
// Owned Resources
// ----------------------------------------------------------------------------

/// An active scan. Dropping it cancels both the subscription and the timer.
struct ScanSession {
    results: Subscription<Result<Advertisement, BindingError>>,
    expiry: Pin<Box<Sleep>>,
}

/// The single connection session
struct ConnectionSession {
    device: DiscoveredDevice,
    link: Arc<dyn LinkHandle>,
    inbound: Option<Subscription<Result<Vec<u8>, BindingError>>>,
    disconnects: Option<Subscription<()>>,
}

enum ScanSignal {
    Result(Option<Result<Advertisement, BindingError>>),
    Expired,
}

enum LinkSignal {
    Inbound(Option<Result<Vec<u8>, BindingError>>),
    Disconnected(Option<()>),
}

// ----------------------------------------------------------------------------
// Session Task
// ----------------------------------------------------------------------------

/// The task that owns and drives one NUS session
pub struct SessionTask {
    binding: Arc<dyn AdapterBinding>,
    permissions: Arc<dyn PermissionGate>,
    config: SessionConfig,
    state: SessionState,
    snapshots: watch::Sender<ClientSnapshot>,
    commands: mpsc::Receiver<Command>,
    permission_granted: bool,
    power_events: Option<Subscription<RadioState>>,
    scan: Option<ScanSession>,
    connection: Option<ConnectionSession>,
    running: bool,
}

impl SessionTask {
    pub fn new(
        binding: Arc<dyn AdapterBinding>,
        permissions: Arc<dyn PermissionGate>,
        config: SessionConfig,
        commands: mpsc::Receiver<Command>,
        snapshots: watch::Sender<ClientSnapshot>,
    ) -> Self {
        let state = SessionState::new(config.inbound_log_capacity);
        snapshots.send_replace(state.snapshot());
        Self {
            binding,
            permissions,
            config,
            state,
            snapshots,
            commands,
            permission_granted: false,
            power_events: None,
            scan: None,
            connection: None,
            running: false,
        }
    }

    /// Run until shut down or until every client handle is dropped
    pub async fn run(mut self) {
        info!("NUS session task starting");
        self.running = true;
        self.initialize().await;

        while self.running {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => {
                            info!("All client handles dropped, shutting down");
                            self.teardown().await;
                        }
                    }
                }

                event = next_item(&mut self.power_events) => {
                    self.handle_power_event(event);
                }

                signal = next_scan_signal(&mut self.scan) => {
                    self.handle_scan_signal(signal).await;
                }

                signal = next_link_signal(&mut self.connection) => {
                    self.handle_link_signal(signal).await;
                }
            }
        }

        info!("NUS session task stopped");
    }

    async fn initialize(&mut self) {
        self.check_availability().await;
        match self.binding.power_state_changes().await {
            Ok(events) => self.power_events = Some(events),
            Err(e) => warn!("Power state changes unavailable: {}", e),
        }
    }

    fn dispatch(&mut self, action: Action) {
        if reduce(&mut self.state, action) {
            self.snapshots.send_replace(self.state.snapshot());
        }
    }

    fn set_error(&mut self, error: SessionError) {
        debug!("Session error: {:?}", error);
        self.dispatch(Action::SetError(Some(error)));
    }

    async fn handle_command(&mut self, command: Command) {
        debug!("Handling command {}", command.name());
        match command {
            Command::CheckAvailability(reply) => {
                let enabled = self.check_availability().await;
                let _ = reply.send(enabled);
            }
            Command::EnableBluetooth(reply) => {
                self.enable_bluetooth().await;
                let _ = reply.send(());
            }
            Command::StartScan(reply) => {
                self.start_scan().await;
                let _ = reply.send(());
            }
            Command::StopScan(reply) => {
                self.stop_scan().await;
                let _ = reply.send(());
            }
            Command::Connect(device, reply) => {
                self.connect(device).await;
                let _ = reply.send(());
            }
            Command::Disconnect(reply) => {
                self.disconnect().await;
                let _ = reply.send(());
            }
            Command::SendData(text, reply) => {
                self.send_data(text).await;
                let _ = reply.send(());
            }
            Command::ClearError(reply) => {
                self.dispatch(Action::SetError(None));
                let _ = reply.send(());
            }
            Command::Shutdown(reply) => {
                self.teardown().await;
                let _ = reply.send(());
            }
        }
    }

    // ------------------------------------------------------------------------
    // Adapter
    // ------------------------------------------------------------------------

    async fn check_availability(&mut self) -> bool {
        let power = match timeout(POWER_STATE_TIMEOUT, self.binding.power_state()).await {
            Ok(Ok(state)) => AdapterPowerState::from(state),
            Ok(Err(e)) => {
                warn!("Failed to read adapter state: {}", e);
                AdapterPowerState::Unavailable
            }
            Err(_) => {
                warn!("Adapter state read timed out");
                AdapterPowerState::Unavailable
            }
        };
        self.dispatch(Action::SetAdapterState(power));
        power == AdapterPowerState::Enabled
    }

    async fn enable_bluetooth(&mut self) {
        if !self.binding.supports_enable() {
            self.set_error(SessionError::with_message(
                ErrorKind::AdapterDisabled,
                MANUAL_ENABLE_HINT,
            ));
            return;
        }

        match self.binding.enable().await {
            Ok(()) => {
                info!("Bluetooth enabled");
                self.dispatch(Action::SetAdapterState(AdapterPowerState::Enabled));
            }
            Err(e) => {
                error!("Failed to enable Bluetooth: {}", e);
                self.set_error(SessionError::new(ErrorKind::AdapterDisabled));
            }
        }
    }

    fn handle_power_event(&mut self, event: Option<RadioState>) {
        match event {
            Some(radio) => {
                let power = AdapterPowerState::from(radio);
                debug!("Adapter state changed: {:?} -> {}", radio, power);
                self.dispatch(Action::SetAdapterState(power));
            }
            None => {
                debug!("Power state stream ended");
                self.power_events = None;
            }
        }
    }

    fn adapter_gate(&self) -> Option<SessionError> {
        match self.state.adapter_power_state {
            AdapterPowerState::Disabled => Some(SessionError::new(ErrorKind::AdapterDisabled)),
            AdapterPowerState::Unavailable => {
                Some(SessionError::new(ErrorKind::AdapterUnavailable))
            }
            AdapterPowerState::Unknown | AdapterPowerState::Enabled => None,
        }
    }

    // ------------------------------------------------------------------------
    // Scanning
    // ------------------------------------------------------------------------

    async fn start_scan(&mut self) {
        if !self.permission_granted {
            self.permission_granted = self.permissions.check().await;
            if !self.permission_granted {
                warn!("Bluetooth permission denied, not scanning");
                self.set_error(SessionError::new(ErrorKind::PermissionDenied));
                return;
            }
        }

        if self.scan.is_some() {
            debug!("Scan already active");
            return;
        }

        if let Some(error) = self.adapter_gate() {
            self.set_error(error);
            return;
        }

        self.dispatch(Action::ClearDiscovered);
        self.dispatch(Action::SetScanning(true));
        self.dispatch(Action::SetError(None));

        match self.binding.start_scan(ScanFilter::default()).await {
            Ok(results) => {
                self.scan = Some(ScanSession {
                    results,
                    expiry: Box::pin(sleep(self.config.scan_duration)),
                });
                info!("Started BLE scan for {:?}", self.config.scan_duration);
            }
            Err(e) => {
                error!("Failed to start BLE scan: {}", e);
                self.dispatch(Action::SetScanning(false));
                self.set_error(SessionError::new(ErrorKind::ScanFailed));
            }
        }
    }

    async fn stop_scan(&mut self) {
        if let Some(scan) = self.scan.take() {
            drop(scan);
            match self.binding.stop_scan().await {
                Ok(()) => info!("Stopped BLE scan"),
                Err(e) => warn!("Failed to stop BLE scan: {}", e),
            }
        }
        self.dispatch(Action::SetScanning(false));
    }

    async fn handle_scan_signal(&mut self, signal: ScanSignal) {
        match signal {
            ScanSignal::Result(Some(Ok(advertisement))) => {
                if let Some(device) = DiscoveredDevice::from_advertisement(&advertisement) {
                    debug!("Sighted {}", device);
                    self.dispatch(Action::AddDiscovered(device));
                }
            }
            ScanSignal::Result(Some(Err(e))) => {
                error!("Scan error: {}", e);
                self.scan = None;
                self.set_error(SessionError::new(ErrorKind::ScanFailed));
                self.dispatch(Action::SetScanning(false));
            }
            ScanSignal::Result(None) => {
                debug!("Scan stream ended");
                self.scan = None;
                self.dispatch(Action::SetScanning(false));
            }
            ScanSignal::Expired => {
                debug!("Scan window elapsed");
                self.stop_scan().await;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------------

    async fn connect(&mut self, device: DiscoveredDevice) {
        if let Some(error) = self.adapter_gate() {
            self.set_error(error);
            return;
        }

        if let Some(session) = &self.connection {
            if session.device.address == device.address && self.state.connection_state.is_connected() {
                debug!("Already connected to {}", device.address);
                return;
            }
        }

        if self.scan.is_some() || self.state.is_scanning {
            self.stop_scan().await;
        }

        if self.connection.is_some() {
            info!("Tearing down existing session before connecting to {}", device.address);
            self.disconnect().await;
        }

        self.dispatch(Action::SetConnectionState(ConnectionState::Connecting));
        self.dispatch(Action::SetError(None));

        // Taken before connecting so a drop during setup is still delivered
        let disconnects = match self.binding.on_disconnected(&device.address).await {
            Ok(disconnects) => disconnects,
            Err(e) => {
                error!("Failed to watch {} for disconnection: {}", device.address, e);
                self.fail_connect(e.into_session(ErrorKind::ConnectFailed), None)
                    .await;
                return;
            }
        };

        let link = match self
            .binding
            .connect(&device.address, self.config.connect_timeout)
            .await
        {
            Ok(link) => link,
            Err(e) => {
                error!("Failed to connect to {}: {}", device.address, e);
                self.fail_connect(e.into_session(ErrorKind::ConnectFailed), None)
                    .await;
                return;
            }
        };

        if let Err(error) = verify_uart_service(link.as_ref()).await {
            error!("Rejecting {}: {}", device.address, error);
            self.fail_connect(error, Some(link)).await;
            return;
        }

        let inbound = match link
            .monitor(NUS_SERVICE_UUID, NUS_RX_CHARACTERISTIC_UUID)
            .await
        {
            Ok(inbound) => inbound,
            Err(e) => {
                error!("Failed to subscribe to {}: {}", device.address, e);
                self.fail_connect(e.into_session(ErrorKind::ConnectFailed), Some(link))
                    .await;
                return;
            }
        };

        self.connection = Some(ConnectionSession {
            device: device.clone(),
            link,
            inbound: Some(inbound),
            disconnects: Some(disconnects),
        });
        self.dispatch(Action::SetConnectionState(ConnectionState::Connected));
        self.dispatch(Action::SetConnectedDevice(Some(device.clone())));
        info!("Connected to {}", device);
    }

    /// Failure path for every connect step
    async fn fail_connect(&mut self, error: SessionError, link: Option<Arc<dyn LinkHandle>>) {
        if let Some(link) = link {
            if let Err(e) = self.binding.cancel_connection(link.address()).await {
                warn!("Failed to release link to {}: {}", link.address(), e);
            }
        }
        self.connection = None;
        self.dispatch(Action::SetConnectedDevice(None));
        self.dispatch(Action::SetConnectionState(ConnectionState::Disconnected));
        self.set_error(error);
    }

    async fn disconnect(&mut self) {
        let Some(session) = self.connection.take() else {
            debug!("Disconnect requested with no active session");
            return;
        };

        self.dispatch(Action::SetConnectionState(ConnectionState::Disconnecting));

        let ConnectionSession {
            device,
            link,
            inbound,
            disconnects,
        } = session;
        drop(inbound);
        drop(disconnects);

        if let Err(e) = self.binding.cancel_connection(link.address()).await {
            error!("Failed to disconnect from {}: {}", device.address, e);
            self.set_error(SessionError::new(ErrorKind::DisconnectFailed));
        }
        drop(link);

        self.dispatch(Action::SetConnectedDevice(None));
        self.dispatch(Action::SetConnectionState(ConnectionState::Disconnected));
        self.dispatch(Action::ClearInbound);
        info!("Disconnected from {}", device.address);
    }

    async fn handle_link_signal(&mut self, signal: LinkSignal) {
        match signal {
            LinkSignal::Inbound(Some(Ok(payload))) => {
                self.dispatch(Action::AppendInbound(NusCodec::decode(&payload)));
            }
            LinkSignal::Inbound(Some(Err(e))) => {
                warn!("Data receive error: {}", e);
            }
            LinkSignal::Inbound(None) => {
                debug!("Inbound notification stream ended");
                if let Some(session) = self.connection.as_mut() {
                    session.inbound = None;
                }
            }
            LinkSignal::Disconnected(Some(())) => {
                if let Some(session) = self.connection.take() {
                    warn!("Link to {} dropped", session.device.address);
                }
                self.dispatch(Action::SetConnectedDevice(None));
                self.dispatch(Action::SetConnectionState(ConnectionState::Disconnected));
            }
            LinkSignal::Disconnected(None) => {
                debug!("Disconnect stream ended");
                if let Some(session) = self.connection.as_mut() {
                    session.disconnects = None;
                }
            }
        }
    }

    async fn send_data(&mut self, text: String) {
        let Some(link) = self.connection.as_ref().map(|s| s.link.clone()) else {
            self.set_error(SessionError::new(ErrorKind::NoActiveConnection));
            return;
        };

        let payload = NusCodec::encode(&text);
        match link
            .write(NUS_SERVICE_UUID, NUS_TX_CHARACTERISTIC_UUID, &payload)
            .await
        {
            Ok(()) => debug!("Sent {} bytes to {}", payload.len(), link.address()),
            Err(e) => {
                error!("Failed to send data to {}: {}", link.address(), e);
                self.set_error(SessionError::new(ErrorKind::SendFailed));
            }
        }
    }

    /// Release everything the session holds and stop the loop
    async fn teardown(&mut self) {
        self.stop_scan().await;
        self.disconnect().await;
        self.power_events = None;
        self.running = false;
    }
}

async fn verify_uart_service(link: &dyn LinkHandle) -> Result<(), SessionError> {
    link.discover_all()
        .await
        .map_err(|e| e.into_session(ErrorKind::ConnectFailed))?;
    let services = link
        .services()
        .await
        .map_err(|e| e.into_session(ErrorKind::ConnectFailed))?;
    if !has_uart_service(&services) {
        return Err(SessionError::new(ErrorKind::ServiceNotFound));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Stream Helpers
// ----------------------------------------------------------------------------

/// Next item of an optional subscription; never resolves when there is none
async fn next_item<S>(stream: &mut Option<S>) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    match stream.as_mut() {
        Some(stream) => stream.next().await,
        None => pending().await,
    }
}

async fn next_scan_signal(scan: &mut Option<ScanSession>) -> ScanSignal {
    let Some(scan) = scan.as_mut() else {
        return pending().await;
    };
    tokio::select! {
        result = scan.results.next() => ScanSignal::Result(result),
        _ = &mut scan.expiry => ScanSignal::Expired,
    }
}

async fn next_link_signal(connection: &mut Option<ConnectionSession>) -> LinkSignal {
    let Some(session) = connection.as_mut() else {
        return pending().await;
    };
    tokio::select! {
        item = next_item(&mut session.inbound) => LinkSignal::Inbound(item),
        item = next_item(&mut session.disconnects) => LinkSignal::Disconnected(item),
    }
}
