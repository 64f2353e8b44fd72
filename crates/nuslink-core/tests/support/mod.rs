//! In-memory adapter binding for driving the session in tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;
use tokio::time::timeout;
use uuid::Uuid;

use nuslink_core::{
    AdapterBinding, Advertisement, BindingError, ClientSnapshot, DiscoveredDevice, LinkHandle,
    NusClient, RadioState, ScanFilter, Subscription, NUS_SERVICE_UUID,
};

// ----------------------------------------------------------------------------
// Fake Devices
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub services: Vec<Uuid>,
    pub connect_error: Option<BindingError>,
    /// Peripheral goes away while its services are being discovered
    pub drops_during_discovery: bool,
}

impl FakeDevice {
    pub fn uart() -> Self {
        Self {
            services: vec![NUS_SERVICE_UUID],
            connect_error: None,
            drops_during_discovery: false,
        }
    }

    pub fn without_uart() -> Self {
        Self {
            services: vec![Uuid::from_u128(0x0000180F_0000_1000_8000_00805F9B34FB)],
            connect_error: None,
            drops_during_discovery: false,
        }
    }
}

#[derive(Default)]
struct FakeState {
    radio: Option<RadioState>,
    supports_enable: bool,
    enable_error: Option<BindingError>,
    power_tx: Vec<UnboundedSender<RadioState>>,

    start_scan_error: Option<BindingError>,
    scan_tx: Option<UnboundedSender<Result<Advertisement, BindingError>>>,
    scan_starts: usize,
    scan_stops: usize,

    devices: HashMap<String, FakeDevice>,
    connected: HashSet<String>,
    connects: Vec<String>,
    cancels: Vec<String>,
    cancel_error: Option<BindingError>,
    discover_error: Option<BindingError>,
    services_error: Option<BindingError>,
    notify_tx: HashMap<String, UnboundedSender<Result<Vec<u8>, BindingError>>>,
    disconnect_tx: HashMap<String, UnboundedSender<()>>,
    writes: Vec<(String, Uuid, Vec<u8>)>,
    write_error: Option<BindingError>,
    monitor_error: Option<BindingError>,
}

// ----------------------------------------------------------------------------
// Fake Binding
// ----------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct FakeBinding {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBinding {
    pub fn new() -> Self {
        let binding = Self::default();
        binding.lock().radio = Some(RadioState::PoweredOn);
        binding
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn add_device(&self, address: &str, device: FakeDevice) {
        self.lock().devices.insert(address.to_string(), device);
    }

    pub fn set_radio(&self, radio: Option<RadioState>) {
        self.lock().radio = radio;
    }

    pub fn set_supports_enable(&self, supported: bool, error: Option<BindingError>) {
        let mut state = self.lock();
        state.supports_enable = supported;
        state.enable_error = error;
    }

    pub fn set_start_scan_error(&self, error: Option<BindingError>) {
        self.lock().start_scan_error = error;
    }

    pub fn set_write_error(&self, error: Option<BindingError>) {
        self.lock().write_error = error;
    }

    pub fn set_monitor_error(&self, error: Option<BindingError>) {
        self.lock().monitor_error = error;
    }

    /// Releasing a link is still recorded but reports `error`
    pub fn set_cancel_error(&self, error: Option<BindingError>) {
        self.lock().cancel_error = error;
    }

    pub fn set_discover_error(&self, error: Option<BindingError>) {
        self.lock().discover_error = error;
    }

    pub fn set_services_error(&self, error: Option<BindingError>) {
        self.lock().services_error = error;
    }

    pub fn emit_power(&self, radio: RadioState) {
        let mut state = self.lock();
        state.radio = Some(radio);
        state.power_tx.retain(|tx| tx.unbounded_send(radio).is_ok());
    }

    /// Deliver a scan result; false when nobody is listening
    pub fn emit_scan(&self, address: &str, name: Option<&str>, rssi: i16) -> bool {
        let advertisement = Advertisement {
            id: address.to_string(),
            name: name.map(str::to_string),
            rssi: Some(rssi),
        };
        self.send_scan(Ok(advertisement))
    }

    pub fn emit_scan_error(&self, error: BindingError) -> bool {
        self.send_scan(Err(error))
    }

    fn send_scan(&self, item: Result<Advertisement, BindingError>) -> bool {
        self.lock()
            .scan_tx
            .as_ref()
            .map(|tx| tx.unbounded_send(item).is_ok())
            .unwrap_or(false)
    }

    /// Deliver an inbound notification; false when nobody is listening
    pub fn notify(&self, address: &str, payload: &[u8]) -> bool {
        self.lock()
            .notify_tx
            .get(address)
            .map(|tx| tx.unbounded_send(Ok(payload.to_vec())).is_ok())
            .unwrap_or(false)
    }

    pub fn notify_error(&self, address: &str, error: BindingError) -> bool {
        self.lock()
            .notify_tx
            .get(address)
            .map(|tx| tx.unbounded_send(Err(error)).is_ok())
            .unwrap_or(false)
    }

    /// The peripheral goes away on its own
    pub fn drop_link(&self, address: &str) -> bool {
        drop_link(&mut self.lock(), address)
    }

    pub fn is_connected(&self, address: &str) -> bool {
        self.lock().connected.contains(address)
    }

    /// Whether the session still holds either link subscription for `address`
    pub fn has_link_subscribers(&self, address: &str) -> bool {
        let state = self.lock();
        let notify = state
            .notify_tx
            .get(address)
            .map(|tx| !tx.is_closed())
            .unwrap_or(false);
        let disconnect = state
            .disconnect_tx
            .get(address)
            .map(|tx| !tx.is_closed())
            .unwrap_or(false);
        notify || disconnect
    }

    pub fn scan_subscribed(&self) -> bool {
        self.lock()
            .scan_tx
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    pub fn scan_starts(&self) -> usize {
        self.lock().scan_starts
    }

    pub fn scan_stops(&self) -> usize {
        self.lock().scan_stops
    }

    pub fn connects(&self) -> Vec<String> {
        self.lock().connects.clone()
    }

    pub fn cancels(&self) -> Vec<String> {
        self.lock().cancels.clone()
    }

    pub fn writes(&self) -> Vec<(String, Uuid, Vec<u8>)> {
        self.lock().writes.clone()
    }
}

#[async_trait]
impl AdapterBinding for FakeBinding {
    async fn power_state(&self) -> Result<RadioState, BindingError> {
        self.lock().radio.ok_or(BindingError::AdapterNotAvailable)
    }

    async fn power_state_changes(&self) -> Result<Subscription<RadioState>, BindingError> {
        let (tx, rx) = unbounded();
        self.lock().power_tx.push(tx);
        Ok(rx.boxed())
    }

    fn supports_enable(&self) -> bool {
        self.lock().supports_enable
    }

    async fn enable(&self) -> Result<(), BindingError> {
        let mut state = self.lock();
        match state.enable_error.clone() {
            Some(error) => Err(error),
            None => {
                state.radio = Some(RadioState::PoweredOn);
                Ok(())
            }
        }
    }

    async fn start_scan(
        &self,
        filter: ScanFilter,
    ) -> Result<Subscription<Result<Advertisement, BindingError>>, BindingError> {
        assert!(filter.services.is_empty(), "session scans without a service filter");
        let mut state = self.lock();
        if let Some(error) = state.start_scan_error.clone() {
            return Err(error);
        }
        state.scan_starts += 1;
        let (tx, rx) = unbounded();
        state.scan_tx = Some(tx);
        Ok(rx.boxed())
    }

    async fn stop_scan(&self) -> Result<(), BindingError> {
        let mut state = self.lock();
        state.scan_stops += 1;
        state.scan_tx = None;
        Ok(())
    }

    async fn connect(
        &self,
        address: &str,
        _timeout: Duration,
    ) -> Result<Arc<dyn LinkHandle>, BindingError> {
        let mut state = self.lock();
        state.connects.push(address.to_string());
        let device = state
            .devices
            .get(address)
            .cloned()
            .ok_or_else(|| BindingError::DeviceNotFound {
                address: address.to_string(),
            })?;
        if let Some(error) = device.connect_error {
            return Err(error);
        }
        state.connected.insert(address.to_string());
        Ok(Arc::new(FakeLink {
            address: address.to_string(),
            services: device.services,
            drops_during_discovery: device.drops_during_discovery,
            state: self.state.clone(),
        }))
    }

    async fn cancel_connection(&self, address: &str) -> Result<(), BindingError> {
        let mut state = self.lock();
        state.cancels.push(address.to_string());
        state.connected.remove(address);
        match state.cancel_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn on_disconnected(&self, address: &str) -> Result<Subscription<()>, BindingError> {
        let (tx, rx) = unbounded();
        self.lock().disconnect_tx.insert(address.to_string(), tx);
        Ok(rx.boxed())
    }
}

// ----------------------------------------------------------------------------
// Fake Link
// ----------------------------------------------------------------------------

struct FakeLink {
    address: String,
    services: Vec<Uuid>,
    drops_during_discovery: bool,
    state: Arc<Mutex<FakeState>>,
}

fn drop_link(state: &mut FakeState, address: &str) -> bool {
    state.connected.remove(address);
    state
        .disconnect_tx
        .get(address)
        .map(|tx| tx.unbounded_send(()).is_ok())
        .unwrap_or(false)
}

#[async_trait]
impl LinkHandle for FakeLink {
    fn address(&self) -> &str {
        &self.address
    }

    async fn discover_all(&self) -> Result<(), BindingError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.discover_error.clone() {
            return Err(error);
        }
        if self.drops_during_discovery {
            drop_link(&mut state, &self.address);
        }
        Ok(())
    }

    async fn services(&self) -> Result<Vec<Uuid>, BindingError> {
        match self.state.lock().unwrap().services_error.clone() {
            Some(error) => Err(error),
            None => Ok(self.services.clone()),
        }
    }

    async fn monitor(
        &self,
        _service: Uuid,
        _characteristic: Uuid,
    ) -> Result<Subscription<Result<Vec<u8>, BindingError>>, BindingError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.monitor_error.clone() {
            return Err(error);
        }
        let (tx, rx) = unbounded();
        state.notify_tx.insert(self.address.clone(), tx);
        Ok(rx.boxed())
    }

    async fn write(
        &self,
        _service: Uuid,
        characteristic: Uuid,
        payload: &[u8],
    ) -> Result<(), BindingError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.write_error.clone() {
            return Err(error);
        }
        state
            .writes
            .push((self.address.clone(), characteristic, payload.to_vec()));
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Test Utilities
// ----------------------------------------------------------------------------

pub fn device(address: &str, name: &str) -> DiscoveredDevice {
    DiscoveredDevice::new(address, name, Some(-50))
}

/// Wait until the published snapshot satisfies `predicate`
pub async fn wait_for(
    client: &NusClient,
    predicate: impl FnMut(&ClientSnapshot) -> bool,
) -> ClientSnapshot {
    let mut updates = client.subscribe();
    let snapshot = timeout(Duration::from_secs(2), updates.wait_for(predicate))
        .await
        .expect("snapshot condition should be reached within timeout")
        .expect("session task should still be publishing")
        .clone();
    snapshot
}
