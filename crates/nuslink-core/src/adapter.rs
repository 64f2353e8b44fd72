//! Adapter binding interface
//!
//! The session never talks to a radio stack directly. A binding exposes the adapter's
//! primitives and its event streams; the session owns every stream it is handed and
//! cancels a subscription by dropping it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::device::{Advertisement, RadioState};
use crate::error::BindingError;

/// A cancellable event subscription. Dropping it unsubscribes.
pub type Subscription<T> = BoxStream<'static, T>;

/// Optional service filter for scanning; empty means every advertising device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    pub services: Vec<Uuid>,
}

/// Primitives provided by the local BLE adapter
#[async_trait]
pub trait AdapterBinding: Send + Sync + 'static {
    /// Current radio state
    async fn power_state(&self) -> Result<RadioState, BindingError>;

    /// Stream of radio state changes
    async fn power_state_changes(&self) -> Result<Subscription<RadioState>, BindingError>;

    /// Whether the platform allows turning the radio on programmatically
    fn supports_enable(&self) -> bool;

    /// Ask the platform to power the radio on
    async fn enable(&self) -> Result<(), BindingError>;

    /// Start scanning; every sighting or scan failure is delivered on the stream
    async fn start_scan(
        &self,
        filter: ScanFilter,
    ) -> Result<Subscription<Result<Advertisement, BindingError>>, BindingError>;

    async fn stop_scan(&self) -> Result<(), BindingError>;

    /// Establish a link, failing if it is not up within `timeout`
    async fn connect(
        &self,
        address: &str,
        timeout: Duration,
    ) -> Result<Arc<dyn LinkHandle>, BindingError>;

    /// Tear down the link to `address`
    async fn cancel_connection(&self, address: &str) -> Result<(), BindingError>;

    /// Fires when the link to `address` drops without being asked to
    async fn on_disconnected(&self, address: &str) -> Result<Subscription<()>, BindingError>;
}

/// A live link to one peripheral
#[async_trait]
pub trait LinkHandle: Send + Sync {
    fn address(&self) -> &str;

    /// Discover every service and characteristic on the peripheral
    async fn discover_all(&self) -> Result<(), BindingError>;

    /// Services found by the last discovery
    async fn services(&self) -> Result<Vec<Uuid>, BindingError>;

    /// Subscribe to notifications on a characteristic
    async fn monitor(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<Subscription<Result<Vec<u8>, BindingError>>, BindingError>;

    /// Write with response
    async fn write(
        &self,
        service: Uuid,
        characteristic: Uuid,
        payload: &[u8],
    ) -> Result<(), BindingError>;
}
