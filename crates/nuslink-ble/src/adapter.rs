//! Adapter binding backed by a btleplug central

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::stream::{self, StreamExt};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use nuslink_core::{
    AdapterBinding, Advertisement, BindingError, LinkHandle, RadioState, ScanFilter, Subscription,
};

use crate::config::BleBindingConfig;
use crate::error::BleBindingError;
use crate::link::BtleLink;

/// Stable key for a peripheral; what the session sees as a device address
pub(crate) fn peripheral_key(peripheral: &Peripheral) -> String {
    peripheral.address().to_string()
}

// ----------------------------------------------------------------------------
// Binding
// ----------------------------------------------------------------------------

/// [`AdapterBinding`] over the first (or configured) system BLE adapter
pub struct BtleBinding {
    adapter: Adapter,
    config: BleBindingConfig,
}

impl BtleBinding {
    pub async fn new() -> Result<Self, BleBindingError> {
        Self::with_config(BleBindingConfig::default()).await
    }

    pub async fn with_config(config: BleBindingConfig) -> Result<Self, BleBindingError> {
        let manager = Manager::new()
            .await
            .map_err(|e| BleBindingError::Manager(e.to_string()))?;

        let mut adapters = manager.adapters().await?;
        if config.adapter_index >= adapters.len() {
            warn!(
                "Adapter {} requested, {} available",
                config.adapter_index,
                adapters.len()
            );
            return Err(BleBindingError::AdapterNotAvailable);
        }

        let adapter = adapters.swap_remove(config.adapter_index);
        match adapter.adapter_info().await {
            Ok(info) => info!("Using BLE adapter {}", info),
            Err(e) => warn!("BLE adapter initialized without info: {}", e),
        }
        Ok(Self { adapter, config })
    }

    pub fn config(&self) -> &BleBindingConfig {
        &self.config
    }

    /// Find a known peripheral by its address key
    async fn find_peripheral(&self, address: &str) -> Result<Peripheral, BleBindingError> {
        self.adapter
            .peripherals()
            .await?
            .into_iter()
            .find(|p| peripheral_key(p) == address)
            .ok_or_else(|| BleBindingError::DeviceNotFound {
                address: address.to_string(),
            })
    }
}

/// Build the session's view of an advertisement from the peripheral's latest properties
async fn advertisement_for(adapter: &Adapter, id: &PeripheralId) -> Option<Advertisement> {
    let peripheral = match adapter.peripheral(id).await {
        Ok(peripheral) => peripheral,
        Err(e) => {
            debug!("Sighted peripheral vanished: {}", e);
            return None;
        }
    };
    let properties = match peripheral.properties().await {
        Ok(Some(properties)) => properties,
        Ok(None) => return None,
        Err(e) => {
            debug!("Failed to read peripheral properties: {}", e);
            return None;
        }
    };
    Some(Advertisement {
        id: peripheral_key(&peripheral),
        name: properties.local_name,
        rssi: properties.rssi,
    })
}

async fn is_peripheral(adapter: &Adapter, id: &PeripheralId, address: &str) -> bool {
    match adapter.peripheral(id).await {
        Ok(peripheral) => peripheral_key(&peripheral) == address,
        Err(_) => false,
    }
}

#[async_trait]
impl AdapterBinding for BtleBinding {
    async fn power_state(&self) -> Result<RadioState, BindingError> {
        // btleplug has no portable power query; a reachable adapter is treated as on
        match self.adapter.adapter_info().await {
            Ok(_) => Ok(RadioState::PoweredOn),
            Err(e) => {
                warn!("Adapter not reachable: {}", e);
                Err(BleBindingError::AdapterNotAvailable.into())
            }
        }
    }

    async fn power_state_changes(&self) -> Result<Subscription<RadioState>, BindingError> {
        Ok(stream::pending::<RadioState>().boxed())
    }

    fn supports_enable(&self) -> bool {
        false
    }

    async fn enable(&self) -> Result<(), BindingError> {
        Err(BleBindingError::Unsupported("enabling the adapter".to_string()).into())
    }

    async fn start_scan(
        &self,
        filter: ScanFilter,
    ) -> Result<Subscription<Result<Advertisement, BindingError>>, BindingError> {
        let events = self
            .adapter
            .events()
            .await
            .map_err(BleBindingError::from)?;

        self.adapter
            .start_scan(btleplug::api::ScanFilter {
                services: filter.services,
            })
            .await
            .map_err(|e| {
                error!("Failed to start BLE scan: {}", e);
                BleBindingError::from(e)
            })?;
        info!("Started BLE scan");

        let adapter = self.adapter.clone();
        let results = events.filter_map(move |event| {
            let adapter = adapter.clone();
            async move {
                match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                        advertisement_for(&adapter, &id).await.map(Ok::<_, BindingError>)
                    }
                    _ => None,
                }
            }
        });
        Ok(results.boxed())
    }

    async fn stop_scan(&self) -> Result<(), BindingError> {
        self.adapter
            .stop_scan()
            .await
            .map_err(BleBindingError::from)?;
        debug!("Stopped BLE scan");
        Ok(())
    }

    async fn connect(
        &self,
        address: &str,
        connect_timeout: Duration,
    ) -> Result<Arc<dyn LinkHandle>, BindingError> {
        let peripheral = self.find_peripheral(address).await?;

        match timeout(connect_timeout, peripheral.connect()).await {
            Ok(Ok(())) => info!("Connected to {}", address),
            Ok(Err(e)) => {
                error!("Failed to connect to {}: {}", address, e);
                return Err(BleBindingError::ConnectionFailed(e.to_string()).into());
            }
            Err(_) => {
                error!("Connection to {} timed out", address);
                // Abandon the pending attempt so the stack does not finish it later
                if let Err(e) = peripheral.disconnect().await {
                    debug!("Failed to abandon connection to {}: {}", address, e);
                }
                return Err(BleBindingError::ConnectionTimeout.into());
            }
        }

        Ok(Arc::new(BtleLink::new(
            address.to_string(),
            peripheral,
            self.config.clone(),
        )))
    }

    async fn cancel_connection(&self, address: &str) -> Result<(), BindingError> {
        let peripheral = match self.find_peripheral(address).await {
            Ok(peripheral) => peripheral,
            Err(BleBindingError::DeviceNotFound { .. }) => {
                debug!("{} already gone, nothing to release", address);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if peripheral.is_connected().await.map_err(BleBindingError::from)? {
            peripheral
                .disconnect()
                .await
                .map_err(BleBindingError::from)?;
            info!("Disconnected from {}", address);
        }
        Ok(())
    }

    async fn on_disconnected(&self, address: &str) -> Result<Subscription<()>, BindingError> {
        let events = self
            .adapter
            .events()
            .await
            .map_err(BleBindingError::from)?;

        let adapter = self.adapter.clone();
        let address = address.to_string();
        let disconnects = events.filter_map(move |event| {
            let adapter = adapter.clone();
            let address = address.clone();
            async move {
                match event {
                    CentralEvent::DeviceDisconnected(id) => {
                        is_peripheral(&adapter, &id, &address).await.then_some(())
                    }
                    _ => None,
                }
            }
        });
        Ok(disconnects.boxed())
    }
}
