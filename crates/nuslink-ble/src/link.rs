//! A connected btleplug peripheral

use async_trait::async_trait;
use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use futures::future::ready;
use futures::stream::StreamExt;
use tracing::debug;
use uuid::Uuid;

use nuslink_core::{BindingError, LinkHandle, NusCodec, Subscription};

use crate::config::BleBindingConfig;
use crate::error::BleBindingError;

// ----------------------------------------------------------------------------
// Link
// ----------------------------------------------------------------------------

pub struct BtleLink {
    address: String,
    peripheral: Peripheral,
    config: BleBindingConfig,
}

impl BtleLink {
    pub(crate) fn new(address: String, peripheral: Peripheral, config: BleBindingConfig) -> Self {
        Self {
            address,
            peripheral,
            config,
        }
    }

    fn characteristic(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<Characteristic, BleBindingError> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == characteristic && c.service_uuid == service)
            .ok_or_else(|| BleBindingError::CharacteristicNotFound {
                characteristic: characteristic.to_string(),
            })
    }

    fn write_type(&self) -> WriteType {
        if self.config.write_with_response {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        }
    }
}

#[async_trait]
impl LinkHandle for BtleLink {
    fn address(&self) -> &str {
        &self.address
    }

    async fn discover_all(&self) -> Result<(), BindingError> {
        self.peripheral
            .discover_services()
            .await
            .map_err(BleBindingError::from)?;
        debug!(
            "Discovered {} services on {}",
            self.peripheral.services().len(),
            self.address
        );
        Ok(())
    }

    async fn services(&self) -> Result<Vec<Uuid>, BindingError> {
        Ok(self
            .peripheral
            .services()
            .into_iter()
            .map(|service| service.uuid)
            .collect())
    }

    async fn monitor(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<Subscription<Result<Vec<u8>, BindingError>>, BindingError> {
        let target = self.characteristic(service, characteristic)?;
        self.peripheral
            .subscribe(&target)
            .await
            .map_err(BleBindingError::from)?;

        let notifications = self
            .peripheral
            .notifications()
            .await
            .map_err(BleBindingError::from)?;
        debug!("Monitoring {} on {}", characteristic, self.address);

        let values = notifications.filter_map(move |notification| {
            let value = (notification.uuid == characteristic).then_some(notification.value);
            ready(value.map(Ok::<_, BindingError>))
        });
        Ok(values.boxed())
    }

    async fn write(
        &self,
        service: Uuid,
        characteristic: Uuid,
        payload: &[u8],
    ) -> Result<(), BindingError> {
        let target = self.characteristic(service, characteristic)?;
        let write_type = self.write_type();

        for chunk in NusCodec::chunks(payload, self.config.write_mtu) {
            self.peripheral
                .write(&target, chunk, write_type)
                .await
                .map_err(BleBindingError::from)?;
        }
        Ok(())
    }
}
