//! Client-side session manager for BLE serial links over the Nordic UART Service
//!
//! ## Architecture
//!
//! - [`adapter`] - The adapter binding interface the session consumes
//! - [`permission`] - Platform permission gate consulted before scanning
//! - [`session`] - The session state machine: state, reducer and owning task
//! - [`codec`] - Text encoding for the UART characteristics
//! - [`client`] - The facade handed to the presentation layer
//! - [`config`] - Session configuration
//! - [`error`] - Error slot and binding error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nuslink_core::{AdapterBinding, NusClient, SessionConfig};
//!
//! # async fn example(binding: Arc<dyn AdapterBinding>) -> Result<(), Box<dyn std::error::Error>> {
//! let (client, _task) = NusClient::builder(binding)
//!     .with_config(SessionConfig::new())
//!     .spawn();
//!
//! client.start_scan().await?;
//! let mut updates = client.subscribe();
//! let snapshot = updates
//!     .wait_for(|s| !s.discovered_devices.is_empty())
//!     .await?
//!     .clone();
//!
//! client.connect(snapshot.discovered_devices[0].clone()).await?;
//! client.send_data("hello\n").await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod client;
pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod inbound;
pub mod permission;
pub mod protocol;
pub mod session;

pub use adapter::{AdapterBinding, LinkHandle, ScanFilter, Subscription};
pub use client::{ClientError, ClientResult, NusClient, NusClientBuilder};
pub use codec::{NusCodec, DEFAULT_WRITE_MTU};
pub use config::SessionConfig;
pub use device::{AdapterPowerState, Advertisement, ConnectionState, DiscoveredDevice, RadioState};
pub use error::{BindingError, ErrorKind, SessionError};
pub use inbound::InboundLog;
pub use permission::{
    ImplicitPermission, Permission, PermissionGate, PermissionRequester, PermissionResult,
    PermissionStatus, Platform, PlatformPermissionGate,
};
pub use protocol::{NUS_RX_CHARACTERISTIC_UUID, NUS_SERVICE_UUID, NUS_TX_CHARACTERISTIC_UUID};
pub use session::{ClientSnapshot, MANUAL_ENABLE_HINT};
