//! btleplug adapter binding for nuslink
//!
//! Implements the `AdapterBinding` and `LinkHandle` traits from `nuslink-core` on top
//! of btleplug's central role, so a session can drive a real radio on Linux, macOS and
//! Windows.
//!
//! - [`config`] - Adapter selection and write settings
//! - [`error`] - btleplug failures and their mapping to binding errors
//! - [`adapter`] - Scanning, connecting and disconnect events
//! - [`link`] - Service discovery, notifications and writes on a connected peripheral
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nuslink_ble::BtleBinding;
//! use nuslink_core::NusClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let binding = BtleBinding::new().await?;
//! let (client, _task) = NusClient::builder(Arc::new(binding)).spawn();
//! client.start_scan().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform Notes
//!
//! btleplug exposes no portable radio power query or power-on request. The binding
//! reports the adapter as powered on while it answers, never publishes power changes,
//! and declines `enable`.

mod adapter;
mod config;
mod error;
mod link;

pub use adapter::BtleBinding;
pub use config::BleBindingConfig;
pub use error::BleBindingError;
pub use link::BtleLink;
