//! Bluetooth permission gate
//!
//! Scanning needs platform authorization on some targets. The gate decides which
//! permissions a platform needs and asks a [`PermissionRequester`] for them; the
//! requester is whatever actually prompts the user.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BindingError;

/// Android API level from which scan/connect permissions replace the location grant
pub const ANDROID_SPLIT_PERMISSIONS_API: u32 = 31;

/// Target platform, as far as Bluetooth permissions are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    /// Permission is requested by the system on first use
    Ios,
    Android { api_level: u32 },
    /// Linux, macOS and Windows desktops; no runtime grant
    Desktop,
}

impl Platform {
    /// Whether BLE access is implicit on this platform
    pub fn is_implicit(&self) -> bool {
        !matches!(self, Platform::Android { .. })
    }

    /// Permissions required before scanning
    pub fn required_permissions(&self) -> Vec<Permission> {
        match self {
            Platform::Android { api_level } if *api_level >= ANDROID_SPLIT_PERMISSIONS_API => {
                vec![
                    Permission::BluetoothScan,
                    Permission::BluetoothConnect,
                    Permission::AccessFineLocation,
                ]
            }
            Platform::Android { .. } => vec![Permission::AccessFineLocation],
            Platform::Ios | Platform::Desktop => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    BluetoothScan,
    BluetoothConnect,
    AccessFineLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionResult {
    Granted,
    Denied,
    NeverAskAgain,
}

/// Capability that prompts the user for platform permissions
#[async_trait]
pub trait PermissionRequester: Send + Sync + 'static {
    async fn request(
        &self,
        permissions: &[Permission],
    ) -> Result<Vec<(Permission, PermissionResult)>, BindingError>;

    /// Send the user to the system settings page for this app
    fn open_settings(&self);
}

/// Single async check consumed by the session before scanning
#[async_trait]
pub trait PermissionGate: Send + Sync + 'static {
    /// Returns true only when every required permission is granted
    async fn check(&self) -> bool;

    /// Direct the user to system settings after a denial. Changes no session state.
    fn open_settings(&self);
}

/// Last known outcome of the gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionStatus {
    pub granted: bool,
    pub checked: bool,
    pub requesting: bool,
}

// ----------------------------------------------------------------------------
// Platform Permission Gate
// ----------------------------------------------------------------------------

/// Gate that resolves permissions for a given platform
pub struct PlatformPermissionGate<R> {
    platform: Platform,
    requester: R,
    status: Mutex<PermissionStatus>,
}

impl<R: PermissionRequester> PlatformPermissionGate<R> {
    pub fn new(platform: Platform, requester: R) -> Self {
        let implicit = platform.is_implicit();
        Self {
            platform,
            requester,
            status: Mutex::new(PermissionStatus {
                granted: implicit,
                checked: implicit,
                requesting: false,
            }),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn status(&self) -> PermissionStatus {
        self.status.lock().map(|s| *s).unwrap_or_default()
    }

    fn set_status(&self, update: impl FnOnce(&mut PermissionStatus)) {
        if let Ok(mut status) = self.status.lock() {
            update(&mut status);
        }
    }

    async fn request_all(&self, required: &[Permission]) -> bool {
        match self.requester.request(required).await {
            Ok(results) => required.iter().all(|permission| {
                results
                    .iter()
                    .any(|(p, r)| p == permission && *r == PermissionResult::Granted)
            }),
            Err(e) => {
                warn!("Permission request failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl<R: PermissionRequester> PermissionGate for PlatformPermissionGate<R> {
    async fn check(&self) -> bool {
        let required = self.platform.required_permissions();
        if required.is_empty() {
            self.set_status(|s| {
                *s = PermissionStatus {
                    granted: true,
                    checked: true,
                    requesting: false,
                }
            });
            return true;
        }

        self.set_status(|s| s.requesting = true);
        let granted = self.request_all(&required).await;
        debug!("Bluetooth permissions {:?} granted: {}", required, granted);
        self.set_status(|s| {
            *s = PermissionStatus {
                granted,
                checked: true,
                requesting: false,
            }
        });
        granted
    }

    fn open_settings(&self) {
        self.requester.open_settings();
    }
}

// ----------------------------------------------------------------------------
// Implicit Permission
// ----------------------------------------------------------------------------

/// Gate for platforms where BLE access needs no runtime grant
#[derive(Debug, Clone, Copy, Default)]
pub struct ImplicitPermission;

#[async_trait]
impl PermissionGate for ImplicitPermission {
    async fn check(&self) -> bool {
        true
    }

    fn open_settings(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubRequester {
        deny: Option<Permission>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl StubRequester {
        fn granting() -> Self {
            Self {
                deny: None,
                fail: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl PermissionRequester for StubRequester {
        async fn request(
            &self,
            permissions: &[Permission],
        ) -> Result<Vec<(Permission, PermissionResult)>, BindingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BindingError::Other("dialog dismissed".to_string()));
            }
            Ok(permissions
                .iter()
                .map(|p| {
                    let result = if Some(*p) == self.deny {
                        PermissionResult::Denied
                    } else {
                        PermissionResult::Granted
                    };
                    (*p, result)
                })
                .collect())
        }

        fn open_settings(&self) {}
    }

    #[test]
    fn test_required_permissions_by_api_level() {
        assert_eq!(
            Platform::Android { api_level: 33 }.required_permissions(),
            vec![
                Permission::BluetoothScan,
                Permission::BluetoothConnect,
                Permission::AccessFineLocation
            ]
        );
        assert_eq!(
            Platform::Android { api_level: 30 }.required_permissions(),
            vec![Permission::AccessFineLocation]
        );
        assert!(Platform::Ios.required_permissions().is_empty());
        assert!(Platform::Desktop.required_permissions().is_empty());
    }

    #[test]
    fn test_implicit_platform_never_prompts() {
        let requester = StubRequester::granting();
        let calls = requester.calls.clone();
        let gate = PlatformPermissionGate::new(Platform::Ios, requester);
        assert!(gate.status().granted);
        assert!(tokio_test::block_on(gate.check()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_android_requires_every_grant() {
        let gate = PlatformPermissionGate::new(
            Platform::Android { api_level: 31 },
            StubRequester::granting(),
        );
        assert!(!gate.status().checked);
        assert!(gate.check().await);
        assert_eq!(
            gate.status(),
            PermissionStatus {
                granted: true,
                checked: true,
                requesting: false
            }
        );

        let mut requester = StubRequester::granting();
        requester.deny = Some(Permission::BluetoothConnect);
        let gate = PlatformPermissionGate::new(Platform::Android { api_level: 34 }, requester);
        assert!(!gate.check().await);
        assert!(gate.status().checked);
        assert!(!gate.status().granted);
    }

    #[tokio::test]
    async fn test_requester_failure_is_denial() {
        let mut requester = StubRequester::granting();
        requester.fail = true;
        let gate = PlatformPermissionGate::new(Platform::Android { api_level: 29 }, requester);
        assert!(!gate.check().await);
    }
}
