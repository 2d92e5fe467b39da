//! # Discovery Module
//!
//! Entering and leaving Bluetooth discovery (scan and pair).
//!
//! The discovery flag itself belongs to the transport. This module only gives
//! it a named seam ([`DiscoveryController`]) and drives it from the physical
//! button ([`toggle::DiscoveryToggle`]).

pub mod toggle;

use std::sync::Arc;

/// Discovery commands of the controller transport.
///
/// Requesting the state the transport is already in is a no-op on its side.
#[cfg_attr(test, mockall::automock)]
pub trait DiscoveryBackend: Send + Sync {
    fn is_discovering(&self) -> bool;

    /// Start scanning for controllers and pair with the first one found.
    fn begin_discovery(&self);

    fn cancel_discovery(&self);
}

/// Pass-through facade over a [`DiscoveryBackend`].
///
/// Keeps no state of its own.
#[derive(Clone)]
pub struct DiscoveryController {
    backend: Arc<dyn DiscoveryBackend>,
}

impl DiscoveryController {
    #[must_use]
    pub fn new(backend: Arc<dyn DiscoveryBackend>) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn is_discovering(&self) -> bool {
        self.backend.is_discovering()
    }

    pub fn begin_discovery(&self) {
        self.backend.begin_discovery();
    }

    pub fn cancel_discovery(&self) {
        self.backend.cancel_discovery();
    }
}

impl std::fmt::Debug for DiscoveryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryController").finish_non_exhaustive()
    }
}
