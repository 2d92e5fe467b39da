//! # Controller Link Module
//!
//! Connection-management commands offered by the Bluetooth transport.

use crate::controller::state::ControllerSlot;

/// Connection commands of the controller transport.
#[cfg_attr(test, mockall::automock)]
pub trait ControllerLink: Send + Sync {
    /// Request disconnection of `slot`.
    ///
    /// Returns `true` if the transport accepted the request. No further
    /// detail is available on failure.
    fn disconnect(&self, slot: ControllerSlot) -> bool;
}
