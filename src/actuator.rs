//! # Actuator Module
//!
//! Boundary to the LED and rumble drivers.
//!
//! Commands are fire-and-forget: there is no acknowledgement and no error
//! path, so a command aimed at a slot that has since disconnected is simply
//! dropped by the driver.

use tracing::debug;

use crate::controller::state::ControllerSlot;

/// RGB color for the controller light bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LedColor {
    /// Light bar off.
    pub const OFF: LedColor = LedColor::new(0, 0, 0);

    /// Solid green.
    pub const GREEN: LedColor = LedColor::new(0, 255, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// LED and rumble driver interface.
#[cfg_attr(test, mockall::automock)]
pub trait Actuator: Send + Sync {
    /// Set the light bar color of `slot`.
    fn set_led(&self, slot: ControllerSlot, color: LedColor);

    /// Set the rumble motors of `slot`. `heavy` drives the first motor.
    fn set_rumble(&self, slot: ControllerSlot, heavy: u8, light: u8);
}

/// Actuator that only logs the commands it receives.
///
/// Used when no driver is attached, e.g. while replaying a script.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingActuator;

impl Actuator for TracingActuator {
    fn set_led(&self, slot: ControllerSlot, color: LedColor) {
        debug!(
            "LED #{} -> r={} g={} b={}",
            slot, color.r, color.g, color.b
        );
    }

    fn set_rumble(&self, slot: ControllerSlot, heavy: u8, light: u8) {
        debug!("Rumble #{} -> heavy={} light={}", slot, heavy, light);
    }
}
