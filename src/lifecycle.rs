//! # Lifecycle Module
//!
//! Handlers for connection, pairing and discovery state events. These only
//! log, apart from the pairing indicator.

use std::sync::Arc;

use crate::actuator::{Actuator, LedColor};
use crate::controller::events::{ConnectionEvent, PairedEvent};
use crate::controller::state::ControllerSlot;
use crate::diagnostics::{Diagnostic, DiagnosticSink};

/// Slot whose LED signals a successful pairing.
///
/// The paired event carries no slot, so the indicator always goes to this
/// slot, whichever slot the new controller actually landed in.
pub const PAIRED_LED_SLOT: ControllerSlot = ControllerSlot::FIRST;

/// Color shown after a successful pairing.
pub const PAIRED_LED_COLOR: LedColor = LedColor::GREEN;

/// Where the pairing indicator is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairedLedPolicy {
    /// Light `PAIRED_LED_COLOR` on a fixed slot.
    FixedSlot(ControllerSlot),
    /// No LED command on pairing.
    Disabled,
}

impl Default for PairedLedPolicy {
    fn default() -> Self {
        PairedLedPolicy::FixedSlot(PAIRED_LED_SLOT)
    }
}

/// Logs lifecycle events and shows the pairing indicator.
#[derive(Clone)]
pub struct LifecycleLogger {
    actuator: Arc<dyn Actuator>,
    sink: Arc<dyn DiagnosticSink>,
    paired_led: PairedLedPolicy,
}

impl LifecycleLogger {
    #[must_use]
    pub fn new(
        actuator: Arc<dyn Actuator>,
        sink: Arc<dyn DiagnosticSink>,
        paired_led: PairedLedPolicy,
    ) -> Self {
        Self {
            actuator,
            sink,
            paired_led,
        }
    }

    pub fn on_connection(&self, event: &ConnectionEvent) {
        self.sink.emit(Diagnostic::Connection {
            slot: event.slot,
            address: event.address.clone(),
            connected: event.connected,
        });
    }

    pub fn on_paired(&self, event: &PairedEvent) {
        if let PairedLedPolicy::FixedSlot(slot) = self.paired_led {
            self.actuator.set_led(slot, PAIRED_LED_COLOR);
        }
        self.sink.emit(Diagnostic::Paired {
            address: event.address.clone(),
        });
    }

    pub fn on_discovery_started(&self) {
        self.sink.emit(Diagnostic::DiscoveryStarted);
    }

    pub fn on_discovery_stopped(&self) {
        self.sink.emit(Diagnostic::DiscoveryStopped);
    }
}

impl std::fmt::Debug for LifecycleLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleLogger")
            .field("paired_led", &self.paired_led)
            .finish_non_exhaustive()
    }
}
