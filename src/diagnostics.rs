//! # Diagnostics Module
//!
//! One-shot diagnostic lines produced while reacting to controller events.
//!
//! Diagnostics are values first and log lines second: handlers hand them to a
//! [`DiagnosticSink`], and the production sink ([`TracingSink`]) writes them
//! through `tracing`. The text of each line is fixed by its `Display` impl.

use std::fmt;
use tracing::{info, warn};

use crate::controller::state::{Axis3, BatteryStatus, Button, ControllerSlot};

/// A single diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Battery report requested with the share button.
    Battery {
        slot: ControllerSlot,
        capacity: u8,
        status: BatteryStatus,
    },
    /// Outcome of a disconnect request.
    Disconnect {
        slot: ControllerSlot,
        success: bool,
    },
    /// Edge of a button that has an edge diagnostic attached.
    ButtonEdge { button: Button, pressed: bool },
    /// Gyroscope sample (circle held).
    Gyro(Axis3),
    /// Accelerometer sample (triangle held).
    Accel(Axis3),
    /// Finger contact on the touchpad; `finger` is 1-based.
    Touch { finger: usize, x: u16, y: u16 },
    /// Discovery button pressed while discovering.
    ScanCancel,
    /// Discovery button pressed while idle.
    ScanStart,
    Connection {
        slot: ControllerSlot,
        address: String,
        connected: bool,
    },
    Paired { address: String },
    DiscoveryStarted,
    DiscoveryStopped,
}

impl Diagnostic {
    /// Whether this diagnostic reports a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Diagnostic::Disconnect { success: false, .. })
    }
}

/// Short label printed for a button in edge diagnostics.
fn button_label(button: Button) -> &'static str {
    match button {
        Button::Cross => "X",
        Button::Circle => "O",
        Button::Square => "SQUARE",
        Button::Triangle => "TRIANGLE",
        Button::Share => "SHARE",
        Button::Options => "OPTIONS",
        Button::Ps => "PS",
        Button::Touchpad => "TOUCHPAD",
        Button::L1 => "L1",
        Button::R1 => "R1",
        Button::L2 => "L2",
        Button::R2 => "R2",
        Button::L3 => "L3",
        Button::R3 => "R3",
        Button::Up => "UP",
        Button::Down => "DOWN",
        Button::Left => "LEFT",
        Button::Right => "RIGHT",
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Battery {
                slot,
                capacity,
                status,
            } => write!(
                f,
                "Controller #{} battery: {}%({})",
                slot,
                capacity,
                status.as_str()
            ),
            Diagnostic::Disconnect { slot, success } => write!(
                f,
                "Disconnect controller #{}: {}",
                slot,
                if *success { "success" } else { "fail" }
            ),
            Diagnostic::ButtonEdge { button, pressed } => write!(
                f,
                "{} {}",
                button_label(*button),
                if *pressed { "DOWN" } else { "UP" }
            ),
            Diagnostic::Gyro(s) => write!(
                f,
                "Gyroscope PITCH: {:05}, YAW: {:05}, ROLL: {:05}",
                s.x, s.y, s.z
            ),
            Diagnostic::Accel(s) => write!(
                f,
                "Accelerometer X: {:05}, Y: {:05}, Z: {:05}",
                s.x, s.y, s.z
            ),
            Diagnostic::Touch { finger, x, y } => {
                write!(f, "Finger #{} X:{:04}, Y: {:04}", finger, x, y)
            }
            Diagnostic::ScanCancel => f.write_str("Button: cancel scan."),
            Diagnostic::ScanStart => f.write_str("Button: start scan."),
            Diagnostic::Connection {
                slot,
                address,
                connected,
            } => write!(
                f,
                "Controller #{}({}) {}",
                slot,
                address,
                if *connected { "connected" } else { "disconnected" }
            ),
            Diagnostic::Paired { address } => write!(f, "Controller paired({})", address),
            Diagnostic::DiscoveryStarted => f.write_str("Device discovery started..."),
            Diagnostic::DiscoveryStopped => f.write_str("Device discovery stopped."),
        }
    }
}

/// Destination for diagnostics.
///
/// Implementations must not block: the discovery button handler emits from
/// interrupt context.
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Writes diagnostics as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        if diagnostic.is_failure() {
            warn!("{}", diagnostic);
        } else {
            info!("{}", diagnostic);
        }
    }
}
