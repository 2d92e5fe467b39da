//! # Controller Events Module
//!
//! The five event kinds the controller transport delivers. Payloads are owned
//! by the dispatcher and only borrowed by handlers for the duration of one
//! call.

use serde::Deserialize;

use super::state::{ButtonSet, ControllerSlot, ControllerState};

/// Identifies which handler an event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connection,
    Input,
    Paired,
    DiscoveryStarted,
    DiscoveryStopped,
}

impl EventKind {
    /// All kinds, in registration order.
    pub const ALL: [EventKind; 5] = [
        EventKind::Connection,
        EventKind::Input,
        EventKind::Paired,
        EventKind::DiscoveryStarted,
        EventKind::DiscoveryStopped,
    ];
}

/// A controller connected or disconnected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionEvent {
    pub slot: ControllerSlot,
    /// Bluetooth address as text, e.g. `"1c:a0:b8:00:11:22"`.
    pub address: String,
    pub connected: bool,
}

/// One input report plus the edge / change flags computed upstream.
///
/// # Examples
///
/// ```
/// use ds4_bridge::controller::events::InputEvent;
/// use ds4_bridge::controller::state::ControllerSlot;
///
/// let event = InputEvent::new(ControllerSlot::new(1)?);
/// assert!(event.buttons_down.is_empty());
/// assert!(!event.gyro_moved);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputEvent {
    pub slot: ControllerSlot,
    #[serde(default)]
    pub state: ControllerState,
    /// Buttons pressed in this report.
    #[serde(default)]
    pub buttons_down: ButtonSet,
    /// Buttons released in this report.
    #[serde(default)]
    pub buttons_up: ButtonSet,
    #[serde(default)]
    pub stick_moved: [bool; 2],
    #[serde(default)]
    pub trigger_moved: [bool; 2],
    #[serde(default)]
    pub gyro_moved: bool,
    #[serde(default)]
    pub accel_moved: bool,
}

impl InputEvent {
    /// Creates an event for `slot` with a resting state and no flags set.
    #[must_use]
    pub fn new(slot: ControllerSlot) -> Self {
        Self {
            slot,
            state: ControllerState::default(),
            buttons_down: ButtonSet::empty(),
            buttons_up: ButtonSet::empty(),
            stick_moved: [false; 2],
            trigger_moved: [false; 2],
            gyro_moved: false,
            accel_moved: false,
        }
    }
}

/// Pairing with a new controller completed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PairedEvent {
    pub address: String,
}

/// Any event delivered by the controller transport.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControllerEvent {
    Connection(ConnectionEvent),
    Input(InputEvent),
    Paired(PairedEvent),
    DiscoveryStarted,
    DiscoveryStopped,
}

impl ControllerEvent {
    /// Returns the kind used to route this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            ControllerEvent::Connection(_) => EventKind::Connection,
            ControllerEvent::Input(_) => EventKind::Input,
            ControllerEvent::Paired(_) => EventKind::Paired,
            ControllerEvent::DiscoveryStarted => EventKind::DiscoveryStarted,
            ControllerEvent::DiscoveryStopped => EventKind::DiscoveryStopped,
        }
    }
}
