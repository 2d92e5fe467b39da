//! # Controller State Module
//!
//! Snapshot types describing one DualShock 4 input report, as delivered by the
//! Bluetooth/HID layer.
//!
//! ## Value Ranges
//!
//! | Field | Type | Range | Center / Rest |
//! |-------|------|-------|---------------|
//! | Stick axes | `i8` | -128..=127 | 0 |
//! | Triggers | `u8` | 0..=255 | 0 |
//! | Gyro / Accel axes | `i16` | full range | - |
//! | Touch coordinates | `u16` | sensor range | - |
//! | Battery capacity | `u8` | 0..=100 | - |
//!
//! Index 0 of `sticks` / `triggers` is the left side, index 1 the right side.

use serde::Deserialize;
use std::fmt;

use crate::error::Ds4BridgeError;

/// Maximum number of controllers tracked at the same time.
pub const MAX_SLOTS: u8 = 4;

/// Index of the left stick / trigger.
pub const LEFT: usize = 0;
/// Index of the right stick / trigger.
pub const RIGHT: usize = 1;

/// Number of finger samples in a touchpad report.
pub const TOUCH_POINTS: usize = 2;

/// Bounded index of one connected controller session.
///
/// Slots are assigned by the transport layer. This crate only ever receives
/// them, so the constructor exists mainly to keep untrusted input (replay
/// scripts, configuration) inside `0..MAX_SLOTS`.
///
/// # Examples
///
/// ```
/// use ds4_bridge::controller::state::{ControllerSlot, MAX_SLOTS};
///
/// assert!(ControllerSlot::new(0).is_ok());
/// assert!(ControllerSlot::new(MAX_SLOTS).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "u8")]
pub struct ControllerSlot(u8);

impl ControllerSlot {
    /// Slot 0, always valid.
    pub const FIRST: ControllerSlot = ControllerSlot(0);

    /// Creates a slot, rejecting indices outside `0..MAX_SLOTS`.
    pub fn new(index: u8) -> Result<Self, Ds4BridgeError> {
        if index < MAX_SLOTS {
            Ok(Self(index))
        } else {
            Err(Ds4BridgeError::InvalidSlot(index))
        }
    }

    /// Returns the raw slot index.
    #[must_use]
    pub fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ControllerSlot {
    type Error = Ds4BridgeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ControllerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every button reported by the controller.
///
/// Only a handful drive behavior; the rest still have to be representable
/// because the transport reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Share,
    Options,
    Ps,
    Touchpad,
    Cross,
    Circle,
    Square,
    Triangle,
    L1,
    R1,
    L2,
    R2,
    L3,
    R3,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Set of buttons, stored as a bitmask.
///
/// Used both for edge sets (pressed / released in this report) and for the
/// level set of buttons currently held.
///
/// # Examples
///
/// ```
/// use ds4_bridge::controller::state::{Button, ButtonSet};
///
/// let set = ButtonSet::from_buttons(&[Button::Cross, Button::Ps]);
/// assert!(set.contains(Button::Ps));
/// assert!(!set.contains(Button::Share));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<Button>")]
pub struct ButtonSet(u32);

impl ButtonSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates a set holding the given buttons.
    #[must_use]
    pub fn from_buttons(buttons: &[Button]) -> Self {
        buttons.iter().fold(Self::empty(), |set, &b| set.with(b))
    }

    /// Returns a copy of this set with `button` added.
    #[must_use]
    pub const fn with(self, button: Button) -> Self {
        Self(self.0 | button.bit())
    }

    /// Adds a button to the set.
    pub fn insert(&mut self, button: Button) {
        self.0 |= button.bit();
    }

    /// Checks whether `button` is in the set.
    #[must_use]
    pub const fn contains(self, button: Button) -> bool {
        self.0 & button.bit() != 0
    }

    /// Checks whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<Vec<Button>> for ButtonSet {
    fn from(buttons: Vec<Button>) -> Self {
        Self::from_buttons(&buttons)
    }
}

/// Two-axis analog stick position, centered at 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Stick {
    pub x: i8,
    pub y: i8,
}

/// Three-axis motion sensor sample (gyroscope or accelerometer).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Axis3 {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// One finger sample from the touchpad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
    /// `true` while a finger is touching.
    pub z: bool,
}

/// Battery charge direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryStatus {
    Charging,
    #[default]
    Discharging,
}

impl BatteryStatus {
    /// Text used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BatteryStatus::Charging => "charging",
            BatteryStatus::Discharging => "discharging",
        }
    }
}

/// Battery report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Battery {
    /// Remaining capacity in percent.
    pub capacity: u8,
    pub status: BatteryStatus,
}

/// Snapshot of a controller as of one input report.
///
/// Only valid for the duration of the handler that receives it; nothing in
/// this crate keeps one around for later comparison.
///
/// # Examples
///
/// ```
/// use ds4_bridge::controller::state::{Button, ControllerState};
///
/// let state = ControllerState::default();
/// assert!(!state.buttons_held.contains(Button::Circle));
/// assert_eq!(state.triggers, [0, 0]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ControllerState {
    /// Buttons currently held (level, not edge).
    pub buttons_held: ButtonSet,
    /// Left and right stick.
    pub sticks: [Stick; 2],
    /// Left and right trigger.
    pub triggers: [u8; 2],
    pub gyro: Axis3,
    pub accel: Axis3,
    pub touchpads: [TouchPoint; TOUCH_POINTS],
    pub battery: Battery,
}
