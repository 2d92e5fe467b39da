//! # Input Mapper Module
//!
//! Turns one [`InputEvent`] into actuator commands and diagnostics.
//!
//! ## Rules
//!
//! Every rule is evaluated on every event, in this order, and all matching
//! rules fire:
//!
//! | # | Condition | Effect |
//! |---|-----------|--------|
//! | 1 | share pressed | battery diagnostic |
//! | 2 | PS pressed | LED off, disconnect, outcome diagnostic |
//! | 3 | cross pressed / released | `X DOWN` / `X UP` |
//! | 4 | either stick moved | LED color from stick position |
//! | 5 | either trigger moved | rumble, right trigger on the heavy motor |
//! | 6 | circle held and gyro moved | gyroscope diagnostic |
//! | 7 | triangle held and accel moved | accelerometer diagnostic |
//! | 8 | finger touching (per finger) | touch diagnostic |
//!
//! Rules are plain functions from the event to a list of [`Effect`]s, so each
//! one can be checked on its own. [`InputMapper`] runs them in table order and
//! executes the effects against the collaborators. Because rule 2 runs before
//! rule 4, a stick move in the same report as a PS press repaints the LED
//! after it was switched off.
//!
//! ## LED Color
//!
//! ```text
//! l = 255 - (127 - right.y)
//! r = (127 - left.y)  * l / 255
//! g = (127 - left.x)  * l / 255
//! b = (127 - right.x) * l / 255
//! ```
//!
//! With signed axes this puts full brightness at `right.y == 127` and a
//! channel at zero when its axis is at `127`. A centered stick gives
//! `l == 128` and channels of `63`.
//!
//! ## Usage
//!
//! ```
//! use ds4_bridge::controller::events::InputEvent;
//! use ds4_bridge::controller::mapper::{plan, Effect};
//! use ds4_bridge::controller::state::ControllerSlot;
//!
//! let mut event = InputEvent::new(ControllerSlot::new(0)?);
//! event.trigger_moved[1] = true;
//! event.state.triggers = [10, 200];
//!
//! assert_eq!(plan(&event), vec![Effect::Rumble { heavy: 200, light: 10 }]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;
use tracing::debug;

use super::events::InputEvent;
use super::state::{Button, Stick, LEFT, RIGHT};
use crate::actuator::{Actuator, LedColor};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::link::ControllerLink;

/// Axis value subtracted from in the LED formula.
pub const STICK_LED_REFERENCE: i32 = 127;

/// Full-scale channel value.
const LED_FULL_SCALE: i32 = 255;

/// Buttons that log their press and release edges.
pub const EDGE_DIAGNOSTIC_BUTTONS: [Button; 1] = [Button::Cross];

/// Side effect requested by a rule. The target slot is the event's slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Led(LedColor),
    Rumble { heavy: u8, light: u8 },
    /// Request disconnection and report the outcome.
    Disconnect,
    Diagnostic(Diagnostic),
}

/// A single mapping rule.
pub type Rule = fn(&InputEvent) -> Vec<Effect>;

/// All rules, in evaluation order.
pub const RULES: [Rule; 8] = [
    battery_report,
    disconnect_on_ps,
    button_edges,
    stick_led,
    trigger_rumble,
    gyro_report,
    accel_report,
    touch_report,
];

/// Brightness factor derived from the right stick's Y axis.
///
/// The result is truncated to 8 bits, the same width the driver takes.
#[must_use]
pub fn brightness(right_y: i8) -> u8 {
    (LED_FULL_SCALE - (STICK_LED_REFERENCE - i32::from(right_y))) as u8
}

fn scale_channel(axis: i8, brightness: u8) -> u8 {
    ((STICK_LED_REFERENCE - i32::from(axis)) * i32::from(brightness) / LED_FULL_SCALE) as u8
}

/// Light bar color for the given stick positions.
///
/// # Examples
///
/// ```
/// use ds4_bridge::actuator::LedColor;
/// use ds4_bridge::controller::mapper::stick_color;
/// use ds4_bridge::controller::state::Stick;
///
/// let full = stick_color(Stick { x: -128, y: -128 }, Stick { x: -128, y: 127 });
/// assert_eq!(full, LedColor::new(255, 255, 255));
/// ```
#[must_use]
pub fn stick_color(left: Stick, right: Stick) -> LedColor {
    let l = brightness(right.y);
    LedColor::new(
        scale_channel(left.y, l),
        scale_channel(left.x, l),
        scale_channel(right.x, l),
    )
}

/// Rule 1: battery report on share press.
pub fn battery_report(event: &InputEvent) -> Vec<Effect> {
    if !event.buttons_down.contains(Button::Share) {
        return Vec::new();
    }
    let battery = event.state.battery;
    vec![Effect::Diagnostic(Diagnostic::Battery {
        slot: event.slot,
        capacity: battery.capacity,
        status: battery.status,
    })]
}

/// Rule 2: PS press switches the LED off, then disconnects.
pub fn disconnect_on_ps(event: &InputEvent) -> Vec<Effect> {
    if !event.buttons_down.contains(Button::Ps) {
        return Vec::new();
    }
    vec![Effect::Led(LedColor::OFF), Effect::Disconnect]
}

/// Rule 3: press / release diagnostics.
pub fn button_edges(event: &InputEvent) -> Vec<Effect> {
    let mut effects = Vec::new();
    for button in EDGE_DIAGNOSTIC_BUTTONS {
        if event.buttons_down.contains(button) {
            effects.push(Effect::Diagnostic(Diagnostic::ButtonEdge {
                button,
                pressed: true,
            }));
        }
        if event.buttons_up.contains(button) {
            effects.push(Effect::Diagnostic(Diagnostic::ButtonEdge {
                button,
                pressed: false,
            }));
        }
    }
    effects
}

/// Rule 4: recolor the LED when a stick moved.
pub fn stick_led(event: &InputEvent) -> Vec<Effect> {
    if !(event.stick_moved[LEFT] || event.stick_moved[RIGHT]) {
        return Vec::new();
    }
    let sticks = event.state.sticks;
    vec![Effect::Led(stick_color(sticks[LEFT], sticks[RIGHT]))]
}

/// Rule 5: rumble from the triggers. The right trigger drives the heavy motor.
pub fn trigger_rumble(event: &InputEvent) -> Vec<Effect> {
    if !(event.trigger_moved[LEFT] || event.trigger_moved[RIGHT]) {
        return Vec::new();
    }
    let triggers = event.state.triggers;
    vec![Effect::Rumble {
        heavy: triggers[RIGHT],
        light: triggers[LEFT],
    }]
}

/// Rule 6: gyroscope diagnostic while circle is held.
pub fn gyro_report(event: &InputEvent) -> Vec<Effect> {
    if event.state.buttons_held.contains(Button::Circle) && event.gyro_moved {
        vec![Effect::Diagnostic(Diagnostic::Gyro(event.state.gyro))]
    } else {
        Vec::new()
    }
}

/// Rule 7: accelerometer diagnostic while triangle is held.
pub fn accel_report(event: &InputEvent) -> Vec<Effect> {
    if event.state.buttons_held.contains(Button::Triangle) && event.accel_moved {
        vec![Effect::Diagnostic(Diagnostic::Accel(event.state.accel))]
    } else {
        Vec::new()
    }
}

/// Rule 8: one diagnostic per finger in contact.
pub fn touch_report(event: &InputEvent) -> Vec<Effect> {
    event
        .state
        .touchpads
        .iter()
        .enumerate()
        .filter(|(_, point)| point.z)
        .map(|(i, point)| {
            Effect::Diagnostic(Diagnostic::Touch {
                finger: i + 1,
                x: point.x,
                y: point.y,
            })
        })
        .collect()
}

/// Evaluates every rule and returns the effects in execution order.
#[must_use]
pub fn plan(event: &InputEvent) -> Vec<Effect> {
    RULES.iter().flat_map(|rule| rule(event)).collect()
}

/// Executes mapped effects against the actuator, link and diagnostic sink.
///
/// Holds no per-event state; every call depends only on the event passed in.
#[derive(Clone)]
pub struct InputMapper {
    actuator: Arc<dyn Actuator>,
    link: Arc<dyn ControllerLink>,
    sink: Arc<dyn DiagnosticSink>,
}

impl InputMapper {
    /// Creates a mapper wired to the given collaborators.
    #[must_use]
    pub fn new(
        actuator: Arc<dyn Actuator>,
        link: Arc<dyn ControllerLink>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            actuator,
            link,
            sink,
        }
    }

    /// Handles one input event.
    ///
    /// A failed disconnect is reported through the sink and otherwise
    /// ignored; nothing is retried.
    pub fn handle(&self, event: &InputEvent) {
        let slot = event.slot;
        for effect in plan(event) {
            match effect {
                Effect::Led(color) => self.actuator.set_led(slot, color),
                Effect::Rumble { heavy, light } => self.actuator.set_rumble(slot, heavy, light),
                Effect::Disconnect => {
                    let success = self.link.disconnect(slot);
                    debug!("Disconnect request for slot {} returned {}", slot, success);
                    self.sink.emit(Diagnostic::Disconnect { slot, success });
                }
                Effect::Diagnostic(diagnostic) => self.sink.emit(diagnostic),
            }
        }
    }
}

impl std::fmt::Debug for InputMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputMapper").finish_non_exhaustive()
    }
}
