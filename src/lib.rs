//! # DS4 Bridge Library
//!
//! React to DualShock 4 controller events on an embedded host.
//!
//! This library provides the application layer that sits on top of a
//! Bluetooth/HID controller stack: it maps input reports to light bar colors,
//! rumble and diagnostics, logs connection and pairing events, and toggles
//! discovery from a physical button.

pub mod actuator;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod link;
pub mod replay;
