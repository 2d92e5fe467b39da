//! # Controller Module
//!
//! DualShock 4 controller events and input mapping.
//!
//! This module handles:
//! - Controller state snapshots and bounded slot indices
//! - The event payloads delivered by the transport
//! - Mapping input reports to LED, rumble and diagnostics

pub mod events;
pub mod mapper;
pub mod state;
