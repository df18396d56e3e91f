//! Application core: pure domain logic, zero I/O.
//!
//! The connectivity orchestrator, its inbound events and outbound
//! commands.  All interaction with the radio, the LED and the HTTP facade
//! happens through the **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod orchestrator;
pub mod ports;
