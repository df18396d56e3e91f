//! WxNode firmware library: connectivity core.
//!
//! Exposes the pure-logic modules for integration testing and the adapters
//! used by the binary.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod bridge;
pub mod config;
pub mod error;
pub mod fsm;
pub mod mailbox;
pub mod pins;
pub mod runtime;

pub mod adapters;
pub mod drivers;
