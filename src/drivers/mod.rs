//! LED drivers and task placement helpers.

pub mod led_patterns;
pub mod status_led;
pub mod task_pin;
