//! GPIO assignments for the sensor node board.
//!
//! Single source of truth: drivers reference this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Status LED (common-cathode RGB, one LEDC channel per colour)
// ---------------------------------------------------------------------------

pub const LED_RED_GPIO: i32 = 21;
pub const LED_GREEN_GPIO: i32 = 22;
pub const LED_BLUE_GPIO: i32 = 23;

/// LEDC PWM frequency for the status LED.
pub const LED_PWM_FREQ_HZ: u32 = 5_000;
