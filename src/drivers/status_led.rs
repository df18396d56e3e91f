//! RGB status LED driver.
//!
//! Three PWM channels drive a common-cathode RGB LED.  Generic over
//! [`embedded_hal::pwm::SetDutyCycle`] so the same driver runs on LEDC
//! channels on the target and on recording fakes in tests.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `LedcDriver` channels on GPIO 21/22/23.
//! On host/test: [`SimChannel`] tracks duty in-memory only.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use super::led_patterns::Rgb;

pub struct StatusLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
    current: Rgb,
}

impl<R, G, B> StatusLed<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    pub fn new(red: R, green: G, blue: B) -> Self {
        Self {
            red,
            green,
            blue,
            current: (0, 0, 0),
        }
    }

    /// Set the colour.  Unchanged colours skip the PWM writes.
    pub fn set_colour(&mut self, rgb: Rgb) {
        if rgb == self.current {
            return;
        }
        let (r, g, b) = rgb;
        let ok = self.red.set_duty_cycle_fraction(u16::from(r), 255).is_ok()
            & self.green.set_duty_cycle_fraction(u16::from(g), 255).is_ok()
            & self.blue.set_duty_cycle_fraction(u16::from(b), 255).is_ok();
        if ok {
            self.current = rgb;
        } else {
            warn!("StatusLed: PWM write failed for {:?}", rgb);
        }
    }

    pub fn off(&mut self) {
        self.set_colour((0, 0, 0));
    }

    pub fn current_colour(&self) -> Rgb {
        self.current
    }
}

/// In-memory PWM channel for host builds.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimChannel {
    duty: u16,
}

#[cfg(not(target_os = "espidf"))]
impl SimChannel {
    pub fn duty(&self) -> u16 {
        self.duty
    }
}

#[cfg(not(target_os = "espidf"))]
impl embedded_hal::pwm::ErrorType for SimChannel {
    type Error = core::convert::Infallible;
}

#[cfg(not(target_os = "espidf"))]
impl SetDutyCycle for SimChannel {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty;
        Ok(())
    }
}
