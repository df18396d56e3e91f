//! LED pattern engine.
//!
//! Maps the orchestrator's [`IndicatorKind`]s to time-varying RGB output.
//! The LED task calls [`LedPatternEngine::tick`] every animation step and
//! feeds the result into
//! [`StatusLed::set_colour`](super::status_led::StatusLed::set_colour).
//!
//! | Indicator        | Colour  | Pattern        |
//! |------------------|---------|----------------|
//! | Startup          | Magenta | Solid          |
//! | ServiceReady     | Amber   | Solid          |
//! | LinkEstablished  | Green   | Solid          |
//! | Fault            | Red     | Blink, 1 Hz    |

use crate::app::commands::IndicatorKind;

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

/// Pattern identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternId {
    Solid,
    /// Square wave, 50 % duty, full cycle in `period_ms`.
    Blink { period_ms: u32 },
    Off,
}

/// A colour plus how to animate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub colour: Rgb,
    pub id: PatternId,
}

pub const COLOUR_STARTUP: Rgb = (255, 0, 255); // Magenta
pub const COLOUR_SERVICE_READY: Rgb = (255, 102, 0); // Amber
pub const COLOUR_LINK: Rgb = (0, 255, 0); // Green
pub const COLOUR_FAULT: Rgb = (255, 0, 0); // Red

/// Fault blink period.
pub const FAULT_BLINK_PERIOD_MS: u32 = 1000;

/// Visual for each indicator kind.
pub const fn pattern_for(kind: IndicatorKind) -> Pattern {
    match kind {
        IndicatorKind::Startup => Pattern {
            colour: COLOUR_STARTUP,
            id: PatternId::Solid,
        },
        IndicatorKind::ServiceReady => Pattern {
            colour: COLOUR_SERVICE_READY,
            id: PatternId::Solid,
        },
        IndicatorKind::LinkEstablished => Pattern {
            colour: COLOUR_LINK,
            id: PatternId::Solid,
        },
        IndicatorKind::Fault => Pattern {
            colour: COLOUR_FAULT,
            id: PatternId::Blink {
                period_ms: FAULT_BLINK_PERIOD_MS,
            },
        },
    }
}

/// LED pattern engine. Stack-allocated, no heap.
pub struct LedPatternEngine {
    phase_ms: u32,
    active: Option<Pattern>,
}

impl LedPatternEngine {
    pub const fn new() -> Self {
        Self {
            phase_ms: 0,
            active: None,
        }
    }

    /// Switch to the visual for `kind`.  Re-showing the current pattern
    /// keeps its phase so a repeated fault does not restart the blink.
    pub fn show(&mut self, kind: IndicatorKind) {
        let next = pattern_for(kind);
        if self.active != Some(next) {
            self.phase_ms = 0;
            self.active = Some(next);
        }
    }

    pub fn current(&self) -> Option<Pattern> {
        self.active
    }

    /// Blank the LED.
    pub fn clear(&mut self) {
        self.active = None;
        self.phase_ms = 0;
    }

    /// Advance the phase by `delta_ms` and return the colour to display.
    pub fn tick(&mut self, delta_ms: u32) -> Rgb {
        let Some(pattern) = self.active else {
            return (0, 0, 0);
        };
        let out = Self::generate(pattern, self.phase_ms);
        self.phase_ms = self.phase_ms.wrapping_add(delta_ms);
        out
    }

    fn generate(pattern: Pattern, phase_ms: u32) -> Rgb {
        match pattern.id {
            PatternId::Solid => pattern.colour,
            PatternId::Off => (0, 0, 0),
            PatternId::Blink { period_ms } => {
                let period = period_ms.max(2);
                if phase_ms % period < period / 2 {
                    pattern.colour
                } else {
                    (0, 0, 0)
                }
            }
        }
    }
}

impl Default for LedPatternEngine {
    fn default() -> Self {
        Self::new()
    }
}
