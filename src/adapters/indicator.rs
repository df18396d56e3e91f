//! Status indicator adapter.
//!
//! [`SignalIndicator`] implements [`IndicatorSink`] by overwriting an
//! `embassy-sync` [`Signal`]: `display` never blocks and only the latest
//! kind is kept.  [`led_task`] runs on the same executor as the
//! orchestrator, picks up the latest kind every animation step and drives
//! the [`StatusLed`] through the pattern engine.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::app::commands::IndicatorKind;
use crate::app::ports::IndicatorSink;
use crate::drivers::led_patterns::LedPatternEngine;
use crate::drivers::status_led::StatusLed;

/// Latest-wins slot between the orchestrator and the LED task.
pub type IndicatorSignal = Signal<CriticalSectionRawMutex, IndicatorKind>;

pub struct SignalIndicator<'a> {
    signal: &'a IndicatorSignal,
}

impl<'a> SignalIndicator<'a> {
    pub fn new(signal: &'a IndicatorSignal) -> Self {
        Self { signal }
    }
}

impl IndicatorSink for SignalIndicator<'_> {
    fn display(&mut self, kind: IndicatorKind) {
        debug!("Indicator: {:?}", kind);
        self.signal.signal(kind);
    }
}

/// Apply the latest signalled kind (if any) and advance one step.
pub fn animate_step<R, G, B>(
    signal: &IndicatorSignal,
    engine: &mut LedPatternEngine,
    led: &mut StatusLed<R, G, B>,
    tick_ms: u32,
) where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    if let Some(kind) = signal.try_take() {
        engine.show(kind);
    }
    led.set_colour(engine.tick(tick_ms));
}

/// LED animation loop.  Never returns.
pub async fn led_task<R, G, B>(signal: &IndicatorSignal, mut led: StatusLed<R, G, B>, tick_ms: u32)
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    let mut engine = LedPatternEngine::new();
    led.off();
    loop {
        animate_step(signal, &mut engine, &mut led, tick_ms);
        Timer::after_millis(u64::from(tick_ms)).await;
    }
}
