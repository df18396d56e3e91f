//! Connectivity worker.
//!
//! One core-pinned thread runs an `edge-executor` [`LocalExecutor`] with
//! two tasks that share nothing but the indicator signal:
//!
//! ```text
//!  ┌─────────────────────────────────────────────────┐
//!  │  connectivity thread (core 0, prio 5)           │
//!  │  ┌───────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor             │  │
//!  │  │   • Orchestrator::run  ← Mailbox          │  │
//!  │  │   • led_task           ← IndicatorSignal  │  │
//!  │  └───────────────────────────────────────────┘  │
//!  └─────────────────────────────────────────────────┘
//! ```

use std::io;
use std::thread::JoinHandle;

use edge_executor::LocalExecutor;
use embedded_hal::pwm::SetDutyCycle;
use log::{error, info};

use crate::adapters::indicator::{IndicatorSignal, led_task};
use crate::app::orchestrator::Orchestrator;
use crate::app::ports::Ports;
use crate::config::SystemConfig;
use crate::drivers::status_led::StatusLed;
use crate::drivers::task_pin::spawn_on_core;
use crate::mailbox::Mailbox;

/// Drive the orchestrator and the LED animation on the calling thread.
/// Never returns.
pub fn run_connectivity<P, R, G, B>(
    config: SystemConfig,
    mailbox: &Mailbox,
    mut ports: P,
    indicator: &IndicatorSignal,
    led: StatusLed<R, G, B>,
) where
    P: Ports,
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    let executor: LocalExecutor<'_, 4> = LocalExecutor::new();
    let tick_ms = config.led_tick_ms;
    let mut orchestrator = Orchestrator::new(config);

    executor.spawn(led_task(indicator, led, tick_ms)).detach();

    info!("Connectivity worker running (LED step {} ms)", tick_ms);
    futures_lite::future::block_on(
        executor.run(async move { orchestrator.run(mailbox, &mut ports).await }),
    );
}

/// Spawn the connectivity worker with the configured placement.
/// `body` builds the adapters on the worker thread and then calls
/// [`run_connectivity`].
pub fn spawn_connectivity(
    config: &SystemConfig,
    body: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    spawn_on_core(config.connectivity_task, "connectivity\0", body)
}

/// Wait for the worker and log how it ended.  Returns `false` if it
/// panicked.
pub fn supervise(worker: JoinHandle<()>) -> bool {
    let name = worker.thread().name().unwrap_or("worker").to_owned();
    match worker.join() {
        Ok(()) => {
            info!("{} exited", name);
            true
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("non-string panic payload");
            error!("{} panicked: {}", name, reason);
            false
        }
    }
}
