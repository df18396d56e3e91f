//! WxNode Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single mailbox-driven connectivity worker.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EspRadio          SignalIndicator      EspHttpService         │
//! │  (RadioPort)       (IndicatorSink)      (ServicePort)          │
//! │      │ WIFI_EVENT / IP_EVENT                 │ POST /wifiConnect│
//! │      ▼                                       ▼                 │
//! │  EventBridge ──────────▶  Mailbox  ◀──────── provisioning      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          Orchestrator (pure FSM + retry policy)        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use wxnode::adapters::indicator::{IndicatorSignal, SignalIndicator};
use wxnode::app::ports::PortSet;
use wxnode::bridge::EventBridge;
use wxnode::config::SystemConfig;
use wxnode::mailbox::Mailbox;
use wxnode::runtime::{run_connectivity, spawn_connectivity};

static MAILBOX: Mailbox = Mailbox::new();
static INDICATOR: IndicatorSignal = IndicatorSignal::new();

fn banner() {
    info!("╔══════════════════════════════════════╗");
    info!("║  WxNode v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
}

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn main() -> Result<()> {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, config::TimerConfig};
    use esp_idf_hal::prelude::*;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::{error, warn};

    use wxnode::adapters::http_service::EspHttpService;
    use wxnode::adapters::radio::EspRadio;
    use wxnode::drivers::status_led::StatusLed;
    use wxnode::pins;
    use wxnode::runtime::supervise;

    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    // The WiFi driver's own chatter drowns the orchestrator log.
    // SAFETY: NUL-terminated literal; call has no other preconditions.
    unsafe {
        esp_idf_svc::sys::esp_log_level_set(
            c"wifi".as_ptr(),
            esp_idf_svc::sys::esp_log_level_t_ESP_LOG_NONE,
        );
    }
    banner();

    // Booting this far confirms a freshly flashed image.
    if let Err(e) = esp_ota::mark_app_valid() {
        warn!("OTA: mark_app_valid failed: {:?}", e);
    }

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config.validate()?;

    // ── 3. Platform handles ───────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 4. Connectivity worker ────────────────────────────────
    let worker_config = config.clone();
    let worker = spawn_connectivity(&config, move || {
        let build = || -> Result<()> {
            let timer = LedcTimerDriver::new(
                peripherals.ledc.timer0,
                &TimerConfig::default().frequency(pins::LED_PWM_FREQ_HZ.Hz()),
            )?;
            let red = LedcDriver::new(peripherals.ledc.channel0, &timer, peripherals.pins.gpio21)?;
            let green =
                LedcDriver::new(peripherals.ledc.channel1, &timer, peripherals.pins.gpio22)?;
            let blue = LedcDriver::new(peripherals.ledc.channel2, &timer, peripherals.pins.gpio23)?;
            info!(
                "Status LED on GPIO {}/{}/{}",
                pins::LED_RED_GPIO,
                pins::LED_GREEN_GPIO,
                pins::LED_BLUE_GPIO
            );

            let radio = EspRadio::new(
                peripherals.modem,
                sysloop,
                Some(nvs),
                EventBridge::new(MAILBOX.sender()),
            )?;
            let ports = PortSet {
                radio,
                indicator: SignalIndicator::new(&INDICATOR),
                service: EspHttpService::new(MAILBOX.sender()),
            };

            run_connectivity(
                worker_config,
                &MAILBOX,
                ports,
                &INDICATOR,
                StatusLed::new(red, green, blue),
            );
            Ok(())
        };
        if let Err(e) = build() {
            error!("Connectivity worker failed to start: {:#}", e);
        }
    })?;

    info!("System ready.");
    supervise(worker);
    Ok(())
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
fn main() -> Result<()> {
    use std::thread;
    use std::time::Duration;

    use wxnode::adapters::http_service::SimHttpService;
    use wxnode::adapters::radio::SimRadio;
    use wxnode::app::events::StationCredentials;
    use wxnode::drivers::status_led::{SimChannel, StatusLed};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    banner();

    let config = SystemConfig::default();
    config.validate()?;

    let upstream = StationCredentials::new("upstream", "correct-horse")?;
    let service = SimHttpService::new(MAILBOX.sender());
    let status = service.status();

    let worker_config = config.clone();
    let _worker = spawn_connectivity(&config, move || {
        let ports = PortSet {
            radio: SimRadio::new(Some(EventBridge::new(MAILBOX.sender()))).with_network(upstream),
            indicator: SignalIndicator::new(&INDICATOR),
            service,
        };
        let led = StatusLed::new(
            SimChannel::default(),
            SimChannel::default(),
            SimChannel::default(),
        );
        run_connectivity(worker_config, &MAILBOX, ports, &INDICATOR, led);
    })?;

    let settle = Duration::from_millis(200);
    thread::sleep(settle);

    info!("Sim: provisioning with a wrong passphrase");
    MAILBOX.request_provisioning("upstream", "wrong-password")?;
    thread::sleep(settle);
    info!("Sim: status {:?}", status.lock().map(|s| s.report()).ok());

    info!("Sim: provisioning with the right passphrase");
    MAILBOX.request_provisioning("upstream", "correct-horse")?;
    thread::sleep(settle);
    info!("Sim: status {:?}", status.lock().map(|s| s.report()).ok());

    Ok(())
}
