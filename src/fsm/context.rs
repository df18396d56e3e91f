//! Mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the only place radio mode, the retry counter, and the
//! in-flight credentials live.  It is owned by the
//! [`Orchestrator`](crate::app::orchestrator::Orchestrator) and mutated only
//! from its single message-processing point.  Handlers communicate outward
//! by appending to `outbox`.

use core::net::Ipv4Addr;

use heapless::Vec;
use log::warn;

use crate::app::commands::Command;
use crate::app::events::StationCredentials;
use crate::config::SystemConfig;

/// Commands a single event can produce.  The busiest path (link loss with
/// retry) emits two.
pub const OUTBOX_CAP: usize = 8;

// ---------------------------------------------------------------------------
// Radio mode
// ---------------------------------------------------------------------------

/// Operating mode the orchestrator last configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioMode {
    /// Nothing configured yet (or AP configuration was rejected).
    Uninitialized,
    /// Soft-AP configured; station side unconfigured.
    AccessPointOnly,
    /// Soft-AP plus station credentials configured.
    AccessPointPlusStation,
}

// ---------------------------------------------------------------------------
// Connection attempts
// ---------------------------------------------------------------------------

/// What to do after a failed station attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Exhausted,
}

/// Bounded retry counter for station association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionAttempt {
    count: u8,
    max: u8,
}

impl ConnectionAttempt {
    pub fn new(max: u8) -> Self {
        Self { count: 0, max: max.max(1) }
    }

    /// Count one failure.  Never exceeds `max`.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.count = self.count.saturating_add(1).min(self.max);
        if self.count < self.max {
            RetryDecision::Retry
        } else {
            RetryDecision::Exhausted
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn max(&self) -> u8 {
        self.max
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// The orchestrator's private state, threaded through state handlers.
pub struct FsmContext {
    /// Startup configuration.
    pub config: SystemConfig,
    /// Mode last issued to the radio.
    pub radio_mode: RadioMode,
    /// Station retry counter.
    pub attempts: ConnectionAttempt,
    /// Credentials of the attempt in progress; cleared on give-up.
    pub credentials: Option<StationCredentials>,
    /// Station address while connected.
    pub station_ip: Option<Ipv4Addr>,
    /// Clients currently associated with the soft-AP.
    pub ap_peers: u8,
    /// `ConfigureStaMode` commands issued since boot.
    pub sta_configurations: u32,
    /// Commands produced by the event being handled.
    pub outbox: Vec<Command, OUTBOX_CAP>,
}

impl FsmContext {
    pub fn new(config: SystemConfig) -> Self {
        let attempts = ConnectionAttempt::new(config.max_sta_retries);
        Self {
            config,
            radio_mode: RadioMode::Uninitialized,
            attempts,
            credentials: None,
            station_ip: None,
            ap_peers: 0,
            sta_configurations: 0,
            outbox: Vec::new(),
        }
    }

    /// Queue a command for dispatch after the handler returns.
    pub fn emit(&mut self, command: Command) {
        if let Err(dropped) = self.outbox.push(command) {
            warn!("FSM: outbox full, dropping {:?}", dropped);
        }
    }

    /// Issue `ConfigureStaMode` for the stored credentials.
    /// Returns `false` if there are none.
    pub fn configure_station(&mut self) -> bool {
        let Some(creds) = self.credentials.clone() else {
            warn!("FSM: no credentials to configure station with");
            return false;
        };
        self.emit(Command::ConfigureStaMode(creds));
        self.radio_mode = RadioMode::AccessPointPlusStation;
        self.sta_configurations = self.sta_configurations.wrapping_add(1);
        true
    }
}
