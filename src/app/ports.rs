//! Port traits: the hexagonal boundary between the orchestrator and the outside world.
//!
//! ```text
//!   Orchestrator ──▶ Port trait ──▶ Adapter (radio / LED / HTTP)
//! ```
//!
//! The [`Orchestrator`](super::orchestrator::Orchestrator) routes every
//! [`Command`](super::commands::Command) through one of these traits, so the
//! state machine never touches a driver directly and can be driven with
//! recording mocks on the host.
//!
//! ## Blocking rules
//!
//! - **RadioPort** calls are fire-and-forget: completion arrives later as an
//!   event through the mailbox, never as a synchronous wait.
//! - **IndicatorSink::display** must return immediately.
//! - **ServicePort** reports readiness asynchronously through the mailbox.

use crate::config::AccessPointConfig;
use crate::error::{RadioError, ServiceError};

use super::commands::{IndicatorKind, ServiceNotice};
use super::events::StationCredentials;

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain → WiFi driver)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the WiFi radio.  The orchestrator is its only caller.
pub trait RadioPort {
    /// Configure the radio as AP+STA and start the soft-AP with its own
    /// static address and DHCP scope.
    fn configure_ap(&mut self, ap: &AccessPointConfig) -> Result<(), RadioError>;

    /// Configure the station side and begin associating.  The AP stays up.
    fn configure_sta(&mut self, credentials: &StationCredentials) -> Result<(), RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port
// ───────────────────────────────────────────────────────────────

/// Status indicator.  Fire-and-forget.
pub trait IndicatorSink {
    fn display(&mut self, kind: IndicatorKind);
}

// ───────────────────────────────────────────────────────────────
// Service port (dependent HTTP facade)
// ───────────────────────────────────────────────────────────────

/// The externally owned HTTP service.  Its readiness and provisioning
/// requests come back through the mailbox, not through return values.
pub trait ServicePort {
    fn start(&mut self) -> Result<(), ServiceError>;

    fn stop(&mut self);

    /// Connect-status notice for the provisioning UI.
    fn notify(&mut self, notice: ServiceNotice);
}

/// Bundle of all outbound ports, so dispatch takes one `&mut`.
pub trait Ports: RadioPort + IndicatorSink + ServicePort {}

impl<T: RadioPort + IndicatorSink + ServicePort> Ports for T {}

/// Groups three independent adapters behind [`Ports`].
pub struct PortSet<R, I, S> {
    pub radio: R,
    pub indicator: I,
    pub service: S,
}

impl<R: RadioPort, I, S> RadioPort for PortSet<R, I, S> {
    fn configure_ap(&mut self, ap: &AccessPointConfig) -> Result<(), RadioError> {
        self.radio.configure_ap(ap)
    }

    fn configure_sta(&mut self, credentials: &StationCredentials) -> Result<(), RadioError> {
        self.radio.configure_sta(credentials)
    }
}

impl<R, I: IndicatorSink, S> IndicatorSink for PortSet<R, I, S> {
    fn display(&mut self, kind: IndicatorKind) {
        self.indicator.display(kind);
    }
}

impl<R, I, S: ServicePort> ServicePort for PortSet<R, I, S> {
    fn start(&mut self) -> Result<(), ServiceError> {
        self.service.start()
    }

    fn stop(&mut self) {
        self.service.stop();
    }

    fn notify(&mut self, notice: ServiceNotice) {
        self.service.notify(notice);
    }
}
