//! Outbound commands emitted by the orchestrator.
//!
//! Each [`Command`] is consumed by exactly one collaborator: the radio
//! driver, the status indicator, or the HTTP facade.  Commands are the only
//! way the rest of the firmware observes orchestrator state.

use core::net::Ipv4Addr;

use super::events::StationCredentials;

/// Discrete statuses rendered by the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    /// Connectivity task started.
    Startup,
    /// HTTP service is up on the soft-AP.
    ServiceReady,
    /// Station link has an address.
    LinkEstablished,
    /// Something failed; see the log.
    Fault,
}

/// Connect-status notices forwarded to the HTTP facade so its status
/// endpoint can answer the provisioning UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceNotice {
    ConnectSucceeded(Ipv4Addr),
    ConnectFailed,
}

/// Commands the orchestrator issues to its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bring up the soft-AP (radio in AP+STA mode).  Once per boot.
    ConfigureApMode,
    /// Configure the station side and start associating.
    ConfigureStaMode(StationCredentials),
    /// Start the HTTP facade.
    StartService,
    /// Stop the HTTP facade.
    StopService,
    /// Forward a connect-status notice to the HTTP facade.
    NotifyService(ServiceNotice),
    /// Render a status on the indicator.
    EmitIndicator(IndicatorKind),
}
