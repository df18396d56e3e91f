//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  BOOTSTRAPPING ──[init]──▶ AP_ACTIVE ──[AP started]──▶ SERVICE_STARTING
//!                                                              │
//!                                                       [service ready]
//!                                                              ▼
//!                     ┌──[exhausted / radio fault]──────── STA_IDLE
//!                     ▼                                        │
//!                 STA_IDLE                              [provisioning]
//!                     ▲                                        ▼
//!                     └──[exhausted / radio fault]──── STA_CONNECTING ◀─┐
//!                                                              │        │
//!                                                           [address] [link lost]
//!                                                              ▼        │
//!                                                        STA_CONNECTED ─┘
//! ```
//!
//! The soft-AP is configured exactly once, on entry to `ApActive`, and is
//! never touched again: every station attempt runs with the AP still up.

use super::context::{FsmContext, RadioMode, RetryDecision};
use super::{StateDescriptor, StateId};
use crate::app::commands::{Command, IndicatorKind, ServiceNotice};
use crate::app::events::{OrchestratorEvent, StationCredentials, UpdateOutcome};
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Bootstrapping
        StateDescriptor {
            id: StateId::Bootstrapping,
            name: "Bootstrapping",
            on_enter: None,
            on_exit: None,
            on_event: bootstrapping_event,
        },
        // Index 1: ApActive
        StateDescriptor {
            id: StateId::ApActive,
            name: "ApActive",
            on_enter: Some(ap_active_enter),
            on_exit: None,
            on_event: ap_active_event,
        },
        // Index 2: ServiceStarting
        StateDescriptor {
            id: StateId::ServiceStarting,
            name: "ServiceStarting",
            on_enter: Some(service_starting_enter),
            on_exit: None,
            on_event: service_starting_event,
        },
        // Index 3: StaIdle
        StateDescriptor {
            id: StateId::StaIdle,
            name: "ServiceReady/StaIdle",
            on_enter: None,
            on_exit: None,
            on_event: sta_idle_event,
        },
        // Index 4: StaConnecting
        StateDescriptor {
            id: StateId::StaConnecting,
            name: "ServiceReady/StaConnecting",
            on_enter: None,
            on_exit: None,
            on_event: sta_connecting_event,
        },
        // Index 5: StaConnected
        StateDescriptor {
            id: StateId::StaConnected,
            name: "ServiceReady/StaConnected",
            on_enter: None,
            on_exit: Some(sta_connected_exit),
            on_event: sta_connected_event,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  BOOTSTRAPPING
// ═══════════════════════════════════════════════════════════════════════════

fn bootstrapping_event(_ctx: &mut FsmContext, event: &OrchestratorEvent) -> Option<StateId> {
    warn!("Bootstrapping: {:?} before init complete, ignored", event);
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  AP_ACTIVE
// ═══════════════════════════════════════════════════════════════════════════

fn ap_active_enter(ctx: &mut FsmContext) {
    ctx.emit(Command::ConfigureApMode);
    ctx.radio_mode = RadioMode::AccessPointOnly;
    ctx.emit(Command::EmitIndicator(IndicatorKind::Startup));
}

fn ap_active_event(ctx: &mut FsmContext, event: &OrchestratorEvent) -> Option<StateId> {
    match event {
        OrchestratorEvent::AccessPointStarted => Some(StateId::ServiceStarting),
        OrchestratorEvent::StartDependentService if ctx.radio_mode == RadioMode::Uninitialized => {
            warn!("ApActive: no soft-AP to serve on, service start refused");
            None
        }
        OrchestratorEvent::StartDependentService => Some(StateId::ServiceStarting),
        OrchestratorEvent::RadioFault => {
            // AP never came up; nothing left to do until a restart.
            warn!("ApActive: AP configuration rejected, awaiting restart");
            ctx.radio_mode = RadioMode::Uninitialized;
            ctx.emit(Command::EmitIndicator(IndicatorKind::Fault));
            None
        }
        OrchestratorEvent::ProvisioningRequested(_) => {
            warn!("ApActive: provisioning before service is up, ignored");
            None
        }
        other => common_event(ctx, other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  SERVICE_STARTING
// ═══════════════════════════════════════════════════════════════════════════

fn service_starting_enter(ctx: &mut FsmContext) {
    ctx.emit(Command::StartService);
}

fn service_starting_event(ctx: &mut FsmContext, event: &OrchestratorEvent) -> Option<StateId> {
    match event {
        OrchestratorEvent::ServiceReady => {
            ctx.emit(Command::EmitIndicator(IndicatorKind::ServiceReady));
            Some(StateId::StaIdle)
        }
        OrchestratorEvent::ServiceFailed => {
            warn!("ServiceStarting: service failed to start");
            ctx.emit(Command::EmitIndicator(IndicatorKind::Fault));
            None
        }
        OrchestratorEvent::StartDependentService => {
            info!("ServiceStarting: retrying service start");
            ctx.emit(Command::StartService);
            None
        }
        OrchestratorEvent::ProvisioningRequested(_) => {
            warn!("ServiceStarting: provisioning before service is up, ignored");
            None
        }
        other => common_event(ctx, other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  STA_IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn sta_idle_event(ctx: &mut FsmContext, event: &OrchestratorEvent) -> Option<StateId> {
    match event {
        OrchestratorEvent::ProvisioningRequested(creds) => {
            begin_attempt(ctx, creds);
            Some(StateId::StaConnecting)
        }
        OrchestratorEvent::StationAssociated
        | OrchestratorEvent::StationDisassociated
        | OrchestratorEvent::AssociationTimeout => {
            debug!("StaIdle: stale {:?} ignored", event);
            None
        }
        OrchestratorEvent::AddressAcquired(ip) => {
            warn!("StaIdle: unexpected address {} with no attempt in progress", ip);
            None
        }
        OrchestratorEvent::RadioFault => {
            ctx.emit(Command::EmitIndicator(IndicatorKind::Fault));
            None
        }
        other => common_event(ctx, other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  STA_CONNECTING
// ═══════════════════════════════════════════════════════════════════════════

fn sta_connecting_event(ctx: &mut FsmContext, event: &OrchestratorEvent) -> Option<StateId> {
    match event {
        OrchestratorEvent::StationAssociated => {
            info!("StaConnecting: associated, waiting for address");
            None
        }
        OrchestratorEvent::AddressAcquired(ip) => {
            info!("StaConnecting: got address {}", ip);
            ctx.attempts.reset();
            ctx.station_ip = Some(*ip);
            ctx.emit(Command::EmitIndicator(IndicatorKind::LinkEstablished));
            ctx.emit(Command::NotifyService(ServiceNotice::ConnectSucceeded(*ip)));
            Some(StateId::StaConnected)
        }
        OrchestratorEvent::StationDisassociated | OrchestratorEvent::AssociationTimeout => {
            match ctx.attempts.record_failure() {
                RetryDecision::Retry => {
                    info!(
                        "StaConnecting: attempt {}/{} failed, retrying",
                        ctx.attempts.count(),
                        ctx.attempts.max()
                    );
                    ctx.configure_station();
                    None
                }
                RetryDecision::Exhausted => Some(give_up(ctx)),
            }
        }
        OrchestratorEvent::RadioFault => {
            warn!("StaConnecting: radio rejected station config");
            Some(give_up(ctx))
        }
        OrchestratorEvent::ProvisioningRequested(creds) => {
            begin_attempt(ctx, creds);
            None
        }
        other => common_event(ctx, other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  STA_CONNECTED
// ═══════════════════════════════════════════════════════════════════════════

fn sta_connected_exit(ctx: &mut FsmContext) {
    ctx.station_ip = None;
}

fn sta_connected_event(ctx: &mut FsmContext, event: &OrchestratorEvent) -> Option<StateId> {
    match event {
        OrchestratorEvent::StationDisassociated => {
            warn!("StaConnected: link lost");
            match ctx.attempts.record_failure() {
                RetryDecision::Retry => {
                    ctx.emit(Command::EmitIndicator(IndicatorKind::Fault));
                    ctx.configure_station();
                    Some(StateId::StaConnecting)
                }
                RetryDecision::Exhausted => Some(give_up(ctx)),
            }
        }
        OrchestratorEvent::AddressAcquired(ip) => {
            info!("StaConnected: address renewed as {}", ip);
            ctx.station_ip = Some(*ip);
            None
        }
        OrchestratorEvent::ProvisioningRequested(creds) => {
            begin_attempt(ctx, creds);
            Some(StateId::StaConnecting)
        }
        OrchestratorEvent::StationAssociated
        | OrchestratorEvent::AssociationTimeout
        | OrchestratorEvent::RadioFault => {
            debug!("StaConnected: stale {:?} ignored", event);
            None
        }
        other => common_event(ctx, other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Fresh credentials: reset the counter and configure the station.
fn begin_attempt(ctx: &mut FsmContext, creds: &StationCredentials) {
    info!("Provisioning: connecting to '{}'", creds.ssid());
    ctx.attempts.reset();
    ctx.credentials = Some(creds.clone());
    ctx.configure_station();
}

/// Stop retrying and wait for a new provisioning request.
fn give_up(ctx: &mut FsmContext) -> StateId {
    warn!(
        "Station: giving up after {} attempt(s), awaiting new credentials",
        ctx.attempts.count()
    );
    ctx.credentials = None;
    ctx.emit(Command::EmitIndicator(IndicatorKind::Fault));
    ctx.emit(Command::NotifyService(ServiceNotice::ConnectFailed));
    StateId::StaIdle
}

/// Events handled the same way in every post-boot state.
fn common_event(ctx: &mut FsmContext, event: &OrchestratorEvent) -> Option<StateId> {
    match event {
        OrchestratorEvent::PeerAssociated => {
            ctx.ap_peers = ctx.ap_peers.saturating_add(1);
            info!("AP: client joined ({} connected)", ctx.ap_peers);
        }
        OrchestratorEvent::PeerDisassociated => {
            ctx.ap_peers = ctx.ap_peers.saturating_sub(1);
            info!("AP: client left ({} connected)", ctx.ap_peers);
        }
        OrchestratorEvent::AccessPointStopped => {
            warn!("AP: soft-AP stopped");
            ctx.emit(Command::EmitIndicator(IndicatorKind::Fault));
        }
        OrchestratorEvent::ServiceFailed => {
            warn!("Service: reported failure");
            ctx.emit(Command::EmitIndicator(IndicatorKind::Fault));
        }
        OrchestratorEvent::FirmwareUpdate(UpdateOutcome::Succeeded) => {
            info!("Firmware update succeeded, stopping service for restart");
            ctx.emit(Command::StopService);
        }
        OrchestratorEvent::FirmwareUpdate(UpdateOutcome::Failed) => {
            warn!("Firmware update failed");
            ctx.emit(Command::EmitIndicator(IndicatorKind::Fault));
        }
        _ => debug!("{:?} ignored", event),
    }
    None
}
