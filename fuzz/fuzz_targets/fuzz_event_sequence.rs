//! Fuzz target: orchestrator event handling
//!
//! Each input byte selects one event.  The orchestrator must never panic,
//! never exceed its retry budget and never reconfigure the soft-AP.
//!
//! cargo fuzz run fuzz_event_sequence

#![no_main]

use core::net::Ipv4Addr;

use libfuzzer_sys::fuzz_target;
use wxnode::app::commands::Command;
use wxnode::app::events::{OrchestratorEvent, StationCredentials, UpdateOutcome};
use wxnode::app::orchestrator::Orchestrator;
use wxnode::config::SystemConfig;

fn event_for(byte: u8) -> Option<OrchestratorEvent> {
    let event = match byte % 15 {
        0 => OrchestratorEvent::AccessPointStarted,
        1 => OrchestratorEvent::AccessPointStopped,
        2 => OrchestratorEvent::PeerAssociated,
        3 => OrchestratorEvent::PeerDisassociated,
        4 => OrchestratorEvent::StationAssociated,
        5 => OrchestratorEvent::StationDisassociated,
        6 => OrchestratorEvent::AddressAcquired(Ipv4Addr::new(10, 0, 0, byte)),
        7 => OrchestratorEvent::AssociationTimeout,
        8 => OrchestratorEvent::RadioFault,
        9 => OrchestratorEvent::StartDependentService,
        10 => OrchestratorEvent::ServiceReady,
        11 => OrchestratorEvent::ServiceFailed,
        12 => OrchestratorEvent::ProvisioningRequested(
            StationCredentials::new("fuzznet", "password").ok()?,
        ),
        13 => OrchestratorEvent::FirmwareUpdate(UpdateOutcome::Succeeded),
        _ => OrchestratorEvent::FirmwareUpdate(UpdateOutcome::Failed),
    };
    Some(event)
}

fuzz_target!(|data: &[u8]| {
    let Some((&max, events)) = data.split_first() else {
        return;
    };
    let mut config = SystemConfig::default();
    config.max_sta_retries = max % 10;
    let mut orch = Orchestrator::new(config);
    orch.boot();

    for event in events.iter().filter_map(|&b| event_for(b)) {
        let commands = orch.step(&event);
        assert!(!commands.iter().any(|c| matches!(c, Command::ConfigureApMode)));
        assert!(orch.attempts() <= orch.config().max_sta_retries.max(1));
    }
});
