//! End-to-end orchestrator flows against recording mock ports.

use core::net::Ipv4Addr;

use wxnode::app::commands::{IndicatorKind, ServiceNotice};
use wxnode::app::events::{OrchestratorEvent, UpdateOutcome};
use wxnode::app::orchestrator::Orchestrator;
use wxnode::config::SystemConfig;
use wxnode::fsm::StateId;
use wxnode::fsm::context::RadioMode;

use crate::mock_ports::{
    MockPorts, PortCall, config_with_retries, creds, ready_orchestrator,
};

#[test]
fn happy_path_reaches_connected() {
    let mut ports = MockPorts::new();
    let mut orch = Orchestrator::new(SystemConfig::default());

    orch.start(&mut ports);
    orch.process(OrchestratorEvent::AccessPointStarted, &mut ports);
    orch.process(OrchestratorEvent::ServiceReady, &mut ports);
    orch.process(
        OrchestratorEvent::ProvisioningRequested(creds("home", "secret123")),
        &mut ports,
    );
    orch.process(OrchestratorEvent::StationAssociated, &mut ports);
    let ip = Ipv4Addr::new(192, 168, 1, 42);
    orch.process(OrchestratorEvent::AddressAcquired(ip), &mut ports);

    assert_eq!(orch.state(), StateId::StaConnected);
    assert_eq!(orch.attempts(), 0);
    assert_eq!(orch.station_ip(), Some(ip));
    assert_eq!(orch.radio_mode(), RadioMode::AccessPointPlusStation);
    assert_eq!(
        ports.indicators(),
        vec![
            IndicatorKind::Startup,
            IndicatorKind::ServiceReady,
            IndicatorKind::LinkEstablished
        ]
    );
    assert_eq!(ports.notices(), vec![ServiceNotice::ConnectSucceeded(ip)]);
}

#[test]
fn exhausted_retries_fall_back_to_idle() {
    let mut ports = MockPorts::new();
    let mut orch = ready_orchestrator(config_with_retries(3), &mut ports);

    orch.process(
        OrchestratorEvent::ProvisioningRequested(creds("home", "secret123")),
        &mut ports,
    );
    orch.process(OrchestratorEvent::StationAssociated, &mut ports);

    for n in 1..=5 {
        orch.process(OrchestratorEvent::StationDisassociated, &mut ports);
        if n == 3 {
            assert_eq!(orch.state(), StateId::StaIdle);
            assert_eq!(ports.last_indicator(), Some(IndicatorKind::Fault));
        }
    }

    assert_eq!(orch.state(), StateId::StaIdle);
    assert_eq!(ports.sta_configs(), 3);
    assert_eq!(ports.last_indicator(), Some(IndicatorKind::Fault));
    assert_eq!(ports.notices(), vec![ServiceNotice::ConnectFailed]);
}

#[test]
fn ap_configured_once_across_everything() {
    let mut ports = MockPorts::new();
    let mut orch = ready_orchestrator(config_with_retries(2), &mut ports);
    let ip = Ipv4Addr::new(10, 0, 0, 2);

    let events = [
        OrchestratorEvent::ProvisioningRequested(creds("a", "password1")),
        OrchestratorEvent::StationDisassociated,
        OrchestratorEvent::AddressAcquired(ip),
        OrchestratorEvent::StationDisassociated,
        OrchestratorEvent::AccessPointStopped,
        OrchestratorEvent::AccessPointStarted,
        OrchestratorEvent::ProvisioningRequested(creds("b", "password2")),
        OrchestratorEvent::RadioFault,
        OrchestratorEvent::StartDependentService,
    ];
    for ev in events {
        orch.process(ev, &mut ports);
    }

    assert_eq!(ports.ap_configs(), 1);
}

#[test]
fn link_loss_reconnects_with_same_credentials() {
    let mut ports = MockPorts::new();
    let mut orch = ready_orchestrator(SystemConfig::default(), &mut ports);
    let home = creds("home", "secret123");

    orch.process(OrchestratorEvent::ProvisioningRequested(home.clone()), &mut ports);
    orch.process(
        OrchestratorEvent::AddressAcquired(Ipv4Addr::new(192, 168, 1, 5)),
        &mut ports,
    );
    ports.calls.clear();

    orch.process(OrchestratorEvent::StationDisassociated, &mut ports);

    assert_eq!(orch.state(), StateId::StaConnecting);
    assert_eq!(orch.attempts(), 1);
    assert_eq!(orch.station_ip(), None);
    assert_eq!(
        ports.calls,
        vec![
            PortCall::Indicator(IndicatorKind::Fault),
            PortCall::ConfigureSta(home)
        ]
    );

    orch.process(
        OrchestratorEvent::AddressAcquired(Ipv4Addr::new(192, 168, 1, 6)),
        &mut ports,
    );
    assert_eq!(orch.state(), StateId::StaConnected);
    assert_eq!(orch.attempts(), 0);
}

#[test]
fn rejected_station_config_is_fatal_to_attempt() {
    let mut ports = MockPorts::new();
    let mut orch = ready_orchestrator(SystemConfig::default(), &mut ports);
    ports.reject_sta = true;

    orch.process(
        OrchestratorEvent::ProvisioningRequested(creds("home", "secret123")),
        &mut ports,
    );

    assert_eq!(orch.state(), StateId::StaIdle);
    assert_eq!(ports.sta_configs(), 1, "never silently retried");
    assert_eq!(ports.last_indicator(), Some(IndicatorKind::Fault));
    assert_eq!(ports.notices(), vec![ServiceNotice::ConnectFailed]);
}

#[test]
fn rejected_ap_config_leaves_radio_uninitialised() {
    let mut ports = MockPorts {
        reject_ap: true,
        ..MockPorts::default()
    };
    let mut orch = Orchestrator::new(SystemConfig::default());
    orch.start(&mut ports);

    assert_eq!(orch.state(), StateId::ApActive);
    assert_eq!(orch.radio_mode(), RadioMode::Uninitialized);
    assert_eq!(
        ports.indicators(),
        vec![IndicatorKind::Startup, IndicatorKind::Fault]
    );
    assert_eq!(ports.ap_configs(), 1);
}

#[test]
fn service_not_started_without_soft_ap() {
    let mut ports = MockPorts {
        reject_ap: true,
        ..MockPorts::default()
    };
    let mut orch = Orchestrator::new(SystemConfig::default());
    orch.start(&mut ports);

    orch.process(OrchestratorEvent::StartDependentService, &mut ports);
    assert_eq!(orch.state(), StateId::ApActive);
    assert_eq!(ports.count(|c| matches!(c, PortCall::StartService)), 0);
}

#[test]
fn service_start_failure_can_be_retried() {
    let mut ports = MockPorts {
        fail_start: true,
        ..MockPorts::default()
    };
    let mut orch = Orchestrator::new(SystemConfig::default());
    orch.start(&mut ports);
    orch.process(OrchestratorEvent::AccessPointStarted, &mut ports);

    assert_eq!(orch.state(), StateId::ServiceStarting);
    assert_eq!(ports.last_indicator(), Some(IndicatorKind::Fault));

    ports.fail_start = false;
    orch.process(OrchestratorEvent::StartDependentService, &mut ports);
    orch.process(OrchestratorEvent::ServiceReady, &mut ports);

    assert_eq!(orch.state(), StateId::StaIdle);
    assert_eq!(ports.count(|c| matches!(c, PortCall::StartService)), 2);
    assert_eq!(ports.ap_configs(), 1);
}

#[test]
fn peers_are_counted_without_transition() {
    let mut ports = MockPorts::new();
    let mut orch = ready_orchestrator(SystemConfig::default(), &mut ports);
    ports.calls.clear();

    orch.process(OrchestratorEvent::PeerAssociated, &mut ports);
    orch.process(OrchestratorEvent::PeerAssociated, &mut ports);
    orch.process(OrchestratorEvent::PeerDisassociated, &mut ports);

    assert_eq!(orch.peers(), 1);
    assert_eq!(orch.state(), StateId::StaIdle);
    assert!(ports.calls.is_empty());
}

#[test]
fn firmware_update_outcomes() {
    let mut ports = MockPorts::new();
    let mut orch = ready_orchestrator(SystemConfig::default(), &mut ports);
    ports.calls.clear();

    orch.process(
        OrchestratorEvent::FirmwareUpdate(UpdateOutcome::Failed),
        &mut ports,
    );
    assert_eq!(ports.calls, vec![PortCall::Indicator(IndicatorKind::Fault)]);

    orch.process(
        OrchestratorEvent::FirmwareUpdate(UpdateOutcome::Succeeded),
        &mut ports,
    );
    assert_eq!(ports.calls.last(), Some(&PortCall::StopService));
    assert_eq!(orch.state(), StateId::StaIdle);
}

#[test]
fn events_before_service_ready_do_not_provision() {
    let mut ports = MockPorts::new();
    let mut orch = Orchestrator::new(SystemConfig::default());
    orch.start(&mut ports);

    orch.process(
        OrchestratorEvent::ProvisioningRequested(creds("home", "secret123")),
        &mut ports,
    );
    assert_eq!(orch.state(), StateId::ApActive);
    assert_eq!(ports.sta_configs(), 0);
}
