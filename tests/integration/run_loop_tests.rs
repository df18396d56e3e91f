//! Async worker loop: association deadline and mailbox draining.
#![cfg(not(target_os = "espidf"))]

use std::time::Instant;

use embassy_time::Timer;
use futures_lite::future;

use wxnode::app::commands::IndicatorKind;
use wxnode::app::events::OrchestratorEvent;
use wxnode::app::orchestrator::Orchestrator;
use wxnode::config::SystemConfig;
use wxnode::fsm::StateId;
use wxnode::mailbox::Mailbox;

use crate::mock_ports::{MockPorts, PortCall, creds, ready_orchestrator};

fn short_timeout_config() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.association_timeout_secs = 1;
    config.max_sta_retries = 2;
    config
}

#[test]
fn silent_radio_times_out() {
    static MAILBOX: Mailbox = Mailbox::new();
    let mut ports = MockPorts::new();
    let mut orch = ready_orchestrator(short_timeout_config(), &mut ports);
    orch.process(
        OrchestratorEvent::ProvisioningRequested(creds("home", "secret123")),
        &mut ports,
    );
    assert_eq!(orch.state(), StateId::StaConnecting);

    let started = Instant::now();
    let event = future::block_on(orch.next_event(&MAILBOX));
    assert_eq!(event, OrchestratorEvent::AssociationTimeout);
    assert!(started.elapsed().as_millis() >= 900);

    orch.process(event, &mut ports);
    assert_eq!(orch.attempts(), 1);
    assert_eq!(ports.sta_configs(), 2);

    // Second deadline exhausts the budget.
    let event = future::block_on(orch.next_event(&MAILBOX));
    orch.process(event, &mut ports);
    assert_eq!(orch.state(), StateId::StaIdle);
    assert_eq!(ports.last_indicator(), Some(IndicatorKind::Fault));
}

#[test]
fn queued_event_beats_deadline() {
    static MAILBOX: Mailbox = Mailbox::new();
    let mut ports = MockPorts::new();
    let mut orch = ready_orchestrator(short_timeout_config(), &mut ports);
    orch.process(
        OrchestratorEvent::ProvisioningRequested(creds("home", "secret123")),
        &mut ports,
    );

    MAILBOX.post(OrchestratorEvent::StationAssociated);
    let event = future::block_on(orch.next_event(&MAILBOX));
    assert_eq!(event, OrchestratorEvent::StationAssociated);
}

#[test]
fn no_deadline_when_disabled() {
    static MAILBOX: Mailbox = Mailbox::new();
    let mut config = short_timeout_config();
    config.association_timeout_secs = 0;
    let mut ports = MockPorts::new();
    let mut orch = ready_orchestrator(config, &mut ports);
    orch.process(
        OrchestratorEvent::ProvisioningRequested(creds("home", "secret123")),
        &mut ports,
    );

    let waited = future::block_on(future::or(
        async { Some(orch.next_event(&MAILBOX).await) },
        async {
            Timer::after_millis(1500).await;
            None
        },
    ));
    assert_eq!(waited, None);
    assert_eq!(orch.state(), StateId::StaConnecting);
}

#[test]
fn run_boots_and_processes_queued_events() {
    static MAILBOX: Mailbox = Mailbox::new();
    let mut ports = MockPorts::new();
    let mut orch = Orchestrator::new(SystemConfig::default());

    MAILBOX.post(OrchestratorEvent::AccessPointStarted);
    MAILBOX.post(OrchestratorEvent::ServiceReady);
    MAILBOX.request_provisioning("home", "secret123").unwrap();

    future::block_on(future::or(orch.run(&MAILBOX, &mut ports), async {
        Timer::after_millis(200).await;
    }));

    assert!(MAILBOX.is_empty());
    assert_eq!(orch.state(), StateId::StaConnecting);
    assert_eq!(ports.calls.first(), Some(&PortCall::ConfigureAp));
    assert_eq!(ports.sta_configs(), 1);
}

#[test]
fn drain_stops_when_empty() {
    static MAILBOX: Mailbox = Mailbox::new();
    let mut ports = MockPorts::new();
    let mut orch = Orchestrator::new(SystemConfig::default());
    orch.start(&mut ports);

    assert_eq!(orch.drain(&MAILBOX, &mut ports), 0);
    MAILBOX.post(OrchestratorEvent::PeerAssociated);
    MAILBOX.post(OrchestratorEvent::PeerAssociated);
    assert_eq!(orch.drain(&MAILBOX, &mut ports), 2);
    assert_eq!(orch.peers(), 2);
}
