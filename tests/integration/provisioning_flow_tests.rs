//! Provisioning through the whole host pipeline: simulated HTTP facade ->
//! mailbox -> orchestrator -> simulated radio -> event bridge -> mailbox.
#![cfg(not(target_os = "espidf"))]

use std::thread;

use futures_lite::future;

use wxnode::adapters::http_service::{ConnectStatus, SimHttpService, handle_connect};
use wxnode::adapters::indicator::{IndicatorSignal, SignalIndicator};
use wxnode::adapters::radio::{SIM_STATION_IP, SimRadio};
use wxnode::app::commands::IndicatorKind;
use wxnode::app::events::UpdateOutcome;
use wxnode::app::orchestrator::Orchestrator;
use wxnode::app::ports::PortSet;
use wxnode::bridge::EventBridge;
use wxnode::error::{CredentialError, Error};
use wxnode::fsm::StateId;
use wxnode::mailbox::Mailbox;

use crate::mock_ports::{config_with_retries, creds};

type SimPorts<'a> = PortSet<SimRadio<'a>, SignalIndicator<'a>, SimHttpService>;

fn sim_ports<'a>(mailbox: &'static Mailbox, signal: &'a IndicatorSignal) -> SimPorts<'a> {
    PortSet {
        radio: SimRadio::new(Some(EventBridge::new(mailbox.sender())))
            .with_network(creds("upstream", "correct-horse")),
        indicator: SignalIndicator::new(signal),
        service: SimHttpService::new(mailbox.sender()),
    }
}

/// Boot and drain until the service is up.
fn bring_up(orch: &mut Orchestrator, mailbox: &Mailbox, ports: &mut SimPorts<'_>) {
    orch.start(ports);
    orch.drain(mailbox, ports);
    assert_eq!(orch.state(), StateId::StaIdle);
    assert!(ports.service.is_running());
}

#[test]
fn correct_credentials_connect() {
    static MAILBOX: Mailbox = Mailbox::new();
    let signal = IndicatorSignal::new();
    let mut ports = sim_ports(&MAILBOX, &signal);
    let mut orch = Orchestrator::new(config_with_retries(5));
    bring_up(&mut orch, &MAILBOX, &mut ports);

    ports
        .service
        .post_connect(br#"{"ssid":"upstream","password":"correct-horse"}"#)
        .unwrap();
    assert_eq!(*ports.service.status().lock().unwrap(), ConnectStatus::Connecting);

    let handled = orch.drain(&MAILBOX, &mut ports);
    assert_eq!(handled, 3, "provisioning, association, address");
    assert_eq!(orch.state(), StateId::StaConnected);
    assert_eq!(orch.station_ip(), Some(SIM_STATION_IP));
    assert_eq!(signal.try_take(), Some(IndicatorKind::LinkEstablished));
    assert_eq!(
        ports.service.get_status().unwrap(),
        r#"{"status":"connected","ip":"192.168.1.100"}"#
    );
    assert_eq!(ports.radio.ap_configurations, 1);
}

#[test]
fn wrong_passphrase_exhausts_retries() {
    static MAILBOX: Mailbox = Mailbox::new();
    let signal = IndicatorSignal::new();
    let mut ports = sim_ports(&MAILBOX, &signal);
    let mut orch = Orchestrator::new(config_with_retries(3));
    bring_up(&mut orch, &MAILBOX, &mut ports);

    ports
        .service
        .post_connect(br#"{"ssid":"upstream","password":"wrong-password"}"#)
        .unwrap();
    orch.drain(&MAILBOX, &mut ports);

    assert_eq!(orch.state(), StateId::StaIdle);
    assert_eq!(ports.radio.sta_requests.len(), 3);
    assert_eq!(signal.try_take(), Some(IndicatorKind::Fault));
    assert_eq!(
        ports.service.get_status().unwrap(),
        r#"{"status":"failed"}"#
    );

    // A fresh request starts over with a full retry budget.
    ports
        .service
        .post_connect(br#"{"ssid":"upstream","password":"correct-horse"}"#)
        .unwrap();
    orch.drain(&MAILBOX, &mut ports);
    assert_eq!(orch.state(), StateId::StaConnected);
    assert_eq!(orch.attempts(), 0);
}

#[test]
fn oversized_ssid_rejected_at_boundary() {
    static MAILBOX: Mailbox = Mailbox::new();
    let signal = IndicatorSignal::new();
    let mut ports = sim_ports(&MAILBOX, &signal);
    let mut orch = Orchestrator::new(config_with_retries(5));
    bring_up(&mut orch, &MAILBOX, &mut ports);
    let processed = orch.events_processed();

    let body = format!(r#"{{"ssid":"{}","password":"password1"}}"#, "s".repeat(33));
    let err = ports.service.post_connect(body.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        Error::Credentials(CredentialError::SsidTooLong(33))
    ));

    assert!(MAILBOX.is_empty());
    assert_eq!(orch.drain(&MAILBOX, &mut ports), 0);
    assert_eq!(orch.state(), StateId::StaIdle);
    assert_eq!(orch.events_processed(), processed);
    assert_eq!(*ports.service.status().lock().unwrap(), ConnectStatus::Idle);
}

#[test]
fn malformed_body_rejected() {
    static MAILBOX: Mailbox = Mailbox::new();
    let signal = IndicatorSignal::new();
    let mut ports = sim_ports(&MAILBOX, &signal);
    let mut orch = Orchestrator::new(config_with_retries(5));
    bring_up(&mut orch, &MAILBOX, &mut ports);

    assert!(ports.service.post_connect(b"not json").is_err());
    assert!(ports.service.post_connect(br#"{"password":"x"}"#).is_err());
    assert!(MAILBOX.is_empty());
}

#[test]
fn provisioning_before_service_is_ignored() {
    static MAILBOX: Mailbox = Mailbox::new();
    let signal = IndicatorSignal::new();
    let mut ports = sim_ports(&MAILBOX, &signal);
    let mut orch = Orchestrator::new(config_with_retries(5));
    orch.start(&mut ports);

    // AP_START is queued; slip a request in before it is handled.
    MAILBOX.request_provisioning("upstream", "correct-horse").unwrap();
    let first = MAILBOX.try_receive().unwrap();
    orch.process(first, &mut ports);
    assert_eq!(orch.state(), StateId::ServiceStarting);

    // The early request is handled ahead of ServiceReady and dropped.
    orch.drain(&MAILBOX, &mut ports);
    assert_eq!(orch.state(), StateId::StaIdle);
    assert!(ports.radio.sta_requests.is_empty());
}

#[test]
fn status_keeps_outcome_when_worker_answers_first() {
    static MAILBOX: Mailbox = Mailbox::new();
    let signal = IndicatorSignal::new();
    let mut ports = sim_ports(&MAILBOX, &signal);
    let mut orch = Orchestrator::new(config_with_retries(3));
    bring_up(&mut orch, &MAILBOX, &mut ports);
    ports.radio.reject_sta = true;
    let status = ports.service.status();
    let sender = MAILBOX.sender();

    for round in 0..50 {
        thread::scope(|s| {
            let worker = s.spawn(|| {
                let event = future::block_on(MAILBOX.receive());
                orch.process(event, &mut ports);
            });
            handle_connect(
                br#"{"ssid":"upstream","password":"correct-horse"}"#,
                &sender,
                &status,
            )
            .unwrap();
            worker.join().unwrap();
        });
        assert_eq!(
            *status.lock().unwrap(),
            ConnectStatus::Failed,
            "round {round} left a stale status"
        );
        assert_eq!(orch.state(), StateId::StaIdle);
    }
}

#[test]
fn firmware_update_stops_service() {
    static MAILBOX: Mailbox = Mailbox::new();
    let signal = IndicatorSignal::new();
    let mut ports = sim_ports(&MAILBOX, &signal);
    let mut orch = Orchestrator::new(config_with_retries(5));
    bring_up(&mut orch, &MAILBOX, &mut ports);

    // A failed upload only shows the fault pattern.
    assert_eq!(ports.service.post_firmware(b""), Ok(UpdateOutcome::Failed));
    assert_eq!(orch.drain(&MAILBOX, &mut ports), 1);
    assert_eq!(signal.try_take(), Some(IndicatorKind::Fault));
    assert!(ports.service.is_running());

    assert_eq!(
        ports.service.post_firmware(b"new-image"),
        Ok(UpdateOutcome::Succeeded)
    );
    assert_eq!(orch.drain(&MAILBOX, &mut ports), 1);
    assert!(!ports.service.is_running());
    assert!(ports.service.restart_requested());
    assert_eq!(
        ports.service.get_update_status().unwrap(),
        r#"{"ota_update_status":1}"#
    );
}
