//! Mock port adapters for integration tests.
//!
//! Records every outbound call so tests can assert on the full command
//! history without touching the radio, the LED or the HTTP server.

use wxnode::app::commands::{IndicatorKind, ServiceNotice};
use wxnode::app::events::{OrchestratorEvent, StationCredentials};
use wxnode::app::orchestrator::Orchestrator;
use wxnode::app::ports::{IndicatorSink, RadioPort, ServicePort};
use wxnode::config::{AccessPointConfig, SystemConfig};
use wxnode::error::{RadioError, ServiceError};

// ── Port call record ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PortCall {
    ConfigureAp,
    ConfigureSta(StationCredentials),
    StartService,
    StopService,
    Notify(ServiceNotice),
    Indicator(IndicatorKind),
}

// ── MockPorts ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPorts {
    pub calls: Vec<PortCall>,
    pub reject_ap: bool,
    pub reject_sta: bool,
    pub fail_start: bool,
}

#[allow(dead_code)]
impl MockPorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indicators(&self) -> Vec<IndicatorKind> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::Indicator(k) => Some(*k),
                _ => None,
            })
            .collect()
    }

    pub fn last_indicator(&self) -> Option<IndicatorKind> {
        self.indicators().last().copied()
    }

    pub fn count(&self, call: fn(&PortCall) -> bool) -> usize {
        self.calls.iter().filter(|c| call(c)).count()
    }

    pub fn ap_configs(&self) -> usize {
        self.count(|c| matches!(c, PortCall::ConfigureAp))
    }

    pub fn sta_configs(&self) -> usize {
        self.count(|c| matches!(c, PortCall::ConfigureSta(_)))
    }

    pub fn notices(&self) -> Vec<ServiceNotice> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::Notify(n) => Some(*n),
                _ => None,
            })
            .collect()
    }
}

impl RadioPort for MockPorts {
    fn configure_ap(&mut self, _ap: &AccessPointConfig) -> Result<(), RadioError> {
        self.calls.push(PortCall::ConfigureAp);
        if self.reject_ap {
            Err(RadioError::Rejected(0x3001))
        } else {
            Ok(())
        }
    }

    fn configure_sta(&mut self, credentials: &StationCredentials) -> Result<(), RadioError> {
        self.calls.push(PortCall::ConfigureSta(credentials.clone()));
        if self.reject_sta {
            Err(RadioError::Rejected(0x3002))
        } else {
            Ok(())
        }
    }
}

impl IndicatorSink for MockPorts {
    fn display(&mut self, kind: IndicatorKind) {
        self.calls.push(PortCall::Indicator(kind));
    }
}

impl ServicePort for MockPorts {
    fn start(&mut self) -> Result<(), ServiceError> {
        self.calls.push(PortCall::StartService);
        if self.fail_start {
            Err(ServiceError::StartFailed)
        } else {
            Ok(())
        }
    }

    fn stop(&mut self) {
        self.calls.push(PortCall::StopService);
    }

    fn notify(&mut self, notice: ServiceNotice) {
        self.calls.push(PortCall::Notify(notice));
    }
}

// ── Helpers ───────────────────────────────────────────────────

#[allow(dead_code)]
pub fn creds(ssid: &str, pass: &str) -> StationCredentials {
    StationCredentials::new(ssid, pass).unwrap()
}

#[allow(dead_code)]
pub fn config_with_retries(max: u8) -> SystemConfig {
    let mut config = SystemConfig::default();
    config.max_sta_retries = max;
    config
}

/// Boot and bring the service up: state is `StaIdle` afterwards.
#[allow(dead_code)]
pub fn ready_orchestrator(config: SystemConfig, ports: &mut MockPorts) -> Orchestrator {
    let mut orch = Orchestrator::new(config);
    orch.start(ports);
    orch.process(OrchestratorEvent::AccessPointStarted, ports);
    orch.process(OrchestratorEvent::ServiceReady, ports);
    orch
}
