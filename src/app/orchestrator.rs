//! Connectivity orchestrator, the hexagonal core.
//!
//! [`Orchestrator`] owns the FSM and its context.  Every state change
//! happens in [`Orchestrator::process`], called from a single worker that
//! drains the [`Mailbox`].  Commands produced by the FSM are routed through
//! the [`Ports`] traits; a command the collaborator rejects is fed back as
//! an event before the next mailbox message is taken.
//!
//! ```text
//!  Mailbox ──▶ ┌────────────────────────┐ ──▶ RadioPort
//!              │      Orchestrator      │ ──▶ IndicatorSink
//!              │  FSM · retries · mode  │ ──▶ ServicePort
//!              └────────────────────────┘
//! ```

use core::net::Ipv4Addr;

use embassy_time::{Duration, Instant, with_deadline};
use heapless::{Deque, Vec};
use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::fsm::context::{FsmContext, OUTBOX_CAP, RadioMode};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::mailbox::Mailbox;

use super::commands::Command;
use super::events::OrchestratorEvent;
use super::ports::Ports;

/// Commands produced by one step.
pub type Commands = Vec<Command, OUTBOX_CAP>;

/// Rejected-command feedback handled per mailbox message.  One event can
/// fail at most one radio call and one service call.
const MAX_FOLLOW_UPS: usize = 4;

/// Pending association deadline, tagged with the configuration it covers.
#[derive(Clone, Copy)]
struct ArmedTimeout {
    configuration: u32,
    deadline: Instant,
}

/// The connectivity orchestrator.
pub struct Orchestrator {
    fsm: Fsm,
    ctx: FsmContext,
    booted: bool,
    timeout: Option<ArmedTimeout>,
}

impl Orchestrator {
    /// Construct from configuration.
    ///
    /// Does **not** touch the radio: call [`start`](Self::start) (or the
    /// pure [`boot`](Self::boot)) next.
    pub fn new(config: SystemConfig) -> Self {
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Bootstrapping);
        Self {
            fsm,
            ctx,
            booted: false,
            timeout: None,
        }
    }

    // ── Pure core ─────────────────────────────────────────────

    /// Leave `Bootstrapping` and return the startup commands.
    /// Calling it again is a no-op.
    pub fn boot(&mut self) -> Commands {
        if self.booted {
            warn!("Orchestrator: already booted");
            return Vec::new();
        }
        self.booted = true;
        self.fsm.start(&mut self.ctx);
        self.fsm.force_transition(StateId::ApActive, &mut self.ctx);
        self.take_outbox()
    }

    /// Feed one event to the FSM and return the commands it produced.
    pub fn step(&mut self, event: &OrchestratorEvent) -> Commands {
        let before = self.fsm.current_state();
        self.fsm.handle(event, &mut self.ctx);
        let after = self.fsm.current_state();
        if before != after {
            debug!("Orchestrator: {:?} moved {:?} -> {:?}", event, before, after);
        }
        self.take_outbox()
    }

    // ── Effectful wrappers ────────────────────────────────────

    /// Boot and dispatch the startup commands.
    pub fn start(&mut self, ports: &mut impl Ports) {
        let commands = self.boot();
        self.settle(commands, ports);
        info!("Orchestrator started in {:?}", self.state());
    }

    /// Process one mailbox event and dispatch its commands.
    pub fn process(&mut self, event: OrchestratorEvent, ports: &mut impl Ports) {
        let commands = self.step(&event);
        self.settle(commands, ports);
    }

    /// Process everything already queued without waiting.
    /// Returns the number of mailbox events handled.
    pub fn drain(&mut self, mailbox: &Mailbox, ports: &mut impl Ports) -> usize {
        let mut handled = 0;
        while let Some(event) = mailbox.try_receive() {
            self.process(event, ports);
            handled += 1;
        }
        handled
    }

    /// Wait for the next event.  While a station attempt is in flight this
    /// races the mailbox against the association deadline and yields
    /// [`OrchestratorEvent::AssociationTimeout`] if the deadline wins.
    pub async fn next_event(&mut self, mailbox: &Mailbox) -> OrchestratorEvent {
        match self.arm_timeout() {
            Some(deadline) => match with_deadline(deadline, mailbox.receive()).await {
                Ok(event) => event,
                Err(_) => {
                    warn!("Orchestrator: association timed out");
                    self.timeout = None;
                    OrchestratorEvent::AssociationTimeout
                }
            },
            None => mailbox.receive().await,
        }
    }

    /// Worker body.  Never returns.
    pub async fn run(&mut self, mailbox: &Mailbox, ports: &mut impl Ports) {
        if !self.booted {
            self.start(ports);
        }
        loop {
            let event = self.next_event(mailbox).await;
            self.process(event, ports);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn radio_mode(&self) -> RadioMode {
        self.ctx.radio_mode
    }

    /// Failed station attempts since the last reset.
    pub fn attempts(&self) -> u8 {
        self.ctx.attempts.count()
    }

    /// Clients associated with the soft-AP.
    pub fn peers(&self) -> u8 {
        self.ctx.ap_peers
    }

    pub fn station_ip(&self) -> Option<Ipv4Addr> {
        self.ctx.station_ip
    }

    /// Events handled since construction, including fed-back failures.
    pub fn events_processed(&self) -> u64 {
        self.fsm.event_count()
    }

    /// `ConfigureStaMode` commands issued since boot.
    pub fn sta_configurations(&self) -> u32 {
        self.ctx.sta_configurations
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn take_outbox(&mut self) -> Commands {
        core::mem::take(&mut self.ctx.outbox)
    }

    /// Dispatch commands, then run any rejection feedback through the FSM
    /// until nothing more is produced.
    fn settle(&mut self, commands: Commands, ports: &mut impl Ports) {
        let mut pending: Deque<OrchestratorEvent, MAX_FOLLOW_UPS> = Deque::new();
        self.dispatch(&commands, ports, &mut pending);

        let mut rounds = 0;
        while let Some(event) = pending.pop_front() {
            rounds += 1;
            if rounds > MAX_FOLLOW_UPS {
                warn!("Orchestrator: feedback did not settle, dropping {:?}", event);
                break;
            }
            let follow_up = self.step(&event);
            self.dispatch(&follow_up, ports, &mut pending);
        }
    }

    /// Route each command to its port.
    fn dispatch(
        &self,
        commands: &[Command],
        ports: &mut impl Ports,
        feedback: &mut Deque<OrchestratorEvent, MAX_FOLLOW_UPS>,
    ) {
        for command in commands {
            let failure = match command {
                Command::ConfigureApMode => ports
                    .configure_ap(&self.ctx.config.access_point)
                    .err()
                    .map(|e| {
                        warn!("Radio: AP configuration failed: {}", e);
                        OrchestratorEvent::RadioFault
                    }),
                Command::ConfigureStaMode(creds) => ports.configure_sta(creds).err().map(|e| {
                    warn!("Radio: station configuration failed: {}", e);
                    OrchestratorEvent::RadioFault
                }),
                Command::StartService => ports.start().err().map(|e| {
                    warn!("Service: start failed: {}", e);
                    OrchestratorEvent::ServiceFailed
                }),
                Command::StopService => {
                    ports.stop();
                    None
                }
                Command::NotifyService(notice) => {
                    ports.notify(*notice);
                    None
                }
                Command::EmitIndicator(kind) => {
                    ports.display(*kind);
                    None
                }
            };
            if let Some(event) = failure {
                if feedback.push_back(event).is_err() {
                    warn!("Orchestrator: feedback queue full");
                }
            }
        }
    }

    /// Deadline for the current station attempt, if one is in flight.
    /// A fresh `ConfigureStaMode` re-arms it.
    fn arm_timeout(&mut self) -> Option<Instant> {
        let secs = self.ctx.config.association_timeout_secs;
        if secs == 0 || self.state() != StateId::StaConnecting {
            self.timeout = None;
            return None;
        }
        let configuration = self.ctx.sta_configurations;
        match self.timeout {
            Some(armed) if armed.configuration == configuration => Some(armed.deadline),
            _ => {
                let deadline = Instant::now() + Duration::from_secs(u64::from(secs));
                self.timeout = Some(ArmedTimeout {
                    configuration,
                    deadline,
                });
                Some(deadline)
            }
        }
    }
}
