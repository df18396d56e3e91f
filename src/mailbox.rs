//! Orchestrator mailbox: bounded, ordered, multi-producer / single-consumer.
//!
//! Radio callbacks, the HTTP facade, and the provisioning UI all post
//! [`OrchestratorEvent`]s here; the orchestrator worker is the only reader.
//!
//! ```text
//! ┌──────────────┐
//! │ Event bridge │──┐
//! ├──────────────┤  │   ┌──────────────────┐     ┌──────────────┐
//! │ HTTP facade  │──┼──▶│ Mailbox (depth 4)│────▶│ Orchestrator │
//! ├──────────────┤  │   └──────────────────┘     └──────────────┘
//! │ Provisioning │──┘
//! └──────────────┘
//! ```
//!
//! [`Mailbox::post`] blocks while the queue is full (back-pressure, never
//! drops).  [`Mailbox::try_post`] is for contexts that must not block.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use log::warn;

use crate::app::events::{OrchestratorEvent, StationCredentials};
use crate::error::{CredentialError, MailboxError};

/// Queue depth.  The orchestrator drains promptly, so this stays small.
pub const MAILBOX_DEPTH: usize = 4;

type EventChannel = Channel<CriticalSectionRawMutex, OrchestratorEvent, MAILBOX_DEPTH>;

/// The orchestrator's inbound queue.  `const`-constructible so it can live
/// in a `static` reachable from C event callbacks.
pub struct Mailbox {
    channel: EventChannel,
}

impl Mailbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue, waiting for space if the queue is full.
    pub fn post(&self, event: OrchestratorEvent) {
        futures_lite::future::block_on(self.channel.send(event));
    }

    /// Enqueue without waiting.
    pub fn try_post(&self, event: OrchestratorEvent) -> Result<(), MailboxError> {
        self.channel.try_send(event).map_err(|_| {
            warn!("Mailbox: full, event refused");
            MailboxError::Full
        })
    }

    /// Validate credentials at the boundary and enqueue a provisioning
    /// request.  Malformed input is reported to the caller and never
    /// reaches the orchestrator.
    pub fn request_provisioning(&self, ssid: &str, passphrase: &str) -> Result<(), CredentialError> {
        let creds = StationCredentials::new(ssid, passphrase).inspect_err(|e| {
            warn!("Mailbox: provisioning request rejected: {}", e);
        })?;
        self.post(OrchestratorEvent::ProvisioningRequested(creds));
        Ok(())
    }

    /// Wait for the next event.
    pub async fn receive(&self) -> OrchestratorEvent {
        self.channel.receive().await
    }

    pub fn try_receive(&self) -> Option<OrchestratorEvent> {
        self.channel.try_receive().ok()
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// A copyable producer handle.
    pub fn sender(&self) -> MailboxSender<'_> {
        MailboxSender {
            inner: self.channel.sender(),
            mailbox: self,
        }
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle given to the event bridge and the HTTP facade.
#[derive(Clone, Copy)]
pub struct MailboxSender<'a> {
    inner: Sender<'a, CriticalSectionRawMutex, OrchestratorEvent, MAILBOX_DEPTH>,
    mailbox: &'a Mailbox,
}

impl MailboxSender<'_> {
    /// Enqueue, waiting for space.
    pub fn post(&self, event: OrchestratorEvent) {
        futures_lite::future::block_on(self.inner.send(event));
    }

    /// Enqueue without waiting.
    pub fn try_post(&self, event: OrchestratorEvent) -> Result<(), MailboxError> {
        self.inner.try_send(event).map_err(|_| MailboxError::Full)
    }

    pub fn request_provisioning(&self, ssid: &str, passphrase: &str) -> Result<(), CredentialError> {
        self.mailbox.request_provisioning(ssid, passphrase)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn delivers_in_order() {
        let mb = Mailbox::new();
        mb.post(OrchestratorEvent::AccessPointStarted);
        mb.post(OrchestratorEvent::ServiceReady);
        assert_eq!(mb.len(), 2);
        assert_eq!(mb.try_receive(), Some(OrchestratorEvent::AccessPointStarted));
        assert_eq!(mb.try_receive(), Some(OrchestratorEvent::ServiceReady));
        assert!(mb.is_empty());
    }

    #[test]
    fn try_post_refuses_when_full() {
        let mb = Mailbox::new();
        for _ in 0..MAILBOX_DEPTH {
            mb.try_post(OrchestratorEvent::PeerAssociated).unwrap();
        }
        assert_eq!(
            mb.try_post(OrchestratorEvent::PeerDisassociated),
            Err(MailboxError::Full)
        );
        assert_eq!(mb.len(), MAILBOX_DEPTH);
    }

    #[test]
    fn post_blocks_until_drained() {
        let mb = Arc::new(Mailbox::new());
        for _ in 0..MAILBOX_DEPTH {
            mb.post(OrchestratorEvent::PeerAssociated);
        }

        let producer = {
            let mb = Arc::clone(&mb);
            thread::spawn(move || mb.post(OrchestratorEvent::ServiceReady))
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished(), "producer must wait for space");

        assert_eq!(mb.try_receive(), Some(OrchestratorEvent::PeerAssociated));
        producer.join().unwrap();

        let mut drained = Vec::new();
        while let Some(ev) = mb.try_receive() {
            drained.push(ev);
        }
        assert_eq!(drained.len(), MAILBOX_DEPTH);
        assert_eq!(drained.last(), Some(&OrchestratorEvent::ServiceReady));
    }

    #[test]
    fn malformed_provisioning_never_enqueued() {
        let mb = Mailbox::new();
        let long = "x".repeat(33);
        assert_eq!(
            mb.request_provisioning(&long, "password1"),
            Err(CredentialError::SsidTooLong(33))
        );
        assert!(mb.is_empty());
    }

    #[test]
    fn provisioning_enqueues_validated_credentials() {
        let mb = Mailbox::new();
        mb.sender().request_provisioning("home", "secret123").unwrap();
        let expected = StationCredentials::new("home", "secret123").unwrap();
        assert_eq!(
            mb.try_receive(),
            Some(OrchestratorEvent::ProvisioningRequested(expected))
        );
    }

    #[test]
    fn receive_is_async() {
        let mb = Mailbox::new();
        mb.sender().post(OrchestratorEvent::StationAssociated);
        let ev = futures_lite::future::block_on(mb.receive());
        assert_eq!(ev, OrchestratorEvent::StationAssociated);
    }
}
