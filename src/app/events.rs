//! Inbound orchestrator events.
//!
//! Everything the connectivity core reacts to arrives as an
//! [`OrchestratorEvent`] through the [`Mailbox`](crate::mailbox::Mailbox):
//! radio and IP notifications translated by the
//! [`EventBridge`](crate::bridge::EventBridge), lifecycle notices from the
//! HTTP facade, and provisioning requests.

use core::net::Ipv4Addr;

use heapless::String;

use crate::error::CredentialError;

/// IEEE 802.11 SSID limit.
pub const MAX_SSID_LEN: usize = 32;
/// WPA2 passphrase limits (64 = raw hex PSK).
pub const MAX_PASSPHRASE_LEN: usize = 64;
pub const MIN_PASSPHRASE_LEN: usize = 8;

/// Station credentials for one connection attempt.
///
/// Only constructible through [`StationCredentials::new`], so an oversized
/// SSID or passphrase can never reach the orchestrator.  Never persisted
/// by the core.
#[derive(Clone, PartialEq, Eq)]
pub struct StationCredentials {
    ssid: String<MAX_SSID_LEN>,
    passphrase: String<MAX_PASSPHRASE_LEN>,
}

impl StationCredentials {
    /// Validate and copy.  An empty passphrase means an open network.
    pub fn new(ssid: &str, passphrase: &str) -> Result<Self, CredentialError> {
        if ssid.is_empty() {
            return Err(CredentialError::SsidEmpty);
        }
        if ssid.len() > MAX_SSID_LEN {
            return Err(CredentialError::SsidTooLong(ssid.len()));
        }
        if passphrase.len() > MAX_PASSPHRASE_LEN {
            return Err(CredentialError::PassphraseTooLong(passphrase.len()));
        }
        if !passphrase.is_empty() && passphrase.len() < MIN_PASSPHRASE_LEN {
            return Err(CredentialError::PassphraseTooShort(passphrase.len()));
        }

        let mut creds = Self {
            ssid: String::new(),
            passphrase: String::new(),
        };
        creds
            .ssid
            .push_str(ssid)
            .map_err(|()| CredentialError::SsidTooLong(ssid.len()))?;
        creds
            .passphrase
            .push_str(passphrase)
            .map_err(|()| CredentialError::PassphraseTooLong(passphrase.len()))?;
        Ok(creds)
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn is_open(&self) -> bool {
        self.passphrase.is_empty()
    }
}

// Keep the passphrase out of logs.
impl core::fmt::Debug for StationCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StationCredentials")
            .field("ssid", &self.ssid)
            .field("passphrase", &"***")
            .finish()
    }
}

/// Outcome of a firmware update reported by the HTTP facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Succeeded,
    Failed,
}

/// Every signal the orchestrator consumes, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorEvent {
    // ── Radio link (from the event bridge) ────────────────
    /// Soft-AP is up and beaconing.
    AccessPointStarted,
    /// Soft-AP went down.
    AccessPointStopped,
    /// A client joined the soft-AP.
    PeerAssociated,
    /// A client left the soft-AP.
    PeerDisassociated,
    /// Station associated with the upstream AP (no address yet).
    StationAssociated,
    /// Station lost (or failed) association.
    StationDisassociated,

    // ── IP layer (from the event bridge) ──────────────────
    /// Station obtained an address via DHCP.
    AddressAcquired(Ipv4Addr),

    // ── Internal ──────────────────────────────────────────
    /// No address arrived before the association deadline.
    AssociationTimeout,
    /// The radio driver rejected the last configuration command.
    RadioFault,

    // ── HTTP facade lifecycle ─────────────────────────────
    /// Request (re)start of the dependent service.
    StartDependentService,
    /// The dependent service is serving.
    ServiceReady,
    /// The dependent service could not start.
    ServiceFailed,
    /// The provisioning UI submitted station credentials.
    ProvisioningRequested(StationCredentials),
    /// A firmware update finished.
    FirmwareUpdate(UpdateOutcome),
}
