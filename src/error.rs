//! Unified error types for the WxNode firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! orchestrator's failure handling uniform.  All variants are `Copy` so they
//! can be passed through the mailbox and the FSM without allocation.
//!
//! | Category      | Source                          | Recovery                        |
//! |---------------|---------------------------------|---------------------------------|
//! | Credentials   | provisioning request            | rejected, no state change       |
//! | Radio         | driver rejected a command       | fault indicator, station idle   |
//! | Service       | HTTP facade failed to start     | fault indicator, retry on demand|
//! | Mailbox       | non-blocking post to full queue | caller retries or drops         |
//! | Request       | HTTP body oversized or not JSON | 400 reply, no state change      |
//! | Config        | startup configuration invalid   | defaults used                   |

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the connectivity core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Provisioning input was malformed.
    Credentials(CredentialError),
    /// The radio driver refused a configuration command.
    Radio(RadioError),
    /// The dependent HTTP service failed.
    Service(ServiceError),
    /// The orchestrator mailbox could not accept a message.
    Mailbox(MailboxError),
    /// An HTTP request body could not be decoded.
    Request(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials(e) => write!(f, "credentials: {e}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Service(e) => write!(f, "service: {e}"),
            Self::Mailbox(e) => write!(f, "mailbox: {e}"),
            Self::Request(msg) => write!(f, "request: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Credential errors (malformed input)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID is longer than 32 bytes; carries the offending length.
    SsidTooLong(usize),
    /// Non-empty passphrase shorter than the WPA2 minimum of 8 bytes.
    PassphraseTooShort(usize),
    /// Passphrase is longer than 64 bytes; carries the offending length.
    PassphraseTooLong(usize),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID is empty"),
            Self::SsidTooLong(n) => write!(f, "SSID is {n} bytes (max 32)"),
            Self::PassphraseTooShort(n) => write!(f, "passphrase is {n} bytes (min 8)"),
            Self::PassphraseTooLong(n) => write!(f, "passphrase is {n} bytes (max 64)"),
        }
    }
}

impl std::error::Error for CredentialError {}

impl From<CredentialError> for Error {
    fn from(e: CredentialError) -> Self {
        Self::Credentials(e)
    }
}

// ---------------------------------------------------------------------------
// Radio errors (driver / hardware failure)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The driver returned a non-OK status code.
    Rejected(i32),
    /// The radio has not been brought up yet.
    NotInitialised,
    /// A parameter could not be represented in the driver's config struct.
    InvalidParameter(&'static str),
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(rc) => write!(f, "driver rejected command (rc={rc})"),
            Self::NotInitialised => write!(f, "radio not initialised"),
            Self::InvalidParameter(what) => write!(f, "invalid parameter: {what}"),
        }
    }
}

impl std::error::Error for RadioError {}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Service errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    /// The HTTP server could not be created.
    StartFailed,
    /// `start()` was called while the server was already running.
    AlreadyRunning,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartFailed => write!(f, "HTTP service failed to start"),
            Self::AlreadyRunning => write!(f, "HTTP service already running"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ServiceError> for Error {
    fn from(e: ServiceError) -> Self {
        Self::Service(e)
    }
}

// ---------------------------------------------------------------------------
// Mailbox errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxError {
    /// The bounded queue is full; a non-blocking post was refused.
    Full,
}

impl fmt::Display for MailboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "mailbox full"),
        }
    }
}

impl std::error::Error for MailboxError {}

impl From<MailboxError> for Error {
    fn from(e: MailboxError) -> Self {
        Self::Mailbox(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
