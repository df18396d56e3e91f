//! HTTP provisioning facade.
//!
//! Implements [`ServicePort`].  Once started it reports `ServiceReady`
//! through the mailbox and serves these endpoints on the soft-AP:
//!
//! | Method | Path                  | Body / reply                               |
//! |--------|-----------------------|--------------------------------------------|
//! | POST   | `/wifiConnect.json`   | `{"ssid":..,"password":..}` → 200 / 400    |
//! | GET    | `/wifiConnectStatus`  | `{"status":"connecting"}` etc.             |
//! | POST   | `/OTAupdate`          | raw firmware image → 200 / 500             |
//! | GET    | `/OTAstatus`          | `{"ota_update_status":1}` (0 / 1 / -1)     |
//!
//! The connect status follows the orchestrator's
//! [`ServiceNotice`]s, so the provisioning UI can poll for the outcome.
//! Firmware uploads are reported to the orchestrator as
//! [`OrchestratorEvent::FirmwareUpdate`]; after a successful one the
//! orchestrator stops the service and the ESP build restarts into the new
//! image.

use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::commands::ServiceNotice;
use crate::app::events::{OrchestratorEvent, StationCredentials, UpdateOutcome};
use crate::error::{Error, Result};
use crate::mailbox::MailboxSender;

#[cfg(target_os = "espidf")]
pub use esp::EspHttpService;

#[cfg(not(target_os = "espidf"))]
pub use sim::SimHttpService;

/// Largest accepted provisioning body.
pub const MAX_BODY_LEN: usize = 256;

// ───────────────────────────────────────────────────────────────
// Connect status (shared by both targets)
// ───────────────────────────────────────────────────────────────

/// What the status endpoint reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectStatus {
    #[default]
    Idle,
    Connecting,
    Failed,
    Connected(core::net::Ipv4Addr),
}

impl ConnectStatus {
    pub fn apply(&mut self, notice: ServiceNotice) {
        *self = match notice {
            ServiceNotice::ConnectSucceeded(ip) => Self::Connected(ip),
            ServiceNotice::ConnectFailed => Self::Failed,
        };
    }

    pub fn report(&self) -> StatusReport {
        let (status, ip) = match self {
            Self::Idle => ("idle", None),
            Self::Connecting => ("connecting", None),
            Self::Failed => ("failed", None),
            Self::Connected(ip) => ("connected", Some(ip.to_string())),
        };
        StatusReport { status, ip }
    }
}

/// JSON body of `GET /wifiConnectStatus`.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// Status shared between the port (writer) and the request handlers.
pub type SharedStatus = Arc<Mutex<ConnectStatus>>;

fn locked<S, T>(shared: &Mutex<S>, f: impl FnOnce(&mut S) -> T) -> T {
    let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

fn with_status<T>(status: &SharedStatus, f: impl FnOnce(&mut ConnectStatus) -> T) -> T {
    locked(status, f)
}

/// JSON body of `POST /wifiConnect.json`.
#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub ssid: String,
    #[serde(default)]
    pub password: String,
}

/// Parse and validate a provisioning body, then hand it to the mailbox.
///
/// The status reads `Connecting` before the request is queued, so the
/// orchestrator's notice for it always lands on top.
pub fn handle_connect(body: &[u8], sender: &MailboxSender<'_>, status: &SharedStatus) -> Result<()> {
    if body.len() > MAX_BODY_LEN {
        return Err(Error::Request("body too large"));
    }
    let request: ConnectRequest =
        serde_json::from_slice(body).map_err(|_| Error::Request("malformed JSON body"))?;
    let creds = StationCredentials::new(&request.ssid, &request.password).inspect_err(|e| {
        warn!("Http: provisioning request rejected: {}", e);
    })?;
    with_status(status, |s| *s = ConnectStatus::Connecting);
    sender.post(OrchestratorEvent::ProvisioningRequested(creds));
    info!("Http: provisioning request for '{}' queued", request.ssid);
    Ok(())
}

/// Serialised status for the status endpoint.
pub fn status_json(status: &SharedStatus) -> Result<String> {
    let report = with_status(status, |s| s.report());
    serde_json::to_string(&report).map_err(|_| Error::Request("status serialisation failed"))
}

// ───────────────────────────────────────────────────────────────
// Firmware update status (shared by both targets)
// ───────────────────────────────────────────────────────────────

/// Progress of the last firmware upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateStatus {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

impl UpdateStatus {
    /// Numeric code served by `GET /OTAstatus`.
    pub const fn code(self) -> i8 {
        match self {
            Self::Pending => 0,
            Self::Succeeded => 1,
            Self::Failed => -1,
        }
    }
}

impl From<UpdateOutcome> for UpdateStatus {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Succeeded => Self::Succeeded,
            UpdateOutcome::Failed => Self::Failed,
        }
    }
}

/// JSON body of `GET /OTAstatus`.
#[derive(Debug, Serialize)]
pub struct UpdateReport {
    pub ota_update_status: i8,
}

pub type SharedUpdate = Arc<Mutex<UpdateStatus>>;

/// Record an upload outcome and forward it to the orchestrator.
pub fn finish_update(outcome: UpdateOutcome, sender: &MailboxSender<'_>, update: &SharedUpdate) {
    locked(update, |u| *u = outcome.into());
    match outcome {
        UpdateOutcome::Succeeded => info!("Http: firmware image accepted"),
        UpdateOutcome::Failed => warn!("Http: firmware image rejected"),
    }
    sender.post(OrchestratorEvent::FirmwareUpdate(outcome));
}

/// Serialised status for the firmware update endpoint.
pub fn update_json(update: &SharedUpdate) -> Result<String> {
    let report = UpdateReport {
        ota_update_status: locked(update, |u| u.code()),
    };
    serde_json::to_string(&report).map_err(|_| Error::Request("status serialisation failed"))
}

/// Report readiness.  `start` runs on the orchestrator thread, so a full
/// mailbox must not be waited on there; a helper thread finishes the post.
fn announce_ready(sender: MailboxSender<'static>) {
    if sender.try_post(OrchestratorEvent::ServiceReady).is_ok() {
        return;
    }
    warn!("Http: mailbox full, deferring ServiceReady");
    let spawned = std::thread::Builder::new()
        .name("http-ready".into())
        .stack_size(4 * 1024)
        .spawn(move || sender.post(OrchestratorEvent::ServiceReady));
    if let Err(e) = spawned {
        warn!("Http: could not defer ServiceReady: {}", e);
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::io::{Read, Write};

    use super::*;
    use crate::app::ports::ServicePort;
    use crate::error::ServiceError;

    /// Bytes moved from the socket to flash per write.
    const OTA_CHUNK_LEN: usize = 1024;

    pub struct EspHttpService {
        sender: MailboxSender<'static>,
        status: SharedStatus,
        update: SharedUpdate,
        server: Option<EspHttpServer<'static>>,
    }

    impl EspHttpService {
        pub fn new(sender: MailboxSender<'static>) -> Self {
            Self {
                sender,
                status: SharedStatus::default(),
                update: SharedUpdate::default(),
                server: None,
            }
        }

        fn build_server(&self) -> anyhow::Result<EspHttpServer<'static>> {
            let mut server = EspHttpServer::new(&Configuration {
                stack_size: 8 * 1024,
                ..Default::default()
            })?;

            {
                let sender = self.sender;
                let status = self.status.clone();
                server.fn_handler::<anyhow::Error, _>(
                    "/wifiConnect.json",
                    Method::Post,
                    move |mut req| {
                        let mut body = [0u8; MAX_BODY_LEN + 1];
                        let mut len = 0;
                        while len < body.len() {
                            let n = req.read(&mut body[len..])?;
                            if n == 0 {
                                break;
                            }
                            len += n;
                        }
                        match handle_connect(&body[..len], &sender, &status) {
                            Ok(()) => {
                                req.into_ok_response()?.write_all(b"{\"queued\":true}")?;
                            }
                            Err(e) => {
                                warn!("Http: provisioning request rejected: {}", e);
                                req.into_status_response(400)?
                                    .write_all(e.to_string().as_bytes())?;
                            }
                        }
                        Ok(())
                    },
                )?;
            }

            {
                let status = self.status.clone();
                server.fn_handler::<anyhow::Error, _>(
                    "/wifiConnectStatus",
                    Method::Get,
                    move |req| {
                        let body = status_json(&status)?;
                        req.into_response(200, Some("OK"), &[("Content-Type", "application/json")])?
                            .write_all(body.as_bytes())?;
                        Ok(())
                    },
                )?;
            }

            {
                let sender = self.sender;
                let update = self.update.clone();
                server.fn_handler::<anyhow::Error, _>("/OTAupdate", Method::Post, move |mut req| {
                    let outcome = write_image(&mut req);
                    finish_update(outcome, &sender, &update);
                    match outcome {
                        UpdateOutcome::Succeeded => {
                            req.into_ok_response()?.write_all(b"{\"ota_update_status\":1}")?;
                        }
                        UpdateOutcome::Failed => {
                            req.into_status_response(500)?
                                .write_all(b"{\"ota_update_status\":-1}")?;
                        }
                    }
                    Ok(())
                })?;
            }

            {
                let update = self.update.clone();
                server.fn_handler::<anyhow::Error, _>("/OTAstatus", Method::Get, move |req| {
                    let body = update_json(&update)?;
                    req.into_response(200, Some("OK"), &[("Content-Type", "application/json")])?
                        .write_all(body.as_bytes())?;
                    Ok(())
                })?;
            }

            Ok(server)
        }
    }

    /// Stream a request body into the inactive OTA partition and make it
    /// the boot partition.  Dropping an unfinished `OtaUpdate` aborts it.
    fn write_image<R: Read>(body: &mut R) -> UpdateOutcome {
        let mut update = match esp_ota::OtaUpdate::begin() {
            Ok(update) => update,
            Err(e) => {
                warn!("Http: esp-ota begin failed: {:?}", e);
                return UpdateOutcome::Failed;
            }
        };

        let mut chunk = [0u8; OTA_CHUNK_LEN];
        let mut written = 0usize;
        loop {
            let n = match body.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("Http: firmware upload interrupted: {:?}", e);
                    return UpdateOutcome::Failed;
                }
            };
            if let Err(e) = update.write(&chunk[..n]) {
                warn!("Http: esp-ota write failed: {:?}", e);
                return UpdateOutcome::Failed;
            }
            written += n;
        }
        if written == 0 {
            warn!("Http: empty firmware image");
            return UpdateOutcome::Failed;
        }

        let mut completed = match update.finalize() {
            Ok(completed) => completed,
            Err(e) => {
                warn!("Http: esp-ota finalize failed: {:?}", e);
                return UpdateOutcome::Failed;
            }
        };
        if let Err(e) = completed.set_as_boot_partition() {
            warn!("Http: esp-ota set_as_boot_partition failed: {:?}", e);
            return UpdateOutcome::Failed;
        }
        info!("Http: {} byte firmware image staged", written);
        UpdateOutcome::Succeeded
    }

    impl ServicePort for EspHttpService {
        fn start(&mut self) -> core::result::Result<(), ServiceError> {
            if self.server.is_some() {
                return Err(ServiceError::AlreadyRunning);
            }
            let server = self.build_server().map_err(|e| {
                warn!("Http: server start failed: {:#}", e);
                ServiceError::StartFailed
            })?;
            self.server = Some(server);
            info!("Http: provisioning server listening");
            announce_ready(self.sender);
            Ok(())
        }

        fn stop(&mut self) {
            if self.server.take().is_some() {
                info!("Http: provisioning server stopped");
            }
            if locked(&self.update, |u| *u) == UpdateStatus::Succeeded {
                info!("Http: restarting into the new firmware");
                esp_ota::restart();
            }
        }

        fn notify(&mut self, notice: ServiceNotice) {
            with_status(&self.status, |s| s.apply(notice));
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use super::*;
    use crate::app::ports::ServicePort;
    use crate::error::ServiceError;

    /// In-process stand-in: requests are fed through [`Self::post_connect`]
    /// and [`Self::post_firmware`] instead of a socket.
    pub struct SimHttpService {
        sender: MailboxSender<'static>,
        status: SharedStatus,
        update: SharedUpdate,
        running: bool,
        restart_requested: bool,
        pub fail_start: bool,
    }

    impl SimHttpService {
        pub fn new(sender: MailboxSender<'static>) -> Self {
            Self {
                sender,
                status: SharedStatus::default(),
                update: SharedUpdate::default(),
                running: false,
                restart_requested: false,
                fail_start: false,
            }
        }

        pub fn is_running(&self) -> bool {
            self.running
        }

        /// Set when the service was stopped after a successful update.
        pub fn restart_requested(&self) -> bool {
            self.restart_requested
        }

        /// Handle to the connect status, for callers on other threads.
        pub fn status(&self) -> SharedStatus {
            self.status.clone()
        }

        /// Simulated `POST /wifiConnect.json`.
        pub fn post_connect(&self, body: &[u8]) -> Result<()> {
            if !self.running {
                return Err(Error::Service(ServiceError::StartFailed));
            }
            handle_connect(body, &self.sender, &self.status)
        }

        /// Simulated `GET /wifiConnectStatus`.
        pub fn get_status(&self) -> Result<String> {
            status_json(&self.status)
        }

        /// Simulated `POST /OTAupdate`.  An empty image fails, anything
        /// else is accepted.
        pub fn post_firmware(&self, image: &[u8]) -> Result<UpdateOutcome> {
            if !self.running {
                return Err(Error::Service(ServiceError::StartFailed));
            }
            let outcome = if image.is_empty() {
                UpdateOutcome::Failed
            } else {
                UpdateOutcome::Succeeded
            };
            finish_update(outcome, &self.sender, &self.update);
            Ok(outcome)
        }

        /// Simulated `GET /OTAstatus`.
        pub fn get_update_status(&self) -> Result<String> {
            update_json(&self.update)
        }
    }

    impl ServicePort for SimHttpService {
        fn start(&mut self) -> core::result::Result<(), ServiceError> {
            if self.fail_start {
                return Err(ServiceError::StartFailed);
            }
            if self.running {
                return Err(ServiceError::AlreadyRunning);
            }
            self.running = true;
            info!("Http(sim): provisioning server listening");
            announce_ready(self.sender);
            Ok(())
        }

        fn stop(&mut self) {
            self.running = false;
            if locked(&self.update, |u| *u) == UpdateStatus::Succeeded {
                info!("Http(sim): restart into the new firmware requested");
                self.restart_requested = true;
            }
        }

        fn notify(&mut self, notice: ServiceNotice) {
            with_status(&self.status, |s| s.apply(notice));
        }
    }
}
