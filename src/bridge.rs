//! Event bridge: radio / IP stack notifications → mailbox events.
//!
//! The ESP-IDF event loop delivers `(base, id, data)` triples on its own
//! task.  The bridge reduces them to a [`RawEvent`], maps that to an
//! [`OrchestratorEvent`] with the pure [`translate`] function, and posts it.
//! It never touches orchestrator state.

use core::net::Ipv4Addr;

use log::debug;

use crate::app::events::OrchestratorEvent;
use crate::error::MailboxError;
use crate::mailbox::MailboxSender;

/// Which event base a notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDomain {
    /// `WIFI_EVENT`
    Radio,
    /// `IP_EVENT`
    Ip,
}

/// `WIFI_EVENT` ids (`wifi_event_t`), taken from the IDF bindings.
#[cfg(target_os = "espidf")]
pub mod radio_id {
    use esp_idf_svc::sys;

    pub const STA_START: i32 = sys::wifi_event_t_WIFI_EVENT_STA_START as i32;
    pub const STA_STOP: i32 = sys::wifi_event_t_WIFI_EVENT_STA_STOP as i32;
    pub const STA_CONNECTED: i32 = sys::wifi_event_t_WIFI_EVENT_STA_CONNECTED as i32;
    pub const STA_DISCONNECTED: i32 = sys::wifi_event_t_WIFI_EVENT_STA_DISCONNECTED as i32;
    pub const AP_START: i32 = sys::wifi_event_t_WIFI_EVENT_AP_START as i32;
    pub const AP_STOP: i32 = sys::wifi_event_t_WIFI_EVENT_AP_STOP as i32;
    pub const AP_STACONNECTED: i32 = sys::wifi_event_t_WIFI_EVENT_AP_STACONNECTED as i32;
    pub const AP_STADISCONNECTED: i32 = sys::wifi_event_t_WIFI_EVENT_AP_STADISCONNECTED as i32;
}

/// `IP_EVENT` ids (`ip_event_t`), taken from the IDF bindings.
#[cfg(target_os = "espidf")]
pub mod ip_id {
    use esp_idf_svc::sys;

    pub const STA_GOT_IP: i32 = sys::ip_event_t_IP_EVENT_STA_GOT_IP as i32;
    pub const STA_LOST_IP: i32 = sys::ip_event_t_IP_EVENT_STA_LOST_IP as i32;
}

/// `WIFI_EVENT` ids as numbered by ESP-IDF 5.x, for host builds.
#[cfg(not(target_os = "espidf"))]
pub mod radio_id {
    pub const STA_START: i32 = 2;
    pub const STA_STOP: i32 = 3;
    pub const STA_CONNECTED: i32 = 4;
    pub const STA_DISCONNECTED: i32 = 5;
    pub const AP_START: i32 = 12;
    pub const AP_STOP: i32 = 13;
    pub const AP_STACONNECTED: i32 = 14;
    pub const AP_STADISCONNECTED: i32 = 15;
}

/// `IP_EVENT` ids as numbered by ESP-IDF 5.x, for host builds.
#[cfg(not(target_os = "espidf"))]
pub mod ip_id {
    pub const STA_GOT_IP: i32 = 0;
    pub const STA_LOST_IP: i32 = 1;
}

/// A platform notification with the payload already decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub domain: EventDomain,
    pub id: i32,
    /// Station address, present only for `STA_GOT_IP`.
    pub ip: Option<Ipv4Addr>,
}

impl RawEvent {
    pub const fn radio(id: i32) -> Self {
        Self {
            domain: EventDomain::Radio,
            id,
            ip: None,
        }
    }

    pub const fn got_ip(ip: Ipv4Addr) -> Self {
        Self {
            domain: EventDomain::Ip,
            id: ip_id::STA_GOT_IP,
            ip: Some(ip),
        }
    }
}

/// Map a notification to an orchestrator event.  `None` means the
/// notification is not relevant to connectivity and should be dropped.
pub fn translate(raw: &RawEvent) -> Option<OrchestratorEvent> {
    let event = match (raw.domain, raw.id) {
        (EventDomain::Radio, radio_id::AP_START) => OrchestratorEvent::AccessPointStarted,
        (EventDomain::Radio, radio_id::AP_STOP) => OrchestratorEvent::AccessPointStopped,
        (EventDomain::Radio, radio_id::AP_STACONNECTED) => OrchestratorEvent::PeerAssociated,
        (EventDomain::Radio, radio_id::AP_STADISCONNECTED) => OrchestratorEvent::PeerDisassociated,
        (EventDomain::Radio, radio_id::STA_CONNECTED) => OrchestratorEvent::StationAssociated,
        (EventDomain::Radio, radio_id::STA_DISCONNECTED) => {
            OrchestratorEvent::StationDisassociated
        }
        (EventDomain::Ip, ip_id::STA_GOT_IP) => match raw.ip {
            Some(ip) => OrchestratorEvent::AddressAcquired(ip),
            None => {
                debug!("Bridge: GOT_IP without address, dropped");
                return None;
            }
        },
        (domain, id) => {
            debug!("Bridge: {:?} event {} not relevant, dropped", domain, id);
            return None;
        }
    };
    Some(event)
}

/// Posts translated notifications into the orchestrator's mailbox.
#[derive(Clone, Copy)]
pub struct EventBridge<'a> {
    sender: MailboxSender<'a>,
}

impl<'a> EventBridge<'a> {
    pub fn new(sender: MailboxSender<'a>) -> Self {
        Self { sender }
    }

    /// Handle one notification.  Returns `true` if an event was posted.
    ///
    /// Blocks while the mailbox is full so ordering is preserved.
    pub fn on_notification(&self, raw: &RawEvent) -> bool {
        match translate(raw) {
            Some(event) => {
                debug!("Bridge: {:?}", event);
                self.sender.post(event);
                true
            }
            None => false,
        }
    }

    /// Like [`on_notification`](Self::on_notification) but never waits.
    /// For notifications raised on the orchestrator's own thread.
    pub fn try_notify(&self, raw: &RawEvent) -> Result<bool, MailboxError> {
        match translate(raw) {
            Some(event) => self.sender.try_post(event).map(|()| true),
            None => Ok(false),
        }
    }
}
