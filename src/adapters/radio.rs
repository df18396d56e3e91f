//! WiFi radio adapter.
//!
//! Implements [`RadioPort`]: the only code that writes radio configuration.
//! Also owns the platform event registration that feeds the
//! [`EventBridge`](crate::bridge::EventBridge).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspWifi` plus raw `esp_wifi_*` /
//!   `esp_event_*` calls.
//! - **all other targets**: a simulated radio that answers configuration
//!   with the notifications real hardware would raise.

use crate::app::events::StationCredentials;
use crate::app::ports::RadioPort;
use crate::config::AccessPointConfig;
use crate::error::RadioError;

#[cfg(target_os = "espidf")]
pub use esp::EspRadio;

#[cfg(not(target_os = "espidf"))]
pub use sim::{SIM_STATION_IP, SimRadio};

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use core::ffi::c_void;
    use core::net::Ipv4Addr;

    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::ipv4::{self, Mask, RouterConfiguration, Subnet};
    use esp_idf_svc::netif::{EspNetif, NetifConfiguration};
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::{self, EspError, esp};
    use esp_idf_svc::wifi::{
        AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
    };
    use log::{info, warn};

    use super::*;
    use crate::bridge::{EventBridge, EventDomain, RawEvent, ip_id};
    use crate::config::Bandwidth;

    fn rejected(e: EspError) -> RadioError {
        RadioError::Rejected(e.code())
    }

    /// One `esp_event_handler_instance_register` registration, removed on drop.
    struct Registration {
        base: sys::esp_event_base_t,
        instance: sys::esp_event_handler_instance_t,
    }

    // SAFETY: the handles are opaque tokens owned by the default event
    // loop; they are only passed back to `unregister`.
    unsafe impl Send for Registration {}

    impl Drop for Registration {
        fn drop(&mut self) {
            // SAFETY: `instance` was returned by a successful register call.
            let ret = unsafe {
                sys::esp_event_handler_instance_unregister(
                    self.base,
                    sys::ESP_EVENT_ANY_ID,
                    self.instance,
                )
            };
            if let Err(e) = esp!(ret) {
                warn!("Radio: event handler unregister failed: {}", e);
            }
        }
    }

    pub struct EspRadio {
        wifi: EspWifi<'static>,
        ap: Option<AccessPointConfiguration>,
        // Declared before `_bridge`: handlers are unregistered before the
        // bridge they point at is freed.
        _registrations: [Registration; 2],
        _bridge: Box<EventBridge<'static>>,
    }

    impl EspRadio {
        /// Initialise the WiFi driver and route `WIFI_EVENT` / `IP_EVENT`
        /// notifications into `bridge`.  The radio is not started until
        /// [`RadioPort::configure_ap`].
        pub fn new(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: Option<EspDefaultNvsPartition>,
            bridge: EventBridge<'static>,
        ) -> Result<Self, RadioError> {
            let wifi = EspWifi::new(modem, sysloop, nvs).map_err(rejected)?;
            // Station credentials live in RAM only; NVS stays free of them.
            // SAFETY: the driver was initialised by `EspWifi::new`.
            esp!(unsafe { sys::esp_wifi_set_storage(sys::wifi_storage_t_WIFI_STORAGE_RAM) })
                .map_err(rejected)?;

            let bridge = Box::new(bridge);
            let arg = &*bridge as *const EventBridge<'static> as *mut c_void;
            // SAFETY: WIFI_EVENT / IP_EVENT are immutable statics set up by IDF.
            let registrations = unsafe {
                [
                    register(sys::WIFI_EVENT, arg)?,
                    register(sys::IP_EVENT, arg)?,
                ]
            };

            info!("Radio: driver initialised, event handlers registered");
            Ok(Self {
                wifi,
                ap: None,
                _registrations: registrations,
                _bridge: bridge,
            })
        }
    }

    unsafe fn register(
        base: sys::esp_event_base_t,
        arg: *mut c_void,
    ) -> Result<Registration, RadioError> {
        let mut instance: sys::esp_event_handler_instance_t = core::ptr::null_mut();
        // SAFETY: `arg` points at the boxed bridge, which outlives the
        // registration.
        esp!(unsafe {
            sys::esp_event_handler_instance_register(
                base,
                sys::ESP_EVENT_ANY_ID,
                Some(on_platform_event),
                arg,
                &mut instance,
            )
        })
        .map_err(rejected)?;
        Ok(Registration { base, instance })
    }

    /// Runs on the default event loop task.
    unsafe extern "C" fn on_platform_event(
        arg: *mut c_void,
        base: sys::esp_event_base_t,
        id: i32,
        data: *mut c_void,
    ) {
        // SAFETY: `arg` is the bridge boxed in `EspRadio::new`.
        let bridge = unsafe { &*(arg as *const EventBridge<'static>) };
        // SAFETY: IDF guarantees `data` matches `(base, id)`.
        if let Some(raw) = unsafe { decode(base, id, data) } {
            bridge.on_notification(&raw);
        }
    }

    unsafe fn decode(base: sys::esp_event_base_t, id: i32, data: *mut c_void) -> Option<RawEvent> {
        // SAFETY: reading immutable extern statics.
        let (wifi_base, ip_base) = unsafe { (sys::WIFI_EVENT, sys::IP_EVENT) };
        if base == wifi_base {
            return Some(RawEvent::radio(id));
        }
        if base != ip_base {
            return None;
        }
        if id == ip_id::STA_GOT_IP && !data.is_null() {
            // SAFETY: STA_GOT_IP carries an `ip_event_got_ip_t`.
            let got = unsafe { &*(data as *const sys::ip_event_got_ip_t) };
            return Some(RawEvent::got_ip(Ipv4Addr::from(
                got.ip_info.ip.addr.to_le_bytes(),
            )));
        }
        Some(RawEvent {
            domain: EventDomain::Ip,
            id,
            ip: None,
        })
    }

    /// AP netif with a static address and its own DHCP server.
    fn ap_netif(ap: &AccessPointConfig) -> Result<EspNetif, RadioError> {
        let prefix = u32::from(ap.netmask_addr()).leading_ones() as u8;
        EspNetif::new_with_conf(&NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Router(RouterConfiguration {
                subnet: Subnet {
                    gateway: ap.ip_addr(),
                    mask: Mask(prefix),
                },
                dhcp_enabled: true,
                dns: None,
                secondary_dns: None,
            })),
            ..NetifConfiguration::wifi_default_router()
        })
        .map_err(rejected)
    }

    fn ap_configuration(ap: &AccessPointConfig) -> Result<AccessPointConfiguration, RadioError> {
        Ok(AccessPointConfiguration {
            ssid: ap
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| RadioError::InvalidParameter("AP ssid"))?,
            password: ap
                .passphrase
                .as_str()
                .try_into()
                .map_err(|_| RadioError::InvalidParameter("AP passphrase"))?,
            channel: ap.channel,
            ssid_hidden: ap.hidden,
            max_connections: u16::from(ap.max_connections),
            auth_method: if ap.passphrase.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        })
    }

    impl RadioPort for EspRadio {
        fn configure_ap(&mut self, ap: &AccessPointConfig) -> Result<(), RadioError> {
            self.wifi.swap_netif_ap(ap_netif(ap)?).map_err(rejected)?;

            let ap_conf = ap_configuration(ap)?;
            self.wifi
                .set_configuration(&Configuration::Mixed(
                    ClientConfiguration::default(),
                    ap_conf.clone(),
                ))
                .map_err(rejected)?;

            let bandwidth = match ap.bandwidth {
                Bandwidth::Ht20 => sys::wifi_bandwidth_t_WIFI_BW_HT20,
                Bandwidth::Ht40 => sys::wifi_bandwidth_t_WIFI_BW_HT40,
            };
            // SAFETY: plain driver calls; `raw` outlives both config calls.
            unsafe {
                let mut raw = sys::wifi_config_t::default();
                esp!(sys::esp_wifi_get_config(sys::wifi_interface_t_WIFI_IF_AP, &mut raw))
                    .map_err(rejected)?;
                raw.ap.beacon_interval = ap.beacon_interval_ms;
                esp!(sys::esp_wifi_set_config(sys::wifi_interface_t_WIFI_IF_AP, &mut raw))
                    .map_err(rejected)?;
                esp!(sys::esp_wifi_set_bandwidth(sys::wifi_interface_t_WIFI_IF_AP, bandwidth))
                    .map_err(rejected)?;
                esp!(sys::esp_wifi_set_ps(sys::wifi_ps_type_t_WIFI_PS_NONE)).map_err(rejected)?;
            }

            self.wifi.start().map_err(rejected)?;
            self.ap = Some(ap_conf);
            info!(
                "Radio: soft-AP '{}' on channel {} at {}",
                ap.ssid,
                ap.channel,
                ap.ip_addr()
            );
            Ok(())
        }

        fn configure_sta(&mut self, credentials: &StationCredentials) -> Result<(), RadioError> {
            let Some(ap_conf) = self.ap.clone() else {
                return Err(RadioError::NotInitialised);
            };
            let client = ClientConfiguration {
                ssid: credentials
                    .ssid()
                    .try_into()
                    .map_err(|_| RadioError::InvalidParameter("station ssid"))?,
                password: credentials
                    .passphrase()
                    .try_into()
                    .map_err(|_| RadioError::InvalidParameter("station passphrase"))?,
                auth_method: if credentials.is_open() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            };
            self.wifi
                .set_configuration(&Configuration::Mixed(client, ap_conf))
                .map_err(rejected)?;
            self.wifi.connect().map_err(rejected)?;
            info!("Radio: station connecting to '{}'", credentials.ssid());
            Ok(())
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::net::Ipv4Addr;

    use log::{info, warn};

    use super::*;
    use crate::bridge::{EventBridge, RawEvent, radio_id};

    /// Address handed out by the simulated upstream network.
    pub const SIM_STATION_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 100);

    /// Simulated radio.  Knows one upstream network; credentials matching
    /// it associate and get an address, anything else is disassociated.
    pub struct SimRadio<'a> {
        bridge: Option<EventBridge<'a>>,
        network: Option<StationCredentials>,
        pub reject_ap: bool,
        pub reject_sta: bool,
        pub ap_configurations: u32,
        pub sta_requests: Vec<StationCredentials>,
    }

    impl<'a> SimRadio<'a> {
        pub fn new(bridge: Option<EventBridge<'a>>) -> Self {
            Self {
                bridge,
                network: None,
                reject_ap: false,
                reject_sta: false,
                ap_configurations: 0,
                sta_requests: Vec::new(),
            }
        }

        /// Make `network` reachable.
        pub fn with_network(mut self, network: StationCredentials) -> Self {
            self.network = Some(network);
            self
        }

        fn raise(&self, raw: RawEvent) {
            if let Some(bridge) = &self.bridge {
                if let Err(e) = bridge.try_notify(&raw) {
                    warn!("Radio(sim): {:?} lost: {}", raw, e);
                }
            }
        }
    }

    impl RadioPort for SimRadio<'_> {
        fn configure_ap(&mut self, ap: &AccessPointConfig) -> Result<(), RadioError> {
            if self.reject_ap {
                return Err(RadioError::Rejected(-1));
            }
            self.ap_configurations += 1;
            info!("Radio(sim): soft-AP '{}' at {}", ap.ssid, ap.ip_addr());
            self.raise(RawEvent::radio(radio_id::AP_START));
            Ok(())
        }

        fn configure_sta(&mut self, credentials: &StationCredentials) -> Result<(), RadioError> {
            if self.ap_configurations == 0 {
                return Err(RadioError::NotInitialised);
            }
            if self.reject_sta {
                return Err(RadioError::Rejected(-1));
            }
            self.sta_requests.push(credentials.clone());
            info!("Radio(sim): station connecting to '{}'", credentials.ssid());
            if self.network.as_ref() == Some(credentials) {
                self.raise(RawEvent::radio(radio_id::STA_CONNECTED));
                self.raise(RawEvent::got_ip(SIM_STATION_IP));
            } else {
                self.raise(RawEvent::radio(radio_id::STA_DISCONNECTED));
            }
            Ok(())
        }
    }

}
