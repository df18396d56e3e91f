//! System configuration parameters
//!
//! Everything the connectivity core consumes at startup: the soft-AP
//! parameters (including its own DHCP scope), the station retry policy,
//! and placement of the connectivity worker task.  Defaults describe the
//! factory provisioning network; a JSON document can override them.

use core::net::Ipv4Addr;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Channel width advertised by the soft-AP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bandwidth {
    /// 20 MHz
    Ht20,
    /// 40 MHz
    Ht40,
}

/// Soft-AP configuration, issued once per boot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPointConfig {
    pub ssid: String<32>,
    pub passphrase: String<64>,
    /// 2.4 GHz channel (1-13)
    pub channel: u8,
    /// Hide the SSID from beacons
    pub hidden: bool,
    /// Maximum simultaneously associated clients
    pub max_connections: u8,
    /// Beacon interval (milliseconds)
    pub beacon_interval_ms: u16,
    pub bandwidth: Bandwidth,
    /// AP's own static address; also the DHCP server address
    pub ip: [u8; 4],
    pub gateway: [u8; 4],
    pub netmask: [u8; 4],
}

impl AccessPointConfig {
    pub fn ip_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.ip)
    }

    pub fn gateway_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.gateway)
    }

    pub fn netmask_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.netmask)
    }
}

/// Placement of the connectivity worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub stack_kb: usize,
    pub priority: u8,
    pub core: u8,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub access_point: AccessPointConfig,

    // --- Station policy ---
    /// Disassociations tolerated per provisioning request before giving up
    pub max_sta_retries: u8,
    /// Seconds to wait for an address after `ConfigureStaMode`; 0 disables
    pub association_timeout_secs: u32,

    // --- Tasks ---
    pub connectivity_task: TaskConfig,
    /// LED animation step (milliseconds)
    pub led_tick_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut ssid = String::new();
        let _ = ssid.push_str("ESP32");
        let mut passphrase = String::new();
        let _ = passphrase.push_str("password");

        Self {
            access_point: AccessPointConfig {
                ssid,
                passphrase,
                channel: 1,
                hidden: false,
                max_connections: 5,
                beacon_interval_ms: 100, // recommended default
                bandwidth: Bandwidth::Ht20,
                ip: [192, 168, 0, 1],
                gateway: [192, 168, 0, 1],
                netmask: [255, 255, 255, 0],
            },

            max_sta_retries: 5,
            association_timeout_secs: 30,

            connectivity_task: TaskConfig {
                stack_kb: 8,
                priority: 5,
                core: 0,
            },
            led_tick_ms: 50,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        let ap = &self.access_point;

        if ap.ssid.is_empty() {
            return Err(Error::Config("AP SSID is empty"));
        }
        if !ap.passphrase.is_empty() && ap.passphrase.len() < 8 {
            return Err(Error::Config("AP passphrase shorter than 8 bytes"));
        }
        if !(1..=13).contains(&ap.channel) {
            return Err(Error::Config("AP channel outside 1-13"));
        }
        if !(1..=10).contains(&ap.max_connections) {
            return Err(Error::Config("AP max connections outside 1-10"));
        }
        if !(100..=60_000).contains(&ap.beacon_interval_ms) {
            return Err(Error::Config("AP beacon interval outside 100-60000 ms"));
        }

        let mask = u32::from(ap.netmask_addr());
        if mask == 0 || mask.leading_ones() + mask.trailing_zeros() != 32 {
            return Err(Error::Config("AP netmask is not contiguous"));
        }
        let ip = u32::from(ap.ip_addr());
        let gw = u32::from(ap.gateway_addr());
        if ip & mask != gw & mask {
            return Err(Error::Config("AP gateway outside AP subnet"));
        }

        if self.max_sta_retries == 0 {
            return Err(Error::Config("max_sta_retries must be at least 1"));
        }
        if self.connectivity_task.stack_kb < 4 {
            return Err(Error::Config("connectivity task stack below 4 KB"));
        }
        if self.led_tick_ms == 0 {
            return Err(Error::Config("led_tick_ms must be non-zero"));
        }
        Ok(())
    }
}
