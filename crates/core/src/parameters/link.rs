//! Command-link parameters
//!
//! # Parameters
//!
//! - `LINK_METHOD` - Transport: 0 UDP, 1 ESP-NOW, 2 serial
//! - `LINK_ROGUE_MS` - Longest tolerated gap between valid frames (ms)
//! - `LINK_MIN_RSSI` - Signal floor for a healthy link (dBm)
//! - `LINK_UDP_PORT` - Local UDP port
//! - `LINK_TELEM_MS` - Telemetry interval (ms)
//! - `LINK_FS_ACTION` - Failsafe: 0 inform only, 1 stop on lost, 2 stop on degraded
//! - `LINK_SSID` - Access point name for the UDP transport
//! - `LINK_PASS` - Access point password (hidden)

use heapless::String;

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore, MAX_STRING_LEN};
use crate::control_loop::FailsafeAction;
use crate::link::supervisor::{DEFAULT_MIN_SIGNAL_DBM, DEFAULT_ROGUE_TIMEOUT_US};
use crate::link::{LinkConfig, TransportKind};

pub const DEFAULT_UDP_PORT: u16 = 4210;
pub const DEFAULT_TELEMETRY_MS: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct LinkParams {
    pub transport: TransportKind,
    pub rogue_timeout_ms: u32,
    pub min_rssi_dbm: i16,
    pub udp_port: u16,
    pub telemetry_ms: u32,
    pub failsafe: FailsafeAction,
    pub ssid: String<MAX_STRING_LEN>,
    pub password: String<MAX_STRING_LEN>,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            transport: TransportKind::Udp,
            rogue_timeout_ms: (DEFAULT_ROGUE_TIMEOUT_US / 1_000) as u32,
            min_rssi_dbm: DEFAULT_MIN_SIGNAL_DBM,
            udp_port: DEFAULT_UDP_PORT,
            telemetry_ms: DEFAULT_TELEMETRY_MS,
            failsafe: FailsafeAction::default(),
            ssid: String::new(),
            password: String::new(),
        }
    }
}

impl LinkParams {
    /// Register link parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let d = Self::default();
        store.register(
            "LINK_METHOD",
            ParamValue::Int(d.transport as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "LINK_ROGUE_MS",
            ParamValue::Int(d.rogue_timeout_ms as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "LINK_MIN_RSSI",
            ParamValue::Int(i32::from(d.min_rssi_dbm)),
            ParamFlags::empty(),
        )?;
        store.register(
            "LINK_UDP_PORT",
            ParamValue::Int(i32::from(d.udp_port)),
            ParamFlags::empty(),
        )?;
        store.register(
            "LINK_TELEM_MS",
            ParamValue::Int(d.telemetry_ms as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "LINK_FS_ACTION",
            ParamValue::Int(d.failsafe as i32),
            ParamFlags::empty(),
        )?;
        store.register("LINK_SSID", ParamValue::String(d.ssid), ParamFlags::empty())?;
        store.register(
            "LINK_PASS",
            ParamValue::String(d.password),
            ParamFlags::HIDDEN,
        )?;
        Ok(())
    }

    /// Load link parameters, falling back to defaults for missing or
    /// out-of-range values
    pub fn from_store(store: &ParameterStore) -> Self {
        let d = Self::default();

        let method = store.get_i32_or("LINK_METHOD", d.transport as i32);
        let transport = TransportKind::from_param(method).unwrap_or_else(|| {
            crate::log_warn!("LINK_METHOD {} unknown, using {}", method, d.transport);
            d.transport
        });

        let fs = store.get_i32_or("LINK_FS_ACTION", d.failsafe as i32);
        let failsafe = FailsafeAction::from_param(fs).unwrap_or_else(|| {
            crate::log_warn!("LINK_FS_ACTION {} unknown, using default", fs);
            d.failsafe
        });

        let rogue = store.get_i32_or("LINK_ROGUE_MS", d.rogue_timeout_ms as i32);
        let rogue_timeout_ms = u32::try_from(rogue)
            .ok()
            .filter(|ms| *ms > 0)
            .unwrap_or(d.rogue_timeout_ms);

        let rssi = store.get_i32_or("LINK_MIN_RSSI", i32::from(d.min_rssi_dbm));
        let min_rssi_dbm = i16::try_from(rssi).unwrap_or(d.min_rssi_dbm);

        let port = store.get_i32_or("LINK_UDP_PORT", i32::from(d.udp_port));
        let udp_port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .unwrap_or(d.udp_port);

        let telem = store.get_i32_or("LINK_TELEM_MS", d.telemetry_ms as i32);
        let telemetry_ms = u32::try_from(telem)
            .ok()
            .filter(|ms| *ms > 0)
            .unwrap_or(d.telemetry_ms);

        let text = |name: &str| match store.get(name) {
            Some(ParamValue::String(s)) => s.clone(),
            _ => String::new(),
        };

        Self {
            transport,
            rogue_timeout_ms,
            min_rssi_dbm,
            udp_port,
            telemetry_ms,
            failsafe,
            ssid: text("LINK_SSID"),
            password: text("LINK_PASS"),
        }
    }

    /// Supervisor thresholds
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            rogue_timeout_us: u64::from(self.rogue_timeout_ms) * 1_000,
            min_signal_dbm: self.min_rssi_dbm,
        }
    }

    pub fn telemetry_interval_us(&self) -> u64 {
        u64::from(self.telemetry_ms) * 1_000
    }

    /// Whether access point credentials are configured
    pub fn has_credentials(&self) -> bool {
        !self.ssid.is_empty()
    }
}
