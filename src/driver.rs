//! The seam to the device driver that owns the binary wire protocol.
//!
//! The proxy never touches sockets or frames; it calls these operations and
//! treats any failure uniformly. Temperatures cross this boundary as °C
//! floats on the way down and as signed tenths of °C on the way up, matching
//! what the device reports.

use std::fmt;

use async_trait::async_trait;

#[derive(Debug)]
pub enum DriverError {
    Io(std::io::Error),
    Timeout,
    Protocol(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Io(e) => write!(f, "IO error: {e}"),
            DriverError::Timeout => write!(f, "device timeout"),
            DriverError::Protocol(msg) => write!(f, "protocol error: {msg}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        DriverError::Io(e)
    }
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// One daily schedule slot as the device stores it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NativePeriod {
    pub hour: u8,
    pub minute: u8,
    pub temp_tenths: i16,
}

/// Full device status as returned by the status query, still in native
/// representation: enumerations as protocol codes, temperatures as tenths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeStatus {
    pub unique_id: String,
    pub fwversion: String,
    pub key_lock: u8,
    pub power: u8,
    pub manual_in_auto: u8,
    pub valve: u8,
    pub sensor: u8,
    pub operation_mode: u8,
    pub schedule: u8,
    pub frost_protection: u8,
    pub poweron: u8,
    pub room_temp_tenths: i16,
    pub external_temp_tenths: i16,
    pub target_temp_tenths: i16,
    pub external_max_temp_tenths: i16,
    pub calibration_tenths: i16,
    pub hysteresis: u8,
    pub max_temp: u8,
    pub min_temp: u8,
    pub clock_hour: u8,
    pub clock_minute: u8,
    pub clock_second: u8,
    pub clock_weekday: u8,
    pub weekday_periods: [NativePeriod; 6],
    pub weekend_periods: [NativePeriod; 2],
}

/// Device operations the proxy dispatches against. Each call is a single
/// attempt; retry and timeout policy live below this trait.
///
/// Enum-valued setters take the native code, numeric setters take the value
/// in device units. Optional fields in `set_time` and the period setters are
/// passed through as absent, which the device treats as "leave unchanged".
#[async_trait]
pub trait HysenDriver: Send + Sync {
    async fn get_status(&self) -> DriverResult<NativeStatus>;

    async fn set_power(&self, code: u8) -> DriverResult<()>;
    async fn set_operation_mode(&self, code: u8) -> DriverResult<()>;
    async fn set_target_temp(&self, temp: f64) -> DriverResult<()>;
    async fn set_key_lock(&self, code: u8) -> DriverResult<()>;
    async fn set_sensor(&self, code: u8) -> DriverResult<()>;
    async fn set_hysteresis(&self, value: u8) -> DriverResult<()>;
    async fn set_calibration(&self, value: f64) -> DriverResult<()>;
    async fn set_max_temp(&self, value: u8) -> DriverResult<()>;
    async fn set_min_temp(&self, value: u8) -> DriverResult<()>;
    async fn set_external_max_temp(&self, value: f64) -> DriverResult<()>;
    async fn set_frost_protection(&self, code: u8) -> DriverResult<()>;
    async fn set_poweron(&self, code: u8) -> DriverResult<()>;

    async fn set_time(
        &self,
        hour: Option<u8>,
        minute: Option<u8>,
        second: Option<u8>,
        weekday: Option<u8>,
    ) -> DriverResult<()>;

    async fn set_weekly_schedule(&self, code: u8) -> DriverResult<()>;

    /// `slot` is 1..=6.
    async fn set_period(
        &self,
        slot: u8,
        hour: Option<u8>,
        minute: Option<u8>,
        temp: Option<f64>,
    ) -> DriverResult<()>;

    /// `slot` is 1..=2.
    async fn set_weekend_period(
        &self,
        slot: u8,
        hour: Option<u8>,
        minute: Option<u8>,
        temp: Option<f64>,
    ) -> DriverResult<()>;
}
