use std::fmt;

use serde::Serialize;

use crate::codes::{
    switch_from_native, KeyLock, OperatingMode, PowerState, ScheduleGrouping, SensorSource,
    ValveState,
};
use crate::driver::{NativePeriod, NativeStatus};
use crate::Result;

/// Absolute setpoint range the device enforces.
pub const DEVICE_MIN_TEMP: u8 = 5;
pub const DEVICE_MAX_TEMP: u8 = 99;

/// Manual-mode dead-band range, whole °C.
pub const HYSTERESIS_MIN: u8 = 1;
pub const HYSTERESIS_MAX: u8 = 9;

/// Sensor calibration range, °C in 0.5 steps.
pub const CALIBRATION_MIN: f64 = -5.0;
pub const CALIBRATION_MAX: f64 = 5.0;

pub(crate) fn tenths_to_celsius(tenths: i16) -> f64 {
    f64::from(tenths) / 10.0
}

/// Hour and minute reassembled into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Device wall clock. Weekday is ISO: 1 = Monday .. 7 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceClock {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub weekday: u8,
}

impl fmt::Display for DeviceClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// One slot of the daily program: from `time` on, hold `temperature`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SchedulePeriod {
    pub time: TimeOfDay,
    pub temperature: f64,
}

impl SchedulePeriod {
    fn from_native(p: &NativePeriod) -> Self {
        Self {
            time: TimeOfDay::new(p.hour, p.minute),
            temperature: tenths_to_celsius(p.temp_tenths),
        }
    }
}

/// Externally visible HVAC mode. `Off` is derived from the power state, not
/// a mode the device itself stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    Off,
    Heat,
    Auto,
}

impl HvacMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HvacMode::Off => "off",
            HvacMode::Heat => "heat",
            HvacMode::Auto => "auto",
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacAction {
    Off,
    Idle,
    Heating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    None,
    Temporary,
    Scheduled,
    Manual,
}

/// Full normalized device state as of the last successful refresh. Built
/// wholesale from a [`NativeStatus`] and replaced atomically; nothing mutates
/// it in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub unique_id: String,
    pub firmware_version: String,
    pub power_state: PowerState,
    pub operating_mode: OperatingMode,
    /// Temporary manual setpoint active while in scheduled mode.
    pub manual_override_active: bool,
    pub valve_state: ValveState,
    pub key_lock: KeyLock,
    pub sensor_source: SensorSource,
    pub room_temperature: f64,
    pub external_temperature: f64,
    pub target_temperature: f64,
    /// Ceiling applied when the external sensor is in use.
    pub external_max_temperature: f64,
    pub hysteresis: u8,
    pub calibration: f64,
    pub min_temperature: u8,
    pub max_temperature: u8,
    pub frost_protection: bool,
    pub power_on_restore: bool,
    pub clock: DeviceClock,
    pub schedule_grouping: ScheduleGrouping,
    pub weekday_periods: [SchedulePeriod; 6],
    pub weekend_periods: [SchedulePeriod; 2],
}

impl Snapshot {
    /// Map a native status into the normalized model. Fails on any code the
    /// translation tables do not know.
    pub fn from_native(status: &NativeStatus) -> Result<Self> {
        Ok(Self {
            unique_id: status.unique_id.clone(),
            firmware_version: status.fwversion.clone(),
            power_state: PowerState::from_native(status.power)?,
            operating_mode: OperatingMode::from_native(status.operation_mode)?,
            manual_override_active: switch_from_native("manual_in_auto", status.manual_in_auto)?,
            valve_state: ValveState::from_native(status.valve)?,
            key_lock: KeyLock::from_native(status.key_lock)?,
            sensor_source: SensorSource::from_native(status.sensor)?,
            room_temperature: tenths_to_celsius(status.room_temp_tenths),
            external_temperature: tenths_to_celsius(status.external_temp_tenths),
            target_temperature: tenths_to_celsius(status.target_temp_tenths),
            external_max_temperature: tenths_to_celsius(status.external_max_temp_tenths),
            hysteresis: status.hysteresis,
            calibration: tenths_to_celsius(status.calibration_tenths),
            min_temperature: status.min_temp,
            max_temperature: status.max_temp,
            frost_protection: switch_from_native("frost_protection", status.frost_protection)?,
            power_on_restore: switch_from_native("poweron", status.poweron)?,
            clock: DeviceClock {
                hour: status.clock_hour,
                minute: status.clock_minute,
                second: status.clock_second,
                weekday: status.clock_weekday,
            },
            schedule_grouping: ScheduleGrouping::from_native(status.schedule)?,
            weekday_periods: status.weekday_periods.map(|p| SchedulePeriod::from_native(&p)),
            weekend_periods: status.weekend_periods.map(|p| SchedulePeriod::from_native(&p)),
        })
    }

    pub fn is_on(&self) -> bool {
        self.power_state == PowerState::On
    }

    /// Effective mode: power off gates everything to `Off` regardless of the
    /// stored operating mode.
    pub fn hvac_mode(&self) -> HvacMode {
        if !self.is_on() {
            HvacMode::Off
        } else if self.operating_mode == OperatingMode::Scheduled {
            HvacMode::Auto
        } else {
            HvacMode::Heat
        }
    }

    /// Modes that can be selected from the current state.
    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        if !self.is_on() {
            &[HvacMode::Off]
        } else if self.manual_override_active {
            &[HvacMode::Off, HvacMode::Auto]
        } else {
            &[HvacMode::Off, HvacMode::Heat, HvacMode::Auto]
        }
    }

    pub fn hvac_action(&self) -> HvacAction {
        if !self.is_on() {
            HvacAction::Off
        } else if self.valve_state == ValveState::Open {
            HvacAction::Heating
        } else {
            HvacAction::Idle
        }
    }

    pub fn preset(&self) -> Preset {
        if !self.is_on() {
            Preset::None
        } else if self.manual_override_active {
            Preset::Temporary
        } else if self.hvac_mode() == HvacMode::Auto {
            Preset::Scheduled
        } else {
            Preset::Manual
        }
    }

    /// Authoritative reading per the configured sensor source.
    pub fn current_temperature(&self) -> f64 {
        if self.sensor_source == SensorSource::External {
            self.external_temperature
        } else {
            self.room_temperature
        }
    }

    /// Target setpoint, absent while powered off.
    pub fn effective_target(&self) -> Option<f64> {
        if self.is_on() {
            Some(self.target_temperature)
        } else {
            None
        }
    }
}
