use std::future::Future;

use chrono::{Datelike, Local, Timelike};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::codes::{switch_native, KeyLock, OperatingMode, PowerState, ScheduleGrouping, SensorSource};
use crate::driver::{DriverError, HysenDriver};
use crate::types::{
    HvacMode, Snapshot, TimeOfDay, CALIBRATION_MAX, CALIBRATION_MIN, DEVICE_MAX_TEMP,
    DEVICE_MIN_TEMP, HYSTERESIS_MAX, HYSTERESIS_MIN,
};
use crate::{Error, Result};

const WEEKDAY_PERIOD_COMMANDS: [&str; 6] = [
    "set_period1",
    "set_period2",
    "set_period3",
    "set_period4",
    "set_period5",
    "set_period6",
];

const WEEKEND_PERIOD_COMMANDS: [&str; 2] = ["set_we_period1", "set_we_period2"];

/// One slot of a schedule update. Time and temperature can be changed
/// independently; an omitted half is passed to the device as unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodUpdate {
    pub time: Option<TimeOfDay>,
    pub temperature: Option<f64>,
}

/// Composite weekly-schedule update. Only the supplied field groups produce
/// driver calls; a caller that fills in a single period updates exactly that
/// period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleUpdate {
    pub grouping: Option<ScheduleGrouping>,
    pub weekday: [Option<PeriodUpdate>; 6],
    pub weekend: [Option<PeriodUpdate>; 2],
}

/// Device clock update. All fields optional; absent fields are passed through
/// as unchanged. Weekday is ISO, 1 = Monday .. 7 = Sunday.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClockUpdate {
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub weekday: Option<u8>,
}

impl ClockUpdate {
    /// Snapshot of the host's wall clock.
    pub fn system_time() -> Self {
        let now = Local::now();
        Self {
            hour: Some(now.hour() as u8),
            minute: Some(now.minute() as u8),
            second: Some(now.second() as u8),
            weekday: Some(now.weekday().number_from_monday() as u8),
        }
    }
}

struct ProxyState {
    snapshot: Option<Snapshot>,
    available: bool,
}

/// State proxy for one thermostat.
///
/// Owns the driver connection and the last known [`Snapshot`]. The snapshot
/// is written only inside [`refresh`](HysenProxy::refresh); commands go to
/// the device and surface on the next refresh, since the device does not echo
/// new state in its command acknowledgements.
///
/// The device's session protocol is not reentrant, so every operation holds
/// an internal lock across its driver call: a second command against the same
/// proxy waits for the first to complete.
pub struct HysenProxy {
    driver: Box<dyn HysenDriver>,
    host: String,
    state: Mutex<ProxyState>,
}

impl HysenProxy {
    pub fn new(driver: impl HysenDriver + 'static, host: impl Into<String>) -> Self {
        Self {
            driver: Box::new(driver),
            host: host.into(),
            state: Mutex::new(ProxyState {
                snapshot: None,
                available: false,
            }),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Last known state, if a refresh has succeeded yet.
    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.state.lock().await.snapshot.clone()
    }

    /// While false, snapshot reads should be treated as stale.
    pub async fn available(&self) -> bool {
        self.state.lock().await.available
    }

    /// Pull the full device status and rebuild the snapshot. On any failure
    /// the previous snapshot is kept and the proxy is marked unavailable.
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.available = true;
        let status = match self.driver.get_status().await {
            Ok(status) => status,
            Err(source) => {
                state.available = false;
                let err = self.command_error("get_status", source);
                warn!(host = %self.host, error = %err, "status refresh failed");
                return Err(err);
            }
        };
        match Snapshot::from_native(&status) {
            Ok(snapshot) => {
                debug!(host = %self.host, id = %snapshot.unique_id, "snapshot refreshed");
                state.snapshot = Some(snapshot);
                Ok(())
            }
            Err(err) => {
                state.available = false;
                warn!(host = %self.host, error = %err, "device status not translatable");
                Err(err)
            }
        }
    }

    /// Select the effective mode. `Off` is not a device mode: requesting it
    /// while powered on turns the device off, and requesting it while already
    /// off turns the device back on. Heat and auto set the stored operating
    /// mode directly.
    pub async fn set_hvac_mode(&self, mode: HvacMode) -> Result<()> {
        let mut state = self.state.lock().await;
        match mode {
            HvacMode::Off => {
                let is_on = state.snapshot.as_ref().is_some_and(Snapshot::is_on);
                self.power(&mut state, !is_on).await
            }
            HvacMode::Heat => {
                let code = OperatingMode::Manual.native();
                self.dispatch(&mut state, "set_operation_mode", self.driver.set_operation_mode(code))
                    .await
            }
            HvacMode::Auto => {
                let code = OperatingMode::Scheduled.native();
                self.dispatch(&mut state, "set_operation_mode", self.driver.set_operation_mode(code))
                    .await
            }
        }
    }

    pub async fn turn_on(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.power(&mut state, true).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.power(&mut state, false).await
    }

    /// Set the target temperature, clamped to the device's configured range.
    pub async fn set_target_temp(&self, temp: f64) -> Result<()> {
        let mut state = self.state.lock().await;
        let (min, max) = setpoint_bounds(&state);
        let temp = temp.clamp(min, max);
        self.dispatch(&mut state, "set_target_temp", self.driver.set_target_temp(temp))
            .await
    }

    pub async fn set_key_lock(&self, key_lock: KeyLock) -> Result<()> {
        let mut state = self.state.lock().await;
        self.dispatch(&mut state, "set_key_lock", self.driver.set_key_lock(key_lock.native()))
            .await
    }

    pub async fn set_sensor(&self, sensor: SensorSource) -> Result<()> {
        let mut state = self.state.lock().await;
        self.dispatch(&mut state, "set_sensor", self.driver.set_sensor(sensor.native()))
            .await
    }

    /// Set the manual-mode dead-band, clamped to the device range.
    pub async fn set_hysteresis(&self, hysteresis: u8) -> Result<()> {
        let mut state = self.state.lock().await;
        let hysteresis = hysteresis.clamp(HYSTERESIS_MIN, HYSTERESIS_MAX);
        self.dispatch(&mut state, "set_hysteresis", self.driver.set_hysteresis(hysteresis))
            .await
    }

    /// Set the sensor calibration offset. Clamped to the device range; only
    /// multiples of 0.5 °C are accepted.
    pub async fn set_calibration(&self, calibration: f64) -> Result<()> {
        let mut state = self.state.lock().await;
        let calibration = calibration.clamp(CALIBRATION_MIN, CALIBRATION_MAX);
        check_half_step("calibration", calibration)?;
        self.dispatch(&mut state, "set_calibration", self.driver.set_calibration(calibration))
            .await
    }

    pub async fn set_max_temp(&self, max_temp: u8) -> Result<()> {
        let mut state = self.state.lock().await;
        let max_temp = max_temp.clamp(DEVICE_MIN_TEMP, DEVICE_MAX_TEMP);
        self.dispatch(&mut state, "set_max_temp", self.driver.set_max_temp(max_temp))
            .await
    }

    pub async fn set_min_temp(&self, min_temp: u8) -> Result<()> {
        let mut state = self.state.lock().await;
        let min_temp = min_temp.clamp(DEVICE_MIN_TEMP, DEVICE_MAX_TEMP);
        self.dispatch(&mut state, "set_min_temp", self.driver.set_min_temp(min_temp))
            .await
    }

    /// Ceiling applied to the external sensor reading.
    pub async fn set_external_max_temp(&self, temp: f64) -> Result<()> {
        let mut state = self.state.lock().await;
        let temp = temp.clamp(f64::from(DEVICE_MIN_TEMP), f64::from(DEVICE_MAX_TEMP));
        self.dispatch(&mut state, "set_external_max_temp", self.driver.set_external_max_temp(temp))
            .await
    }

    pub async fn set_frost_protection(&self, enabled: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        let code = switch_native(enabled);
        self.dispatch(&mut state, "set_frost_protection", self.driver.set_frost_protection(code))
            .await
    }

    /// Whether the device resumes powered on after a mains loss.
    pub async fn set_power_on_restore(&self, enabled: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        let code = switch_native(enabled);
        self.dispatch(&mut state, "set_poweron", self.driver.set_poweron(code))
            .await
    }

    /// Set the device clock. Absent fields are left unchanged on the device.
    pub async fn set_clock(&self, update: ClockUpdate) -> Result<()> {
        check_range("hour", update.hour, 0, 23)?;
        check_range("minute", update.minute, 0, 59)?;
        check_range("second", update.second, 0, 59)?;
        check_range("weekday", update.weekday, 1, 7)?;
        let mut state = self.state.lock().await;
        self.dispatch(
            &mut state,
            "set_time",
            self.driver
                .set_time(update.hour, update.minute, update.second, update.weekday),
        )
        .await
    }

    /// Set the device clock from the host's wall clock.
    pub async fn sync_clock(&self) -> Result<()> {
        self.set_clock(ClockUpdate::system_time()).await
    }

    /// Apply a weekly-schedule update. Each supplied field group is its own
    /// device call, and later groups are still attempted when an earlier one
    /// fails; partial application is the documented behavior. The first error
    /// is returned once all groups have been tried.
    pub async fn set_schedule(&self, update: ScheduleUpdate) -> Result<()> {
        let mut state = self.state.lock().await;
        let (min, max) = setpoint_bounds(&state);
        let mut first_err = None;

        if let Some(grouping) = update.grouping {
            let result = self
                .dispatch(&mut state, "set_weekly_schedule", self.driver.set_weekly_schedule(grouping.native()))
                .await;
            collect_err(&mut first_err, result);
        }

        for (idx, slot) in update.weekday.iter().enumerate() {
            let Some(period) = slot else { continue };
            let command = WEEKDAY_PERIOD_COMMANDS[idx];
            let result = match checked_period_args(command, period, min, max) {
                Ok((hour, minute, temp)) => {
                    self.dispatch(
                        &mut state,
                        command,
                        self.driver.set_period(idx as u8 + 1, hour, minute, temp),
                    )
                    .await
                }
                Err(err) => Err(err),
            };
            collect_err(&mut first_err, result);
        }

        for (idx, slot) in update.weekend.iter().enumerate() {
            let Some(period) = slot else { continue };
            let command = WEEKEND_PERIOD_COMMANDS[idx];
            let result = match checked_period_args(command, period, min, max) {
                Ok((hour, minute, temp)) => {
                    self.dispatch(
                        &mut state,
                        command,
                        self.driver.set_weekend_period(idx as u8 + 1, hour, minute, temp),
                    )
                    .await
                }
                Err(err) => Err(err),
            };
            collect_err(&mut first_err, result);
        }

        match first_err {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    async fn power(&self, state: &mut ProxyState, on: bool) -> Result<()> {
        let power = if on { PowerState::On } else { PowerState::Off };
        let command = if on { "turn_on" } else { "turn_off" };
        self.dispatch(state, command, self.driver.set_power(power.native()))
            .await
    }

    /// The uniform command protocol: mark the proxy available while talking
    /// to the device, run exactly one driver call, and flip back to
    /// unavailable on failure. The snapshot is never written here.
    async fn dispatch<F>(&self, state: &mut ProxyState, command: &'static str, call: F) -> Result<()>
    where
        F: Future<Output = std::result::Result<(), DriverError>>,
    {
        state.available = true;
        match call.await {
            Ok(()) => Ok(()),
            Err(source) => {
                state.available = false;
                let err = self.command_error(command, source);
                warn!(host = %self.host, command, error = %err, "device command failed");
                Err(err)
            }
        }
    }

    fn command_error(&self, command: &'static str, source: DriverError) -> Error {
        Error::Command {
            host: self.host.clone(),
            command,
            source,
        }
    }
}

fn setpoint_bounds(state: &ProxyState) -> (f64, f64) {
    let (min, max) = state
        .snapshot
        .as_ref()
        .map(|s| (s.min_temperature, s.max_temperature))
        .unwrap_or((DEVICE_MIN_TEMP, DEVICE_MAX_TEMP));
    (f64::from(min), f64::from(max))
}

fn collect_err(first: &mut Option<Error>, result: Result<()>) {
    if let Err(err) = result
        && first.is_none()
    {
        *first = Some(err);
    }
}

fn check_half_step(field: &'static str, value: f64) -> Result<()> {
    let doubled = value * 2.0;
    if (doubled - doubled.round()).abs() > 1e-9 {
        return Err(Error::InvalidArgument {
            field,
            reason: format!("{value} is not a multiple of 0.5"),
        });
    }
    Ok(())
}

fn check_range(field: &'static str, value: Option<u8>, min: u8, max: u8) -> Result<()> {
    if let Some(v) = value
        && !(min..=max).contains(&v)
    {
        return Err(Error::InvalidArgument {
            field,
            reason: format!("{v} not in {min}..={max}"),
        });
    }
    Ok(())
}

fn checked_period_args(
    command: &'static str,
    period: &PeriodUpdate,
    min: f64,
    max: f64,
) -> Result<(Option<u8>, Option<u8>, Option<f64>)> {
    if let Some(time) = period.time {
        check_range(command, Some(time.hour), 0, 23)?;
        if time.minute > 59 {
            return Err(Error::InvalidArgument {
                field: command,
                reason: format!("minute {} not in 0..=59", time.minute),
            });
        }
    }
    let hour = period.time.map(|t| t.hour);
    let minute = period.time.map(|t| t.minute);
    let temp = period.temperature.map(|t| t.clamp(min, max));
    Ok((hour, minute, temp))
}
