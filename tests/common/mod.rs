#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hysen_hy03::{DriverError, DriverResult, HysenDriver, NativePeriod, NativeStatus};

/// Recording stand-in for a real driver. Every call lands in `calls` as a
/// formatted string; ops listed via `fail_on` answer with a timeout after
/// being recorded, like a device that went quiet mid-session.
#[derive(Clone, Default)]
pub struct MockDriver {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    calls: Mutex<Vec<String>>,
    fail: Mutex<Vec<&'static str>>,
    status: Mutex<NativeStatus>,
    busy: AtomicBool,
    delay_ms: AtomicU64,
}

impl MockDriver {
    pub fn with_status(status: NativeStatus) -> Self {
        let mock = MockDriver::default();
        *mock.inner.status.lock().unwrap() = status;
        mock
    }

    pub fn set_status(&self, status: NativeStatus) {
        *self.inner.status.lock().unwrap() = status;
    }

    pub fn fail_on(&self, op: &'static str) {
        self.inner.fail.lock().unwrap().push(op);
    }

    pub fn clear_failures(&self) {
        self.inner.fail.lock().unwrap().clear();
    }

    pub fn set_delay_ms(&self, ms: u64) {
        self.inner.delay_ms.store(ms, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().unwrap().clone()
    }

    async fn record(&self, op: &'static str, call: String) -> DriverResult<()> {
        // The real driver's session protocol is not reentrant; the proxy must
        // never let two calls overlap.
        assert!(
            !self.inner.busy.swap(true, Ordering::SeqCst),
            "driver calls interleaved"
        );
        let delay = self.inner.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.calls.lock().unwrap().push(call);
        let failed = self.inner.fail.lock().unwrap().iter().any(|f| *f == op);
        self.inner.busy.store(false, Ordering::SeqCst);
        if failed {
            Err(DriverError::Timeout)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HysenDriver for MockDriver {
    async fn get_status(&self) -> DriverResult<NativeStatus> {
        self.record("get_status", "get_status".to_string()).await?;
        Ok(self.inner.status.lock().unwrap().clone())
    }

    async fn set_power(&self, code: u8) -> DriverResult<()> {
        self.record("set_power", format!("set_power({code})")).await
    }

    async fn set_operation_mode(&self, code: u8) -> DriverResult<()> {
        self.record("set_operation_mode", format!("set_operation_mode({code})"))
            .await
    }

    async fn set_target_temp(&self, temp: f64) -> DriverResult<()> {
        self.record("set_target_temp", format!("set_target_temp({temp})"))
            .await
    }

    async fn set_key_lock(&self, code: u8) -> DriverResult<()> {
        self.record("set_key_lock", format!("set_key_lock({code})")).await
    }

    async fn set_sensor(&self, code: u8) -> DriverResult<()> {
        self.record("set_sensor", format!("set_sensor({code})")).await
    }

    async fn set_hysteresis(&self, value: u8) -> DriverResult<()> {
        self.record("set_hysteresis", format!("set_hysteresis({value})"))
            .await
    }

    async fn set_calibration(&self, value: f64) -> DriverResult<()> {
        self.record("set_calibration", format!("set_calibration({value})"))
            .await
    }

    async fn set_max_temp(&self, value: u8) -> DriverResult<()> {
        self.record("set_max_temp", format!("set_max_temp({value})")).await
    }

    async fn set_min_temp(&self, value: u8) -> DriverResult<()> {
        self.record("set_min_temp", format!("set_min_temp({value})")).await
    }

    async fn set_external_max_temp(&self, value: f64) -> DriverResult<()> {
        self.record("set_external_max_temp", format!("set_external_max_temp({value})"))
            .await
    }

    async fn set_frost_protection(&self, code: u8) -> DriverResult<()> {
        self.record("set_frost_protection", format!("set_frost_protection({code})"))
            .await
    }

    async fn set_poweron(&self, code: u8) -> DriverResult<()> {
        self.record("set_poweron", format!("set_poweron({code})")).await
    }

    async fn set_time(
        &self,
        hour: Option<u8>,
        minute: Option<u8>,
        second: Option<u8>,
        weekday: Option<u8>,
    ) -> DriverResult<()> {
        self.record(
            "set_time",
            format!("set_time({hour:?}, {minute:?}, {second:?}, {weekday:?})"),
        )
        .await
    }

    async fn set_weekly_schedule(&self, code: u8) -> DriverResult<()> {
        self.record("set_weekly_schedule", format!("set_weekly_schedule({code})"))
            .await
    }

    async fn set_period(
        &self,
        slot: u8,
        hour: Option<u8>,
        minute: Option<u8>,
        temp: Option<f64>,
    ) -> DriverResult<()> {
        self.record(
            "set_period",
            format!("set_period({slot}, {hour:?}, {minute:?}, {temp:?})"),
        )
        .await
    }

    async fn set_weekend_period(
        &self,
        slot: u8,
        hour: Option<u8>,
        minute: Option<u8>,
        temp: Option<f64>,
    ) -> DriverResult<()> {
        self.record(
            "set_weekend_period",
            format!("set_weekend_period({slot}, {hour:?}, {minute:?}, {temp:?})"),
        )
        .await
    }
}

pub fn sample_status() -> NativeStatus {
    NativeStatus {
        unique_id: "34:ea:34:0c:1b:2f".to_string(),
        fwversion: "2.1".to_string(),
        key_lock: 0,
        power: 1,
        manual_in_auto: 0,
        valve: 0,
        sensor: 0,
        operation_mode: 0,
        schedule: 0,
        frost_protection: 0,
        poweron: 1,
        room_temp_tenths: 213,
        external_temp_tenths: 175,
        target_temp_tenths: 220,
        external_max_temp_tenths: 420,
        calibration_tenths: 0,
        hysteresis: 2,
        max_temp: 35,
        min_temp: 5,
        clock_hour: 9,
        clock_minute: 15,
        clock_second: 0,
        clock_weekday: 3,
        weekday_periods: [
            NativePeriod { hour: 6, minute: 0, temp_tenths: 200 },
            NativePeriod { hour: 8, minute: 0, temp_tenths: 150 },
            NativePeriod { hour: 11, minute: 30, temp_tenths: 150 },
            NativePeriod { hour: 13, minute: 30, temp_tenths: 150 },
            NativePeriod { hour: 17, minute: 0, temp_tenths: 220 },
            NativePeriod { hour: 22, minute: 0, temp_tenths: 150 },
        ],
        weekend_periods: [
            NativePeriod { hour: 8, minute: 0, temp_tenths: 220 },
            NativePeriod { hour: 23, minute: 0, temp_tenths: 150 },
        ],
    }
}
