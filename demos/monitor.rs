use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hysen_hy03::{
    DriverError, DriverResult, HvacMode, HysenDriver, HysenProxy, NativePeriod, NativeStatus,
    PeriodUpdate, ScheduleUpdate, TimeOfDay,
};

/// In-memory stand-in for a real HY03. Commands mutate the stored status, so
/// a refresh after a command shows the device-side effect.
#[derive(Clone)]
struct SimulatedDevice {
    inner: Arc<Inner>,
}

struct Inner {
    status: Mutex<NativeStatus>,
    drop_next: AtomicBool,
}

impl SimulatedDevice {
    fn new() -> Self {
        let status = NativeStatus {
            unique_id: "34:ea:34:0c:1b:2f".to_string(),
            fwversion: "2.1".to_string(),
            power: 1,
            poweron: 1,
            room_temp_tenths: 208,
            external_temp_tenths: 172,
            target_temp_tenths: 220,
            external_max_temp_tenths: 420,
            hysteresis: 2,
            max_temp: 35,
            min_temp: 5,
            clock_hour: 9,
            clock_minute: 15,
            clock_weekday: 1,
            weekday_periods: [NativePeriod { hour: 6, minute: 0, temp_tenths: 200 }; 6],
            weekend_periods: [NativePeriod { hour: 8, minute: 0, temp_tenths: 220 }; 2],
            ..Default::default()
        };
        SimulatedDevice {
            inner: Arc::new(Inner {
                status: Mutex::new(status),
                drop_next: AtomicBool::new(false),
            }),
        }
    }

    fn drop_next_command(&self) {
        self.inner.drop_next.store(true, Ordering::SeqCst);
    }

    fn gate(&self) -> DriverResult<()> {
        if self.inner.drop_next.swap(false, Ordering::SeqCst) {
            Err(DriverError::Timeout)
        } else {
            Ok(())
        }
    }

    fn mutate(&self, apply: impl FnOnce(&mut NativeStatus)) -> DriverResult<()> {
        self.gate()?;
        apply(&mut self.inner.status.lock().expect("status lock"));
        Ok(())
    }
}

fn apply_period(
    period: &mut NativePeriod,
    hour: Option<u8>,
    minute: Option<u8>,
    temp: Option<f64>,
) {
    if let Some(h) = hour {
        period.hour = h;
    }
    if let Some(m) = minute {
        period.minute = m;
    }
    if let Some(t) = temp {
        period.temp_tenths = (t * 10.0).round() as i16;
    }
}

#[async_trait]
impl HysenDriver for SimulatedDevice {
    async fn get_status(&self) -> DriverResult<NativeStatus> {
        self.gate()?;
        Ok(self.inner.status.lock().expect("status lock").clone())
    }

    async fn set_power(&self, code: u8) -> DriverResult<()> {
        self.mutate(|s| s.power = code)
    }

    async fn set_operation_mode(&self, code: u8) -> DriverResult<()> {
        self.mutate(|s| s.operation_mode = code)
    }

    async fn set_target_temp(&self, temp: f64) -> DriverResult<()> {
        self.mutate(|s| s.target_temp_tenths = (temp * 10.0).round() as i16)
    }

    async fn set_key_lock(&self, code: u8) -> DriverResult<()> {
        self.mutate(|s| s.key_lock = code)
    }

    async fn set_sensor(&self, code: u8) -> DriverResult<()> {
        self.mutate(|s| s.sensor = code)
    }

    async fn set_hysteresis(&self, value: u8) -> DriverResult<()> {
        self.mutate(|s| s.hysteresis = value)
    }

    async fn set_calibration(&self, value: f64) -> DriverResult<()> {
        self.mutate(|s| s.calibration_tenths = (value * 10.0).round() as i16)
    }

    async fn set_max_temp(&self, value: u8) -> DriverResult<()> {
        self.mutate(|s| s.max_temp = value)
    }

    async fn set_min_temp(&self, value: u8) -> DriverResult<()> {
        self.mutate(|s| s.min_temp = value)
    }

    async fn set_external_max_temp(&self, value: f64) -> DriverResult<()> {
        self.mutate(|s| s.external_max_temp_tenths = (value * 10.0).round() as i16)
    }

    async fn set_frost_protection(&self, code: u8) -> DriverResult<()> {
        self.mutate(|s| s.frost_protection = code)
    }

    async fn set_poweron(&self, code: u8) -> DriverResult<()> {
        self.mutate(|s| s.poweron = code)
    }

    async fn set_time(
        &self,
        hour: Option<u8>,
        minute: Option<u8>,
        second: Option<u8>,
        weekday: Option<u8>,
    ) -> DriverResult<()> {
        self.mutate(|s| {
            if let Some(h) = hour {
                s.clock_hour = h;
            }
            if let Some(m) = minute {
                s.clock_minute = m;
            }
            if let Some(sec) = second {
                s.clock_second = sec;
            }
            if let Some(w) = weekday {
                s.clock_weekday = w;
            }
        })
    }

    async fn set_weekly_schedule(&self, code: u8) -> DriverResult<()> {
        self.mutate(|s| s.schedule = code)
    }

    async fn set_period(
        &self,
        slot: u8,
        hour: Option<u8>,
        minute: Option<u8>,
        temp: Option<f64>,
    ) -> DriverResult<()> {
        self.mutate(|s| {
            apply_period(&mut s.weekday_periods[slot as usize - 1], hour, minute, temp)
        })
    }

    async fn set_weekend_period(
        &self,
        slot: u8,
        hour: Option<u8>,
        minute: Option<u8>,
        temp: Option<f64>,
    ) -> DriverResult<()> {
        self.mutate(|s| {
            apply_period(&mut s.weekend_periods[slot as usize - 1], hour, minute, temp)
        })
    }
}

async fn print_state(proxy: &HysenProxy) {
    if let Some(snap) = proxy.snapshot().await {
        println!(
            "[{}] room {:.1}\u{00b0}C -> target {:.1}\u{00b0}C | mode: {:?} | action: {:?} | preset: {:?}",
            snap.unique_id,
            snap.room_temperature,
            snap.target_temperature,
            snap.hvac_mode(),
            snap.hvac_action(),
            snap.preset(),
        );
    }
}

#[tokio::main]
async fn main() -> hysen_hy03::Result<()> {
    tracing_subscriber::fmt::init();

    let device = SimulatedDevice::new();
    let proxy = HysenProxy::new(device.clone(), "192.168.1.30");

    proxy.refresh().await?;
    print_state(&proxy).await;

    println!("Raising target to 23.5\u{00b0}C and switching to the weekly program...");
    proxy.set_target_temp(23.5).await?;
    proxy.set_hvac_mode(HvacMode::Auto).await?;

    let mut schedule = ScheduleUpdate::default();
    schedule.weekday[0] = Some(PeriodUpdate {
        time: Some(TimeOfDay::new(6, 30)),
        temperature: Some(21.0),
    });
    proxy.set_schedule(schedule).await?;

    proxy.refresh().await?;
    print_state(&proxy).await;

    // One dropped command: the proxy logs the tagged failure and goes
    // unavailable until a later operation succeeds.
    device.drop_next_command();
    if let Err(e) = proxy.set_hysteresis(3).await {
        eprintln!("command failed: {e}");
    }
    println!("available: {}", proxy.available().await);
    proxy.refresh().await?;
    println!("available after refresh: {}", proxy.available().await);

    Ok(())
}
