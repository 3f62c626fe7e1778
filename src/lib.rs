mod codes;
mod driver;
mod error;
mod proxy;
mod types;

pub use codes::*;
pub use driver::{DriverError, DriverResult, HysenDriver, NativePeriod, NativeStatus};
pub use error::{Error, Result};
pub use proxy::{ClockUpdate, HysenProxy, PeriodUpdate, ScheduleUpdate};
pub use types::*;
