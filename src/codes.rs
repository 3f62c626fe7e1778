//! Translation tables between the device's native protocol codes and the
//! normalized vocabulary.
//!
//! Each enumerated domain is declared once as a (variant, code, label) table;
//! the macro derives both directions of the mapping from the same table, so
//! the round-trip property holds by construction. An unmapped native code is
//! a protocol error, never a silent default.

use crate::{Error, Result};

macro_rules! native_codes {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $domain:literal {
            $( $variant:ident = $code:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
        $vis enum $name {
            $( #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            pub fn from_native(code: u8) -> Result<Self> {
                match code {
                    $( $code => Ok($name::$variant), )+
                    other => Err(Error::UnknownCode { domain: $domain, code: other }),
                }
            }

            pub fn native(self) -> u8 {
                match self {
                    $( $name::$variant => $code, )+
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

native_codes! {
    /// Front-panel key lock.
    pub enum KeyLock : "key_lock" {
        Unlocked = 0 => "unlocked",
        Locked   = 1 => "locked",
    }
}

native_codes! {
    pub enum PowerState : "power" {
        Off = 0 => "off",
        On  = 1 => "on",
    }
}

native_codes! {
    /// Heating valve position; open means the device is calling for heat.
    pub enum ValveState : "valve" {
        Closed = 0 => "closed",
        Open   = 1 => "open",
    }
}

native_codes! {
    /// Which temperature reading is authoritative.
    pub enum SensorSource : "sensor" {
        Internal = 0 => "internal",
        External = 1 => "external",
        IntExt   = 2 => "int_ext",
    }
}

native_codes! {
    /// Which calendar days run the weekday program. The labels are the
    /// device's day-digit convention: remaining days run the weekend program.
    pub enum ScheduleGrouping : "weekly_schedule" {
        WeekdaysOnly = 0 => "12345",
        MonToSat     = 1 => "123456",
        AllDays      = 2 => "1234567",
    }
}

native_codes! {
    /// Stored operating mode. Only meaningful while the device is powered on.
    pub enum OperatingMode : "operation_mode" {
        Manual    = 0 => "manual",
        Scheduled = 1 => "scheduled",
    }
}

/// Two-valued on/off domains (frost protection, power-on restore, the
/// manual-override flag) share one code pair on the wire.
pub fn switch_from_native(domain: &'static str, code: u8) -> Result<bool> {
    match code {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::UnknownCode { domain, code: other }),
    }
}

pub fn switch_native(on: bool) -> u8 {
    if on { 1 } else { 0 }
}
