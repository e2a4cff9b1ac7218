use chrono::{NaiveTime, Timelike};
use thiserror::Error;

use crate::model::*;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    BadValue { var: &'static str, reason: String },
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Restaurant constants the store admits reservations against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Opening time as an offset from UTC midnight.
    pub opening: Ms,
    /// Closing time as an offset from UTC midnight. Slots must end by then.
    pub closing: Ms,
    /// Reservations allowed to overlap any instant.
    pub tables: u32,
    /// Largest party a single table seats.
    pub table_capacity: u32,
    pub slot_length: Ms,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            opening: 9 * HOUR_MS,
            closing: 21 * HOUR_MS,
            tables: 10,
            table_capacity: 10,
            slot_length: 2 * HOUR_MS,
        }
    }
}

impl StoreConfig {
    /// Read overrides from `TABLEBOOK_*` variables; unset ones keep their default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = lookup("TABLEBOOK_OPENING") {
            config.opening = parse_clock("TABLEBOOK_OPENING", &v)?;
        }
        if let Some(v) = lookup("TABLEBOOK_CLOSING") {
            config.closing = parse_clock("TABLEBOOK_CLOSING", &v)?;
        }
        if let Some(v) = lookup("TABLEBOOK_TABLES") {
            config.tables = parse_u32("TABLEBOOK_TABLES", &v)?;
        }
        if let Some(v) = lookup("TABLEBOOK_TABLE_CAPACITY") {
            config.table_capacity = parse_u32("TABLEBOOK_TABLE_CAPACITY", &v)?;
        }
        if let Some(v) = lookup("TABLEBOOK_SLOT_MINUTES") {
            config.slot_length = parse_u32("TABLEBOOK_SLOT_MINUTES", &v)? as Ms * MINUTE_MS;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tables == 0 {
            return Err(ConfigError::Invalid("table count must be positive"));
        }
        if self.table_capacity == 0 {
            return Err(ConfigError::Invalid("table capacity must be positive"));
        }
        if self.slot_length <= 0 {
            return Err(ConfigError::Invalid("slot length must be positive"));
        }
        if self.opening < 0 || self.closing > DAY_MS {
            return Err(ConfigError::Invalid("opening hours must lie within one day"));
        }
        if self.opening >= self.closing {
            return Err(ConfigError::Invalid("opening must be before closing"));
        }
        if self.closing - self.opening < self.slot_length {
            return Err(ConfigError::Invalid("slot longer than opening hours"));
        }
        Ok(())
    }
}

/// `HH:MM` → offset from midnight. `24:00` is accepted as end of day.
fn parse_clock(var: &'static str, value: &str) -> Result<Ms, ConfigError> {
    if value == "24:00" {
        return Ok(DAY_MS);
    }
    let t = NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| ConfigError::BadValue {
        var,
        reason: format!("expected HH:MM, got {value:?} ({e})"),
    })?;
    Ok(t.num_seconds_from_midnight() as Ms * 1000)
}

fn parse_u32(var: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|e| ConfigError::BadValue {
        var,
        reason: format!("expected a non-negative integer, got {value:?} ({e})"),
    })
}
