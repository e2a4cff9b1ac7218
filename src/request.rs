//! Field-level validation for client booking requests.
//!
//! The store only sees well-formed drafts; everything syntactic about a
//! request (names, dates, clock times) is checked here first.

use chrono::{DateTime, NaiveDate, NaiveTime};
use thiserror::Error;

use crate::model::*;

pub const MAX_CUSTOMER_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("the customer name is required")]
    MissingCustomerName,
    #[error("the customer name is too long (max {MAX_CUSTOMER_NAME_LEN} characters)")]
    CustomerNameTooLong,
    #[error("the party size must be greater than 0")]
    PartySizeNotPositive,
    #[error("the date is required")]
    MissingDate,
    #[error("the date must be in the format yyyy-MM-dd")]
    DateFormat,
    #[error("the date is invalid")]
    InvalidDate,
    #[error("the time is required")]
    MissingTime,
    #[error("the time must be in the format HH:mm")]
    TimeFormat,
    #[error("the time is invalid")]
    InvalidTime,
}

/// A booking as the client sent it, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingRequest {
    /// Set when the client replaces an existing reservation.
    pub id: Option<ReservationId>,
    pub customer_name: Option<String>,
    pub party_size: i64,
    /// `yyyy-MM-dd`
    pub date: Option<String>,
    /// `HH:mm`, UTC
    pub time: Option<String>,
}

impl BookingRequest {
    /// Validate every field and compose the UTC start instant.
    pub fn into_draft(self) -> Result<ReservationDraft, RequestError> {
        let customer_name = match self.customer_name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(RequestError::MissingCustomerName),
        };
        if customer_name.chars().count() > MAX_CUSTOMER_NAME_LEN {
            return Err(RequestError::CustomerNameTooLong);
        }
        if self.party_size <= 0 {
            return Err(RequestError::PartySizeNotPositive);
        }
        // Anything past u32 is far beyond any table capacity; clamp and let
        // the admission policy reject it.
        let party_size = u32::try_from(self.party_size).unwrap_or(u32::MAX);

        let timestamp = parse_instant(self.date.as_deref(), self.time.as_deref())?;

        let draft = ReservationDraft::new(customer_name, party_size, timestamp);
        Ok(match self.id {
            Some(id) => draft.with_id(id),
            None => draft,
        })
    }
}

/// Validate a `yyyy-MM-dd` date and `HH:mm` time and compose the UTC instant.
pub fn parse_instant(date: Option<&str>, time: Option<&str>) -> Result<Ms, RequestError> {
    let date = parse_date(date)?;
    let time = parse_time(time)?;
    Ok(date.and_time(time).and_utc().timestamp_millis())
}

/// `yyyy-MM-dd` of the UTC day containing `timestamp`.
pub fn format_date(timestamp: Ms) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// `HH:mm` of `timestamp` in UTC.
pub fn format_time(timestamp: Ms) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Validate a `yyyy-MM-dd` query date and return its UTC midnight.
pub fn parse_day(date: Option<&str>) -> Result<Ms, RequestError> {
    let date = parse_date(date)?;
    Ok(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

fn parse_date(date: Option<&str>) -> Result<NaiveDate, RequestError> {
    let date = match date {
        Some(d) if !d.is_empty() => d,
        _ => return Err(RequestError::MissingDate),
    };
    if date.len() != 10 {
        return Err(RequestError::DateFormat);
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| RequestError::InvalidDate)
}

fn parse_time(time: Option<&str>) -> Result<NaiveTime, RequestError> {
    let time = match time {
        Some(t) if !t.is_empty() => t,
        _ => return Err(RequestError::MissingTime),
    };
    if time.len() != 5 {
        return Err(RequestError::TimeFormat);
    }
    NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| RequestError::InvalidTime)
}
