use thiserror::Error;

use crate::model::Ms;

/// Why a reservation candidate was not committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("the restaurant is full at this time: all {tables} tables are taken")]
    CapacityExceeded { tables: u32 },
    #[error("the reservation time is outside the opening hours")]
    OutsideOperatingHours,
    #[error("party of {party_size} exceeds the table capacity of {table_capacity}")]
    PartySizeExceedsCapacity { party_size: u32, table_capacity: u32 },
}

impl AdmissionError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AdmissionError::CapacityExceeded { .. } => "capacity_exceeded",
            AdmissionError::OutsideOperatingHours => "outside_operating_hours",
            AdmissionError::PartySizeExceedsCapacity { .. } => "party_size_exceeds_capacity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid range: start {start} is after end {end}")]
pub struct InvalidRangeError {
    pub start: Ms,
    pub end: Ms,
}
