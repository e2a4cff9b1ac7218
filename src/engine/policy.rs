use crate::config::StoreConfig;
use crate::model::*;

use super::window::{day_window, slot_window, time_of_day};
use super::AdmissionError;

/// Admits a candidate slot when fewer reservations than tables overlap it.
pub fn admit(_candidate: &Span, overlapping: usize, tables: u32) -> bool {
    overlapping < tables as usize
}

/// The admission rules, parameterised by the restaurant's constants.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionPolicy {
    config: StoreConfig,
}

impl AdmissionPolicy {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn slot(&self, timestamp: Ms) -> Span {
        slot_window(timestamp, self.config.slot_length)
    }

    /// Checks that need no store state: party size and opening hours.
    /// Returns the slot the draft would occupy.
    pub fn check_draft(&self, draft: &ReservationDraft) -> Result<Span, AdmissionError> {
        if draft.party_size > self.config.table_capacity {
            return Err(AdmissionError::PartySizeExceedsCapacity {
                party_size: draft.party_size,
                table_capacity: self.config.table_capacity,
            });
        }
        // No opening hours for a day or slot end outside the representable range.
        let ts = draft.timestamp;
        if ts.checked_sub(time_of_day(ts)).is_none()
            || ts.checked_add(self.config.slot_length).is_none()
        {
            return Err(AdmissionError::OutsideOperatingHours);
        }
        let slot = self.slot(draft.timestamp);
        if !self.opening_hours(draft.timestamp).contains_span(&slot) {
            return Err(AdmissionError::OutsideOperatingHours);
        }
        Ok(slot)
    }

    /// Opening hours on the UTC day containing `timestamp`.
    pub fn opening_hours(&self, timestamp: Ms) -> Span {
        let midnight = day_window(timestamp).start;
        Span::new(
            midnight.saturating_add(self.config.opening),
            midnight.saturating_add(self.config.closing),
        )
    }

    /// Capacity rule. Caller must hold the store's write lock across this
    /// check and the insert that follows it.
    pub fn check_capacity(&self, slot: &Span, overlapping: usize) -> Result<(), AdmissionError> {
        if admit(slot, overlapping, self.config.tables) {
            Ok(())
        } else {
            Err(AdmissionError::CapacityExceeded {
                tables: self.config.tables,
            })
        }
    }

    pub fn open_tables(&self, overlapping: usize) -> u32 {
        (self.config.tables as usize).saturating_sub(overlapping) as u32
    }
}
