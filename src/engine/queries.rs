use std::ops::Bound;

use crate::model::*;

use super::window::day_window;
use super::{InvalidRangeError, ReservationStore};

impl ReservationStore {
    pub async fn get(&self, id: &ReservationId) -> Option<Reservation> {
        self.book.read().await.get(id).cloned()
    }

    /// Snapshot of every reservation, in no particular order.
    pub async fn get_all(&self) -> Vec<Reservation> {
        self.book.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.book.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.book.read().await.is_empty()
    }

    /// Reservations starting on the UTC day of `date`, ascending by time.
    /// The day is `[midnight, next midnight)`: a reservation at exactly
    /// 00:00 belongs to the day it starts.
    pub async fn reservations_of_day(&self, date: Ms) -> Vec<Reservation> {
        let day = day_window(date);
        self.book
            .read()
            .await
            .starting_in(Bound::Included(day.start), Bound::Excluded(day.end))
            .cloned()
            .collect()
    }

    /// Reservations with `start < timestamp < end`, ascending by time.
    /// Both bounds are exclusive.
    pub async fn reservations_between(
        &self,
        start: Ms,
        end: Ms,
    ) -> Result<Vec<Reservation>, InvalidRangeError> {
        if start > end {
            return Err(InvalidRangeError { start, end });
        }
        Ok(self
            .book
            .read()
            .await
            .starting_in(Bound::Excluded(start), Bound::Excluded(end))
            .cloned()
            .collect())
    }

    /// Tables still free for a slot starting at `timestamp`. Advisory: a
    /// concurrent `save` may take the table before the caller acts on it.
    pub async fn open_tables_at(&self, timestamp: Ms) -> u32 {
        let slot = self.policy.slot(timestamp);
        let overlapping = self
            .book
            .read()
            .await
            .overlapping(&slot, self.policy.config().slot_length)
            .count();
        self.policy.open_tables(overlapping)
    }
}
