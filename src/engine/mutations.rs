use tracing::debug;

use crate::model::*;
use crate::observability::{
    ADMISSION_REJECTED_TOTAL, RESERVATIONS_CREATED_TOTAL, RESERVATIONS_DELETED_TOTAL,
    RESERVATIONS_LIVE, RESERVATIONS_UPDATED_TOTAL,
};

use super::ids::next_id;
use super::{AdmissionError, ReservationStore};

impl ReservationStore {
    /// Commit a draft and return its id.
    ///
    /// A draft without an id is a create and gets a fresh one. A draft with
    /// an id replaces the record stored under it (or is stored under it if
    /// none exists); the replacement is admitted against every other
    /// reservation, never against the record it replaces.
    pub async fn save(&self, draft: ReservationDraft) -> Result<ReservationId, AdmissionError> {
        let slot = match self.policy.check_draft(&draft) {
            Ok(slot) => slot,
            Err(e) => return Err(self.rejected(&draft, e)),
        };
        let slot_length = self.policy.config().slot_length;

        let mut book = self.book.write().await;
        let overlapping = book
            .overlapping(&slot, slot_length)
            .filter(|r| Some(r.id) != draft.id)
            .count();
        if let Err(e) = self.policy.check_capacity(&slot, overlapping) {
            return Err(self.rejected(&draft, e));
        }

        let (id, created) = match draft.id {
            Some(id) => (id, !book.contains(&id)),
            None => (next_id(), true),
        };
        book.insert(Reservation::commit(id, draft));
        metrics::gauge!(RESERVATIONS_LIVE).set(book.len() as f64);
        drop(book);

        if created {
            metrics::counter!(RESERVATIONS_CREATED_TOTAL).increment(1);
            debug!(%id, start = slot.start, overlapping, "reservation created");
        } else {
            metrics::counter!(RESERVATIONS_UPDATED_TOTAL).increment(1);
            debug!(%id, start = slot.start, overlapping, "reservation replaced");
        }
        Ok(id)
    }

    /// Remove a reservation, returning it. `None` if the id is unknown.
    pub async fn delete(&self, id: &ReservationId) -> Option<Reservation> {
        let mut book = self.book.write().await;
        let removed = book.remove(id)?;
        metrics::gauge!(RESERVATIONS_LIVE).set(book.len() as f64);
        drop(book);

        metrics::counter!(RESERVATIONS_DELETED_TOTAL).increment(1);
        debug!(%id, "reservation deleted");
        Some(removed)
    }

    fn rejected(&self, draft: &ReservationDraft, e: AdmissionError) -> AdmissionError {
        metrics::counter!(ADMISSION_REJECTED_TOTAL, "reason" => e.reason()).increment(1);
        debug!(
            customer = %draft.customer_name,
            timestamp = draft.timestamp,
            party_size = draft.party_size,
            "reservation rejected: {e}"
        );
        e
    }
}
