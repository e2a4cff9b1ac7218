use ulid::Ulid;

use crate::model::ReservationId;

/// A fresh random identifier. No collision check: 80 random bits per
/// millisecond is enough for a single store.
pub fn next_id() -> ReservationId {
    Ulid::new()
}
