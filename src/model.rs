use ulid::Ulid;

/// Unix milliseconds, UTC. The only time type in the store.
pub type Ms = i64;

pub const MINUTE_MS: Ms = 60_000;
pub const HOUR_MS: Ms = 60 * MINUTE_MS;
pub const DAY_MS: Ms = 24 * HOUR_MS;

/// Opaque reservation identifier, unique among live reservations.
pub type ReservationId = Ulid;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A reservation candidate. Without an id it is a create; with an id it
/// replaces whatever is stored under that id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    pub id: Option<ReservationId>,
    pub customer_name: String,
    pub party_size: u32,
    /// Start of the reserved slot.
    pub timestamp: Ms,
}

impl ReservationDraft {
    pub fn new(customer_name: impl Into<String>, party_size: u32, timestamp: Ms) -> Self {
        Self {
            id: None,
            customer_name: customer_name.into(),
            party_size,
            timestamp,
        }
    }

    pub fn with_id(mut self, id: ReservationId) -> Self {
        self.id = Some(id);
        self
    }
}

impl From<&Reservation> for ReservationDraft {
    fn from(r: &Reservation) -> Self {
        Self {
            id: Some(r.id),
            customer_name: r.customer_name.clone(),
            party_size: r.party_size,
            timestamp: r.timestamp,
        }
    }
}

/// A committed reservation. Never mutated in place: updates replace the
/// whole record under the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reservation {
    pub id: ReservationId,
    pub customer_name: String,
    pub party_size: u32,
    pub timestamp: Ms,
}

impl Reservation {
    pub(crate) fn commit(id: ReservationId, draft: ReservationDraft) -> Self {
        Self {
            id,
            customer_name: draft.customer_name,
            party_size: draft.party_size,
            timestamp: draft.timestamp,
        }
    }
}
