mod book;
mod error;
mod ids;
mod mutations;
mod policy;
mod queries;
mod window;

pub use book::ReservationBook;
pub use error::{AdmissionError, InvalidRangeError};
pub use ids::next_id;
pub use policy::{admit, AdmissionPolicy};
pub use window::{day_window, slot_window, time_of_day};

use tokio::sync::RwLock;

use crate::config::StoreConfig;

/// The authoritative set of reservations for one restaurant.
///
/// All state sits behind a single `tokio::sync::RwLock`, which queues
/// waiters first-in first-out: reads share the lock, `save` and `delete`
/// hold it exclusively. A create runs its overlap scan, admission check and
/// insert under one write guard, so concurrent creates cannot both pass the
/// capacity check for the last table.
pub struct ReservationStore {
    pub(super) book: RwLock<ReservationBook>,
    pub(super) policy: AdmissionPolicy,
}

impl ReservationStore {
    /// Panics in debug builds if `config` fails `StoreConfig::validate`;
    /// callers validate configuration at startup.
    pub fn new(config: StoreConfig) -> Self {
        debug_assert!(config.validate().is_ok(), "invalid store config: {config:?}");
        Self {
            book: RwLock::new(ReservationBook::new()),
            policy: AdmissionPolicy::new(config),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        self.policy.config()
    }
}

impl Default for ReservationStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
