use std::collections::HashMap;
use std::ops::Bound;

use crate::model::*;

/// The committed reservations plus a start-time index. Not synchronised:
/// `ReservationStore` wraps it in its lock.
#[derive(Debug, Default)]
pub struct ReservationBook {
    by_id: HashMap<ReservationId, Reservation>,
    /// `(timestamp, id)` for every entry in `by_id`, sorted.
    timeline: Vec<(Ms, ReservationId)>,
}

impl ReservationBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: &ReservationId) -> Option<&Reservation> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &ReservationId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn values(&self) -> impl Iterator<Item = &Reservation> {
        self.by_id.values()
    }

    /// Insert or replace by id. Returns the replaced record.
    pub fn insert(&mut self, reservation: Reservation) -> Option<Reservation> {
        let previous = self.remove(&reservation.id);
        let key = (reservation.timestamp, reservation.id);
        let pos = self.timeline.binary_search(&key).unwrap_or_else(|e| e);
        self.timeline.insert(pos, key);
        self.by_id.insert(reservation.id, reservation);
        previous
    }

    pub fn remove(&mut self, id: &ReservationId) -> Option<Reservation> {
        let removed = self.by_id.remove(id)?;
        if let Ok(pos) = self.timeline.binary_search(&(removed.timestamp, removed.id)) {
            self.timeline.remove(pos);
        }
        Some(removed)
    }

    /// Reservations whose slot overlaps `window`. Every slot has the same
    /// length, so only starts in `(window.start - slot_length, window.end)`
    /// can overlap.
    pub fn overlapping(
        &self,
        window: &Span,
        slot_length: Ms,
    ) -> impl Iterator<Item = &Reservation> {
        self.starting_in(
            Bound::Excluded(window.start.saturating_sub(slot_length)),
            Bound::Excluded(window.end),
        )
    }

    /// Reservations whose start lies within the bounds, ascending by
    /// `(timestamp, id)`.
    pub fn starting_in(&self, from: Bound<Ms>, to: Bound<Ms>) -> impl Iterator<Item = &Reservation> {
        let lo = match from {
            Bound::Included(t) => self.timeline.partition_point(|(ts, _)| *ts < t),
            Bound::Excluded(t) => self.timeline.partition_point(|(ts, _)| *ts <= t),
            Bound::Unbounded => 0,
        };
        let hi = match to {
            Bound::Included(t) => self.timeline.partition_point(|(ts, _)| *ts <= t),
            Bound::Excluded(t) => self.timeline.partition_point(|(ts, _)| *ts < t),
            Bound::Unbounded => self.timeline.len(),
        };
        let range = if lo < hi { &self.timeline[lo..hi] } else { &[][..] };
        range.iter().filter_map(|(_, id)| self.by_id.get(id))
    }
}

#[cfg(test)]
mod tests {
    use ulid::Ulid;

    use super::*;

    const SLOT: Ms = 2 * HOUR_MS;

    fn reservation(timestamp: Ms) -> Reservation {
        Reservation {
            id: Ulid::new(),
            customer_name: "Uscanga".into(),
            party_size: 4,
            timestamp,
        }
    }

    fn starts<'a>(it: impl Iterator<Item = &'a Reservation>) -> Vec<Ms> {
        it.map(|r| r.timestamp).collect()
    }

    #[test]
    fn insert_keeps_timeline_sorted() {
        let mut book = ReservationBook::new();
        book.insert(reservation(300));
        book.insert(reservation(100));
        book.insert(reservation(200));
        assert_eq!(
            starts(book.starting_in(Bound::Unbounded, Bound::Unbounded)),
            vec![100, 200, 300]
        );
    }

    #[test]
    fn insert_same_id_replaces() {
        let mut book = ReservationBook::new();
        let original = reservation(100);
        book.insert(original.clone());

        let moved = Reservation {
            timestamp: 500,
            party_size: 6,
            ..original.clone()
        };
        let previous = book.insert(moved.clone());

        assert_eq!(previous, Some(original));
        assert_eq!(book.len(), 1);
        assert_eq!(book.get(&moved.id), Some(&moved));
        assert_eq!(
            starts(book.starting_in(Bound::Unbounded, Bound::Unbounded)),
            vec![500]
        );
    }

    #[test]
    fn remove_drops_index_entry() {
        let mut book = ReservationBook::new();
        let a = reservation(100);
        let b = reservation(200);
        book.insert(a.clone());
        book.insert(b.clone());

        assert_eq!(book.remove(&a.id), Some(a));
        assert!(book.remove(&Ulid::new()).is_none());
        assert_eq!(book.len(), 1);
        assert_eq!(
            starts(book.starting_in(Bound::Unbounded, Bound::Unbounded)),
            vec![200]
        );
    }

    #[test]
    fn starting_in_respects_bounds() {
        let mut book = ReservationBook::new();
        for t in [100, 200, 300] {
            book.insert(reservation(t));
        }
        assert_eq!(
            starts(book.starting_in(Bound::Excluded(100), Bound::Excluded(300))),
            vec![200]
        );
        assert_eq!(
            starts(book.starting_in(Bound::Included(100), Bound::Excluded(300))),
            vec![100, 200]
        );
        assert_eq!(
            starts(book.starting_in(Bound::Included(100), Bound::Included(300))),
            vec![100, 200, 300]
        );
    }

    #[test]
    fn starting_in_empty_or_inverted_range() {
        let mut book = ReservationBook::new();
        book.insert(reservation(100));
        assert!(book.starting_in(Bound::Excluded(100), Bound::Excluded(100)).next().is_none());
        assert!(book.starting_in(Bound::Included(300), Bound::Included(100)).next().is_none());
    }

    #[test]
    fn overlapping_counts_partial_overlaps() {
        let mut book = ReservationBook::new();
        // [10h,12h) [11h,13h) [12h,14h) [14h,16h)
        for h in [10, 11, 12, 14] {
            book.insert(reservation(h * HOUR_MS));
        }
        let window = Span::new(12 * HOUR_MS, 14 * HOUR_MS);
        // 10h ends exactly at 12h: adjacent, not overlapping; 14h starts at window end.
        assert_eq!(
            starts(book.overlapping(&window, SLOT)),
            vec![11 * HOUR_MS, 12 * HOUR_MS]
        );
    }

    #[test]
    fn overlapping_empty_book() {
        let book = ReservationBook::new();
        let window = Span::new(0, SLOT);
        assert_eq!(book.overlapping(&window, SLOT).count(), 0);
    }

    #[test]
    fn equal_timestamps_ordered_by_id() {
        let mut book = ReservationBook::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let r = reservation(100);
            ids.push(r.id);
            book.insert(r);
        }
        ids.sort();
        let listed: Vec<_> = book
            .starting_in(Bound::Unbounded, Bound::Unbounded)
            .map(|r| r.id)
            .collect();
        assert_eq!(listed, ids);
    }
}
