use crate::model::*;

/// The slot a reservation starting at `timestamp` occupies, clamped to the
/// representable range.
pub fn slot_window(timestamp: Ms, slot_length: Ms) -> Span {
    Span::new(timestamp, timestamp.saturating_add(slot_length))
}

/// The UTC calendar day containing `timestamp`, clamped to the representable
/// range.
pub fn day_window(timestamp: Ms) -> Span {
    let start = timestamp.div_euclid(DAY_MS).saturating_mul(DAY_MS);
    Span::new(start, start.saturating_add(DAY_MS))
}

/// Offset of `timestamp` from the preceding UTC midnight.
pub fn time_of_day(timestamp: Ms) -> Ms {
    timestamp.rem_euclid(DAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-05-01T00:00:00Z
    const MAY_1: Ms = 1_714_521_600_000;

    #[test]
    fn slot_is_half_open() {
        let slot = slot_window(MAY_1 + 14 * HOUR_MS, 2 * HOUR_MS);
        assert_eq!(slot.start, MAY_1 + 14 * HOUR_MS);
        assert_eq!(slot.end, MAY_1 + 16 * HOUR_MS);
        assert!(!slot.contains_instant(MAY_1 + 16 * HOUR_MS));
    }

    #[test]
    fn day_window_truncates_to_midnight() {
        let day = day_window(MAY_1 + 14 * HOUR_MS + 30 * MINUTE_MS);
        assert_eq!(day, Span::new(MAY_1, MAY_1 + DAY_MS));
    }

    #[test]
    fn day_window_at_midnight_is_that_day() {
        assert_eq!(day_window(MAY_1), Span::new(MAY_1, MAY_1 + DAY_MS));
        assert_eq!(
            day_window(MAY_1 + DAY_MS - 1),
            Span::new(MAY_1, MAY_1 + DAY_MS)
        );
    }

    #[test]
    fn day_window_before_epoch() {
        // 1969-12-31T23:00:00Z
        let day = day_window(-HOUR_MS);
        assert_eq!(day, Span::new(-DAY_MS, 0));
        assert_eq!(time_of_day(-HOUR_MS), 23 * HOUR_MS);
    }

    #[test]
    fn windows_clamp_at_the_ends_of_time() {
        let slot = slot_window(Ms::MAX - HOUR_MS, 2 * HOUR_MS);
        assert_eq!(slot.end, Ms::MAX);

        let last = day_window(Ms::MAX);
        assert_eq!(last.start, Ms::MAX - time_of_day(Ms::MAX));
        assert_eq!(last.end, Ms::MAX);

        assert_eq!(day_window(Ms::MIN).start, Ms::MIN);
    }

    #[test]
    fn time_of_day_ignores_date() {
        assert_eq!(time_of_day(MAY_1 + 9 * HOUR_MS), 9 * HOUR_MS);
        assert_eq!(time_of_day(MAY_1 + DAY_MS + 9 * HOUR_MS), 9 * HOUR_MS);
    }
}
