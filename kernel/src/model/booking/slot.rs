use chrono::{DateTime, Duration, Utc};
use shared::error::{AppError, AppResult};

/// A half-open time interval `[start, end)`.
///
/// Construction enforces `start < end`, so every live `TimeSlot` is a
/// well-formed interval and `overlaps` never sees a degenerate one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeSlot {
    pub fn max_duration() -> Duration {
        Duration::hours(4)
    }

    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::InvalidInterval(
                "end time must be after start time".into(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Validates a requested slot. Check order is fixed so rejections are
    /// deterministic: future, then ordering, then duration.
    pub fn validated(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        if start <= now {
            return Err(AppError::NotInFuture);
        }
        let slot = Self::new(start, end)?;
        if slot.duration() > Self::max_duration() {
            return Err(AppError::InvalidInterval(
                "booking duration cannot exceed 4 hours".into(),
            ));
        }
        Ok(slot)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Half-open overlap test. Slots that merely touch at an endpoint do
    /// not overlap, so back-to-back bookings are legal.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, min, 0).unwrap()
    }

    #[test]
    fn rejects_reversed_and_empty_intervals() {
        assert!(matches!(
            TimeSlot::new(at(12, 0), at(10, 0)),
            Err(AppError::InvalidInterval(_))
        ));
        assert!(matches!(
            TimeSlot::new(at(10, 0), at(10, 0)),
            Err(AppError::InvalidInterval(_))
        ));
    }

    #[rstest]
    // strict containment and partial overlap
    #[case(at(10, 0), at(12, 0), at(11, 0), at(13, 0), true)]
    #[case(at(10, 0), at(12, 0), at(9, 0), at(10, 30), true)]
    #[case(at(10, 0), at(12, 0), at(10, 30), at(11, 30), true)]
    #[case(at(10, 0), at(12, 0), at(9, 0), at(13, 0), true)]
    // touching endpoints are not a conflict
    #[case(at(10, 0), at(12, 0), at(12, 0), at(13, 0), false)]
    #[case(at(10, 0), at(12, 0), at(8, 0), at(10, 0), false)]
    // disjoint
    #[case(at(10, 0), at(12, 0), at(13, 0), at(14, 0), false)]
    fn overlap_is_half_open(
        #[case] a_start: DateTime<Utc>,
        #[case] a_end: DateTime<Utc>,
        #[case] b_start: DateTime<Utc>,
        #[case] b_end: DateTime<Utc>,
        #[case] expected: bool,
    ) {
        let a = TimeSlot::new(a_start, a_end).unwrap();
        let b = TimeSlot::new(b_start, b_end).unwrap();
        assert_eq!(a.overlaps(&b), expected);
        // the predicate is symmetric
        assert_eq!(b.overlaps(&a), expected);
    }

    #[test]
    fn validated_rejects_past_start_first() {
        let now = at(10, 0);
        // start == now is already too late
        assert!(matches!(
            TimeSlot::validated(at(10, 0), at(11, 0), now),
            Err(AppError::NotInFuture)
        ));
        // the future check wins over the ordering check
        assert!(matches!(
            TimeSlot::validated(at(9, 0), at(8, 0), now),
            Err(AppError::NotInFuture)
        ));
        // one second into the future is enough
        let start = at(10, 0) + Duration::seconds(1);
        assert!(TimeSlot::validated(start, at(11, 0), now).is_ok());
    }

    #[test]
    fn validated_enforces_the_duration_boundary() {
        let now = at(8, 0);
        // exactly four hours is fine
        assert!(TimeSlot::validated(at(10, 0), at(14, 0), now).is_ok());
        // one second over is not
        let end = at(14, 0) + Duration::seconds(1);
        assert!(matches!(
            TimeSlot::validated(at(10, 0), end, now),
            Err(AppError::InvalidInterval(_))
        ));
    }
}
