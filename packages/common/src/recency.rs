use chrono::{DateTime, TimeDelta, Utc};

/// How far back an `added` timestamp may lie and still count as recent.
pub const RECENT_WINDOW: TimeDelta = TimeDelta::days(1);

/// Returns `true` iff `added` lies within `[now - 1 day, now]`, both bounds inclusive.
///
/// Timestamps in the future are not considered recent.
pub fn was_added_recently(added: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - RECENT_WINDOW <= added && added <= now
}

/// Records carrying an immutable creation timestamp.
pub trait Timestamped {
    fn added(&self) -> DateTime<Utc>;

    /// Evaluates the recency predicate against the current clock.
    fn was_added_recently(&self) -> bool {
        was_added_recently(self.added(), Utc::now())
    }
}
