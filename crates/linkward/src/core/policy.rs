use crate::group::LinkGroupStats;

/// Verdict of an [`AggregatePolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOutcome {
    Valid,
    Invalid(String),
}

impl PolicyOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// A predicate over the status counts a group has accumulated.
///
/// Used as a continuation policy, it is checked before every request of the
/// group and a failure stops further requests. Used as a final policy, it is
/// checked once after the run and a failure is reported as a broken link.
///
/// Any `Fn(&LinkGroupStats) -> PolicyOutcome` is a policy.
pub trait AggregatePolicy: Send + Sync {
    fn apply(&self, stats: &LinkGroupStats) -> PolicyOutcome;
}

impl<F> AggregatePolicy for F
where
    F: Fn(&LinkGroupStats) -> PolicyOutcome + Send + Sync,
{
    fn apply(&self, stats: &LinkGroupStats) -> PolicyOutcome {
        self(stats)
    }
}

/// Requires at least `min` responses with `status`.
///
/// # Examples
///
/// ```
/// use linkward::{AggregatePolicy, LinkGroupStats, PolicyOutcome, count_at_least};
///
/// let stats = LinkGroupStats::default();
/// stats.record(200);
/// assert_eq!(
///     count_at_least(200, 2).apply(&stats),
///     PolicyOutcome::Invalid(
///         "Expected at least 2 200 responses, but found 1 200 responses".to_string()
///     )
/// );
/// ```
pub fn count_at_least(status: i32, min: usize) -> impl AggregatePolicy + Clone {
    move |stats: &LinkGroupStats| {
        let actual = stats.count(status);
        if actual >= min {
            PolicyOutcome::Valid
        } else {
            PolicyOutcome::Invalid(format!(
                "Expected at least {min} {status} responses, but found {actual} {status} responses"
            ))
        }
    }
}

/// Allows at most `max` responses with `status`.
///
/// `count_at_most(429, 0)` as a continuation policy stops a group after the
/// first `429 Too Many Requests`.
pub fn count_at_most(status: i32, max: usize) -> impl AggregatePolicy + Clone {
    move |stats: &LinkGroupStats| {
        let actual = stats.count(status);
        if actual <= max {
            PolicyOutcome::Valid
        } else {
            PolicyOutcome::Invalid(format!(
                "Expected at most {max} {status} responses, but found {actual} {status} responses"
            ))
        }
    }
}
