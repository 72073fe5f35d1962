//! Pluggable transition policies.
//!
//! A policy decides whether a slip may move from one status to another.
//! The manager applies no policy by default; every transition is allowed,
//! which matches how front-office staff actually use these systems (slips
//! get cancelled from any state, re-sent after a remake, and so on).

use crate::models::SlipStatus;

/// Decides whether a status transition is allowed.
///
/// Called with the slip's current status and the requested status before
/// any write happens.
pub type TransitionPolicy = Box<dyn Fn(SlipStatus, SlipStatus) -> bool + Send + Sync>;

/// A strict policy for practices that want the lifecycle enforced:
/// pending -> sent -> in_progress -> completed, with cancellation
/// allowed from any state.
pub fn forward_only_policy() -> TransitionPolicy {
    Box::new(|from, to| {
        use crate::models::SlipStatus::*;
        matches!(
            (from, to),
            (_, Cancelled) | (Pending, Sent) | (Sent, InProgress) | (InProgress, Completed)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlipStatus::*;

    #[test]
    fn test_forward_only_allows_the_happy_path() {
        let policy = forward_only_policy();
        assert!(policy(Pending, Sent));
        assert!(policy(Sent, InProgress));
        assert!(policy(InProgress, Completed));
    }

    #[test]
    fn test_forward_only_allows_cancellation_from_anywhere() {
        let policy = forward_only_policy();
        assert!(policy(Pending, Cancelled));
        assert!(policy(Sent, Cancelled));
        assert!(policy(InProgress, Cancelled));
        assert!(policy(Completed, Cancelled));
    }

    #[test]
    fn test_forward_only_rejects_skips_and_reversals() {
        let policy = forward_only_policy();
        assert!(!policy(Pending, Completed));
        assert!(!policy(Pending, InProgress));
        assert!(!policy(Sent, Pending));
        assert!(!policy(Completed, Sent));
        assert!(!policy(Cancelled, Pending));
    }
}
