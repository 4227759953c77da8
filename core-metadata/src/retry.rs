//! # Retry Policy
//!
//! Decides what happens after each attempt of a metadata request.
//!
//! | Outcome                | Decision                                         |
//! |------------------------|--------------------------------------------------|
//! | 2xx                    | accept                                           |
//! | 401                    | re-authenticate once, then retry; fail if repeated |
//! | 429                    | fail immediately (surfaced as rate limited)      |
//! | 5xx or transport error | retry after `retry_wait`, up to `retry_count`    |
//! | any other status       | fail                                             |
//!
//! The re-authenticated retry does not draw from `retry_count`.

use core_runtime::MetadataApiConfig;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts allowed after a server or transport failure
    pub retry_count: u32,
    /// Pause before each of those attempts
    pub retry_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_count: 2,
            retry_wait: Duration::from_secs(1),
        }
    }
}

impl From<&MetadataApiConfig> for RetryPolicy {
    fn from(config: &MetadataApiConfig) -> Self {
        Self {
            retry_count: config.retry_count,
            retry_wait: config.retry_wait(),
        }
    }
}

/// What a single attempt produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Status(u16),
    Transport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Accept,
    Retry { after: Duration },
    Reauthenticate,
    Fail,
}

/// Decide the next step.
///
/// `retries_used` counts server/transport retries already spent on this
/// request; `reauthenticated` is true once the request has been replayed with
/// a fresh lease.
pub fn decide(
    outcome: AttemptOutcome,
    retries_used: u32,
    reauthenticated: bool,
    policy: &RetryPolicy,
) -> RetryDecision {
    let retry_if_budget = || {
        if retries_used < policy.retry_count {
            RetryDecision::Retry {
                after: policy.retry_wait,
            }
        } else {
            RetryDecision::Fail
        }
    };

    match outcome {
        AttemptOutcome::Transport => retry_if_budget(),
        AttemptOutcome::Status(status) => match status {
            200..=299 => RetryDecision::Accept,
            401 if !reauthenticated => RetryDecision::Reauthenticate,
            401 | 429 => RetryDecision::Fail,
            500..=u16::MAX => retry_if_budget(),
            _ => RetryDecision::Fail,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(retry_count: u32) -> RetryPolicy {
        RetryPolicy {
            retry_count,
            retry_wait: Duration::from_millis(250),
        }
    }

    #[test]
    fn test_success_is_accepted() {
        for status in [200, 201, 204] {
            assert_eq!(
                decide(AttemptOutcome::Status(status), 0, false, &policy(2)),
                RetryDecision::Accept
            );
        }
    }

    #[test]
    fn test_unauthorized_reauthenticates_once() {
        let p = policy(2);
        assert_eq!(
            decide(AttemptOutcome::Status(401), 0, false, &p),
            RetryDecision::Reauthenticate
        );
        assert_eq!(
            decide(AttemptOutcome::Status(401), 0, true, &p),
            RetryDecision::Fail
        );
    }

    #[test]
    fn test_rate_limit_is_never_retried() {
        assert_eq!(
            decide(AttemptOutcome::Status(429), 0, false, &policy(5)),
            RetryDecision::Fail
        );
    }

    #[test]
    fn test_server_errors_use_retry_budget() {
        let p = policy(2);
        let retry = RetryDecision::Retry {
            after: Duration::from_millis(250),
        };

        assert_eq!(decide(AttemptOutcome::Status(503), 0, false, &p), retry);
        assert_eq!(decide(AttemptOutcome::Status(500), 1, true, &p), retry);
        assert_eq!(
            decide(AttemptOutcome::Status(502), 2, false, &p),
            RetryDecision::Fail
        );
        assert_eq!(decide(AttemptOutcome::Transport, 1, false, &p), retry);
        assert_eq!(
            decide(AttemptOutcome::Transport, 2, false, &p),
            RetryDecision::Fail
        );
    }

    #[test]
    fn test_zero_retry_count_fails_first_server_error() {
        assert_eq!(
            decide(AttemptOutcome::Status(500), 0, false, &policy(0)),
            RetryDecision::Fail
        );
    }

    #[test]
    fn test_other_client_errors_fail() {
        for status in [400, 403, 404, 422, 301] {
            assert_eq!(
                decide(AttemptOutcome::Status(status), 0, false, &policy(2)),
                RetryDecision::Fail,
                "status {}",
                status
            );
        }
    }

    #[test]
    fn test_policy_from_config() {
        let config = MetadataApiConfig::new("id", "secret").with_retry(4, Duration::from_millis(10));
        let p = RetryPolicy::from(&config);
        assert_eq!(p.retry_count, 4);
        assert_eq!(p.retry_wait, Duration::from_millis(10));
    }
}
