use crate::error::RelayError;

/// What to do after a failed attempt
#[derive(Debug)]
pub(crate) enum RetryStep {
    /// Reconnect, then call exactly once more
    Reconnect,
    Fail(RelayError),
}

/// Retry budget of a single outbound call: at most one reconnect followed by
/// one re-call, and only when the call was refused because the transport was
/// already shut down. A call cut off in flight is never resent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryBudget {
    FirstAttempt,
    Retried,
}

impl RetryBudget {
    pub(crate) fn new() -> Self {
        Self::FirstAttempt
    }

    pub(crate) fn after_failure(&mut self, err: RelayError) -> RetryStep {
        match (*self, err) {
            (Self::FirstAttempt, RelayError::Shutdown) => {
                *self = Self::Retried;
                RetryStep::Reconnect
            }
            (_, err) => RetryStep::Fail(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_earns_one_reconnect() {
        let mut budget = RetryBudget::new();
        assert!(matches!(
            budget.after_failure(RelayError::Shutdown),
            RetryStep::Reconnect
        ));
        assert_eq!(budget, RetryBudget::Retried);

        assert!(matches!(
            budget.after_failure(RelayError::Shutdown),
            RetryStep::Fail(RelayError::Shutdown)
        ));
        assert_eq!(budget, RetryBudget::Retried);
    }

    #[test]
    fn test_other_errors_fail_immediately() {
        let mut budget = RetryBudget::new();
        assert!(matches!(
            budget.after_failure(RelayError::Remote("no such game".to_string())),
            RetryStep::Fail(RelayError::Remote(_))
        ));
        // A non-shutdown failure does not spend the budget
        assert_eq!(budget, RetryBudget::FirstAttempt);
    }

    #[test]
    fn test_call_cut_off_in_flight_is_not_resent() {
        let mut budget = RetryBudget::new();
        assert!(matches!(
            budget.after_failure(RelayError::Disconnected),
            RetryStep::Fail(RelayError::Disconnected)
        ));
        assert_eq!(budget, RetryBudget::FirstAttempt);
    }

    #[test]
    fn test_decode_error_after_reconnect_is_final() {
        let mut budget = RetryBudget::new();
        budget.after_failure(RelayError::Shutdown);
        let decode = serde_json::from_str::<bool>("\"yes\"").unwrap_err();
        assert!(matches!(
            budget.after_failure(RelayError::Decode(decode)),
            RetryStep::Fail(RelayError::Decode(_))
        ));
    }
}
