//! Budgeted backend wrapper for LLM call limiting
//!
//! Wraps any `LlmBackend` and caps the number of invocations per process.

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

/// Environment variable for overriding the budget limit
pub(crate) const BUDGET_ENV_VAR: &str = "LOADBROKER_ADVISORY_BUDGET";

/// A wrapper around an `LlmBackend` that enforces a budget limit on invocations.
///
/// The budget tracks attempted calls, not successful ones: a failed call still
/// consumes its slot.
pub struct BudgetedBackend {
    inner: Box<dyn LlmBackend>,
    calls: AtomicU32,
    limit: u32,
}

impl BudgetedBackend {
    pub fn new(inner: Box<dyn LlmBackend>, limit: u32) -> Self {
        debug!(limit = limit, "Creating BudgetedBackend");
        Self {
            inner,
            calls: AtomicU32::new(0),
            limit,
        }
    }

    /// Create a budgeted backend with the limit resolved from configuration
    ///
    /// Precedence: `LOADBROKER_ADVISORY_BUDGET` > `[advisory] budget` > default.
    pub fn with_limit_from_config(inner: Box<dyn LlmBackend>, config_budget: Option<u32>) -> Self {
        let env_limit = std::env::var(BUDGET_ENV_VAR)
            .ok()
            .and_then(|s| s.parse::<u32>().ok());

        let limit = env_limit
            .or(config_budget)
            .unwrap_or(loadbroker_config::DEFAULT_ADVISORY_BUDGET);

        if env_limit.is_some() {
            debug!(limit = limit, "Using budget limit from {}", BUDGET_ENV_VAR);
        }

        Self::new(inner, limit)
    }

    /// Number of invocations attempted so far
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[async_trait]
impl LlmBackend for BudgetedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        // Count before calling so failures still consume budget
        let current = self.calls.fetch_add(1, Ordering::SeqCst);

        if current >= self.limit {
            let attempted = current + 1;
            warn!(
                limit = self.limit,
                attempted = attempted,
                "Advisory budget exhausted"
            );
            return Err(LlmError::BudgetExceeded {
                limit: self.limit,
                attempted,
            });
        }

        let result = self.inner.invoke(inv).await;

        if let Err(e) = &result {
            debug!(
                call_count = current + 1,
                limit = self.limit,
                error = %e,
                "Inner backend invocation failed (budget slot still consumed)"
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use serial_test::serial;
    use std::time::Duration;

    struct MockSuccessBackend;

    #[async_trait]
    impl LlmBackend for MockSuccessBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Ok(LlmResult::new("{}", "mock", "mock-model"))
        }
    }

    struct MockFailureBackend;

    #[async_trait]
    impl LlmBackend for MockFailureBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            Err(LlmError::Transport("mock failure".to_string()))
        }
    }

    fn invocation() -> LlmInvocation {
        LlmInvocation::new("", Duration::from_secs(8), vec![Message::user("round")])
    }

    #[tokio::test]
    async fn test_budget_allows_calls_under_limit() {
        let backend = BudgetedBackend::new(Box::new(MockSuccessBackend), 2);

        assert!(backend.invoke(invocation()).await.is_ok());
        assert!(backend.invoke(invocation()).await.is_ok());
        assert_eq!(backend.call_count(), 2);

        let err = backend.invoke(invocation()).await.unwrap_err();
        assert_eq!(
            err,
            LlmError::BudgetExceeded {
                limit: 2,
                attempted: 3
            }
        );
    }

    #[tokio::test]
    async fn test_failures_consume_budget() {
        let backend = BudgetedBackend::new(Box::new(MockFailureBackend), 1);

        assert!(matches!(
            backend.invoke(invocation()).await,
            Err(LlmError::Transport(_))
        ));
        assert!(matches!(
            backend.invoke(invocation()).await,
            Err(LlmError::BudgetExceeded { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_limit_precedence() {
        // SAFETY: serialized test; no other thread reads this variable
        unsafe { std::env::remove_var(BUDGET_ENV_VAR) };
        let backend = BudgetedBackend::with_limit_from_config(Box::new(MockSuccessBackend), Some(7));
        assert_eq!(backend.limit(), 7);

        let backend = BudgetedBackend::with_limit_from_config(Box::new(MockSuccessBackend), None);
        assert_eq!(backend.limit(), loadbroker_config::DEFAULT_ADVISORY_BUDGET);

        unsafe { std::env::set_var(BUDGET_ENV_VAR, "3") };
        let backend = BudgetedBackend::with_limit_from_config(Box::new(MockSuccessBackend), Some(7));
        assert_eq!(backend.limit(), 3);
        unsafe { std::env::remove_var(BUDGET_ENV_VAR) };
    }
}
