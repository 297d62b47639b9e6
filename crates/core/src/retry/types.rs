//! Retry policy and state types.

use std::time::Duration;

use crate::config::PipelineConfig;
use crate::session::SessionError;

/// Pause between attempts: `base + random * jitter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub jitter: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// No pause at all. Used by tests.
    pub fn none() -> Self {
        Self::default()
    }

    /// Draw the next delay. Always within `[base, base + jitter]`.
    pub fn delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.base;
        }
        self.base + self.jitter.mul_f64(fastrand::f64())
    }
}

/// Attempt budget plus backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: BackoffPolicy) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

impl From<&PipelineConfig> for RetryPolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self::new(
            config.max_attempts,
            BackoffPolicy::new(config.backoff_base(), config.backoff_jitter()),
        )
    }
}

/// Where a resolution currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPhase {
    /// No attempt made yet.
    Pending,
    /// An attempt is in flight.
    Attempting,
    /// The last attempt failed and budget remains.
    AttemptFailed,
    /// An attempt produced an acceptable value.
    Succeeded,
    /// The budget ran out.
    Exhausted,
}

/// Per-query retry bookkeeping. Discarded once a terminal phase is reached.
#[derive(Debug)]
pub struct RetryState {
    attempt: u32,
    max_attempts: u32,
    phase: RetryPhase,
    last_error: Option<SessionError>,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            phase: RetryPhase::Pending,
            last_error: None,
        }
    }

    /// Attempts started so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// Whether another attempt may be started.
    pub fn has_budget(&self) -> bool {
        self.attempt < self.max_attempts
            && matches!(self.phase, RetryPhase::Pending | RetryPhase::AttemptFailed)
    }

    /// Move to `Attempting`, returning the 1-based attempt number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.phase = RetryPhase::Attempting;
        self.attempt
    }

    pub fn record_success(&mut self) {
        self.phase = RetryPhase::Succeeded;
    }

    /// Record a failed attempt. `error` is `None` when the call returned a
    /// value the caller did not accept; the previous error is kept then.
    pub fn record_failure(&mut self, error: Option<SessionError>) {
        if let Some(error) = error {
            self.last_error = Some(error);
        }
        self.phase = if self.attempt >= self.max_attempts {
            RetryPhase::Exhausted
        } else {
            RetryPhase::AttemptFailed
        };
    }

    /// Build the terminal outcome for an exhausted state.
    pub fn into_exhausted<T>(self) -> RetryOutcome<T> {
        RetryOutcome::Exhausted {
            attempts: self.attempt,
            last_error: self.last_error,
        }
    }
}

/// Terminal result of a retry cycle.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32 },
    Exhausted {
        attempts: u32,
        last_error: Option<SessionError>,
    },
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Succeeded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. } | RetryOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    /// The accepted value, if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            RetryOutcome::Succeeded { value, .. } => Some(value),
            RetryOutcome::Exhausted { .. } => None,
        }
    }
}
