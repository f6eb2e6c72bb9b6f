use crate::CoreError;
use std::time::Duration;
use steward_schema::RetrySettings;
use tracing::debug;

/// Bounded exponential backoff for optimistic-concurrency conflicts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub steps: u32,
    pub initial_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        Self {
            steps: s.steps,
            initial_delay: Duration::from_millis(s.initial_delay_ms),
            factor: s.factor,
            max_delay: Duration::from_millis(s.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// `steps` attempts with no sleeping in between.
    pub const fn immediate(steps: u32) -> Self {
        Self {
            steps,
            initial_delay: Duration::ZERO,
            factor: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before attempt `attempt + 1`, with `attempt` starting at 1.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.factor.powi(exponent);
        let cap = self.max_delay.as_secs_f64();
        if !secs.is_finite() || secs >= cap {
            self.max_delay
        } else if secs <= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

/// Run `op` until it succeeds, fails with a non-conflict error, or the policy's
/// attempt budget runs out.
///
/// `op` receives the 1-based attempt number and must re-read whatever it is
/// about to modify on every call.
pub fn retry_on_conflict<T>(
    policy: &RetryPolicy,
    mut op: impl FnMut(u32) -> Result<T, CoreError>,
) -> Result<T, CoreError> {
    let steps = policy.steps.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if e.is_conflict() => {
                if attempt >= steps {
                    return Err(CoreError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                let delay = policy.delay_after(attempt);
                debug!("conflict on attempt {attempt}/{steps}, retrying in {delay:?}: {e}");
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
            }
            Err(e) => return Err(e),
        }
    }
}
