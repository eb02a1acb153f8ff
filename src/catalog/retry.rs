//! Bounded retry combinator for outbound catalog requests.

use std::thread;
use std::time::Duration;

use tracing::debug;

/// Something that carries an HTTP status code.
///
/// Implemented for blocking `reqwest` responses so [`RetryPolicy::run`] can
/// judge success without knowing the transport.
pub trait StatusCode {
    fn status_code(&self) -> u16;
}

impl StatusCode for reqwest::blocking::Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

/// Why a retried operation gave up.
#[derive(Debug)]
pub enum Exhausted<E> {
    /// Every attempt completed but none had a successful status.
    Status { status: u16, attempts: usize },
    /// The final attempt failed before producing a status.
    Error { error: E, attempts: usize },
}

fn is_ok_status(status: u16) -> bool {
    status == 200
}

/// Retry policy: attempt count, fixed delay and success predicate.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mangenre::catalog::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(0));
/// assert!(policy.is_success(200));
/// assert!(!policy.is_success(500));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: usize,
    delay: Duration,
    success: fn(u16) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Creates a policy that treats HTTP 200 as the only success.
    ///
    /// An attempt count of zero is raised to one.
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            success: is_ok_status,
        }
    }

    /// Replaces the success predicate.
    pub fn with_success(mut self, success: fn(u16) -> bool) -> Self {
        self.success = success;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_success(&self, status: u16) -> bool {
        (self.success)(status)
    }

    /// Runs `op` until it yields a successful status or attempts run out.
    ///
    /// The delay is slept between attempts, never after the last one.
    pub fn run<T, E, F>(&self, mut op: F) -> Result<T, Exhausted<E>>
    where
        T: StatusCode,
        F: FnMut() -> Result<T, E>,
    {
        let mut attempt = 1;
        loop {
            let outcome = op();
            let last = attempt == self.max_attempts;
            match outcome {
                Ok(value) if self.is_success(value.status_code()) => return Ok(value),
                Ok(value) => {
                    let status = value.status_code();
                    if last {
                        return Err(Exhausted::Status {
                            status,
                            attempts: attempt,
                        });
                    }
                    debug!(attempt, status, "retrying after unsuccessful status");
                }
                Err(error) => {
                    if last {
                        return Err(Exhausted::Error {
                            error,
                            attempts: attempt,
                        });
                    }
                    debug!(attempt, "retrying after transport error");
                }
            }
            thread::sleep(self.delay);
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Instant;

    struct Fake(u16);

    impl StatusCode for Fake {
        fn status_code(&self) -> u16 {
            self.0
        }
    }

    fn instant() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(0))
    }

    #[test]
    fn default_policy_is_three_attempts_one_second_apart() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(), Duration::from_secs(1));
    }

    #[test]
    fn three_server_errors_exhaust_the_policy() {
        let calls = Cell::new(0);
        let result: Result<Fake, Exhausted<()>> = instant().run(|| {
            calls.set(calls.get() + 1);
            Ok(Fake(500))
        });

        assert_eq!(calls.get(), 3);
        match result {
            Err(Exhausted::Status { status, attempts }) => {
                assert_eq!(status, 500);
                assert_eq!(attempts, 3);
            }
            _ => panic!("expected exhausted status"),
        }
    }

    #[test]
    fn success_on_second_attempt_stops_retrying() {
        let calls = Cell::new(0);
        let result: Result<Fake, Exhausted<()>> = instant().run(|| {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Ok(Fake(500))
            } else {
                Ok(Fake(200))
            }
        });

        assert_eq!(result.unwrap().0, 200);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn transport_error_on_last_attempt_is_reported() {
        let result: Result<Fake, Exhausted<&str>> = instant().run(|| Err("connection refused"));
        match result {
            Err(Exhausted::Error { error, attempts }) => {
                assert_eq!(error, "connection refused");
                assert_eq!(attempts, 3);
            }
            _ => panic!("expected exhausted error"),
        }
    }

    #[test]
    fn custom_success_predicate_is_honoured() {
        let policy = instant().with_success(|status| status == 204);
        let result: Result<Fake, Exhausted<()>> = policy.run(|| Ok(Fake(204)));
        assert!(result.is_ok());
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(0, Duration::from_millis(0));
        let _: Result<Fake, Exhausted<()>> = policy.run(|| {
            calls.set(calls.get() + 1);
            Ok(Fake(503))
        });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn delay_is_slept_between_attempts_only() {
        let policy = RetryPolicy::new(3, Duration::from_millis(50));
        let start = Instant::now();
        let _: Result<Fake, Exhausted<()>> = policy.run(|| Ok(Fake(500)));
        let elapsed = start.elapsed();
        // Two sleeps for three attempts
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(1000));
    }
}
