use std::path::Path;
use std::thread;

use tracing::{error, warn};

use crate::remuneraciones::tools::config::RetryPolicy;
use crate::remuneraciones::tools::error::{Result, ToolError};

/// Runs `operation` until it succeeds, fails with something other than a
/// lock conflict, or the policy runs out of attempts. Each retry sleeps for
/// the fixed policy delay and logs a warning. An exhausted lock conflict is
/// surfaced as [`ToolError::Locked`].
pub fn with_lock_retry<T, F>(path: &Path, policy: RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_lock_conflict() => {
                if attempt >= attempts {
                    error!(
                        path = %path.display(),
                        attempts,
                        error = %err,
                        "file is still locked, giving up"
                    );
                    return Err(ToolError::Locked {
                        path: path.to_path_buf(),
                    });
                }
                warn!(
                    path = %path.display(),
                    attempt,
                    error = %err,
                    "file is locked, retrying"
                );
                thread::sleep(policy.delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::remuneraciones::tools::logging::capture_logs;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            delay: Duration::ZERO,
        }
    }

    fn locked() -> ToolError {
        ToolError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "sharing violation",
        ))
    }

    #[test]
    fn succeeds_on_third_attempt_after_two_lock_errors() {
        let mut calls = 0;
        let value = with_lock_retry(Path::new("book.xlsx"), fast_policy(), || {
            calls += 1;
            if calls < 3 { Err(locked()) } else { Ok(calls) }
        })
        .expect("third attempt succeeds");
        assert_eq!(value, 3);
    }

    #[test]
    fn each_retry_is_logged_as_a_warning() {
        let (logs, value) = capture_logs(|| {
            let mut calls = 0;
            with_lock_retry(Path::new("book.xlsx"), fast_policy(), || {
                calls += 1;
                if calls < 3 { Err(locked()) } else { Ok("table") }
            })
        });
        assert_eq!(value.expect("loaded"), "table");
        assert_eq!(logs.matches("file is locked, retrying").count(), 2);
        assert!(logs.contains("WARN"));
    }

    #[test]
    fn exhausted_retries_surface_lock_error() {
        let mut calls = 0;
        let result: Result<()> = with_lock_retry(Path::new("book.xlsx"), fast_policy(), || {
            calls += 1;
            Err(locked())
        });
        assert_eq!(calls, 3);
        assert!(matches!(result, Err(ToolError::Locked { .. })));
    }

    #[test]
    fn giving_up_logs_the_underlying_error() {
        let (logs, result) = capture_logs(|| {
            with_lock_retry::<(), _>(Path::new("book.xlsx"), fast_policy(), || Err(locked()))
        });
        assert!(matches!(result, Err(ToolError::Locked { .. })));
        assert!(logs.contains("file is still locked, giving up"));
        assert!(logs.contains("sharing violation"));
    }

    #[test]
    fn other_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<()> = with_lock_retry(Path::new("book.xlsx"), fast_policy(), || {
            calls += 1;
            Err(ToolError::MissingSheet("HORAS".into()))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ToolError::MissingSheet(_))));
    }
}
