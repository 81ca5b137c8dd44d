use super::StorageError;
use std::time::Duration;

/// Fixed-delay retry for storage reads
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// `NotFound` and `InvalidId` are permanent and returned immediately.
    /// Blocks the calling thread between attempts.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Result<T, StorageError>,
    {
        let attempts = self.attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(e @ (StorageError::NotFound(_) | StorageError::InvalidId(_))) => return Err(e),
                Err(e) => {
                    tracing::error!("{} failed (attempt {}/{}): {}", what, attempt, attempts, e);
                    last_error = e.to_string();
                    if attempt < attempts {
                        std::thread::sleep(self.delay);
                    }
                }
            }
        }

        Err(StorageError::Exhausted {
            attempts,
            last_error,
        })
    }
}
