//! Blocking Dequeue
//!
//! Poll-based wait on top of `Queue::dequeue`.
//!
//! The wrapper sleeps `Config::poll_interval` between attempts; there is no
//! cross-process wake-up. Latency is bounded by one poll interval and an
//! empty queue costs one exclusive lock per poll.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::queue::Queue;

impl Queue {
    /// Dequeue, waiting up to `timeout_secs` seconds for data
    ///
    /// A timeout of 0 waits forever. Returns `Ok(None)` once the timeout
    /// elapses with the queue still empty. Errors from `dequeue` end the wait
    /// immediately.
    pub fn bdequeue(&self, timeout_secs: u64) -> Result<Option<Vec<u8>>> {
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
        self.dequeue_timeout(timeout)
    }

    /// Dequeue, waiting up to `timeout` for data (`None` waits forever)
    ///
    /// `Some(Duration::ZERO)` makes a single attempt.
    pub fn dequeue_timeout(&self, timeout: Option<Duration>) -> Result<Option<Vec<u8>>> {
        let started = Instant::now();
        let interval = self.config().poll_interval;

        tracing::debug!(
            "Blocking dequeue on {} (timeout={:?}, poll_interval={:?})",
            self.path().display(),
            timeout,
            interval
        );

        loop {
            if let Some(payload) = self.dequeue()? {
                return Ok(Some(payload));
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    tracing::debug!("Blocking dequeue timed out after {:?}", started.elapsed());
                    return Ok(None);
                }
            }

            thread::sleep(interval);
        }
    }
}
