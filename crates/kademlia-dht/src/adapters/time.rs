//! Wall-clock time for `last_seen` stamps.

use std::time::SystemTime;

use tracing::warn;

use crate::domain::Timestamp;
use crate::ports::TimeSource;

/// Seconds since the Unix epoch, read from the host clock.
///
/// A clock set before 1970 reads as zero, which makes every contact look
/// equally stale rather than failing the insert.
///
/// ```rust
/// use kademlia_dht::{SystemTimeSource, TimeSource};
///
/// assert!(SystemTimeSource::new().now().as_secs() > 0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    /// Create a new system time source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        match SystemTime::UNIX_EPOCH.elapsed() {
            Ok(elapsed) => Timestamp::new(elapsed.as_secs()),
            Err(e) => {
                warn!(error = %e, "System clock is before the Unix epoch");
                Timestamp::new(0)
            }
        }
    }
}
