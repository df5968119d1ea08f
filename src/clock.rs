use std::{
    sync::Arc,
    thread,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// A source of wall-clock time in milliseconds since the Unix epoch.
///
/// The generator only ever blocks through [`Clock::sleep`], so a simulated
/// clock can advance its own notion of time instead of parking the thread.
///
/// # Example
///
/// ```
/// use snowflake::Clock;
///
/// struct FixedTime;
/// impl Clock for FixedTime {
///     fn now_millis(&self) -> u64 {
///         1_700_000_000_000
///     }
/// }
///
/// assert_eq!(FixedTime.now_millis(), 1_700_000_000_000);
/// ```
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// The operating system's real-time clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        // A clock set before 1970 reads as 0 and is handled as a regression.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis().try_into().unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}
