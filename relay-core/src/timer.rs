//! Periodic timers on a wrapping millisecond clock.
//!
//! The tick source is a `u32` millisecond counter that wraps to zero roughly
//! every 49.7 days. Deadlines are computed with wrapping addition, and the
//! due-check splits the tick space in two halves so a deadline that wrapped
//! past zero is not mistaken for one that is already behind us.

/// Half of the tick space; ticks at or above this are in the "high half".
const HALF_RANGE: u32 = 1 << 31;

/// A wrapping millisecond tick source.
pub trait Clock {
    /// Current tick value. Increases monotonically and wraps after `u32::MAX`.
    fn now_ms(&self) -> u32;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// A timer that becomes due once every `interval` ticks.
///
/// Owned by the loop that polls it; [`is_due`](Self::is_due) is the only
/// operation that mutates it.
///
/// # Example
///
/// ```
/// use relay_core::PeriodicTimer;
///
/// let mut timer = PeriodicTimer::new(1000);
/// assert!(timer.is_due(5)); // always due on the first check
/// assert!(!timer.is_due(500));
/// assert!(timer.is_due(1005));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeriodicTimer {
    next_deadline: u32,
    interval: u32,
    force_first_fire: bool,
}

impl PeriodicTimer {
    /// Create a timer that fires on its first check and every `interval` ms after.
    #[must_use]
    pub const fn new(interval: u32) -> Self {
        Self {
            next_deadline: 0,
            interval,
            force_first_fire: true,
        }
    }

    /// The timer's period in ticks.
    #[inline]
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Tick value of the next deadline.
    ///
    /// Meaningless until the first check has armed the timer.
    #[inline]
    #[must_use]
    pub const fn next_deadline(&self) -> u32 {
        self.next_deadline
    }

    /// Check whether the timer is due at tick `now`, rearming it if so.
    ///
    /// A deadline in the low half of the tick space is never due while `now`
    /// is in the high half. That is the situation right after a deadline
    /// wrapped past `u32::MAX`; the timer waits for the clock to wrap too.
    pub fn is_due(&mut self, now: u32) -> bool {
        if self.force_first_fire {
            self.force_first_fire = false;
            self.next_deadline = now.wrapping_add(self.interval);
            return true;
        }

        if self.next_deadline < HALF_RANGE && now >= HALF_RANGE {
            return false;
        }
        if now < self.next_deadline {
            return false;
        }

        self.next_deadline = now.wrapping_add(self.interval);
        true
    }
}
