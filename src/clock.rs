use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source for the frame loop and UI timers.
pub trait Clock {
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// A single pending deadline. Arming replaces whatever was pending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Duration>,
}

impl Timer {
    pub fn arm(&mut self, now: Duration, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true once when the deadline has passed, then disarms.
    pub fn fire(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_once_after_deadline() {
        let clock = ManualClock::default();
        let mut timer = Timer::default();
        timer.arm(clock.now(), Duration::from_millis(100));

        clock.advance(Duration::from_millis(99));
        assert!(!timer.fire(clock.now()));
        clock.advance(Duration::from_millis(1));
        assert!(timer.fire(clock.now()));
        assert!(!timer.fire(clock.now()));
    }

    #[test]
    fn rearming_replaces_the_pending_deadline() {
        let clock = ManualClock::default();
        let mut timer = Timer::default();
        timer.arm(clock.now(), Duration::from_millis(50));
        clock.advance(Duration::from_millis(40));
        timer.arm(clock.now(), Duration::from_millis(50));

        clock.advance(Duration::from_millis(20));
        assert!(!timer.fire(clock.now()));
        clock.advance(Duration::from_millis(30));
        assert!(timer.fire(clock.now()));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timer = Timer::default();
        timer.arm(Duration::ZERO, Duration::from_millis(1));
        timer.cancel();
        assert!(!timer.is_armed());
        assert!(!timer.fire(Duration::from_secs(10)));
    }
}
