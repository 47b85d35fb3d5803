//! Frame-synchronized redraw and debounced delivery.
//!
//! Everything runs on the UI thread; callers pass `now` explicitly so the
//! policies stay deterministic under test.

use std::time::{Duration, Instant};

/// Coalesces redraw requests into at most one per frame
#[derive(Debug)]
pub struct FrameScheduler {
    interval: Duration,
    pending: bool,
    last_frame: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: false,
            last_frame: None,
        }
    }

    /// Request a redraw on the next frame. Repeated requests merge.
    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// When the pending request may be consumed, if any
    pub fn deadline(&self) -> Option<Instant> {
        if !self.pending {
            return None;
        }
        // Never framed: due right away, `poll_timeout` saturates to zero
        Some(self.last_frame.map_or_else(Instant::now, |t| t + self.interval))
    }

    /// Consume the pending request if a frame boundary has been reached
    pub fn take(&mut self, now: Instant) -> bool {
        if !self.pending || self.last_frame.is_some_and(|t| now < t + self.interval) {
            return false;
        }
        self.pending = false;
        self.last_frame = Some(now);
        true
    }

    /// Drop a pending request without starting a frame
    pub fn cancel(&mut self) {
        self.pending = false;
    }
}

#[derive(Debug)]
struct Pending<T> {
    value: T,
    first: Instant,
    last: Instant,
}

/// Holds the most recent value of a burst and releases it once the burst
/// has been quiet for `quiet`, or once `max_wait` has elapsed since the
/// burst started.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    max_wait: Option<Duration>,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            max_wait: None,
            pending: None,
        }
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Replace the pending value and restart the quiet timer
    pub fn push(&mut self, value: T, now: Instant) {
        let first = self.pending.as_ref().map_or(now, |p| p.first);
        self.pending = Some(Pending {
            value,
            first,
            last: now,
        });
    }

    /// When the pending value becomes due, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| {
            let quiet = p.last + self.quiet;
            match self.max_wait {
                Some(max) => quiet.min(p.first + max),
                None => quiet,
            }
        })
    }

    /// Take the pending value if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Drop the pending value without delivering it
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Time until the earliest of the given deadlines, capped at `cap`
pub fn poll_timeout(now: Instant, cap: Duration, deadlines: &[Option<Instant>]) -> Duration {
    deadlines
        .iter()
        .flatten()
        .map(|d| d.saturating_duration_since(now))
        .fold(cap, Duration::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_frame_requests_merge() {
        let t0 = Instant::now();
        let mut frame = FrameScheduler::new(16 * MS);
        frame.request();
        frame.request();
        frame.request();
        assert!(frame.take(t0));
        assert!(!frame.take(t0));
        assert_eq!(frame.deadline(), None);
    }

    #[test]
    fn test_frame_is_paced() {
        let t0 = Instant::now();
        let mut frame = FrameScheduler::new(16 * MS);
        frame.request();
        assert!(frame.take(t0));

        // A request right after a frame waits for the next boundary
        frame.request();
        assert_eq!(frame.deadline(), Some(t0 + 16 * MS));
        assert!(!frame.take(t0 + 5 * MS));
        assert!(frame.is_pending());
        assert!(frame.take(t0 + 16 * MS));

        frame.request();
        frame.cancel();
        assert!(!frame.take(t0 + 100 * MS));
    }

    #[test]
    fn test_burst_delivers_last_value_once() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(40 * MS);
        d.push(1, t0);
        d.push(2, t0 + 10 * MS);
        d.push(3, t0 + 20 * MS);

        assert_eq!(d.poll(t0 + 50 * MS), None);
        assert_eq!(d.poll(t0 + 60 * MS), Some(3));
        assert_eq!(d.poll(t0 + 500 * MS), None);
    }

    #[test]
    fn test_push_resets_quiet_timer() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(300 * MS);
        d.push("a", t0);
        d.push("b", t0 + 250 * MS);
        assert_eq!(d.deadline(), Some(t0 + 550 * MS));
        assert_eq!(d.poll(t0 + 549 * MS), None);
        assert_eq!(d.poll(t0 + 550 * MS), Some("b"));
    }

    #[test]
    fn test_max_wait_bounds_starvation() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(40 * MS).with_max_wait(120 * MS);
        let mut delivered = Vec::new();
        // Continuous drag: one event every 16ms for 300ms
        for i in 0..=18u32 {
            let now = t0 + 16 * MS * i;
            d.push(i, now);
            if let Some(v) = d.poll(now) {
                delivered.push(v);
            }
        }
        assert!(!delivered.is_empty());
        assert!(delivered.len() <= 3, "{delivered:?}");
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(10 * MS);
        d.push((), t0);
        d.cancel();
        assert!(!d.is_pending());
        assert_eq!(d.poll(t0 + 20 * MS), None);
    }

    #[test]
    fn test_poll_timeout_picks_earliest() {
        let t0 = Instant::now();
        let timeout = poll_timeout(t0, 16 * MS, &[None, Some(t0 + 5 * MS), Some(t0 + 9 * MS)]);
        assert_eq!(timeout, 5 * MS);
        assert_eq!(poll_timeout(t0, 16 * MS, &[None]), 16 * MS);
        assert_eq!(poll_timeout(t0 + 20 * MS, 16 * MS, &[Some(t0)]), Duration::ZERO);
    }
}
