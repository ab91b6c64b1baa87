use std::time::{Duration, Instant};

use experience_common::FrameState;
use experience_notify::Notifier;

use crate::FrameHistory;

/// Delta reported before the first frame has been ticked.
pub const DEFAULT_FIRST_DELTA: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy)]
struct Running {
    start: Instant,
    current: Instant,
    index: u64,
}

/// Frame clock.
///
/// `start` arms the ticker; every host animation frame is then turned into a
/// [`FrameState`] by `tick`, which also fires `on_frame`. There is no
/// backpressure and no catch-up: a slow frame simply produces a larger delta.
#[derive(Debug)]
pub struct Ticker {
    running: Option<Running>,
    elapsed: Duration,
    delta: Duration,
    history: FrameHistory,
    on_frame: Notifier<FrameState>,
}

impl Ticker {
    pub fn new() -> Self {
        Self {
            running: None,
            elapsed: Duration::ZERO,
            delta: DEFAULT_FIRST_DELTA,
            history: FrameHistory::new(120),
            on_frame: Notifier::new("frame"),
        }
    }

    /// Arm the ticker. Restarting resets elapsed time and the frame index.
    pub fn start(&mut self, now: Instant) {
        self.running = Some(Running {
            start: now,
            current: now,
            index: 0,
        });
        self.elapsed = Duration::ZERO;
        self.delta = DEFAULT_FIRST_DELTA;
        self.history.reset();
        tracing::debug!("ticker started");
    }

    /// Halt frame delivery. Later `tick` calls return `None`.
    pub fn stop(&mut self) {
        if self.running.take().is_some() {
            tracing::debug!("ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Advance one frame and notify listeners.
    pub fn tick(&mut self, now: Instant) -> Option<FrameState> {
        let running = self.running.as_mut()?;
        let delta = now.saturating_duration_since(running.current);
        running.current = now;
        let frame = FrameState {
            start: running.start,
            current: now,
            elapsed: now.saturating_duration_since(running.start),
            delta,
            index: running.index,
        };
        running.index += 1;

        self.delta = frame.delta;
        self.elapsed = frame.elapsed;
        self.history.record(delta);
        self.on_frame.emit(&frame);
        Some(frame)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Number of frames ticked since the last `start`.
    pub fn frame_count(&self) -> u64 {
        self.running.map(|r| r.index).unwrap_or(0)
    }

    pub fn history(&self) -> &FrameHistory {
        &self.history
    }

    pub fn on_frame(&mut self) -> &mut Notifier<FrameState> {
        &mut self.on_frame
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn idle_ticker_produces_nothing() {
        let mut ticker = Ticker::new();
        assert!(ticker.tick(Instant::now()).is_none());
        assert_eq!(ticker.delta(), DEFAULT_FIRST_DELTA);
    }

    #[test]
    fn computes_delta_and_elapsed() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new();
        ticker.start(t0);

        let f1 = ticker.tick(t0 + Duration::from_millis(16)).unwrap();
        assert_eq!(f1.delta, Duration::from_millis(16));
        assert_eq!(f1.elapsed, Duration::from_millis(16));
        assert_eq!(f1.index, 0);

        let f2 = ticker.tick(t0 + Duration::from_millis(50)).unwrap();
        assert_eq!(f2.delta, Duration::from_millis(34));
        assert_eq!(f2.elapsed, Duration::from_millis(50));
        assert_eq!(f2.index, 1);
        assert_eq!(ticker.frame_count(), 2);
        assert_eq!(ticker.history().count(), 2);
    }

    #[test]
    fn notifies_every_frame_until_stopped() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut ticker = Ticker::new();
        let s = seen.clone();
        ticker.on_frame().subscribe(move |f| s.borrow_mut().push(f.index));

        let t0 = Instant::now();
        ticker.start(t0);
        for i in 1..=3 {
            ticker.tick(t0 + Duration::from_millis(16 * i));
        }
        ticker.stop();
        assert!(ticker.tick(t0 + Duration::from_secs(1)).is_none());
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn clock_going_backwards_saturates() {
        let t0 = Instant::now() + Duration::from_secs(1);
        let mut ticker = Ticker::new();
        ticker.start(t0);
        let frame = ticker.tick(t0 - Duration::from_millis(5)).unwrap();
        assert_eq!(frame.delta, Duration::ZERO);
    }
}
