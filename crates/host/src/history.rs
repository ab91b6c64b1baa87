use std::time::Duration;

/// Ring buffer of recent frame deltas for instrumentation.
#[derive(Debug, Clone)]
pub struct FrameHistory {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl FrameHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    pub fn average(&self) -> Duration {
        let samples = self.samples();
        if samples.is_empty() {
            return Duration::ZERO;
        }
        samples.iter().sum::<Duration>() / samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.samples().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    /// Frames per second derived from the average delta; 0 without samples.
    pub fn fps(&self) -> f32 {
        let avg = self.average().as_secs_f32();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    pub fn count(&self) -> usize {
        self.samples().len()
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.filled = false;
    }

    fn samples(&self) -> &[Duration] {
        let count = if self.filled { self.capacity } else { self.index };
        &self.history[..count]
    }
}
