use std::collections::VecDeque;
use std::time::Duration;

pub const FPS_WINDOW_LEN: usize = 200;

/// Rolling average over the most recent per-frame rates.
#[derive(Debug, Clone)]
pub struct FpsWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl Default for FpsWindow {
    fn default() -> Self {
        Self::new(FPS_WINDOW_LEN)
    }
}

impl FpsWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, fps: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(fps);
    }

    /// Records one frame's wall-clock duration. Zero durations carry no rate.
    pub fn record(&mut self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.push(1.0 / secs);
        }
    }

    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mean_is_zero() {
        let window = FpsWindow::default();
        assert_eq!(window.mean(), 0.0);
        assert!(window.is_empty());
    }

    #[test]
    fn test_mean_uses_only_latest_samples() {
        let mut window = FpsWindow::default();
        // 50 outliers followed by 200 samples of 10.0
        for _ in 0..50 {
            window.push(1000.0);
        }
        for _ in 0..FPS_WINDOW_LEN {
            window.push(10.0);
        }
        assert_eq!(window.len(), FPS_WINDOW_LEN);
        assert!((window.mean() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_over_sliding_sequence() {
        let mut window = FpsWindow::default();
        for i in 1..=450u32 {
            window.push(i as f64);
            let n = window.len() as f64;
            let lo = (i as f64 - n) + 1.0;
            let expected = (lo + i as f64) / 2.0;
            assert!((window.mean() - expected).abs() < 1e-9);
            assert!(window.len() <= FPS_WINDOW_LEN);
        }
    }

    #[test]
    fn test_record_converts_durations() {
        let mut window = FpsWindow::new(4);
        window.record(Duration::from_millis(100));
        window.record(Duration::ZERO);
        assert_eq!(window.len(), 1);
        assert!((window.mean() - 10.0).abs() < 1e-9);
    }
}
