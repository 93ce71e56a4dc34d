use std::time::{Duration, Instant};

/// Monotonic time source read by a [`Stopwatch`].
pub trait Ticker: Send + Sync {
    /// time elapsed since an arbitrary, fixed origin.
    fn read(&self) -> Duration;
}

/// Ticker backed by the process monotonic clock.
pub struct SystemTicker {
    origin: Instant,
}

impl SystemTicker {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker for SystemTicker {
    fn read(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Measures time between successive reads. Starts out stopped.
pub struct Stopwatch {
    ticker: Box<dyn Ticker>,
    started_at: Option<Duration>,
}

impl Stopwatch {
    pub fn unstarted(ticker: Box<dyn Ticker>) -> Self {
        Self {
            ticker,
            started_at: None,
        }
    }

    pub fn system() -> Self {
        Self::unstarted(Box::new(SystemTicker::new()))
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// `None` when the stopwatch was never started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at
            .map(|start| self.ticker.read().saturating_sub(start))
    }

    pub fn restart(&mut self) {
        self.started_at = Some(self.ticker.read());
    }
}


#[cfg(test)]
mod tests {
    use super::testing::SteppingTicker;
    use super::*;

    #[test]
    fn test_unstarted_has_no_elapsed() {
        let stopwatch = Stopwatch::unstarted(Box::new(SteppingTicker::new(Duration::from_secs(1))));
        assert!(!stopwatch.is_running());
        assert_eq!(stopwatch.elapsed(), None);
    }

    #[test]
    fn test_elapsed_between_reads() {
        let mut stopwatch =
            Stopwatch::unstarted(Box::new(SteppingTicker::new(Duration::from_millis(500))));
        stopwatch.restart();
        assert!(stopwatch.is_running());
        assert_eq!(stopwatch.elapsed(), Some(Duration::from_millis(500)));
        stopwatch.restart();
        assert_eq!(stopwatch.elapsed(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_system_ticker_is_monotonic() {
        let ticker = SystemTicker::new();
        let first = ticker.read();
        assert!(ticker.read() >= first);
    }
}
