//! Request pacing
//!
//! Every probe is followed by a randomized pause so the origin service sees
//! a bounded, irregular request rate. There is no parallelism to schedule:
//! the collector issues one request at a time.

use rand::Rng;
use std::time::Duration;

/// Randomized inter-request delay
#[derive(Debug, Clone)]
pub struct Throttle {
    min_delay: Duration,
    max_delay: Duration,
    pauses: u64,
}

impl Throttle {
    /// Creates a throttle sleeping between `min_ms` and `max_ms` (inclusive)
    ///
    /// A reversed range is normalized rather than rejected.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        let (low, high) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Self {
            min_delay: Duration::from_millis(low),
            max_delay: Duration::from_millis(high),
            pauses: 0,
        }
    }

    /// Picks the next delay uniformly from the configured interval
    pub fn next_delay(&self) -> Duration {
        let low = self.min_delay.as_millis() as u64;
        let high = self.max_delay.as_millis() as u64;
        if low == high {
            return self.min_delay;
        }
        Duration::from_millis(rand::thread_rng().gen_range(low..=high))
    }

    /// Sleeps for one randomized delay
    pub async fn pause(&mut self) {
        let delay = self.next_delay();
        self.pauses += 1;
        tracing::trace!("Pausing {:?} before next request", delay);
        tokio::time::sleep(delay).await;
    }

    /// Number of pauses taken so far
    pub fn pauses(&self) -> u64 {
        self.pauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_bounds() {
        let throttle = Throttle::new(100, 250);
        for _ in 0..200 {
            let delay = throttle.next_delay();
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(250));
        }
    }

    #[test]
    fn test_fixed_delay() {
        let throttle = Throttle::new(40, 40);
        assert_eq!(throttle.next_delay(), Duration::from_millis(40));
    }

    #[test]
    fn test_reversed_range_is_normalized() {
        let throttle = Throttle::new(300, 100);
        let delay = throttle.next_delay();
        assert!(delay >= Duration::from_millis(100) && delay <= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_pause_counts() {
        let mut throttle = Throttle::new(0, 0);
        throttle.pause().await;
        throttle.pause().await;
        assert_eq!(throttle.pauses(), 2);
    }
}
