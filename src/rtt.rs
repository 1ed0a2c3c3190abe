//! Smoothed round-trip-time estimator and retransmission-timeout
//! computation, following the Jacobson/Karels algorithm.

use std::time::Duration;

const ALPHA: f64 = 0.125;
const BETA: f64 = 0.25;

const INITIAL_EST_RTT: Duration = Duration::from_millis(160);
const INITIAL_DEV_RTT: Duration = Duration::from_millis(10);

const RTO_MIN: Duration = Duration::from_millis(10);
const RTO_MAX: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct RttEstimator {
    est_rtt: Duration,
    dev_rtt: Duration,
}

impl RttEstimator {
    pub fn new() -> Self {
        RttEstimator {
            est_rtt: INITIAL_EST_RTT,
            dev_rtt: INITIAL_DEV_RTT,
        }
    }

    /// Fold in a fresh RTT sample. The caller is responsible for Karn's rule:
    /// never call this with a sample taken from a retransmitted packet.
    pub fn sample(&mut self, rtt: Duration) {
        let est = self.est_rtt.as_secs_f64();
        let dev = self.dev_rtt.as_secs_f64();
        let s = rtt.as_secs_f64();

        let new_dev = (1.0 - BETA) * dev + BETA * (est - s).abs();
        let new_est = (1.0 - ALPHA) * est + ALPHA * s;

        self.dev_rtt = Duration::from_secs_f64(new_dev.max(0.0));
        self.est_rtt = Duration::from_secs_f64(new_est.max(0.0));
    }

    pub fn rto(&self) -> Duration {
        let rto = self.est_rtt + 4 * self.dev_rtt;
        rto.clamp(RTO_MIN, RTO_MAX)
    }
}

impl Default for RttEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_rto_matches_documented_defaults() {
        let est = RttEstimator::new();
        assert_eq!(est.rto(), INITIAL_EST_RTT + 4 * INITIAL_DEV_RTT);
    }

    #[test]
    fn rto_stays_within_bounds_after_many_samples() {
        let mut est = RttEstimator::new();
        for _ in 0..50 {
            est.sample(Duration::from_millis(5));
        }
        assert!(est.rto() >= RTO_MIN);
        assert!(est.rto() <= RTO_MAX);
    }

    #[test]
    fn a_large_sample_raises_rto() {
        let mut est = RttEstimator::new();
        let before = est.rto();
        est.sample(Duration::from_millis(900));
        assert!(est.rto() > before);
    }
}
