//! Congestion window state machine: additive increase per round-trip,
//! multiplicative decrease on fast retransmit, and a slow-start-style reset
//! to `INITIAL_WINDOW` on a full retransmission timeout.
//!
//! No `ssthresh` is modeled — see the open-question note in DESIGN.md. This
//! mirrors the reference implementation's own simplification rather than a
//! full slow-start/congestion-avoidance split.

pub const INITIAL_WINDOW: u32 = 1;
pub const MAX_WINDOW: u32 = 64;

const FAST_RETRANSMIT_DUP_ACKS: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct CongestionControl {
    cwnd: u32,
    dup_ack_count: u32,
    last_cwnd_change_ack: u32,
}

/// What the sender loop should do in response to a congestion-control event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    FastRetransmit,
}

impl CongestionControl {
    pub fn new() -> Self {
        CongestionControl {
            cwnd: INITIAL_WINDOW,
            dup_ack_count: 0,
            last_cwnd_change_ack: 0,
        }
    }

    pub fn cwnd(&self) -> u32 {
        self.cwnd
    }

    /// A new cumulative ACK advanced `base`. Additive increase is gated on
    /// having moved at least a full window's worth of ACKs since the last
    /// bump, so `cwnd` grows roughly once per round-trip.
    pub fn on_new_ack(&mut self, new_ack: u32) {
        self.dup_ack_count = 0;
        if new_ack.wrapping_sub(self.last_cwnd_change_ack) >= self.cwnd {
            self.cwnd = (self.cwnd + 1).min(MAX_WINDOW);
            self.last_cwnd_change_ack = new_ack;
        }
    }

    /// The same ACK as last time arrived again. Returns the action the
    /// sender loop should take.
    pub fn on_duplicate_ack(&mut self, base: u32) -> Action {
        self.dup_ack_count += 1;

        if self.dup_ack_count == FAST_RETRANSMIT_DUP_ACKS {
            self.cwnd = (self.cwnd / 2).max(1);
            self.last_cwnd_change_ack = base;
            Action::FastRetransmit
        } else if self.dup_ack_count > FAST_RETRANSMIT_DUP_ACKS {
            // Fast recovery: each further duplicate means another segment
            // left the network, so we can afford to have one more in flight.
            self.cwnd = (self.cwnd + 1).min(MAX_WINDOW);
            Action::None
        } else {
            Action::None
        }
    }

    pub fn on_timeout(&mut self, base: u32) {
        self.cwnd = INITIAL_WINDOW;
        self.dup_ack_count = 0;
        self.last_cwnd_change_ack = base;
    }
}

impl Default for CongestionControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_initial_window() {
        assert_eq!(CongestionControl::new().cwnd(), INITIAL_WINDOW);
    }

    #[test]
    fn third_duplicate_ack_halves_cwnd_and_fires_fast_retransmit() {
        let mut cc = CongestionControl::new();
        for _ in 0..4 {
            cc.on_new_ack(1);
        }
        let before = cc.cwnd();
        assert_eq!(cc.on_duplicate_ack(1), Action::None);
        assert_eq!(cc.on_duplicate_ack(1), Action::None);
        assert_eq!(cc.on_duplicate_ack(1), Action::FastRetransmit);
        assert_eq!(cc.cwnd(), (before / 2).max(1));
    }

    #[test]
    fn fast_recovery_inflates_cwnd_past_the_third_duplicate() {
        let mut cc = CongestionControl::new();
        for _ in 0..8 {
            cc.on_new_ack(1);
        }
        cc.on_duplicate_ack(1);
        cc.on_duplicate_ack(1);
        let after_retransmit = {
            cc.on_duplicate_ack(1);
            cc.cwnd()
        };
        cc.on_duplicate_ack(1);
        assert!(cc.cwnd() > after_retransmit);
    }

    #[test]
    fn timeout_resets_to_initial_window() {
        let mut cc = CongestionControl::new();
        for ack in 1..20 {
            cc.on_new_ack(ack);
        }
        assert!(cc.cwnd() > INITIAL_WINDOW);
        cc.on_timeout(5);
        assert_eq!(cc.cwnd(), INITIAL_WINDOW);
    }

    #[test]
    fn cwnd_never_exceeds_max_window() {
        let mut cc = CongestionControl::new();
        for ack in 1..10_000 {
            cc.on_new_ack(ack);
        }
        assert!(cc.cwnd() <= MAX_WINDOW);
    }
}
