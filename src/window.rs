//! The sender's bounded ring of in-flight packets, indexed by sequence
//! number relative to the cumulative-ACK base.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::wire::Packet;

pub struct InFlight {
    pub packet: Packet,
    pub time_sent: Instant,
    pub timeout_deadline: Instant,
    pub resent: bool,
}

/// Ring of packets transmitted but not yet cumulatively acknowledged.
/// `base` is the smallest unacknowledged seqnum; `next_seq` is the seqnum
/// that will be assigned to the next packet read from the file.
pub struct SendWindow {
    base: u32,
    next_seq: u32,
    entries: VecDeque<InFlight>,
}

impl SendWindow {
    pub fn new(base: u32) -> Self {
        SendWindow {
            base,
            next_seq: base,
            entries: VecDeque::new(),
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    pub fn in_flight(&self) -> u32 {
        self.next_seq - self.base
    }

    /// Buffers a freshly transmitted packet. `packet.seqnum` must equal
    /// `next_seq`.
    pub fn store(&mut self, packet: Packet, now: Instant, rto: Duration) {
        debug_assert_eq!(packet.seqnum, self.next_seq);
        self.entries.push_back(InFlight {
            packet,
            time_sent: now,
            timeout_deadline: now + rto,
            resent: false,
        });
        self.next_seq += 1;
    }

    pub fn get(&self, seqnum: u32) -> Option<&InFlight> {
        if seqnum < self.base || seqnum >= self.next_seq {
            return None;
        }
        self.entries.get((seqnum - self.base) as usize)
    }

    pub fn mark_resent(&mut self, seqnum: u32, now: Instant, rto: Duration) {
        if let Some(idx) = seqnum.checked_sub(self.base) {
            if let Some(entry) = self.entries.get_mut(idx as usize) {
                entry.resent = true;
                entry.time_sent = now;
                entry.timeout_deadline = now + rto;
            }
        }
    }

    /// Advances `base` past `new_ack`, dropping every fully acknowledged
    /// entry. A no-op if `new_ack` is stale.
    pub fn slide(&mut self, new_ack: u32) {
        if new_ack < self.base {
            return;
        }
        let drop_count = (new_ack - self.base + 1).min(self.entries.len() as u32);
        for _ in 0..drop_count {
            self.entries.pop_front();
        }
        self.base = new_ack + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkt(seq: u32) -> Packet {
        Packet::new(seq, b"x").unwrap()
    }

    #[test]
    fn store_advances_next_seq_and_keeps_base() {
        let mut w = SendWindow::new(1);
        w.store(pkt(1), Instant::now(), Duration::from_millis(100));
        assert_eq!(w.base(), 1);
        assert_eq!(w.next_seq(), 2);
        assert_eq!(w.in_flight(), 1);
    }

    #[test]
    fn slide_drops_acked_entries_and_moves_base() {
        let mut w = SendWindow::new(1);
        for s in 1..=5 {
            w.store(pkt(s), Instant::now(), Duration::from_millis(100));
        }
        w.slide(3);
        assert_eq!(w.base(), 4);
        assert!(w.get(1).is_none());
        assert!(w.get(3).is_none());
        assert!(w.get(4).is_some());
        assert!(w.get(5).is_some());
    }

    #[test]
    fn slide_on_stale_ack_is_a_no_op() {
        let mut w = SendWindow::new(1);
        w.store(pkt(1), Instant::now(), Duration::from_millis(100));
        w.slide(3);
        let base_before = w.base();
        w.slide(0);
        assert_eq!(w.base(), base_before);
    }

    #[test]
    fn mark_resent_sets_the_flag() {
        let mut w = SendWindow::new(1);
        w.store(pkt(1), Instant::now(), Duration::from_millis(100));
        assert!(!w.get(1).unwrap().resent);
        w.mark_resent(1, Instant::now(), Duration::from_millis(50));
        assert!(w.get(1).unwrap().resent);
    }
}
