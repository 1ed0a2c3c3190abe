//! The sender's reliability engine: handshake, fill-the-window, process
//! ACKs, retransmit on timeout or duplicate ACK, terminate once every
//! packet has been cumulatively acknowledged.

use std::io::Read;
use std::net::SocketAddr;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::congestion::{self, Action, CongestionControl};
use crate::err::Error;
use crate::rtt::RttEstimator;
use crate::transport::{RecvOutcome, Transport};
use crate::wire::{self, Packet, PAYLOAD_SIZE};
use crate::window::SendWindow;

/// Reads whole file contents up front into fixed-size chunks. A real file
/// can be gigabytes; this protocol's own window (at most `MAX_WINDOW`
/// packets in flight) bounds how much of it needs to live in memory at
/// once, so chunks are produced lazily from the source as the window opens.
struct Chunks<R> {
    source: R,
    exhausted: bool,
}

impl<R: Read> Chunks<R> {
    fn new(source: R) -> Self {
        Chunks {
            source,
            exhausted: false,
        }
    }

    /// Reads the next chunk, or `None` once the source is exhausted. A
    /// short (including zero-length) final chunk is returned exactly once.
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, Error> {
        if self.exhausted {
            return Ok(None);
        }

        let mut buf = vec![0u8; PAYLOAD_SIZE];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.source.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        buf.truncate(filled);
        if filled < PAYLOAD_SIZE {
            self.exhausted = true;
        }
        Ok(Some(buf))
    }
}

pub fn send_file<R: Read, T: Transport>(
    source: R,
    transport: &T,
    peer: SocketAddr,
) -> Result<(), Error> {
    let mut chunks = Chunks::new(source);

    // The handshake packet carries the first real chunk; everything after
    // it is read on demand as the window opens.
    let first_chunk = chunks.next_chunk()?.unwrap_or_default();

    let mut all_chunks: Vec<Vec<u8>> = vec![first_chunk.clone()];
    while let Some(chunk) = chunks.next_chunk()? {
        all_chunks.push(chunk);
    }
    // An empty file still produces one (empty) chunk from `next_chunk`'s
    // first call; it must not also appear as a zero-length trailing
    // "packet" unless the file was genuinely empty.
    if all_chunks.len() > 1 && all_chunks.last().map_or(false, Vec::is_empty) {
        all_chunks.pop();
    }

    let total_packets = if first_chunk.is_empty() && all_chunks.len() == 1 {
        0
    } else {
        all_chunks.len() as u32
    };

    let mut rtt = RttEstimator::new();
    let mut cc = CongestionControl::new();

    transport.set_receive_timeout(rtt.rto())?;

    // Handshake: seqnum carries the total packet count, payload carries the
    // first chunk. Retried until the receiver ACKs exactly 1.
    let handshake = Packet::new(total_packets, &first_chunk)?;
    loop {
        info!(total_packets, "sending handshake");
        transport.send_to(&wire::encode_data(&handshake), peer)?;

        let mut buf = [0u8; wire::ACK_SIZE];
        match transport.recv_from(&mut buf)? {
            RecvOutcome::TimedOut => {
                warn!("handshake timed out, retrying");
                continue;
            }
            RecvOutcome::Received { len, .. } => {
                if len != wire::ACK_SIZE {
                    warn!(len, "ignoring malformed handshake ack");
                    continue;
                }
                match wire::decode_ack(&buf) {
                    Ok(1) => break,
                    Ok(other) => {
                        warn!(other, "unexpected handshake ack, retrying");
                    }
                    Err(_) => warn!("unparseable handshake ack, retrying"),
                }
            }
        }
    }

    if total_packets == 0 {
        info!("zero-byte file, handshake alone completed the transfer");
        return Ok(());
    }

    // Packet 1's bytes were already delivered as the handshake's payload and
    // already acknowledged by the ACK 1 we just received, so the window
    // starts at base = next_seq = 2. Chunk index `i` in `all_chunks` (index
    // 0 was the handshake payload) corresponds to seqnum `i + 1`.
    let mut window = SendWindow::new(2);

    while window.base() <= total_packets {
        let now = Instant::now();
        let remaining = total_packets
            .saturating_sub(window.next_seq())
            .saturating_add(1);
        let cwnd = cc.cwnd().min(remaining).min(congestion::MAX_WINDOW);

        while window.in_flight() < cwnd && window.next_seq() <= total_packets {
            let seq = window.next_seq();
            let chunk_idx = (seq - 1) as usize;
            let bytes = all_chunks.get(chunk_idx).cloned().unwrap_or_default();
            let pkt = Packet::new(seq, &bytes)?;
            debug!(seq, "sending data packet");
            transport.send_to(&wire::encode_data(&pkt), peer)?;
            window.store(pkt, now, rtt.rto());
        }

        transport.set_receive_timeout(rtt.rto())?;
        let mut buf = [0u8; wire::ACK_SIZE];
        match transport.recv_from(&mut buf)? {
            RecvOutcome::TimedOut => {
                let base = window.base();
                warn!(base, "retransmission timeout");
                if let Some(entry) = window.get(base) {
                    transport.send_to(&wire::encode_data(&entry.packet), peer)?;
                }
                window.mark_resent(base, Instant::now(), rtt.rto());
                cc.on_timeout(base);
            }
            RecvOutcome::Received { len, .. } => {
                if len != wire::ACK_SIZE {
                    warn!(len, "ignoring malformed ack");
                    continue;
                }
                let ack = match wire::decode_ack(&buf) {
                    Ok(a) => a,
                    Err(_) => {
                        warn!("ignoring unparseable ack");
                        continue;
                    }
                };

                // `base` is the smallest *unacknowledged* seqnum, so the
                // cumulative ack value that changes nothing is `base - 1`;
                // an ack of `base` (or higher) is fresh progress.
                let base = window.base();
                let last_acked = base - 1;
                if ack < last_acked || ack + 1 > window.next_seq() {
                    continue;
                } else if ack == last_acked {
                    if let Action::FastRetransmit = cc.on_duplicate_ack(base) {
                        warn!(base, "fast retransmit");
                        if let Some(entry) = window.get(base) {
                            transport.send_to(&wire::encode_data(&entry.packet), peer)?;
                        }
                        window.mark_resent(base, Instant::now(), rtt.rto());
                    }
                } else {
                    if let Some(entry) = window.get(ack) {
                        if !entry.resent {
                            rtt.sample(Instant::now() - entry.time_sent);
                        }
                    }
                    window.slide(ack);
                    cc.on_new_ack(ack);
                }
            }
        }
    }

    info!("transfer complete");
    Ok(())
}
