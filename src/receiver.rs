//! The receiver's reliability engine: accept the handshake, deliver bytes
//! strictly in order, and emit cumulative ACKs (including duplicate ACKs
//! for out-of-order arrivals, which is what drives the sender's fast
//! retransmit).

use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::err::Error;
use crate::transport::{RecvOutcome, Transport};
use crate::wire::{self, PACKET_SIZE};

/// How many further timed-out or duplicate-final-packet iterations the
/// receiver tolerates after delivering the last byte, before giving up and
/// exiting. The sender's own exit condition is ACK-driven, so there is no
/// way for the receiver to learn for certain that its last ACK arrived;
/// this bounds how long it waits around in case a retransmit shows up.
const FINAL_ACK_GRACE: u32 = 8;
const WATCHDOG_TIMEOUT: Duration = Duration::from_millis(50);

pub fn receive_file<W: Write, T: Transport>(
    mut sink: W,
    transport: &T,
    client_addr: SocketAddr,
) -> Result<(), Error> {
    let mut buf = [0u8; PACKET_SIZE];

    // Handshake: the first packet's seqnum is the total packet count N; its
    // payload is data packet 1's content.
    let total_packets = loop {
        match transport.recv_from(&mut buf)? {
            RecvOutcome::TimedOut => continue,
            RecvOutcome::Received { len, .. } => {
                if len != PACKET_SIZE {
                    warn!(len, "ignoring malformed handshake datagram");
                    continue;
                }
                match wire::decode_data(&buf[..len]) {
                    Ok(pkt) => break pkt.seqnum,
                    Err(e) => {
                        warn!(%e, "ignoring unparseable handshake datagram");
                        continue;
                    }
                }
            }
        }
    };

    let handshake = wire::decode_data(&buf).expect("validated above");
    let handshake_payload = handshake.bytes().to_vec();
    sink.write_all(handshake.bytes())?;
    info!(total_packets, "handshake accepted");
    transport.send_to(&wire::encode_ack(1), client_addr)?;

    if total_packets == 0 {
        info!("zero-byte file, transfer complete");
        return Ok(());
    }

    let mut expected_seq: u32 = 2;
    let mut out_of_order: HashMap<u32, Vec<u8>> = HashMap::new();
    let mut grace_remaining = FINAL_ACK_GRACE;

    transport.set_receive_timeout(WATCHDOG_TIMEOUT)?;

    while expected_seq <= total_packets || grace_remaining > 0 {
        match transport.recv_from(&mut buf)? {
            RecvOutcome::TimedOut => {
                if expected_seq > total_packets {
                    grace_remaining = grace_remaining.saturating_sub(1);
                }
                continue;
            }
            RecvOutcome::Received { len, .. } => {
                if len != PACKET_SIZE {
                    warn!(len, "ignoring malformed data datagram");
                    continue;
                }
                let pkt = match wire::decode_data(&buf[..len]) {
                    Ok(pkt) => pkt,
                    Err(e) => {
                        warn!(%e, "ignoring unparseable data datagram");
                        continue;
                    }
                };

                if expected_seq > total_packets {
                    // Already delivered everything; this must be a
                    // retransmit of the last packet because our final ACK
                    // was lost. Re-ACK and count down the grace period.
                    grace_remaining = grace_remaining.saturating_sub(1);
                    transport.send_to(&wire::encode_ack(total_packets), client_addr)?;
                    continue;
                }

                // The sender keeps resending the handshake datagram (seqnum
                // == total_packets, payload == chunk 1) until its ACK 1
                // arrives; one of those retries can land after we've already
                // moved into steady state. Its seqnum can collide with a
                // genuine data packet's (including the final one, when
                // `total_packets` is small), so the payload itself is the
                // only reliable witness that this is the handshake again
                // and not fresh data to deliver.
                if expected_seq > 1
                    && pkt.seqnum >= total_packets
                    && pkt.bytes() == handshake_payload.as_slice()
                {
                    debug!(seq = pkt.seqnum, "ignoring duplicate handshake retransmission");
                    transport.send_to(&wire::encode_ack(expected_seq - 1), client_addr)?;
                    continue;
                }

                let s = pkt.seqnum;
                if s == expected_seq {
                    debug!(seq = s, "delivering in-order packet");
                    sink.write_all(pkt.bytes())?;
                    expected_seq += 1;
                    while let Some(buffered) = out_of_order.remove(&expected_seq) {
                        sink.write_all(&buffered)?;
                        expected_seq += 1;
                    }
                } else if s > expected_seq {
                    debug!(seq = s, expected_seq, "buffering out-of-order packet");
                    out_of_order.entry(s).or_insert_with(|| pkt.bytes().to_vec());
                } else {
                    debug!(seq = s, expected_seq, "ignoring already-delivered packet");
                }

                transport.send_to(&wire::encode_ack(expected_seq - 1), client_addr)?;
            }
        }
    }

    info!("transfer complete");
    Ok(())
}
