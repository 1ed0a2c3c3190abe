//! Fixed-layout wire format for data packets and ACK datagrams.
//!
//! Layout of a data packet, 1200 bytes total, little-endian:
//!
//! ```text
//! offset 0..2   length  (u16)
//! offset 2..6   seqnum  (u32)
//! offset 6..1200 payload (1194 bytes, only the first `length` are meaningful)
//! ```
//!
//! An ACK datagram is just a little-endian `u32`.

use crate::err::Error;

pub const PAYLOAD_SIZE: usize = 1194;
pub const HEADER_SIZE: usize = 6;
pub const PACKET_SIZE: usize = HEADER_SIZE + PAYLOAD_SIZE;
pub const ACK_SIZE: usize = 4;

const LEN_OFFSET: usize = 0;
const SEQ_OFFSET: usize = 2;
const PAYLOAD_OFFSET: usize = HEADER_SIZE;

/// A single data packet, decoded from or about to be encoded onto the wire.
#[derive(Debug, Clone)]
pub struct Packet {
    pub seqnum: u32,
    pub length: u16,
    pub payload: [u8; PAYLOAD_SIZE],
}

impl Packet {
    pub fn new(seqnum: u32, bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() > PAYLOAD_SIZE {
            return Err(Error::TransportFatal(format!(
                "payload of {} bytes exceeds PAYLOAD_SIZE {}",
                bytes.len(),
                PAYLOAD_SIZE
            )));
        }

        let mut payload = [0u8; PAYLOAD_SIZE];
        payload[..bytes.len()].copy_from_slice(bytes);

        Ok(Packet {
            seqnum,
            length: bytes.len() as u16,
            payload,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.payload[..self.length as usize]
    }
}

pub fn encode_data(pkt: &Packet) -> [u8; PACKET_SIZE] {
    let mut buf = [0u8; PACKET_SIZE];
    buf[LEN_OFFSET..LEN_OFFSET + 2].copy_from_slice(&pkt.length.to_le_bytes());
    buf[SEQ_OFFSET..SEQ_OFFSET + 4].copy_from_slice(&pkt.seqnum.to_le_bytes());
    buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + PAYLOAD_SIZE].copy_from_slice(&pkt.payload);
    buf
}

pub fn decode_data(datagram: &[u8]) -> Result<Packet, Error> {
    if datagram.len() != PACKET_SIZE {
        return Err(Error::TransportFatal(format!(
            "data datagram has {} bytes, expected {}",
            datagram.len(),
            PACKET_SIZE
        )));
    }

    let length = u16::from_le_bytes([datagram[LEN_OFFSET], datagram[LEN_OFFSET + 1]]);
    let seqnum = u32::from_le_bytes([
        datagram[SEQ_OFFSET],
        datagram[SEQ_OFFSET + 1],
        datagram[SEQ_OFFSET + 2],
        datagram[SEQ_OFFSET + 3],
    ]);

    if length as usize > PAYLOAD_SIZE {
        return Err(Error::TransportFatal(format!(
            "declared length {} exceeds PAYLOAD_SIZE {}",
            length, PAYLOAD_SIZE
        )));
    }

    let mut payload = [0u8; PAYLOAD_SIZE];
    payload.copy_from_slice(&datagram[PAYLOAD_OFFSET..PAYLOAD_OFFSET + PAYLOAD_SIZE]);

    Ok(Packet {
        seqnum,
        length,
        payload,
    })
}

pub fn encode_ack(acknum: u32) -> [u8; ACK_SIZE] {
    acknum.to_le_bytes()
}

pub fn decode_ack(datagram: &[u8]) -> Result<u32, Error> {
    if datagram.len() != ACK_SIZE {
        return Err(Error::TransportFatal(format!(
            "ack datagram has {} bytes, expected {}",
            datagram.len(),
            ACK_SIZE
        )));
    }

    Ok(u32::from_le_bytes([
        datagram[0],
        datagram[1],
        datagram[2],
        datagram[3],
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_full_packet() {
        let payload = vec![0x42u8; PAYLOAD_SIZE];
        let pkt = Packet::new(7, &payload).unwrap();
        let encoded = encode_data(&pkt);
        assert_eq!(encoded.len(), PACKET_SIZE);

        let decoded = decode_data(&encoded).unwrap();
        assert_eq!(decoded.seqnum, 7);
        assert_eq!(decoded.length as usize, PAYLOAD_SIZE);
        assert_eq!(decoded.bytes(), payload.as_slice());
    }

    #[test]
    fn round_trips_a_short_packet() {
        let pkt = Packet::new(3, b"hi").unwrap();
        let encoded = encode_data(&pkt);
        let decoded = decode_data(&encoded).unwrap();
        assert_eq!(decoded.length, 2);
        assert_eq!(decoded.bytes(), b"hi");
    }

    #[test]
    fn rejects_oversized_payload() {
        let bytes = vec![0u8; PAYLOAD_SIZE + 1];
        assert!(Packet::new(1, &bytes).is_err());
    }

    #[test]
    fn rejects_wrong_size_datagram() {
        assert!(decode_data(&[0u8; 10]).is_err());
    }

    #[test]
    fn round_trips_ack() {
        let encoded = encode_ack(12345);
        assert_eq!(decode_ack(&encoded).unwrap(), 12345);
    }

    #[test]
    fn rejects_wrong_size_ack() {
        assert!(decode_ack(&[0u8; 3]).is_err());
    }
}
