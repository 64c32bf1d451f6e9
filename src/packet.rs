//! ICMP echo-request encoding and the Internet checksum (RFC 792 / RFC 1071)
//!
//! Replies are never decoded: the listener only records who answered, so this
//! module is write-only apart from [`verify_checksum`].

use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{IcmpCode, IcmpTypes};
use pnet::packet::Packet;

/// ICMP type for an echo request
pub const ICMP_ECHO_REQUEST: u8 = 8;
/// Length of the ICMP echo header in bytes
pub const ICMP_ECHO_HEADER_LEN: usize = 8;
/// Length of the fixed echo payload in bytes
pub const ECHO_PAYLOAD_LEN: usize = 192;
/// Byte the payload is filled with
pub const ECHO_PAYLOAD_BYTE: u8 = b'Q';
/// Sequence number carried by every request
pub const ECHO_SEQUENCE: u16 = 1;
/// Total length of an encoded echo request
pub const ECHO_PACKET_LEN: usize = ICMP_ECHO_HEADER_LEN + ECHO_PAYLOAD_LEN;

/// Compute the Internet checksum of `data`.
///
/// Bytes are summed as big-endian 16-bit words; a trailing odd byte is
/// treated as the high half of a final word. Carries are folded back into
/// the low 16 bits until none remain and the one's complement is returned.
/// The value is in network order once written with `u16::to_be_bytes`.
///
/// # Examples
///
/// ```
/// use autoping::packet::internet_checksum;
///
/// // Worked example from RFC 1071 section 3
/// let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
/// assert_eq!(internet_checksum(&data), 0x220d);
/// ```
pub fn internet_checksum(data: &[u8]) -> u16 {
    // u64 cannot overflow for any slice that fits in memory
    let mut sum: u64 = 0;
    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u64::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = words.remainder() {
        sum += u64::from(*last) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// Returns true if `packet` (checksum field included) sums to zero.
pub fn verify_checksum(packet: &[u8]) -> bool {
    internet_checksum(packet) == 0
}

/// Build an ICMP echo request with the given identifier.
///
/// Layout: type 8, code 0, checksum, identifier, sequence 1, followed by
/// [`ECHO_PAYLOAD_LEN`] bytes of [`ECHO_PAYLOAD_BYTE`]. All header fields are
/// written in network byte order. The checksum covers the header (with a zero
/// checksum field) and the payload.
pub fn build_echo_request(identifier: u16) -> Vec<u8> {
    let mut buf = vec![0u8; ECHO_PACKET_LEN];
    {
        // The buffer is always large enough for the fixed header
        let mut packet = MutableEchoRequestPacket::new(&mut buf)
            .expect("buffer holds a full echo request header");
        packet.set_icmp_type(IcmpTypes::EchoRequest);
        packet.set_icmp_code(IcmpCode(0));
        packet.set_checksum(0);
        packet.set_identifier(identifier);
        packet.set_sequence_number(ECHO_SEQUENCE);
        packet.set_payload(&[ECHO_PAYLOAD_BYTE; ECHO_PAYLOAD_LEN]);

        let checksum = internet_checksum(packet.packet());
        packet.set_checksum(checksum);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::packet::icmp::echo_request::EchoRequestPacket;

    #[test]
    fn test_checksum_rfc1071_reference() {
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(internet_checksum(&data), 0x220d);
    }

    #[test]
    fn test_checksum_odd_length() {
        // 0x0102 + 0x0300 = 0x0402
        assert_eq!(internet_checksum(&[0x01, 0x02, 0x03]), !0x0402);
    }

    #[test]
    fn test_checksum_folds_carries() {
        // 0xffff + 0xffff = 0x1fffe -> 0xffff -> complement 0
        assert_eq!(internet_checksum(&[0xff, 0xff, 0xff, 0xff]), 0);
        assert_eq!(internet_checksum(&[]), 0xffff);
    }

    /// One's-complement sum of `chunks`, each checksummed by pnet separately.
    /// pnet sums in 32 bits, so every chunk is kept well under 128 KiB.
    fn checksum_by_chunks(data: &[u8], chunk: usize) -> u16 {
        let mut sum: u32 = data
            .chunks(chunk)
            .map(|c| u32::from(!pnet::util::checksum(c, usize::MAX)))
            .sum();
        while sum >> 16 != 0 {
            sum = (sum & 0xffff) + (sum >> 16);
        }
        !(sum as u16)
    }

    #[test]
    fn test_checksum_large_input() {
        // Enough 0xffff words to overflow a 32-bit running sum
        let ones = vec![0xffu8; 140_000];
        assert_eq!(internet_checksum(&ones), 0);
        assert_eq!(internet_checksum(&ones), checksum_by_chunks(&ones, 60_000));

        let mixed: Vec<u8> = (0..200_001u32).map(|i| (i * 31 % 251) as u8).collect();
        assert_eq!(internet_checksum(&mixed), checksum_by_chunks(&mixed, 60_000));
    }

    #[test]
    fn test_checksum_matches_pnet() {
        let mut packet = build_echo_request(0xbeef);
        packet[2] = 0;
        packet[3] = 0;
        assert_eq!(
            internet_checksum(&packet),
            pnet::util::checksum(&packet, 1)
        );
    }

    #[test]
    fn test_echo_request_layout() {
        let bytes = build_echo_request(0x1234);
        assert_eq!(bytes.len(), ECHO_PACKET_LEN);
        assert_eq!(bytes[0], ICMP_ECHO_REQUEST);
        assert_eq!(bytes[1], 0);
        assert_eq!(&bytes[4..6], &[0x12, 0x34]);
        assert_eq!(&bytes[6..8], &[0x00, 0x01]);
        assert!(bytes[ICMP_ECHO_HEADER_LEN..]
            .iter()
            .all(|&b| b == ECHO_PAYLOAD_BYTE));

        let parsed = EchoRequestPacket::new(&bytes).unwrap();
        assert_eq!(parsed.get_icmp_type(), IcmpTypes::EchoRequest);
        assert_eq!(parsed.get_identifier(), 0x1234);
        assert_eq!(parsed.get_sequence_number(), ECHO_SEQUENCE);
    }

    #[test]
    fn test_echo_request_checksum_verifies() {
        for id in [0u16, 1, 0x00ff, 0xff00, 0xffff] {
            let bytes = build_echo_request(id);
            assert!(verify_checksum(&bytes), "checksum invalid for id {id}");
        }
    }

    #[test]
    fn test_identifier_is_not_deduplicated() {
        // The codec is stateless: the same identifier always yields the same bytes
        assert_eq!(build_echo_request(7), build_echo_request(7));
        assert_ne!(build_echo_request(7), build_echo_request(8));
    }

    #[test]
    fn test_corrupted_packet_fails_verification() {
        let mut bytes = build_echo_request(42);
        bytes[10] ^= 0x01;
        assert!(!verify_checksum(&bytes));
    }
}
