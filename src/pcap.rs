//! PCAP file format
//!
//! See <https://wiki.wireshark.org/Development/LibpcapFileFormat> for details.
//!
//! A legacy capture is a 24-byte global header followed by records. The
//! [`LegacyPcapReader`] returns the header first, then one
//! [`LegacyPcapBlock`] per record. Byte order and timestamp precision are
//! given by the header magic.

mod frame;
mod header;
mod reader;

pub use frame::*;
pub use header::*;
pub use reader::*;

/// Microsecond timestamps, native byte order
pub const PCAP_MAGIC: u32 = 0xa1b2_c3d4;
/// Nanosecond timestamps, native byte order
pub const PCAP_NSEC_MAGIC: u32 = 0xa1b2_3c4d;
/// Alexey Kuznetzov's "modified" pcap: 24-byte record headers
pub const PCAP_MODIFIED_MAGIC: u32 = 0xa1b2_cd34;

/// Default snapshot length when no input states one (tcpdump's `MAXIMUM_SNAPLEN`)
pub const DEFAULT_SNAPLEN: u32 = 262_144;

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::Linktype;
    use hex_literal::hex;

    // ntp capture header: LE, microseconds, snaplen 262144, ethernet
    pub const PCAP_HDR: &[u8] = &hex!(
        "
D4 C3 B2 A1 02 00 04 00 00 00 00 00 00 00 00 00
00 00 04 00 01 00 00 00"
    );

    pub const PCAP_HDR_BE: &[u8] = &hex!(
        "
A1 B2 C3 D4 00 02 00 04 00 00 00 00 00 00 00 00
00 04 00 00 00 00 00 01"
    );

    // one 4-byte record, ts 1515933236.562913
    pub const FRAME_PCAP: &[u8] = &hex!(
        "
34 4E 5B 5A E1 96 08 00 04 00 00 00 4A 00 00 00
DE AD BE EF"
    );

    #[test]
    fn header_le() {
        let (rem, hdr) = parse_pcap_header(PCAP_HDR).expect("header parsing failed");
        assert!(rem.is_empty());
        assert_eq!(hdr.magic_number, PCAP_MAGIC);
        assert_eq!(hdr.snaplen, DEFAULT_SNAPLEN);
        assert_eq!(hdr.network, Linktype::ETHERNET);
        assert!(!hdr.is_bigendian());
        assert!(!hdr.is_nanosecond_precision());
    }

    #[test]
    fn header_be() {
        let (_, hdr) = parse_pcap_header(PCAP_HDR_BE).expect("header parsing failed");
        assert!(hdr.is_bigendian());
        assert_eq!(hdr.version_major, 2);
        assert_eq!(hdr.snaplen, DEFAULT_SNAPLEN);
        assert_eq!(hdr.network, Linktype::ETHERNET);
    }

    #[test]
    fn header_bad_magic() {
        let res = parse_pcap_header(&[0u8; 24]);
        assert!(matches!(
            res,
            Err(nom::Err::Error(crate::PcapError::HeaderNotRecognized))
        ));
    }

    #[test]
    fn frame_le() {
        let (rem, pkt) = parse_pcap_frame(FRAME_PCAP).expect("packet parsing failed");
        assert!(rem.is_empty());
        assert_eq!(pkt.ts_sec, 1_515_933_236);
        assert_eq!(pkt.ts_usec, 562_913);
        assert_eq!(pkt.caplen, 4);
        assert_eq!(pkt.origlen, 74);
        assert_eq!(pkt.data, &hex!("DE AD BE EF"));
    }

    #[test]
    fn frame_incomplete() {
        let res = parse_pcap_frame(&FRAME_PCAP[..18]);
        assert!(matches!(res, Err(nom::Err::Incomplete(_))));
    }
}
