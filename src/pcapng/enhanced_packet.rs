use nom::bytes::streaming::take;
use nom::error::{ErrorKind, ParseError};
use nom::{Err, IResult};
use rusticata_macros::align32;

use crate::endianness::{PcapBE, PcapEndianness, PcapLE};
use crate::traits::PcapNGPacketBlock;
use crate::utils::array_ref4;
use crate::PcapError;

use super::*;

/// An Enhanced Packet Block (EPB) is the standard container for storing
/// the packets coming from the network.
///
/// This struct is a thin abstraction layer, and stores the raw block data.
/// For ex the `data` field is stored with the padding.
/// It implements the `PcapNGPacketBlock` trait, which provides helper functions.
///
/// ## Examples
///
/// ```rust
/// use pcap_merge::pcapng::parse_enhancedpacketblock_le;
/// use pcap_merge::traits::PcapNGPacketBlock;
///
/// # let pcap_data: &[u8] = &[
/// #     6, 0, 0, 0, 0x24, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0,
/// #     2, 0, 0, 0, 4, 0, 0, 0, 0xde, 0xad, 0, 0, 0x24, 0, 0, 0];
/// let (i, epb) = parse_enhancedpacketblock_le(pcap_data).unwrap();
/// let packet_data = epb.packet_data();
/// if packet_data.len() < epb.orig_len() as usize {
///     // packet was truncated
/// } else {
///     // we have a full packet
/// }
/// ```
#[derive(Debug)]
pub struct EnhancedPacketBlock<'a> {
    // Block type, read as little-endian.
    // If block value is the reverse the the expected magic, this means block is encoded as big-endian
    pub block_type: u32,
    pub block_len1: u32,
    pub if_id: u32,
    pub ts_high: u32,
    pub ts_low: u32,
    /// Captured packet length
    pub caplen: u32,
    /// Original packet length
    pub origlen: u32,
    /// Raw data from packet (with padding)
    pub data: &'a [u8],
    pub options: Vec<PcapNGOption<'a>>,
    pub block_len2: u32,
}

impl<'a> EnhancedPacketBlock<'a> {
    /// Decode the packet timestamp
    ///
    /// To decode the timestamp, the raw values if_tsresol and if_tsoffset are required.
    /// These values are stored as options in the [`InterfaceDescriptionBlock`]
    /// matching the interface ID.
    ///
    /// Return the timestamp seconds and fractional part (in resolution units)
    #[inline]
    pub fn decode_ts(&self, ts_offset: i64, resolution: u64) -> (i64, u64) {
        build_ts(self.ts_high, self.ts_low, ts_offset, resolution)
    }

    /// The 64-bit timestamp value, in units of the interface resolution
    #[inline]
    pub fn ts_units(&self) -> u64 {
        (u64::from(self.ts_high) << 32) | u64::from(self.ts_low)
    }
}

impl<'a> PcapNGPacketBlock for EnhancedPacketBlock<'a> {
    fn big_endian(&self) -> bool {
        self.block_type != EPB_MAGIC
    }
    fn truncated(&self) -> bool {
        self.origlen != self.caplen
    }
    fn orig_len(&self) -> u32 {
        self.origlen
    }
    fn raw_packet_data(&self) -> &[u8] {
        self.data
    }
    fn packet_data(&self) -> &[u8] {
        let caplen = self.caplen as usize;
        if caplen < self.data.len() {
            &self.data[..caplen]
        } else {
            self.data
        }
    }
}

impl<'a, En: PcapEndianness> PcapNGBlockParser<'a, En, EnhancedPacketBlock<'a>>
    for EnhancedPacketBlock<'a>
{
    const HDR_SZ: usize = 32;
    const MAGIC: u32 = EPB_MAGIC;

    fn inner_parse<E: ParseError<&'a [u8]>>(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], EnhancedPacketBlock<'a>, E> {
        // caller function already tested header type(magic) and length
        // read end of header
        let (b_hdr, packet_data) = i.split_at(20);
        let if_id = En::u32_from_bytes(array_ref4(b_hdr, 0));
        let ts_high = En::u32_from_bytes(array_ref4(b_hdr, 4));
        let ts_low = En::u32_from_bytes(array_ref4(b_hdr, 8));
        let caplen = En::u32_from_bytes(array_ref4(b_hdr, 12));
        let origlen = En::u32_from_bytes(array_ref4(b_hdr, 16));
        // read packet data
        // align32 can overflow
        if caplen >= u32::MAX - 4 {
            return Err(Err::Error(E::from_error_kind(i, ErrorKind::Verify)));
        }
        let padded_length = align32!(caplen);
        // the block content is complete, so missing data is an error, not a partial read
        if padded_length as usize > packet_data.len() {
            return Err(Err::Error(E::from_error_kind(i, ErrorKind::Eof)));
        }
        let (i, data) = take(padded_length)(packet_data)?;
        // read options
        let current_offset = (32 + padded_length) as usize;
        let (i, options) = opt_parse_options::<En, E>(i, block_len1 as usize, current_offset)?;
        if block_len2 != block_len1 {
            return Err(Err::Error(E::from_error_kind(i, ErrorKind::Verify)));
        }
        let block = EnhancedPacketBlock {
            block_type,
            block_len1,
            if_id,
            ts_high,
            ts_low,
            caplen,
            origlen,
            data,
            options,
            block_len2,
        };
        Ok((i, block))
    }
}

/// Parse an Enhanced Packet Block (little-endian)
pub fn parse_enhancedpacketblock_le(
    i: &[u8],
) -> IResult<&[u8], EnhancedPacketBlock, PcapError<&[u8]>> {
    ng_block_parser::<EnhancedPacketBlock, PcapLE, _, _>()(i)
}

/// Parse an Enhanced Packet Block (big-endian)
pub fn parse_enhancedpacketblock_be(
    i: &[u8],
) -> IResult<&[u8], EnhancedPacketBlock, PcapError<&[u8]>> {
    ng_block_parser::<EnhancedPacketBlock, PcapBE, _, _>()(i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcapng::tests::FRAME_PCAPNG_EPB_WITH_OPTIONS;

    #[test]
    fn epb_with_comment() {
        let (rem, epb) =
            parse_enhancedpacketblock_le(FRAME_PCAPNG_EPB_WITH_OPTIONS).expect("parse EPB");
        assert!(rem.is_empty());
        assert!(!epb.big_endian());
        assert_eq!(epb.if_id, 0);
        assert_eq!((epb.ts_high, epb.ts_low), (1, 2));
        assert_eq!(epb.caplen, 5);
        assert_eq!(epb.orig_len(), 60);
        assert!(epb.truncated());
        assert_eq!(epb.packet_data(), &[1, 2, 3, 4, 5]);
        assert_eq!(epb.raw_packet_data().len(), 8);
        assert_eq!(epb.options.len(), 2);
        assert_eq!(epb.options[0].code, OptionCode::Comment);
        assert_eq!(epb.options[0].as_str(), Ok("hi"));
        // ts = 2^32 + 2 microseconds
        assert_eq!(epb.decode_ts(0, 1_000_000), (4294, 967_298));
        assert_eq!(epb.ts_units(), (1 << 32) + 2);
    }

    #[test]
    fn epb_caplen_past_block() {
        let mut data = FRAME_PCAPNG_EPB_WITH_OPTIONS.to_vec();
        // caplen 0x40 does not fit in the block
        data[20] = 0x40;
        let res = parse_enhancedpacketblock_le(&data);
        assert!(matches!(res, Err(Err::Error(_))));
    }
}
