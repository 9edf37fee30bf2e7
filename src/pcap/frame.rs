use nom::bytes::streaming::take;
use nom::IResult;

use crate::utils::array_ref4;
use crate::PcapError;

/// Container for network data in legacy Pcap files
///
/// For nanosecond-precision files, `ts_usec` holds nanoseconds.
#[derive(Debug)]
pub struct LegacyPcapBlock<'a> {
    pub ts_sec: u32,
    pub ts_usec: u32,
    pub caplen: u32,
    pub origlen: u32,
    pub data: &'a [u8],
}

fn parse_frame_with(
    i: &[u8],
    hdr_len: usize,
    read_u32: fn([u8; 4]) -> u32,
) -> IResult<&[u8], LegacyPcapBlock, PcapError<&[u8]>> {
    if i.len() < hdr_len {
        return Err(nom::Err::Incomplete(nom::Needed::new(hdr_len - i.len())));
    }
    let ts_sec = read_u32(array_ref4(i, 0));
    let ts_usec = read_u32(array_ref4(i, 4));
    let caplen = read_u32(array_ref4(i, 8));
    let origlen = read_u32(array_ref4(i, 12));
    let (i, data) = take(caplen as usize)(&i[hdr_len..])?;
    let block = LegacyPcapBlock {
        ts_sec,
        ts_usec,
        caplen,
        origlen,
        data,
    };
    Ok((i, block))
}

/// Read a PCAP record header and data
///
/// Each PCAP record starts with a small header, and is followed by packet data.
/// The packet data format depends on the LinkType.
pub fn parse_pcap_frame(i: &[u8]) -> IResult<&[u8], LegacyPcapBlock, PcapError<&[u8]>> {
    parse_frame_with(i, 16, u32::from_le_bytes)
}

/// Read a PCAP record header and data (big-endian)
pub fn parse_pcap_frame_be(i: &[u8]) -> IResult<&[u8], LegacyPcapBlock, PcapError<&[u8]>> {
    parse_frame_with(i, 16, u32::from_be_bytes)
}

/// Read a PCAP record header and data ("modified" pcap format)
///
/// The record header has 8 extra bytes (interface index, protocol, packet type), which are
/// skipped.
pub fn parse_pcap_frame_modified(i: &[u8]) -> IResult<&[u8], LegacyPcapBlock, PcapError<&[u8]>> {
    parse_frame_with(i, 24, u32::from_le_bytes)
}
