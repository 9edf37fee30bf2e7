//! Block serializers (little-endian)
//!
//! Blocks are written with `cookie-factory`. Call `to_vec` to fix the length and magic fields
//! before serializing, or `to_vec_raw` to write the fields as they are.

use crate::pcap::*;
use crate::pcapng::*;
use cookie_factory::bytes::{le_i32, le_i64, le_u16, le_u32, le_u8};
use cookie_factory::combinator::slice;
use cookie_factory::multi::many_ref;
use cookie_factory::sequence::tuple;
use cookie_factory::{gen, GenError, SerializeFn};
use rusticata_macros::align32;
use std::borrow::Cow;
use std::io::Write;

/// Common trait for all serialization functions
pub trait ToVec {
    /// Serialize to bytes representation (little-endian).
    /// Check values and fix all fields before serializing.
    fn to_vec(&mut self) -> Result<Vec<u8>, GenError> {
        self.fix();
        self.to_vec_raw()
    }

    /// Check and correct all fields: use magic, fix lengths fields and other values if possible.
    fn fix(&mut self) {}

    /// Serialize to bytes representation (little-endian). Do not check values
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError>;
}

impl ToVec for PcapHeader {
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(24);

        gen(
            tuple((
                le_u32(self.magic_number),
                le_u16(self.version_major),
                le_u16(self.version_minor),
                le_i32(self.thiszone),
                le_u32(self.sigfigs),
                le_u32(self.snaplen),
                le_u32(self.network.0 as u32),
            )),
            &mut v,
        )
        .map(|res| res.0.to_vec())
    }
}

impl<'a> ToVec for LegacyPcapBlock<'a> {
    fn fix(&mut self) {
        self.caplen = self.data.len() as u32;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(self.data.len() + 16);

        gen(
            tuple((
                le_u32(self.ts_sec),
                le_u32(self.ts_usec),
                le_u32(self.caplen),
                le_u32(self.origlen),
                slice(self.data),
            )),
            &mut v,
        )
        // pcap records have no alignment constraints
        .map(|res| res.0.to_vec())
    }
}

/// Serialize a record of a "modified" pcap file
///
/// The extended header fields (interface index, protocol, packet type) are written as zero.
pub fn legacy_block_to_vec_modified(block: &LegacyPcapBlock) -> Result<Vec<u8>, GenError> {
    let mut v = Vec::with_capacity(block.data.len() + 24);

    gen(
        tuple((
            le_u32(block.ts_sec),
            le_u32(block.ts_usec),
            le_u32(block.data.len() as u32),
            le_u32(block.origlen),
            le_u32(0),
            le_u16(0),
            le_u8(0),
            le_u8(0),
            slice(block.data),
        )),
        &mut v,
    )
    .map(|res| res.0.to_vec())
}

fn padding_for<'a, W: Write + 'a>(unaligned_length: u32) -> impl SerializeFn<W> + 'a {
    let length = align32!(unaligned_length) - unaligned_length;
    slice(if length > 0 {
        &[0, 0, 0, 0][..length as usize]
    } else {
        b""
    })
}

impl<'a> ToVec for PcapNGOption<'a> {
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::new();
        gen(pcapngoption_le(self), &mut v).map(|res| res.0.to_vec())
    }
}

/// Option value without the padding read from the file
fn option_value<'a>(o: &'a PcapNGOption) -> &'a [u8] {
    let len = usize::from(o.len).min(o.value.len());
    &o.value[..len]
}

fn pcapngoption_le<'a, 'b: 'a, W: Write + 'a>(i: &'b PcapNGOption) -> impl SerializeFn<W> + 'a {
    let value = option_value(i);
    tuple((
        le_u16(i.code.0),
        le_u16(value.len() as u16),
        slice(value),
        padding_for(value.len() as u32),
    ))
}

fn options_length(options: &[PcapNGOption]) -> usize {
    options
        .iter()
        .map(|o| align32!(4 + option_value(o).len()))
        .sum()
}

fn fix_options(options: &mut Vec<PcapNGOption>) {
    options.retain(|e| e.code != OptionCode::EndOfOpt);
    if options.is_empty() {
        // No EndOfOpt is required if there are no options.
    } else {
        options.push(PcapNGOption {
            code: OptionCode::EndOfOpt,
            len: 0,
            value: Cow::Borrowed(&[]),
        })
    }
}

impl<'a> ToVec for SectionHeaderBlock<'a> {
    /// Check and correct all fields: use magic, version and fix lengths fields
    fn fix(&mut self) {
        self.block_type = SHB_MAGIC;
        self.bom = BOM_MAGIC;
        self.major_version = 1;
        self.minor_version = 0;
        fix_options(&mut self.options);
        // fix length
        let length = (28 + options_length(&self.options)) as u32;
        self.block_len1 = length;
        self.block_len2 = length;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(64);
        gen(
            tuple((
                le_u32(self.block_type),
                le_u32(self.block_len1),
                le_u32(self.bom),
                le_u16(self.major_version),
                le_u16(self.minor_version),
                le_i64(self.section_len),
                many_ref(&self.options, pcapngoption_le),
                le_u32(self.block_len2),
            )),
            &mut v,
        )
        .map(|res| res.0.to_vec())
    }
}

impl<'a> ToVec for InterfaceDescriptionBlock<'a> {
    /// Check and correct all fields: use magic, write time resolution and offset options and fix
    /// lengths fields
    ///
    /// `if_tsresol` and `if_tsoffset` are taken from the struct fields, and only written when they
    /// differ from their default values.
    fn fix(&mut self) {
        self.block_type = IDB_MAGIC;
        self.reserved = 0;
        self.options
            .retain(|o| o.code != OptionCode::IfTsresol && o.code != OptionCode::IfTsoffset);
        if self.if_tsresol != DEFAULT_TSRESOL {
            self.options.push(PcapNGOption {
                code: OptionCode::IfTsresol,
                len: 1,
                value: Cow::Owned(vec![self.if_tsresol, 0, 0, 0]),
            });
        }
        if self.if_tsoffset != 0 {
            self.options.push(PcapNGOption {
                code: OptionCode::IfTsoffset,
                len: 8,
                value: Cow::Owned(self.if_tsoffset.to_le_bytes().to_vec()),
            });
        }
        fix_options(&mut self.options);
        // fix length
        let length = (20 + options_length(&self.options)) as u32;
        self.block_len1 = length;
        self.block_len2 = length;
    }

    /// Serialize to bytes representation. Do not check values
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(64);
        gen(
            tuple((
                le_u32(self.block_type),
                le_u32(self.block_len1),
                le_u16(self.linktype.0 as u16),
                le_u16(self.reserved),
                le_u32(self.snaplen),
                many_ref(&self.options, pcapngoption_le),
                le_u32(self.block_len2),
            )),
            &mut v,
        )
        .map(|res| res.0.to_vec())
    }
}

impl<'a> ToVec for EnhancedPacketBlock<'a> {
    /// Check and correct all fields: use magic, captured length and fix lengths fields
    ///
    /// `data` must hold the captured bytes, without padding.
    fn fix(&mut self) {
        self.block_type = EPB_MAGIC;
        self.caplen = self.data.len() as u32;
        fix_options(&mut self.options);
        // fix length
        let length = (32 + align32!(self.data.len()) + options_length(&self.options)) as u32;
        self.block_len1 = length;
        self.block_len2 = length;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(self.data.len() + 64);
        gen(
            tuple((
                le_u32(self.block_type),
                le_u32(self.block_len1),
                le_u32(self.if_id),
                le_u32(self.ts_high),
                le_u32(self.ts_low),
                le_u32(self.caplen),
                le_u32(self.origlen),
                slice(self.data),
                padding_for(self.data.len() as u32),
                many_ref(&self.options, pcapngoption_le),
                le_u32(self.block_len2),
            )),
            &mut v,
        )
        .map(|res| res.0.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcap::tests::{FRAME_PCAP, PCAP_HDR};
    use crate::pcapng::tests::*;
    use crate::Linktype;

    #[test]
    fn pcap_header_and_frame() {
        let (_, mut hdr) = parse_pcap_header(PCAP_HDR).expect("header");
        assert_eq!(hdr.to_vec().expect("serialize header"), PCAP_HDR);
        let (_, mut pkt) = parse_pcap_frame(FRAME_PCAP).expect("frame");
        assert_eq!(pkt.to_vec().expect("serialize frame"), FRAME_PCAP);
    }

    #[test]
    fn modified_record() {
        let (_, pkt) = parse_pcap_frame(FRAME_PCAP).expect("frame");
        let v = legacy_block_to_vec_modified(&pkt).expect("serialize");
        assert_eq!(v.len(), 24 + 4);
        let (rem, back) = parse_pcap_frame_modified(&v).expect("parse modified");
        assert!(rem.is_empty());
        assert_eq!(back.ts_sec, pkt.ts_sec);
        assert_eq!(back.origlen, 74);
        assert_eq!(back.data, pkt.data);
    }

    #[test]
    fn shb_roundtrip() {
        let (_, mut shb) = parse_sectionheaderblock(FRAME_PCAPNG_SHB).expect("SHB");
        assert_eq!(shb.to_vec().expect("serialize SHB"), FRAME_PCAPNG_SHB);
    }

    #[test]
    fn shb_be_is_written_le() {
        let (_, mut shb) = parse_sectionheaderblock(FRAME_PCAPNG_SHB_BE).expect("SHB");
        assert_eq!(shb.to_vec().expect("serialize SHB"), FRAME_PCAPNG_SHB);
    }

    #[test]
    fn shb_with_userappl() {
        let (_, mut shb) = parse_sectionheaderblock(FRAME_PCAPNG_SHB).expect("SHB");
        shb.options
            .push(PcapNGOption::new_str(OptionCode::ShbUserAppl, "merge").expect("option"));
        let v = shb.to_vec().expect("serialize SHB");
        // 28 + "merge" option (4 + 8) + end of options (4)
        assert_eq!(v.len(), 44);
        let (rem, back) = parse_sectionheaderblock(&v).expect("parse SHB");
        assert!(rem.is_empty());
        assert_eq!(back.shb_userappl(), Some(Ok("merge")));
    }

    #[test]
    fn idb_roundtrip() {
        let (_, mut idb) = parse_interfacedescriptionblock_le(FRAME_PCAPNG_IDB).expect("IDB");
        assert_eq!(idb.to_vec().expect("serialize IDB"), FRAME_PCAPNG_IDB);
    }

    #[test]
    fn idb_default_resolution_has_no_options() {
        let mut idb = InterfaceDescriptionBlock {
            block_type: 0,
            block_len1: 0,
            linktype: Linktype::RAW,
            reserved: 0,
            snaplen: 1500,
            options: Vec::new(),
            block_len2: 0,
            if_tsresol: DEFAULT_TSRESOL,
            if_tsoffset: 0,
        };
        let v = idb.to_vec().expect("serialize IDB");
        assert_eq!(v.len(), 20);
        idb.if_tsoffset = -3;
        let v = idb.to_vec().expect("serialize IDB");
        let (_, back) = parse_interfacedescriptionblock_le(&v).expect("parse IDB");
        assert_eq!(back.if_tsoffset, -3);
        assert_eq!(back.if_tsresol, DEFAULT_TSRESOL);
    }

    #[test]
    fn epb_roundtrip() {
        let (_, mut epb) =
            parse_enhancedpacketblock_le(FRAME_PCAPNG_EPB_WITH_OPTIONS).expect("EPB");
        epb.data = &epb.data[..epb.caplen as usize];
        assert_eq!(
            epb.to_vec().expect("serialize EPB"),
            FRAME_PCAPNG_EPB_WITH_OPTIONS
        );
    }
}
