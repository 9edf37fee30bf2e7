use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::blocks::PcapBlockOwned;
use crate::compression::{Compression, DecompressReader};
use crate::error::PcapError;
use crate::file_type::FileType;
use crate::linktype::Linktype;
use crate::pcap::{LegacyPcapBlock, PcapHeader};
use crate::pcapng::{Block, PcapNGOption};
use crate::reader::create_reader;
use crate::traits::{PcapNGPacketBlock, PcapReaderIterator};

use super::{
    owned_options, CaptureError, Encapsulation, InterfaceDescriptor, RawTimestamp, Record,
    Timestamp, EPB_NUMERIC_OPTIONS,
};

/// Initial size of the read buffer
pub const DEFAULT_BUFFER_SIZE: usize = 65536;
/// The read buffer grows up to this size to hold a single block
pub const MAX_BUFFER_SIZE: usize = 256 * 1024 * 1024;

/// An open input capture
///
/// Interfaces are those declared before the first packet. They are known as soon as the reader is
/// open, and do not change while records are read.
pub trait CaptureReader {
    /// Container format of the input
    fn file_type(&self) -> FileType;

    /// Compression of the input stream
    fn compression(&self) -> Compression {
        Compression::None
    }

    /// Interfaces declared by the input, in file order
    fn interfaces(&self) -> &[InterfaceDescriptor];

    /// Link-layer encapsulation declared by the input
    fn encapsulation(&self) -> Encapsulation {
        Encapsulation::of_interfaces(self.interfaces())
    }

    /// Section header options (pcapng only)
    fn section_options(&self) -> &[PcapNGOption<'static>] {
        &[]
    }

    /// Read the next record, or `None` at end of file
    fn next_record(&mut self) -> Result<Option<Record>, CaptureError>;

    /// Number of bytes read from the (decompressed) input stream
    fn position(&self) -> u64;
}

/// A capture read from a file or any other byte stream
///
/// The format (pcap or pcapng) and the compression are detected from the content.
pub struct CaptureFile<'r> {
    reader: Box<dyn PcapReaderIterator + 'r>,
    state: ReaderState,
    compression: Compression,
    /// First record, read while looking for interface descriptions
    pending: Option<Record>,
}

/// What a block contributed
enum Item {
    Metadata,
    Record(Record),
    Skipped,
}

struct ReaderState {
    input: usize,
    file_type: FileType,
    interfaces: Vec<InterfaceDescriptor>,
    /// Timestamp units per second, for each interface
    resolutions: Vec<u64>,
    section_options: Vec<PcapNGOption<'static>>,
    sections: usize,
    seen_packet: bool,
}

impl CaptureFile<'static> {
    /// Open the capture at `path`. Records will be tagged with `input`.
    pub fn open<P: AsRef<Path>>(input: usize, path: P) -> Result<Self, CaptureError> {
        let file = File::open(path)?;
        CaptureFile::from_reader(input, file)
    }
}

impl<'r> CaptureFile<'r> {
    /// Read a capture from `source`. Records will be tagged with `input`.
    ///
    /// The stream is read up to the first packet, to collect interface descriptions.
    pub fn from_reader<R: Read + 'r>(input: usize, source: R) -> Result<Self, CaptureError> {
        let decompressed = DecompressReader::detect(source)?;
        let compression = decompressed.compression();
        let reader = match create_reader(DEFAULT_BUFFER_SIZE, decompressed) {
            Ok(r) => r,
            Err(PcapError::Eof) => return Err(CaptureError::Empty),
            Err(PcapError::Incomplete(_)) => {
                return Err(CaptureError::Pcap(PcapError::UnexpectedEof))
            }
            Err(e) => return Err(e.into()),
        };
        let state = ReaderState {
            input,
            file_type: FileType::PcapNg,
            interfaces: Vec::new(),
            resolutions: Vec::new(),
            section_options: Vec::new(),
            sections: 0,
            seen_packet: false,
        };
        let mut capture = CaptureFile {
            reader,
            state,
            compression,
            pending: None,
        };
        capture.read_declarations()?;
        tracing::debug!(
            input,
            file_type = %capture.state.file_type,
            compression = %compression,
            interfaces = capture.state.interfaces.len(),
            "opened capture"
        );
        Ok(capture)
    }

    fn read_declarations(&mut self) -> Result<(), CaptureError> {
        while let Some(item) = self.read_item()? {
            if let Item::Record(r) = item {
                self.pending = Some(r);
                break;
            }
        }
        Ok(())
    }

    fn read_item(&mut self) -> Result<Option<Item>, CaptureError> {
        loop {
            match self.reader.next() {
                Ok((offset, block)) => {
                    let item = self.state.handle(block)?;
                    self.reader.consume(offset);
                    return Ok(Some(item));
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    self.reader.refill().map_err(|e| e.to_owned_vec())?;
                }
                Err(PcapError::BufferTooSmall) => {
                    let capacity = self.reader.capacity();
                    let new_size = capacity.saturating_mul(2).min(MAX_BUFFER_SIZE);
                    if !self.reader.grow(new_size) {
                        return Err(CaptureError::Pcap(PcapError::BufferTooSmall));
                    }
                    tracing::debug!(input = self.state.input, new_size, "grew read buffer");
                    self.reader.refill().map_err(|e| e.to_owned_vec())?;
                }
                Err(e) => return Err(e.to_owned_vec().into()),
            }
        }
    }
}

impl<'r> CaptureReader for CaptureFile<'r> {
    fn file_type(&self) -> FileType {
        self.state.file_type
    }

    fn compression(&self) -> Compression {
        self.compression
    }

    fn interfaces(&self) -> &[InterfaceDescriptor] {
        &self.state.interfaces
    }

    fn section_options(&self) -> &[PcapNGOption<'static>] {
        &self.state.section_options
    }

    fn next_record(&mut self) -> Result<Option<Record>, CaptureError> {
        if let Some(r) = self.pending.take() {
            return Ok(Some(r));
        }
        while let Some(item) = self.read_item()? {
            if let Item::Record(r) = item {
                return Ok(Some(r));
            }
        }
        Ok(None)
    }

    fn position(&self) -> u64 {
        self.reader.consumed() as u64
    }
}

impl ReaderState {
    fn handle(&mut self, block: PcapBlockOwned) -> Result<Item, CaptureError> {
        match block {
            PcapBlockOwned::LegacyHeader(hdr) => {
                self.legacy_header(&hdr);
                Ok(Item::Metadata)
            }
            PcapBlockOwned::Legacy(b) => Ok(Item::Record(self.legacy_record(&b)?)),
            PcapBlockOwned::NG(Block::SectionHeader(shb)) => {
                if self.seen_packet || (self.sections > 0 && !self.interfaces.is_empty()) {
                    return Err(CaptureError::LateSection);
                }
                if self.sections == 0 {
                    self.section_options = owned_options(&shb.options, shb.big_endian(), &[]);
                }
                self.sections += 1;
                Ok(Item::Metadata)
            }
            PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                if self.seen_packet {
                    return Err(CaptureError::LateInterface);
                }
                let index = self.interfaces.len() as u32;
                let resolution =
                    idb.ts_resolution()
                        .ok_or(CaptureError::InvalidTsResolution {
                            interface: index,
                            tsresol: idb.if_tsresol,
                        })?;
                self.interfaces
                    .push(InterfaceDescriptor::from_idb(self.input, index, &idb));
                self.resolutions.push(resolution);
                Ok(Item::Metadata)
            }
            PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                self.seen_packet = true;
                let (iface, resolution) = self.interface(epb.if_id)?;
                let raw_ts = RawTimestamp {
                    units: epb.ts_units(),
                    resolution,
                    offset: iface.tsoffset,
                };
                Ok(Item::Record(Record {
                    input: self.input,
                    ts: raw_ts.timestamp(),
                    origlen: epb.origlen,
                    if_id: epb.if_id,
                    linktype: iface.linktype,
                    data: epb.packet_data().to_vec(),
                    options: owned_options(&epb.options, epb.big_endian(), EPB_NUMERIC_OPTIONS),
                    encap: None,
                    raw_ts: Some(raw_ts),
                }))
            }
            PcapBlockOwned::NG(Block::SimplePacket(spb)) => {
                self.seen_packet = true;
                let (iface, _) = self.interface(0)?;
                let len = spb.captured_len(iface.snaplen);
                Ok(Item::Record(Record {
                    input: self.input,
                    ts: Timestamp::default(),
                    origlen: spb.origlen,
                    if_id: 0,
                    linktype: iface.linktype,
                    data: spb.data[..len].to_vec(),
                    options: Vec::new(),
                    encap: None,
                    raw_ts: None,
                }))
            }
            PcapBlockOwned::NG(Block::Unknown(ub)) => {
                tracing::debug!(
                    input = self.input,
                    block_type = ub.block_type,
                    len = ub.block_len1,
                    "skipping block"
                );
                Ok(Item::Skipped)
            }
        }
    }

    fn legacy_header(&mut self, hdr: &PcapHeader) {
        let nanosecond = hdr.is_nanosecond_precision();
        self.file_type = FileType::from_pcap_header(hdr);
        self.interfaces = vec![InterfaceDescriptor::for_pcap(
            self.input,
            hdr.network,
            hdr.snaplen,
            nanosecond,
        )];
        self.resolutions = vec![if nanosecond { 1_000_000_000 } else { 1_000_000 }];
    }

    fn legacy_record(&self, b: &LegacyPcapBlock) -> Result<Record, CaptureError> {
        let (iface, resolution) = self.interface(0)?;
        Ok(Record {
            input: self.input,
            ts: Timestamp::from_units(i64::from(b.ts_sec), u64::from(b.ts_usec), resolution),
            origlen: b.origlen,
            if_id: 0,
            linktype: iface.linktype,
            data: b.data.to_vec(),
            options: Vec::new(),
            encap: None,
            raw_ts: None,
        })
    }

    fn interface(&self, if_id: u32) -> Result<(&InterfaceDescriptor, u64), CaptureError> {
        let idx = if_id as usize;
        match (self.interfaces.get(idx), self.resolutions.get(idx)) {
            (Some(iface), Some(&resolution)) => Ok((iface, resolution)),
            _ => Err(CaptureError::UnknownInterface(if_id)),
        }
    }
}

/// Link type of the first interface of a capture, if any
pub fn first_linktype<C: CaptureReader + ?Sized>(capture: &C) -> Option<Linktype> {
    capture.interfaces().first().map(|i| i.linktype)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcap::tests::{FRAME_PCAP, PCAP_HDR, PCAP_HDR_BE};
    use crate::pcapng::tests::*;

    #[test]
    fn pcap_input() {
        let data = [PCAP_HDR, FRAME_PCAP, FRAME_PCAP].concat();
        let mut capture = CaptureFile::from_reader(2, &data[..]).expect("open");
        assert_eq!(capture.file_type(), FileType::Pcap);
        assert_eq!(capture.compression(), Compression::None);
        assert_eq!(capture.interfaces().len(), 1);
        assert_eq!(capture.interfaces()[0].snaplen, 262_144);
        assert_eq!(
            capture.encapsulation(),
            Encapsulation::Link(Linktype::ETHERNET)
        );
        let r = capture.next_record().expect("read").expect("record");
        assert_eq!(r.input, 2);
        assert_eq!(r.ts, Timestamp::new(1_515_933_236, 562_913_000));
        assert_eq!(r.origlen, 74);
        assert_eq!(r.data, vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(capture.next_record().expect("read").is_some());
        assert!(capture.next_record().expect("read").is_none());
        assert_eq!(capture.position(), data.len() as u64);
    }

    #[test]
    fn pcap_big_endian_header_only() {
        let mut capture = CaptureFile::from_reader(0, PCAP_HDR_BE).expect("open");
        assert_eq!(first_linktype(&capture), Some(Linktype::ETHERNET));
        assert!(capture.next_record().expect("read").is_none());
    }

    #[test]
    fn pcapng_input() {
        let data = [
            FRAME_PCAPNG_SHB,
            FRAME_PCAPNG_IDB,
            FRAME_PCAPNG_EPB_WITH_OPTIONS,
            FRAME_PCAPNG_SPB,
        ]
        .concat();
        let mut capture = CaptureFile::from_reader(0, &data[..]).expect("open");
        assert_eq!(capture.file_type(), FileType::PcapNg);
        let iface = &capture.interfaces()[0];
        assert_eq!(iface.tsresol, 9);
        assert_eq!(iface.name(), Some("eth0"));
        // if_tsresol is kept as a field, not as an option
        assert_eq!(iface.options.len(), 1);
        let epb = capture.next_record().expect("read").expect("EPB");
        // 2^32 + 2 nanoseconds
        assert_eq!(epb.ts, Timestamp::new(4, 294_967_298));
        assert_eq!(epb.data, vec![1, 2, 3, 4, 5]);
        assert_eq!(epb.origlen, 60);
        assert_eq!(epb.options.len(), 1);
        assert_eq!(epb.options[0].as_str(), Ok("hi"));
        let spb = capture.next_record().expect("read").expect("SPB");
        assert_eq!(spb.ts, Timestamp::default());
        assert_eq!(spb.data, vec![0xaa, 0xbb, 0xcc]);
        assert!(capture.next_record().expect("read").is_none());
    }

    #[test]
    fn pcapng_without_interfaces() {
        let capture = CaptureFile::from_reader(0, FRAME_PCAPNG_SHB).expect("open");
        assert_eq!(capture.encapsulation(), Encapsulation::Unknown);
    }

    #[test]
    fn packet_without_interface() {
        let data = [FRAME_PCAPNG_SHB, FRAME_PCAPNG_EPB_WITH_OPTIONS].concat();
        let res = CaptureFile::from_reader(0, &data[..]);
        assert!(matches!(res, Err(CaptureError::UnknownInterface(0))));
    }

    #[test]
    fn interface_after_packet() {
        let data = [
            FRAME_PCAPNG_SHB,
            FRAME_PCAPNG_IDB,
            FRAME_PCAPNG_EPB_WITH_OPTIONS,
            FRAME_PCAPNG_IDB,
        ]
        .concat();
        let mut capture = CaptureFile::from_reader(0, &data[..]).expect("open");
        assert!(capture.next_record().expect("read").is_some());
        assert!(matches!(
            capture.next_record(),
            Err(CaptureError::LateInterface)
        ));
    }

    #[test]
    fn truncated_record() {
        let data = [PCAP_HDR, FRAME_PCAP, &FRAME_PCAP[..18]].concat();
        let mut capture = CaptureFile::from_reader(0, &data[..]).expect("open");
        assert!(capture.next_record().expect("read").is_some());
        assert!(matches!(
            capture.next_record(),
            Err(CaptureError::Pcap(PcapError::UnexpectedEof))
        ));
        assert_eq!(capture.position(), (PCAP_HDR.len() + FRAME_PCAP.len()) as u64);
        // a truncated first record is reported when opening
        let data = [PCAP_HDR, &FRAME_PCAP[..18]].concat();
        assert!(CaptureFile::from_reader(0, &data[..]).is_err());
    }

    #[test]
    fn empty_and_unknown() {
        assert!(matches!(
            CaptureFile::from_reader(0, &b""[..]),
            Err(CaptureError::Empty)
        ));
        assert!(matches!(
            CaptureFile::from_reader(0, &b"not a capture file at all"[..]),
            Err(CaptureError::UnknownFormat)
        ));
    }
}
