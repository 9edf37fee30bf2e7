use std::borrow::Cow;
use std::convert::TryFrom;
use std::io::Write;

use crate::compression::{CompressWriter, Compression};
use crate::file_type::FileType;
use crate::linktype::Linktype;
use crate::pcap::{LegacyPcapBlock, PcapHeader};
use crate::pcapng::{
    build_ts_resolution, split_ts, EnhancedPacketBlock, PcapNGOption, SectionHeaderBlock,
    BOM_MAGIC, EPB_MAGIC, SHB_MAGIC,
};
use crate::serialize::{legacy_block_to_vec_modified, ToVec};

use super::{CaptureError, Encapsulation, InterfaceDescriptor, Record};

/// Everything written before the first record
#[derive(Clone, Debug, PartialEq)]
pub struct OutputHeader {
    pub file_type: FileType,
    pub encapsulation: Encapsulation,
    /// Snapshot length of the pcap header. Ignored for pcapng, which stores one per interface.
    pub snaplen: u32,
    /// Interface table (pcapng only)
    pub interfaces: Vec<InterfaceDescriptor>,
    /// Section header options (pcapng only)
    pub section_options: Vec<PcapNGOption<'static>>,
}

/// An output capture, accepting records one at a time
pub trait CaptureWriter<W: Write> {
    /// Serialize one record
    fn write_record(&mut self, record: &Record) -> Result<(), CaptureError>;

    /// Flush all data, finish the compression stream and return the destination
    fn finish(self) -> Result<W, CaptureError>;
}

/// Legacy pcap writer (micro- or nanosecond, or modified pcap)
pub struct PcapWriter<W: Write> {
    out: CompressWriter<W>,
    file_type: FileType,
    linktype: Linktype,
}

impl<W: Write> PcapWriter<W> {
    /// Write the file header and return the writer
    ///
    /// Fails if the encapsulation is not a single link type.
    pub fn new(
        out: CompressWriter<W>,
        file_type: FileType,
        encapsulation: Encapsulation,
        snaplen: u32,
    ) -> Result<Self, CaptureError> {
        let (magic, linktype) = match (file_type.pcap_magic(), encapsulation) {
            (Some(magic), Encapsulation::Link(l)) => (magic, l),
            _ => {
                return Err(CaptureError::UnsupportedEncapsulation {
                    file_type: file_type.name(),
                    encapsulation,
                })
            }
        };
        let mut writer = PcapWriter {
            out,
            file_type,
            linktype,
        };
        let hdr = PcapHeader::with_magic(magic, snaplen, linktype).to_vec_raw()?;
        writer.out.write_all(&hdr)?;
        Ok(writer)
    }

    fn record_to_vec(&self, record: &Record) -> Result<Vec<u8>, CaptureError> {
        let ts_sec =
            u32::try_from(record.ts.secs).map_err(|_| CaptureError::TimestampOutOfRange(record.ts))?;
        let ts_frac = match self.file_type {
            FileType::PcapNsec => record.ts.nanos,
            _ => record.ts.nanos / 1000,
        };
        let mut block = LegacyPcapBlock {
            ts_sec,
            ts_usec: ts_frac,
            caplen: 0,
            origlen: record.origlen,
            data: &record.data,
        };
        let v = match self.file_type {
            FileType::ModifiedPcap => legacy_block_to_vec_modified(&block)?,
            _ => block.to_vec()?,
        };
        Ok(v)
    }
}

impl<W: Write> CaptureWriter<W> for PcapWriter<W> {
    fn write_record(&mut self, record: &Record) -> Result<(), CaptureError> {
        if record.linktype != self.linktype {
            return Err(CaptureError::UnsupportedEncapsulation {
                file_type: self.file_type.name(),
                encapsulation: Encapsulation::PerRecord,
            });
        }
        let v = self.record_to_vec(record)?;
        self.out.write_all(&v)?;
        Ok(())
    }

    fn finish(self) -> Result<W, CaptureError> {
        Ok(self.out.finish()?)
    }
}

/// pcapng writer: a single little-endian section
pub struct PcapNgWriter<W: Write> {
    out: CompressWriter<W>,
    interfaces: Vec<OutputInterface>,
}

/// What the writer needs to know of an output interface
struct OutputInterface {
    linktype: Linktype,
    /// Units per second
    resolution: u64,
    offset: i64,
}

impl<W: Write> PcapNgWriter<W> {
    /// Write the section header and the interface table, and return the writer
    pub fn new(
        out: CompressWriter<W>,
        section_options: &[PcapNGOption<'static>],
        interfaces: &[InterfaceDescriptor],
    ) -> Result<Self, CaptureError> {
        let mut writer = PcapNgWriter {
            out,
            interfaces: Vec::with_capacity(interfaces.len()),
        };
        let mut shb = SectionHeaderBlock {
            block_type: SHB_MAGIC,
            block_len1: 0,
            bom: BOM_MAGIC,
            major_version: 1,
            minor_version: 0,
            section_len: -1,
            options: section_options.to_vec(),
            block_len2: 0,
        };
        let v = shb.to_vec()?;
        writer.out.write_all(&v)?;
        for (index, iface) in interfaces.iter().enumerate() {
            let resolution =
                build_ts_resolution(iface.tsresol).ok_or(CaptureError::InvalidTsResolution {
                    interface: index as u32,
                    tsresol: iface.tsresol,
                })?;
            writer.interfaces.push(OutputInterface {
                linktype: iface.linktype,
                resolution,
                offset: iface.tsoffset,
            });
            let v = iface.to_idb().to_vec()?;
            writer.out.write_all(&v)?;
        }
        Ok(writer)
    }
}

impl<W: Write> CaptureWriter<W> for PcapNgWriter<W> {
    fn write_record(&mut self, record: &Record) -> Result<(), CaptureError> {
        let iface = self
            .interfaces
            .get(record.if_id as usize)
            .ok_or(CaptureError::UnknownInterface(record.if_id))?;
        if let Some(linktype) = record.encap {
            if linktype != iface.linktype {
                return Err(CaptureError::LinktypeMismatch {
                    interface: record.if_id,
                    expected: iface.linktype,
                    found: linktype,
                });
            }
        }
        // the input value is kept as is when the clocks match
        let units = match record.raw_ts {
            Some(raw) => raw.to_clock(iface.resolution, iface.offset),
            None => record.ts.to_units(iface.resolution, iface.offset),
        }
        .ok_or(CaptureError::TimestampOutOfRange(record.ts))?;
        let (ts_high, ts_low) = split_ts(units);
        let options = record
            .options
            .iter()
            .map(|o| PcapNGOption {
                code: o.code,
                len: o.len,
                value: Cow::Borrowed(o.value()),
            })
            .collect();
        let mut epb = EnhancedPacketBlock {
            block_type: EPB_MAGIC,
            block_len1: 0,
            if_id: record.if_id,
            ts_high,
            ts_low,
            caplen: 0,
            origlen: record.origlen,
            data: &record.data,
            options,
            block_len2: 0,
        };
        let v = epb.to_vec()?;
        self.out.write_all(&v)?;
        Ok(())
    }

    fn finish(self) -> Result<W, CaptureError> {
        Ok(self.out.finish()?)
    }
}

/// Writer for any supported output file type
pub enum OutputWriter<W: Write> {
    Pcap(PcapWriter<W>),
    PcapNg(PcapNgWriter<W>),
}

impl<W: Write> OutputWriter<W> {
    /// Wrap `sink` with `compression` and write `header`
    pub fn new(
        sink: W,
        compression: Compression,
        header: &OutputHeader,
    ) -> Result<Self, CaptureError> {
        if !header.file_type.can_compress() && compression.is_compressed() {
            return Err(CaptureError::UnsupportedCompression {
                file_type: header.file_type.name(),
                compression,
            });
        }
        let out = CompressWriter::new(sink, compression).ok_or(
            CaptureError::UnsupportedCompression {
                file_type: header.file_type.name(),
                compression,
            },
        )?;
        if header.file_type.supports_interfaces() {
            PcapNgWriter::new(out, &header.section_options, &header.interfaces)
                .map(OutputWriter::PcapNg)
        } else {
            PcapWriter::new(out, header.file_type, header.encapsulation, header.snaplen)
                .map(OutputWriter::Pcap)
        }
    }
}

impl<W: Write> CaptureWriter<W> for OutputWriter<W> {
    fn write_record(&mut self, record: &Record) -> Result<(), CaptureError> {
        match self {
            OutputWriter::Pcap(w) => w.write_record(record),
            OutputWriter::PcapNg(w) => w.write_record(record),
        }
    }

    fn finish(self) -> Result<W, CaptureError> {
        match self {
            OutputWriter::Pcap(w) => w.finish(),
            OutputWriter::PcapNg(w) => w.finish(),
        }
    }
}
