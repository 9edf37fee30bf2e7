//! Capture files seen as streams of records
//!
//! This module is the boundary between the block-level codec and the merge logic. A
//! [`CaptureReader`] opens an input and yields owned [`Record`]s in file order, along with the
//! interfaces declared by the file. A [`CaptureWriter`] writes records to an output container.

mod error;
mod reader;
mod writer;

pub use error::*;
pub use reader::*;
pub use writer::*;

use std::convert::TryFrom;
use std::fmt;

use crate::linktype::Linktype;
use crate::pcapng::{InterfaceDescriptionBlock, OptionCode, PcapNGOption};
use crate::utils::NANOS_PER_SEC;

/// Packet timestamp, as seconds and nanoseconds since the epoch
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Timestamp {
    pub secs: i64,
    /// Always lower than 10^9
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(secs: i64, nanos: u32) -> Timestamp {
        Timestamp::from_units(secs, u64::from(nanos), NANOS_PER_SEC)
    }

    /// Build a timestamp from seconds and a fractional part in `resolution` units per second
    ///
    /// A fractional part larger than one second is carried into the seconds.
    pub fn from_units(secs: i64, frac: u64, resolution: u64) -> Timestamp {
        let resolution = resolution.max(1);
        let secs = secs.saturating_add((frac / resolution) as i64);
        let rem = u128::from(frac % resolution);
        let nanos = (rem * u128::from(NANOS_PER_SEC) / u128::from(resolution)) as u32;
        Timestamp { secs, nanos }
    }

    /// Express the timestamp as a count of `resolution` units since `offset` seconds
    ///
    /// Returns `None` if the value is negative or does not fit in 64 bits.
    pub fn to_units(&self, resolution: u64, offset: i64) -> Option<u64> {
        let resolution = i128::from(resolution);
        let secs = i128::from(self.secs) - i128::from(offset);
        let frac = i128::from(self.nanos) * resolution / i128::from(NANOS_PER_SEC);
        u64::try_from(secs * resolution + frac).ok()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}

/// Timestamp as stored in a packet block: `units` of `1/resolution` second since `offset`
/// seconds
///
/// [`Timestamp`] only keeps nanoseconds. Binary resolutions and resolutions finer than a
/// nanosecond are only exact in this form.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RawTimestamp {
    pub units: u64,
    /// Units per second
    pub resolution: u64,
    /// `if_tsoffset` of the interface, in seconds
    pub offset: i64,
}

impl RawTimestamp {
    /// Express the same instant as a count of `resolution` units since `offset` seconds
    ///
    /// The value is unchanged when the clock is the same. Otherwise the result is truncated to
    /// the target resolution. Returns `None` if the value is negative or does not fit in 64
    /// bits.
    pub fn to_clock(&self, resolution: u64, offset: i64) -> Option<u64> {
        if resolution == self.resolution && offset == self.offset {
            return Some(self.units);
        }
        let scaled =
            u128::from(self.units) * u128::from(resolution) / u128::from(self.resolution.max(1));
        let shift = (i128::from(self.offset) - i128::from(offset)) * i128::from(resolution);
        let units = i128::try_from(scaled).ok()?.checked_add(shift)?;
        u64::try_from(units).ok()
    }

    /// The timestamp, truncated to nanoseconds
    pub fn timestamp(&self) -> Timestamp {
        let resolution = self.resolution.max(1);
        Timestamp::from_units(self.offset, self.units, resolution)
    }
}

/// Link-layer encapsulation of an input or of the output
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Encapsulation {
    /// All records have the same link type
    Link(Linktype),
    /// Each record carries its own link type
    PerRecord,
    /// No interface, so no link type (for ex. a pcapng file with no IDB)
    Unknown,
}

impl Encapsulation {
    /// Encapsulation of a set of interfaces: their common link type, `PerRecord` if they differ,
    /// `Unknown` if there are none
    pub fn of_interfaces(interfaces: &[InterfaceDescriptor]) -> Encapsulation {
        let mut iter = interfaces.iter().map(|i| i.linktype);
        match iter.next() {
            None => Encapsulation::Unknown,
            Some(first) => {
                if iter.all(|l| l == first) {
                    Encapsulation::Link(first)
                } else {
                    Encapsulation::PerRecord
                }
            }
        }
    }
}

impl fmt::Display for Encapsulation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Encapsulation::Link(l) => write!(f, "{} ({})", l, l.description()),
            Encapsulation::PerRecord => write!(f, "per-packet encapsulation"),
            Encapsulation::Unknown => write!(f, "unknown encapsulation"),
        }
    }
}

/// Description of a capture interface
///
/// `input` and `index` identify the interface: they give the input file and the position of the
/// interface in the file. They are not part of the interface metadata, see
/// [`InterfaceDescriptor::same_metadata`].
#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceDescriptor {
    pub input: usize,
    pub index: u32,
    pub linktype: Linktype,
    pub snaplen: u32,
    /// Raw `if_tsresol` value
    pub tsresol: u8,
    /// `if_tsoffset`, in seconds
    pub tsoffset: i64,
    /// Descriptive options (name, description, filter, ...), without `if_tsresol`, `if_tsoffset`
    /// and the end of options marker
    pub options: Vec<PcapNGOption<'static>>,
}

impl InterfaceDescriptor {
    /// Interface synthesized for a legacy pcap input
    pub fn for_pcap(input: usize, linktype: Linktype, snaplen: u32, nanosecond: bool) -> Self {
        InterfaceDescriptor {
            input,
            index: 0,
            linktype,
            snaplen,
            tsresol: if nanosecond { 9 } else { 6 },
            tsoffset: 0,
            options: Vec::new(),
        }
    }

    /// Copy the metadata of an Interface Description Block
    ///
    /// Options stored in a big-endian section are converted to little-endian.
    pub fn from_idb(input: usize, index: u32, idb: &InterfaceDescriptionBlock) -> Self {
        let big_endian = idb.block_type != crate::pcapng::IDB_MAGIC;
        let options = owned_options(&idb.options, big_endian, IDB_NUMERIC_OPTIONS)
            .into_iter()
            .filter(|o| o.code != OptionCode::IfTsresol && o.code != OptionCode::IfTsoffset)
            .collect();
        InterfaceDescriptor {
            input,
            index,
            linktype: idb.linktype,
            snaplen: idb.snaplen,
            tsresol: idb.if_tsresol,
            tsoffset: idb.if_tsoffset,
            options,
        }
    }

    /// Build an Interface Description Block for this interface
    pub fn to_idb(&self) -> InterfaceDescriptionBlock<'static> {
        InterfaceDescriptionBlock {
            block_type: crate::pcapng::IDB_MAGIC,
            block_len1: 0,
            linktype: self.linktype,
            reserved: 0,
            snaplen: self.snaplen,
            options: self.options.clone(),
            block_len2: 0,
            if_tsresol: self.tsresol,
            if_tsoffset: self.tsoffset,
        }
    }

    /// True if both interfaces have identical metadata: link type, snap length, timestamp
    /// resolution and offset, and options
    pub fn same_metadata(&self, other: &InterfaceDescriptor) -> bool {
        self.linktype == other.linktype
            && self.snaplen == other.snaplen
            && self.tsresol == other.tsresol
            && self.tsoffset == other.tsoffset
            && self.options == other.options
    }

    /// `if_name` option, if present and valid
    pub fn name(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.code == OptionCode::IfName)
            .and_then(|o| o.as_str().ok())
    }
}

/// A packet record, detached from the file it was read from
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Index of the input the record was read from
    pub input: usize,
    pub ts: Timestamp,
    /// Length of the packet on the wire
    pub origlen: u32,
    /// Interface index, in the input file. After transformation, in the output file.
    pub if_id: u32,
    /// Link type of the record's interface
    pub linktype: Linktype,
    /// Captured bytes
    pub data: Vec<u8>,
    /// Packet block options (comments, flags, ...), without the end of options marker
    pub options: Vec<PcapNGOption<'static>>,
    /// Link type to write with the record, when the output has per-record encapsulation
    ///
    /// The pcapng writer refuses a record whose output interface has another link type.
    pub encap: Option<Linktype>,
    /// Timestamp in the clock of the input interface, when read from a packet block
    pub raw_ts: Option<RawTimestamp>,
}

impl Record {
    /// Captured length
    #[inline]
    pub fn caplen(&self) -> u32 {
        self.data.len() as u32
    }
}

/// Fixed-size numeric options of an IDB, with their size
pub(crate) const IDB_NUMERIC_OPTIONS: &[(OptionCode, usize)] = &[(OptionCode::IfSpeed, 8)];
/// Fixed-size numeric options of an EPB, with their size
pub(crate) const EPB_NUMERIC_OPTIONS: &[(OptionCode, usize)] =
    &[(OptionCode::EpbFlags, 4), (OptionCode::EpbDropCount, 8)];

/// Copy options out of the input buffer, dropping the end of options marker
///
/// Numeric options of a big-endian section are byte-swapped, so that all copies are
/// little-endian like the output.
pub(crate) fn owned_options(
    options: &[PcapNGOption],
    big_endian: bool,
    numeric: &[(OptionCode, usize)],
) -> Vec<PcapNGOption<'static>> {
    options
        .iter()
        .filter(|o| o.code != OptionCode::EndOfOpt)
        .map(|o| {
            let mut owned = o.clone().into_owned();
            let is_numeric = numeric
                .iter()
                .any(|&(code, size)| code == o.code && usize::from(o.len) == size);
            if big_endian && is_numeric {
                owned.value.to_mut().reverse();
            }
            owned
        })
        .collect()
}
