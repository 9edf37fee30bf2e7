use std::io;

use thiserror::Error;

use crate::error::PcapError;

/// Errors raised while reading or writing a capture file
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Pcap(PcapError<&'static [u8]>),

    #[error("the file isn't a capture file in a known format")]
    UnknownFormat,

    #[error("the file is empty")]
    Empty,

    #[error("packet references interface {0}, which was not described")]
    UnknownInterface(u32),

    #[error("record with link type {found} written on interface {interface} of link type {expected}")]
    LinktypeMismatch {
        interface: u32,
        expected: crate::linktype::Linktype,
        found: crate::linktype::Linktype,
    },

    #[error("interface {interface} has an invalid timestamp resolution {tsresol:#x}")]
    InvalidTsResolution { interface: u32, tsresol: u8 },

    #[error("interface description after first packet is not supported")]
    LateInterface,

    #[error("new section after first packet is not supported")]
    LateSection,

    #[error("{file_type} files can't be written with {encapsulation}")]
    UnsupportedEncapsulation {
        file_type: &'static str,
        encapsulation: super::Encapsulation,
    },

    #[error("{file_type} files can't be written with {compression} compression")]
    UnsupportedCompression {
        file_type: &'static str,
        compression: crate::compression::Compression,
    },

    #[error("timestamp {0} can't be written in this file")]
    TimestampOutOfRange(super::Timestamp),

    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl From<PcapError<&'static [u8]>> for CaptureError {
    fn from(e: PcapError<&'static [u8]>) -> CaptureError {
        match e {
            PcapError::HeaderNotRecognized => CaptureError::UnknownFormat,
            e => CaptureError::Pcap(e),
        }
    }
}

impl From<cookie_factory::GenError> for CaptureError {
    fn from(e: cookie_factory::GenError) -> CaptureError {
        match e {
            cookie_factory::GenError::IoError(e) => CaptureError::Io(e),
            e => CaptureError::Serialize(format!("{:?}", e)),
        }
    }
}
