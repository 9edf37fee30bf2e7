use nom::error::{ErrorKind, ParseError};
use std::fmt;
use std::io;

/// Errors raised by the streaming block parsers and readers
#[derive(Debug, PartialEq)]
pub enum PcapError<I: Sized> {
    /// No more data to read
    Eof,
    /// The underlying reader returned an error of this kind
    ReadError(io::ErrorKind),
    /// More data is required to parse the next block (number of bytes, 0 if unknown)
    Incomplete(usize),

    /// First bytes do not match any known capture file magic
    HeaderNotRecognized,

    NomError(I, ErrorKind),
    /// Parser error detached from the input buffer
    OwnedNomError(Vec<u8>, ErrorKind),

    /// Next block does not fit in the reader buffer
    BufferTooSmall,
    /// Reader reached end of stream in the middle of a block
    UnexpectedEof,
}

impl<I> PcapError<I> {
    /// Convert a borrowed error into one that does not hold a reference to the input
    pub fn to_owned_vec(&self) -> PcapError<&'static [u8]>
    where
        I: AsRef<[u8]>,
    {
        match self {
            PcapError::Eof => PcapError::Eof,
            PcapError::ReadError(kind) => PcapError::ReadError(*kind),
            PcapError::Incomplete(n) => PcapError::Incomplete(*n),
            PcapError::HeaderNotRecognized => PcapError::HeaderNotRecognized,
            PcapError::NomError(i, e) => PcapError::OwnedNomError(i.as_ref().to_vec(), *e),
            PcapError::OwnedNomError(v, e) => PcapError::OwnedNomError(v.clone(), *e),
            PcapError::BufferTooSmall => PcapError::BufferTooSmall,
            PcapError::UnexpectedEof => PcapError::UnexpectedEof,
        }
    }
}

impl<I> ParseError<I> for PcapError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        PcapError::NomError(input, kind)
    }
    fn append(input: I, kind: ErrorKind, _other: Self) -> Self {
        PcapError::NomError(input, kind)
    }
}

impl<I> fmt::Display for PcapError<I> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PcapError::Eof => write!(f, "End of file"),
            PcapError::ReadError(kind) => write!(f, "Read error: {}", kind),
            PcapError::Incomplete(n) => write!(f, "Incomplete read: {}", n),
            PcapError::HeaderNotRecognized => write!(f, "Header not recognized as PCAP or PCAPNG"),
            PcapError::NomError(_, e) => write!(f, "Internal parser error {:?}", e),
            PcapError::OwnedNomError(_, e) => write!(f, "Internal parser error {:?}", e),
            PcapError::BufferTooSmall => write!(f, "Buffer is too small"),
            PcapError::UnexpectedEof => write!(f, "Unexpected end of file"),
        }
    }
}

impl<I> std::error::Error for PcapError<I> where I: fmt::Debug {}
