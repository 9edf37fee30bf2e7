use crate::error::PcapError;
use crate::pcap::LegacyPcapReader;
use crate::pcapng::PcapNGReader;
use crate::traits::PcapReaderIterator;
use circular::Buffer;
use nom::Needed;
use std::io::{self, Read};

/// Kind of capture file, detected from its magic
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaptureFormat {
    Legacy,
    PcapNG,
}

/// Detect the capture format from the first 4 bytes of a stream
pub fn detect_format(magic: &[u8]) -> Option<CaptureFormat> {
    match magic {
        [0x0a, 0x0d, 0x0d, 0x0a, ..] => Some(CaptureFormat::PcapNG),
        // µs, ns and modified magics, in both byte orders
        [0xd4, 0xc3, 0xb2, 0xa1, ..]
        | [0x4d, 0x3c, 0xb2, 0xa1, ..]
        | [0x34, 0xcd, 0xb2, 0xa1, ..]
        | [0xa1, 0xb2, 0xc3, 0xd4, ..]
        | [0xa1, 0xb2, 0x3c, 0x4d, ..] => Some(CaptureFormat::Legacy),
        _ => None,
    }
}

/// Create a streaming reader for input in either PCAP or PCAPNG format
///
/// Returns `PcapError::Eof` for an empty stream, `PcapError::Incomplete` if the stream ends
/// before a magic could be read, and `PcapError::HeaderNotRecognized` for other formats.
pub fn create_reader<'b, R>(
    capacity: usize,
    mut reader: R,
) -> Result<Box<dyn PcapReaderIterator + 'b>, PcapError<&'static [u8]>>
where
    R: Read + 'b,
{
    let mut buffer = Buffer::with_capacity(capacity);
    fill_at_least(&mut buffer, &mut reader, 4)?;
    let available = buffer.available_data();
    if available == 0 {
        return Err(PcapError::Eof);
    }
    if available < 4 {
        return Err(PcapError::Incomplete(4 - available));
    }
    match detect_format(buffer.data()) {
        Some(CaptureFormat::PcapNG) => PcapNGReader::from_buffer(buffer, reader)
            .map(|r| Box::new(r) as Box<dyn PcapReaderIterator + 'b>),
        Some(CaptureFormat::Legacy) => LegacyPcapReader::from_buffer(buffer, reader)
            .map(|r| Box::new(r) as Box<dyn PcapReaderIterator + 'b>),
        None => Err(PcapError::HeaderNotRecognized),
    }
}

/// Read until the buffer holds at least `n` bytes, the buffer is full, or the reader is
/// exhausted. Returns true if the reader is exhausted.
pub(crate) fn fill_at_least<R: Read>(
    buffer: &mut Buffer,
    reader: &mut R,
    n: usize,
) -> Result<bool, PcapError<&'static [u8]>> {
    while buffer.available_data() < n {
        let space = buffer.space();
        if space.is_empty() {
            return Ok(false);
        }
        let sz = reader.read(space).map_err(read_error)?;
        if sz == 0 {
            return Ok(true);
        }
        buffer.fill(sz);
    }
    Ok(false)
}

pub(crate) fn read_error<I>(e: io::Error) -> PcapError<I> {
    tracing::debug!(error = %e, "read from capture source failed");
    PcapError::ReadError(e.kind())
}

pub(crate) fn incomplete_error(n: Needed) -> PcapError<&'static [u8]> {
    match n {
        Needed::Size(n) => PcapError::Incomplete(n.into()),
        Needed::Unknown => PcapError::Incomplete(0),
    }
}
