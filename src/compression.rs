//! Compression detection, decompression of inputs and compression of the output stream.
//!
//! Inputs are decompressed transparently: the format is detected from the first bytes of the
//! stream. The output can be written as gzip or LZ4 frames; zstd streams can be read but not
//! written.

use std::fmt;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

/// Compression of a capture stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// No compression
    None,
    /// Gzip (.gz)
    Gzip,
    /// Zstandard (.zst)
    Zstd,
    /// LZ4 frame format (.lz4)
    Lz4,
}

impl Compression {
    pub const ALL: [Compression; 4] = [
        Compression::None,
        Compression::Gzip,
        Compression::Zstd,
        Compression::Lz4,
    ];

    /// Detect compression format from magic bytes.
    pub fn detect(data: &[u8]) -> Self {
        match data {
            // Gzip: 1f 8b
            [0x1f, 0x8b, ..] => Compression::Gzip,
            // Zstd: 28 b5 2f fd
            [0x28, 0xb5, 0x2f, 0xfd, ..] => Compression::Zstd,
            // LZ4 frame: 04 22 4d 18
            [0x04, 0x22, 0x4d, 0x18, ..] => Compression::Lz4,
            _ => Compression::None,
        }
    }

    /// Look up a compression by name
    ///
    /// Accepted names are those printed by `Display`, plus `uncompressed` for `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "uncompressed" => Some(Compression::None),
            _ => Self::ALL.iter().copied().find(|c| c.name() == name),
        }
    }

    /// Infer the compression from the extension of a file name
    ///
    /// Only the part after the last `.` is considered. Returns `None` if the extension is not
    /// one of a compression format.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.extension().map_or(false, |e| e.eq_ignore_ascii_case(ext)))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Zstd => "zstd",
            Compression::Lz4 => "lz4",
        }
    }

    /// Get the typical file extension for this compression format.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some("gz"),
            Compression::Zstd => Some("zst"),
            Compression::Lz4 => Some("lz4"),
        }
    }

    /// Check if this represents compressed data.
    pub fn is_compressed(&self) -> bool {
        !matches!(self, Compression::None)
    }

    /// True if output streams can be written with this compression
    pub fn can_write(&self) -> bool {
        !matches!(self, Compression::Zstd)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stream whose first bytes were read ahead to detect its compression
pub type PeekedReader<R> = io::Chain<Cursor<Vec<u8>>, R>;

/// Unified decompression reader that wraps various decompression formats.
///
/// Uses enum dispatch rather than trait objects. The `Read` implementation simply
/// delegates to the inner decoder.
pub enum DecompressReader<R: Read> {
    /// No compression - pass-through
    None(R),
    /// Gzip decompression, reading every member of a concatenated stream
    Gzip(MultiGzDecoder<R>),
    /// Zstandard decompression
    Zstd(zstd::Decoder<'static, io::BufReader<R>>),
    /// LZ4 frame decompression
    Lz4(lz4_flex::frame::FrameDecoder<R>),
}

impl<R: Read> DecompressReader<R> {
    /// Create a decompression reader with explicit compression format.
    pub fn new(source: R, compression: Compression) -> io::Result<Self> {
        match compression {
            Compression::None => Ok(DecompressReader::None(source)),
            Compression::Gzip => Ok(DecompressReader::Gzip(MultiGzDecoder::new(source))),
            Compression::Zstd => {
                let decoder = zstd::Decoder::new(source)?;
                Ok(DecompressReader::Zstd(decoder))
            }
            Compression::Lz4 => {
                let decoder = lz4_flex::frame::FrameDecoder::new(source);
                Ok(DecompressReader::Lz4(decoder))
            }
        }
    }

    /// Get the compression format this reader handles.
    pub fn compression(&self) -> Compression {
        match self {
            DecompressReader::None(_) => Compression::None,
            DecompressReader::Gzip(_) => Compression::Gzip,
            DecompressReader::Zstd(_) => Compression::Zstd,
            DecompressReader::Lz4(_) => Compression::Lz4,
        }
    }
}

impl<R: Read> DecompressReader<PeekedReader<R>> {
    /// Read the first bytes of `source`, detect its compression and wrap it in a decoder
    ///
    /// The bytes read ahead are replayed to the decoder.
    pub fn detect(mut source: R) -> io::Result<Self> {
        let mut magic = Vec::with_capacity(4);
        source.by_ref().take(4).read_to_end(&mut magic)?;
        let compression = Compression::detect(&magic);
        DecompressReader::new(Cursor::new(magic).chain(source), compression)
    }
}

impl<R: Read> Read for DecompressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DecompressReader::None(r) => r.read(buf),
            DecompressReader::Gzip(r) => r.read(buf),
            DecompressReader::Zstd(r) => r.read(buf),
            DecompressReader::Lz4(r) => r.read(buf),
        }
    }
}

/// Compressing writer for the output stream
///
/// `finish` must be called to write the compression trailer.
pub enum CompressWriter<W: Write> {
    None(W),
    Gzip(GzEncoder<W>),
    Lz4(lz4_flex::frame::FrameEncoder<W>),
}

impl<W: Write> CompressWriter<W> {
    /// Wrap `sink` in an encoder. Returns `None` if the compression cannot be written.
    pub fn new(sink: W, compression: Compression) -> Option<Self> {
        match compression {
            Compression::None => Some(CompressWriter::None(sink)),
            Compression::Gzip => Some(CompressWriter::Gzip(GzEncoder::new(
                sink,
                flate2::Compression::default(),
            ))),
            Compression::Lz4 => Some(CompressWriter::Lz4(lz4_flex::frame::FrameEncoder::new(
                sink,
            ))),
            Compression::Zstd => None,
        }
    }

    pub fn compression(&self) -> Compression {
        match self {
            CompressWriter::None(_) => Compression::None,
            CompressWriter::Gzip(_) => Compression::Gzip,
            CompressWriter::Lz4(_) => Compression::Lz4,
        }
    }

    /// Flush the encoder, write the stream trailer and return the inner writer
    pub fn finish(self) -> io::Result<W> {
        match self {
            CompressWriter::None(mut w) => {
                w.flush()?;
                Ok(w)
            }
            CompressWriter::Gzip(e) => e.finish(),
            CompressWriter::Lz4(e) => e
                .finish()
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e)),
        }
    }
}

impl<W: Write> Write for CompressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            CompressWriter::None(w) => w.write(buf),
            CompressWriter::Gzip(w) => w.write(buf),
            CompressWriter::Lz4(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            CompressWriter::None(w) => w.flush(),
            CompressWriter::Gzip(w) => w.flush(),
            CompressWriter::Lz4(w) => w.flush(),
        }
    }
}
