use crate::blocks::PcapBlockOwned;
use crate::error::PcapError;

/// Streaming iterator over pcap or pcapng blocks
///
/// Implementors are based on a circular buffer, so memory usage is constant and
/// captures of any size can be read. No block returned by `next` may be kept
/// across a call to `consume` or `refill`: blocks borrow the buffer.
///
/// Each call to `next` returns the next block and must be followed by a call to
/// `consume` to advance. `next` returns `PcapError::Incomplete` when the buffer
/// holds a partial block; call `refill` and retry.
pub trait PcapReaderIterator {
    /// Get the next block. Returns the number of bytes it spans and the block.
    fn next(&mut self) -> Result<(usize, PcapBlockOwned), PcapError<&[u8]>>;
    /// Consume data, shifting the buffer if needed.
    fn consume(&mut self, offset: usize);
    /// Consume data without shifting the buffer. Blocks already read remain valid.
    fn consume_noshift(&mut self, offset: usize);
    /// Number of bytes consumed since the start of the stream
    fn consumed(&self) -> usize;
    /// Refill the internal buffer, shifting it if necessary.
    fn refill(&mut self) -> Result<(), PcapError<&[u8]>>;
    /// Position in the internal buffer
    fn position(&self) -> usize;
    /// Grow the internal buffer. Returns false if the new size is not larger.
    fn grow(&mut self, new_size: usize) -> bool;
    /// Capacity of the internal buffer
    fn capacity(&self) -> usize;
    /// All data currently available in the buffer
    fn data(&self) -> &[u8];
    /// True if the underlying reader is exhausted
    ///
    /// Unconsumed data may still remain in the buffer.
    fn reader_exhausted(&self) -> bool;
}

/// Common accessors for pcapng blocks carrying a packet (EPB, SPB)
pub trait PcapNGPacketBlock {
    /// True if the block was encoded as big-endian
    fn big_endian(&self) -> bool;
    /// True if the packet was truncated at capture time
    fn truncated(&self) -> bool;
    /// Length of the packet on the wire
    fn orig_len(&self) -> u32;
    /// Block payload, including padding
    fn raw_packet_data(&self) -> &[u8];
    /// Captured packet bytes, without padding
    fn packet_data(&self) -> &[u8];
}
