//! # Merging of PCAP and PCAPNG capture files
//!
//! This crate merges several capture files into one, either by concatenating them or by sorting
//! all records by timestamp. The link-layer encapsulation and the interface descriptions of the
//! inputs are reconciled into the output header, and records can be truncated to a snapshot
//! length. Inputs may be legacy pcap (little or big-endian, micro or nanosecond timestamps,
//! "modified" pcap) or pcapng files, optionally compressed with gzip, zstd or LZ4. The output
//! can be written as pcap, nanosecond pcap, modified pcap or pcapng, optionally compressed with
//! gzip or LZ4.
//!
//! The crate is organized in layers:
//!
//! - a streaming codec: [`LegacyPcapReader`] and [`PcapNGReader`] parse blocks from a circular
//!   buffer, and the [`ToVec`](serialize::ToVec) serializers write them back;
//! - the [`capture`] layer, which reads and writes captures as streams of owned
//!   [`Record`](capture::Record)s;
//! - the [`merge`] module, which runs a merge from a [`MergeConfig`](merge::MergeConfig).
//!
//! # Example: merging files
//!
//! ```rust,no_run
//! use pcap_merge::merge::{merge_files, MergeConfig, MergeMode, NullObserver, OutputDestination};
//!
//! let mut config = MergeConfig::new(
//!     vec!["monday.pcapng", "tuesday.pcap.gz"],
//!     OutputDestination::from_arg("week.pcapng"),
//! );
//! config.mode = MergeMode::TimestampMerge;
//! config.snap_length = 128;
//! let outcome = merge_files(&config, &mut NullObserver).expect("merge failed");
//! println!("{} records", outcome.records());
//! ```
//!
//! # Example: streaming parsers
//!
//! To read the blocks of a capture in either format, use the [`create_reader`] function:
//!
//! ```rust,no_run
//! use pcap_merge::*;
//! use pcap_merge::traits::PcapReaderIterator;
//! use std::fs::File;
//!
//! let file = File::open("capture.pcapng").expect("open");
//! let mut reader = create_reader(65536, file).expect("reader");
//! let mut num_blocks = 0;
//! loop {
//!     match reader.next() {
//!         Ok((offset, _block)) => {
//!             num_blocks += 1;
//!             reader.consume(offset);
//!         }
//!         Err(PcapError::Eof) => break,
//!         Err(PcapError::Incomplete(_)) => {
//!             reader.refill().expect("refill");
//!         }
//!         Err(e) => panic!("error while reading: {:?}", e),
//!     }
//! }
//! println!("num_blocks: {}", num_blocks);
//! ```

mod utils;

mod blocks;
mod endianness;
mod error;
mod linktype;
mod reader;
pub use blocks::*;
pub use error::*;
pub use linktype::*;
pub use reader::*;

pub mod pcap;
pub mod pcapng;
pub use pcap::*;
pub use pcapng::*;

pub mod serialize;
pub mod traits;

pub mod capture;
pub mod compression;
mod file_type;
pub use compression::Compression;
pub use file_type::*;

pub mod merge;
