use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::capture::{
    CaptureError, CaptureWriter, Encapsulation, InterfaceDescriptor, OutputHeader, OutputWriter,
    Record,
};
use crate::compression::Compression;
use crate::file_type::FileType;
use crate::pcap::DEFAULT_SNAPLEN;
use crate::pcapng::{OptionCode, PcapNGOption};

use super::{MergeError, OutputDestination};

/// Section header options copied from the first pcapng input
const COPIED_SECTION_OPTIONS: &[OptionCode] = &[
    OptionCode::Comment,
    OptionCode::ShbHardware,
    OptionCode::ShbOs,
];

/// Snapshot length of a pcap output: the configured one, else the largest of the inputs
pub fn output_snaplen(snap_length: u32, inputs: &[InterfaceDescriptor]) -> u32 {
    if snap_length > 0 {
        return snap_length;
    }
    match inputs.iter().map(|i| i.snaplen).max() {
        Some(max) if max > 0 => max,
        _ => DEFAULT_SNAPLEN,
    }
}

/// Section header options of a pcapng output
pub fn output_section_options(
    app_name: &str,
    first_section: Option<&[PcapNGOption<'static>]>,
) -> Vec<PcapNGOption<'static>> {
    let mut options: Vec<PcapNGOption<'static>> = first_section
        .unwrap_or(&[])
        .iter()
        .filter(|o| COPIED_SECTION_OPTIONS.contains(&o.code))
        .cloned()
        .collect();
    options.extend(PcapNGOption::new_str(OptionCode::ShbUserAppl, app_name));
    options
}

/// State of the output, once its header is written
#[derive(Debug, Clone, PartialEq)]
pub struct OutputState {
    pub encapsulation: Encapsulation,
    pub interfaces: Vec<InterfaceDescriptor>,
    /// Number of records written
    pub records: u64,
}

enum Destination {
    File(BufWriter<File>),
    Stdout(BufWriter<io::Stdout>),
}

impl Destination {
    /// Flush buffers, and sync files to disk
    fn close(self) -> io::Result<()> {
        match self {
            Destination::File(w) => w.into_inner().map_err(|e| e.into_error())?.sync_all(),
            Destination::Stdout(mut w) => w.flush(),
        }
    }
}

impl Write for Destination {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Destination::File(w) => w.write(buf),
            Destination::Stdout(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Destination::File(w) => w.flush(),
            Destination::Stdout(w) => w.flush(),
        }
    }
}

/// The merged capture being written
pub struct OutputSink {
    destination: OutputDestination,
    writer: OutputWriter<Destination>,
    state: OutputState,
}

impl OutputSink {
    /// Create the output and write its header
    ///
    /// If the file type can't hold the encapsulation, no file is created. If writing the header
    /// fails, the file is removed.
    pub fn open(
        destination: &OutputDestination,
        compression: Compression,
        header: OutputHeader,
    ) -> Result<Self, MergeError> {
        let open_error = |source: CaptureError| MergeError::Open {
            path: destination
                .path()
                .map_or_else(|| PathBuf::from("-"), |p| p.to_path_buf()),
            source,
        };
        if !writable_encapsulation(header.file_type, header.encapsulation) {
            return Err(open_error(CaptureError::UnsupportedEncapsulation {
                file_type: header.file_type.name(),
                encapsulation: header.encapsulation,
            }));
        }
        let sink = match destination {
            OutputDestination::Path(p) => {
                let file = File::create(p).map_err(|e| open_error(e.into()))?;
                Destination::File(BufWriter::new(file))
            }
            OutputDestination::Stdout => Destination::Stdout(BufWriter::new(io::stdout())),
        };
        let writer = match OutputWriter::new(sink, compression, &header) {
            Ok(w) => w,
            Err(e) => {
                if let Some(p) = destination.path() {
                    let _ = fs::remove_file(p);
                }
                return Err(open_error(e));
            }
        };
        tracing::info!(
            destination = %destination,
            file_type = %header.file_type,
            compression = %compression,
            interfaces = header.interfaces.len(),
            "opened output"
        );
        Ok(OutputSink {
            destination: destination.clone(),
            writer,
            state: OutputState {
                encapsulation: header.encapsulation,
                interfaces: header.interfaces,
                records: 0,
            },
        })
    }

    pub fn state(&self) -> &OutputState {
        &self.state
    }

    pub fn append(&mut self, record: &Record) -> Result<(), MergeError> {
        self.writer
            .write_record(record)
            .map_err(|source| MergeError::Write {
                destination: self.destination.clone(),
                source,
            })?;
        self.state.records += 1;
        Ok(())
    }

    /// Write the end of the compression stream and close the output
    pub fn finalize(self) -> Result<OutputState, MergeError> {
        let destination = self.destination;
        let write_error = |source: CaptureError| MergeError::Write {
            destination: destination.clone(),
            source,
        };
        let out = self.writer.finish().map_err(write_error)?;
        out.close().map_err(|e| write_error(e.into()))?;
        tracing::debug!(records = self.state.records, "output finalized");
        Ok(self.state)
    }
}

fn writable_encapsulation(file_type: FileType, encapsulation: Encapsulation) -> bool {
    file_type.supports_per_record_encapsulation() || matches!(encapsulation, Encapsulation::Link(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureFile, CaptureReader};
    use crate::linktype::Linktype;

    #[test]
    fn snaplen_selection() {
        let mut a = InterfaceDescriptor::for_pcap(0, Linktype::ETHERNET, 1500, false);
        let b = InterfaceDescriptor::for_pcap(1, Linktype::ETHERNET, 9000, false);
        assert_eq!(output_snaplen(96, &[a.clone(), b.clone()]), 96);
        assert_eq!(output_snaplen(0, &[a.clone(), b]), 9000);
        a.snaplen = 0;
        assert_eq!(output_snaplen(0, &[a]), DEFAULT_SNAPLEN);
        assert_eq!(output_snaplen(0, &[]), DEFAULT_SNAPLEN);
    }

    #[test]
    fn section_options_copied() {
        let first = vec![
            PcapNGOption::new_str(OptionCode::ShbHardware, "x86_64").expect("option"),
            PcapNGOption::new_str(OptionCode::ShbUserAppl, "dumpcap").expect("option"),
            PcapNGOption::comment("lab capture").expect("option"),
        ];
        let options = output_section_options("merger 1.0", Some(&first[..]));
        let codes: Vec<_> = options.iter().map(|o| o.code).collect();
        assert_eq!(
            codes,
            vec![
                OptionCode::ShbHardware,
                OptionCode::Comment,
                OptionCode::ShbUserAppl
            ]
        );
        assert_eq!(options[2].as_str(), Ok("merger 1.0"));
        assert_eq!(output_section_options("m", None).len(), 1);
    }

    #[test]
    fn mixed_encapsulation_needs_pcapng() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.pcap");
        let header = OutputHeader {
            file_type: FileType::Pcap,
            encapsulation: Encapsulation::PerRecord,
            snaplen: 0,
            interfaces: Vec::new(),
            section_options: Vec::new(),
        };
        let res = OutputSink::open(
            &OutputDestination::Path(path.clone()),
            Compression::None,
            header,
        );
        assert!(matches!(res, Err(MergeError::Open { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn finalize_empty_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.pcapng");
        let eth = InterfaceDescriptor::for_pcap(0, Linktype::ETHERNET, 1500, false);
        let header = OutputHeader {
            file_type: FileType::PcapNg,
            encapsulation: Encapsulation::Link(Linktype::ETHERNET),
            snaplen: 0,
            interfaces: vec![eth],
            section_options: output_section_options("test", None),
        };
        let sink = OutputSink::open(
            &OutputDestination::Path(path.clone()),
            Compression::None,
            header,
        )
        .expect("open");
        assert_eq!(sink.state().records, 0);
        let state = sink.finalize().expect("finalize");
        assert_eq!(state.interfaces.len(), 1);
        let mut capture = CaptureFile::open(0, &path).expect("read back");
        assert_eq!(capture.interfaces().len(), 1);
        assert!(capture.next_record().expect("read").is_none());
    }
}
