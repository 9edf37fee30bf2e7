use std::path::PathBuf;

use thiserror::Error;

use crate::capture::CaptureError;
use crate::compression::Compression;
use crate::file_type::FileType;

use super::OutputDestination;

/// Invalid merge settings, detected before any file is opened
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no input files were specified")]
    NoInputs,

    #[error("reading from the standard input is not supported")]
    StdinInput,

    #[error("output files can't be written as {0}")]
    UnwritableCompression(Compression),

    #[error("the file format {file_type} can't be written to output compressed format ({compression})")]
    CompressionNotSupported {
        file_type: FileType,
        compression: Compression,
    },

    #[error("the IDB merge mode can only be used with an output format that identifies interfaces, not {0}")]
    PolicyNotSupported(FileType),
}

/// Failure of a merge run
#[derive(Debug, Error)]
pub enum MergeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("can't open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: CaptureError,
    },

    #[error("error reading {} at offset {offset}: {source}", .path.display())]
    Read {
        path: PathBuf,
        offset: u64,
        source: CaptureError,
    },

    #[error(
        "interface {interface} of {} differs from interface {interface} of {}",
        .conflicting_input.display(),
        .first_input.display()
    )]
    IncompatibleInterfaces {
        interface: u32,
        first_input: PathBuf,
        conflicting_input: PathBuf,
    },

    #[error("error writing {destination}: {source}")]
    Write {
        destination: OutputDestination,
        source: CaptureError,
    },
}
