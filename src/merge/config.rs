use std::fmt;
use std::path::{Path, PathBuf};

use crate::compression::Compression;
use crate::file_type::FileType;

use super::ConfigError;

/// Default `shb_userappl` of pcapng outputs
pub const DEFAULT_APP_NAME: &str = concat!("pcap-merge ", env!("CARGO_PKG_VERSION"));

/// Order in which records are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// All records of the first input, then all records of the second, etc.
    Concatenate,
    /// Records of all inputs sorted by timestamp
    TimestampMerge,
}

impl Default for MergeMode {
    fn default() -> Self {
        MergeMode::TimestampMerge
    }
}

/// How interface descriptions of the inputs are combined into the output interface table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdbMergeMode {
    /// The output has no interface description. A pcapng output gets one interface per link
    /// type.
    None,
    /// Every input interface gets its own output interface
    AllDistinct,
    /// Interface `k` of every input is the same interface, and must have the same description
    AllSame,
    /// Identical interfaces are merged, other interfaces are kept distinct
    AnySame,
}

impl IdbMergeMode {
    pub const ALL: [IdbMergeMode; 4] = [
        IdbMergeMode::None,
        IdbMergeMode::AllDistinct,
        IdbMergeMode::AllSame,
        IdbMergeMode::AnySame,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IdbMergeMode::None => "none",
            IdbMergeMode::AllDistinct => "all-distinct",
            IdbMergeMode::AllSame => "all",
            IdbMergeMode::AnySame => "any",
        }
    }

    /// Look up a mode by name. `all-same` and `any-same` are accepted as aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all-same" => Some(IdbMergeMode::AllSame),
            "any-same" => Some(IdbMergeMode::AnySame),
            _ => Self::ALL.iter().copied().find(|m| m.name() == name),
        }
    }
}

impl fmt::Display for IdbMergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the merged capture is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDestination {
    Path(PathBuf),
    Stdout,
}

impl OutputDestination {
    /// Parse a command-line argument: `-` is the standard output
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            OutputDestination::Stdout
        } else {
            OutputDestination::Path(PathBuf::from(arg))
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            OutputDestination::Path(p) => Some(p),
            OutputDestination::Stdout => None,
        }
    }
}

impl Default for OutputDestination {
    fn default() -> Self {
        OutputDestination::Stdout
    }
}

impl fmt::Display for OutputDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputDestination::Path(p) => write!(f, "{}", p.display()),
            OutputDestination::Stdout => f.write_str("standard output"),
        }
    }
}

/// Options of a merge run
#[derive(Debug, Clone, Default)]
pub struct MergeConfig {
    pub inputs: Vec<PathBuf>,
    pub output: OutputDestination,
    pub mode: MergeMode,
    /// Maximum captured length of output records, 0 for no limit
    pub snap_length: u32,
    /// `None` selects the default policy of the output file type
    pub interface_policy: Option<IdbMergeMode>,
    pub file_type: FileType,
    /// `None` infers the compression from the output file name
    pub compression: Option<Compression>,
    /// Application name written in the pcapng section header, defaults to [`DEFAULT_APP_NAME`]
    pub app_name: Option<String>,
}

/// Settings derived from a [`MergeConfig`] once it is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePlan {
    pub policy: IdbMergeMode,
    pub compression: Compression,
}

impl MergeConfig {
    pub fn new<I, P>(inputs: I, output: OutputDestination) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        MergeConfig {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output,
            ..MergeConfig::default()
        }
    }

    /// Check the inputs and the output format, and resolve default settings
    ///
    /// No file is opened.
    pub fn validate(&self) -> Result<MergePlan, ConfigError> {
        if self.inputs.is_empty() {
            return Err(ConfigError::NoInputs);
        }
        if self.inputs.iter().any(|p| p.as_os_str() == "-") {
            return Err(ConfigError::StdinInput);
        }
        self.validate_output()
    }

    /// Check the output settings only, for inputs opened by the caller
    pub fn validate_output(&self) -> Result<MergePlan, ConfigError> {
        let compression = self.output_compression();
        if !compression.can_write() {
            return Err(ConfigError::UnwritableCompression(compression));
        }
        if compression.is_compressed() && !self.file_type.can_compress() {
            return Err(ConfigError::CompressionNotSupported {
                file_type: self.file_type,
                compression,
            });
        }
        Ok(MergePlan {
            policy: self.resolve_policy()?,
            compression,
        })
    }

    /// Explicit compression, or the one given by the output file extension
    pub fn output_compression(&self) -> Compression {
        self.compression
            .or_else(|| self.output.path().and_then(Compression::from_extension))
            .unwrap_or(Compression::None)
    }

    fn resolve_policy(&self) -> Result<IdbMergeMode, ConfigError> {
        match self.interface_policy {
            Some(_) if !self.file_type.supports_interfaces() => {
                Err(ConfigError::PolicyNotSupported(self.file_type))
            }
            Some(policy) => Ok(policy),
            None if self.file_type.supports_interfaces() => Ok(IdbMergeMode::AllSame),
            None => Ok(IdbMergeMode::None),
        }
    }

    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(output: &str) -> MergeConfig {
        MergeConfig::new(vec!["a.pcap", "b.pcapng"], OutputDestination::from_arg(output))
    }

    #[test]
    fn defaults() {
        let cfg = config("out.pcapng");
        assert_eq!(cfg.mode, MergeMode::TimestampMerge);
        assert_eq!(cfg.file_type, FileType::PcapNg);
        assert_eq!(
            cfg.validate(),
            Ok(MergePlan {
                policy: IdbMergeMode::AllSame,
                compression: Compression::None
            })
        );
        assert!(cfg.app_name().starts_with("pcap-merge "));

        let mut cfg = config("-");
        cfg.file_type = FileType::Pcap;
        assert_eq!(cfg.output, OutputDestination::Stdout);
        assert_eq!(cfg.validate().map(|p| p.policy), Ok(IdbMergeMode::None));
    }

    #[test]
    fn compression_from_extension() {
        let cfg = config("out.pcapng.gz");
        assert_eq!(cfg.output_compression(), Compression::Gzip);
        let mut cfg = config("out.pcapng.gz");
        cfg.compression = Some(Compression::None);
        assert_eq!(cfg.output_compression(), Compression::None);
        assert_eq!(
            config("out.zst").validate(),
            Err(ConfigError::UnwritableCompression(Compression::Zstd))
        );
        let mut cfg = config("out.lz4");
        cfg.file_type = FileType::ModifiedPcap;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::CompressionNotSupported { .. })
        ));
    }

    #[test]
    fn policy_needs_interfaces() {
        let mut cfg = config("out.pcap");
        cfg.file_type = FileType::Pcap;
        cfg.interface_policy = Some(IdbMergeMode::AnySame);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::PolicyNotSupported(FileType::Pcap))
        );
        cfg.file_type = FileType::PcapNg;
        assert_eq!(cfg.validate().map(|p| p.policy), Ok(IdbMergeMode::AnySame));
    }

    #[test]
    fn inputs_checked() {
        let cfg = MergeConfig::new(Vec::<PathBuf>::new(), OutputDestination::Stdout);
        assert_eq!(cfg.validate(), Err(ConfigError::NoInputs));
        let cfg = MergeConfig::new(vec!["a.pcap", "-"], OutputDestination::Stdout);
        assert_eq!(cfg.validate(), Err(ConfigError::StdinInput));
    }

    #[test]
    fn policy_names() {
        for m in IdbMergeMode::ALL.iter() {
            assert_eq!(IdbMergeMode::from_name(m.name()), Some(*m));
        }
        assert_eq!(IdbMergeMode::from_name("any-same"), Some(IdbMergeMode::AnySame));
        assert_eq!(IdbMergeMode::from_name("some"), None);
    }
}
