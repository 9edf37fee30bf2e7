use std::fmt;

use crate::pcap::{PcapHeader, PCAP_MAGIC, PCAP_MODIFIED_MAGIC, PCAP_NSEC_MAGIC};

/// Capture container format of an input or output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// libpcap, microsecond timestamps
    Pcap,
    /// libpcap, nanosecond timestamps
    PcapNsec,
    /// Kuznetzov's modified libpcap
    ModifiedPcap,
    /// pcapng
    PcapNg,
}

impl FileType {
    pub const ALL: [FileType; 4] = [
        FileType::Pcap,
        FileType::PcapNsec,
        FileType::ModifiedPcap,
        FileType::PcapNg,
    ];

    /// Look up a file type by its short name (`pcap`, `nsecpcap`, `modpcap`, `pcapng`)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Short name of the file type
    pub fn name(&self) -> &'static str {
        match self {
            FileType::Pcap => "pcap",
            FileType::PcapNsec => "nsecpcap",
            FileType::ModifiedPcap => "modpcap",
            FileType::PcapNg => "pcapng",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            FileType::Pcap => "Wireshark/tcpdump/... - pcap",
            FileType::PcapNsec => "Wireshark/tcpdump/... - nanosecond pcap",
            FileType::ModifiedPcap => "Modified tcpdump - pcap",
            FileType::PcapNg => "Wireshark/... - pcapng",
        }
    }

    /// True if the format stores a table of interface descriptions
    pub fn supports_interfaces(&self) -> bool {
        matches!(self, FileType::PcapNg)
    }

    /// True if the format can store records of different link types
    pub fn supports_per_record_encapsulation(&self) -> bool {
        matches!(self, FileType::PcapNg)
    }

    /// True if files of this type can be written compressed
    pub fn can_compress(&self) -> bool {
        !matches!(self, FileType::ModifiedPcap)
    }

    /// File type of a legacy pcap input, given its header
    pub fn from_pcap_header(header: &PcapHeader) -> Self {
        if header.is_modified_format() {
            FileType::ModifiedPcap
        } else if header.is_nanosecond_precision() {
            FileType::PcapNsec
        } else {
            FileType::Pcap
        }
    }

    /// Magic number of the legacy pcap header, `None` for pcapng
    pub fn pcap_magic(&self) -> Option<u32> {
        match self {
            FileType::Pcap => Some(PCAP_MAGIC),
            FileType::PcapNsec => Some(PCAP_NSEC_MAGIC),
            FileType::ModifiedPcap => Some(PCAP_MODIFIED_MAGIC),
            FileType::PcapNg => None,
        }
    }
}

impl Default for FileType {
    fn default() -> Self {
        FileType::PcapNg
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Linktype;

    #[test]
    fn names() {
        for t in FileType::ALL.iter() {
            assert_eq!(FileType::from_name(t.name()), Some(*t));
        }
        assert_eq!(FileType::from_name("erf"), None);
        assert_eq!(FileType::default(), FileType::PcapNg);
    }

    #[test]
    fn capabilities() {
        assert!(FileType::PcapNg.supports_interfaces());
        assert!(!FileType::Pcap.supports_interfaces());
        assert!(FileType::PcapNsec.can_compress());
        assert!(!FileType::ModifiedPcap.can_compress());
    }

    #[test]
    fn from_header() {
        let hdr = PcapHeader::with_magic(PCAP_NSEC_MAGIC, 0, Linktype::RAW);
        assert_eq!(FileType::from_pcap_header(&hdr), FileType::PcapNsec);
        let hdr = PcapHeader::with_magic(PCAP_MODIFIED_MAGIC, 0, Linktype::RAW);
        assert_eq!(FileType::from_pcap_header(&hdr), FileType::ModifiedPcap);
    }
}
