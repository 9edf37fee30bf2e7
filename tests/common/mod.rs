//! Capture builders shared by the integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use pcap_merge::capture::{
    CaptureFile, CaptureReader, CaptureWriter, Encapsulation, InterfaceDescriptor, OutputHeader,
    OutputWriter, RawTimestamp, Record, Timestamp,
};
use pcap_merge::pcapng::{build_ts_resolution, PcapNGOption};
use pcap_merge::{Compression, FileType, Linktype};

/// A packet to put in a test capture
#[derive(Clone, Debug)]
pub struct Packet {
    pub secs: i64,
    pub nanos: u32,
    pub if_id: u32,
    pub data: Vec<u8>,
    /// Exact timestamp in units of the interface, pcapng only
    pub units: Option<u64>,
}

#[allow(dead_code)]
impl Packet {
    pub fn at(secs: i64) -> Self {
        Packet {
            secs,
            nanos: 0,
            if_id: 0,
            // payload identifies the packet
            data: format!("packet at {}", secs).into_bytes(),
            units: None,
        }
    }

    /// Packet stamped `units` ticks of its interface clock
    pub fn ticks(units: u64) -> Self {
        Packet {
            units: Some(units),
            ..Packet::at(0)
        }
    }

    pub fn sized(secs: i64, len: usize) -> Self {
        Packet {
            data: (0..len).map(|i| i as u8).collect(),
            ..Packet::at(secs)
        }
    }

    pub fn on(mut self, if_id: u32) -> Self {
        self.if_id = if_id;
        self
    }
}

fn to_record(p: &Packet, linktype: Linktype, iface: Option<&InterfaceDescriptor>) -> Record {
    let raw_ts = match (p.units, iface) {
        (Some(units), Some(iface)) => Some(RawTimestamp {
            units,
            resolution: build_ts_resolution(iface.tsresol).expect("tsresol"),
            offset: iface.tsoffset,
        }),
        _ => None,
    };
    Record {
        input: 0,
        ts: raw_ts.map_or(Timestamp::new(p.secs, p.nanos), |r| r.timestamp()),
        origlen: p.data.len() as u32,
        if_id: p.if_id,
        linktype,
        data: p.data.clone(),
        options: Vec::new(),
        encap: None,
        raw_ts,
    }
}

/// Legacy pcap capture, microsecond timestamps
#[allow(dead_code)]
pub fn pcap(linktype: Linktype, packets: &[Packet]) -> Vec<u8> {
    let header = OutputHeader {
        file_type: FileType::Pcap,
        encapsulation: Encapsulation::Link(linktype),
        snaplen: 65535,
        interfaces: Vec::new(),
        section_options: Vec::new(),
    };
    let mut w = OutputWriter::new(Vec::new(), Compression::None, &header).expect("pcap writer");
    for p in packets {
        w.write_record(&to_record(p, linktype, None)).expect("write pcap record");
    }
    w.finish().expect("finish pcap")
}

/// Big-endian legacy pcap capture, microsecond timestamps
#[allow(dead_code)]
pub fn pcap_be(linktype: Linktype, packets: &[Packet]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&0xa1b2_c3d4_u32.to_be_bytes());
    v.extend_from_slice(&2u16.to_be_bytes());
    v.extend_from_slice(&4u16.to_be_bytes());
    v.extend_from_slice(&[0; 8]);
    v.extend_from_slice(&65535u32.to_be_bytes());
    v.extend_from_slice(&(linktype.0 as u32).to_be_bytes());
    for p in packets {
        v.extend_from_slice(&(p.secs as u32).to_be_bytes());
        v.extend_from_slice(&(p.nanos / 1000).to_be_bytes());
        v.extend_from_slice(&(p.data.len() as u32).to_be_bytes());
        v.extend_from_slice(&(p.data.len() as u32).to_be_bytes());
        v.extend_from_slice(&p.data);
    }
    v
}

/// Interface with an `if_name`
#[allow(dead_code)]
pub fn interface(linktype: Linktype, name: &str) -> InterfaceDescriptor {
    let mut d = InterfaceDescriptor::for_pcap(0, linktype, 65535, true);
    d.options.push(
        PcapNGOption::new_str(pcap_merge::pcapng::OptionCode::IfName, name).expect("if_name"),
    );
    d
}

/// pcapng capture with the given interfaces
#[allow(dead_code)]
pub fn pcapng(interfaces: &[InterfaceDescriptor], packets: &[Packet]) -> Vec<u8> {
    let header = OutputHeader {
        file_type: FileType::PcapNg,
        encapsulation: Encapsulation::of_interfaces(interfaces),
        snaplen: 0,
        interfaces: interfaces.to_vec(),
        section_options: vec![PcapNGOption::new_str(
            pcap_merge::pcapng::OptionCode::ShbUserAppl,
            "test builder",
        )
        .expect("shb_userappl")],
    };
    let mut w =
        OutputWriter::new(Vec::new(), Compression::None, &header).expect("pcapng writer");
    for p in packets {
        let iface = &interfaces[p.if_id as usize];
        w.write_record(&to_record(p, iface.linktype, Some(iface)))
            .expect("write pcapng record");
    }
    w.finish().expect("finish pcapng")
}

/// Write `data` to `dir/name`
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).expect("write test capture");
    path
}

/// Open a capture and read all its records
#[allow(dead_code)]
pub fn read_capture(path: &Path) -> (CaptureFile<'static>, Vec<Record>) {
    let mut capture = CaptureFile::open(0, path).expect("open output");
    let mut records = Vec::new();
    while let Some(r) = capture.next_record().expect("read output") {
        records.push(r);
    }
    (capture, records)
}

/// Seconds of the timestamps of `records`
#[allow(dead_code)]
pub fn seconds(records: &[Record]) -> Vec<i64> {
    records.iter().map(|r| r.ts.secs).collect()
}
