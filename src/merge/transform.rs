use crate::capture::{Encapsulation, Record};

use super::InterfaceRemapTable;

/// Per-record rewriting: snapshot length, interface index, encapsulation tag
#[derive(Debug, Clone)]
pub struct RecordTransformer {
    snaplen: u32,
    remap: InterfaceRemapTable,
    per_record: bool,
}

impl RecordTransformer {
    pub fn new(snaplen: u32, remap: InterfaceRemapTable, encapsulation: Encapsulation) -> Self {
        RecordTransformer {
            snaplen,
            remap,
            per_record: encapsulation == Encapsulation::PerRecord,
        }
    }

    pub fn apply(&self, mut record: Record) -> Record {
        if self.snaplen > 0 && record.data.len() > self.snaplen as usize {
            record.data.truncate(self.snaplen as usize);
        }
        record.if_id = self.remap.lookup(record.input, record.if_id).unwrap_or(0);
        if self.per_record {
            record.encap = Some(record.linktype);
        }
        record
    }
}
