//! Output interface table
//!
//! The reconciler combines the interfaces of all inputs into the interface table of the output,
//! and builds the table used to rewrite the interface index of each record.

use crate::capture::InterfaceDescriptor;
use crate::file_type::FileType;

use super::IdbMergeMode;

/// Maps (input, interface index in the input) to the interface index in the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceRemapTable {
    /// The output has no interface table
    Dropped,
    /// Output index of each interface, per input
    Table(Vec<Vec<u32>>),
}

impl InterfaceRemapTable {
    /// Output index of an input interface. `None` if interfaces are dropped or the interface is
    /// not known.
    pub fn lookup(&self, input: usize, if_id: u32) -> Option<u32> {
        match self {
            InterfaceRemapTable::Dropped => None,
            InterfaceRemapTable::Table(t) => t.get(input)?.get(if_id as usize).copied(),
        }
    }
}

/// Output of the reconciler
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledInterfaces {
    /// Output interface table. `input` and `index` give the first input interface merged into
    /// each entry.
    pub interfaces: Vec<InterfaceDescriptor>,
    pub remap: InterfaceRemapTable,
}

/// Two inputs describe interface `interface` differently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceConflict {
    pub interface: u32,
    pub first_input: usize,
    pub conflicting_input: usize,
}

/// Build the output interface table
///
/// `interfaces` holds the interfaces of all inputs, in input order, tagged with their input
/// index.
pub fn reconcile(
    policy: IdbMergeMode,
    file_type: FileType,
    interfaces: &[InterfaceDescriptor],
    inputs: usize,
) -> Result<ReconciledInterfaces, InterfaceConflict> {
    let mut remap: Vec<Vec<u32>> = vec![Vec::new(); inputs];
    let mut output: Vec<InterfaceDescriptor> = Vec::new();
    match policy {
        IdbMergeMode::None if !file_type.supports_interfaces() => {
            return Ok(ReconciledInterfaces {
                interfaces: Vec::new(),
                remap: InterfaceRemapTable::Dropped,
            });
        }
        IdbMergeMode::None => {
            let snaplen = interfaces.iter().map(|i| i.snaplen).max().unwrap_or(0);
            for iface in interfaces {
                let idx = match output.iter().position(|o| o.linktype == iface.linktype) {
                    Some(idx) => idx,
                    None => {
                        output.push(InterfaceDescriptor {
                            input: iface.input,
                            index: iface.index,
                            linktype: iface.linktype,
                            snaplen,
                            tsresol: 9,
                            tsoffset: 0,
                            options: Vec::new(),
                        });
                        output.len() - 1
                    }
                };
                push_remap(&mut remap, iface, idx);
            }
        }
        IdbMergeMode::AllDistinct => {
            for iface in interfaces {
                output.push(iface.clone());
                push_remap(&mut remap, iface, output.len() - 1);
            }
        }
        IdbMergeMode::AllSame => {
            for iface in interfaces {
                let idx = iface.index as usize;
                match output.get(idx) {
                    Some(known) if known.same_metadata(iface) => (),
                    Some(known) => {
                        return Err(InterfaceConflict {
                            interface: iface.index,
                            first_input: known.input,
                            conflicting_input: iface.input,
                        });
                    }
                    // interfaces of an input are numbered from 0, so this is the next entry
                    None => output.push(iface.clone()),
                }
                push_remap(&mut remap, iface, idx);
            }
        }
        IdbMergeMode::AnySame => {
            // output entries already used by the current input
            let mut claimed: Vec<bool> = Vec::new();
            let mut current_input = None;
            for iface in interfaces {
                if current_input != Some(iface.input) {
                    current_input = Some(iface.input);
                    claimed = vec![false; output.len()];
                }
                let found = output
                    .iter()
                    .enumerate()
                    .position(|(j, o)| !claimed[j] && o.same_metadata(iface));
                let idx = match found {
                    Some(idx) => idx,
                    None => {
                        output.push(iface.clone());
                        claimed.push(false);
                        output.len() - 1
                    }
                };
                claimed[idx] = true;
                push_remap(&mut remap, iface, idx);
            }
        }
    }
    tracing::debug!(
        policy = %policy,
        inputs = interfaces.len(),
        outputs = output.len(),
        "reconciled interfaces"
    );
    Ok(ReconciledInterfaces {
        interfaces: output,
        remap: InterfaceRemapTable::Table(remap),
    })
}

fn push_remap(remap: &mut [Vec<u32>], iface: &InterfaceDescriptor, output_index: usize) {
    if let Some(table) = remap.get_mut(iface.input) {
        table.push(output_index as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linktype::Linktype;
    use crate::pcapng::PcapNGOption;

    fn iface(input: usize, index: u32, linktype: Linktype, name: &str) -> InterfaceDescriptor {
        let mut d = InterfaceDescriptor::for_pcap(input, linktype, 65535, false);
        d.index = index;
        d.options.push(PcapNGOption::comment(name).expect("option"));
        d
    }

    #[test]
    fn none_without_interface_table() {
        let all = [iface(0, 0, Linktype::ETHERNET, "a")];
        let r = reconcile(IdbMergeMode::None, FileType::Pcap, &all, 1).expect("reconcile");
        assert!(r.interfaces.is_empty());
        assert_eq!(r.remap, InterfaceRemapTable::Dropped);
        assert_eq!(r.remap.lookup(0, 0), None);
    }

    #[test]
    fn none_one_interface_per_linktype() {
        let mut big = iface(1, 0, Linktype::RAW, "c");
        big.snaplen = 262_144;
        let all = [
            iface(0, 0, Linktype::ETHERNET, "a"),
            iface(0, 1, Linktype::ETHERNET, "b"),
            big,
        ];
        let r = reconcile(IdbMergeMode::None, FileType::PcapNg, &all, 2).expect("reconcile");
        assert_eq!(r.interfaces.len(), 2);
        assert_eq!(r.interfaces[1].linktype, Linktype::RAW);
        assert!(r.interfaces.iter().all(|i| i.options.is_empty()));
        assert!(r.interfaces.iter().all(|i| i.snaplen == 262_144));
        assert_eq!(r.interfaces[0].tsresol, 9);
        assert_eq!(r.remap.lookup(0, 1), Some(0));
        assert_eq!(r.remap.lookup(1, 0), Some(1));
    }

    #[test]
    fn all_distinct_offsets() {
        let all = [
            iface(0, 0, Linktype::ETHERNET, "a"),
            iface(0, 1, Linktype::ETHERNET, "b"),
            iface(1, 0, Linktype::ETHERNET, "a"),
        ];
        let r =
            reconcile(IdbMergeMode::AllDistinct, FileType::PcapNg, &all, 2).expect("reconcile");
        assert_eq!(r.interfaces.len(), 3);
        assert_eq!(r.remap.lookup(1, 0), Some(2));
        assert_eq!(r.remap.lookup(1, 1), None);
    }

    #[test]
    fn all_same_unifies() {
        let all = [
            iface(0, 0, Linktype::ETHERNET, "a"),
            iface(1, 0, Linktype::ETHERNET, "a"),
            iface(1, 1, Linktype::RAW, "z"),
        ];
        let r = reconcile(IdbMergeMode::AllSame, FileType::PcapNg, &all, 2).expect("reconcile");
        assert_eq!(r.interfaces.len(), 2);
        assert_eq!(r.interfaces[1].input, 1);
        assert_eq!(r.remap.lookup(1, 0), Some(0));
        assert_eq!(r.remap.lookup(1, 1), Some(1));
    }

    #[test]
    fn all_same_conflict() {
        let all = [
            iface(0, 0, Linktype::ETHERNET, "a"),
            iface(1, 0, Linktype::ETHERNET, "a"),
            iface(2, 0, Linktype::ETHERNET, "other"),
        ];
        let err = reconcile(IdbMergeMode::AllSame, FileType::PcapNg, &all, 3)
            .expect_err("conflict");
        assert_eq!(
            err,
            InterfaceConflict {
                interface: 0,
                first_input: 0,
                conflicting_input: 2
            }
        );
    }

    #[test]
    fn any_same_collapses_identical() {
        let all = [
            iface(0, 0, Linktype::ETHERNET, "a"),
            iface(0, 1, Linktype::ETHERNET, "b"),
            iface(1, 0, Linktype::ETHERNET, "b"),
            iface(1, 1, Linktype::ETHERNET, "c"),
            iface(2, 0, Linktype::ETHERNET, "a"),
        ];
        let r = reconcile(IdbMergeMode::AnySame, FileType::PcapNg, &all, 3).expect("reconcile");
        assert_eq!(r.interfaces.len(), 3);
        assert_eq!(r.remap.lookup(1, 0), Some(1));
        assert_eq!(r.remap.lookup(1, 1), Some(2));
        assert_eq!(r.remap.lookup(2, 0), Some(0));
    }

    #[test]
    fn any_same_keeps_duplicates_of_one_input() {
        // two identical interfaces in the same input stay distinct
        let all = [
            iface(0, 0, Linktype::ETHERNET, "a"),
            iface(0, 1, Linktype::ETHERNET, "a"),
            iface(1, 0, Linktype::ETHERNET, "a"),
            iface(1, 1, Linktype::ETHERNET, "a"),
            iface(1, 2, Linktype::ETHERNET, "a"),
        ];
        let r = reconcile(IdbMergeMode::AnySame, FileType::PcapNg, &all, 2).expect("reconcile");
        assert_eq!(r.interfaces.len(), 3);
        assert_eq!(r.remap.lookup(1, 1), Some(1));
        assert_eq!(r.remap.lookup(1, 2), Some(2));
    }
}
