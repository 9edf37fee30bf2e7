use crate::pcap::{LegacyPcapBlock, PcapHeader};
use crate::pcapng::Block;

/// A block from a Pcap or PcapNG file, as returned by the streaming readers
#[derive(Debug)]
pub enum PcapBlockOwned<'a> {
    Legacy(LegacyPcapBlock<'a>),
    LegacyHeader(PcapHeader),
    NG(Block<'a>),
}

impl<'a> From<LegacyPcapBlock<'a>> for PcapBlockOwned<'a> {
    fn from(b: LegacyPcapBlock<'a>) -> PcapBlockOwned<'a> {
        PcapBlockOwned::Legacy(b)
    }
}

impl<'a> From<PcapHeader> for PcapBlockOwned<'a> {
    fn from(b: PcapHeader) -> PcapBlockOwned<'a> {
        PcapBlockOwned::LegacyHeader(b)
    }
}

impl<'a> From<Block<'a>> for PcapBlockOwned<'a> {
    fn from(b: Block<'a>) -> PcapBlockOwned<'a> {
        PcapBlockOwned::NG(b)
    }
}
