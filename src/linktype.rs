use rusticata_macros::newtype_enum;

/// Data link type
///
/// The link-layer header type specifies the type of headers at the beginning
/// of the packet. Its `Display` implementation gives the symbolic name.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Linktype(pub i32);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,
    IEEE802_5 = 6,
    PPP = 9,
    FDDI = 10,
    RAW = 101,
    IEEE802_11 = 105,
    LOOP = 108,
    LINUX_SLL = 113,
    IEEE802_11_RADIOTAP = 127,
    USB_LINUX = 189,
    IPV4 = 228,
    IPV6 = 229,
    NFLOG = 239,
    WIRESHARK_UPPER_PDU = 252,
    LINUX_SLL2 = 276,
}
}

impl Linktype {
    /// Human-readable description, used in diagnostics next to the symbolic name
    pub fn description(self) -> &'static str {
        match self {
            Linktype::NULL => "BSD loopback",
            Linktype::ETHERNET => "Ethernet",
            Linktype::IEEE802_5 => "Token Ring",
            Linktype::PPP => "PPP",
            Linktype::FDDI => "FDDI",
            Linktype::RAW => "Raw IP",
            Linktype::IEEE802_11 => "IEEE 802.11 Wireless LAN",
            Linktype::LOOP => "OpenBSD loopback",
            Linktype::LINUX_SLL => "Linux cooked-mode capture v1",
            Linktype::IEEE802_11_RADIOTAP => "IEEE 802.11 plus radiotap radio header",
            Linktype::USB_LINUX => "USB packets with Linux header",
            Linktype::IPV4 => "Raw IPv4",
            Linktype::IPV6 => "Raw IPv6",
            Linktype::NFLOG => "Linux Netfilter NFLOG",
            Linktype::WIRESHARK_UPPER_PDU => "Wireshark Upper PDU export",
            Linktype::LINUX_SLL2 => "Linux cooked-mode capture v2",
            _ => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Linktype;

    #[test]
    fn linktype_names() {
        assert_eq!(Linktype::ETHERNET.to_string(), "ETHERNET");
        assert_eq!(Linktype(1), Linktype::ETHERNET);
        assert_eq!(Linktype::RAW.description(), "Raw IP");
        assert_eq!(Linktype(4242).description(), "Unknown");
    }
}
