use std::convert::TryFrom;

use crate::endianness::PcapEndianness;

use super::{OptionCode, PcapNGOption};

/// Default `if_tsresol`: microseconds
pub const DEFAULT_TSRESOL: u8 = 6;

/// Compute the timestamp resolution, in units per second
///
/// Return the resolution, or `None` if the resolution is invalid (for ex. greater than `2^64`)
pub fn build_ts_resolution(ts_resol: u8) -> Option<u64> {
    let ts_mode = ts_resol & 0x80;
    let unit = if ts_mode == 0 {
        // 10^if_tsresol
        // check that if_tsresol <= 19 (10^19 is the largest power of 10 to fit in a u64)
        if ts_resol > 19 {
            return None;
        }
        10u64.pow(ts_resol as u32)
    } else {
        // 2^if_tsresol
        let exp = ts_resol & 0x7f;
        if exp > 63 {
            return None;
        }
        1u64 << exp
    };
    Some(unit)
}

/// Given the timestamp parameters, return the timestamp seconds and fractional part (in resolution
/// units)
///
/// `resolution` must not be zero, which `build_ts_resolution` guarantees.
pub fn build_ts(ts_high: u32, ts_low: u32, ts_offset: i64, resolution: u64) -> (i64, u64) {
    let ts: u64 = ((ts_high as u64) << 32) | (ts_low as u64);
    let ts_sec = ts_offset.saturating_add((ts / resolution) as i64);
    let ts_fractional = ts % resolution;
    (ts_sec, ts_fractional)
}

/// Split a raw 64-bit timestamp value into the (high, low) words of a packet block
#[inline]
pub fn split_ts(ts: u64) -> (u32, u32) {
    ((ts >> 32) as u32, ts as u32)
}

/// Read `if_tsresol` and `if_tsoffset` from interface options, with their defaults
///
/// `if_tsoffset` is stored in the byte order of the section.
pub(crate) fn if_extract_tsoffset_and_tsresol<En: PcapEndianness>(
    options: &[PcapNGOption],
) -> (u8, i64) {
    let mut if_tsresol: u8 = DEFAULT_TSRESOL;
    let mut if_tsoffset: i64 = 0;
    for opt in options {
        match opt.code {
            OptionCode::IfTsresol => {
                if let Some(&b) = opt.value().first() {
                    if_tsresol = b;
                }
            }
            OptionCode::IfTsoffset => {
                if let Some(b) = opt.value().get(..8) {
                    if let Ok(int_bytes) = <[u8; 8]>::try_from(b) {
                        if_tsoffset = En::i64_from_bytes(int_bytes);
                    }
                }
            }
            _ => (),
        }
    }
    (if_tsresol, if_tsoffset)
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::endianness::{PcapBE, PcapLE};
    use std::borrow::Cow;

    #[test]
    fn decode_ts() {
        // from https://datatracker.ietf.org/doc/html/draft-ietf-opsawg-pcapng section 4.6 (ISB)
        // '97 c3 04 00 aa 47 ca 64', in Little Endian, decodes to 2012-06-29 07:28:25.298858 UTC.
        const INPUT_HIGH: [u8; 4] = hex!("97 c3 04 00");
        const INPUT_LOW: [u8; 4] = hex!("aa 47 ca 64");
        let ts_high = u32::from_le_bytes(INPUT_HIGH);
        let ts_low = u32::from_le_bytes(INPUT_LOW);
        let resolution = build_ts_resolution(6).unwrap();

        let (ts_sec, ts_usec) = build_ts(ts_high, ts_low, 0, resolution);
        assert_eq!(ts_sec, 1340954905);
        assert_eq!(ts_usec, 298858);
    }

    #[test]
    fn resolution_modes() {
        assert_eq!(build_ts_resolution(0), Some(1));
        assert_eq!(build_ts_resolution(9), Some(1_000_000_000));
        assert_eq!(build_ts_resolution(0x80 | 10), Some(1024));
        assert_eq!(build_ts_resolution(20), None);
        assert_eq!(build_ts_resolution(0x80 | 64), None);
    }

    #[test]
    fn negative_offset() {
        let (sec, frac) = build_ts(0, 1_500_000, -10, 1_000_000);
        assert_eq!((sec, frac), (-9, 500_000));
    }

    #[test]
    fn tsoffset_byte_order() {
        let options = vec![
            PcapNGOption {
                code: OptionCode::IfTsresol,
                len: 1,
                value: Cow::Borrowed(&[9, 0, 0, 0]),
            },
            PcapNGOption {
                code: OptionCode::IfTsoffset,
                len: 8,
                value: Cow::Borrowed(&[0, 0, 0, 0, 0, 0, 0, 5]),
            },
        ];
        assert_eq!(if_extract_tsoffset_and_tsresol::<PcapBE>(&options), (9, 5));
        assert_eq!(
            if_extract_tsoffset_and_tsresol::<PcapLE>(&options),
            (9, 5 << 56)
        );
        assert_eq!(if_extract_tsoffset_and_tsresol::<PcapLE>(&[]), (6, 0));
    }
}
