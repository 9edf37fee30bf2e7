use std::borrow::Cow;
use std::convert::TryFrom;
use std::fmt;

use nom::combinator::{complete, map_parser};
use nom::multi::many0;
use nom::IResult;
use nom::{bytes::streaming::take, error::ParseError};
use rusticata_macros::{align32, newtype_enum};

use crate::endianness::{PcapBE, PcapEndianness, PcapLE};

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct OptionCode(pub u16);

newtype_enum! {
impl debug OptionCode {
    EndOfOpt = 0,
    Comment = 1,
    ShbHardware = 2,
    IfName = 2,
    EpbFlags = 2,
    ShbOs = 3,
    IfDescription = 3,
    EpbHash = 3,
    ShbUserAppl = 4,
    IfIpv4Addr = 4,
    EpbDropCount = 4,
    IfMacAddr = 6,
    IfSpeed = 8,
    IfTsresol = 9,
    IfFilter = 11,
    IfOs = 12,
    IfTsoffset = 14,
}
}

/// Errors raised when reading an option value with a typed accessor
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PcapNGOptionError {
    InvalidLength,
    Utf8Error,
}

impl fmt::Display for PcapNGOptionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PcapNGOptionError::InvalidLength => write!(f, "Invalid option length"),
            PcapNGOptionError::Utf8Error => write!(f, "Option value is not valid UTF-8"),
        }
    }
}

impl std::error::Error for PcapNGOptionError {}

/// A pcapng block option
///
/// `value` holds the padded value as read from the file. Options built in memory may hold the
/// exact value: serializers pad it again.
#[derive(Clone, Debug, PartialEq)]
pub struct PcapNGOption<'a> {
    pub code: OptionCode,
    pub len: u16,
    pub value: Cow<'a, [u8]>,
}

impl<'a> PcapNGOption<'a> {
    /// Build an option from its code and unpadded value
    pub fn new(code: OptionCode, value: Cow<'a, [u8]>) -> Option<PcapNGOption<'a>> {
        let len = u16::try_from(value.len()).ok()?;
        Some(PcapNGOption { code, len, value })
    }

    /// Build a UTF-8 string option. Returns `None` if the string does not fit in an option.
    pub fn new_str(code: OptionCode, s: &str) -> Option<PcapNGOption<'static>> {
        PcapNGOption::new(code, Cow::Owned(s.as_bytes().to_vec()))
    }

    /// Build an `opt_comment` option
    pub fn comment(s: &str) -> Option<PcapNGOption<'static>> {
        PcapNGOption::new_str(OptionCode::Comment, s)
    }

    /// Return a copy of this option that does not borrow the input buffer
    ///
    /// The value is trimmed to `len` bytes.
    pub fn into_owned(self) -> PcapNGOption<'static> {
        let len = usize::from(self.len).min(self.value.len());
        let value = match self.value {
            Cow::Borrowed(b) => b[..len].to_vec(),
            Cow::Owned(mut v) => {
                v.truncate(len);
                v
            }
        };
        PcapNGOption {
            code: self.code,
            len: self.len,
            value: Cow::Owned(value),
        }
    }

    /// Return a reference to the option value, as raw bytes (not related to the `len` field)
    #[inline]
    pub fn value(&self) -> &[u8] {
        self.value.as_ref()
    }

    /// Return a reference to the option value, using the `len` field to limit it
    pub fn as_bytes(&self) -> Result<&[u8], PcapNGOptionError> {
        let len = usize::from(self.len);
        if len <= self.value.len() {
            Ok(&self.value[..len])
        } else {
            Err(PcapNGOptionError::InvalidLength)
        }
    }

    /// Return the option value as a string
    ///
    /// Trailing NUL bytes, which some writers add, are stripped.
    pub fn as_str(&self) -> Result<&str, PcapNGOptionError> {
        let b = self.as_bytes()?;
        let end = b.iter().rposition(|&c| c != 0).map_or(0, |p| p + 1);
        std::str::from_utf8(&b[..end]).or(Err(PcapNGOptionError::Utf8Error))
    }

    /// Return the option value interpreted as u8
    pub fn as_u8(&self) -> Result<u8, PcapNGOptionError> {
        match self.as_bytes()? {
            [b] => Ok(*b),
            _ => Err(PcapNGOptionError::InvalidLength),
        }
    }

    /// Return the option value interpreted as a little-endian i64
    ///
    /// The declared length must be exactly 8 bytes
    pub fn as_i64_le(&self) -> Result<i64, PcapNGOptionError> {
        <[u8; 8]>::try_from(self.as_bytes()?)
            .map(i64::from_le_bytes)
            .or(Err(PcapNGOptionError::InvalidLength))
    }

    /// Return the option value interpreted as a little-endian u64
    ///
    /// The declared length must be exactly 8 bytes
    pub fn as_u64_le(&self) -> Result<u64, PcapNGOptionError> {
        <[u8; 8]>::try_from(self.as_bytes()?)
            .map(u64::from_le_bytes)
            .or(Err(PcapNGOptionError::InvalidLength))
    }
}

/// Return the first value of option `code` as a string
pub(crate) fn options_get_as_str<'a>(
    options: &'a [PcapNGOption],
    code: OptionCode,
) -> Option<Result<&'a str, PcapNGOptionError>> {
    options
        .iter()
        .find(|opt| opt.code == code)
        .map(|opt| opt.as_str())
}

/// Return the first value of option `code` as a u64
pub(crate) fn options_get_as_u64_le(
    options: &[PcapNGOption],
    code: OptionCode,
) -> Option<Result<u64, PcapNGOptionError>> {
    options
        .iter()
        .find(|opt| opt.code == code)
        .map(|opt| opt.as_u64_le())
}

/// Parse a pcap-ng Option (little-endian)
#[inline]
pub fn parse_option_le<'i, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
) -> IResult<&'i [u8], PcapNGOption, E> {
    parse_option::<PcapLE, E>(i)
}

/// Parse a pcap-ng Option (big-endian)
#[inline]
pub fn parse_option_be<'i, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
) -> IResult<&'i [u8], PcapNGOption, E> {
    parse_option::<PcapBE, E>(i)
}

pub(crate) fn parse_option<'i, En: PcapEndianness, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
) -> IResult<&'i [u8], PcapNGOption, E> {
    let (i, code) = En::parse_u16(i)?;
    let (i, len) = En::parse_u16(i)?;
    let (i, value) = take(align32!(len as u32))(i)?;
    let option = PcapNGOption {
        code: OptionCode(code),
        len,
        value: Cow::Borrowed(value),
    };
    Ok((i, option))
}

/// Parse the options of a block of `len` bytes
///
/// `opt_offset` is the size of the fixed part of the block, trailing length included.
/// The end-of-options marker, if present, is kept in the list. Callers that copy options
/// should skip it.
pub(crate) fn opt_parse_options<'i, En: PcapEndianness, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
    len: usize,
    opt_offset: usize,
) -> IResult<&'i [u8], Vec<PcapNGOption>, E> {
    if len > opt_offset {
        map_parser(
            take(len - opt_offset),
            many0(complete(parse_option::<En, E>)),
        )(i)
    } else {
        Ok((i, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PcapError;
    use hex_literal::hex;

    #[test]
    fn option_str_and_padding() {
        let data = hex!("01 00 03 00 61 62 63 00");
        let (rem, opt) = parse_option_le::<PcapError<&[u8]>>(&data).expect("parse option");
        assert!(rem.is_empty());
        assert_eq!(opt.code, OptionCode::Comment);
        assert_eq!(opt.len, 3);
        assert_eq!(opt.value().len(), 4);
        assert_eq!(opt.as_str(), Ok("abc"));
        let owned = opt.into_owned();
        assert_eq!(owned.value(), b"abc");
    }

    #[test]
    fn option_be() {
        let data = hex!("00 09 00 01 09 00 00 00");
        let (_, opt) = parse_option_be::<PcapError<&[u8]>>(&data).expect("parse option");
        assert_eq!(opt.code, OptionCode::IfTsresol);
        assert_eq!(opt.as_u8(), Ok(9));
    }

    #[test]
    fn option_bad_length() {
        let opt = PcapNGOption {
            code: OptionCode::IfTsoffset,
            len: 4,
            value: Cow::Borrowed(&[0, 0, 0, 0]),
        };
        assert_eq!(opt.as_i64_le(), Err(PcapNGOptionError::InvalidLength));
        assert_eq!(opt.as_u8(), Err(PcapNGOptionError::InvalidLength));
    }
}
