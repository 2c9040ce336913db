//! Element tags and value representations

use crate::error::{HeaderError, Result};
use std::fmt;

/// A (group, element) pair identifying one data element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub group: u16,
    pub element: u16,
}

impl Tag {
    pub const TRANSFER_SYNTAX_UID: Tag = Tag::new(0x0002, 0x0010);
    pub const PIXEL_DATA: Tag = Tag::new(0x7FE0, 0x0010);
    pub const ITEM: Tag = Tag::new(0xFFFE, 0xE000);
    pub const ITEM_DELIMITATION: Tag = Tag::new(0xFFFE, 0xE00D);
    pub const SEQUENCE_DELIMITATION: Tag = Tag::new(0xFFFE, 0xE0DD);

    pub const fn new(group: u16, element: u16) -> Self {
        Self { group, element }
    }

    /// Parse a literal tag pair such as `0020,0011`, `0x0020,0x0011` or `(0020,0011)`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')');
        let (group, element) = trimmed
            .split_once(',')
            .ok_or_else(|| HeaderError::InvalidTag(input.to_string()))?;
        Ok(Self {
            group: parse_hex_u16(group).ok_or_else(|| HeaderError::InvalidTag(input.to_string()))?,
            element: parse_hex_u16(element)
                .ok_or_else(|| HeaderError::InvalidTag(input.to_string()))?,
        })
    }

    pub fn as_u32(&self) -> u32 {
        ((self.group as u32) << 16) | self.element as u32
    }

    /// Delimiter tags (items and sequence delimiters) never carry a VR.
    pub fn is_delimiter(&self) -> bool {
        self.group == 0xFFFE
    }
}

fn parse_hex_u16(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    if digits.is_empty() || digits.len() > 4 {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.group, self.element)
    }
}

/// Value representation of a data element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vr {
    AE,
    AS,
    AT,
    CS,
    DA,
    DS,
    DT,
    FD,
    FL,
    IS,
    LO,
    LT,
    OB,
    OD,
    OF,
    OL,
    OV,
    OW,
    PN,
    SH,
    SL,
    SQ,
    SS,
    ST,
    SV,
    TM,
    UC,
    UI,
    UL,
    UN,
    UR,
    US,
    UT,
    UV,
}

impl Vr {
    pub fn from_bytes(bytes: [u8; 2]) -> Option<Self> {
        let vr = match &bytes {
            b"AE" => Vr::AE,
            b"AS" => Vr::AS,
            b"AT" => Vr::AT,
            b"CS" => Vr::CS,
            b"DA" => Vr::DA,
            b"DS" => Vr::DS,
            b"DT" => Vr::DT,
            b"FD" => Vr::FD,
            b"FL" => Vr::FL,
            b"IS" => Vr::IS,
            b"LO" => Vr::LO,
            b"LT" => Vr::LT,
            b"OB" => Vr::OB,
            b"OD" => Vr::OD,
            b"OF" => Vr::OF,
            b"OL" => Vr::OL,
            b"OV" => Vr::OV,
            b"OW" => Vr::OW,
            b"PN" => Vr::PN,
            b"SH" => Vr::SH,
            b"SL" => Vr::SL,
            b"SQ" => Vr::SQ,
            b"SS" => Vr::SS,
            b"ST" => Vr::ST,
            b"SV" => Vr::SV,
            b"TM" => Vr::TM,
            b"UC" => Vr::UC,
            b"UI" => Vr::UI,
            b"UL" => Vr::UL,
            b"UN" => Vr::UN,
            b"UR" => Vr::UR,
            b"US" => Vr::US,
            b"UT" => Vr::UT,
            b"UV" => Vr::UV,
            _ => return None,
        };
        Some(vr)
    }

    pub fn as_bytes(&self) -> [u8; 2] {
        let s = format!("{:?}", self);
        let b = s.as_bytes();
        [b[0], b[1]]
    }

    /// VRs encoded with a reserved field and a 32-bit length in explicit syntaxes.
    pub fn has_long_length(&self) -> bool {
        matches!(
            self,
            Vr::OB
                | Vr::OD
                | Vr::OF
                | Vr::OL
                | Vr::OV
                | Vr::OW
                | Vr::SQ
                | Vr::SV
                | Vr::UC
                | Vr::UN
                | Vr::UR
                | Vr::UT
                | Vr::UV
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Vr::AE
                | Vr::AS
                | Vr::CS
                | Vr::DA
                | Vr::DS
                | Vr::DT
                | Vr::IS
                | Vr::LO
                | Vr::LT
                | Vr::PN
                | Vr::SH
                | Vr::ST
                | Vr::TM
                | Vr::UC
                | Vr::UI
                | Vr::UR
                | Vr::UT
        )
    }

    /// Padding byte used to reach even value length.
    pub fn padding(&self) -> u8 {
        match self {
            Vr::UI => 0,
            v if v.is_text() => b' ',
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_forms() {
        let expected = Tag::new(0x0020, 0x0011);
        assert_eq!(Tag::parse("0020,0011").unwrap(), expected);
        assert_eq!(Tag::parse("0x0020,0x0011").unwrap(), expected);
        assert_eq!(Tag::parse("(0020,0011)").unwrap(), expected);
        assert_eq!(Tag::parse("7fe0,0010").unwrap(), Tag::PIXEL_DATA);
    }

    #[test]
    fn test_parse_tag_rejects_garbage() {
        assert!(Tag::parse("SeriesNumber").is_err());
        assert!(Tag::parse("0020,").is_err());
        assert!(Tag::parse("00200,0011").is_err());
        assert!(Tag::parse("zz,0011").is_err());
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(Tag::new(0x0008, 0x103E).to_string(), "(0008,103E)");
        assert_eq!(Tag::new(0x0020, 0x0011).as_u32(), 0x0020_0011);
    }

    #[test]
    fn test_vr_bytes() {
        assert_eq!(Vr::from_bytes(*b"SQ"), Some(Vr::SQ));
        assert_eq!(Vr::from_bytes(*b"ZZ"), None);
        assert_eq!(&Vr::PN.as_bytes(), b"PN");
        assert!(Vr::OB.has_long_length());
        assert!(!Vr::US.has_long_length());
    }
}
