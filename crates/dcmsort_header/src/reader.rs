//! Streaming reader for the meta group and data set of a Part 10 file.
//!
//! Values are decoded into text as they are read. Sequences and binary
//! payloads are skipped without being buffered, and reading stops at Pixel
//! Data, so the cost is bounded by the header size rather than the file size.

use crate::dictionary::{self, vr_for_tag};
use crate::error::{HeaderError, Result};
use crate::tag::{Tag, Vr};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";
const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;
/// Largest single value the reader is willing to buffer.
const MAX_VALUE_LEN: u32 = 16 * 1024 * 1024;
/// Deepest sequence/item nesting the reader will skip through.
const MAX_NESTING_DEPTH: usize = 64;

const IMPLICIT_VR_LE_UID: &str = "1.2.840.10008.1.2";
const EXPLICIT_VR_LE_UID: &str = "1.2.840.10008.1.2.1";
const DEFLATED_EXPLICIT_VR_LE_UID: &str = "1.2.840.10008.1.2.1.99";
const EXPLICIT_VR_BE_UID: &str = "1.2.840.10008.1.2.2";

/// Encoding of the data set following the meta group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSyntax {
    ImplicitVrLittleEndian,
    ExplicitVrLittleEndian,
    ExplicitVrBigEndian,
}

impl TransferSyntax {
    /// Map a transfer syntax UID to the data set encoding.
    ///
    /// Encapsulated (compressed) syntaxes encode their data set as explicit VR
    /// little endian, so every UID not listed explicitly maps there. Deflated
    /// data sets cannot be read without inflating and are rejected.
    pub fn from_uid(uid: &str) -> Result<Self> {
        match clean_text(uid.as_bytes()).as_str() {
            IMPLICIT_VR_LE_UID => Ok(TransferSyntax::ImplicitVrLittleEndian),
            EXPLICIT_VR_BE_UID => Ok(TransferSyntax::ExplicitVrBigEndian),
            DEFLATED_EXPLICIT_VR_LE_UID => Err(HeaderError::UnsupportedTransferSyntax(
                DEFLATED_EXPLICIT_VR_LE_UID.to_string(),
            )),
            _ => Ok(TransferSyntax::ExplicitVrLittleEndian),
        }
    }

    pub fn uid(&self) -> &'static str {
        match self {
            TransferSyntax::ImplicitVrLittleEndian => IMPLICIT_VR_LE_UID,
            TransferSyntax::ExplicitVrLittleEndian => EXPLICIT_VR_LE_UID,
            TransferSyntax::ExplicitVrBigEndian => EXPLICIT_VR_BE_UID,
        }
    }

    pub fn is_explicit(&self) -> bool {
        !matches!(self, TransferSyntax::ImplicitVrLittleEndian)
    }

    pub fn is_big_endian(&self) -> bool {
        matches!(self, TransferSyntax::ExplicitVrBigEndian)
    }
}

/// Decoded header fields of one file, keyed by tag.
#[derive(Debug, Clone)]
pub struct DicomHeader {
    transfer_syntax: TransferSyntax,
    elements: BTreeMap<Tag, String>,
}

impl DicomHeader {
    pub fn transfer_syntax(&self) -> TransferSyntax {
        self.transfer_syntax
    }

    pub fn get(&self, tag: Tag) -> Option<&str> {
        self.elements.get(&tag).map(String::as_str)
    }

    /// Look up a field by dictionary keyword (e.g. `PatientID`).
    pub fn get_keyword(&self, keyword: &str) -> Option<&str> {
        dictionary::tag_for_keyword(keyword).and_then(|tag| self.get(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tag, &str)> {
        self.elements.iter().map(|(tag, value)| (*tag, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn into_elements(self) -> BTreeMap<Tag, String> {
        self.elements
    }
}

/// Read the header of the file at `path`, stopping before Pixel Data.
pub fn read_file(path: &Path) -> Result<DicomHeader> {
    let file = File::open(path)?;
    read_header(BufReader::new(file))
}

/// Read a header from any buffered source positioned at the preamble.
pub fn read_header<R: BufRead>(mut reader: R) -> Result<DicomHeader> {
    let mut prefix = [0u8; PREAMBLE_LEN + 4];
    reader.read_exact(&mut prefix).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            HeaderError::NotDicom
        } else {
            HeaderError::Io(e)
        }
    })?;
    if &prefix[PREAMBLE_LEN..] != MAGIC {
        return Err(HeaderError::NotDicom);
    }

    let mut data_set = DataSetReader {
        inner: reader,
        syntax: TransferSyntax::ExplicitVrLittleEndian,
    };
    let mut elements = BTreeMap::new();

    while data_set.peek_group()? == Some(0x0002) {
        data_set.read_element_into(&mut elements)?;
    }

    let syntax = match elements.get(&Tag::TRANSFER_SYNTAX_UID) {
        Some(uid) => TransferSyntax::from_uid(uid)?,
        None => TransferSyntax::ImplicitVrLittleEndian,
    };
    data_set.syntax = syntax;

    while !data_set.at_end()? {
        if !data_set.read_element_into(&mut elements)? {
            break;
        }
    }

    Ok(DicomHeader {
        transfer_syntax: syntax,
        elements,
    })
}

struct ElementHeader {
    tag: Tag,
    vr: Option<Vr>,
    len: u32,
}

struct DataSetReader<R> {
    inner: R,
    syntax: TransferSyntax,
}

impl<R: BufRead> DataSetReader<R> {
    fn read_u16(&mut self) -> io::Result<u16> {
        if self.syntax.is_big_endian() {
            self.inner.read_u16::<BigEndian>()
        } else {
            self.inner.read_u16::<LittleEndian>()
        }
    }

    fn read_u32(&mut self) -> io::Result<u32> {
        if self.syntax.is_big_endian() {
            self.inner.read_u32::<BigEndian>()
        } else {
            self.inner.read_u32::<LittleEndian>()
        }
    }

    fn at_end(&mut self) -> io::Result<bool> {
        Ok(self.inner.fill_buf()?.is_empty())
    }

    fn peek_group(&mut self) -> io::Result<Option<u16>> {
        let buf = self.inner.fill_buf()?;
        if buf.len() < 2 {
            return Ok(None);
        }
        let group = if self.syntax.is_big_endian() {
            BigEndian::read_u16(buf)
        } else {
            LittleEndian::read_u16(buf)
        };
        Ok(Some(group))
    }

    fn read_element_header(&mut self) -> Result<ElementHeader> {
        let group = self.read_u16()?;
        let element = self.read_u16()?;
        let tag = Tag::new(group, element);

        if tag.is_delimiter() {
            let len = self.read_u32()?;
            return Ok(ElementHeader { tag, vr: None, len });
        }

        if self.syntax.is_explicit() {
            let mut raw = [0u8; 2];
            self.inner.read_exact(&mut raw)?;
            let vr = Vr::from_bytes(raw).ok_or(HeaderError::InvalidVr { tag, vr: raw })?;
            let len = if vr.has_long_length() {
                self.read_u16()?;
                self.read_u32()?
            } else {
                self.read_u16()? as u32
            };
            Ok(ElementHeader {
                tag,
                vr: Some(vr),
                len,
            })
        } else {
            let len = self.read_u32()?;
            Ok(ElementHeader {
                tag,
                vr: vr_for_tag(tag),
                len,
            })
        }
    }

    /// Read one element, storing it if it decodes to text.
    /// Returns false once Pixel Data is reached.
    fn read_element_into(&mut self, elements: &mut BTreeMap<Tag, String>) -> Result<bool> {
        let header = self.read_element_header()?;

        if header.tag == Tag::PIXEL_DATA {
            return Ok(false);
        }

        if header.len == UNDEFINED_LENGTH {
            // SQ, or an implicit-VR element of unknown VR, which the standard
            // requires to be parsed as a sequence.
            self.skip_undefined_sequence(1)?;
            return Ok(true);
        }

        if header.tag.is_delimiter() || header.vr == Some(Vr::SQ) {
            self.skip(header.len as u64)?;
            return Ok(true);
        }

        if header.len > MAX_VALUE_LEN {
            return Err(HeaderError::ValueTooLarge {
                tag: header.tag,
                len: header.len,
            });
        }

        let mut value = vec![0u8; header.len as usize];
        self.inner.read_exact(&mut value)?;
        if let Some(text) = decode_value(header.vr, &value, self.syntax.is_big_endian()) {
            elements.insert(header.tag, text);
        }
        Ok(true)
    }

    fn skip(&mut self, len: u64) -> io::Result<()> {
        let copied = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())?;
        if copied < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "value extends past end of file",
            ));
        }
        Ok(())
    }

    fn skip_undefined_sequence(&mut self, depth: usize) -> Result<()> {
        if depth > MAX_NESTING_DEPTH {
            return Err(HeaderError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        loop {
            let header = self.read_element_header()?;
            match header.tag {
                Tag::SEQUENCE_DELIMITATION => return Ok(()),
                Tag::ITEM if header.len == UNDEFINED_LENGTH => self.skip_undefined_item(depth)?,
                Tag::ITEM => self.skip(header.len as u64)?,
                other => return Err(HeaderError::MalformedSequence(other)),
            }
        }
    }

    /// Skip one undefined-length item of a sequence at `depth`.
    fn skip_undefined_item(&mut self, depth: usize) -> Result<()> {
        loop {
            let header = self.read_element_header()?;
            if header.tag == Tag::ITEM_DELIMITATION {
                return Ok(());
            }
            if header.len == UNDEFINED_LENGTH {
                self.skip_undefined_sequence(depth + 1)?;
            } else {
                self.skip(header.len as u64)?;
            }
        }
    }
}
