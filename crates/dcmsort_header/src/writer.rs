//! Minimal Part 10 writer.
//!
//! Produces small, well-formed files in any of the supported transfer
//! syntaxes. Used to build fixtures for the reader and the sort engine.

use crate::dictionary::{tag_for_keyword, vr_for_tag};
use crate::error::{HeaderError, Result};
use crate::reader::TransferSyntax;
use crate::tag::{Tag, Vr};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

const NM_IMAGE_STORAGE_UID: &str = "1.2.840.10008.5.1.4.1.1.20";
const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

enum Value {
    Text(String),
    Unsigned(Vec<u16>),
    Bytes(Vec<u8>),
    /// Undefined-length sequence holding one undefined-length item.
    Sequence { item_tag: Tag, item_vr: Vr, item_value: String },
}

pub struct DicomWriter {
    syntax: TransferSyntax,
    sop_instance_uid: String,
    elements: BTreeMap<Tag, (Vr, Value)>,
}

impl DicomWriter {
    pub fn new(syntax: TransferSyntax) -> Self {
        Self {
            syntax,
            sop_instance_uid: "1.2.826.0.1.3680043.2.1125.1".to_string(),
            elements: BTreeMap::new(),
        }
    }

    pub fn text(mut self, tag: Tag, vr: Vr, value: &str) -> Self {
        self.elements.insert(tag, (vr, Value::Text(value.to_string())));
        self
    }

    /// Add a text element by dictionary keyword.
    pub fn keyword(self, keyword: &str, value: &str) -> Result<Self> {
        let tag = tag_for_keyword(keyword)
            .ok_or_else(|| HeaderError::UnknownKeyword(keyword.to_string()))?;
        let vr = vr_for_tag(tag).unwrap_or(Vr::LO);
        Ok(self.text(tag, vr, value))
    }

    pub fn unsigned(mut self, tag: Tag, values: &[u16]) -> Self {
        self.elements
            .insert(tag, (Vr::US, Value::Unsigned(values.to_vec())));
        self
    }

    pub fn pixel_data(mut self, bytes: &[u8]) -> Self {
        self.elements
            .insert(Tag::PIXEL_DATA, (Vr::OW, Value::Bytes(bytes.to_vec())));
        self
    }

    pub fn nested_sequence(mut self, tag: Tag, item_tag: Tag, item_value: &str) -> Self {
        let item_vr = vr_for_tag(item_tag).unwrap_or(Vr::LO);
        self.elements.insert(
            tag,
            (
                Vr::SQ,
                Value::Sequence {
                    item_tag,
                    item_vr,
                    item_value: item_value.to_string(),
                },
            ),
        );
        self
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = vec![0u8; 128];
        out.extend_from_slice(b"DICM");

        let meta_syntax = TransferSyntax::ExplicitVrLittleEndian;
        let mut meta = Vec::new();
        put_element(&mut meta, meta_syntax, Tag::new(0x0002, 0x0001), Vr::OB, &[0, 1])?;
        put_element(
            &mut meta,
            meta_syntax,
            Tag::new(0x0002, 0x0002),
            Vr::UI,
            &pad(NM_IMAGE_STORAGE_UID, Vr::UI),
        )?;
        put_element(
            &mut meta,
            meta_syntax,
            Tag::new(0x0002, 0x0003),
            Vr::UI,
            &pad(&self.sop_instance_uid, Vr::UI),
        )?;
        put_element(
            &mut meta,
            meta_syntax,
            Tag::TRANSFER_SYNTAX_UID,
            Vr::UI,
            &pad(self.syntax.uid(), Vr::UI),
        )?;

        let mut group_length = Vec::new();
        group_length.write_u32::<LittleEndian>(meta.len() as u32)?;
        put_element(&mut out, meta_syntax, Tag::new(0x0002, 0x0000), Vr::UL, &group_length)?;
        out.extend_from_slice(&meta);

        for (tag, (vr, value)) in &self.elements {
            match value {
                Value::Text(text) => put_element(&mut out, self.syntax, *tag, *vr, &pad(text, *vr))?,
                Value::Unsigned(values) => {
                    let mut bytes = Vec::with_capacity(values.len() * 2);
                    for v in values {
                        put_u16(&mut bytes, self.syntax, *v)?;
                    }
                    put_element(&mut out, self.syntax, *tag, *vr, &bytes)?;
                }
                Value::Bytes(bytes) => put_element(&mut out, self.syntax, *tag, *vr, bytes)?,
                Value::Sequence {
                    item_tag,
                    item_vr,
                    item_value,
                } => {
                    put_header(&mut out, self.syntax, *tag, Some(Vr::SQ), UNDEFINED_LENGTH)?;
                    put_header(&mut out, self.syntax, Tag::ITEM, None, UNDEFINED_LENGTH)?;
                    put_element(&mut out, self.syntax, *item_tag, *item_vr, &pad(item_value, *item_vr))?;
                    put_header(&mut out, self.syntax, Tag::ITEM_DELIMITATION, None, 0)?;
                    put_header(&mut out, self.syntax, Tag::SEQUENCE_DELIMITATION, None, 0)?;
                }
            }
        }

        Ok(out)
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_bytes()?)
    }
}

fn pad(text: &str, vr: Vr) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    if bytes.len() % 2 == 1 {
        bytes.push(vr.padding());
    }
    bytes
}

fn put_u16(out: &mut Vec<u8>, syntax: TransferSyntax, value: u16) -> io::Result<()> {
    if syntax.is_big_endian() {
        out.write_u16::<BigEndian>(value)
    } else {
        out.write_u16::<LittleEndian>(value)
    }
}

fn put_u32(out: &mut Vec<u8>, syntax: TransferSyntax, value: u32) -> io::Result<()> {
    if syntax.is_big_endian() {
        out.write_u32::<BigEndian>(value)
    } else {
        out.write_u32::<LittleEndian>(value)
    }
}

fn put_header(
    out: &mut Vec<u8>,
    syntax: TransferSyntax,
    tag: Tag,
    vr: Option<Vr>,
    len: u32,
) -> io::Result<()> {
    put_u16(out, syntax, tag.group)?;
    put_u16(out, syntax, tag.element)?;
    match vr {
        Some(vr) if syntax.is_explicit() && !tag.is_delimiter() => {
            out.extend_from_slice(&vr.as_bytes());
            if vr.has_long_length() {
                put_u16(out, syntax, 0)?;
                put_u32(out, syntax, len)
            } else {
                put_u16(out, syntax, len as u16)
            }
        }
        _ => put_u32(out, syntax, len),
    }
}

fn put_element(
    out: &mut Vec<u8>,
    syntax: TransferSyntax,
    tag: Tag,
    vr: Vr,
    value: &[u8],
) -> io::Result<()> {
    put_header(out, syntax, tag, Some(vr), value.len() as u32)?;
    out.extend_from_slice(value);
    Ok(())
}
