//! Error types for header parsing

use crate::tag::Tag;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Missing DICM prefix after preamble")]
    NotDicom,

    #[error("Unsupported transfer syntax: {0}")]
    UnsupportedTransferSyntax(String),

    #[error("Invalid VR {vr:?} at {tag}")]
    InvalidVr { tag: Tag, vr: [u8; 2] },

    #[error("Value of {tag} too large: {len} bytes")]
    ValueTooLarge { tag: Tag, len: u32 },

    #[error("Sequences nested deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("Malformed sequence: unexpected {0}")]
    MalformedSequence(Tag),

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    #[error("Unknown keyword: {0}")]
    UnknownKeyword(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, HeaderError>;
