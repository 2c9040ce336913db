//! DICOM Part 10 header reader
//!
//! Reads the file meta group and the data set of a DICOM file up to (and
//! excluding) Pixel Data, and exposes every decodable element as text keyed by
//! its tag. Nothing here interprets pixel content.
//!
//! # File Layout
//!
//! ```text
//! [PREAMBLE:128][DICM:4][META GROUP (explicit VR LE)][DATA SET (per transfer syntax)]
//! ```
//!
//! Element encoding:
//! ```text
//! explicit, short:  [GROUP:2][ELEM:2][VR:2][LEN:2][VALUE]
//! explicit, long:   [GROUP:2][ELEM:2][VR:2][RES:2][LEN:4][VALUE]
//! implicit:         [GROUP:2][ELEM:2][LEN:4][VALUE]
//! ```

pub mod dictionary;
pub mod error;
pub mod reader;
pub mod tag;
pub mod writer;

pub use dictionary::{keyword_for_tag, tag_for_keyword};
pub use error::{HeaderError, Result};
pub use reader::{read_file, read_header, DicomHeader, TransferSyntax};
pub use tag::{Tag, Vr};
pub use writer::DicomWriter;
