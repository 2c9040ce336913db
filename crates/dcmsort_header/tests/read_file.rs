use dcmsort_header::{read_file, DicomWriter, HeaderError, Tag, TransferSyntax};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_read_file_from_disk() {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().join("image.dcm");

    DicomWriter::new(TransferSyntax::ExplicitVrLittleEndian)
        .keyword("PatientID", "PAT001")
        .unwrap()
        .keyword("SeriesDescription", "WB SPECT")
        .unwrap()
        .text(Tag::new(0x0019, 0x1010), dcmsort_header::Vr::LO, "private")
        .pixel_data(&[1u8; 512])
        .write_to(&path)
        .unwrap();

    let header = read_file(&path).unwrap();
    assert_eq!(header.get_keyword("PatientID"), Some("PAT001"));
    assert_eq!(header.get_keyword("SeriesDescription"), Some("WB SPECT"));
    assert_eq!(header.get(Tag::parse("0019,1010").unwrap()), Some("private"));
    assert!(header.get(Tag::PIXEL_DATA).is_none());
}

#[test]
fn test_text_file_is_not_dicom() {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().join("notes.txt");
    fs::write(&path, "just some notes\n".repeat(20)).unwrap();

    assert!(matches!(read_file(&path), Err(HeaderError::NotDicom)));
}

#[test]
fn test_missing_file_is_io_error() {
    let temp = TempDir::new().expect("create temp dir");
    let result = read_file(&temp.path().join("absent.dcm"));
    assert!(matches!(result, Err(HeaderError::Io(_))));
}
