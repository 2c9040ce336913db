//! Keyword dictionary for the elements commonly used when sorting studies.
//!
//! The dictionary also supplies VRs for implicit VR data sets, where the
//! encoding does not carry them.

use crate::tag::{Tag, Vr};

struct Entry {
    keyword: &'static str,
    tag: Tag,
    vr: Vr,
}

const fn entry(keyword: &'static str, group: u16, element: u16, vr: Vr) -> Entry {
    Entry {
        keyword,
        tag: Tag::new(group, element),
        vr,
    }
}

static ENTRIES: &[Entry] = &[
    // File meta
    entry("FileMetaInformationGroupLength", 0x0002, 0x0000, Vr::UL),
    entry("FileMetaInformationVersion", 0x0002, 0x0001, Vr::OB),
    entry("MediaStorageSOPClassUID", 0x0002, 0x0002, Vr::UI),
    entry("MediaStorageSOPInstanceUID", 0x0002, 0x0003, Vr::UI),
    entry("TransferSyntaxUID", 0x0002, 0x0010, Vr::UI),
    entry("ImplementationClassUID", 0x0002, 0x0012, Vr::UI),
    entry("ImplementationVersionName", 0x0002, 0x0013, Vr::SH),
    // General study / series / equipment
    entry("SpecificCharacterSet", 0x0008, 0x0005, Vr::CS),
    entry("ImageType", 0x0008, 0x0008, Vr::CS),
    entry("SOPClassUID", 0x0008, 0x0016, Vr::UI),
    entry("SOPInstanceUID", 0x0008, 0x0018, Vr::UI),
    entry("StudyDate", 0x0008, 0x0020, Vr::DA),
    entry("SeriesDate", 0x0008, 0x0021, Vr::DA),
    entry("AcquisitionDate", 0x0008, 0x0022, Vr::DA),
    entry("ContentDate", 0x0008, 0x0023, Vr::DA),
    entry("StudyTime", 0x0008, 0x0030, Vr::TM),
    entry("SeriesTime", 0x0008, 0x0031, Vr::TM),
    entry("AcquisitionTime", 0x0008, 0x0032, Vr::TM),
    entry("ContentTime", 0x0008, 0x0033, Vr::TM),
    entry("AccessionNumber", 0x0008, 0x0050, Vr::SH),
    entry("Modality", 0x0008, 0x0060, Vr::CS),
    entry("Manufacturer", 0x0008, 0x0070, Vr::LO),
    entry("InstitutionName", 0x0008, 0x0080, Vr::LO),
    entry("ReferringPhysicianName", 0x0008, 0x0090, Vr::PN),
    entry("StationName", 0x0008, 0x1010, Vr::SH),
    entry("StudyDescription", 0x0008, 0x1030, Vr::LO),
    entry("SeriesDescription", 0x0008, 0x103E, Vr::LO),
    entry("ManufacturerModelName", 0x0008, 0x1090, Vr::LO),
    // Patient
    entry("PatientName", 0x0010, 0x0010, Vr::PN),
    entry("PatientID", 0x0010, 0x0020, Vr::LO),
    entry("PatientBirthDate", 0x0010, 0x0030, Vr::DA),
    entry("PatientSex", 0x0010, 0x0040, Vr::CS),
    entry("PatientAge", 0x0010, 0x1010, Vr::AS),
    entry("PatientSize", 0x0010, 0x1020, Vr::DS),
    entry("PatientWeight", 0x0010, 0x1030, Vr::DS),
    // Acquisition
    entry("BodyPartExamined", 0x0018, 0x0015, Vr::CS),
    entry("Radiopharmaceutical", 0x0018, 0x0031, Vr::LO),
    entry("SliceThickness", 0x0018, 0x0050, Vr::DS),
    entry("ProtocolName", 0x0018, 0x1030, Vr::LO),
    entry("RadiopharmaceuticalStartTime", 0x0018, 0x1072, Vr::TM),
    entry("RadionuclideTotalDose", 0x0018, 0x1074, Vr::DS),
    entry("RadionuclideHalfLife", 0x0018, 0x1075, Vr::DS),
    entry("ActualFrameDuration", 0x0018, 0x1242, Vr::IS),
    // Relationship
    entry("StudyInstanceUID", 0x0020, 0x000D, Vr::UI),
    entry("SeriesInstanceUID", 0x0020, 0x000E, Vr::UI),
    entry("StudyID", 0x0020, 0x0010, Vr::SH),
    entry("SeriesNumber", 0x0020, 0x0011, Vr::IS),
    entry("AcquisitionNumber", 0x0020, 0x0012, Vr::IS),
    entry("InstanceNumber", 0x0020, 0x0013, Vr::IS),
    entry("FrameOfReferenceUID", 0x0020, 0x0052, Vr::UI),
    entry("ImagesInAcquisition", 0x0020, 0x1002, Vr::IS),
    // Image pixel description
    entry("SamplesPerPixel", 0x0028, 0x0002, Vr::US),
    entry("NumberOfFrames", 0x0028, 0x0008, Vr::IS),
    entry("Rows", 0x0028, 0x0010, Vr::US),
    entry("Columns", 0x0028, 0x0011, Vr::US),
    entry("PixelSpacing", 0x0028, 0x0030, Vr::DS),
    entry("BitsAllocated", 0x0028, 0x0100, Vr::US),
    entry("BitsStored", 0x0028, 0x0101, Vr::US),
    entry("RescaleIntercept", 0x0028, 0x1052, Vr::DS),
    entry("RescaleSlope", 0x0028, 0x1053, Vr::DS),
    // Nuclear medicine
    entry("NumberOfEnergyWindows", 0x0054, 0x0011, Vr::US),
    entry("NumberOfDetectors", 0x0054, 0x0021, Vr::US),
    entry("NumberOfRotations", 0x0054, 0x0051, Vr::US),
    entry("NumberOfSlices", 0x0054, 0x0081, Vr::US),
    entry("ImageID", 0x0054, 0x0400, Vr::SH),
    entry("SeriesType", 0x0054, 0x1000, Vr::CS),
    entry("Units", 0x0054, 0x1001, Vr::CS),
    entry("DecayCorrection", 0x0054, 0x1102, Vr::CS),
    // Pixel data
    entry("PixelData", 0x7FE0, 0x0010, Vr::OW),
];

/// Resolve a keyword such as `SeriesNumber` to its tag.
pub fn tag_for_keyword(keyword: &str) -> Option<Tag> {
    ENTRIES.iter().find(|e| e.keyword == keyword).map(|e| e.tag)
}

pub fn keyword_for_tag(tag: Tag) -> Option<&'static str> {
    ENTRIES.iter().find(|e| e.tag == tag).map(|e| e.keyword)
}

/// VR to assume for an element read from an implicit VR data set.
pub fn vr_for_tag(tag: Tag) -> Option<Vr> {
    if tag.element == 0x0000 && !tag.is_delimiter() {
        return Some(Vr::UL);
    }
    ENTRIES.iter().find(|e| e.tag == tag).map(|e| e.vr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(tag_for_keyword("SeriesNumber"), Some(Tag::new(0x0020, 0x0011)));
        assert_eq!(tag_for_keyword("seriesnumber"), None);
        assert_eq!(keyword_for_tag(Tag::new(0x0010, 0x0010)), Some("PatientName"));
    }

    #[test]
    fn test_group_length_is_ul() {
        assert_eq!(vr_for_tag(Tag::new(0x0009, 0x0000)), Some(Vr::UL));
        assert_eq!(vr_for_tag(Tag::new(0x0009, 0x1001)), None);
    }

    #[test]
    fn test_keywords_are_unique() {
        for (i, a) in ENTRIES.iter().enumerate() {
            for b in &ENTRIES[i + 1..] {
                assert_ne!(a.keyword, b.keyword);
                assert_ne!(a.tag, b.tag);
            }
        }
    }
}
