//! EXIF metadata extraction from encoded image bytes.

use exif::{In, Reader, Tag, Value};
use std::io::Cursor;

use crate::types::ExifData;

/// Extract EXIF data from an encoded image.
///
/// Returns `None` if the container has no EXIF block or none of the fields
/// we report are present. Extraction is lenient: partial data is returned.
pub fn extract_exif(bytes: &[u8]) -> Option<ExifData> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    let data = ExifData {
        captured_at: get_datetime(&exif),
        camera_make: get_string(&exif, Tag::Make),
        camera_model: get_string(&exif, Tag::Model),
        iso: get_u32(&exif, Tag::PhotographicSensitivity),
        orientation: get_u32(&exif, Tag::Orientation),
    };

    if data.is_empty() {
        None
    } else {
        Some(data)
    }
}

fn get_string(exif: &exif::Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY).map(|f| {
        let s = f.display_value().to_string();
        s.trim_matches('"').to_string()
    })
}

fn get_u32(exif: &exif::Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Short(v) => v.first().map(|&x| x as u32),
            Value::Long(v) => v.first().copied(),
            _ => None,
        })
}

/// Capture time, preferring DateTimeOriginal over DateTime.
fn get_datetime(exif: &exif::Exif) -> Option<String> {
    exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))
        .map(|f| {
            let s = f.display_value().to_string();
            s.trim_matches('"').to_string()
        })
}
