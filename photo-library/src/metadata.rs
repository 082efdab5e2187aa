//! Capture-date extraction from embedded EXIF metadata.
//!
//! EXIF stores local wall-clock time without a zone, so everything here
//! returns [`NaiveDateTime`]. The caller decides which calendar it belongs to.

use chrono::NaiveDateTime;
use exif::{In, Tag, Value};
use std::io::Cursor;

/// `yyyy:MM:dd HH:mm:ss`
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Tags tried in order
const DATE_TAGS: [Tag; 2] = [Tag::DateTimeOriginal, Tag::DateTime];

/// Parses an EXIF date string. Trailing NULs and whitespace are ignored.
pub fn parse_exif_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(trimmed, EXIF_DATE_FORMAT).ok()
}

/// Reads the capture time from encoded image bytes.
///
/// Missing or unreadable metadata and unparsable dates all yield `None`.
pub fn capture_date_from_bytes(bytes: &[u8]) -> Option<NaiveDateTime> {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            log::debug!("No EXIF metadata: {}", e);
            return None;
        }
    };

    for tag in DATE_TAGS {
        let Some(field) = exif.get_field(tag, In::PRIMARY) else {
            continue;
        };
        if let Value::Ascii(ref parts) = field.value {
            for part in parts {
                let text = String::from_utf8_lossy(part);
                match parse_exif_datetime(&text) {
                    Some(date) => return Some(date),
                    None => log::debug!("Unparsable EXIF date {:?} in {}", text, tag),
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_exif_datetime() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 14)
            .unwrap()
            .and_hms_opt(18, 5, 33)
            .unwrap();
        assert_eq!(parse_exif_datetime("2024:07:14 18:05:33"), Some(expected));
        assert_eq!(parse_exif_datetime("2024:07:14 18:05:33\0"), Some(expected));
    }

    #[test]
    fn test_parse_exif_datetime_rejects_other_formats() {
        assert_eq!(parse_exif_datetime("2024-07-14 18:05:33"), None);
        assert_eq!(parse_exif_datetime("0000:00:00 00:00:00"), None);
        assert_eq!(parse_exif_datetime(""), None);
    }

    #[test]
    fn test_capture_date_without_metadata() {
        assert_eq!(capture_date_from_bytes(b"plain bytes"), None);

        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]));
        let jpeg = crate::thumbnail::encode_jpeg(&image::DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(capture_date_from_bytes(&jpeg), None);
    }
}
