//! Magic-byte validation before a full decode.

/// Check if the leading bytes match a format the codec can decode.
///
/// Only the first 12 bytes are inspected; shorter slices are accepted where
/// the signature fits.
pub fn is_valid_image_header(header: &[u8]) -> bool {
    if header.len() < 4 {
        return false;
    }

    // JPEG: FF D8 FF
    if header[0] == 0xFF && header[1] == 0xD8 && header[2] == 0xFF {
        return true;
    }

    // PNG: 89 50 4E 47
    if header[0] == 0x89 && header[1] == b'P' && header[2] == b'N' && header[3] == b'G' {
        return true;
    }

    // GIF: GIF8
    if header[0] == b'G' && header[1] == b'I' && header[2] == b'F' && header[3] == b'8' {
        return true;
    }

    // WebP: RIFF....WEBP
    if header[0] == b'R' && header[1] == b'I' && header[2] == b'F' && header[3] == b'F' {
        if header.len() >= 12 {
            return &header[8..12] == b"WEBP";
        }
        return true;
    }

    // BMP: BM
    if header[0] == b'B' && header[1] == b'M' {
        return true;
    }

    // TIFF: II (little-endian) or MM (big-endian) followed by version 42
    let is_tiff_le = header[0] == b'I' && header[1] == b'I' && header[2] == 0x2A && header[3] == 0x00;
    let is_tiff_be = header[0] == b'M' && header[1] == b'M' && header[2] == 0x00 && header[3] == 0x2A;
    is_tiff_le || is_tiff_be
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes_jpeg() {
        let header = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(is_valid_image_header(&header));
    }

    #[test]
    fn test_magic_bytes_png() {
        let header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert!(is_valid_image_header(&header));
    }

    #[test]
    fn test_magic_bytes_webp() {
        let header = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'E', b'B', b'P'];
        assert!(is_valid_image_header(&header));
    }

    #[test]
    fn test_magic_bytes_riff_but_not_webp() {
        let header = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'A', b'V', b'E'];
        assert!(!is_valid_image_header(&header));
    }

    #[test]
    fn test_magic_bytes_invalid() {
        let header = [0x00, 0x00, 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(!is_valid_image_header(&header));
    }

    #[test]
    fn test_magic_bytes_tiff() {
        assert!(is_valid_image_header(&[b'I', b'I', 0x2A, 0x00]));
        assert!(is_valid_image_header(&[b'M', b'M', 0x00, 0x2A]));
    }

    #[test]
    fn test_magic_bytes_bare_ii_rejected() {
        // Bare "II" without TIFF version bytes should not match
        let header = [b'I', b'I', 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(!is_valid_image_header(&header));
    }

    #[test]
    fn test_short_header_rejected() {
        assert!(!is_valid_image_header(&[0xFF, 0xD8]));
    }
}
