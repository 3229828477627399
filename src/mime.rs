/// Bytes of the file head needed to recognise every supported signature.
pub const SNIFF_LEN: usize = 16;

const FALLBACK: &str = "application/octet-stream";

pub fn detect_content_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x47, 0x49, 0x46, 0x38, ..] => "image/gif",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => "image/tiff",
        [_, _, _, _, 0x66, 0x74, 0x79, 0x70, 0x61, 0x76, 0x69, 0x66, ..] => "image/avif",
        _ if looks_like_svg(bytes) => "image/svg+xml",
        _ => {
            tracing::debug!(
                "Unrecognized file signature (first 4 bytes: {:02X?}), sending as {}",
                &bytes[..bytes.len().min(4)],
                FALLBACK
            );
            FALLBACK
        }
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let head = &bytes[start..];
    head.starts_with(b"<svg") || head.starts_with(b"<?xml")
}
