//! MIME plumbing for SOAP responses: `Content-Type` parameter parsing,
//! `multipart/related` splitting and MTOM/XOP package detection.
//!
//! Nothing in this crate rejects input. Malformed headers or framing produce
//! partial results and the caller decides how to fall back.

pub mod content_type;
pub mod multipart;
pub mod xop;

pub use content_type::ContentTypeParams;
pub use multipart::{MimePart, MimeParts, boundary_line, extract_headers, split_parts};
pub use xop::{XopPackage, is_mtom_xop};

pub const CRLF: &[u8] = b"\r\n";

/// Separator between a part's header block and its body.
pub const HEADER_END: &[u8] = b"\r\n\r\n";

/// Find the position of `needle` in `haystack`, starting the search at `from`.
pub(crate) fn find_subsequence(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }

    if needle.is_empty() {
        return Some(from);
    }

    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Header bytes are latin-1 on the wire; map each byte to the same code point.
pub(crate) fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
