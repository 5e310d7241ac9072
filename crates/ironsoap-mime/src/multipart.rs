use std::collections::HashMap;

use tracing::{debug, instrument, trace};

use crate::{CRLF, ContentTypeParams, HEADER_END, find_subsequence, latin1_to_string};

const CONTENT_TYPE_TAG: &[u8] = b"content-type:";
const CONTENT_ID_TAG: &[u8] = b"content-id:";

/// Parts of a multipart body keyed by their `Content-ID`.
pub type MimeParts = HashMap<String, MimePart>;

/// One segment of a multipart body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimePart {
    pub content_id: String,
    pub content_type: Option<String>,
    pub charset: Option<String>,
    pub body: Vec<u8>,
}

impl MimePart {
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    fn apply_header(&mut self, header: &[u8]) {
        if let Some(value) = strip_tag(header, CONTENT_TYPE_TAG) {
            let params = ContentTypeParams::parse(latin1_to_string(value).trim());
            self.content_type = params.media_type().map(str::to_owned);
            self.charset = params.get("charset").map(str::to_owned);
        } else if let Some(value) = strip_tag(header, CONTENT_ID_TAG) {
            latin1_to_string(value).trim().clone_into(&mut self.content_id);
        } else {
            trace!(header = %latin1_to_string(header), "ignoring part header");
        }
    }
}

/// Split a part into its header lines and body.
///
/// The header block ends at the first `\r\n\r\n`. Without that marker the part
/// has no headers and an empty body.
pub fn extract_headers(data: &[u8]) -> (Vec<&[u8]>, &[u8]) {
    let Some(header_end) = find_subsequence(data, HEADER_END, 0) else {
        return (Vec::new(), &[]);
    };

    let headers = split_lines(&data[..header_end]);
    let body = &data[header_end + HEADER_END.len()..];

    (headers, body)
}

/// Split `data` into parts delimited by `--<boundary>\r\n` lines.
///
/// Parts without a `Content-ID` are dropped. A later part with the same
/// `Content-ID` replaces an earlier one.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn split_parts(boundary: &str, data: &[u8]) -> MimeParts {
    let marker = boundary_line(boundary);
    let closing = closing_delimiter(boundary);
    let mut parts = MimeParts::new();

    let mut marker_index = find_subsequence(data, &marker, 0);
    while let Some(index) = marker_index {
        let start = index + marker.len();
        let next = find_subsequence(data, &marker, start);

        let segment = match next {
            Some(end) => &data[start..end],
            // The last part runs to the end of the body, or to the closing
            // delimiter when there is one.
            None => match find_subsequence(data, &closing, start) {
                Some(end) => &data[start..end + CRLF.len()],
                None => &data[start..],
            },
        };

        let (headers, body) = extract_headers(segment);

        let mut part = MimePart {
            // The CRLF in front of a delimiter belongs to the delimiter.
            body: body.strip_suffix(CRLF).unwrap_or(body).to_vec(),
            ..MimePart::default()
        };

        for header in headers {
            part.apply_header(header);
        }

        if part.content_id.is_empty() {
            debug!(
                offset = start,
                header_found = !segment.is_empty() && find_subsequence(segment, HEADER_END, 0).is_some(),
                "dropping multipart segment without content-id"
            );
        } else {
            debug!(
                content_id = %part.content_id,
                content_type = ?part.content_type,
                body_len = part.body.len(),
                "extracted multipart segment"
            );
            if let Some(previous) = parts.insert(part.content_id.clone(), part) {
                debug!(content_id = %previous.content_id, "duplicate content-id, keeping the later part");
            }
        }

        marker_index = next;
    }

    debug!(part_count = parts.len(), "multipart split finished");
    parts
}

/// `--<boundary>\r\n`
pub fn boundary_line(boundary: &str) -> Vec<u8> {
    let mut line = Vec::with_capacity(boundary.len() + 4);
    line.extend_from_slice(b"--");
    line.extend_from_slice(boundary.as_bytes());
    line.extend_from_slice(CRLF);
    line
}

/// `\r\n--<boundary>--`
fn closing_delimiter(boundary: &str) -> Vec<u8> {
    let mut line = Vec::with_capacity(boundary.len() + 6);
    line.extend_from_slice(CRLF);
    line.extend_from_slice(b"--");
    line.extend_from_slice(boundary.as_bytes());
    line.extend_from_slice(b"--");
    line
}

fn split_lines(block: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    while let Some(end) = find_subsequence(block, CRLF, start) {
        lines.push(&block[start..end]);
        start = end + CRLF.len();
    }
    lines.push(&block[start..]);
    lines
}

fn strip_tag<'a>(header: &'a [u8], tag: &[u8]) -> Option<&'a [u8]> {
    if header.len() >= tag.len() && header[..tag.len()].eq_ignore_ascii_case(tag) {
        Some(&header[tag.len()..])
    } else {
        None
    }
}
