use tracing::{debug, warn};

use crate::{ContentTypeParams, MimePart, MimeParts, split_parts};

pub const MULTIPART_RELATED: &str = "multipart/related";
pub const APPLICATION_XOP_XML: &str = "application/xop+xml";
pub const TEXT_XML: &str = "text/xml";

/// `true` when the media type is `multipart/related` and the `type`
/// parameter is `application/xop+xml`, both compared case-insensitively.
pub fn is_mtom_xop(params: &ContentTypeParams) -> bool {
    params.media_type_eq(MULTIPART_RELATED) && params.param_eq("type", APPLICATION_XOP_XML)
}

/// Framing information of an MTOM/XOP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XopPackage {
    boundary: String,
    start: Option<String>,
}

impl XopPackage {
    /// Classify a `Content-Type` and pull out the boundary and root part id.
    ///
    /// Returns `None` unless the header is MTOM/XOP, its `start-info` names
    /// `application/xop+xml` or `text/xml`, and a non-empty boundary is given.
    /// Callers treat `None` as a plain, non-multipart body.
    pub fn detect(params: &ContentTypeParams) -> Option<Self> {
        if !is_mtom_xop(params) {
            return None;
        }

        let start_info = params.get("start-info").unwrap_or_default();
        if !start_info.eq_ignore_ascii_case(APPLICATION_XOP_XML)
            && !start_info.eq_ignore_ascii_case(TEXT_XML)
        {
            warn!(
                start_info,
                "MTOM/XOP root part has an unrecognized start-info, decoding whole body"
            );
            return None;
        }

        let boundary = params.get("boundary").filter(|b| !b.is_empty())?;

        let package = Self {
            boundary: boundary.to_owned(),
            start: params.get("start").map(str::to_owned),
        };
        debug!(?package, "detected MTOM/XOP package");

        Some(package)
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Content-ID of the root part, when the header names one.
    pub fn start(&self) -> Option<&str> {
        self.start.as_deref()
    }

    pub fn split(&self, data: &[u8]) -> MimeParts {
        split_parts(&self.boundary, data)
    }

    /// Pick the root part out of already split parts.
    pub fn root_part<'p>(&self, parts: &'p MimeParts) -> Option<&'p MimePart> {
        self.start.as_deref().and_then(|start| parts.get(start))
    }

    /// Split `data` and take the root part out, discarding every other part.
    pub fn into_root_part(self, data: &[u8]) -> Option<MimePart> {
        let mut parts = split_parts(&self.boundary, data);
        let start = self.start?;
        let root = parts.remove(&start);
        if root.is_none() {
            debug!(
                start = %start,
                available = ?parts.keys().collect::<Vec<_>>(),
                "root part not found among multipart segments"
            );
        }
        root
    }
}
