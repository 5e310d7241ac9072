use std::fmt::Display;

use hyper::http::StatusCode;
use tracing::{debug, trace};

/// Numeric failure codes reported by a transport. The value ends up as the
/// `faultcode` of the message when a call fails below the SOAP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum TransportErrorCode {
    ConnectionRefused = 1,
    RemoteHostClosed = 2,
    HostNotFound = 3,
    Timeout = 4,
    OperationCanceled = 5,
    TlsHandshakeFailed = 6,
    UnknownNetwork = 99,
    ContentAccessDenied = 201,
    ContentOperationNotPermitted = 202,
    ContentNotFound = 203,
    AuthenticationRequired = 204,
    ContentConflict = 206,
    UnknownContent = 299,
    ProtocolFailure = 399,
    InternalServerError = 401,
    OperationNotImplemented = 402,
    ServiceUnavailable = 403,
    UnknownServer = 499,
}

impl TransportErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Error code for an HTTP status, `None` for statuses below 400.
    pub fn from_status(status: u16) -> Option<Self> {
        let code = match status {
            0..=399 => return None,
            401 | 407 => Self::AuthenticationRequired,
            403 => Self::ContentAccessDenied,
            404 | 410 => Self::ContentNotFound,
            405 => Self::ContentOperationNotPermitted,
            409 => Self::ContentConflict,
            400..=499 => Self::UnknownContent,
            500 => Self::InternalServerError,
            501 => Self::OperationNotImplemented,
            503 => Self::ServiceUnavailable,
            500..=599 => Self::UnknownServer,
            _ => Self::ProtocolFailure,
        };

        Some(code)
    }
}

impl Display for TransportErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{description} (transport error {code})")]
pub struct TransportError {
    pub code: TransportErrorCode,
    pub description: String,
}

impl TransportError {
    pub fn new(code: TransportErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    pub(crate) fn released() -> Self {
        Self::new(
            TransportErrorCode::OperationCanceled,
            "transport reply was released before decoding",
        )
    }

    fn from_status(status: u16) -> Option<Self> {
        let code = TransportErrorCode::from_status(status)?;
        let reason = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown Status");

        Some(Self::new(code, format!("server replied: {status} {reason}")))
    }
}

/// The transport side of one remote call.
///
/// `read_all` is one-shot: it hands over the body and leaves nothing behind,
/// so a second call returns an empty buffer. `release` must tolerate being
/// called on an already released reply.
pub trait TransportReply {
    fn is_finished(&self) -> bool;

    fn error(&self) -> Option<TransportError>;

    fn status_code(&self) -> Option<u16>;

    fn content_type(&self) -> Option<String>;

    fn read_all(&mut self) -> Vec<u8>;

    fn release(&mut self);
}

#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A [`TransportReply`] over an HTTP exchange that completes in one piece.
#[derive(Debug, Default)]
pub struct HttpReply {
    response: Option<HttpResponse>,
    error: Option<TransportError>,
    finished: bool,
    released: bool,
}

impl HttpReply {
    /// A reply whose exchange is still in flight.
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn from_response(response: HttpResponse) -> Self {
        let mut reply = Self::pending();
        reply.finish(response);
        reply
    }

    /// A reply for an exchange that failed before any response arrived.
    pub fn failed(error: TransportError) -> Self {
        let mut reply = Self::pending();
        reply.fail(error);
        reply
    }

    pub fn finish(&mut self, response: HttpResponse) {
        debug!(
            status_code = response.status_code,
            body_len = response.body.len(),
            "HTTP reply finished"
        );
        self.error = TransportError::from_status(response.status_code);
        self.response = Some(response);
        self.finished = true;
    }

    pub fn fail(&mut self, error: TransportError) {
        debug!(%error, "HTTP reply failed");
        self.error = Some(error);
        self.finished = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl TransportReply for HttpReply {
    fn is_finished(&self) -> bool {
        self.finished
    }

    fn error(&self) -> Option<TransportError> {
        self.error.clone()
    }

    fn status_code(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status_code)
    }

    fn content_type(&self) -> Option<String> {
        self.response
            .as_ref()
            .and_then(|r| r.header("Content-Type"))
            .map(str::to_owned)
    }

    fn read_all(&mut self) -> Vec<u8> {
        self.response
            .as_mut()
            .map(|r| std::mem::take(&mut r.body))
            .unwrap_or_default()
    }

    fn release(&mut self) {
        if self.released {
            trace!("HTTP reply already released");
            return;
        }

        self.released = true;
        if let Some(response) = self.response.as_mut() {
            response.body = Vec::new();
        }
        debug!("HTTP reply released");
    }
}
