//! Completion side of a SOAP call: holds the transport reply of an in-flight
//! request and lazily decodes the response into a [`Message`] and
//! [`Headers`], handling plain XML bodies as well as MTOM/XOP packages.

pub mod config;
pub mod pending_call;
pub mod transport;

pub use config::DecodeConfig;
pub use ironsoap_envelope::{
    EnvelopeDecoder, EnvelopeError, Headers, Message, SoapValue, XmlEnvelopeDecoder,
};
pub use pending_call::{DecodedReply, PendingCall};
pub use transport::{
    HttpReply, HttpResponse, TransportError, TransportErrorCode, TransportReply,
};

/// HTTP status a SOAP server uses to carry a fault in the response body.
pub const FAULT_STATUS: u16 = 500;
