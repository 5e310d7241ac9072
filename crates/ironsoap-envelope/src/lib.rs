pub mod decoder;
pub mod value;

pub use decoder::{EnvelopeDecoder, SOAP_11_NS, SOAP_12_NS, XmlEnvelopeDecoder};
pub use value::{Headers, Message, SoapValue};

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Envelope is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Invalid envelope: expected 'Envelope' in a SOAP namespace, found '{found}'")]
    NotAnEnvelope { found: String },

    #[error("SOAP envelope must contain a Body element")]
    MissingBody,
}

impl EnvelopeError {
    /// Stable identifier used as `faultcode` when a decode failure is turned
    /// into a fault message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Xml(_) => "xml",
            Self::Utf8(_) => "utf8",
            Self::NotAnEnvelope { .. } => "envelope",
            Self::MissingBody => "body",
        }
    }
}
