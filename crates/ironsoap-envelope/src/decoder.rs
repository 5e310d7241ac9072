use roxmltree::{Document, Node};
use tracing::{debug, instrument};

use crate::{
    EnvelopeError,
    value::{FAULT_CODE, FAULT_STRING, Headers, Message, SoapValue},
};

pub const SOAP_11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Turns the bytes of a SOAP envelope into a message and its headers.
pub trait EnvelopeDecoder {
    fn decode(&self, xml: &[u8]) -> Result<(Message, Headers), EnvelopeError>;
}

impl<F> EnvelopeDecoder for F
where
    F: Fn(&[u8]) -> Result<(Message, Headers), EnvelopeError>,
{
    fn decode(&self, xml: &[u8]) -> Result<(Message, Headers), EnvelopeError> {
        self(xml)
    }
}

/// Decoder for SOAP 1.1 and SOAP 1.2 envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlEnvelopeDecoder;

impl EnvelopeDecoder for XmlEnvelopeDecoder {
    #[instrument(name = "envelope.decode", skip(self, xml), fields(xml_len = xml.len()), err)]
    fn decode(&self, xml: &[u8]) -> Result<(Message, Headers), EnvelopeError> {
        let text = std::str::from_utf8(xml)?;
        let text = text.trim_start_matches('\u{feff}').trim_start();
        let document = Document::parse(text)?;

        let envelope = document.root_element();
        if envelope.tag_name().name() != "Envelope" || soap_namespace(envelope).is_none() {
            return Err(EnvelopeError::NotAnEnvelope {
                found: qualified_name(envelope),
            });
        }

        let headers: Headers = envelope
            .children()
            .find(|child| is_soap_element(*child, "Header"))
            .map(|header| elements(header).map(decode_value).collect::<Vec<_>>())
            .unwrap_or_default()
            .into();

        let body = envelope
            .children()
            .find(|child| is_soap_element(*child, "Body"))
            .ok_or(EnvelopeError::MissingBody)?;

        let message = match elements(body).next() {
            None => {
                debug!("empty SOAP body");
                Message::default()
            }
            Some(fault) if is_soap_element(fault, "Fault") => decode_fault(fault),
            Some(response) => {
                let mut message = Message::new(
                    response.tag_name().name(),
                    response.tag_name().namespace().map(str::to_owned),
                );
                for argument in elements(response) {
                    message.push_argument(decode_value(argument));
                }
                message
            }
        };

        debug!(
            message = message.name(),
            fault = message.is_fault(),
            arguments = message.arguments().len(),
            "decoded SOAP envelope"
        );

        Ok((message, headers))
    }
}

fn decode_fault(fault: Node<'_, '_>) -> Message {
    let mut message = Message::default();

    if fault.tag_name().namespace() == Some(SOAP_12_NS) {
        for child in elements(fault) {
            match child.tag_name().name() {
                "Code" => {
                    let code = child
                        .children()
                        .find(|c| c.tag_name().name() == "Value")
                        .map(text_of)
                        .unwrap_or_default();
                    message.add_argument(FAULT_CODE, code);
                }
                "Reason" => {
                    let reason = child
                        .children()
                        .find(|c| c.tag_name().name() == "Text")
                        .map(text_of)
                        .unwrap_or_default();
                    message.add_argument(FAULT_STRING, reason);
                }
                "Role" => message.add_argument("faultactor", text_of(child)),
                "Detail" => {
                    let mut detail = decode_value(child);
                    "detail".clone_into(&mut detail.name);
                    message.push_argument(detail);
                }
                _ => message.push_argument(decode_value(child)),
            }
        }
    } else {
        for child in elements(fault) {
            message.push_argument(decode_value(child));
        }
    }

    message.mark_fault();
    message
}

fn decode_value(node: Node<'_, '_>) -> SoapValue {
    let children: Vec<SoapValue> = elements(node).map(decode_value).collect();
    let value = if children.is_empty() {
        text_of(node)
    } else {
        String::new()
    };

    SoapValue {
        name: node.tag_name().name().to_owned(),
        namespace: node.tag_name().namespace().map(str::to_owned),
        value,
        children,
    }
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

fn text_of(node: Node<'_, '_>) -> String {
    node.children()
        .filter(Node::is_text)
        .filter_map(|c| c.text())
        .collect::<String>()
        .trim()
        .to_owned()
}

fn soap_namespace<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.tag_name()
        .namespace()
        .filter(|ns| *ns == SOAP_11_NS || *ns == SOAP_12_NS)
}

fn is_soap_element(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && soap_namespace(node).is_some()
}

fn qualified_name(node: Node<'_, '_>) -> String {
    match node.tag_name().namespace() {
        Some(ns) => format!("{{{ns}}}{}", node.tag_name().name()),
        None => node.tag_name().name().to_owned(),
    }
}
