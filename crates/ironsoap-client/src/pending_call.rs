use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use ironsoap_envelope::{EnvelopeDecoder, Headers, Message, SoapValue, XmlEnvelopeDecoder};
use ironsoap_mime::{ContentTypeParams, MimePart, XopPackage};
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use crate::{
    FAULT_STATUS,
    config::DecodeConfig,
    transport::{TransportError, TransportReply},
};

/// Result of decoding a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedReply {
    pub message: Message,
    pub headers: Headers,
}

impl DecodedReply {
    fn transport_fault(error: &TransportError) -> Self {
        Self {
            message: Message::fault(error.code.to_string(), error.description.clone()),
            headers: Headers::new(),
        }
    }
}

/// Handle on an in-flight SOAP call.
///
/// Clones share the same completion state. The reply is only observed: its
/// owner may drop it at any time, and the state releases it on teardown only
/// when it is still alive. The response is decoded once, on the first call to
/// one of the `return_*` accessors, and cached for every handle.
pub struct PendingCall<R: TransportReply> {
    inner: Arc<CallState<R>>,
}

impl<R: TransportReply> Clone for PendingCall<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: TransportReply> std::fmt::Debug for PendingCall<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCall")
            .field("id", &self.inner.id)
            .field("reply_alive", &(self.inner.reply.strong_count() > 0))
            .field("decoded", &self.inner.decoded.get().is_some())
            .finish_non_exhaustive()
    }
}

impl<R: TransportReply> PendingCall<R> {
    /// Track `reply` with the default XML decoder and configuration.
    /// `request_buffer` is the scratch buffer the request was built in.
    pub fn new(reply: &Arc<Mutex<R>>, request_buffer: Vec<u8>) -> Self {
        Self::with_decoder(
            reply,
            request_buffer,
            Arc::new(XmlEnvelopeDecoder),
            DecodeConfig::default(),
        )
    }

    pub fn with_decoder(
        reply: &Arc<Mutex<R>>,
        request_buffer: Vec<u8>,
        decoder: Arc<dyn EnvelopeDecoder + Send + Sync>,
        config: DecodeConfig,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(call_id = %id, request_len = request_buffer.len(), "pending call created");

        Self {
            inner: Arc::new(CallState {
                id,
                reply: Arc::downgrade(reply),
                request_buffer,
                decoder,
                config,
                decoded: OnceLock::new(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Whether the transport finished. Never triggers decoding. A reply that
    /// its owner already dropped will not make progress and counts as finished.
    pub fn is_finished(&self) -> bool {
        self.inner
            .reply
            .upgrade()
            .is_none_or(|reply| lock(&reply).is_finished())
    }

    pub fn is_decoded(&self) -> bool {
        self.inner.decoded.get().is_some()
    }

    pub fn request_buffer(&self) -> &[u8] {
        &self.inner.request_buffer
    }

    /// Decoded message and headers, decoding on first use.
    pub fn reply(&self) -> &DecodedReply {
        self.inner.decoded.get_or_init(|| self.inner.decode())
    }

    pub fn return_message(&self) -> Message {
        self.reply().message.clone()
    }

    pub fn return_headers(&self) -> Headers {
        self.reply().headers.clone()
    }

    /// First argument of the message, if any.
    pub fn return_value(&self) -> Option<SoapValue> {
        self.reply().message.arguments().first().cloned()
    }
}

struct CallState<R: TransportReply> {
    id: Uuid,
    reply: Weak<Mutex<R>>,
    request_buffer: Vec<u8>,
    decoder: Arc<dyn EnvelopeDecoder + Send + Sync>,
    config: DecodeConfig,
    decoded: OnceLock<DecodedReply>,
}

impl<R: TransportReply> CallState<R> {
    #[instrument(name = "pending_call.decode", skip(self), fields(call_id = %self.id))]
    fn decode(&self) -> DecodedReply {
        let Some(handle) = self.reply.upgrade() else {
            let error = TransportError::released();
            warn!(%error, "cannot decode reply");
            return DecodedReply::transport_fault(&error);
        };
        let mut reply = lock(&handle);

        if !reply.is_finished() && self.config.warn_unfinished {
            warn!("decoding reply before the transport finished");
        }

        let mut decoded = DecodedReply::default();

        if let Some(error) = reply.error() {
            decoded = DecodedReply::transport_fault(&error);

            let status = reply.status_code();
            if status != Some(FAULT_STATUS) {
                if self.config.dump_payloads {
                    debug!(error = %error.description, "transport error");
                }
                info!(code = %error.code, ?status, "call failed at transport level");
                return decoded;
            }

            debug!("HTTP 500 reply, decoding the fault carried in the body");
        }

        let data = reply.read_all();
        let content_type = reply.content_type();
        drop(reply);

        if self.config.dump_payloads {
            debug!(
                content_type = ?content_type,
                payload = %String::from_utf8_lossy(&data),
                "response payload"
            );
        }

        if let Some(root) = xop_root_part(content_type.as_deref(), &data) {
            debug!(content_id = %root.content_id, "decoding MTOM/XOP root part");
            return self.decode_envelope(&root.body, decoded);
        }

        if !data.is_empty() {
            return self.decode_envelope(&data, decoded);
        }

        trace!("empty response body");
        decoded
    }

    /// Run the envelope decoder. A decode failure becomes a fault message
    /// unless a transport fault is already recorded, in which case that one
    /// is kept.
    fn decode_envelope(&self, xml: &[u8], previous: DecodedReply) -> DecodedReply {
        match self.decoder.decode(xml) {
            Ok((message, headers)) => DecodedReply { message, headers },
            Err(error) if previous.message.is_fault() => {
                warn!(%error, "fault body is not a SOAP envelope, keeping the transport fault");
                previous
            }
            Err(error) => {
                warn!(%error, "failed to decode SOAP envelope");
                DecodedReply {
                    message: Message::fault(error.code(), error.to_string()),
                    headers: Headers::new(),
                }
            }
        }
    }
}

impl<R: TransportReply> Drop for CallState<R> {
    fn drop(&mut self) {
        match self.reply.upgrade() {
            Some(handle) => {
                lock(&handle).release();
                debug!(call_id = %self.id, "transport reply released");
            }
            None => {
                debug!(call_id = %self.id, "transport reply already destroyed by its owner");
            }
        }

        trace!(
            call_id = %self.id,
            request_len = self.request_buffer.len(),
            "request buffer freed"
        );
    }
}

/// Root part of an MTOM/XOP body, or `None` when the body should be decoded
/// whole. Each guard is one fallback: no header, not MTOM/XOP (or unknown
/// `start-info`, or no boundary), root part missing from the split.
fn xop_root_part(content_type: Option<&str>, data: &[u8]) -> Option<MimePart> {
    let params = ContentTypeParams::parse(content_type?);
    let package = XopPackage::detect(&params)?;
    package.into_root_part(data)
}

fn lock<R>(reply: &Mutex<R>) -> MutexGuard<'_, R> {
    reply.lock().unwrap_or_else(PoisonError::into_inner)
}
