use ironsoap_client::{
    DecodeConfig, EnvelopeDecoder, EnvelopeError, Headers, HttpReply, HttpResponse, Message,
    PendingCall, TransportError, TransportErrorCode, TransportReply, XmlEnvelopeDecoder,
};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "uuid:0aa0b7f4-4b1f-4d4c-9c33-cc0fbd0c6b8e";

    /// Decoder stub that records every payload it is handed.
    #[derive(Default)]
    struct RecordingDecoder {
        calls: AtomicUsize,
        inputs: Mutex<Vec<Vec<u8>>>,
    }

    impl RecordingDecoder {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn inputs(&self) -> Vec<Vec<u8>> {
            self.inputs.lock().unwrap().clone()
        }
    }

    impl EnvelopeDecoder for RecordingDecoder {
        fn decode(&self, xml: &[u8]) -> Result<(Message, Headers), EnvelopeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inputs.lock().unwrap().push(xml.to_vec());
            XmlEnvelopeDecoder.decode(xml)
        }
    }

    /// Transport stub that can hand out data before it reports completion.
    struct ScriptedReply {
        finished: bool,
        content_type: Option<String>,
        body: Vec<u8>,
        releases: usize,
    }

    impl TransportReply for ScriptedReply {
        fn is_finished(&self) -> bool {
            self.finished
        }

        fn error(&self) -> Option<TransportError> {
            None
        }

        fn status_code(&self) -> Option<u16> {
            Some(200)
        }

        fn content_type(&self) -> Option<String> {
            self.content_type.clone()
        }

        fn read_all(&mut self) -> Vec<u8> {
            std::mem::take(&mut self.body)
        }

        fn release(&mut self) {
            self.releases += 1;
        }
    }

    fn resource(name: &str) -> Vec<u8> {
        fs::read(format!("tests/resources/{name}"))
            .unwrap_or_else(|e| panic!("Failed to read {name}: {e}"))
    }

    fn http_reply(status_code: u16, content_type: &str, body: Vec<u8>) -> Arc<Mutex<HttpReply>> {
        Arc::new(Mutex::new(HttpReply::from_response(HttpResponse {
            status_code,
            headers: vec![("Content-Type".to_owned(), content_type.to_owned())],
            body,
        })))
    }

    fn recording_call<R: TransportReply>(
        reply: &Arc<Mutex<R>>,
    ) -> (PendingCall<R>, Arc<RecordingDecoder>) {
        let decoder = Arc::new(RecordingDecoder::default());
        let call = PendingCall::with_decoder(
            reply,
            b"<request/>".to_vec(),
            decoder.clone(),
            DecodeConfig::builder().dump_payloads(true).build(),
        );
        (call, decoder)
    }

    fn mtom_content_type(start: &str, start_info: &str) -> String {
        format!(
            r#"multipart/related; type="application/xop+xml"; start="{start}"; start-info="{start_info}"; boundary="{BOUNDARY}""#
        )
    }

    fn mtom_body(root_id: &str, root: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            b"Content-Type: application/xop+xml; charset=UTF-8; type=\"text/xml\"\r\n",
        );
        body.extend_from_slice(b"Content-Transfer-Encoding: binary\r\n");
        body.extend_from_slice(format!("Content-ID: {root_id}\r\n\r\n").as_bytes());
        body.extend_from_slice(root);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Type: application/pdf\r\n");
        body.extend_from_slice(b"Content-ID: <attachment@files>\r\n\r\n");
        body.extend_from_slice(b"%PDF-1.4\x00\x01\x02\xff");
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_plain_xml_reply() {
        let reply = http_reply(200, "text/xml; charset=utf-8", resource("echo_response.xml"));
        let (call, decoder) = recording_call(&reply);

        assert!(call.is_finished());
        assert!(!call.is_decoded(), "is_finished must not decode");

        let message = call.return_message();
        assert!(!message.is_fault());
        assert_eq!(message.name(), "EchoResponse");

        let value = call.return_value().expect("first argument");
        assert_eq!(value.name, "result");
        assert_eq!(value.value, "hello world");

        let headers = call.return_headers();
        assert_eq!(headers.header("RequestId").map(|h| h.value.as_str()), Some("42"));

        assert_eq!(decoder.calls(), 1);
        assert!(logs_contain("response payload"));
    }

    #[test]
    fn test_decode_runs_once() {
        let reply = http_reply(200, "text/xml", resource("echo_response.xml"));
        let (call, decoder) = recording_call(&reply);
        let second_handle = call.clone();

        let first = call.return_message();
        for _ in 0..5 {
            assert_eq!(call.return_message(), first);
            assert_eq!(second_handle.return_message(), first);
            let _ = call.return_headers();
            let _ = second_handle.return_value();
        }

        assert_eq!(decoder.calls(), 1);
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_connection_error_skips_body() {
        let reply = Arc::new(Mutex::new(HttpReply::failed(TransportError::new(
            TransportErrorCode::ConnectionRefused,
            "Connection refused",
        ))));
        let (call, decoder) = recording_call(&reply);

        let message = call.return_message();

        assert!(message.is_fault());
        assert_eq!(message.fault_code(), Some("1"));
        assert_eq!(message.fault_string(), Some("Connection refused"));
        assert!(call.return_headers().is_empty());
        assert_eq!(decoder.calls(), 0);
        assert!(logs_contain("call failed at transport level"));
    }

    #[test]
    fn test_non_500_http_error_skips_body() {
        let reply = http_reply(404, "text/xml", resource("server_fault.xml"));
        let (call, decoder) = recording_call(&reply);

        let message = call.return_message();

        assert!(message.is_fault());
        assert_eq!(message.fault_code(), Some("203"));
        assert_eq!(message.fault_string(), Some("server replied: 404 Not Found"));
        assert_eq!(decoder.calls(), 0);
    }

    #[test]
    fn test_http_500_decodes_fault_body() {
        let body = resource("server_fault.xml");
        let reply = http_reply(500, "text/xml; charset=utf-8", body.clone());
        let (call, decoder) = recording_call(&reply);

        let message = call.return_message();

        assert_eq!(decoder.calls(), 1);
        assert_eq!(decoder.inputs(), vec![body]);
        assert!(message.is_fault());
        assert_eq!(message.fault_code(), Some("soap:Client"));
        assert_eq!(message.fault_string(), Some("Unknown operation: Ech0"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_http_500_with_garbage_keeps_transport_fault() {
        let reply = http_reply(500, "text/html", b"<html><body>Oops".to_vec());
        let (call, decoder) = recording_call(&reply);

        let message = call.return_message();

        assert_eq!(decoder.calls(), 1);
        assert!(message.is_fault());
        assert_eq!(message.fault_code(), Some("401"));
        assert_eq!(
            message.fault_string(),
            Some("server replied: 500 Internal Server Error")
        );
        assert!(logs_contain("keeping the transport fault"));
    }

    #[test]
    fn test_http_500_with_empty_body_keeps_transport_fault() {
        let reply = http_reply(500, "text/xml", Vec::new());
        let (call, decoder) = recording_call(&reply);

        let message = call.return_message();

        assert_eq!(decoder.calls(), 0);
        assert_eq!(message.fault_code(), Some("401"));
    }

    #[test]
    fn test_undecodable_success_body_becomes_fault() {
        let reply = http_reply(200, "text/xml", b"not xml at all".to_vec());
        let (call, _) = recording_call(&reply);

        let message = call.return_message();

        assert!(message.is_fault());
        assert_eq!(message.fault_code(), Some("xml"));
        assert!(message.fault_string().is_some_and(|s| s.starts_with("Invalid XML")));
    }

    #[test]
    fn test_mtom_root_part_is_decoded() {
        let root = resource("mtom_root.xml");
        let reply = http_reply(
            200,
            &mtom_content_type("<root@files>", "text/xml"),
            mtom_body("<root@files>", &root),
        );
        let (call, decoder) = recording_call(&reply);

        let message = call.return_message();

        assert_eq!(decoder.inputs(), vec![root]);
        assert!(!message.is_fault());
        assert_eq!(message.name(), "DownloadResponse");
        assert_eq!(
            call.return_value().map(|v| v.value),
            Some("report.pdf".to_owned())
        );
    }

    #[test]
    fn test_mtom_with_xop_start_info() {
        let root = resource("mtom_root.xml");
        let reply = http_reply(
            200,
            &mtom_content_type("<root@files>", "Application/XOP+XML"),
            mtom_body("<root@files>", &root),
        );
        let (call, decoder) = recording_call(&reply);

        assert_eq!(call.return_message().name(), "DownloadResponse");
        assert_eq!(decoder.inputs(), vec![root]);
    }

    #[test]
    fn test_mtom_missing_root_falls_back_to_whole_body() {
        let root = resource("mtom_root.xml");
        let body = mtom_body("<something-else@files>", &root);
        let reply = http_reply(
            200,
            &mtom_content_type("<root@files>", "text/xml"),
            body.clone(),
        );
        let (call, decoder) = recording_call(&reply);

        let message = call.return_message();

        assert_eq!(decoder.inputs(), vec![body]);
        assert!(message.is_fault(), "multipart framing is not an envelope");
        assert_eq!(message.fault_code(), Some("utf8"), "binary attachment bytes");
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_unknown_start_info_falls_back_to_whole_body() {
        let root = resource("mtom_root.xml");
        let body = mtom_body("<root@files>", &root);
        let reply = http_reply(
            200,
            &mtom_content_type("<root@files>", "application/soap+xml"),
            body.clone(),
        );
        let (call, decoder) = recording_call(&reply);

        let _ = call.return_message();

        assert_eq!(decoder.inputs(), vec![body]);
        assert!(logs_contain("unrecognized start-info"));
    }

    #[test]
    fn test_missing_content_type_decodes_whole_body() {
        let body = resource("echo_response.xml");
        let reply = Arc::new(Mutex::new(HttpReply::from_response(HttpResponse {
            status_code: 200,
            headers: Vec::new(),
            body: body.clone(),
        })));
        let (call, decoder) = recording_call(&reply);

        assert_eq!(call.return_message().name(), "EchoResponse");
        assert_eq!(decoder.inputs(), vec![body]);
    }

    #[test]
    fn test_empty_body_is_empty_message() {
        let reply = http_reply(200, "text/xml", Vec::new());
        let (call, decoder) = recording_call(&reply);

        let message = call.return_message();

        assert!(!message.is_fault());
        assert!(message.is_empty());
        assert!(call.return_headers().is_empty());
        assert!(call.return_value().is_none());
        assert_eq!(decoder.calls(), 0);
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_decode_before_finish_is_best_effort() {
        let reply = Arc::new(Mutex::new(ScriptedReply {
            finished: false,
            content_type: Some("text/xml".to_owned()),
            body: resource("echo_response.xml"),
            releases: 0,
        }));
        let (call, decoder) = recording_call(&reply);

        assert!(!call.is_finished());
        let message = call.return_message();

        assert_eq!(message.name(), "EchoResponse");
        assert_eq!(decoder.calls(), 1);
        assert!(logs_contain("decoding reply before the transport finished"));
    }

    #[test]
    fn test_unfinished_warning_can_be_silenced() {
        let reply = Arc::new(Mutex::new(HttpReply::pending()));
        let call = PendingCall::with_decoder(
            &reply,
            Vec::new(),
            Arc::new(XmlEnvelopeDecoder),
            DecodeConfig::builder().warn_unfinished(false).build(),
        );

        assert!(call.return_message().is_empty());
    }

    #[test]
    fn test_reply_released_on_last_handle_drop() {
        let reply = Arc::new(Mutex::new(ScriptedReply {
            finished: true,
            content_type: None,
            body: Vec::new(),
            releases: 0,
        }));
        let (call, _) = recording_call(&reply);
        let clone = call.clone();

        drop(call);
        assert_eq!(reply.lock().unwrap().releases, 0, "a handle is still alive");

        drop(clone);
        assert_eq!(reply.lock().unwrap().releases, 1);
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_owner_dropping_reply_first_is_not_released_again() {
        let reply = http_reply(200, "text/xml", resource("echo_response.xml"));
        let (call, decoder) = recording_call(&reply);

        drop(reply);

        assert!(call.is_finished());
        let message = call.return_message();
        assert!(message.is_fault());
        assert_eq!(message.fault_code(), Some("5"));
        assert_eq!(
            message.fault_string(),
            Some("transport reply was released before decoding")
        );
        assert_eq!(decoder.calls(), 0);

        drop(call);
        assert!(logs_contain("transport reply already destroyed by its owner"));
    }

    #[test]
    fn test_decoded_result_survives_owner_drop() {
        let reply = http_reply(200, "text/xml", resource("echo_response.xml"));
        let (call, _) = recording_call(&reply);

        let before = call.return_message();
        drop(reply);

        assert_eq!(call.return_message(), before);
        assert_eq!(call.request_buffer(), b"<request/>");
    }

    #[test]
    fn test_http_reply_is_released_through_pending_call() {
        let reply = http_reply(200, "text/xml", resource("echo_response.xml"));
        let call = PendingCall::new(&reply, Vec::new());

        let _ = call.return_message();
        drop(call);

        assert!(reply.lock().unwrap().is_released());
    }
}
