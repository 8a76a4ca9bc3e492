use std::io;
use std::sync::{Arc, Mutex};

use jabber_rpc_client::{ClientOptions, RpcClient, RpcFailure, RpcResult, Value};
use jabber_rpc_protocol::{Fault, MethodResponse, encode_response};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::FmtSpan;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Collects formatted log lines in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Installs a debug-level subscriber for the current thread.
fn capture() -> (Captured, DefaultGuard) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("jabber_rpc_client=debug"))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(captured.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

/// Runs one `change_password` call with logging captured at debug level.
async fn logged_call(debug: bool, response: &MethodResponse) -> (RpcResult<Value>, String) {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(encode_response(response).unwrap()))
        .mount(&mock_server)
        .await;

    let (captured, _guard) = capture();

    let client =
        RpcClient::new(ClientOptions::new(mock_server.uri(), "example.com").with_debug(debug))
            .unwrap();
    let result = client
        .send_request(
            "change_password",
            vec![Value::structure([("user", "alice"), ("newpass", "hunter2")])],
        )
        .await;

    (result, captured.text())
}

#[tokio::test]
async fn debug_logs_command_params_and_response() {
    let reply = MethodResponse::success(Value::structure([("res", "password-changed-marker")]));
    let (result, log) = logged_call(true, &reply).await;

    assert!(result.is_ok());
    assert!(log.contains("change_password"), "log: {}", log);
    assert!(log.contains("alice"), "log: {}", log);
    assert!(log.contains("***"), "log: {}", log);
    assert!(!log.contains("hunter2"), "log: {}", log);
    assert!(log.contains("password-changed-marker"), "log: {}", log);
}

#[tokio::test]
async fn quiet_client_logs_nothing_at_debug() {
    let reply = MethodResponse::success(Value::structure([("res", "password-changed-marker")]));
    let (result, log) = logged_call(false, &reply).await;

    assert!(result.is_ok());
    assert!(!log.contains("Sending command"), "log: {}", log);
    assert!(!log.contains("password-changed-marker"), "log: {}", log);
}

#[tokio::test]
async fn failed_reply_is_logged_before_the_error() {
    let reply = MethodResponse::Fault(Fault::new(-118, "no-such-user-marker"));
    let (result, log) = logged_call(true, &reply).await;

    let err = result.unwrap_err();
    assert!(matches!(err.cause(), RpcFailure::Fault(_)));
    assert!(log.contains("Received response"), "log: {}", log);
    assert!(log.contains("no-such-user-marker"), "log: {}", log);
}

#[tokio::test]
async fn duration_is_recorded_on_early_failure() {
    let (captured, _guard) = capture();
    let client = RpcClient::new(ClientOptions::new("http://127.0.0.1:9/RPC2", "example.com"))
        .unwrap();

    let err = client.send_request("", vec![]).await.unwrap_err();
    assert!(matches!(err.cause(), RpcFailure::EmptyCommand));

    let log = captured.text();
    assert!(log.contains("close"), "log: {}", log);
    assert!(log.contains("duration_ms="), "log: {}", log);
}
