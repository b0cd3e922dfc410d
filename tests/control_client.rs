//! Control client requests against a one-shot local HTTP server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use rstest::rstest;
use serde_json::Value;
use swarm_view::control::{ControlClient, ControlError, HttpTransport, MISSION_PATH, START_PATH};

/// Request line and JSON body seen by the server.
type Seen = (String, Value);

/// Serves a single request with `status` and `body`, returning what it saw.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Seen>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .unwrap_or_else(|e| panic!("cannot bind test server: {e}"));
    let base = listener
        .local_addr()
        .map(|addr| format!("http://{addr}"))
        .unwrap_or_else(|e| panic!("no local address: {e}"));
    let handle = thread::spawn(move || {
        let (stream, _) = listener
            .accept()
            .unwrap_or_else(|e| panic!("accept failed: {e}"));
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        let mut length = 0_usize;
        let mut line = String::new();
        reader
            .read_line(&mut request_line)
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        loop {
            line.clear();
            reader
                .read_line(&mut line)
                .unwrap_or_else(|e| panic!("read failed: {e}"));
            let header = line.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    length = value.trim().parse().unwrap_or(0);
                }
            }
        }
        let mut payload = vec![0_u8; length];
        reader
            .read_exact(&mut payload)
            .unwrap_or_else(|e| panic!("body read failed: {e}"));
        let reply = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        reader
            .get_mut()
            .write_all(reply.as_bytes())
            .unwrap_or_else(|e| panic!("write failed: {e}"));
        let json = serde_json::from_slice(&payload).unwrap_or(Value::Null);
        (request_line.trim_end().to_owned(), json)
    });
    (base, handle)
}

fn client(base: &str) -> ControlClient<HttpTransport> {
    ControlClient::new(HttpTransport::new(base).unwrap_or_else(|e| panic!("client: {e}")))
}

#[test]
fn mission_is_posted_as_json() -> Result<(), ControlError> {
    let (base, server) = serve_once("200 OK", r#"{"message": "mission queued"}"#);
    let reply = client(&base).submit_text("survey the harbour")?;
    assert_eq!(reply, "mission queued");

    let (request, body) = server.join().unwrap_or_else(|_| panic!("server panicked"));
    assert_eq!(request, format!("POST {MISSION_PATH} HTTP/1.1"));
    assert_eq!(body["user_mission_statement"], "survey the harbour");
    Ok(())
}

#[test]
fn start_reports_the_server_status() -> Result<(), ControlError> {
    let (base, server) = serve_once("200 OK", r#"{"status": "running"}"#);
    assert_eq!(client(&base).start()?, "running");
    let (request, _) = server.join().unwrap_or_else(|_| panic!("server panicked"));
    assert!(request.starts_with(&format!("POST {START_PATH} ")));
    Ok(())
}

#[rstest]
#[case("500 Internal Server Error", r#"{"detail": "boom"}"#)]
#[case("200 OK", r#"{"unexpected": true}"#)]
fn failures_surface_as_errors(#[case] status: &'static str, #[case] body: &'static str) {
    let (base, server) = serve_once(status, body);
    let result = client(&base).stop();
    let _ = server.join();
    match result {
        Err(ControlError::Status { status, .. }) => assert_eq!(status, 500),
        Err(ControlError::Reply { path, .. }) => assert_eq!(path, "/api/stop_simulation"),
        other => panic!("expected a failure, got {other:?}"),
    }
}

#[test]
fn blank_missions_never_reach_the_server() {
    let result = client("http://127.0.0.1:9").submit_text("   ");
    assert!(matches!(result, Err(ControlError::EmptyMission)));
}
