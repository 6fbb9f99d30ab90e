//! One-shot HTTP server and fixtures shared by the upload tests.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use reqwest::blocking::Client;

use crate::client::UploadClient;

pub const PLAN_RESPONSE: &str = r#"{"filename":"plan.json","size":10,"message":"ok","costing":[{"address":"aws_instance.web","resourceType":"aws_instance","hourlyCost":0.0116,"monthlyCost":8.5}]}"#;

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn request_complete(buf: &[u8]) -> bool {
    let Some(end) = find(buf, b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
    let body = &buf[end + 4..];
    if head.contains("transfer-encoding: chunked") {
        return body.ends_with(b"0\r\n\r\n");
    }
    let len = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body.len() >= len
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !request_complete(&buf) {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Accept one connection, answer with `status` and `body`, return the raw request.
pub fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        request
    });
    (format!("http://{addr}/upload"), handle)
}

/// Client that ignores `HTTP_PROXY` so loopback requests reach [`serve_once`].
pub fn client() -> Result<UploadClient, crate::client::UploadError> {
    UploadClient::from_builder(Client::builder().no_proxy())
}

pub fn plan_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("plan.json");
    std::fs::write(&path, b"{\"a\":1234}").unwrap();
    path
}
