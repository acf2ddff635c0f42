#![allow(dead_code)]

pub mod socket_guard;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use wiremock::{Request, Respond, ResponseTemplate};

/// Deterministic payload of `len` bytes.
#[must_use]
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| u8::try_from(i % 251).unwrap()).collect()
}

/// Returns the `Range` header of a recorded request, if any.
#[must_use]
pub fn range_header(request: &Request) -> Option<String> {
    request
        .headers
        .get("range")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Reads a file fully, panicking on error.
#[must_use]
pub fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

/// Fails the first `fail_count` requests with 500, then serves `body` with 200.
pub struct FlakyResponder {
    pub request_count: Arc<AtomicUsize>,
    pub fail_count: usize,
    pub body: Vec<u8>,
}

impl FlakyResponder {
    #[must_use]
    pub fn new(fail_count: usize, body: Vec<u8>) -> Self {
        Self {
            request_count: Arc::new(AtomicUsize::new(0)),
            fail_count,
            body,
        }
    }
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.request_count.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_count {
            ResponseTemplate::new(500).set_body_bytes(b"internal server error".to_vec())
        } else {
            ResponseTemplate::new(200).set_body_bytes(self.body.clone())
        }
    }
}

/// Honors `Range: bytes=N-` with 206 and the tail of `body`; otherwise 200.
pub struct RangeResponder {
    pub body: Vec<u8>,
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let start = range_header(request)
            .and_then(|value| {
                value
                    .strip_prefix("bytes=")
                    .and_then(|rest| rest.strip_suffix('-'))
                    .and_then(|n| n.parse::<usize>().ok())
            });
        match start {
            Some(start) if start < self.body.len() => {
                let total = self.body.len();
                ResponseTemplate::new(206)
                    .insert_header(
                        "Content-Range",
                        format!("bytes {start}-{}/{total}", total - 1).as_str(),
                    )
                    .set_body_bytes(self.body[start..].to_vec())
            }
            _ => ResponseTemplate::new(200).set_body_bytes(self.body.clone()),
        }
    }
}
