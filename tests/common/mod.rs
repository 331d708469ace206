//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pixelbin::platform::{FormValue, HttpRequest, HttpResponse, RequestBody, Transport};
use pixelbin::{PixelbinClient, PixelbinConfig, Result};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PRESIGNED_URL: &str = "https://api.pixelbin.io/service/public/assets/v1.0/signed-multipart?pbs=sig&pbe=1&pbt=tok";

type Handler = dyn Fn(&HttpRequest, usize) -> HttpResponse + Send + Sync;

/// Scripted in-memory transport
///
/// Every request is recorded; the handler receives the request and its
/// zero-based index and returns the response to hand back.
pub struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Duration,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest, usize) -> HttpResponse + Send + Sync + 'static,
    {
        Self::with_latency(Duration::from_millis(10), handler)
    }

    pub fn with_latency<F>(latency: Duration, handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest, usize) -> HttpResponse + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            latency,
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok((self.handler)(&request, index))
    }
}

pub fn client(transport: Arc<MockTransport>) -> PixelbinClient {
    let _ = env_logger::try_init();
    PixelbinClient::with_transport(PixelbinConfig::new("test-api-secret"), transport)
        .expect("valid test config")
}

pub fn presign_response() -> HttpResponse {
    HttpResponse::new(
        200,
        json!({
            "presignedUrl": {
                "url": PRESIGNED_URL,
                "fields": {
                    "x-pixb-meta-assetdata": "{\"orgId\":1,\"type\":\"file\"}"
                }
            }
        }),
    )
}

pub fn is_presign(request: &HttpRequest) -> bool {
    request.url.path().ends_with("/upload/signed-url")
}

pub fn is_finalize(request: &HttpRequest) -> bool {
    request.method == reqwest::Method::POST && request.url.path().ends_with("/signed-multipart")
}

pub fn is_part(request: &HttpRequest) -> bool {
    request.method == reqwest::Method::PUT
}

/// `partNumber` query value of a part request
pub fn part_number(request: &HttpRequest) -> Option<u32> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == "partNumber")
        .and_then(|(_, v)| v.parse().ok())
}

/// Size of the `file` field of a part request
pub fn part_len(request: &HttpRequest) -> Option<usize> {
    match &request.body {
        RequestBody::Form(fields) => fields.iter().find_map(|f| match &f.value {
            FormValue::File { data, .. } if f.name == "file" => Some(data.len()),
            _ => None,
        }),
        _ => None,
    }
}

pub fn json_body(request: &HttpRequest) -> Option<&Value> {
    match &request.body {
        RequestBody::Json(value) => Some(value),
        _ => None,
    }
}

pub fn ok(body: Value) -> HttpResponse {
    HttpResponse::new(200, body)
}

pub fn status(code: u16, message: &str) -> HttpResponse {
    HttpResponse::new(code, json!({ "message": message }))
}
