mod common;

use bytes::Bytes;
use common::*;
use pixelbin::platform::{FormValue, RequestBody};
use pixelbin::{JobStatus, PixelbinError, PredictionInput, WaitOptions};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const JOB_ID: &str = "erase--bg--0198a23e-5f0c";

fn job(status: &str) -> serde_json::Value {
    let output = match status {
        "SUCCESS" => json!(["https://delivery.pixelbin.io/out.png"]),
        _ => serde_json::Value::Null,
    };
    json!({
        "_id": JOB_ID,
        "status": status,
        "input": {"image": "https://cdn.pixelbin.io/v2/c/original/a.jpeg"},
        "output": output
    })
}

/// Create returns ACCEPTED; polls report PROCESSING until `done_after` polls have been made
fn job_server(done_after: usize) -> (Arc<MockTransport>, Arc<AtomicUsize>) {
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = polls.clone();
    let transport = MockTransport::new(move |request, _| {
        if request.method == reqwest::Method::POST {
            return ok(job("ACCEPTED"));
        }
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= done_after {
            ok(job("SUCCESS"))
        } else {
            ok(job("PROCESSING"))
        }
    });
    (transport, polls)
}

#[tokio::test]
async fn test_create_sends_multipart_form() {
    let (transport, _) = job_server(1);
    let client = client(transport.clone());

    let input = PredictionInput::new()
        .file("image", "photo.png", Bytes::from_static(b"\x89PNG"))
        .with("industry_type", "general")
        .with("refine", json!(true));
    let created = assert_ok!(
        client
            .predictions
            .create("erase_bg", &input, Some("https://example.com/hook"))
            .await
    );
    assert_eq!(created.id, JOB_ID);
    assert_eq!(created.status, JobStatus::Accepted);

    let request = &transport.requests()[0];
    assert_eq!(request.method, reqwest::Method::POST);
    assert_eq!(
        request.url.path(),
        "/service/platform/transformation/v1.0/predictions/erase/bg"
    );
    let fields = match &request.body {
        RequestBody::Form(fields) => fields.clone(),
        other => panic!("Expected multipart body, got {:?}", other),
    };
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names[0], "webhook");
    assert!(names.contains(&"input.image"));
    assert!(names.contains(&"input.industry_type"));
    assert!(names.contains(&"input.refine"));

    let image = fields.iter().find(|f| f.name == "input.image").unwrap();
    assert!(matches!(
        &image.value,
        FormValue::File { filename, .. } if filename == "photo.png"
    ));
}

#[tokio::test]
async fn test_create_rejects_bad_names_without_calls() {
    let (transport, _) = job_server(1);
    let client = client(transport.clone());
    let input = PredictionInput::new().with("image", "https://cdn.pixelbin.io/a.jpeg");

    for name in ["", "erasebg", "erase_", "_bg", "erase_bg_v2"] {
        let result = client.predictions.create(name, &input, None).await;
        assert!(
            matches!(result, Err(PixelbinError::Validation { .. })),
            "name {:?} should be rejected",
            name
        );
    }
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_polls_until_terminal() {
    let (transport, polls) = job_server(3);
    let client = client(transport.clone());

    let options = WaitOptions::new().retry_interval(Duration::from_millis(1000));
    let started = tokio::time::Instant::now();
    let done = assert_ok!(client.predictions.wait(JOB_ID, &options).await);

    assert_eq!(done.status, JobStatus::Success);
    assert!(done.output().is_some());
    assert_eq!(polls.load(Ordering::SeqCst), 3);
    // factor 1: two one-second waits between three polls
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_millis(2100));

    let request = transport.requests().into_iter().last().unwrap();
    assert_eq!(request.method, reqwest::Method::GET);
    assert!(request.url.path().ends_with(JOB_ID));
}

#[tokio::test(start_paused = true)]
async fn test_wait_clamps_interval_to_one_second() {
    let (transport, _) = job_server(2);
    let client = client(transport);

    let options = WaitOptions::new().retry_interval(Duration::from_millis(10));
    let started = tokio::time::Instant::now();
    assert_ok!(client.predictions.wait(JOB_ID, &options).await);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_wait_exhaustion_reports_pending() {
    let (transport, polls) = job_server(usize::MAX);
    let client = client(transport);

    let options = WaitOptions::new()
        .max_attempts(2)
        .retry_interval(Duration::from_secs(1));
    let err = assert_err!(client.predictions.wait(JOB_ID, &options).await);

    match err {
        PixelbinError::JobPending { request_id, status } => {
            assert_eq!(request_id, JOB_ID);
            assert_eq!(status, "PROCESSING");
        }
        other => panic!("Expected JobPending error, got {:?}", other),
    }
    assert_eq!(polls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_wait_returns_failure_as_terminal() {
    let transport = MockTransport::new(|_, _| ok(job("FAILURE")));
    let client = client(transport.clone());

    let failed = assert_ok!(client.predictions.wait(JOB_ID, &WaitOptions::default()).await);
    assert_eq!(failed.status, JobStatus::Failure);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_create_and_wait() {
    let (transport, polls) = job_server(2);
    let client = client(transport.clone());

    let input = PredictionInput::new().with("image", "https://cdn.pixelbin.io/v2/c/original/a.jpeg");
    let done = assert_ok!(
        client
            .predictions
            .create_and_wait("erase_bg", &input, None, &WaitOptions::default())
            .await
    );
    assert_eq!(done.status, JobStatus::Success);
    assert_eq!(polls.load(Ordering::SeqCst), 2);
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test]
async fn test_create_surfaces_server_errors() {
    let transport = MockTransport::new(|_, _| status(400, "input.image is required"));
    let client = client(transport.clone());

    let err = assert_err!(
        client
            .predictions
            .create("erase_bg", &PredictionInput::new(), None)
            .await
    );
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("input.image is required"));
}
