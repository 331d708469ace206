//! Presigned part and finalize calls
//!
//! Parts are sent as multipart forms to the presigned URL with a
//! `partNumber` query parameter. Neither call carries platform credentials.

use crate::error::Result;
use crate::platform::transport::{FormField, HttpRequest, RequestBody, Transport};
use crate::retry::{is_transient, retry, RetryPolicy};
use bytes::Bytes;
use reqwest::Method;
use serde_json::{Map, Value};
use url::Url;

/// Form field carrying the part bytes
pub const FILE_FIELD: &str = "file";

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn part_url(url: &Url, part_number: u32) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut()
        .append_pair("partNumber", &part_number.to_string());
    url
}

fn part_form(fields: &Map<String, Value>, data: &Bytes) -> Vec<FormField> {
    let mut form: Vec<FormField> = fields
        .iter()
        .map(|(name, value)| FormField::text(name.as_str(), field_text(value)))
        .collect();
    form.push(FormField::file(FILE_FIELD, FILE_FIELD, data.clone()));
    form
}

/// Upload one part, retrying transient failures
///
/// A 4xx response is returned immediately without further attempts.
pub async fn upload_part(
    transport: &dyn Transport,
    url: &Url,
    fields: &Map<String, Value>,
    part_number: u32,
    data: Bytes,
    policy: &RetryPolicy,
) -> Result<()> {
    let url = part_url(url, part_number);

    retry(policy, is_transient, |attempt| {
        let request = HttpRequest::new(Method::PUT, url.clone())
            .body(RequestBody::Form(part_form(fields, &data)));
        async move {
            if attempt > 0 {
                log::debug!("retrying part {} (attempt {})", part_number, attempt + 1);
            }
            transport.send(request).await?.into_result().map(|_| ())
        }
    })
    .await
}

/// Complete the multipart upload with parts `1..=part_count`
pub async fn complete_upload(
    transport: &dyn Transport,
    url: &Url,
    fields: &Map<String, Value>,
    part_count: u32,
    policy: &RetryPolicy,
) -> Result<Value> {
    let mut body = Map::new();
    body.insert(
        "parts".to_string(),
        Value::Array((1..=part_count).map(Value::from).collect()),
    );
    body.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
    let body = Value::Object(body);

    retry(policy, is_transient, |_| {
        let request =
            HttpRequest::new(Method::POST, url.clone()).body(RequestBody::Json(body.clone()));
        async move { transport.send(request).await?.into_result() }
    })
    .await
}
