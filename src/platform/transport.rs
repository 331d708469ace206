//! HTTP transport seam
//!
//! Every network call made by the client goes through a [`Transport`], so
//! tests and embedders can substitute their own implementation.

use crate::error::{PixelbinError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// Body of an outgoing request
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<FormField>),
}

/// One multipart form field
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File { filename: String, data: Bytes },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, filename: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                filename: filename.into(),
                data,
            },
        }
    }
}

/// Fully resolved outgoing request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Value of the first header with this name (case-insensitive)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response as seen by the client: status line and decoded body
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: Option<String>,
    /// JSON body; a non-JSON body is carried as a string, an empty one as null
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            reason: None,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Return the body of a 2xx response, or a [`PixelbinError::ServerResponse`]
    pub fn into_result(self) -> Result<Value> {
        if self.is_success() {
            return Ok(self.body);
        }

        let message = self
            .body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.reason.clone())
            .unwrap_or_else(|| format!("Request failed with status code {}", self.status));
        Err(PixelbinError::server_response(
            message,
            Some(self.status),
            self.reason,
            Some(self.body),
        ))
    }
}

/// Sends [`HttpRequest`]s
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a shared `reqwest::Client`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn build_form(fields: Vec<FormField>) -> reqwest::multipart::Form {
    fields
        .into_iter()
        .fold(reqwest::multipart::Form::new(), |form, field| match field.value {
            FormValue::Text(text) => form.text(field.name, text),
            FormValue::File { filename, data } => {
                let len = data.len() as u64;
                let part = reqwest::multipart::Part::stream_with_length(data, len)
                    .file_name(filename);
                form.part(field.name, part)
            }
        })
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.http.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.multipart(build_form(fields)),
        };

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            body: decode_body(&bytes),
        })
    }
}
