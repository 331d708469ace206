use crate::retry::RetryPolicy;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 150;
pub const DEFAULT_RETRY_FACTOR: f64 = 1.0;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(4000);

const MAX_ATTEMPTS_RANGE: (u32, u32) = (1, 150);
const RETRY_FACTOR_RANGE: (f64, f64) = (1.0, 3.0);
const RETRY_INTERVAL_RANGE_MS: (u64, u64) = (1000, 60000);

/// Lifecycle state of a prediction job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Accepted,
    Preparing,
    Processing,
    Success,
    Failure,
    #[serde(other)]
    Unknown,
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Unknown
    }
}

impl JobStatus {
    /// `SUCCESS` and `FAILURE` end polling
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Accepted => write!(f, "ACCEPTED"),
            JobStatus::Preparing => write!(f, "PREPARING"),
            JobStatus::Processing => write!(f, "PROCESSING"),
            JobStatus::Success => write!(f, "SUCCESS"),
            JobStatus::Failure => write!(f, "FAILURE"),
            JobStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A prediction job as reported by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionJob {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub status: JobStatus,
    /// Remaining fields (`input`, `output`, timestamps, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PredictionJob {
    pub fn output(&self) -> Option<&Value> {
        self.extra.get("output")
    }
}

/// One input value of a prediction
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Text(String),
    /// Sent as a JSON string
    Json(Value),
    /// Sent as a file part; unnamed files are sent as `<key>.jpeg`
    File {
        filename: Option<String>,
        data: Bytes,
    },
    /// One form field per element
    List(Vec<InputValue>),
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Text(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        InputValue::Text(value)
    }
}

impl From<Value> for InputValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => InputValue::Text(s),
            Value::Array(items) => InputValue::List(items.into_iter().map(Into::into).collect()),
            scalar @ (Value::Bool(_) | Value::Number(_)) => InputValue::Text(scalar.to_string()),
            other => InputValue::Json(other),
        }
    }
}

impl From<Bytes> for InputValue {
    fn from(data: Bytes) -> Self {
        InputValue::File {
            filename: None,
            data,
        }
    }
}

/// Named inputs of a prediction, in submission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionInput {
    pub values: Vec<(String, InputValue)>,
}

impl PredictionInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.values.push((key.into(), value.into()));
        self
    }

    pub fn file(mut self, key: impl Into<String>, filename: impl Into<String>, data: Bytes) -> Self {
        self.values.push((
            key.into(),
            InputValue::File {
                filename: Some(filename.into()),
                data,
            },
        ));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Polling behaviour for [`crate::predictions::Predictions::wait`]
///
/// Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitOptions {
    /// Retry budget, clamped to `[1, 150]`
    pub max_attempts: u32,
    /// Back-off multiplier, clamped to `[1, 3]`
    pub retry_factor: f64,
    /// Initial delay, clamped to `[1s, 60s]`
    pub retry_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_factor: DEFAULT_RETRY_FACTOR,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn retry_factor(mut self, factor: f64) -> Self {
        self.retry_factor = factor;
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Retry policy with every knob clamped into range
    pub fn policy(&self) -> RetryPolicy {
        let retries = self
            .max_attempts
            .clamp(MAX_ATTEMPTS_RANGE.0, MAX_ATTEMPTS_RANGE.1);
        let factor = if self.retry_factor.is_nan() {
            DEFAULT_RETRY_FACTOR
        } else {
            self.retry_factor.clamp(RETRY_FACTOR_RANGE.0, RETRY_FACTOR_RANGE.1)
        };
        let interval_ms = u64::try_from(self.retry_interval.as_millis())
            .unwrap_or(u64::MAX)
            .clamp(RETRY_INTERVAL_RANGE_MS.0, RETRY_INTERVAL_RANGE_MS.1);

        RetryPolicy::new(retries)
            .factor(factor)
            .min_timeout(Duration::from_millis(interval_ms))
    }
}
