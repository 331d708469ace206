//! Prediction endpoints and job polling

use crate::error::{PixelbinError, Result};
use crate::platform::api::ApiClient;
use crate::platform::transport::{FormField, RequestBody};
use crate::predictions::types::{InputValue, PredictionInput, PredictionJob, WaitOptions};
use crate::retry::retry;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

const PLATFORM_PREDICTIONS: &str = "/service/platform/transformation/v1.0/predictions";
const PUBLIC_PREDICTIONS: &str = "/service/public/transformation/v1.0/predictions";

/// Prediction jobs API
#[derive(Debug, Clone)]
pub struct Predictions {
    api: Arc<ApiClient>,
}

/// Split `plugin_operation` into its two non-empty halves
fn split_name(name: &str) -> Result<(&str, &str)> {
    if name.is_empty() {
        return Err(PixelbinError::validation("name (string) is required"));
    }
    let mut parts = name.split('_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(plugin), Some(operation), None) if !plugin.is_empty() && !operation.is_empty() => {
            Ok((plugin, operation))
        }
        _ => Err(PixelbinError::validation(
            "name must be in 'plugin_operation' format, e.g. 'erase_bg'",
        )),
    }
}

fn append_input(form: &mut Vec<FormField>, key: &str, value: &InputValue) -> Result<()> {
    let field_name = format!("input.{}", key);
    match value {
        InputValue::Text(text) => form.push(FormField::text(field_name, text.as_str())),
        InputValue::Json(json) => form.push(FormField::text(field_name, serde_json::to_string(json)?)),
        InputValue::File { filename, data } => {
            let filename = filename
                .clone()
                .unwrap_or_else(|| format!("{}.jpeg", key));
            form.push(FormField::file(field_name, filename, data.clone()));
        }
        InputValue::List(items) => {
            for item in items {
                append_input(form, key, item)?;
            }
        }
    }
    Ok(())
}

/// Multipart body: `webhook` first, then one `input.<key>` field per value
fn prediction_form(input: &PredictionInput, webhook: Option<&str>) -> Result<Vec<FormField>> {
    let mut form = Vec::new();
    if let Some(webhook) = webhook.filter(|w| !w.is_empty()) {
        form.push(FormField::text("webhook", webhook));
    }
    for (key, value) in &input.values {
        append_input(&mut form, key, value)?;
    }
    Ok(form)
}

impl Predictions {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Submit a prediction job for `plugin_operation`
    pub async fn create(
        &self,
        name: &str,
        input: &PredictionInput,
        webhook: Option<&str>,
    ) -> Result<PredictionJob> {
        let (plugin, operation) = split_name(name)?;
        let form = prediction_form(input, webhook)?;
        let path = format!("{}/{}/{}", PLATFORM_PREDICTIONS, plugin, operation);

        let response = self
            .api
            .execute(Method::POST, &path, &[], RequestBody::Form(form))
            .await?;
        let job: PredictionJob = serde_json::from_value(response)?;
        log::debug!("prediction {} created ({})", job.id, job.status);
        Ok(job)
    }

    /// Fetch the current state of a job
    pub async fn get(&self, request_id: &str) -> Result<PredictionJob> {
        if request_id.is_empty() {
            return Err(PixelbinError::validation("requestId (string) is required"));
        }
        let path = format!("{}/{}", PLATFORM_PREDICTIONS, request_id);
        let response = self
            .api
            .execute(Method::GET, &path, &[], RequestBody::Empty)
            .await?;
        serde_json::from_value(response).map_err(PixelbinError::from)
    }

    /// Poll a job until it reaches `SUCCESS` or `FAILURE`
    ///
    /// Any failed poll, including a non-terminal status, consumes one retry.
    /// When the budget runs out the last error is returned, which is a
    /// [`PixelbinError::JobPending`] if the job was still running.
    pub async fn wait(&self, request_id: &str, options: &WaitOptions) -> Result<PredictionJob> {
        if request_id.is_empty() {
            return Err(PixelbinError::validation("requestId (string) is required"));
        }
        let policy = options.policy();

        retry(&policy, |_| true, |attempt| async move {
            let job = self.get(request_id).await?;
            log::debug!(
                "poll {} for {}: {}",
                attempt + 1,
                request_id,
                job.status
            );
            if job.status.is_terminal() {
                Ok(job)
            } else {
                Err(PixelbinError::job_pending(request_id, job.status.to_string()))
            }
        })
        .await
    }

    /// Create a job and wait for its final state
    pub async fn create_and_wait(
        &self,
        name: &str,
        input: &PredictionInput,
        webhook: Option<&str>,
        options: &WaitOptions,
    ) -> Result<PredictionJob> {
        let job = self.create(name, input, webhook).await?;
        self.wait(&job.id, options).await
    }

    /// Public catalogue of available predictions
    pub async fn list(&self) -> Result<Value> {
        self.api
            .execute(Method::GET, PUBLIC_PREDICTIONS, &[], RequestBody::Empty)
            .await
    }

    /// Public input schema of a prediction
    pub async fn get_schema(&self, name: &str) -> Result<Value> {
        if name.is_empty() {
            return Err(PixelbinError::validation("name (string) is required"));
        }
        let path = format!("{}/schema/{}", PUBLIC_PREDICTIONS, name);
        self.api
            .execute(Method::GET, &path, &[], RequestBody::Empty)
            .await
    }
}
