//! Authenticated access to the platform API

use crate::error::Result;
use crate::platform::config::PixelbinConfig;
use crate::platform::transport::{HttpRequest, RequestBody, ReqwestTransport, Transport};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Requests under this prefix are handed to the [`RequestSigner`]
pub const SIGNED_PATH_PREFIX: &str = "/service/platform";

/// Adds integrity headers to platform requests before they are sent
pub trait RequestSigner: Send + Sync {
    fn sign(&self, request: &mut HttpRequest) -> Result<()>;
}

/// Shared API client used by every platform component
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<PixelbinConfig>,
    transport: Arc<dyn Transport>,
    signer: Option<Arc<dyn RequestSigner>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("domain", &self.config.domain)
            .field("signer", &self.signer.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a client that talks HTTP through reqwest
    pub fn new(config: PixelbinConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Create a client over a caller-supplied transport
    pub fn with_transport(config: PixelbinConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            transport,
            signer: None,
        })
    }

    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn config(&self) -> &PixelbinConfig {
        &self.config
    }

    /// Transport for calls that must not carry platform credentials
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: RequestBody,
    ) -> Result<HttpRequest> {
        let mut url = Url::parse(&self.config.domain)?.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let token = STANDARD.encode(self.config.api_secret.as_bytes());
        let mut request = HttpRequest::new(method, url)
            .header("Authorization", format!("Bearer {}", token))
            .body(body);
        if let Some(agent) = &self.config.integration_platform {
            request = request.header("user-agent", agent.as_str());
        }

        if let Some(signer) = &self.signer {
            if request.url.path().starts_with(SIGNED_PATH_PREFIX) {
                signer.sign(&mut request)?;
            }
        }
        Ok(request)
    }

    /// Issue a request against the configured domain and return the JSON body
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: RequestBody,
    ) -> Result<Value> {
        let request = self.build_request(method, path, query, body)?;
        log::debug!("{} {}", request.method, request.url);
        self.transport.send(request).await?.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PixelbinError;
    use crate::platform::transport::HttpResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(HttpResponse::new(200, serde_json::json!({"ok": true})))
        }
    }

    struct MarkSigner;

    impl RequestSigner for MarkSigner {
        fn sign(&self, request: &mut HttpRequest) -> Result<()> {
            request.headers.push(("x-ebg-signature".into(), "signed".into()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_execute_sets_auth_and_query() {
        let recorder = Arc::new(Recorder::default());
        let config = PixelbinConfig::new("secret").integration_platform("tests");
        let client = ApiClient::with_transport(config, recorder.clone()).unwrap();

        let query = vec![("pageNo".to_string(), "2".to_string())];
        let body = client
            .execute(Method::GET, "/service/platform/assets/v1.0/listFiles", &query, RequestBody::Empty)
            .await
            .unwrap();
        assert_eq!(body["ok"], true);

        let requests = recorder.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(
            request.url.as_str(),
            "https://api.pixelbin.io/service/platform/assets/v1.0/listFiles?pageNo=2"
        );
        // base64("secret")
        assert_eq!(request.header_value("Authorization"), Some("Bearer c2VjcmV0"));
        assert_eq!(request.header_value("user-agent"), Some("tests"));
        assert_eq!(request.header_value("x-ebg-signature"), None);
    }

    #[tokio::test]
    async fn test_signer_only_applies_to_platform_paths() {
        let recorder = Arc::new(Recorder::default());
        let client = ApiClient::with_transport(PixelbinConfig::new("s"), recorder.clone())
            .unwrap()
            .with_signer(Arc::new(MarkSigner));

        client
            .execute(Method::GET, "/service/platform/x", &[], RequestBody::Empty)
            .await
            .unwrap();
        client
            .execute(Method::GET, "/service/public/x", &[], RequestBody::Empty)
            .await
            .unwrap();

        let requests = recorder.requests.lock().unwrap();
        assert_eq!(requests[0].header_value("x-ebg-signature"), Some("signed"));
        assert_eq!(requests[1].header_value("x-ebg-signature"), None);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = ApiClient::with_transport(
            PixelbinConfig::new(""),
            Arc::new(Recorder::default()),
        );
        assert!(matches!(result, Err(PixelbinError::IllegalArgument { .. })));
    }
}
