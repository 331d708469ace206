//! Top-level platform client

use crate::error::Result;
use crate::platform::api::ApiClient;
use crate::platform::assets::Assets;
use crate::platform::config::PixelbinConfig;
use crate::platform::transport::Transport;
use crate::predictions::Predictions;
use crate::upload::Uploader;
use std::sync::Arc;

/// Entry point bundling every platform component over one [`ApiClient`]
#[derive(Debug, Clone)]
pub struct PixelbinClient {
    pub assets: Assets,
    pub uploader: Uploader,
    pub predictions: Predictions,
    api: Arc<ApiClient>,
}

impl PixelbinClient {
    /// Create a client using the reqwest transport
    pub fn new(config: PixelbinConfig) -> Result<Self> {
        Ok(Self::from_api(ApiClient::new(config)?))
    }

    /// Create a client over a caller-supplied transport
    pub fn with_transport(config: PixelbinConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self::from_api(ApiClient::with_transport(config, transport)?))
    }

    /// Create a client from a configured [`ApiClient`]
    pub fn from_api(api: ApiClient) -> Self {
        let api = Arc::new(api);
        let assets = Assets::new(Arc::clone(&api));
        Self {
            uploader: Uploader::new(assets.clone()),
            predictions: Predictions::new(Arc::clone(&api)),
            assets,
            api,
        }
    }

    pub fn config(&self) -> &PixelbinConfig {
        self.api.config()
    }
}
