//! Pixelbin platform API
//!
//! Configuration, the HTTP transport seam, the authenticated API client and
//! the assets endpoints used by the uploader.

pub mod api;
pub mod assets;
pub mod client;
pub mod config;
pub mod paginator;
pub mod transport;

pub use api::{ApiClient, RequestSigner};
pub use assets::{Assets, ListFilesQuery};
pub use client::PixelbinClient;
pub use config::PixelbinConfig;
pub use paginator::ListFilesPaginator;
pub use transport::{
    FormField, FormValue, HttpRequest, HttpResponse, RequestBody, ReqwestTransport, Transport,
};
