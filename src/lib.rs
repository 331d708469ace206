pub mod error;
pub mod retry;

pub mod platform;
pub mod predictions;
pub mod security;
pub mod upload;
pub mod url;

pub use error::{PixelbinError, Result};

pub use platform::{
    ApiClient, Assets, ListFilesPaginator, ListFilesQuery, PixelbinClient, PixelbinConfig,
    RequestSigner, ReqwestTransport, Transport,
};

pub use predictions::{
    InputValue, JobStatus, PredictionInput, PredictionJob, Predictions, WaitOptions,
};

pub use retry::{is_transient, retry, RetryPolicy};

pub use security::sign_url;

pub use upload::{
    Access, PresignedUrl, UploadOptions, UploadParams, UploadProgress, UploadSource, Uploader,
};

pub use crate::url::{
    obj_to_url, url_to_obj, AssetTarget, Delimiters, Dpr, Transformation, TransformationParam,
    UrlObject, UrlOptions, Version,
};
