//! CDN URL handling
//!
//! This module converts Pixelbin CDN URLs into structured [`UrlObject`]s and
//! back, including the transformation pattern and the reserved query options.

pub mod operations;
pub mod parts;
pub mod query;
pub mod transformation;
pub mod types;

pub use operations::{obj_to_url, obj_to_url_with, url_to_obj, url_to_obj_with};
pub use parts::{UrlParts, UrlShape};
pub use transformation::{decode as decode_pattern, encode as encode_pattern};
pub use types::{
    AssetTarget, Delimiters, Dpr, Transformation, TransformationParam, UrlObject, UrlOptions,
    Version, DEFAULT_CDN_BASE_URL,
};
