//! Conversion between CDN URLs and [`UrlObject`]s

use crate::error::{PixelbinError, Result};
use crate::url::parts::{self, is_zone_slug, WORKER_SEGMENT};
use crate::url::query::{format_query, parse_query};
use crate::url::transformation;
use crate::url::types::{AssetTarget, Delimiters, UrlObject, DEFAULT_CDN_BASE_URL};

/// Parse a CDN URL into a [`UrlObject`] using the default delimiters
pub fn url_to_obj(url: &str) -> Result<UrlObject> {
    url_to_obj_with(url, &Delimiters::default())
}

/// Parse a CDN URL into a [`UrlObject`]
///
/// Pattern decoding failures surface as a generic processing error; an invalid
/// `dpr` surfaces as [`PixelbinError::IllegalQueryParameter`].
pub fn url_to_obj_with(url: &str, delimiters: &Delimiters) -> Result<UrlObject> {
    let parts = parts::parse(url)?;
    let options = parse_query(parts.query.as_deref())?;

    let transformations = match (&parts.target, parts.pattern.as_deref()) {
        (AssetTarget::File(_), Some(pattern)) => transformation::decode(pattern, delimiters)
            .map_err(|e| {
                log::debug!("pattern decode failed for {}: {}", url, e);
                PixelbinError::invalid_url("Error Processing url. Please check the url is correct")
            })?,
        _ => Vec::new(),
    };

    Ok(UrlObject {
        base_url: parts.base_url,
        version: parts.version,
        cloud_name: parts.cloud_name,
        zone: parts.zone,
        pattern: parts.pattern,
        target: parts.target,
        options,
        transformations,
        is_custom_domain: parts.shape.is_custom_domain(),
    })
}

/// Render a [`UrlObject`] as a CDN URL using the default delimiters
pub fn obj_to_url(obj: &UrlObject) -> Result<String> {
    obj_to_url_with(obj, &Delimiters::default())
}

/// Render a [`UrlObject`] as a CDN URL
///
/// The pattern is always re-encoded from `transformations`; the informational
/// `pattern` field is ignored. A zone that is not a valid slug is dropped.
pub fn obj_to_url_with(obj: &UrlObject, delimiters: &Delimiters) -> Result<String> {
    let cloud_name = obj.cloud_name.as_deref().filter(|c| !c.is_empty());
    match (obj.is_custom_domain, cloud_name) {
        (false, None) => {
            return Err(PixelbinError::illegal_argument(
                "key cloudName should be defined",
            ))
        }
        (true, Some(_)) => {
            return Err(PixelbinError::illegal_argument(
                "key cloudName is not valid for custom domains",
            ))
        }
        _ => {}
    }

    let base_url = if obj.base_url.is_empty() {
        DEFAULT_CDN_BASE_URL
    } else {
        obj.base_url.trim_end_matches('/')
    };

    let mut segments: Vec<String> = vec![base_url.to_string(), obj.version.to_string()];
    if let Some(cloud) = cloud_name {
        segments.push(cloud.to_string());
    }
    if let Some(zone) = obj.zone.as_deref().filter(|z| is_zone_slug(z)) {
        segments.push(zone.to_string());
    }

    match &obj.target {
        AssetTarget::Worker(path) => {
            // an empty worker path still renders as `wrkr/`
            segments.push(format!("{}/{}", WORKER_SEGMENT, path));
        }
        AssetTarget::File(path) => {
            if path.is_empty() {
                return Err(PixelbinError::illegal_argument(
                    "key filePath should be defined",
                ));
            }
            segments.push(transformation::encode(&obj.transformations, delimiters)?);
            segments.push(path.clone());
        }
    }

    segments.retain(|s| !s.is_empty());
    let mut url = segments.join("/");
    if let Some(query) = format_query(&obj.options)? {
        url.push('?');
        url.push_str(&query);
    }
    Ok(url)
}
