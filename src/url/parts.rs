//! CDN URL segmentation
//!
//! Splits a CDN URL into base URL, version, cloud name, zone, pattern and
//! file/worker path. Default-domain URLs carry an explicit cloud-name segment,
//! custom domains do not; each of the two families has four path shapes that
//! are tried in a fixed order.

use crate::error::{PixelbinError, Result};
use crate::url::types::{AssetTarget, Version};
use url::Url;

/// Path segment that introduces a worker request
pub const WORKER_SEGMENT: &str = "wrkr";

const DEFAULT_DOMAIN_LABEL_PREFIX: &str = "pixelbin";
const ZONE_SLUG_LEN: usize = 6;

/// Recognized CDN path shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    DefaultZoned,
    DefaultUnzoned,
    DefaultWorkerZoned,
    DefaultWorkerUnzoned,
    CustomZoned,
    CustomUnzoned,
    CustomWorkerZoned,
    CustomWorkerUnzoned,
}

impl UrlShape {
    fn from_layout(custom_domain: bool, layout: Layout) -> Self {
        match (custom_domain, layout) {
            (false, Layout::WorkerZoned) => UrlShape::DefaultWorkerZoned,
            (false, Layout::WorkerUnzoned) => UrlShape::DefaultWorkerUnzoned,
            (false, Layout::Zoned) => UrlShape::DefaultZoned,
            (false, Layout::Unzoned) => UrlShape::DefaultUnzoned,
            (true, Layout::WorkerZoned) => UrlShape::CustomWorkerZoned,
            (true, Layout::WorkerUnzoned) => UrlShape::CustomWorkerUnzoned,
            (true, Layout::Zoned) => UrlShape::CustomZoned,
            (true, Layout::Unzoned) => UrlShape::CustomUnzoned,
        }
    }

    pub fn is_custom_domain(&self) -> bool {
        matches!(
            self,
            UrlShape::CustomZoned
                | UrlShape::CustomUnzoned
                | UrlShape::CustomWorkerZoned
                | UrlShape::CustomWorkerUnzoned
        )
    }

    pub fn is_worker(&self) -> bool {
        matches!(
            self,
            UrlShape::DefaultWorkerZoned
                | UrlShape::DefaultWorkerUnzoned
                | UrlShape::CustomWorkerZoned
                | UrlShape::CustomWorkerUnzoned
        )
    }

    pub fn has_zone(&self) -> bool {
        matches!(
            self,
            UrlShape::DefaultZoned
                | UrlShape::DefaultWorkerZoned
                | UrlShape::CustomZoned
                | UrlShape::CustomWorkerZoned
        )
    }
}

/// Path layout after the cloud-name segment, shared by both URL families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    WorkerZoned,
    WorkerUnzoned,
    Zoned,
    Unzoned,
}

/// First match wins.
const LAYOUT_ORDER: [Layout; 4] = [
    Layout::WorkerZoned,
    Layout::WorkerUnzoned,
    Layout::Zoned,
    Layout::Unzoned,
];

struct Matched<'a> {
    zone: Option<&'a str>,
    pattern: Option<&'a str>,
    target: AssetTarget,
}

impl Layout {
    fn matches<'a>(self, segments: &[&'a str]) -> Option<Matched<'a>> {
        match (self, segments) {
            (Layout::WorkerZoned, [zone, worker, rest @ ..])
                if is_zone_slug(zone) && *worker == WORKER_SEGMENT && !rest.is_empty() =>
            {
                Some(Matched {
                    zone: Some(zone),
                    pattern: None,
                    target: AssetTarget::Worker(rest.join("/")),
                })
            }
            // `wrkr` must be followed by a segment, even an empty one
            (Layout::WorkerUnzoned, [worker, rest @ ..])
                if *worker == WORKER_SEGMENT && !rest.is_empty() =>
            {
                Some(Matched {
                    zone: None,
                    pattern: None,
                    target: AssetTarget::Worker(rest.join("/")),
                })
            }
            (Layout::Zoned, [zone, pattern, rest @ ..])
                if is_zone_slug(zone) && !pattern.is_empty() =>
            {
                file_target(rest).map(|target| Matched {
                    zone: Some(zone),
                    pattern: Some(pattern),
                    target,
                })
            }
            (Layout::Unzoned, [pattern, rest @ ..]) if !pattern.is_empty() => {
                file_target(rest).map(|target| Matched {
                    zone: None,
                    pattern: Some(pattern),
                    target,
                })
            }
            _ => None,
        }
    }
}

fn file_target(segments: &[&str]) -> Option<AssetTarget> {
    let path = segments.join("/");
    (!path.is_empty()).then_some(AssetTarget::File(path))
}

/// Components of a CDN URL before the pattern is decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    /// `scheme://host[:port]`
    pub base_url: String,
    pub version: Version,
    pub cloud_name: Option<String>,
    pub zone: Option<String>,
    /// Absent for worker requests
    pub pattern: Option<String>,
    pub target: AssetTarget,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    pub shape: UrlShape,
}

/// True for exactly six characters of `[A-Za-z0-9_-]`
pub fn is_zone_slug(candidate: &str) -> bool {
    candidate.len() == ZONE_SLUG_LEN && candidate.bytes().all(is_slug_byte)
}

fn is_slug_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Hosts with a label starting with `pixelbin` serve the cloud-name path family
pub fn is_default_domain(host: &str) -> bool {
    host.split('.')
        .any(|label| label.starts_with(DEFAULT_DOMAIN_LABEL_PREFIX))
}

fn looks_like_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Split a CDN URL into its parts
pub fn parse(url: &str) -> Result<UrlParts> {
    let parsed = Url::parse(url)
        .map_err(|e| PixelbinError::invalid_url(format!("unable to parse '{}': {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| PixelbinError::invalid_url(format!("no host in '{}'", url)))?;
    let base_url = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };

    let path = parsed.path();
    let mut segments: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();

    let version = match segments.first() {
        Some(segment) if looks_like_version(segment) => {
            let version = segment.parse::<Version>()?;
            segments.remove(0);
            version
        }
        _ => Version::V1,
    };

    let custom_domain = !is_default_domain(host);
    let (cloud_name, rest) = if custom_domain {
        (None, &segments[..])
    } else {
        match segments.split_first() {
            Some((cloud, rest)) if !cloud.is_empty() && cloud.bytes().all(is_slug_byte) => {
                (Some(cloud.to_string()), rest)
            }
            _ => {
                return Err(PixelbinError::invalid_url(format!(
                    "missing cloud name in '{}'",
                    url
                )))
            }
        }
    };

    let (layout, matched) = LAYOUT_ORDER
        .iter()
        .find_map(|layout| layout.matches(rest).map(|m| (*layout, m)))
        .ok_or_else(|| {
            PixelbinError::invalid_url(format!("unrecognized path shape in '{}'", url))
        })?;

    log::debug!("parsed {} as {:?}", url, UrlShape::from_layout(custom_domain, layout));

    Ok(UrlParts {
        base_url,
        version,
        cloud_name,
        zone: matched.zone.map(str::to_string),
        pattern: matched.pattern.map(str::to_string),
        target: matched.target,
        query: parsed.query().map(str::to_string),
        shape: UrlShape::from_layout(custom_domain, layout),
    })
}
