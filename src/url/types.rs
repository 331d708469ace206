use crate::error::{PixelbinError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Host used when a [`UrlObject`] does not name one
pub const DEFAULT_CDN_BASE_URL: &str = "https://cdn.pixelbin.io";

/// Separators used by the transformation pattern grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    /// Separates operations (`t.resize()~t.compress()`)
    pub operation_separator: String,
    /// Separates parameters inside an operation (`h:200,w:100`)
    pub parameter_separator: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            operation_separator: "~".to_string(),
            parameter_separator: ",".to_string(),
        }
    }
}

/// URL scheme version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Version {
    V1,
    V2,
}

impl Default for Version {
    fn default() -> Self {
        Version::V2
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::V1 => write!(f, "v1"),
            Version::V2 => write!(f, "v2"),
        }
    }
}

impl FromStr for Version {
    type Err = PixelbinError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "v1" => Ok(Version::V1),
            "v2" => Ok(Version::V2),
            _ => Err(PixelbinError::invalid_url(
                "Invalid pixelbin url. Please make sure the version is correct.",
            )),
        }
    }
}

/// A single `key:value` pair of an operation or preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationParam {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl TransformationParam {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// One element of a transformation chain
///
/// Chains apply left to right, so the order of a `Vec<Transformation>` is
/// significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Transformation {
    /// `plugin.name(k:v,...)`
    Operation {
        plugin: String,
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        values: Vec<TransformationParam>,
    },
    /// `p:name` or `p:name(k:v,...)`
    Preset {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        values: Vec<TransformationParam>,
    },
    /// `p.apply(n:name)`, the older spelling of a preset reference
    LegacyPresetApply { name: String },
}

impl Transformation {
    pub fn operation(plugin: impl Into<String>, name: impl Into<String>) -> Self {
        Transformation::Operation {
            plugin: plugin.into(),
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn preset(name: impl Into<String>) -> Self {
        Transformation::Preset {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Append a parameter. Legacy preset applications carry no parameters.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match &mut self {
            Transformation::Operation { values, .. } | Transformation::Preset { values, .. } => {
                values.push(TransformationParam::new(key, value));
            }
            Transformation::LegacyPresetApply { .. } => {}
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Transformation::Operation { name, .. }
            | Transformation::Preset { name, .. }
            | Transformation::LegacyPresetApply { name } => name,
        }
    }

    pub fn values(&self) -> &[TransformationParam] {
        match self {
            Transformation::Operation { values, .. } | Transformation::Preset { values, .. } => {
                values
            }
            Transformation::LegacyPresetApply { .. } => &[],
        }
    }

    pub fn is_preset(&self) -> bool {
        !matches!(self, Transformation::Operation { .. })
    }
}

/// Device pixel ratio requested through the `dpr` query parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dpr {
    Auto,
    Value(f64),
}

impl fmt::Display for Dpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dpr::Auto => write!(f, "auto"),
            Dpr::Value(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for Dpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Dpr::Auto => serializer.serialize_str("auto"),
            Dpr::Value(v) => serializer.serialize_f64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for Dpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        let raw = match Repr::deserialize(deserializer)? {
            Repr::Number(v) => v.to_string(),
            Repr::Text(s) => s,
        };
        super::query::parse_dpr(&raw).map_err(serde::de::Error::custom)
    }
}

/// Query options carried by a CDN URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpr: Option<Dpr>,
    #[serde(default, rename = "f_auto", skip_serializing_if = "Option::is_none")]
    pub f_auto: Option<bool>,
    /// Unreserved query parameters, kept verbatim and in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

impl UrlOptions {
    pub fn is_empty(&self) -> bool {
        self.dpr.is_none() && self.f_auto.is_none() && self.extra.is_empty()
    }
}

/// What a CDN URL points at: a stored file or a worker endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetTarget {
    #[serde(rename = "filePath")]
    File(String),
    #[serde(rename = "workerPath")]
    Worker(String),
}

impl AssetTarget {
    pub fn path(&self) -> &str {
        match self {
            AssetTarget::File(path) | AssetTarget::Worker(path) => path,
        }
    }

    pub fn is_worker(&self) -> bool {
        matches!(self, AssetTarget::Worker(_))
    }
}

/// Structured form of a CDN URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlObject {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Raw pattern segment as found in a parsed URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(flatten)]
    pub target: AssetTarget,
    #[serde(default, skip_serializing_if = "UrlOptions::is_empty")]
    pub options: UrlOptions,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_custom_domain: bool,
}

impl UrlObject {
    /// URL object for a file on the default CDN domain
    pub fn new(cloud_name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_CDN_BASE_URL.to_string(),
            version: Version::V2,
            cloud_name: Some(cloud_name.into()),
            zone: None,
            pattern: None,
            target: AssetTarget::File(file_path.into()),
            options: UrlOptions::default(),
            transformations: Vec::new(),
            is_custom_domain: false,
        }
    }

    /// URL object for a file served from a custom domain
    pub fn custom_domain(base_url: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cloud_name: None,
            is_custom_domain: true,
            ..Self::new(String::new(), file_path)
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn worker(mut self, worker_path: impl Into<String>) -> Self {
        self.target = AssetTarget::Worker(worker_path.into());
        self
    }

    pub fn transformation(mut self, transformation: Transformation) -> Self {
        self.transformations.push(transformation);
        self
    }

    pub fn dpr(mut self, dpr: Dpr) -> Self {
        self.options.dpr = Some(dpr);
        self
    }

    pub fn f_auto(mut self, f_auto: bool) -> Self {
        self.options.f_auto = Some(f_auto);
        self
    }

    /// File path, if this URL targets a stored file
    pub fn file_path(&self) -> Option<&str> {
        match &self.target {
            AssetTarget::File(path) => Some(path),
            AssetTarget::Worker(_) => None,
        }
    }

    /// Worker path, if this URL targets a worker
    pub fn worker_path(&self) -> Option<&str> {
        match &self.target {
            AssetTarget::Worker(path) => Some(path),
            AssetTarget::File(_) => None,
        }
    }
}
