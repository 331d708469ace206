//! Transformation pattern codec
//!
//! A pattern is the path segment of a CDN URL that encodes the transformation
//! chain, e.g. `t.resize(h:200,w:100)~p:thumb(q:80)`. This module converts
//! between that string and a list of [`Transformation`]s.
//!
//! ## Grammar
//!
//! ```text
//! pattern   := "original" | token ( OP_SEP token )*
//! token     := plugin "." name "(" params? ")"
//!            | "p:" name ( "(" params? ")" )?
//!            | "p.apply(" "n:" name ( PARAM_SEP param )* ")"
//! params    := param ( PARAM_SEP param )*
//! param     := key ":" value
//! ```

use crate::error::{PixelbinError, Result};
use crate::url::types::{Delimiters, Transformation, TransformationParam};

/// Pattern used for an untransformed asset
pub const ORIGINAL_PATTERN: &str = "original";

const PRESET_PLUGIN: &str = "p";
const PRESET_PREFIX: &str = "p:";
const LEGACY_APPLY_OPERATION: &str = "apply";
const LEGACY_PRESET_NAME_KEY: &str = "n";
const PARAMETER_LINK: char = ':';

/// Decode a pattern into its ordered transformation list
pub fn decode(pattern: &str, delimiters: &Delimiters) -> Result<Vec<Transformation>> {
    if pattern == ORIGINAL_PATTERN {
        return Ok(Vec::new());
    }

    pattern
        .split(delimiters.operation_separator.as_str())
        .map(|token| decode_token(token, delimiters))
        .collect()
}

fn decode_token(token: &str, delimiters: &Delimiters) -> Result<Transformation> {
    if let Some(rest) = token.strip_prefix(PRESET_PREFIX) {
        let (name, params) = match rest.split_once('(') {
            Some((name, params)) => (name, Some(params)),
            None => (rest, None),
        };
        if name.is_empty() {
            return Err(PixelbinError::invalid_url(format!(
                "preset name missing in '{}'",
                token
            )));
        }
        let values = params
            .map(|p| decode_params(p, delimiters))
            .unwrap_or_default();
        return Ok(Transformation::Preset {
            name: name.to_string(),
            values,
        });
    }

    let (head, params) = token.split_once('(').ok_or_else(|| {
        PixelbinError::invalid_url(format!("missing parameter list in '{}'", token))
    })?;
    let (plugin, name) = head
        .split_once('.')
        .filter(|(plugin, name)| !plugin.is_empty() && !name.is_empty())
        .ok_or_else(|| {
            PixelbinError::invalid_url(format!("expected 'plugin.operation' in '{}'", token))
        })?;
    let values = decode_params(params, delimiters);

    if plugin == PRESET_PLUGIN && name == LEGACY_APPLY_OPERATION {
        // Only `n` is read here; any other parameter is discarded.
        let preset = values
            .into_iter()
            .find(|p| p.key == LEGACY_PRESET_NAME_KEY)
            .and_then(|p| p.value)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                PixelbinError::invalid_url(format!("preset name missing in '{}'", token))
            })?;
        return Ok(Transformation::LegacyPresetApply { name: preset });
    }

    Ok(Transformation::Operation {
        plugin: plugin.to_string(),
        name: name.to_string(),
        values,
    })
}

/// Parse the text after `(`. A missing closing paren is tolerated and pairs
/// with an empty key are dropped.
fn decode_params(raw: &str, delimiters: &Delimiters) -> Vec<TransformationParam> {
    let raw = raw.strip_suffix(')').unwrap_or(raw);
    let raw = raw.strip_prefix('-').unwrap_or(raw);

    raw.split(delimiters.parameter_separator.as_str())
        .filter_map(|item| {
            let (key, value) = match item.split_once(PARAMETER_LINK) {
                Some((key, value)) => (key, Some(value.to_string())),
                None => (item, None),
            };
            (!key.is_empty()).then(|| TransformationParam {
                key: key.to_string(),
                value,
            })
        })
        .collect()
}

/// Encode a transformation list into a pattern
///
/// An empty list encodes to `original`. Every parameter must carry a key and a
/// non-empty value.
pub fn encode(transformations: &[Transformation], delimiters: &Delimiters) -> Result<String> {
    if transformations.is_empty() {
        return Ok(ORIGINAL_PATTERN.to_string());
    }

    let tokens = transformations
        .iter()
        .map(|t| encode_token(t, delimiters))
        .collect::<Result<Vec<_>>>()?;
    Ok(tokens.join(&delimiters.operation_separator))
}

fn encode_token(transformation: &Transformation, delimiters: &Delimiters) -> Result<String> {
    match transformation {
        Transformation::Operation {
            plugin,
            name,
            values,
        } => {
            if plugin.is_empty() || name.is_empty() {
                return Err(PixelbinError::illegal_argument(format!(
                    "plugin and operation name should be defined, got '{}.{}'",
                    plugin, name
                )));
            }
            let params = encode_params(name, values, delimiters)?;
            Ok(format!("{}.{}({})", plugin, name, params))
        }
        Transformation::Preset { name, values } => {
            if name.is_empty() {
                return Err(PixelbinError::illegal_argument(
                    "preset name should be defined",
                ));
            }
            let params = encode_params(name, values, delimiters)?;
            if params.is_empty() {
                Ok(format!("{}{}", PRESET_PREFIX, name))
            } else {
                Ok(format!("{}{}({})", PRESET_PREFIX, name, params))
            }
        }
        Transformation::LegacyPresetApply { name } => {
            if name.is_empty() {
                return Err(PixelbinError::illegal_argument(
                    "preset name should be defined",
                ));
            }
            Ok(format!("{}{}", PRESET_PREFIX, name))
        }
    }
}

fn encode_params(
    name: &str,
    values: &[TransformationParam],
    delimiters: &Delimiters,
) -> Result<String> {
    let pairs = values
        .iter()
        .map(|param| {
            if param.key.is_empty() {
                return Err(PixelbinError::illegal_argument(format!(
                    "key not specified in '{}'",
                    name
                )));
            }
            if param.key.contains(PARAMETER_LINK) || breaks_pattern(&param.key, delimiters) {
                return Err(PixelbinError::illegal_argument(format!(
                    "key '{}' in '{}' contains a reserved character",
                    param.key, name
                )));
            }
            match param.value.as_deref() {
                Some(value) if breaks_pattern(value, delimiters) => {
                    Err(PixelbinError::illegal_argument(format!(
                        "value for key '{}' in '{}' contains a reserved character",
                        param.key, name
                    )))
                }
                Some(value) if !value.is_empty() => {
                    Ok(format!("{}{}{}", param.key, PARAMETER_LINK, value))
                }
                _ => Err(PixelbinError::illegal_argument(format!(
                    "value not specified for key '{}' in '{}'",
                    param.key, name
                ))),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(pairs.join(&delimiters.parameter_separator))
}

/// Text that would not decode back to the same parameter
fn breaks_pattern(text: &str, delimiters: &Delimiters) -> bool {
    text.contains(['(', ')', '/'])
        || [&delimiters.parameter_separator, &delimiters.operation_separator]
            .into_iter()
            .any(|sep| !sep.is_empty() && text.contains(sep.as_str()))
}
