//! Reserved query parameters of CDN URLs
//!
//! Only `dpr` and `f_auto` carry meaning for the CDN; every other parameter is
//! carried through untouched.

use crate::error::{PixelbinError, Result};
use crate::url::types::{Dpr, UrlOptions};

const DPR_MIN: f64 = 0.1;
const DPR_MAX: f64 = 5.0;

/// Parse a `dpr` value: the literal `auto` or a number in `[0.1, 5.0]`
pub fn parse_dpr(raw: &str) -> Result<Dpr> {
    if raw == "auto" {
        return Ok(Dpr::Auto);
    }
    let value = raw.trim().parse::<f64>().map_err(|_| dpr_error())?;
    validate_dpr(Dpr::Value(value))
}

/// Check that a DPR is within bounds
pub fn validate_dpr(dpr: Dpr) -> Result<Dpr> {
    match dpr {
        Dpr::Auto => Ok(dpr),
        // NaN fails `contains` as well
        Dpr::Value(v) if (DPR_MIN..=DPR_MAX).contains(&v) => Ok(dpr),
        Dpr::Value(_) => Err(dpr_error()),
    }
}

/// Parse an `f_auto` value
///
/// Only a case-insensitive `true` enables it; anything else reads as `false`.
pub fn parse_f_auto(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

fn dpr_error() -> PixelbinError {
    PixelbinError::illegal_query_parameter(
        "DPR value should be numeric and should be between 0.1 to 5.0",
    )
}

/// Split a raw query string into options
///
/// Pairs are split on `&` and the first `=` without percent-decoding, so the
/// unreserved parameters can be written back byte for byte.
pub fn parse_query(raw: Option<&str>) -> Result<UrlOptions> {
    let mut options = UrlOptions::default();
    let Some(raw) = raw else {
        return Ok(options);
    };

    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "dpr" => options.dpr = Some(parse_dpr(value)?),
            "f_auto" => options.f_auto = Some(parse_f_auto(value)),
            _ => options.extra.push((key.to_string(), value.to_string())),
        }
    }
    Ok(options)
}

/// Render options back into a query string (without the leading `?`)
///
/// `f_auto` is only written when it is `true`.
pub fn format_query(options: &UrlOptions) -> Result<Option<String>> {
    let mut pairs = Vec::new();

    if let Some(dpr) = options.dpr {
        pairs.push(format!("dpr={}", validate_dpr(dpr)?));
    }
    if options.f_auto == Some(true) {
        pairs.push("f_auto=true".to_string());
    }
    for (key, value) in &options.extra {
        if value.is_empty() {
            pairs.push(key.clone());
        } else {
            pairs.push(format!("{}={}", key, value));
        }
    }

    Ok(if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("&"))
    })
}
