//! Time-limited signed CDN URLs
//!
//! A signed URL carries three extra query parameters: `pbs` (the signature),
//! `pbe` (expiry as a unix timestamp) and `pbt` (the access key id).

use crate::error::{PixelbinError, Result};
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_PARAM: &str = "pbs";
pub const EXPIRY_PARAM: &str = "pbe";
pub const ACCESS_KEY_PARAM: &str = "pbt";

/// Sign a CDN URL so it is served until `expiry_seconds` from now
pub fn sign_url(url: &str, expiry_seconds: u64, access_key: &str, token: &str) -> Result<String> {
    sign_url_at(url, expiry_seconds, access_key, token, Utc::now().timestamp())
}

/// Sign a CDN URL relative to an explicit `now` (unix seconds)
pub fn sign_url_at(
    url: &str,
    expiry_seconds: u64,
    access_key: &str,
    token: &str,
    now: i64,
) -> Result<String> {
    if url.is_empty() || access_key.is_empty() || token.is_empty() || expiry_seconds == 0 {
        return Err(PixelbinError::illegal_argument(
            "url, accessKey, token & expirySeconds are required for generating signed URL",
        ));
    }
    let expiry_seconds = i64::try_from(expiry_seconds).map_err(|_| {
        PixelbinError::illegal_argument(format!("expirySeconds {} is out of range", expiry_seconds))
    })?;

    let mut parsed = Url::parse(url)?;
    if parsed.query_pairs().any(|(k, _)| k == SIGNATURE_PARAM) {
        return Err(PixelbinError::illegal_argument("URL already has a signature"));
    }

    let mut signed_path = parsed.path().to_string();
    if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
        signed_path.push('?');
        signed_path.push_str(query);
    }

    let expiry = now.saturating_add(expiry_seconds);
    let signature = generate_signature(&signed_path, expiry, token)?;

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| *k != EXPIRY_PARAM && *k != ACCESS_KEY_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(SIGNATURE_PARAM, &signature)
        .append_pair(EXPIRY_PARAM, &expiry.to_string())
        .append_pair(ACCESS_KEY_PARAM, access_key);

    log::debug!("signed {} until {}", url, expiry);
    Ok(parsed.to_string())
}

fn generate_signature(url_path: &str, expiry: i64, key: &str) -> Result<String> {
    let path = url_path.strip_prefix('/').unwrap_or(url_path);
    let message = format!("{}{}", encode_uri(path), expiry);

    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| PixelbinError::illegal_argument(format!("invalid signing key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Characters `encodeURI` leaves alone besides ASCII alphanumerics
const ENCODE_URI: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

/// Percent-encode everything outside the URI reserved and unreserved sets.
/// `%` itself is encoded, so existing escapes are escaped again.
fn encode_uri(input: &str) -> String {
    utf8_percent_encode(input, ENCODE_URI).to_string()
}
