use pixelbin::security::sign_url_at;
use pixelbin::{sign_url, url_to_obj, PixelbinError};
use std::collections::HashMap;
use url::Url;

const CDN_URL: &str =
    "https://cdn.pixelbin.io/v2/dummy-cloudname/original/__playground/playground-default.jpeg";

fn query_map(signed: &str) -> HashMap<String, String> {
    Url::parse(signed)
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect()
}

#[test]
fn test_sign_default_domain_url() {
    let _ = env_logger::try_init();

    let signed = sign_url(CDN_URL, 20, "459337ed-f378-4ddf-bad7-d7a4555c4572", "dummy-token").unwrap();
    let query = query_map(&signed);
    assert!(query.contains_key("pbs"));
    assert!(query.contains_key("pbe"));
    assert_eq!(query["pbt"], "459337ed-f378-4ddf-bad7-d7a4555c4572");

    let expiry: i64 = query["pbe"].parse().unwrap();
    let now = chrono::Utc::now().timestamp();
    assert!(expiry > now && expiry <= now + 20);
}

#[test]
fn test_sign_custom_domain_url() {
    let signed = sign_url_at(
        "https://krit.imagebin.io/v2/original/__playground/playground-default.jpeg",
        20,
        "08040485-dc83-450b-9e1f-f1040044ae3f",
        "dummy-token-2",
        1_700_000_000,
    )
    .unwrap();
    let query = query_map(&signed);
    assert_eq!(query["pbs"].len(), 64);
    assert_eq!(query["pbe"], "1700000020");
    assert_eq!(query["pbt"], "08040485-dc83-450b-9e1f-f1040044ae3f");
}

#[test]
fn test_signature_depends_on_path_and_token() {
    let sign = |url: &str, token: &str| {
        query_map(&sign_url_at(url, 20, "key", token, 1_700_000_000).unwrap())["pbs"].clone()
    };

    let base = sign(CDN_URL, "dummy-token");
    assert_eq!(
        base,
        "7d830c8c9050abb6f43433ac4d5e9d1b2770ea11d928332091b5b4056653d801"
    );
    assert_ne!(base, sign(CDN_URL, "other-token"));
    assert_ne!(base, sign(&format!("{}?dpr=2", CDN_URL), "dummy-token"));
}

#[test]
fn test_signed_url_still_parses() {
    let signed = sign_url(
        "https://cdn.pixelbin.io/v2/dummy-cloudname/t.resize(h:200)/a.jpeg?dpr=2",
        60,
        "key",
        "token",
    )
    .unwrap();
    let obj = url_to_obj(&signed).unwrap();
    assert_eq!(obj.cloud_name.as_deref(), Some("dummy-cloudname"));
    let extra: Vec<&str> = obj.options.extra.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(extra, vec!["pbs", "pbe", "pbt"]);
}

#[test]
fn test_sign_rejects_missing_arguments() {
    assert!(matches!(
        sign_url(CDN_URL, 0, "key", "token"),
        Err(PixelbinError::IllegalArgument { .. })
    ));
    assert!(matches!(
        sign_url("not a url", 20, "key", "token"),
        Err(PixelbinError::UrlParse(_))
    ));
}
