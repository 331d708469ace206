//! URL signing

pub mod signed_url;

pub use signed_url::{sign_url, sign_url_at};
