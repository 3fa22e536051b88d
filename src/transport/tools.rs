//! URL, key-casing and user agent helpers

use crate::error::{Result, UploadError};
use reqwest::Url;
use serde_json::{Map, Value};

/// Joins `base` and `path` and appends the query pairs
pub fn build_url(base: &str, path: &str, query: &[(&str, &str)]) -> Result<String> {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    let mut url = Url::parse(&joined)
        .map_err(|e| UploadError::invalid_parameter("base_url", format!("{}: {}", joined, e)))?;

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.iter().copied());
    }

    Ok(url.into())
}

fn camelize(key: &str) -> String {
    let mut parts = key.split('_').filter(|part| !part.is_empty());
    let mut out = parts.next().unwrap_or_default().to_string();

    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    out
}

/// Object whose keys are chosen by the user and must reach them unchanged
const VERBATIM_KEY: &str = "metadata";

/// Recursively rewrites snake_case object keys to camelCase
///
/// The contents of a `metadata` object are left as they are.
pub fn camelize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let value = if key == VERBATIM_KEY {
                        value
                    } else {
                        camelize_keys(value)
                    };
                    (camelize(&key), value)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(camelize_keys).collect()),
        other => other,
    }
}

/// Value of the `X-UC-User-Agent` header
pub fn user_agent(public_key: &str, integration: Option<&str>) -> String {
    let version = env!("CARGO_PKG_VERSION");
    match integration {
        Some(integration) if !integration.is_empty() => format!(
            "UploadcareUploadClient/{}/{} (Rust; {})",
            version, public_key, integration
        ),
        _ => format!("UploadcareUploadClient/{}/{} (Rust)", version, public_key),
    }
}
