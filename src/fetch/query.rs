//! Query-string helpers.
//!
//! Input URLs may contain raw spaces; they are escaped before parsing.

use anyhow::{Context, Result};
use std::collections::HashMap;
use url::Url;
use url::form_urlencoded;

fn parse(url: &str) -> Result<Url> {
    Url::parse(&url.replace(' ', "%20")).with_context(|| format!("invalid url: {url}"))
}

/// Decode `value` if it arrives already percent-encoded, so that it ends up
/// encoded exactly once. A literal `+` stays a plus.
fn decode_once(value: &str) -> String {
    let escaped = value
        .replace('+', "%2B")
        .replace('&', "%26")
        .replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(decoded, _)| decoded.into_owned())
        .unwrap_or_default()
}

/// Add `params` to the query of `url`, replacing parameters of the same name.
pub fn append_query_params<K, V>(url: &str, params: &[(K, V)]) -> Result<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut parsed = parse(url)?;
    let replaced: Vec<&str> = params.iter().map(|(name, _)| name.as_ref()).collect();
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .into_owned()
        .filter(|(name, _)| !replaced.contains(&name.as_str()))
        .collect();

    {
        let mut pairs = parsed.query_pairs_mut();
        pairs.clear();
        for (name, value) in &kept {
            pairs.append_pair(name, value);
        }
        for (name, value) in params {
            pairs.append_pair(name.as_ref(), &decode_once(value.as_ref()));
        }
    }
    if parsed.query() == Some("") {
        parsed.set_query(None);
    }
    Ok(parsed.to_string())
}

/// All query parameters of `url`, decoded. Later duplicates win.
pub fn query_params(url: &str) -> Result<HashMap<String, String>> {
    Ok(parse(url)?.query_pairs().into_owned().collect())
}

/// A single decoded query parameter.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// `url` with its query string removed.
pub fn remove_query_params(url: &str) -> Result<String> {
    let mut parsed = parse(url)?;
    parsed.set_query(None);
    Ok(parsed.to_string())
}
