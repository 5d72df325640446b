//! `Set-Cookie` parsing

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute value: `Path=/` carries a string, `HttpOnly` is a bare flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CookieAttribute {
    Value(String),
    Flag(bool),
}

/// One `Set-Cookie` header split into its parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCookie {
    pub name: String,
    pub value: String,
    pub attributes: BTreeMap<String, CookieAttribute>,
    /// Header as received
    pub raw: String,
}

/// Parse every `Set-Cookie` header value
pub fn parse_cookies(raw_cookies: &[String]) -> Vec<ParsedCookie> {
    raw_cookies.iter().map(|raw| parse_cookie(raw)).collect()
}

/// Parse a single `Set-Cookie` header value.
///
/// The first `;`-separated part is `name=value`, split on its first `=`.
/// Remaining parts are attributes; an attribute without a value, or with an
/// empty one, is recorded as `true`.
pub fn parse_cookie(raw: &str) -> ParsedCookie {
    let mut parts = raw.split(';');
    let main = parts.next().unwrap_or_default();
    let (name, value) = main.split_once('=').unwrap_or((main, ""));

    let attributes = parts
        .filter_map(|part| {
            let (attr, value) = match part.split_once('=') {
                Some((attr, value)) => (attr.trim(), value.trim()),
                None => (part.trim(), ""),
            };
            if attr.is_empty() {
                return None;
            }
            let value = if value.is_empty() {
                CookieAttribute::Flag(true)
            } else {
                CookieAttribute::Value(value.to_string())
            };
            Some((attr.to_string(), value))
        })
        .collect();

    ParsedCookie {
        name: name.trim().to_string(),
        value: value.to_string(),
        attributes,
        raw: raw.to_string(),
    }
}
