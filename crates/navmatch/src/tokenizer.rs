//! URL tokenizer: strips scheme and host noise, splits into path segments
//! plus a multi-valued query map, then decodes and lower-cases each piece.

use std::collections::BTreeMap;

use crate::types::{VerifyError, VerifyResult};

/// A URL broken into the parts every dialect consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedUrl {
    /// Host with any leading `www.` removed.
    pub host: String,
    /// Non-empty path segments, in order.
    pub segments: Vec<String>,
    /// Query parameters; repeated keys keep every value in order.
    pub query: BTreeMap<String, Vec<String>>,
}

impl TokenizedUrl {
    /// First value for a query key.
    pub fn query_first(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Path rebuilt with a leading and trailing slash, for substring tests.
    pub fn path(&self) -> String {
        if self.segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", self.segments.join("/"))
        }
    }

    /// True when the host is `domain` or a subdomain of it.
    pub fn host_is(&self, domain: &str) -> bool {
        self.host == domain || self.host.ends_with(&format!(".{domain}"))
    }
}

/// Percent-decode one already-split component, lower-cased.
fn decode(s: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(s.as_bytes())).to_lowercase()
}

/// Tokenize a raw URL.
///
/// The URL is split into host, path segments and query pairs first, and
/// each piece is percent-decoded exactly once. Encoded separators (`%2F`,
/// `%26`, `%3D`) therefore stay inside the component they were written in.
pub fn tokenize(raw: &str) -> VerifyResult<TokenizedUrl> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(VerifyError::MalformedUrl {
            url: raw.to_string(),
            reason: "empty URL".to_string(),
        });
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = url::Url::parse(&with_scheme).map_err(|e| VerifyError::MalformedUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    let host = parsed
        .host_str()
        .unwrap_or_default()
        .to_lowercase()
        .trim_start_matches("www.")
        .to_string();
    if host.is_empty() {
        return Err(VerifyError::MalformedUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    let segments = parsed
        .path_segments()
        .map(|segs| {
            segs.filter(|s| !s.is_empty())
                .map(decode)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in parsed.query_pairs() {
        if key.is_empty() {
            continue;
        }
        query
            .entry(key.to_lowercase())
            .or_default()
            .push(value.to_lowercase());
    }

    Ok(TokenizedUrl {
        host,
        segments,
        query,
    })
}
