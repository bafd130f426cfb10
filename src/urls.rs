//! URL validation and normalization
//!
//! Cache keys and registry lookups both go through here so that
//! `https://WWW.Example.com/a?b=2&a=1#top` and `https://www.example.com/a?a=1&b=2`
//! land on the same entry.

use crate::error::{Error, Result};
use url::Url;

/// Longest URL accepted for extraction
pub const MAX_URL_LENGTH: usize = 2048;

/// Validate a request URL, returning the parsed form
pub fn validate(raw: &str) -> Result<Url> {
    if raw.trim().is_empty() {
        return Err(Error::InvalidUrl("URL cannot be empty".to_string()));
    }
    if raw.len() > MAX_URL_LENGTH {
        return Err(Error::InvalidUrl(format!(
            "URL exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        )));
    }
    let url = Url::parse(raw.trim()).map_err(|e| Error::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::InvalidUrl(format!(
                "URL must start with http:// or https://, got {}://",
                other
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidUrl(format!("URL has no host: {}", raw)));
    }
    Ok(url)
}

/// Canonical form: scheme + host + path + sorted query, fragment dropped
pub fn normalize(raw: &str) -> Result<String> {
    let url = validate(raw)?;
    let host = url.host_str().unwrap_or_default();

    let mut out = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }
    out.push_str(url.path());

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if !pairs.is_empty() {
        pairs.sort();
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        out.push('?');
        out.push_str(&query);
    }
    Ok(out)
}

/// Registry form of a hostname: lowercase, no scheme/path/port, no `www.`
pub fn normalize_host(raw: &str) -> String {
    let mut host = raw.trim().to_ascii_lowercase();
    if let Some(idx) = host.find("://") {
        host = host[idx + 3..].to_string();
    }
    if let Some(idx) = host.find(['/', '?', '#']) {
        host.truncate(idx);
    }
    if let Some(idx) = host.rfind(':') {
        if !host.ends_with(']') {
            host.truncate(idx);
        }
    }
    strip_www(&host).to_string()
}

/// Hostname of a URL in registry form
pub fn host_of(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim())
        .ok()
        .or_else(|| Url::parse(&format!("http://{}", raw.trim())).ok())?;
    parsed.host_str().map(normalize_host)
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_http_and_https() {
        assert!(validate("http://example.com").is_ok());
        assert!(validate("https://example.com/a?b=1").is_ok());
    }

    #[test]
    fn test_validate_rejects_other_schemes() {
        assert!(matches!(
            validate("ftp://example.com"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(validate(""), Err(Error::InvalidUrl(_))));
        assert!(matches!(validate("example.com"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_too_long() {
        let long_url = format!("https://example.com/{}", "a".repeat(3000));
        let err = validate(&long_url).unwrap_err();
        assert!(err.to_string().contains("maximum length"));
    }

    #[test]
    fn test_normalize_sorts_query_and_drops_fragment() {
        assert_eq!(
            normalize("HTTPS://Example.COM/news/a?b=2&a=1#comments").unwrap(),
            "https://example.com/news/a?a=1&b=2"
        );
    }

    #[test]
    fn test_normalize_keeps_explicit_port() {
        assert_eq!(
            normalize("http://localhost:8080/x").unwrap(),
            "http://localhost:8080/x"
        );
        assert_eq!(
            normalize("https://example.com:443/x").unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("WWW.Sandesh.com"), "sandesh.com");
        assert_eq!(normalize_host("https://www.aajtak.in/path"), "aajtak.in");
        assert_eq!(normalize_host("example.com:8080"), "example.com");
        assert_eq!(normalize_host("tv9gujarati.com"), "tv9gujarati.com");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("https://www.sandesh.com/gujarat/news/x"),
            Some("sandesh.com".to_string())
        );
        assert_eq!(host_of("sandesh.com/a"), Some("sandesh.com".to_string()));
        assert_eq!(host_of(""), None);
    }
}
