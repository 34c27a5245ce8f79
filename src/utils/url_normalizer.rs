//! Destination URL validation and canonicalization.
//!
//! Every stored `original_url` passes through here: scheme allow-list keeps
//! `javascript:`/`data:` targets out, and canonicalization keeps equivalent
//! URLs byte-identical in storage.

use url::Url;

/// Errors that can occur while normalizing a destination URL.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("Failed to normalize URL: {0}")]
    NormalizationFailed(String),
}

/// Normalizes an absolute URL to a canonical form.
///
/// Rules: scheme must be http/https, host is lowercased, default ports and
/// fragments are stripped, path and query are preserved as-is.
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let mut url =
        Url::parse(input).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlNormalizationError::UnsupportedProtocol),
    }

    if let Some(host) = url.host_str() {
        let host_lowercase = host.to_ascii_lowercase();
        url.set_host(Some(&host_lowercase)).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to set normalized host".to_string())
        })?;
    }

    url.set_fragment(None);

    let is_default_port = matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    );
    if is_default_port {
        url.set_port(None).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to remove default port".to_string())
        })?;
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_host() {
        assert_eq!(
            normalize_url("https://EXAMPLE.COM/Path").unwrap(),
            "https://example.com/Path"
        );
    }

    #[test]
    fn test_normalize_strips_default_ports() {
        assert_eq!(
            normalize_url("https://example.com:443/path").unwrap(),
            "https://example.com/path"
        );
        assert_eq!(
            normalize_url("http://example.com:80/path").unwrap(),
            "http://example.com/path"
        );
    }

    #[test]
    fn test_normalize_keeps_custom_port() {
        assert_eq!(
            normalize_url("http://localhost:3000/test").unwrap(),
            "http://localhost:3000/test"
        );
    }

    #[test]
    fn test_normalize_strips_fragment_keeps_query() {
        assert_eq!(
            normalize_url("https://example.com/page?key=value#section").unwrap(),
            "https://example.com/page?key=value"
        );
    }

    #[test]
    fn test_normalize_rejects_relative_and_garbage() {
        assert!(matches!(
            normalize_url("example.com"),
            Err(UrlNormalizationError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_url("not a url"),
            Err(UrlNormalizationError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_url(""),
            Err(UrlNormalizationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_dangerous_schemes() {
        for input in [
            "javascript:alert('xss')",
            "data:text/plain,hello",
            "file:///etc/passwd",
            "ftp://example.com/file.txt",
            "mailto:test@example.com",
        ] {
            assert!(
                matches!(
                    normalize_url(input),
                    Err(UrlNormalizationError::UnsupportedProtocol)
                ),
                "{input}"
            );
        }
    }
}
