//! URL resolution so that equal resources produce equal cache keys.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a possibly relative URL against the client origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative references (`/static/style.css`) against `origin`
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(input: &str, origin: &url::Url) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(lowered.as_str()))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether `url` shares scheme, host and port with `origin`.
pub fn is_same_origin(url: &url::Url, origin: &url::Url) -> bool {
    url.origin() == origin.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("http://localhost:5000").unwrap()
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve("/static/style.css", &origin()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/static/style.css");
    }

    #[test]
    fn test_resolve_absolute_cross_origin() {
        let url = resolve("https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css", &origin()).unwrap();
        assert_eq!(url.host_str(), Some("cdn.jsdelivr.net"));
    }

    #[test]
    fn test_resolve_lowercase_host() {
        let url = resolve("https://EXAMPLE.COM/a", &origin()).unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve("/search#results", &origin()).unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/search");
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve("/search?q=tofu&page=2", &origin()).unwrap();
        assert_eq!(url.query(), Some("q=tofu&page=2"));
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve("  /login  ", &origin()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/login");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve("file:///etc/passwd", &origin());
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve("", &origin()), Err(UrlError::Empty)));
        assert!(matches!(resolve("   ", &origin()), Err(UrlError::Empty)));
    }

    #[test]
    fn test_same_origin() {
        let o = origin();
        assert!(is_same_origin(&resolve("/x", &o).unwrap(), &o));
        assert!(!is_same_origin(&resolve("http://localhost:5001/x", &o).unwrap(), &o));
        assert!(!is_same_origin(&resolve("https://localhost:5000/x", &o).unwrap(), &o));
    }
}
