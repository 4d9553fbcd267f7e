//! Allowed Origin Set and the exact-match origin validator.

use std::collections::HashSet;

use axum::http::{HeaderMap, HeaderValue, header};

/// Fixed set of browser origins that may receive CORS-enabling headers.
///
/// Matching is exact byte equality: no wildcards, no subdomain matching,
/// no case folding and no scheme relaxation.
#[derive(Debug, Clone, Default)]
pub struct AllowedOrigins {
    origins: HashSet<String>,
}

impl AllowedOrigins {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origins: origins
                .into_iter()
                .map(Into::into)
                .filter(|o: &String| !o.is_empty())
                .collect(),
        }
    }

    /// Membership test. Absent or empty origins never match.
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            Some(o) if !o.is_empty() => self.origins.contains(o),
            _ => false,
        }
    }

    /// The `Origin` header value to echo back, if it is allowed.
    ///
    /// Non-UTF-8 and repeated `Origin` headers are treated as absent.
    pub fn allowed_origin(&self, headers: &HeaderMap) -> Option<HeaderValue> {
        let mut values = headers.get_all(header::ORIGIN).iter();
        let value = values.next()?;
        if values.next().is_some() {
            return None;
        }
        let origin = value.to_str().ok()?;
        self.is_allowed(Some(origin)).then(|| value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origins() -> AllowedOrigins {
        AllowedOrigins::new(["https://rgboo.com", "http://localhost:5173"])
    }

    #[test]
    fn test_exact_match_only() {
        let o = origins();
        assert!(o.is_allowed(Some("https://rgboo.com")));
        assert!(o.is_allowed(Some("http://localhost:5173")));

        assert!(!o.is_allowed(Some("https://evil.example")));
        assert!(!o.is_allowed(Some("http://rgboo.com")));
        assert!(!o.is_allowed(Some("https://www.rgboo.com")));
        assert!(!o.is_allowed(Some("https://RGBOO.com")));
        assert!(!o.is_allowed(Some("https://rgboo.com/")));
        assert!(!o.is_allowed(Some("https://rgboo.com.evil.example")));
        assert!(!o.is_allowed(Some("null")));
    }

    #[test]
    fn test_absent_or_empty_never_matches() {
        let o = AllowedOrigins::new(["https://rgboo.com", ""]);
        assert!(!o.is_allowed(None));
        assert!(!o.is_allowed(Some("")));
    }

    #[test]
    fn test_allowed_origin_from_headers() {
        let o = origins();

        let mut headers = HeaderMap::new();
        assert_eq!(o.allowed_origin(&headers), None);

        headers.insert(header::ORIGIN, HeaderValue::from_static("https://rgboo.com"));
        assert_eq!(o.allowed_origin(&headers).unwrap(), "https://rgboo.com");

        headers.insert(header::ORIGIN, HeaderValue::from_static("https://evil.example"));
        assert_eq!(o.allowed_origin(&headers), None);
    }

    #[test]
    fn test_repeated_origin_header_rejected() {
        let mut headers = HeaderMap::new();
        headers.append(header::ORIGIN, HeaderValue::from_static("https://rgboo.com"));
        headers.append(header::ORIGIN, HeaderValue::from_static("https://rgboo.com"));
        assert_eq!(origins().allowed_origin(&headers), None);
    }
}
