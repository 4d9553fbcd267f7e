//! Route lookup and upstream target construction.
//!
//! # Responsibilities
//! - Classify an inbound request path as proxied (`Api`) or `NotFound`
//! - Rewrite a proxied path onto the upstream base URL
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Classification looks only at the path; headers are never inspected
//! - Dot segments (`..`, `%2e%2e`) are resolved before the prefix test, so
//!   the path that is classified is the path that is forwarded
//! - A target that lands outside the upstream scope is `NotFound`
//! - Query string is carried over unchanged
//! - Explicit NotFound rather than silent default

use axum::http::Uri;
use url::Url;

use crate::config::UpstreamConfig;
use crate::routing::matcher::{Matcher, PathPrefixMatcher};

/// Scratch origin used only to run the URL path parser over an inbound path.
const NORMALIZE_ORIGIN: &str = "http://path.invalid";

/// Outcome of classifying an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Inside the proxied namespace; `target` is the upstream URL.
    Api { target: Url },
    /// Outside the proxied namespace.
    NotFound,
}

/// The rewritten path could not be turned into a URL.
#[derive(Debug, thiserror::Error)]
#[error("cannot build upstream target: {0}")]
pub struct InvalidTarget(#[from] url::ParseError);

/// Router for the single proxied namespace.
#[derive(Debug, Clone)]
pub struct ApiRouter {
    matcher: PathPrefixMatcher,
    /// Upstream base without a trailing slash.
    base: String,
    /// Every forwarded target path must start with this.
    scope: String,
    strip_prefix: bool,
}

impl ApiRouter {
    /// Build the router from upstream configuration.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, url::ParseError> {
        let base = Url::parse(&config.base_url)?;
        let base_path = base.path().trim_end_matches('/');
        let scope = if config.strip_prefix {
            format!("{}/", base_path)
        } else {
            format!("{}{}", base_path, config.path_prefix)
        };
        Ok(Self {
            matcher: PathPrefixMatcher::new(config.path_prefix.clone()),
            base: base.as_str().trim_end_matches('/').to_string(),
            scope,
            strip_prefix: config.strip_prefix,
        })
    }

    /// Classify a request URI, computing the upstream target for proxied paths.
    pub fn classify(&self, uri: &Uri) -> Result<Route, InvalidTarget> {
        let Some(normalized) = normalize_path(uri.path()) else {
            return Ok(Route::NotFound);
        };
        let path = normalized.as_str();
        if !self.matcher.matches(path) {
            return Ok(Route::NotFound);
        }

        let upstream_path = match self.matcher.remainder(path) {
            Some(rest) if self.strip_prefix => {
                if rest.starts_with('/') {
                    rest.to_string()
                } else {
                    format!("/{}", rest)
                }
            }
            _ => path.to_string(),
        };

        let target = match uri.query() {
            Some(query) => format!("{}{}?{}", self.base, upstream_path, query),
            None => format!("{}{}", self.base, upstream_path),
        };

        let target = Url::parse(&target)?;
        if !target.path().starts_with(&self.scope) {
            return Ok(Route::NotFound);
        }
        Ok(Route::Api { target })
    }
}

/// Resolve dot segments the way the URL parser does. `None` for paths that
/// are not origin-form (e.g. `*`).
fn normalize_path(path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return None;
    }
    Url::parse(&format!("{}{}", NORMALIZE_ORIGIN, path))
        .ok()
        .map(|url| url.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(base: &str, prefix: &str, strip: bool) -> ApiRouter {
        ApiRouter::from_config(&UpstreamConfig {
            base_url: base.into(),
            path_prefix: prefix.into(),
            strip_prefix: strip,
        })
        .unwrap()
    }

    fn target(router: &ApiRouter, uri: &str) -> String {
        match router.classify(&uri.parse().unwrap()).unwrap() {
            Route::Api { target } => target.to_string(),
            Route::NotFound => panic!("expected api route for {}", uri),
        }
    }

    #[test]
    fn test_non_prefixed_paths_not_found() {
        let r = router("https://api.rgboo.com", "/api/", false);
        for uri in ["/", "/favicon.ico", "/api", "/apix/color", "/index.html?api/"] {
            assert_eq!(r.classify(&uri.parse().unwrap()).unwrap(), Route::NotFound, "{}", uri);
        }
    }

    #[test]
    fn test_full_path_appended_to_base() {
        let r = router("https://api.rgboo.com", "/api/", false);
        assert_eq!(target(&r, "/api/color"), "https://api.rgboo.com/api/color");
    }

    #[test]
    fn test_query_preserved() {
        let r = router("https://api.rgboo.com/", "/api/", false);
        assert_eq!(
            target(&r, "/api/queue?limit=5&after=abc"),
            "https://api.rgboo.com/api/queue?limit=5&after=abc"
        );
    }

    #[test]
    fn test_absolute_inbound_uri_uses_path_only() {
        let r = router("https://api.rgboo.com", "/api/", false);
        assert_eq!(
            target(&r, "https://rgboo.com/api/color?x=1"),
            "https://api.rgboo.com/api/color?x=1"
        );
    }

    #[test]
    fn test_strip_prefix() {
        let r = router("http://127.0.0.1:9000/v2", "/api/", true);
        assert_eq!(target(&r, "/api/color"), "http://127.0.0.1:9000/v2/color");
        assert_eq!(target(&r, "/api/"), "http://127.0.0.1:9000/v2/");

        let r = router("http://127.0.0.1:9000", "/api", true);
        assert_eq!(target(&r, "/api/color"), "http://127.0.0.1:9000/color");
    }

    #[test]
    fn test_dot_segments_cannot_leave_namespace() {
        let r = router("https://api.rgboo.com", "/api/", false);
        for uri in [
            "/api/../admin/secrets",
            "/api/%2e%2e/admin",
            "/api/%2E%2E/admin",
            "/api/.%2e/admin",
            "/api/x/../../internal",
            "/api/..",
        ] {
            assert_eq!(r.classify(&uri.parse().unwrap()).unwrap(), Route::NotFound, "{}", uri);
        }
    }

    #[test]
    fn test_dot_segments_inside_namespace_resolved() {
        let r = router("https://api.rgboo.com", "/api/", false);
        assert_eq!(target(&r, "/api/x/../color"), "https://api.rgboo.com/api/color");
        assert_eq!(target(&r, "/api/./queue?limit=1"), "https://api.rgboo.com/api/queue?limit=1");
    }

    #[test]
    fn test_dot_segments_cannot_leave_base_path_when_stripping() {
        let r = router("http://127.0.0.1:9000/v2", "/api/", true);
        for uri in ["/api/../../admin", "/api/%2e%2e/admin", "/api/a/../../x"] {
            assert_eq!(r.classify(&uri.parse().unwrap()).unwrap(), Route::NotFound, "{}", uri);
        }
        assert_eq!(target(&r, "/api/a/../color"), "http://127.0.0.1:9000/v2/color");
    }
}
