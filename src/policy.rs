/// Refresh policy for gist requests
///
/// A gist is only refreshed when a logged-in user navigates to one of its
/// pages directly. Embedded views (iframes on other sites) and sub-resources
/// such as scripts or images are served from the cache as-is.
use reqwest::Url;
use std::path::Path;

/// Filename served when the gist root is requested
pub const DEFAULT_FILENAME: &str = "index.html";

/// Extension of documents whose direct load triggers a refresh
const PAGE_EXTENSION: &str = "html";

/// Request facts the refresh decision depends on
#[derive(Debug, Clone, Copy)]
pub struct RefreshContext<'a> {
    pub authenticated: bool,
    pub filename: &'a str,
    /// Raw `Referer` header, if any
    pub referrer: Option<&'a str>,
    /// Host the request was addressed to (`Host` header)
    pub host: Option<&'a str>,
}

impl RefreshContext<'_> {
    /// Decide whether the gist should be reloaded from upstream before serving
    pub fn should_refresh(&self) -> bool {
        self.authenticated && is_page(self.filename) && self.is_direct_navigation()
    }

    fn is_direct_navigation(&self) -> bool {
        match self.referrer {
            None => true,
            Some(referrer) if referrer.is_empty() => true,
            Some(referrer) => match (referrer_host(referrer), self.host) {
                (Some(referrer_host), Some(host)) => referrer_host.eq_ignore_ascii_case(host),
                _ => false,
            },
        }
    }
}

/// Whether the filename is a page document
pub fn is_page(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .map(|ext| ext == PAGE_EXTENSION)
        .unwrap_or(false)
}

/// `host[:port]` of a referrer URL, comparable to a `Host` header
fn referrer_host(referrer: &str) -> Option<String> {
    let url = Url::parse(referrer).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(filename: &'a str, referrer: Option<&'a str>) -> RefreshContext<'a> {
        RefreshContext {
            authenticated: true,
            filename,
            referrer,
            host: Some("gist.exposed"),
        }
    }

    #[test]
    fn test_direct_page_load_refreshes() {
        assert!(ctx("index.html", None).should_refresh());
        assert!(ctx("index.html", Some("")).should_refresh());
    }

    #[test]
    fn test_same_host_referrer_refreshes() {
        assert!(ctx("index.html", Some("https://gist.exposed/_/dashboard")).should_refresh());
    }

    #[test]
    fn test_foreign_referrer_does_not_refresh() {
        assert!(!ctx("index.html", Some("https://blog.example.com/post")).should_refresh());
        assert!(!ctx("index.html", Some("not a url")).should_refresh());
    }

    #[test]
    fn test_assets_do_not_refresh() {
        assert!(!ctx("app.js", None).should_refresh());
        assert!(!ctx("style.css", None).should_refresh());
        assert!(!ctx("README", None).should_refresh());
    }

    #[test]
    fn test_anonymous_does_not_refresh() {
        let mut context = ctx("index.html", None);
        context.authenticated = false;
        assert!(!context.should_refresh());
    }

    #[test]
    fn test_referrer_port_must_match() {
        let context = RefreshContext {
            authenticated: true,
            filename: "index.html",
            referrer: Some("http://localhost:40000/abc/"),
            host: Some("localhost:40000"),
        };
        assert!(context.should_refresh());

        let context = RefreshContext {
            host: Some("localhost:8080"),
            ..context
        };
        assert!(!context.should_refresh());
    }
}
