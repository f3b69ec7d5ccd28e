//! URL canonicalization and small helpers shared by the scheduler, the
//! robots checker and the fetcher.

use url::Url;

/// Canonicalize a URL so the same logical page is only ever scheduled once.
///
/// The fragment is removed and trailing slashes are stripped from non-root
/// paths. Query strings are kept and paths are not case-folded; the host is
/// lower-cased by the URL parser. Input that does not parse is returned
/// unchanged so it fails later at fetch time instead of disappearing.
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw.trim()) else {
        return raw.to_string();
    };

    url.set_fragment(None);

    if !url.cannot_be_a_base() {
        let path = url.path().to_string();
        if path != "/" && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/');
            if trimmed.is_empty() {
                url.set_path("/");
            } else {
                url.set_path(trimmed);
            }
        }
    }

    url.to_string()
}

/// `scheme://host[:port]` for a URL, used as the robots.txt cache key and
/// the rate-limit key.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let origin = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };
    Some(origin)
}

/// Lower-cased host of a URL.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// Path plus query, the part of a URL robots.txt rules are matched against.
pub fn request_target(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        Err(_) => "/".to_string(),
    }
}

/// Resolve an `href` found on `base` into an absolute, normalized URL.
pub fn resolve_link(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let resolved = base_url.join(href).ok()?;

    Some(normalize_url(resolved.as_str()))
}

/// True when `host` equals `domain` or is one of its subdomains.
pub fn host_matches_domain(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fragment() {
        assert_eq!(
            normalize_url("https://example.com/privacy#cookies"),
            "https://example.com/privacy"
        );
    }

    #[test]
    fn strips_trailing_slash_on_non_root_path() {
        assert_eq!(
            normalize_url("https://example.com/legal/terms/"),
            "https://example.com/legal/terms"
        );
        assert_eq!(
            normalize_url("https://example.com/legal//"),
            "https://example.com/legal"
        );
    }

    #[test]
    fn keeps_root_slash() {
        assert_eq!(normalize_url("https://example.com"), "https://example.com/");
        assert_eq!(normalize_url("https://example.com/"), "https://example.com/");
        assert_eq!(normalize_url("https://example.com//"), "https://example.com/");
    }

    #[test]
    fn keeps_query_and_path_case() {
        assert_eq!(
            normalize_url("https://EXAMPLE.com/Legal/Privacy?rev=2024#top"),
            "https://example.com/Legal/Privacy?rev=2024"
        );
    }

    #[test]
    fn malformed_input_is_returned_unmodified() {
        assert_eq!(normalize_url("not a url"), "not a url");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "https://example.com",
            "https://example.com/a/b/",
            "https://example.com/a//",
            "https://example.com//",
            "https://example.com/a/?q=1#frag",
            "http://Example.COM:8080/Terms/#x",
            "mailto:legal@example.com",
            "not a url",
            "https://example.com/%7Euser/",
        ];
        for input in inputs {
            let once = normalize_url(input);
            assert_eq!(normalize_url(&once), once, "input: {input}");
        }
    }

    #[test]
    fn origin_includes_explicit_port() {
        assert_eq!(
            origin_of("http://127.0.0.1:8080/robots.txt").as_deref(),
            Some("http://127.0.0.1:8080")
        );
        assert_eq!(
            origin_of("https://Example.com/privacy").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(origin_of("mailto:someone@example.com"), None);
    }

    #[test]
    fn request_target_keeps_query() {
        assert_eq!(request_target("https://example.com/a/b?x=1"), "/a/b?x=1");
        assert_eq!(request_target("https://example.com"), "/");
    }

    #[test]
    fn resolves_relative_links() {
        assert_eq!(
            resolve_link("https://example.com/company/about", "../legal/terms/").as_deref(),
            Some("https://example.com/legal/terms")
        );
        assert_eq!(
            resolve_link("https://example.com/", "/privacy#top").as_deref(),
            Some("https://example.com/privacy")
        );
        assert_eq!(resolve_link("https://example.com/", "   "), None);
    }

    #[test]
    fn subdomains_match_their_parent() {
        assert!(host_matches_domain("www.example.com", "example.com"));
        assert!(host_matches_domain("example.com", "Example.com"));
        assert!(!host_matches_domain("badexample.com", "example.com"));
        assert!(!host_matches_domain("ads.example.net", "example.com"));
    }
}
