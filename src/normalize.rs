//! URL canonicalization.
//!
//! Every URL entering the store passes through `normalize_url`. Comparison
//! is byte-equality on the canonical form.

use url::Url;

/// Canonicalize a URL string: strip fragment and query, force `https`,
/// strip a trailing slash from non-root paths.
pub fn normalize_url(input: &str) -> String {
    let mut s = input.trim();

    // Step 1: cut everything from the first `#`, then the first `?`.
    if let Some(idx) = s.find('#') {
        s = &s[..idx];
    }
    if let Some(idx) = s.find('?') {
        s = &s[..idx];
    }

    // Step 2: strip any number of leading http(s):// prefixes.
    let mut rest = s;
    loop {
        if let Some(stripped) = rest.strip_prefix("https://") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("http://") {
            rest = stripped;
        } else {
            break;
        }
    }

    // Step 3: prepend https://.
    let candidate = format!("https://{rest}");

    // Step 4: parse; on failure, return the string after step 3.
    let mut url = match Url::parse(&candidate) {
        Ok(u) => u,
        Err(_) => return candidate,
    };

    // Step 5: clear fragment and query.
    url.set_fragment(None);
    url.set_query(None);

    // Step 6: normalize path.
    {
        let path = url.path().to_string();
        if path.is_empty() {
            url.set_path("/");
        } else if path.len() > 1 && path.ends_with('/') {
            url.set_path(path.trim_end_matches('/'));
        }
    }

    // Step 7: serialize.
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fragment_and_query() {
        assert_eq!(
            normalize_url("https://example.com/page?q=1#section"),
            "https://example.com/page"
        );
    }

    #[test]
    fn forces_https() {
        assert_eq!(
            normalize_url("http://example.com/page"),
            "https://example.com/page"
        );
    }

    #[test]
    fn strips_repeated_scheme_prefixes() {
        assert_eq!(
            normalize_url("https://https://example.com/page"),
            "https://example.com/page"
        );
    }

    #[test]
    fn empty_path_becomes_root() {
        assert_eq!(normalize_url("https://example.com"), "https://example.com/");
    }

    #[test]
    fn trailing_slash_is_stripped_except_root() {
        assert_eq!(
            normalize_url("https://example.com/page/"),
            "https://example.com/page"
        );
        assert_eq!(normalize_url("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn duplicate_seed_trailing_slash_and_query_collide() {
        let a = normalize_url("https://example.com/wiki/Foo/");
        let b = normalize_url("https://example.com/wiki/Foo?utm_source=x");
        assert_eq!(a, b);
    }

    #[test]
    fn idempotent() {
        let cases = [
            "https://example.com/page?q=1#section",
            "http://example.com/",
            "example.com/foo/",
            "not a url at all",
        ];
        for case in cases {
            let once = normalize_url(case);
            let twice = normalize_url(&once);
            assert_eq!(once, twice, "normalize not idempotent for {case:?}");
        }
    }

    #[test]
    fn unparseable_input_falls_back_to_prefixed_string() {
        // A string with an illegal character for a host, after prefixing
        // with https://, still fails to parse as a URL.
        let result = normalize_url("http://[::badipv6");
        assert!(result.starts_with("https://"));
    }
}
