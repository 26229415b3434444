//! Glob-style URL match patterns.
//!
//! A pattern is `scheme://host/path` where `*` matches any run of characters,
//! including `/`, `:` and `?`. Patterns are anchored to the whole URL.
//! Scheme and host compare case-insensitively; path and query don't.

use std::borrow::Cow;
use std::fmt;

use regex::Regex;

const SCHEME_SEPARATOR: &str = "://";

/// A compiled match pattern.
#[derive(Debug, Clone)]
pub struct MatchPattern {
    source: String,
    regex: Regex,
}

impl MatchPattern {
    /// Validate and compile a pattern.
    pub fn parse(pattern: &str) -> Result<Self, String> {
        if pattern.is_empty() {
            return Err("pattern is empty".to_string());
        }
        if pattern.chars().any(char::is_whitespace) {
            return Err("pattern contains whitespace".to_string());
        }

        let (scheme, rest) = pattern
            .split_once(SCHEME_SEPARATOR)
            .ok_or_else(|| "missing `://` after scheme".to_string())?;

        if !is_valid_scheme(scheme) {
            return Err(format!("invalid scheme `{}`", scheme));
        }

        let slash = rest
            .find('/')
            .ok_or_else(|| "missing path; add `/*` to match any path".to_string())?;
        if slash == 0 {
            return Err("missing host".to_string());
        }

        // Scheme and host are matched against a lowercased URL prefix, so
        // fold the pattern's prefix the same way.
        let prefix_len = scheme.len() + SCHEME_SEPARATOR.len() + slash;
        let folded = format!(
            "{}{}",
            pattern[..prefix_len].to_ascii_lowercase(),
            &pattern[prefix_len..]
        );

        let body = folded
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let regex = Regex::new(&format!("(?s)^{}$", body)).map_err(|e| e.to_string())?;

        Ok(MatchPattern {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Test a URL against this pattern.
    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(&fold_scheme_and_host(url))
    }

    /// The pattern as written in the table.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for MatchPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// `*` or an RFC 3986 scheme.
fn is_valid_scheme(scheme: &str) -> bool {
    if scheme == "*" {
        return true;
    }
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Lowercase the scheme and authority of a URL, leaving the rest untouched.
fn fold_scheme_and_host(url: &str) -> Cow<'_, str> {
    let Some(sep) = url.find(SCHEME_SEPARATOR) else {
        return Cow::Borrowed(url);
    };

    let authority_start = sep + SCHEME_SEPARATOR.len();
    let authority_end = url[authority_start..]
        .find(&['/', '?', '#'][..])
        .map_or(url.len(), |i| authority_start + i);

    let prefix = &url[..authority_end];
    if !prefix.bytes().any(|b| b.is_ascii_uppercase()) {
        return Cow::Borrowed(url);
    }

    Cow::Owned(format!(
        "{}{}",
        prefix.to_ascii_lowercase(),
        &url[authority_end..]
    ))
}

/// Match a single pattern string against a URL.
///
/// Compiles on every call; the registry keeps compiled patterns instead.
pub fn matches(pattern: &str, url: &str) -> bool {
    MatchPattern::parse(pattern)
        .map(|p| p.matches(url))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(s: &str) -> MatchPattern {
        MatchPattern::parse(s).unwrap()
    }

    #[test]
    fn test_exact_path_with_scheme_wildcard() {
        let p = pattern("*://acdn.adnxs.com/ast/ast.js");
        assert!(p.matches("https://acdn.adnxs.com/ast/ast.js"));
        assert!(p.matches("http://acdn.adnxs.com/ast/ast.js"));
        assert!(!p.matches("https://acdn.adnxs.com/ast/ast.js?v=2"));
        assert!(!p.matches("https://acdn.adnxs.com/ast/ast.json"));
        assert!(!p.matches("https://evil.com/?u=https://acdn.adnxs.com/ast/ast.js.x"));
    }

    #[test]
    fn test_wildcards_cross_segments() {
        let p = pattern("*://*.adnxs.com/*/pb.js");
        assert!(p.matches("https://ib.adnxs.com/prebid/v1/pb.js"));
        assert!(!p.matches("https://adnxs.com/x/pb.js"));

        let p = pattern("*://connect.facebook.net/*/sdk.js*");
        assert!(p.matches("https://connect.facebook.net/en_US/sdk.js"));
        assert!(p.matches("https://connect.facebook.net/en_US/sdk.js?hash=abc"));
    }

    #[test]
    fn test_wildcard_in_query() {
        let p = pattern("*://pubads.g.doubleclick.net/gampad/*ad-blk*");
        assert!(p.matches("https://pubads.g.doubleclick.net/gampad/ads?iu=x&ad-blk=1"));
        assert!(!p.matches("https://pubads.g.doubleclick.net/gampad/ads?iu=x"));
    }

    #[test]
    fn test_case_sensitivity() {
        let p = pattern("*://Static.Chartbeat.com/js/chartbeat.js");
        // Scheme and host fold
        assert!(p.matches("HTTPS://STATIC.CHARTBEAT.COM/js/chartbeat.js"));
        // Path doesn't
        assert!(!p.matches("https://static.chartbeat.com/JS/chartbeat.js"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let p = pattern("*://example.com/a+b(c).js?x=[1]");
        assert!(p.matches("https://example.com/a+b(c).js?x=[1]"));
        assert!(!p.matches("https://example.com/aab(c).js?x=[1]"));
    }

    #[test]
    fn test_malformed_patterns() {
        assert!(MatchPattern::parse("").is_err());
        assert!(MatchPattern::parse("example.com/*").is_err());
        assert!(MatchPattern::parse("*://example.com").is_err());
        assert!(MatchPattern::parse("*:///path").is_err());
        assert!(MatchPattern::parse("ht tp://example.com/").is_err());
        assert!(MatchPattern::parse("1http://example.com/").is_err());
    }

    #[test]
    fn test_fold_scheme_and_host() {
        assert_eq!(
            fold_scheme_and_host("HTTPS://Example.COM/Path?Q=1"),
            "https://example.com/Path?Q=1"
        );
        assert_eq!(
            fold_scheme_and_host("https://EXAMPLE.com?Q"),
            "https://example.com?Q"
        );
        assert!(matches!(
            fold_scheme_and_host("https://example.com/Path"),
            Cow::Borrowed(_)
        ));
        assert_eq!(fold_scheme_and_host("no-scheme/ABC"), "no-scheme/ABC");
    }

    #[test]
    fn test_free_function() {
        assert!(matches("*://trackertest.org/*", "https://trackertest.org/x"));
        assert!(!matches("not a pattern", "https://trackertest.org/x"));
    }
}
