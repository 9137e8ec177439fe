/// Path segments of the route DSL
///
/// Pure functional sum type: each DSL token becomes exactly one
/// [`PathSegment`], and every operation is an exhaustive `match` over it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, RouteError};
use crate::params::TouchMap;

static PARAM_MATCHER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:([^/]+)$").expect("valid param regex"));
static WILDCARD_MATCHER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*([^/]+)$").expect("valid wildcard regex"));

static ENC_SEMICOLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%3B").expect("valid regex"));
static ENC_CLOSE_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%29").expect("valid regex"));
static ENC_OPEN_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%28").expect("valid regex"));
static ENC_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%2F").expect("valid regex"));
static ENC_PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%25").expect("valid regex"));

/// One slash-delimited token of a route path
///
/// # Examples
///
/// ```
/// use rhtmx_rules::route::segment::{classify_segment, PathSegment};
///
/// assert_eq!(classify_segment("users"), PathSegment::Static("users".into()));
/// assert_eq!(classify_segment(":id"), PathSegment::Dynamic("id".into()));
/// assert_eq!(classify_segment("*rest"), PathSegment::Star("rest".into()));
/// assert_eq!(classify_segment("..."), PathSegment::Continuation);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Literal text, matched by equality
    Static(String),
    /// `:name`, matches any non-empty token
    Dynamic(String),
    /// `*name`, swallows the rest of the URL
    Star(String),
    /// `...`, hands the rest of the URL to a child rule set
    Continuation,
}

/// Classifies a DSL token (pure function)
///
/// `...` is always classified as [`PathSegment::Continuation`]; checking that it
/// is the final token is the path parser's job.
pub fn classify_segment(token: &str) -> PathSegment {
    if let Some(caps) = PARAM_MATCHER.captures(token) {
        return PathSegment::Dynamic(caps[1].to_string());
    }
    if let Some(caps) = WILDCARD_MATCHER.captures(token) {
        return PathSegment::Star(caps[1].to_string());
    }
    if token == "..." {
        return PathSegment::Continuation;
    }
    PathSegment::Static(token.to_string())
}

impl PathSegment {
    /// Parameter name bound by this segment (empty for static/continuation)
    pub fn name(&self) -> &str {
        match self {
            PathSegment::Dynamic(name) | PathSegment::Star(name) => name,
            PathSegment::Static(_) | PathSegment::Continuation => "",
        }
    }

    /// Rank contribution: static `2`, dynamic `1`, star `0`, continuation nothing
    pub fn specificity(&self) -> &'static str {
        match self {
            PathSegment::Static(_) => "2",
            PathSegment::Dynamic(_) => "1",
            PathSegment::Star(_) => "0",
            PathSegment::Continuation => "",
        }
    }

    /// Collision token: literal text for static segments, a marker otherwise
    pub fn hash(&self) -> &str {
        match self {
            PathSegment::Static(path) => path,
            PathSegment::Dynamic(_) => ":",
            PathSegment::Star(_) => "*",
            PathSegment::Continuation => "...",
        }
    }

    pub fn is_continuation(&self) -> bool {
        matches!(self, PathSegment::Continuation)
    }

    /// Does this segment accept the given URL token?
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathSegment::Static(literal) => literal == path,
            PathSegment::Dynamic(_) => !path.is_empty(),
            PathSegment::Star(_) | PathSegment::Continuation => true,
        }
    }

    /// Produces this segment's URL text from the parameter bag
    pub(crate) fn generate(&self, params: &mut TouchMap<'_>) -> Result<String> {
        match self {
            PathSegment::Static(literal) => Ok(literal.clone()),
            PathSegment::Dynamic(name) => match params.get(name) {
                Some(Some(value)) => Ok(encode_dynamic_segment(value)),
                _ => Err(RouteError::MissingParameter { name: name.clone() }),
            },
            PathSegment::Star(name) => match params.get(name) {
                Some(value) => Ok(value.unwrap_or_default().to_string()),
                None => Err(RouteError::MissingParameter { name: name.clone() }),
            },
            PathSegment::Continuation => Ok(String::new()),
        }
    }
}

/// Escapes the characters that carry meaning in a URL tree
///
/// `%` goes first so the escapes introduced afterwards are not re-escaped.
///
/// # Examples
///
/// ```
/// use rhtmx_rules::route::segment::encode_dynamic_segment;
///
/// assert_eq!(encode_dynamic_segment("a;b"), "a%3Bb");
/// assert_eq!(encode_dynamic_segment("50%/(x)"), "50%25%2F%28x%29");
/// ```
pub fn encode_dynamic_segment(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('/', "%2F")
        .replace('(', "%28")
        .replace(')', "%29")
        .replace(';', "%3B")
}

/// Inverse of [`encode_dynamic_segment`], ASCII case-insensitive
///
/// Blank input decodes to `None`.
pub fn decode_dynamic_segment(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    let value = ENC_SEMICOLON.replace_all(value, ";");
    let value = ENC_CLOSE_PAREN.replace_all(&value, ")");
    let value = ENC_OPEN_PAREN.replace_all(&value, "(");
    let value = ENC_SLASH.replace_all(&value, "/");
    let value = ENC_PERCENT.replace_all(&value, "%");
    Some(value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{params, Params};
    use rstest::rstest;

    #[rstest]
    #[case("about", PathSegment::Static("about".to_string()))]
    #[case(":id", PathSegment::Dynamic("id".to_string()))]
    #[case("*rest", PathSegment::Star("rest".to_string()))]
    #[case("...", PathSegment::Continuation)]
    #[case("", PathSegment::Static(String::new()))]
    #[case(":", PathSegment::Static(":".to_string()))]
    #[case("*", PathSegment::Static("*".to_string()))]
    #[case("a:b", PathSegment::Static("a:b".to_string()))]
    fn test_classify_segment(#[case] token: &str, #[case] expected: PathSegment) {
        assert_eq!(classify_segment(token), expected);
    }

    #[test]
    fn test_specificity_and_hash() {
        let segs = [
            classify_segment("foo"),
            classify_segment(":id"),
            classify_segment("*rest"),
            classify_segment("..."),
        ];
        let spec: Vec<&str> = segs.iter().map(PathSegment::specificity).collect();
        let hash: Vec<&str> = segs.iter().map(PathSegment::hash).collect();
        assert_eq!(spec, vec!["2", "1", "0", ""]);
        assert_eq!(hash, vec!["foo", ":", "*", "..."]);
    }

    #[test]
    fn test_matches() {
        assert!(classify_segment("foo").matches("foo"));
        assert!(!classify_segment("foo").matches("bar"));
        assert!(classify_segment(":id").matches("42"));
        assert!(!classify_segment(":id").matches(""));
        assert!(classify_segment("*rest").matches(""));
        assert!(classify_segment("...").matches("anything"));
    }

    #[test]
    fn test_dynamic_generate_encodes() {
        let p = params([("id", "a/b")]);
        let mut touch = TouchMap::new(&p);
        let seg = classify_segment(":id");
        assert_eq!(seg.generate(&mut touch).unwrap(), "a%2Fb");
    }

    #[test]
    fn test_dynamic_generate_missing_and_flag() {
        let seg = classify_segment(":id");

        let empty = Params::new();
        let err = seg.generate(&mut TouchMap::new(&empty)).unwrap_err();
        assert!(matches!(err, RouteError::MissingParameter { ref name } if name == "id"));

        let mut flag = Params::new();
        flag.insert("id".to_string(), None);
        assert!(seg.generate(&mut TouchMap::new(&flag)).is_err());
    }

    #[test]
    fn test_star_generate_is_raw() {
        let p = params([("rest", "a/b;c")]);
        let seg = classify_segment("*rest");
        assert_eq!(seg.generate(&mut TouchMap::new(&p)).unwrap(), "a/b;c");
    }

    #[test]
    fn test_star_generate_absent_or_flag() {
        let seg = classify_segment("*rest");

        let empty = Params::new();
        let err = seg.generate(&mut TouchMap::new(&empty)).unwrap_err();
        assert!(matches!(err, RouteError::MissingParameter { ref name } if name == "rest"));

        let mut flag = Params::new();
        flag.insert("rest".to_string(), None);
        assert_eq!(seg.generate(&mut TouchMap::new(&flag)).unwrap(), "");
    }

    #[test]
    fn test_encode_decode() {
        assert_eq!(encode_dynamic_segment("a;b"), "a%3Bb");
        assert_eq!(decode_dynamic_segment("a%3Bb").as_deref(), Some("a;b"));
        assert_eq!(decode_dynamic_segment("a%3bb").as_deref(), Some("a;b"));

        let raw = "100%/(x);y";
        let encoded = encode_dynamic_segment(raw);
        assert_eq!(encoded, "100%25%2F%28x%29%3By");
        assert_eq!(decode_dynamic_segment(&encoded).as_deref(), Some(raw));
    }

    #[test]
    fn test_decode_blank_is_none() {
        assert_eq!(decode_dynamic_segment(""), None);
    }
}
