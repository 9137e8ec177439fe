/// Route paths: compiled matchers for a single route definition
///
/// Contains the shared [`RoutePath`] contract and its two strategies:
/// - [`ParamRoutePath`] walks DSL segments against a URL tree
/// - [`RegexRoutePath`] tests a regex against the serialized URL

use std::fmt;

use crate::error::Result;
use crate::params::Params;
use crate::url::Url;

pub mod param_path;
pub mod regex_path;
pub mod segment;

// Re-export commonly used types
pub use param_path::ParamRoutePath;
pub use regex_path::{RegexRoutePath, RegexSerializer};
pub use segment::{classify_segment, decode_dynamic_segment, encode_dynamic_segment, PathSegment};

/// Ranking key used to pick the best of several matching routes
///
/// Compared lexicographically: per position static (`2`) beats dynamic (`1`)
/// beats star (`0`), and a string that runs out first is the weaker one.
///
/// # Examples
///
/// ```
/// use rhtmx_rules::Specificity;
///
/// assert!(Specificity::from("21") > Specificity::from("12"));
/// assert!(Specificity::from("2") > Specificity::from("1"));
/// assert!(Specificity::from("22") > Specificity::from("2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(String);

impl Specificity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Specificity {
    fn from(s: &str) -> Self {
        Specificity(s.to_string())
    }
}

impl From<String> for Specificity {
    fn from(s: String) -> Self {
        Specificity(s)
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful [`RoutePath::match_url`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchedUrl {
    /// URL text consumed by the match
    pub url_path: String,
    /// Non-positional params, serialized as `key=value` / `key`
    pub url_params: Vec<String>,
    /// Positional params merged over the non-positional ones
    pub all_params: Params,
    /// Auxiliary branches found on the last consumed node
    pub auxiliary: Vec<Url>,
    /// Unconsumed remainder, for a child rule set
    pub rest: Option<Url>,
}

/// Result of [`RoutePath::generate_url`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneratedUrl {
    pub url_path: String,
    /// Supplied params no positional segment consumed
    pub url_params: Params,
}

impl GeneratedUrl {
    pub fn new(url_path: impl Into<String>, url_params: Params) -> Self {
        Self {
            url_path: url_path.into(),
            url_params,
        }
    }
}

/// Matching strategy behind a rule
///
/// `Display` yields the source text the path was built from, for diagnostics.
pub trait RoutePath: fmt::Display + fmt::Debug + Send + Sync {
    /// Matches the start of `url`; `None` means no match (not an error)
    fn match_url(&self, url: Option<&Url>) -> Option<MatchedUrl>;

    /// Builds a URL from `params`
    fn generate_url(&self, params: &Params) -> Result<GeneratedUrl>;

    fn specificity(&self) -> &Specificity;

    /// Structural fingerprint used to detect colliding configurations
    fn hash(&self) -> &str;

    /// False when the path defers the rest of the URL to a child rule set
    fn terminal(&self) -> bool;
}
