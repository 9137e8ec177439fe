/// Regex-based route paths
///
/// Same contract as [`ParamRoutePath`](super::ParamRoutePath), different
/// primitive: the whole serialized URL is tested against a regex, and URL
/// generation is handed to a caller-supplied serializer.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::{GeneratedUrl, MatchedUrl, RoutePath, Specificity};
use crate::error::{Result, RouteError};
use crate::params::Params;
use crate::url::Url;

/// Inverse of a regex route: turns params back into a URL
///
/// Implemented for any `Fn(&Params) -> GeneratedUrl`.
pub trait RegexSerializer: Send + Sync {
    fn serialize(&self, params: &Params) -> GeneratedUrl;
}

impl<F> RegexSerializer for F
where
    F: Fn(&Params) -> GeneratedUrl + Send + Sync,
{
    fn serialize(&self, params: &Params) -> GeneratedUrl {
        self(params)
    }
}

/// Route path backed by a regex
///
/// Capture groups are exposed as params `"0"`, `"1"`, … (group 0 is the whole
/// match); named groups are exposed under their names too.
///
/// # Examples
///
/// ```
/// use rhtmx_rules::{GeneratedUrl, Params, RegexRoutePath, RoutePath, Url};
///
/// let path = RegexRoutePath::new(
///     r"^hello/(?P<who>\w+)$",
///     |p: &Params| GeneratedUrl::new(
///         format!("hello/{}", p.get("who").cloned().flatten().unwrap_or_default()),
///         Params::new(),
///     ),
/// )
/// .unwrap();
///
/// let url = Url::parse("hello/world").unwrap();
/// let matched = path.match_url(Some(&url)).unwrap();
/// assert_eq!(matched.all_params.get("who"), Some(&Some("world".to_string())));
/// ```
#[derive(Clone)]
pub struct RegexRoutePath {
    source: String,
    regex: Regex,
    serializer: Arc<dyn RegexSerializer>,
    specificity: Specificity,
}

impl RegexRoutePath {
    pub fn new(source: &str, serializer: impl RegexSerializer + 'static) -> Result<Self> {
        Self::with_serializer(source, Arc::new(serializer))
    }

    /// Same as [`new`](Self::new) with an already shared serializer
    pub fn with_serializer(source: &str, serializer: Arc<dyn RegexSerializer>) -> Result<Self> {
        let regex = Regex::new(source).map_err(|e| RouteError::InvalidRegex {
            regex: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
            serializer,
            specificity: Specificity::from("2"),
        })
    }
}

impl RoutePath for RegexRoutePath {
    fn match_url(&self, url: Option<&Url>) -> Option<MatchedUrl> {
        let url_path = url?.to_string();
        let caps = self.regex.captures(&url_path)?;

        let mut params = Params::new();
        for (i, group) in caps.iter().enumerate() {
            params.insert(i.to_string(), group.map(|m| m.as_str().to_string()));
        }
        for name in self.regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                params.insert(name.to_string(), Some(m.as_str().to_string()));
            }
        }

        Some(MatchedUrl {
            url_path,
            all_params: params,
            ..MatchedUrl::default()
        })
    }

    fn generate_url(&self, params: &Params) -> Result<GeneratedUrl> {
        Ok(self.serializer.serialize(params))
    }

    fn specificity(&self) -> &Specificity {
        &self.specificity
    }

    /// The regex source: two identical regexes collide
    fn hash(&self) -> &str {
        &self.source
    }

    fn terminal(&self) -> bool {
        true
    }
}

impl fmt::Display for RegexRoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl fmt::Debug for RegexRoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexRoutePath")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
