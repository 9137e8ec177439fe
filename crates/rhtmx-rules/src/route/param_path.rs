/// DSL route paths: parsing, URL-tree matching and URL generation
///
/// All functions are **pure**: a path is compiled once and never changes.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::segment::{classify_segment, decode_dynamic_segment, PathSegment};
use super::{GeneratedUrl, MatchedUrl, RoutePath, Specificity};
use crate::error::{Result, RouteError};
use crate::params::{serialize_params, Params, TouchMap};
use crate::url::Url;

/// Characters reserved for the URL's own parameter syntax
static RESERVED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//|\(|\)|;|\?|=").expect("valid reserved-chars regex"));

/// Route path compiled from the slash-delimited DSL
///
/// - `users` static, matched by equality
/// - `:id` dynamic, any non-empty token
/// - `*rest` star, everything that is left
/// - `...` continuation, last token only: the rest goes to a child rule set
///
/// # Examples
///
/// ```
/// use rhtmx_rules::{ParamRoutePath, RoutePath, Url};
///
/// let path = ParamRoutePath::new("/users/:id").unwrap();
/// assert_eq!(path.specificity().as_str(), "21");
/// assert_eq!(path.hash(), "users/:");
///
/// let url = Url::parse("users/42").unwrap();
/// let matched = path.match_url(Some(&url)).unwrap();
/// assert_eq!(matched.all_params.get("id"), Some(&Some("42".to_string())));
/// ```
#[derive(Debug, Clone)]
pub struct ParamRoutePath {
    route_path: String,
    segments: Vec<PathSegment>,
    specificity: Specificity,
    hash: String,
    terminal: bool,
}

impl ParamRoutePath {
    /// Validates and compiles a DSL string
    ///
    /// Fails on `#`, on any of `//` `(` `)` `;` `?` `=`, and on a `...`
    /// that is not the final token.
    pub fn new(route_path: &str) -> Result<Self> {
        assert_valid_path(route_path)?;
        let segments = parse_path_string(route_path)?;

        let specificity = calculate_specificity(&segments);
        let hash = calculate_hash(&segments);
        let terminal = !segments
            .last()
            .map(PathSegment::is_continuation)
            .unwrap_or(false);

        Ok(Self {
            route_path: route_path.to_string(),
            segments,
            specificity,
            hash,
            terminal,
        })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

fn assert_valid_path(path: &str) -> Result<()> {
    if path.contains('#') {
        return Err(RouteError::HashInPath {
            path: path.to_string(),
        });
    }
    if let Some(illegal) = RESERVED_CHARS.find(path) {
        return Err(RouteError::ReservedCharacter {
            path: path.to_string(),
            character: illegal.as_str().to_string(),
        });
    }
    Ok(())
}

/// Splits the DSL into segments, one per token
fn parse_path_string(route_path: &str) -> Result<Vec<PathSegment>> {
    let normalized = route_path.strip_prefix('/').unwrap_or(route_path);
    let tokens: Vec<&str> = normalized.split('/').collect();
    let limit = tokens.len() - 1;

    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| match classify_segment(token) {
            PathSegment::Continuation if i < limit => Err(RouteError::MisplacedContinuation {
                path: normalized.to_string(),
            }),
            segment => Ok(segment),
        })
        .collect()
}

/// Concatenates per-segment ranks; earlier segments weigh more
fn calculate_specificity(segments: &[PathSegment]) -> Specificity {
    if segments.is_empty() {
        // an empty path is as specific as a static segment
        return Specificity::from("2");
    }
    segments
        .iter()
        .map(PathSegment::specificity)
        .collect::<String>()
        .into()
}

/// `/foo/:id` and `/foo/:name` both hash to `foo/:`
fn calculate_hash(segments: &[PathSegment]) -> String {
    segments
        .iter()
        .map(PathSegment::hash)
        .collect::<Vec<_>>()
        .join("/")
}

impl RoutePath for ParamRoutePath {
    /// Walks segments and URL nodes side by side
    ///
    /// A star captures the serialized remainder of the URL (matrix params, aux
    /// and children included). A continuation stops the walk and leaves the
    /// current node as `rest`. A terminal path must consume every node.
    fn match_url(&self, url: Option<&Url>) -> Option<MatchedUrl> {
        let mut next = url;
        let mut last_consumed: Option<&Url> = None;
        let mut positional = Params::new();
        let mut captured: Vec<String> = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            if segment.is_continuation() {
                break;
            }

            let Some(node) = next else {
                if !segment.matches("") {
                    return None;
                }
                continue;
            };
            last_consumed = Some(node);

            match segment {
                PathSegment::Star(name) => {
                    let rest = node.to_string();
                    positional.insert(name.clone(), Some(rest.clone()));
                    captured.push(rest);
                    next = None;
                    break;
                }
                PathSegment::Dynamic(name) => {
                    positional.insert(name.clone(), decode_dynamic_segment(&node.path));
                }
                PathSegment::Static(_) | PathSegment::Continuation => {
                    if !segment.matches(&node.path) {
                        return None;
                    }
                }
            }
            captured.push(node.path.clone());
            next = node.child.as_deref();
        }

        if self.terminal && next.is_some() {
            return None;
        }

        let mut matched = MatchedUrl {
            url_path: captured.join("/"),
            rest: next.cloned(),
            ..MatchedUrl::default()
        };

        match last_consumed {
            Some(node) => {
                // root: query params; otherwise the consumed node's matrix params
                let params_source = match url {
                    Some(root) if root.is_root() => root,
                    _ => node,
                };
                if let Some(extra) = &params_source.params {
                    matched.url_params = serialize_params(extra);
                    matched.all_params = extra.clone();
                }
                matched.all_params.extend(positional);
                matched.auxiliary = node.auxiliary.clone();
            }
            None => matched.all_params = positional,
        }

        Some(matched)
    }

    fn generate_url(&self, params: &Params) -> Result<GeneratedUrl> {
        let mut tokens = TouchMap::new(params);
        let path = self
            .segments
            .iter()
            .filter(|segment| !segment.is_continuation())
            .map(|segment| segment.generate(&mut tokens))
            .collect::<Result<Vec<_>>>()?;

        Ok(GeneratedUrl::new(path.join("/"), tokens.into_unused()))
    }

    fn specificity(&self) -> &Specificity {
        &self.specificity
    }

    fn hash(&self) -> &str {
        &self.hash
    }

    fn terminal(&self) -> bool {
        self.terminal
    }
}

impl fmt::Display for ParamRoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.route_path)
    }
}
