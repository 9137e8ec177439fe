/// String → [`Url`] tree parser
///
/// Grammar, informally:
///
/// ```text
/// root    := "/"? path aux? matrix? ("/" segment)? query?
/// segment := path matrix? aux? ("/" segment)?
/// aux     := "(" segment ("//" segment)* ")"
/// matrix  := (";" key ("=" value)?)*
/// query   := "?" key ("=" value)? ("&" key ("=" value)?)*
/// ```
///
/// Matrix params on the root are accepted and discarded; root params are
/// query params. The child chain is parsed in a loop, so its length is
/// unbounded; auxiliary groups nest at most [`MAX_AUX_DEPTH`] deep.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Url, UrlKind};
use crate::error::{Result, RouteError};
use crate::params::Params;

/// Deepest `(...)` nesting accepted inside a URL
pub const MAX_AUX_DEPTH: usize = 16;

static SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^/()?;=&#]+").expect("valid segment regex"));
static QUERY_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^()?;&#]+").expect("valid query value regex"));

fn match_url_segment(s: &str) -> &str {
    SEGMENT_RE.find(s).map(|m| m.as_str()).unwrap_or("")
}

fn match_query_value(s: &str) -> &str {
    QUERY_VALUE_RE.find(s).map(|m| m.as_str()).unwrap_or("")
}

/// Single-use parser over a borrowed URL string
pub struct UrlParser<'a> {
    remaining: &'a str,
    aux_depth: usize,
}

impl<'a> UrlParser<'a> {
    pub fn new(url: &'a str) -> Self {
        Self {
            remaining: url,
            aux_depth: 0,
        }
    }

    /// Parses the whole URL, returning its root node
    ///
    /// `""` and `"/"` parse to an empty root.
    pub fn parse(mut self) -> Result<Url> {
        if self.remaining.is_empty() || self.remaining == "/" {
            return Ok(Url::root(""));
        }
        self.parse_root()
    }

    fn peek_starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    fn capture(&mut self, prefix: &str) -> Result<()> {
        match self.remaining.strip_prefix(prefix) {
            Some(rest) => {
                self.remaining = rest;
                Ok(())
            }
            None => Err(RouteError::MalformedUrl {
                expected: prefix.to_string(),
                remaining: self.remaining.to_string(),
            }),
        }
    }

    fn parse_root(&mut self) -> Result<Url> {
        if self.peek_starts_with("/") {
            self.capture("/")?;
        }
        let path = match_url_segment(self.remaining);
        self.capture(path)?;

        let auxiliary = if self.peek_starts_with("(") {
            self.parse_auxiliary_routes()?
        } else {
            Vec::new()
        };

        if self.peek_starts_with(";") {
            self.parse_matrix_params()?;
        }

        let child = if self.peek_starts_with("/") && !self.peek_starts_with("//") {
            self.capture("/")?;
            self.parse_segment()?
        } else {
            None
        };

        let params = if self.peek_starts_with("?") {
            Some(self.parse_query_params()?)
        } else {
            None
        };

        Ok(Url {
            path: path.to_string(),
            child: child.map(Box::new),
            auxiliary,
            params,
            kind: UrlKind::Root,
        })
    }

    /// Parses a segment and its whole child chain
    fn parse_segment(&mut self) -> Result<Option<Url>> {
        if self.remaining.is_empty() {
            return Ok(None);
        }
        if self.peek_starts_with("/") {
            self.capture("/")?;
        }

        let mut levels = vec![self.parse_level()?];
        while self.peek_starts_with("/") && !self.peek_starts_with("//") {
            self.capture("/")?;
            if self.remaining.is_empty() {
                break;
            }
            levels.push(self.parse_level()?);
        }
        Ok(Url::chain(levels))
    }

    /// One `path;matrix(aux)` level, without its child
    fn parse_level(&mut self) -> Result<Url> {
        let path = match_url_segment(self.remaining);
        self.capture(path)?;

        let params = if self.peek_starts_with(";") {
            Some(self.parse_matrix_params()?)
        } else {
            None
        };

        let auxiliary = if self.peek_starts_with("(") {
            self.parse_auxiliary_routes()?
        } else {
            Vec::new()
        };

        Ok(Url::level(
            path.to_string(),
            params,
            auxiliary,
            UrlKind::Segment,
        ))
    }

    fn parse_query_params(&mut self) -> Result<Params> {
        let mut params = Params::new();
        self.capture("?")?;
        self.parse_param(&mut params, match_query_value)?;
        while self.peek_starts_with("&") {
            self.capture("&")?;
            self.parse_param(&mut params, match_query_value)?;
        }
        Ok(params)
    }

    fn parse_matrix_params(&mut self) -> Result<Params> {
        let mut params = Params::new();
        while self.peek_starts_with(";") {
            self.capture(";")?;
            self.parse_param(&mut params, match_url_segment)?;
        }
        Ok(params)
    }

    fn parse_param(&mut self, params: &mut Params, value_matcher: fn(&str) -> &str) -> Result<()> {
        let key = match_url_segment(self.remaining);
        if key.is_empty() {
            return Ok(());
        }
        self.capture(key)?;

        let mut value = None;
        if self.peek_starts_with("=") {
            self.capture("=")?;
            let matched = value_matcher(self.remaining);
            if !matched.is_empty() {
                self.capture(matched)?;
                value = Some(matched.to_string());
            }
        }
        params.insert(key.to_string(), value);
        Ok(())
    }

    fn parse_auxiliary_routes(&mut self) -> Result<Vec<Url>> {
        if self.aux_depth >= MAX_AUX_DEPTH {
            return Err(RouteError::AuxiliaryTooDeep {
                limit: MAX_AUX_DEPTH,
            });
        }
        let mut routes = Vec::new();
        self.capture("(")?;
        self.aux_depth += 1;

        while !self.peek_starts_with(")") && !self.remaining.is_empty() {
            let before = self.remaining.len();
            if let Some(segment) = self.parse_segment()? {
                routes.push(segment);
            }
            if self.peek_starts_with("//") {
                self.capture("//")?;
            }
            if self.remaining.len() == before {
                // nothing consumed: a character no segment can start with
                break;
            }
        }

        self.capture(")")?;
        self.aux_depth -= 1;
        Ok(routes)
    }
}
