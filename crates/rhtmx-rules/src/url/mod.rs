/// URL trees consumed by route matching
///
/// A URL like `users;tab=info/42(sidebar//chat)?q=rust` is a chain of nodes:
/// `users` (matrix params `tab=info`) → `42` (auxiliary branches `sidebar`
/// and `chat`). The first node of a parsed URL is the **root**; its params are
/// query params instead of matrix params.

use std::fmt;

use crate::params::{serialize_params, Params};

pub mod parser;
pub use parser::UrlParser;

/// Marks whether a node starts a URL or sits below another node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlKind {
    /// Top of a URL: params are query params (`?a=1&b`)
    Root,
    /// Nested node: params are matrix params (`;a=1;b`)
    #[default]
    Segment,
}

/// One node of a hierarchical URL
///
/// The child chain can be as long as the request line. Walking, cloning,
/// comparing, formatting and dropping it all loop over [`Url::levels`], so
/// depth never grows the stack.
#[derive(Default)]
pub struct Url {
    /// Path text of this level, without separators
    pub path: String,
    /// Next level down, if any
    pub child: Option<Box<Url>>,
    /// Auxiliary branches attached to this level
    pub auxiliary: Vec<Url>,
    /// Matrix params (segments) or query params (root)
    pub params: Option<Params>,
    /// Root or nested segment
    pub kind: UrlKind,
}

impl Url {
    /// Creates a nested segment node with no child, aux or params
    pub fn segment(path: impl Into<String>) -> Self {
        Self::level(path.into(), None, Vec::new(), UrlKind::Segment)
    }

    /// Creates a root node with no child, aux or params
    pub fn root(path: impl Into<String>) -> Self {
        Self::level(path.into(), None, Vec::new(), UrlKind::Root)
    }

    /// A single node without a child
    pub(crate) fn level(
        path: String,
        params: Option<Params>,
        auxiliary: Vec<Url>,
        kind: UrlKind,
    ) -> Self {
        Self {
            path,
            child: None,
            auxiliary,
            params,
            kind,
        }
    }

    /// Links nodes top to bottom into one chain; `None` for no nodes
    pub(crate) fn chain(levels: Vec<Url>) -> Option<Url> {
        levels.into_iter().rev().fold(None, |child, mut node| {
            node.child = child.map(Box::new);
            Some(node)
        })
    }

    /// This node followed by every node below it
    pub fn levels(&self) -> impl Iterator<Item = &Url> + '_ {
        std::iter::successors(Some(self), |node| node.child.as_deref())
    }

    /// Copy of this node alone, without its child
    fn shallow_clone(&self) -> Url {
        Url::level(
            self.path.clone(),
            self.params.clone(),
            self.auxiliary.clone(),
            self.kind,
        )
    }

    fn shallow_eq(&self, other: &Url) -> bool {
        self.path == other.path
            && self.kind == other.kind
            && self.params == other.params
            && self.auxiliary == other.auxiliary
    }

    /// Parses a URL string into a tree (see [`UrlParser`])
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_rules::Url;
    ///
    /// let url = Url::parse("users/42").unwrap();
    /// assert!(url.is_root());
    /// assert_eq!(url.path, "users");
    /// assert_eq!(url.child.as_deref().unwrap().path, "42");
    /// ```
    pub fn parse(url: &str) -> crate::Result<Self> {
        UrlParser::new(url).parse()
    }

    pub fn with_child(mut self, child: Url) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    pub fn with_auxiliary(mut self, aux: Url) -> Self {
        self.auxiliary.push(aux);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    pub fn is_root(&self) -> bool {
        self.kind == UrlKind::Root
    }

    /// Serializes just this level: path plus its own params
    pub fn segment_to_string(&self) -> String {
        match self.kind {
            UrlKind::Root => format!("{}{}", self.path, self.query_params_string()),
            UrlKind::Segment => format!("{}{}", self.path, self.matrix_params_string()),
        }
    }

    fn matrix_params_string(&self) -> String {
        let serialized = self
            .params
            .as_ref()
            .map(|p| serialize_params(p).join(";"))
            .unwrap_or_default();
        if serialized.is_empty() {
            String::new()
        } else {
            format!(";{}", serialized)
        }
    }

    fn query_params_string(&self) -> String {
        match &self.params {
            Some(p) => format!("?{}", serialize_params(p).join("&")),
            None => String::new(),
        }
    }

    fn aux_string(&self) -> String {
        if self.auxiliary.is_empty() {
            return String::new();
        }
        let siblings: Vec<String> = self.auxiliary.iter().map(Url::to_string).collect();
        format!("({})", siblings.join("//"))
    }
}

impl fmt::Display for Url {
    /// Serializes the node and everything below it
    ///
    /// Root: `path(aux)/child?query`. Segment: `path;matrix(aux)/child`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // a root's query trails everything below it, innermost first
        let mut queries = Vec::new();
        for (depth, node) in self.levels().enumerate() {
            if depth > 0 {
                f.write_str("/")?;
            }
            f.write_str(&node.path)?;
            match node.kind {
                UrlKind::Root => queries.push(node.query_params_string()),
                UrlKind::Segment => f.write_str(&node.matrix_params_string())?,
            }
            f.write_str(&node.aux_string())?;
        }
        queries.iter().rev().try_for_each(|query| f.write_str(query))
    }
}

impl fmt::Debug for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for node in self.levels() {
            list.entry(&format_args!(
                "{:?} {:?} params={:?} aux={:?}",
                node.kind, node.path, node.params, node.auxiliary
            ));
        }
        list.finish()
    }
}

impl Clone for Url {
    fn clone(&self) -> Self {
        let levels = self.levels().map(Url::shallow_clone).collect();
        Url::chain(levels).unwrap_or_default()
    }
}

impl PartialEq for Url {
    fn eq(&self, other: &Self) -> bool {
        let mut ours = self.levels();
        let mut theirs = other.levels();
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.shallow_eq(b) => {}
                _ => return false,
            }
        }
    }
}

impl Drop for Url {
    fn drop(&mut self) {
        let mut next = self.child.take();
        while let Some(mut node) = next {
            next = node.child.take();
        }
    }
}
