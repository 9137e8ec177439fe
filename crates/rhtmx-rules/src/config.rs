//! Route definitions: what an application hands to [`RuleSet::config`](crate::RuleSet::config)
//!
//! Definitions are built in code with the builder methods, or deserialized
//! from a TOML route table:
//!
//! ```toml
//! [[route]]
//! path = "/users/:id"
//! component = "UserDetail"
//! name = "User"
//! data = { title = "User" }
//!
//! [[redirect]]
//! path = "/"
//! redirect_to = ["/Home"]
//!
//! [[aux]]
//! path = "/chat"
//! component = "Chat"
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::handler::{ComponentLoader, ComponentType, RouteData};
use crate::route::RegexSerializer;

/// What a matching definition leads to
#[derive(Clone)]
pub enum RouteTarget {
    /// Component known up front
    Component(ComponentType),
    /// Component produced by a loader on first use
    Loader(Arc<dyn ComponentLoader>),
    /// Auxiliary route: recognized per aux branch, never ranked against primaries
    Auxiliary(ComponentType),
    /// Redirect to another link
    Redirect(Vec<String>),
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Component(c) => f.debug_tuple("Component").field(c).finish(),
            RouteTarget::Loader(_) => f.write_str("Loader(..)"),
            RouteTarget::Auxiliary(c) => f.debug_tuple("Auxiliary").field(c).finish(),
            RouteTarget::Redirect(to) => f.debug_tuple("Redirect").field(to).finish(),
        }
    }
}

/// One route definition
///
/// Exactly one of `path` or `regex` should be set; a `regex` needs a
/// `serializer`. Both are checked when the definition is configured.
///
/// # Examples
///
/// ```
/// use rhtmx_rules::{ComponentType, RouteDefinition};
///
/// let def = RouteDefinition::route("/users/:id", ComponentType::new("UserDetail"))
///     .with_name("User")
///     .with_meta("title", "User")
///     .as_default();
/// assert!(def.use_as_default);
/// ```
#[derive(Clone)]
pub struct RouteDefinition {
    pub path: Option<String>,
    pub regex: Option<String>,
    pub serializer: Option<Arc<dyn RegexSerializer>>,
    pub name: Option<String>,
    pub data: RouteData,
    pub use_as_default: bool,
    pub target: RouteTarget,
}

impl RouteDefinition {
    /// Definition with neither path nor regex yet
    pub fn new(target: RouteTarget) -> Self {
        Self {
            path: None,
            regex: None,
            serializer: None,
            name: None,
            data: RouteData::default(),
            use_as_default: false,
            target,
        }
    }

    pub fn route(path: impl Into<String>, component: ComponentType) -> Self {
        Self::new(RouteTarget::Component(component)).with_path(path)
    }

    pub fn async_route(path: impl Into<String>, loader: Arc<dyn ComponentLoader>) -> Self {
        Self::new(RouteTarget::Loader(loader)).with_path(path)
    }

    pub fn aux(path: impl Into<String>, component: ComponentType) -> Self {
        Self::new(RouteTarget::Auxiliary(component)).with_path(path)
    }

    pub fn redirect<I, S>(path: impl Into<String>, redirect_to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RouteTarget::Redirect(
            redirect_to.into_iter().map(Into::into).collect(),
        ))
        .with_path(path)
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Matches with a regex instead of the path DSL
    pub fn with_regex(
        mut self,
        regex: impl Into<String>,
        serializer: impl RegexSerializer + 'static,
    ) -> Self {
        self.regex = Some(regex.into());
        self.serializer = Some(Arc::new(serializer));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_data(mut self, data: RouteData) -> Self {
        self.data = data;
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data = self.data.with(key, value);
        self
    }

    /// Makes this the rule set's default route
    pub fn as_default(mut self) -> Self {
        self.use_as_default = true;
        self
    }

    pub fn is_auxiliary(&self) -> bool {
        matches!(self.target, RouteTarget::Auxiliary(_))
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.target, RouteTarget::Redirect(_))
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("path", &self.path)
            .field("regex", &self.regex)
            .field("name", &self.name)
            .field("use_as_default", &self.use_as_default)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// `[[route]]` entry of a route table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    pub path: String,
    pub component: String,
    pub name: Option<String>,
    #[serde(default)]
    pub data: RouteData,
    #[serde(default)]
    pub use_as_default: bool,
}

/// `[[aux]]` entry of a route table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuxEntry {
    pub path: String,
    pub component: String,
    pub name: Option<String>,
    #[serde(default)]
    pub data: RouteData,
}

/// `[[redirect]]` entry of a route table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectEntry {
    pub path: String,
    pub redirect_to: Vec<String>,
}

/// Route table as written in TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteTable {
    #[serde(default, rename = "route")]
    pub routes: Vec<RouteEntry>,
    #[serde(default, rename = "redirect")]
    pub redirects: Vec<RedirectEntry>,
    #[serde(default)]
    pub aux: Vec<AuxEntry>,
}

impl RouteTable {
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        toml::from_str(source).context("Failed to parse route table")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read route table {}", path.display()))?;
        Self::from_toml_str(&source)
            .with_context(|| format!("Invalid route table {}", path.display()))
    }

    /// Converts to runtime definitions: routes, then redirects, then aux routes
    pub fn into_definitions(self) -> Vec<RouteDefinition> {
        let routes = self.routes.into_iter().map(|entry| {
            let mut def = RouteDefinition::route(entry.path, ComponentType::new(entry.component))
                .with_data(entry.data);
            def.name = entry.name;
            def.use_as_default = entry.use_as_default;
            def
        });
        let redirects = self
            .redirects
            .into_iter()
            .map(|entry| RouteDefinition::redirect(entry.path, entry.redirect_to));
        let aux = self.aux.into_iter().map(|entry| {
            let mut def = RouteDefinition::aux(entry.path, ComponentType::new(entry.component))
                .with_data(entry.data);
            def.name = entry.name;
            def
        });

        routes.chain(redirects).chain(aux).collect()
    }
}
