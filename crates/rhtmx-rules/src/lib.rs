//! # RHTMX Rules
//!
//! Route-path rules for hierarchical routers:
//! - Static segments (`/about`)
//! - Dynamic parameters (`/users/:id`)
//! - Star captures (`/files/*rest`)
//! - Continuations (`/admin/...`) handing the rest of the URL to a child rule set
//! - Regex routes with a custom serializer
//! - Auxiliary routes and redirects
//!
//! ## How it fits together
//!
//! - A **route path** compiles a DSL string once and then matches URL trees and
//!   generates URLs, both as pure functions.
//! - A **rule** pairs a route path with a component handler or a redirect.
//! - A **rule set** holds the rules of one routable component, rejects bad
//!   configuration up front, and returns *every* partial match on recognition.
//!   Ranking is the caller's job: compare [`Specificity`] values, or use
//!   [`most_specific`].
//!
//! ## Specificity
//!
//! Each segment contributes one character: static `2`, dynamic `1`, star `0`.
//! Strings compare left to right, so earlier literal segments dominate:
//! `/foo/:id` (`21`) outranks `/:foo/bar` (`12`).
//!
//! ## Example
//!
//! ```
//! use rhtmx_rules::{most_specific, ComponentType, RouteDefinition, RuleSet, Url};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut rules = RuleSet::new();
//! rules.config(RouteDefinition::route("/users/new", ComponentType::new("NewUser"))).unwrap();
//! rules.config(RouteDefinition::route("/users/:id", ComponentType::new("User"))).unwrap();
//!
//! let url = Url::parse("/users/new").unwrap();
//! let matches = rules.recognize(Some(&url)).await.unwrap();
//! assert_eq!(matches.len(), 2);
//!
//! let best = most_specific(&matches).unwrap();
//! let instruction = best.as_path().unwrap().instruction.as_ref().unwrap();
//! assert_eq!(instruction.component_type.name(), "NewUser");
//! # }
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
mod error;
pub mod handler;
pub mod params;
pub mod route;
mod rule_set;
pub mod rules;
pub mod url;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{RouteDefinition, RouteTable, RouteTarget};
pub use error::{Result, RouteError};
pub use handler::{
    AsyncRouteHandler, ComponentLoader, ComponentType, RouteData, RouteHandler, SyncRouteHandler,
};
pub use params::{params, serialize_params, Params};
pub use route::{
    GeneratedUrl, MatchedUrl, ParamRoutePath, PathSegment, RegexRoutePath, RegexSerializer,
    RoutePath, Specificity,
};
pub use rule_set::{RuleId, RuleSet};
pub use rules::{
    most_specific, ComponentInstruction, PathMatch, RedirectMatch, RedirectRule, RouteMatch,
    RouteRule, Rule,
};
pub use url::{Url, UrlKind, UrlParser};
