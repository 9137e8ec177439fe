//! Rule sets: every rule of one routable component
//!
//! A [`RuleSet`] owns its rules in one arena and keeps secondary indices
//! (name → rule, aux path → rule, hash → rule) over it. Recognition asks
//! every primary rule and returns **all** partial matches; picking the best
//! one is left to the caller (see [`most_specific`](crate::most_specific)).

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;

use crate::config::{RouteDefinition, RouteTable, RouteTarget};
use crate::error::{Result, RouteError};
use crate::handler::{AsyncRouteHandler, ComponentType, RouteHandler, SyncRouteHandler};
use crate::params::Params;
use crate::route::{ParamRoutePath, RegexRoutePath, RoutePath};
use crate::rules::{ComponentInstruction, PathMatch, RedirectRule, RouteMatch, RouteRule, Rule};
use crate::url::Url;

/// Index of a rule in a [`RuleSet`]'s arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(usize);

/// Rules for a single routable component
///
/// # Examples
///
/// ```
/// use rhtmx_rules::{ComponentType, RouteDefinition, RuleSet};
///
/// let mut rules = RuleSet::new();
/// rules.config(RouteDefinition::route("/users/:id", ComponentType::new("User")).with_name("User")).unwrap();
///
/// // `/users/:name` is structurally the same route
/// let err = rules
///     .config(RouteDefinition::route("/users/:name", ComponentType::new("Other")))
///     .unwrap_err();
/// assert!(err.is_configuration());
/// assert!(rules.has_route("User"));
/// ```
#[derive(Debug, Default)]
pub struct RuleSet {
    arena: Vec<Rule>,
    /// Primary rules in registration order
    rules: Vec<RuleId>,
    rules_by_name: HashMap<String, RuleId>,
    rules_by_hash: HashMap<String, RuleId>,
    aux_rules_by_name: HashMap<String, RuleId>,
    aux_rules_by_path: HashMap<String, RuleId>,
    default_rule: Option<RuleId>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a rule set from a route table, configuring entries in order
    pub fn from_table(table: RouteTable) -> Result<Self> {
        let mut rule_set = Self::new();
        for definition in table.into_definitions() {
            rule_set.config(definition)?;
        }
        Ok(rule_set)
    }

    /// Adds one definition; returns whether the new rule is terminal
    ///
    /// Redirects always count as terminal.
    pub fn config(&mut self, definition: RouteDefinition) -> Result<bool> {
        assert_valid_name(&definition)?;

        let route_path = route_path_for(&definition)?;
        let RouteDefinition {
            name,
            data,
            use_as_default,
            target,
            ..
        } = definition;

        let handler: Arc<dyn RouteHandler> = match target {
            RouteTarget::Auxiliary(component) => {
                let handler = Arc::new(SyncRouteHandler::new(component, data));
                return Ok(self.add_auxiliary(RouteRule::new(route_path, handler, name)));
            }
            RouteTarget::Redirect(redirect_to) => {
                self.assert_no_hash_collision(route_path.as_ref())?;
                self.add_primary(Rule::Redirect(RedirectRule::new(route_path, redirect_to)));
                return Ok(true);
            }
            RouteTarget::Component(component) => Arc::new(SyncRouteHandler::new(component, data)),
            RouteTarget::Loader(loader) => Arc::new(AsyncRouteHandler::new(loader, data)),
        };

        let rule = RouteRule::new(route_path, handler, name.clone());
        let terminal = rule.terminal();

        // collisions are reported before a second default
        self.assert_no_hash_collision(rule.route_path())?;
        if use_as_default {
            if let Some(existing) = self.default_rule {
                return Err(RouteError::MultipleDefaults {
                    path: rule.route_path().to_string(),
                    existing: self.rule(existing).path(),
                });
            }
        }

        let id = self.add_primary(Rule::Route(rule));
        if use_as_default {
            self.default_rule = Some(id);
        }
        if let Some(name) = name {
            self.rules_by_name.insert(name, id);
        }
        Ok(terminal)
    }

    fn add_auxiliary(&mut self, rule: RouteRule) -> bool {
        let terminal = rule.terminal();
        let path = rule.route_path().to_string();
        let name = rule.name().map(str::to_string);

        let id = RuleId(self.arena.len());
        self.arena.push(Rule::Route(rule));
        tracing::debug!(path = %path, name = ?name, "Configured auxiliary route");

        self.aux_rules_by_path.insert(path, id);
        if let Some(name) = name {
            self.aux_rules_by_name.insert(name, id);
        }
        terminal
    }

    /// Registers a primary rule that already passed the collision check
    fn add_primary(&mut self, rule: Rule) -> RuleId {
        let id = RuleId(self.arena.len());
        tracing::debug!(
            path = %rule.route_path(),
            specificity = %rule.specificity(),
            redirect = matches!(rule, Rule::Redirect(_)),
            "Configured route"
        );
        self.rules_by_hash.insert(rule.hash().to_string(), id);
        self.arena.push(rule);
        self.rules.push(id);
        id
    }

    fn assert_no_hash_collision(&self, path: &dyn RoutePath) -> Result<()> {
        match self.rules_by_hash.get(path.hash()) {
            Some(&existing) => Err(RouteError::RouteCollision {
                path: path.to_string(),
                existing: self.rule(existing).path(),
            }),
            None => Ok(()),
        }
    }

    fn rule(&self, id: RuleId) -> &Rule {
        &self.arena[id.0]
    }

    fn named_route(&self, name: &str) -> Option<&RouteRule> {
        self.rules_by_name
            .get(name)
            .and_then(|&id| self.rule(id).as_route())
    }

    /// Every partial match, in registration order
    ///
    /// When no primary rule matches but the URL carries auxiliary branches, a
    /// single instruction-less match carrying those branches is returned.
    pub async fn recognize(&self, url: Option<&Url>) -> Result<Vec<RouteMatch>> {
        let candidates = self.rules.iter().map(|&id| self.rule(id).recognize(url));
        let solutions: Vec<RouteMatch> = try_join_all(candidates)
            .await?
            .into_iter()
            .flatten()
            .collect();

        if solutions.is_empty() {
            if let Some(url) = url.filter(|u| !u.auxiliary.is_empty()) {
                tracing::trace!(path = %url.path, "Only auxiliary routes to recognize");
                return Ok(vec![RouteMatch::Path(PathMatch {
                    instruction: None,
                    remaining: None,
                    remaining_aux: url.auxiliary.clone(),
                })]);
            }
        }
        Ok(solutions)
    }

    /// Recognizes one auxiliary branch by its path
    ///
    /// Unknown paths yield a single `None`.
    pub async fn recognize_auxiliary(&self, url: &Url) -> Result<Vec<Option<RouteMatch>>> {
        match self.aux_rules_by_path.get(&url.path) {
            Some(&id) => Ok(vec![self.rule(id).recognize(Some(url)).await?]),
            None => Ok(vec![None]),
        }
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.rules_by_name.contains_key(name)
    }

    /// True when the named route's component is available without loading
    pub fn component_loaded(&self, name: &str) -> bool {
        self.named_route(name)
            .map(|rule| rule.handler().component_type().is_some())
            .unwrap_or(false)
    }

    /// Resolves the named route's component, loading it if needed
    pub async fn load_component(&self, name: &str) -> Result<ComponentType> {
        let rule = self
            .named_route(name)
            .ok_or_else(|| RouteError::UnknownRoute {
                name: name.to_string(),
            })?;
        rule.handler().resolve_component_type().await
    }

    /// Generates an instruction for a named route; `Ok(None)` for unknown names
    pub fn generate(&self, name: &str, params: &Params) -> Result<Option<Arc<ComponentInstruction>>> {
        self.rules_by_name
            .get(name)
            .map(|&id| self.rule(id).generate(params))
            .transpose()
    }

    /// Same as [`generate`](Self::generate), for auxiliary routes
    pub fn generate_auxiliary(
        &self,
        name: &str,
        params: &Params,
    ) -> Result<Option<Arc<ComponentInstruction>>> {
        self.aux_rules_by_name
            .get(name)
            .map(|&id| self.rule(id).generate(params))
            .transpose()
    }

    /// The route flagged `use_as_default`, if any
    pub fn default_rule(&self) -> Option<&RouteRule> {
        self.default_rule.and_then(|id| self.rule(id).as_route())
    }

    /// Primary rules in registration order
    pub fn rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter().map(move |&id| self.rule(id))
    }

    /// Number of primary rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Route names are CamelCase
fn assert_valid_name(definition: &RouteDefinition) -> Result<()> {
    let Some(name) = definition.name.as_deref() else {
        return Ok(());
    };
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.to_uppercase().to_string() != first.to_string() => {
            Err(RouteError::InvalidRouteName {
                path: definition.path.clone().unwrap_or_default(),
                name: name.to_string(),
                suggested: first.to_uppercase().chain(chars).collect(),
            })
        }
        _ => Ok(()),
    }
}

/// Picks the matching strategy: regex + serializer, else the path DSL
///
/// Auxiliary paths are relative, so their leading `/` is dropped.
fn route_path_for(definition: &RouteDefinition) -> Result<Box<dyn RoutePath>> {
    if let Some(regex) = &definition.regex {
        return match &definition.serializer {
            Some(serializer) => Ok(Box::new(RegexRoutePath::with_serializer(
                regex,
                Arc::clone(serializer),
            )?)),
            None => Err(RouteError::MissingSerializer {
                regex: regex.clone(),
            }),
        };
    }

    match &definition.path {
        Some(path) => {
            let path = if definition.is_auxiliary() {
                path.strip_prefix('/').unwrap_or(path)
            } else {
                path.as_str()
            };
            Ok(Box::new(ParamRoutePath::new(path)?))
        }
        None => Err(RouteError::MissingPathOrRegex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::params;

    fn component(name: &str) -> ComponentType {
        ComponentType::new(name)
    }

    #[test]
    fn test_rule_set_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleSet>();
    }

    #[test]
    fn test_config_returns_terminal() {
        let mut rules = RuleSet::new();
        assert!(rules
            .config(RouteDefinition::route("/a", component("A")))
            .unwrap());
        assert!(!rules
            .config(RouteDefinition::route("/b/...", component("B")))
            .unwrap());
        assert!(rules
            .config(RouteDefinition::redirect("/c/...", ["/A"]))
            .unwrap());
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn test_name_casing() {
        let mut rules = RuleSet::new();
        let err = rules
            .config(RouteDefinition::route("/foo", component("Foo")).with_name("foo"))
            .unwrap_err();
        match err {
            RouteError::InvalidRouteName {
                ref path,
                ref suggested,
                ..
            } => {
                assert_eq!(path, "/foo");
                assert_eq!(suggested, "Foo");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(rules.is_empty());

        rules
            .config(RouteDefinition::route("/foo", component("Foo")).with_name("Foo"))
            .unwrap();
        assert!(rules.has_route("Foo"));
    }

    #[test]
    fn test_hash_collision() {
        let mut rules = RuleSet::new();
        rules
            .config(RouteDefinition::route("/foo/:id", component("A")))
            .unwrap();
        let err = rules
            .config(RouteDefinition::route("/foo/:name", component("B")))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration '/foo/:name' conflicts with existing route '/foo/:id'"
        );

        // redirects collide too
        let err = rules
            .config(RouteDefinition::redirect("/foo/:other", ["/A"]))
            .unwrap_err();
        assert!(matches!(err, RouteError::RouteCollision { .. }));
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_aux_rules_skip_collision_check() {
        let mut rules = RuleSet::new();
        rules
            .config(RouteDefinition::route("/chat", component("A")))
            .unwrap();
        assert!(rules
            .config(RouteDefinition::aux("/chat", component("Chat")).with_name("Chat"))
            .unwrap());
        assert_eq!(rules.len(), 1);
        assert!(!rules.has_route("Chat"));
    }

    #[test]
    fn test_single_default() {
        let mut rules = RuleSet::new();
        rules
            .config(RouteDefinition::route("/a", component("A")).as_default())
            .unwrap();
        let err = rules
            .config(RouteDefinition::route("/b", component("B")).as_default())
            .unwrap_err();
        assert!(matches!(err, RouteError::MultipleDefaults { .. }));

        // a colliding second default reports the collision
        let err = rules
            .config(RouteDefinition::route("/c", component("C")).as_default())
            .unwrap_err();
        assert!(matches!(err, RouteError::MultipleDefaults { .. }));
        let err = rules
            .config(RouteDefinition::route("/a", component("A2")).as_default())
            .unwrap_err();
        assert!(matches!(err, RouteError::RouteCollision { .. }));
        assert_eq!(rules.default_rule().unwrap().route_path().to_string(), "/a");
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_path_or_regex_required() {
        let mut rules = RuleSet::new();
        let err = rules
            .config(RouteDefinition::new(RouteTarget::Component(component("A"))))
            .unwrap_err();
        assert!(matches!(err, RouteError::MissingPathOrRegex));

        let mut def = RouteDefinition::new(RouteTarget::Component(component("A")));
        def.regex = Some("^a$".to_string());
        let err = rules.config(def).unwrap_err();
        assert!(matches!(err, RouteError::MissingSerializer { ref regex } if regex == "^a$"));
    }

    #[test]
    fn test_generate_unknown_name_is_none() {
        let rules = RuleSet::new();
        assert!(rules.generate("Missing", &Params::new()).unwrap().is_none());
        assert!(rules
            .generate_auxiliary("Missing", &Params::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_generate_named() {
        let mut rules = RuleSet::new();
        rules
            .config(RouteDefinition::route("/users/:id", component("User")).with_name("User"))
            .unwrap();
        let instruction = rules
            .generate("User", &params([("id", "5")]))
            .unwrap()
            .unwrap();
        assert_eq!(instruction.url_path, "users/5");

        let err = rules.generate("User", &Params::new()).unwrap_err();
        assert!(matches!(err, RouteError::MissingParameter { .. }));
    }
}
