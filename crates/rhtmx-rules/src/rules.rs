//! Rules: a route path paired with what to do when it matches
//!
//! - [`RouteRule`] resolves a component and produces a [`ComponentInstruction`]
//! - [`RedirectRule`] points somewhere else
//!
//! [`Rule`] is the closed sum of both, which is what a
//! [`RuleSet`](crate::RuleSet) stores.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Result, RouteError};
use crate::handler::{ComponentType, RouteData, RouteHandler};
use crate::params::{serialize_params, Params};
use crate::route::{GeneratedUrl, RoutePath, Specificity};
use crate::url::Url;

/// Everything needed to render one level of a navigation
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInstruction {
    pub url_path: String,
    /// Non-positional params, serialized as `key=value` / `key`
    pub url_params: Vec<String>,
    pub route_data: RouteData,
    pub component_type: ComponentType,
    pub terminal: bool,
    pub specificity: Specificity,
    /// All params: positional and non-positional
    pub params: Params,
    pub route_name: Option<String>,
    /// Set by the navigation layer when the component instance is reused
    pub reuse: bool,
}

/// A rule recognized the start of a URL
#[derive(Debug, Clone, PartialEq)]
pub struct PathMatch {
    /// `None` only for the aux-only match a rule set synthesizes
    pub instruction: Option<Arc<ComponentInstruction>>,
    /// URL left for a child rule set
    pub remaining: Option<Url>,
    /// Auxiliary branches still to recognize
    pub remaining_aux: Vec<Url>,
}

/// A redirect rule recognized a URL
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectMatch {
    pub redirect_to: Vec<String>,
    pub specificity: Specificity,
}

/// Partial recognition produced by a rule
#[derive(Debug, Clone, PartialEq)]
pub enum RouteMatch {
    Path(PathMatch),
    Redirect(RedirectMatch),
}

impl RouteMatch {
    pub fn specificity(&self) -> Option<&Specificity> {
        match self {
            RouteMatch::Path(m) => m.instruction.as_ref().map(|i| &i.specificity),
            RouteMatch::Redirect(m) => Some(&m.specificity),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, RouteMatch::Redirect(_))
    }

    pub fn as_path(&self) -> Option<&PathMatch> {
        match self {
            RouteMatch::Path(m) => Some(m),
            RouteMatch::Redirect(_) => None,
        }
    }
}

/// Picks the most specific match; the earliest one wins a tie
///
/// Matches without a specificity (the aux-only match) rank last.
///
/// # Examples
///
/// ```
/// use rhtmx_rules::{most_specific, RedirectMatch, RouteMatch, Specificity};
///
/// let weak = RouteMatch::Redirect(RedirectMatch { redirect_to: vec!["A".into()], specificity: Specificity::from("12") });
/// let strong = RouteMatch::Redirect(RedirectMatch { redirect_to: vec!["B".into()], specificity: Specificity::from("21") });
/// let matches = [weak, strong.clone()];
/// assert_eq!(most_specific(&matches), Some(&strong));
/// ```
pub fn most_specific(matches: &[RouteMatch]) -> Option<&RouteMatch> {
    matches.iter().fold(None, |best: Option<&RouteMatch>, candidate| match best {
        Some(current) if current.specificity() >= candidate.specificity() => Some(current),
        _ => Some(candidate),
    })
}

/// Most instructions one rule keeps for reuse
pub const INSTRUCTION_CACHE_LIMIT: usize = 1024;

/// Rule that resolves to a component
///
/// Instructions are shared per `path?params` key, up to
/// [`INSTRUCTION_CACHE_LIMIT`] keys. Past that, new keys get a fresh
/// instruction every time.
pub struct RouteRule {
    path: Box<dyn RoutePath>,
    handler: Arc<dyn RouteHandler>,
    name: Option<String>,
    cache: Mutex<HashMap<String, Arc<ComponentInstruction>>>,
}

impl RouteRule {
    pub fn new(
        path: Box<dyn RoutePath>,
        handler: Arc<dyn RouteHandler>,
        name: Option<String>,
    ) -> Self {
        Self {
            path,
            handler,
            name,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn route_path(&self) -> &dyn RoutePath {
        self.path.as_ref()
    }

    pub fn handler(&self) -> &Arc<dyn RouteHandler> {
        &self.handler
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn terminal(&self) -> bool {
        self.path.terminal()
    }

    /// Matches `url`, then waits for the component before building the instruction
    pub async fn recognize(&self, url: Option<&Url>) -> Result<Option<RouteMatch>> {
        let Some(matched) = self.path.match_url(url) else {
            return Ok(None);
        };
        self.handler.resolve_component_type().await?;

        let instruction =
            self.instruction(&matched.url_path, matched.url_params, matched.all_params)?;
        Ok(Some(RouteMatch::Path(PathMatch {
            instruction: Some(instruction),
            remaining: matched.rest,
            remaining_aux: matched.auxiliary,
        })))
    }

    /// Builds an instruction from params; the component must be loaded already
    pub fn generate(&self, params: &Params) -> Result<Arc<ComponentInstruction>> {
        let generated = self.path.generate_url(params)?;
        self.instruction(
            &generated.url_path,
            serialize_params(&generated.url_params),
            params.clone(),
        )
    }

    /// Generates the URL pieces without touching the component
    pub fn generate_component_path_values(&self, params: &Params) -> Result<GeneratedUrl> {
        self.path.generate_url(params)
    }

    /// Instructions are shared per `path?params` key
    fn instruction(
        &self,
        url_path: &str,
        url_params: Vec<String>,
        params: Params,
    ) -> Result<Arc<ComponentInstruction>> {
        let component_type =
            self.handler
                .component_type()
                .ok_or_else(|| RouteError::ComponentNotLoaded {
                    path: self.path.to_string(),
                })?;

        let key = format!("{}?{}", url_path, url_params.join("&"));
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.get(&key) {
            return Ok(Arc::clone(cached));
        }

        let instruction = Arc::new(ComponentInstruction {
            url_path: url_path.to_string(),
            url_params,
            route_data: self.handler.data().clone(),
            component_type,
            terminal: self.path.terminal(),
            specificity: self.path.specificity().clone(),
            params,
            route_name: self.name.clone(),
            reuse: false,
        });
        if cache.len() < INSTRUCTION_CACHE_LIMIT {
            cache.insert(key, Arc::clone(&instruction));
        }
        Ok(instruction)
    }
}

impl std::fmt::Debug for RouteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRule")
            .field("path", &self.path.to_string())
            .field("name", &self.name)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

/// Rule that sends the navigation elsewhere
#[derive(Debug)]
pub struct RedirectRule {
    path: Box<dyn RoutePath>,
    redirect_to: Vec<String>,
}

impl RedirectRule {
    pub fn new(path: Box<dyn RoutePath>, redirect_to: Vec<String>) -> Self {
        Self { path, redirect_to }
    }

    pub fn route_path(&self) -> &dyn RoutePath {
        self.path.as_ref()
    }

    pub fn redirect_to(&self) -> &[String] {
        &self.redirect_to
    }

    pub fn recognize(&self, url: Option<&Url>) -> Option<RouteMatch> {
        self.path.match_url(url).map(|_| {
            RouteMatch::Redirect(RedirectMatch {
                redirect_to: self.redirect_to.clone(),
                specificity: self.path.specificity().clone(),
            })
        })
    }

    /// Redirects cannot be generated
    pub fn generate(&self, _params: &Params) -> Result<Arc<ComponentInstruction>> {
        Err(RouteError::RedirectGeneration {
            path: self.path.to_string(),
        })
    }
}

/// Any rule a rule set can hold
#[derive(Debug)]
pub enum Rule {
    Route(RouteRule),
    Redirect(RedirectRule),
}

impl Rule {
    pub fn route_path(&self) -> &dyn RoutePath {
        match self {
            Rule::Route(rule) => rule.route_path(),
            Rule::Redirect(rule) => rule.route_path(),
        }
    }

    /// Source text of the route path
    pub fn path(&self) -> String {
        self.route_path().to_string()
    }

    pub fn hash(&self) -> &str {
        self.route_path().hash()
    }

    pub fn specificity(&self) -> &Specificity {
        self.route_path().specificity()
    }

    /// Redirects always report terminal, whatever their path looks like
    pub fn terminal(&self) -> bool {
        match self {
            Rule::Route(rule) => rule.terminal(),
            Rule::Redirect(_) => true,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Rule::Route(rule) => rule.name(),
            Rule::Redirect(_) => None,
        }
    }

    pub fn as_route(&self) -> Option<&RouteRule> {
        match self {
            Rule::Route(rule) => Some(rule),
            Rule::Redirect(_) => None,
        }
    }

    pub async fn recognize(&self, url: Option<&Url>) -> Result<Option<RouteMatch>> {
        let result = match self {
            Rule::Route(rule) => rule.recognize(url).await?,
            Rule::Redirect(rule) => rule.recognize(url),
        };
        tracing::trace!(
            path = %self.route_path(),
            matched = result.is_some(),
            "Rule recognition"
        );
        Ok(result)
    }

    pub fn generate(&self, params: &Params) -> Result<Arc<ComponentInstruction>> {
        match self {
            Rule::Route(rule) => rule.generate(params),
            Rule::Redirect(rule) => rule.generate(params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::SyncRouteHandler;
    use crate::params::params;
    use crate::route::ParamRoutePath;

    fn route_rule(dsl: &str, component: &str) -> RouteRule {
        RouteRule::new(
            Box::new(ParamRoutePath::new(dsl).unwrap()),
            Arc::new(SyncRouteHandler::new(
                ComponentType::new(component),
                RouteData::new().with("title", component),
            )),
            Some(component.to_string()),
        )
    }

    #[tokio::test]
    async fn test_route_rule_recognize() {
        let rule = route_rule("/users/:id", "User");
        let url = Url::parse("users/42?tab=info").unwrap();

        let m = rule.recognize(Some(&url)).await.unwrap().unwrap();
        let path_match = m.as_path().unwrap();
        let instruction = path_match.instruction.as_ref().unwrap();

        assert_eq!(instruction.url_path, "users/42");
        assert_eq!(instruction.url_params, vec!["tab=info"]);
        assert_eq!(instruction.component_type.name(), "User");
        assert_eq!(instruction.route_name.as_deref(), Some("User"));
        assert_eq!(instruction.route_data.get("title"), Some("User"));
        assert_eq!(instruction.params, params([("id", "42"), ("tab", "info")]));
        assert!(instruction.terminal);
        assert!(path_match.remaining.is_none());
    }

    #[tokio::test]
    async fn test_instruction_cache_is_shared() {
        let rule = route_rule("/users/:id", "User");
        let url = Url::parse("users/42").unwrap();

        let first = rule.recognize(Some(&url)).await.unwrap().unwrap();
        let second = rule.recognize(Some(&url)).await.unwrap().unwrap();
        let a = first.as_path().unwrap().instruction.clone().unwrap();
        let b = second.as_path().unwrap().instruction.clone().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let generated = rule.generate(&params([("id", "42")])).unwrap();
        assert!(Arc::ptr_eq(&a, &generated));
    }

    #[test]
    fn test_route_rule_generate_extra_params() {
        let rule = route_rule("/users/:id", "User");
        let instruction = rule.generate(&params([("id", "7"), ("sort", "asc")])).unwrap();
        assert_eq!(instruction.url_path, "users/7");
        assert_eq!(instruction.url_params, vec!["sort=asc"]);
    }

    #[test]
    fn test_instruction_cache_is_bounded() {
        let rule = route_rule("/users/:id", "User");
        for id in 0..INSTRUCTION_CACHE_LIMIT + 10 {
            let instruction = rule.generate(&params([("id", id.to_string())])).unwrap();
            assert_eq!(instruction.url_path, format!("users/{}", id));
        }
        assert_eq!(rule.cache.lock().unwrap().len(), INSTRUCTION_CACHE_LIMIT);

        // keys past the limit are rebuilt, earlier ones still shared
        let overflow = params([("id", (INSTRUCTION_CACHE_LIMIT + 1).to_string())]);
        let a = rule.generate(&overflow).unwrap();
        let b = rule.generate(&overflow).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);

        let first = params([("id", "0")]);
        let c = rule.generate(&first).unwrap();
        let d = rule.generate(&first).unwrap();
        assert!(Arc::ptr_eq(&c, &d));
    }

    #[test]
    fn test_path_values_skip_the_cache() {
        let rule = route_rule("/users/:id", "User");
        let values = rule
            .generate_component_path_values(&params([("id", "7"), ("sort", "asc")]))
            .unwrap();
        assert_eq!(values.url_path, "users/7");
        assert_eq!(values.url_params, params([("sort", "asc")]));
        assert!(rule.cache.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redirect_rule() {
        let rule = Rule::Redirect(RedirectRule::new(
            Box::new(ParamRoutePath::new("/old/...").unwrap()),
            vec!["/New".to_string()],
        ));
        assert!(rule.terminal());

        let url = Url::parse("old/page").unwrap();
        let m = rule.recognize(Some(&url)).await.unwrap().unwrap();
        assert_eq!(
            m,
            RouteMatch::Redirect(RedirectMatch {
                redirect_to: vec!["/New".to_string()],
                specificity: Specificity::from("2"),
            })
        );

        let err = rule.generate(&Params::new()).unwrap_err();
        assert!(matches!(err, RouteError::RedirectGeneration { .. }));
    }

    #[test]
    fn test_most_specific_prefers_first_on_tie() {
        let a = RouteMatch::Redirect(RedirectMatch {
            redirect_to: vec!["A".to_string()],
            specificity: Specificity::from("21"),
        });
        let b = RouteMatch::Redirect(RedirectMatch {
            redirect_to: vec!["B".to_string()],
            specificity: Specificity::from("21"),
        });
        let matches = [a.clone(), b];
        assert_eq!(most_specific(&matches), Some(&a));
        assert_eq!(most_specific(&[]), None);
    }
}
