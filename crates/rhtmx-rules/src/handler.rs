//! Route handlers: how a rule gets hold of its component
//!
//! A [`SyncRouteHandler`] knows its component up front. An
//! [`AsyncRouteHandler`] asks a [`ComponentLoader`] the first time somebody
//! needs the component and remembers the outcome.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::error::{Result, RouteError};

/// Reference to a routable component
///
/// Only the name is tracked here; resolving it into something renderable is
/// the caller's business.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentType(String);

impl ComponentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Arbitrary data attached to a route (titles, permissions, ...)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteData(HashMap<String, String>);

impl RouteData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for RouteData {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// Produces a component on demand
///
/// Implemented for async closures returning `anyhow::Result<ComponentType>`.
#[async_trait]
pub trait ComponentLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<ComponentType>;
}

#[async_trait]
impl<F, Fut> ComponentLoader for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ComponentType>> + Send + 'static,
{
    async fn load(&self) -> anyhow::Result<ComponentType> {
        (self)().await
    }
}

/// Handler contract consumed by route rules
#[async_trait]
pub trait RouteHandler: Send + Sync + fmt::Debug {
    /// Resolves the component, loading it at most once
    async fn resolve_component_type(&self) -> Result<ComponentType>;

    /// The component, if already resolved
    fn component_type(&self) -> Option<ComponentType>;

    fn data(&self) -> &RouteData;
}

/// Handler for a component known at configuration time
#[derive(Debug, Clone)]
pub struct SyncRouteHandler {
    component_type: ComponentType,
    data: RouteData,
}

impl SyncRouteHandler {
    pub fn new(component_type: ComponentType, data: RouteData) -> Self {
        Self {
            component_type,
            data,
        }
    }
}

#[async_trait]
impl RouteHandler for SyncRouteHandler {
    async fn resolve_component_type(&self) -> Result<ComponentType> {
        Ok(self.component_type.clone())
    }

    fn component_type(&self) -> Option<ComponentType> {
        Some(self.component_type.clone())
    }

    fn data(&self) -> &RouteData {
        &self.data
    }
}

/// Handler for a lazily loaded component
///
/// The loader runs once. Concurrent callers wait on the same load, and the
/// outcome (including a failure) is memoized.
pub struct AsyncRouteHandler {
    loader: Arc<dyn ComponentLoader>,
    data: RouteData,
    resolved: OnceCell<std::result::Result<ComponentType, Arc<anyhow::Error>>>,
}

impl AsyncRouteHandler {
    pub fn new(loader: Arc<dyn ComponentLoader>, data: RouteData) -> Self {
        Self {
            loader,
            data,
            resolved: OnceCell::new(),
        }
    }
}

#[async_trait]
impl RouteHandler for AsyncRouteHandler {
    async fn resolve_component_type(&self) -> Result<ComponentType> {
        let outcome = self
            .resolved
            .get_or_init(|| async {
                tracing::debug!("Loading deferred component");
                let loaded = self.loader.load().await;
                match &loaded {
                    Ok(component) => tracing::debug!("Loaded component {}", component),
                    Err(e) => tracing::warn!("Component loader failed: {:#}", e),
                }
                loaded.map_err(Arc::new)
            })
            .await;

        outcome
            .clone()
            .map_err(|reason| RouteError::ComponentLoad { reason })
    }

    fn component_type(&self) -> Option<ComponentType> {
        self.resolved
            .get()
            .and_then(|outcome| outcome.as_ref().ok().cloned())
    }

    fn data(&self) -> &RouteData {
        &self.data
    }
}

impl fmt::Debug for AsyncRouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncRouteHandler")
            .field("data", &self.data)
            .field("resolved", &self.component_type())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_loader(calls: Arc<AtomicUsize>) -> Arc<dyn ComponentLoader> {
        Arc::new(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Ok::<_, anyhow::Error>(ComponentType::new("Lazy"))
            }
        })
    }

    #[tokio::test]
    async fn test_sync_handler_is_resolved() {
        let handler = SyncRouteHandler::new(ComponentType::new("Home"), RouteData::new());
        assert_eq!(handler.component_type(), Some(ComponentType::new("Home")));
        assert_eq!(
            handler.resolve_component_type().await.unwrap(),
            ComponentType::new("Home")
        );
    }

    #[tokio::test]
    async fn test_async_handler_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = AsyncRouteHandler::new(counting_loader(calls.clone()), RouteData::new());

        assert_eq!(handler.component_type(), None);
        for _ in 0..3 {
            let component = handler.resolve_component_type().await.unwrap();
            assert_eq!(component.name(), "Lazy");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handler.component_type(), Some(ComponentType::new("Lazy")));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(AsyncRouteHandler::new(
            counting_loader(calls.clone()),
            RouteData::new(),
        ));

        let (a, b) = tokio::join!(
            handler.resolve_component_type(),
            handler.resolve_component_type()
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let loader: Arc<dyn ComponentLoader> = Arc::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<ComponentType, _>(anyhow::anyhow!("chunk missing"))
            }
        });
        let handler = AsyncRouteHandler::new(loader, RouteData::new());

        let first = handler.resolve_component_type().await.unwrap_err();
        let second = handler.resolve_component_type().await.unwrap_err();
        assert!(first.to_string().contains("chunk missing"));
        assert!(matches!(second, RouteError::ComponentLoad { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handler.component_type(), None);
    }

    #[test]
    fn test_route_data() {
        let data = RouteData::new().with("title", "Users");
        assert_eq!(data.get("title"), Some("Users"));
        assert_eq!(data.get("missing"), None);
    }
}
