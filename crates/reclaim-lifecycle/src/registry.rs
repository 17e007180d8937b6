//! Kind to handler registry

use crate::handler::KindHandler;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maps each kind tag to its Mark/Sweep handler
///
/// Built once at startup and only read afterwards.
#[derive(Clone, Default)]
pub struct KindRegistry {
    handlers: BTreeMap<String, Arc<dyn KindHandler>>,
}

impl KindRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own kind, replacing any previous one
    pub fn register<H: KindHandler + 'static>(&mut self, handler: H) -> &mut Self {
        self.register_arc(Arc::new(handler))
    }

    /// Register a shared handler
    pub fn register_arc(&mut self, handler: Arc<dyn KindHandler>) -> &mut Self {
        let kind = handler.kind().to_string();
        if self.handlers.insert(kind.clone(), handler).is_some() {
            tracing::warn!(kind = %kind, "Replacing handler");
        }
        self
    }

    /// Handler for a kind
    pub fn get(&self, kind: &str) -> Option<&Arc<dyn KindHandler>> {
        self.handlers.get(kind)
    }

    /// Whether a kind is registered
    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.handlers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LifecycleError;
    use crate::handler::PassScope;
    use crate::report::{PassReport, Phase};
    use async_trait::async_trait;

    struct Noop(&'static str);

    #[async_trait]
    impl KindHandler for Noop {
        fn kind(&self) -> &str {
            self.0
        }

        async fn mark(&self, _scope: &PassScope) -> Result<PassReport, LifecycleError> {
            Ok(PassReport::new(self.0, Phase::Mark))
        }

        async fn sweep(&self, _scope: &PassScope) -> Result<PassReport, LifecycleError> {
            Ok(PassReport::new(self.0, Phase::Sweep))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = KindRegistry::new();
        registry.register(Noop("ebs")).register(Noop("ec2"));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("ebs"));
        assert!(registry.get("sg").is_none());
        assert_eq!(registry.kinds().collect::<Vec<_>>(), vec!["ebs", "ec2"]);
        assert_eq!(format!("{:?}", registry), r#"["ebs", "ec2"]"#);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = KindRegistry::new();
        registry.register(Noop("ebs"));
        registry.register(Noop("ebs"));
        assert_eq!(registry.len(), 1);
    }
}
