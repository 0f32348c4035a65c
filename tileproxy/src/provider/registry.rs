//! Upstream provider registry.

use std::collections::HashMap;

use super::config::ProviderConfig;
use super::types::ProviderError;

/// Immutable map of provider id to fetch configuration.
///
/// Built once at startup and shared behind an `Arc`. There is no interior
/// mutability, so any number of tasks may call [`lookup`](Self::lookup)
/// concurrently without synchronization.
#[derive(Debug, Clone, Default)]
pub struct UpstreamRegistry {
    providers: HashMap<String, ProviderConfig>,
}

impl UpstreamRegistry {
    /// Build a registry from provider configs.
    ///
    /// Later entries with a duplicate id replace earlier ones; the provider
    /// description loader rejects duplicates before they get here.
    pub fn new(providers: impl IntoIterator<Item = ProviderConfig>) -> Self {
        let providers = providers
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        Self { providers }
    }

    /// Find the configuration for a provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::UnknownProvider`] if no provider has this id.
    pub fn lookup(&self, id: &str) -> Result<&ProviderConfig, ProviderError> {
        self.providers
            .get(id)
            .ok_or_else(|| ProviderError::UnknownProvider(id.to_string()))
    }

    /// Registered provider ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True when no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::UrlTemplate;
    use std::sync::Arc;

    fn provider(id: &str) -> ProviderConfig {
        ProviderConfig::new(id, UrlTemplate::parse("https://t/{z}/{x}/{y}").unwrap())
    }

    #[test]
    fn test_lookup_known() {
        let registry = UpstreamRegistry::new([provider("osm"), provider("zmni")]);
        assert_eq!(registry.lookup("zmni").unwrap().id, "zmni");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = UpstreamRegistry::new([provider("osm")]);
        assert_eq!(
            registry.lookup("bing"),
            Err(ProviderError::UnknownProvider("bing".to_string()))
        );
    }

    #[test]
    fn test_ids_sorted() {
        let registry = UpstreamRegistry::new([provider("zmni"), provider("arcgis"), provider("osm")]);
        assert_eq!(registry.ids(), vec!["arcgis", "osm", "zmni"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = UpstreamRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.lookup("osm").is_err());
    }

    #[test]
    fn test_concurrent_lookup() {
        let registry = Arc::new(UpstreamRegistry::new([provider("osm")]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.lookup("osm").map(|p| p.id.clone()))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), "osm");
        }
    }
}
