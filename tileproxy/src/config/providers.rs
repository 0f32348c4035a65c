//! Provider description loading.
//!
//! The description is a JSON object mapping provider id to its fetch settings:
//!
//! ```json
//! {
//!   "zmni": {
//!     "urlTemplate": "https://lvmgeo.example/ZMNI/MapServer/tile/{z}/{y}/{x}",
//!     "timeoutMillis": 30000,
//!     "maxRetries": 2,
//!     "retryBackoffMillis": 250,
//!     "backoff": "exponential",
//!     "ttlSeconds": 3600,
//!     "contentType": "image/png"
//!   }
//! }
//! ```
//!
//! Every record is validated here; a bad record is a startup failure rather
//! than a surprise on the first request for that provider.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::error::ConfigError;
use crate::provider::{BackoffKind, ProviderConfig, UpstreamRegistry, UrlTemplate};
use crate::tile::is_valid_provider_id;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ProviderRecord {
    url_template: String,
    timeout_millis: u64,
    max_retries: u32,
    retry_backoff_millis: u64,
    #[serde(default)]
    backoff: Option<BackoffRecord>,
    #[serde(default)]
    ttl_seconds: Option<u64>,
    #[serde(default)]
    content_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum BackoffRecord {
    Fixed,
    Exponential,
}

impl From<BackoffRecord> for BackoffKind {
    fn from(record: BackoffRecord) -> Self {
        match record {
            BackoffRecord::Fixed => BackoffKind::Fixed,
            BackoffRecord::Exponential => BackoffKind::Exponential,
        }
    }
}

/// Parse and validate a provider description.
///
/// # Errors
///
/// Returns [`ConfigError`] for malformed JSON, unknown or missing fields, an
/// empty description, invalid ids, zero timeouts, or bad URL templates.
pub fn parse_providers(json: &str) -> Result<Vec<ProviderConfig>, ConfigError> {
    // BTreeMap keeps a stable order for error messages and logs
    let records: BTreeMap<String, ProviderRecord> =
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if records.is_empty() {
        return Err(ConfigError::NoProviders);
    }

    records
        .into_iter()
        .map(|(id, record)| build_provider(id, record))
        .collect()
}

fn build_provider(id: String, record: ProviderRecord) -> Result<ProviderConfig, ConfigError> {
    if !is_valid_provider_id(&id) {
        return Err(ConfigError::InvalidProvider {
            id,
            reason: "ids may only contain ASCII letters, digits, '-' and '_'".to_string(),
        });
    }
    if record.timeout_millis == 0 {
        return Err(ConfigError::InvalidProvider {
            id,
            reason: "timeoutMillis must be greater than zero".to_string(),
        });
    }
    if record.ttl_seconds == Some(0) {
        return Err(ConfigError::InvalidProvider {
            id,
            reason: "ttlSeconds must be greater than zero".to_string(),
        });
    }
    if matches!(record.content_type.as_deref(), Some(ct) if ct.trim().is_empty()) {
        return Err(ConfigError::InvalidProvider {
            id,
            reason: "contentType must not be empty".to_string(),
        });
    }

    let template = UrlTemplate::parse(&record.url_template).map_err(|e| {
        ConfigError::InvalidProvider {
            id: id.clone(),
            reason: e.to_string(),
        }
    })?;

    let mut provider = ProviderConfig::new(id, template)
        .with_timeout(Duration::from_millis(record.timeout_millis))
        .with_retries(
            record.max_retries,
            Duration::from_millis(record.retry_backoff_millis),
        )
        .with_backoff(record.backoff.map(BackoffKind::from).unwrap_or_default());

    if let Some(secs) = record.ttl_seconds {
        provider = provider.with_ttl(Duration::from_secs(secs));
    }
    if let Some(content_type) = record.content_type {
        provider = provider.with_content_type(content_type);
    }

    debug!(
        provider = %provider.id,
        timeout_ms = record.timeout_millis,
        max_retries = provider.max_retries,
        backoff = ?provider.backoff,
        "Loaded provider"
    );

    Ok(provider)
}

/// Read a provider description file and build the registry from it.
pub fn load_registry(path: &Path) -> Result<UpstreamRegistry, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let providers = parse_providers(&json)?;
    Ok(UpstreamRegistry::new(providers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"{
        "zmni": {
            "urlTemplate": "https://lvmgeo.example/tile/{z}/{y}/{x}",
            "timeoutMillis": 30000,
            "maxRetries": 2,
            "retryBackoffMillis": 250
        },
        "osm": {
            "urlTemplate": "https://tile.example/{z}/{x}/{y}.png",
            "timeoutMillis": 5000,
            "maxRetries": 0,
            "retryBackoffMillis": 0,
            "backoff": "fixed",
            "ttlSeconds": 600,
            "contentType": "image/png"
        }
    }"#;

    #[test]
    fn test_parse_valid_description() {
        let providers = parse_providers(VALID).unwrap();
        assert_eq!(providers.len(), 2);

        let osm = &providers[0];
        assert_eq!(osm.id, "osm");
        assert_eq!(osm.timeout, Duration::from_millis(5000));
        assert_eq!(osm.max_retries, 0);
        assert_eq!(osm.backoff, BackoffKind::Fixed);
        assert_eq!(osm.ttl, Some(Duration::from_secs(600)));
        assert_eq!(osm.content_type.as_deref(), Some("image/png"));

        let zmni = &providers[1];
        assert_eq!(zmni.id, "zmni");
        assert_eq!(zmni.retry_backoff, Duration::from_millis(250));
        assert_eq!(zmni.backoff, BackoffKind::Exponential);
        assert_eq!(zmni.ttl, None);
    }

    #[test]
    fn test_missing_field_is_fatal() {
        let json = r#"{ "osm": { "urlTemplate": "https://t/{z}/{x}/{y}", "timeoutMillis": 1, "maxRetries": 0 } }"#;
        assert!(matches!(parse_providers(json), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_field_is_fatal() {
        let json = r#"{ "osm": { "urlTemplate": "https://t/{z}/{x}/{y}", "timeoutMillis": 1,
            "maxRetries": 0, "retryBackoffMillis": 0, "apiKey": "x" } }"#;
        assert!(matches!(parse_providers(json), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_negative_retries_rejected() {
        let json = r#"{ "osm": { "urlTemplate": "https://t/{z}/{x}/{y}", "timeoutMillis": 1,
            "maxRetries": -1, "retryBackoffMillis": 0 } }"#;
        assert!(matches!(parse_providers(json), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let json = r#"{ "osm": { "urlTemplate": "https://t/{z}/{x}/{y}", "timeoutMillis": 0,
            "maxRetries": 0, "retryBackoffMillis": 0 } }"#;
        let err = parse_providers(json).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProvider { ref id, .. } if id == "osm"));
        assert!(err.to_string().contains("timeoutMillis"));
    }

    #[test]
    fn test_bad_template_rejected() {
        let json = r#"{ "osm": { "urlTemplate": "https://t/{z}/{x}", "timeoutMillis": 10,
            "maxRetries": 0, "retryBackoffMillis": 0 } }"#;
        let err = parse_providers(json).unwrap_err();
        assert!(err.to_string().contains("{y}"));
    }

    #[test]
    fn test_bad_id_rejected() {
        let json = r#"{ "my layer": { "urlTemplate": "https://t/{z}/{x}/{y}", "timeoutMillis": 10,
            "maxRetries": 0, "retryBackoffMillis": 0 } }"#;
        assert!(matches!(
            parse_providers(json),
            Err(ConfigError::InvalidProvider { .. })
        ));
    }

    #[test]
    fn test_unknown_backoff_rejected() {
        let json = r#"{ "osm": { "urlTemplate": "https://t/{z}/{x}/{y}", "timeoutMillis": 10,
            "maxRetries": 0, "retryBackoffMillis": 0, "backoff": "linear" } }"#;
        assert!(matches!(parse_providers(json), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_empty_description_rejected() {
        assert!(matches!(parse_providers("{}"), Err(ConfigError::NoProviders)));
    }

    #[test]
    fn test_not_an_object_rejected() {
        assert!(matches!(parse_providers("[]"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_registry_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let registry = load_registry(file.path()).unwrap();
        assert_eq!(registry.ids(), vec!["osm", "zmni"]);
    }

    #[test]
    fn test_load_registry_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_registry(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
