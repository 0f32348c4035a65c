//! Per-provider fetch configuration and URL templates.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

use crate::tile::TileKey;

/// Problems found while compiling a URL template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template is not an absolute http(s) URL.
    #[error("URL template must start with http:// or https://")]
    BadScheme,

    /// The template uses a placeholder other than `{z}`, `{x}`, `{y}` or `{-y}`.
    #[error("unsupported placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    /// A required placeholder is absent.
    #[error("URL template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),

    /// Stray `{` or `}`.
    #[error("unbalanced braces in URL template")]
    UnbalancedBraces,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Zoom,
    Column,
    Row,
    TmsRow,
}

/// A compiled `{z}/{x}/{y}` URL template.
///
/// Compiled once at load time so rendering on the request path is a plain
/// concatenation.
///
/// # Example
///
/// ```
/// use tileproxy::provider::UrlTemplate;
/// use tileproxy::tile::TileKey;
///
/// let template = UrlTemplate::parse("https://tiles.example/{z}/{x}/{y}.png").unwrap();
/// let key = TileKey::new("example", 2, 1, 3).unwrap();
/// assert_eq!(template.render(&key), "https://tiles.example/2/1/3.png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    parts: Vec<Part>,
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder regex is valid"))
}

impl UrlTemplate {
    /// Compile a template, rejecting anything that cannot address a tile.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        if !(template.starts_with("http://") || template.starts_with("https://")) {
            return Err(TemplateError::BadScheme);
        }

        let mut parts = Vec::new();
        let mut last = 0;
        let (mut has_z, mut has_x, mut has_y) = (false, false, false);

        for caps in placeholder_regex().captures_iter(template) {
            let whole = caps.get(0).expect("group 0 always matches");
            push_literal(&mut parts, &template[last..whole.start()])?;
            last = whole.end();

            let part = match &caps[1] {
                "z" => {
                    has_z = true;
                    Part::Zoom
                }
                "x" => {
                    has_x = true;
                    Part::Column
                }
                "y" => {
                    has_y = true;
                    Part::Row
                }
                "-y" => {
                    has_y = true;
                    Part::TmsRow
                }
                other => return Err(TemplateError::UnknownPlaceholder(other.to_string())),
            };
            parts.push(part);
        }
        push_literal(&mut parts, &template[last..])?;

        if !has_z {
            return Err(TemplateError::MissingPlaceholder("{z}"));
        }
        if !has_x {
            return Err(TemplateError::MissingPlaceholder("{x}"));
        }
        if !has_y {
            return Err(TemplateError::MissingPlaceholder("{y}"));
        }

        Ok(Self {
            source: template.to_string(),
            parts,
        })
    }

    /// Substitute the key's coordinates.
    pub fn render(&self, key: &TileKey) -> String {
        let mut url = String::with_capacity(self.source.len() + 16);
        for part in &self.parts {
            match part {
                Part::Literal(s) => url.push_str(s),
                Part::Zoom => url.push_str(&key.z().to_string()),
                Part::Column => url.push_str(&key.x().to_string()),
                Part::Row => url.push_str(&key.y().to_string()),
                Part::TmsRow => url.push_str(&key.tms_y().to_string()),
            }
        }
        url
    }

    /// The template as written in the configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn push_literal(parts: &mut Vec<Part>, literal: &str) -> Result<(), TemplateError> {
    if literal.contains('{') || literal.contains('}') {
        return Err(TemplateError::UnbalancedBraces);
    }
    if !literal.is_empty() {
        parts.push(Part::Literal(literal.to_string()));
    }
    Ok(())
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// How the delay between retries grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffKind {
    /// Same delay before every retry.
    Fixed,
    /// Delay doubles after every failed attempt.
    #[default]
    Exponential,
}

/// Fetch configuration for one upstream provider.
///
/// Built once at startup from the provider description and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Unique provider id, used as the first tile path segment.
    pub id: String,
    /// Compiled URL template.
    pub url_template: UrlTemplate,
    /// Timeout for a single upstream request.
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub retry_backoff: Duration,
    /// Growth of the retry delay.
    pub backoff: BackoffKind,
    /// Freshness override; `None` uses the global default TTL.
    pub ttl: Option<Duration>,
    /// Content type used when the upstream does not send one.
    pub content_type: Option<String>,
}

impl ProviderConfig {
    /// Create a provider with library defaults for everything but the template.
    pub fn new(id: impl Into<String>, url_template: UrlTemplate) -> Self {
        Self {
            id: id.into(),
            url_template,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_backoff: Duration::from_millis(200),
            backoff: BackoffKind::default(),
            ttl: None,
            content_type: None,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry count and first backoff delay.
    pub fn with_retries(mut self, max_retries: u32, retry_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = retry_backoff;
        self
    }

    /// Set the backoff growth.
    pub fn with_backoff(mut self, backoff: BackoffKind) -> Self {
        self.backoff = backoff;
        self
    }

    /// Override the cache TTL for this provider.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the fallback content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Upstream URL for a tile.
    pub fn tile_url(&self, key: &TileKey) -> String {
        self.url_template.render(key)
    }
}
