//! Backend configuration types.
//!
//! Resolves the Machina base URL, API token and active brand from the
//! environment or builder-style setters.

use crate::brand::Brand;
use crate::error::ConfigError;

/// Configuration for reaching the Machina backend.
///
/// # Example
///
/// ```ignore
/// use betstream::config::BackendConfig;
///
/// let config = BackendConfig::new("https://api.example.com")
///     .with_api_token("secret")
///     .with_brand_id("sportingbet");
/// ```
#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    /// Base URL of the Machina document-store/agent API.
    pub base_url: Option<String>,
    /// Static API token forwarded as `X-Api-Token` on every request.
    pub api_token: Option<String>,
    /// Active brand for agent resolution, welcome text and deep-links.
    pub brand: Brand,
    /// Raw brand id as configured. Ids outside the brand table resolve to
    /// the default brand but keep the generic welcome message.
    pub brand_id: Option<String>,
}

impl BackendConfig {
    /// Create a config pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Set the API token.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set the brand from its string identifier.
    pub fn with_brand_id(mut self, brand_id: &str) -> Self {
        self.brand = Brand::from_id(brand_id);
        self.brand_id = Some(brand_id.to_string());
        self
    }

    /// Set the brand directly.
    pub fn with_brand(mut self, brand: Brand) -> Self {
        self.brand = brand;
        self.brand_id = Some(brand.id().to_string());
        self
    }

    /// Welcome message seeding a new thread: the brand's own greeting for
    /// known ids, a generic one for ids outside the brand table.
    pub fn welcome_message(&self) -> &'static str {
        match &self.brand_id {
            Some(id) => crate::brand::welcome_for_brand_id(id),
            None => self.brand.welcome_message(),
        }
    }

    /// Build config from `MACHINA_CLIENT_URL`, `MACHINA_API_KEY` and
    /// `CHAT_BRAND` environment variables. Missing variables leave the
    /// corresponding field unset; the base URL is validated lazily by
    /// [`BackendConfig::require_base_url`] so offline construction works.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("MACHINA_CLIENT_URL") {
            if !url.is_empty() {
                config.base_url = Some(url);
            }
        }
        if let Ok(token) = std::env::var("MACHINA_API_KEY") {
            if !token.is_empty() {
                config.api_token = Some(token);
            }
        }
        if let Ok(brand) = std::env::var("CHAT_BRAND") {
            config.brand = Brand::from_id(&brand);
            config.brand_id = Some(brand);
        }
        config
    }

    /// The configured base URL, trimmed of trailing slashes.
    ///
    /// Every operation that talks to the backend calls this first; a missing
    /// URL fails the operation before any request is issued.
    pub fn require_base_url(&self) -> Result<&str, ConfigError> {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or(ConfigError::MissingBaseUrl)
    }
}
