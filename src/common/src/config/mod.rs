use std::path::Path;

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "index-reconciler.toml";

/// Prefix for environment overrides, e.g. `RECONCILER__SEARCH__API_VERSION`
pub const ENV_PREFIX: &str = "RECONCILER__";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Explicit base URL of the search service. When unset, the URL is built
    /// from the service name and `endpoint_suffix`.
    pub endpoint: Option<String>,
    /// DNS suffix appended to the service name
    pub endpoint_suffix: String,
    /// REST API version sent as the `api-version` query parameter
    pub api_version: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            endpoint_suffix: String::from("search.windows.net"),
            api_version: String::from("2024-07-01"),
        }
    }
}

impl SearchConfig {
    /// Resolve the base URL for the given service name
    pub fn base_url(&self, service_name: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{service_name}.{}", self.endpoint_suffix),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Number of characters of content shown when logging deletion candidates
    pub preview_chars: usize,
    /// Log deletion candidates without sending the delete request
    pub dry_run: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            preview_chars: 30,
            dry_run: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Configuration {
    /// Search service settings
    pub search: SearchConfig,
    /// Reconciliation behaviour
    pub reconcile: ReconcileConfig,
}

impl Configuration {
    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Configuration::default()))
    }

    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config = Self::figment()
            .merge(Toml::file(DEFAULT_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }

    /// Load from an explicit TOML file. Unlike [`Configuration::load`], the
    /// file must exist.
    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        let config = Self::figment()
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.search.api_version.trim().is_empty() {
            anyhow::bail!("Search API version cannot be empty");
        }

        if self.reconcile.preview_chars == 0 {
            anyhow::bail!("Preview width must be at least one character");
        }

        if let Some(endpoint) = &self.search.endpoint {
            let url = url::Url::parse(endpoint)
                .map_err(|e| anyhow::anyhow!("Invalid search endpoint '{endpoint}': {e}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!(
                    "Unsupported search endpoint scheme: {}. Supported: http, https",
                    url.scheme()
                );
            }
        }

        Ok(())
    }
}
