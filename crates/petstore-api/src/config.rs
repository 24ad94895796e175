use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::datetime::TimestampFormat;
use crate::error::SuiteError;
use crate::order::{OrderEquivalence, ShipDatePolicy};
use crate::specs::{ContentType, RequestSpec, request_spec};

pub const APP_NAME: &str = "petstore-api";
pub const DEFAULT_BASE_URI: &str = "https://petstore.swagger.io/v2";
pub const ENV_PREFIX: &str = "PETSTORE_";

static DEFAULT_CONFIG: Lazy<SuiteConfig> = Lazy::new(SuiteConfig::default);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub ship_date: ShipDateConfig,
    /// JSON-lines file receiving one record per scenario outcome.
    #[serde(default)]
    pub observations: Option<Utf8PathBuf>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
            content_type: ContentType::Json,
            ship_date: ShipDateConfig::default(),
            observations: None,
        }
    }
}

impl SuiteConfig {
    pub fn request_spec(&self) -> Result<RequestSpec, SuiteError> {
        request_spec(self.base_uri.clone(), self.content_type)
    }

    pub fn equivalence(&self) -> OrderEquivalence {
        OrderEquivalence::new(
            self.ship_date.submitted_format.clone(),
            self.ship_date.returned_format.clone(),
        )
        .with_policy(self.ship_date.policy)
    }
}

/// How submitted and echoed ship dates are read before comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipDateConfig {
    #[serde(default = "default_submitted_format")]
    pub submitted_format: TimestampFormat,
    #[serde(default = "default_returned_format")]
    pub returned_format: TimestampFormat,
    #[serde(default)]
    pub policy: ShipDatePolicy,
}

impl Default for ShipDateConfig {
    fn default() -> Self {
        Self {
            submitted_format: default_submitted_format(),
            returned_format: default_returned_format(),
            policy: ShipDatePolicy::default(),
        }
    }
}

fn default_base_uri() -> String {
    DEFAULT_BASE_URI.into()
}

fn default_submitted_format() -> TimestampFormat {
    TimestampFormat::UtcMillis
}

fn default_returned_format() -> TimestampFormat {
    TimestampFormat::OffsetTenthMillis
}

/// Layer defaults < TOML file < `PETSTORE_*` environment variables.
///
/// Without an explicit path, `config/petstore.toml` in the workspace is used,
/// then `config.toml` in the platform config directory.
pub fn load_config(explicit_path: Option<&Utf8Path>) -> Result<SuiteConfig> {
    let mut figment = Figment::from(Serialized::defaults(DEFAULT_CONFIG.clone()));

    if let Some(path) = explicit_path {
        if !path.exists() {
            bail!("config file {path} does not exist");
        }
        figment = figment.merge(Toml::file(path));
    } else if let Some(path) = resolve_default_config_path() {
        debug!(%path, "using default config file");
        figment = figment.merge(Toml::file(path));
    } else {
        debug!("no config file found; relying on defaults + env overrides");
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    figment
        .extract()
        .context("failed to load petstore-api configuration")
}

fn workspace_root() -> &'static Utf8Path {
    static ROOT: Lazy<Utf8PathBuf> = Lazy::new(|| {
        let manifest_dir = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        manifest_dir
            .parent()
            .and_then(|p| p.parent())
            .map(Utf8PathBuf::from)
            .unwrap_or(manifest_dir)
    });
    ROOT.as_path()
}

fn resolve_default_config_path() -> Option<Utf8PathBuf> {
    let repo_relative = workspace_root().join("config/petstore.toml");
    if repo_relative.exists() {
        return Some(repo_relative);
    }

    if let Some(dirs) = ProjectDirs::from("io", "PetStore", APP_NAME)
        && let Ok(path) = Utf8PathBuf::from_path_buf(dirs.config_dir().join("config.toml"))
        && path.exists()
    {
        return Some(path);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_public_service() {
        let config = SuiteConfig::default();
        assert_eq!(config.base_uri, DEFAULT_BASE_URI);
        assert_eq!(config.request_spec().unwrap().base_uri(), DEFAULT_BASE_URI);
        assert_eq!(config.equivalence(), OrderEquivalence::default());
    }

    #[test]
    fn suffix_trim_policy_flows_into_equivalence() {
        let mut config = SuiteConfig::default();
        config.ship_date.policy = ShipDatePolicy::SuffixTrim;
        assert_ne!(config.equivalence(), OrderEquivalence::default());
        assert_eq!(
            config.equivalence(),
            OrderEquivalence::default().with_policy(ShipDatePolicy::SuffixTrim)
        );
    }
}
