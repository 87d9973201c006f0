//! Configuration types and loading
//!
//! The TOML file names the services to wire up and their public
//! parameters; client secrets never live in the TOML. Per service, the
//! secret resolves from the `<SERVICE>_CLIENT_SECRET` env var first,
//! then from `client_secret_file`. The token store path resolves from
//! `[store] path`, falling back to the `OAUTH2_TOKEN_STORE` env var and
//! the default dotfile.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use common::Secret;
use oauth_client::ServiceConfig;
use serde::Deserialize;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceEntry>,
}

/// Token store settings
#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    /// Overrides the `OAUTH2_TOKEN_STORE` env var and default dotfile
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Outbound HTTP settings
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// One `[services.<name>]` table.
#[derive(Debug, Deserialize)]
pub struct ServiceEntry {
    pub client_id: String,
    pub redirect_uri: String,
    /// Path to a file containing the client secret (alternative to the
    /// `<SERVICE>_CLIENT_SECRET` env var)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Salesforce: use the test login host
    #[serde(default)]
    pub sandbox: bool,
    /// Shopify: the shop's admin host
    #[serde(default)]
    pub shop_domain: Option<String>,
    /// Zendesk: the account subdomain
    #[serde(default)]
    pub subdomain: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file, then resolve secrets.
    ///
    /// Secret resolution order per service:
    /// 1. `<SERVICE>_CLIENT_SECRET` env var (name uppercased)
    /// 2. `client_secret_file` path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.http.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        for (name, entry) in &mut config.services {
            validate_service(name, entry)?;
            entry.client_secret = Some(resolve_secret(name, entry)?);
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("authctl.toml")
    }

    /// Build the per-service OAuth configs for the manager.
    pub fn service_configs(&self) -> common::Result<Vec<ServiceConfig>> {
        self.services
            .iter()
            .map(|(name, entry)| build_service_config(name, entry))
            .collect()
    }
}

fn validate_service(name: &str, entry: &ServiceEntry) -> common::Result<()> {
    match name {
        "salesforce" | "hubspot" | "slack" | "calendly" => Ok(()),
        "shopify" => {
            if entry.shop_domain.is_none() {
                return Err(common::Error::Config(
                    "services.shopify requires shop_domain".into(),
                ));
            }
            Ok(())
        }
        "zendesk" => {
            if entry.subdomain.is_none() {
                return Err(common::Error::Config(
                    "services.zendesk requires subdomain".into(),
                ));
            }
            Ok(())
        }
        other => Err(common::Error::Config(format!(
            "unsupported service {other}; supported: salesforce, shopify, hubspot, slack, calendly, zendesk"
        ))),
    }
}

fn resolve_secret(name: &str, entry: &ServiceEntry) -> common::Result<Secret<String>> {
    let env_key = format!("{}_CLIENT_SECRET", name.to_uppercase());
    if let Ok(secret) = std::env::var(&env_key) {
        return Ok(Secret::new(secret));
    }

    if let Some(ref secret_file) = entry.client_secret_file {
        let secret = std::fs::read_to_string(secret_file).map_err(|e| {
            common::Error::Config(format!(
                "failed to read client_secret_file {}: {e}",
                secret_file.display()
            ))
        })?;
        let secret = secret.trim().to_owned();
        if !secret.is_empty() {
            return Ok(Secret::new(secret));
        }
    }

    Err(common::Error::Config(format!(
        "no client secret for {name}: set {env_key} or client_secret_file"
    )))
}

fn build_service_config(name: &str, entry: &ServiceEntry) -> common::Result<ServiceConfig> {
    let secret = entry
        .client_secret
        .clone()
        .ok_or_else(|| common::Error::Config(format!("client secret for {name} not resolved")))?;

    let client_id = entry.client_id.as_str();
    let redirect_uri = entry.redirect_uri.as_str();
    let config = match name {
        "salesforce" => ServiceConfig::salesforce(client_id, secret, redirect_uri, entry.sandbox),
        "shopify" => ServiceConfig::shopify(
            client_id,
            secret,
            redirect_uri,
            entry.shop_domain.as_deref().unwrap_or_default(),
        ),
        "hubspot" => ServiceConfig::hubspot(client_id, secret, redirect_uri),
        "slack" => ServiceConfig::slack(client_id, secret, redirect_uri),
        "calendly" => ServiceConfig::calendly(client_id, secret, redirect_uri),
        "zendesk" => ServiceConfig::zendesk(
            client_id,
            secret,
            redirect_uri,
            entry.subdomain.as_deref().unwrap_or_default(),
        ),
        other => {
            return Err(common::Error::Config(format!("unsupported service {other}")));
        }
    };
    Ok(config)
}
