//! OAuth2 console for the integration dashboard
//!
//! Single-binary walkthrough of the authorization flows:
//! 1. Loads the TOML config and per-service client secrets
//! 2. Registers every configured service with the shared OAuth2 manager
//! 3. Prints authorization URLs, completes flows from pasted callback
//!    values, and reports per-service authentication status
//!
//! The redirect callback itself is handled out-of-process (the
//! authorization server shows the code, or an external web front end
//! relays it); this console only consumes the resulting `(code, state)`.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use integration::{IntegrationRegistry, OAuthIntegration};
use oauth_manager::{OAuth2Manager, TokenStore};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const USAGE: &str = "\
usage: authctl [--config <path>] <command> [args]

commands:
  status                             authentication status for all services
  authorize <service>                print the authorization URL to visit
  exchange <service> <code> <state>  complete a flow with the callback values
  refresh <service>                  force a token refresh
  revoke <service>                   drop the stored token";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // CLI: simple --config flag plus a subcommand
    let args: Vec<String> = std::env::args().collect();
    let mut config_path_arg: Option<&str> = None;
    let mut rest: Vec<&str> = Vec::new();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--config" {
            config_path_arg = args.get(i + 1).map(String::as_str);
            i += 2;
        } else {
            rest.push(args[i].as_str());
            i += 1;
        }
    }
    let Some((&command, command_args)) = rest.split_first() else {
        bail!("missing command\n{USAGE}");
    };

    let config_path = Config::resolve_path(config_path_arg);
    let config = Config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .build()
        .context("building http client")?;

    let store_path = config
        .store
        .path
        .clone()
        .unwrap_or_else(TokenStore::default_path);
    let manager = Arc::new(OAuth2Manager::new(TokenStore::load(store_path).await, http));
    for service_config in config.service_configs()? {
        let name = service_config.service_name.clone();
        manager.register_service(name, service_config).await;
    }

    let mut registry = IntegrationRegistry::new();
    for service in manager.services().await {
        registry.register(Box::new(OAuthIntegration::new(manager.clone(), service)));
    }
    info!(services = registry.services().len(), "configured services");

    match (command, command_args) {
        ("status", []) => {
            let status = registry.authentication_status().await;
            let mut services: Vec<_> = status.iter().collect();
            services.sort();
            for (service, authenticated) in services {
                let label = if *authenticated {
                    "authenticated"
                } else {
                    "not authenticated"
                };
                println!("{service}: {label}");
            }
        }
        ("authorize", [service]) => {
            let (url, state) = manager
                .generate_authorization_url(service, None)
                .await
                .with_context(|| format!("starting authorization for {service}"))?;
            println!("visit: {url}");
            println!("state: {state}");
            println!("then run: authctl exchange {service} <code> {state}");
        }
        ("exchange", [service, code, state]) => {
            registry
                .complete_flow(service, code, state)
                .await
                .with_context(|| format!("completing authorization for {service}"))?;
            println!("{service}: authenticated");
        }
        ("refresh", [service]) => {
            let token = manager
                .refresh(service)
                .await
                .with_context(|| format!("refreshing token for {service}"))?;
            match token.expires_at {
                Some(at) => println!("{service}: refreshed, expires {}", at.to_rfc3339()),
                None => println!("{service}: refreshed, no expiry"),
            }
        }
        ("revoke", [service]) => {
            registry
                .revoke(service)
                .await
                .with_context(|| format!("revoking token for {service}"))?;
            println!("{service}: token removed");
        }
        _ => bail!("unrecognized command or arguments\n{USAGE}"),
    }

    Ok(())
}
