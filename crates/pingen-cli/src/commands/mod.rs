//! Subcommand handlers

pub mod auth;
pub mod config;
pub mod letters;
pub mod org;

use crate::cli::GlobalOptions;
use pingen_core::config::{ConfigStore, PingenConfig, Settings};
use pingen_core::token::TokenGrant;
use pingen_core::{Persistence, PingenClient, TokenManager};
use std::fs;

/// State shared by every handler for one invocation
pub struct AppContext {
    pub globals: GlobalOptions,
    pub store: ConfigStore,
}

/// Settings resolved from all layers, plus whether a config file existed
pub struct Resolved {
    pub settings: Settings,
    pub config_loaded: bool,
}

impl AppContext {
    pub fn new(globals: GlobalOptions) -> anyhow::Result<Self> {
        let store = ConfigStore::from_default_path()?;
        log::debug!("Config path: {}", store.path().display());
        Ok(Self { globals, store })
    }

    /// Merge config file, environment and flags into effective settings
    pub fn resolve(&self) -> anyhow::Result<Resolved> {
        let file = self.store.load()?;
        let config_loaded = file.is_some();
        let file = file.unwrap_or_default();

        let mut settings = Settings::resolve(
            &file,
            &PingenConfig::from_env(),
            &self.globals.config_layer(),
        )?;
        if let Some(path) = &self.globals.client_secret_file {
            settings = settings.with_client_secret_file(path)?;
        }

        log::debug!("Environment: {} ({})", settings.env, settings.api_base);
        Ok(Resolved {
            settings,
            config_loaded,
        })
    }

    pub fn client(&self, settings: &Settings) -> anyhow::Result<PingenClient> {
        Ok(PingenClient::from_settings(settings, self.globals.timeout)?)
    }

    /// Token manager that writes refreshed tokens back only when a config file existed
    pub fn token_manager(&self, resolved: &Resolved) -> TokenManager {
        let store = resolved.config_loaded.then(|| self.store.clone());
        TokenManager::new(store)
    }

    /// Build a client for `resolved` and obtain a usable access token
    pub async fn authorise(&self, resolved: Resolved) -> anyhow::Result<(PingenClient, TokenGrant)> {
        let client = self.client(&resolved.settings)?;
        let grant = self
            .token_manager(&resolved)
            .ensure_access_token(&client, resolved.settings)
            .await?;
        report_persistence(&grant.persistence);
        Ok((client, grant))
    }
}

pub fn report_persistence(persistence: &Persistence) {
    match persistence {
        Persistence::Saved(path) => log::debug!("Saved refreshed access token to {}", path.display()),
        Persistence::NotPersisted => log::debug!("No config file, refreshed access token not saved"),
        Persistence::Reused | Persistence::Failed(_) => {}
    }
}

/// Resolve a `--filter` argument; `@path` reads the filter from a file.
///
/// An unreadable file leaves the argument as given.
pub fn resolve_filter(raw: &str) -> String {
    let Some(path) = raw.strip_prefix('@') else {
        return raw.to_string();
    };
    match fs::read_to_string(path) {
        Ok(content) => content.trim().to_string(),
        Err(e) => {
            log::warn!("Could not read filter file {}: {}; using the argument literally", path, e);
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_filter_literal() {
        assert_eq!(resolve_filter(r#"{"status":"sent"}"#), r#"{"status":"sent"}"#);
    }

    #[test]
    fn test_filter_from_file_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  {{\"status\":\"sent\"}}  ").unwrap();
        let arg = format!("@{}", file.path().display());
        assert_eq!(resolve_filter(&arg), r#"{"status":"sent"}"#);
    }

    #[test]
    fn test_unreadable_filter_file_is_sent_literally() {
        assert_eq!(resolve_filter("@/no/such/filter.json"), "@/no/such/filter.json");
    }
}
