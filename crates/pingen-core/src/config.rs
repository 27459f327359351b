//! Configuration management for the Pingen CLI
//!
//! Settings come from four layers, highest precedence first: command-line flags,
//! environment variables, the persisted config file and built-in defaults. Each
//! layer is a [`PingenConfig`]; [`Settings::resolve`] folds them into the
//! effective settings for one invocation.

use crate::error::{PingenError, Result};
use crate::types::Environment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

// Environment variables read by the environment layer
pub const ENV_ENVIRONMENT: &str = "PINGEN_ENV";
pub const ENV_API_BASE: &str = "PINGEN_API_BASE";
pub const ENV_IDENTITY_BASE: &str = "PINGEN_IDENTITY_BASE";
pub const ENV_ORGANISATION_ID: &str = "PINGEN_ORG_ID";
pub const ENV_ACCESS_TOKEN: &str = "PINGEN_ACCESS_TOKEN";
pub const ENV_CLIENT_ID: &str = "PINGEN_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "PINGEN_CLIENT_SECRET";

/// One configuration layer, and the exact shape of the persisted config file.
///
/// Empty strings and a zero expiry mean "not set by this layer".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingenConfig {
    pub env: String,
    pub api_base: String,
    pub identity_base: String,
    pub organisation_id: String,
    pub access_token: String,
    /// Absolute expiry in epoch seconds, 0 when unknown
    pub access_token_expires_at: i64,
    pub client_id: String,
    pub client_secret: String,
}

/// Keys accepted by `config set` / `config unset`
pub const SETTABLE_KEYS: &[&str] = &[
    "env",
    "api_base",
    "identity_base",
    "organisation_id",
    "access_token",
    "client_id",
    "client_secret",
];

impl PingenConfig {
    /// Layer `overrides` on top of `self`; non-empty (non-zero) override fields win.
    pub fn merge(&self, overrides: &PingenConfig) -> PingenConfig {
        fn pick(base: &str, over: &str) -> String {
            let chosen = if over.is_empty() { base } else { over };
            chosen.to_string()
        }

        PingenConfig {
            env: pick(&self.env, &overrides.env),
            api_base: pick(&self.api_base, &overrides.api_base),
            identity_base: pick(&self.identity_base, &overrides.identity_base),
            organisation_id: pick(&self.organisation_id, &overrides.organisation_id),
            access_token: pick(&self.access_token, &overrides.access_token),
            access_token_expires_at: if overrides.access_token_expires_at != 0 {
                overrides.access_token_expires_at
            } else {
                self.access_token_expires_at
            },
            client_id: pick(&self.client_id, &overrides.client_id),
            client_secret: pick(&self.client_secret, &overrides.client_secret),
        }
    }

    /// Build the environment layer from the process environment
    pub fn from_env() -> Self {
        Self::from_env_lookup(|key| std::env::var(key).ok())
    }

    /// Build the environment layer from an arbitrary variable lookup
    pub fn from_env_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).unwrap_or_default();
        PingenConfig {
            env: var(ENV_ENVIRONMENT),
            api_base: var(ENV_API_BASE),
            identity_base: var(ENV_IDENTITY_BASE),
            organisation_id: var(ENV_ORGANISATION_ID),
            access_token: var(ENV_ACCESS_TOKEN),
            access_token_expires_at: 0,
            client_id: var(ENV_CLIENT_ID),
            client_secret: var(ENV_CLIENT_SECRET),
        }
    }

    /// Set one of the [`SETTABLE_KEYS`]. An empty value clears the field.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        let field = match key {
            "env" => &mut self.env,
            "api_base" => &mut self.api_base,
            "identity_base" => &mut self.identity_base,
            "organisation_id" => &mut self.organisation_id,
            "access_token" => &mut self.access_token,
            "client_id" => &mut self.client_id,
            "client_secret" => &mut self.client_secret,
            _ => {
                return Err(PingenError::validation(format!("unknown config key: {}", key)));
            }
        };
        *field = value.to_string();
        Ok(())
    }

    pub fn unset_key(&mut self, key: &str) -> Result<()> {
        self.set_key(key, "")
    }
}

/// Loads and saves the persisted [`PingenConfig`] at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location (see [`crate::paths::config_path`])
    pub fn from_default_path() -> Result<Self> {
        Ok(Self::new(crate::paths::config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted config. `Ok(None)` when no file exists yet.
    pub fn load(&self) -> Result<Option<PingenConfig>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let config = serde_json::from_slice(&content)?;
        Ok(Some(config))
    }

    /// Load the persisted config, or an empty record when absent
    pub fn load_or_default(&self) -> Result<PingenConfig> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Replace the config file with `config`.
    ///
    /// The directory is created owner-only and the file is written owner
    /// read/write only, truncating any previous content.
    pub fn save(&self, config: &PingenConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_private_dir(parent)?;
            }
        }

        let mut payload = serde_json::to_vec_pretty(config)?;
        payload.push(b'\n');

        let mut file = open_private_file(&self.path)?;
        file.write_all(&payload)?;
        log::debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn open_private_file(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private_file(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)
}

/// Effective settings for one invocation, after all layers are merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub env: Environment,
    pub api_base: String,
    pub identity_base: String,
    pub organisation_id: Option<String>,
    pub access_token: Option<String>,
    /// Absolute expiry in epoch seconds, 0 when unknown
    pub access_token_expires_at: i64,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl Settings {
    /// Merge `file`, `env` and `cli` layers (CLI highest) and apply defaults.
    ///
    /// An unset environment becomes `staging`; anything other than `staging` or
    /// `production` is a validation error. Base URLs that were not supplied by
    /// any layer are derived from the environment.
    pub fn resolve(file: &PingenConfig, env: &PingenConfig, cli: &PingenConfig) -> Result<Self> {
        let merged = file.merge(env).merge(cli);

        let environment = if merged.env.is_empty() {
            Environment::default()
        } else {
            merged.env.parse()?
        };

        let api_base = non_empty(merged.api_base)
            .unwrap_or_else(|| environment.default_api_base().to_string());
        let identity_base = non_empty(merged.identity_base)
            .unwrap_or_else(|| environment.default_identity_base().to_string());

        Ok(Settings {
            env: environment,
            api_base,
            identity_base,
            organisation_id: non_empty(merged.organisation_id),
            access_token: non_empty(merged.access_token),
            access_token_expires_at: merged.access_token_expires_at,
            client_id: non_empty(merged.client_id),
            client_secret: non_empty(merged.client_secret),
        })
    }

    /// Replace the client secret with the trimmed contents of `path`.
    ///
    /// Applied after the generic merge, so the file beats every other source.
    pub fn with_client_secret_file(mut self, path: &Path) -> Result<Self> {
        let secret = fs::read_to_string(path).map_err(|e| {
            PingenError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read client secret file {}: {}", path.display(), e),
            ))
        })?;
        self.client_secret = non_empty(secret.trim().to_string());
        Ok(self)
    }

    /// Organisation id, or a validation error for commands that need one
    pub fn require_organisation(&self) -> Result<&str> {
        self.organisation_id
            .as_deref()
            .ok_or_else(|| PingenError::validation("organisation id required"))
    }

    /// Client id and secret, when both are present
    pub fn client_credentials(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }
}
