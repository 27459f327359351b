//! Access token management for the client-credentials grant
//!
//! A token carried in the settings is reused until it gets close to expiry;
//! otherwise a fresh one is requested from the identity service. When a config
//! file existed at startup, the refreshed token is written back to it.

use crate::clients::PingenApi;
use crate::config::{ConfigStore, Settings};
use crate::constants::{DEFAULT_SCOPE, TOKEN_EXPIRY_SKEW_SECS};
use crate::envelope::Envelope;
use crate::error::{PingenError, Result};
use serde_json::Value;
use std::path::PathBuf;

/// Source of the current time in epoch seconds
pub type Clock = fn() -> i64;

pub fn system_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Token extracted from an identity service response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    /// Absolute expiry in epoch seconds, 0 when the response carried no `expires_in`
    pub expires_at: i64,
}

impl IssuedToken {
    /// Read `access_token` and `expires_in` from a token response issued at `now`
    pub fn from_response(body: &Value, now: i64) -> Result<Self> {
        let access_token = body.str_at(&["access_token"]);
        if access_token.is_empty() {
            return Err(PingenError::Protocol(
                "access token missing in response".to_string(),
            ));
        }

        Ok(Self {
            access_token: access_token.to_string(),
            expires_at: expiry_from_response(body, now).unwrap_or(0),
        })
    }
}

/// Absolute expiry for a token response issued at `now`, when it carries a numeric `expires_in`.
///
/// Out-of-range lifetimes saturate instead of overflowing.
pub fn expiry_from_response(body: &Value, now: i64) -> Option<i64> {
    body.at(&["expires_in"])
        .as_f64()
        .map(|seconds| now.saturating_add(seconds as i64))
}

/// What happened to the config file after [`TokenManager::ensure_access_token`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    /// The cached token was reused, nothing to write
    Reused,
    /// A token was fetched but there was no config file to update
    NotPersisted,
    Saved(PathBuf),
    /// The write-back failed; the in-memory token is still valid for this run
    Failed(String),
}

/// Result of [`TokenManager::ensure_access_token`]
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub token: String,
    /// Settings carrying the token that was used
    pub settings: Settings,
    pub persistence: Persistence,
}

impl TokenGrant {
    pub fn refreshed(&self) -> bool {
        self.persistence != Persistence::Reused
    }
}

/// True when the token in `settings` can be used at `now` without refreshing
pub fn is_token_usable(settings: &Settings, now: i64) -> bool {
    match settings.access_token.as_deref() {
        Some(token) if !token.is_empty() => {
            settings.access_token_expires_at == 0
                || now < settings.access_token_expires_at.saturating_sub(TOKEN_EXPIRY_SKEW_SECS)
        }
        _ => false,
    }
}

pub struct TokenManager {
    /// Config file to write refreshed tokens back to; `None` when none existed
    store: Option<ConfigStore>,
    scope: String,
    clock: Clock,
}

impl TokenManager {
    pub fn new(store: Option<ConfigStore>) -> Self {
        Self {
            store,
            scope: DEFAULT_SCOPE.to_string(),
            clock: system_now,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Replace the clock (mainly for testing)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> i64 {
        (self.clock)()
    }

    /// Return a usable access token, refreshing it through `api` when needed.
    ///
    /// The returned settings carry the token that was used; callers thread them
    /// forward instead of relying on shared state.
    pub async fn ensure_access_token<A>(&self, api: &A, settings: Settings) -> Result<TokenGrant>
    where
        A: PingenApi + ?Sized,
    {
        let now = self.now();
        if is_token_usable(&settings, now) {
            log::debug!(
                "Using cached access token (expires at {})",
                settings.access_token_expires_at
            );
            let token = settings.access_token.clone().unwrap_or_default();
            return Ok(TokenGrant {
                token,
                settings,
                persistence: Persistence::Reused,
            });
        }

        let (client_id, client_secret) = settings.client_credentials().ok_or_else(|| {
            PingenError::Config(
                "access token required (use --access-token, or provide client id and secret)"
                    .to_string(),
            )
        })?;

        log::info!("Requesting new access token from {}", settings.identity_base);
        let response = api.get_token(client_id, client_secret, &self.scope).await?;
        let issued = IssuedToken::from_response(&response.body, now)?;

        let persistence = self.persist(&issued);
        if let Persistence::Failed(reason) = &persistence {
            log::warn!("Could not save refreshed access token: {}", reason);
        }

        let mut settings = settings;
        settings.access_token = Some(issued.access_token.clone());
        settings.access_token_expires_at = issued.expires_at;

        Ok(TokenGrant {
            token: issued.access_token,
            settings,
            persistence,
        })
    }

    /// Best-effort write-back of a refreshed token to the config file.
    ///
    /// Only the token fields are replaced; everything else is re-read from disk.
    pub fn persist(&self, issued: &IssuedToken) -> Persistence {
        let Some(store) = &self.store else {
            return Persistence::NotPersisted;
        };

        let write = || -> Result<()> {
            let mut config = store.load_or_default()?;
            config.access_token = issued.access_token.clone();
            if issued.expires_at != 0 {
                config.access_token_expires_at = issued.expires_at;
            }
            store.save(&config)
        };

        match write() {
            Ok(()) => Persistence::Saved(store.path().to_path_buf()),
            Err(e) => Persistence::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PingenConfig;
    use serde_json::json;

    fn settings_with_token(token: &str, expires_at: i64) -> Settings {
        let cli = PingenConfig {
            access_token: token.to_string(),
            access_token_expires_at: expires_at,
            ..Default::default()
        };
        let empty = PingenConfig::default();
        Settings::resolve(&empty, &empty, &cli).unwrap()
    }

    #[test]
    fn test_token_without_expiry_is_usable() {
        assert!(is_token_usable(&settings_with_token("tok", 0), 1_000_000));
    }

    #[test]
    fn test_token_skew_boundary() {
        let settings = settings_with_token("tok", 10_000);
        assert!(is_token_usable(&settings, 9_969));
        assert!(!is_token_usable(&settings, 9_970));
        assert!(!is_token_usable(&settings, 10_001));
    }

    #[test]
    fn test_missing_token_is_not_usable() {
        assert!(!is_token_usable(&settings_with_token("", 0), 0));
    }

    #[test]
    fn test_issued_token_expiry() {
        let body = json!({"access_token": "new", "expires_in": 3600, "token_type": "Bearer"});
        let issued = IssuedToken::from_response(&body, 1_700_000_000).unwrap();
        assert_eq!(issued.access_token, "new");
        assert_eq!(issued.expires_at, 1_700_003_600);
    }

    #[test]
    fn test_issued_token_without_expires_in() {
        let issued = IssuedToken::from_response(&json!({"access_token": "new"}), 5).unwrap();
        assert_eq!(issued.expires_at, 0);
    }

    #[test]
    fn test_huge_expires_in_saturates() {
        let body = json!({"access_token": "t", "expires_in": 1e30});
        let issued = IssuedToken::from_response(&body, 1_700_000_000).unwrap();
        assert_eq!(issued.expires_at, i64::MAX);

        assert!(is_token_usable(&settings_with_token("t", issued.expires_at), 1_700_000_000));

        let body = json!({"access_token": "t", "expires_in": -1e30});
        let issued = IssuedToken::from_response(&body, 1_700_000_000).unwrap();
        assert!(issued.expires_at < 0);
        assert!(!is_token_usable(&settings_with_token("t", issued.expires_at), 1_700_000_000));
    }

    #[test]
    fn test_missing_access_token_is_protocol_error() {
        let err = IssuedToken::from_response(&json!({"expires_in": 3600}), 0).unwrap_err();
        assert!(matches!(err, PingenError::Protocol(_)));
        let err = IssuedToken::from_response(&json!({"access_token": ""}), 0).unwrap_err();
        assert!(matches!(err, PingenError::Protocol(_)));
    }

    #[test]
    fn test_persist_without_store() {
        let manager = TokenManager::new(None);
        let issued = IssuedToken {
            access_token: "t".to_string(),
            expires_at: 10,
        };
        assert_eq!(manager.persist(&issued), Persistence::NotPersisted);
    }

    #[test]
    fn test_persist_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the config file should be makes the write fail
        let blocked = dir.path().join("config.json");
        std::fs::create_dir(&blocked).unwrap();

        let manager = TokenManager::new(Some(ConfigStore::new(&blocked)));
        let issued = IssuedToken {
            access_token: "t".to_string(),
            expires_at: 10,
        };
        assert!(matches!(manager.persist(&issued), Persistence::Failed(_)));
    }
}
