use super::AppContext;
use crate::output;
use clap::ArgMatches;
use pingen_core::config::{PingenConfig, Settings};
use pingen_core::constants::DEFAULT_SCOPE;
use pingen_core::token::{expiry_from_response, system_now};
use pingen_core::Envelope;
use pingen_core::{PingenApi, PingenError};
use serde_json::Value;

pub async fn run(ctx: &AppContext, matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("token", args)) => token(ctx, args).await,
        _ => unreachable!("subcommand required"),
    }
}

async fn token(ctx: &AppContext, args: &ArgMatches) -> anyhow::Result<()> {
    let resolved = ctx.resolve()?;
    let settings = resolved.settings;
    let (client_id, client_secret) = settings
        .client_credentials()
        .ok_or_else(|| PingenError::validation("client id and secret required"))?;

    let scope = args
        .get_one::<String>("scope")
        .map(String::as_str)
        .filter(|scope| !scope.is_empty())
        .unwrap_or(DEFAULT_SCOPE);

    let client = ctx.client(&settings)?;
    let response = client.get_token(client_id, client_secret, scope).await?;

    let save_token = args.get_flag("save");
    let save_credentials = args.get_flag("save-credentials");
    if save_token || save_credentials {
        save(ctx, &settings, &response.body, save_token, save_credentials)?;
    }

    output::emit(&output::json(&response.body)?);
    Ok(())
}

fn save(
    ctx: &AppContext,
    settings: &Settings,
    body: &Value,
    save_token: bool,
    save_credentials: bool,
) -> anyhow::Result<()> {
    let mut config = ctx.store.load_or_default()?;
    config.env = settings.env.to_string();
    config.api_base = settings.api_base.clone();
    config.identity_base = settings.identity_base.clone();

    if save_token {
        apply_token(&mut config, body, system_now());
    }
    if save_credentials {
        config.client_id = settings.client_id.clone().unwrap_or_default();
        config.client_secret = settings.client_secret.clone().unwrap_or_default();
    }

    ctx.store.save(&config)?;
    log::info!("Saved config to {}", ctx.store.path().display());
    Ok(())
}

/// Copy the token fields present in `body` into `config`; absent fields keep their saved values
fn apply_token(config: &mut PingenConfig, body: &Value, now: i64) {
    let token = body.str_at(&["access_token"]);
    if token.is_empty() {
        log::warn!("Token response has no access_token; keeping the saved token");
    } else {
        config.access_token = token.to_string();
    }
    if let Some(expires_at) = expiry_from_response(body, now) {
        config.access_token_expires_at = expires_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn saved() -> PingenConfig {
        PingenConfig {
            access_token: "old".to_string(),
            access_token_expires_at: 500,
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_full_token_response() {
        let mut config = saved();
        apply_token(&mut config, &json!({"access_token": "new", "expires_in": 3600}), 1_000);
        assert_eq!(config.access_token, "new");
        assert_eq!(config.access_token_expires_at, 4_600);
    }

    #[test]
    fn test_missing_expires_in_keeps_saved_expiry() {
        let mut config = saved();
        apply_token(&mut config, &json!({"access_token": "new"}), 1_000);
        assert_eq!(config.access_token, "new");
        assert_eq!(config.access_token_expires_at, 500);
    }

    #[test]
    fn test_missing_access_token_keeps_saved_token() {
        let mut config = saved();
        apply_token(&mut config, &json!({"expires_in": 60}), 1_000);
        assert_eq!(config.access_token, "old");
        assert_eq!(config.access_token_expires_at, 1_060);
    }
}
