//! Smoke tests against the real Pingen staging environment
//!
//! Needs PINGEN_CLIENT_ID, PINGEN_CLIENT_SECRET and PINGEN_ORG_ID for a staging
//! account. Run with: cargo test --features integration --test test_live_staging

#![cfg(feature = "integration")]

use pingen_core::{
    Envelope, ListParams, PingenApi, PingenClient, PingenConfig, Settings, TokenManager,
};
use std::time::Duration;

fn staging_settings() -> Settings {
    let empty = PingenConfig::default();
    let settings = Settings::resolve(&empty, &PingenConfig::from_env(), &empty)
        .expect("Failed to resolve settings from the environment");
    assert!(
        settings.client_credentials().is_some(),
        "PINGEN_CLIENT_ID and PINGEN_CLIENT_SECRET must be set"
    );
    settings
}

#[tokio::test]
async fn test_token_and_organisations() {
    let settings = staging_settings();
    let client = PingenClient::from_settings(&settings, Duration::from_secs(30)).unwrap();

    let grant = TokenManager::new(None)
        .ensure_access_token(&client, settings)
        .await
        .expect("Token request failed");
    println!("✓ Access token expires at {}", grant.settings.access_token_expires_at);

    let response = client
        .list_organisations(&grant.token, &ListParams::default().to_query("organisations"))
        .await
        .expect("Listing organisations failed");
    for organisation in response.body.data_items() {
        println!("  - {} {}", organisation.str_at(&["id"]), organisation.str_at(&["attributes", "name"]));
    }
}

#[tokio::test]
async fn test_list_letters() {
    let settings = staging_settings();
    let organisation_id = settings
        .require_organisation()
        .expect("PINGEN_ORG_ID must be set")
        .to_string();
    let client = PingenClient::from_settings(&settings, Duration::from_secs(30)).unwrap();
    let grant = TokenManager::new(None)
        .ensure_access_token(&client, settings)
        .await
        .unwrap();

    let params = ListParams {
        limit: 5,
        ..Default::default()
    };
    let response = client
        .list_letters(&grant.token, &organisation_id, &params.to_query("letters"))
        .await
        .expect("Listing letters failed");
    assert!(response.body.data().is_array());
}
