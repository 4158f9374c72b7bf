use std::sync::Arc;

use super::key_status_text;
use super::settle;
use crate::domain::models::ProviderRef;
use crate::domain::models::CREDENTIAL_KEY;
use crate::domain::services::AppState;
use crate::domain::services::CredentialManager;
use crate::domain::services::GenerationClient;
use crate::domain::services::ResilientStore;
use crate::infrastructure::providers::stub::StubProvider;

fn app_state(store: ResilientStore) -> AppState {
    let provider: ProviderRef = Arc::new(StubProvider::default());
    let credentials = CredentialManager::new(store, provider.clone());
    let client = GenerationClient::new(provider, "9:16");

    return AppState::new(credentials, client);
}

#[test]
fn it_reports_a_missing_key() {
    let state = app_state(ResilientStore::memory_only());

    insta::assert_snapshot!(key_status_text(&state), @"No Gemini API key is stored. Run `wallcraft key set` to add one.");
}

#[test]
fn it_reports_a_stored_key_without_revealing_it() {
    let store = ResilientStore::memory_only();
    store.set(CREDENTIAL_KEY, "AIzaSyExampleKey1234");
    let mut state = app_state(store);
    assert!(state.credentials.initialize(&mut state.client));

    insta::assert_snapshot!(key_status_text(&state), @"A Gemini API key is stored: ****1234 (memory only, the key store is unavailable)");
}

#[test]
fn it_settles_coordinator_state_into_results() {
    let mut state = app_state(ResilientStore::memory_only());
    assert!(settle(&state).is_ok());

    state.error = Some("Gemini failed to generate wallpapers: boom".to_string());
    let err = settle(&state).unwrap_err();
    assert_eq!(err.to_string(), "Gemini failed to generate wallpapers: boom");

    state.error = None;
    state.open_onboarding();
    let err = settle(&state).unwrap_err();
    assert!(err.to_string().contains("wallcraft key set"));
}
