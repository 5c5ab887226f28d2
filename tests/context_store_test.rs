//! Session context persistence round trips.

use chrono::Utc;
use tempfile::TempDir;

use sfsight::SightError;
use sfsight::core::session::SessionContext;
use sfsight::storage::{AppPaths, ContextStore};

fn context() -> SessionContext {
    SessionContext {
        account_name: "acme".into(),
        account_full_name: "acme.us-east-1".into(),
        account_url: "https://acme.us-east-1.snowflakecomputing.com".into(),
        region: "us-east-1".into(),
        organization_id: "org-1".into(),
        user_id: "42".into(),
        user_name: "JDOE".into(),
        csrf_token: "csrf".into(),
        main_app_url: "https://app.snowflake.com".into(),
        app_server_url: "https://apps-api.c1.us-east-1.aws.app.snowflake.com".into(),
        context_url: "https://acme.us-east-1.snowflakecomputing.com".into(),
        client_id: "client".into(),
        auth_token_master: "master".into(),
        auth_token_session: "session".into(),
        auth_token_snowsight: "user-abc=tok".into(),
        default_role: Some("SYSADMIN".into()),
        default_warehouse: None,
        server_version: "8.4.1".into(),
        saved_at: Utc::now(),
    }
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = ContextStore::new(AppPaths::at(dir.path().to_path_buf()));

    let saved = context();
    let path = store.save(&saved).unwrap();
    assert!(path.exists());

    // Loading accepts the region-qualified account name too.
    let loaded = store.load("acme.us-east-1", "JDOE").unwrap();
    assert_eq!(loaded.auth_token_snowsight, saved.auth_token_snowsight);
    assert_eq!(loaded.organization_id, saved.organization_id);
    assert_eq!(loaded.default_warehouse, None);

    let loaded = store.load("acme", "JDOE").unwrap();
    assert_eq!(loaded.user_name, "JDOE");
}

#[test]
fn missing_context_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let store = ContextStore::new(AppPaths::at(dir.path().to_path_buf()));

    let err = store.load("acme", "JDOE").unwrap_err();
    assert!(matches!(err, SightError::Config(_)));
    assert!(err.to_string().contains("sfsight login"));
}

#[test]
fn corrupt_context_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let store = ContextStore::new(AppPaths::at(dir.path().to_path_buf()));
    store.save(&context()).unwrap();

    let path = dir.path().join("context.acme.JDOE.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = store.load("acme", "JDOE").unwrap_err();
    assert!(matches!(err, SightError::Config(_)));
}

#[test]
fn delete_reports_whether_anything_was_removed() {
    let dir = TempDir::new().unwrap();
    let store = ContextStore::new(AppPaths::at(dir.path().to_path_buf()));

    assert!(!store.delete("acme", "JDOE").unwrap());
    store.save(&context()).unwrap();
    assert!(store.delete("acme", "JDOE").unwrap());
    assert!(store.load("acme", "JDOE").is_err());
}
