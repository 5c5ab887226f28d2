//! Entity client tests against a mock app server.

use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sfsight::SightError;
use sfsight::core::client::{EntityClient, ExecutionContext};
use sfsight::core::http::ApiClient;
use sfsight::core::session::SessionContext;

fn session_for(server: &MockServer) -> SessionContext {
    SessionContext {
        account_name: "acme".into(),
        account_full_name: "acme.us-east-1".into(),
        account_url: "https://acme.us-east-1.snowflakecomputing.com".into(),
        region: "us-east-1".into(),
        organization_id: "org-9".into(),
        user_id: "42".into(),
        user_name: "JDOE".into(),
        csrf_token: "csrf-xyz".into(),
        main_app_url: "https://app.snowflake.com".into(),
        app_server_url: server.uri(),
        context_url: "https://acme.us-east-1.snowflakecomputing.com".into(),
        client_id: "client".into(),
        auth_token_master: "master".into(),
        auth_token_session: "session".into(),
        auth_token_snowsight: "user-abc=tok".into(),
        default_role: Some("SYSADMIN".into()),
        default_warehouse: Some("COMPUTE_WH".into()),
        server_version: "8.4.1".into(),
        saved_at: Utc::now(),
    }
}

#[tokio::test]
async fn list_worksheets_posts_form_body_with_auth_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0/organizations/org-9/entities/list"))
        .and(header("X-CSRF-Token", "csrf-xyz"))
        .and(header(
            "X-Snowflake-Context",
            "JDOE::https://acme.us-east-1.snowflakecomputing.com",
        ))
        .and(header("Cookie", "user-abc=tok"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("location=worksheets"))
        .and(body_string_contains("%22query%22"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entities": []})))
        .mount(&server)
        .await;

    let http = ApiClient::default_client().unwrap();
    let session = session_for(&server);
    let body = EntityClient::new(&http, &session)
        .list_worksheets()
        .await
        .unwrap();
    assert!(body.contains("entities"));
}

#[tokio::test]
async fn run_worksheet_sends_execution_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0/queries"))
        .and(body_string_contains("action=execute"))
        .and(body_string_contains("projectId=ws-1"))
        .and(body_string_contains("SYSADMIN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .mount(&server)
        .await;

    let http = ApiClient::default_client().unwrap();
    let session = session_for(&server);
    let exec = ExecutionContext::from_session(&session);
    let body = EntityClient::new(&http, &session)
        .run_worksheet("ws-1", "select 1", &exec)
        .await
        .unwrap();
    assert!(body.contains("queued"));
}

#[tokio::test]
async fn query_details_carries_role_override() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/session/request/monitoring/queries/q-1"))
        .and(header("x-snowflake-role", "ACCOUNTADMIN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"queries": []})))
        .mount(&server)
        .await;

    let http = ApiClient::default_client().unwrap();
    let session = session_for(&server);
    let body = EntityClient::new(&http, &session)
        .query_details("q-1", Some("ACCOUNTADMIN"))
        .await
        .unwrap();
    assert!(body.contains("queries"));
}

#[tokio::test]
async fn list_filters_reads_bootstrap_param_configs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bootstrap"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Org": {
                "id": "org-9",
                "settings": {"paramConfigs": [{"keyword": "daterange", "type": "daterange"}]},
            },
        })))
        .mount(&server)
        .await;

    let http = ApiClient::default_client().unwrap();
    let session = session_for(&server);
    let body = EntityClient::new(&http, &session).list_filters().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed[0]["keyword"], "daterange");
}

#[tokio::test]
async fn missing_worksheet_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/queries/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let http = ApiClient::default_client().unwrap();
    let session = session_for(&server);
    let err = EntityClient::new(&http, &session)
        .get_worksheet("nope")
        .await
        .unwrap_err();
    assert!(matches!(err, SightError::NotFound(_)));
}
