#![allow(clippy::unwrap_used)]
// Integration tests for `StoreClient` using wiremock.

use secrecy::SecretString;
use serde_json::{Map, json};
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use passline_api::{Error, ListQuery, StoreClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, StoreClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = StoreClient::with_client(reqwest::Client::new(), base_url, "bistro".into());
    (server, client)
}

fn docs_path(collection: &str) -> String {
    format!("/v1/venues/bistro/collections/{collection}/documents")
}

// ── Documents ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_documents() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(docs_path("orders")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [
                { "id": "o-1", "status": "pending", "table": "T1" },
                { "id": "o-2", "status": "ready", "table": "T3" }
            ]
        })))
        .mount(&server)
        .await;

    let docs = client.list("orders", &ListQuery::default()).await.unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "o-1");
    assert_eq!(docs[1].get("status"), Some(&json!("ready")));
}

#[tokio::test]
async fn test_list_sends_sort_and_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(docs_path("scans")))
        .and(query_param("order_by", "created_at"))
        .and(query_param("direction", "desc"))
        .and(query_param("where", "table:T7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "documents": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let query = ListQuery {
        order_by: Some("created_at".into()),
        descending: true,
        filters: vec![("table".into(), "T7".into())],
        limit: None,
    };
    let docs = client.list("scans", &query).await.unwrap();
    assert!(docs.is_empty());
}

#[tokio::test]
async fn test_create_returns_assigned_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(docs_path("staff")))
        .and(body_json(json!({ "name": "Ana", "role": "server" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "st-42" })))
        .mount(&server)
        .await;

    let mut fields = Map::new();
    fields.insert("name".into(), json!("Ana"));
    fields.insert("role".into(), json!("server"));

    let id = client.create("staff", &fields).await.unwrap();
    assert_eq!(id, "st-42");
}

#[tokio::test]
async fn test_delete_document() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/st-42", docs_path("staff"))))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete("staff", "st-42").await.unwrap();
}

#[tokio::test]
async fn test_error_body_is_decoded() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/nope", docs_path("staff"))))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "error": { "message": "document not found" } })),
        )
        .mount(&server)
        .await;

    let err = client.delete("staff", "nope").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(
        matches!(err, Error::Api { status: 404, ref message } if message == "document not found"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_unauthorized_maps_to_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(docs_path("invoices")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list("invoices", &ListQuery::default()).await.unwrap_err();
    assert!(err.is_auth_expired(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_malformed_body_is_a_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(docs_path("tables")))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"docs\": 1}"))
        .mount(&server)
        .await;

    let err = client.list("tables", &ListQuery::default()).await.unwrap_err();
    assert!(
        matches!(err, Error::Deserialization { ref body, .. } if body.contains("docs")),
        "unexpected error: {err:?}"
    );
}

// ── PIN login ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_pin_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/venues/bistro/auth/pin"))
        .and(body_json(json!({ "pin": "4321" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-abc",
            "staff_id": "st-1",
            "name": "Ana",
            "role": "kitchen",
            "expires_at": "2026-10-17T23:00:00Z"
        })))
        .mount(&server)
        .await;

    let login = client
        .login_pin(&SecretString::from("4321".to_string()))
        .await
        .unwrap();
    assert_eq!(login.staff_id, "st-1");
    assert_eq!(login.role, "kitchen");
}

#[tokio::test]
async fn test_pin_login_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/venues/bistro/auth/pin"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.login_pin(&SecretString::from("0000".to_string())).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_pin_login_inactive_account() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/venues/bistro/auth/pin"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client.login_pin(&SecretString::from("1111".to_string())).await;
    assert!(matches!(result, Err(Error::AccountInactive)));
}

// ── Transport ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_token_is_sent_as_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(docs_path("orders")))
        .and(header("authorization", "Bearer tok-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "documents": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let transport =
        TransportConfig::default().with_token(SecretString::from("tok-xyz".to_string()));
    let client = StoreClient::new(
        Url::parse(&server.uri()).unwrap(),
        "bistro".into(),
        &transport,
    )
    .unwrap();

    client.list("orders", &ListQuery::default()).await.unwrap();
}
