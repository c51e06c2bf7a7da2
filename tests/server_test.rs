//! Tool-level tests: the MCP server against a mock DevRev API.

use std::time::Duration;

use devrev_mcp::client::DevRevClient;
use devrev_mcp::config::{ApiVersion, Config, ServerConfig};
use devrev_mcp::pagination::PageLimits;
use devrev_mcp::server::DevRevServer;
use devrev_mcp::tools::{CreateWorkInput, HybridSearchInput, ListWorksInput, ObjectIdInput, PageInput};
use pretty_assertions::assert_eq;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::ErrorCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn server_for(mock: &MockServer, api_version: ApiVersion, config: ServerConfig) -> DevRevServer {
    let client = DevRevClient::new(&Config {
        base_url: mock.uri(),
        api_token: "tok".to_string(),
        api_version,
        timeout: Duration::from_secs(5),
        max_retries: 1,
    })
    .unwrap();
    DevRevServer::new(client, config)
}

#[tokio::test]
async fn test_works_list_clamps_limit_and_wraps_envelope() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/works.list"))
        .and(body_partial_json(json!({"limit": 100, "type": ["ticket", "issue"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "works": [{"id": "w1", "type": "ticket"}],
            "next_cursor": "next-1"
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_for(&mock, ApiVersion::Public, ServerConfig::default());
    let text = server
        .devrev_works_list(Parameters(ListWorksInput {
            work_type: Some(vec!["TICKET".to_string(), " issue ".to_string()]),
            limit: Some(500),
            ..Default::default()
        }))
        .await
        .unwrap();

    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        value,
        json!({"count": 1, "works": [{"id": "w1", "type": "ticket"}], "next_cursor": "next-1"})
    );
}

#[tokio::test]
async fn test_last_page_omits_next_cursor() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts.list"))
        .and(body_partial_json(json!({"limit": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accounts": [],
            "next_cursor": ""
        })))
        .mount(&mock)
        .await;

    let config = ServerConfig {
        page_limits: PageLimits {
            default_page_size: 10,
            max_page_size: 50,
        },
        ..Default::default()
    };
    let server = server_for(&mock, ApiVersion::Public, config);
    let text = server
        .devrev_accounts_list(Parameters(PageInput::default()))
        .await
        .unwrap();

    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, json!({"count": 0, "accounts": []}));
}

#[tokio::test]
async fn test_invalid_work_type_is_rejected_before_any_request() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;

    let server = server_for(&mock, ApiVersion::Public, ServerConfig::default());
    let err = server
        .devrev_works_create(Parameters(CreateWorkInput {
            title: "Broken".to_string(),
            applies_to_part: "part-1".to_string(),
            work_type: "bug".to_string(),
            owned_by: vec!["u1".to_string()],
            body: None,
            priority: None,
            severity: None,
        }))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        "Validation error: Invalid work type: bug (valid: TICKET, ISSUE, TASK, OPPORTUNITY)."
    );
}

#[tokio::test]
async fn test_get_not_found_is_formatted() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/parts.get"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no such part"})))
        .mount(&mock)
        .await;

    let server = server_for(&mock, ApiVersion::Public, ServerConfig::default());
    let err = server
        .devrev_parts_get(Parameters(ObjectIdInput {
            id: "part-x".to_string(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err, "Not found: no such part");
}

#[tokio::test]
async fn test_users_get_self() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dev-users.self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dev_user": {"id": "u1", "email": "ops@example.com"}
        })))
        .mount(&mock)
        .await;

    let server = server_for(&mock, ApiVersion::Public, ServerConfig::default());
    let text = server
        .devrev_users_get(Parameters(ObjectIdInput {
            id: "SELF".to_string(),
        }))
        .await
        .unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["id"], "u1");
}

#[tokio::test]
async fn test_search_envelope_includes_total_count() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search.hybrid"))
        .and(body_partial_json(json!({"query": "refund", "namespaces": ["article"], "limit": 25})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"type": "article", "article": {"id": "a1"}}],
            "total_count": 7
        })))
        .mount(&mock)
        .await;

    let server = server_for(&mock, ApiVersion::Beta, ServerConfig::default());
    let text = server
        .devrev_search_hybrid(Parameters(HybridSearchInput {
            query: " refund ".to_string(),
            namespaces: Some(vec!["ARTICLE".to_string()]),
            semantic_weight: None,
            cursor: None,
            limit: None,
        }))
        .await
        .unwrap();

    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["count"], 1);
    assert_eq!(value["total_count"], 7);
    assert_eq!(value["results"][0]["type"], "article");
    assert!(value.get("next_cursor").is_none());
}

#[tokio::test]
async fn test_search_rejects_out_of_range_weight() {
    let mock = MockServer::start().await;
    let server = server_for(&mock, ApiVersion::Beta, ServerConfig::default());
    let err = server
        .devrev_search_hybrid(Parameters(HybridSearchInput {
            query: "refund".to_string(),
            namespaces: None,
            semantic_weight: Some(1.5),
            cursor: None,
            limit: None,
        }))
        .await
        .unwrap_err();
    assert!(err.contains("semantic_weight"));
}

#[tokio::test]
async fn test_server_info_resource_needs_no_request() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;

    let server = server_for(&mock, ApiVersion::Public, ServerConfig::default());
    let value = server
        .read_resource_value("devrev://server/info")
        .await
        .unwrap();
    assert_eq!(value["uri"], "devrev://server/info");
    assert_eq!(value["type"], "server_info");
    assert_eq!(value["name"], "DevRev MCP Server");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_ticket_resource_reads_work() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/works.get"))
        .and(body_partial_json(json!({"id": "don:core:dvrv-us-1:devo/1:ticket/12"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "work": {"id": "don:core:dvrv-us-1:devo/1:ticket/12", "type": "ticket", "title": "Login loop"}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_for(&mock, ApiVersion::Public, ServerConfig::default());
    let value = server
        .read_resource_value("devrev://ticket/don:core:dvrv-us-1:devo/1:ticket/12")
        .await
        .unwrap();
    assert_eq!(value["id"], "don:core:dvrv-us-1:devo/1:ticket/12");
    assert_eq!(value["title"], "Login loop");
}

#[tokio::test]
async fn test_dev_user_resource_strips_dev_segment() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dev-users.get"))
        .and(body_partial_json(json!({"id": "devu-7"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dev_user": {"id": "devu-7", "full_name": "Dana Agent"}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = server_for(&mock, ApiVersion::Public, ServerConfig::default());
    let value = server
        .read_resource_value("devrev://user/dev/devu-7")
        .await
        .unwrap();
    assert_eq!(value["id"], "devu-7");
    assert_eq!(value["full_name"], "Dana Agent");
}

#[tokio::test]
async fn test_missing_object_resource_is_resource_not_found() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts.get"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no such account"})))
        .mount(&mock)
        .await;

    let server = server_for(&mock, ApiVersion::Public, ServerConfig::default());
    let err = server
        .read_resource_value("devrev://account/acc-404")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
    assert_eq!(err.message, "Not found: no such account");
    assert_eq!(err.data, Some(json!({"uri": "devrev://account/acc-404"})));
}

#[tokio::test]
async fn test_unknown_resource_kind_is_resource_not_found() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;

    let server = server_for(&mock, ApiVersion::Public, ServerConfig::default());
    let err = server
        .read_resource_value("devrev://widget/w-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
}

#[tokio::test]
async fn test_upstream_failure_on_resource_is_internal_error() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/parts.get"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "not allowed"})))
        .mount(&mock)
        .await;

    let server = server_for(&mock, ApiVersion::Public, ServerConfig::default());
    let err = server
        .read_resource_value("devrev://part/part-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    assert!(err.message.starts_with("Permission denied"));
}
