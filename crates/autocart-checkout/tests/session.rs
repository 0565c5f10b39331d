//! Integration tests for `Session` against a local `wiremock` server.

use std::time::Duration;

use autocart_checkout::Session;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_session() -> Session {
    Session::new(Duration::from_secs(5), Some("autocart-test/0.1"), None)
        .expect("failed to build test session")
}

#[tokio::test]
async fn redirects_are_returned_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/checkout"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/123/checkouts/abc"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/123/checkouts/abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let exchange = test_session()
        .get(&format!("{}/checkout", server.uri()), HeaderMap::new())
        .await
        .unwrap();

    assert_eq!(exchange.status, StatusCode::FOUND);
    assert_eq!(
        exchange.location(),
        Some(format!("{}/123/checkouts/abc", server.uri()))
    );
}

#[tokio::test]
async fn configured_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "autocart-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let exchange = test_session()
        .get(&format!("{}/", server.uri()), HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(exchange.body, "ok");
}

#[tokio::test]
async fn cookies_set_by_one_response_are_sent_on_the_next() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/x"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "_shopify_y=visitor-1; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart"))
        .and(header("cookie", "_shopify_y=visitor-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let session = test_session();
    session
        .get(&format!("{}/products/x", server.uri()), HeaderMap::new())
        .await
        .unwrap();
    let exchange = session
        .get(&format!("{}/cart", server.uri()), HeaderMap::new())
        .await
        .unwrap();

    assert_eq!(exchange.status, StatusCode::OK);
    let url = Url::parse(&server.uri()).unwrap();
    assert_eq!(session.cookies_for(&url).as_deref(), Some("_shopify_y=visitor-1"));
}

#[tokio::test]
async fn form_fields_keep_order_and_repeated_keys() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/form"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let fields = vec![
        ("checkout[remember_me]".to_string(), "false".to_string()),
        ("step".to_string(), String::new()),
        ("checkout[remember_me]".to_string(), "0".to_string()),
    ];
    let exchange = test_session()
        .post_form(&format!("{}/form", server.uri()), HeaderMap::new(), &fields)
        .await
        .unwrap();
    assert_eq!(exchange.status, StatusCode::OK);

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert_eq!(
        body,
        "checkout%5Bremember_me%5D=false&step=&checkout%5Bremember_me%5D=0"
    );
}

#[tokio::test]
async fn json_post_keeps_caller_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cart/add.js"))
        .and(header("content-type", "application/json;charset=utf-8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json;charset=utf-8"),
    );
    let exchange = test_session()
        .post_json(
            &format!("{}/cart/add.js", server.uri()),
            headers,
            &json!({"quantity": 1, "id": "222"}),
        )
        .await
        .unwrap();
    assert_eq!(exchange.status, StatusCode::OK);
}

#[tokio::test]
async fn query_parameters_are_appended() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/123/checkouts/abc"))
        .and(wiremock::matchers::query_param("step", "shipping_method"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    test_session()
        .get_with_query(
            &format!("{}/123/checkouts/abc", server.uri()),
            &[("previous_step", "contact_information"), ("step", "shipping_method")],
            HeaderMap::new(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    let session = Session::new(Duration::from_millis(500), Some("ua"), None).unwrap();
    let err = session
        .get("http://127.0.0.1:9/unreachable", HeaderMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, autocart_checkout::CheckoutError::Transport(_)));
    assert!(err.is_restartable());
}
