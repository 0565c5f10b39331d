//! Shared fixtures for the checkout integration tests.
//!
//! Every test stands up its own `MockServer` playing the storefront, the
//! checkout pages and the payment vault on one host.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use autocart_checkout::{
    CheckoutSettings, Orchestrator, PollPolicy, RestartPolicy, Status, StatusObserver, Step,
    StoreRegistry,
};
use autocart_core::{
    CardDetails, PurchaseProfile, ShippingPreference, StoreProfile, TaskOptions, VariantSelector,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const STORE_CODE: &str = "123";
pub const CHECKOUT_TOKEN: &str = "abc123";
pub const CARD_NUMBER: &str = "4111111111111111";
pub const TEST_USER_AGENT: &str = "autocart-test/0.1";

pub const PRODUCT_PATH: &str = "/products/dunk-low";
pub const CHECKOUT_PATH: &str = "/123/checkouts/abc123";
pub const PROCESSING_PATH: &str = "/123/checkouts/abc123/processing";
pub const THANK_YOU_PATH: &str = "/123/checkouts/abc123/thank_you";
pub const RATES_PATH: &str = "/api/checkouts/abc123/shipping_rates";

pub fn product_page() -> String {
    r#"<html><script>window.ShopifyAnalytics = {"meta":{"product":{"id":7},"productVariants":[{"id":"111","title":"UK 9","sku":"DL-9"},{"id":222,"title":"UK 10","sku":"DL-10"},{"id":"333","title":"UK 10.5"}]}};</script></html>"#
        .to_string()
}

pub fn checkout_page() -> String {
    r#"<html>
        <meta name="shopify-checkout-authorization-token" content="authz-token-1">
        <script>Shopify.Checkout.token = "abc123";</script>
        <script>Shopify.Checkout.totalPrice = 53.94;</script>
        <form><input type="hidden" name="authenticity_token" value="auth-token-1"></form>
        <div data-select-gateway="118754754"></div>
    </html>"#
        .to_string()
}

pub fn cart_line() -> serde_json::Value {
    json!({
        "id": 222,
        "variant_id": 222,
        "title": "Dunk Low - UK 10",
        "price": 5000,
        "quantity": 1,
        "sku": "DL-10",
        "vendor": "Nike",
        "product_title": "Dunk Low",
        "properties": null,
        "discounts": []
    })
}

pub fn shipping_rates() -> serde_json::Value {
    json!({
        "shipping_rates": [
            {
                "id": "shopify-Express-9.99",
                "price": "9.99",
                "title": "Express",
                "checkout": {"total_tax": "0.00", "total_price": "59.99", "subtotal_price": "50.00"}
            },
            {
                "id": "shopify-Standard-3.94",
                "price": "3.94",
                "title": "Standard",
                "checkout": {"total_tax": "0.00", "total_price": "53.94", "subtotal_price": "50.00"}
            }
        ]
    })
}

pub fn profile() -> PurchaseProfile {
    PurchaseProfile {
        name: "main".to_string(),
        email: "ada@example.com".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        address1: "12 Analytical Row".to_string(),
        address2: String::new(),
        city: "London".to_string(),
        zip: "N1 9GU".to_string(),
        country: "United Kingdom".to_string(),
        phone: "07700900000".to_string(),
        card: CardDetails {
            number: CARD_NUMBER.to_string(),
            name: "Ada Lovelace".to_string(),
            month: 12,
            year: 2030,
            verification_value: "737".to_string(),
        },
    }
}

pub fn registry(server: &MockServer) -> StoreRegistry {
    StoreRegistry::new(vec![StoreProfile {
        domain: "127.0.0.1".to_string(),
        code: STORE_CODE.to_string(),
        checkout_domain: "checkout.test".to_string(),
        deposit_url: format!("{}/sessions", server.uri()),
    }])
}

pub fn task(server: &MockServer, selector: VariantSelector) -> TaskOptions {
    TaskOptions {
        task_id: "task-1".to_string(),
        url: format!("{}{PRODUCT_PATH}", server.uri()),
        selector,
        profile: profile(),
        proxy: None,
        shipping: ShippingPreference::Cheapest,
    }
}

pub fn size(size: &str) -> VariantSelector {
    VariantSelector::Size(size.to_string())
}

pub fn settings(max_attempts: u32) -> CheckoutSettings {
    CheckoutSettings {
        request_timeout: Duration::from_secs(5),
        user_agent: Some(TEST_USER_AGENT.to_string()),
        restart: RestartPolicy::immediate(max_attempts),
        poll: PollPolicy {
            interval: Duration::from_millis(10),
            max_wait: Duration::from_secs(5),
            shipping_rate_polls: 2,
        },
    }
}

/// Records every status update for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(String, Status)>>,
}

impl RecordingObserver {
    pub fn statuses(&self) -> Vec<Status> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, status)| status.clone())
            .collect()
    }

    pub fn steps(&self) -> Vec<Step> {
        self.statuses()
            .into_iter()
            .filter_map(|status| match status {
                Status::Step(step) => Some(step),
                _ => None,
            })
            .collect()
    }
}

impl StatusObserver for RecordingObserver {
    fn on_status(&self, task_id: &str, status: &Status) {
        self.events
            .lock()
            .unwrap()
            .push((task_id.to_string(), status.clone()));
    }
}

pub fn orchestrator(
    server: &MockServer,
    options: TaskOptions,
    settings: CheckoutSettings,
) -> (Orchestrator, Arc<RecordingObserver>, CancellationToken) {
    let observer = Arc::new(RecordingObserver::default());
    let cancel = CancellationToken::new();
    let orchestrator = Orchestrator::new(
        options,
        &registry(server),
        settings,
        observer.clone(),
        cancel.clone(),
    )
    .expect("failed to build test orchestrator");
    (orchestrator, observer, cancel)
}

pub fn redirect_to(server: &MockServer, target: &str) -> ResponseTemplate {
    ResponseTemplate::new(302).insert_header("location", format!("{}{target}", server.uri()))
}

pub async fn mount_product_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page()))
        .mount(server)
        .await;
}

pub async fn mount_cart(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/cart/add.js"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_line()))
        .mount(server)
        .await;
}

pub async fn mount_checkout_start(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/checkout"))
        .respond_with(redirect_to(server, CHECKOUT_PATH))
        .mount(server)
        .await;
}

/// The checkout page, served for every step's GET regardless of query.
pub async fn mount_checkout_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(CHECKOUT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(checkout_page()))
        .mount(server)
        .await;
}

pub async fn mount_form_steps(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(CHECKOUT_PATH))
        .and(body_string_contains("previous_step=contact_information"))
        .respond_with(redirect_to(
            server,
            "/123/checkouts/abc123?previous_step=contact_information&step=shipping_method",
        ))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(CHECKOUT_PATH))
        .and(body_string_contains("previous_step=shipping_method"))
        .respond_with(redirect_to(
            server,
            "/123/checkouts/abc123?previous_step=shipping_method&step=payment_method",
        ))
        .mount(server)
        .await;
}

pub async fn mount_shipping_rates(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(RATES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(shipping_rates()))
        .mount(server)
        .await;
}

pub async fn mount_deposit(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "east-session-1"})))
        .mount(server)
        .await;
}

/// Everything up to and including the payment session.
pub async fn mount_storefront(server: &MockServer) {
    mount_product_page(server).await;
    mount_cart(server).await;
    mount_checkout_start(server).await;
    mount_checkout_page(server).await;
    mount_form_steps(server).await;
    mount_shipping_rates(server).await;
    mount_deposit(server).await;
}

/// The payment submission, answered with `response`.
pub async fn mount_payment(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(CHECKOUT_PATH))
        .and(body_string_contains("previous_step=payment_method"))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn requests_to(server: &MockServer, http_method: &str, request_path: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.as_str() == http_method && request.url.path() == request_path)
        .collect()
}
