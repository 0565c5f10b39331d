//! Single-step tests driven through `steps::execute` with hand-built contexts.

mod common;

use autocart_checkout::registry::Storefront;
use autocart_checkout::steps::{execute, StepEnv};
use autocart_checkout::{
    CheckoutContext, CheckoutError, Outcome, PollPolicy, Session, Step, StepOutcome, TokenRole,
};
use autocart_core::TaskOptions;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

struct Harness {
    session: Session,
    storefront: Storefront,
    options: TaskOptions,
    poll: PollPolicy,
    cancel: CancellationToken,
}

impl Harness {
    fn new(server: &MockServer, options: TaskOptions) -> Self {
        let settings = settings(1);
        Self {
            session: Session::new(settings.request_timeout, settings.user_agent.as_deref(), None)
                .expect("failed to build test session"),
            storefront: registry(server)
                .resolve(&options.url)
                .expect("test store resolves"),
            options,
            poll: settings.poll,
            cancel: CancellationToken::new(),
        }
    }

    fn env(&self) -> StepEnv<'_> {
        StepEnv {
            session: &self.session,
            storefront: &self.storefront,
            options: &self.options,
            poll: &self.poll,
            cancel: &self.cancel,
        }
    }

    async fn run(&self, step: Step, ctx: &mut CheckoutContext) -> Result<StepOutcome, CheckoutError> {
        execute(step, ctx, &self.env()).await
    }
}

fn ctx_at_checkout() -> CheckoutContext {
    CheckoutContext {
        variant_id: Some("222".to_string()),
        checkout_token: Some(CHECKOUT_TOKEN.to_string()),
        ..CheckoutContext::default()
    }
}

#[tokio::test]
async fn variant_discovery_picks_matching_size_on_every_run() {
    let server = MockServer::start().await;
    mount_product_page(&server).await;

    for (wanted, expected) in [("UK 9", "111"), ("UK 10", "222"), ("UK 10", "222")] {
        let harness = Harness::new(&server, task(&server, size(wanted)));
        let mut ctx = CheckoutContext::default();
        let outcome = harness.run(Step::DiscoverVariant, &mut ctx).await.unwrap();
        assert_eq!(outcome, StepOutcome::Advanced);
        assert_eq!(ctx.variant_id.as_deref(), Some(expected), "size {wanted}");
    }
}

#[tokio::test]
async fn missing_size_leaves_variant_unset() {
    let server = MockServer::start().await;
    mount_product_page(&server).await;

    let harness = Harness::new(&server, task(&server, size("UK 12")));
    let mut ctx = CheckoutContext::default();
    let err = harness.run(Step::DiscoverVariant, &mut ctx).await.unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Extraction {
            role: TokenRole::VariantForSelector
        }
    ));
    assert!(ctx.variant_id.is_none());
    assert!(err.is_restartable());
}

#[tokio::test]
async fn unavailable_product_page_is_an_extraction_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, task(&server, size("UK 9")));
    let err = harness
        .run(Step::DiscoverVariant, &mut CheckoutContext::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Extraction {
            role: TokenRole::ProductVariants
        }
    ));
    assert!(err.is_restartable());
}

#[tokio::test]
async fn step_without_its_inputs_reports_missing_precondition() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server, task(&server, size("UK 9")));

    let err = harness
        .run(Step::AddToCart, &mut CheckoutContext::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::MissingPrecondition { field: "variant_id" }
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn checkout_page_without_authenticity_token_is_extraction_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHECKOUT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>queue</html>"))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, task(&server, size("UK 10")));
    let mut ctx = ctx_at_checkout();
    let err = harness
        .run(Step::FetchAuthenticityToken, &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Extraction {
            role: TokenRole::AuthenticityToken
        }
    ));
}

#[tokio::test]
async fn address_submission_without_redirect_still_advances() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHECKOUT_PATH))
        .and(body_string_contains("previous_step=contact_information"))
        .and(body_string_contains("checkout%5Bshipping_address%5D%5Bzip%5D=N1+9GU"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, task(&server, size("UK 10")));
    let mut ctx = ctx_at_checkout();
    ctx.authenticity_token = Some("auth-token-1".to_string());
    let outcome = harness.run(Step::SubmitAddress, &mut ctx).await.unwrap();
    assert_eq!(outcome, StepOutcome::Advanced);
}

#[tokio::test]
async fn shipping_rates_are_repolled_while_pending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RATES_PATH))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RATES_PATH))
        .and(wiremock::matchers::header(
            "x-shopify-checkout-authorization-token",
            "authz-token-1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(shipping_rates()))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, task(&server, size("UK 10")));
    let mut ctx = ctx_at_checkout();
    ctx.checkout_authorization_token = Some("authz-token-1".to_string());
    harness.run(Step::ResolveShippingRate, &mut ctx).await.unwrap();

    let rate = ctx.shipping_rate.expect("rate selected");
    assert_eq!(rate.id, "shopify-Standard-3.94");
}

#[tokio::test]
async fn shipping_rates_still_pending_after_polls_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RATES_PATH))
        .respond_with(ResponseTemplate::new(202))
        .expect(3)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, task(&server, size("UK 10")));
    let mut ctx = ctx_at_checkout();
    ctx.checkout_authorization_token = Some("authz-token-1".to_string());
    let err = harness
        .run(Step::ResolveShippingRate, &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::RemoteRejection {
            step: Step::ResolveShippingRate,
            status: Some(202),
            ..
        }
    ));
}

#[tokio::test]
async fn cancellation_stops_shipping_rate_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RATES_PATH))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let mut harness = Harness::new(&server, task(&server, size("UK 10")));
    harness.poll.interval = std::time::Duration::from_secs(30);
    harness.poll.shipping_rate_polls = 5;
    let cancel = harness.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let mut ctx = ctx_at_checkout();
    ctx.checkout_authorization_token = Some("authz-token-1".to_string());
    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        harness.run(Step::ResolveShippingRate, &mut ctx),
    )
    .await
    .expect("shipping poll sleep was not interrupted")
    .unwrap();

    assert_eq!(outcome, StepOutcome::Finished(Outcome::Cancelled));
    assert!(ctx.shipping_rate.is_none());
}

#[tokio::test]
async fn empty_shipping_rates_are_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RATES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"shipping_rates": []})))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, task(&server, size("UK 10")));
    let mut ctx = ctx_at_checkout();
    ctx.checkout_authorization_token = Some("authz-token-1".to_string());
    let err = harness
        .run(Step::ResolveShippingRate, &mut ctx)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no shipping rates offered"), "{err}");
}

#[tokio::test]
async fn delivery_client_error_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHECKOUT_PATH))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, task(&server, size("UK 10")));
    let mut ctx = ctx_at_checkout();
    ctx.delivery_authenticity_token = Some("auth-token-1".to_string());
    ctx.shipping_rate = serde_json::from_value(shipping_rates()["shipping_rates"][1].clone()).ok();
    let err = harness.run(Step::SubmitDelivery, &mut ctx).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::RemoteRejection {
            step: Step::SubmitDelivery,
            status: Some(422),
            ..
        }
    ));
}

#[tokio::test]
async fn gateway_step_records_total_and_tokens() {
    let server = MockServer::start().await;
    mount_checkout_page(&server).await;

    let harness = Harness::new(&server, task(&server, size("UK 10")));
    let mut ctx = ctx_at_checkout();
    harness.run(Step::ResolveGateway, &mut ctx).await.unwrap();

    assert_eq!(ctx.checkout_gateway_id.as_deref(), Some("118754754"));
    assert_eq!(ctx.payment_authenticity_token.as_deref(), Some("auth-token-1"));
    assert_eq!(ctx.total_price.map(|t| t.to_string()).as_deref(), Some("53.94"));
}

#[tokio::test]
async fn vault_response_without_id_is_extraction_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .and(wiremock::matchers::header("origin", "https://checkout.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "declined"})))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, task(&server, size("UK 10")));
    let err = harness
        .run(Step::CreatePaymentSession, &mut CheckoutContext::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Extraction {
            role: TokenRole::PaymentSessionId
        }
    ));
    assert!(!err.to_string().contains(CARD_NUMBER));
}
