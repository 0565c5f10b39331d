//! The ordered checkout pipeline.
//!
//! Each step reads what earlier steps left in the [`CheckoutContext`], makes
//! one or more requests through the shared session, and writes its results
//! back. Steps never retry on their own; failures go to the orchestrator.

mod address;
mod cart;
mod checkout;
mod delivery;
mod form;
mod gateway;
mod headers;
mod payment;
mod shipping;
mod variant;

use std::fmt;

use autocart_core::TaskOptions;
use tokio_util::sync::CancellationToken;

use crate::context::{CheckoutContext, CheckoutState};
use crate::error::CheckoutError;
use crate::orchestrator::{Outcome, PollPolicy};
use crate::registry::Storefront;
use crate::session::{Exchange, Session};

pub use payment::{classify_payment_redirect, minor_units, PaymentRedirect};
pub use shipping::select_shipping_rate;
pub use variant::{parse_product_variants, select_variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    DiscoverVariant,
    AddToCart,
    InitCheckout,
    FetchAuthenticityToken,
    SubmitAddress,
    FetchDeliveryTokens,
    ResolveShippingRate,
    SubmitDelivery,
    ResolveGateway,
    CreatePaymentSession,
    SubmitPayment,
}

impl Step {
    /// Every step in execution order.
    pub const ALL: [Step; 11] = [
        Step::DiscoverVariant,
        Step::AddToCart,
        Step::InitCheckout,
        Step::FetchAuthenticityToken,
        Step::SubmitAddress,
        Step::FetchDeliveryTokens,
        Step::ResolveShippingRate,
        Step::SubmitDelivery,
        Step::ResolveGateway,
        Step::CreatePaymentSession,
        Step::SubmitPayment,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DiscoverVariant => "discover_variant",
            Self::AddToCart => "add_to_cart",
            Self::InitCheckout => "init_checkout",
            Self::FetchAuthenticityToken => "fetch_authenticity_token",
            Self::SubmitAddress => "submit_address",
            Self::FetchDeliveryTokens => "fetch_delivery_tokens",
            Self::ResolveShippingRate => "resolve_shipping_rate",
            Self::SubmitDelivery => "submit_delivery",
            Self::ResolveGateway => "resolve_gateway",
            Self::CreatePaymentSession => "create_payment_session",
            Self::SubmitPayment => "submit_payment",
        }
    }

    /// Human-readable status shown while the step runs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::DiscoverVariant => "Getting variants",
            Self::AddToCart => "Carting variants",
            Self::InitCheckout => "Initializing checkout",
            Self::FetchAuthenticityToken => "Getting authorization token",
            Self::SubmitAddress => "Submitting address",
            Self::FetchDeliveryTokens => "Getting delivery token",
            Self::ResolveShippingRate => "Getting shipping rates",
            Self::SubmitDelivery => "Submitting delivery",
            Self::ResolveGateway => "Getting gateway",
            Self::CreatePaymentSession => "Creating payment session",
            Self::SubmitPayment => "Submitting payment",
        }
    }

    /// State the context is in once this step has succeeded.
    #[must_use]
    pub fn reached(self) -> CheckoutState {
        match self {
            Self::DiscoverVariant => CheckoutState::VariantFound,
            Self::AddToCart => CheckoutState::Carted,
            Self::InitCheckout => CheckoutState::CheckoutInitiated,
            Self::FetchAuthenticityToken => CheckoutState::Authenticated,
            Self::SubmitAddress => CheckoutState::AddressSubmitted,
            Self::FetchDeliveryTokens => CheckoutState::DeliveryTokenised,
            Self::ResolveShippingRate => CheckoutState::RatesResolved,
            Self::SubmitDelivery => CheckoutState::DeliverySubmitted,
            Self::ResolveGateway => CheckoutState::GatewayResolved,
            Self::CreatePaymentSession => CheckoutState::PaymentSessionCreated,
            Self::SubmitPayment => CheckoutState::PaymentSubmitted,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a step may use besides the context it mutates.
pub struct StepEnv<'a> {
    pub session: &'a Session,
    pub storefront: &'a Storefront,
    pub options: &'a TaskOptions,
    pub poll: &'a PollPolicy,
    pub cancel: &'a CancellationToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Move on to the next step.
    Advanced,
    /// The pipeline reached a terminal outcome.
    Finished(Outcome),
}

/// Runs a single step against `ctx`.
///
/// # Errors
///
/// Propagates whatever the step fails with; see [`CheckoutError::is_restartable`].
pub async fn execute(
    step: Step,
    ctx: &mut CheckoutContext,
    env: &StepEnv<'_>,
) -> Result<StepOutcome, CheckoutError> {
    let advanced = |()| StepOutcome::Advanced;
    match step {
        Step::DiscoverVariant => variant::discover(ctx, env).await.map(advanced),
        Step::AddToCart => cart::add(ctx, env).await.map(advanced),
        Step::InitCheckout => checkout::init(ctx, env).await.map(advanced),
        Step::FetchAuthenticityToken => checkout::fetch_authenticity_token(ctx, env)
            .await
            .map(advanced),
        Step::SubmitAddress => address::submit(ctx, env).await.map(advanced),
        Step::FetchDeliveryTokens => delivery::fetch_tokens(ctx, env).await.map(advanced),
        Step::ResolveShippingRate => shipping::resolve(ctx, env).await,
        Step::SubmitDelivery => delivery::submit(ctx, env).await.map(advanced),
        Step::ResolveGateway => gateway::resolve(ctx, env).await.map(advanced),
        Step::CreatePaymentSession => payment::create_session(ctx, env).await.map(advanced),
        Step::SubmitPayment => payment::submit(ctx, env).await,
    }
}

/// Builds a [`CheckoutError::RemoteRejection`] from a refused exchange.
pub(crate) fn rejection(step: Step, exchange: &Exchange) -> CheckoutError {
    CheckoutError::RemoteRejection {
        step,
        status: Some(exchange.status.as_u16()),
        reason: format!(
            "HTTP {} from {}",
            exchange.status.as_u16(),
            exchange.url.as_str()
        ),
    }
}
