//! Per-attempt state accumulated by the checkout steps.

use rust_decimal::Decimal;

use crate::error::CheckoutError;
use crate::types::{CartLine, ShippingRate};

/// How far the current attempt has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Start,
    VariantFound,
    Carted,
    CheckoutInitiated,
    Authenticated,
    AddressSubmitted,
    DeliveryTokenised,
    RatesResolved,
    DeliverySubmitted,
    GatewayResolved,
    PaymentSessionCreated,
    PaymentSubmitted,
    Processing,
    Confirmed,
    ChallengeSuspended,
}

/// Values produced by one step and consumed by later ones.
///
/// A fresh context is created for every attempt; the HTTP session is the only
/// thing that survives a restart.
#[derive(Debug, Clone, Default)]
pub struct CheckoutContext {
    pub state: CheckoutState,
    /// Label of the step currently running, or the last failure.
    pub status: String,
    pub variant_id: Option<String>,
    pub cart: Option<CartLine>,
    pub checkout_url: Option<String>,
    pub checkout_token: Option<String>,
    pub authenticity_token: Option<String>,
    pub delivery_authenticity_token: Option<String>,
    pub checkout_authorization_token: Option<String>,
    pub shipping_rate: Option<ShippingRate>,
    pub checkout_gateway_id: Option<String>,
    pub payment_authenticity_token: Option<String>,
    pub total_price: Option<Decimal>,
    pub payment_session_id: Option<String>,
    /// Where the payment submission redirected.
    pub payment_location: Option<String>,
}

/// Returns `value` or a [`CheckoutError::MissingPrecondition`] naming `field`.
pub(crate) fn required<'a, T: ?Sized>(
    value: Option<&'a T>,
    field: &'static str,
) -> Result<&'a T, CheckoutError> {
    value.ok_or(CheckoutError::MissingPrecondition { field })
}
