use std::time::Instant;

use autocart_core::CardDetails;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::form::CheckoutForm;
use super::{headers, rejection, Step, StepEnv, StepOutcome};
use crate::context::{required, CheckoutContext, CheckoutState};
use crate::error::CheckoutError;
use crate::extract::TokenRole;
use crate::orchestrator::Outcome;
use crate::types::PaymentSessionResponse;

const THANK_YOU_MARKER: &str = "thank_you";
const PROCESSING_MARKER: &str = "/processing";

#[derive(Serialize)]
struct PaymentSessionRequest<'a> {
    credit_card: &'a CardDetails,
    payment_session_scope: &'a str,
}

/// Where a payment submission sent the buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRedirect {
    ThankYou(String),
    Processing(String),
    /// Anywhere else; the checkout wants the buyer to complete a challenge.
    Challenge(String),
}

/// Classifies a payment redirect target by its path markers.
#[must_use]
pub fn classify_payment_redirect(location: &str) -> PaymentRedirect {
    if location.contains(THANK_YOU_MARKER) {
        PaymentRedirect::ThankYou(location.to_owned())
    } else if location.contains(PROCESSING_MARKER) {
        PaymentRedirect::Processing(location.to_owned())
    } else {
        PaymentRedirect::Challenge(location.to_owned())
    }
}

/// Converts a major-unit amount to integer minor units, e.g. `53.94` to `5394`.
#[must_use]
pub fn minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED).round().to_i64()
}

/// Exchanges the card for an opaque payment session id at the vault.
///
/// Card data only ever travels in this request body; it is never logged.
pub(super) async fn create_session(
    ctx: &mut CheckoutContext,
    env: &StepEnv<'_>,
) -> Result<(), CheckoutError> {
    let request = PaymentSessionRequest {
        credit_card: &env.options.profile.card,
        payment_session_scope: &env.storefront.host,
    };
    let response = env
        .session
        .post_json(
            &env.storefront.store.deposit_url,
            headers::deposit(env.storefront),
            &request,
        )
        .await?;
    if !response.status.is_success() {
        return Err(rejection(Step::CreatePaymentSession, &response));
    }

    let session: PaymentSessionResponse = serde_json::from_str(&response.body)
        .map_err(|e| CheckoutError::deserialize("payment session response", e))?;
    let id = session
        .id
        .filter(|id| !id.is_empty())
        .ok_or(CheckoutError::Extraction {
            role: TokenRole::PaymentSessionId,
        })?;
    tracing::info!(task = %env.options.task_id, "payment session created");
    ctx.payment_session_id = Some(id);
    Ok(())
}

/// Submits payment and follows the result to a terminal outcome.
pub(super) async fn submit(
    ctx: &mut CheckoutContext,
    env: &StepEnv<'_>,
) -> Result<StepOutcome, CheckoutError> {
    let token = required(ctx.checkout_token.as_deref(), "checkout_token")?;
    let authenticity = required(
        ctx.payment_authenticity_token.as_deref(),
        "payment_authenticity_token",
    )?;
    let session_id = required(ctx.payment_session_id.as_deref(), "payment_session_id")?;
    let gateway = required(ctx.checkout_gateway_id.as_deref(), "checkout_gateway_id")?;
    let total = *required(ctx.total_price.as_ref(), "total_price")?;
    let total_minor = minor_units(total).ok_or(CheckoutError::Extraction {
        role: TokenRole::TotalPrice,
    })?;
    let url = env.storefront.checkout_url(token);

    let form = CheckoutForm::patch(authenticity, "payment_method", "")
        .field("s", session_id)
        .field("checkout[payment_gateway]", gateway)
        .field("checkout[credit_card][vault]", "false")
        .field("checkout[different_billing_address]", "false")
        .field("checkout[remember_me]", "false")
        .field("checkout[remember_me]", "0")
        .field("checkout[vault_phone]", env.options.profile.phone.as_str())
        .field("checkout[total_price]", total_minor.to_string())
        .field("complete", "1")
        .with_client_details();

    let response = env
        .session
        .post_form(&url, headers::form_submit(env.storefront, &url), &form.into_fields())
        .await?;
    ctx.state = CheckoutState::PaymentSubmitted;

    let Some(location) = response.location() else {
        return Err(rejection(Step::SubmitPayment, &response));
    };
    ctx.payment_location = Some(location.clone());

    match classify_payment_redirect(&location) {
        PaymentRedirect::ThankYou(location) => {
            tracing::info!(task = %env.options.task_id, "payment confirmed");
            Ok(StepOutcome::Finished(Outcome::Confirmed { location }))
        }
        PaymentRedirect::Processing(location) => {
            ctx.state = CheckoutState::Processing;
            poll_processing(ctx, env, location).await
        }
        PaymentRedirect::Challenge(location) => {
            Err(CheckoutError::ChallengeSuspended { location })
        }
    }
}

/// Polls the processing page until it redirects to the thank-you page.
async fn poll_processing(
    ctx: &mut CheckoutContext,
    env: &StepEnv<'_>,
    first_target: String,
) -> Result<StepOutcome, CheckoutError> {
    let started = Instant::now();
    let mut target = first_target;
    let mut polls = 0u32;

    loop {
        if env.cancel.is_cancelled() {
            return Ok(StepOutcome::Finished(Outcome::Cancelled));
        }
        if started.elapsed() >= env.poll.max_wait {
            return Err(CheckoutError::PaymentTimeout {
                waited_secs: started.elapsed().as_secs(),
            });
        }

        tokio::select! {
            () = env.cancel.cancelled() => return Ok(StepOutcome::Finished(Outcome::Cancelled)),
            () = tokio::time::sleep(env.poll.interval) => {}
        }

        let response = env
            .session
            .get(&target, headers::document(Some(target.as_str())))
            .await?;
        polls += 1;

        match response.location().as_deref().map(classify_payment_redirect) {
            Some(PaymentRedirect::ThankYou(location)) => {
                tracing::info!(task = %env.options.task_id, polls, "payment confirmed");
                ctx.payment_location = Some(location.clone());
                return Ok(StepOutcome::Finished(Outcome::Confirmed { location }));
            }
            Some(PaymentRedirect::Processing(location)) => target = location,
            Some(PaymentRedirect::Challenge(location)) => {
                tracing::warn!(task = %env.options.task_id, polls, "payment declined while processing");
                return Err(CheckoutError::RemoteRejection {
                    step: Step::SubmitPayment,
                    status: Some(response.status.as_u16()),
                    reason: format!("payment redirected to {location} while processing"),
                });
            }
            None => {
                tracing::debug!(task = %env.options.task_id, polls, "payment still processing");
            }
        }
    }
}
