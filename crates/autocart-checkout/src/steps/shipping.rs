use autocart_core::ShippingPreference;
use reqwest::StatusCode;

use super::{headers, rejection, Step, StepEnv, StepOutcome};
use crate::context::{required, CheckoutContext};
use crate::error::CheckoutError;
use crate::orchestrator::Outcome;
use crate::types::{ShippingRate, ShippingRatesResponse};

/// Fetches the offered shipping rates and picks one.
///
/// The rates endpoint answers `202 Accepted` while rates are still being
/// computed; it is re-polled up to the configured number of times. A
/// cancellation between polls finishes the pipeline as cancelled.
pub(super) async fn resolve(
    ctx: &mut CheckoutContext,
    env: &StepEnv<'_>,
) -> Result<StepOutcome, CheckoutError> {
    let token = required(ctx.checkout_token.as_deref(), "checkout_token")?;
    let authorization = required(
        ctx.checkout_authorization_token.as_deref(),
        "checkout_authorization_token",
    )?;
    let url = env.storefront.shipping_rates_url(token);
    let referer = env.storefront.checkout_url(token);

    let mut pending_polls = 0u32;
    let rates = loop {
        let response = env
            .session
            .get(&url, headers::checkout_api(authorization, &referer))
            .await?;
        match response.status {
            StatusCode::OK => {
                let parsed: ShippingRatesResponse = serde_json::from_str(&response.body)
                    .map_err(|e| CheckoutError::deserialize("shipping rates", e))?;
                break parsed.shipping_rates;
            }
            StatusCode::ACCEPTED if pending_polls < env.poll.shipping_rate_polls => {
                pending_polls += 1;
                tracing::debug!(task = %env.options.task_id, pending_polls, "shipping rates not ready");
                tokio::select! {
                    () = env.cancel.cancelled() => {
                        return Ok(StepOutcome::Finished(Outcome::Cancelled));
                    }
                    () = tokio::time::sleep(env.poll.interval) => {}
                }
            }
            _ => return Err(rejection(Step::ResolveShippingRate, &response)),
        }
    };

    let chosen = select_shipping_rate(&rates, &env.options.shipping)?.clone();
    tracing::info!(
        task = %env.options.task_id,
        rate = %chosen.id,
        price = %chosen.price,
        offered = rates.len(),
        "shipping rate selected"
    );
    ctx.shipping_rate = Some(chosen);
    Ok(StepOutcome::Advanced)
}

/// Picks a rate per `preference`: the named id, or the cheapest offered.
///
/// # Errors
///
/// Returns [`CheckoutError::RemoteRejection`] if no rates are offered or the
/// named rate is not among them.
pub fn select_shipping_rate<'a>(
    rates: &'a [ShippingRate],
    preference: &ShippingPreference,
) -> Result<&'a ShippingRate, CheckoutError> {
    let chosen = match preference {
        ShippingPreference::Cheapest => rates.iter().min_by_key(|rate| rate.price),
        ShippingPreference::Id(id) => rates.iter().find(|rate| &rate.id == id),
    };
    chosen.ok_or_else(|| CheckoutError::RemoteRejection {
        step: Step::ResolveShippingRate,
        status: None,
        reason: match preference {
            _ if rates.is_empty() => "no shipping rates offered".to_string(),
            ShippingPreference::Id(id) => format!("shipping rate '{id}' not offered"),
            ShippingPreference::Cheapest => "no shipping rate could be chosen".to_string(),
        },
    })
}
