use std::str::FromStr;

use rust_decimal::Decimal;

use super::{headers, StepEnv};
use crate::context::{required, CheckoutContext};
use crate::error::CheckoutError;
use crate::extract::{extract_token, TokenRole};

/// Loads the payment-method page for the gateway, the order total and a
/// fresh form token.
pub(super) async fn resolve(ctx: &mut CheckoutContext, env: &StepEnv<'_>) -> Result<(), CheckoutError> {
    let token = required(ctx.checkout_token.as_deref(), "checkout_token")?;
    let url = env.storefront.checkout_url(token);

    let page = env
        .session
        .get_with_query(
            &url,
            &[("previous_step", "shipping_method"), ("step", "payment_method")],
            headers::document(Some(url.as_str())),
        )
        .await?;

    let gateway = extract_token(TokenRole::PaymentGateway, &page.body)?;
    let raw_total = extract_token(TokenRole::TotalPrice, &page.body)?;
    let total = Decimal::from_str(&raw_total).map_err(|_| CheckoutError::Extraction {
        role: TokenRole::TotalPrice,
    })?;
    let authenticity = extract_token(TokenRole::AuthenticityToken, &page.body)?;

    tracing::info!(task = %env.options.task_id, gateway = %gateway, total = %total, "payment gateway resolved");
    ctx.checkout_gateway_id = Some(gateway);
    ctx.total_price = Some(total);
    ctx.payment_authenticity_token = Some(authenticity);
    Ok(())
}
