use reqwest::StatusCode;

use super::form::CheckoutForm;
use super::{headers, rejection, Step, StepEnv};
use crate::context::{required, CheckoutContext};
use crate::error::CheckoutError;
use crate::extract::{extract_token, TokenRole};

/// Loads the shipping-method page for its form token and API authorization.
pub(super) async fn fetch_tokens(
    ctx: &mut CheckoutContext,
    env: &StepEnv<'_>,
) -> Result<(), CheckoutError> {
    let token = required(ctx.checkout_token.as_deref(), "checkout_token")?;
    let url = env.storefront.checkout_url(token);

    let page = env
        .session
        .get_with_query(
            &url,
            &[
                ("previous_step", "contact_information"),
                ("step", "shipping_method"),
            ],
            headers::document(Some(url.as_str())),
        )
        .await?;

    let authenticity = extract_token(TokenRole::AuthenticityToken, &page.body)?;
    let authorization = extract_token(TokenRole::CheckoutAuthorizationToken, &page.body)?;
    ctx.delivery_authenticity_token = Some(authenticity);
    ctx.checkout_authorization_token = Some(authorization);
    Ok(())
}

/// Commits the chosen shipping rate.
pub(super) async fn submit(ctx: &mut CheckoutContext, env: &StepEnv<'_>) -> Result<(), CheckoutError> {
    let token = required(ctx.checkout_token.as_deref(), "checkout_token")?;
    let authenticity = required(
        ctx.delivery_authenticity_token.as_deref(),
        "delivery_authenticity_token",
    )?;
    let rate = required(ctx.shipping_rate.as_ref(), "shipping_rate")?;
    let url = env.storefront.checkout_url(token);

    let form = CheckoutForm::patch(authenticity, "shipping_method", "payment_method")
        .field("checkout[shipping_rate][id]", rate.id.as_str())
        .with_client_details();

    let response = env
        .session
        .post_form(&url, headers::form_submit(env.storefront, &url), &form.into_fields())
        .await?;
    if response.status.is_client_error() || response.status.is_server_error() {
        return Err(rejection(Step::SubmitDelivery, &response));
    }
    if response.status != StatusCode::FOUND {
        tracing::warn!(
            task = %env.options.task_id,
            status = response.status.as_u16(),
            "delivery submission did not redirect; continuing"
        );
    }
    Ok(())
}
