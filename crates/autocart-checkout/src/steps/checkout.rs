use super::{headers, Step, StepEnv};
use crate::context::{required, CheckoutContext};
use crate::error::CheckoutError;
use crate::extract::{extract_token, TokenRole};

/// Path fragment every checkout page URL contains.
const CHECKOUT_PATH_MARKER: &str = "/checkouts/";

/// Converts the cart into a checkout and records its token.
pub(super) async fn init(ctx: &mut CheckoutContext, env: &StepEnv<'_>) -> Result<(), CheckoutError> {
    let variant_id = required(ctx.variant_id.as_deref(), "variant_id")?;
    let referer = env.storefront.product_referer(variant_id);

    let response = env
        .session
        .post_form(
            &env.storefront.checkout_start_url(),
            headers::form_submit(env.storefront, &referer),
            &[],
        )
        .await?;

    let location = match response.location() {
        Some(location) if location.contains(CHECKOUT_PATH_MARKER) => location,
        other => {
            return Err(CheckoutError::UnexpectedFlow {
                step: Step::InitCheckout,
                location: other,
            })
        }
    };

    let page = env
        .session
        .get(&location, headers::document(Some(referer.as_str())))
        .await?;
    let token = extract_token(TokenRole::CheckoutToken, &page.body)?;
    tracing::info!(task = %env.options.task_id, checkout = %token, "checkout initialised");

    ctx.checkout_url = Some(location);
    ctx.checkout_token = Some(token);
    Ok(())
}

pub(super) async fn fetch_authenticity_token(
    ctx: &mut CheckoutContext,
    env: &StepEnv<'_>,
) -> Result<(), CheckoutError> {
    let token = required(ctx.checkout_token.as_deref(), "checkout_token")?;
    let variant_id = required(ctx.variant_id.as_deref(), "variant_id")?;

    let page = env
        .session
        .get(
            &env.storefront.checkout_url(token),
            headers::document(Some(env.storefront.product_referer(variant_id).as_str())),
        )
        .await?;
    ctx.authenticity_token = Some(extract_token(TokenRole::AuthenticityToken, &page.body)?);
    Ok(())
}
