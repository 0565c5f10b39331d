use reqwest::StatusCode;

use super::form::CheckoutForm;
use super::{headers, StepEnv};
use crate::context::{required, CheckoutContext};
use crate::error::CheckoutError;

/// Posts contact and shipping address details.
///
/// The checkout re-renders the page rather than redirecting when it dislikes
/// a field, and later steps surface that more precisely, so a non-redirect
/// here is only logged.
pub(super) async fn submit(ctx: &mut CheckoutContext, env: &StepEnv<'_>) -> Result<(), CheckoutError> {
    let token = required(ctx.checkout_token.as_deref(), "checkout_token")?;
    let authenticity = required(ctx.authenticity_token.as_deref(), "authenticity_token")?;
    let profile = &env.options.profile;
    let url = env.storefront.checkout_url(token);

    let form = CheckoutForm::patch(authenticity, "contact_information", "shipping_method")
        .field("checkout[email_or_phone]", profile.email.as_str())
        .field("checkout[buyer_accepts_marketing]", "0")
        .field("checkout[shipping_address][first_name]", profile.first_name.as_str())
        .field("checkout[shipping_address][last_name]", profile.last_name.as_str())
        .field("checkout[shipping_address][address1]", profile.address1.as_str())
        .field("checkout[shipping_address][address2]", profile.address2.as_str())
        .field("checkout[shipping_address][city]", profile.city.as_str())
        .field("checkout[shipping_address][country]", profile.country.as_str())
        .field("checkout[shipping_address][zip]", profile.zip.as_str())
        .field("checkout[shipping_address][phone]", profile.phone.as_str())
        .field("checkout[buyer_accepts_sms]", "0")
        .field("checkout[sms_marketing_phone]", "")
        .with_client_details();

    let response = env
        .session
        .post_form(&url, headers::form_submit(env.storefront, &url), &form.into_fields())
        .await?;
    if response.status != StatusCode::FOUND {
        tracing::warn!(
            task = %env.options.task_id,
            status = response.status.as_u16(),
            "address submission did not redirect; continuing"
        );
    }
    Ok(())
}
