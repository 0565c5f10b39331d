use reqwest::StatusCode;
use serde::Serialize;

use super::{headers, rejection, Step, StepEnv};
use crate::context::{required, CheckoutContext};
use crate::error::CheckoutError;
use crate::types::CartLine;

#[derive(Debug, Serialize)]
struct AddToCart<'a> {
    quantity: u32,
    id: &'a str,
}

pub(super) async fn add(ctx: &mut CheckoutContext, env: &StepEnv<'_>) -> Result<(), CheckoutError> {
    let variant_id = required(ctx.variant_id.as_deref(), "variant_id")?;
    let referer = env.storefront.product_referer(variant_id);

    let response = env
        .session
        .post_json(
            &env.storefront.cart_add_url(),
            headers::storefront_json(env.storefront, &referer),
            &AddToCart {
                quantity: 1,
                id: variant_id,
            },
        )
        .await?;
    if response.status != StatusCode::OK {
        return Err(rejection(Step::AddToCart, &response));
    }

    let line: CartLine = serde_json::from_str(&response.body)
        .map_err(|e| CheckoutError::deserialize("add-to-cart response", e))?;
    tracing::info!(
        task = %env.options.task_id,
        title = %line.title,
        price = %line.unit_price(),
        "added to cart"
    );
    ctx.status = format!("Carted {} @ {}", line.title, line.unit_price());
    ctx.cart = Some(line);
    Ok(())
}
