use autocart_core::VariantSelector;
use reqwest::StatusCode;

use super::{headers, StepEnv};
use crate::context::CheckoutContext;
use crate::error::CheckoutError;
use crate::extract::{json_array_for_key, TokenRole};
use crate::types::ProductVariant;

const VARIANTS_KEY: &str = "productVariants";

pub(super) async fn discover(
    ctx: &mut CheckoutContext,
    env: &StepEnv<'_>,
) -> Result<(), CheckoutError> {
    let size = match &env.options.selector {
        VariantSelector::Id(id) => {
            tracing::info!(task = %env.options.task_id, variant_id = %id, "using configured variant");
            ctx.variant_id = Some(id.clone());
            return Ok(());
        }
        VariantSelector::Size(size) => size,
    };

    let page = env
        .session
        .get(env.storefront.product_url.as_str(), headers::document(None))
        .await?;
    if page.status != StatusCode::OK {
        tracing::warn!(
            task = %env.options.task_id,
            status = page.status.as_u16(),
            "product page unavailable"
        );
        return Err(CheckoutError::Extraction {
            role: TokenRole::ProductVariants,
        });
    }

    let variants = parse_product_variants(&page.body)?;
    tracing::debug!(
        task = %env.options.task_id,
        count = variants.len(),
        "loaded product variants"
    );

    ctx.variant_id = select_variant(&variants, size).map(|variant| variant.id.clone());
    match &ctx.variant_id {
        Some(id) => {
            tracing::info!(task = %env.options.task_id, size = %size, variant_id = %id, "variant found");
            Ok(())
        }
        None => Err(CheckoutError::Extraction {
            role: TokenRole::VariantForSelector,
        }),
    }
}

/// Parses the `productVariants` array embedded in a product page.
///
/// # Errors
///
/// Returns [`CheckoutError::Extraction`] if the page has no such array, or
/// [`CheckoutError::Deserialize`] if it is not a list of variants.
pub fn parse_product_variants(body: &str) -> Result<Vec<ProductVariant>, CheckoutError> {
    let fragment = json_array_for_key(body, VARIANTS_KEY).ok_or(CheckoutError::Extraction {
        role: TokenRole::ProductVariants,
    })?;
    serde_json::from_str(fragment).map_err(|e| CheckoutError::deserialize(VARIANTS_KEY, e))
}

/// Returns the first variant whose title contains `size`, case-sensitively.
#[must_use]
pub fn select_variant<'a>(variants: &'a [ProductVariant], size: &str) -> Option<&'a ProductVariant> {
    variants.iter().find(|variant| variant.title.contains(size))
}
