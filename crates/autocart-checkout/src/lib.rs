//! Checkout orchestration against Shopify-style storefronts.
//!
//! An [`Orchestrator`] owns one task: a cookie-carrying [`Session`], the
//! [`Storefront`] its product URL resolves to, and the restart loop that
//! drives the fixed [`Step`] pipeline from variant discovery to payment.

pub mod context;
pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod registry;
pub mod session;
pub mod steps;
pub mod types;

pub use context::{CheckoutContext, CheckoutState};
pub use error::{CheckoutError, StoreLookupError};
pub use extract::{extract_token, TokenRole};
pub use orchestrator::{
    CheckoutSettings, Orchestrator, Outcome, PollPolicy, RestartPolicy, Status, StatusObserver,
    TracingObserver,
};
pub use registry::{StoreRegistry, Storefront};
pub use session::{Exchange, Session};
pub use steps::{Step, StepOutcome};
pub use types::{CartLine, ProductVariant, RateCheckoutTotals, ShippingRate};
