//! Field lists for the checkout's PATCH-over-POST forms.

/// Ordered form fields. Keys may repeat, as browsers send them.
#[derive(Debug, Default)]
pub(crate) struct CheckoutForm {
    fields: Vec<(String, String)>,
}

impl CheckoutForm {
    /// Starts a form that moves the checkout from `previous_step` to `step`.
    pub(crate) fn patch(authenticity_token: &str, previous_step: &str, step: &str) -> Self {
        Self::default()
            .field("_method", "patch")
            .field("authenticity_token", authenticity_token)
            .field("previous_step", previous_step)
            .field("step", step)
    }

    pub(crate) fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_owned(), value.into()));
        self
    }

    /// Appends the browser fingerprint block the checkout expects on every
    /// form submission.
    pub(crate) fn with_client_details(self) -> Self {
        let (width, height) = viewport();
        self.field("checkout[client_details][browser_width]", width.to_string())
            .field("checkout[client_details][browser_height]", height.to_string())
            .field("checkout[client_details][javascript_enabled]", "1")
            .field("checkout[client_details][color_depth]", "30")
            .field("checkout[client_details][java_enabled]", "false")
            .field("checkout[client_details][browser_tz]", "-60")
    }

    pub(crate) fn into_fields(self) -> Vec<(String, String)> {
        self.fields
    }
}

/// A plausible desktop viewport, drawn fresh for each form.
fn viewport() -> (u32, u32) {
    (
        rand::random_range(1000..2000),
        rand::random_range(1000..2000),
    )
}
