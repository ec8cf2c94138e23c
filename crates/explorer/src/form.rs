//! Form value provisioning seam.

use webscout_core_types::SiteContext;

/// Supplies the value typed into a text input during exploration.
///
/// The production implementation derives values from the field's type,
/// name and placeholder plus the site context; tests use
/// [`StaticFormValues`].
pub trait FormValueProvider: Send + Sync {
    fn value_for(
        &self,
        input_type: &str,
        name: &str,
        placeholder: &str,
        ctx: &SiteContext,
    ) -> String;
}

/// Fixed-value provider for tests and offline runs.
#[derive(Clone, Debug)]
pub struct StaticFormValues {
    pub value: String,
}

impl Default for StaticFormValues {
    fn default() -> Self {
        Self {
            value: "test input".to_string(),
        }
    }
}

impl FormValueProvider for StaticFormValues {
    fn value_for(&self, _: &str, _: &str, _: &str, _: &SiteContext) -> String {
        self.value.clone()
    }
}
