//! Reference synthesis
//!
//! Turns a live element snapshot into the single most stable locator
//! string. Eight strategies in stability order:
//! 1. Stable `id` (generated-looking ids are rejected)
//! 2. Test identifier attribute
//! 3. Accessible label attribute
//! 4. Role + visible text
//! 5. Stable CSS classes + visible text
//! 6. Tag + visible text
//! 7. Position among siblings (least stable)
//! 8. Empty string - the element cannot be referenced and must be
//!    dropped by the caller.
//!
//! Pure functions of the snapshot; nothing here touches the page.

use once_cell::sync::Lazy;
use regex::Regex;
use webscout_core_types::ElementSnapshot;

/// Ids matching this look machine-generated and change between
/// sessions: a run of four or more digits, or a known generated marker.
static GENERATED_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4,}|floating-ui|generated|dynamic|temp").expect("static pattern"));

/// Classes with a run of two or more digits are usually emitted by a
/// build pipeline and not stable across deploys.
static NUMERIC_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2,}").expect("static pattern"));

/// Visible text is truncated to this many characters before it is
/// embedded in a locator.
const TEXT_BUDGET: usize = 30;

/// Synthesize the most stable reference for an element.
///
/// Returns the empty string when no strategy applies; such elements
/// cannot be re-found later and callers must exclude them.
pub fn best_reference(el: &ElementSnapshot) -> String {
    if let Some(id) = el.id.as_deref().filter(|id| is_stable_id(id)) {
        return format!("#{}", css_escape(id));
    }

    if let Some(test_id) = el.test_id.as_deref() {
        return format!("[data-testid=\"{}\"]", css_escape(test_id));
    }

    if let Some(label) = el.aria_label.as_deref() {
        return format!("[aria-label=\"{}\"]", css_escape(label));
    }

    let text = visible_text(el);

    if let (Some(role), Some(text)) = (el.role.as_deref(), text.as_deref()) {
        return format!("[role=\"{role}\"]:has-text(\"{text}\")");
    }

    if let Some(text) = text.as_deref() {
        let stable = stable_classes(&el.classes);
        if !stable.is_empty() {
            let class_selector: String = stable
                .iter()
                .map(|class| format!(".{}", css_escape(class)))
                .collect();
            return format!("{}{}:has-text(\"{}\")", el.tag, class_selector, text);
        }
        return format!("{}:has-text(\"{}\")", el.tag, text);
    }

    if let (Some(parent), Some(index)) = (el.parent_tag.as_deref(), el.sibling_index) {
        return format!("{} > {}:nth-child({})", parent, el.tag, index + 1);
    }

    String::new()
}

/// Whether an id is worth anchoring a locator on.
pub fn is_stable_id(id: &str) -> bool {
    !id.is_empty() && !GENERATED_ID.is_match(id)
}

/// Trimmed visible text, truncated to the locator budget.
fn visible_text(el: &ElementSnapshot) -> Option<String> {
    el.text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.chars().take(TEXT_BUDGET).collect())
}

/// Keep only classes that survive redeploys: no digit runs, no
/// modifier suffixes, long enough to carry meaning.
fn stable_classes(classes: &[String]) -> Vec<&str> {
    classes
        .iter()
        .map(String::as_str)
        .filter(|class| !NUMERIC_CLASS.is_match(class) && !class.contains("--") && class.len() > 3)
        .collect()
}

/// Escape a string for use inside a CSS identifier or attribute value.
///
/// Covers the characters that actually show up in ids and test
/// identifiers; anything outside `[a-zA-Z0-9_-]` is backslash-escaped.
pub fn css_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            escaped.push(ch);
        } else {
            escaped.push('\\');
            escaped.push(ch);
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str) -> ElementSnapshot {
        ElementSnapshot::new(tag)
    }

    #[test]
    fn stable_id_wins_over_everything() {
        let mut element = el("button");
        element.id = Some("submit-payment".to_string());
        element.test_id = Some("pay-button".to_string());
        element.aria_label = Some("Pay now".to_string());
        element.text = Some("Pay".to_string());

        assert_eq!(best_reference(&element), "#submit-payment");
    }

    #[test]
    fn generated_ids_are_rejected() {
        for id in [
            "item-12345",
            "floating-ui-anchor",
            "generated-panel",
            "dynamic-tab",
            "temp-node",
        ] {
            assert!(!is_stable_id(id), "{id} should look generated");
        }
        assert!(is_stable_id("nav-primary"));
        assert!(is_stable_id("tab2"));
    }

    #[test]
    fn test_id_beats_aria_label() {
        let mut element = el("button");
        element.id = Some("btn-98765432".to_string());
        element.test_id = Some("checkout".to_string());
        element.aria_label = Some("Checkout".to_string());

        assert_eq!(best_reference(&element), "[data-testid=\"checkout\"]");
    }

    #[test]
    fn aria_label_beats_role_and_text() {
        let mut element = el("div");
        element.aria_label = Some("Close dialog".to_string());
        element.role = Some("button".to_string());
        element.text = Some("X".to_string());

        assert_eq!(best_reference(&element), "[aria-label=\"Close\\ dialog\"]");
    }

    #[test]
    fn role_with_text_truncates_to_thirty_chars() {
        let mut element = el("div");
        element.role = Some("link".to_string());
        element.text = Some("  An extremely long navigation label that keeps going ".to_string());

        let reference = best_reference(&element);
        assert_eq!(
            reference,
            "[role=\"link\"]:has-text(\"An extremely long navigation l\")"
        );
    }

    #[test]
    fn stable_classes_combine_with_text() {
        let mut element = el("a");
        element.classes = vec![
            "nav-link".to_string(),
            "css-a8b217".to_string(),
            "btn--primary".to_string(),
            "xs".to_string(),
        ];
        element.text = Some("Pricing".to_string());

        assert_eq!(best_reference(&element), "a.nav-link:has-text(\"Pricing\")");
    }

    #[test]
    fn text_only_falls_back_to_tag_selector() {
        let mut element = el("button");
        element.classes = vec!["ab".to_string()];
        element.text = Some("Sign up".to_string());

        assert_eq!(best_reference(&element), "button:has-text(\"Sign up\")");
    }

    #[test]
    fn positional_fallback_is_one_indexed() {
        let mut element = el("li");
        element.parent_tag = Some("ul".to_string());
        element.sibling_index = Some(2);

        assert_eq!(best_reference(&element), "ul > li:nth-child(3)");
    }

    #[test]
    fn unreferenceable_element_yields_empty_sentinel() {
        let mut element = el("div");
        element.text = Some("   ".to_string());

        assert_eq!(best_reference(&element), "");
    }

    #[test]
    fn css_escape_leaves_plain_identifiers_alone() {
        assert_eq!(css_escape("nav-primary_2"), "nav-primary_2");
        assert_eq!(css_escape("a.b c"), "a\\.b\\ c");
    }
}
