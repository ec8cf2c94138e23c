//! Contextual form value provisioning.
//!
//! Derives a plausible value for a text input from its type, name and
//! placeholder, leaning on the site context for search terms.

use chrono::Utc;
use rand::Rng;
use tracing::debug;
use webscout_core_types::SiteContext;
use webscout_explorer::FormValueProvider;

#[derive(Clone, Copy, Debug, Default)]
pub struct ContextualFormValues;

impl FormValueProvider for ContextualFormValues {
    fn value_for(
        &self,
        input_type: &str,
        name: &str,
        placeholder: &str,
        ctx: &SiteContext,
    ) -> String {
        let name = name.to_lowercase();
        let placeholder = placeholder.to_lowercase();

        if input_type == "email" || name.contains("email") {
            return "test@example.com".to_string();
        }

        if input_type == "password" || name.contains("password") {
            return "TestPassword123!".to_string();
        }

        if input_type == "search" || name.contains("search") || placeholder.contains("search") {
            if !ctx.suggested_search_terms.is_empty() {
                let pool = ctx.suggested_search_terms.len().min(3);
                let pick = rand::thread_rng().gen_range(0..pool);
                let term = ctx.suggested_search_terms[pick].clone();
                debug!(term = %term, "using contextual search term");
                return term;
            }
            return "test search".to_string();
        }

        if name.contains("phone") || name.contains("mobile") || placeholder.contains("phone") {
            return "+919876543210".to_string();
        }

        if name.contains("name") || placeholder.contains("name") {
            if name.contains("first") {
                return "Test".to_string();
            }
            if name.contains("last") {
                return "User".to_string();
            }
            return "Test User".to_string();
        }

        if name.contains("amount") || name.contains("price") || placeholder.contains("amount") {
            return "100".to_string();
        }

        if input_type == "date" || name.contains("date") {
            return Utc::now().date_naive().to_string();
        }

        "test input".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SiteContext {
        SiteContext {
            suggested_search_terms: vec![
                "refunds".to_string(),
                "invoices".to_string(),
                "payouts".to_string(),
                "never picked".to_string(),
            ],
            ..SiteContext::default()
        }
    }

    fn value(input_type: &str, name: &str, placeholder: &str) -> String {
        ContextualFormValues.value_for(input_type, name, placeholder, &ctx())
    }

    #[test]
    fn email_and_password_fields_get_fixed_credentials() {
        assert_eq!(value("email", "", ""), "test@example.com");
        assert_eq!(value("text", "user_email", ""), "test@example.com");
        assert_eq!(value("password", "", ""), "TestPassword123!");
    }

    #[test]
    fn search_fields_draw_from_the_first_three_context_terms() {
        for _ in 0..20 {
            let term = value("search", "", "");
            assert!(
                ["refunds", "invoices", "payouts"].contains(&term.as_str()),
                "unexpected term {term}"
            );
        }
    }

    #[test]
    fn search_without_context_uses_the_generic_term() {
        let empty = SiteContext::default();
        let term = ContextualFormValues.value_for("search", "", "", &empty);
        assert_eq!(term, "test search");
    }

    #[test]
    fn name_fields_split_first_and_last() {
        assert_eq!(value("text", "first_name", ""), "Test");
        assert_eq!(value("text", "last_name", ""), "User");
        assert_eq!(value("text", "", "Your name"), "Test User");
    }

    #[test]
    fn amount_and_phone_fields_get_plausible_values() {
        assert_eq!(value("text", "amount", ""), "100");
        assert_eq!(value("text", "phone_number", ""), "+919876543210");
    }

    #[test]
    fn anything_else_falls_back_to_test_input() {
        assert_eq!(value("text", "notes", ""), "test input");
    }
}
