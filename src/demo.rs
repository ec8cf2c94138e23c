//! Built-in demo site.
//!
//! A small fake web application used by the `--demo` flag and the
//! integration tests, exercising the interesting corners of the
//! pipeline: prioritized navigation, a search input, a modal, and an
//! out-of-scope link.

use webscout_driver::fake::{
    anchor_with_id, button, text_input, FakePageSpec, FakeSite,
};
use webscout_explorer::{CLOSE_BUTTON_SELECTORS, MODAL_SELECTORS};

pub const DEMO_START: &str = "https://demo.webscout.test/";
pub const DEMO_DOMAIN: &str = "demo.webscout.test";

pub fn demo_site() -> FakeSite {
    FakeSite::new()
        .with_page(
            DEMO_START,
            FakePageSpec::new("WebScout Demo")
                .with_nav(anchor_with_id("nav-dashboard", "Dashboard", "/dashboard"))
                .with_nav(anchor_with_id("nav-payments", "Payments", "/payments"))
                .with_nav(anchor_with_id("nav-docs", "Docs", "/docs"))
                .with_body_text("Welcome to the WebScout demo application."),
        )
        .with_page(
            "https://demo.webscout.test/dashboard",
            FakePageSpec::new("Dashboard")
                .with_selector_hit(MODAL_SELECTORS, "[role=\"dialog\"]#tour")
                .with_selector_hit(CLOSE_BUTTON_SELECTORS, "#close-tour")
                .with_interactive(anchor_with_id(
                    "view-reports",
                    "View reports",
                    "/dashboard/reports",
                ))
                .with_click_navigation(
                    "#view-reports",
                    "https://demo.webscout.test/dashboard/reports",
                )
                .with_body_text("Your account at a glance."),
        )
        .with_page(
            "https://demo.webscout.test/dashboard/reports",
            FakePageSpec::new("Reports").with_body_text("Monthly reports."),
        )
        .with_page(
            "https://demo.webscout.test/payments",
            FakePageSpec::new("Payments")
                .with_interactive(text_input("payment-search", "search", "q", "Search payments"))
                .with_enter_navigation(
                    "#payment-search",
                    "https://demo.webscout.test/payments/results",
                )
                .with_interactive(anchor_with_id(
                    "external-blog",
                    "Read the blog",
                    "https://blog.webscout.test/post",
                ))
                .with_body_text("Create and track payments."),
        )
        .with_page(
            "https://demo.webscout.test/payments/results",
            FakePageSpec::new("Search results").with_body_text("Matching payments."),
        )
        .with_page(
            "https://demo.webscout.test/docs",
            FakePageSpec::new("Docs")
                .with_interactive(anchor_with_id(
                    "docs-webhooks",
                    "Webhooks guide",
                    "/docs/webhooks",
                ))
                .with_interactive(button("expand-toc", "Expand"))
                .with_click_navigation(
                    "#docs-webhooks",
                    "https://demo.webscout.test/docs/webhooks",
                )
                .with_body_text("Product documentation."),
        )
        .with_page(
            "https://demo.webscout.test/docs/webhooks",
            FakePageSpec::new("Webhooks").with_body_text("Webhook integration guide."),
        )
}
