//! Exploration plan construction.
//!
//! Scans a page's navigation landmarks and turns them into a
//! prioritized, URL-deduplicated list of exploration targets. The plan
//! is built once per run; entries are never removed, only flipped to
//! explored.

use tracing::{debug, info};
use url::Url;
use webscout_core_types::{ElementSnapshot, ExplorationPath, SiteContext, UNMATCHED_PRIORITY};
use webscout_driver::{DriverResult, Page};
use webscout_locator::best_reference;

/// Build the exploration plan for the page currently loaded.
pub async fn create_exploration_plan(
    page: &dyn Page,
    ctx: &SiteContext,
) -> DriverResult<Vec<ExplorationPath>> {
    info!(url = %page.url(), "creating exploration plan");
    let elements = page.navigation_elements().await?;
    let base = Url::parse(&page.url()).ok();

    let plan = build_plan(&elements, base.as_ref(), ctx);
    info!(paths = plan.len(), "exploration plan created");
    if !plan.is_empty() {
        let top: Vec<String> = plan
            .iter()
            .take(3)
            .map(|p| format!("{} (P{})", p.title, p.priority))
            .collect();
        debug!(top = ?top, "highest priority paths");
    }
    Ok(plan)
}

/// Pure plan construction over pre-gathered navigation elements.
///
/// Elements without an href or visible title are skipped, as are
/// fragment-only and `javascript:` hrefs. Deduplication is by resolved
/// URL with last-write-wins; the final order is ascending priority with
/// discovery order preserved among ties.
pub fn build_plan(
    elements: &[ElementSnapshot],
    base: Option<&Url>,
    ctx: &SiteContext,
) -> Vec<ExplorationPath> {
    let mut plan: Vec<ExplorationPath> = Vec::new();
    let mut seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for element in elements {
        let Some(href) = element.href.as_deref() else {
            continue;
        };
        let title = element
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let Some(title) = title else {
            continue;
        };
        if href == "#" || href.starts_with("javascript:") {
            continue;
        }

        let Some(full_url) = resolve_url(href, base) else {
            debug!(href, "skipping nav element with unresolvable href");
            continue;
        };

        let reference = best_reference(element);
        if reference.is_empty() {
            continue;
        }

        let path = ExplorationPath {
            url: full_url,
            title: title.to_string(),
            reference,
            priority: feature_priority(title, &ctx.primary_features),
            explored: false,
        };

        match seen.get(&path.url) {
            Some(&index) => plan[index] = path,
            None => {
                seen.insert(path.url.clone(), plan.len());
                plan.push(path);
            }
        }
    }

    plan.sort_by_key(|path| path.priority);
    plan
}

/// Priority is the index of the first primary feature whose first word
/// appears (case-insensitively) in the element title.
fn feature_priority(title: &str, primary_features: &[String]) -> u32 {
    let title_lower = title.to_lowercase();
    primary_features
        .iter()
        .position(|feature| {
            feature
                .split_whitespace()
                .next()
                .map(|word| title_lower.contains(&word.to_lowercase()))
                .unwrap_or(false)
        })
        .map(|index| index as u32)
        .unwrap_or(UNMATCHED_PRIORITY)
}

fn resolve_url(href: &str, base: Option<&Url>) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webscout_driver::fake::{anchor, anchor_with_id};

    fn ctx(features: &[&str]) -> SiteContext {
        SiteContext {
            domain: "example.com".to_string(),
            primary_features: features.iter().map(|f| f.to_string()).collect(),
            ..SiteContext::default()
        }
    }

    fn base() -> Url {
        Url::parse("https://example.com/home").expect("base url")
    }

    #[test]
    fn relative_hrefs_resolve_against_the_page_url() {
        let elements = vec![anchor_with_id("nav-pay", "Payments", "/payments")];
        let plan = build_plan(&elements, Some(&base()), &ctx(&[]));

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].url, "https://example.com/payments");
        assert_eq!(plan[0].reference, "#nav-pay");
        assert!(!plan[0].explored);
    }

    #[test]
    fn priority_comes_from_first_matching_feature_first_word() {
        let elements = vec![
            anchor_with_id("a", "Billing overview", "/billing"),
            anchor_with_id("b", "Payment links", "/links"),
            anchor_with_id("c", "About us", "/about"),
        ];
        let plan = build_plan(
            &elements,
            Some(&base()),
            &ctx(&["Payment links", "Billing dashboard"]),
        );

        let by_title = |title: &str| {
            plan.iter()
                .find(|p| p.title == title)
                .map(|p| p.priority)
                .expect("path")
        };
        assert_eq!(by_title("Payment links"), 0);
        assert_eq!(by_title("Billing overview"), 1);
        assert_eq!(by_title("About us"), UNMATCHED_PRIORITY);
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        let elements = vec![anchor_with_id("a", "PAYMENTS & more", "/pay")];
        let plan = build_plan(&elements, Some(&base()), &ctx(&["payment gateway"]));
        assert_eq!(plan[0].priority, 0);
    }

    #[test]
    fn duplicate_urls_keep_one_entry_last_write_wins() {
        let elements = vec![
            anchor_with_id("first", "Docs", "/docs"),
            anchor_with_id("second", "Documentation", "/docs"),
        ];
        let plan = build_plan(&elements, Some(&base()), &ctx(&[]));

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].title, "Documentation");
        assert_eq!(plan[0].reference, "#second");
    }

    #[test]
    fn sort_is_stable_for_equal_priorities() {
        let elements = vec![
            anchor_with_id("z", "Zebra", "/z"),
            anchor_with_id("m", "Mango", "/m"),
            anchor_with_id("a", "Apple", "/a"),
        ];
        let plan = build_plan(&elements, Some(&base()), &ctx(&[]));

        let titles: Vec<&str> = plan.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Zebra", "Mango", "Apple"]);
    }

    #[test]
    fn junk_hrefs_and_untitled_links_are_skipped() {
        let elements = vec![
            anchor("", "/untitled"),
            anchor("Skip me", "#"),
            anchor("Script", "javascript:void(0)"),
            {
                let mut el = ElementSnapshot::new("a");
                el.text = Some("No href".to_string());
                el
            },
        ];
        let plan = build_plan(&elements, Some(&base()), &ctx(&[]));
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn async_surface_reads_nav_elements_from_the_page() {
        use webscout_driver::fake::{FakeBrowser, FakePageSpec, FakeSite};
        use webscout_driver::{Browser, WaitPolicy};

        let site = FakeSite::new().with_page(
            "https://example.com/",
            FakePageSpec::new("Home")
                .with_nav(anchor_with_id("nav-docs", "Docs", "/docs"))
                .with_nav(anchor_with_id("nav-pricing", "Pricing", "/pricing")),
        );
        let browser = FakeBrowser::new(site);
        let page = browser.new_page().await.expect("page");
        page.goto(
            "https://example.com/",
            WaitPolicy::NetworkIdle,
            std::time::Duration::from_secs(5),
        )
        .await
        .expect("goto");

        let plan = create_exploration_plan(page.as_ref(), &ctx(&["Pricing"]))
            .await
            .expect("plan");
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].title, "Pricing");
        assert_eq!(plan[0].priority, 0);
    }
}
