use std::sync::Arc;

use webscout_core_types::{Command, SiteContext, SystemErrorKind};
use webscout_driver::fake::{
    anchor_with_id, button, text_input, FakeBrowser, FakePageSpec, FakeSite, PageAction,
};
use webscout_driver::Browser;
use webscout_explorer::{
    Explorer, ExplorerConfig, CLOSE_BUTTON_SELECTORS, MODAL_SELECTORS,
};
use webscout_reducer::{CandidateReducer, ReducerConfig};
use webscout_step_store::StepStore;

const START: &str = "https://example.com/";
const ALPHA: &str = "https://example.com/alpha";
const BETA: &str = "https://example.com/beta";

fn home() -> FakePageSpec {
    FakePageSpec::new("Home")
        .with_nav(anchor_with_id("nav-alpha", "Alpha", "/alpha"))
        .with_nav(anchor_with_id("nav-beta", "Beta", "/beta"))
}

fn ctx() -> SiteContext {
    SiteContext::fallback("example.com")
}

async fn run_explorer(site: FakeSite) -> (FakeBrowser, Arc<StepStore>, webscout_explorer::ExplorationReport) {
    let browser = FakeBrowser::new(site);
    let page = browser.new_page().await.expect("page");
    let store = Arc::new(StepStore::in_memory().await.expect("store"));

    let mut explorer = Explorer::new(
        page,
        ctx(),
        CandidateReducer::new(ReducerConfig::default()),
        ExplorerConfig {
            fill_settle: std::time::Duration::from_millis(0),
            ..ExplorerConfig::default()
        },
    )
    .with_store(Arc::clone(&store));

    let report = explorer.run(START).await;
    (browser, store, report)
}

#[tokio::test]
async fn empty_paths_and_out_of_scope_links_reach_done_without_steps() {
    // Alpha offers nothing to act on; Beta only links back to Alpha,
    // which is outside Beta's scope. The run must visit both, execute
    // nothing, and finish.
    let site = FakeSite::new()
        .with_page(START, home())
        .with_page(ALPHA, FakePageSpec::new("Alpha"))
        .with_page(
            BETA,
            FakePageSpec::new("Beta")
                .with_interactive(anchor_with_id("back-link", "Back to Alpha", "/alpha")),
        );

    let (_browser, store, report) = run_explorer(site).await;

    assert_eq!(report.commands_executed, 0);
    assert_eq!(report.paths_explored, 2);
    assert!(report.plan.iter().all(|path| path.explored));
    assert!(store.all_flows().await.expect("flows").is_empty());
}

#[tokio::test]
async fn a_click_is_executed_and_persisted() {
    let next = "https://example.com/alpha/next";
    let site = FakeSite::new()
        .with_page(START, FakePageSpec::new("Home").with_nav(anchor_with_id(
            "nav-alpha",
            "Alpha",
            "/alpha",
        )))
        .with_page(
            ALPHA,
            FakePageSpec::new("Alpha")
                .with_interactive(button("go", "Go deeper"))
                .with_click_navigation("#go", next),
        )
        .with_page(next, FakePageSpec::new("Next"));

    let (_browser, store, report) = run_explorer(site).await;

    assert_eq!(report.commands_executed, 1);
    assert!(report.system_errors.is_empty());

    let steps = store.flow_steps(ALPHA).await.expect("steps");
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].url, next);
    assert_eq!(
        steps[0].command_log,
        vec![Command::Click {
            reference: "#go".to_string()
        }]
    );
}

#[tokio::test]
async fn text_inputs_are_filled_and_submitted_with_enter() {
    let results = "https://example.com/alpha/results";
    let site = FakeSite::new()
        .with_page(START, FakePageSpec::new("Home").with_nav(anchor_with_id(
            "nav-alpha",
            "Alpha",
            "/alpha",
        )))
        .with_page(
            ALPHA,
            FakePageSpec::new("Alpha")
                .with_interactive(text_input("search-box", "search", "q", "Search..."))
                .with_enter_navigation("#search-box", results),
        )
        .with_page(results, FakePageSpec::new("Results"));

    let (browser, store, report) = run_explorer(site).await;

    assert_eq!(report.commands_executed, 1);
    let steps = store.flow_steps(ALPHA).await.expect("steps");
    assert_eq!(
        steps[0].command_log,
        vec![Command::Fill {
            reference: "#search-box".to_string(),
            value: "test input".to_string(),
        }]
    );

    let actions = browser.last_page().expect("page").actions();
    assert!(actions.contains(&PageAction::Fill(
        "#search-box".to_string(),
        "test input".to_string()
    )));
    assert!(actions.contains(&PageAction::Press(
        "#search-box".to_string(),
        "Enter".to_string()
    )));
}

#[tokio::test]
async fn unreachable_paths_are_abandoned_and_the_run_continues() {
    let site = FakeSite::new()
        .with_page(START, home())
        .with_page(BETA, FakePageSpec::new("Beta"))
        .with_failing_url(ALPHA);

    let (_browser, _store, report) = run_explorer(site).await;

    assert!(report.plan.iter().all(|path| path.explored));
    assert_eq!(report.paths_explored, 1);
    assert_eq!(report.system_errors.len(), 1);
    assert_eq!(
        report.system_errors[0].kind,
        SystemErrorKind::NavigationError
    );
}

#[tokio::test]
async fn modals_are_closed_before_candidates_are_proposed() {
    let site = FakeSite::new()
        .with_page(START, FakePageSpec::new("Home").with_nav(anchor_with_id(
            "nav-alpha",
            "Alpha",
            "/alpha",
        )))
        .with_page(
            ALPHA,
            FakePageSpec::new("Alpha")
                .with_selector_hit(MODAL_SELECTORS, "[role=\"dialog\"]#welcome")
                .with_selector_hit(CLOSE_BUTTON_SELECTORS, "#close-welcome"),
        );

    let (browser, _store, report) = run_explorer(site).await;

    assert_eq!(report.commands_executed, 0);
    let actions = browser.last_page().expect("page").actions();
    assert!(actions.contains(&PageAction::Click("#close-welcome".to_string())));
}

#[tokio::test]
async fn the_loop_guard_bounds_a_path_that_never_runs_dry() {
    // Buttons that never navigate keep reappearing as candidates, so
    // the path never runs dry; the command-log guard must force the
    // path switch.
    let site = FakeSite::new()
        .with_page(START, FakePageSpec::new("Home").with_nav(anchor_with_id(
            "nav-alpha",
            "Alpha",
            "/alpha",
        )))
        .with_page(
            ALPHA,
            FakePageSpec::new("Alpha")
                .with_interactive(button("load-more", "Load more"))
                .with_interactive(button("refresh", "Refresh")),
        );

    let (_browser, _store, report) = run_explorer(site).await;

    assert_eq!(report.commands_executed, 21);
    assert!(report.plan.iter().all(|path| path.explored));
}

#[tokio::test]
async fn screenshots_are_captured_when_a_directory_is_configured() {
    let dir = tempfile::tempdir().expect("tempdir");
    let next = "https://example.com/alpha/next";
    let site = FakeSite::new()
        .with_page(START, FakePageSpec::new("Home").with_nav(anchor_with_id(
            "nav-alpha",
            "Alpha",
            "/alpha",
        )))
        .with_page(
            ALPHA,
            FakePageSpec::new("Alpha")
                .with_interactive(button("go", "Go"))
                .with_click_navigation("#go", next),
        )
        .with_page(next, FakePageSpec::new("Next"));

    let browser = FakeBrowser::new(site);
    let page = browser.new_page().await.expect("page");
    let store = Arc::new(StepStore::in_memory().await.expect("store"));

    let mut explorer = Explorer::new(
        page,
        ctx(),
        CandidateReducer::new(ReducerConfig::default()),
        ExplorerConfig {
            screenshot_dir: Some(dir.path().to_path_buf()),
            fill_settle: std::time::Duration::from_millis(0),
            ..ExplorerConfig::default()
        },
    )
    .with_store(Arc::clone(&store));

    let report = explorer.run(START).await;
    assert_eq!(report.commands_executed, 1);

    let steps = store.flow_steps(ALPHA).await.expect("steps");
    assert!(!steps[0].screenshot.is_empty());
    assert!(std::path::Path::new(&steps[0].screenshot).exists());
}
