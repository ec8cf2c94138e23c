//! Deterministic command log replay.
//!
//! Reconstructs browser state by re-applying a recorded command log
//! against a fresh page, up to a target depth. Independent of the live
//! exploration loop; shares the `Command` data type and the store's log
//! format.
//!
//! Session ownership rule: the caller owns any session a replay
//! function returns. A session that does not escape the function (the
//! one `replay_to_previous_state` creates internally) is closed before
//! the function returns, and no session is created at all when there is
//! nothing to replay.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use webscout_core_types::Command;
use webscout_driver::{Browser, DriverError, Page, WaitPolicy};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay failed: {0}")]
    Driver(#[from] DriverError),
}

/// A replayed page handed back to the caller, positioned at the URL the
/// log reached. The caller must close it.
pub struct ReplaySession {
    pub url: String,
    pub page: Box<dyn Page>,
}

/// Result of stepping back without keeping a session open.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PreviousState {
    pub url: String,
    pub depth: usize,
}

#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Wait budget for each referenced element to become visible.
    pub reference_timeout: Duration,
    pub navigation_timeout: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            reference_timeout: Duration::from_secs(10),
            navigation_timeout: Duration::from_secs(15),
        }
    }
}

pub struct ReplayEngine {
    config: ReplayConfig,
}

impl Default for ReplayEngine {
    fn default() -> Self {
        Self::new(ReplayConfig::default())
    }
}

impl ReplayEngine {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    /// Open a fresh page, navigate to `start_url` and apply
    /// `commands[0..target_depth]` in order. Returns the session at the
    /// final URL; the caller owns and must close it.
    pub async fn replay_to_depth(
        &self,
        browser: &dyn Browser,
        start_url: &str,
        commands: &[Command],
        target_depth: usize,
    ) -> Result<ReplaySession, ReplayError> {
        let page = browser.new_page().await?;

        match self
            .drive(page.as_ref(), start_url, commands, target_depth)
            .await
        {
            Ok(url) => Ok(ReplaySession { url, page }),
            Err(err) => {
                // The session does not escape on failure; close it here.
                if let Err(close_err) = page.close().await {
                    warn!(error = %close_err, "failed to close page after replay error");
                }
                Err(err)
            }
        }
    }

    /// Reconstruct the state one step before `current_depth`. Creates
    /// no session when there is nothing to replay, and closes the one
    /// it creates otherwise.
    pub async fn replay_to_previous_state(
        &self,
        browser: &dyn Browser,
        start_url: &str,
        commands: &[Command],
        current_depth: usize,
    ) -> Result<PreviousState, ReplayError> {
        if current_depth == 0 {
            return Ok(PreviousState {
                url: start_url.to_string(),
                depth: 0,
            });
        }

        let target_depth = current_depth - 1;
        let session = self
            .replay_to_depth(browser, start_url, commands, target_depth)
            .await?;
        let url = session.url;
        if let Err(err) = session.page.close().await {
            warn!(error = %err, "failed to close replay page");
        }

        Ok(PreviousState {
            url,
            depth: target_depth,
        })
    }

    async fn drive(
        &self,
        page: &dyn Page,
        start_url: &str,
        commands: &[Command],
        target_depth: usize,
    ) -> Result<String, ReplayError> {
        page.goto(
            start_url,
            WaitPolicy::DomContentLoaded,
            self.config.navigation_timeout,
        )
        .await?;

        let to_replay = &commands[..target_depth.min(commands.len())];
        for (index, command) in to_replay.iter().enumerate() {
            debug!(
                step = index + 1,
                total = to_replay.len(),
                kind = command.kind(),
                "replaying command"
            );
            self.step(page, command).await?;
        }

        let url = page.url();
        info!(depth = to_replay.len(), url = %url, "replay complete");
        Ok(url)
    }

    async fn step(&self, page: &dyn Page, command: &Command) -> Result<(), ReplayError> {
        let timeout = self.config.reference_timeout;
        match command {
            Command::Click { reference } => {
                page.wait_for_visible(reference, timeout).await?;
                page.click(reference, timeout).await?;
                page.wait_settled(timeout).await?;
            }
            Command::Fill { reference, value } => {
                page.wait_for_visible(reference, timeout).await?;
                page.fill(reference, value).await?;
            }
            Command::Select { reference, value } => {
                page.wait_for_visible(reference, timeout).await?;
                page.select_option(reference, value).await?;
            }
            Command::Press { reference, key } => {
                page.wait_for_visible(reference, timeout).await?;
                page.press(reference, key).await?;
            }
            Command::Goto { url } => {
                page.goto(url, WaitPolicy::DomContentLoaded, self.config.navigation_timeout)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webscout_driver::fake::{
        anchor_with_id, button, text_input, FakeBrowser, FakePageSpec, FakeSite, PageAction,
    };

    const START: &str = "https://example.com/";

    fn site() -> FakeSite {
        FakeSite::new()
            .with_page(
                START,
                FakePageSpec::new("Home")
                    .with_interactive(button("open-menu", "Menu"))
                    .with_interactive(anchor_with_id("go-docs", "Docs", "/docs"))
                    .with_click_navigation("#go-docs", "https://example.com/docs"),
            )
            .with_page(
                "https://example.com/docs",
                FakePageSpec::new("Docs")
                    .with_interactive(text_input("search", "search", "q", "Search docs"))
                    .with_enter_navigation("#search", "https://example.com/docs/results"),
            )
            .with_page(
                "https://example.com/docs/results",
                FakePageSpec::new("Results"),
            )
    }

    fn log() -> Vec<Command> {
        vec![
            Command::Click {
                reference: "#go-docs".to_string(),
            },
            Command::Fill {
                reference: "#search".to_string(),
                value: "webhooks".to_string(),
            },
            Command::Press {
                reference: "#search".to_string(),
                key: "Enter".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn full_replay_reaches_the_final_url() {
        let browser = FakeBrowser::new(site());
        let engine = ReplayEngine::default();

        let session = engine
            .replay_to_depth(&browser, START, &log(), 3)
            .await
            .expect("replay");
        assert_eq!(session.url, "https://example.com/docs/results");

        let actions = browser.last_page().expect("page").actions();
        assert!(actions.contains(&PageAction::Click("#go-docs".to_string())));
        assert!(actions.contains(&PageAction::Fill(
            "#search".to_string(),
            "webhooks".to_string()
        )));

        session.page.close().await.expect("close");
    }

    #[tokio::test]
    async fn partial_replay_stops_at_the_target_depth() {
        let browser = FakeBrowser::new(site());
        let engine = ReplayEngine::default();

        let session = engine
            .replay_to_depth(&browser, START, &log(), 1)
            .await
            .expect("replay");
        assert_eq!(session.url, "https://example.com/docs");
        session.page.close().await.expect("close");
    }

    #[tokio::test]
    async fn depth_beyond_the_log_replays_everything() {
        let browser = FakeBrowser::new(site());
        let engine = ReplayEngine::default();

        let session = engine
            .replay_to_depth(&browser, START, &log(), 99)
            .await
            .expect("replay");
        assert_eq!(session.url, "https://example.com/docs/results");
        session.page.close().await.expect("close");
    }

    #[tokio::test]
    async fn previous_state_at_depth_zero_creates_no_session() {
        let browser = FakeBrowser::new(site());
        let engine = ReplayEngine::default();

        let state = engine
            .replay_to_previous_state(&browser, START, &log(), 0)
            .await
            .expect("previous state");

        assert_eq!(
            state,
            PreviousState {
                url: START.to_string(),
                depth: 0,
            }
        );
        assert_eq!(browser.pages_opened(), 0);
    }

    #[tokio::test]
    async fn previous_state_steps_back_one_and_closes_its_session() {
        let browser = FakeBrowser::new(site());
        let engine = ReplayEngine::default();

        let state = engine
            .replay_to_previous_state(&browser, START, &log(), 2)
            .await
            .expect("previous state");

        assert_eq!(state.depth, 1);
        assert_eq!(state.url, "https://example.com/docs");
        assert!(browser.last_page().expect("page").is_closed());
    }

    #[tokio::test]
    async fn goto_commands_navigate_directly() {
        let browser = FakeBrowser::new(site());
        let engine = ReplayEngine::default();

        let commands = vec![Command::Goto {
            url: "https://example.com/docs".to_string(),
        }];
        let session = engine
            .replay_to_depth(&browser, START, &commands, 1)
            .await
            .expect("replay");
        assert_eq!(session.url, "https://example.com/docs");
        session.page.close().await.expect("close");
    }

    #[tokio::test]
    async fn a_missing_reference_closes_the_session_and_errors() {
        let browser = FakeBrowser::new(site());
        let engine = ReplayEngine::default();

        let commands = vec![Command::Click {
            reference: "#does-not-exist".to_string(),
        }];
        let result = engine.replay_to_depth(&browser, START, &commands, 1).await;

        assert!(result.is_err());
        assert!(browser.last_page().expect("page").is_closed());
    }
}
