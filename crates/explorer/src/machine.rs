//! The side-effecting exploration loop.

use std::sync::Arc;
use std::time::Instant;

use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;
use webscout_core_types::{
    Command, ElementSnapshot, ExplorationPath, SiteContext, SystemError,
};
use webscout_driver::{Page, WaitPolicy};
use webscout_planner::create_exploration_plan;
use webscout_reducer::{CandidateReducer, Reduction};
use webscout_step_store::{BlobStore, PassthroughBlobStore, StepInput, StepStore};

use crate::config::ExplorerConfig;
use crate::form::{FormValueProvider, StaticFormValues};
use crate::state::{apply, AgentState, Phase, StateEvent};

/// Selector group that detects a page-obscuring dialog.
pub const MODAL_SELECTORS: &str = "[role=\"dialog\"], [aria-modal=\"true\"]";

/// Selector group for the dialog's close control.
pub const CLOSE_BUTTON_SELECTORS: &str = "button[aria-label*=\"close\"], \
button[aria-label*=\"Close\"], [role=\"button\"][aria-label*=\"close\"], \
[role=\"button\"][aria-label*=\"Close\"]";

/// Completion signal emitted when the machine reaches `Done`.
#[derive(Clone, Debug)]
pub struct ExplorationReport {
    pub paths_explored: usize,
    pub commands_executed: usize,
    pub system_errors: Vec<SystemError>,
    /// Final plan with all `explored` flags flipped.
    pub plan: Vec<ExplorationPath>,
    pub total_time_ms: u64,
}

/// Drives one exploration run over a single page handle.
pub struct Explorer {
    page: Box<dyn Page>,
    ctx: SiteContext,
    reducer: CandidateReducer,
    store: Option<Arc<StepStore>>,
    blob: Arc<dyn BlobStore>,
    form_values: Arc<dyn FormValueProvider>,
    config: ExplorerConfig,
    state: AgentState,
    paths_explored: usize,
    commands_executed: usize,
}

impl Explorer {
    pub fn new(
        page: Box<dyn Page>,
        ctx: SiteContext,
        reducer: CandidateReducer,
        config: ExplorerConfig,
    ) -> Self {
        Self {
            page,
            ctx,
            reducer,
            store: None,
            blob: Arc::new(PassthroughBlobStore),
            form_values: Arc::new(StaticFormValues::default()),
            config,
            state: AgentState::default(),
            paths_explored: 0,
            commands_executed: 0,
        }
    }

    pub fn with_store(mut self, store: Arc<StepStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_blob_store(mut self, blob: Arc<dyn BlobStore>) -> Self {
        self.blob = blob;
        self
    }

    pub fn with_form_values(mut self, form_values: Arc<dyn FormValueProvider>) -> Self {
        self.form_values = form_values;
        self
    }

    /// Run the machine to completion. Never fails: every page, oracle
    /// and store error is downgraded to a recoverable condition.
    pub async fn run(&mut self, start_url: &str) -> ExplorationReport {
        let started = Instant::now();

        if let Err(err) = self
            .page
            .goto(start_url, WaitPolicy::NetworkIdle, self.config.navigation_timeout)
            .await
        {
            warn!(url = start_url, error = %err, "start page unreachable, plan will be empty");
        }

        let mut phase = Phase::Plan;
        loop {
            phase = match phase {
                Phase::Plan => self.plan().await,
                Phase::SelectPath => self.select_path().await,
                Phase::Propose => self.propose().await,
                Phase::Execute => self.execute().await,
                Phase::Done => break,
            };
        }

        info!(
            paths = self.paths_explored,
            commands = self.commands_executed,
            errors = self.state.system_errors.len(),
            "exploration complete"
        );
        ExplorationReport {
            paths_explored: self.paths_explored,
            commands_executed: self.commands_executed,
            system_errors: self.state.system_errors.clone(),
            plan: self.state.exploration_plan.clone(),
            total_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Read-only view of the agent state, for inspection after a run.
    pub fn state(&self) -> &AgentState {
        &self.state
    }

    async fn plan(&mut self) -> Phase {
        let plan = match create_exploration_plan(self.page.as_ref(), &self.ctx).await {
            Ok(plan) => plan,
            Err(err) => {
                warn!(error = %err, "plan construction failed");
                Vec::new()
            }
        };
        self.apply(StateEvent::PlanCreated { plan })
    }

    async fn select_path(&mut self) -> Phase {
        let Some(index) = self
            .state
            .exploration_plan
            .iter()
            .position(|path| !path.explored)
        else {
            info!("all paths have been explored");
            return self.apply(StateEvent::PlanExhausted);
        };

        let target = self.state.exploration_plan[index].clone();
        info!(title = %target.title, url = %target.url, "selecting next path to explore");

        // Mark explored before navigating so a failing entry is never
        // retried.
        let phase = self.apply(StateEvent::PathSelected { index });

        match self
            .page
            .goto(&target.url, WaitPolicy::NetworkIdle, self.config.navigation_timeout)
            .await
        {
            Ok(()) => {
                self.paths_explored += 1;
                phase
            }
            Err(err) => {
                warn!(url = %target.url, error = %err, "navigation failed, skipping path");
                self.apply(StateEvent::PathAbandoned {
                    error: SystemError::navigation(format!(
                        "failed to navigate to {}: {err}",
                        target.url
                    )),
                })
            }
        }
    }

    async fn propose(&mut self) -> Phase {
        self.soft_settle().await;
        self.close_obstructions().await;

        let Some(path) = self.state.current_path.clone() else {
            return self.apply(StateEvent::NoCandidates);
        };

        let objective = format!(
            "The user wants to explore the page: {}. The current high-level goal is to explore \"{}\".",
            self.page.url(),
            path.title
        );

        match self
            .reducer
            .propose(self.page.as_ref(), Some(&path.url), &objective)
            .await
        {
            Ok(Reduction { candidates, errors }) => {
                debug!(count = candidates.len(), "candidates proposed");
                self.apply(StateEvent::Proposed {
                    candidates,
                    errors,
                    objective,
                })
            }
            Err(err) => {
                warn!(error = %err, "candidate collection failed");
                self.apply(StateEvent::Proposed {
                    candidates: Vec::new(),
                    errors: vec![SystemError::page(err.to_string())],
                    objective,
                })
            }
        }
    }

    async fn execute(&mut self) -> Phase {
        if self.state.candidates.is_empty() {
            debug!("no candidates left on the current path");
            return self.apply(StateEvent::NoCandidates);
        }

        let candidate = self.state.candidates[0].clone();
        let element = self
            .page
            .element(&candidate.reference)
            .await
            .unwrap_or_default();

        let command = if let Some(element) = element.filter(is_text_input) {
            self.fill_input(&candidate.reference, &element).await
        } else {
            info!(reference = %candidate.reference, "clicking");
            if let Err(err) = self
                .page
                .click(&candidate.reference, self.config.click_timeout)
                .await
            {
                warn!(
                    reference = %candidate.reference,
                    error = %err,
                    "click failed; the element may have gone stale"
                );
            }
            Command::Click {
                reference: candidate.reference.clone(),
            }
        };

        self.soft_settle().await;
        self.commands_executed += 1;

        let errors = self.persist_step(&command).await;
        self.apply(StateEvent::Executed { command, errors })
    }

    async fn fill_input(&self, reference: &str, element: &ElementSnapshot) -> Command {
        let value = self.form_values.value_for(
            element.input_type.as_deref().unwrap_or("text"),
            element.name.as_deref().unwrap_or_default(),
            element.placeholder.as_deref().unwrap_or_default(),
            &self.ctx,
        );
        info!(reference, value = %value, "filling input");

        if let Err(err) = self.page.fill(reference, &value).await {
            warn!(reference, error = %err, "fill failed");
        }
        sleep(self.config.fill_settle).await;
        if let Err(err) = self.page.press(reference, "Enter").await {
            warn!(reference, error = %err, "submit keypress failed");
        }

        Command::Fill {
            reference: reference.to_string(),
            value,
        }
    }

    /// Persist the step both as a content-hashed flow entry and as a
    /// `(path, seq)` observation. Store failures lose the observation,
    /// never the run.
    async fn persist_step(&self, command: &Command) -> Vec<SystemError> {
        let Some(store) = self.store.as_ref() else {
            return Vec::new();
        };
        let Some(path) = self.state.current_path.as_ref() else {
            return Vec::new();
        };

        let mut errors = Vec::new();
        let url = self.page.url();
        let mut log = self.state.command_log.clone();
        log.push(command.clone());

        let screenshot_ref = self.capture_screenshot().await;

        if let Err(err) = store
            .add_step(
                &path.url,
                StepInput {
                    url: url.clone(),
                    screenshot: screenshot_ref.clone(),
                    command_log: log.clone(),
                },
            )
            .await
        {
            warn!(error = %err, "failed to record flow step");
            errors.push(SystemError::store(err.to_string()));
        }

        let dom = self.page.dom_snapshot().await.unwrap_or_default();
        match store
            .upsert_step(&path.url, log.len() as u32, &url, &dom, &screenshot_ref)
            .await
        {
            Ok(outcome) => debug!(outcome = ?outcome, "step observation upserted"),
            Err(err) => {
                warn!(error = %err, "failed to upsert step observation");
                errors.push(SystemError::store(err.to_string()));
            }
        }

        errors
    }

    async fn capture_screenshot(&self) -> String {
        let Some(dir) = self.config.screenshot_dir.as_ref() else {
            return String::new();
        };
        let file = dir.join(format!("step-{}.png", Uuid::new_v4()));
        if let Err(err) = self.page.screenshot(&file).await {
            warn!(error = %err, "screenshot failed");
            return String::new();
        }
        match self.blob.upload(&file).await {
            Ok(reference) => reference,
            Err(err) => {
                warn!(error = %err, "blob upload failed, keeping local path");
                file.display().to_string()
            }
        }
    }

    /// Wait for the page to settle; a timeout here is a soft warning,
    /// not a failure.
    async fn soft_settle(&self) {
        if let Err(err) = self.page.wait_settled(self.config.settle_timeout).await {
            warn!(error = %err, "settle wait timed out, continuing anyway");
        }
    }

    /// If a modal or tour is obscuring the page, try to close it before
    /// proposing candidates.
    async fn close_obstructions(&self) {
        let Ok(Some(_)) = self.page.query_first(MODAL_SELECTORS).await else {
            return;
        };
        let Ok(Some(close)) = self.page.query_first(CLOSE_BUTTON_SELECTORS).await else {
            return;
        };
        info!("closing modal obscuring the page");
        if let Err(err) = self.page.click(&close, self.config.click_timeout).await {
            warn!(error = %err, "modal close failed");
        }
        self.soft_settle().await;
    }

    fn apply(&mut self, event: StateEvent) -> Phase {
        apply(&mut self.state, event, self.config.max_command_log)
    }
}

fn is_text_input(element: &ElementSnapshot) -> bool {
    element.tag.eq_ignore_ascii_case("input")
        && matches!(
            element.input_type.as_deref(),
            Some("text") | Some("search") | Some("email") | Some("password")
        )
}
