//! Store data model.

use serde::{Deserialize, Serialize};
use webscout_core_types::Command;

/// Result of a `(path, seq)` upsert. Total: every call returns exactly
/// one of these.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// First observation of this step.
    New,
    /// The step was seen before and its DOM hash moved.
    Changed,
    /// Identical to the stored observation.
    Same,
}

/// Input for the flow-oriented step log.
#[derive(Clone, Debug, Default)]
pub struct StepInput {
    pub url: String,
    pub screenshot: String,
    pub command_log: Vec<Command>,
}

/// One recorded step of a flow.
#[derive(Clone, Debug)]
pub struct FlowStep {
    pub url: String,
    pub screenshot: String,
    pub command_log: Vec<Command>,
}

/// A flow with its recorded step count.
#[derive(Clone, Debug)]
pub struct FlowSummary {
    pub name: String,
    pub steps: usize,
}
