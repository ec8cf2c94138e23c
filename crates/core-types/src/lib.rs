//! Shared data model for the WebScout exploration pipeline.
//!
//! Everything that crosses a crate boundary lives here: the recorded
//! [`Command`] log, action [`Candidate`]s, the exploration plan entries,
//! the read-only element projection handed over by the browser driver,
//! and the accumulated recoverable [`SystemError`]s.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One recorded browser action.
///
/// The log is append-only; entries are immutable once written. The wire
/// format tags each entry with a `command` field so stored logs stay
/// readable across versions.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Click { reference: String },
    Fill { reference: String, value: String },
    Select { reference: String, value: String },
    Press { reference: String, key: String },
    Goto { url: String },
}

impl Command {
    /// The element reference this command targets, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Command::Click { reference }
            | Command::Fill { reference, .. }
            | Command::Select { reference, .. }
            | Command::Press { reference, .. } => Some(reference),
            Command::Goto { .. } => None,
        }
    }

    /// Short tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Click { .. } => "click",
            Command::Fill { .. } => "fill",
            Command::Select { .. } => "select",
            Command::Press { .. } => "press",
            Command::Goto { .. } => "goto",
        }
    }
}

/// Serialize a command log for storage.
pub fn serialize_command_log(log: &[Command]) -> String {
    serde_json::to_string(log).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a stored command log, skipping entries that no longer decode.
///
/// A log written by a newer version may carry command tags this build
/// does not know; those entries are dropped with a warning instead of
/// failing the whole replay.
pub fn parse_command_log(raw: &str) -> Vec<Command> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(err) => {
            warn!(error = %err, "command log is not a JSON array, treating as empty");
            return Vec::new();
        }
    };

    let mut commands = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<Command>(value.clone()) {
            Ok(command) => commands.push(command),
            Err(err) => {
                let tag = value
                    .get("command")
                    .and_then(|v| v.as_str())
                    .unwrap_or("<missing>");
                warn!(tag, error = %err, "skipping unrecognized command log entry");
            }
        }
    }
    commands
}

/// An actionable element proposed for the next step. Rebuilt on every
/// proposal cycle, never persisted.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Candidate {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            text: None,
        }
    }

    pub fn with_text(reference: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            text: Some(text.into()),
        }
    }
}

/// One entry of the exploration plan. Created once by the planner;
/// only the `explored` flag mutates afterwards, monotonically
/// false -> true.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExplorationPath {
    pub url: String,
    pub title: String,
    pub reference: String,
    /// Lower is higher priority.
    pub priority: u32,
    pub explored: bool,
}

/// Priority assigned when no primary-feature keyword matches.
pub const UNMATCHED_PRIORITY: u32 = 99;

/// Read-only projection of a live DOM element, captured by the browser
/// driver at query time. Reference synthesis, planning and candidate
/// reduction all work from this snapshot instead of touching the page
/// again.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub test_id: Option<String>,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Visible text content, untrimmed.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub has_click_handler: bool,
    /// Index among the parent's children, when known.
    #[serde(default)]
    pub sibling_index: Option<usize>,
    #[serde(default)]
    pub parent_tag: Option<String>,
}

impl ElementSnapshot {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }
}

/// Pre-gathered knowledge about the site under exploration, loaded from
/// a per-domain context file when one exists. The camelCase aliases
/// keep existing context files readable.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SiteContext {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "primaryFeatures")]
    pub primary_features: Vec<String>,
    #[serde(default, alias = "suggestedSearchTerms")]
    pub suggested_search_terms: Vec<String>,
    #[serde(default, alias = "suggestedActions")]
    pub suggested_actions: Vec<String>,
}

impl SiteContext {
    /// Generic fallback used when no context file exists for a domain.
    pub fn fallback(domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            description: format!("{domain} website"),
            domain,
            primary_features: vec![
                "Navigation".to_string(),
                "Search".to_string(),
                "User actions".to_string(),
            ],
            suggested_search_terms: vec![
                "search".to_string(),
                "find".to_string(),
                "view".to_string(),
            ],
            suggested_actions: vec![
                "Browse".to_string(),
                "Search".to_string(),
                "Navigate".to_string(),
            ],
        }
    }
}

/// Classification of a recoverable failure accumulated during a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemErrorKind {
    OracleError,
    StoreError,
    NavigationError,
    PageError,
}

/// A recoverable failure. Nothing carrying this type aborts a run; the
/// entries are appended to the run's error log and reported at the end.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SystemError {
    pub kind: SystemErrorKind,
    pub message: String,
}

impl SystemError {
    pub fn oracle(message: impl Into<String>) -> Self {
        Self {
            kind: SystemErrorKind::OracleError,
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self {
            kind: SystemErrorKind::StoreError,
            message: message.into(),
        }
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Self {
            kind: SystemErrorKind::NavigationError,
            message: message.into(),
        }
    }

    pub fn page(message: impl Into<String>) -> Self {
        Self {
            kind: SystemErrorKind::PageError,
            message: message.into(),
        }
    }
}
