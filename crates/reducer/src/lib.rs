//! Candidate reduction.
//!
//! Produces the ordered list of actionable references for the current
//! step: collect interactive elements, synthesize references, scope
//! them to the active exploration path, dedupe, and above a threshold
//! delegate ranking to the scoring oracle. Oracle failure never fails
//! the step; the reducer falls back to a truncated raw list and records
//! the error.

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;
use webscout_core_types::{Candidate, SystemError};
use webscout_driver::{DriverResult, Page};
use webscout_locator::best_reference;
use webscout_oracle::ScoringOracle;

/// Tuning knobs for the reduction pipeline.
#[derive(Clone, Debug)]
pub struct ReducerConfig {
    /// Above this many deduplicated candidates, delegate to the oracle.
    pub prune_threshold: usize,
    /// Cap applied to oracle output and to the fallback list.
    pub max_results: usize,
    /// Page text excerpt budget handed to the oracle, in characters.
    pub page_text_budget: usize,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            prune_threshold: 20,
            max_results: 8,
            page_text_budget: 4000,
        }
    }
}

/// The outcome of one proposal cycle.
#[derive(Debug, Default)]
pub struct Reduction {
    pub candidates: Vec<Candidate>,
    pub errors: Vec<SystemError>,
}

pub struct CandidateReducer {
    oracle: Option<Arc<dyn ScoringOracle>>,
    config: ReducerConfig,
}

impl CandidateReducer {
    pub fn new(config: ReducerConfig) -> Self {
        Self {
            oracle: None,
            config,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn ScoringOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Collect and reduce the actionable candidates on the current page.
    ///
    /// `scope` is the active exploration path's URL; linked elements
    /// resolving outside it are dropped. Elements without an href
    /// always pass the scope filter.
    pub async fn propose(
        &self,
        page: &dyn Page,
        scope: Option<&str>,
        objective: &str,
    ) -> DriverResult<Reduction> {
        let elements = page.interactive_elements().await?;
        let page_url = Url::parse(&page.url()).ok();
        let scope_url = scope.and_then(|raw| Url::parse(raw).ok());

        let mut candidates: Vec<Candidate> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for element in &elements {
            let reference = best_reference(element);
            if reference.is_empty() {
                continue;
            }

            if let (Some(scope_url), Some(href)) = (scope_url.as_ref(), element.href.as_deref()) {
                let resolved = match page_url.as_ref() {
                    Some(base) => base.join(href).ok(),
                    None => Url::parse(href).ok(),
                };
                match resolved {
                    Some(absolute) if scope_allows(&absolute, scope_url) => {}
                    Some(absolute) => {
                        debug!(reference = %reference, url = %absolute, "candidate out of path scope");
                        continue;
                    }
                    None => continue,
                }
            }

            if seen.insert(reference.clone()) {
                candidates.push(Candidate {
                    reference,
                    text: element.text.clone(),
                });
            }
        }

        match self.oracle.as_ref() {
            Some(oracle) if candidates.len() > self.config.prune_threshold => {
                debug!(
                    count = candidates.len(),
                    threshold = self.config.prune_threshold,
                    "too many candidates, delegating to oracle"
                );
                Ok(self
                    .prune(Arc::clone(oracle), page, candidates, objective)
                    .await)
            }
            _ => Ok(Reduction {
                candidates,
                errors: Vec::new(),
            }),
        }
    }

    async fn prune(
        &self,
        oracle: Arc<dyn ScoringOracle>,
        page: &dyn Page,
        candidates: Vec<Candidate>,
        objective: &str,
    ) -> Reduction {
        let page_text = match page.body_text(self.config.page_text_budget).await {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "page text unavailable for oracle, sending empty excerpt");
                String::new()
            }
        };

        match oracle.score(&candidates, &page_text, objective).await {
            Ok(indices) if !indices.is_empty() => {
                let kept: Vec<Candidate> = indices
                    .into_iter()
                    .filter_map(|index| candidates.get(index).cloned())
                    .take(self.config.max_results)
                    .collect();
                Reduction {
                    candidates: kept,
                    errors: Vec::new(),
                }
            }
            Ok(_) => self.fallback(candidates, "oracle returned an empty ranking"),
            Err(err) => self.fallback(candidates, &err.to_string()),
        }
    }

    fn fallback(&self, mut candidates: Vec<Candidate>, message: &str) -> Reduction {
        warn!(message, "oracle pruning failed, falling back to raw order");
        candidates.truncate(self.config.max_results);
        Reduction {
            candidates,
            errors: vec![SystemError::oracle(message)],
        }
    }
}

/// Whether an absolute URL stays within the active path scope: either
/// it extends the scope URL as a plain string prefix, or it points at
/// the same path component.
///
/// Deliberately literal (pinned by tests): queries and fragments
/// participate in the prefix comparison, the path comparison ignores
/// both, and trailing slashes are not normalized.
pub fn scope_allows(absolute: &Url, scope: &Url) -> bool {
    absolute.as_str().starts_with(scope.as_str()) || absolute.path() == scope.path()
}
