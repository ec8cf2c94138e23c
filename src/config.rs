//! Environment-driven application configuration and site context
//! loading.

use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use url::Url;
use webscout_core_types::SiteContext;
use webscout_oracle::HttpOracleConfig;

/// Runtime configuration assembled from `WEBSCOUT_*` environment
/// variables with hardcoded defaults.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub screenshots_dir: PathBuf,
    /// Overrides the reducer's prune threshold when set.
    pub prune_threshold: Option<usize>,
    /// Present when an oracle API key is configured.
    pub oracle: Option<HttpOracleConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let db_path = env::var("WEBSCOUT_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("webscout.sqlite"));
        let screenshots_dir = env::var("WEBSCOUT_SCREENSHOT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("screenshots"));
        let prune_threshold = env::var("WEBSCOUT_PRUNE_THRESHOLD")
            .ok()
            .and_then(|raw| raw.parse().ok());

        let oracle = env::var("WEBSCOUT_ORACLE_API_KEY").ok().map(|api_key| {
            let mut config = HttpOracleConfig::new(api_key);
            if let Ok(endpoint) = env::var("WEBSCOUT_ORACLE_URL") {
                config.endpoint = endpoint;
            }
            if let Ok(model) = env::var("WEBSCOUT_ORACLE_MODEL") {
                config.model = model;
            }
            config
        });

        Self {
            db_path,
            screenshots_dir,
            prune_threshold,
            oracle,
        }
    }
}

/// Load the site context for a URL from `contexts/<domain>.json`,
/// falling back to a generic context when no file exists.
pub fn load_site_context(url: &str) -> SiteContext {
    let domain = Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());

    let context_file = Path::new("contexts").join(format!("{domain}.json"));
    match std::fs::read_to_string(&context_file) {
        Ok(raw) => match serde_json::from_str::<SiteContext>(&raw) {
            Ok(mut ctx) => {
                ctx.domain = domain.clone();
                info!(domain = %domain, description = %ctx.description, "loaded site context from file");
                ctx
            }
            Err(err) => {
                warn!(path = %context_file.display(), error = %err, "unreadable context file, using fallback");
                SiteContext::fallback(domain)
            }
        },
        Err(_) => {
            debug!(domain = %domain, "no context file found, using generic fallback");
            SiteContext::fallback(domain)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_fallback_kicks_in_for_unknown_domains() {
        let ctx = load_site_context("https://nowhere.invalid/start");
        assert_eq!(ctx.domain, "nowhere.invalid");
        assert!(!ctx.primary_features.is_empty());
    }

    #[test]
    fn camel_case_context_files_deserialize() {
        let raw = r#"{
            "description": "A payments platform",
            "primaryFeatures": ["Payment links", "Invoices"],
            "suggestedSearchTerms": ["refund"],
            "suggestedActions": ["Create payment link"]
        }"#;
        let ctx: SiteContext = serde_json::from_str(raw).expect("context");
        assert_eq!(ctx.primary_features.len(), 2);
        assert_eq!(ctx.suggested_search_terms, vec!["refund"]);
    }
}
