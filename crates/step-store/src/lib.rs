//! Content-addressed persistence of observed steps and path metadata.
//!
//! Two complementary models share one SQLite database:
//! - `paths`/`steps`: per-(path, seq) records with DOM hashes, giving
//!   NEW / CHANGED / SAME change detection across re-crawls.
//! - `flows`/`flow_steps`: an append-only, content-hashed step log;
//!   repeated identical steps across reruns never duplicate.

pub mod blob;
pub mod errors;
pub mod model;
pub mod schema;
pub mod store;

pub use blob::{BlobStore, PassthroughBlobStore};
pub use errors::StoreError;
pub use model::{FlowStep, FlowSummary, StepInput, UpsertOutcome};
pub use store::{content_hash, StepStore};
