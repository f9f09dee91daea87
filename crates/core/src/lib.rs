// crates/core/src/lib.rs
pub mod config;
pub mod context;
pub mod dedup;
pub mod error;
pub mod history;
pub mod paths;
pub mod sessions;

pub use config::{Config, DatabaseConfig, LoggingConfig, TimelineConfig};
pub use context::RequestContext;
pub use dedup::{DedupPolicy, IngestOutcome};
pub use error::*;
pub use history::{HistoryPlan, Window};
pub use sessions::{reconstruct_sessions, SessionConfig};
