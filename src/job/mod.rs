//! Background jobs and their persisted state.

pub mod opml;
pub mod repository;
pub mod types;
pub mod worker;

pub use opml::build_opml;
pub use repository::{OpmlExportJobStateRepository, SubscribeJobStateRepository};
pub use types::{JobState, OpmlExportJobState, SubscribeJobState};
pub use worker::JobRunner;
