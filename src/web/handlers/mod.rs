//! API handlers.

pub mod auth;
pub mod entries;
pub mod feeds;
pub mod folders;
pub mod opml_export;
pub mod subscribe_job_states;

pub use auth::*;
pub use entries::*;
pub use feeds::*;
pub use folders::*;
