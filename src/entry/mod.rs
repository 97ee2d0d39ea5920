//! Feed entries and their per-user read state.

pub mod markup;
pub mod normalize;
pub mod repository;
pub mod state;
pub mod types;

pub use markup::{sanitize_html, IMAGE_PLACEHOLDER};
pub use normalize::{normalize_entry, NormalizedEntry};
pub use repository::{EntryRepository, DEFAULT_ENTRY_LIMIT};
pub use state::EntryStateRepository;
pub use types::{Entry, EntryState, NewEntry, UserEntry};
