pub mod recency;
pub mod slug;
pub mod storage;

pub use recency::{RECENT_WINDOW, Timestamped, was_added_recently};
pub use storage::MediaKind;
