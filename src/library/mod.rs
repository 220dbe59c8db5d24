mod aggregate;
mod item;
mod merge;
mod parse;
mod session;
mod store;

pub use aggregate::{Aggregation, MIN_SELECTION, top_n};
pub use item::{Item, ItemId, ManualEntry, rank_order, sanitize_weight};
pub use merge::{MergeError, MergeMap, resolve_root};
pub use parse::{parse_catalog, parse_catalog_str};
pub use session::Session;
pub use store::{JsonFileStore, MemoryStore, SessionStore};
