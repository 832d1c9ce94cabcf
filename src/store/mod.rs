//! Record store
//!
//! Per-model record collections with validated writes, filter/sort/paginate
//! queries, bulk delete and per-model statistics. Every write resolves its
//! model through the schema registry first.

mod errors;
mod filters;
mod query;
mod record;
mod sorter;
#[allow(clippy::module_inception)]
mod store;

pub use errors::{StoreError, StoreResult};
pub use filters::{values_equal, RecordFilter};
pub use query::{QueryOptions, QueryResult, SortOrder};
pub use record::{ModelRecord, ModelStats, StaleRecord};
pub use sorter::RecordSorter;
pub use store::RecordStore;
