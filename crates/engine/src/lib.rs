//! `datagrid-engine` - search and ordering over grid records.
//!
//! Pure engine crate: receives a record snapshot, returns n-gram scores,
//! orderings and row views. No IO.

pub mod error;
pub mod field_index;
pub mod ngram;
pub mod sort;
pub mod view;

pub use error::EngineError;
pub use field_index::{build_field_index, filter_by_similarity, FieldIndex, FieldScope, RecordId, SearchHit};
pub use ngram::{ngram_set, shingles, similarity, NgramSet, DEFAULT_NGRAM_SIZE};
pub use sort::{build_comparator, sort_records, MultiSort, SortCriterion, SortDirection};
pub use view::{GridView, RowView};
