//! Per-record, per-field n-gram index
//!
//! Built from a record snapshot. Entries are keyed by the record's position
//! in that snapshot (`RecordId`) and the field name; the index holds only
//! derived n-gram sets, never record data.
//!
//! The index does not watch its source. When a record's indexed values
//! change, call `update()` for that record (or rebuild).

use std::cmp::Reverse;

use datagrid_core::Record;
use log::debug;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::error::EngineError;
use crate::ngram::{ngram_set, similarity, NgramSet};

/// Position of a record in the snapshot an index was built from.
pub type RecordId = usize;

/// Which fields a search consults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldScope {
    /// Every indexed field.
    #[default]
    All,
    /// Only the named fields.
    Only(Vec<String>),
}

impl FieldScope {
    /// `All` when `keys` is empty, otherwise `Only(keys)`.
    pub fn from_keys(keys: Vec<String>) -> Self {
        if keys.is_empty() {
            FieldScope::All
        } else {
            FieldScope::Only(keys)
        }
    }

    pub fn includes(&self, field: &str) -> bool {
        match self {
            FieldScope::All => true,
            FieldScope::Only(keys) => keys.iter().any(|k| k == field),
        }
    }
}

/// Best-scoring field of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch {
    pub field: String,
    pub score: f64,
}

/// One search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub record: RecordId,
    pub field: String,
    pub score: f64,
}

/// Field name -> n-gram set, for one record.
pub type FieldNgrams = FxHashMap<String, NgramSet>;

#[derive(Debug, Clone)]
pub struct FieldIndex {
    ngram_size: usize,
    entries: Vec<FieldNgrams>,
}

/// Index every text or numeric field of `record`. Other kinds are skipped.
fn index_record(record: &Record, n: usize) -> FieldNgrams {
    record
        .fields()
        .filter_map(|(key, value)| {
            value
                .search_text()
                .map(|text| (key.to_string(), ngram_set(&text, n)))
        })
        .collect()
}

/// Build the field index for a record snapshot.
pub fn build_field_index(records: &[Record], n: usize) -> FieldIndex {
    let entries: Vec<FieldNgrams> = records.iter().map(|r| index_record(r, n)).collect();
    debug!(
        "field index built: {} records, {} field entries, n={}",
        entries.len(),
        entries.iter().map(|e| e.len()).sum::<usize>(),
        n
    );
    FieldIndex { ngram_size: n, entries }
}

impl FieldIndex {
    /// Empty index for records shingled with size `n`.
    pub fn new(n: usize) -> Self {
        Self { ngram_size: n, entries: Vec::new() }
    }

    pub fn ngram_size(&self) -> usize {
        self.ngram_size
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All indexed fields of a record.
    pub fn fields(&self, record: RecordId) -> Option<&FieldNgrams> {
        self.entries.get(record)
    }

    /// N-gram set of one field, if the record exists and the field was indexable.
    pub fn get(&self, record: RecordId, field: &str) -> Option<&NgramSet> {
        self.entries.get(record)?.get(field)
    }

    /// Re-derive one record's entry after its values changed.
    pub fn update(&mut self, id: RecordId, record: &Record) -> Result<(), EngineError> {
        let n = self.ngram_size;
        let slot = self.entries.get_mut(id).ok_or(EngineError::UnknownRecord(id))?;
        *slot = index_record(record, n);
        Ok(())
    }

    /// Index a record appended to the snapshot. Returns its id.
    pub fn push(&mut self, record: &Record) -> RecordId {
        self.entries.push(index_record(record, self.ngram_size));
        self.entries.len() - 1
    }

    /// Drop entries for records past `len` (snapshot shrank).
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// N-gram set of a query, using this index's n.
    pub fn query_set(&self, query: &str) -> NgramSet {
        ngram_set(query, self.ngram_size)
    }

    /// Best field of `record` against a query set, restricted to `scope`.
    ///
    /// Returns `None` when the record has no indexed field in scope. Equal
    /// scores resolve to the alphabetically first field.
    pub fn score(&self, record: RecordId, query: &NgramSet, scope: &FieldScope) -> Option<FieldMatch> {
        let fields = self.entries.get(record)?;
        let mut best: Option<FieldMatch> = None;

        for (field, grams) in fields.iter().filter(|(f, _)| scope.includes(f)) {
            let score = similarity(query, grams);
            let better = match &best {
                None => true,
                Some(b) => score > b.score || (score == b.score && field.as_str() < b.field.as_str()),
            };
            if better {
                best = Some(FieldMatch { field: field.clone(), score });
            }
        }

        best
    }

    /// Records whose best field scores at least `threshold`.
    ///
    /// Ranked by score descending, then record id ascending.
    pub fn search(&self, query: &str, scope: &FieldScope, threshold: f64) -> Vec<SearchHit> {
        let query_set = self.query_set(query);

        let mut hits: Vec<SearchHit> = (0..self.entries.len())
            .filter_map(|id| {
                let m = self.score(id, &query_set, scope)?;
                (m.score >= threshold).then(|| SearchHit { record: id, field: m.field, score: m.score })
            })
            .collect();

        hits.sort_by_key(|h| (Reverse(OrderedFloat(h.score)), h.record));
        debug!("search {:?}: {} hits (threshold {})", query, hits.len(), threshold);
        hits
    }
}

/// Keep records whose `field` is similar enough to `query`.
///
/// Reference filtering without an index: query n-grams are computed once,
/// each record's field is shingled on the fly. Records lacking the field, or
/// whose value is neither text nor number, are dropped.
pub fn filter_by_similarity<'a>(
    records: &'a [Record],
    field: &str,
    query: &str,
    n: usize,
    threshold: f64,
) -> Vec<&'a Record> {
    let query_set = ngram_set(query, n);

    records
        .iter()
        .filter(|record| {
            let Some(text) = record.get(field).and_then(|v| v.search_text()) else {
                return false;
            };
            similarity(&query_set, &ngram_set(&text, n)) >= threshold
        })
        .collect()
}
