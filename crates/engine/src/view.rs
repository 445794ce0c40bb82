//! Search and sort views over a record snapshot.
//!
//! Rows live in two spaces: data rows (record ids, 0..N-1) and view rows
//! (positions after sorting). Searching hides data rows without moving them;
//! sorting reorders them without changing which are shown.

use datagrid_core::Record;
use log::debug;

use crate::error::EngineError;
use crate::field_index::{build_field_index, FieldIndex, FieldScope, RecordId};
use crate::sort::{MultiSort, SortCriterion};

// =============================================================================
// RowView
// =============================================================================

/// Display order plus a visibility flag per data row.
#[derive(Debug, Clone, Default)]
pub struct RowView {
    /// view row -> data row
    order: Vec<usize>,
    /// indexed by data row
    shown: Vec<bool>,
}

impl RowView {
    /// Data order, every row shown.
    pub fn new(row_count: usize) -> Self {
        Self {
            order: (0..row_count).collect(),
            shown: vec![true; row_count],
        }
    }

    pub fn row_count(&self) -> usize {
        self.order.len()
    }

    pub fn visible_count(&self) -> usize {
        self.shown.iter().filter(|&&v| v).count()
    }

    pub fn row_order(&self) -> &[usize] {
        &self.order
    }

    /// Shown data rows, in view order.
    pub fn visible_data_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied().filter(move |&d| self.shown.get(d).copied().unwrap_or(false))
    }

    /// Replace the order with `permutation` (view row -> data row).
    pub fn apply_sort(&mut self, permutation: Vec<usize>) {
        debug_assert_eq!(permutation.len(), self.order.len());
        self.order = permutation;
    }

    pub fn clear_sort(&mut self) {
        self.order = (0..self.order.len()).collect();
    }

    /// Replace visibility; `mask` is indexed by data row.
    pub fn apply_filter(&mut self, mask: Vec<bool>) {
        debug_assert_eq!(mask.len(), self.order.len());
        self.shown = mask;
    }

    pub fn clear_filter(&mut self) {
        self.shown = vec![true; self.order.len()];
    }

    /// Grow or shrink to `row_count` rows. New rows are shown and go last.
    pub fn resize(&mut self, row_count: usize) {
        let old = self.order.len();
        if row_count > old {
            self.order.extend(old..row_count);
        } else {
            self.order.retain(|&d| d < row_count);
        }
        self.shown.resize(row_count, true);
    }
}

// =============================================================================
// Search and sort helpers
// =============================================================================

/// New row order for `records`, sorted by `sort`.
///
/// Stable relative to the current view order: records that compare equal keep
/// the order the user currently sees.
pub fn sort_permutation(records: &[Record], row_view: &RowView, sort: &MultiSort) -> Vec<usize> {
    let mut order = row_view.row_order().to_vec();
    order.sort_by(|&a, &b| sort.compare(&records[a], &records[b]));
    order
}

/// Visibility mask and per-record scores for a query.
///
/// A record is visible when its best field in `scope` scores at least
/// `threshold`. Records with no indexed field in scope are hidden.
pub fn search_mask(
    index: &FieldIndex,
    query: &str,
    scope: &FieldScope,
    threshold: f64,
) -> (Vec<bool>, Vec<Option<f64>>) {
    let query_set = index.query_set(query);
    let scores: Vec<Option<f64>> = (0..index.len())
        .map(|id| index.score(id, &query_set, scope).map(|m| m.score))
        .collect();
    let mask = scores
        .iter()
        .map(|s| s.is_some_and(|s| s >= threshold))
        .collect();
    (mask, scores)
}

// =============================================================================
// GridView: records + index + row view
// =============================================================================

/// Active search of a [`GridView`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub scope: FieldScope,
    pub threshold: f64,
}

/// A record snapshot with its field index and current search/sort view.
///
/// This is the host-side composition: the index filters rows, the
/// comparator orders them, the row view maps between the two spaces.
#[derive(Debug, Clone)]
pub struct GridView {
    records: Vec<Record>,
    index: FieldIndex,
    rows: RowView,
    search: Option<SearchState>,
    sort: MultiSort,
    scores: Vec<Option<f64>>,
}

impl GridView {
    /// Index `records` with n-gram size `n`. No search, no sort.
    pub fn new(records: Vec<Record>, n: usize) -> Self {
        let index = build_field_index(&records, n);
        let rows = RowView::new(records.len());
        let scores = vec![None; records.len()];
        Self {
            records,
            index,
            rows,
            search: None,
            sort: MultiSort::default(),
            scores,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn index(&self) -> &FieldIndex {
        &self.index
    }

    pub fn row_view(&self) -> &RowView {
        &self.rows
    }

    pub fn search(&self) -> Option<&SearchState> {
        self.search.as_ref()
    }

    pub fn sort_criteria(&self) -> &[SortCriterion] {
        self.sort.criteria()
    }

    /// Score of a record against the active query (None without a query, or
    /// when the record has no indexed field in scope).
    pub fn score(&self, id: RecordId) -> Option<f64> {
        self.scores.get(id).copied().flatten()
    }

    /// Filter rows by `query`. A blank query clears the search.
    pub fn set_query(&mut self, query: &str, scope: FieldScope, threshold: f64) {
        if query.trim().is_empty() {
            self.clear_query();
            return;
        }
        self.search = Some(SearchState { query: query.to_string(), scope, threshold });
        self.refresh_filter();
    }

    pub fn clear_query(&mut self) {
        self.search = None;
        self.refresh_filter();
    }

    /// Order rows by `criteria`. An empty list restores data order.
    pub fn set_sort(&mut self, criteria: Vec<SortCriterion>) {
        if criteria.is_empty() {
            self.clear_sort();
            return;
        }
        self.sort = MultiSort::new(criteria);
        let order = sort_permutation(&self.records, &self.rows, &self.sort);
        self.rows.apply_sort(order);
        debug!("view sorted by {} criteria", self.sort.criteria().len());
    }

    pub fn clear_sort(&mut self) {
        self.sort = MultiSort::default();
        self.rows.clear_sort();
    }

    /// Replace one record, re-index it and re-run the active search.
    ///
    /// The row keeps its view position; call `set_sort` again to re-order.
    pub fn update_record(&mut self, id: RecordId, record: Record) -> Result<(), EngineError> {
        let slot = self.records.get_mut(id).ok_or(EngineError::UnknownRecord(id))?;
        self.index.update(id, &record)?;
        *slot = record;
        self.refresh_filter();
        Ok(())
    }

    /// Append a record. It lands at the end of the view order.
    pub fn push_record(&mut self, record: Record) -> RecordId {
        let id = self.index.push(&record);
        self.records.push(record);
        self.rows.resize(self.records.len());
        self.refresh_filter();
        id
    }

    /// Visible record ids in view order.
    pub fn visible_ids(&self) -> Vec<RecordId> {
        self.rows.visible_data_rows().collect()
    }

    /// Visible records in view order.
    pub fn visible_records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.rows.visible_data_rows().map(move |d| &self.records[d])
    }

    fn refresh_filter(&mut self) {
        match &self.search {
            Some(state) => {
                let (mask, scores) = search_mask(&self.index, &state.query, &state.scope, state.threshold);
                self.scores = scores;
                self.rows.apply_filter(mask);
                debug!(
                    "view filtered by {:?}: {}/{} rows visible",
                    state.query,
                    self.rows.visible_count(),
                    self.rows.row_count()
                );
            }
            None => {
                self.scores = vec![None; self.records.len()];
                self.rows.clear_filter();
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
