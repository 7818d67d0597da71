//! Incremental (scroll-driven) row loading.
//!
//! The loader owns the materialized row set. It grows by one page whenever
//! the viewport reaches the last known row, never past the corpus cap, and
//! republishes a fresh [`RecordView`] each time so observers can detect the
//! change by pointer identity (`Arc::ptr_eq`) instead of comparing rows.
//!
//! Fetching is split in two steps, [`IncrementalLoader::request_next`] and
//! [`IncrementalLoader::apply_page`], so an asynchronous backend can run the
//! fetch in between. A response whose offset no longer matches the
//! materialized length, or that was requested before the last publish, is
//! stale and dropped. A fetch that fails is handed back with
//! [`IncrementalLoader::abandon`] so the next scroll can retry it.

use std::sync::Arc;

use pagegrid_core::Row;

use crate::source::RecordSource;

/// What the presentation knows about the visible window when it scrolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    /// Index of the bottom-most visible row.
    pub bottom_row: usize,
    /// Rows the grid currently knows about.
    pub total_rows: usize,
}

impl ViewportState {
    pub fn new(bottom_row: usize, total_rows: usize) -> Self {
        Self { bottom_row, total_rows }
    }

    /// True when the last known row is on screen.
    pub fn at_end(&self) -> bool {
        self.bottom_row >= self.total_rows.saturating_sub(1)
    }
}

/// A pending page fetch, tagged with the view generation it was issued
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub count: usize,
    pub generation: u64,
}

/// One level of grouping over the published rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroup {
    /// Field this level groups by.
    pub field: String,
    /// Display text of the shared value.
    pub key: String,
    /// Row indices (into the view) belonging to this group, in row order.
    pub rows: Vec<usize>,
    /// Sub-groups for the next group-by field, if any.
    pub children: Vec<RowGroup>,
}

/// Immutable snapshot of the materialized rows plus their grouping.
#[derive(Debug, Clone)]
pub struct RecordView {
    generation: u64,
    rows: Vec<Arc<Row>>,
    group_by: Vec<String>,
    groups: Vec<RowGroup>,
}

impl RecordView {
    fn build(generation: u64, rows: Vec<Arc<Row>>, group_by: &[String]) -> Self {
        let all: Vec<usize> = (0..rows.len()).collect();
        let groups = group_rows(&rows, &all, group_by);
        Self {
            generation,
            rows,
            group_by: group_by.to_vec(),
            groups,
        }
    }

    /// Monotonic publish counter; each republish gets a new one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index).map(|r| r.as_ref())
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().map(|r| r.as_ref())
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn groups(&self) -> &[RowGroup] {
        &self.groups
    }
}

/// Group `indices` by the first field in `fields`, recursing for the rest.
/// Groups appear in order of first occurrence.
fn group_rows(rows: &[Arc<Row>], indices: &[usize], fields: &[String]) -> Vec<RowGroup> {
    let Some((field, rest)) = fields.split_first() else {
        return Vec::new();
    };

    let mut groups: Vec<RowGroup> = Vec::new();
    for &i in indices {
        let key = rows[i].get(field).map(|v| v.display()).unwrap_or_default();
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.rows.push(i),
            None => groups.push(RowGroup {
                field: field.clone(),
                key,
                rows: vec![i],
                children: Vec::new(),
            }),
        }
    }
    for group in &mut groups {
        group.children = group_rows(rows, &group.rows, rest);
    }
    groups
}

/// Owns the materialized rows and decides when to fetch more.
pub struct IncrementalLoader<S: RecordSource> {
    source: S,
    page_size: usize,
    max_records: usize,
    group_by: Vec<String>,
    materialized: Vec<Arc<Row>>,
    view: Option<Arc<RecordView>>,
    generation: u64,
    in_flight: Option<PageRequest>,
    exhausted: bool,
}

impl<S: RecordSource> IncrementalLoader<S> {
    /// `max_records` is further clipped to what the source can supply.
    pub fn new(source: S, page_size: usize, max_records: usize) -> Self {
        let max_records = max_records.min(source.max_records());
        Self {
            source,
            page_size: page_size.max(1),
            max_records,
            group_by: Vec::new(),
            materialized: Vec::new(),
            view: None,
            generation: 0,
            in_flight: None,
            exhausted: false,
        }
    }

    pub fn with_group_by(mut self, fields: Vec<String>) -> Self {
        self.group_by = fields;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }

    /// Rows materialized so far.
    pub fn len(&self) -> usize {
        self.materialized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materialized.is_empty()
    }

    /// True once no further growth is possible.
    pub fn is_complete(&self) -> bool {
        self.exhausted || self.materialized.len() >= self.max_records
    }

    /// Latest published view, if any.
    pub fn view(&self) -> Option<Arc<RecordView>> {
        self.view.clone()
    }

    /// Start a session: fetch page 0 and publish it. Calling this again
    /// discards the previous session's rows.
    pub fn initialize(&mut self) -> Arc<RecordView> {
        self.materialized.clear();
        self.in_flight = None;
        self.exhausted = false;

        let rows = self.source.fetch(0, self.page_size.min(self.max_records));
        log::debug!("initial page: {} row(s)", rows.len());
        self.materialized = rows.into_iter().map(Arc::new).collect();
        if self.materialized.len() < self.page_size.min(self.max_records) {
            self.exhausted = true;
        }
        self.publish()
    }

    /// Scroll handler. Fetches and appends the next page when the viewport
    /// has reached the last known row; otherwise returns `None` and nothing
    /// changes.
    pub fn on_viewport_advance(&mut self, viewport: ViewportState) -> Option<Arc<RecordView>> {
        let request = self.request_next(viewport)?;
        let rows = self.source.fetch(request.offset, request.count);
        self.apply_page(request, rows)
    }

    /// Decide whether a page is needed. At most one request is outstanding
    /// for a given length; repeated scroll events while it is pending yield
    /// `None`.
    pub fn request_next(&mut self, viewport: ViewportState) -> Option<PageRequest> {
        if !viewport.at_end() || self.is_complete() {
            return None;
        }
        let offset = self.materialized.len();
        if let Some(pending) = self.in_flight {
            if pending.offset == offset {
                return None;
            }
        }
        let count = self.page_size.min(self.max_records - offset);
        let request = PageRequest {
            offset,
            count,
            generation: self.generation,
        };
        self.in_flight = Some(request);
        Some(request)
    }

    /// Append a fetched page and republish. Stale responses (the row set
    /// has moved on since the request was issued) are discarded.
    pub fn apply_page(&mut self, request: PageRequest, rows: Vec<Row>) -> Option<Arc<RecordView>> {
        if self.in_flight == Some(request) {
            self.in_flight = None;
        }

        let len = self.materialized.len();
        if request.offset != len || request.generation != self.generation {
            log::debug!(
                "discarding stale page at offset {} (materialized {}, generation {} vs {})",
                request.offset,
                len,
                request.generation,
                self.generation
            );
            return None;
        }

        if rows.is_empty() {
            // Source ran dry below the configured cap; stop asking.
            log::info!("record source exhausted at {} row(s)", len);
            self.exhausted = true;
            return None;
        }

        let room = self.max_records - len;
        let fetched = rows.len();
        self.materialized.extend(rows.into_iter().take(room).map(Arc::new));
        log::debug!(
            "appended page at offset {}: {} row(s), total {}",
            request.offset,
            fetched.min(room),
            self.materialized.len()
        );
        if self.materialized.len() >= self.max_records {
            log::info!("row cap of {} reached", self.max_records);
        }
        Some(self.publish())
    }

    /// Give up on a request whose fetch failed or was dropped. Clears the
    /// in-flight slot so the next scroll at the same length asks again.
    /// Returns false when `request` is not the outstanding one.
    pub fn abandon(&mut self, request: PageRequest) -> bool {
        if self.in_flight != Some(request) {
            return false;
        }
        log::warn!("page fetch at offset {} abandoned", request.offset);
        self.in_flight = None;
        true
    }

    /// The outstanding request, if any.
    pub fn in_flight(&self) -> Option<PageRequest> {
        self.in_flight
    }

    fn publish(&mut self) -> Arc<RecordView> {
        self.generation += 1;
        let view = Arc::new(RecordView::build(
            self.generation,
            self.materialized.clone(),
            &self.group_by,
        ));
        self.view = Some(view.clone());
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SampleSales, VecSource};

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| {
                Row::new()
                    .with("region", if i % 2 == 0 { "east" } else { "west" })
                    .with("kind", if i < 2 { "a" } else { "b" })
                    .with("n", i as f64)
            })
            .collect()
    }

    #[test]
    fn test_initialize_loads_first_page() {
        let mut loader = IncrementalLoader::new(SampleSales::new(10_000, 0), 40, 10_000);
        let view = loader.initialize();
        assert_eq!(view.len(), 40);
        assert_eq!(loader.len(), 40);
    }

    #[test]
    fn test_no_growth_before_end() {
        let mut loader = IncrementalLoader::new(SampleSales::new(10_000, 0), 40, 10_000);
        loader.initialize();
        assert!(loader.on_viewport_advance(ViewportState::new(20, 40)).is_none());
        assert_eq!(loader.len(), 40);
    }

    #[test]
    fn test_republish_is_new_object() {
        let mut loader = IncrementalLoader::new(SampleSales::new(10_000, 0), 40, 10_000);
        let first = loader.initialize();
        let second = loader.on_viewport_advance(ViewportState::new(39, 40)).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.generation() > first.generation());
        // Earlier snapshot is untouched
        assert_eq!(first.len(), 40);
        assert_eq!(second.len(), 80);
    }

    #[test]
    fn test_short_page_near_cap_publishes_once() {
        let mut loader = IncrementalLoader::new(VecSource::new(rows(50)), 40, 50);
        loader.initialize();
        let view = loader.on_viewport_advance(ViewportState::new(39, 40)).unwrap();
        assert_eq!(view.len(), 50);
        assert!(loader.is_complete());
        assert!(loader.on_viewport_advance(ViewportState::new(49, 50)).is_none());
        assert_eq!(loader.len(), 50);
    }

    #[test]
    fn test_cap_below_source_size() {
        let mut loader = IncrementalLoader::new(SampleSales::new(10_000, 0), 40, 100);
        loader.initialize();
        loader.on_viewport_advance(ViewportState::new(39, 40));
        let last = loader.on_viewport_advance(ViewportState::new(79, 80)).unwrap();
        assert_eq!(last.len(), 100);
        assert!(loader.on_viewport_advance(ViewportState::new(99, 100)).is_none());
    }

    #[test]
    fn test_in_flight_request_deduplicated() {
        let mut loader = IncrementalLoader::new(SampleSales::new(1000, 0), 10, 1000);
        loader.initialize();
        let req = loader.request_next(ViewportState::new(9, 10)).unwrap();
        assert_eq!((req.offset, req.count), (10, 10));
        assert!(loader.request_next(ViewportState::new(9, 10)).is_none());

        let page = loader.source().fetch(req.offset, req.count);
        assert!(loader.apply_page(req, page).is_some());
        assert_eq!(loader.len(), 20);
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut loader = IncrementalLoader::new(SampleSales::new(1000, 0), 10, 1000);
        loader.initialize();
        let stale = PageRequest {
            offset: 0,
            count: 10,
            generation: loader.view().unwrap().generation(),
        };
        let page = loader.source().fetch(0, 10);
        assert!(loader.apply_page(stale, page).is_none());
        assert_eq!(loader.len(), 10);
    }

    #[test]
    fn test_reinitialize_discards_earlier_request() {
        let mut loader = IncrementalLoader::new(SampleSales::new(1000, 0), 10, 1000);
        loader.initialize();
        let req = loader.request_next(ViewportState::new(9, 10)).unwrap();
        loader.initialize();
        assert!(loader.in_flight().is_none());
        let page = loader.source().fetch(req.offset, req.count);
        // Offset matches the fresh session's length, but the request predates it
        assert!(loader.apply_page(req, page).is_none());
        assert_eq!(loader.len(), 10);

        let fresh = loader.request_next(ViewportState::new(9, 10)).unwrap();
        let page = loader.source().fetch(fresh.offset, fresh.count);
        assert_eq!(loader.apply_page(fresh, page).unwrap().len(), 20);
    }

    #[test]
    fn test_abandoned_request_can_be_retried() {
        let mut loader = IncrementalLoader::new(SampleSales::new(1000, 0), 10, 1000);
        loader.initialize();
        let lost = loader.request_next(ViewportState::new(9, 10)).unwrap();
        for _ in 0..3 {
            assert!(loader.request_next(ViewportState::new(9, 10)).is_none());
            assert!(loader.on_viewport_advance(ViewportState::new(9, 10)).is_none());
        }

        assert!(loader.abandon(lost));
        assert!(!loader.abandon(lost));
        let view = loader.on_viewport_advance(ViewportState::new(9, 10)).unwrap();
        assert_eq!(view.len(), 20);
    }

    #[test]
    fn test_abandon_ignores_other_requests() {
        let mut loader = IncrementalLoader::new(SampleSales::new(1000, 0), 10, 1000);
        loader.initialize();
        let req = loader.request_next(ViewportState::new(9, 10)).unwrap();
        let other = PageRequest { offset: 30, ..req };
        assert!(!loader.abandon(other));
        assert_eq!(loader.in_flight(), Some(req));
    }

    #[test]
    fn test_empty_source() {
        let mut loader = IncrementalLoader::new(VecSource::default(), 40, 10_000);
        let view = loader.initialize();
        assert!(view.is_empty());
        assert!(loader.is_complete());
        assert!(loader.on_viewport_advance(ViewportState::new(0, 0)).is_none());
    }

    #[test]
    fn test_nested_grouping() {
        let mut loader = IncrementalLoader::new(VecSource::new(rows(4)), 40, 100)
            .with_group_by(vec!["region".into(), "kind".into()]);
        let view = loader.initialize();
        let groups = view.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "east");
        assert_eq!(groups[0].rows, vec![0, 2]);
        assert_eq!(groups[1].rows, vec![1, 3]);
        let east_kinds: Vec<&str> = groups[0].children.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(east_kinds, vec!["a", "b"]);
        assert_eq!(groups[0].children[0].field, "kind");
    }
}
