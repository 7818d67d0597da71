// End-to-end behavior of the grid session over the built-in sources.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use pagegrid_config::{Locale, Settings};
use pagegrid_core::{CellRange, Row};
use pagegrid_engine::columns::{compile, merge, presets, ColumnGroupSpec};
use pagegrid_engine::events::{EventCollector, GridEvent};
use pagegrid_engine::notify::{NoticeKind, NoticeLog};
use pagegrid_engine::schedule::RecordingControl;
use pagegrid_engine::{
    FundSample, GridSession, IncrementalLoader, RecordSource, SampleSales, SaveOutcome, Validator, VecSource,
    ViewportState,
};

fn english() -> Settings {
    Settings { locale: Locale::En, ..Settings::default() }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn test_first_scroll_to_end_loads_second_page() {
    let mut loader = IncrementalLoader::new(SampleSales::new(10_000, 0), 40, 10_000);
    loader.initialize();
    assert_eq!(loader.len(), 40);

    let view = loader.on_viewport_advance(ViewportState::new(39, 40)).unwrap();
    assert_eq!(loader.len(), 80);
    assert_eq!(view.len(), 80);
}

#[test]
fn test_growth_stops_at_cap() {
    let mut loader = IncrementalLoader::new(SampleSales::new(100, 0), 40, 10_000);
    loader.initialize();
    while loader.on_viewport_advance(ViewportState::new(loader.len() - 1, loader.len())).is_some() {}
    assert_eq!(loader.len(), 100);
    assert!(loader.is_complete());
    for bottom in [0, 50, 99, 500] {
        assert!(loader.on_viewport_advance(ViewportState::new(bottom, 100)).is_none());
    }
    assert_eq!(loader.len(), 100);
}

#[test]
fn test_rows_stable_across_pages() {
    let source = SampleSales::new(10_000, 7);
    let whole = source.fetch(0, 80);
    let second = source.fetch(40, 40);
    assert_eq!(&whole[40..], &second[..]);
}

#[test]
fn test_async_fetch_roundtrip_through_session() {
    let mut session = GridSession::sales(&english(), 0).unwrap();
    session.load_initial();
    let request = session.request_next(ViewportState::new(39, 40)).unwrap();
    assert!(session.request_next(ViewportState::new(39, 40)).is_none());

    let rows = SampleSales::new(10_000, 0).fetch(request.offset, request.count);
    let view = session.apply_page(request, rows).unwrap();
    assert_eq!(view.len(), 80);
}

#[test]
fn test_failed_fetch_is_retried_on_next_scroll() {
    let mut session = GridSession::sales(&english(), 0).unwrap();
    session.load_initial();
    let lost = session.request_next(ViewportState::new(39, 40)).unwrap();
    assert!(session.on_scroll(ViewportState::new(39, 40)).is_none());

    assert!(session.abandon_page(lost));
    let view = session.on_scroll(ViewportState::new(39, 40)).unwrap();
    assert_eq!(view.len(), 80);
    // A late answer to the abandoned request is stale
    let late = SampleSales::new(10_000, 0).fetch(lost.offset, lost.count);
    assert!(session.apply_page(lost, late).is_none());
    assert_eq!(session.view().unwrap().len(), 80);
}

// ---------------------------------------------------------------------------
// Validation and errors
// ---------------------------------------------------------------------------

fn rows_with_bad_fourth() -> Vec<Row> {
    let good = |i: usize| {
        Row::new()
            .with("product", format!("商品{}", i))
            .with("sales", 500.0)
            .with("rating", "A")
    };
    vec![
        good(0),
        good(1),
        good(2),
        Row::new().with("product", "").with("sales", 50.0).with("rating", "D"),
    ]
}

#[test]
fn test_bad_row_yields_three_errors() {
    let refs = rows_with_bad_fourth();
    let errors = Validator::new(
        Default::default(),
        (&pagegrid_config::Messages::for_locale(Locale::En)).into(),
    )
    .validate(refs.iter());

    let got: Vec<(usize, usize, &str)> =
        errors.iter().map(|e| (e.row, e.col, e.message.as_str())).collect();
    assert_eq!(
        got,
        vec![
            (3, 0, "product name missing"),
            (3, 4, "value too low"),
            (3, 6, "rating too low"),
        ]
    );
}

#[test]
fn test_save_flow_and_events() {
    let mut session =
        GridSession::new(VecSource::new(rows_with_bad_fourth()), &english(), &presets::sales_layout())
            .unwrap();
    let events = Rc::new(RefCell::new(EventCollector::new()));
    session.subscribe(EventCollector::callback(&events));

    let first = session.load_initial();
    let mut notices = NoticeLog::new();
    assert_eq!(session.save(&mut notices), SaveOutcome::Rejected { errors: 3 });
    assert_eq!(notices.len(), 1);
    assert_eq!(notices.notices()[0].kind, NoticeKind::Error);

    let index = session.errors();
    assert_eq!(index.generation(), events.borrow().errors_replaced().last().unwrap().generation);
    assert!(Arc::ptr_eq(&first, &session.view().unwrap()));

    let kinds: Vec<&str> = events
        .borrow()
        .events()
        .iter()
        .map(|e| match e {
            GridEvent::RowsPublished(_) => "rows",
            GridEvent::ErrorsReplaced(_) => "errors",
            GridEvent::ColumnsCompiled(_) => "columns",
            GridEvent::VisibilityChanged(_) => "visibility",
        })
        .collect();
    assert_eq!(kinds, vec!["errors", "rows", "errors"]);
}

#[test]
fn test_error_jump_lands_on_cell() {
    let mut session =
        GridSession::new(VecSource::new(rows_with_bad_fourth()), &english(), &presets::sales_layout())
            .unwrap();
    session.load_initial();
    session.validate();
    let error = session.next_error().unwrap();
    assert_eq!((error.row, error.col), (3, 0));

    let mut grid = RecordingControl::new(4, 7);
    session.tick(&mut grid);
    assert_eq!(grid.selected, vec![CellRange::single(3, 0)]);
    assert_eq!(grid.focus_count, 1);
}

#[test]
fn test_jump_to_row_gone_after_reload_is_noop() {
    let mut session =
        GridSession::new(VecSource::new(rows_with_bad_fourth()), &english(), &presets::sales_layout())
            .unwrap();
    session.load_initial();
    assert!(session.jump_to(3, 6));
    // The grid shrank before the deferred jump ran
    let mut grid = RecordingControl::new(2, 7);
    assert_eq!(session.tick(&mut grid), 1);
    assert!(grid.selected.is_empty());
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

#[test]
fn test_single_group_header() {
    let specs = vec![ColumnGroupSpec::group(
        "A",
        vec![ColumnGroupSpec::leaf("A1", "a1"), ColumnGroupSpec::leaf("A2", "a2")],
    )];
    let layout = compile(&specs).unwrap();
    let bindings: Vec<&str> = layout.columns.iter().map(|c| c.binding.as_str()).collect();
    assert_eq!(bindings, vec!["a1", "a2"]);
    assert_eq!(layout.headers.row_labels(0), vec!["A", "A"]);
    assert_eq!(layout.headers.row_labels(1), vec!["A1", "A2"]);

    let merged = merge(&layout.headers, &layout.columns);
    assert_eq!(merged.grid.row_labels(1), vec!["A1", "A2"]);
    assert_eq!(merged.region_at(0, 1).unwrap().range, CellRange::new(0, 0, 0, 1));
    assert!(merged.region_at(1, 0).unwrap().range.is_single());
}

#[test]
fn test_fund_grid_hide_performance() {
    let source: Box<dyn RecordSource> = Box::new(FundSample);
    let mut session = GridSession::new(source, &english(), &presets::fund_layout()).unwrap();
    session.load_initial();
    let path = session.find_column_node("Performance").unwrap();
    assert!(session.toggle_column_visibility(&path, false));

    let hidden: Vec<&str> = session
        .layout()
        .columns
        .iter()
        .filter(|c| !c.visible)
        .map(|c| c.binding.as_str())
        .collect();
    assert_eq!(hidden, vec!["perf.m1", "perf.m6", "perf.ytd", "perf.m12"]);
    assert_eq!(session.cell_text(0, 0).as_deref(), Some("Aventium"));
}
