//! Event types for grid change notifications.
//!
//! Every event carries the generation of the state it describes, so a
//! subscriber that receives events late can tell whether the state it
//! reads back is newer than the event.

use std::cell::RefCell;
use std::rc::Rc;

/// Events emitted by `GridSession`.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// A new row view was published by the loader.
    RowsPublished(RowsPublishedEvent),

    /// A validation pass replaced the error index.
    ErrorsReplaced(ErrorsReplacedEvent),

    /// A column layout was compiled and its header merged.
    ColumnsCompiled(ColumnsCompiledEvent),

    /// Column visibility changed through the picker.
    VisibilityChanged(VisibilityChangedEvent),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowsPublishedEvent {
    /// Loader generation of the published view.
    pub generation: u64,
    pub len: usize,
    /// Rows left after search and column filters.
    pub visible: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorsReplacedEvent {
    pub generation: u64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnsCompiledEvent {
    pub columns: usize,
    pub header_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityChangedEvent {
    /// Bindings whose visibility was set, in column order.
    pub bindings: Vec<String>,
    pub visible: bool,
}

/// Callback type for receiving grid events.
pub type EventCallback = Box<dyn FnMut(&GridEvent)>;

/// Simple event collector for testing.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<GridEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// A callback that appends into a shared collector.
    pub fn callback(shared: &Rc<RefCell<EventCollector>>) -> EventCallback {
        let shared = Rc::clone(shared);
        Box::new(move |event: &GridEvent| shared.borrow_mut().push(event.clone()))
    }

    pub fn push(&mut self, event: GridEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GridEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter to only RowsPublished events.
    pub fn rows_published(&self) -> Vec<&RowsPublishedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::RowsPublished(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Filter to only ErrorsReplaced events.
    pub fn errors_replaced(&self) -> Vec<&ErrorsReplacedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::ErrorsReplaced(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Filter to only VisibilityChanged events.
    pub fn visibility_changed(&self) -> Vec<&VisibilityChangedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::VisibilityChanged(v) => Some(v),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_collector_filtering() {
        let shared = Rc::new(RefCell::new(EventCollector::new()));
        let mut callback = EventCollector::callback(&shared);

        callback(&GridEvent::RowsPublished(RowsPublishedEvent { generation: 1, len: 40, visible: 40 }));
        callback(&GridEvent::ErrorsReplaced(ErrorsReplacedEvent { generation: 1, count: 2 }));
        callback(&GridEvent::VisibilityChanged(VisibilityChangedEvent {
            bindings: vec!["sales".into()],
            visible: false,
        }));
        callback(&GridEvent::ColumnsCompiled(ColumnsCompiledEvent { columns: 7, header_rows: 2 }));

        let collector = shared.borrow();
        assert_eq!(collector.len(), 4);
        assert_eq!(collector.rows_published().len(), 1);
        assert_eq!(collector.errors_replaced()[0].count, 2);
        assert_eq!(collector.visibility_changed()[0].bindings, vec!["sales".to_string()]);
    }
}
