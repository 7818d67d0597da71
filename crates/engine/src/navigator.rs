//! Moves the grid's selection to a cell after the next render.

use pagegrid_core::CellRange;

use crate::schedule::{Scheduler, TaskHandle};

/// Issues deferred jumps and owns their handles, so dropping the navigator
/// cancels any jump that has not yet run.
#[derive(Debug, Default)]
pub struct Navigator {
    pending: Vec<TaskHandle>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue scroll, select and focus for `(row, col)` in display coordinates.
    /// The bounds check happens when the task runs, against the grid as it
    /// is then.
    pub fn jump_to(&mut self, row: usize, col: usize, scheduler: &mut Scheduler) {
        self.pending.retain(TaskHandle::is_pending);
        let handle = scheduler.defer(move |control| {
            if row >= control.row_count() || col >= control.column_count() {
                log::debug!(
                    "jump to ({row}, {col}) skipped: grid is {}x{}",
                    control.row_count(),
                    control.column_count()
                );
                return;
            }
            control.scroll_into_view(row, col);
            control.select(CellRange::single(row, col));
            control.focus();
        });
        self.pending.push(handle);
    }

    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|h| h.is_pending()).count()
    }

    pub fn cancel_pending(&mut self) {
        for handle in self.pending.drain(..) {
            handle.cancel();
        }
    }
}
