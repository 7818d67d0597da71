//! Next-tick deferral for work that must run after the grid has re-rendered.
//!
//! Tasks are queued with [`Scheduler::defer`] and run on the following
//! [`Scheduler::tick`]. Each task is tied to a [`TaskHandle`]; dropping or
//! cancelling the handle before the tick turns the task into a no-op.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use pagegrid_core::CellRange;

/// The slice of the grid widget that deferred work may drive.
pub trait GridControl {
    fn scroll_into_view(&mut self, row: usize, col: usize);
    fn select(&mut self, range: CellRange);
    fn focus(&mut self);
    /// Rows currently displayed.
    fn row_count(&self) -> usize;
    /// Columns currently displayed.
    fn column_count(&self) -> usize;
}

pub type Task = Box<dyn FnOnce(&mut dyn GridControl)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Cancelled,
    Done,
}

struct Deferred {
    state: Rc<Cell<TaskState>>,
    task: Task,
}

/// Owner side of a deferred task. Cancels the task when dropped.
#[derive(Debug)]
pub struct TaskHandle {
    state: Rc<Cell<TaskState>>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        if self.state.get() == TaskState::Pending {
            self.state.set(TaskState::Cancelled);
        }
    }

    pub fn state(&self) -> TaskState {
        self.state.get()
    }

    pub fn is_pending(&self) -> bool {
        self.state.get() == TaskState::Pending
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Default)]
pub struct Scheduler {
    queue: VecDeque<Deferred>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer<F>(&mut self, task: F) -> TaskHandle
    where
        F: FnOnce(&mut dyn GridControl) + 'static,
    {
        let state = Rc::new(Cell::new(TaskState::Pending));
        self.queue.push_back(Deferred { state: Rc::clone(&state), task: Box::new(task) });
        TaskHandle { state }
    }

    /// Tasks still queued, cancelled ones included.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Run every task queued before this call. Returns how many ran.
    pub fn tick(&mut self, control: &mut dyn GridControl) -> usize {
        let batch = std::mem::take(&mut self.queue);
        let mut ran = 0;
        for deferred in batch {
            if deferred.state.get() != TaskState::Pending {
                continue;
            }
            deferred.state.set(TaskState::Done);
            (deferred.task)(&mut *control);
            ran += 1;
        }
        ran
    }
}

/// A [`GridControl`] that records the calls made against it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingControl {
    pub rows: usize,
    pub cols: usize,
    pub scrolled: Vec<(usize, usize)>,
    pub selected: Vec<CellRange>,
    pub focus_count: usize,
}

impl RecordingControl {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols, ..Self::default() }
    }
}

impl GridControl for RecordingControl {
    fn scroll_into_view(&mut self, row: usize, col: usize) {
        self.scrolled.push((row, col));
    }

    fn select(&mut self, range: CellRange) {
        self.selected.push(range);
    }

    fn focus(&mut self) {
        self.focus_count += 1;
    }

    fn row_count(&self) -> usize {
        self.rows
    }

    fn column_count(&self) -> usize {
        self.cols
    }
}
