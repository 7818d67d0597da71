//! Toast-style notices raised by the save flow.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// What a notice button does when clicked. Routed back through
/// `GridSession::handle_action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeActionId {
    ShowErrorPanel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeAction {
    pub label: String,
    pub id: NoticeActionId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeOptions {
    pub description: Option<String>,
    pub action: Option<NoticeAction>,
    pub duration: Option<Duration>,
}

pub trait Notifier {
    fn notify(&mut self, kind: NoticeKind, message: &str, options: NoticeOptions);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub options: NoticeOptions,
}

/// Keeps every notice in order. Used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn last(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl Notifier for NoticeLog {
    fn notify(&mut self, kind: NoticeKind, message: &str, options: NoticeOptions) {
        self.notices.push(Notice { kind, message: message.to_string(), options });
    }
}
