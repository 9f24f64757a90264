//! Notifications queued for the host.
//!
//! The engine never calls back into the host while an operation is running;
//! it queues events instead, so whatever the host does in response always
//! observes a fully-updated selection.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRequest {
    Undo,
    Redo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    /// The selection set changed.
    SelectionChanged,
    /// The viewport offset changed.
    PositionChanged,
    /// The viewport scale changed.
    ScaleChanged,
    /// Persistent document state changed; the host should record history.
    StateChanged,
    HistoryRequested(HistoryRequest),
    /// Something visible changed.
    Redraw,
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<EditorEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: EditorEvent) {
        // Consecutive duplicates carry no extra information.
        if self.events.last() != Some(&event) {
            self.events.push(event);
        }
    }

    pub fn drain(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn contains(&self, event: EditorEvent) -> bool {
        self.events.contains(&event)
    }
}
