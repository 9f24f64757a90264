//! Single entry point for input events.
//!
//! Handlers are registered once, in priority order. Every event runs to
//! completion synchronously before the next one is accepted.

use crate::editor::EditorState;
use crate::input::InputEvent;
use crate::interactions::*;

pub struct Dispatcher {
    handlers: Vec<Box<dyn Interaction>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::standard()
    }
}

impl Dispatcher {
    /// No handlers registered.
    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// The editor's handler set: shortcuts, key move, zoom, transform
    /// control, pan, selection, hover.
    pub fn standard() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher.register(Box::new(ShortcutInteraction));
        dispatcher.register(Box::new(KeyMoveInteraction::default()));
        dispatcher.register(Box::new(ZoomInteraction));
        dispatcher.register(Box::new(TransformInteraction));
        dispatcher.register(Box::new(PanInteraction));
        dispatcher.register(Box::new(SelectionInteraction));
        dispatcher.register(Box::new(HoverInteraction::default()));
        dispatcher
    }

    /// Append a handler below every handler registered so far.
    pub fn register(&mut self, handler: Box<dyn Interaction>) {
        self.handlers.push(handler);
    }

    pub fn kinds(&self) -> Vec<InteractionKind> {
        self.handlers.iter().map(|h| h.kind()).collect()
    }

    /// Offer `event` to each handler until one stops it.
    /// Returns the kind of the handler that stopped it, if any.
    pub fn dispatch(&mut self, state: &mut EditorState, event: &InputEvent) -> Option<InteractionKind> {
        for handler in &mut self.handlers {
            if handler.handle(state, event) == Flow::Stop {
                log::trace!("{event:?} handled by {:?}", handler.kind());
                return Some(handler.kind());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::input::Modifiers;

    struct Recorder {
        kind: InteractionKind,
        flow: Flow,
        seen: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl Interaction for Recorder {
        fn kind(&self) -> InteractionKind {
            self.kind
        }

        fn handle(&mut self, _state: &mut EditorState, _event: &InputEvent) -> Flow {
            self.seen.set(self.seen.get() + 1);
            self.flow
        }
    }

    #[test]
    fn standard_priority_order() {
        assert_eq!(
            Dispatcher::standard().kinds(),
            vec![
                InteractionKind::Shortcut,
                InteractionKind::KeyMove,
                InteractionKind::Zoom,
                InteractionKind::Transform,
                InteractionKind::Pan,
                InteractionKind::Selection,
                InteractionKind::Hover,
            ]
        );
    }

    #[test]
    fn stop_hides_event_from_lower_handlers() {
        let mut state = EditorState::new(EditorConfig::default()).unwrap();
        let first = std::rc::Rc::new(std::cell::Cell::new(0));
        let second = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut dispatcher = Dispatcher::empty();
        dispatcher.register(Box::new(Recorder {
            kind: InteractionKind::Shortcut,
            flow: Flow::Stop,
            seen: first.clone(),
        }));
        dispatcher.register(Box::new(Recorder {
            kind: InteractionKind::Hover,
            flow: Flow::Continue,
            seen: second.clone(),
        }));

        let handled = dispatcher.dispatch(&mut state, &InputEvent::key("x", Modifiers::NONE));
        assert_eq!(handled, Some(InteractionKind::Shortcut));
        assert_eq!((first.get(), second.get()), (1, 0));
    }
}
