//! Input abstraction layer.
//!
//! Normalizes pointer, wheel and keyboard events into a unified
//! `InputEvent` enum consumed by the interaction handlers. Pointer
//! positions are stage-space pixels.

use crate::selection::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    /// Ctrl on Linux/Windows or ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: Modifiers,
    },

    PointerMove {
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    PointerUp {
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: Modifiers,
    },

    /// Mouse wheel or trackpad scroll, in pixels.
    Wheel {
        x: f32,
        y: f32,
        dx: f32,
        dy: f32,
        modifiers: Modifiers,
    },

    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"ArrowUp"`).
    KeyDown { key: String, modifiers: Modifiers },

    KeyUp { key: String, modifiers: Modifiers },

    /// The user grabbed a handle of the transform control.
    TransformStart { handle: Handle },

    TransformEnd,
}

impl InputEvent {
    pub fn pointer_down(x: f32, y: f32) -> Self {
        Self::PointerDown {
            x,
            y,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f32, y: f32) -> Self {
        Self::PointerUp {
            x,
            y,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::KeyDown {
            key: key.to_string(),
            modifiers,
        }
    }
}
