pub mod clone;
pub mod config;
pub mod dispatch;
pub mod editor;
pub mod error;
pub mod events;
pub mod input;
pub mod interactions;
pub mod selection;
pub mod shortcuts;
pub mod snap;

pub use clone::{Clipboard, IdRemap, duplicate};
pub use config::EditorConfig;
pub use dispatch::Dispatcher;
pub use editor::{DragState, Editor, EditorState};
pub use error::EditorError;
pub use events::{EditorEvent, HistoryRequest};
pub use input::{InputEvent, Modifiers, MouseButton};
pub use selection::{Handle, SelectionEngine, TransformControl};
pub use snap::SnapResize;
