pub mod filter;
pub mod geometry;
pub mod id;
pub mod model;
pub mod view;

pub use filter::is_selectable;
pub use geometry::{Bounds, Point, rotate_around_center, rotate_point};
pub use id::{IdAllocator, IdPrefix, NodeId};
pub use model::*;
pub use view::ViewTransform;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
