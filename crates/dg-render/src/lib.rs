pub mod hit;
pub mod overlay;

pub use hit::{hit_test, hit_test_rect, point_hit, rect_hit, selectable_layer};
