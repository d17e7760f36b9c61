pub mod grid;
pub mod layout;
pub mod palette;
pub mod timeline;

pub use hit_test::hit_test;
pub use layout::{LayoutConfig, LayoutItem, TimeScale, TimeWindow, TrackLayout};
pub use timeline::render_timeline;
