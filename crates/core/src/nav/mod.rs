//! Navigation: the pan/zoom/scroll state machine behind the timeline.

mod config;
mod controller;

pub use config::NavigationConfig;
pub use controller::{KeyIntent, Navigator, PointerRelease, ViewState};
