//! Trace ingestion, timeline layout, and navigation for tracescope.
//!
//! ```text
//!   JSON ──▶ ingest ──▶ TraceModel ──▶ views::render_timeline ──▶ RenderCommand[] ──▶ backend
//!                           ▲                    ▲
//!                           │                    │
//!                           └──── nav::Navigator ┘ (view window, scroll, hover)
//! ```

pub mod config;
pub mod ingest;
pub mod model;
pub mod nav;
pub mod svg;
pub mod views;

pub use config::{ConfigError, ViewerConfig};
pub use ingest::{FormatError, IngestError, ingest, ingest_slice};
pub use model::{EventId, Phase, Process, Thread, TraceEvent, TraceModel};
pub use nav::{KeyIntent, NavigationConfig, Navigator, PointerRelease, ViewState};
pub use views::{LayoutConfig, TimeWindow};
