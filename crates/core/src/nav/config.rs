use serde::{Deserialize, Serialize};

/// Tuning for the navigation controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Fraction of the visible range removed per tick while zoom-in is held.
    pub zoom_step: f64,
    /// Fraction of the visible range panned per tick while a pan key is held.
    pub pan_step: f64,
    /// Wheel zoom factor is `2^(delta_y * wheel_zoom_sensitivity)`.
    pub wheel_zoom_sensitivity: f64,
    /// Pointer travel below this (in pixels) between down and up is a click.
    pub click_threshold_px: f64,
    /// Keep the visible window inside the trace's `[min_time, max_time]`.
    pub clamp_to_trace: bool,
    /// Smallest visible range in microseconds, if any.
    pub min_range: Option<f64>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            zoom_step: 0.03,
            pan_step: 0.015,
            wheel_zoom_sensitivity: 0.002,
            click_threshold_px: 4.0,
            clamp_to_trace: false,
            min_range: None,
        }
    }
}
