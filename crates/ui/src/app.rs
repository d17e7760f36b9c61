use std::sync::{Arc, Mutex};

use eframe::egui;
use tracescope_core::views::grid::format_duration;
use tracescope_core::{
    EventId, KeyIntent, Navigator, PointerRelease, TraceEvent, TraceModel, ViewerConfig,
    ingest_slice,
};
use tracescope_protocol::Point;

use crate::renderer;
use crate::theme::{self, ThemeMode};

/// Outcome of a background load: the model and where it came from, or a
/// message for the status bar.
type LoadResult = Result<(TraceModel, String), String>;

/// A trace being viewed. A new file replaces the whole session.
struct Session {
    model: TraceModel,
    nav: Navigator,
    selected: Option<EventId>,
    source: String,
}

/// Main application state.
pub struct TraceApp {
    session: Option<Session>,
    config: ViewerConfig,
    theme_mode: ThemeMode,
    /// Error message to display.
    error: Option<String>,
    /// Filled by the loader thread (or future on wasm), drained each frame.
    pending: Arc<Mutex<Option<LoadResult>>>,
    loading: bool,
}

impl TraceApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ViewerConfig) -> Self {
        cc.egui_ctx.set_visuals(theme::visuals(ThemeMode::Dark));
        theme::apply_typography(&cc.egui_ctx);

        let app = Self {
            session: None,
            config,
            theme_mode: ThemeMode::Dark,
            error: None,
            pending: Arc::new(Mutex::new(None)),
            loading: false,
        };

        // On WASM, `#url=<trace>` in the page hash loads a trace on startup.
        #[cfg(target_arch = "wasm32")]
        {
            let url = web_sys::window()
                .and_then(|w| w.location().hash().ok())
                .and_then(|hash| hash.strip_prefix("#url=").map(str::to_string));
            if let Some(url) = url {
                let slot = app.pending.clone();
                let ctx = cc.egui_ctx.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let result = match Self::fetch_bytes(&url).await {
                        Ok(bytes) => ingest_slice(&bytes)
                            .map(|model| (model, url.clone()))
                            .map_err(|e| format!("Failed to load {url}: {e}")),
                        Err(e) => Err(format!("Failed to fetch {url}: {e}")),
                    };
                    if let Ok(mut lock) = slot.lock() {
                        *lock = Some(result);
                    }
                    ctx.request_repaint();
                });
            }
        }

        app
    }

    /// Read and ingest `path` off the UI thread.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open_path(&mut self, ctx: &egui::Context, path: std::path::PathBuf) {
        let source = path.display().to_string();
        self.spawn_load(ctx, source, move || {
            std::fs::read(&path).map_err(|e| format!("Failed to read {}: {e}", path.display()))
        });
    }

    fn open_bytes(&mut self, ctx: &egui::Context, source: String, data: Vec<u8>) {
        self.spawn_load(ctx, source, move || Ok(data));
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_load<F>(&mut self, ctx: &egui::Context, source: String, read: F)
    where
        F: FnOnce() -> Result<Vec<u8>, String> + Send + 'static,
    {
        self.loading = true;
        self.error = None;
        let slot = self.pending.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = read().and_then(|bytes| {
                ingest_slice(&bytes)
                    .map(|model| (model, source.clone()))
                    .map_err(|e| format!("Failed to load {source}: {e}"))
            });
            if let Ok(mut lock) = slot.lock() {
                *lock = Some(result);
            }
            ctx.request_repaint();
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn_load<F>(&mut self, ctx: &egui::Context, source: String, read: F)
    where
        F: FnOnce() -> Result<Vec<u8>, String> + 'static,
    {
        self.loading = true;
        self.error = None;
        let slot = self.pending.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = read().and_then(|bytes| {
                ingest_slice(&bytes)
                    .map(|model| (model, source.clone()))
                    .map_err(|e| format!("Failed to load {source}: {e}"))
            });
            if let Ok(mut lock) = slot.lock() {
                *lock = Some(result);
            }
            ctx.request_repaint();
        });
    }

    fn finish_load(&mut self, result: LoadResult) {
        self.loading = false;
        match result {
            Ok((model, source)) => {
                tracing::info!(
                    source = %source,
                    events = model.event_count(),
                    "trace ready"
                );
                let nav = Navigator::new(&model, self.config.layout, self.config.navigation);
                self.session = Some(Session {
                    model,
                    nav,
                    selected: None,
                    source,
                });
                self.error = None;
            }
            Err(message) => {
                tracing::warn!(error = %message, "trace load failed");
                // The previous trace, if any, stays on screen.
                self.error = Some(message);
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;

        let window = web_sys::window().ok_or("no window")?;
        let resp_value = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| format!("{e:?}"))?;
        let resp: web_sys::Response = resp_value.dyn_into().map_err(|_| "not a Response")?;
        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }
        let buf = JsFuture::from(resp.array_buffer().map_err(|e| format!("{e:?}"))?)
            .await
            .map_err(|e| format!("{e:?}"))?;
        Ok(js_sys::Uint8Array::new(&buf).to_vec())
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("tracescope");
                ui.separator();

                #[cfg(not(target_arch = "wasm32"))]
                {
                    if ui.button("Open…").clicked()
                        && let Some(path) = rfd::FileDialog::new()
                            .add_filter("Trace", &["json"])
                            .pick_file()
                    {
                        self.open_path(ctx, path);
                    }
                }

                let theme_label = match self.theme_mode {
                    ThemeMode::Dark => "Light theme",
                    ThemeMode::Light => "Dark theme",
                };
                if ui.button(theme_label).clicked() {
                    self.theme_mode = self.theme_mode.toggled();
                    ctx.set_visuals(theme::visuals(self.theme_mode));
                }

                if let Some(session) = &mut self.session {
                    if ui.button("Reset view").clicked() {
                        session.nav.reset();
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let w = session.nav.window();
                        ui.label(format!(
                            "{} – {} ({})",
                            format_duration(w.start - session.model.min_time),
                            format_duration(w.end - session.model.min_time),
                            format_duration(w.range()),
                        ));
                    });
                }
            });
        });
    }

    fn status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.loading {
                    ui.spinner();
                    ui.label("Loading trace…");
                } else if let Some(err) = &self.error {
                    ui.colored_label(ui.visuals().error_fg_color, err);
                } else if let Some(session) = &self.session {
                    ui.label(format!(
                        "{} | {} events | {} threads | {}",
                        session.source,
                        session.model.event_count(),
                        session.model.thread_count(),
                        format_duration(session.model.duration()),
                    ));
                } else {
                    ui.label("No trace loaded. Click Open or drop a trace file.");
                }
            });
        });
    }

    fn details_panel(&mut self, ctx: &egui::Context) {
        let Some(session) = &mut self.session else {
            return;
        };
        let Some(event) = session.selected.and_then(|id| session.model.event(id)) else {
            return;
        };

        let mut close = false;
        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Event");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        close = ui.small_button("✕").clicked();
                    });
                });
                ui.separator();
                event_fields(ui, &session.model, event);

                if let Some(args) = event.pretty_args() {
                    ui.separator();
                    ui.label("Args");
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.add(egui::Label::new(egui::RichText::new(args).monospace()).wrap());
                    });
                }
            });
        if close {
            session.selected = None;
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let Some(session) = &mut self.session else {
            ui.centered_and_justified(|ui| {
                ui.label("Drop a Chrome trace (.json) here or click Open");
            });
            return;
        };

        let available = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(available, egui::Sense::click_and_drag());
        let origin = available.min;
        let local = |p: egui::Pos2| Point::new(f64::from(p.x - origin.x), f64::from(p.y - origin.y));

        let nav = &mut session.nav;
        nav.resize(f64::from(available.width()), f64::from(available.height()));

        let typing = ui.ctx().wants_keyboard_input();
        let input = ui.input(FrameInput::capture);

        // Keys held this frame drive the continuous zoom/pan.
        for (key, intent) in [
            (egui::Key::W, KeyIntent::ZoomIn),
            (egui::Key::S, KeyIntent::ZoomOut),
            (egui::Key::A, KeyIntent::PanLeft),
            (egui::Key::D, KeyIntent::PanRight),
        ] {
            nav.set_key(intent, !typing && input.held.contains(&key));
        }
        if !typing {
            if input.reset {
                nav.reset();
            }
            if input.escape {
                session.selected = None;
            }
        }
        if nav.tick() {
            ui.ctx().request_repaint();
        }

        // Pointer: press, move, release, in that order.
        let pointer = input.pointer;
        if input.pressed
            && let Some(pos) = pointer.filter(|p| available.contains(*p))
        {
            nav.pointer_down(local(pos));
        }
        match pointer {
            Some(pos) if available.contains(pos) || nav.state().dragging => {
                if nav.pointer_move(&session.model, local(pos)) {
                    ui.ctx().request_repaint();
                }
            }
            _ => {
                if nav.state().hovered.is_some() || nav.state().dragging {
                    nav.pointer_leave();
                }
            }
        }
        if input.released
            && let PointerRelease::Click(hit) =
                nav.pointer_up(local(pointer.unwrap_or(origin)))
        {
            session.selected = hit;
        }

        // egui's scroll deltas are positive for wheel-up; the navigator
        // expects positive for down.
        if response.hovered() {
            let scroll = input.scroll;
            if scroll != egui::Vec2::ZERO {
                let at = pointer.map_or(Point::new(0.0, 0.0), local);
                nav.wheel(
                    at,
                    -f64::from(scroll.x),
                    -f64::from(scroll.y),
                    input.zoom_modifier,
                );
            } else {
                let pinch = input.pinch;
                if (pinch - 1.0).abs() > 0.001
                    && let Some(pos) = pointer
                {
                    nav.zoom_at(local(pos).x, 1.0 / f64::from(pinch));
                }
            }
        }

        let commands = nav.render(&session.model, session.selected);
        let mut painter = ui.painter_at(available);
        renderer::render_commands(&mut painter, &commands, origin, self.theme_mode);

        if let Some((id, anchor)) = nav.tooltip()
            && let Some(event) = session.model.event(id)
        {
            let pos = origin + egui::vec2(anchor.x as f32 + 14.0, anchor.y as f32 + 14.0);
            egui::Area::new(egui::Id::new("event_tooltip"))
                .fixed_pos(pos)
                .order(egui::Order::Tooltip)
                .interactable(false)
                .show(ui.ctx(), |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.strong(&*event.name);
                        ui.label(event_timing(&session.model, event));
                        if let Some(cat) = &event.category {
                            ui.weak(&**cat);
                        }
                    });
                });
        }
    }
}

/// The slice of egui input the canvas reacts to, read once per frame.
struct FrameInput {
    held: Vec<egui::Key>,
    reset: bool,
    escape: bool,
    pointer: Option<egui::Pos2>,
    pressed: bool,
    released: bool,
    scroll: egui::Vec2,
    zoom_modifier: bool,
    pinch: f32,
}

impl FrameInput {
    fn capture(i: &egui::InputState) -> Self {
        Self {
            held: [egui::Key::W, egui::Key::S, egui::Key::A, egui::Key::D]
                .into_iter()
                .filter(|k| i.key_down(*k))
                .collect(),
            reset: i.key_pressed(egui::Key::Num0),
            escape: i.key_pressed(egui::Key::Escape),
            pointer: i.pointer.latest_pos(),
            pressed: i.pointer.primary_pressed(),
            released: i.pointer.primary_released(),
            scroll: i.raw_scroll_delta,
            zoom_modifier: i.modifiers.command,
            pinch: i.zoom_delta(),
        }
    }
}

fn event_timing(model: &TraceModel, event: &TraceEvent) -> String {
    let offset = format_duration(event.start_time - model.min_time);
    match event.duration {
        Some(d) => format!("{} at +{offset}", format_duration(d)),
        None => format!("instant at +{offset}"),
    }
}

fn event_fields(ui: &mut egui::Ui, model: &TraceModel, event: &TraceEvent) {
    let process = model.process(event.process_id);
    let thread = process.and_then(|p| p.thread(event.thread_id));

    egui::Grid::new("event_fields")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            let mut row = |label: &str, value: String| {
                ui.weak(label);
                ui.label(value);
                ui.end_row();
            };
            row("Name", event.name.to_string());
            row(
                "Category",
                event.category.as_deref().unwrap_or("-").to_string(),
            );
            row("Phase", event.phase.code().to_string());
            row("Start", format!("{:.3} µs", event.start_time));
            row(
                "Duration",
                event
                    .duration
                    .map_or_else(|| "instant".to_string(), format_duration),
            );
            row("Depth", event.depth.to_string());
            row(
                "Process",
                format!(
                    "{} ({})",
                    process.map_or("?", |p| p.name.as_str()),
                    event.process_id
                ),
            );
            row(
                "Thread",
                format!(
                    "{} ({})",
                    thread.map_or("?", |t| t.name.as_str()),
                    event.thread_id
                ),
            );
        });
}

impl eframe::App for TraceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let finished = {
            let mut lock = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            lock.take()
        };
        if let Some(result) = finished {
            self.finish_load(result);
        }

        // File drop: the first dropped file with contents replaces the trace.
        let dropped = ctx.input(|i| {
            i.raw.dropped_files.first().and_then(|file| {
                let source = if file.name.is_empty() {
                    "dropped file".to_string()
                } else {
                    file.name.clone()
                };
                match (&file.bytes, &file.path) {
                    (Some(bytes), _) => Some((source, Some(bytes.to_vec()), None)),
                    (None, Some(path)) => Some((source, None, Some(path.clone()))),
                    _ => None,
                }
            })
        });
        match dropped {
            Some((source, Some(bytes), _)) => self.open_bytes(ctx, source, bytes),
            #[cfg(not(target_arch = "wasm32"))]
            Some((_, None, Some(path))) => self.open_path(ctx, path),
            _ => {}
        }

        self.toolbar(ctx);
        self.status_bar(ctx);
        self.details_panel(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.canvas(ui));
    }
}
