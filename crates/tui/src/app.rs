use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};
use tracescope_core::views::grid::format_duration;
use tracescope_core::{
    EventId, KeyIntent, NavigationConfig, Navigator, PointerRelease, TraceEvent, TraceModel,
};
use tracescope_protocol::Point;

use crate::renderer::{self, cell_layout};

/// Ticks applied per key press. Terminals report presses, not holds, so each
/// press stands in for a short hold.
const KEY_BURST: usize = 6;
/// Rows scrolled per wheel notch.
const WHEEL_ROWS: f64 = 3.0;
/// Wheel delta fed to the navigator per notch with Ctrl held.
const WHEEL_ZOOM_DELTA: f64 = 100.0;
/// Cells panned per horizontal wheel notch.
const WHEEL_PAN_CELLS: f64 = 4.0;

/// One interactive viewing session.
pub struct Viewer {
    model: TraceModel,
    nav: Navigator,
    selected: Option<EventId>,
    source: String,
    /// Where the canvas was last drawn, for mapping mouse cells.
    canvas: Rect,
    quit: bool,
}

impl Viewer {
    pub fn new(model: TraceModel, source: String, navigation: NavigationConfig) -> Self {
        let nav = Navigator::new(&model, cell_layout(), navigation);
        Self {
            model,
            nav,
            selected: None,
            source,
            canvas: Rect::default(),
            quit: false,
        }
    }

    fn burst(&mut self, intent: KeyIntent) {
        self.nav.set_key(intent, true);
        for _ in 0..KEY_BURST {
            self.nav.tick();
        }
        self.nav.set_key(intent, false);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit = true,
            KeyCode::Char('0') => self.nav.reset(),
            KeyCode::Esc => self.selected = None,
            KeyCode::Char('+' | '=') => self.burst(KeyIntent::ZoomIn),
            KeyCode::Char('-') => self.burst(KeyIntent::ZoomOut),
            KeyCode::Char(c) => {
                if let Some(intent) = KeyIntent::from_char(c) {
                    self.burst(intent);
                }
            }
            KeyCode::Left => self.burst(KeyIntent::PanLeft),
            KeyCode::Right => self.burst(KeyIntent::PanRight),
            KeyCode::Up => self.nav.wheel(Point::new(0.0, 0.0), 0.0, -1.0, false),
            KeyCode::Down => self.nav.wheel(Point::new(0.0, 0.0), 0.0, 1.0, false),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let canvas = self.canvas;
        let inside = mouse.column >= canvas.left()
            && mouse.column < canvas.right()
            && mouse.row >= canvas.top()
            && mouse.row < canvas.bottom();
        // Cell centers, relative to the canvas.
        let pos = Point::new(
            f64::from(mouse.column) - f64::from(canvas.x) + 0.5,
            f64::from(mouse.row) - f64::from(canvas.y) + 0.5,
        );
        let zoom = mouse.modifiers.contains(KeyModifiers::CONTROL);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if inside => {
                self.nav.pointer_move(&self.model, pos);
                self.nav.pointer_down(pos);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.nav.pointer_move(&self.model, pos);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let PointerRelease::Click(hit) = self.nav.pointer_up(pos) {
                    self.selected = hit;
                }
            }
            MouseEventKind::Moved if inside => {
                self.nav.pointer_move(&self.model, pos);
            }
            MouseEventKind::Moved => self.nav.pointer_leave(),
            MouseEventKind::ScrollUp if zoom => self.nav.wheel(pos, 0.0, -WHEEL_ZOOM_DELTA, true),
            MouseEventKind::ScrollDown if zoom => self.nav.wheel(pos, 0.0, WHEEL_ZOOM_DELTA, true),
            MouseEventKind::ScrollUp => self.nav.wheel(pos, 0.0, -WHEEL_ROWS, false),
            MouseEventKind::ScrollDown => self.nav.wheel(pos, 0.0, WHEEL_ROWS, false),
            MouseEventKind::ScrollLeft => self.nav.wheel(pos, -WHEEL_PAN_CELLS, 0.0, false),
            MouseEventKind::ScrollRight => self.nav.wheel(pos, WHEEL_PAN_CELLS, 0.0, false),
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let [header, canvas, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .areas(frame.area());

        self.canvas = canvas;
        self.nav
            .resize(f64::from(canvas.width), f64::from(canvas.height));

        let w = self.nav.window();
        let title = format!(
            " tracescope | {} | {} events | {} – {} ",
            self.source,
            self.model.event_count(),
            format_duration(w.start - self.model.min_time),
            format_duration(w.end - self.model.min_time),
        );
        frame.render_widget(
            Paragraph::new(title).style(Style::default().fg(Color::White).bg(Color::DarkGray)),
            header,
        );

        let commands = self.nav.render(&self.model, self.selected);
        renderer::paint_commands(frame.buffer_mut(), canvas, &commands);

        let focus = self
            .selected
            .or(self.nav.state().hovered)
            .and_then(|id| self.model.event(id));
        let details = match focus {
            Some(event) => event_line(&self.model, event),
            None => Line::from("no event selected".dark_gray()),
        };
        let help = Line::from(
            " w/s zoom  a/d pan  ↑/↓ scroll  wheel scroll  ctrl+wheel zoom  drag pan  click select  0 reset  esc clear  q quit"
                .dark_gray(),
        );
        frame.render_widget(Paragraph::new(vec![details, help]), footer);
    }
}

fn event_line(model: &TraceModel, event: &TraceEvent) -> Line<'static> {
    let thread = model
        .process(event.process_id)
        .and_then(|p| p.thread(event.thread_id))
        .map_or_else(|| format!("tid {}", event.thread_id), |t| t.name.clone());
    let duration = event
        .duration
        .map_or_else(|| "instant".to_string(), format_duration);
    let mut spans = vec![
        Span::raw(" "),
        Span::from(event.name.to_string()).bold(),
        Span::raw(format!(
            "  {duration} at +{}  {}  pid {}",
            format_duration(event.start_time - model.min_time),
            thread,
            event.process_id
        )),
    ];
    if let Some(cat) = &event.category {
        spans.push(Span::from(format!("  [{cat}]")).dark_gray());
    }
    if let Some(args) = &event.args {
        let compact = args
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        spans.push(Span::from(format!("  {compact}")).dark_gray());
    }
    Line::from(spans)
}

pub fn run(mut viewer: Viewer) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    tracing::info!(source = %viewer.source, "interactive session started");
    let result = event_loop(&mut terminal, &mut viewer);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, viewer: &mut Viewer) -> Result<()> {
    while !viewer.quit {
        terminal.draw(|frame| viewer.draw(frame))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => viewer.handle_key(key),
                Event::Mouse(mouse) => viewer.handle_mouse(mouse),
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use serde_json::json;
    use tracescope_core::{TimeWindow, ingest};

    fn viewer() -> Viewer {
        let model = ingest(json!([
            {"name":"outer","ph":"X","ts":0,"dur":100,"pid":1,"tid":1},
            {"name":"inner","ph":"X","ts":0,"dur":50,"pid":1,"tid":1}
        ]))
        .expect("trace");
        let mut v = Viewer::new(model, "test.json".into(), NavigationConfig::default());
        // 16 label columns + 100 track columns, one row of header above.
        v.canvas = Rect::new(0, 1, 116, 20);
        v.nav.resize(116.0, 20.0);
        v
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn key_press_zooms_in_bursts() {
        let mut v = viewer();
        v.handle_key(key(KeyCode::Char('w')));
        let expected = 100.0 * 0.97f64.powi(KEY_BURST as i32);
        assert!((v.nav.window().range() - expected).abs() < 1e-9);
        assert!(!v.nav.is_animating());

        v.handle_key(key(KeyCode::Char('0')));
        assert_eq!(v.nav.window(), TimeWindow::new(0.0, 100.0));
    }

    #[test]
    fn click_selects_and_escape_clears() {
        let mut v = viewer();
        // Header on canvas row 0, thread track rows 1..3; inner at depth 1.
        v.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 30, 3));
        v.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 30, 3));
        let name = v.selected.and_then(|id| v.model.event(id)).map(|e| e.name.to_string());
        assert_eq!(name.as_deref(), Some("inner"));

        v.handle_key(key(KeyCode::Esc));
        assert_eq!(v.selected, None);
    }

    #[test]
    fn drag_pans_instead_of_selecting() {
        let mut v = viewer();
        v.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 60, 2));
        v.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 40, 2));
        v.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 40, 2));
        assert_eq!(v.selected, None);
        assert!((v.nav.window().start - 20.0).abs() < 1e-9);
    }

    #[test]
    fn quit_keys() {
        let mut v = viewer();
        v.handle_key(key(KeyCode::Char('q')));
        assert!(v.quit);
    }
}
