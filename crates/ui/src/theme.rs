use tracescope_protocol::ThemeToken;

/// Resolved RGBA color for egui rendering.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ResolvedColor {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

pub fn resolve(token: ThemeToken, mode: ThemeMode) -> egui::Color32 {
    match mode {
        ThemeMode::Dark => resolve_dark(token),
        ThemeMode::Light => resolve_light(token),
    }
    .to_color32()
}

// Catppuccin Mocha accents.
const PALETTE_DARK: [ResolvedColor; 12] = [
    ResolvedColor::rgb(0xf3, 0x8b, 0xa8), // Red
    ResolvedColor::rgb(0xfa, 0xb3, 0x87), // Peach
    ResolvedColor::rgb(0xf9, 0xe2, 0xaf), // Yellow
    ResolvedColor::rgb(0xa6, 0xe3, 0xa1), // Green
    ResolvedColor::rgb(0x94, 0xe2, 0xd5), // Teal
    ResolvedColor::rgb(0x89, 0xdc, 0xeb), // Sky
    ResolvedColor::rgb(0x74, 0xc7, 0xec), // Sapphire
    ResolvedColor::rgb(0x89, 0xb4, 0xfa), // Blue
    ResolvedColor::rgb(0xb4, 0xbe, 0xfe), // Lavender
    ResolvedColor::rgb(0xcb, 0xa6, 0xf7), // Mauve
    ResolvedColor::rgb(0xf5, 0xc2, 0xe7), // Pink
    ResolvedColor::rgb(0xeb, 0xa0, 0xac), // Maroon
];

const PALETTE_LIGHT: [ResolvedColor; 12] = [
    ResolvedColor::rgb(224, 108, 117),
    ResolvedColor::rgb(229, 149, 90),
    ResolvedColor::rgb(217, 180, 74),
    ResolvedColor::rgb(124, 179, 107),
    ResolvedColor::rgb(79, 179, 166),
    ResolvedColor::rgb(75, 163, 199),
    ResolvedColor::rgb(91, 143, 217),
    ResolvedColor::rgb(122, 127, 224),
    ResolvedColor::rgb(154, 115, 214),
    ResolvedColor::rgb(192, 111, 192),
    ResolvedColor::rgb(217, 115, 155),
    ResolvedColor::rgb(201, 138, 94),
];

fn resolve_dark(token: ThemeToken) -> ResolvedColor {
    use ThemeToken::*;
    match token {
        Palette(slot) => PALETTE_DARK[usize::from(slot) % PALETTE_DARK.len()],

        Background => ResolvedColor::rgb(0x11, 0x11, 0x1b), // Crust
        Border => ResolvedColor::rgb(0x31, 0x32, 0x44),     // Surface0

        ProcessHeaderBackground => ResolvedColor::rgb(0x18, 0x18, 0x25), // Mantle
        ProcessHeaderText => ResolvedColor::rgb(0xcd, 0xd6, 0xf4),       // Text

        ThreadLabelBackground => ResolvedColor::rgb(0x1e, 0x1e, 0x2e), // Base
        ThreadLabelText => ResolvedColor::rgb(0xba, 0xc2, 0xde),       // Subtext1
        TrackBackground => ResolvedColor::rgb(0x1e, 0x1e, 0x2e),

        EventText => ResolvedColor::rgb(0x11, 0x11, 0x1b),

        GridLine => ResolvedColor::rgba(0x6c, 0x70, 0x86, 90), // Overlay0
        GridText => ResolvedColor::rgb(0xa6, 0xad, 0xc8),      // Subtext0

        SelectionHighlight => ResolvedColor::rgb(0xff, 0xff, 0xff),
    }
}

fn resolve_light(token: ThemeToken) -> ResolvedColor {
    use ThemeToken::*;
    match token {
        Palette(slot) => PALETTE_LIGHT[usize::from(slot) % PALETTE_LIGHT.len()],

        Background => ResolvedColor::rgb(255, 255, 255),
        Border => ResolvedColor::rgb(210, 210, 220),

        ProcessHeaderBackground => ResolvedColor::rgb(235, 235, 240),
        ProcessHeaderText => ResolvedColor::rgb(40, 40, 50),

        ThreadLabelBackground => ResolvedColor::rgb(245, 245, 248),
        ThreadLabelText => ResolvedColor::rgb(80, 80, 100),
        TrackBackground => ResolvedColor::rgb(250, 250, 252),

        EventText => ResolvedColor::rgb(20, 20, 30),

        GridLine => ResolvedColor::rgba(0, 0, 0, 35),
        GridText => ResolvedColor::rgb(100, 100, 120),

        SelectionHighlight => ResolvedColor::rgb(20, 20, 30),
    }
}

// ── Typography ─────────────────────────────────────────────────────────────

const TEXT_STYLES: [(egui::TextStyle, f32, bool); 5] = [
    (egui::TextStyle::Heading, 16.0, false),
    (egui::TextStyle::Body, 12.0, false),
    (egui::TextStyle::Button, 12.0, false),
    (egui::TextStyle::Small, 11.0, false),
    (egui::TextStyle::Monospace, 11.0, true),
];

/// Install the viewer's text sizes on `ctx`.
pub fn apply_typography(ctx: &egui::Context) {
    ctx.style_mut(|style| {
        for (text_style, size, mono) in TEXT_STYLES {
            let font = if mono {
                egui::FontId::monospace(size)
            } else {
                egui::FontId::proportional(size)
            };
            style.text_styles.insert(text_style, font);
        }
    });
}

// ── Widget chrome ──────────────────────────────────────────────────────────

/// Accent colors for widgets that have no timeline token.
struct Accents {
    interactive: ResolvedColor,
    hovered: ResolvedColor,
    active: ResolvedColor,
    warn: ResolvedColor,
    error: ResolvedColor,
}

const DARK_ACCENTS: Accents = Accents {
    interactive: ResolvedColor::rgb(0x45, 0x47, 0x5a),
    hovered: ResolvedColor::rgb(0x58, 0x5b, 0x70),
    active: ResolvedColor::rgb(0x89, 0xb4, 0xfa),
    warn: ResolvedColor::rgb(0xf9, 0xe2, 0xaf),
    error: ResolvedColor::rgb(0xf3, 0x8b, 0xa8),
};

const LIGHT_ACCENTS: Accents = Accents {
    interactive: ResolvedColor::rgb(230, 230, 235),
    hovered: ResolvedColor::rgb(220, 220, 228),
    active: ResolvedColor::rgb(50, 110, 220),
    warn: ResolvedColor::rgb(230, 170, 0),
    error: ResolvedColor::rgb(211, 47, 47),
};

/// egui visuals whose panels match the timeline's header, label and track
/// colors in `mode`.
pub fn visuals(mode: ThemeMode) -> egui::Visuals {
    let (mut v, accents) = match mode {
        ThemeMode::Dark => (egui::Visuals::dark(), &DARK_ACCENTS),
        ThemeMode::Light => (egui::Visuals::light(), &LIGHT_ACCENTS),
    };
    let token = |t| resolve(t, mode);

    v.panel_fill = token(ThemeToken::ProcessHeaderBackground);
    v.window_fill = token(ThemeToken::TrackBackground);
    v.extreme_bg_color = token(ThemeToken::Background);
    v.faint_bg_color = token(ThemeToken::ThreadLabelBackground);
    v.widgets.noninteractive.bg_fill = token(ThemeToken::Border);
    v.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, token(ThemeToken::ThreadLabelText));
    v.widgets.inactive.bg_fill = accents.interactive.to_color32();
    v.widgets.hovered.bg_fill = accents.hovered.to_color32();
    v.widgets.active.bg_fill = accents.active.to_color32();

    let active = accents.active;
    v.selection.bg_fill = ResolvedColor::rgba(active.r, active.g, active.b, 60).to_color32();
    v.selection.stroke = egui::Stroke::new(1.0, active.to_color32());
    v.hyperlink_color = active.to_color32();
    v.warn_fg_color = accents.warn.to_color32();
    v.error_fg_color = accents.error.to_color32();
    v.window_corner_radius = egui::CornerRadius::same(6);
    v
}
