use serde::{Deserialize, Serialize};

/// Number of entries in the event fill palette.
pub const PALETTE_SIZE: u8 = 12;

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    /// Event fill, indexed into the fixed palette (`0..PALETTE_SIZE`).
    Palette(u8),

    Background,
    Border,

    ProcessHeaderBackground,
    ProcessHeaderText,

    ThreadLabelBackground,
    ThreadLabelText,
    TrackBackground,

    EventText,

    GridLine,
    GridText,

    SelectionHighlight,
}

impl ThemeToken {
    /// Palette token for an arbitrary index, wrapped into range.
    pub fn palette(index: u32) -> Self {
        Self::Palette((index % u32::from(PALETTE_SIZE)) as u8)
    }
}
