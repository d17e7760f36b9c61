use tracescope_protocol::ThemeToken;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the UTF-8 bytes of `s`.
pub fn name_hash(s: &str) -> u32 {
    s.bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}

/// Fill color for an event. Depends on the name only, so the same function
/// keeps its color across threads, processes and zoom levels.
pub fn color_for_name(name: &str) -> ThemeToken {
    ThemeToken::palette(name_hash(name))
}
