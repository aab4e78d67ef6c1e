//! Deterministic display identity for collaborators.
//!
//! The same user id always maps to the same color and name, so a remote
//! cursor renders identically on every tick.

/// Cursor colors, indexed by the user-id hash.
pub const CURSOR_PALETTE: [&str; 8] = [
    "#ef4444", "#f97316", "#eab308", "#22c55e", "#06b6d4", "#3b82f6", "#8b5cf6", "#ec4899",
];

const ADJECTIVES: [&str; 8] = [
    "Swift", "Clever", "Bright", "Calm", "Bold", "Eager", "Gentle", "Happy",
];

const NOUNS: [&str; 8] = [
    "Falcon", "Otter", "Panda", "Fox", "Owl", "Tiger", "Koala", "Dolphin",
];

/// 32-bit rolling string hash (`h = h * 31 + unit`) over UTF-16 code units.
pub fn user_hash(user_id: &str) -> u32 {
    let hash = user_id
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(unit as i32));
    hash.unsigned_abs()
}

/// Cursor color for a user.
pub fn color_for(user_id: &str) -> &'static str {
    CURSOR_PALETTE[user_hash(user_id) as usize % CURSOR_PALETTE.len()]
}

/// Adjective-noun display name for a user.
pub fn name_for(user_id: &str) -> String {
    let hash = user_hash(user_id) as usize;
    let adjective = ADJECTIVES[hash % ADJECTIVES.len()];
    let noun = NOUNS[(hash / ADJECTIVES.len()) % NOUNS.len()];
    format!("{} {}", adjective, noun)
}
