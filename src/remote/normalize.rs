//! Player name normalization
//!
//! Display names may contain arbitrary Unicode, but lookups by name are
//! only reliable with a canonical ASCII form.

use deunicode::deunicode;

/// Normalizes a display name for remote lookup
///
/// Surrounding whitespace is trimmed and the name is transliterated to
/// ASCII. The original name stays the storage key; only the lookup uses the
/// normalized form.
///
/// # Example
///
/// ```
/// use lolcrawler::remote::normalize_player_name;
///
/// assert_eq!(normalize_player_name(" Señor Zoë "), "Senor Zoe");
/// ```
pub fn normalize_player_name(name: &str) -> String {
    deunicode(name.trim())
}
