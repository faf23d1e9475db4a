//! Track name normalization.

/// Spelling variants folded onto one canonical token.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("kik", "kick"),
    ("kck", "kick"),
    ("bd", "kick"),
    ("gtr", "guitar"),
    ("gtrs", "guitar"),
    ("guit", "guitar"),
    ("guitars", "guitar"),
    ("amb", "ambience"),
    ("ambiance", "ambience"),
    ("ambient", "ambience"),
    ("ambi", "ambience"),
    ("vox", "vocal"),
    ("voc", "vocal"),
    ("vocals", "vocal"),
];

fn canonical(token: &str) -> &str {
    ABBREVIATIONS
        .iter()
        .find(|(variant, _)| *variant == token)
        .map(|(_, canon)| *canon)
        .unwrap_or(token)
}

/// Normalize a track name for comparison.
///
/// Lowercases, turns `_ - . /` into spaces, collapses whitespace, drops a
/// leading numeric token (`"02 kick"` → `"kick"`) and canonicalizes common
/// abbreviations. A name that is only a number keeps it.
pub fn normalize(name: &str) -> String {
    let lowered: String = name
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '_' | '-' | '.' | '/' => ' ',
            other => other,
        })
        .collect();

    let mut tokens: Vec<&str> = lowered.split_whitespace().collect();
    if tokens.len() > 1 && tokens[0].chars().all(|c| c.is_ascii_digit()) {
        tokens.remove(0);
    }

    tokens
        .into_iter()
        .map(canonical)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip a trailing file-extension-like suffix (`kick.wav` → `kick`).
///
/// The suffix must be 1 to 5 alphanumeric characters with at least one
/// letter, so `Take 1.2` is left alone.
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && ext.chars().any(|c| c.is_ascii_alphabetic()) =>
        {
            stem
        }
        _ => name,
    }
}

/// Split a normalized name into a base and a trailing number:
/// `"tom 2"` → `("tom", 2)`, `"tom2"` → `("tom", 2)`.
pub fn numeric_suffix(normalized: &str) -> Option<(&str, u32)> {
    let digits_at = normalized
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    let base = normalized[..digits_at].trim_end();
    if base.is_empty() {
        return None;
    }
    let n = normalized[digits_at..].parse().ok()?;
    Some((base, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_and_case() {
        assert_eq!(normalize("Snare_Top"), "snare top");
        assert_eq!(normalize("  OH-L.wav "), "oh l wav");
        assert_eq!(normalize("Bus/Drums"), "bus drums");
    }

    #[test]
    fn test_numeric_prefix_stripped() {
        assert_eq!(normalize("02 Kick"), "kick");
        assert_eq!(normalize("02_Kick_In"), "kick in");
        assert_eq!(normalize("01"), "01");
        assert_eq!(normalize("Tom 2"), "tom 2");
    }

    #[test]
    fn test_abbreviations() {
        assert_eq!(normalize("BD"), "kick");
        assert_eq!(normalize("Kik In"), "kick in");
        assert_eq!(normalize("Gtrs L"), "guitar l");
        assert_eq!(normalize("Room Amb"), "room ambience");
        assert_eq!(normalize("Lead Vox"), "lead vocal");
        // Only whole tokens are replaced
        assert_eq!(normalize("Voice"), "voice");
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("kick.wav"), "kick");
        assert_eq!(strip_extension("Overheads.flac"), "Overheads");
        assert_eq!(strip_extension("Take 1.2"), "Take 1.2");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }

    #[test]
    fn test_numeric_suffix() {
        assert_eq!(numeric_suffix("tom 2"), Some(("tom", 2)));
        assert_eq!(numeric_suffix("tom12"), Some(("tom", 12)));
        assert_eq!(numeric_suffix("tom"), None);
        assert_eq!(numeric_suffix("42"), None);
    }
}
