use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Two values in `[-1, 1]` derived from `id`, stable within a build.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Shortens `text` to at most `max_chars` characters, marking the cut.
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let kept = text.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair("42");
        assert_eq!(first, stable_pair("42"));
        assert_ne!(first, stable_pair("43"));
        assert!((-1.0..=1.0).contains(&first.0) && (-1.0..=1.0).contains(&first.1));
    }

    #[test]
    fn truncate_label_keeps_short_text() {
        assert_eq!(truncate_label("Gate", 8), "Gate");
        assert_eq!(truncate_label("Gatekeeper", 5), "Gate…");
    }
}
