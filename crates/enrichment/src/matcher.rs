//! Name-based character lookup.
//!
//! Character identity is the stable key assigned at ingestion; name
//! matching survives only as the shim for caller-supplied names (the
//! on-demand API, admin resets, legacy data).

use domain::CharacterRecord;

/// Minimum shorter/longer length ratio for a fuzzy containment match.
/// Names must be within roughly 20% of each other's length.
const FUZZY_LENGTH_RATIO: f64 = 0.8;

/// Normalize a character name for comparison: trim, lowercase, strip
/// non-alphanumeric/non-space characters, collapse internal whitespace.
pub fn normalize_name(name: &str) -> String {
    let stripped: String = name
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a character name to its index in the array.
///
/// Matching order, first match wins, stable by array order:
/// 1. exact raw-string equality
/// 2. equality after normalization
/// 3. fuzzy: one normalized name contains the other AND their lengths are
///    within the [`FUZZY_LENGTH_RATIO`] bound
pub fn locate_character(characters: &[CharacterRecord], target: &str) -> Option<usize> {
    if let Some(idx) = characters.iter().position(|c| c.name == target) {
        return Some(idx);
    }

    let target_norm = normalize_name(target);
    if target_norm.is_empty() {
        return None;
    }

    if let Some(idx) = characters
        .iter()
        .position(|c| normalize_name(&c.name) == target_norm)
    {
        return Some(idx);
    }

    characters.iter().position(|c| {
        let name_norm = normalize_name(&c.name);
        if name_norm.is_empty() {
            return false;
        }
        let contains = name_norm.contains(&target_norm) || target_norm.contains(&name_norm);
        contains && length_ratio(&name_norm, &target_norm) > FUZZY_LENGTH_RATIO
    })
}

fn length_ratio(a: &str, b: &str) -> f64 {
    let la = a.chars().count() as f64;
    let lb = b.chars().count() as f64;
    if la == 0.0 || lb == 0.0 {
        return 0.0;
    }
    la.min(lb) / la.max(lb)
}
