//! Eligibility selection over an anime's embedded character array.

use chrono::{DateTime, Utc};

use domain::{CharacterRecord, EnrichmentStatus};

use crate::policy::RetryPolicy;

/// Select the characters eligible for automatic enrichment, preserving
/// array order. Pure selection logic, no side effects.
///
/// Rules, evaluated per character:
/// 1. manually protected characters are excluded unconditionally
/// 2. `unset`/`pending` characters are included
/// 3. with `include_retries`, `failed` characters are included only while
///    under the attempt cap and past the cooldown since the last attempt
pub fn select_eligible<'a>(
    characters: &'a [CharacterRecord],
    include_retries: bool,
    policy: &RetryPolicy,
    now: DateTime<Utc>,
) -> Vec<&'a CharacterRecord> {
    characters
        .iter()
        .filter(|c| is_eligible(c, include_retries, policy, now))
        .collect()
}

fn is_eligible(
    character: &CharacterRecord,
    include_retries: bool,
    policy: &RetryPolicy,
    now: DateTime<Utc>,
) -> bool {
    let state = &character.enrichment;

    if state.protection.protected {
        return false;
    }

    match state.status {
        EnrichmentStatus::Unset | EnrichmentStatus::Pending => true,
        EnrichmentStatus::Failed if include_retries => {
            state.attempts < policy.max_attempts && cooldown_elapsed(state.last_attempt_at, policy, now)
        }
        _ => false,
    }
}

fn cooldown_elapsed(
    last_attempt_at: Option<DateTime<Utc>>,
    policy: &RetryPolicy,
    now: DateTime<Utc>,
) -> bool {
    match last_attempt_at {
        // A failed record without a timestamp has nothing to wait on.
        None => true,
        Some(last) => now
            .signed_duration_since(last)
            .to_std()
            .map(|elapsed| elapsed > policy.cooldown)
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn character(name: &str, status: EnrichmentStatus) -> CharacterRecord {
        let mut c = CharacterRecord::new("mal-21", name);
        c.enrichment.status = status;
        c
    }

    #[test]
    fn test_unset_and_pending_included() {
        let chars = vec![
            character("Luffy", EnrichmentStatus::Unset),
            character("Zoro", EnrichmentStatus::Pending),
            character("Nami", EnrichmentStatus::Success),
        ];

        let eligible = select_eligible(&chars, false, &RetryPolicy::default(), Utc::now());
        let names: Vec<_> = eligible.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Luffy", "Zoro"]);
    }

    #[test]
    fn test_protected_excluded_regardless_of_status() {
        let mut unset = character("Luffy", EnrichmentStatus::Unset);
        unset.enrichment.protection.protected = true;
        let mut failed = character("Zoro", EnrichmentStatus::Failed);
        failed.enrichment.protection.protected = true;

        let chars = vec![unset, failed];
        assert!(select_eligible(&chars, true, &RetryPolicy::default(), Utc::now()).is_empty());
    }

    #[test]
    fn test_failed_excluded_without_retry_flag() {
        let chars = vec![character("Zoro", EnrichmentStatus::Failed)];
        assert!(select_eligible(&chars, false, &RetryPolicy::default(), Utc::now()).is_empty());
    }

    #[test]
    fn test_failed_retry_requires_cooldown() {
        let now = Utc::now();
        let mut recent = character("Zoro", EnrichmentStatus::Failed);
        recent.enrichment.attempts = 1;
        recent.enrichment.last_attempt_at = Some(now - Duration::hours(1));

        let mut cooled = character("Nami", EnrichmentStatus::Failed);
        cooled.enrichment.attempts = 1;
        cooled.enrichment.last_attempt_at = Some(now - Duration::hours(25));

        let chars = vec![recent, cooled];
        let eligible = select_eligible(&chars, true, &RetryPolicy::default(), now);
        let names: Vec<_> = eligible.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Nami"]);
    }

    #[test]
    fn test_failed_excluded_at_attempt_cap() {
        let now = Utc::now();
        let mut exhausted = character("Zoro", EnrichmentStatus::Failed);
        exhausted.enrichment.attempts = 3;
        exhausted.enrichment.last_attempt_at = Some(now - Duration::hours(48));

        let chars = vec![exhausted];
        assert!(select_eligible(&chars, true, &RetryPolicy::default(), now).is_empty());
    }

    #[test]
    fn test_skipped_and_success_excluded() {
        let chars = vec![
            character("Luffy", EnrichmentStatus::Success),
            character("Zoro", EnrichmentStatus::Skipped),
        ];
        assert!(select_eligible(&chars, true, &RetryPolicy::default(), Utc::now()).is_empty());
    }

    #[test]
    fn test_empty_character_list() {
        assert!(select_eligible(&[], true, &RetryPolicy::default(), Utc::now()).is_empty());
    }
}
