//! Store-backed selection and admin operations on enrichment state.

use chrono::Utc;

use domain::{
    CharacterPatch, CharacterRecord, Clearable, EnrichmentStatus, ManualProtection, ResetReport,
};

use crate::error::EnrichmentError;
use crate::locator::select_eligible;
use crate::matcher::locate_character;
use crate::policy::RetryPolicy;
use crate::traits::AnimeStore;

/// Select the enrichment-eligible characters of one anime.
pub async fn select_eligible_for(
    store: &dyn AnimeStore,
    anime_id: i64,
    include_retries: bool,
    policy: &RetryPolicy,
) -> Result<Vec<CharacterRecord>, EnrichmentError> {
    let anime = store
        .get_anime(anime_id)
        .await?
        .ok_or_else(|| EnrichmentError::NotFound(format!("anime {}", anime_id)))?;

    Ok(
        select_eligible(&anime.characters, include_retries, policy, Utc::now())
            .into_iter()
            .cloned()
            .collect(),
    )
}

/// Reset enrichment tracking state for some or all characters of an anime.
///
/// Destructive to tracking fields only: attempts go to zero and the last
/// attempt/error are cleared, but previously enriched profile content is
/// preserved. Names that do not resolve are skipped, not errors.
pub async fn reset_status(
    store: &dyn AnimeStore,
    anime_id: i64,
    character_names: Option<&[String]>,
    reset_to: EnrichmentStatus,
) -> Result<ResetReport, EnrichmentError> {
    let anime = store
        .get_anime(anime_id)
        .await?
        .ok_or_else(|| EnrichmentError::NotFound(format!("anime {}", anime_id)))?;

    let target_keys: Vec<String> = match character_names {
        Some(names) => names
            .iter()
            .filter_map(|name| {
                let idx = locate_character(&anime.characters, name);
                if idx.is_none() {
                    tracing::warn!(
                        "Reset skipped unresolvable character name '{}' in anime {}",
                        name,
                        anime_id
                    );
                }
                idx.map(|i| anime.characters[i].key.clone())
            })
            .collect(),
        None => anime.characters.iter().map(|c| c.key.clone()).collect(),
    };

    let mut characters_reset = 0;
    for key in &target_keys {
        let patch = CharacterPatch {
            status: Some(reset_to),
            attempts: Some(0),
            last_attempt_at: Clearable::Clear,
            last_error: Clearable::Clear,
            ..Default::default()
        };
        if store.update_character(anime_id, key, patch).await? {
            characters_reset += 1;
        }
    }

    tracing::info!(
        "Reset {} character(s) in anime {} to '{}'",
        characters_reset,
        anime_id,
        reset_to.as_str()
    );

    Ok(ResetReport {
        characters_reset,
        reset_to,
    })
}

/// Toggle manual protection for one named character.
///
/// A protected character is excluded from all automatic enrichment
/// regardless of its status. Returns the updated record, or `None` when
/// the name does not resolve.
pub async fn set_protection(
    store: &dyn AnimeStore,
    anime_id: i64,
    character_name: &str,
    protected: bool,
    by: Option<String>,
) -> Result<Option<CharacterRecord>, EnrichmentError> {
    let anime = store
        .get_anime(anime_id)
        .await?
        .ok_or_else(|| EnrichmentError::NotFound(format!("anime {}", anime_id)))?;

    let Some(idx) = locate_character(&anime.characters, character_name) else {
        return Ok(None);
    };
    let key = anime.characters[idx].key.clone();

    let patch = CharacterPatch {
        protection: Some(ManualProtection {
            protected,
            by: if protected { by } else { None },
            at: protected.then(Utc::now),
        }),
        ..Default::default()
    };

    if !store.update_character(anime_id, &key, patch).await? {
        return Ok(None);
    }

    let updated = store
        .get_anime(anime_id)
        .await?
        .and_then(|a| a.characters.into_iter().find(|c| c.key == key));
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{test_anime, test_profile, MockAnimeStore};
    use chrono::Duration;

    #[tokio::test]
    async fn test_reset_clears_tracking_but_preserves_profile() {
        let store = MockAnimeStore::new();
        let mut anime = test_anime(1, "One Piece", &["Zoro", "Nami"]);
        let zoro_key = anime.characters[0].key.clone();
        let nami_key = anime.characters[1].key.clone();

        for c in &mut anime.characters {
            c.enrichment.status = EnrichmentStatus::Failed;
            c.enrichment.attempts = 3;
            c.enrichment.last_attempt_at = Some(Utc::now() - Duration::hours(1));
            c.enrichment.last_error = Some("backend down".to_string());
            c.enrichment.profile = Some(test_profile("analysis to keep"));
        }
        store.insert(anime);

        let report = reset_status(
            &store,
            1,
            Some(&["Zoro".to_string()]),
            EnrichmentStatus::Pending,
        )
        .await
        .unwrap();

        assert_eq!(report.characters_reset, 1);
        assert_eq!(report.reset_to, EnrichmentStatus::Pending);

        let zoro = store.character(1, &zoro_key).unwrap();
        assert_eq!(zoro.enrichment.status, EnrichmentStatus::Pending);
        assert_eq!(zoro.enrichment.attempts, 0);
        assert!(zoro.enrichment.last_attempt_at.is_none());
        assert!(zoro.enrichment.last_error.is_none());
        assert_eq!(
            zoro.enrichment.profile.unwrap().personality_analysis,
            "analysis to keep"
        );

        // Unnamed characters are untouched.
        let nami = store.character(1, &nami_key).unwrap();
        assert_eq!(nami.enrichment.status, EnrichmentStatus::Failed);
        assert_eq!(nami.enrichment.attempts, 3);
    }

    #[tokio::test]
    async fn test_reset_without_names_targets_all_characters() {
        let store = MockAnimeStore::new();
        let mut anime = test_anime(1, "One Piece", &["Roronoa Zoro", "Nami"]);
        for c in &mut anime.characters {
            c.enrichment.status = EnrichmentStatus::Failed;
            c.enrichment.attempts = 2;
        }
        store.insert(anime);

        let report = reset_status(&store, 1, None, EnrichmentStatus::Pending)
            .await
            .unwrap();
        assert_eq!(report.characters_reset, 2);
    }

    #[tokio::test]
    async fn test_reset_skips_unresolvable_names() {
        let store = MockAnimeStore::new();
        store.insert(test_anime(1, "One Piece", &["Nami"]));

        let report = reset_status(
            &store,
            1,
            Some(&["Sanji".to_string()]),
            EnrichmentStatus::Pending,
        )
        .await
        .unwrap();
        assert_eq!(report.characters_reset, 0);
    }

    #[tokio::test]
    async fn test_set_protection_marks_character() {
        let store = MockAnimeStore::new();
        let anime = test_anime(1, "One Piece", &["Nami"]);
        let key = anime.characters[0].key.clone();
        store.insert(anime);

        let updated = set_protection(&store, 1, "Nami", true, Some("curator".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert!(updated.enrichment.protection.protected);
        assert_eq!(updated.enrichment.protection.by.as_deref(), Some("curator"));

        // Protected characters never show up in automatic selection.
        let eligible = select_eligible_for(&store, 1, true, &RetryPolicy::default())
            .await
            .unwrap();
        assert!(eligible.is_empty());

        let cleared = set_protection(&store, 1, "Nami", false, None)
            .await
            .unwrap()
            .unwrap();
        assert!(!cleared.enrichment.protection.protected);
        assert_eq!(cleared.key, key);
    }
}
