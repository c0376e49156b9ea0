use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use domain::{AnimeRecord, CharacterPatch, CharacterRecord};
use enrichment::{AnimeStore, EnrichmentError};

/// Retries of the optimistic update loop before giving up.
const UPDATE_RETRIES: u32 = 3;

/// Common SELECT fields for anime queries
const SELECT_ANIME: &str = r#"
    SELECT
        id, source_id, title, characters, version,
        created_at, updated_at
    FROM anime
"#;

/// New anime ingested from an external source.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAnime {
    pub source_id: String,
    pub title: String,
    #[serde(default)]
    pub characters: Vec<CreateCharacter>,
}

/// Character stub inside an ingestion request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCharacter {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

pub struct AnimeRepository;

impl AnimeRepository {
    /// Ingest a new anime; stable character keys are assigned here and
    /// never recomputed afterwards.
    pub async fn create(pool: &SqlitePool, data: CreateAnime) -> Result<AnimeRecord, sqlx::Error> {
        let characters: Vec<CharacterRecord> = data
            .characters
            .iter()
            .map(|c| {
                let mut record = CharacterRecord::new(&data.source_id, c.name.clone());
                record.role = c.role.clone();
                record.description = c.description.clone();
                record
            })
            .collect();

        let characters_json =
            serde_json::to_string(&characters).unwrap_or_else(|_| "[]".to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO anime (source_id, title, characters)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&data.source_id)
        .bind(&data.title)
        .bind(&characters_json)
        .fetch_one(pool)
        .await?;

        let id: i64 = sqlx::Row::get(&result, "id");
        Self::get_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Get an anime by ID with its embedded characters.
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<AnimeRecord>, sqlx::Error> {
        let query = format!("{} WHERE id = $1", SELECT_ANIME);
        let row = sqlx::query_as::<_, AnimeRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Fetch one page of anime ordered by id.
    pub async fn list_page(
        pool: &SqlitePool,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<AnimeRecord>, sqlx::Error> {
        let query = format!("{} ORDER BY id LIMIT $1 OFFSET $2", SELECT_ANIME);
        let rows = sqlx::query_as::<_, AnimeRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Atomically patch one embedded character.
    ///
    /// Read-transform-write with optimistic versioning: the UPDATE only
    /// applies when the row version is unchanged, so concurrent patches to
    /// different characters of the same anime retry instead of clobbering
    /// each other. Returns `false` when the anime or character is gone.
    pub async fn update_character(
        pool: &SqlitePool,
        anime_id: i64,
        character_key: &str,
        patch: CharacterPatch,
    ) -> Result<bool, sqlx::Error> {
        for _ in 0..UPDATE_RETRIES {
            let query = format!("{} WHERE id = $1", SELECT_ANIME);
            let Some(row) = sqlx::query_as::<_, AnimeRow>(&query)
                .bind(anime_id)
                .fetch_optional(pool)
                .await?
            else {
                return Ok(false);
            };

            let version = row.version;
            let mut characters = parse_characters(&row.characters);
            let Some(character) = characters.iter_mut().find(|c| c.key == character_key) else {
                return Ok(false);
            };
            patch.clone().apply(character);

            let characters_json =
                serde_json::to_string(&characters).unwrap_or_else(|_| "[]".to_string());

            let result = sqlx::query(
                r#"
                UPDATE anime
                SET characters = $1, version = version + 1, updated_at = $2
                WHERE id = $3 AND version = $4
                "#,
            )
            .bind(&characters_json)
            .bind(Utc::now())
            .bind(anime_id)
            .bind(version)
            .execute(pool)
            .await?;

            if result.rows_affected() > 0 {
                return Ok(true);
            }

            tracing::debug!(
                "Version conflict updating character {} in anime {}, retrying",
                character_key,
                anime_id
            );
        }

        Err(sqlx::Error::Protocol(format!(
            "persistent version conflict updating anime {}",
            anime_id
        )))
    }
}

/// [`AnimeStore`] implementation over the SQLite repository.
pub struct SqliteAnimeStore {
    pool: SqlitePool,
}

impl SqliteAnimeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnimeStore for SqliteAnimeStore {
    async fn get_anime(&self, id: i64) -> Result<Option<AnimeRecord>, EnrichmentError> {
        AnimeRepository::get_by_id(&self.pool, id)
            .await
            .map_err(|e| EnrichmentError::Store(e.to_string()))
    }

    async fn list_anime_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<AnimeRecord>, EnrichmentError> {
        AnimeRepository::list_page(&self.pool, offset, limit)
            .await
            .map_err(|e| EnrichmentError::Store(e.to_string()))
    }

    async fn update_character(
        &self,
        anime_id: i64,
        character_key: &str,
        patch: CharacterPatch,
    ) -> Result<bool, EnrichmentError> {
        AnimeRepository::update_character(&self.pool, anime_id, character_key, patch)
            .await
            .map_err(|e| EnrichmentError::Store(e.to_string()))
    }
}

/// Internal row type for mapping SQLite results
#[derive(Debug, sqlx::FromRow)]
struct AnimeRow {
    id: i64,
    source_id: String,
    title: String,
    characters: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AnimeRow> for AnimeRecord {
    fn from(row: AnimeRow) -> Self {
        AnimeRecord {
            id: row.id,
            source_id: row.source_id,
            title: row.title,
            characters: parse_characters(&row.characters),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn parse_characters(raw: &str) -> Vec<CharacterRecord> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!("Failed to parse characters column: {}", e);
        vec![]
    })
}
