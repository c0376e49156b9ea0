mod anime;
mod kv;

pub use anime::{AnimeRepository, CreateAnime, CreateCharacter, SqliteAnimeStore};
pub use kv::{KvRepository, SqliteTtlStore};
