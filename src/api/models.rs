use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Song {
    pub id: i64,
    pub name: String,
    /// Path relative to the api origin, starting with `/`.
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SongsResponse {
    #[serde(default)]
    pub songs: Vec<Song>,
}
