use std::{env, path::PathBuf};

use directories::ProjectDirs;
use lazy_static::lazy_static;

pub const DEFAULT_API_BASE: &str = "https://playground.4geeks.com";
pub const SONGS_PATH: &str = "/sound/songs";
pub const DEFAULT_SEEK_STEP: f64 = 5.0;

lazy_static! {
    pub static ref PROJECT_NAME: String =
        env!("CARGO_CRATE_NAME").to_uppercase();
    pub static ref DATA_FOLDER: Option<PathBuf> =
        env::var(format!("{}_DATA", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
    pub static ref LOG_ENV: String = format!("{}_LOG_LEVEL", PROJECT_NAME.clone());
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Origin that both the playlist endpoint and song urls hang off.
    pub api_base: String,
    pub seek_step: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            seek_step: DEFAULT_SEEK_STEP,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base) = env::var(format!("{}_API_BASE", *PROJECT_NAME)) {
            config.api_base = base.trim_end_matches('/').to_string();
        }

        if let Some(step) = env::var(format!("{}_SEEK_STEP", *PROJECT_NAME))
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
        {
            config.seek_step = step;
        }

        config
    }

    pub fn songs_url(&self) -> String {
        format!("{}{}", self.api_base, SONGS_PATH)
    }

    /// Absolute media url for a song's relative path, appended verbatim.
    pub fn media_url(&self, relative: &str) -> String {
        format!("{}{}", self.api_base, relative)
    }
}

pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = DATA_FOLDER.clone() {
        dir
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))
}
