use crate::errors::{AppError, AppResult};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of [`FavoritesStore::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Favorite grants, keyed by title and persisted as a JSON array.
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    path: PathBuf,
    titles: BTreeSet<String>,
}

impl FavoritesStore {
    /// Loads the store at `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> AppResult<Self> {
        let titles = match fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => BTreeSet::new(),
            Ok(contents) => serde_json::from_str::<Vec<String>>(&contents)?
                .into_iter()
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                return Err(AppError::IoError(format!(
                    "Failed to read favorites {}: {e}",
                    path.display()
                )))
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            titles,
        })
    }

    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains(title)
    }

    /// Titles in alphabetical order.
    pub fn list(&self) -> impl Iterator<Item = &str> {
        self.titles.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Adds the title if absent, removes it otherwise, and saves the store.
    pub fn toggle(&mut self, title: &str) -> AppResult<ToggleOutcome> {
        let outcome = if self.titles.remove(title) {
            info!(title = title, "Eliminado de favoritos");
            ToggleOutcome::Removed
        } else {
            self.titles.insert(title.to_string());
            info!(title = title, "Agregado a favoritos");
            ToggleOutcome::Added
        };
        self.save()?;
        Ok(outcome)
    }

    pub fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::IoError(format!("Failed to create favorites directory: {e}"))
            })?;
        }
        let titles: Vec<&str> = self.list().collect();
        let json = serde_json::to_string_pretty(&titles)
            .map_err(|e| AppError::SerializationError(format!("Failed to encode favorites: {e}")))?;
        fs::write(&self.path, json).map_err(|e| {
            AppError::IoError(format!(
                "Failed to write favorites {}: {e}",
                self.path.display()
            ))
        })
    }
}
