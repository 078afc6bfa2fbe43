use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use super::pieces::GamePiece;

const VERSION_NUMBER: &str = "v13.2.2";
const DEFAULT_TABLE: &str = "Table_RPG";
const DEFAULT_SKY: &str = "Sky_Cathedral";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to encode save file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write save file: {0}")]
    Io(#[from] std::io::Error),
}

/// Minimal save document. Everything else is filled in by the game when it loads.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SaveFile {
    pub save_name: String,
    pub game_mode: String,
    pub version_number: String,
    pub table: String,
    pub sky: String,
    pub object_states: Vec<GamePiece>,
}

impl SaveFile {
    pub fn new(save_name: impl Into<String>) -> Self {
        Self {
            save_name: save_name.into(),
            game_mode: String::new(),
            version_number: VERSION_NUMBER.to_string(),
            table: DEFAULT_TABLE.to_string(),
            sky: DEFAULT_SKY.to_string(),
            object_states: Vec::new(),
        }
    }

    pub fn add_piece(&mut self, piece: GamePiece) {
        self.object_states.push(piece);
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, SaveError> {
        Ok(if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }

    pub async fn write_to(&self, path: &Path) -> Result<(), SaveError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.to_json(true)?).await?;
        tracing::info!(path = %path.display(), objects = self.object_states.len(), "saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> SaveFile {
        let mut save = SaveFile::new("Battleground");
        save.add_piece(GamePiece::bag(
            "abc123".to_string(),
            "Root".to_string(),
            Vec::new(),
        ));
        save
    }

    #[test]
    fn serializes_top_level_fields() {
        let value: serde_json::Value =
            serde_json::from_str(&sample().to_json(false).unwrap()).unwrap();
        assert_eq!(value["SaveName"], "Battleground");
        assert_eq!(value["VersionNumber"], VERSION_NUMBER);
        assert_eq!(value["ObjectStates"][0]["Name"], "Bag");
        assert_eq!(value["ObjectStates"][0]["GUID"], "abc123");
    }

    #[tokio::test]
    async fn writes_pretty_json_creating_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("save.json");

        sample().write_to(&path).await.unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(text.contains("\n  \"SaveName\": \"Battleground\""));
    }
}
