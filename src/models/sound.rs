use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

/// A file or folder the UI can offer as a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableItem {
    pub name: String,
    pub kind: ItemKind,
}

impl PlayableItem {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::File,
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Folder,
        }
    }
}

/// What `play` ended up starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayOutcome {
    pub file: String,
    pub folder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    #[serde(default)]
    pub sound_file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub status: &'static str,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl From<PlayOutcome> for PlayResponse {
    fn from(outcome: PlayOutcome) -> Self {
        PlayResponse {
            status: "playing",
            file: outcome.file,
            folder: outcome.folder,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpeakResponse {
    pub status: &'static str,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub message: String,
    pub filename: String,
}
