pub mod sound;

pub use sound::{
    ItemKind, PlayOutcome, PlayRequest, PlayResponse, PlayableItem, SpeakRequest, SpeakResponse,
    StopResponse, UploadResponse,
};
