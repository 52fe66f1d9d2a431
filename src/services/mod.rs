pub mod audio_output;
pub mod library;
pub mod mp3;
pub mod output_slot;
pub mod playback;
pub mod speaker;
pub mod speech;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use audio_output::{AudioOutput, RodioOutput};
pub use library::{list_playable_items, mp3s_in_dir};
pub use mp3::is_valid_mp3;
pub use output_slot::{OutputSlot, PlaybackState};
pub use playback::PlaybackController;
pub use speaker::SpeechController;
pub use speech::{SpeechBackend, SpeechState, SpeechWorker};
pub use upload::{sanitize_filename, UploadHandler};
