use crate::error::{AppError, Result};
use crate::models::PlayOutcome;
use crate::services::library::mp3s_in_dir;
use crate::services::mp3::is_valid_mp3;
use crate::services::output_slot::OutputSlot;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Reject anything that could escape the library root, before touching the disk.
pub fn validate_target(target: &str) -> Result<&str> {
    if target.is_empty() {
        return Err(AppError::InvalidInput(
            "No file or folder specified".to_string(),
        ));
    }

    if target.contains("..")
        || target.starts_with('/')
        || target.contains('\\')
        || target.contains('\0')
        || Path::new(target).is_absolute()
    {
        return Err(AppError::InvalidInput(
            "Invalid file or folder name".to_string(),
        ));
    }

    Ok(target)
}

struct Selection {
    path: PathBuf,
    outcome: PlayOutcome,
}

/// Map a validated target to the file that should play.
fn resolve(root: &Path, target: &str) -> Result<Selection> {
    let path = root.join(target);

    if path.is_file() && is_valid_mp3(&path) {
        return Ok(Selection {
            path,
            outcome: PlayOutcome {
                file: target.to_string(),
                folder: None,
            },
        });
    }

    if path.is_dir() {
        let mp3s = mp3s_in_dir(&path);
        let chosen = mp3s
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| AppError::NotFound("No mp3s in folder".to_string()))?;

        return Ok(Selection {
            path: path.join(chosen),
            outcome: PlayOutcome {
                file: chosen.clone(),
                folder: Some(target.to_string()),
            },
        });
    }

    Err(AppError::NotFound("File or folder not found".to_string()))
}

pub struct PlaybackController {
    root: PathBuf,
    slot: Arc<OutputSlot>,
}

impl PlaybackController {
    pub fn new(root: PathBuf, slot: Arc<OutputSlot>) -> Self {
        Self { root, slot }
    }

    /// Play a file, or a random MP3 from a folder, replacing whatever is on.
    pub async fn play(&self, target: &str) -> Result<PlayOutcome> {
        let target = validate_target(target)?.to_string();

        let root = self.root.clone();
        let selection = tokio::task::spawn_blocking(move || resolve(&root, &target)).await??;

        let _guard = self.slot.acquire().await;
        let output = self.slot.output().clone();
        let path = selection.path.clone();
        tokio::task::spawn_blocking(move || output.play(&path)).await??;

        info!("Playing {}", selection.path.display());
        Ok(selection.outcome)
    }

    /// Stop the current sound; an error if nothing is audible.
    pub async fn stop(&self) -> Result<()> {
        let _guard = self.slot.lock().await;
        let output = self.slot.output();

        if !output.is_busy() {
            return Err(AppError::NoActivePlayback);
        }

        output.stop();
        info!("Stopped sound");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::audio_output::AudioOutput;
    use crate::services::mp3::sample_mp3_bytes;
    use crate::services::output_slot::PlaybackState;
    use crate::services::speech::SpeechWorker;
    use crate::services::testing::{FakeOutput, FakeSpeech};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        output: Arc<FakeOutput>,
        slot: Arc<OutputSlot>,
        controller: PlaybackController,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let output = Arc::new(FakeOutput::default());
        let speech = SpeechWorker::spawn(FakeSpeech::new(1).factory()).unwrap();
        let slot = Arc::new(OutputSlot::new(output.clone(), speech));
        let controller = PlaybackController::new(dir.path().to_path_buf(), slot.clone());
        Fixture {
            dir,
            output,
            slot,
            controller,
        }
    }

    #[test]
    fn test_validate_target() {
        for bad in ["../etc/passwd", "/etc/passwd", "a\\b", "sub/../../x.mp3", "nul\0.mp3"] {
            assert!(
                matches!(validate_target(bad), Err(AppError::InvalidInput(_))),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(matches!(validate_target(""), Err(AppError::InvalidInput(_))));
        assert_eq!(validate_target("horn.mp3").unwrap(), "horn.mp3");
        assert_eq!(validate_target("cheers/one.mp3").unwrap(), "cheers/one.mp3");
    }

    #[tokio::test]
    async fn test_traversal_never_plays() {
        let f = fixture();
        for bad in ["../etc/passwd", "/etc/passwd", "a\\b"] {
            let err = f.controller.play(bad).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
        assert!(f.output.played().is_empty());
    }

    #[tokio::test]
    async fn test_play_file() {
        let f = fixture();
        fs::write(f.dir.path().join("horn.mp3"), sample_mp3_bytes()).unwrap();

        let outcome = f.controller.play("horn.mp3").await.unwrap();

        assert_eq!(
            outcome,
            PlayOutcome {
                file: "horn.mp3".to_string(),
                folder: None
            }
        );
        assert_eq!(
            f.slot.state(),
            PlaybackState::Playing(f.dir.path().join("horn.mp3"))
        );
    }

    #[tokio::test]
    async fn test_play_folder_picks_inside() {
        let f = fixture();
        let folder = f.dir.path().join("folder_x");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("song.mp3"), sample_mp3_bytes()).unwrap();
        fs::write(folder.join("notes.txt"), "liner notes").unwrap();

        for _ in 0..5 {
            let outcome = f.controller.play("folder_x").await.unwrap();
            assert_eq!(outcome.file, "song.mp3");
            assert_eq!(outcome.folder.as_deref(), Some("folder_x"));
        }
        assert_eq!(f.output.played().last(), Some(&folder.join("song.mp3")));
    }

    #[tokio::test]
    async fn test_missing_and_empty_targets() {
        let f = fixture();
        fs::create_dir(f.dir.path().join("empty")).unwrap();
        fs::write(f.dir.path().join("fake.mp3"), "text").unwrap();

        for target in ["missing.mp3", "empty", "fake.mp3"] {
            let err = f.controller.play(target).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)), "{}", target);
        }
    }

    #[tokio::test]
    async fn test_new_sound_replaces_old() {
        let f = fixture();
        fs::write(f.dir.path().join("a.mp3"), sample_mp3_bytes()).unwrap();
        fs::write(f.dir.path().join("b.mp3"), sample_mp3_bytes()).unwrap();

        f.controller.play("a.mp3").await.unwrap();
        f.controller.play("b.mp3").await.unwrap();

        assert_eq!(f.output.stops(), 1);
        assert_eq!(f.output.current(), Some(f.dir.path().join("b.mp3")));
    }

    #[tokio::test]
    async fn test_stop() {
        let f = fixture();
        fs::write(f.dir.path().join("a.mp3"), sample_mp3_bytes()).unwrap();

        assert!(matches!(
            f.controller.stop().await,
            Err(AppError::NoActivePlayback)
        ));

        f.controller.play("a.mp3").await.unwrap();
        f.controller.stop().await.unwrap();
        assert_eq!(f.slot.state(), PlaybackState::Idle);

        assert!(matches!(
            f.controller.stop().await,
            Err(AppError::NoActivePlayback)
        ));
    }
}
