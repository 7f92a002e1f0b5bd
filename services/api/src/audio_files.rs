//! Reply audio file management.
//!
//! Synthesized replies are written under the static directory with unique
//! names and served back by URL. Files from earlier replies are removed
//! before each new one so the directory never accumulates stale audio.

use anyhow::Context;
use resq_core::adapters::AudioClip;
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;

const AUDIO_FILE_PREFIX: &str = "audio_";

/// Owns the directory where reply audio is staged for serving.
pub struct AudioFileStore {
    dir: PathBuf,
}

impl AudioFileStore {
    pub async fn new(dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create audio directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Removes audio files left over from previous replies.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .context("failed to list audio directory")?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(AUDIO_FILE_PREFIX) {
                continue;
            }
            if let Err(error) = tokio::fs::remove_file(entry.path()).await {
                warn!(file = %name, %error, "failed to delete stale audio file");
            }
        }
        Ok(())
    }

    /// Writes the clip under a fresh unique name and returns that name.
    pub async fn store(&self, clip: &AudioClip) -> anyhow::Result<String> {
        let name = format!(
            "{AUDIO_FILE_PREFIX}{}.{}",
            Uuid::new_v4().simple(),
            clip.format.extension()
        );
        tokio::fs::write(self.dir.join(&name), &clip.data)
            .await
            .with_context(|| format!("failed to write audio file {name}"))?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resq_core::adapters::AudioFormat;

    fn clip() -> AudioClip {
        AudioClip {
            data: vec![1, 2, 3],
            format: AudioFormat::Mp3,
        }
    }

    #[tokio::test]
    async fn store_writes_a_uniquely_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = AudioFileStore::new(dir.path().to_path_buf()).await.unwrap();

        let first = store.store(&clip()).await.unwrap();
        let second = store.store(&clip()).await.unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with(AUDIO_FILE_PREFIX) && first.ends_with(".mp3"));
        assert!(dir.path().join(&first).exists());
    }

    #[tokio::test]
    async fn cleanup_removes_only_audio_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = AudioFileStore::new(dir.path().to_path_buf()).await.unwrap();

        let name = store.store(&clip()).await.unwrap();
        tokio::fs::write(dir.path().join("keep.txt"), b"keep")
            .await
            .unwrap();

        store.cleanup().await.unwrap();

        assert!(!dir.path().join(&name).exists());
        assert!(dir.path().join("keep.txt").exists());
    }
}
