//! 文件系统音色库
//!
//! 音色目录下的每个音频文件（wav / mp3 / flac / ogg）即一个音色，
//! 引用为文件路径，名称为文件名主干。每次读取都重新扫描目录。

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use crate::application::ports::{VoiceLibraryError, VoiceLibraryPort};
use crate::domain::voice::{VoiceEntry, VoiceLibrary, VoiceRef};

pub struct FsVoiceLibrary {
    voices_dir: PathBuf,
}

impl FsVoiceLibrary {
    pub fn new(voices_dir: impl Into<PathBuf>) -> Self {
        Self {
            voices_dir: voices_dir.into(),
        }
    }

    pub fn voices_dir(&self) -> &PathBuf {
        &self.voices_dir
    }
}

#[async_trait]
impl VoiceLibraryPort for FsVoiceLibrary {
    async fn load(&self) -> Result<VoiceLibrary, VoiceLibraryError> {
        let mut dir = match fs::read_dir(&self.voices_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(dir = %self.voices_dir.display(), "Voices directory missing");
                return Ok(VoiceLibrary::default());
            }
            Err(e) => return Err(VoiceLibraryError::IoError(e.to_string())),
        };

        let mut entries = Vec::new();
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| VoiceLibraryError::IoError(e.to_string()))?
        {
            let path = item.path();
            let is_file = item
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(entry) = VoiceEntry::from_path(&path) {
                entries.push(entry);
            }
        }

        let library = VoiceLibrary::new(entries);
        tracing::debug!(
            dir = %self.voices_dir.display(),
            voices = library.len(),
            "Voice library scanned"
        );
        Ok(library)
    }

    async fn read_audio(&self, voice: &VoiceRef) -> Result<Vec<u8>, VoiceLibraryError> {
        // 只允许读取库中的文件
        let library = self.load().await?;
        if !library.contains(voice) {
            return Err(VoiceLibraryError::NotFound(voice.to_string()));
        }
        fs::read(voice.as_str()).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VoiceLibraryError::NotFound(voice.to_string())
            } else {
                VoiceLibraryError::IoError(e.to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_scan_sorted_by_name() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("女声.wav"), b"a").unwrap();
        std::fs::write(dir.path().join("男声.mp3"), b"b").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"c").unwrap();
        std::fs::create_dir(dir.path().join("sub.wav")).unwrap();

        let library = FsVoiceLibrary::new(dir.path()).load().await.unwrap();
        let names: Vec<&str> = library.voices().iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["女声", "男声"]);
        assert_eq!(library.first().unwrap().name(), "女声");
    }

    #[tokio::test]
    async fn test_missing_dir_is_empty_library() {
        let dir = tempdir().unwrap();
        let library = FsVoiceLibrary::new(dir.path().join("missing"))
            .load()
            .await
            .unwrap();
        assert!(library.is_empty());
    }

    #[tokio::test]
    async fn test_read_audio_only_for_known_voices() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("旁白.flac");
        std::fs::write(&path, b"flac-bytes").unwrap();
        let adapter = FsVoiceLibrary::new(dir.path());

        let library = adapter.load().await.unwrap();
        let voice = library.first().unwrap().voice_ref().clone();
        assert_eq!(adapter.read_audio(&voice).await.unwrap(), b"flac-bytes");

        let outside = VoiceRef::new("/etc/passwd").unwrap();
        assert!(matches!(
            adapter.read_audio(&outside).await,
            Err(VoiceLibraryError::NotFound(_))
        ));
    }
}
