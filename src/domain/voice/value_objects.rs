//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// 音色引用 - 对外部合成服务不透明的标识（通常是参考音频路径）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceRef(String);

impl VoiceRef {
    pub fn new(value: impl Into<String>) -> Result<Self, &'static str> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err("音色引用不能为空");
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 音频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::Ogg),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Flac => "audio/flac",
            Self::Ogg => "audio/ogg",
        }
    }
}

/// 音色库条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceEntry {
    voice_ref: VoiceRef,
    name: String,
    format: AudioFormat,
}

impl VoiceEntry {
    pub fn new(voice_ref: VoiceRef, name: impl Into<String>, format: AudioFormat) -> Self {
        Self {
            voice_ref,
            name: name.into(),
            format,
        }
    }

    /// 由音频文件路径构造：引用为路径，名称为文件名主干
    pub fn from_path(path: &Path) -> Option<Self> {
        let format = AudioFormat::from_path(path)?;
        let name = path.file_stem()?.to_str()?.to_string();
        let voice_ref = VoiceRef::new(path.to_string_lossy().into_owned()).ok()?;
        Some(Self::new(voice_ref, name, format))
    }

    pub fn voice_ref(&self) -> &VoiceRef {
        &self.voice_ref
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_entry_from_path() {
        let entry = VoiceEntry::from_path(&PathBuf::from("/voices/女声-温柔.WAV")).unwrap();
        assert_eq!(entry.name(), "女声-温柔");
        assert_eq!(entry.format(), AudioFormat::Wav);
        assert_eq!(entry.voice_ref().as_str(), "/voices/女声-温柔.WAV");

        assert!(VoiceEntry::from_path(&PathBuf::from("/voices/readme.txt")).is_none());
    }

    #[test]
    fn test_voice_ref_rejects_blank() {
        assert!(VoiceRef::new("  ").is_err());
    }
}
