//! Voice Context - 音色库快照

use serde::{Deserialize, Serialize};

use super::{VoiceEntry, VoiceRef};

/// 提示词中最多列出的候选音色数
pub const MAX_PROMPT_VOICES: usize = 20;

/// 音色库
///
/// 不变量:
/// - 条目按名称排序，"第一个可用音色" 即排序后的第一个
/// - 引用不重复
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceLibrary {
    voices: Vec<VoiceEntry>,
}

impl VoiceLibrary {
    pub fn new(mut voices: Vec<VoiceEntry>) -> Self {
        // 先按引用去重（保留名称最小的一条），再按名称排序
        voices.sort_by(|a, b| {
            a.voice_ref()
                .cmp(b.voice_ref())
                .then_with(|| a.name().cmp(b.name()))
        });
        voices.dedup_by(|a, b| a.voice_ref() == b.voice_ref());
        voices.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| a.voice_ref().cmp(b.voice_ref()))
        });
        Self { voices }
    }

    pub fn voices(&self) -> &[VoiceEntry] {
        &self.voices
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// 第一个可用音色（回退音色）
    pub fn first(&self) -> Option<&VoiceEntry> {
        self.voices.first()
    }

    pub fn contains(&self, voice_ref: &VoiceRef) -> bool {
        self.voices.iter().any(|v| v.voice_ref() == voice_ref)
    }

    pub fn get(&self, voice_ref: &VoiceRef) -> Option<&VoiceEntry> {
        self.voices.iter().find(|v| v.voice_ref() == voice_ref)
    }

    /// 按引用或显示名查找（AI 可能只返回名称）
    pub fn find(&self, key: &str) -> Option<&VoiceEntry> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        self.voices
            .iter()
            .find(|v| v.voice_ref().as_str() == key)
            .or_else(|| self.voices.iter().find(|v| v.name() == key))
            .or_else(|| {
                self.voices
                    .iter()
                    .find(|v| v.name().eq_ignore_ascii_case(key))
            })
    }

    /// 提示词使用的候选音色名（最多 20 个）
    pub fn prompt_candidates(&self) -> Vec<String> {
        self.voices
            .iter()
            .take(MAX_PROMPT_VOICES)
            .map(|v| v.name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::AudioFormat;

    fn entry(name: &str) -> VoiceEntry {
        VoiceEntry::new(
            VoiceRef::new(format!("/v/{}.wav", name)).unwrap(),
            name,
            AudioFormat::Wav,
        )
    }

    #[test]
    fn test_library_sorted_and_first() {
        let lib = VoiceLibrary::new(vec![entry("c"), entry("a"), entry("b"), entry("a")]);
        assert_eq!(lib.len(), 3);
        assert_eq!(lib.first().unwrap().name(), "a");
    }

    #[test]
    fn test_duplicate_ref_with_different_names_kept_once() {
        let shared = VoiceRef::new("/v/shared.wav").unwrap();
        let lib = VoiceLibrary::new(vec![
            VoiceEntry::new(shared.clone(), "zeta", AudioFormat::Wav),
            entry("m"),
            VoiceEntry::new(shared.clone(), "alpha", AudioFormat::Wav),
        ]);
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.get(&shared).unwrap().name(), "alpha");
        assert_eq!(lib.first().unwrap().name(), "alpha");
    }

    #[test]
    fn test_find_by_ref_or_name() {
        let lib = VoiceLibrary::new(vec![entry("Alice"), entry("bob")]);
        assert_eq!(lib.find("/v/bob.wav").unwrap().name(), "bob");
        assert_eq!(lib.find("alice").unwrap().name(), "Alice");
        assert!(lib.find("").is_none());
        assert!(lib.find("carol").is_none());
    }

    #[test]
    fn test_prompt_candidates_limited() {
        let voices = (0..30).map(|i| entry(&format!("v{:02}", i))).collect();
        let lib = VoiceLibrary::new(voices);
        assert_eq!(lib.prompt_candidates().len(), MAX_PROMPT_VOICES);
    }
}
