//! 角色表与音色解析

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::voice::{VoiceLibrary, VoiceRef};

/// 旁白角色名
pub const NARRATOR_ROLE: &str = "narrator";

/// 未分配角色时读出的角色名
pub const UNASSIGNED_ROLE: &str = "unassigned";

/// 是否为旁白（含中文同义词）
pub fn is_narrator(name: &str) -> bool {
    let name = name.trim();
    name.eq_ignore_ascii_case(NARRATOR_ROLE) || matches!(name, "旁白" | "叙述者" | "叙述")
}

/// 规范化角色名：去空白，旁白同义词统一为 narrator
pub fn canonical_role_name(name: &str) -> String {
    if is_narrator(name) {
        NARRATOR_ROLE.to_string()
    } else {
        name.trim().to_string()
    }
}

/// 角色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    name: String,
    voice: Option<VoiceRef>,
    description: Option<String>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            voice: None,
            description: None,
        }
    }

    pub fn with_voice(mut self, voice: Option<VoiceRef>) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn voice(&self) -> Option<&VoiceRef> {
        self.voice.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// 角色表：名称唯一，保持加入顺序
///
/// 角色表独立于片段列表存在，重新分段不会清除角色
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTable {
    roles: Vec<Role>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// 新增或更新角色；已存在时只覆盖给出的字段
    pub fn upsert(&mut self, role: Role) {
        match self.roles.iter_mut().find(|r| r.name == role.name) {
            Some(existing) => {
                if role.voice.is_some() {
                    existing.voice = role.voice;
                }
                if role.description.is_some() {
                    existing.description = role.description;
                }
            }
            None => self.roles.push(role),
        }
    }

    /// 仅在角色没有音色时设置
    pub fn fill_voice(&mut self, name: &str, voice: VoiceRef) {
        if let Some(role) = self.roles.iter_mut().find(|r| r.name == name) {
            if role.voice.is_none() {
                role.voice = Some(voice);
            }
        }
    }

    pub fn set_voice(&mut self, name: &str, voice: Option<VoiceRef>) -> bool {
        match self.roles.iter_mut().find(|r| r.name == name) {
            Some(role) => {
                role.voice = voice;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Role> {
        let pos = self.roles.iter().position(|r| r.name == name)?;
        Some(self.roles.remove(pos))
    }

    /// 导出为 {角色名: 音色引用}；没有音色的角色不导出
    pub fn serialize(&self) -> BTreeMap<String, String> {
        self.roles
            .iter()
            .filter_map(|r| r.voice.as_ref().map(|v| (r.name.clone(), v.to_string())))
            .collect()
    }

    /// 从 {角色名: 音色引用} 恢复；空音色视为未设置
    pub fn restore(map: BTreeMap<String, String>) -> Self {
        let roles = map
            .into_iter()
            .filter(|(name, _)| !name.trim().is_empty())
            .map(|(name, voice)| Role::new(name).with_voice(VoiceRef::new(voice).ok()))
            .collect();
        Self { roles }
    }

    /// 解析角色实际使用的音色
    pub fn resolve_voice(&self, role: &str, library: &VoiceLibrary) -> VoiceResolution {
        let reason = match self.get(role) {
            None if role == UNASSIGNED_ROLE || role.is_empty() => FallbackReason::Unassigned,
            None => FallbackReason::UnknownRole,
            Some(r) => match &r.voice {
                None => FallbackReason::NoVoice,
                // 音色库为空时无法校验，直接信任角色表
                Some(v) if library.is_empty() || library.contains(v) => {
                    return VoiceResolution::Assigned { voice: v.clone() };
                }
                Some(_) => FallbackReason::VoiceMissing,
            },
        };

        match library.first() {
            Some(first) => VoiceResolution::Fallback {
                voice: first.voice_ref().clone(),
                reason,
            },
            None => VoiceResolution::Unavailable { reason },
        }
    }
}

/// 为何使用了回退音色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// 该行未分配角色
    Unassigned,
    /// 角色不在角色表中
    UnknownRole,
    /// 角色没有设置音色
    NoVoice,
    /// 角色的音色不在音色库中
    VoiceMissing,
}

/// 音色解析结果：回退是软条件，调用方可以展示但不应视为错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VoiceResolution {
    Assigned {
        voice: VoiceRef,
    },
    Fallback {
        voice: VoiceRef,
        reason: FallbackReason,
    },
    Unavailable {
        reason: FallbackReason,
    },
}

impl VoiceResolution {
    pub fn voice(&self) -> Option<&VoiceRef> {
        match self {
            Self::Assigned { voice } | Self::Fallback { voice, .. } => Some(voice),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Assigned { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::{AudioFormat, VoiceEntry};

    fn vref(s: &str) -> VoiceRef {
        VoiceRef::new(s).unwrap()
    }

    fn library() -> VoiceLibrary {
        VoiceLibrary::new(vec![
            VoiceEntry::new(vref("/v/a.wav"), "a", AudioFormat::Wav),
            VoiceEntry::new(vref("/v/b.wav"), "b", AudioFormat::Wav),
        ])
    }

    #[test]
    fn test_narrator_synonyms() {
        assert!(is_narrator("旁白"));
        assert!(is_narrator(" Narrator "));
        assert!(!is_narrator("林黛玉"));
        assert_eq!(canonical_role_name("叙述者"), NARRATOR_ROLE);
    }

    #[test]
    fn test_upsert_merges_fields() {
        let mut table = RoleTable::new();
        table.upsert(Role::new("A").with_description(Some("少女".into())));
        table.upsert(Role::new("A").with_voice(Some(vref("/v/a.wav"))));
        let role = table.get("A").unwrap();
        assert_eq!(role.description(), Some("少女"));
        assert_eq!(role.voice(), Some(&vref("/v/a.wav")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_resolve_voice_paths() {
        let lib = library();
        let mut table = RoleTable::new();
        table.upsert(Role::new("A").with_voice(Some(vref("/v/b.wav"))));
        table.upsert(Role::new("B"));
        table.upsert(Role::new("C").with_voice(Some(vref("/v/gone.wav"))));

        assert_eq!(table.resolve_voice("A", &lib), VoiceResolution::Assigned { voice: vref("/v/b.wav") });
        assert_eq!(
            table.resolve_voice("B", &lib),
            VoiceResolution::Fallback { voice: vref("/v/a.wav"), reason: FallbackReason::NoVoice }
        );
        assert_eq!(
            table.resolve_voice("C", &lib).voice(),
            Some(&vref("/v/a.wav"))
        );
        assert_eq!(
            table.resolve_voice(UNASSIGNED_ROLE, &VoiceLibrary::default()),
            VoiceResolution::Unavailable { reason: FallbackReason::Unassigned }
        );
    }

    #[test]
    fn test_serialize_restore() {
        let mut table = RoleTable::new();
        table.upsert(Role::new("A").with_voice(Some(vref("/v/a.wav"))));
        table.upsert(Role::new("B"));
        let map = table.serialize();
        assert_eq!(map.len(), 1);

        let restored = RoleTable::restore(map);
        assert_eq!(restored.get("A").unwrap().voice(), Some(&vref("/v/a.wav")));
    }
}
