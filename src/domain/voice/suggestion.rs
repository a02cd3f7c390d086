//! 音色推荐
//!
//! 根据角色名和描述中的关键词（性别、年龄、身份）在音色库中挑选候选，
//! 优先使用本轮结果中尚未被其他角色占用的音色。

use std::collections::HashMap;

use super::{VoiceLibrary, VoiceRef};

/// 角色原型：角色侧关键词 → 音色名关键词
struct Archetype {
    role_cues: &'static [&'static str],
    voice_cues: &'static [&'static str],
    /// 包含这些词时不算命中（"female" 含 "male"）
    excludes: &'static [&'static str],
}

impl Archetype {
    fn hit(&self, text: &str, cues: &[&str]) -> bool {
        !self.excludes.iter().any(|x| text.contains(x)) && cues.iter().any(|c| text.contains(c))
    }
}

const ARCHETYPES: &[Archetype] = &[
    Archetype {
        role_cues: &["旁白", "叙述", "narrator"],
        voice_cues: &["旁白", "叙述", "播音", "narrat", "neutral"],
        excludes: &[],
    },
    Archetype {
        role_cues: &["老", "爷爷", "奶奶", "婆", "翁", "长老", "elder", "old"],
        voice_cues: &["老", "elder", "old"],
        excludes: &[],
    },
    Archetype {
        role_cues: &["孩", "童", "小朋友", "宝宝", "child", "kid", "boy", "girl"],
        voice_cues: &["童", "孩", "child", "kid"],
        excludes: &[],
    },
    Archetype {
        role_cues: &[
            "女", "她", "姐", "妹", "妈", "母", "娘", "夫人", "小姐", "公主", "woman", "female",
            "lady", "girl", "mother",
        ],
        voice_cues: &["女", "female", "woman", "girl"],
        excludes: &[],
    },
    Archetype {
        role_cues: &[
            "男", "他", "哥", "弟", "爸", "父", "先生", "公子", "少爷", "王", "man", "male",
            "boy", "father",
        ],
        voice_cues: &["男", "male", "man", "boy"],
        excludes: &["female", "woman", "女"],
    },
];

/// 为角色挑选音色
///
/// `usage` 记录本轮已被其他角色使用的音色及次数。
/// 规则：未被使用的关键词候选 > 使用次数最少的关键词候选 > 音色库第一个音色。
/// 音色库为空时返回 None。
pub fn suggest_voice(
    role_name: &str,
    description: Option<&str>,
    library: &VoiceLibrary,
    usage: &HashMap<VoiceRef, usize>,
) -> Option<VoiceRef> {
    let haystack = format!("{} {}", role_name, description.unwrap_or_default()).to_lowercase();

    let candidates: Vec<&VoiceRef> = ARCHETYPES
        .iter()
        .filter(|a| a.hit(&haystack, a.role_cues))
        .flat_map(move |a| {
            library
                .voices()
                .iter()
                .filter(move |v| a.hit(&v.name().to_lowercase(), a.voice_cues))
        })
        .map(|v| v.voice_ref())
        .collect();

    let used = |r: &VoiceRef| usage.get(r).copied().unwrap_or(0);

    if let Some(free) = candidates.iter().copied().find(|r| used(*r) == 0) {
        return Some(free.clone());
    }
    if let Some(least) = candidates.iter().copied().min_by_key(|r| used(*r)) {
        return Some(least.clone());
    }
    library.first().map(|v| v.voice_ref().clone())
}
