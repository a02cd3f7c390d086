//! 提示词构建与分批规划

use std::fmt::Write;
use std::ops::Range;

use crate::domain::text::weighted_length;

/// 触发分批的最小总长度（加权单位）
pub const CHUNK_THRESHOLD_FLOOR: usize = 1500;
/// 单批预算下限 / 上限（加权单位）
pub const BATCH_BUDGET_MIN: usize = 1200;
pub const BATCH_BUDGET_MAX: usize = 2800;

pub const SYSTEM_PROMPT: &str = "你是一名有声书导演，负责把文本拆分为适合逐句配音的片段，\
并为每个片段标注说话角色、情感和语速。只输出 JSON，不要输出任何解释。";

/// 构建提示词所需的上下文
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// 已识别的角色（含之前批次发现的）
    pub known_roles: Vec<String>,
    /// 候选音色名（最多 20 个）
    pub voices: Vec<String>,
    /// 每段目标长度（汉字单位）
    pub min_len: usize,
    pub max_len: usize,
    /// 批次信息：(当前批次序号从 1 开始, 总批次数)
    pub batch: Option<(usize, usize)>,
}

/// 总长度超过 max(1500, 2×max_tokens) 时需要分批
pub fn needs_chunking(lines: &[String], max_tokens: usize) -> bool {
    let total: usize = lines.iter().map(|l| weighted_length(l)).sum();
    total > CHUNK_THRESHOLD_FLOOR.max(max_tokens.saturating_mul(2))
}

/// 单批预算：clamp(max_tokens, 1200, 2800)
pub fn batch_budget(max_tokens: usize) -> usize {
    max_tokens.clamp(BATCH_BUDGET_MIN, BATCH_BUDGET_MAX)
}

/// 把行切成连续批次；单行超预算时独占一批
pub fn plan_batches(lines: &[String], max_tokens: usize) -> Vec<Range<usize>> {
    if lines.is_empty() {
        return Vec::new();
    }
    if !needs_chunking(lines, max_tokens) {
        return vec![0..lines.len()];
    }

    let budget = batch_budget(max_tokens);
    let mut batches = Vec::new();
    let mut start = 0;
    let mut used = 0;

    for (i, line) in lines.iter().enumerate() {
        let w = weighted_length(line);
        if i > start && used + w > budget {
            batches.push(start..i);
            start = i;
            used = 0;
        }
        used += w;
    }
    batches.push(start..lines.len());
    batches
}

/// 构建一批的用户提示词
pub fn build_prompt(lines: &[String], ctx: &PromptContext) -> String {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "## 任务");
    let _ = writeln!(
        prompt,
        "把下面编号的文本重新拆分为适合配音的片段（每段约 {}–{} 个汉字），\
不得增删或改写任何文字，并为每个片段标注：",
        ctx.min_len, ctx.max_len
    );
    let _ = writeln!(prompt, "- role: 说话角色；叙述性文字一律使用 \"narrator\"");
    let _ = writeln!(prompt, "- type: \"dialogue\" 或 \"narration\"");
    let _ = writeln!(
        prompt,
        "- emotion: 情感标签（喜/怒/哀/惧/厌恶/低落/惊喜/平静）"
    );
    let _ = writeln!(
        prompt,
        "- emotion_vector: 8 个 0–1 的数，顺序为 [喜, 怒, 哀, 惧, 厌恶, 低落, 惊喜, 平静]"
    );
    let _ = writeln!(prompt, "- speaking_speed: 语速系数 0.5–2.0，正常为 1.0");
    prompt.push('\n');

    if let Some((current, total)) = ctx.batch {
        let _ = writeln!(
            prompt,
            "这是第 {}/{} 批文本，请沿用已识别的角色名，不要为同一人物起新名字。\n",
            current, total
        );
    }

    if !ctx.known_roles.is_empty() {
        let _ = writeln!(prompt, "## 已识别的角色");
        for role in &ctx.known_roles {
            let _ = writeln!(prompt, "- {}", role);
        }
        prompt.push('\n');
    }

    if !ctx.voices.is_empty() {
        let _ = writeln!(prompt, "## 可选音色");
        for voice in ctx.voices.iter().take(crate::domain::voice::MAX_PROMPT_VOICES) {
            let _ = writeln!(prompt, "- {}", voice);
        }
        prompt.push('\n');
    }

    let _ = writeln!(prompt, "## 输出格式");
    let _ = writeln!(
        prompt,
        r#"{{"roles":[{{"name":"","description":"","suggested_voice":""}}],
"segments":[{{"text":"","role":"","type":"dialogue","emotion":"","emotion_vector":[0,0,0,0,0,0,0,0],"speaking_speed":1.0}}],
"assignments":[{{"line":1,"role":"","text":"","emotion":"","emotion_vector":[0,0,0,0,0,0,0,0],"speaking_speed":1.0}}]}}"#
    );
    prompt.push('\n');

    let _ = writeln!(prompt, "## 文本");
    for (i, line) in lines.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, line);
    }

    prompt
}
