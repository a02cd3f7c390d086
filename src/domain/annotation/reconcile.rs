//! 批次校对与合并
//!
//! 把一批解析结果变成强类型片段，保证用户文字不被改动或丢失：
//! - AI 片段拼接后（忽略空白）必须与本批原文一致，否则改用逐行注解
//! - 逐行注解按行号、再按文本重叠匹配，最后退回旁白
//! - 旁白类型强制使用 narrator 角色
//! - 情感收敛到主轴，超长片段经长度预算器再切分

use std::collections::HashMap;

use super::analysis::{
    lenient_speed, lenient_vector, AnalysisResult, AnalysisRole, AnalyzedSegment, RawAnalysis,
    RawRole, SegmentKind,
};
use super::parser::ParsedAnalysis;
use crate::domain::performance::{
    canonical_role_name, is_narrator, normalize_ai_emotion, EmotionVector, SpeedFactor,
    NARRATOR_ROLE, UNASSIGNED_ROLE,
};
use crate::domain::script::rebudget;
use crate::domain::text::han_count;
use crate::domain::voice::{suggest_voice, VoiceLibrary, VoiceRef};

/// 校对参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// 每段目标长度（汉字单位）
    pub min_len: usize,
    pub max_len: usize,
    /// 关闭时 AI 情感一律清零
    pub adjust_emotion: bool,
    /// 关闭时 AI 语速一律为 1.0
    pub adjust_speed: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            min_len: 5,
            max_len: 25,
            adjust_emotion: true,
            adjust_speed: false,
        }
    }
}

/// 本批片段的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
    /// 采用 AI 的重新分段
    Segments,
    /// 保留原行，使用逐行注解
    Assignments,
    /// 解析失败，启发式猜测
    Heuristic,
    /// 回复中没有可用内容，全部归为旁白
    DefaultNarrator,
}

impl BatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Segments => "segments",
            Self::Assignments => "assignments",
            Self::Heuristic => "heuristic",
            Self::DefaultNarrator => "default_narrator",
        }
    }
}

/// 一批的校对结果
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub roles: Vec<RawRole>,
    pub segments: Vec<AnalyzedSegment>,
    pub source: BatchSource,
}

/// 一条待转换的注解（来自 segments 或 assignments）
struct Annotation<'a> {
    text: &'a str,
    role: Option<&'a str>,
    kind: Option<&'a str>,
    label: Option<&'a str>,
    vector: Option<&'a serde_json::Value>,
    speed: Option<&'a serde_json::Value>,
}

pub fn reconcile_batch(
    parsed: &ParsedAnalysis,
    lines: &[String],
    opts: &ReconcileOptions,
) -> BatchOutcome {
    match parsed {
        ParsedAnalysis::Structured { analysis, .. } => reconcile_structured(analysis, lines, opts),
        ParsedAnalysis::Heuristic { analysis, .. } => {
            let roles = analysis
                .roles
                .iter()
                .map(|name| RawRole {
                    name: name.clone(),
                    description: None,
                    suggested_voice: None,
                })
                .collect();
            let segments = lines
                .iter()
                .zip(&analysis.line_roles)
                .flat_map(|(line, role)| {
                    let kind = if is_narrator(role) { "narration" } else { "dialogue" };
                    build_segments(
                        Annotation {
                            text: line,
                            role: Some(role.as_str()),
                            kind: Some(kind),
                            label: None,
                            vector: None,
                            speed: None,
                        },
                        opts,
                    )
                })
                .collect();
            BatchOutcome {
                roles,
                segments,
                source: BatchSource::Heuristic,
            }
        }
    }
}

fn reconcile_structured(raw: &RawAnalysis, lines: &[String], opts: &ReconcileOptions) -> BatchOutcome {
    let roles: Vec<RawRole> = raw
        .roles
        .iter()
        .filter(|r| !r.name.trim().is_empty())
        .map(|r| RawRole {
            name: canonical_role_name(&r.name),
            description: r.description.clone(),
            suggested_voice: r.suggested_voice.clone(),
        })
        .collect();

    let ai_segments: Vec<Annotation> = raw
        .segments
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| Annotation {
            text: &s.text,
            role: s.role.as_deref(),
            kind: s.kind.as_deref(),
            label: s.emotion.as_deref(),
            vector: s.emotion_vector.as_ref(),
            speed: s.speaking_speed.as_ref(),
        })
        .collect();

    if !ai_segments.is_empty() && texts_match(ai_segments.iter().map(|a| a.text), lines) {
        let segments = ai_segments
            .into_iter()
            .flat_map(|a| build_segments(a, opts))
            .collect();
        return BatchOutcome {
            roles,
            segments,
            source: BatchSource::Segments,
        };
    }

    if raw.is_empty() {
        tracing::warn!(lines = lines.len(), "Reply has no segments or assignments, defaulting to narrator");
        return BatchOutcome {
            roles,
            segments: default_narrator(lines, opts),
            source: BatchSource::DefaultNarrator,
        };
    }

    if !ai_segments.is_empty() {
        tracing::warn!(
            ai_segments = ai_segments.len(),
            lines = lines.len(),
            "AI segments do not reproduce the source text, keeping original lines"
        );
    }

    let segments = lines
        .iter()
        .enumerate()
        .flat_map(|(i, line)| {
            let annotation = annotation_for_line(raw, &ai_segments, i, line);
            build_segments(
                Annotation {
                    text: line,
                    ..annotation
                },
                opts,
            )
        })
        .collect();

    BatchOutcome {
        roles,
        segments,
        source: BatchSource::Assignments,
    }
}

/// 为原文第 i 行找注解：行号 > 文本重叠 > 旁白
fn annotation_for_line<'a>(
    raw: &'a RawAnalysis,
    ai_segments: &[Annotation<'a>],
    i: usize,
    line: &'a str,
) -> Annotation<'a> {
    let by_line = raw
        .assignments
        .iter()
        .find(|a| a.line_number().map(|n| n.saturating_sub(1)) == Some(i));

    let line_key = strip_ws(line);
    let by_overlap = || {
        raw.assignments
            .iter()
            .find(|a| a.text.as_deref().is_some_and(|t| overlaps(&strip_ws(t), &line_key)))
    };

    if let Some(a) = by_line.or_else(by_overlap) {
        return Annotation {
            text: line,
            role: a.role.as_deref(),
            kind: None,
            label: a.emotion.as_deref(),
            vector: a.emotion_vector.as_ref(),
            speed: a.speaking_speed.as_ref(),
        };
    }

    if let Some(s) = ai_segments
        .iter()
        .find(|s| overlaps(&strip_ws(s.text), &line_key))
    {
        return Annotation {
            text: line,
            role: s.role,
            kind: s.kind,
            label: s.label,
            vector: s.vector,
            speed: s.speed,
        };
    }

    Annotation {
        text: line,
        role: Some(NARRATOR_ROLE),
        kind: Some("narration"),
        label: None,
        vector: None,
        speed: None,
    }
}

/// 把一条注解变成一个或多个片段（超长时按预算切分，子片段继承注解）
fn build_segments(a: Annotation<'_>, opts: &ReconcileOptions) -> Vec<AnalyzedSegment> {
    let kind = SegmentKind::parse(a.kind);
    let role = match (kind, a.role.map(canonical_role_name)) {
        (SegmentKind::Narration, _) => NARRATOR_ROLE.to_string(),
        (_, Some(r)) if !r.is_empty() && r != UNASSIGNED_ROLE => r,
        _ => NARRATOR_ROLE.to_string(),
    };

    let emotion = if opts.adjust_emotion {
        normalize_ai_emotion(lenient_vector(a.vector), a.label, is_narrator(&role))
    } else {
        EmotionVector::zero()
    };
    let speed = if opts.adjust_speed {
        lenient_speed(a.speed).unwrap_or_default()
    } else {
        SpeedFactor::NORMAL
    };

    let text = a.text.trim();
    let pieces = if han_count(text) > opts.max_len {
        rebudget(text, opts.max_len)
    } else if text.is_empty() {
        Vec::new()
    } else {
        vec![text.to_string()]
    };

    pieces
        .into_iter()
        .map(|text| AnalyzedSegment {
            text,
            role: role.clone(),
            kind,
            emotion_label: a.label.map(str::to_string),
            emotion,
            speed,
        })
        .collect()
}

fn default_narrator(lines: &[String], opts: &ReconcileOptions) -> Vec<AnalyzedSegment> {
    lines
        .iter()
        .flat_map(|line| {
            build_segments(
                Annotation {
                    text: line,
                    role: Some(NARRATOR_ROLE),
                    kind: Some("narration"),
                    label: None,
                    vector: None,
                    speed: None,
                },
                opts,
            )
        })
        .collect()
}

fn strip_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn overlaps(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// 忽略空白后拼接结果一致
fn texts_match<'a>(pieces: impl Iterator<Item = &'a str>, lines: &[String]) -> bool {
    let joined: String = pieces.map(strip_ws).collect();
    let original: String = lines.iter().map(|l| strip_ws(l)).collect();
    joined == original
}

// ============================================================================
// 跨批次累积
// ============================================================================

/// 顺序累积各批结果；之后的批次会拿到之前发现的角色
#[derive(Debug, Default)]
pub struct AnalysisAccumulator {
    roles: Vec<RawRole>,
    segments: Vec<AnalyzedSegment>,
    heuristic_batches: usize,
}

impl AnalysisAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: BatchOutcome) {
        if outcome.source == BatchSource::Heuristic {
            self.heuristic_batches += 1;
        }
        for role in outcome.roles {
            self.add_role(role);
        }
        for seg in &outcome.segments {
            if !self.roles.iter().any(|r| r.name == seg.role) {
                self.add_role(RawRole {
                    name: seg.role.clone(),
                    description: None,
                    suggested_voice: None,
                });
            }
        }
        self.segments.extend(outcome.segments);
    }

    /// 已发现的角色名
    pub fn known_roles(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// 先到的描述/音色优先，后来的只补空缺
    fn add_role(&mut self, role: RawRole) {
        match self.roles.iter_mut().find(|r| r.name == role.name) {
            Some(existing) => {
                if existing.description.is_none() {
                    existing.description = role.description;
                }
                if existing.suggested_voice.is_none() {
                    existing.suggested_voice = role.suggested_voice;
                }
            }
            None => self.roles.push(role),
        }
    }

    /// 完成：为每个角色确定音色并推导逐行分配
    pub fn finish(self, library: &VoiceLibrary) -> AnalysisResult {
        let mut usage: HashMap<VoiceRef, usize> = HashMap::new();

        // AI 建议的音色在音色库中存在时直接采用
        let mut voices: Vec<Option<VoiceRef>> = self
            .roles
            .iter()
            .map(|r| {
                let voice = r
                    .suggested_voice
                    .as_deref()
                    .and_then(|v| library.find(v))
                    .map(|e| e.voice_ref().clone());
                if let Some(v) = &voice {
                    *usage.entry(v.clone()).or_default() += 1;
                }
                voice
            })
            .collect();

        for (role, voice) in self.roles.iter().zip(voices.iter_mut()) {
            if voice.is_none() {
                *voice = suggest_voice(&role.name, role.description.as_deref(), library, &usage);
                if let Some(v) = voice {
                    *usage.entry(v.clone()).or_default() += 1;
                }
            }
        }

        let roles = self
            .roles
            .into_iter()
            .zip(voices)
            .map(|(r, suggested_voice)| AnalysisRole {
                name: r.name,
                description: r.description,
                suggested_voice,
            })
            .collect();

        let assignments = AnalysisResult::derive_assignments(&self.segments);
        AnalysisResult {
            roles,
            segments: self.segments,
            assignments,
            heuristic_batches: self.heuristic_batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::annotation::{interpret_response, parse_response};
    use crate::domain::performance::EmotionAxis;
    use crate::domain::text::weighted_length;
    use crate::domain::voice::{AudioFormat, VoiceEntry};

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn structured(body: &str) -> ParsedAnalysis {
        let (strategy, analysis) = parse_response(body).unwrap();
        ParsedAnalysis::Structured { strategy, analysis }
    }

    #[test]
    fn test_ai_resegmentation_accepted_when_text_matches() {
        let parsed = structured(
            r#"{"roles":[{"name":"林"}],"segments":[
                {"text":"他说：","role":"narrator","type":"narration"},
                {"text":"“你好。”","role":"林","type":"dialogue","emotion_vector":[0.6,0,0,0,0,0,0.3,0]}
            ]}"#,
        );
        let outcome = reconcile_batch(&parsed, &lines(&["他说：“你好。”"]), &ReconcileOptions::default());
        assert_eq!(outcome.source, BatchSource::Segments);
        assert_eq!(outcome.segments.len(), 2);
        assert_eq!(outcome.segments[1].role, "林");
        assert_eq!(
            outcome.segments[1].emotion,
            EmotionVector::single(EmotionAxis::Joy, 0.6)
        );
    }

    #[test]
    fn test_narration_type_forces_narrator() {
        let parsed = structured(
            r#"{"segments":[{"text":"天黑了。","role":"林","type":"narration",
                "emotion_vector":[0,0,0.9,0,0,0,0,0]}]}"#,
        );
        let outcome = reconcile_batch(&parsed, &lines(&["天黑了。"]), &ReconcileOptions::default());
        let seg = &outcome.segments[0];
        assert_eq!(seg.role, NARRATOR_ROLE);
        assert_eq!(seg.emotion, EmotionVector::single(EmotionAxis::Sorrow, 0.5));
    }

    #[test]
    fn test_altered_text_falls_back_to_assignments() {
        let parsed = structured(
            r#"{"segments":[{"text":"被改写的文字","role":"A"}],
                "assignments":[{"line":2,"role":"A","emotion":"怒"}]}"#,
        );
        let src = lines(&["第一行原文", "第二行原文"]);
        let outcome = reconcile_batch(&parsed, &src, &ReconcileOptions::default());
        assert_eq!(outcome.source, BatchSource::Assignments);
        let texts: Vec<&str> = outcome.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["第一行原文", "第二行原文"]);
        assert_eq!(outcome.segments[0].role, NARRATOR_ROLE);
        assert_eq!(outcome.segments[1].role, "A");
        assert_eq!(
            outcome.segments[1].emotion.dominant().map(|(a, _)| a),
            Some(EmotionAxis::Anger)
        );
    }

    #[test]
    fn test_assignment_matched_by_text_overlap() {
        let parsed = structured(r#"{"assignments":[{"role":"B","text":"第二行"}]}"#);
        let outcome = reconcile_batch(
            &parsed,
            &lines(&["第一行", "第二行原文"]),
            &ReconcileOptions::default(),
        );
        assert_eq!(outcome.segments[1].role, "B");
    }

    #[test]
    fn test_empty_reply_defaults_to_narrator() {
        let parsed = structured(r#"{"roles":[]}"#);
        let outcome = reconcile_batch(&parsed, &lines(&["一", "二"]), &ReconcileOptions::default());
        assert_eq!(outcome.source, BatchSource::DefaultNarrator);
        assert_eq!(outcome.segments.len(), 2);
        assert!(outcome.segments.iter().all(|s| s.role == NARRATOR_ROLE));
    }

    #[test]
    fn test_heuristic_batch_keeps_every_line() {
        let src = lines(&["一", "“二”"]);
        let parsed = interpret_response("garbage", &src);
        let outcome = reconcile_batch(&parsed, &src, &ReconcileOptions::default());
        assert_eq!(outcome.source, BatchSource::Heuristic);
        assert_eq!(outcome.segments.len(), 2);
    }

    #[test]
    fn test_oversized_segment_is_rebudgeted() {
        let long = "字".repeat(60);
        let body = format!(
            r#"{{"segments":[{{"text":"{}","role":"A","type":"dialogue","speaking_speed":1.3}}]}}"#,
            long
        );
        let parsed = structured(&body);
        let opts = ReconcileOptions {
            adjust_speed: true,
            ..ReconcileOptions::default()
        };
        let outcome = reconcile_batch(&parsed, &[long.clone()], &opts);
        assert!(outcome.segments.len() >= 3);
        assert!(outcome.segments.iter().all(|s| weighted_length(&s.text) <= 50));
        assert!(outcome.segments.iter().all(|s| s.role == "A" && s.speed.value() == 1.3));
        let joined: String = outcome.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, long);
    }

    #[test]
    fn test_adjust_toggles() {
        let parsed = structured(
            r#"{"segments":[{"text":"好！","role":"A","emotion_vector":[0.9,0,0,0,0,0,0,0],"speaking_speed":1.5}]}"#,
        );
        let opts = ReconcileOptions {
            adjust_emotion: false,
            adjust_speed: false,
            ..ReconcileOptions::default()
        };
        let outcome = reconcile_batch(&parsed, &lines(&["好！"]), &opts);
        assert!(outcome.segments[0].emotion.is_zero());
        assert!(outcome.segments[0].speed.is_normal());
    }

    #[test]
    fn test_accumulator_merges_roles_and_suggests_voices() {
        let library = VoiceLibrary::new(vec![
            VoiceEntry::new(VoiceRef::new("/v/女声.wav").unwrap(), "女声", AudioFormat::Wav),
            VoiceEntry::new(VoiceRef::new("/v/旁白.wav").unwrap(), "旁白", AudioFormat::Wav),
        ]);

        let mut acc = AnalysisAccumulator::new();
        let first = structured(
            r#"{"roles":[{"name":"旁白"},{"name":"小红","description":"少女","suggested_voice":"不存在"}],
                "segments":[{"text":"一","role":"narrator","type":"narration"},{"text":"二","role":"小红"}]}"#,
        );
        acc.push(reconcile_batch(&first, &lines(&["一", "二"]), &ReconcileOptions::default()));
        assert_eq!(acc.known_roles(), vec!["narrator".to_string(), "小红".to_string()]);

        let second = structured(r#"{"segments":[{"text":"三","role":"小红"}]}"#);
        acc.push(reconcile_batch(&second, &lines(&["三"]), &ReconcileOptions::default()));

        let result = acc.finish(&library);
        assert_eq!(result.segments.len(), 3);
        assert_eq!(result.roles.len(), 2);
        assert_eq!(result.assignments[&2].role, "小红");

        let voice_of = |name: &str| {
            result
                .roles
                .iter()
                .find(|r| r.name == name)
                .and_then(|r| r.suggested_voice.clone())
        };
        assert_eq!(voice_of("narrator"), Some(VoiceRef::new("/v/旁白.wav").unwrap()));
        assert_eq!(voice_of("小红"), Some(VoiceRef::new("/v/女声.wav").unwrap()));
    }

    #[test]
    fn test_accumulator_honors_library_voice_suggestion() {
        let library = VoiceLibrary::new(vec![
            VoiceEntry::new(VoiceRef::new("/v/a.wav").unwrap(), "a", AudioFormat::Wav),
            VoiceEntry::new(VoiceRef::new("/v/b.wav").unwrap(), "b", AudioFormat::Wav),
        ]);
        let parsed = structured(
            r#"{"roles":[{"name":"X","suggested_voice":"b"}],"segments":[{"text":"甲","role":"X"}]}"#,
        );
        let mut acc = AnalysisAccumulator::new();
        acc.push(reconcile_batch(&parsed, &lines(&["甲"]), &ReconcileOptions::default()));
        let result = acc.finish(&library);
        assert_eq!(result.roles[0].suggested_voice, Some(VoiceRef::new("/v/b.wav").unwrap()));
    }
}
