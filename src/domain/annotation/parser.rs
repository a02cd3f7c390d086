//! 模型回复解析
//!
//! 模型回复名义上包含一个 JSON 对象，但可能被包在说明文字或代码块里，
//! 也可能因为 max_tokens 被截断。按顺序尝试以下策略，第一个成功的为准：
//!
//! a. 整体解析
//! b. 提取 ```json 代码块
//! c. 正则提取含 "roles" 键的对象
//! d. 从第一个 `{` 开始做括号配对
//! e. 截断修复（补 `}`、`]}`、`"}]}`，去掉末尾逗号再补 `}`）
//!
//! 全部失败时返回 [`ParseFailure`]，由调用方决定是否走启发式兜底。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::analysis::RawAnalysis;
use super::heuristic::{heuristic_analysis, HeuristicAnalysis};

static FENCED_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:json|JSON)?\s*(\{[\s\S]*?\})\s*```").expect("Invalid regex")
});

static ROLES_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{[\s\S]*"roles"[\s\S]*\}"#).expect("Invalid regex"));

/// 解析策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    WholeBody,
    FencedBlock,
    RolesObject,
    BraceMatch,
    TruncationRepair,
}

impl ParseStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WholeBody => "whole_body",
            Self::FencedBlock => "fenced_block",
            Self::RolesObject => "roles_object",
            Self::BraceMatch => "brace_match",
            Self::TruncationRepair => "truncation_repair",
        }
    }
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个策略的失败原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyAttempt {
    pub strategy: ParseStrategy,
    pub reason: String,
}

/// 所有策略都失败
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("无法解析模型回复（尝试了 {} 种策略）", attempts.len())]
pub struct ParseFailure {
    pub attempts: Vec<StrategyAttempt>,
}

/// 解析结果：结构化结果，或显式的启发式兜底
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedAnalysis {
    Structured {
        strategy: ParseStrategy,
        analysis: RawAnalysis,
    },
    Heuristic {
        failure: ParseFailure,
        analysis: HeuristicAnalysis,
    },
}

impl ParsedAnalysis {
    pub fn is_heuristic(&self) -> bool {
        matches!(self, Self::Heuristic { .. })
    }
}

/// 依次尝试 a–e
pub fn parse_response(body: &str) -> Result<(ParseStrategy, RawAnalysis), ParseFailure> {
    let mut attempts = Vec::new();
    let mut record = |strategy: ParseStrategy, reason: String| {
        attempts.push(StrategyAttempt { strategy, reason });
    };

    // a
    match try_parse(body.trim()) {
        Ok(analysis) => return Ok((ParseStrategy::WholeBody, analysis)),
        Err(e) => record(ParseStrategy::WholeBody, e),
    }

    // b
    match FENCED_BLOCK_RE.captures(body).and_then(|c| c.get(1)) {
        Some(m) => match try_parse(m.as_str()) {
            Ok(analysis) => return Ok((ParseStrategy::FencedBlock, analysis)),
            Err(e) => record(ParseStrategy::FencedBlock, e),
        },
        None => record(ParseStrategy::FencedBlock, "no fenced block".to_string()),
    }

    // c
    match ROLES_OBJECT_RE.find(body) {
        Some(m) => match try_parse(m.as_str()) {
            Ok(analysis) => return Ok((ParseStrategy::RolesObject, analysis)),
            Err(e) => record(ParseStrategy::RolesObject, e),
        },
        None => record(ParseStrategy::RolesObject, "no object with \"roles\" key".to_string()),
    }

    // d
    let start = body.find('{');
    match start.and_then(|s| extract_json_object(&body[s..])) {
        Some(candidate) => match try_parse(candidate) {
            Ok(analysis) => return Ok((ParseStrategy::BraceMatch, analysis)),
            Err(e) => record(ParseStrategy::BraceMatch, e),
        },
        None => record(ParseStrategy::BraceMatch, "unbalanced braces".to_string()),
    }

    // e
    match start {
        Some(s) => {
            let tail = body[s..].trim_end().trim_end_matches('`').trim_end();
            match repair_candidates(tail).iter().find_map(|c| try_parse(c).ok()) {
                Some(analysis) => return Ok((ParseStrategy::TruncationRepair, analysis)),
                None => record(ParseStrategy::TruncationRepair, "no repair parsed".to_string()),
            }
        }
        None => record(ParseStrategy::TruncationRepair, "no opening brace".to_string()),
    }

    Err(ParseFailure { attempts })
}

/// 解析回复；全部失败时退回启发式提取，保证总能得到结果
pub fn interpret_response(body: &str, lines: &[String]) -> ParsedAnalysis {
    match parse_response(body) {
        Ok((strategy, analysis)) => {
            if strategy != ParseStrategy::WholeBody {
                tracing::warn!(strategy = %strategy, "Model reply parsed with fallback strategy");
            }
            ParsedAnalysis::Structured { strategy, analysis }
        }
        Err(failure) => {
            tracing::warn!(
                attempts = failure.attempts.len(),
                "Model reply unparseable, using heuristic extraction"
            );
            ParsedAnalysis::Heuristic {
                analysis: heuristic_analysis(body, lines),
                failure,
            }
        }
    }
}

/// 只接受含有 roles/segments/assignments 任一键的对象
fn try_parse(text: &str) -> Result<RawAnalysis, String> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let obj = value.as_object().ok_or_else(|| "not a JSON object".to_string())?;
    if !["roles", "segments", "assignments"]
        .iter()
        .any(|k| obj.contains_key(*k))
    {
        return Err("object has no roles/segments/assignments".to_string());
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

/// 截断修复候选
fn repair_candidates(tail: &str) -> Vec<String> {
    let mut out = vec![
        format!("{}}}", tail),
        format!("{}]}}", tail),
        format!("{}\"}}]}}", tail),
    ];
    let stripped = tail.trim_end().trim_end_matches(',');
    if stripped.len() != tail.trim_end().len() {
        out.push(format!("{}}}", stripped));
        out.push(format!("{}]}}", stripped));
    }
    out
}

/// 从字符串开头提取一个括号配对完整的 JSON 对象（忽略字符串内的括号）
fn extract_json_object(s: &str) -> Option<&str> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_body() {
        let (strategy, raw) =
            parse_response(r#"{"roles":[{"name":"narrator"}],"segments":[]}"#).unwrap();
        assert_eq!(strategy, ParseStrategy::WholeBody);
        assert_eq!(raw.roles[0].name, "narrator");
    }

    #[test]
    fn test_fenced_block_in_prose() {
        let body = "好的，以下是分析结果：\n```json\n{\"roles\":[{\"name\":\"narrator\"}],\"segments\":[{\"text\":\"hello\",\"role\":\"narrator\",\"type\":\"narration\",\"emotion_vector\":[0,0,0,0,0,0,0,0]}]}\n```\n希望对你有帮助。";
        let (strategy, raw) = parse_response(body).unwrap();
        assert_eq!(strategy, ParseStrategy::FencedBlock);
        assert_eq!(raw.segments.len(), 1);
        assert_eq!(raw.segments[0].text, "hello");
        assert_eq!(raw.segments[0].kind.as_deref(), Some("narration"));
    }

    #[test]
    fn test_roles_object_without_fence() {
        let body = r#"Result: {"roles":[{"name":"A"}],"segments":[{"text":"x"}]} done"#;
        let (strategy, raw) = parse_response(body).unwrap();
        assert_eq!(strategy, ParseStrategy::RolesObject);
        assert_eq!(raw.segments[0].text, "x");
    }

    #[test]
    fn test_brace_match_for_object_without_roles() {
        let body = r#"看这里 {"segments":[{"text":"a}b"}]} 然后 {"other":1}"#;
        let (strategy, raw) = parse_response(body).unwrap();
        assert_eq!(strategy, ParseStrategy::BraceMatch);
        assert_eq!(raw.segments[0].text, "a}b");
    }

    #[test]
    fn test_truncation_repair() {
        let body = r#"{"roles":[{"name":"A"}],"segments":[{"text":"你好","role":"A"}"#;
        let (strategy, raw) = parse_response(body).unwrap();
        assert_eq!(strategy, ParseStrategy::TruncationRepair);
        assert_eq!(raw.segments.len(), 1);

        let body = r#"{"roles":[{"name":"A"}],"segments":[{"text":"好","role":"A"},"#;
        let (strategy, _) = parse_response(body).unwrap();
        assert_eq!(strategy, ParseStrategy::TruncationRepair);
    }

    #[test]
    fn test_failure_lists_every_strategy() {
        let failure = parse_response("抱歉，我无法完成这个任务。").unwrap_err();
        assert_eq!(failure.attempts.len(), 5);
        assert_eq!(failure.attempts[0].strategy, ParseStrategy::WholeBody);
        assert_eq!(failure.attempts[4].strategy, ParseStrategy::TruncationRepair);
    }

    #[test]
    fn test_interpret_falls_back_to_heuristic() {
        let lines = vec!["第一行".to_string(), "第二行".to_string()];
        let parsed = interpret_response("not json at all", &lines);
        assert!(parsed.is_heuristic());
    }

    #[test]
    fn test_rejects_unrelated_object() {
        assert!(parse_response(r#"{"answer":42}"#).is_err());
    }
}
