//! 启发式兜底
//!
//! 模型回复完全无法解析时，从文本中扫描角色名样式的片段，
//! 再为每一行猜一个角色。结果可能粗糙，但总是完整的。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::performance::{canonical_role_name, is_narrator, NARRATOR_ROLE, UNASSIGNED_ROLE};

/// "name": "xxx" 或 "role": "xxx"
static JSON_FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:name|role)"\s*:\s*"([^"\n]{1,20})""#).expect("Invalid regex")
});

/// 行首的 "角色名：" 或 "【角色名】"，只有在原文中出现过才算角色
static ATTRIBUTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:[-*]\s*)?(?:【([^】\n]{1,8})】|([\p{Han}A-Za-z]{1,8})\s*[:：])")
        .expect("Invalid regex")
});

const DIALOGUE_MARKS: &[char] = &['“', '"', '「', '『'];

/// 启发式结果：每一行都有角色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicAnalysis {
    pub roles: Vec<String>,
    /// 与输入行一一对应
    pub line_roles: Vec<String>,
}

pub fn heuristic_analysis(body: &str, lines: &[String]) -> HeuristicAnalysis {
    let mut roles: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        let name = canonical_role_name(name);
        if !name.is_empty() && name != UNASSIGNED_ROLE && !roles.contains(&name) {
            roles.push(name);
        }
    };

    for caps in JSON_FIELD_RE.captures_iter(body) {
        if let Some(m) = caps.get(1) {
            push(m.as_str());
        }
    }
    for caps in ATTRIBUTION_RE.captures_iter(body) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            let name = m.as_str().trim();
            if lines.iter().any(|l| l.contains(name)) {
                push(name);
            }
        }
    }
    if !roles.iter().any(|r| is_narrator(r)) {
        roles.insert(0, NARRATOR_ROLE.to_string());
    }

    let speakers: Vec<&String> = roles.iter().filter(|r| !is_narrator(r)).collect();
    let mut line_roles = Vec::with_capacity(lines.len());
    let mut previous_speaker: Option<&String> = None;

    for line in lines {
        let is_dialogue = line.contains(DIALOGUE_MARKS);
        let named = speakers.iter().copied().find(|r| line.contains(r.as_str()));
        let role = if is_dialogue {
            named.or(previous_speaker)
        } else {
            None
        };
        if named.is_some() {
            previous_speaker = named;
        }
        line_roles.push(role.map_or_else(|| NARRATOR_ROLE.to_string(), |r| r.clone()));
    }

    HeuristicAnalysis { roles, line_roles }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults_to_narrator() {
        let result = heuristic_analysis("完全没有结构的回复", &lines(&["一", "二"]));
        assert_eq!(result.roles, vec![NARRATOR_ROLE.to_string()]);
        assert_eq!(result.line_roles, vec![NARRATOR_ROLE, NARRATOR_ROLE]);
    }

    #[test]
    fn test_scans_role_like_tokens() {
        let body = r#"{"roles":[{"name":"旁白"},{"name":"林黛玉","description":"..."#;
        let result = heuristic_analysis(
            body,
            &lines(&["林黛玉笑道：“你来了。”", "窗外下着雨。", "“我等你很久了。”"]),
        );
        assert_eq!(result.roles, vec!["narrator".to_string(), "林黛玉".to_string()]);
        assert_eq!(result.line_roles, vec!["林黛玉", NARRATOR_ROLE, "林黛玉"]);
    }

    #[test]
    fn test_attribution_lines() {
        let body = "角色分析：\n宝玉：男主角\n【袭人】丫鬟";
        let result = heuristic_analysis(body, &lines(&["宝玉道：“好。”", "袭人笑了。"]));
        assert!(result.roles.contains(&"宝玉".to_string()));
        assert!(result.roles.contains(&"袭人".to_string()));
        assert_eq!(result.line_roles, vec!["宝玉", NARRATOR_ROLE]);
    }

    #[test]
    fn test_prose_headings_are_not_roles() {
        let body = "角色分析：\nNote: 无法给出 JSON\n宝玉：男主角";
        let result = heuristic_analysis(body, &lines(&["宝玉道：“好。”"]));
        assert_eq!(result.roles, vec![NARRATOR_ROLE.to_string(), "宝玉".to_string()]);
    }
}
