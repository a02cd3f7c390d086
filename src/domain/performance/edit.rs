//! 会话编辑指令

use serde::{Deserialize, Serialize};

use super::EmotionVector;

/// 对分段会话的一次编辑
///
/// 结构性编辑（insert/delete/move/split/merge_up/commit）会通过
/// 同一个重编号函数同步角色、情感、语速三张表。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEdit {
    Insert {
        at: usize,
        #[serde(default)]
        text: String,
    },
    Delete {
        index: usize,
    },
    Move {
        from: usize,
        to: usize,
    },
    MoveUp {
        index: usize,
    },
    MoveDown {
        index: usize,
    },
    /// 在光标处拆分（回车）
    Split {
        index: usize,
        caret: usize,
    },
    /// 把光标前的内容并入上一行
    MergeUp {
        index: usize,
        caret: usize,
    },
    UpdateText {
        index: usize,
        text: String,
    },
    AssignRole {
        index: usize,
        role: String,
    },
    UnassignRole {
        index: usize,
    },
    SetEmotion {
        index: usize,
        emotion: EmotionVector,
    },
    SetSpeed {
        index: usize,
        speed: f32,
    },
    ApplyRoleAll {
        role: String,
    },
    ApplyRoleUnassigned {
        role: String,
    },
    ClearRoles,
    ApplyEmotionAll {
        emotion: EmotionVector,
    },
    ApplyEmotionUnset {
        emotion: EmotionVector,
    },
    ClearEmotions,
    SetSpeedAll {
        speed: f32,
    },
    UpsertRole {
        name: String,
        #[serde(default)]
        voice: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    RemoveRole {
        name: String,
    },
    /// 提交：删除空行
    Commit,
}

impl SessionEdit {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
            Self::Move { .. } => "move",
            Self::MoveUp { .. } => "move_up",
            Self::MoveDown { .. } => "move_down",
            Self::Split { .. } => "split",
            Self::MergeUp { .. } => "merge_up",
            Self::UpdateText { .. } => "update_text",
            Self::AssignRole { .. } => "assign_role",
            Self::UnassignRole { .. } => "unassign_role",
            Self::SetEmotion { .. } => "set_emotion",
            Self::SetSpeed { .. } => "set_speed",
            Self::ApplyRoleAll { .. } => "apply_role_all",
            Self::ApplyRoleUnassigned { .. } => "apply_role_unassigned",
            Self::ClearRoles => "clear_roles",
            Self::ApplyEmotionAll { .. } => "apply_emotion_all",
            Self::ApplyEmotionUnset { .. } => "apply_emotion_unset",
            Self::ClearEmotions => "clear_emotions",
            Self::SetSpeedAll { .. } => "set_speed_all",
            Self::UpsertRole { .. } => "upsert_role",
            Self::RemoveRole { .. } => "remove_role",
            Self::Commit => "commit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_deserializes_from_tagged_json() {
        let edit: SessionEdit =
            serde_json::from_str(r#"{"type":"move_up","index":3}"#).unwrap();
        assert_eq!(edit, SessionEdit::MoveUp { index: 3 });

        let edit: SessionEdit = serde_json::from_str(
            r#"{"type":"set_emotion","index":0,"emotion":[0,0.5,0,0,0,0,0,0]}"#,
        )
        .unwrap();
        assert_eq!(edit.kind(), "set_emotion");

        let edit: SessionEdit = serde_json::from_str(r#"{"type":"commit"}"#).unwrap();
        assert_eq!(edit, SessionEdit::Commit);
    }
}
