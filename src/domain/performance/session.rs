//! Performance Context - Aggregate Root

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::{
    canonical_role_name, is_narrator, EditOp, EditOutcome, EmotionStore, EmotionVector,
    LineStats, PerformanceError, PerformanceItem, Role, RoleAssignments, RoleTable,
    SessionEdit, SessionId, SessionStats, SpeedFactor, SpeedStore, NARRATOR_ROLE,
    UNASSIGNED_ROLE,
};
use crate::domain::annotation::AnalysisResult;
use crate::domain::script::{segment, Segment, SegmenterConfig, SplitMode};
use crate::domain::text::{han_count, length_warning, LengthWarning};
use crate::domain::voice::{VoiceLibrary, VoiceRef};

/// 分段会话聚合根
///
/// 持有一份文本的全部分段状态：片段列表、角色表以及三张按行索引的注解表。
///
/// 不变量:
/// - 片段索引稠密且从 0 开始
/// - 任何结构性编辑都通过 [`EditOp`] 同步重编号三张注解表
/// - 每次修改都会递增 version
#[derive(Debug, Clone)]
pub struct SegmentationSession {
    id: SessionId,
    version: u64,
    source_text: String,
    mode: SplitMode,
    config: SegmenterConfig,
    segments: Vec<Segment>,
    roles: RoleTable,
    role_assignments: RoleAssignments,
    emotions: EmotionStore,
    speeds: SpeedStore,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SegmentationSession {
    /// 从原始文本创建会话并分段
    pub fn new(text: &str, mode: SplitMode, config: SegmenterConfig) -> Self {
        let now = Utc::now();
        let segments = segment(text, mode, &config);
        Self {
            id: SessionId::new(),
            version: 0,
            source_text: text.to_string(),
            mode,
            config,
            segments,
            roles: RoleTable::new(),
            role_assignments: RoleAssignments::with_fallback(UNASSIGNED_ROLE.to_string()),
            emotions: EmotionStore::default(),
            speeds: SpeedStore::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 重新分段；行注解被清空，角色表保留
    pub fn resegment(&mut self, text: Option<&str>, mode: Option<SplitMode>) {
        if let Some(text) = text {
            self.source_text = text.to_string();
        }
        if let Some(mode) = mode {
            self.mode = mode;
        }
        self.segments = segment(&self.source_text, self.mode, &self.config);
        self.clear_line_state();
        self.touch();
    }

    pub fn set_config(&mut self, config: SegmenterConfig) {
        self.config = config;
        self.touch();
    }

    /// 执行一次编辑
    pub fn apply(&mut self, edit: SessionEdit) -> Result<EditOutcome, PerformanceError> {
        let affected = match edit {
            SessionEdit::Insert { at, text } => self.insert_line(at, &text).map(|_| 1)?,
            SessionEdit::Delete { index } => self.delete_line(index).map(|_| 1)?,
            SessionEdit::Move { from, to } => self.move_line(from, to).map(|_| 1)?,
            SessionEdit::MoveUp { index } => self.move_up(index).map(|_| 1)?,
            SessionEdit::MoveDown { index } => self.move_down(index).map(|_| 1)?,
            SessionEdit::Split { index, caret } => self.split_line(index, caret).map(|_| 2)?,
            SessionEdit::MergeUp { index, caret } => self.merge_up(index, caret).map(|_| 2)?,
            SessionEdit::UpdateText { index, text } => self.update_text(index, &text).map(|_| 1)?,
            SessionEdit::AssignRole { index, role } => self.assign_role(index, &role).map(|_| 1)?,
            SessionEdit::UnassignRole { index } => self.unassign_role(index).map(|_| 1)?,
            SessionEdit::SetEmotion { index, emotion } => {
                self.set_emotion(index, emotion).map(|_| 1)?
            }
            SessionEdit::SetSpeed { index, speed } => {
                self.set_speed(index, SpeedFactor::new(speed)).map(|_| 1)?
            }
            SessionEdit::ApplyRoleAll { role } => self.apply_role_all(&role)?,
            SessionEdit::ApplyRoleUnassigned { role } => self.apply_role_unassigned(&role)?,
            SessionEdit::ClearRoles => self.clear_roles(),
            SessionEdit::ApplyEmotionAll { emotion } => self.apply_emotion_all(emotion),
            SessionEdit::ApplyEmotionUnset { emotion } => self.apply_emotion_unset(emotion),
            SessionEdit::ClearEmotions => self.clear_emotions(),
            SessionEdit::SetSpeedAll { speed } => self.set_speed_all(SpeedFactor::new(speed)),
            SessionEdit::UpsertRole {
                name,
                voice,
                description,
            } => {
                let voice = voice.and_then(|v| VoiceRef::new(v).ok());
                self.upsert_role(&name, voice, description).map(|_| 1)?
            }
            SessionEdit::RemoveRole { name } => self.remove_role(&name)?,
            SessionEdit::Commit => self.commit(),
        };

        Ok(EditOutcome {
            line_count: self.segments.len(),
            affected,
        })
    }

    // ==================== 结构性编辑 ====================

    /// 在 at 处插入一行（at == 行数时追加到末尾）
    pub fn insert_line(&mut self, at: usize, text: &str) -> Result<(), PerformanceError> {
        if at > self.segments.len() {
            return Err(self.out_of_range(at));
        }
        self.segments.insert(at, Segment::new(at, text.trim()));
        self.renumber(EditOp::Insert { at });
        Ok(())
    }

    pub fn delete_line(&mut self, index: usize) -> Result<(), PerformanceError> {
        self.check_index(index)?;
        self.segments.remove(index);
        self.renumber(EditOp::Delete { at: index });
        Ok(())
    }

    pub fn move_line(&mut self, from: usize, to: usize) -> Result<(), PerformanceError> {
        let len = self.segments.len();
        if from >= len || to >= len || from == to {
            return Err(PerformanceError::InvalidMove { from, to, len });
        }
        let line = self.segments.remove(from);
        self.segments.insert(to, line);
        self.renumber(EditOp::Move { from, to });
        Ok(())
    }

    pub fn move_up(&mut self, index: usize) -> Result<(), PerformanceError> {
        let to = index.checked_sub(1).ok_or(PerformanceError::InvalidMove {
            from: index,
            to: 0,
            len: self.segments.len(),
        })?;
        self.move_line(index, to)
    }

    pub fn move_down(&mut self, index: usize) -> Result<(), PerformanceError> {
        self.move_line(index, index + 1)
    }

    /// 在光标处拆分：左半部分留在原行（保留注解），右半部分作为新行插入下方
    pub fn split_line(&mut self, index: usize, caret: usize) -> Result<(), PerformanceError> {
        let text = self.line_text(index)?;
        let (left, right) = split_at_char(text, caret)
            .ok_or(PerformanceError::InvalidCaret { index, caret })?;
        let (left, right) = (left.trim_end().to_string(), right.trim_start().to_string());

        self.segments[index] = Segment::new(index, left);
        let at = index + 1;
        self.segments.insert(at, Segment::new(at, right));
        self.renumber(EditOp::Insert { at });
        Ok(())
    }

    /// 把光标前的内容追加到上一行；本行剩余为空时删除本行
    pub fn merge_up(&mut self, index: usize, caret: usize) -> Result<(), PerformanceError> {
        let text = self.line_text(index)?;
        if index == 0 {
            return Err(PerformanceError::CannotMergeFirstLine);
        }
        let (head, tail) = split_at_char(text, caret)
            .ok_or(PerformanceError::InvalidCaret { index, caret })?;
        let (head, tail) = (head.trim().to_string(), tail.trim().to_string());

        let prev = index - 1;
        let merged = format!("{}{}", self.segments[prev].text(), head);
        self.segments[prev] = Segment::new(prev, merged);

        if tail.is_empty() {
            self.segments.remove(index);
            self.renumber(EditOp::Delete { at: index });
        } else {
            self.segments[index] = Segment::new(index, tail);
            self.touch();
        }
        Ok(())
    }

    pub fn update_text(&mut self, index: usize, text: &str) -> Result<(), PerformanceError> {
        self.check_index(index)?;
        self.segments[index] = Segment::new(index, text.trim());
        self.touch();
        Ok(())
    }

    /// 提交：删除所有空行，每个空行都走一次删除重编号
    pub fn commit(&mut self) -> usize {
        let blanks: Vec<usize> = self
            .segments
            .iter()
            .filter(|s| s.text().trim().is_empty())
            .map(|s| s.index())
            .collect();

        // 从后往前删，前面的索引不受影响
        for &at in blanks.iter().rev() {
            self.segments.remove(at);
            self.renumber(EditOp::Delete { at });
        }
        if blanks.is_empty() {
            self.touch();
        }
        blanks.len()
    }

    // ==================== 行注解 ====================

    pub fn assign_role(&mut self, index: usize, role: &str) -> Result<(), PerformanceError> {
        self.check_index(index)?;
        let role = self.known_role(role)?;
        self.role_assignments.assign(index, role);
        self.touch();
        Ok(())
    }

    pub fn unassign_role(&mut self, index: usize) -> Result<(), PerformanceError> {
        self.check_index(index)?;
        self.role_assignments.unassign(index);
        self.touch();
        Ok(())
    }

    /// 手动设置情感；只裁剪到 [0, 1]，不做主轴收敛
    pub fn set_emotion(
        &mut self,
        index: usize,
        emotion: EmotionVector,
    ) -> Result<(), PerformanceError> {
        self.check_index(index)?;
        let emotion = EmotionVector::new(*emotion.values());
        if emotion.is_zero() {
            self.emotions.unassign(index);
        } else {
            self.emotions.assign(index, emotion);
        }
        self.touch();
        Ok(())
    }

    pub fn set_speed(&mut self, index: usize, speed: SpeedFactor) -> Result<(), PerformanceError> {
        self.check_index(index)?;
        self.speeds.assign(index, speed);
        self.touch();
        Ok(())
    }

    // ==================== 批量操作 ====================

    pub fn apply_role_all(&mut self, role: &str) -> Result<usize, PerformanceError> {
        let role = self.known_role(role)?;
        for index in 0..self.segments.len() {
            self.role_assignments.assign(index, role.clone());
        }
        self.touch();
        Ok(self.segments.len())
    }

    /// 只给未分配角色的行设置
    pub fn apply_role_unassigned(&mut self, role: &str) -> Result<usize, PerformanceError> {
        let role = self.known_role(role)?;
        let mut count = 0;
        for index in 0..self.segments.len() {
            if !self.role_assignments.contains(index) {
                self.role_assignments.assign(index, role.clone());
                count += 1;
            }
        }
        self.touch();
        Ok(count)
    }

    pub fn clear_roles(&mut self) -> usize {
        let count = self.role_assignments.len();
        self.role_assignments.clear();
        self.touch();
        count
    }

    pub fn apply_emotion_all(&mut self, emotion: EmotionVector) -> usize {
        let emotion = EmotionVector::new(*emotion.values());
        self.emotions.clear();
        if !emotion.is_zero() {
            for index in 0..self.segments.len() {
                self.emotions.assign(index, emotion);
            }
        }
        self.touch();
        self.segments.len()
    }

    /// 只给情感未设置（Σ ≤ 1e-6）的行设置
    pub fn apply_emotion_unset(&mut self, emotion: EmotionVector) -> usize {
        let emotion = EmotionVector::new(*emotion.values());
        let mut count = 0;
        if !emotion.is_zero() {
            for index in 0..self.segments.len() {
                if self.emotions.get(index).is_zero() {
                    self.emotions.assign(index, emotion);
                    count += 1;
                }
            }
        }
        self.touch();
        count
    }

    pub fn clear_emotions(&mut self) -> usize {
        let count = self.emotions.len();
        self.emotions.clear();
        self.touch();
        count
    }

    pub fn set_speed_all(&mut self, speed: SpeedFactor) -> usize {
        self.speeds.clear();
        for index in 0..self.segments.len() {
            self.speeds.assign(index, speed);
        }
        self.touch();
        self.segments.len()
    }

    // ==================== 角色表 ====================

    pub fn upsert_role(
        &mut self,
        name: &str,
        voice: Option<VoiceRef>,
        description: Option<String>,
    ) -> Result<(), PerformanceError> {
        let name = canonical_role_name(name);
        if name.is_empty() || name == UNASSIGNED_ROLE {
            return Err(PerformanceError::InvalidRoleName(name));
        }
        self.roles
            .upsert(Role::new(name).with_voice(voice).with_description(description));
        self.touch();
        Ok(())
    }

    /// 删除角色，并取消所有使用该角色的行分配；返回受影响的行数
    pub fn remove_role(&mut self, name: &str) -> Result<usize, PerformanceError> {
        let name = canonical_role_name(name);
        if self.roles.remove(&name).is_none() {
            return Err(PerformanceError::UnknownRole(name));
        }
        let before = self.role_assignments.len();
        self.role_assignments.retain(|_, role| *role != name);
        self.touch();
        Ok(before - self.role_assignments.len())
    }

    // ==================== AI 结果 ====================

    /// 整体替换为 AI 分析结果
    ///
    /// 片段列表与行注解整体替换；角色表只增不删，已有的音色不会被覆盖
    pub fn apply_analysis(&mut self, result: &AnalysisResult) {
        self.segments = Segment::sequence(result.segments.iter().map(|s| s.text.clone()));
        self.clear_line_state();

        for role in &result.roles {
            self.roles.upsert(
                Role::new(role.name.clone()).with_description(role.description.clone()),
            );
            if let Some(voice) = &role.suggested_voice {
                self.roles.fill_voice(&role.name, voice.clone());
            }
        }

        for (&index, line) in &result.assignments {
            if index >= self.segments.len() {
                continue;
            }
            if !self.roles.contains(&line.role) {
                self.roles.upsert(Role::new(line.role.clone()));
            }
            self.role_assignments.assign(index, line.role.clone());
            if !line.emotion.is_zero() {
                self.emotions.assign(index, line.emotion);
            }
            if !line.speed.is_normal() {
                self.speeds.assign(index, line.speed);
            }
        }

        self.touch();
    }

    // ==================== 持久化 ====================

    /// 导出行情感 {"<index>": [8 floats]}
    pub fn emotion_map(&self) -> BTreeMap<String, EmotionVector> {
        self.emotions.serialize()
    }

    /// 导出行语速 {"<index>": speed}
    pub fn speed_map(&self) -> BTreeMap<String, SpeedFactor> {
        self.speeds.serialize()
    }

    /// 恢复行情感与语速；超出当前行数的键被丢弃
    pub fn restore_line_state(
        &mut self,
        emotions: BTreeMap<String, EmotionVector>,
        speeds: BTreeMap<String, SpeedFactor>,
    ) {
        let len = self.segments.len();
        self.emotions = EmotionStore::restore(EmotionVector::zero(), emotions);
        self.emotions.retain(|k, _| k < len);
        self.speeds = SpeedStore::restore(SpeedFactor::NORMAL, speeds);
        self.speeds.retain(|k, _| k < len);
        self.touch();
    }

    /// 合并持久化的角色表；已有角色的音色以会话为准
    pub fn restore_roles(&mut self, roles: RoleTable) {
        for role in roles.roles() {
            if let Some(existing) = self.roles.get(role.name()) {
                if existing.voice().is_some() {
                    continue;
                }
            }
            self.roles.upsert(role.clone());
        }
        self.touch();
    }

    // ==================== 读取 ====================

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn line_count(&self) -> usize {
        self.segments.len()
    }

    pub fn lines(&self) -> Vec<String> {
        self.segments.iter().map(|s| s.text().to_string()).collect()
    }

    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    pub fn role_assignments(&self) -> &RoleAssignments {
        &self.role_assignments
    }

    pub fn emotions(&self) -> &EmotionStore {
        &self.emotions
    }

    pub fn speeds(&self) -> &SpeedStore {
        &self.speeds
    }

    pub fn role_of(&self, index: usize) -> &str {
        self.role_assignments.get(index)
    }

    pub fn emotion_of(&self, index: usize) -> EmotionVector {
        *self.emotions.get(index)
    }

    pub fn speed_of(&self, index: usize) -> SpeedFactor {
        *self.speeds.get(index)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 行统计与长度告警
    pub fn stats(&self) -> SessionStats {
        let limit = self.config.chars_per_line;
        let lines: Vec<LineStats> = self
            .segments
            .iter()
            .map(|s| LineStats {
                index: s.index(),
                han_count: han_count(s.text()),
                warning: length_warning(s.text(), limit),
            })
            .collect();

        SessionStats {
            total_lines: self.segments.len(),
            total_chars: self
                .segments
                .iter()
                .map(|s| s.text().chars().filter(|c| !c.is_whitespace()).count())
                .sum(),
            soft_warnings: lines.iter().filter(|l| l.warning == LengthWarning::Soft).count(),
            hard_warnings: lines.iter().filter(|l| l.warning == LengthWarning::Hard).count(),
            lines,
        }
    }

    /// 每行的演绎参数，按顺序交给合成服务
    pub fn performance_plan(&self, library: &VoiceLibrary) -> Vec<PerformanceItem> {
        self.segments
            .iter()
            .filter(|s| !s.text().trim().is_empty())
            .map(|s| {
                let role = self.role_of(s.index()).to_string();
                PerformanceItem {
                    index: s.index(),
                    text: s.text().to_string(),
                    voice: self.roles.resolve_voice(&role, library),
                    role,
                    emotion: self.emotion_of(s.index()),
                    speed: self.speed_of(s.index()),
                }
            })
            .collect()
    }

    // ==================== 内部 ====================

    fn renumber(&mut self, op: EditOp) {
        for (index, seg) in self.segments.iter_mut().enumerate() {
            if seg.index() != index {
                *seg = Segment::new(index, seg.text());
            }
        }
        self.role_assignments.on_edit(op);
        self.emotions.on_edit(op);
        self.speeds.on_edit(op);
        self.touch();
    }

    fn clear_line_state(&mut self) {
        self.role_assignments.clear();
        self.emotions.clear();
        self.speeds.clear();
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    fn check_index(&self, index: usize) -> Result<(), PerformanceError> {
        if index < self.segments.len() {
            Ok(())
        } else {
            Err(self.out_of_range(index))
        }
    }

    fn out_of_range(&self, index: usize) -> PerformanceError {
        PerformanceError::IndexOutOfRange {
            index,
            len: self.segments.len(),
        }
    }

    fn line_text(&self, index: usize) -> Result<&str, PerformanceError> {
        self.segments
            .get(index)
            .map(|s| s.text())
            .ok_or_else(|| self.out_of_range(index))
    }

    /// 旁白总是可用；其他角色必须已在角色表中
    fn known_role(&mut self, role: &str) -> Result<String, PerformanceError> {
        let role = canonical_role_name(role);
        if is_narrator(&role) {
            if !self.roles.contains(NARRATOR_ROLE) {
                self.roles.upsert(Role::new(NARRATOR_ROLE));
            }
            return Ok(role);
        }
        if self.roles.contains(&role) {
            Ok(role)
        } else {
            Err(PerformanceError::UnknownRole(role))
        }
    }
}

/// 按字符偏移拆分；越界返回 None
fn split_at_char(text: &str, caret: usize) -> Option<(&str, &str)> {
    let count = text.chars().count();
    if caret > count {
        return None;
    }
    let byte = text
        .char_indices()
        .nth(caret)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    Some(text.split_at(byte))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::performance::EmotionAxis;

    fn session(text: &str) -> SegmentationSession {
        SegmentationSession::new(text, SplitMode::Punctuation, SegmenterConfig::default())
    }

    fn with_roles(s: &mut SegmentationSession, names: &[&str]) {
        for n in names {
            s.upsert_role(n, None, None).unwrap();
        }
    }

    #[test]
    fn test_new_session_segments_text() {
        let s = session("一。二。三。");
        assert_eq!(s.lines(), vec!["一。", "二。", "三。"]);
        assert_eq!(s.role_of(0), UNASSIGNED_ROLE);
        assert!(s.emotion_of(0).is_zero());
        assert!(s.speed_of(0).is_normal());
    }

    #[test]
    fn test_delete_keeps_annotations_aligned() {
        let mut s = session("零。一。二。三。四。");
        with_roles(&mut s, &["A", "B", "C", "D"]);
        for (i, r) in [(1, "A"), (2, "B"), (3, "C"), (4, "D")] {
            s.assign_role(i, r).unwrap();
        }
        s.delete_line(2).unwrap();

        assert_eq!(s.lines(), vec!["零。", "一。", "三。", "四。"]);
        assert_eq!(s.role_of(1), "A");
        assert_eq!(s.role_of(2), "C");
        assert_eq!(s.role_of(3), "D");
        assert_eq!(s.role_assignments().len(), 3);
    }

    #[test]
    fn test_move_up_down_carry_annotations() {
        let mut s = session("甲。乙。丙。");
        s.set_emotion(2, EmotionVector::single(EmotionAxis::Anger, 0.7)).unwrap();
        s.move_up(2).unwrap();
        assert_eq!(s.lines(), vec!["甲。", "丙。", "乙。"]);
        assert_eq!(s.emotion_of(1).get(EmotionAxis::Anger), 0.7);

        s.move_down(1).unwrap();
        assert_eq!(s.emotion_of(2).get(EmotionAxis::Anger), 0.7);
        assert!(s.move_down(2).is_err());
        assert!(s.move_up(0).is_err());
    }

    #[test]
    fn test_split_and_merge_up() {
        let mut s = session("前半句后半句。尾。");
        s.set_speed(0, SpeedFactor::new(1.5)).unwrap();
        s.set_speed(1, SpeedFactor::new(0.8)).unwrap();

        s.split_line(0, 3).unwrap();
        assert_eq!(s.lines(), vec!["前半句", "后半句。", "尾。"]);
        assert_eq!(s.speed_of(0).value(), 1.5);
        assert!(s.speed_of(1).is_normal());
        assert_eq!(s.speed_of(2).value(), 0.8);

        // 整行并入上一行，本行被删除
        s.merge_up(1, 4).unwrap();
        assert_eq!(s.lines(), vec!["前半句后半句。", "尾。"]);
        assert_eq!(s.speed_of(1).value(), 0.8);

        assert_eq!(s.merge_up(0, 0), Err(PerformanceError::CannotMergeFirstLine));
        assert!(matches!(s.split_line(1, 10), Err(PerformanceError::InvalidCaret { .. })));
    }

    #[test]
    fn test_merge_up_partial_keeps_tail() {
        let mut s = session("第一行。第二行。");
        s.merge_up(1, 2).unwrap();
        assert_eq!(s.lines(), vec!["第一行。第二", "行。"]);
    }

    #[test]
    fn test_commit_drops_blank_lines_and_renumbers() {
        let mut s = session("甲。乙。");
        with_roles(&mut s, &["A", "B"]);
        s.insert_line(1, "").unwrap();
        s.insert_line(0, "  ").unwrap();
        s.assign_role(1, "A").unwrap();
        s.assign_role(3, "B").unwrap();

        assert_eq!(s.commit(), 2);
        assert_eq!(s.lines(), vec!["甲。", "乙。"]);
        assert_eq!(s.role_of(0), "A");
        assert_eq!(s.role_of(1), "B");
    }

    #[test]
    fn test_assign_unknown_role_rejected() {
        let mut s = session("一。");
        assert_eq!(
            s.assign_role(0, "路人"),
            Err(PerformanceError::UnknownRole("路人".into()))
        );
        s.assign_role(0, "旁白").unwrap();
        assert_eq!(s.role_of(0), NARRATOR_ROLE);
        assert!(s.roles().contains(NARRATOR_ROLE));
    }

    #[test]
    fn test_batch_role_operations() {
        let mut s = session("一。二。三。");
        with_roles(&mut s, &["A", "B"]);
        s.assign_role(1, "A").unwrap();
        assert_eq!(s.apply_role_unassigned("B").unwrap(), 2);
        assert_eq!(s.role_of(1), "A");
        assert_eq!(s.role_of(2), "B");

        assert_eq!(s.apply_role_all("A").unwrap(), 3);
        assert_eq!(s.role_of(2), "A");

        assert_eq!(s.remove_role("A").unwrap(), 3);
        assert_eq!(s.role_of(0), UNASSIGNED_ROLE);

        s.apply_role_all("B").unwrap();
        assert_eq!(s.clear_roles(), 3);
    }

    #[test]
    fn test_batch_emotion_and_speed() {
        let mut s = session("一。二。三。");
        let joy = EmotionVector::single(EmotionAxis::Joy, 0.4);
        let calm = EmotionVector::single(EmotionAxis::Calm, 0.2);
        s.set_emotion(0, joy).unwrap();

        assert_eq!(s.apply_emotion_unset(calm), 2);
        assert_eq!(s.emotion_of(0), joy);
        assert_eq!(s.emotion_of(2), calm);

        assert_eq!(s.apply_emotion_all(joy), 3);
        assert_eq!(s.emotion_of(2), joy);
        assert_eq!(s.clear_emotions(), 3);

        s.set_speed_all(SpeedFactor::new(1.2));
        assert_eq!(s.speed_of(1).value(), 1.2);
    }

    #[test]
    fn test_manual_emotion_not_collapsed() {
        let mut s = session("一。");
        let mixed = EmotionVector::new([0.3, 0.0, 0.4, 0.0, 0.0, 0.0, 0.0, 0.0]);
        s.set_emotion(0, mixed).unwrap();
        assert_eq!(s.emotion_of(0), mixed);
    }

    #[test]
    fn test_version_bumps_on_every_mutation() {
        let mut s = session("一。二。");
        let v0 = s.version();
        s.update_text(0, "改").unwrap();
        let v1 = s.version();
        assert!(v1 > v0);
        s.apply(SessionEdit::Commit).unwrap();
        assert!(s.version() > v1);
    }

    #[test]
    fn test_resegment_keeps_role_table() {
        let mut s = session("一。二。");
        with_roles(&mut s, &["A"]);
        s.assign_role(0, "A").unwrap();
        s.resegment(Some("三。四。五。"), None);
        assert_eq!(s.line_count(), 3);
        assert!(s.roles().contains("A"));
        assert!(s.role_assignments().is_empty());
    }

    #[test]
    fn test_stats_and_warnings() {
        let config = SegmenterConfig::new(crate::domain::text::DEFAULT_DELIMITERS.iter().copied(), true, 4);
        let s = SegmentationSession::new("一二三四五\n一二\n一二三四", SplitMode::Punctuation, config);
        let stats = s.stats();
        assert_eq!(stats.total_lines, 3);
        assert_eq!(stats.total_chars, 11);
        assert_eq!(stats.hard_warnings, 1);
        assert_eq!(stats.soft_warnings, 1);
    }

    #[test]
    fn test_restore_line_state_skips_bad_keys() {
        let mut s = session("一。二。");
        let mut emotions = BTreeMap::new();
        emotions.insert("1".to_string(), EmotionVector::single(EmotionAxis::Fear, 0.3));
        emotions.insert("x".to_string(), EmotionVector::single(EmotionAxis::Joy, 0.3));
        emotions.insert("9".to_string(), EmotionVector::single(EmotionAxis::Joy, 0.3));
        s.restore_line_state(emotions, BTreeMap::new());
        assert_eq!(s.emotions().len(), 1);
        assert_eq!(s.emotion_of(1).get(EmotionAxis::Fear), 0.3);
    }

    #[test]
    fn test_performance_plan_resolves_voices() {
        use crate::domain::voice::{AudioFormat, VoiceEntry};

        let lib = VoiceLibrary::new(vec![VoiceEntry::new(
            VoiceRef::new("/v/a.wav").unwrap(),
            "a",
            AudioFormat::Wav,
        )]);
        let mut s = session("一。二。");
        s.upsert_role("A", Some(VoiceRef::new("/v/a.wav").unwrap()), None)
            .unwrap();
        s.assign_role(0, "A").unwrap();

        let plan = s.performance_plan(&lib);
        assert_eq!(plan.len(), 2);
        assert!(!plan[0].voice.is_fallback());
        assert!(plan[1].voice.is_fallback());
        assert_eq!(plan[1].role, UNASSIGNED_ROLE);
    }
}
