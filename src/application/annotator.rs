//! AI Annotator - AI 标注编排
//!
//! 规划批次、逐批调用对话模型、解析并校对回复、合并为一个 [`AnalysisResult`]。
//! 批次严格按顺序发出：后一批的提示词包含前面各批发现的角色。
//! 任何一次调用失败都会放弃整个标注，已完成批次的结果一并丢弃。

use std::sync::Arc;

use crate::application::ports::{
    ChatCompletionPort, ChatError, ChatMessage, ChatRequest, SessionEventPort,
};
use crate::domain::annotation::{
    build_prompt, interpret_response, plan_batches, reconcile_batch, AnalysisAccumulator,
    AnalysisResult, PromptContext, ReconcileOptions, SYSTEM_PROMPT,
};
use crate::domain::performance::SessionId;
use crate::domain::voice::VoiceLibrary;

/// 标注参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotatorSettings {
    pub temperature: f32,
    /// 透传给模型，同时决定分批预算
    pub max_tokens: u32,
    pub reconcile: ReconcileOptions,
}

impl Default for AnnotatorSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
            reconcile: ReconcileOptions::default(),
        }
    }
}

pub struct AiAnnotator {
    chat: Arc<dyn ChatCompletionPort>,
    events: Arc<dyn SessionEventPort>,
    settings: AnnotatorSettings,
}

impl AiAnnotator {
    pub fn new(
        chat: Arc<dyn ChatCompletionPort>,
        events: Arc<dyn SessionEventPort>,
        settings: AnnotatorSettings,
    ) -> Self {
        Self {
            chat,
            events,
            settings,
        }
    }

    pub fn settings(&self) -> &AnnotatorSettings {
        &self.settings
    }

    /// 标注一组行
    ///
    /// `known_roles` 为会话中已有的角色，会出现在每一批的提示词里。
    /// 空行不参与标注。
    pub async fn annotate(
        &self,
        session_id: &SessionId,
        lines: &[String],
        known_roles: &[String],
        library: &VoiceLibrary,
    ) -> Result<AnalysisResult, ChatError> {
        let lines: Vec<String> = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .cloned()
            .collect();
        let batches = plan_batches(&lines, self.settings.max_tokens as usize);
        let total = batches.len();

        tracing::info!(
            session_id = %session_id,
            lines = lines.len(),
            batches = total,
            "Annotation started"
        );
        self.events.annotation_started(session_id, total);

        let voices = library.prompt_candidates();
        let mut acc = AnalysisAccumulator::new();

        for (i, range) in batches.into_iter().enumerate() {
            let batch_lines = &lines[range.clone()];

            let mut roles: Vec<String> = known_roles.to_vec();
            for name in acc.known_roles() {
                if !roles.contains(&name) {
                    roles.push(name);
                }
            }

            let ctx = PromptContext {
                known_roles: roles,
                voices: voices.clone(),
                min_len: self.settings.reconcile.min_len,
                max_len: self.settings.reconcile.max_len,
                batch: (total > 1).then_some((i + 1, total)),
            };
            let request = ChatRequest {
                messages: vec![
                    ChatMessage::system(SYSTEM_PROMPT),
                    ChatMessage::user(build_prompt(batch_lines, &ctx)),
                ],
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
            };

            let body = match self.chat.complete(request).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(
                        session_id = %session_id,
                        batch = i + 1,
                        total = total,
                        error = %e,
                        "Chat completion failed, discarding annotation"
                    );
                    return Err(e);
                }
            };
            tracing::debug!(batch = i + 1, body = %body, "Chat completion reply");

            let parsed = interpret_response(&body, batch_lines);
            let outcome = reconcile_batch(&parsed, batch_lines, &self.settings.reconcile);
            let source = outcome.source;

            tracing::info!(
                session_id = %session_id,
                batch = i + 1,
                total = total,
                lines = range.len(),
                segments = outcome.segments.len(),
                source = source.as_str(),
                "Annotation batch completed"
            );
            acc.push(outcome);
            self.events
                .annotation_batch_completed(session_id, i + 1, total, source.as_str());
        }

        let result = acc.finish(library);
        tracing::info!(
            session_id = %session_id,
            segments = result.segments.len(),
            roles = result.roles.len(),
            heuristic_batches = result.heuristic_batches,
            "Annotation merged"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NoopSessionEvents;
    use crate::domain::performance::{EmotionAxis, NARRATOR_ROLE};
    use crate::domain::voice::{AudioFormat, VoiceEntry, VoiceRef};
    use crate::infrastructure::adapters::FakeChatClient;

    fn annotator(chat: Arc<FakeChatClient>, max_tokens: u32) -> AiAnnotator {
        AiAnnotator::new(
            chat,
            Arc::new(NoopSessionEvents),
            AnnotatorSettings {
                max_tokens,
                ..Default::default()
            },
        )
    }

    fn library() -> VoiceLibrary {
        VoiceLibrary::new(vec![
            VoiceEntry::new(VoiceRef::new("v/男声.wav").unwrap(), "男声", AudioFormat::Wav),
            VoiceEntry::new(VoiceRef::new("v/女声.wav").unwrap(), "女声", AudioFormat::Wav),
        ])
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_single_batch_structured_reply() {
        let chat = Arc::new(FakeChatClient::new());
        chat.push_reply(
            r#"{"roles":[{"name":"narrator"},{"name":"小红","description":"女孩"}],
                "segments":[
                  {"text":"小红笑道：","role":"小红","type":"narration"},
                  {"text":"“真好！”","role":"小红","type":"dialogue","emotion":"喜","emotion_vector":[0.9,0.2,0,0,0,0,0,0]}
                ]}"#,
        );
        let annotator = annotator(chat.clone(), 2000);

        let result = annotator
            .annotate(&SessionId::new(), &lines(&["小红笑道：“真好！”"]), &[], &library())
            .await
            .unwrap();

        assert_eq!(result.segments.len(), 2);
        // 旁白类型强制归为 narrator
        assert_eq!(result.segments[0].role, NARRATOR_ROLE);
        assert_eq!(result.segments[1].role, "小红");
        assert_eq!(
            result.segments[1].emotion.dominant().map(|(axis, _)| axis),
            Some(EmotionAxis::Joy)
        );
        assert_eq!(result.segments[1].emotion.get(EmotionAxis::Anger), 0.0);
        // 每个角色都有音色
        assert!(result.roles.iter().all(|r| r.suggested_voice.is_some()));
        assert_eq!(chat.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_batches_are_sequential_and_share_roles() {
        let chat = Arc::new(FakeChatClient::new());
        chat.push_reply(r#"{"roles":[{"name":"张三"}],"assignments":[]}"#);
        chat.push_reply("完全不是 JSON");
        let annotator = annotator(chat.clone(), 1200);

        // 两行各 1000 个汉字，超出单批预算
        let text = lines(&[&"甲".repeat(1000), &"乙".repeat(1000)]);
        let result = annotator
            .annotate(&SessionId::new(), &text, &["李四".to_string()], &library())
            .await
            .unwrap();

        let requests = chat.requests();
        assert_eq!(requests.len(), 2);
        let second_prompt = &requests[1].messages[1].content;
        assert!(second_prompt.contains("张三"));
        assert!(second_prompt.contains("李四"));
        assert!(second_prompt.contains("2/2"));

        // 第一批无内容 → 默认旁白；第二批 → 启发式
        assert_eq!(result.heuristic_batches, 1);
        let joined: String = result.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, text.concat());
    }

    #[tokio::test]
    async fn test_chat_failure_aborts_whole_annotation() {
        let chat = Arc::new(FakeChatClient::new());
        chat.push_reply(r#"{"roles":[],"segments":[]}"#);
        chat.push_failure(ChatError::ServiceError {
            status: 500,
            body: "boom".into(),
        });
        let annotator = annotator(chat.clone(), 1200);

        let text = lines(&[&"甲".repeat(1000), &"乙".repeat(1000)]);
        let err = annotator
            .annotate(&SessionId::new(), &text, &[], &library())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ServiceError { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back_to_narrator() {
        let chat = Arc::new(FakeChatClient::new());
        chat.push_reply("");
        let annotator = annotator(chat.clone(), 2000);

        let result = annotator
            .annotate(&SessionId::new(), &lines(&["天黑了。"]), &[], &library())
            .await
            .unwrap();
        assert_eq!(result.heuristic_batches, 1);
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].role, NARRATOR_ROLE);
        assert_eq!(result.segments[0].text, "天黑了。");
    }

    #[tokio::test]
    async fn test_blank_lines_are_not_sent() {
        let chat = Arc::new(FakeChatClient::new());
        chat.push_reply(r#"{"roles":[],"segments":[]}"#);
        let annotator = annotator(chat.clone(), 2000);

        let result = annotator
            .annotate(&SessionId::new(), &lines(&["第一行", "  ", "第二行"]), &[], &library())
            .await
            .unwrap();
        assert_eq!(result.segments.len(), 2);
        assert!(!chat.requests()[0].messages[1].content.contains("3. "));
    }
}
