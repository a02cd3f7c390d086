//! Sled-based State Store Implementation
//!
//! 键布局：
//! - `roles`                 → {"角色名": "音色引用"}
//! - `line_state:{session}`  → {"emotions": {"0": [8 floats]}, "speeds": {"0": 1.0}}
//!
//! 值为 JSON，方便外部工具直接查看

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{LineState, StateStoreError, StateStorePort};
use crate::domain::performance::{EmotionVector, SessionId, SpeedFactor, EMOTION_DIMS};

const ROLES_KEY: &str = "roles";
const LINE_STATE_PREFIX: &str = "line_state:";

/// 持久化格式；值宽松解析，坏条目跳过
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredLineState {
    #[serde(default)]
    emotions: BTreeMap<String, Value>,
    #[serde(default)]
    speeds: BTreeMap<String, Value>,
}

impl StoredLineState {
    fn from_state(state: &LineState) -> Self {
        Self {
            emotions: state
                .emotions
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.values().to_vec())))
                .collect(),
            speeds: state
                .speeds
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.value())))
                .collect(),
        }
    }

    fn into_state(self) -> LineState {
        let emotions = self
            .emotions
            .into_iter()
            .filter_map(|(k, v)| {
                let values: Vec<f64> = v.as_array()?.iter().filter_map(Value::as_f64).collect();
                (values.len() == EMOTION_DIMS).then(|| (k, EmotionVector::from_slice(&values)))
            })
            .collect();
        let speeds = self
            .speeds
            .into_iter()
            .filter_map(|(k, v)| Some((k, SpeedFactor::new(v.as_f64()? as f32))))
            .collect();
        LineState { emotions, speeds }
    }
}

/// Sled 状态存储
pub struct SledStateStore {
    db: ::sled::Db,
}

impl SledStateStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StateStoreError> {
        let db = ::sled::open(path.as_ref())
            .map_err(|e| StateStoreError::DatabaseError(e.to_string()))?;
        tracing::info!(db_path = %path.as_ref().display(), "SledStateStore initialized");
        Ok(Self { db })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn line_state_key(id: &SessionId) -> String {
        format!("{}{}", LINE_STATE_PREFIX, id)
    }

    fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StateStoreError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| StateStoreError::SerializationError(e.to_string()))?;
        self.db
            .insert(key, bytes)
            .map_err(|e| StateStoreError::DatabaseError(e.to_string()))?;
        self.db
            .flush()
            .map_err(|e| StateStoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn fetch<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>, StateStoreError> {
        let Some(bytes) = self
            .db
            .get(key)
            .map_err(|e| StateStoreError::DatabaseError(e.to_string()))?
        else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StateStoreError::SerializationError(e.to_string()))
    }
}

#[async_trait]
impl StateStorePort for SledStateStore {
    async fn save_roles(&self, roles: &BTreeMap<String, String>) -> Result<(), StateStoreError> {
        self.put(ROLES_KEY, roles)?;
        tracing::debug!(roles = roles.len(), "Role table saved");
        Ok(())
    }

    async fn load_roles(&self) -> Result<BTreeMap<String, String>, StateStoreError> {
        Ok(self.fetch(ROLES_KEY)?.unwrap_or_default())
    }

    async fn save_line_state(&self, id: &SessionId, state: &LineState) -> Result<(), StateStoreError> {
        self.put(&Self::line_state_key(id), &StoredLineState::from_state(state))?;
        tracing::debug!(
            session_id = %id,
            emotions = state.emotions.len(),
            speeds = state.speeds.len(),
            "Line state saved"
        );
        Ok(())
    }

    async fn load_line_state(&self, id: &SessionId) -> Result<Option<LineState>, StateStoreError> {
        let stored: Option<StoredLineState> = self.fetch(&Self::line_state_key(id))?;
        Ok(stored.map(StoredLineState::into_state))
    }

    async fn remove_line_state(&self, id: &SessionId) -> Result<(), StateStoreError> {
        self.db
            .remove(Self::line_state_key(id))
            .map_err(|e| StateStoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::performance::EmotionAxis;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_roles_roundtrip_and_default() {
        let dir = tempdir().unwrap();
        let store = SledStateStore::open(dir.path().join("state.sled")).unwrap();
        assert!(store.load_roles().await.unwrap().is_empty());

        let mut roles = BTreeMap::new();
        roles.insert("林黛玉".to_string(), "voices/女声.wav".to_string());
        store.save_roles(&roles).await.unwrap();
        assert_eq!(store.load_roles().await.unwrap(), roles);
    }

    #[tokio::test]
    async fn test_line_state_per_session() {
        let dir = tempdir().unwrap();
        let store = SledStateStore::open(dir.path().join("state.sled")).unwrap();
        let a = SessionId::new();
        let b = SessionId::new();

        let mut state = LineState::default();
        state
            .emotions
            .insert("2".to_string(), EmotionVector::single(EmotionAxis::Sorrow, 0.4));
        state.speeds.insert("0".to_string(), SpeedFactor::new(1.5));
        store.save_line_state(&a, &state).await.unwrap();

        assert_eq!(store.load_line_state(&a).await.unwrap(), Some(state));
        assert!(store.load_line_state(&b).await.unwrap().is_none());

        store.remove_line_state(&a).await.unwrap();
        assert!(store.load_line_state(&a).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_entries_are_skipped() {
        let dir = tempdir().unwrap();
        let store = SledStateStore::open(dir.path().join("state.sled")).unwrap();
        let id = SessionId::new();
        let raw = serde_json::json!({
            "emotions": {"0": [0.5, 0, 0, 0, 0, 0, 0, 0], "1": [1, 2], "x": "bad"},
            "speeds": {"0": 1.2, "1": "fast"}
        });
        store.put(&SledStateStore::line_state_key(&id), &raw).unwrap();

        let state = store.load_line_state(&id).await.unwrap().unwrap();
        assert_eq!(state.emotions.len(), 1);
        assert!(state.emotions.contains_key("0"));
        assert_eq!(state.speeds.len(), 1);
    }
}
