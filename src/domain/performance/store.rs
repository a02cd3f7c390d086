//! 按片段索引存储的稀疏映射
//!
//! 角色分配、情感、语速三张表共用同一个 [`IndexedStore`]，
//! 所有结构性编辑（插入/删除/移动）都通过 [`renumber`] 重新编号，
//! 保证注解始终与片段对齐。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{EmotionVector, SpeedFactor};

/// 结构性编辑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    /// 在 at 处插入新行，原 at 及之后的行后移
    Insert { at: usize },
    /// 删除 at 处的行，之后的行前移
    Delete { at: usize },
    /// 把 from 处的行移到 to
    Move { from: usize, to: usize },
}

/// 计算编辑后某个索引的新位置；被删除的索引返回 None
pub fn renumber(index: usize, op: EditOp) -> Option<usize> {
    match op {
        EditOp::Insert { at } => Some(if index >= at { index + 1 } else { index }),
        EditOp::Delete { at } => match index {
            i if i == at => None,
            i if i > at => Some(i - 1),
            i => Some(i),
        },
        EditOp::Move { from, to } => Some(match index {
            i if i == from => to,
            i if from < to && i > from && i <= to => i - 1,
            i if from > to && i >= to && i < from => i + 1,
            i => i,
        }),
    }
}

/// 稀疏索引映射；缺失的键读出回退值
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedStore<V> {
    entries: BTreeMap<usize, V>,
    fallback: V,
}

/// 行 → 角色名
pub type RoleAssignments = IndexedStore<String>;
/// 行 → 情感向量
pub type EmotionStore = IndexedStore<EmotionVector>;
/// 行 → 语速
pub type SpeedStore = IndexedStore<SpeedFactor>;

impl<V: Clone> IndexedStore<V> {
    pub fn with_fallback(fallback: V) -> Self {
        Self {
            entries: BTreeMap::new(),
            fallback,
        }
    }

    pub fn assign(&mut self, index: usize, value: V) {
        self.entries.insert(index, value);
    }

    pub fn unassign(&mut self, index: usize) -> Option<V> {
        self.entries.remove(&index)
    }

    /// 读取值；未设置时返回回退值
    pub fn get(&self, index: usize) -> &V {
        self.entries.get(&index).unwrap_or(&self.fallback)
    }

    /// 只读取显式设置的值
    pub fn explicit(&self, index: usize) -> Option<&V> {
        self.entries.get(&index)
    }

    pub fn fallback(&self) -> &V {
        &self.fallback
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &V)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(usize, &V) -> bool) {
        self.entries.retain(|k, v| keep(*k, v));
    }

    /// 对所有键应用同一个编辑
    pub fn on_edit(&mut self, op: EditOp) {
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .filter_map(|(k, v)| renumber(k, op).map(|k| (k, v)))
            .collect();
    }

    /// 导出为字符串键映射（十进制索引）
    pub fn serialize(&self) -> BTreeMap<String, V> {
        self.entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// 从字符串键映射恢复；非数字键被跳过
    pub fn restore<I>(fallback: V, map: I) -> Self
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let entries = map
            .into_iter()
            .filter_map(|(k, v)| match k.trim().parse::<usize>() {
                Ok(index) => Some((index, v)),
                Err(_) => {
                    tracing::debug!(key = %k, "Skipping non-numeric store key");
                    None
                }
            })
            .collect();
        Self { entries, fallback }
    }
}

impl<V: Clone + Default> Default for IndexedStore<V> {
    fn default() -> Self {
        Self::with_fallback(V::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(pairs: &[(usize, &str)]) -> RoleAssignments {
        let mut store = RoleAssignments::with_fallback("unassigned".to_string());
        for (k, v) in pairs {
            store.assign(*k, v.to_string());
        }
        store
    }

    fn keys(store: &RoleAssignments) -> Vec<(usize, String)> {
        store.iter().map(|(k, v)| (k, v.clone())).collect()
    }

    #[test]
    fn test_delete_renumbers_following_keys() {
        let mut store = roles(&[(1, "A"), (2, "B"), (3, "C"), (4, "D")]);
        store.on_edit(EditOp::Delete { at: 2 });
        assert_eq!(
            keys(&store),
            vec![(1, "A".into()), (2, "C".into()), (3, "D".into())]
        );
    }

    #[test]
    fn test_insert_shifts_keys() {
        let mut store = roles(&[(0, "A"), (1, "B")]);
        store.on_edit(EditOp::Insert { at: 1 });
        assert_eq!(keys(&store), vec![(0, "A".into()), (2, "B".into())]);
    }

    #[test]
    fn test_move_down_and_up() {
        let mut store = roles(&[(0, "A"), (1, "B"), (2, "C"), (3, "D")]);
        store.on_edit(EditOp::Move { from: 0, to: 2 });
        assert_eq!(
            keys(&store),
            vec![(0, "B".into()), (1, "C".into()), (2, "A".into()), (3, "D".into())]
        );

        store.on_edit(EditOp::Move { from: 2, to: 0 });
        assert_eq!(
            keys(&store),
            vec![(0, "A".into()), (1, "B".into()), (2, "C".into()), (3, "D".into())]
        );
    }

    #[test]
    fn test_move_matches_vec_semantics() {
        let mut lines = vec!["a", "b", "c", "d", "e"];
        let mut store = IndexedStore::<&str>::with_fallback("");
        for (i, l) in lines.iter().enumerate() {
            store.assign(i, *l);
        }
        let line = lines.remove(3);
        lines.insert(1, line);
        store.on_edit(EditOp::Move { from: 3, to: 1 });
        for (i, l) in lines.iter().enumerate() {
            assert_eq!(store.get(i), l);
        }
    }

    #[test]
    fn test_get_returns_fallback() {
        let store = roles(&[(0, "A")]);
        assert_eq!(store.get(5), "unassigned");
        assert!(store.explicit(5).is_none());

        let speeds = SpeedStore::default();
        assert_eq!(speeds.get(0).value(), 1.0);
        let emotions = EmotionStore::default();
        assert!(emotions.get(3).is_zero());
    }

    #[test]
    fn test_serialize_restore_roundtrip_skips_bad_keys() {
        let store = roles(&[(0, "A"), (12, "B")]);
        let mut map = store.serialize();
        assert_eq!(map.get("12").map(String::as_str), Some("B"));

        map.insert("title".to_string(), "X".to_string());
        let restored = RoleAssignments::restore("unassigned".to_string(), map);
        assert_eq!(restored, store);
    }
}
