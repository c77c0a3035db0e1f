//! 状态持久化
//!
//! 领域状态整体序列化为一个 JSON 值，写入键值存储的单个键下。
//! 写入失败只记录日志，不影响内存中的状态；读取失败视为没有保存过的状态。

use crate::state::AppState;
use aether_core::{
    AetherError, CareInstruction, ChatMessage, ClinicalTask, CurrentUser, LabTest, Patient, Prescription, Result,
    Theme, TimelineEvent,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 默认存储键
pub const DEFAULT_STORAGE_KEY: &str = "aether_db";

/// 当前持久化格式版本
pub const STATE_VERSION: u32 = 1;

/// 键值存储
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// 内存键值存储，可选容量上限
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries();
        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(AetherError::Storage(format!(
                    "storage quota exceeded: {} bytes needed, {} allowed",
                    needed, quota
                )));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// 文件键值存储，每个键对应数据目录下的一个 JSON 文件
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    base_path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(AetherError::Validation(format!("invalid storage key: {}", key)));
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.base_path)?;

        // 先写临时文件再改名，避免读到写了一半的文件
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// 持久化的领域状态
///
/// 人员目录和科室目录不保存，加载时取自种子数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub version: u32,
    pub patients: Vec<Patient>,
    pub tasks: Vec<ClinicalTask>,
    pub timeline_events: Vec<TimelineEvent>,
    pub chat_messages: Vec<ChatMessage>,
    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
    #[serde(default)]
    pub lab_tests: Vec<LabTest>,
    #[serde(default)]
    pub care_instructions: Vec<CareInstruction>,
    #[serde(default)]
    pub selected_patient_id: Option<String>,
    pub current_user: CurrentUser,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub sequence: u64,
}

impl PersistedState {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            version: STATE_VERSION,
            patients: state.patients.clone(),
            tasks: state.tasks.clone(),
            timeline_events: state.timeline_events.clone(),
            chat_messages: state.chat_messages.clone(),
            prescriptions: state.prescriptions.clone(),
            lab_tests: state.lab_tests.clone(),
            care_instructions: state.care_instructions.clone(),
            selected_patient_id: state.selected_patient_id.clone(),
            current_user: state.current_user.clone(),
            theme: state.theme,
            sequence: state.sequence,
        }
    }

    /// 与种子状态合并，得到完整的应用状态
    pub fn into_state(self, seed: AppState) -> AppState {
        AppState {
            patients: self.patients,
            tasks: self.tasks,
            timeline_events: self.timeline_events,
            chat_messages: self.chat_messages,
            prescriptions: self.prescriptions,
            lab_tests: self.lab_tests,
            care_instructions: self.care_instructions,
            selected_patient_id: self.selected_patient_id,
            current_user: self.current_user,
            theme: self.theme,
            search_query: String::new(),
            selected_department: None,
            sequence: self.sequence.max(seed.sequence),
            ..seed
        }
    }
}

/// 持久化适配器
#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()), DEFAULT_STORAGE_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 保存状态，失败时记录警告并返回 false
    pub fn save(&self, state: &AppState) -> bool {
        let persisted = PersistedState::from_state(state);
        let result = serde_json::to_string(&persisted)
            .map_err(AetherError::from)
            .and_then(|json| self.store.set(&self.key, &json));

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to persist state under {}: {}", self.key, e);
                false
            }
        }
    }

    /// 读取已保存的状态；缺失、损坏或版本不符时返回 None
    pub fn load(&self) -> Option<PersistedState> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read persisted state {}: {}", self.key, e);
                return None;
            }
        };

        match serde_json::from_str::<PersistedState>(&raw) {
            Ok(persisted) if persisted.version == STATE_VERSION => Some(persisted),
            Ok(persisted) => {
                tracing::warn!(
                    "Ignoring persisted state {} with unsupported version {}",
                    self.key,
                    persisted.version
                );
                None
            }
            Err(e) => {
                tracing::warn!("Discarding corrupt persisted state {}: {}", self.key, e);
                None
            }
        }
    }

    /// 删除已保存的状态
    pub fn reset(&self) -> Result<()> {
        self.store.remove(&self.key)
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_state;
    use chrono::{TimeZone, Utc};

    fn seed() -> AppState {
        seed_state(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let adapter = PersistenceAdapter::in_memory();
        let mut state = seed();
        state.theme = Theme::Dark;
        state.search_query = "transient".to_string();

        assert!(adapter.save(&state));
        let loaded = adapter.load().unwrap().into_state(seed());

        assert_eq!(PersistedState::from_state(&loaded), PersistedState::from_state(&state));
        assert_eq!(loaded.prescriptions, state.prescriptions);
        assert_eq!(loaded.lab_tests, state.lab_tests);
        assert_eq!(loaded.care_instructions, state.care_instructions);
        assert_eq!(loaded.selected_patient_id, state.selected_patient_id);
        assert_eq!(loaded.sequence, state.sequence);
        assert_eq!(loaded.theme, Theme::Dark);
        assert_eq!(loaded.search_query, "");
    }

    #[test]
    fn test_missing_and_corrupt_data() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let adapter = PersistenceAdapter::new(store.clone(), DEFAULT_STORAGE_KEY);
        assert!(adapter.load().is_none());

        store.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        assert!(adapter.load().is_none());

        store.set(DEFAULT_STORAGE_KEY, r#"{"version": 1, "patients": []}"#).unwrap();
        assert!(adapter.load().is_none());
    }

    #[test]
    fn test_unsupported_version_is_ignored() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let adapter = PersistenceAdapter::new(store.clone(), DEFAULT_STORAGE_KEY);
        let mut persisted = PersistedState::from_state(&seed());
        persisted.version = 99;
        store
            .set(DEFAULT_STORAGE_KEY, &serde_json::to_string(&persisted).unwrap())
            .unwrap();
        assert!(adapter.load().is_none());
    }

    #[test]
    fn test_quota_failure_is_swallowed() {
        let adapter = PersistenceAdapter::new(Arc::new(MemoryKeyValueStore::with_quota(64)), DEFAULT_STORAGE_KEY);
        assert!(!adapter.save(&seed()));
        assert!(adapter.load().is_none());
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("data"));

        assert_eq!(store.get("aether_db").unwrap(), None);
        store.set("aether_db", "{}").unwrap();
        assert_eq!(store.get("aether_db").unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("data").join("aether_db.json").exists());

        store.remove("aether_db").unwrap();
        store.remove("aether_db").unwrap();
        assert_eq!(store.get("aether_db").unwrap(), None);

        assert!(matches!(store.set("../escape", "x"), Err(AetherError::Validation(_))));
    }

    #[test]
    fn test_reset_removes_saved_state() {
        let adapter = PersistenceAdapter::in_memory();
        assert!(adapter.save(&seed()));
        adapter.reset().unwrap();
        assert!(adapter.load().is_none());
    }
}
