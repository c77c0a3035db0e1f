//! 状态存储
//!
//! 持有当前快照，串行处理动作：先做纯状态转换，再持久化，最后投递通知。

use crate::action::Action;
use crate::notification::NotificationSink;
use crate::persistence::PersistenceAdapter;
use crate::reducer::{reduce, Reduction};
use crate::seed::seed_state;
use crate::state::AppState;
use aether_core::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 状态存储（单一写入者）
pub struct Store {
    state: Arc<AppState>,
    persistence: PersistenceAdapter,
    sink: Arc<dyn NotificationSink>,
}

impl Store {
    pub fn new(state: AppState, persistence: PersistenceAdapter, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            state: Arc::new(state),
            persistence,
            sink,
        }
    }

    /// 读取已保存的状态，没有时使用种子数据
    pub fn open(persistence: PersistenceAdapter, sink: Arc<dyn NotificationSink>, now: DateTime<Utc>) -> Self {
        let seed = seed_state(now);
        let state = match persistence.load() {
            Some(persisted) => {
                tracing::info!("Restored persisted state from {}", persistence.key());
                persisted.into_state(seed)
            }
            None => {
                tracing::info!("No persisted state under {}, starting from seed data", persistence.key());
                seed
            }
        };

        let store = Self::new(state, persistence, sink);
        store.persistence.save(&store.state);
        store
    }

    /// 当前快照
    pub fn get_state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn dispatch(&mut self, action: Action) -> bool {
        self.dispatch_at(action, Utc::now())
    }

    /// 处理一个动作，返回状态是否发生变化
    ///
    /// 被拒绝的动作只记录警告，当前快照保持不变。
    pub fn dispatch_at(&mut self, action: Action, now: DateTime<Utc>) -> bool {
        match self.try_dispatch_at(&action, now) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::warn!("Rejected action {}: {}", action.name(), e);
                false
            }
        }
    }

    /// 与 `dispatch_at` 相同，但把拒绝原因返回给调用方
    pub fn try_dispatch_at(&mut self, action: &Action, now: DateTime<Utc>) -> Result<bool> {
        match reduce(&self.state, action, now)? {
            Reduction::Unchanged => {
                tracing::debug!("Action {} left state unchanged", action.name());
                Ok(false)
            }
            Reduction::Changed { state, notifications } => {
                self.state = Arc::new(state);
                self.persistence.save(&self.state);
                for notification in &notifications {
                    self.sink.notify(notification);
                }
                Ok(true)
            }
        }
    }

    /// 清除已保存的状态并恢复种子数据
    pub fn reset(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.persistence.reset()?;
        self.state = Arc::new(seed_state(now));
        self.persistence.save(&self.state);
        tracing::info!("State reset to seed data");
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("persistence", &self.persistence)
            .field("sequence", &self.state.sequence)
            .finish()
    }
}
