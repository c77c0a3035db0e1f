//! # Aether状态存储模块
//!
//! 应用状态、动作与纯函数归约器，以及围绕它的副作用：
//! - 状态存储：串行处理动作，持有不可变快照
//! - 通知旁路：把提示消息投递给接收端
//! - 持久化：把领域状态写入键值存储
//! - 选择器：只读的派生视图
//! - 种子数据：首次启动时的演示数据

pub mod action;
pub mod notification;
pub mod persistence;
pub mod reducer;
pub mod seed;
pub mod selectors;
pub mod state;
pub mod store;

pub use action::{Action, LabTestUpdate, NewPatient, NewTask, PrescriptionUpdate, TimelineNote};
pub use notification::{MemorySink, Notification, NotificationKind, NotificationSink, TracingSink};
pub use persistence::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, PersistedState, PersistenceAdapter, DEFAULT_STORAGE_KEY,
};
pub use reducer::{reduce, Reduction};
pub use seed::seed_state;
pub use state::AppState;
pub use store::Store;
