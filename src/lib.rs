//! # Aether
//!
//! 医院运营看板的状态引擎：入院跟踪、临床医嘱、SLA 计算与本地持久化。
//!
//! 各子模块的统一入口：
//! - [`core`]：领域模型与错误类型
//! - [`workflow`]：SLA 引擎、任务状态机、工作列表与告警
//! - [`store`]：状态、动作、归约器、持久化与选择器
//! - [`admin`]：配置、日志与 SLA 监控

pub use aether_admin as admin;
pub use aether_core as core;
pub use aether_store as store;
pub use aether_workflow as workflow;

pub use aether_core::{AetherError, Result};
pub use aether_store::{Action, AppState, Store};
