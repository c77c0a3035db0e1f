//! # Aether工作流模块
//!
//! 提供临床任务的工作流功能，包括：
//! - SLA 引擎：计算任务的截止状态、进度与倒计时
//! - 任务状态机：管理任务状态转换与完成时间
//! - 工作列表：按科室、状态、搜索词过滤任务并统计
//! - 告警处理：构建去重的告警列表，跟踪首次超时的任务

pub mod alerts;
pub mod sla;
pub mod state_machine;
pub mod worklist;

// 重新导出主要类型
pub use alerts::{build_alert_feed, AlertEntry, AlertKind, AlertSource, OverdueTracker, WorkspaceView};
pub use sla::{format_duration, format_relative_time, SlaPolicy, SlaReport, SlaStatus};
pub use state_machine::{TaskEvent, TaskStateMachine};
pub use worklist::{
    department_workspace, kanban_columns, query_tasks, worklist_stats, DepartmentWorkspace, KanbanColumn,
    TaskFilter, WorkListStats,
};
