//! 工作列表
//!
//! 对任务集合做过滤、分组与统计，供科室工作台、看板和统计页使用。
//! 所有函数都是纯函数，每次从当前任务集合重新计算。

use crate::sla::{SlaPolicy, SlaStatus};
use aether_core::utils::contains_ignore_case;
use aether_core::{ClinicalTask, TaskPriority, TaskStatus, TaskType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 工作列表过滤器
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    pub patient_id: Option<String>,
    pub department: Option<String>,
    pub status: Option<Vec<TaskStatus>>,
    pub priority: Option<Vec<TaskPriority>>,
    pub task_type: Option<Vec<TaskType>>,
    /// 匹配标题、患者姓名和科室
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl TaskFilter {
    pub fn matches(&self, task: &ClinicalTask) -> bool {
        if let Some(patient_id) = &self.patient_id {
            if &task.patient_id != patient_id {
                return false;
            }
        }
        if let Some(department) = &self.department {
            if &task.department != department {
                return false;
            }
        }
        if let Some(statuses) = &self.status {
            if !statuses.contains(&task.status) {
                return false;
            }
        }
        if let Some(priorities) = &self.priority {
            if !priorities.contains(&task.priority) {
                return false;
            }
        }
        if let Some(types) = &self.task_type {
            if !types.contains(&task.task_type) {
                return false;
            }
        }
        match &self.query {
            Some(query) => matches_query(task, query),
            None => true,
        }
    }
}

/// 搜索匹配：标题、患者姓名或科室包含查询串（不区分大小写）
pub fn matches_query(task: &ClinicalTask, query: &str) -> bool {
    contains_ignore_case(&task.title, query)
        || contains_ignore_case(&task.patient_name, query)
        || contains_ignore_case(&task.department, query)
}

/// 查询工作列表，保持原有顺序（最新在前）并分页
pub fn query_tasks<'a>(tasks: &'a [ClinicalTask], filter: &TaskFilter) -> Vec<&'a ClinicalTask> {
    let offset = filter.offset.unwrap_or(0);
    let limit = filter.limit.unwrap_or(usize::MAX);

    tasks
        .iter()
        .filter(|task| filter.matches(task))
        .skip(offset)
        .take(limit)
        .collect()
}

/// 按紧急程度排序：优先级高者在前，同优先级按截止时间先后
pub fn sort_by_urgency(tasks: &mut [&ClinicalTask]) {
    tasks.sort_by(|a, b| match a.priority.cmp(&b.priority) {
        std::cmp::Ordering::Equal => a.due_time.cmp(&b.due_time),
        other => other,
    });
}

/// 工作列表统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkListStats {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub delayed: usize,
    /// 按 SLA 计算已超时且未完成的任务
    pub overdue: usize,
    pub stat_open: usize,
    pub by_priority: HashMap<TaskPriority, usize>,
    pub by_type: HashMap<TaskType, usize>,
}

impl WorkListStats {
    /// 未完成任务数
    pub fn open(&self) -> usize {
        self.total - self.completed
    }

    /// 完成率（四舍五入的百分比）
    pub fn completion_rate(&self) -> u32 {
        percent(self.completed, self.total)
    }

    /// 按时率：未延误任务占比
    pub fn on_time_rate(&self) -> u32 {
        percent(self.total - self.delayed, self.total)
    }
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((part as f64 / total as f64) * 100.0).round() as u32
    }
}

/// 获取工作列表统计
pub fn worklist_stats<'a, I>(tasks: I, policy: &SlaPolicy, now: DateTime<Utc>) -> WorkListStats
where
    I: IntoIterator<Item = &'a ClinicalTask>,
{
    let mut stats = WorkListStats::default();

    for task in tasks {
        stats.total += 1;
        match task.status {
            TaskStatus::Todo => stats.todo += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::Completed => stats.completed += 1,
            TaskStatus::Delayed => stats.delayed += 1,
        }

        if task.status.is_open() {
            if policy.evaluate_task(task, now).status == SlaStatus::Overdue {
                stats.overdue += 1;
            }
            if task.priority == TaskPriority::Stat {
                stats.stat_open += 1;
            }
        }

        *stats.by_priority.entry(task.priority).or_insert(0) += 1;
        *stats.by_type.entry(task.task_type).or_insert(0) += 1;
    }

    stats
}

/// 科室工作台视图
#[derive(Debug, Clone, Default)]
pub struct DepartmentWorkspace<'a> {
    pub department: String,
    /// 待处理：todo 与 in-progress
    pub pending: Vec<&'a ClinicalTask>,
    pub completed: Vec<&'a ClinicalTask>,
    pub delayed: Vec<&'a ClinicalTask>,
    /// 未完成的危急任务
    pub stat_open: Vec<&'a ClinicalTask>,
    pub all: Vec<&'a ClinicalTask>,
}

/// 构建科室工作台：按科室、搜索词（患者姓名或标题）和可选状态过滤
pub fn department_workspace<'a>(
    tasks: &'a [ClinicalTask],
    department: &str,
    query: &str,
    status: Option<TaskStatus>,
) -> DepartmentWorkspace<'a> {
    let all: Vec<&ClinicalTask> = tasks
        .iter()
        .filter(|t| t.department == department)
        .filter(|t| contains_ignore_case(&t.patient_name, query) || contains_ignore_case(&t.title, query))
        .filter(|t| status.map_or(true, |s| t.status == s))
        .collect();

    DepartmentWorkspace {
        department: department.to_string(),
        pending: bucket(&all, |t| matches!(t.status, TaskStatus::Todo | TaskStatus::InProgress)),
        completed: bucket(&all, |t| t.status == TaskStatus::Completed),
        delayed: bucket(&all, |t| t.status == TaskStatus::Delayed),
        stat_open: bucket(&all, |t| t.priority == TaskPriority::Stat && t.status.is_open()),
        all,
    }
}

fn bucket<'a>(all: &[&'a ClinicalTask], pred: impl Fn(&ClinicalTask) -> bool) -> Vec<&'a ClinicalTask> {
    all.iter().copied().filter(|t| pred(*t)).collect()
}

/// 看板列
#[derive(Debug, Clone)]
pub struct KanbanColumn<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a ClinicalTask>,
}

/// 构建看板：每个状态一列，可按优先级和科室过滤
pub fn kanban_columns<'a>(
    tasks: &'a [ClinicalTask],
    priority: Option<TaskPriority>,
    department: Option<&str>,
) -> Vec<KanbanColumn<'a>> {
    TaskStatus::ALL
        .iter()
        .map(|status| KanbanColumn {
            status: *status,
            tasks: tasks
                .iter()
                .filter(|t| t.status == *status)
                .filter(|t| priority.map_or(true, |p| t.priority == p))
                .filter(|t| department.map_or(true, |d| t.department == d))
                .collect(),
        })
        .collect()
}
