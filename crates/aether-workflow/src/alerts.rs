//! 告警处理
//!
//! 构建页头告警列表，并跟踪首次超时的任务。去重基于实体标识：
//! 每个任务只出现一次，引用了已列出任务的时间线事件会被跳过。

use crate::sla::{SlaPolicy, SlaStatus};
use aether_core::{ClinicalTask, TaskPriority, TaskStatus, TimelineEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const MAX_STAT_ALERTS: usize = 3;
const MAX_DELAYED_ALERTS: usize = 3;
const MAX_EVENT_ALERTS: usize = 6;
const MAX_FEED_ENTRIES: usize = 8;

/// 告警类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    Stat,    // 危急任务
    Delayed, // 延误任务
    Info,    // 时间线动态
}

/// 告警来源实体
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertSource {
    Task(String),
    Event(String),
}

/// 点击告警后跳转的工作台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkspaceView {
    Lab,
    Pharmacy,
    Radiology,
    Tasks,
}

impl WorkspaceView {
    pub fn for_department(department: &str) -> Self {
        match department {
            "Laboratory" => WorkspaceView::Lab,
            "Pharmacy" => WorkspaceView::Pharmacy,
            "Radiology" => WorkspaceView::Radiology,
            _ => WorkspaceView::Tasks,
        }
    }
}

/// 告警条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub source: AlertSource,
    pub kind: AlertKind,
    pub title: String,
    pub detail: String,
    pub time: DateTime<Utc>,
    pub navigate_to: WorkspaceView,
}

/// 告警角标数：未完成的危急任务 + 延误任务
pub fn alert_count(tasks: &[ClinicalTask]) -> usize {
    let stat_open = tasks
        .iter()
        .filter(|t| t.priority == TaskPriority::Stat && t.status.is_open())
        .count();
    let delayed = tasks.iter().filter(|t| t.status == TaskStatus::Delayed).count();
    stat_open + delayed
}

/// 构建告警列表
pub fn build_alert_feed(tasks: &[ClinicalTask], timeline: &[TimelineEvent]) -> Vec<AlertEntry> {
    let mut feed = Vec::new();
    let mut listed_tasks: HashSet<&str> = HashSet::new();

    let stat_open = tasks
        .iter()
        .filter(|t| t.priority == TaskPriority::Stat && t.status.is_open())
        .take(MAX_STAT_ALERTS);
    for task in stat_open {
        if listed_tasks.insert(task.id.as_str()) {
            feed.push(AlertEntry {
                source: AlertSource::Task(task.id.clone()),
                kind: AlertKind::Stat,
                title: format!("Crit: {}", task.title),
                detail: format!("{} • {}", task.patient_name, task.department),
                time: task.created_at,
                navigate_to: WorkspaceView::for_department(&task.department),
            });
        }
    }

    let delayed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Delayed)
        .take(MAX_DELAYED_ALERTS);
    for task in delayed {
        if listed_tasks.insert(task.id.as_str()) {
            feed.push(AlertEntry {
                source: AlertSource::Task(task.id.clone()),
                kind: AlertKind::Delayed,
                title: format!("Delayed: {}", task.title),
                detail: format!("{} • SLA breached", task.patient_name),
                time: task.created_at,
                navigate_to: WorkspaceView::for_department(&task.department),
            });
        }
    }

    for event in timeline.iter().take(MAX_EVENT_ALERTS) {
        let about_listed_task = event
            .task_id
            .as_deref()
            .map_or(false, |id| listed_tasks.contains(id));
        if about_listed_task {
            continue;
        }
        feed.push(AlertEntry {
            source: AlertSource::Event(event.id.clone()),
            kind: AlertKind::Info,
            title: event.title.clone(),
            detail: format!("{} • {}", event.performed_by, event.department),
            time: event.timestamp,
            navigate_to: WorkspaceView::for_department(&event.department),
        });
    }

    feed.truncate(MAX_FEED_ENTRIES);
    feed
}

/// 超时跟踪器
///
/// 记录已经提醒过的超时任务，保证每个任务只在首次超时时提醒一次。
/// 任务完成后从记录中移除，重新打开并再次超时会再次提醒。
#[derive(Debug, Default)]
pub struct OverdueTracker {
    notified: HashSet<String>,
}

impl OverdueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回本次新出现的超时任务
    pub fn newly_overdue<'a>(
        &mut self,
        tasks: &'a [ClinicalTask],
        policy: &SlaPolicy,
        now: DateTime<Utc>,
    ) -> Vec<&'a ClinicalTask> {
        let open: HashSet<&str> = tasks
            .iter()
            .filter(|t| t.status.is_open())
            .map(|t| t.id.as_str())
            .collect();
        self.notified.retain(|id| open.contains(id.as_str()));

        let mut fresh = Vec::new();
        for task in tasks.iter().filter(|t| t.status.is_open()) {
            if policy.evaluate_task(task, now).status != SlaStatus::Overdue {
                continue;
            }
            if self.notified.insert(task.id.clone()) {
                tracing::warn!("Task {} breached its {} minute SLA", task.id, task.sla_minutes);
                fresh.push(task);
            }
        }
        fresh
    }

    pub fn tracked(&self) -> usize {
        self.notified.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_core::{TaskType, TimelineEventType};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn task(id: &str, title: &str, status: TaskStatus, priority: TaskPriority) -> ClinicalTask {
        let created = now() - Duration::minutes(30);
        ClinicalTask {
            id: id.to_string(),
            patient_id: "p1".to_string(),
            patient_name: "Priya Sharma".to_string(),
            task_type: TaskType::Imaging,
            title: title.to_string(),
            description: String::new(),
            requested_by: "Dr. Mehta".to_string(),
            requested_by_role: "doctor".to_string(),
            department: "Radiology".to_string(),
            status,
            priority,
            created_at: created,
            due_time: created + Duration::minutes(20),
            completed_at: None,
            sla_minutes: 20,
            notes: None,
            escalated: false,
        }
    }

    fn event(id: &str, task_id: Option<&str>, description: &str) -> TimelineEvent {
        TimelineEvent {
            id: id.to_string(),
            patient_id: "p1".to_string(),
            timestamp: now(),
            event_type: TimelineEventType::TaskUpdated,
            title: "Task Updated".to_string(),
            description: description.to_string(),
            performed_by: "Nurse Kavya".to_string(),
            department: "Nursing".to_string(),
            task_id: task_id.map(str::to_string),
        }
    }

    #[test]
    fn test_task_listed_once() {
        // 危急且延误的任务只出现一次
        let tasks = vec![task("t1", "CT Head", TaskStatus::Delayed, TaskPriority::Stat)];
        let feed = build_alert_feed(&tasks, &[]);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].kind, AlertKind::Stat);
        assert_eq!(feed[0].navigate_to, WorkspaceView::Radiology);
        assert_eq!(alert_count(&tasks), 2);
    }

    #[test]
    fn test_events_deduplicated_by_task_identity() {
        let tasks = vec![task("t1", "X-Ray - Chest", TaskStatus::Todo, TaskPriority::Stat)];
        let timeline = vec![
            event("e2", Some("t1"), "X-Ray - Chest marked as in-progress"),
            // 描述中包含相同标题但属于其他任务，不应被误判为重复
            event("e1", Some("t9"), "X-Ray - Chest marked as completed"),
        ];
        let feed = build_alert_feed(&tasks, &timeline);
        let sources: Vec<_> = feed.iter().map(|a| a.source.clone()).collect();
        assert_eq!(
            sources,
            vec![AlertSource::Task("t1".to_string()), AlertSource::Event("e1".to_string())]
        );
    }

    #[test]
    fn test_feed_is_capped() {
        let tasks: Vec<_> = (0..5)
            .map(|i| task(&format!("s{}", i), "Stat order", TaskStatus::Todo, TaskPriority::Stat))
            .chain((0..5).map(|i| task(&format!("d{}", i), "Late order", TaskStatus::Delayed, TaskPriority::Routine)))
            .collect();
        let timeline: Vec<_> = (0..10).map(|i| event(&format!("e{}", i), None, "note")).collect();
        let feed = build_alert_feed(&tasks, &timeline);
        assert_eq!(feed.len(), 8);
        assert_eq!(feed.iter().filter(|a| a.kind == AlertKind::Stat).count(), 3);
        assert_eq!(feed.iter().filter(|a| a.kind == AlertKind::Delayed).count(), 3);
    }

    #[test]
    fn test_overdue_tracker_notifies_once() {
        let mut tracker = OverdueTracker::new();
        let policy = SlaPolicy::default();
        let mut tasks = vec![task("t1", "MRI", TaskStatus::InProgress, TaskPriority::Urgent)];

        assert_eq!(tracker.newly_overdue(&tasks, &policy, now()).len(), 1);
        assert!(tracker.newly_overdue(&tasks, &policy, now()).is_empty());

        tasks[0].status = TaskStatus::Completed;
        assert!(tracker.newly_overdue(&tasks, &policy, now()).is_empty());
        assert_eq!(tracker.tracked(), 0);
    }
}
