//! 状态选择器
//!
//! 只读的派生视图，全部是 `&AppState` 上的纯函数。

use crate::state::AppState;
use aether_core::utils::contains_ignore_case;
use aether_core::{
    Attachment, AttachmentCategory, AttachmentKind, ChatMessage, ClinicalTask, Patient, PatientStatus, TaskStatus,
    TimelineEvent,
};
use aether_workflow::alerts::{build_alert_feed, AlertEntry};
use aether_workflow::worklist::{
    department_workspace, kanban_columns, matches_query, worklist_stats, DepartmentWorkspace, KanbanColumn,
};
use aether_workflow::SlaPolicy;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub fn selected_patient(state: &AppState) -> Option<&Patient> {
    state.selected_patient_id.as_deref().and_then(|id| state.patient(id))
}

pub fn patient_tasks<'a>(state: &'a AppState, patient_id: &str) -> Vec<&'a ClinicalTask> {
    state.tasks.iter().filter(|t| t.patient_id == patient_id).collect()
}

/// 患者时间线，最新在前
pub fn patient_timeline<'a>(state: &'a AppState, patient_id: &str) -> Vec<&'a TimelineEvent> {
    state
        .timeline_events
        .iter()
        .filter(|e| e.patient_id == patient_id)
        .collect()
}

/// 患者会话，按时间先后
pub fn patient_chat<'a>(state: &'a AppState, patient_id: &str) -> Vec<&'a ChatMessage> {
    state.chat_messages.iter().filter(|m| m.patient_id == patient_id).collect()
}

pub fn department_tasks<'a>(state: &'a AppState, department: &str) -> Vec<&'a ClinicalTask> {
    state.tasks.iter().filter(|t| t.department == department).collect()
}

pub fn tasks_by_status(state: &AppState, status: TaskStatus) -> Vec<&ClinicalTask> {
    state.tasks.iter().filter(|t| t.status == status).collect()
}

/// 按标题、患者姓名或科室搜索任务，空查询返回全部
pub fn search_tasks<'a>(state: &'a AppState, query: &str) -> Vec<&'a ClinicalTask> {
    state.tasks.iter().filter(|t| matches_query(t, query)).collect()
}

/// 按姓名或病历号搜索患者，空查询返回全部
pub fn search_patients<'a>(state: &'a AppState, query: &str) -> Vec<&'a Patient> {
    state
        .patients
        .iter()
        .filter(|p| contains_ignore_case(&p.name, query) || contains_ignore_case(&p.mrn, query))
        .collect()
}

/// 总览页统计（按当前搜索词过滤后计算）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: usize,
    pub active_tasks: usize,
    pub delayed_tasks: usize,
    pub completed_tasks: usize,
    pub critical_patients: usize,
}

pub fn dashboard_stats(state: &AppState) -> DashboardStats {
    let tasks = search_tasks(state, &state.search_query);
    let patients = search_patients(state, &state.search_query);

    DashboardStats {
        total_patients: patients.len(),
        active_tasks: tasks.iter().filter(|t| t.status.is_open()).count(),
        delayed_tasks: tasks.iter().filter(|t| t.status == TaskStatus::Delayed).count(),
        completed_tasks: tasks.iter().filter(|t| t.status == TaskStatus::Completed).count(),
        critical_patients: patients.iter().filter(|p| p.status == PatientStatus::Critical).count(),
    }
}

/// 科室概要
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub department: String,
    pub total: usize,
    pub pending: usize,
    pub delayed: usize,
    /// 完成百分比，没有任务时为 0
    pub progress_percent: f64,
}

pub fn department_summaries(state: &AppState) -> Vec<DepartmentSummary> {
    state
        .departments
        .iter()
        .map(|dept| {
            let tasks = department_tasks(state, &dept.name);
            let pending = tasks.iter().filter(|t| t.status.is_open()).count();
            let delayed = tasks.iter().filter(|t| t.status == TaskStatus::Delayed).count();
            let progress_percent = if tasks.is_empty() {
                0.0
            } else {
                (tasks.len() - pending) as f64 / tasks.len() as f64 * 100.0
            };
            DepartmentSummary {
                department: dept.name.clone(),
                total: tasks.len(),
                pending,
                delayed,
                progress_percent,
            }
        })
        .collect()
}

/// 分析页数据
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub delayed_tasks: usize,
    pub overdue_tasks: usize,
    pub completion_rate: u32,
    pub on_time_rate: u32,
    /// (类型名称, 数量)，按任务类型的固定顺序
    pub by_type: Vec<(String, usize)>,
    pub by_priority: Vec<(String, usize)>,
}

pub fn analytics(state: &AppState, policy: &SlaPolicy, now: DateTime<Utc>) -> Analytics {
    let stats = worklist_stats(&state.tasks, policy, now);

    let by_type = aether_core::TaskType::ALL
        .iter()
        .map(|t| (t.label().to_string(), stats.by_type.get(t).copied().unwrap_or(0)))
        .collect();
    let by_priority = [
        aether_core::TaskPriority::Stat,
        aether_core::TaskPriority::Urgent,
        aether_core::TaskPriority::Routine,
    ]
    .iter()
    .map(|p| (p.to_string(), stats.by_priority.get(p).copied().unwrap_or(0)))
    .collect();

    Analytics {
        total_tasks: stats.total,
        completed_tasks: stats.completed,
        delayed_tasks: stats.delayed,
        overdue_tasks: stats.overdue,
        completion_rate: stats.completion_rate(),
        on_time_rate: stats.on_time_rate(),
        by_type,
        by_priority,
    }
}

/// 科室工作台，使用当前搜索词
pub fn workspace<'a>(state: &'a AppState, department: &str, status: Option<TaskStatus>) -> DepartmentWorkspace<'a> {
    department_workspace(&state.tasks, department, &state.search_query, status)
}

pub fn kanban<'a>(
    state: &'a AppState,
    priority: Option<aether_core::TaskPriority>,
    department: Option<&str>,
) -> Vec<KanbanColumn<'a>> {
    kanban_columns(&state.tasks, priority, department)
}

pub fn alert_feed(state: &AppState) -> Vec<AlertEntry> {
    build_alert_feed(&state.tasks, &state.timeline_events)
}

/// 报告中心附件：处方单与带报告的检验记录，最新在前
pub fn reports_hub(state: &AppState, query: &str, category: Option<AttachmentCategory>) -> Vec<Attachment> {
    let prescriptions = state.prescriptions.iter().map(|rx| Attachment {
        id: format!("rx-{}", rx.id),
        name: format!("Prescription_{}_{}.pdf", rx.medication, rx.patient_id),
        kind: AttachmentKind::Pdf,
        url: "#".to_string(),
        uploaded_at: rx.prescribed_at,
        uploaded_by: rx.prescribed_by.clone(),
        category: AttachmentCategory::Prescription,
    });
    let lab_reports = state.lab_tests.iter().filter_map(|lt| {
        lt.report_url.as_ref().map(|url| Attachment {
            id: format!("lab-{}", lt.id),
            name: format!("{}_Report_{}.pdf", lt.test_name, lt.patient_id),
            kind: AttachmentKind::Pdf,
            url: url.clone(),
            uploaded_at: lt.completed_at.unwrap_or(lt.requested_at),
            uploaded_by: "Lab System".to_string(),
            category: AttachmentCategory::LabReport,
        })
    });

    let mut attachments: Vec<Attachment> = prescriptions
        .chain(lab_reports)
        .filter(|a| contains_ignore_case(&a.name, query) || contains_ignore_case(&a.uploaded_by, query))
        .filter(|a| category.map_or(true, |c| a.category == c))
        .collect();
    attachments.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

    tracing::debug!("Reports hub resolved {} attachments", attachments.len());
    attachments
}
