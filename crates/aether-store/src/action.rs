//! 动作定义
//!
//! 封闭的动作集合，每个变体只携带自身需要的字段。

use aether_core::{
    CurrentUser, Gender, LabTestStatus, PatientStatus, PrescriptionStatus, TaskPriority, TaskStatus, TaskType,
    TimelineEventType,
};

/// 新建医嘱
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub patient_id: String,
    pub task_type: TaskType,
    pub title: String,
    pub description: String,
    /// 为空时按任务类型选择默认科室
    pub department: Option<String>,
    pub priority: TaskPriority,
    pub sla_minutes: i64,
}

/// 入院登记
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub department: String,
    pub bed_number: Option<String>,
    pub diagnosis: String,
    pub allergies: Vec<String>,
    pub contact_number: Option<String>,
    pub emergency_contact: Option<String>,
    pub insurance: Option<String>,
    pub status: PatientStatus,
}

impl NewPatient {
    /// 只含必填字段的登记信息
    pub fn new(name: impl Into<String>, department: impl Into<String>, diagnosis: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: 0,
            gender: Gender::Other,
            department: department.into(),
            bed_number: None,
            diagnosis: diagnosis.into(),
            allergies: Vec::new(),
            contact_number: None,
            emergency_contact: None,
            insurance: None,
            status: PatientStatus::Active,
        }
    }
}

/// 手工追加的时间线记录（备注、报告上传等）
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineNote {
    pub patient_id: String,
    pub event_type: TimelineEventType,
    pub title: String,
    pub description: String,
    pub task_id: Option<String>,
}

/// 检验记录的部分更新
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabTestUpdate {
    pub status: Option<LabTestStatus>,
    pub result: Option<String>,
    pub report_url: Option<String>,
}

/// 处方的部分更新
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrescriptionUpdate {
    pub status: Option<PrescriptionStatus>,
    pub pharmacy_notes: Option<String>,
}

/// 状态动作
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    CreateTask(NewTask),
    UpdateTaskStatus { task_id: String, status: TaskStatus },
    MarkDelayed { task_id: String },
    EscalateTask { task_id: String },
    AddPatient(NewPatient),
    UpdatePatientStatus { patient_id: String, status: PatientStatus },
    AddChatMessage { patient_id: String, message: String },
    SwitchUser(CurrentUser),
    ToggleTheme,
    SetSearchQuery(String),
    SelectPatient(Option<String>),
    SelectDepartment(Option<String>),
    AddTimelineEvent(TimelineNote),
    UpdateLabTest { test_id: String, update: LabTestUpdate },
    UpdatePrescription { rx_id: String, update: PrescriptionUpdate },
    AcknowledgeCareInstruction { instruction_id: String },
}

impl Action {
    /// 日志中使用的动作名
    pub fn name(&self) -> &'static str {
        match self {
            Action::CreateTask(_) => "create_task",
            Action::UpdateTaskStatus { .. } => "update_task_status",
            Action::MarkDelayed { .. } => "mark_delayed",
            Action::EscalateTask { .. } => "escalate_task",
            Action::AddPatient(_) => "add_patient",
            Action::UpdatePatientStatus { .. } => "update_patient_status",
            Action::AddChatMessage { .. } => "add_chat_message",
            Action::SwitchUser(_) => "switch_user",
            Action::ToggleTheme => "toggle_theme",
            Action::SetSearchQuery(_) => "set_search_query",
            Action::SelectPatient(_) => "select_patient",
            Action::SelectDepartment(_) => "select_department",
            Action::AddTimelineEvent(_) => "add_timeline_event",
            Action::UpdateLabTest { .. } => "update_lab_test",
            Action::UpdatePrescription { .. } => "update_prescription",
            Action::AcknowledgeCareInstruction { .. } => "acknowledge_care_instruction",
        }
    }
}
