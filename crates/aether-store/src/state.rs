//! 应用状态
//!
//! 整个领域状态是一个值。快照以 `Arc<AppState>` 共享，归约器总是构造新值，
//! 持有旧快照的一方看到的内容永远不变。

use aether_core::{
    CareInstruction, ChatMessage, ClinicalTask, CurrentUser, Department, LabTest, Patient, Prescription,
    StaffMember, Theme, TimelineEvent,
};

/// 应用状态
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub patients: Vec<Patient>,
    pub tasks: Vec<ClinicalTask>,
    /// 最新在前
    pub timeline_events: Vec<TimelineEvent>,
    /// 按时间先后
    pub chat_messages: Vec<ChatMessage>,
    pub departments: Vec<Department>,
    pub prescriptions: Vec<Prescription>,
    pub lab_tests: Vec<LabTest>,
    pub care_instructions: Vec<CareInstruction>,
    /// 可切换的人员目录
    pub staff: Vec<StaffMember>,
    pub selected_patient_id: Option<String>,
    pub selected_department: Option<String>,
    pub current_user: CurrentUser,
    pub theme: Theme,
    pub search_query: String,
    /// 时间线与会话标识的分配序号，只增不减
    pub sequence: u64,
}

impl AppState {
    pub fn patient(&self, patient_id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == patient_id)
    }

    pub fn task(&self, task_id: &str) -> Option<&ClinicalTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn has_patient(&self, patient_id: &str) -> bool {
        self.patient(patient_id).is_some()
    }
}
