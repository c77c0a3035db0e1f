//! 核心数据模型定义
//!
//! 所有实体都是不可变值：修改即构造新值。序列化字段名使用 camelCase，
//! 枚举取值使用 kebab-case，与本地持久化的数据格式保持一致。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 患者基本信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub mrn: String, // 病历号
    pub admission_date: DateTime<Utc>,
    pub department: String,
    pub bed_number: String,
    pub diagnosis: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub contact_number: String,
    pub emergency_contact: String,
    pub insurance: String,
    pub status: PatientStatus,
}

/// 性别枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// 患者状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientStatus {
    Active,
    Stable,
    Critical,
    Discharged,
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PatientStatus::Active => "Active",
            PatientStatus::Stable => "Stable",
            PatientStatus::Critical => "Critical",
            PatientStatus::Discharged => "Discharged",
        };
        f.write_str(label)
    }
}

/// 临床任务（医嘱）状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,       // 待处理
    InProgress, // 处理中
    Completed,  // 已完成
    Delayed,    // 已延误
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Delayed,
    ];

    /// 未完成的任务都算作"开放"任务
    pub fn is_open(self) -> bool {
        self != TaskStatus::Completed
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Delayed => "delayed",
        };
        f.write_str(label)
    }
}

/// 临床任务优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskPriority {
    Stat,    // 危急
    Urgent,  // 紧急
    Routine, // 常规
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskPriority::Stat => "stat",
            TaskPriority::Urgent => "urgent",
            TaskPriority::Routine => "routine",
        };
        f.write_str(label)
    }
}

/// 临床任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    Prescription,
    LabTest,
    Imaging,
    Procedure,
    Referral,
    CareInstruction,
}

impl TaskType {
    pub const ALL: [TaskType; 6] = [
        TaskType::Prescription,
        TaskType::LabTest,
        TaskType::Imaging,
        TaskType::Procedure,
        TaskType::Referral,
        TaskType::CareInstruction,
    ];

    /// 任务类型对应的默认执行科室
    pub fn default_department(self) -> Option<&'static str> {
        match self {
            TaskType::Prescription => Some("Pharmacy"),
            TaskType::LabTest => Some("Laboratory"),
            TaskType::Imaging => Some("Radiology"),
            TaskType::CareInstruction => Some("Nursing"),
            TaskType::Procedure | TaskType::Referral => None,
        }
    }

    /// 统计报表中使用的显示名称
    pub fn label(self) -> &'static str {
        match self {
            TaskType::Prescription => "Prescriptions",
            TaskType::LabTest => "Lab Tests",
            TaskType::Imaging => "Imaging",
            TaskType::Procedure => "Procedures",
            TaskType::Referral => "Referrals",
            TaskType::CareInstruction => "Care Instructions",
        }
    }
}

/// 临床任务（医嘱）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalTask {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub title: String,
    pub description: String,
    pub requested_by: String,
    pub requested_by_role: String,
    pub department: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub due_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub sla_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub escalated: bool,
}

/// 时间线事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimelineEventType {
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    ReportUploaded,
    NoteAdded,
    StatusChanged,
}

/// 时间线事件（只追加的审计记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub patient_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: TimelineEventType,
    pub title: String,
    pub description: String,
    pub performed_by: String,
    pub department: String,
    /// 事件关联的任务，用于告警去重
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// 患者会话消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub patient_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_role: String,
    pub department: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// 科室（静态目录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub code: String,
    pub icon: String,
    pub color: String,
}

/// 处方状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrescriptionStatus {
    Pending,
    Dispensed,
    Administered,
}

/// 处方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub prescribed_by: String,
    pub prescribed_at: DateTime<Utc>,
    pub status: PrescriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pharmacy_notes: Option<String>,
}

/// 检验类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabTestCategory {
    Blood,
    Urine,
    Imaging,
    Pathology,
    Other,
}

/// 检验状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabTestStatus {
    Ordered,
    SampleCollected,
    InProgress,
    Completed,
}

/// 检验项目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    pub id: String,
    pub patient_id: String,
    pub test_name: String,
    pub test_code: String,
    pub category: LabTestCategory,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub status: LabTestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_collected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// 护理医嘱类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CareCategory {
    Diet,
    Activity,
    Medication,
    Monitoring,
    Other,
}

/// 护理医嘱优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CarePriority {
    High,
    Medium,
    Low,
}

/// 护理医嘱
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareInstruction {
    pub id: String,
    pub patient_id: String,
    pub instruction: String,
    pub category: CareCategory,
    pub priority: CarePriority,
    pub given_by: String,
    pub given_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
}

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    Doctor,
    Nurse,
    LabTech,
    Pharmacist,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UserRole::Doctor => "doctor",
            UserRole::Nurse => "nurse",
            UserRole::LabTech => "lab-tech",
            UserRole::Pharmacist => "pharmacist",
            UserRole::Admin => "admin",
        };
        f.write_str(label)
    }
}

/// 当前操作者（可随时切换，不是认证会话）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub department: String,
}

/// 人员目录条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub department: String,
    pub email: String,
    pub is_online: bool,
}

impl StaffMember {
    pub fn as_current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.id.clone(),
            name: self.name.clone(),
            role: self.role,
            department: self.department.clone(),
        }
    }
}

/// 界面主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// 附件文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentKind {
    Pdf,
    Image,
    Document,
}

/// 报告中心的附件类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentCategory {
    LabReport,
    Imaging,
    Prescription,
    Discharge,
    Other,
}

/// 报告中心附件（由处方与检验记录派生，不单独存储）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub kind: AttachmentKind,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: String,
    pub category: AttachmentCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in-progress\"");
        assert_eq!(serde_json::to_string(&TaskType::CareInstruction).unwrap(), "\"care-instruction\"");
        assert_eq!(serde_json::to_string(&UserRole::LabTech).unwrap(), "\"lab-tech\"");
        assert_eq!(serde_json::to_string(&PatientStatus::Critical).unwrap(), "\"Critical\"");
    }

    #[test]
    fn test_default_department_by_task_type() {
        assert_eq!(TaskType::LabTest.default_department(), Some("Laboratory"));
        assert_eq!(TaskType::Prescription.default_department(), Some("Pharmacy"));
        assert_eq!(TaskType::Referral.default_department(), None);
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }
}
