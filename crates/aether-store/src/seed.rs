//! 演示种子数据
//!
//! 首次启动（没有已保存状态）时使用。所有时间都相对于传入的 `now`，
//! 这样 SLA 状态在任何时刻启动都有意义。

use crate::state::AppState;
use aether_core::{
    CareCategory, CareInstruction, CarePriority, ChatMessage, ClinicalTask, CurrentUser, Department, Gender, LabTest,
    LabTestCategory, LabTestStatus, Patient, PatientStatus, Prescription, PrescriptionStatus, StaffMember, TaskPriority,
    TaskStatus, TaskType, Theme, TimelineEvent, TimelineEventType, UserRole,
};
use chrono::{DateTime, Duration, Utc};

/// 默认选中的患者
pub const DEFAULT_PATIENT_ID: &str = "p1";

/// 构造种子状态
pub fn seed_state(now: DateTime<Utc>) -> AppState {
    let staff = staff_directory();
    let current_user = default_user();
    let timeline_events = timeline(now);
    let chat_messages = chat(now);
    let sequence = (timeline_events.len() + chat_messages.len()) as u64;

    AppState {
        patients: patients(now),
        tasks: tasks(now),
        timeline_events,
        chat_messages,
        departments: department_catalog(),
        prescriptions: prescriptions(now),
        lab_tests: lab_tests(now),
        care_instructions: care_instructions(now),
        staff,
        selected_patient_id: Some(DEFAULT_PATIENT_ID.to_string()),
        selected_department: None,
        current_user,
        theme: Theme::Light,
        search_query: String::new(),
        sequence,
    }
}

/// 默认操作者
pub fn default_user() -> CurrentUser {
    CurrentUser {
        id: "u1".to_string(),
        name: "Dr. Anil Mehta".to_string(),
        role: UserRole::Doctor,
        department: "Cardiology".to_string(),
    }
}

/// 科室目录
pub fn department_catalog() -> Vec<Department> {
    [
        ("d1", "Laboratory", "LAB", "flask-conical", "#8b5cf6"),
        ("d2", "Pharmacy", "PHR", "pill", "#10b981"),
        ("d3", "Radiology", "RAD", "scan", "#f59e0b"),
        ("d4", "Cardiology", "CAR", "heart-pulse", "#ef4444"),
        ("d5", "Nursing", "NUR", "stethoscope", "#06b6d4"),
        ("d6", "General Medicine", "GEN", "activity", "#3b82f6"),
        ("d7", "Neurology", "NEU", "brain", "#a855f7"),
        ("d8", "Orthopedics", "ORT", "bone", "#64748b"),
        ("d9", "Obstetrics", "OBS", "baby", "#ec4899"),
        ("d10", "ICU", "ICU", "siren", "#dc2626"),
    ]
    .into_iter()
    .map(|(id, name, code, icon, color)| Department {
        id: id.to_string(),
        name: name.to_string(),
        code: code.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
    })
    .collect()
}

/// 可切换的人员目录
pub fn staff_directory() -> Vec<StaffMember> {
    [
        ("u1", "Dr. Anil Mehta", UserRole::Doctor, "Cardiology", true),
        ("u2", "Nurse Priya Sharma", UserRole::Nurse, "Nursing", true),
        ("u3", "Ravi Kumar", UserRole::LabTech, "Laboratory", true),
        ("u4", "Meera Iyer", UserRole::Pharmacist, "Pharmacy", false),
        ("u5", "Dr. Sanjay Rao", UserRole::Doctor, "Radiology", true),
        ("u6", "Kavita Nair", UserRole::Admin, "Administration", false),
    ]
    .into_iter()
    .map(|(id, name, role, department, is_online)| StaffMember {
        id: id.to_string(),
        name: name.to_string(),
        role,
        department: department.to_string(),
        email: format!("{}@aether.hospital", name.to_lowercase().replace("dr. ", "").replace(' ', ".")),
        is_online,
    })
    .collect()
}

fn patients(now: DateTime<Utc>) -> Vec<Patient> {
    let patient = |id: &str,
                   name: &str,
                   age: u32,
                   gender: Gender,
                   mrn: &str,
                   days_ago: i64,
                   department: &str,
                   bed: &str,
                   diagnosis: &str,
                   allergies: &[&str],
                   status: PatientStatus| Patient {
        id: id.to_string(),
        name: name.to_string(),
        age,
        gender,
        mrn: mrn.to_string(),
        admission_date: now - Duration::days(days_ago),
        department: department.to_string(),
        bed_number: bed.to_string(),
        diagnosis: diagnosis.to_string(),
        allergies: allergies.iter().map(|a| a.to_string()).collect(),
        contact_number: "+91 98765 43210".to_string(),
        emergency_contact: "Family contact on file".to_string(),
        insurance: "Star Health".to_string(),
        status,
    };

    vec![
        patient(
            "p1",
            "Rajesh Kumar",
            58,
            Gender::Male,
            "MRN2025100231",
            3,
            "Cardiology",
            "Ward-A-204",
            "Acute Myocardial Infarction",
            &["Penicillin"],
            PatientStatus::Critical,
        ),
        patient(
            "p2",
            "Sunita Devi",
            45,
            Gender::Female,
            "MRN2025100232",
            5,
            "General Medicine",
            "Ward-B-112",
            "Type 2 Diabetes with Cellulitis",
            &[],
            PatientStatus::Active,
        ),
        patient(
            "p3",
            "Arjun Patel",
            32,
            Gender::Male,
            "MRN2025100233",
            1,
            "Orthopedics",
            "Ward-C-305",
            "Fractured Femur",
            &["Sulfa drugs", "Latex"],
            PatientStatus::Stable,
        ),
        patient(
            "p4",
            "Lakshmi Menon",
            67,
            Gender::Female,
            "MRN2025100234",
            2,
            "Neurology",
            "ICU-07",
            "Ischemic Stroke",
            &[],
            PatientStatus::Critical,
        ),
    ]
}

fn tasks(now: DateTime<Utc>) -> Vec<ClinicalTask> {
    struct Row {
        id: &'static str,
        patient: (&'static str, &'static str),
        task_type: TaskType,
        title: &'static str,
        description: &'static str,
        department: &'static str,
        status: TaskStatus,
        priority: TaskPriority,
        created_minutes_ago: i64,
        sla_minutes: i64,
    }

    let rows = [
        Row {
            id: "t1",
            patient: ("p1", "Rajesh Kumar"),
            task_type: TaskType::LabTest,
            title: "Troponin I",
            description: "Serial cardiac enzymes, repeat in 6 hours",
            department: "Laboratory",
            status: TaskStatus::InProgress,
            priority: TaskPriority::Stat,
            created_minutes_ago: 25,
            sla_minutes: 30,
        },
        Row {
            id: "t2",
            patient: ("p1", "Rajesh Kumar"),
            task_type: TaskType::Prescription,
            title: "Clopidogrel 75mg",
            description: "Once daily after loading dose",
            department: "Pharmacy",
            status: TaskStatus::Todo,
            priority: TaskPriority::Urgent,
            created_minutes_ago: 40,
            sla_minutes: 60,
        },
        Row {
            id: "t3",
            patient: ("p2", "Sunita Devi"),
            task_type: TaskType::LabTest,
            title: "HbA1c",
            description: "Glycated haemoglobin",
            department: "Laboratory",
            status: TaskStatus::Completed,
            priority: TaskPriority::Routine,
            created_minutes_ago: 300,
            sla_minutes: 240,
        },
        Row {
            id: "t4",
            patient: ("p3", "Arjun Patel"),
            task_type: TaskType::Imaging,
            title: "X-Ray Left Femur",
            description: "AP and lateral views, post reduction",
            department: "Radiology",
            status: TaskStatus::Delayed,
            priority: TaskPriority::Urgent,
            created_minutes_ago: 150,
            sla_minutes: 90,
        },
        Row {
            id: "t5",
            patient: ("p4", "Lakshmi Menon"),
            task_type: TaskType::Imaging,
            title: "CT Head Non-Contrast",
            description: "Rule out haemorrhagic transformation",
            department: "Radiology",
            status: TaskStatus::Todo,
            priority: TaskPriority::Stat,
            created_minutes_ago: 10,
            sla_minutes: 30,
        },
        Row {
            id: "t6",
            patient: ("p2", "Sunita Devi"),
            task_type: TaskType::CareInstruction,
            title: "Wound dressing",
            description: "Change dressing twice daily, monitor for discharge",
            department: "Nursing",
            status: TaskStatus::Todo,
            priority: TaskPriority::Routine,
            created_minutes_ago: 90,
            sla_minutes: 480,
        },
        Row {
            id: "t7",
            patient: ("p3", "Arjun Patel"),
            task_type: TaskType::Referral,
            title: "Physiotherapy consult",
            description: "Mobilisation plan after fixation",
            department: "General",
            status: TaskStatus::Todo,
            priority: TaskPriority::Routine,
            created_minutes_ago: 200,
            sla_minutes: 1440,
        },
    ];

    rows.into_iter()
        .map(|row| {
            let created_at = now - Duration::minutes(row.created_minutes_ago);
            ClinicalTask {
                id: row.id.to_string(),
                patient_id: row.patient.0.to_string(),
                patient_name: row.patient.1.to_string(),
                task_type: row.task_type,
                title: row.title.to_string(),
                description: row.description.to_string(),
                requested_by: "Dr. Anil Mehta".to_string(),
                requested_by_role: UserRole::Doctor.to_string(),
                department: row.department.to_string(),
                status: row.status,
                priority: row.priority,
                created_at,
                due_time: created_at + Duration::minutes(row.sla_minutes),
                completed_at: (row.status == TaskStatus::Completed).then(|| created_at + Duration::minutes(180)),
                sla_minutes: row.sla_minutes,
                notes: None,
                escalated: false,
            }
        })
        .collect()
}

fn timeline(now: DateTime<Utc>) -> Vec<TimelineEvent> {
    let rows = [
        (
            "p4",
            10,
            TimelineEventType::TaskCreated,
            "New Clinical Order",
            "CT Head Non-Contrast (STAT)",
            "Neurology",
            Some("t5"),
        ),
        (
            "p1",
            25,
            TimelineEventType::TaskCreated,
            "New Clinical Order",
            "Troponin I (STAT)",
            "Cardiology",
            Some("t1"),
        ),
        (
            "p2",
            120,
            TimelineEventType::TaskCompleted,
            "Task Completed",
            "HbA1c marked as completed",
            "Laboratory",
            Some("t3"),
        ),
        (
            "p3",
            180,
            TimelineEventType::NoteAdded,
            "Post-op Note",
            "Closed reduction done, neurovascular status intact",
            "Orthopedics",
            None,
        ),
        (
            "p1",
            4320,
            TimelineEventType::StatusChanged,
            "Patient Admitted",
            "Rajesh Kumar admitted to Cardiology",
            "Cardiology",
            None,
        ),
    ];

    let total = rows.len();
    rows.into_iter()
        .enumerate()
        .map(|(i, (patient_id, minutes_ago, event_type, title, description, department, task_id))| TimelineEvent {
            // 最新在前，序号从旧到新递增
            id: format!("e{:012}", total - i),
            patient_id: patient_id.to_string(),
            timestamp: now - Duration::minutes(minutes_ago),
            event_type,
            title: title.to_string(),
            description: description.to_string(),
            performed_by: "Dr. Anil Mehta".to_string(),
            department: department.to_string(),
            task_id: task_id.map(str::to_string),
        })
        .collect()
}

fn chat(now: DateTime<Utc>) -> Vec<ChatMessage> {
    let rows = [
        ("u1", "Dr. Anil Mehta", UserRole::Doctor, "Cardiology", 30, "Please expedite troponin, patient has ongoing chest pain."),
        ("u3", "Ravi Kumar", UserRole::LabTech, "Laboratory", 20, "Sample received, running now."),
        ("u2", "Nurse Priya Sharma", UserRole::Nurse, "Nursing", 5, "BP 150/95, repeat ECG done."),
    ];
    let offset = timeline(now).len();

    rows.into_iter()
        .enumerate()
        .map(|(i, (sender_id, sender_name, role, department, minutes_ago, message))| ChatMessage {
            id: format!("msg{:012}", offset + i + 1),
            patient_id: DEFAULT_PATIENT_ID.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            sender_role: role.to_string(),
            department: department.to_string(),
            message: message.to_string(),
            timestamp: now - Duration::minutes(minutes_ago),
        })
        .collect()
}

fn prescriptions(now: DateTime<Utc>) -> Vec<Prescription> {
    vec![
        Prescription {
            id: "rx1".to_string(),
            patient_id: "p1".to_string(),
            medication: "Aspirin".to_string(),
            dosage: "150mg".to_string(),
            frequency: "Once daily".to_string(),
            duration: "30 days".to_string(),
            prescribed_by: "Dr. Anil Mehta".to_string(),
            prescribed_at: now - Duration::hours(20),
            status: PrescriptionStatus::Dispensed,
            pharmacy_notes: None,
        },
        Prescription {
            id: "rx2".to_string(),
            patient_id: "p2".to_string(),
            medication: "Metformin".to_string(),
            dosage: "500mg".to_string(),
            frequency: "Twice daily".to_string(),
            duration: "90 days".to_string(),
            prescribed_by: "Dr. Anil Mehta".to_string(),
            prescribed_at: now - Duration::hours(48),
            status: PrescriptionStatus::Pending,
            pharmacy_notes: Some("Check renal function before dispensing".to_string()),
        },
    ]
}

fn lab_tests(now: DateTime<Utc>) -> Vec<LabTest> {
    vec![
        LabTest {
            id: "lt1".to_string(),
            patient_id: "p1".to_string(),
            test_name: "Lipid Profile".to_string(),
            test_code: "LIPID".to_string(),
            category: LabTestCategory::Blood,
            requested_by: "Dr. Anil Mehta".to_string(),
            requested_at: now - Duration::hours(30),
            status: LabTestStatus::Completed,
            result: Some("LDL 162 mg/dL".to_string()),
            report_url: Some("/reports/lt1.pdf".to_string()),
            sample_collected_at: Some(now - Duration::hours(29)),
            completed_at: Some(now - Duration::hours(26)),
        },
        LabTest {
            id: "lt2".to_string(),
            patient_id: "p2".to_string(),
            test_name: "Urine Culture".to_string(),
            test_code: "UCUL".to_string(),
            category: LabTestCategory::Urine,
            requested_by: "Dr. Anil Mehta".to_string(),
            requested_at: now - Duration::hours(3),
            status: LabTestStatus::Ordered,
            result: None,
            report_url: None,
            sample_collected_at: None,
            completed_at: None,
        },
    ]
}

fn care_instructions(now: DateTime<Utc>) -> Vec<CareInstruction> {
    vec![
        CareInstruction {
            id: "ci1".to_string(),
            patient_id: "p1".to_string(),
            instruction: "Strict bed rest, cardiac monitoring".to_string(),
            category: CareCategory::Monitoring,
            priority: CarePriority::High,
            given_by: "Dr. Anil Mehta".to_string(),
            given_at: now - Duration::hours(6),
            acknowledged_by: Some("Nurse Priya Sharma".to_string()),
        },
        CareInstruction {
            id: "ci2".to_string(),
            patient_id: "p2".to_string(),
            instruction: "Diabetic diet, 1800 kcal".to_string(),
            category: CareCategory::Diet,
            priority: CarePriority::Medium,
            given_by: "Dr. Anil Mehta".to_string(),
            given_at: now - Duration::hours(2),
            acknowledged_by: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_seed_references_resolve() {
        let state = seed_state(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
        let patient_ids: HashSet<_> = state.patients.iter().map(|p| p.id.as_str()).collect();

        assert!(state.tasks.iter().all(|t| patient_ids.contains(t.patient_id.as_str())));
        assert!(state.timeline_events.iter().all(|e| patient_ids.contains(e.patient_id.as_str())));
        assert!(state.chat_messages.iter().all(|m| patient_ids.contains(m.patient_id.as_str())));
        assert!(state
            .tasks
            .iter()
            .all(|t| (t.status == TaskStatus::Completed) == t.completed_at.is_some()));
        assert_eq!(state.current_user.id, "u1");
        assert_eq!(state.selected_patient_id.as_deref(), Some(DEFAULT_PATIENT_ID));
    }

    #[test]
    fn test_seed_ids_are_ordered_and_below_sequence() {
        let state = seed_state(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
        let mut ids: Vec<_> = state.timeline_events.iter().map(|e| e.id.clone()).collect();
        let sorted = {
            let mut s = ids.clone();
            s.sort();
            s.reverse();
            s
        };
        assert_eq!(ids, sorted);
        ids.dedup();
        assert_eq!(ids.len(), state.timeline_events.len());
        assert_eq!(state.sequence, 8);
    }
}
