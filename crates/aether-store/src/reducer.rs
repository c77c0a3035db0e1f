//! 状态归约器
//!
//! `(state, action, now) -> Reduction` 是唯一的状态变更途径。
//! 被拒绝的动作返回错误，原状态保持不变；集合总是重新构造，从不原地修改。

use crate::action::{Action, LabTestUpdate, NewPatient, NewTask, PrescriptionUpdate, TimelineNote};
use crate::notification::Notification;
use crate::state::AppState;
use aether_core::utils::{generate_id, generate_mrn};
use aether_core::{
    AetherError, ChatMessage, ClinicalTask, CurrentUser, LabTest, LabTestStatus, Patient, PatientStatus, Result,
    TaskStatus, TimelineEvent, TimelineEventType,
};
use aether_workflow::sla::due_time_for;
use aether_workflow::{TaskEvent, TaskStateMachine};
use chrono::{DateTime, Utc};

/// 归约结果
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    /// 动作合法但没有可观察的变化
    Unchanged,
    Changed {
        state: AppState,
        notifications: Vec<Notification>,
    },
}

impl Reduction {
    fn changed(state: AppState) -> Self {
        Reduction::Changed {
            state,
            notifications: Vec::new(),
        }
    }

    fn notify(state: AppState, notification: Notification) -> Self {
        Reduction::Changed {
            state,
            notifications: vec![notification],
        }
    }
}

/// 状态归约
pub fn reduce(state: &AppState, action: &Action, now: DateTime<Utc>) -> Result<Reduction> {
    let machine = TaskStateMachine::new();

    match action {
        Action::CreateTask(new_task) => create_task(state, new_task, now),
        Action::UpdateTaskStatus { task_id, status } => update_task_status(state, &machine, task_id, *status, now),
        Action::MarkDelayed { task_id } => mark_delayed(state, &machine, task_id, now),
        Action::EscalateTask { task_id } => escalate_task(state, task_id),
        Action::AddPatient(new_patient) => add_patient(state, new_patient, now),
        Action::UpdatePatientStatus { patient_id, status } => update_patient_status(state, patient_id, *status, now),
        Action::AddChatMessage { patient_id, message } => add_chat_message(state, patient_id, message, now),
        Action::SwitchUser(user) => Ok(switch_user(state, user)),
        Action::ToggleTheme => Ok(Reduction::changed(AppState {
            theme: state.theme.toggled(),
            ..state.clone()
        })),
        Action::SetSearchQuery(query) => {
            if &state.search_query == query {
                return Ok(Reduction::Unchanged);
            }
            Ok(Reduction::changed(AppState {
                search_query: query.clone(),
                ..state.clone()
            }))
        }
        Action::SelectPatient(patient_id) => {
            if let Some(id) = patient_id {
                ensure_patient(state, id)?;
            }
            Ok(Reduction::changed(AppState {
                selected_patient_id: patient_id.clone(),
                ..state.clone()
            }))
        }
        Action::SelectDepartment(department) => Ok(Reduction::changed(AppState {
            selected_department: department.clone(),
            ..state.clone()
        })),
        Action::AddTimelineEvent(note) => add_timeline_event(state, note, now),
        Action::UpdateLabTest { test_id, update } => update_lab_test(state, test_id, update, now),
        Action::UpdatePrescription { rx_id, update } => update_prescription(state, rx_id, update),
        Action::AcknowledgeCareInstruction { instruction_id } => acknowledge_care_instruction(state, instruction_id),
    }
}

fn create_task(state: &AppState, new_task: &NewTask, now: DateTime<Utc>) -> Result<Reduction> {
    let title = new_task.title.trim();
    if title.is_empty() {
        return Err(AetherError::Validation("task title is required".to_string()));
    }
    if new_task.sla_minutes <= 0 {
        return Err(AetherError::Validation(format!(
            "SLA must be a positive number of minutes, got {}",
            new_task.sla_minutes
        )));
    }
    let patient = ensure_patient(state, &new_task.patient_id)?;
    let due_time = due_time_for(now, new_task.sla_minutes)
        .ok_or_else(|| AetherError::Validation(format!("SLA out of range: {} minutes", new_task.sla_minutes)))?;

    let department = new_task
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .or_else(|| new_task.task_type.default_department())
        .unwrap_or("General")
        .to_string();

    let task = ClinicalTask {
        id: generate_id("t", now),
        patient_id: patient.id.clone(),
        patient_name: patient.name.clone(),
        task_type: new_task.task_type,
        title: title.to_string(),
        description: new_task.description.trim().to_string(),
        requested_by: state.current_user.name.clone(),
        requested_by_role: state.current_user.role.to_string(),
        department,
        status: TaskStatus::Todo,
        priority: new_task.priority,
        created_at: now,
        due_time,
        completed_at: None,
        sla_minutes: new_task.sla_minutes,
        notes: None,
        escalated: false,
    };

    let priority_label = task.priority.to_string().to_uppercase();
    let mut next = state.clone();
    let event = timeline_event(
        &mut next,
        &task.patient_id,
        TimelineEventType::TaskCreated,
        "New Clinical Order",
        format!("{} ({})", task.title, priority_label),
        Some(task.id.as_str()),
        now,
    );
    let notification = Notification::info(format!("New Order Created: {}", task.title))
        .with_detail(format!("Priority: {} • Dept: {}", priority_label, task.department));

    tracing::info!("Created task {} for patient {}", task.id, task.patient_id);
    next.timeline_events = prepend(event, &state.timeline_events);
    next.tasks = prepend(task, &state.tasks);
    Ok(Reduction::notify(next, notification))
}

fn update_task_status(
    state: &AppState,
    machine: &TaskStateMachine,
    task_id: &str,
    status: TaskStatus,
    now: DateTime<Utc>,
) -> Result<Reduction> {
    let task = ensure_task(state, task_id)?;
    if task.status == status {
        return Ok(Reduction::Unchanged);
    }

    let updated = machine.apply(task, TaskEvent::Move(status), now)?;
    let user = &state.current_user;
    let (event_type, title) = if status == TaskStatus::Completed {
        (TimelineEventType::TaskCompleted, "Task Completed")
    } else {
        (TimelineEventType::TaskUpdated, "Task Updated")
    };

    let mut next = state.clone();
    let event = timeline_event(
        &mut next,
        &updated.patient_id,
        event_type,
        title,
        format!("{} marked as {}", updated.title, status),
        Some(updated.id.as_str()),
        now,
    );
    let notification = match status {
        TaskStatus::Completed => Notification::success(format!("Task Completed: {}", updated.title))
            .with_detail(format!("Completed by {}", user.name)),
        TaskStatus::InProgress => Notification::info(format!("Task Started: {}", updated.title))
            .with_detail(format!("Picked up by {}", user.name)),
        TaskStatus::Todo | TaskStatus::Delayed => Notification::info(format!("Task Updated: {}", updated.title))
            .with_detail(format!("Moved to {} by {}", status, user.name)),
    };

    tracing::info!("Task {} status changed from {} to {}", task_id, task.status, status);
    next.timeline_events = prepend(event, &state.timeline_events);
    next.tasks = replace_task(&state.tasks, updated);
    Ok(Reduction::notify(next, notification))
}

fn mark_delayed(state: &AppState, machine: &TaskStateMachine, task_id: &str, now: DateTime<Utc>) -> Result<Reduction> {
    let task = ensure_task(state, task_id)?;
    let updated = machine.apply(task, TaskEvent::SlaBreach, now)?;
    if updated.status == task.status {
        return Ok(Reduction::Unchanged);
    }

    let notification = Notification::warning("Task Delayed").with_detail(updated.title.clone());
    tracing::warn!("Task {} marked as delayed", task_id);
    let next = AppState {
        tasks: replace_task(&state.tasks, updated),
        ..state.clone()
    };
    Ok(Reduction::notify(next, notification))
}

fn escalate_task(state: &AppState, task_id: &str) -> Result<Reduction> {
    let task = ensure_task(state, task_id)?;
    if task.escalated && task.priority == aether_core::TaskPriority::Stat {
        return Ok(Reduction::Unchanged);
    }

    // 原优先级不保留
    let updated = ClinicalTask {
        escalated: true,
        priority: aether_core::TaskPriority::Stat,
        ..task.clone()
    };
    let notification = Notification::warning("Task Escalated").with_detail(updated.title.clone());
    tracing::warn!("Task {} escalated to stat priority", task_id);
    let next = AppState {
        tasks: replace_task(&state.tasks, updated),
        ..state.clone()
    };
    Ok(Reduction::notify(next, notification))
}

fn add_patient(state: &AppState, new_patient: &NewPatient, now: DateTime<Utc>) -> Result<Reduction> {
    let name = new_patient.name.trim();
    let department = new_patient.department.trim();
    let diagnosis = new_patient.diagnosis.trim();
    if name.is_empty() || department.is_empty() || diagnosis.is_empty() {
        return Err(AetherError::Validation(
            "patient name, department and diagnosis are required".to_string(),
        ));
    }

    let mut next = state.clone();
    let sequence = next_sequence(&mut next);
    let bed_number = non_empty(&new_patient.bed_number).unwrap_or_else(|| default_bed(sequence));
    let patient = Patient {
        id: generate_id("p", now),
        name: name.to_string(),
        age: new_patient.age,
        gender: new_patient.gender,
        mrn: generate_mrn(now, sequence),
        admission_date: now,
        department: department.to_string(),
        bed_number,
        diagnosis: diagnosis.to_string(),
        allergies: new_patient
            .allergies
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect(),
        contact_number: non_empty(&new_patient.contact_number).unwrap_or_else(|| "Not provided".to_string()),
        emergency_contact: non_empty(&new_patient.emergency_contact).unwrap_or_else(|| "Not provided".to_string()),
        insurance: non_empty(&new_patient.insurance).unwrap_or_else(|| "Not specified".to_string()),
        status: new_patient.status,
    };

    let event = timeline_event(
        &mut next,
        &patient.id,
        TimelineEventType::StatusChanged,
        "Patient Admitted",
        format!("{} admitted to {}", patient.name, patient.department),
        None,
        now,
    );
    let notification = Notification::success(format!("Patient Admitted: {}", patient.name))
        .with_detail(format!("{} • Bed {}", patient.department, patient.bed_number));

    tracing::info!("Admitted patient {} ({}) to {}", patient.id, patient.mrn, patient.department);
    next.timeline_events = prepend(event, &state.timeline_events);
    next.patients = prepend(patient, &state.patients);
    Ok(Reduction::notify(next, notification))
}

fn update_patient_status(
    state: &AppState,
    patient_id: &str,
    status: PatientStatus,
    now: DateTime<Utc>,
) -> Result<Reduction> {
    let patient = ensure_patient(state, patient_id)?;
    if patient.status == status {
        return Ok(Reduction::Unchanged);
    }

    let updated = Patient {
        status,
        ..patient.clone()
    };
    let mut next = state.clone();
    let event = timeline_event(
        &mut next,
        patient_id,
        TimelineEventType::StatusChanged,
        "Patient Status Changed",
        format!("{} status changed to {}", updated.name, status),
        None,
        now,
    );

    tracing::info!("Patient {} status changed from {} to {}", patient_id, patient.status, status);
    next.timeline_events = prepend(event, &state.timeline_events);
    next.patients = state
        .patients
        .iter()
        .map(|p| if p.id == patient_id { updated.clone() } else { p.clone() })
        .collect();
    Ok(Reduction::notify(
        next,
        Notification::info(format!("Patient status updated to {}", status)),
    ))
}

fn add_chat_message(state: &AppState, patient_id: &str, message: &str, now: DateTime<Utc>) -> Result<Reduction> {
    ensure_patient(state, patient_id)?;
    let text = message.trim();
    if text.is_empty() {
        return Err(AetherError::Validation("chat message cannot be empty".to_string()));
    }

    let mut next = state.clone();
    let sequence = next_sequence(&mut next);
    let user = &state.current_user;
    let chat = ChatMessage {
        id: format!("msg{:012}", sequence),
        patient_id: patient_id.to_string(),
        sender_id: user.id.clone(),
        sender_name: user.name.clone(),
        sender_role: user.role.to_string(),
        department: user.department.clone(),
        message: text.to_string(),
        timestamp: now,
    };

    tracing::debug!("Chat message {} posted on patient {}", chat.id, patient_id);
    next.chat_messages = state.chat_messages.iter().cloned().chain(std::iter::once(chat)).collect();
    Ok(Reduction::changed(next))
}

fn switch_user(state: &AppState, user: &CurrentUser) -> Reduction {
    let notification = Notification::info(format!("Switched to {}", user.name))
        .with_detail(format!("Role: {} • {}", user.role, user.department));
    tracing::info!("Current user switched to {}", user.id);
    Reduction::notify(
        AppState {
            current_user: user.clone(),
            ..state.clone()
        },
        notification,
    )
}

fn add_timeline_event(state: &AppState, note: &TimelineNote, now: DateTime<Utc>) -> Result<Reduction> {
    ensure_patient(state, &note.patient_id)?;
    if note.title.trim().is_empty() {
        return Err(AetherError::Validation("timeline event title is required".to_string()));
    }

    let mut next = state.clone();
    let event = timeline_event(
        &mut next,
        &note.patient_id,
        note.event_type,
        note.title.trim(),
        note.description.trim().to_string(),
        note.task_id.as_deref(),
        now,
    );
    next.timeline_events = prepend(event, &state.timeline_events);
    Ok(Reduction::changed(next))
}

fn update_lab_test(state: &AppState, test_id: &str, update: &LabTestUpdate, now: DateTime<Utc>) -> Result<Reduction> {
    let test = state
        .lab_tests
        .iter()
        .find(|t| t.id == test_id)
        .ok_or_else(|| AetherError::NotFound(format!("Lab test {} not found", test_id)))?;

    let status = update.status.unwrap_or(test.status);
    let updated = LabTest {
        status,
        result: update.result.clone().or_else(|| test.result.clone()),
        report_url: update.report_url.clone().or_else(|| test.report_url.clone()),
        sample_collected_at: match status {
            LabTestStatus::Ordered => test.sample_collected_at,
            _ => test.sample_collected_at.or(Some(now)),
        },
        completed_at: match status {
            LabTestStatus::Completed => test.completed_at.or(Some(now)),
            _ => None,
        },
        ..test.clone()
    };
    if &updated == test {
        return Ok(Reduction::Unchanged);
    }

    let next = AppState {
        lab_tests: state
            .lab_tests
            .iter()
            .map(|t| if t.id == test_id { updated.clone() } else { t.clone() })
            .collect(),
        ..state.clone()
    };
    Ok(Reduction::notify(
        next,
        Notification::info("Lab Test Updated").with_detail("Test status updated"),
    ))
}

fn update_prescription(state: &AppState, rx_id: &str, update: &PrescriptionUpdate) -> Result<Reduction> {
    let rx = state
        .prescriptions
        .iter()
        .find(|rx| rx.id == rx_id)
        .ok_or_else(|| AetherError::NotFound(format!("Prescription {} not found", rx_id)))?;

    let mut updated = rx.clone();
    if let Some(status) = update.status {
        updated.status = status;
    }
    if let Some(notes) = &update.pharmacy_notes {
        updated.pharmacy_notes = Some(notes.clone());
    }
    if &updated == rx {
        return Ok(Reduction::Unchanged);
    }

    let next = AppState {
        prescriptions: state
            .prescriptions
            .iter()
            .map(|p| if p.id == rx_id { updated.clone() } else { p.clone() })
            .collect(),
        ..state.clone()
    };
    Ok(Reduction::notify(
        next,
        Notification::info("Prescription Updated").with_detail("Prescription status changed"),
    ))
}

fn acknowledge_care_instruction(state: &AppState, instruction_id: &str) -> Result<Reduction> {
    let instruction = state
        .care_instructions
        .iter()
        .find(|ci| ci.id == instruction_id)
        .ok_or_else(|| AetherError::NotFound(format!("Care instruction {} not found", instruction_id)))?;
    if instruction.acknowledged_by.is_some() {
        return Ok(Reduction::Unchanged);
    }

    let by = state.current_user.name.clone();
    let next = AppState {
        care_instructions: state
            .care_instructions
            .iter()
            .map(|ci| {
                let mut ci = ci.clone();
                if ci.id == instruction_id {
                    ci.acknowledged_by = Some(by.clone());
                }
                ci
            })
            .collect(),
        ..state.clone()
    };
    Ok(Reduction::notify(
        next,
        Notification::info("Care Instruction Acknowledged").with_detail(format!("Acknowledged by {}", by)),
    ))
}

fn ensure_patient<'a>(state: &'a AppState, patient_id: &str) -> Result<&'a Patient> {
    state
        .patient(patient_id)
        .ok_or_else(|| AetherError::NotFound(format!("Patient {} not found", patient_id)))
}

fn ensure_task<'a>(state: &'a AppState, task_id: &str) -> Result<&'a ClinicalTask> {
    state
        .task(task_id)
        .ok_or_else(|| AetherError::NotFound(format!("Task {} not found", task_id)))
}

fn next_sequence(state: &mut AppState) -> u64 {
    state.sequence += 1;
    state.sequence
}

/// 以当前操作者身份构造时间线事件，并分配新的序号
fn timeline_event(
    next: &mut AppState,
    patient_id: &str,
    event_type: TimelineEventType,
    title: &str,
    description: String,
    task_id: Option<&str>,
    now: DateTime<Utc>,
) -> TimelineEvent {
    let sequence = next_sequence(next);
    TimelineEvent {
        id: format!("e{:012}", sequence),
        patient_id: patient_id.to_string(),
        timestamp: now,
        event_type,
        title: title.to_string(),
        description,
        performed_by: next.current_user.name.clone(),
        department: next.current_user.department.clone(),
        task_id: task_id.map(str::to_string),
    }
}

fn prepend<T: Clone>(item: T, existing: &[T]) -> Vec<T> {
    std::iter::once(item).chain(existing.iter().cloned()).collect()
}

fn replace_task(tasks: &[ClinicalTask], updated: ClinicalTask) -> Vec<ClinicalTask> {
    tasks
        .iter()
        .map(|t| if t.id == updated.id { updated.clone() } else { t.clone() })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn default_bed(sequence: u64) -> String {
    let ward = (b'A' + (sequence % 4) as u8) as char;
    format!("Ward-{}-{}", ward, 100 + sequence % 400)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_state;
    use aether_core::{TaskPriority, TaskType};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn apply(state: &AppState, action: Action, at: DateTime<Utc>) -> (AppState, Vec<Notification>) {
        match reduce(state, &action, at).expect("action rejected") {
            Reduction::Changed { state, notifications } => (state, notifications),
            Reduction::Unchanged => (state.clone(), Vec::new()),
        }
    }

    fn cbc(patient_id: &str) -> Action {
        Action::CreateTask(NewTask {
            patient_id: patient_id.to_string(),
            task_type: TaskType::LabTest,
            title: "CBC".to_string(),
            description: "Complete blood count".to_string(),
            department: None,
            priority: TaskPriority::Stat,
            sla_minutes: 30,
        })
    }

    fn assert_completed_at_invariant(state: &AppState) {
        for task in &state.tasks {
            assert_eq!(task.status == TaskStatus::Completed, task.completed_at.is_some(), "task {}", task.id);
        }
    }

    #[test]
    fn test_admit_patient_records_timeline() {
        let seed = seed_state(now());
        let action = Action::AddPatient(NewPatient::new("Jane Doe", "Cardiology", "Arrhythmia"));
        let (state, notifications) = apply(&seed, action, now());

        let patient = &state.patients[0];
        assert_eq!(patient.name, "Jane Doe");
        assert!(patient.mrn.starts_with("MRN2025"));
        assert_eq!(state.patients.len(), seed.patients.len() + 1);

        let event = &state.timeline_events[0];
        assert_eq!(event.patient_id, patient.id);
        assert_eq!(event.event_type, TimelineEventType::StatusChanged);
        assert_eq!(event.title, "Patient Admitted");
        assert_eq!(notifications[0].kind, crate::notification::NotificationKind::Success);
    }

    #[test]
    fn test_admit_patient_validation() {
        let seed = seed_state(now());
        let action = Action::AddPatient(NewPatient::new("  ", "Cardiology", "Arrhythmia"));
        assert!(matches!(reduce(&seed, &action, now()), Err(AetherError::Validation(_))));
    }

    #[test]
    fn test_create_then_complete_task() {
        let seed = seed_state(now());
        let (state, _) = apply(&seed, cbc("p1"), now());
        let task_id = state.tasks[0].id.clone();
        assert_eq!(state.tasks[0].department, "Laboratory");
        assert_eq!(state.tasks[0].due_time, now() + Duration::minutes(30));

        let done_at = now() + Duration::minutes(12);
        let (state, notifications) = apply(
            &state,
            Action::UpdateTaskStatus {
                task_id: task_id.clone(),
                status: TaskStatus::Completed,
            },
            done_at,
        );

        let task = state.task(&task_id).unwrap();
        assert_eq!(state.tasks.iter().filter(|t| t.id == task_id).count(), 1);
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.completed_at, Some(done_at));
        assert_eq!(notifications[0].title, "Task Completed: CBC");

        let events: Vec<_> = state
            .timeline_events
            .iter()
            .filter(|e| e.task_id.as_deref() == Some(task_id.as_str()))
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, TimelineEventType::TaskCompleted);
        assert_eq!(events[1].event_type, TimelineEventType::TaskCreated);
        assert!(events[0].id > events[1].id);
        assert_completed_at_invariant(&state);
    }

    #[test]
    fn test_reopen_clears_completed_at() {
        let seed = seed_state(now());
        let (state, _) = apply(&seed, cbc("p1"), now());
        let task_id = state.tasks[0].id.clone();
        let mut state = state;
        for status in [TaskStatus::InProgress, TaskStatus::Completed, TaskStatus::Todo, TaskStatus::Completed, TaskStatus::Delayed] {
            state = apply(&state, Action::UpdateTaskStatus { task_id: task_id.clone(), status }, now()).0;
            assert_completed_at_invariant(&state);
        }
    }

    #[test]
    fn test_same_status_update_is_noop() {
        let seed = seed_state(now());
        let (state, _) = apply(&seed, cbc("p1"), now());
        let task_id = state.tasks[0].id.clone();
        let action = Action::UpdateTaskStatus {
            task_id,
            status: TaskStatus::Todo,
        };
        assert_eq!(reduce(&state, &action, now()).unwrap(), Reduction::Unchanged);
    }

    #[test]
    fn test_create_task_rejections() {
        let seed = seed_state(now());
        assert!(matches!(reduce(&seed, &cbc("missing"), now()), Err(AetherError::NotFound(_))));

        let blank = Action::CreateTask(NewTask {
            patient_id: "p1".to_string(),
            task_type: TaskType::Referral,
            title: "   ".to_string(),
            description: String::new(),
            department: None,
            priority: TaskPriority::Routine,
            sla_minutes: 60,
        });
        assert!(matches!(reduce(&seed, &blank, now()), Err(AetherError::Validation(_))));

        for sla_minutes in [i64::MAX / 2, i64::MAX] {
            let huge = Action::CreateTask(NewTask {
                patient_id: "p1".to_string(),
                task_type: TaskType::LabTest,
                title: "CBC".to_string(),
                description: String::new(),
                department: None,
                priority: TaskPriority::Routine,
                sla_minutes,
            });
            assert!(matches!(reduce(&seed, &huge, now()), Err(AetherError::Validation(_))));
        }
    }

    #[test]
    fn test_sequence_ids_keep_order_past_a_million() {
        let mut seed = seed_state(now());
        seed.sequence = 999_998;
        let (state, _) = apply(&seed, cbc("p1"), now());
        let (state, _) = apply(&state, cbc("p1"), now());
        assert_eq!(state.sequence, 1_000_000);
        assert_eq!(state.timeline_events[0].id, "e000001000000");
        assert!(state.timeline_events[0].id > state.timeline_events[1].id);
        assert!(state.timeline_events[1].id > state.timeline_events[2].id);
    }

    #[test]
    fn test_generated_ids_follow_injected_clock() {
        let seed = seed_state(now());
        let (state, _) = apply(&seed, cbc("p1"), now());
        let expected_prefix = format!("t{}-", now().timestamp_millis());
        assert!(state.tasks[0].id.starts_with(&expected_prefix));
    }

    #[test]
    fn test_escalate_routine_task() {
        let seed = seed_state(now());
        let routine = seed.tasks.iter().find(|t| t.priority == TaskPriority::Routine).unwrap();
        let (state, notifications) = apply(&seed, Action::EscalateTask { task_id: routine.id.clone() }, now());

        let task = state.task(&routine.id).unwrap();
        assert_eq!(task.priority, TaskPriority::Stat);
        assert!(task.escalated);
        assert_eq!(notifications[0].kind, crate::notification::NotificationKind::Warning);
    }

    #[test]
    fn test_mark_delayed_rejected_for_completed() {
        let seed = seed_state(now());
        let completed = seed.tasks.iter().find(|t| t.status == TaskStatus::Completed).unwrap();
        let result = reduce(&seed, &Action::MarkDelayed { task_id: completed.id.clone() }, now());
        assert!(matches!(result, Err(AetherError::InvalidStateTransition { .. })));

        let open = seed.tasks.iter().find(|t| t.status == TaskStatus::Todo).unwrap();
        let (state, _) = apply(&seed, Action::MarkDelayed { task_id: open.id.clone() }, now());
        assert_eq!(state.task(&open.id).unwrap().status, TaskStatus::Delayed);
    }

    #[test]
    fn test_unknown_references_are_rejected() {
        let seed = seed_state(now());
        let actions = vec![
            Action::UpdateTaskStatus { task_id: "nope".to_string(), status: TaskStatus::Completed },
            Action::EscalateTask { task_id: "nope".to_string() },
            Action::UpdatePatientStatus { patient_id: "nope".to_string(), status: PatientStatus::Stable },
            Action::AddChatMessage { patient_id: "nope".to_string(), message: "hi".to_string() },
            Action::SelectPatient(Some("nope".to_string())),
        ];
        for action in actions {
            assert!(matches!(reduce(&seed, &action, now()), Err(AetherError::NotFound(_))));
        }
    }

    #[test]
    fn test_logs_are_append_only() {
        let seed = seed_state(now());
        let before_timeline = seed.timeline_events.clone();
        let before_chat = seed.chat_messages.clone();

        let (state, _) = apply(
            &seed,
            Action::AddChatMessage { patient_id: "p1".to_string(), message: " BP stable ".to_string() },
            now(),
        );
        let (state, _) = apply(
            &state,
            Action::UpdatePatientStatus { patient_id: "p1".to_string(), status: PatientStatus::Stable },
            now(),
        );

        assert_eq!(&state.chat_messages[..before_chat.len()], &before_chat[..]);
        assert_eq!(state.chat_messages.last().unwrap().message, "BP stable");
        assert_eq!(&state.timeline_events[1..], &before_timeline[..]);
        // 旧快照不受影响
        assert_eq!(seed.timeline_events, before_timeline);
    }

    #[test]
    fn test_ui_state_actions() {
        let seed = seed_state(now());
        let (state, _) = apply(&seed, Action::ToggleTheme, now());
        assert_ne!(state.theme, seed.theme);
        let (state, _) = apply(&state, Action::SetSearchQuery("cbc".to_string()), now());
        assert_eq!(state.search_query, "cbc");
        let (state, _) = apply(&state, Action::SelectDepartment(Some("Pharmacy".to_string())), now());
        assert_eq!(state.selected_department.as_deref(), Some("Pharmacy"));

        let nurse = seed.staff.iter().find(|s| s.role == aether_core::UserRole::Nurse).unwrap();
        let (state, notifications) = apply(&state, Action::SwitchUser(nurse.as_current_user()), now());
        assert_eq!(state.current_user.id, nurse.id);
        assert_eq!(notifications.len(), 1);
    }

    #[test]
    fn test_lab_test_and_prescription_updates() {
        let seed = seed_state(now());
        let ordered = seed.lab_tests.iter().find(|t| t.status == LabTestStatus::Ordered).unwrap();
        let at = now() + Duration::minutes(5);
        let (state, _) = apply(
            &seed,
            Action::UpdateLabTest {
                test_id: ordered.id.clone(),
                update: LabTestUpdate {
                    status: Some(LabTestStatus::Completed),
                    result: Some("Within normal limits".to_string()),
                    report_url: Some("/reports/lab.pdf".to_string()),
                },
            },
            at,
        );
        let test = state.lab_tests.iter().find(|t| t.id == ordered.id).unwrap();
        assert_eq!(test.completed_at, Some(at));
        assert_eq!(test.sample_collected_at, Some(at));

        let rx = &seed.prescriptions[0];
        let (state, _) = apply(
            &state,
            Action::UpdatePrescription {
                rx_id: rx.id.clone(),
                update: PrescriptionUpdate {
                    status: Some(aether_core::PrescriptionStatus::Administered),
                    pharmacy_notes: None,
                },
            },
            at,
        );
        assert_eq!(state.prescriptions[0].status, aether_core::PrescriptionStatus::Administered);
    }

    #[test]
    fn test_acknowledge_care_instruction() {
        let seed = seed_state(now());
        let pending = seed.care_instructions.iter().find(|ci| ci.acknowledged_by.is_none()).unwrap();
        let action = Action::AcknowledgeCareInstruction { instruction_id: pending.id.clone() };
        let (state, _) = apply(&seed, action.clone(), now());
        let acked = state.care_instructions.iter().find(|ci| ci.id == pending.id).unwrap();
        assert_eq!(acked.acknowledged_by.as_deref(), Some(seed.current_user.name.as_str()));
        assert_eq!(reduce(&state, &action, now()).unwrap(), Reduction::Unchanged);
    }
}
