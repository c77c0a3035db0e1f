//! 病区演示程序
//!
//! 展示状态引擎的核心流程：入院、开立医嘱、完成任务、SLA 评估与告警列表

use aether::admin::{init_logging, LoggingConfig, SlaConfig, SlaMonitor};
use aether::core::{PatientStatus, TaskPriority, TaskStatus, TaskType};
use aether::store::{selectors, MemorySink, NewPatient, NewTask, PersistenceAdapter, TracingSink};
use aether::workflow::{format_duration, SlaPolicy};
use aether::{Action, Store};
use chrono::{Duration, Utc};
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(&LoggingConfig::default())?;

    let start = Utc::now();
    let mut store = Store::open(PersistenceAdapter::in_memory(), Arc::new(TracingSink), start);

    println!("🏥 Aether 病区演示\n");

    // 1. 入院登记
    store.dispatch_at(
        Action::AddPatient(NewPatient::new("Jane Doe", "Cardiology", "Atrial Fibrillation")),
        start,
    );
    let patient = store.get_state().patients[0].clone();
    println!("✅ 患者入院: {} ({}, 床位 {})", patient.name, patient.mrn, patient.bed_number);

    // 2. 开立危急医嘱
    store.dispatch_at(
        Action::CreateTask(NewTask {
            patient_id: patient.id.clone(),
            task_type: TaskType::LabTest,
            title: "Serum Potassium".to_string(),
            description: "Before starting amiodarone".to_string(),
            department: None,
            priority: TaskPriority::Stat,
            sla_minutes: 30,
        }),
        start,
    );
    let task = store.get_state().tasks[0].clone();
    println!("📋 医嘱已开立: {} → {}", task.title, task.department);

    // 3. SLA 评估
    let policy = SlaPolicy::default();
    for minutes in [5, 26, 45] {
        let report = policy.evaluate_task(&task, start + Duration::minutes(minutes));
        println!(
            "   {:>3} 分钟后: {:?} ({}, 进度 {:.0}%)",
            minutes,
            report.status,
            report.countdown_label(),
            report.progress_percent
        );
    }

    // 4. 完成任务并更新患者状态
    store.dispatch_at(
        Action::UpdateTaskStatus {
            task_id: task.id.clone(),
            status: TaskStatus::Completed,
        },
        start + Duration::minutes(18),
    );
    store.dispatch_at(
        Action::UpdatePatientStatus {
            patient_id: patient.id.clone(),
            status: PatientStatus::Stable,
        },
        start + Duration::minutes(20),
    );

    // 5. 被拒绝的动作不改变状态
    let before = store.get_state();
    let changed = store.dispatch(Action::EscalateTask {
        task_id: "missing".to_string(),
    });
    println!("\n⚠️ 升级不存在的任务: changed={}, 快照未变={}", changed, Arc::ptr_eq(&before, &store.get_state()));

    // 6. 概览
    let state = store.get_state();
    let stats = selectors::dashboard_stats(&state);
    println!("\n📊 总览:");
    println!("   患者数: {}", stats.total_patients);
    println!("   进行中任务: {}", stats.active_tasks);
    println!("   延误任务: {}", stats.delayed_tasks);
    println!("   危重患者: {}", stats.critical_patients);

    println!("\n🕒 患者时间线:");
    for event in selectors::patient_timeline(&state, &patient.id) {
        println!("   - [{:?}] {}: {}", event.event_type, event.title, event.description);
    }

    println!("\n🔔 告警:");
    for alert in selectors::alert_feed(&state) {
        println!("   - {:?} {} ({})", alert.kind, alert.title, alert.detail);
    }

    // 7. SLA 监控：一小时后再评估一次
    let sink = Arc::new(MemorySink::new());
    let shared = Arc::new(Mutex::new(store));
    let config = SlaConfig {
        auto_mark_delayed: true,
        ..SlaConfig::default()
    };
    let mut monitor = SlaMonitor::new(shared.clone(), sink.clone(), &config);
    let report = monitor.tick(start + Duration::hours(1));
    println!(
        "\n⏱️ 一小时后: {} 个任务首次超时, {} 个标记为延误",
        report.newly_overdue.len(),
        report.marked_delayed.len()
    );
    for notification in sink.drain() {
        println!("   - {} {}", notification.title, notification.detail.unwrap_or_default());
    }

    println!("\n示例时长格式: {}", format_duration(135.0));
    Ok(())
}
