//! SLA 监控
//!
//! 周期性地重新评估未完成任务。任务首次超时时发出一次警告通知，
//! 可选地自动把它标记为延误。

use crate::config::SlaConfig;
use aether_store::{Action, Notification, NotificationSink, Store};
use aether_workflow::{OverdueTracker, SlaPolicy};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// SLA 监控器
pub struct SlaMonitor {
    store: Arc<Mutex<Store>>,
    sink: Arc<dyn NotificationSink>,
    policy: SlaPolicy,
    interval: Duration,
    auto_mark_delayed: bool,
    tracker: OverdueTracker,
}

/// 一次评估的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 本次首次超时的任务
    pub newly_overdue: Vec<String>,
    /// 本次被标记为延误的任务
    pub marked_delayed: Vec<String>,
}

impl SlaMonitor {
    pub fn new(store: Arc<Mutex<Store>>, sink: Arc<dyn NotificationSink>, config: &SlaConfig) -> Self {
        Self {
            store,
            sink,
            policy: SlaPolicy::new(config.warning_ratio),
            interval: Duration::from_secs(config.tick_interval_secs.max(1)),
            auto_mark_delayed: config.auto_mark_delayed,
            tracker: OverdueTracker::new(),
        }
    }

    /// 评估一次
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let snapshot = lock(&self.store).get_state();
        let overdue: Vec<_> = self
            .tracker
            .newly_overdue(&snapshot.tasks, &self.policy, now)
            .into_iter()
            .cloned()
            .collect();

        let mut report = TickReport::default();
        for task in &overdue {
            let report_for = self.policy.evaluate_task(task, now);
            let notification = Notification::warning(format!("SLA Breached: {}", task.title)).with_detail(format!(
                "{} • {} • {}",
                task.patient_name,
                task.department,
                report_for.countdown_label()
            ));
            self.sink.notify(&notification);
            report.newly_overdue.push(task.id.clone());
        }

        if self.auto_mark_delayed && !overdue.is_empty() {
            let mut store = lock(&self.store);
            for task in &overdue {
                let action = Action::MarkDelayed {
                    task_id: task.id.clone(),
                };
                if store.dispatch_at(action, now) {
                    report.marked_delayed.push(task.id.clone());
                }
            }
        }

        if !report.newly_overdue.is_empty() {
            tracing::info!(
                "SLA monitor found {} newly overdue tasks, marked {} as delayed",
                report.newly_overdue.len(),
                report.marked_delayed.len()
            );
        }
        report
    }

    /// 在后台按配置的周期运行，第一次评估立即执行
    pub fn start(mut self) -> JoinHandle<()> {
        tracing::info!("Starting SLA monitor with {:?} interval", self.interval);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                self.tick(Utc::now());
            }
        })
    }

    pub fn tracked(&self) -> usize {
        self.tracker.tracked()
    }
}

fn lock(store: &Mutex<Store>) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_core::TaskStatus;
    use aether_store::{MemorySink, NotificationKind, PersistenceAdapter};
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn seed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn monitor(auto_mark_delayed: bool) -> (SlaMonitor, Arc<Mutex<Store>>, Arc<MemorySink>) {
        let store = Arc::new(Mutex::new(Store::open(
            PersistenceAdapter::in_memory(),
            Arc::new(MemorySink::new()),
            seed_time(),
        )));
        let sink = Arc::new(MemorySink::new());
        let config = SlaConfig {
            auto_mark_delayed,
            ..SlaConfig::default()
        };
        (SlaMonitor::new(store.clone(), sink.clone(), &config), store, sink)
    }

    #[test]
    fn test_notifies_once_per_overdue_task() {
        let (mut monitor, _, sink) = monitor(false);

        let report = monitor.tick(seed_time());
        assert_eq!(report.newly_overdue, vec!["t4".to_string()]);
        assert!(report.marked_delayed.is_empty());

        let later = seed_time() + ChronoDuration::minutes(60);
        let mut report = monitor.tick(later);
        report.newly_overdue.sort();
        assert_eq!(report.newly_overdue, vec!["t1", "t2", "t5"]);
        assert!(monitor.tick(later).newly_overdue.is_empty());

        let notifications = sink.drain();
        assert_eq!(notifications.len(), 4);
        assert!(notifications.iter().all(|n| n.kind == NotificationKind::Warning));
        assert_eq!(monitor.tracked(), 4);
    }

    #[test]
    fn test_auto_mark_delayed() {
        let (mut monitor, store, _) = monitor(true);
        let later = seed_time() + ChronoDuration::minutes(60);

        let mut report = monitor.tick(later);
        report.marked_delayed.sort();
        assert_eq!(report.marked_delayed, vec!["t1", "t2", "t5"]);

        let state = store.lock().unwrap().get_state();
        for id in ["t1", "t2", "t4", "t5"] {
            assert_eq!(state.task(id).unwrap().status, TaskStatus::Delayed);
        }
        assert_eq!(state.task("t6").unwrap().status, TaskStatus::Todo);
    }

    #[test]
    fn test_completed_tasks_are_forgotten() {
        let (mut monitor, store, _) = monitor(false);
        monitor.tick(seed_time());
        assert_eq!(monitor.tracked(), 1);

        store.lock().unwrap().dispatch_at(
            Action::UpdateTaskStatus {
                task_id: "t4".to_string(),
                status: TaskStatus::Completed,
            },
            seed_time(),
        );
        monitor.tick(seed_time());
        assert_eq!(monitor.tracked(), 0);
    }

    #[tokio::test]
    async fn test_background_loop_runs_first_tick() {
        let store = Arc::new(Mutex::new(Store::open(
            PersistenceAdapter::in_memory(),
            Arc::new(MemorySink::new()),
            Utc::now(),
        )));
        let sink = Arc::new(MemorySink::new());
        let handle = SlaMonitor::new(store, sink.clone(), &SlaConfig::default()).start();

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        handle.abort();

        let notifications = sink.drain();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "SLA Breached: X-Ray Left Femur");
    }
}
