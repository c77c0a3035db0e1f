//! SLA 计算引擎
//!
//! 根据任务创建时间、SLA 分钟数和当前时间计算截止状态与进度。
//! 当前时间始终由调用方传入，结果从不持久化。

use aether_core::ClinicalTask;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 默认预警比例：剩余时间低于 SLA 的 20% 即进入预警
pub const DEFAULT_WARNING_RATIO: f64 = 0.2;

/// SLA 状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlaStatus {
    OnTime,  // 按时
    Warning, // 预警
    Overdue, // 超时
}

/// SLA 计算结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaReport {
    pub status: SlaStatus,
    /// 剩余分钟数；超时时为超出的分钟数（绝对值）
    pub remaining_minutes: f64,
    /// 已用时间占比，限制在 0..=100
    pub progress_percent: f64,
    pub elapsed_minutes: f64,
}

impl SlaReport {
    pub fn is_overdue(&self) -> bool {
        self.status == SlaStatus::Overdue
    }

    /// 倒计时文本，例如 `"1h 30m left"` 或 `"15m overdue"`
    pub fn countdown_label(&self) -> String {
        let duration = format_duration(self.remaining_minutes);
        match self.status {
            SlaStatus::Overdue => format!("{} overdue", duration),
            SlaStatus::OnTime | SlaStatus::Warning => format!("{} left", duration),
        }
    }
}

/// SLA 判定策略
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaPolicy {
    pub warning_ratio: f64,
}

impl SlaPolicy {
    pub fn new(warning_ratio: f64) -> Self {
        Self { warning_ratio }
    }

    /// 计算 SLA 状态
    ///
    /// `sla_minutes <= 0` 视为立即超时，剩余分钟数报告为已用时间。
    pub fn evaluate(&self, created_at: DateTime<Utc>, sla_minutes: i64, now: DateTime<Utc>) -> SlaReport {
        let elapsed_minutes = (now - created_at).num_milliseconds() as f64 / 60_000.0;

        if sla_minutes <= 0 {
            return SlaReport {
                status: SlaStatus::Overdue,
                remaining_minutes: elapsed_minutes.max(0.0),
                progress_percent: 100.0,
                elapsed_minutes,
            };
        }

        let budget = sla_minutes as f64;
        let remaining_minutes = budget - elapsed_minutes;
        let progress_percent = (elapsed_minutes / budget * 100.0).clamp(0.0, 100.0);

        let (status, remaining_minutes) = if remaining_minutes < 0.0 {
            (SlaStatus::Overdue, remaining_minutes.abs())
        } else if remaining_minutes < budget * self.warning_ratio {
            (SlaStatus::Warning, remaining_minutes)
        } else {
            (SlaStatus::OnTime, remaining_minutes)
        };

        SlaReport {
            status,
            remaining_minutes,
            progress_percent,
            elapsed_minutes,
        }
    }

    /// 计算任务的 SLA 状态
    pub fn evaluate_task(&self, task: &ClinicalTask, now: DateTime<Utc>) -> SlaReport {
        self.evaluate(task.created_at, task.sla_minutes, now)
    }
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WARNING_RATIO)
    }
}

/// 使用默认策略计算 SLA 状态
pub fn evaluate(created_at: DateTime<Utc>, sla_minutes: i64, now: DateTime<Utc>) -> SlaReport {
    SlaPolicy::default().evaluate(created_at, sla_minutes, now)
}

/// 截止时间 = 创建时间 + SLA，超出时间范围时返回 `None`
pub fn due_time_for(created_at: DateTime<Utc>, sla_minutes: i64) -> Option<DateTime<Utc>> {
    Duration::try_minutes(sla_minutes.max(0)).and_then(|budget| created_at.checked_add_signed(budget))
}

/// 时长格式化：不足 60 分钟为 `"{n}m"`，否则为 `"{h}h"` 或 `"{h}h {m}m"`
pub fn format_duration(minutes: f64) -> String {
    let total = minutes.max(0.0).round() as i64;
    if total < 60 {
        return format!("{}m", total);
    }
    let hours = total / 60;
    let mins = total % 60;
    if mins == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}m", hours, mins)
    }
}

/// 相对时间格式化
pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - timestamp;
    let mins = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        format!("{}m ago", mins)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        timestamp.format("%b %-d, %Y").to_string()
    }
}
